//! Core upload module
//!
//! Provides the mode-tagged upload request with its transport dispatch,
//! and the orchestrator that uploads and names files one after another.

mod request;
mod uploader;

pub use request::*;
pub use uploader::*;

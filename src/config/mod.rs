//! Configuration module for pcf
//!
//! Provides the CLI arguments, the TOML config file and the runtime
//! settings threaded through the uploader.

mod settings;

pub use settings::*;

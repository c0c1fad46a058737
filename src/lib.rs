//! # pcf - Content-Addressed (S)FTP Pastebin Client
//!
//! pcf uploads files to an FTP or SFTP server and prints, for each one, a
//! name derived from the SHA-1 of the bytes that were actually sent. With
//! a web server exposing the upload directory, the printed name is a
//! shareable URL.
//!
//! ## Features
//!
//! - **Single-pass hashing**: the digest is computed while the upload streams
//! - **Three modes**: anonymous FTP, anonymous SFTP, authenticated SFTP
//! - **Stdin support**: pipe content in and get a URL back
//! - **TOML configuration**: per-mode URLs and an output prefix
//!
//! ## Quick Start
//!
//! ```no_run
//! use pcf::config::UploadConfig;
//! use pcf::core::{UploadMode, UploadSource, Uploader};
//! use std::path::PathBuf;
//!
//! let config = UploadConfig {
//!     mode: UploadMode::SftpAnonymous,
//!     url: "sftp://paste.example.org/incoming".to_string(),
//!     output_prefix: "https://paste.example.org/".to_string(),
//!     ..Default::default()
//! };
//!
//! let uploader = Uploader::new(config).unwrap();
//! let sources = UploadSource::from_args(&[PathBuf::from("notes.txt")]);
//! let report = uploader.upload_all(&sources, &mut std::io::stdout()).unwrap();
//! report.log_summary();
//! ```
//!
//! ## Single Request
//!
//! ```no_run
//! use pcf::core::UploadRequest;
//!
//! let mut content: &[u8] = b"hello";
//! let request = UploadRequest::build(
//!     "ftp",
//!     "ftp://paste.example.org/incoming",
//!     "",
//!     "",
//!     "hello.txt",
//!     &mut content,
//! ).unwrap();
//! let bytes = request.upload().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod hash;
pub mod network;

// Re-export commonly used types
pub use config::{CliArgs, FileConfig, UploadConfig};
pub use core::{UploadMode, UploadReport, UploadRequest, UploadSource, Uploader};
pub use error::{PcfError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use pcf::prelude::*;
    //! ```

    pub use crate::config::{CliArgs, FileConfig, UploadConfig};
    pub use crate::core::{
        Credentials, DryRunTransport, NetworkTransport, Transport, UploadMode, UploadReport,
        UploadRequest, UploadSource, UploadTarget, Uploader,
    };
    pub use crate::error::{PcfError, Result};
    pub use crate::hash::{compose_name, hash_file, hash_name, HashResult, StreamingHasher, TeeReader};
    pub use crate::network::{FtpUploader, SftpUploader};
}

//! Error types for pcf
//!
//! Every failure carries the operation and the path or host it concerns,
//! so a message printed on its own is enough to act on.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pcf operations
#[derive(Error, Debug)]
pub enum PcfError {
    /// I/O error on a local file or stream
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// Local file or stream label
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Upload URL could not be parsed
    #[error("Invalid upload URL '{url}': {message}")]
    InvalidUrl {
        /// URL as configured
        url: String,
        /// Parser message
        message: String,
    },

    /// Dial or handshake failure
    #[error("Connection error to '{host}': {message}")]
    ConnectionError {
        /// `host:port` that was dialed
        host: String,
        /// Failure description
        message: String,
    },

    /// Login rejected by the server
    #[error("Authentication failed for '{user}@{host}': {message}")]
    AuthenticationError {
        /// Login name
        user: String,
        /// `host:port` of the server
        host: String,
        /// Server or library message (never the password)
        message: String,
    },

    /// Authenticated SFTP requested without a password
    #[error("Missing password for authenticated SFTP mode")]
    MissingPassword,

    /// Remote store or write failure
    #[error("Remote transfer error at '{path}': {message}")]
    RemoteTransferError {
        /// Destination path on the server
        path: String,
        /// Failure description
        message: String,
    },

    /// Multiple errors occurred
    #[error("Multiple errors occurred ({count} errors)")]
    MultipleErrors {
        /// Number of errors
        count: usize,
        /// The errors, in input order
        errors: Vec<PcfError>,
    },

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        /// What was being done
        context: String,
        /// Wrapped error
        #[source]
        source: Box<PcfError>,
    },
}

impl PcfError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a connection error
    pub fn connection(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionError {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(
        user: impl Into<String>,
        host: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::AuthenticationError {
            user: user.into(),
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create a remote transfer error
    pub fn remote(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteTransferError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid URL error
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Strip any context wrappers and return the underlying error
    pub fn root(&self) -> &PcfError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this error was raised before any network attempt because
    /// credentials could not be resolved
    pub fn is_credential_error(&self) -> bool {
        matches!(self.root(), Self::MissingPassword)
    }

    /// Check if this error happened while dialing or logging in
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self.root(),
            Self::ConnectionError { .. } | Self::AuthenticationError { .. }
        )
    }

    /// Get the local path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self.root() {
            Self::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for pcf operations
pub type Result<T> = std::result::Result<T, PcfError>;

impl From<std::io::Error> for PcfError {
    fn from(err: std::io::Error) -> Self {
        PcfError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| PcfError::io(path, e))
    }
}

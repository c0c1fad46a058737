//! FTP upload driver
//!
//! Stores a stream with `STOR` on an FTP server. Logins default to the
//! anonymous account; transfers always run in binary mode so the bytes
//! stored are the bytes that were hashed.

use crate::core::{Credentials, Protocol, UploadTarget};
use crate::error::{PcfError, Result};
use crate::network::dial;
use std::io::Read;
use std::time::Duration;
use suppaftp::types::FileType;
use suppaftp::FtpStream;
use tracing::{debug, info};

/// Control connection that says `QUIT` when dropped
struct FtpSession {
    stream: FtpStream,
    address: String,
}

impl Drop for FtpSession {
    fn drop(&mut self) {
        if let Err(e) = self.stream.quit() {
            debug!(host = %self.address, "FTP quit failed: {}", e);
        }
    }
}

/// Uploads content to an FTP server
#[derive(Debug, Clone)]
pub struct FtpUploader {
    connect_timeout: Duration,
}

impl FtpUploader {
    /// Create an uploader with the given dial timeout
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Store `content` at `path/name` on the target server.
    ///
    /// Returns the number of bytes stored. Nothing is retried.
    pub fn upload(
        &self,
        target: &UploadTarget,
        name: &str,
        mut content: &mut dyn Read,
        credentials: &Credentials,
    ) -> Result<u64> {
        let address = target.address(Protocol::Ftp.default_port());
        debug!(host = %address, "connecting to FTP server");
        let stream = dial(&address, |socket| {
            FtpStream::connect_timeout(socket, self.connect_timeout)
        })?;

        let mut session = FtpSession {
            stream,
            address: address.clone(),
        };

        session
            .stream
            .login(credentials.user.as_str(), credentials.password.as_str())
            .map_err(|e| PcfError::auth(&credentials.user, &address, e.to_string()))?;

        let path = target.remote_path(name);

        session
            .stream
            .transfer_type(FileType::Binary)
            .map_err(|e| PcfError::remote(&path, e.to_string()))?;

        let bytes = session
            .stream
            .put_file(&path, &mut content)
            .map_err(|e| PcfError::remote(&path, e.to_string()))?;

        info!(
            host = %address,
            path = %path,
            "stored {}",
            humansize::format_size(bytes, humansize::BINARY)
        );

        Ok(bytes)
    }
}

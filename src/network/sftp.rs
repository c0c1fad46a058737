//! SSH/SFTP upload driver
//!
//! Opens an SSH session with password authentication, starts an SFTP
//! channel on it and writes the content stream to `path/name`. Anonymous
//! and authenticated SFTP share this driver and differ only in the
//! credentials they hand it.
//!
//! The server host key is not verified: any key is accepted. This is a
//! known trust gap of the tool.

use crate::core::{Credentials, Protocol, UploadTarget};
use crate::error::{PcfError, Result};
use crate::network::dial;
use ssh2::{Session, Sftp};
use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Copy buffer size (256KB)
const BUFFER_SIZE: usize = 256 * 1024;

/// Authenticated SSH session with an open SFTP channel.
///
/// The session is disconnected when the connection is dropped.
pub struct SftpConnection {
    /// SFTP channel, shut down before the session disconnects
    sftp: Option<Sftp>,
    /// SSH session
    session: Session,
    /// `host:port` for error context
    address: String,
}

impl SftpConnection {
    /// Dial, handshake, authenticate and start SFTP
    pub fn connect(
        target: &UploadTarget,
        credentials: &Credentials,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let address = target.address(Protocol::Sftp.default_port());
        debug!(host = %address, user = %credentials.user, "connecting to SSH server");
        let tcp = dial(&address, |socket| {
            TcpStream::connect_timeout(&socket, connect_timeout)
        })?;

        let mut session =
            Session::new().map_err(|e| PcfError::connection(&address, e.to_string()))?;

        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| PcfError::connection(&address, e.to_string()))?;

        session
            .userauth_password(&credentials.user, &credentials.password)
            .map_err(|e| PcfError::auth(&credentials.user, &address, e.to_string()))?;

        if !session.authenticated() {
            return Err(PcfError::auth(
                &credentials.user,
                &address,
                "Authentication failed",
            ));
        }

        let sftp = session.sftp().map_err(|e| {
            PcfError::connection(&address, e.to_string())
                .with_context("failed initializing sftp in ssh session")
        })?;

        Ok(Self {
            sftp: Some(sftp),
            session,
            address,
        })
    }

    /// Create (or truncate) `remote_path` and write `content` to it in full
    pub fn upload(&self, remote_path: &str, content: &mut dyn Read) -> Result<u64> {
        let sftp = self
            .sftp
            .as_ref()
            .ok_or_else(|| PcfError::remote(remote_path, "sftp channel closed"))?;

        let mut remote_file = sftp
            .create(Path::new(remote_path))
            .map_err(|e| PcfError::remote(remote_path, format!("failed creating file: {}", e)))?;

        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut bytes_copied = 0u64;

        loop {
            let bytes_read = match content.read(&mut buffer) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(PcfError::remote(
                        remote_path,
                        format!("failed reading upload content: {}", e),
                    ))
                }
            };

            if bytes_read == 0 {
                break;
            }

            remote_file
                .write_all(&buffer[..bytes_read])
                .map_err(|e| PcfError::remote(remote_path, e.to_string()))?;

            bytes_copied += bytes_read as u64;
        }

        remote_file
            .flush()
            .map_err(|e| PcfError::remote(remote_path, e.to_string()))?;
        remote_file
            .close()
            .map_err(|e| PcfError::remote(remote_path, format!("failed closing file: {}", e)))?;

        Ok(bytes_copied)
    }
}

impl Drop for SftpConnection {
    fn drop(&mut self) {
        drop(self.sftp.take());
        if let Err(e) = self.session.disconnect(None, "pcf upload finished", None) {
            debug!(host = %self.address, "SSH disconnect failed: {}", e);
        }
    }
}

/// Uploads content to an SFTP server
#[derive(Debug, Clone)]
pub struct SftpUploader {
    connect_timeout: Duration,
}

impl SftpUploader {
    /// Create an uploader with the given dial timeout
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    /// Store `content` at `path/name` on the target server.
    ///
    /// The SSH connection is closed before returning, on success and on error.
    pub fn upload(
        &self,
        target: &UploadTarget,
        name: &str,
        content: &mut dyn Read,
        credentials: &Credentials,
    ) -> Result<u64> {
        let connection = SftpConnection::connect(target, credentials, self.connect_timeout)?;
        let path = target.remote_path(name);
        let bytes = connection.upload(&path, content)?;

        info!(
            host = %connection.address,
            path = %path,
            "stored {}",
            humansize::format_size(bytes, humansize::BINARY)
        );

        Ok(bytes)
    }
}

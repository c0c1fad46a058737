//! Network transport drivers
//!
//! One driver per wire protocol:
//! - FTP with the anonymous-account convention
//! - SFTP over SSH, shared by the anonymous and authenticated modes
//!
//! Drivers receive already resolved credentials and a content stream, dial
//! with a fixed timeout, store the stream at `path/name` and close the
//! connection on every exit path.

mod ftp;
mod sftp;

pub use ftp::*;
pub use sftp::*;

use crate::error::{PcfError, Result};
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use tracing::debug;

/// Resolve `host:port` and dial each address in turn until one connects
pub(crate) fn dial<T, E, F>(address: &str, connect: F) -> Result<T>
where
    E: fmt::Display,
    F: FnMut(SocketAddr) -> std::result::Result<T, E>,
{
    let sockets = address
        .to_socket_addrs()
        .map_err(|e| PcfError::connection(address, e.to_string()))?;
    dial_each(address, sockets, connect)
}

/// Dial `sockets` in order; the last failure is reported if none connects
fn dial_each<T, E, F, I>(address: &str, sockets: I, mut connect: F) -> Result<T>
where
    E: fmt::Display,
    F: FnMut(SocketAddr) -> std::result::Result<T, E>,
    I: IntoIterator<Item = SocketAddr>,
{
    let mut last_error = None;

    for socket in sockets {
        match connect(socket) {
            Ok(connection) => return Ok(connection),
            Err(e) => {
                debug!(host = address, %socket, "dial failed: {}", e);
                last_error = Some(e.to_string());
            }
        }
    }

    Err(PcfError::connection(
        address,
        last_error.unwrap_or_else(|| "no addresses resolved".to_string()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_dial_falls_through_to_next_address() {
        let v6 = SocketAddr::from((Ipv6Addr::LOCALHOST, 21));
        let v4 = SocketAddr::from((Ipv4Addr::LOCALHOST, 21));

        let mut attempts = Vec::new();
        let connected = dial_each("paste.example.org:21", vec![v6, v4], |socket| {
            attempts.push(socket);
            if socket.is_ipv6() {
                Err("network unreachable")
            } else {
                Ok(socket)
            }
        })
        .unwrap();

        assert_eq!(connected, v4);
        assert_eq!(attempts, vec![v6, v4]);
    }

    #[test]
    fn test_dial_reports_last_failure() {
        let sockets = vec![
            SocketAddr::from((Ipv6Addr::LOCALHOST, 22)),
            SocketAddr::from((Ipv4Addr::LOCALHOST, 22)),
        ];

        let err = dial_each("paste.example.org:22", sockets, |socket| {
            Err::<(), _>(format!("refused by {}", socket))
        })
        .unwrap_err();

        assert!(err.is_connection_error());
        assert!(err.to_string().contains("paste.example.org:22"));
        assert!(err.to_string().contains("refused by 127.0.0.1:22"));
    }

    #[test]
    fn test_dial_without_addresses() {
        let err = dial_each("nowhere:21", Vec::new(), |_| Ok::<(), String>(())).unwrap_err();
        assert!(err.to_string().contains("no addresses resolved"));
    }
}

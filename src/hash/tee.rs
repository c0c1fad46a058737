//! Single-pass stream duplication
//!
//! A [`TeeReader`] hands every chunk it reads to a [`HashWriter`] before
//! returning it to the caller, so the digest covers the exact bytes the
//! transport consumed and the source never needs to be rewound.
//!
//! Transports report a failed read in their own terms, so the tee also keeps
//! the first read error for the caller to attribute to the local source.

use std::io::{self, Read};

/// Trait for hash writers that can receive streaming data
pub trait HashWriter {
    /// Update the hash with more data
    fn update(&mut self, data: &[u8]);
}

impl<H: HashWriter + ?Sized> HashWriter for &mut H {
    fn update(&mut self, data: &[u8]) {
        (**self).update(data);
    }
}

/// Reader that mirrors everything it reads into a hash writer
pub struct TeeReader<R, H> {
    inner: R,
    hasher: H,
    bytes_read: u64,
    read_error: Option<io::Error>,
}

impl<R: Read, H: HashWriter> TeeReader<R, H> {
    /// Wrap `inner`, feeding every byte read into `hasher`
    pub fn new(inner: R, hasher: H) -> Self {
        Self {
            inner,
            hasher,
            bytes_read: 0,
            read_error: None,
        }
    }

    /// Bytes passed through so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Borrow the hash writer
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Take the first non-retryable error returned by the inner reader
    pub fn take_read_error(&mut self) -> Option<io::Error> {
        self.read_error.take()
    }

    /// Release the reader and hash writer
    pub fn into_parts(self) -> (R, H) {
        (self.inner, self.hasher)
    }

    /// Drop the reader and keep the hash writer
    pub fn into_hasher(self) -> H {
        self.hasher
    }
}

impl<R: Read, H: HashWriter> Read for TeeReader<R, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = match self.inner.read(buf) {
            Ok(n) => n,
            Err(e) => {
                if e.kind() != io::ErrorKind::Interrupted && self.read_error.is_none() {
                    self.read_error = Some(io::Error::new(e.kind(), e.to_string()));
                }
                return Err(e);
            }
        };
        self.hasher.update(&buf[..n]);
        self.bytes_read += n as u64;
        Ok(n)
    }
}

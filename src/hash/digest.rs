//! SHA-1 digest naming
//!
//! The published name of an upload is `prefix + hex(sha1(content)) + ext`.
//! The digest is always taken over the bytes that went over the wire.

use crate::error::{PcfError, Result};
use crate::hash::HashWriter;
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Default read buffer (64KB)
const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Hash result as hex string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashResult {
    /// SHA-1 as lowercase hex string
    pub hash: String,
    /// Number of bytes hashed
    pub size: u64,
}

impl HashResult {
    /// Create a new hash result
    pub fn new(hash: String, size: u64) -> Self {
        Self { hash, size }
    }
}

impl std::fmt::Display for HashResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

/// Streaming SHA-1 hasher for upload-and-hash operations
#[derive(Clone, Default)]
pub struct StreamingHasher {
    hasher: Sha1,
    bytes_processed: u64,
}

impl StreamingHasher {
    /// Create a new streaming hasher
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a chunk of data
    pub fn process(&mut self, data: &[u8]) {
        Digest::update(&mut self.hasher, data);
        self.bytes_processed += data.len() as u64;
    }

    /// Get bytes processed so far
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }

    /// Finalize and get the result
    pub fn finalize(self) -> HashResult {
        HashResult::new(hex::encode(self.hasher.finalize()), self.bytes_processed)
    }
}

impl HashWriter for StreamingHasher {
    fn update(&mut self, data: &[u8]) {
        self.process(data);
    }
}

/// Compute hash of data in memory
pub fn hash_bytes(data: &[u8]) -> HashResult {
    let mut hasher = StreamingHasher::new();
    hasher.process(data);
    hasher.finalize()
}

/// Consume `reader` to exhaustion and hash it.
///
/// `path` only labels the error; a failed read aborts instead of yielding a
/// digest of partial content.
pub fn hash_reader<R: Read>(mut reader: R, path: &Path) -> Result<HashResult> {
    let mut hasher = StreamingHasher::new();
    let mut buffer = vec![0u8; DEFAULT_BUFFER_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PcfError::io(path, e)),
        };

        if bytes_read == 0 {
            break;
        }

        hasher.process(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}

/// Compute hash of a file
pub fn hash_file(path: &Path) -> Result<HashResult> {
    let file = File::open(path).map_err(|e| PcfError::io(path, e))?;
    hash_reader(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file), path)
}

/// Extension of the final path component, including the leading dot.
///
/// One leading dot of the file name is ignored first, so hidden files
/// such as `.gitignore` have no extension while `.config.toml` keeps `.toml`.
pub fn file_extension(path: &Path) -> String {
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy(),
        None => return String::new(),
    };

    let name = name.strip_prefix('.').unwrap_or(&name);
    match name.rfind('.') {
        Some(idx) => name[idx..].to_string(),
        None => String::new(),
    }
}

/// Join prefix, digest and the extension of `path`
pub fn compose_name(prefix: &str, digest: &HashResult, path: &Path) -> String {
    let extension = file_extension(path);
    let mut name = String::with_capacity(prefix.len() + digest.hash.len() + extension.len());
    name.push_str(prefix);
    name.push_str(&digest.hash);
    name.push_str(&extension);
    name
}

/// Hash `reader` and build the published name for `path`
pub fn hash_name<R: Read>(reader: R, path: &Path, prefix: &str) -> Result<String> {
    let digest = hash_reader(reader, path)?;
    Ok(compose_name(prefix, &digest, path))
}

//! Content digest and naming module
//!
//! Computes the SHA-1 digest of exactly the bytes sent to the server and
//! turns it into the published, content-addressed name. Hashing happens in
//! the same read pass as the upload through [`TeeReader`].

mod digest;
mod tee;

pub use digest::*;
pub use tee::*;

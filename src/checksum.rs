//! Content digest computation
//!
//! Every file captured in a snapshot is identified by the SHA-256 digest of
//! its content. Digests are computed over bounded-size reads so arbitrarily
//! large files never have to fit in memory, and they depend only on content:
//! timestamps and permissions do not affect the result. A read failure
//! always surfaces as an error; no partial digest is ever returned.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Chunk size for streaming file reads
const READ_BUFFER_SIZE: usize = 8192;

/// Compute the SHA-256 digest of a file's content
///
/// Reads the file in [`READ_BUFFER_SIZE`] chunks and returns the digest as a
/// 64-character lowercase hex string. Deterministic: identical bytes always
/// produce identical digests regardless of file metadata. An empty file
/// yields the well-defined SHA-256 empty-input digest and is a first-class
/// snapshot entry.
///
/// # Errors
///
/// Returns [`crate::error::VaultError::Io`] if the file cannot be opened or
/// a read fails mid-stream.
pub fn hash_file(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute the SHA-256 digest of in-memory bytes
///
/// Convenience for data already held in memory, such as manifest bytes read
/// out of an archive entry.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// SHA-256 of the empty input
    const EMPTY_DIGEST: &str =
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_hash_bytes_known_vector() {
        // SHA-256 test vector for "abc"
        assert_eq!(
            hash_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_bytes(b""), EMPTY_DIGEST);
    }

    #[test]
    fn test_hash_file_matches_hash_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.bin");
        fs::write(&path, b"slicer profile data").unwrap();

        assert_eq!(hash_file(&path).unwrap(), hash_bytes(b"slicer profile data"));
    }

    #[test]
    fn test_hash_file_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty");
        fs::write(&path, b"").unwrap();

        assert_eq!(hash_file(&path).unwrap(), EMPTY_DIGEST);
    }

    #[test]
    fn test_hash_file_spans_multiple_chunks() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("large.bin");
        // Three full chunks plus a partial one
        let data = vec![0xA5u8; READ_BUFFER_SIZE * 3 + 17];
        fs::write(&path, &data).unwrap();

        assert_eq!(hash_file(&path).unwrap(), hash_bytes(&data));
    }

    #[test]
    fn test_hash_file_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = hash_file(&temp_dir.path().join("does_not_exist"));
        assert!(result.is_err());
    }
}

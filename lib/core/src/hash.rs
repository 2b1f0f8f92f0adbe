//! Content hashing for exact-duplicate detection
//!
//! Digests are lowercase hex SHA-256, 64 characters long.

use crate::{Error, Result};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Length of a hex digest in characters
pub const DIGEST_HEX_LEN: usize = 64;

const READ_BUFFER_SIZE: usize = 8192;

/// Digest of an in-memory byte slice
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Streaming digest of everything readable from `reader`.
///
/// Returns the digest and the number of bytes consumed.
pub fn hash_reader<R: Read>(mut reader: R) -> Result<(String, u64)> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; READ_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        total += n as u64;
    }

    Ok((format!("{:x}", hasher.finalize()), total))
}

/// Digest and size of a file on disk
pub fn hash_file<P: AsRef<Path>>(path: P) -> Result<(String, u64)> {
    let file = File::open(path.as_ref())?;
    hash_reader(BufReader::new(file))
}

/// Hash many files in parallel. Each path gets its own result so one
/// unreadable file does not hide the others.
pub fn hash_files(paths: &[PathBuf]) -> Vec<(PathBuf, Result<(String, u64)>)> {
    paths
        .par_iter()
        .map(|path| (path.clone(), hash_file(path)))
        .collect()
}

/// Hash many files, failing if any one of them cannot be read.
///
/// Results keep the order of `paths`. The error names the first unreadable
/// path in that order.
pub fn hash_all(paths: &[PathBuf]) -> Result<Vec<(PathBuf, String, u64)>> {
    hash_files(paths)
        .into_iter()
        .map(|(path, result)| match result {
            Ok((digest, size)) => Ok((path, digest, size)),
            Err(e) => Err(Error::Unreadable {
                reason: e.to_string(),
                path,
            }),
        })
        .collect()
}

/// Whether two files have identical contents
pub fn verify_identical<P: AsRef<Path>, Q: AsRef<Path>>(a: P, b: Q) -> Result<bool> {
    let (digest_a, _) = hash_file(a)?;
    let (digest_b, _) = hash_file(b)?;
    Ok(digest_a == digest_b)
}

/// Whether `s` looks like a digest produced by this module
pub fn is_valid_digest(s: &str) -> bool {
    s.len() == DIGEST_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_input_digest() {
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_is_stable() {
        let data = b"Hello, World!";
        let first = hash_bytes(data);
        assert_eq!(first, hash_bytes(data));
        assert!(is_valid_digest(&first));
    }

    #[test]
    fn test_reader_matches_bytes() {
        let data: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let (digest, size) = hash_reader(&data[..]).unwrap();
        assert_eq!(digest, hash_bytes(&data));
        assert_eq!(size, data.len() as u64);
    }

    #[test]
    fn test_identical_files() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.csv");
        let b = temp_dir.path().join("b.csv");
        let c = temp_dir.path().join("c.csv");
        fs::write(&a, b"name,age\nAlice,30\n").unwrap();
        fs::write(&b, b"name,age\nAlice,30\n").unwrap();
        fs::write(&c, b"name,age\nBob,40\n").unwrap();

        assert!(verify_identical(&a, &b).unwrap());
        assert!(!verify_identical(&a, &c).unwrap());
    }

    #[test]
    fn test_batch_hashing() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.csv");
        let missing = temp_dir.path().join("missing.csv");
        fs::write(&a, b"x").unwrap();

        let results = hash_files(&[a.clone(), missing.clone()]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, a);
        assert_eq!(results[0].1.as_ref().unwrap().1, 1);
        assert!(results[1].1.is_err());
    }

    #[test]
    fn test_hash_all_fails_on_any_unreadable_file() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.csv");
        let b = temp_dir.path().join("b.csv");
        let missing = temp_dir.path().join("missing.csv");
        fs::write(&a, b"x").unwrap();
        fs::write(&b, b"yz").unwrap();

        let hashed = hash_all(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(hashed[0], (a.clone(), hash_bytes(b"x"), 1));
        assert_eq!(hashed[1].0, b);

        match hash_all(&[a, missing.clone(), b]) {
            Err(Error::Unreadable { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected Unreadable, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_digest_shapes() {
        assert!(!is_valid_digest("abc123"));
        assert!(!is_valid_digest(&"G".repeat(64)));
        assert!(!is_valid_digest(&"A".repeat(64)));
    }
}

//! Content fingerprints (SHA-256) of captures.
//!
//! Used to spot byte-identical captures under different timestamps so they
//! can share one physical file.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// SHA-256 of an in-memory capture body as lowercase hex.
pub fn sha256_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 of a persisted file as lowercase hex; streams the file, so it
/// agrees with [`sha256_bytes`] on the body that was written.
pub fn sha256_path(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut BufReader::new(file), &mut hasher)
        .with_context(|| format!("read {}", path.display()))?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn empty_body() {
        assert_eq!(sha256_bytes(b""), EMPTY);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("20200101000000_empty.bin");
        fs::write(&path, b"").unwrap();
        assert_eq!(sha256_path(&path).unwrap(), EMPTY);
    }

    #[test]
    fn persisted_file_matches_fetched_body() {
        let body = b"hello\n";
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("20200101000000_hello.txt");
        fs::write(&path, body).unwrap();
        assert_eq!(
            sha256_path(&path).unwrap(),
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );
        assert_eq!(sha256_bytes(body), sha256_path(&path).unwrap());
        assert_ne!(sha256_bytes(b"hello"), sha256_bytes(body));
    }

    #[test]
    fn missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = sha256_path(&dir.path().join("nope")).unwrap_err();
        assert!(err.to_string().starts_with("open "));
    }
}

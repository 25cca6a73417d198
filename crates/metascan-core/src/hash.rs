//! SHA-1 file fingerprinting.
//!
//! MetaDefender keys its hash-lookup cache on SHA-1, so the digest choice is
//! fixed by the service, not by us.

use std::fs;
use std::io::Read;
use std::path::Path;

use sha1::{Digest, Sha1};

use crate::error::{Result, ScanError};

const CHUNK_SIZE: usize = 1024;

/// Compute the lowercase hex SHA-1 digest of a file, streaming in
/// 1024-byte chunks so large files never load whole into memory.
pub fn sha1_file(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ScanError::FileNotFound(path.to_path_buf())
        } else {
            ScanError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let mut hasher = Sha1::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

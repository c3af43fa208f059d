//! Content fingerprints used as duplicate-detection keys.

use crate::error::{OrganizeError, OrganizeResult};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Streams whole files through SHA-256.
pub struct ContentFingerprinter;

impl ContentFingerprinter {
    /// Returns the lowercase hex SHA-256 digest of the complete file content.
    ///
    /// The whole file is consumed, so any single-byte difference changes the
    /// fingerprint. Open and read failures are returned as
    /// [`OrganizeError::Fingerprint`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mediatidy::fingerprint::ContentFingerprinter;
    /// use std::path::Path;
    ///
    /// let hash = ContentFingerprinter::fingerprint(Path::new("photo.jpg")).unwrap();
    /// assert_eq!(hash.len(), 64);
    /// ```
    pub fn fingerprint(path: &Path) -> OrganizeResult<String> {
        let wrap = |source| OrganizeError::Fingerprint {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(wrap)?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        loop {
            let n = file.read(&mut buffer).map_err(wrap)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        let hash = format!("{:x}", hasher.finalize());
        log::trace!("Fingerprint for {:?}: {}", path, hash);
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_fingerprint_known_digest() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("abc.jpg");
        fs::write(&path, b"abc").expect("Failed to write test file");

        let hash = ContentFingerprinter::fingerprint(&path).expect("Failed to hash");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fingerprint_is_content_based() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("a.png");
        let b = temp_dir.path().join("b.png");
        let c = temp_dir.path().join("c.png");
        fs::write(&a, b"same bytes").unwrap();
        fs::write(&b, b"same bytes").unwrap();
        fs::write(&c, b"same byteS").unwrap();

        let ha = ContentFingerprinter::fingerprint(&a).unwrap();
        let hb = ContentFingerprinter::fingerprint(&b).unwrap();
        let hc = ContentFingerprinter::fingerprint(&c).unwrap();
        assert_eq!(ha, hb);
        assert_ne!(ha, hc);
        assert_eq!(ha.len(), 64);
    }

    #[test]
    fn test_fingerprint_reads_past_buffer_boundary() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("big_a.mp4");
        let b = temp_dir.path().join("big_b.mp4");
        let mut content = vec![7u8; READ_BUFFER_SIZE * 3 + 17];
        fs::write(&a, &content).unwrap();
        *content.last_mut().unwrap() = 8;
        fs::write(&b, &content).unwrap();

        assert_ne!(
            ContentFingerprinter::fingerprint(&a).unwrap(),
            ContentFingerprinter::fingerprint(&b).unwrap()
        );
    }

    #[test]
    fn test_fingerprint_missing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("gone.jpg");

        let err = ContentFingerprinter::fingerprint(&missing).unwrap_err();
        assert!(matches!(err, OrganizeError::Fingerprint { .. }));
        assert_eq!(err.path(), Some(missing.as_path()));
    }
}

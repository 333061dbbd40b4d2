//! The two identity keys of a file: a digest of its exact bytes and a digest
//! of its acoustic fingerprint.

use crate::error::Error;
use crate::media::FingerprintExtractor;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// BLAKE3 digest of a file's full byte content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest(blake3::Hash);

/// BLAKE3 digest of an acoustic fingerprint string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FingerprintDigest(blake3::Hash);

impl ContentDigest {
    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

impl FingerprintDigest {
    pub fn from_fingerprint(fingerprint: &str) -> Self {
        Self(blake3::hash(fingerprint.as_bytes()))
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl fmt::Display for FingerprintDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

/// Streams the file through the hasher without loading it whole.
pub fn content_digest(path: &Path) -> io::Result<ContentDigest> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(ContentDigest(hasher.finalize()))
}

pub struct IdentityEngine {
    extractor: Box<dyn FingerprintExtractor>,
}

impl IdentityEngine {
    pub fn new(extractor: Box<dyn FingerprintExtractor>) -> Self {
        Self { extractor }
    }

    pub fn content_digest(&self, path: &Path) -> Result<ContentDigest, Error> {
        Ok(content_digest(path)?)
    }

    pub fn fingerprint_digest(&self, path: &Path) -> Result<FingerprintDigest, Error> {
        let fingerprint = self.extractor.fingerprint(path)?;
        Ok(FingerprintDigest::from_fingerprint(&fingerprint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    struct StemFingerprints;

    impl FingerprintExtractor for StemFingerprints {
        fn fingerprint(&self, path: &Path) -> Result<String, Error> {
            Ok(path.file_stem().unwrap().to_string_lossy().into_owned())
        }
    }

    #[test]
    fn test_content_digest_matches_bytes_not_names() {
        let tmp = tempdir().unwrap();
        let a = tmp.path().join("song.mp3");
        let b = tmp.path().join("song_copy.mp3");
        let c = tmp.path().join("other.mp3");
        fs::write(&a, b"ID3 same bytes").unwrap();
        fs::write(&b, b"ID3 same bytes").unwrap();
        fs::write(&c, b"ID3 other bytes").unwrap();

        let da = content_digest(&a).unwrap();
        assert_eq!(da, content_digest(&b).unwrap());
        assert_ne!(da, content_digest(&c).unwrap());
        assert_eq!(da.to_hex(), blake3::hash(b"ID3 same bytes").to_hex().to_string());
        assert_eq!(da.to_hex().len(), 64);
    }

    #[test]
    fn test_content_digest_of_large_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("big.wav");
        let data = vec![0x5Au8; READ_BUFFER_SIZE * 3 + 17];
        fs::write(&path, &data).unwrap();
        assert_eq!(
            content_digest(&path).unwrap().to_hex(),
            blake3::hash(&data).to_hex().to_string()
        );
    }

    #[test]
    fn test_fingerprint_shared_across_encodings() {
        let tmp = tempdir().unwrap();
        let flac = tmp.path().join("track.flac");
        let mp3 = tmp.path().join("track.mp3");
        fs::write(&flac, b"fLaC....").unwrap();
        fs::write(&mp3, b"ID3.....").unwrap();

        let engine = IdentityEngine::new(Box::new(StemFingerprints));
        let fp_flac = engine.fingerprint_digest(&flac).unwrap();
        let fp_mp3 = engine.fingerprint_digest(&mp3).unwrap();
        assert_ne!(
            engine.content_digest(&flac).unwrap(),
            engine.content_digest(&mp3).unwrap()
        );
        assert_eq!(fp_flac, fp_mp3);
        assert_eq!(fp_flac, FingerprintDigest::from_fingerprint("track"));
    }

    #[test]
    fn test_unreadable_file_fails_content_digest() {
        let tmp = tempdir().unwrap();
        let engine = IdentityEngine::new(Box::new(StemFingerprints));
        assert!(matches!(
            engine.content_digest(&tmp.path().join("gone.mp3")),
            Err(Error::Io(_))
        ));
    }
}

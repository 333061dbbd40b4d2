use crate::error::Error;
use rand::distr::Alphanumeric;
use rand::Rng;
use std::ffi::{OsStr, OsString};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const PREFIX_LENGTH: usize = 8;
const MAX_NAME_ATTEMPTS: usize = 16;

/// Directory receiving one copy of every first-seen file.
#[derive(Debug, Clone)]
pub struct Destination {
    root: PathBuf,
}

impl Destination {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copies `source` in as `<prefix>-<basename>`, keeping the basename's
    /// raw bytes. The target is created exclusively, so an existing file is
    /// never overwritten.
    pub fn copy_in(&self, source: &Path) -> Result<PathBuf, Error> {
        let basename = source
            .file_name()
            .ok_or_else(|| Error::Other(format!("No file name in {}", source.display())))?;

        let mut reader = File::open(source)?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let target = self.root.join(prefixed_name(basename));
            let mut writer = match OpenOptions::new().write(true).create_new(true).open(&target) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("Name clash on {}, drawing another prefix", target.display());
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = io::copy(&mut reader, &mut writer).and_then(|_| writer.sync_all()) {
                drop(writer);
                if let Err(cleanup) = fs::remove_file(&target) {
                    warn!("Could not remove partial copy {}: {}", target.display(), cleanup);
                }
                return Err(e.into());
            }
            return Ok(target);
        }

        Err(Error::Other(format!(
            "No free destination name for {} after {} attempts",
            source.display(),
            MAX_NAME_ATTEMPTS
        )))
    }

    /// Removes a file this destination created.
    pub fn remove(&self, path: &Path) -> Result<(), Error> {
        if !path.starts_with(&self.root) {
            return Err(Error::Other(format!(
                "{} is outside destination {}",
                path.display(),
                self.root.display()
            )));
        }
        fs::remove_file(path)?;
        Ok(())
    }

    /// Original basenames of every file currently in the destination.
    pub fn original_basenames(&self) -> Result<Vec<String>, Error> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let name = entry.file_name().to_string_lossy().into_owned();
                names.push(original_basename(&name).to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn prefixed_name(basename: &OsStr) -> OsString {
    let mut name = OsString::from(random_prefix());
    name.push("-");
    name.push(basename);
    name
}

fn random_prefix() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(PREFIX_LENGTH)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Strips the collision prefix from a destination file name. Names without
/// one come back unchanged.
pub fn original_basename(name: &str) -> &str {
    match name.split_once('-') {
        Some((prefix, rest))
            if prefix.len() == PREFIX_LENGTH
                && prefix.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            rest
        }
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_copy_in_prefixes_and_preserves_bytes() {
        let tmp = tempdir().unwrap();
        let source = tmp.path().join("song.mp3");
        fs::write(&source, b"ID3 payload").unwrap();
        let dest = Destination::open(tmp.path().join("library")).unwrap();

        let first = dest.copy_in(&source).unwrap();
        let second = dest.copy_in(&source).unwrap();
        assert_ne!(first, second);

        for copied in [&first, &second] {
            assert_eq!(fs::read(copied).unwrap(), b"ID3 payload");
            let name = copied.file_name().unwrap().to_str().unwrap();
            assert_eq!(name.len(), PREFIX_LENGTH + 1 + "song.mp3".len());
            assert_eq!(original_basename(name), "song.mp3");
        }
        assert_eq!(dest.original_basenames().unwrap(), vec!["song.mp3", "song.mp3"]);
    }

    #[test]
    fn test_copy_in_missing_source_leaves_nothing() {
        let tmp = tempdir().unwrap();
        let dest = Destination::open(tmp.path().join("library")).unwrap();
        assert!(dest.copy_in(&tmp.path().join("gone.mp3")).is_err());
        assert!(dest.original_basenames().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_in_keeps_raw_basename_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let tmp = tempdir().unwrap();
        let latin1 = OsStr::from_bytes(b"caf\xe9.mp3");
        let source = tmp.path().join(latin1);
        fs::write(&source, b"ID3 latin-1 name").unwrap();
        let dest = Destination::open(tmp.path().join("library")).unwrap();

        let copied = dest.copy_in(&source).unwrap();
        let name = copied.file_name().unwrap().as_bytes();
        assert_eq!(&name[PREFIX_LENGTH..], b"-caf\xe9.mp3");
        assert_eq!(fs::read(&copied).unwrap(), b"ID3 latin-1 name");
    }

    #[test]
    fn test_original_basename() {
        assert_eq!(original_basename("a1b2c3d4-My Song - Live.flac"), "My Song - Live.flac");
        assert_eq!(original_basename("plain.mp3"), "plain.mp3");
        assert_eq!(original_basename("short-name.mp3"), "short-name.mp3");
    }

    #[test]
    fn test_remove_refuses_outside_paths() {
        let tmp = tempdir().unwrap();
        let outside = tmp.path().join("keep.mp3");
        fs::write(&outside, b"x").unwrap();
        let dest = Destination::open(tmp.path().join("library")).unwrap();
        assert!(dest.remove(&outside).is_err());
        assert!(outside.exists());

        let source = tmp.path().join("x.mp3");
        fs::write(&source, b"y").unwrap();
        let copied = dest.copy_in(&source).unwrap();
        dest.remove(&copied).unwrap();
        assert!(!copied.exists());
    }
}

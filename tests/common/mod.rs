#![allow(dead_code)]

use audio_duper::index::{IgnoredList, KvStore, MemoryStore, IGNORED_INDEX_FILE};
use audio_duper::media::FormatInfo;
use audio_duper::{
    DedupIndex, Destination, Error, FingerprintExtractor, MediaInfo, MediaProbe, Pipeline,
    ScanFilter, StreamInfo,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Probe that decides by extension. `broken*` files fail every probe and
/// `flaky*` files fail every probe after the first.
#[derive(Default)]
pub struct FakeProbe {
    calls: Mutex<HashMap<PathBuf, usize>>,
}

impl MediaProbe for FakeProbe {
    fn probe(&self, path: &Path) -> Result<MediaInfo, Error> {
        let calls = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(path.to_path_buf()).or_insert(0);
            *count += 1;
            *count
        };

        let stem = path.file_stem().unwrap().to_string_lossy().into_owned();
        if stem.starts_with("broken") || (stem.starts_with("flaky") && calls > 1) {
            return Err(Error::Probe {
                path: path.to_path_buf(),
                message: "Invalid data found when processing input".to_string(),
            });
        }

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let streams = match ext.as_str() {
            "mp3" | "flac" | "m4a" => {
                let mut audio = StreamInfo::of_kind("audio");
                audio.codec_name = Some(ext.clone());
                audio.sample_rate = Some("44100".to_string());
                audio.channels = Some(2);
                // embedded cover art shows up as a video stream
                let mut art = StreamInfo::of_kind("video");
                art.codec_name = Some("mjpeg".to_string());
                vec![audio, art]
            }
            "jpg" | "png" => {
                let mut art = StreamInfo::of_kind("video");
                art.codec_name = Some("mjpeg".to_string());
                vec![art]
            }
            _ => vec![],
        };

        Ok(MediaInfo {
            streams,
            format: Some(FormatInfo {
                filename: Some(path.to_string_lossy().into_owned()),
                format_name: Some(ext),
                ..Default::default()
            }),
        })
    }
}

/// Fingerprint = file stem, so `track.flac` and `track.mp3` sound the same.
/// `undecodable*` files fail.
pub struct StemFingerprints;

impl FingerprintExtractor for StemFingerprints {
    fn fingerprint(&self, path: &Path) -> Result<String, Error> {
        let stem = path.file_stem().unwrap().to_string_lossy().into_owned();
        if stem.starts_with("undecodable") {
            return Err(Error::Fingerprint {
                path: path.to_path_buf(),
                message: "unsupported codec".to_string(),
            });
        }
        Ok(format!("AQAD-{}", stem))
    }
}

/// Store that reads as empty and rejects every write.
pub struct ReadOnlyStore;

impl KvStore for ReadOnlyStore {
    fn get(&self, _key: &[u8]) -> Result<Option<Vec<u8>>, Error> {
        Ok(None)
    }

    fn put(&self, _key: &[u8], _value: &[u8]) -> Result<(), Error> {
        Err(Error::Other("store is read-only".to_string()))
    }

    fn entries(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>, Error> {
        Ok(Vec::new())
    }

    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}

pub struct Workspace {
    pub tmp: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            tmp: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn source(&self, name: &str) -> PathBuf {
        let dir = self.root().join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn dest_dir(&self) -> PathBuf {
        self.root().join("dest")
    }

    pub fn index_dir(&self) -> PathBuf {
        self.root().join("index")
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline_with_dest(&self.dest_dir())
    }

    pub fn pipeline_with_dest(&self, dest: &Path) -> Pipeline {
        let index = DedupIndex::open(&self.index_dir()).unwrap();
        let destination = Destination::open(dest).unwrap();
        Pipeline::new(
            index,
            destination,
            Box::new(FakeProbe::default()),
            Box::new(StemFingerprints),
            ScanFilter::default(),
        )
    }

    /// In-memory index whose content collection sits on `content_store`.
    pub fn pipeline_with_content_store(&self, content_store: Box<dyn KvStore>) -> Pipeline {
        let ignored = IgnoredList::load(&self.index_dir().join(IGNORED_INDEX_FILE)).unwrap();
        let index = DedupIndex::from_parts(
            content_store,
            Box::new(MemoryStore::new()),
            Box::new(MemoryStore::new()),
            ignored,
        );
        let destination = Destination::open(self.dest_dir()).unwrap();
        Pipeline::new(
            index,
            destination,
            Box::new(FakeProbe::default()),
            Box::new(StemFingerprints),
            ScanFilter::default(),
        )
    }

    pub fn dest_files(&self) -> Vec<String> {
        list_files(&self.dest_dir())
    }
}

pub fn write(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, bytes).unwrap();
}

pub fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

pub fn p(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

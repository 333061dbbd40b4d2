//! Media collaborators: stream probing and acoustic fingerprinting.
//!
//! Both are traits so the pipeline can run against the real `ffprobe` and
//! `fpcalc` executables or against in-process fakes.

mod ffprobe;
mod fpcalc;

pub use ffprobe::FfprobeProbe;
pub use fpcalc::FpcalcExtractor;

use crate::error::Error;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::process::{Command, Stdio};

pub const AUDIO_CODEC_TYPE: &str = "audio";

/// Structured description of a file's media streams.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    #[serde(default)]
    pub streams: Vec<StreamInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    #[serde(default)]
    pub codec_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Remaining probe fields, kept so duplicate provenance is lossless.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_rate: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MediaInfo {
    pub fn has_audio(&self) -> bool {
        self.streams
            .iter()
            .any(|stream| stream.codec_type == AUDIO_CODEC_TYPE)
    }
}

impl StreamInfo {
    pub fn of_kind(codec_type: &str) -> Self {
        Self {
            codec_type: codec_type.to_string(),
            ..Default::default()
        }
    }
}

pub trait MediaProbe {
    fn probe(&self, path: &Path) -> Result<MediaInfo, Error>;
}

pub trait FingerprintExtractor {
    /// Returns the acoustic fingerprint string for the decoded audio.
    fn fingerprint(&self, path: &Path) -> Result<String, Error>;
}

/// Check that an external tool answers `-version`.
pub fn tool_available(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

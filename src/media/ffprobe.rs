use super::{MediaInfo, MediaProbe};
use crate::error::Error;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::trace;

/// Probes files by running `ffprobe` and parsing its JSON output.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: String,
}

impl FfprobeProbe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl MediaProbe for FfprobeProbe {
    fn probe(&self, path: &Path) -> Result<MediaInfo, Error> {
        trace!("ffprobe {}", path.display());
        let output = Command::new(&self.program)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::Probe {
                path: path.to_path_buf(),
                message: format!("could not run {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Probe {
                path: path.to_path_buf(),
                message: format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
            });
        }

        parse_probe_output(path, &output.stdout)
    }
}

fn parse_probe_output(path: &Path, stdout: &[u8]) -> Result<MediaInfo, Error> {
    serde_json::from_slice(stdout).map_err(|e| Error::Probe {
        path: path.to_path_buf(),
        message: format!("JSON parse error: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        let stdout = br#"{
            "streams": [
                {"index": 0, "codec_type": "audio", "codec_name": "mp3", "sample_rate": "44100", "channels": 2},
                {"index": 1, "codec_type": "video", "codec_name": "mjpeg"}
            ],
            "format": {"filename": "a.mp3", "format_name": "mp3", "duration": "212.4"}
        }"#;
        let info = parse_probe_output(Path::new("a.mp3"), stdout).unwrap();
        assert!(info.has_audio());
        assert_eq!(info.streams.len(), 2);
        assert_eq!(info.streams[0].sample_rate.as_deref(), Some("44100"));
        assert_eq!(info.streams[1].extra["index"], 1);
        assert_eq!(
            info.format.as_ref().and_then(|f| f.format_name.as_deref()),
            Some("mp3")
        );
    }

    #[test]
    fn test_empty_probe_output_has_no_audio() {
        let info = parse_probe_output(Path::new("x"), b"{}").unwrap();
        assert!(!info.has_audio());
    }

    #[test]
    fn test_garbage_probe_output_is_probe_error() {
        let result = parse_probe_output(Path::new("broken.mp3"), b"not json");
        assert!(matches!(result, Err(Error::Probe { .. })));
    }

    #[test]
    fn test_missing_program_is_probe_error() {
        let probe = FfprobeProbe::new("definitely-not-an-ffprobe-binary");
        let result = probe.probe(Path::new("song.mp3"));
        assert!(matches!(result, Err(Error::Probe { .. })));
    }
}

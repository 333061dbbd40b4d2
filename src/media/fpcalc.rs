use super::FingerprintExtractor;
use crate::error::Error;
use serde::Deserialize;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::trace;

/// Chromaprint fingerprints through the `fpcalc` command line tool.
#[derive(Debug, Clone)]
pub struct FpcalcExtractor {
    program: String,
}

#[derive(Debug, Deserialize)]
struct FpcalcOutput {
    #[allow(dead_code)]
    duration: Option<f64>,
    fingerprint: String,
}

impl FpcalcExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FpcalcExtractor {
    fn default() -> Self {
        Self::new("fpcalc")
    }
}

impl FingerprintExtractor for FpcalcExtractor {
    fn fingerprint(&self, path: &Path) -> Result<String, Error> {
        trace!("fpcalc {}", path.display());
        let output = Command::new(&self.program)
            .arg("-json")
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::Fingerprint {
                path: path.to_path_buf(),
                message: format!("could not run {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Fingerprint {
                path: path.to_path_buf(),
                message: format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
            });
        }

        parse_fpcalc_output(path, &output.stdout)
    }
}

fn parse_fpcalc_output(path: &Path, stdout: &[u8]) -> Result<String, Error> {
    let parsed: FpcalcOutput = serde_json::from_slice(stdout).map_err(|e| Error::Fingerprint {
        path: path.to_path_buf(),
        message: format!("JSON parse error: {}", e),
    })?;

    if parsed.fingerprint.is_empty() {
        return Err(Error::Fingerprint {
            path: path.to_path_buf(),
            message: "empty fingerprint".to_string(),
        });
    }
    Ok(parsed.fingerprint)
}

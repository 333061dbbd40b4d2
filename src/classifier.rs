use crate::error::Error;
use crate::index::IgnoredList;
use crate::media::{MediaInfo, MediaProbe};
use crate::scanner::CandidateFile;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Audio(MediaInfo),
    NonAudio,
}

/// Probes `file` and decides whether it carries audio. Non-audio files are
/// recorded in `ignored`; a probe failure records nothing.
pub fn classify(
    probe: &dyn MediaProbe,
    file: &CandidateFile,
    ignored: &mut IgnoredList,
) -> Result<Classification, Error> {
    let path = file.index_path()?;
    let media = probe.probe(file.path())?;

    if media.has_audio() {
        return Ok(Classification::Audio(media));
    }

    if ignored.append(path) {
        debug!("Ignoring non-audio file {}", path);
    } else {
        debug!("Non-audio file {} already ignored", path);
    }
    Ok(Classification::NonAudio)
}

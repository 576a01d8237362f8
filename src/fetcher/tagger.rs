use std::path::Path;

use error_stack::{IntoReport, ResultExt};
use id3::{ErrorKind, Tag, TagLike, Version};

use crate::fetcher::{FetcherError, FetcherResult};
use crate::manifest::TrackRecord;

// ID3v2.4 recording time, what most players show as the year
const RECORDING_TIME_FRAME: &str = "TDRC";

pub trait TagWriter: Send + Sync {
    fn write_tags(&self, path: &Path, track: &TrackRecord) -> FetcherResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct Id3TagWriter;

impl TagWriter for Id3TagWriter {
    fn write_tags(&self, path: &Path, track: &TrackRecord) -> FetcherResult<()> {
        let mut tag = match Tag::read_from_path(path) {
            Ok(tag) => tag,
            Err(err) if matches!(err.kind, ErrorKind::NoTag) => {
                log::debug!("{} has no ID3 tag, creating one", path.display());
                Tag::new()
            }
            Err(err) => {
                return Err(err)
                    .into_report()
                    .attach_printable(format!("Failed to read tags of {}", path.display()))
                    .change_context(FetcherError)
            }
        };

        if !track.title.is_empty() {
            tag.set_title(track.title.as_str());
        }
        if !track.artist.is_empty() {
            tag.set_artist(track.artist.as_str());
        }
        if !track.album.is_empty() {
            tag.set_album(track.album.as_str());
        }
        if !track.genre.is_empty() {
            tag.set_genre(track.genre.as_str());
        }
        if !track.year.is_empty() {
            tag.set_text(RECORDING_TIME_FRAME, track.year.as_str());
        }

        tag.write_to_path(path, Version::Id3v24)
            .into_report()
            .attach_printable(format!("Failed to write tags to {}", path.display()))
            .change_context(FetcherError)
    }
}

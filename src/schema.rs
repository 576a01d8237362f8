use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// Every column a playlist manifest can carry.
///
/// The machine key is what the configuration and lookups use, the export label
/// is what the playlist exports (and therefore the manifest headers) show to
/// humans. Keeping both here means neither stage depends on the other's
/// spelling of a header.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum TrackField {
    Title,
    Artist,
    Author,
    Album,
    Group,
    Genre,
    Year,
    SourceLink,
}

impl TrackField {
    pub fn key(&self) -> &'static str {
        match self {
            TrackField::Title => "title",
            TrackField::Artist => "artist",
            TrackField::Author => "author",
            TrackField::Album => "album",
            TrackField::Group => "group",
            TrackField::Genre => "genre",
            TrackField::Year => "year",
            TrackField::SourceLink => "source_link",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrackField::Title => "Название",
            TrackField::Artist => "Артист",
            TrackField::Author => "Автор",
            TrackField::Album => "Альбом",
            TrackField::Group => "Группа",
            TrackField::Genre => "Жанр",
            TrackField::Year => "Год",
            TrackField::SourceLink => "YouTube URL",
        }
    }

    /// Columns kept by the normalizer when the configuration doesn't say otherwise.
    pub fn default_retained() -> Vec<TrackField> {
        Self::iter()
            .filter(|field| *field != TrackField::SourceLink)
            .collect()
    }

    /// Exact lookup, used on raw playlist exports.
    pub fn from_export_header(header: &str) -> Option<Self> {
        Self::iter().find(|field| field.label() == header || field.key() == header)
    }

    /// Lenient lookup, used on manifests that may have been edited by hand.
    pub fn from_manifest_header(header: &str) -> Option<Self> {
        let header = header.trim().to_lowercase();
        Self::iter().find(|field| {
            field.label().to_lowercase() == header || field.key() == header
        })
    }
}

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;

use error_stack::{IntoReport, Report, ResultExt};

use crate::schema::TrackField;
use crate::utils::sanitize_file_name;

pub const MANIFEST_DELIMITER: u8 = b';';
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug)]
pub struct ManifestError;

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Manifest error")
    }
}

impl std::error::Error for ManifestError {}

pub type ManifestResult<T> = error_stack::Result<T, ManifestError>;

/// One row of a manifest. Empty strings mean the value is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackRecord {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub year: String,
    pub source_link: String,
}

impl TrackRecord {
    pub fn is_actionable(&self) -> bool {
        !self.title.is_empty()
    }

    pub fn has_source_link(&self) -> bool {
        !self.source_link.is_empty()
    }

    /// `"<artist> - <title>.<extension>"` with characters the file system rejects removed.
    pub fn artifact_file_name(&self, extension: &str) -> String {
        sanitize_file_name(&format!("{} - {}.{}", self.artist, self.title, extension))
    }

    fn set(&mut self, field: TrackField, value: &str) {
        let value = value.trim().to_string();
        match field {
            TrackField::Title => self.title = value,
            TrackField::Artist => self.artist = value,
            TrackField::Album => self.album = value,
            TrackField::Genre => self.genre = value,
            TrackField::Year => self.year = value,
            TrackField::SourceLink => self.source_link = value,
            // kept in the manifest for the operator, not used for downloads
            TrackField::Author | TrackField::Group => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct Manifest {
    pub name: String,
    pub records: Vec<TrackRecord>,
}

impl Manifest {
    pub fn read(path: &Path) -> ManifestResult<Self> {
        let bytes = fs::read(path)
            .into_report()
            .attach_printable(format!("Failed to read manifest {}", path.display()))
            .change_context(ManifestError)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .ok_or(ManifestError)
            .into_report()
            .attach_printable(format!("Manifest path has no file name: {}", path.display()))?;
        let records = Self::parse(&bytes)
            .attach_printable(format!("Failed to parse manifest {}", path.display()))?;
        Ok(Self { name, records })
    }

    pub fn parse(bytes: &[u8]) -> ManifestResult<Vec<TrackRecord>> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let text = std::str::from_utf8(bytes)
            .into_report()
            .attach_printable("Manifest is not valid utf-8")
            .change_context(ManifestError)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(MANIFEST_DELIMITER)
            .flexible(true)
            .from_reader(text.as_bytes());

        let columns = reader
            .headers()
            .into_report()
            .change_context(ManifestError)?
            .iter()
            .map(TrackField::from_manifest_header)
            .collect::<Vec<_>>();
        if !columns.contains(&Some(TrackField::Title)) {
            log::warn!("Manifest has no title column, every row will be ignored");
        }

        let mut records = vec![];
        for row in reader.records() {
            let row = row.into_report().change_context(ManifestError)?;
            let mut record = TrackRecord::default();
            for (column, value) in columns.iter().zip(row.iter()) {
                if let Some(field) = column {
                    record.set(*field, value);
                }
            }
            records.push(record);
        }
        Ok(records)
    }
}

/// Writes a manifest: utf-8 with a byte order mark, `;` separated, header first.
pub fn write_manifest(
    path: &Path,
    header: &[String],
    rows: &[Vec<String>],
) -> ManifestResult<()> {
    let mut file = fs::File::create(path)
        .into_report()
        .attach_printable(format!("Failed to create {}", path.display()))
        .change_context(ManifestError)?;
    file.write_all(UTF8_BOM)
        .into_report()
        .change_context(ManifestError)?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(MANIFEST_DELIMITER)
        .from_writer(file);
    writer
        .write_record(header)
        .into_report()
        .change_context(ManifestError)?;
    for row in rows {
        if row.len() != header.len() {
            return Err(Report::new(ManifestError).attach_printable(format!(
                "Row has {} cells but the header has {}",
                row.len(),
                header.len()
            )));
        }
        writer
            .write_record(row)
            .into_report()
            .change_context(ManifestError)?;
    }
    writer
        .flush()
        .into_report()
        .attach_printable(format!("Failed to write {}", path.display()))
        .change_context(ManifestError)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_matches_headers_case_insensitively() {
        let manifest = "\u{feff}НАЗВАНИЕ;артист;Альбом;Жанр;Год;youtube url\n\
                        Song A;Artist X;Album;Rock;1999;\n\
                        Song B;Artist Y;;;;https://example/xyz\n";
        let records = Manifest::parse(manifest.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            TrackRecord {
                title: "Song A".to_string(),
                artist: "Artist X".to_string(),
                album: "Album".to_string(),
                genre: "Rock".to_string(),
                year: "1999".to_string(),
                source_link: "".to_string(),
            }
        );
        assert_eq!(records[1].source_link, "https://example/xyz");
        assert!(records[1].album.is_empty());
    }

    #[test]
    fn test_parse_accepts_machine_keys_and_short_rows() {
        let manifest = "title;artist;bpm;source_link\n  Song A ; Artist X \nSong B\n";
        let records = Manifest::parse(manifest.as_bytes()).unwrap();
        assert_eq!(records[0].title, "Song A");
        assert_eq!(records[0].artist, "Artist X");
        assert_eq!(records[1].title, "Song B");
        assert!(records[1].artist.is_empty());
        assert!(!records[1].has_source_link());
    }

    #[test]
    fn test_parse_rejects_invalid_utf8() {
        let bytes = [b'a', b';', 0xFF, b'\n'];
        assert!(Manifest::parse(&bytes).is_err());
    }

    #[test]
    fn test_artifact_file_name_strips_invalid_characters() {
        let record = TrackRecord {
            title: "What? / Why: \"Now\"".to_string(),
            artist: "AC|DC".to_string(),
            ..Default::default()
        };
        assert_eq!(record.artifact_file_name("mp3"), "ACDC - What  Why Now.mp3");
    }

    #[test]
    fn test_write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Road trip_clean.csv");
        let header = vec!["Название".to_string(), "YouTube URL".to_string()];
        let rows = vec![vec!["Semi;colon".to_string(), "".to_string()]];
        write_manifest(&path, &header, &rows).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let manifest = Manifest::read(&path).unwrap();
        assert_eq!(manifest.name, "Road trip_clean");
        assert_eq!(manifest.records[0].title, "Semi;colon");
    }
}

use std::fmt;
use std::fs;
use std::path::Path;

use error_stack::{IntoReport, ResultExt};

use crate::config::AppConfig;
use crate::manifest::write_manifest;
use crate::schema::TrackField;

pub use encoding::{decode_export, TextEncoding};

pub mod commands;
pub mod encoding;

const EXPORT_DELIMITER: u8 = b'\t';

#[derive(Debug)]
pub struct NormalizerError;

impl fmt::Display for NormalizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Normalizer error")
    }
}

impl std::error::Error for NormalizerError {}

pub type NormalizerResult<T> = error_stack::Result<T, NormalizerError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedColumn {
    pub field: TrackField,
    pub index: usize,
}

#[derive(Debug)]
pub struct NormalizeReport {
    pub encoding: TextEncoding,
    pub header: Vec<String>,
    pub rows: usize,
}

/// Turns a tab separated playlist export into a manifest.
#[derive(Debug, Clone)]
pub struct Normalizer {
    retained_fields: Vec<TrackField>,
    text_encodings: Vec<TextEncoding>,
}

impl Normalizer {
    pub fn new(retained_fields: Vec<TrackField>, text_encodings: Vec<TextEncoding>) -> Self {
        Self {
            retained_fields,
            text_encodings,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.retained_fields.clone(),
            config.text_encodings.clone(),
        )
    }

    pub fn normalize(&self, input: &Path, output: &Path) -> NormalizerResult<NormalizeReport> {
        let bytes = fs::read(input)
            .into_report()
            .attach_printable(format!("Failed to read playlist {}", input.display()))
            .change_context(NormalizerError)?;
        let (text, encoding) = decode_export(&bytes, &self.text_encodings)?;
        log::debug!("Decoded {} as {encoding}", input.display());

        let (header, rows) = self.normalize_text(&text)?;
        write_manifest(output, &header, &rows).change_context(NormalizerError)?;
        Ok(NormalizeReport {
            encoding,
            header,
            rows: rows.len(),
        })
    }

    /// Returns the manifest header and rows for an already decoded export.
    pub fn normalize_text(&self, text: &str) -> NormalizerResult<(Vec<String>, Vec<Vec<String>>)> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(EXPORT_DELIMITER)
            .flexible(true)
            .from_reader(text.as_bytes());
        let export_header = reader
            .headers()
            .into_report()
            .change_context(NormalizerError)?
            .iter()
            .map(|cell| cell.to_string())
            .collect::<Vec<_>>();

        let selected = self.select_columns(&export_header);
        let mut header = selected
            .iter()
            .map(|column| column.field.label().to_string())
            .collect::<Vec<_>>();
        header.push(TrackField::SourceLink.label().to_string());

        let mut rows = vec![];
        for record in reader.records() {
            let record = record
                .into_report()
                .attach_printable(format!("Malformed playlist row {}", rows.len() + 2))
                .change_context(NormalizerError)?;
            let mut row = selected
                .iter()
                .map(|column| record.get(column.index).unwrap_or_default().to_string())
                .collect::<Vec<_>>();
            row.push(String::new());
            rows.push(row);
        }
        Ok((header, rows))
    }

    /// Retained fields that are present in the export, in retained order.
    pub fn select_columns(&self, export_header: &[String]) -> Vec<SelectedColumn> {
        let mut selected: Vec<SelectedColumn> = vec![];
        for field in &self.retained_fields {
            if *field == TrackField::SourceLink
                || selected.iter().any(|column| column.field == *field)
            {
                continue;
            }
            let position = export_header
                .iter()
                .position(|cell| TrackField::from_export_header(cell) == Some(*field));
            if let Some(index) = position {
                selected.push(SelectedColumn {
                    field: *field,
                    index,
                });
            }
        }
        selected
    }
}

use std::path::{Path, PathBuf};

use colored::Colorize;
use error_stack::{IntoReport, Report, ResultExt};

use crate::config::AppConfig;
use crate::dialoguer::Dialoguer;
use crate::normalizer::{Normalizer, NormalizerError, NormalizerResult};
use crate::schema::TrackField;
use crate::utils::find_candidate_files;
use crate::Suggestion;

const EXPORT_EXTENSION: &str = "txt";
const MANIFEST_SUFFIX: &str = "_clean.csv";

pub struct NormalizeCommands;

impl NormalizeCommands {
    pub fn execute(config: &AppConfig) -> NormalizerResult<()> {
        let exports = find_candidate_files(Path::new("."), EXPORT_EXTENSION)
            .into_report()
            .attach_printable("Failed to list the current folder")
            .change_context(NormalizerError)?;
        if exports.is_empty() {
            return Err(Report::new(NormalizerError)
                .attach_printable("No .txt files found in the current folder")
                .attach(Suggestion(
                    "Run the command from the folder that holds the playlist export".to_string(),
                )));
        }

        let input = Dialoguer::select_file(
            "Playlist exports found:".to_string(),
            "Number of the file to clean".to_string(),
            exports,
        )
        .change_context(NormalizerError)?;
        let output = Self::manifest_path(&input);

        let report = Normalizer::from_config(config).normalize(&input, &output)?;
        println!(
            "✅ Cleaned playlist saved to {} ({} tracks)",
            output.display().to_string().green(),
            report.rows.to_string().cyan()
        );
        log::debug!("Read the export as {}", report.encoding);
        println!("Columns: {}", report.header.join(", "));
        println!(
            "💡 You can add direct links to the '{}' column for any track",
            TrackField::SourceLink.label().cyan()
        );
        Ok(())
    }

    /// `<stem>_clean.csv` next to the export.
    pub fn manifest_path(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        input.with_file_name(format!("{stem}{MANIFEST_SUFFIX}"))
    }
}

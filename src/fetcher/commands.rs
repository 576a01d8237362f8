use std::path::Path;

use colored::Colorize;
use error_stack::{IntoReport, Report, ResultExt};

use crate::config::AppConfig;
use crate::dialoguer::Dialoguer;
use crate::fetcher::downloader::YtDlp;
use crate::fetcher::{Fetcher, FetcherError, FetcherResult};
use crate::manifest::Manifest;
use crate::utils::find_candidate_files;
use crate::Suggestion;

const MANIFEST_EXTENSION: &str = "csv";

pub struct FetchCommands;

impl FetchCommands {
    pub async fn execute(config: &AppConfig) -> FetcherResult<()> {
        let manifests = find_candidate_files(Path::new("."), MANIFEST_EXTENSION)
            .into_report()
            .attach_printable("Failed to list the current folder")
            .change_context(FetcherError)?;
        if manifests.is_empty() {
            return Err(Report::new(FetcherError)
                .attach_printable("No .csv files found in the current folder")
                .attach(Suggestion(
                    "Run `playlist-dl normalize` first to create one".to_string(),
                )));
        }

        let manifest_path = Dialoguer::select_file(
            "Manifests found:".to_string(),
            "Number of the file to download".to_string(),
            manifests,
        )
        .change_context(FetcherError)?;

        YtDlp::from_config(&config.downloader)
            .probe()
            .await
            .attach(Suggestion(format!(
                "Install {} and make sure it is on your PATH",
                config.downloader.program
            )))?;

        let manifest = Manifest::read(&manifest_path).change_context(FetcherError)?;
        let output_dir = Fetcher::output_dir(&config.output_root, &manifest);
        println!(
            "📂 Working on playlist {} ({} rows) -> {}",
            manifest.name.clone().cyan(),
            manifest.records.len().to_string().cyan(),
            output_dir.display()
        );

        Fetcher::from_config(config)
            .run(&manifest, &output_dir)
            .await?;
        Ok(())
    }
}

use std::fmt;

use clap::{Parser, Subcommand};
use colored::Colorize;
use error_stack::fmt::{Charset, ColorMode};
use error_stack::{IntoReport, Report, ResultExt};
use inflector::Inflector;
use strum::IntoEnumIterator;

use crate::config::AppConfig;
use crate::dialoguer::Dialoguer;
use crate::fetcher::commands::FetchCommands;
use crate::normalizer::commands::NormalizeCommands;

mod config;
mod dialoguer;
mod fetcher;
mod manifest;
mod normalizer;
mod schema;
mod utils;

#[derive(Debug)]
pub struct PlaylistDlError;
impl fmt::Display for PlaylistDlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Playlist downloader error")
    }
}
impl std::error::Error for PlaylistDlError {}

pub type PlaylistDlResult<T> = error_stack::Result<T, PlaylistDlError>;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Playlist cleaner and downloader")]
struct Cli {
    #[command(subcommand)]
    command: Option<PlaylistDlCommands>,
}

#[derive(
    Subcommand, Debug, PartialEq, Clone, strum_macros::Display, strum_macros::EnumIter,
)]
enum PlaylistDlCommands {
    /// Clean a tab separated playlist export into a manifest
    Normalize,
    /// Download and tag every track of a manifest
    Fetch,
    /// Show the current configuration
    Config,
}

impl PlaylistDlCommands {
    pub async fn execute(&self, config: &AppConfig) -> PlaylistDlResult<()> {
        match self {
            PlaylistDlCommands::Normalize => {
                NormalizeCommands::execute(config).change_context(PlaylistDlError)
            }
            PlaylistDlCommands::Fetch => FetchCommands::execute(config)
                .await
                .change_context(PlaylistDlError),
            PlaylistDlCommands::Config => {
                let path = AppConfig::get_config_file_path().change_context(PlaylistDlError)?;
                if !path.exists() {
                    config.save_to(&path).change_context(PlaylistDlError)?;
                    println!("Default config written to {}", path.display().to_string().green());
                }
                println!("Config file: {}", path.display().to_string().cyan());
                println!("Current config:\n{:#?}", config);
                Ok(())
            }
        }
    }

    fn get_options() -> Vec<String> {
        Self::iter()
            .map(|element| element.to_string().to_sentence_case())
            .collect::<Vec<_>>()
    }

    fn get_selection(selection: usize) -> Option<Self> {
        Self::iter().nth(selection)
    }

    fn select() -> PlaylistDlResult<Self> {
        let selection = Dialoguer::select(
            "What you want to do?".to_string(),
            Self::get_options(),
            None,
        )
        .change_context(PlaylistDlError)?;
        Self::get_selection(selection)
            .ok_or(PlaylistDlError)
            .into_report()
    }
}

pub struct Suggestion(String);

impl Suggestion {
    pub fn set_report() {
        Report::set_charset(Charset::Utf8);
        Report::set_color_mode(ColorMode::Color);
        Report::install_debug_hook::<Self>(|Self(value), context| {
            context.push_body(format!("{}: {value}", "suggestion".yellow()))
        });
    }
}

async fn run() -> PlaylistDlResult<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    Suggestion::set_report();

    let config = AppConfig::load().change_context(PlaylistDlError)?;
    let command = match cli.command {
        Some(command) => command,
        None => PlaylistDlCommands::select()?,
    };
    command.execute(&config).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> PlaylistDlResult<()> {
    run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_options_follow_the_subcommands() {
        assert_eq!(
            PlaylistDlCommands::get_options(),
            vec!["Normalize", "Fetch", "Config"]
        );
        assert_eq!(
            PlaylistDlCommands::get_selection(1),
            Some(PlaylistDlCommands::Fetch)
        );
        assert_eq!(PlaylistDlCommands::get_selection(3), None);
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["playlist-dl", "fetch"]).unwrap();
        assert_eq!(cli.command, Some(PlaylistDlCommands::Fetch));
        let cli = Cli::try_parse_from(["playlist-dl"]).unwrap();
        assert_eq!(cli.command, None);
    }
}

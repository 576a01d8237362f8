use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use colored::Colorize;
use error_stack::{IntoReport, Report, ResultExt};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::DownloaderConfig;
use crate::fetcher::resolver::FetchDirective;
use crate::fetcher::{FetcherError, FetcherResult};

/// The external media fetch tool.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    /// Downloads the resource the directive points to as audio into `output`.
    /// A timeout is reported the same way as a failed download.
    async fn fetch(&self, directive: &FetchDirective, output: &Path) -> FetcherResult<()>;
}

#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    audio_format: String,
    timeout: Duration,
}

impl YtDlp {
    pub fn new(program: String, audio_format: String, timeout: Duration) -> Self {
        Self {
            program,
            audio_format,
            timeout,
        }
    }

    pub fn from_config(config: &DownloaderConfig) -> Self {
        Self::new(
            config.program.clone(),
            config.audio_format.clone(),
            config.timeout(),
        )
    }

    pub fn build_args(&self, directive: &FetchDirective, output: &Path) -> Vec<OsString> {
        vec![
            directive.target().into(),
            "-x".into(),
            "--audio-format".into(),
            self.audio_format.clone().into(),
            "-o".into(),
            output.as_os_str().to_os_string(),
            "--quiet".into(),
            "--no-warnings".into(),
        ]
    }

    /// Checks that the program can be started at all.
    pub async fn probe(&self) -> FetcherResult<()> {
        let status = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .into_report()
            .attach_printable(format!("Failed to run {}", self.program))
            .change_context(FetcherError)?;
        if !status.success() {
            return Err(Report::new(FetcherError).attach_printable(format!(
                "{} --version exited with {}",
                self.program, status
            )));
        }
        Ok(())
    }

    fn spinner(&self, directive: &FetchDirective) -> FetcherResult<ProgressBar> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                .into_report()
                .change_context(FetcherError)?,
        );
        spinner.set_message(format!("Downloading {}", directive.to_string().cyan()));
        spinner.enable_steady_tick(Duration::from_millis(120));
        Ok(spinner)
    }
}

#[async_trait]
impl MediaDownloader for YtDlp {
    async fn fetch(&self, directive: &FetchDirective, output: &Path) -> FetcherResult<()> {
        let args = self.build_args(directive, output);
        log::debug!("Running {} {:?}", self.program, args);

        let mut command = Command::new(&self.program);
        command.args(&args);
        let spinner = self.spinner(directive)?;
        let result = run_with_timeout(command, self.timeout).await;
        spinner.finish_and_clear();
        result.attach_printable(format!("Failed to download {}", directive))
    }
}

/// Runs the command to completion, killing it once `limit` has passed.
/// A non-zero exit status and a timeout are both errors.
pub async fn run_with_timeout(mut command: Command, limit: Duration) -> FetcherResult<()> {
    let program = command.as_std().get_program().to_string_lossy().to_string();
    let mut child = command
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .into_report()
        .attach_printable(format!("Failed to start {program}"))
        .change_context(FetcherError)?;

    match timeout(limit, child.wait()).await {
        Ok(status) => {
            let status = status
                .into_report()
                .attach_printable(format!("Failed to wait for {program}"))
                .change_context(FetcherError)?;
            if status.success() {
                Ok(())
            } else {
                Err(Report::new(FetcherError)
                    .attach_printable(format!("{program} exited with {status}")))
            }
        }
        Err(_) => {
            if let Err(err) = child.kill().await {
                log::warn!("Failed to kill {program}: {err}");
            }
            Err(Report::new(FetcherError).attach_printable(format!(
                "{program} timed out after {} seconds",
                limit.as_secs_f32()
            )))
        }
    }
}

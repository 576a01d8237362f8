use std::fmt;
use std::path::{Path, PathBuf};

use colored::Colorize;
use error_stack::{IntoReport, ResultExt};

use crate::config::AppConfig;
use crate::fetcher::downloader::{MediaDownloader, YtDlp};
use crate::fetcher::pacing::{Pacer, RandomDelay};
use crate::fetcher::resolver::{FirstSearchResult, ResolutionStrategy};
use crate::fetcher::tagger::{Id3TagWriter, TagWriter};
use crate::manifest::{Manifest, TrackRecord};

pub mod commands;
pub mod downloader;
pub mod pacing;
pub mod resolver;
pub mod tagger;

#[derive(Debug)]
pub struct FetcherError;

impl fmt::Display for FetcherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Fetcher error")
    }
}

impl std::error::Error for FetcherError {}

pub type FetcherResult<T> = error_stack::Result<T, FetcherError>;

/// Where a manifest row ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// No title, nothing to look for.
    Ignored,
    /// The audio file was already there.
    Skipped,
    Tagged,
    /// Downloaded, but writing the tags failed.
    Untagged,
    Failed,
}

/// Walks a manifest and makes sure every track ends up as a tagged audio file.
pub struct Fetcher {
    strategy: Box<dyn ResolutionStrategy>,
    downloader: Box<dyn MediaDownloader>,
    tagger: Box<dyn TagWriter>,
    pacer: Box<dyn Pacer>,
    audio_format: String,
}

impl Fetcher {
    pub fn new(
        strategy: Box<dyn ResolutionStrategy>,
        downloader: Box<dyn MediaDownloader>,
        tagger: Box<dyn TagWriter>,
        pacer: Box<dyn Pacer>,
        audio_format: String,
    ) -> Self {
        Self {
            strategy,
            downloader,
            tagger,
            pacer,
            audio_format,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Box::new(FirstSearchResult),
            Box::new(YtDlp::from_config(&config.downloader)),
            Box::new(Id3TagWriter),
            Box::new(RandomDelay::new(config.delay_range)),
            config.downloader.audio_format.clone(),
        )
    }

    /// `<output_root>/<manifest name>`
    pub fn output_dir(output_root: &Path, manifest: &Manifest) -> PathBuf {
        output_root.join(&manifest.name)
    }

    pub async fn run(
        &mut self,
        manifest: &Manifest,
        output_dir: &Path,
    ) -> FetcherResult<Vec<RecordOutcome>> {
        std::fs::create_dir_all(output_dir)
            .into_report()
            .attach_printable(format!("Failed to create {}", output_dir.display()))
            .change_context(FetcherError)?;

        let mut outcomes = Vec::with_capacity(manifest.records.len());
        for record in &manifest.records {
            let outcome = self.process_record(record, output_dir).await;
            log::debug!("{} - {}: {:?}", record.artist, record.title, outcome);
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    pub async fn process_record(
        &mut self,
        record: &TrackRecord,
        output_dir: &Path,
    ) -> RecordOutcome {
        if !record.is_actionable() {
            return RecordOutcome::Ignored;
        }

        let file_name = record.artifact_file_name(&self.audio_format);
        let path = output_dir.join(&file_name);
        if path.exists() {
            println!("⏭ Already downloaded, skipping: {}", file_name.yellow());
            return RecordOutcome::Skipped;
        }

        let directive = self.strategy.resolve(record);
        let outcome = match self.downloader.fetch(&directive, &path).await {
            Ok(()) => {
                println!("✅ {}", file_name.green());
                self.tag(&path, record)
            }
            Err(report) => {
                println!("❌ Failed to download: {}", directive.to_string().red());
                log::warn!("{report:?}");
                RecordOutcome::Failed
            }
        };

        self.pacer.pause().await;
        outcome
    }

    fn tag(&self, path: &Path, record: &TrackRecord) -> RecordOutcome {
        match self.tagger.write_tags(path, record) {
            Ok(()) => {
                println!("   📝 Tags written");
                RecordOutcome::Tagged
            }
            Err(report) => {
                println!(
                    "   ⚠️ Failed to write tags to {}",
                    path.display().to_string().yellow()
                );
                log::warn!("{report:?}");
                RecordOutcome::Untagged
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use error_stack::Report;

    use super::*;
    use crate::fetcher::resolver::FetchDirective;

    #[derive(Clone, Default)]
    struct FakeDownloader {
        calls: Arc<Mutex<Vec<(FetchDirective, PathBuf)>>>,
        fail: bool,
    }

    #[async_trait]
    impl MediaDownloader for FakeDownloader {
        async fn fetch(&self, directive: &FetchDirective, output: &Path) -> FetcherResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push((directive.clone(), output.to_path_buf()));
            if self.fail {
                return Err(Report::new(FetcherError).attach_printable("exit status: 1"));
            }
            std::fs::write(output, b"audio").unwrap();
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct FakeTagger {
        calls: Arc<Mutex<Vec<TrackRecord>>>,
        fail: bool,
    }

    impl TagWriter for FakeTagger {
        fn write_tags(&self, _path: &Path, track: &TrackRecord) -> FetcherResult<()> {
            self.calls.lock().unwrap().push(track.clone());
            if self.fail {
                return Err(Report::new(FetcherError).attach_printable("broken tag"));
            }
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct CountingPacer {
        pauses: Arc<Mutex<usize>>,
    }

    #[async_trait]
    impl Pacer for CountingPacer {
        async fn pause(&mut self) {
            *self.pauses.lock().unwrap() += 1;
        }
    }

    fn fetcher(
        downloader: &FakeDownloader,
        tagger: &FakeTagger,
        pacer: &CountingPacer,
    ) -> Fetcher {
        Fetcher::new(
            Box::new(FirstSearchResult),
            Box::new(downloader.clone()),
            Box::new(tagger.clone()),
            Box::new(pacer.clone()),
            "mp3".to_string(),
        )
    }

    fn fakes() -> (FakeDownloader, FakeTagger, CountingPacer) {
        Default::default()
    }

    fn record(title: &str, artist: &str, source_link: &str) -> TrackRecord {
        TrackRecord {
            title: title.to_string(),
            artist: artist.to_string(),
            source_link: source_link.to_string(),
            ..Default::default()
        }
    }

    fn manifest(records: Vec<TrackRecord>) -> Manifest {
        Manifest {
            name: "playlist_clean".to_string(),
            records,
        }
    }

    #[tokio::test]
    async fn test_search_download_tag_and_pause() {
        let dir = tempfile::tempdir().unwrap();
        let (downloader, tagger, pacer) = fakes();
        let mut fetcher = fetcher(&downloader, &tagger, &pacer);

        let outcome = fetcher
            .process_record(&record("Song A", "Artist X", ""), dir.path())
            .await;

        assert_eq!(outcome, RecordOutcome::Tagged);
        let calls = downloader.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].0,
            FetchDirective::Search {
                query: "Song A Artist X audio".to_string(),
                results: 1
            }
        );
        assert_eq!(calls[0].1, dir.path().join("Artist X - Song A.mp3"));
        let tagged = tagger.calls.lock().unwrap();
        assert_eq!(tagged[0].title, "Song A");
        assert_eq!(tagged[0].artist, "Artist X");
        assert_eq!(*pacer.pauses.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_existing_file_is_skipped_without_pause() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Artist X - Song A.mp3"), b"audio").unwrap();
        let (downloader, tagger, pacer) = fakes();
        let mut fetcher = fetcher(&downloader, &tagger, &pacer);

        let outcome = fetcher
            .process_record(&record("Song A", "Artist X", ""), dir.path())
            .await;

        assert_eq!(outcome, RecordOutcome::Skipped);
        assert!(downloader.calls.lock().unwrap().is_empty());
        assert!(tagger.calls.lock().unwrap().is_empty());
        assert_eq!(*pacer.pauses.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_source_link_is_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let (downloader, tagger, pacer) = fakes();
        let mut fetcher = fetcher(&downloader, &tagger, &pacer);

        fetcher
            .process_record(&record("Song A", "Artist X", "https://example/xyz"), dir.path())
            .await;

        let calls = downloader.calls.lock().unwrap();
        assert_eq!(
            calls[0].0,
            FetchDirective::Direct("https://example/xyz".to_string())
        );
    }

    #[tokio::test]
    async fn test_empty_title_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (downloader, tagger, pacer) = fakes();
        let mut fetcher = fetcher(&downloader, &tagger, &pacer);

        let outcome = fetcher
            .process_record(&record("", "Artist X", "https://example/xyz"), dir.path())
            .await;

        assert_eq!(outcome, RecordOutcome::Ignored);
        assert!(downloader.calls.lock().unwrap().is_empty());
        assert_eq!(*pacer.pauses.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = FakeDownloader {
            fail: true,
            ..Default::default()
        };
        let (tagger, pacer) = (FakeTagger::default(), CountingPacer::default());
        let mut fetcher = fetcher(&downloader, &tagger, &pacer);

        let outcomes = fetcher
            .run(
                &manifest(vec![
                    record("Song A", "Artist X", ""),
                    record("Song B", "Artist Y", ""),
                ]),
                dir.path(),
            )
            .await
            .unwrap();

        assert_eq!(outcomes, vec![RecordOutcome::Failed, RecordOutcome::Failed]);
        assert_eq!(downloader.calls.lock().unwrap().len(), 2);
        assert!(tagger.calls.lock().unwrap().is_empty());
        assert_eq!(*pacer.pauses.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_tag_failure_keeps_the_download() {
        let dir = tempfile::tempdir().unwrap();
        let tagger = FakeTagger {
            fail: true,
            ..Default::default()
        };
        let (downloader, pacer) = (FakeDownloader::default(), CountingPacer::default());
        let mut fetcher = fetcher(&downloader, &tagger, &pacer);

        let outcomes = fetcher
            .run(
                &manifest(vec![
                    record("Song A", "Artist X", ""),
                    record("Song B", "Artist Y", ""),
                ]),
                dir.path(),
            )
            .await
            .unwrap();

        assert_eq!(outcomes, vec![RecordOutcome::Untagged, RecordOutcome::Untagged]);
        assert!(dir.path().join("Artist X - Song A.mp3").exists());
        assert_eq!(*pacer.pauses.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_second_run_fetches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = Fetcher::output_dir(dir.path(), &manifest(vec![]));
        let records = manifest(vec![
            record("Song A", "Artist X", ""),
            record("", "Nobody", ""),
            record("Song B", "Artist Y", "https://example/xyz"),
        ]);

        let (downloader, tagger, pacer) = fakes();
        let outcomes = fetcher(&downloader, &tagger, &pacer)
            .run(&records, &output_dir)
            .await
            .unwrap();
        assert_eq!(
            outcomes,
            vec![RecordOutcome::Tagged, RecordOutcome::Ignored, RecordOutcome::Tagged]
        );

        let (downloader, tagger, pacer) = fakes();
        let outcomes = fetcher(&downloader, &tagger, &pacer)
            .run(&records, &output_dir)
            .await
            .unwrap();
        assert_eq!(
            outcomes,
            vec![RecordOutcome::Skipped, RecordOutcome::Ignored, RecordOutcome::Skipped]
        );
        assert!(downloader.calls.lock().unwrap().is_empty());
        assert_eq!(*pacer.pauses.lock().unwrap(), 0);
    }
}

use std::fmt;

use crate::manifest::TrackRecord;

/// What the downloader is asked to fetch for one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDirective {
    /// A link the operator put in the manifest, used as is.
    Direct(String),
    /// Search the remote service and take the first `results` hits.
    Search { query: String, results: usize },
}

impl FetchDirective {
    /// The target argument understood by yt-dlp.
    pub fn target(&self) -> String {
        match self {
            FetchDirective::Direct(link) => link.clone(),
            FetchDirective::Search { query, results } => format!("ytsearch{results}:{query}"),
        }
    }
}

impl fmt::Display for FetchDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchDirective::Direct(link) => write!(f, "{link}"),
            FetchDirective::Search { query, .. } => write!(f, "{query}"),
        }
    }
}

/// Decides which remote resource satisfies a track.
pub trait ResolutionStrategy: Send + Sync {
    fn resolve(&self, track: &TrackRecord) -> FetchDirective;
}

/// Direct link when the manifest has one, otherwise the first search hit for
/// `"<title> <artist> audio"`. The search hit is not verified in any way.
#[derive(Debug, Clone, Default)]
pub struct FirstSearchResult;

impl FirstSearchResult {
    pub fn search_query(track: &TrackRecord) -> String {
        format!("{} {} audio", track.title, track.artist)
    }
}

impl ResolutionStrategy for FirstSearchResult {
    fn resolve(&self, track: &TrackRecord) -> FetchDirective {
        if track.has_source_link() {
            return FetchDirective::Direct(track.source_link.clone());
        }
        FetchDirective::Search {
            query: Self::search_query(track),
            results: 1,
        }
    }
}

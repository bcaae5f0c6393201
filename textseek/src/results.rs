/// This module implements the search result and event types that flow from
/// the engine to a sink, demonstrating how Rust's ownership system shapes a
/// producer/consumer design compared to .NET's reference types.
///
/// In .NET, a match row handed to a UI callback is still reachable by the
/// producer, and nothing stops both sides from mutating it. Here a
/// [`MatchLine`] is moved into the [`SearchEvent`] and the event is moved
/// into the sink; after emission the engine cannot touch it again, which the
/// compiler enforces rather than a code review.
use serde::Serialize;
use std::path::PathBuf;

/// A single line that contained the search term
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchLine {
    /// The file the line was found in
    pub file: PathBuf,
    /// 1-based line number
    pub line_number: usize,
    /// Line text with the trailing newline stripped
    pub text: String,
}

/// Final counts for one completed request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchSummary {
    /// Number of candidate files whose scan was attempted
    pub files_scanned: usize,
    /// Number of files with at least one match
    pub files_matched: usize,
    /// Total matching lines across all files
    pub total_hits: usize,
}

impl SearchSummary {
    /// Creates an empty summary
    pub fn new() -> Self {
        Default::default()
    }

    /// Records one scanned file and the number of hits it produced.
    /// A file that failed to scan records zero hits but still counts
    /// as scanned.
    pub fn record_file(&mut self, hits: usize) {
        self.files_scanned += 1;
        if hits > 0 {
            self.files_matched += 1;
            self.total_hits += hits;
        }
    }

    /// Merges another summary into this one, for batch runs that
    /// accumulate totals across independent searches
    pub fn merge(&mut self, other: SearchSummary) {
        self.files_scanned += other.files_scanned;
        self.files_matched += other.files_matched;
        self.total_hits += other.total_hits;
    }
}

/// One step of a running search, in production order.
///
/// Exactly one `Meta` precedes any `Match`/`FileError`, and exactly one
/// terminal event (`Done` or `Fatal`) comes last, never both. Events
/// serialize to JSON for structured-log consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SearchEvent {
    /// Enumeration finished; per-file work starts next
    Meta { candidates: usize },
    /// A line containing the term
    Match(MatchLine),
    /// One file could not be scanned; the run continues
    FileError { file: PathBuf, message: String },
    /// The run finished normally
    Done(SearchSummary),
    /// The run aborted before producing candidates
    Fatal { message: String },
}

impl SearchEvent {
    /// True for the last event of a run (`Done` or `Fatal`)
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchEvent::Done(_) | SearchEvent::Fatal { .. })
    }
}

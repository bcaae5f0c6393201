use tracing::{debug, info};

use super::enumerate::enumerate;
use super::matcher::PatternSet;
use super::scanner;
use crate::config::SearchRequest;
use crate::errors::SearchResult;
use crate::paths::resolve_directory;
use crate::results::{MatchLine, SearchEvent, SearchSummary};

/// Consumes the events of one running search, in production order.
///
/// The synchronous path hands `run` a printing sink on the caller's thread;
/// the asynchronous path hands it a channel sink owned by a worker. A sink
/// returns `false` when its consumer is gone, which lets the orchestrator
/// stop scanning work nobody will see.
pub trait EventSink {
    fn send(&mut self, event: SearchEvent) -> bool;
}

/// Collects events in memory; handy for tests and embedders
impl EventSink for Vec<SearchEvent> {
    fn send(&mut self, event: SearchEvent) -> bool {
        self.push(event);
        true
    }
}

/// Runs one search request to completion, streaming events into `sink`.
///
/// Emits exactly one `Meta` before any per-file event and exactly one
/// terminal event last: `Done` with the final counts, or `Fatal` when no
/// candidate list could be produced at all. A file that fails to scan
/// produces a `FileError` and the run continues; only enumeration-level
/// failures abort.
pub fn run(request: &SearchRequest, sink: &mut impl EventSink) -> SearchResult<SearchSummary> {
    info!(
        "Starting search for '{}' with patterns: {:?}",
        request.term, request.patterns
    );

    let directory = resolve_directory(&request.directory);

    let candidates = PatternSet::compile(&request.patterns)
        .and_then(|patterns| enumerate(&directory, &patterns, request.recursive));
    let candidates = match candidates {
        Ok(candidates) => candidates,
        Err(e) => {
            sink.send(SearchEvent::Fatal {
                message: e.to_string(),
            });
            return Err(e);
        }
    };

    debug!("Found {} candidate files", candidates.len());
    let mut summary = SearchSummary::new();
    if !sink.send(SearchEvent::Meta {
        candidates: candidates.len(),
    }) {
        return Ok(summary);
    }

    for path in &candidates {
        match scanner::scan(path, &request.term, request.case_sensitive) {
            Ok(matches) => {
                let mut hits = 0;
                for (line_number, text) in matches {
                    hits += 1;
                    let delivered = sink.send(SearchEvent::Match(MatchLine {
                        file: path.clone(),
                        line_number,
                        text,
                    }));
                    if !delivered {
                        summary.record_file(hits);
                        return Ok(summary);
                    }
                }
                summary.record_file(hits);
            }
            Err(e) => {
                summary.record_file(0);
                let delivered = sink.send(SearchEvent::FileError {
                    file: path.clone(),
                    message: e.to_string(),
                });
                if !delivered {
                    return Ok(summary);
                }
            }
        }
    }

    info!(
        "Search complete. Found {} matches in {} files",
        summary.total_hits, summary.files_matched
    );
    sink.send(SearchEvent::Done(summary));
    Ok(summary)
}

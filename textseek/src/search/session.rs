use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;
use tracing::{error, info};

use super::engine::{self, EventSink};
use crate::config::SearchRequest;
use crate::errors::{SearchError, SearchResult};
use crate::results::SearchEvent;

/// Forwards events from the worker to the polling side. A failed send means
/// the session (and its receiver) is gone, so the run stops early.
struct ChannelSink(Sender<SearchEvent>);

impl EventSink for ChannelSink {
    fn send(&mut self, event: SearchEvent) -> bool {
        self.0.send(event).is_ok()
    }
}

struct ActiveSearch {
    events: Receiver<SearchEvent>,
    worker: JoinHandle<()>,
}

/// Owns at most one in-flight asynchronous search.
///
/// `start` spawns a dedicated worker that streams `SearchEvent`s over an
/// unbounded single-producer/single-consumer channel; the owner calls `poll`
/// on its own schedule and applies events in production order. Starting
/// another search while one is running is rejected, never queued; there is
/// no cancellation, a worker always runs to its terminal event.
pub struct SearchSession {
    active: Option<ActiveSearch>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self { active: None }
    }

    /// True from a successful `start` until `poll` has delivered the
    /// terminal event
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Spawns the worker for one search, rejecting overlap with `SessionBusy`
    pub fn start(&mut self, request: SearchRequest) -> SearchResult<()> {
        if self.active.is_some() {
            return Err(SearchError::SessionBusy);
        }

        let (tx, rx) = mpsc::channel();
        let worker = std::thread::spawn(move || {
            let tx_guard = tx.clone();
            let result = catch_unwind(AssertUnwindSafe(|| {
                let mut sink = ChannelSink(tx);
                // The error is already in the stream as a Fatal event
                let _ = engine::run(&request, &mut sink);
            }));
            if result.is_err() {
                error!("Search worker panicked; sending Fatal event");
                let _ = tx_guard.send(SearchEvent::Fatal {
                    message: "Internal error: search worker panicked unexpectedly".to_string(),
                });
            }
        });

        self.active = Some(ActiveSearch { events: rx, worker });
        info!("Search started");
        Ok(())
    }

    /// Polls for events without blocking, draining at most `max` per call.
    /// Events beyond the budget stay queued for the next call, so a burst of
    /// matches cannot stall the caller's render loop.
    ///
    /// Receiving the terminal event joins the worker and frees the slot; the
    /// next `start` is accepted immediately afterwards.
    pub fn poll(&mut self, max: usize) -> Vec<SearchEvent> {
        let mut events = Vec::with_capacity(max.min(64));
        let mut finished = false;

        if let Some(active) = &self.active {
            while events.len() < max {
                match active.events.try_recv() {
                    Ok(event) => {
                        let terminal = event.is_terminal();
                        events.push(event);
                        if terminal {
                            finished = true;
                            break;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        // The worker never exits without a terminal event;
                        // synthesize one so the slot cannot stay occupied
                        events.push(SearchEvent::Fatal {
                            message: "search worker disconnected before finishing".to_string(),
                        });
                        finished = true;
                        break;
                    }
                }
            }
        }

        if finished {
            if let Some(active) = self.active.take() {
                if active.worker.join().is_err() {
                    error!("Search worker panicked");
                }
            }
        }

        events
    }
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::SearchSummary;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;

    fn request(directory: &Path, term: &str) -> SearchRequest {
        SearchRequest {
            term: term.to_string(),
            patterns: vec!["*.txt".to_string()],
            directory: directory.to_path_buf(),
            recursive: false,
            case_sensitive: false,
            log_level: "warn".to_string(),
        }
    }

    fn poll_to_completion(session: &mut SearchSession, max_per_poll: usize) -> Vec<SearchEvent> {
        let mut events = Vec::new();
        for _ in 0..500 {
            let batch = session.poll(max_per_poll);
            let done = batch.iter().any(SearchEvent::is_terminal);
            events.extend(batch);
            if done {
                return events;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("search did not finish: {:?}", events);
    }

    #[test]
    fn test_events_arrive_in_order_and_free_the_slot() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hello world\nHELLO\n").unwrap();
        fs::write(dir.path().join("b.txt"), "nothing here\n").unwrap();

        let mut session = SearchSession::new();
        session.start(request(dir.path(), "hello")).unwrap();
        assert!(session.is_running());

        let events = poll_to_completion(&mut session, 16);
        assert!(!session.is_running());

        assert!(matches!(events.first(), Some(SearchEvent::Meta { candidates: 2 })));
        match events.last() {
            Some(SearchEvent::Done(summary)) => {
                assert_eq!(
                    *summary,
                    SearchSummary {
                        files_scanned: 2,
                        files_matched: 1,
                        total_hits: 2,
                    }
                );
            }
            other => panic!("expected Done, got {:?}", other),
        }
    }

    #[test]
    fn test_overlapping_start_is_rejected() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hello\n").unwrap();

        let mut session = SearchSession::new();
        session.start(request(dir.path(), "hello")).unwrap();

        // The slot is held until poll delivers the terminal event, even if
        // the worker has already finished
        let err = session.start(request(dir.path(), "hello")).unwrap_err();
        assert!(matches!(err, SearchError::SessionBusy));

        poll_to_completion(&mut session, 16);
        assert!(session.start(request(dir.path(), "hello")).is_ok());
        poll_to_completion(&mut session, 16);
    }

    #[test]
    fn test_poll_budget_limits_each_batch() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.txt"),
            "hit 1\nhit 2\nhit 3\nhit 4\nhit 5\n",
        )
        .unwrap();

        let mut session = SearchSession::new();
        session.start(request(dir.path(), "hit")).unwrap();

        let events = poll_to_completion(&mut session, 1);
        // Meta + five matches + Done; each poll delivered at most one
        assert_eq!(events.len(), 7);
        assert!(matches!(events.first(), Some(SearchEvent::Meta { .. })));
        assert!(matches!(events.last(), Some(SearchEvent::Done(_))));
    }

    #[test]
    fn test_fatal_is_terminal_too() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hello\n").unwrap();

        let mut session = SearchSession::new();
        let mut req = request(dir.path(), "hello");
        req.patterns = vec!["[".to_string()];
        session.start(req).unwrap();

        let events = poll_to_completion(&mut session, 16);
        assert!(!session.is_running());
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SearchEvent::Fatal { .. }));
    }

    #[test]
    fn test_poll_with_no_active_search_is_empty() {
        let mut session = SearchSession::new();
        assert!(session.poll(16).is_empty());
        assert!(!session.is_running());
    }
}

/// This module implements the streaming search pipeline, demonstrating Rust's
/// producer/consumer threading compared to .NET's BackgroundWorker pattern.
///
/// # .NET vs Rust Background Work
///
/// In .NET, a long-running search behind a responsive UI is often built on
/// BackgroundWorker or Task with a shared collection:
/// ```csharp
/// var worker = new BackgroundWorker();
/// worker.DoWork += (s, e) => SearchFiles(request, results);
/// worker.ProgressChanged += (s, e) => grid.Rows.Add(e.UserState);
/// worker.RunWorkerAsync();
/// ```
///
/// In Rust, the same shape falls out of a thread and a channel, with the
/// compiler checking that the worker and the consumer never share mutable
/// state:
/// ```rust,ignore
/// let mut session = SearchSession::new();
/// session.start(request)?;
/// loop {
///     for event in session.poll(64) {
///         render(event);
///     }
/// }
/// ```
///
/// # Pipeline Stages
///
/// 1. **Enumeration**: glob patterns expand to a deduplicated candidate list
///    before any file is opened, so consumers learn the total up front.
/// 2. **Scanning**: each candidate is decoded with an encoding fallback chain
///    and its matching lines stream out as they are found.
/// 3. **Delivery**: a sink receives every event in production order; the
///    synchronous path prints, the asynchronous path crosses a channel.
///
/// # Error Handling
///
/// A file that cannot be read becomes a `FileError` event and the run keeps
/// going; only a directory that yields no candidate list at all terminates
/// the run with `Fatal`:
/// ```rust,ignore
/// match engine::run(&request, &mut sink) {
///     Ok(summary) => println!("{} hits", summary.total_hits),
///     Err(e) => eprintln!("search failed: {}", e),
/// }
/// ```
pub mod engine;
pub mod enumerate;
pub mod matcher;
pub mod scanner;
pub mod session;

pub use engine::{run, EventSink};
pub use session::SearchSession;

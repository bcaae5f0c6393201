pub mod config;
pub mod errors;
pub mod paths;
pub mod results;
pub mod search;

pub use config::SearchRequest;
pub use errors::{SearchError, SearchResult};
pub use results::{MatchLine, SearchEvent, SearchSummary};
pub use search::{EventSink, SearchSession};

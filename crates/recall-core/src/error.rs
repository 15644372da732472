use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The query was empty (or normalized to empty); no search is attempted.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A single signal source failed; the engine degrades around this.
    #[error("Signal source unavailable: {0}")]
    SourceUnavailable(String),

    /// Every signal source failed. The only hard error surfaced to callers:
    /// an empty success here would be indistinguishable from "no matches".
    #[error("Search unavailable: no signal source reachable")]
    SearchUnavailable,

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

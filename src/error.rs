// Typed error kinds. Sample errors are tallied, never propagated past the normalizer.

use thiserror::Error;

/// Why a single raw sample was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    #[error("malformed timestamp: {0}")]
    MalformedTimestamp(String),
    #[error("sample outside the working window")]
    OutOfWindowSample,
    #[error("alarm label {0:?} has no equipment group")]
    UnmappedAlarmLabel(String),
}

/// Failure reported by a data-source collaborator. Callers turn these into
/// "no data available" reports; nothing in the pipeline retries.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("http source: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sqlite source: {0}")]
    Sqlite(#[from] sqlx::Error),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("no {0} source configured")]
    NotConfigured(&'static str),
}

use thiserror::Error;

/// Errors returned by the SOS client.
#[derive(Debug, Error)]
pub enum Error {
    /// A query was built without both a start and an end date.
    #[error("both a start date and an end date are required for a query")]
    MissingDateRange,

    /// An area lookup matched no records.
    #[error("no area found matching {search:?}")]
    AreaNotFound { search: String },

    /// A count or download operation matched zero records.
    #[error("the query matched no records")]
    EmptyResult,

    /// The match count exceeds the ceiling for the requested operation.
    #[error("the query matched {count} records, which exceeds the limit of {limit}")]
    TooManyResults { count: u64, limit: u64 },

    /// The count endpoint returned something other than a decimal integer.
    #[error("count endpoint returned a non-numeric body: {body:?}")]
    InvalidCount { body: String },

    /// Transport failure or non-2xx HTTP response, propagated as-is.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Failure writing an exported file to disk.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Missing or invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

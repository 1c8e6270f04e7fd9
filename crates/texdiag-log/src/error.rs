use thiserror::Error;

/// Errors from the fallible wrappers around the scanner.
///
/// Classification itself never fails; only reading input and loading filter
/// configuration can.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read log input: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid filter pattern `{pattern}` for field `{field}`: {source}")]
    Pattern {
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("malformed filter configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

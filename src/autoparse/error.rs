//! Error types for autoparse

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the pattern engine and the numeric parsers.
///
/// A pattern that simply does not match is never an error; see the `Option`
/// results throughout [`crate::autoparse::find`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },

    #[error("regex engine failed while running `{pattern}`: {source}")]
    Engine {
        pattern: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },

    #[error("pattern `{pattern}` has no capturing groups")]
    NoCaptureGroups { pattern: String },

    #[error("invalid index token `{token}`")]
    InvalidIndex { token: String },

    #[error("invalid index range `{token}`: end precedes start")]
    InvalidRange { token: String },

    #[error("index range `{token}` spans more than {limit} indices")]
    RangeTooLong { token: String, limit: usize },
}

impl Error {
    pub(crate) fn invalid_pattern(pattern: &str, source: fancy_regex::Error) -> Self {
        Error::InvalidPattern {
            pattern: pattern.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn engine(pattern: &str, source: fancy_regex::Error) -> Self {
        Error::Engine {
            pattern: pattern.to_string(),
            source: Box::new(source),
        }
    }
}

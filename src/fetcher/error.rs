//! Fetch errors and their retry classification.

use std::time::Duration;

use thiserror::Error;

use super::retry::{AttemptError, RetryError, Retryable};

// == Fetch Error ==
#[derive(Error, Debug)]
pub enum FetchError {
    /// No API key was available. Never retried.
    #[error("Steam API key is not configured")]
    Configuration,

    /// An attempt ran past its timeout.
    #[error("Steam API request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-2xx response.
    #[error("Steam API request failed with status {0}")]
    Status(u16),

    /// Connection, TLS or body transfer failure.
    #[error("Steam API transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded. Never retried.
    #[error("Steam API returned a malformed body: {0}")]
    Decode(String),

    /// Every attempt failed; wraps the last cause.
    #[error("{endpoint} failed after {attempts} attempts: {source}")]
    Exhausted {
        endpoint: &'static str,
        attempts: usize,
        #[source]
        source: Box<FetchError>,
    },
}

impl FetchError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, FetchError::Configuration)
    }

    /// Converts the combinator's outcome into a fetch error for `endpoint`.
    pub fn from_retry(endpoint: &'static str, error: RetryError<FetchError>) -> Self {
        match error {
            RetryError::Terminal(source) => source,
            RetryError::Exhausted { attempts, last } => {
                let source = match last {
                    AttemptError::TimedOut(limit) => FetchError::Timeout(limit),
                    AttemptError::Failed(source) => source,
                };
                FetchError::Exhausted {
                    endpoint,
                    attempts,
                    source: Box::new(source),
                }
            }
        }
    }
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout(_) | FetchError::Status(_) | FetchError::Transport(_)
        )
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            FetchError::Decode(error.to_string())
        } else {
            FetchError::Transport(error.to_string())
        }
    }
}

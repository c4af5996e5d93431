//! Error taxonomy for the discovery pipeline.
//!
//! Per-stream poll failures are recoverable (the cycle is skipped and the
//! next pace tick retries); manifest failures are fatal to the whole run.

use thiserror::Error;

use crate::run_table::RunTableError;

/// Failure of one poll cycle for one stream. Never fatal.
#[derive(Debug, Error)]
pub enum PollError {
    /// Origin unreachable, timed out, or the transfer failed.
    #[error("bootstrap request to {url} failed: {reason}")]
    Fetch { url: String, reason: String },
    /// Origin answered with a non-2xx status.
    #[error("bootstrap request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u32 },
    /// The inspector tool could not be run or exited non-zero.
    #[error("bootstrap inspection failed: {0}")]
    Inspect(String),
    /// Inspector output did not contain a usable run table.
    #[error(transparent)]
    RunTable(#[from] RunTableError),
    /// Writing the snapshot next to the other bootstrap artifacts failed.
    #[error("bootstrap snapshot i/o: {0}")]
    Io(#[from] std::io::Error),
    /// The blocking poll task panicked or was cancelled.
    #[error("poll task failed: {0}")]
    Task(String),
}

/// Coarse classification used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollErrorKind {
    TransientFetch,
    Parse,
    Storage,
    Internal,
}

impl PollError {
    pub fn kind(&self) -> PollErrorKind {
        match self {
            PollError::Fetch { .. } | PollError::HttpStatus { .. } => PollErrorKind::TransientFetch,
            PollError::Inspect(_) | PollError::RunTable(_) => PollErrorKind::Parse,
            PollError::Io(_) => PollErrorKind::Storage,
            PollError::Task(_) => PollErrorKind::Internal,
        }
    }
}

/// The multi-level manifest could not be resolved into streams.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("multi-level manifest {url} could not be loaded: {reason}")]
    Unavailable { url: String, reason: String },
    #[error("manifest is malformed: {0}")]
    Malformed(String),
    #[error("multi-level manifest {0} lists no streams")]
    NoStreams(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_table::Section;

    #[test]
    fn kinds_follow_recovery_class() {
        let fetch = PollError::HttpStatus {
            url: "http://o/s.bootstrap".into(),
            status: 404,
        };
        assert_eq!(fetch.kind(), PollErrorKind::TransientFetch);
        let parse = PollError::from(RunTableError::EmptySection(Section::Fragments));
        assert_eq!(parse.kind(), PollErrorKind::Parse);
        let io = PollError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(io.kind(), PollErrorKind::Storage);
    }

    #[test]
    fn http_status_message_names_url() {
        let e = PollError::HttpStatus {
            url: "http://origin/live1.bootstrap".into(),
            status: 503,
        };
        assert_eq!(
            e.to_string(),
            "bootstrap request to http://origin/live1.bootstrap returned HTTP 503"
        );
    }
}

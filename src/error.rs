use std::io;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every way a probe run can fail. All of them end the run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("usage: {0}")]
    Usage(String),

    #[error("failed to connect to {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("unable to parse status line")]
    MalformedStatusLine,

    #[error("expected status {expected}, got {actual}")]
    UnexpectedStatus { expected: u16, actual: u16 },

    #[error("missing Sec-WebSocket-Accept header")]
    MissingAcceptHeader,

    #[error("invalid Sec-WebSocket-Accept: expected {expected} got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("response exceeded {limit} bytes without end of headers")]
    BufferExhausted { limit: usize },
}

/// Failures while moving bytes over an established connection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    #[error("short write: sent {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("connection closed after {received} bytes without end of headers")]
    Closed { received: usize },
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::Transport(TransportError::Io(error))
    }
}

impl Error {
    /// Short name of the failed check, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Usage(_) => "usage",
            Self::Connection { .. } => "connection",
            Self::Transport(_) => "transport",
            Self::MalformedStatusLine => "status-line",
            Self::UnexpectedStatus { .. } => "status",
            Self::MissingAcceptHeader => "missing-header",
            Self::DigestMismatch { .. } => "digest",
            Self::BufferExhausted { .. } => "buffer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, TransportError};

    #[test]
    fn diagnostics_are_one_line() {
        let errors = [
            Error::Usage("--host must not be empty".to_owned()),
            Error::MalformedStatusLine,
            Error::UnexpectedStatus {
                expected: 101,
                actual: 200,
            },
            Error::MissingAcceptHeader,
            Error::DigestMismatch {
                expected: "s3pPLMBiTxaQ9kYGzzhZRbK+xOo=".to_owned(),
                actual: "nope".to_owned(),
            },
            Error::BufferExhausted { limit: 4096 },
            TransportError::ShortWrite {
                written: 3,
                expected: 10,
            }
            .into(),
        ];
        for error in errors {
            assert!(!error.to_string().contains('\n'), "{error}");
        }
    }

    #[test]
    fn status_message() {
        let error = Error::UnexpectedStatus {
            expected: 101,
            actual: 200,
        };
        assert_eq!(error.to_string(), "expected status 101, got 200");
        assert_eq!(error.kind(), "status");
    }

    #[test]
    fn io_errors_are_transport() {
        let reset = std::io::ErrorKind::ConnectionReset;
        let error = Error::from(std::io::Error::from(reset));
        assert!(matches!(
            error,
            Error::Transport(TransportError::Io(ref e)) if e.kind() == reset
        ));
    }
}

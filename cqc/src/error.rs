//! Error types for CQC sessions.

use std::io;

use cqc_proto::{ErrorCode, MessageType};

/// Alias for `Result<T, cqc::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by session operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Resolving or connecting to the backend failed.
    #[error("cannot connect to {addr}")]
    Connect {
        /// The `host:port` that was tried.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// Writing to or reading from the stream failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The backend closed the stream in the middle of a record.
    #[error("stream closed before {expected} bytes arrived")]
    ShortRead {
        /// Bytes the read was waiting for.
        expected: usize,
    },

    /// The backend replied with a type the pending call did not expect.
    #[error("expected {expected} reply, backend sent {got}")]
    UnexpectedReply {
        /// Reply type the call was waiting for.
        expected: MessageType,
        /// Reply type that arrived.
        got: MessageType,
    },

    /// A reply could not be decoded.
    #[error("malformed reply: {0}")]
    Malformed(String),

    /// The backend answered with an explicit error reply.
    #[error("backend error: {0}")]
    Backend(ErrorCode),

    /// An earlier protocol or transport failure left the session unusable.
    #[error("session abandoned after a fatal error")]
    Poisoned,

    /// A command was assembled with an extension that does not fit it.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Tomography needs at least one iteration per axis.
    #[error("tomography requires at least one iteration")]
    ZeroIterations,

    /// Tomography tolerance must be a finite, non-negative number.
    #[error("tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),

    /// A caller-supplied preparation routine gave up.
    #[error("qubit preparation failed: {0}")]
    Preparation(String),
}

impl Error {
    /// Returns `true` if the session must be abandoned after this error.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::ShortRead { .. }
                | Self::UnexpectedReply { .. }
                | Self::Malformed(_)
                | Self::Poisoned
        )
    }

    /// Returns the backend error kind, if this is a backend error.
    pub const fn backend_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Backend(code) => Some(*code),
            _ => None,
        }
    }
}

//! Error types for mailbox-client
//!
//! Decoding paths (`utf7`, `header`, `body`) never produce errors; they
//! degrade to best-effort text instead. Everything that talks to the
//! server does, using the taxonomy below.

use thiserror::Error;

/// Step of a multi-step mailbox operation.
///
/// `move` and `delete` are copy/flag/expunge sequences that are not
/// transactional. When one fails mid-way the error names the step that
/// failed so a caller can decide whether to retry the rest (the
/// remaining steps are idempotent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// COPY to the destination folder.
    Copy,
    /// STORE of the `\Deleted` flag.
    FlagDeleted,
    /// EXPUNGE of flagged messages.
    Expunge,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Copy => "copy",
            Self::FlagDeleted => "flag-deleted",
            Self::Expunge => "expunge",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or rejected credentials. Fatal for the operation, not
    /// for the process.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Transport or login failure. The session is reset to
    /// `Disconnected` and retried lazily on the next call.
    #[error("connection error: {0}")]
    Connection(String),

    /// The server rejected a folder name (unknown or unselectable).
    #[error("folder error: {0}")]
    Folder(String),

    /// A protocol verb failed with a server error response.
    #[error("IMAP error: {0}")]
    Imap(String),

    /// A multi-step operation failed part-way, leaving observable
    /// partial state.
    #[error("{op} failed at step {step}: {detail}")]
    Partial {
        op: &'static str,
        step: Step,
        detail: String,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),
}

pub type Result<T> = std::result::Result<T, Error>;

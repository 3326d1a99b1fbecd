//! IMAP mailbox client library
//!
//! A mailbox-access core for IMAP servers reached through a local
//! STARTTLS bridge with self-signed certificates. The client keeps one
//! lazily-reconnected session and exposes folder listing, search,
//! message reading, and flag/move/delete operations.
//!
//! Decoding is fail-soft throughout: folder names in modified UTF-7,
//! RFC 2047 headers, and MIME bodies all degrade to best-effort text
//! instead of failing an operation.

pub mod body;
mod client;
mod config;
mod connection;
mod error;
mod flag;
mod folder;
pub mod header;
mod message;
mod session;
pub mod utf7;

pub use body::{BodySource, UNDECODABLE_BODY};
pub use client::MailboxClient;
pub use config::{CredentialProvider, Credentials, EnvCredentials, ImapConfig, StaticCredentials};
pub use error::{Error, Result, Step};
pub use flag::Flag;
pub use folder::Folder;
pub use message::{DecodedMessage, MessageSummary};
pub use session::MailSession;

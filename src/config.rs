//! IMAP connection configuration and credential acquisition
//!
//! Credentials are obtained through the [`CredentialProvider`] trait so
//! the session never holds secrets itself; a fresh pair is requested on
//! every (re)connect. The default provider reads environment variables,
//! matching how deployments configure the client.

use crate::error::{Error, Result};
use std::env;

/// IMAP server endpoint.
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
}

impl ImapConfig {
    /// Load the server endpoint from environment variables.
    ///
    /// Reads from `.env` if present. Optional (with defaults):
    /// - `IMAP_HOST` (default: `127.0.0.1`)
    /// - `IMAP_PORT` (default: `1143`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `IMAP_PORT` is not a valid port
    /// number.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            host: env::var("IMAP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("IMAP_PORT")
                .unwrap_or_else(|_| "1143".to_string())
                .parse()
                .map_err(|e| Error::Config(format!("Invalid IMAP_PORT: {e}")))?,
        })
    }
}

/// A username/secret pair yielded by a [`CredentialProvider`].
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Source of login credentials.
///
/// Called on every login attempt, never cached, so rotated secrets are
/// picked up on the next reconnect.
pub trait CredentialProvider: Send + Sync {
    /// Produce a credential pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] when no credentials are available.
    fn credentials(&self) -> Result<Credentials>;
}

/// Reads `IMAP_USERNAME` and `IMAP_PASSWORD` from the environment
/// (and `.env` if present).
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialProvider for EnvCredentials {
    fn credentials(&self) -> Result<Credentials> {
        dotenvy::dotenv().ok();

        let username = env::var("IMAP_USERNAME")
            .map_err(|_| Error::Auth("IMAP_USERNAME not set".into()))?;
        let password = env::var("IMAP_PASSWORD")
            .map_err(|_| Error::Auth("IMAP_PASSWORD not set".into()))?;
        Ok(Credentials { username, password })
    }
}

/// Fixed credentials, mainly for tests and short-lived tools.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Credentials {
                username: username.into(),
                password: password.into(),
            },
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn credentials(&self) -> Result<Credentials> {
        Ok(self.credentials.clone())
    }
}

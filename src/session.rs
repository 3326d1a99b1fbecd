//! Managed IMAP session with lazy reconnect
//!
//! [`MailSession`] owns at most one live [`ImapSession`] and hands out
//! protocol verbs. Before each verb the session is probed with NOOP; a
//! dead or missing connection is rebuilt with fresh credentials from
//! the provider. Connection-class failures reset the session so the
//! next call reconnects; protocol-level NO/BAD responses leave the
//! connection standing.

use crate::config::{CredentialProvider, ImapConfig};
use crate::connection::{self, ImapSession};
use crate::error::{Error, Result};
use async_imap::error::Error as ImapError;
use futures::{StreamExt, pin_mut};
use tracing::{debug, warn};

pub struct MailSession {
    config: ImapConfig,
    provider: Box<dyn CredentialProvider>,
    session: Option<ImapSession>,
}

impl MailSession {
    #[must_use]
    pub fn new(config: ImapConfig, provider: Box<dyn CredentialProvider>) -> Self {
        Self {
            config,
            provider,
            session: None,
        }
    }

    /// Whether a connection is currently held. Says nothing about
    /// liveness; the next verb probes that.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Probe the held connection and reconnect if needed.
    ///
    /// # Errors
    ///
    /// Propagates credential lookup and connect failures.
    async fn ensure_connected(&mut self) -> Result<&mut ImapSession> {
        let alive = match self.session.as_mut() {
            Some(session) => match session.noop().await {
                Ok(()) => true,
                Err(e) => {
                    debug!("Liveness probe failed, reconnecting: {e}");
                    false
                }
            },
            None => false,
        };

        if !alive {
            self.session = None;
            let credentials = self.provider.credentials()?;
            let session = connection::connect(&self.config, &credentials).await?;
            self.session = Some(session);
        }

        self.session
            .as_mut()
            .ok_or_else(|| Error::Connection("no session".to_string()))
    }

    /// Map a verb failure to the error taxonomy. Transport failures
    /// drop the session so the next verb reconnects.
    fn classify<F>(&mut self, e: ImapError, wrap: F) -> Error
    where
        F: FnOnce(String) -> Error,
    {
        if matches!(e, ImapError::Io(_) | ImapError::ConnectionLost) {
            self.session = None;
            Error::Connection(e.to_string())
        } else {
            wrap(e.to_string())
        }
    }

    /// SELECT a folder by its wire name.
    ///
    /// # Errors
    ///
    /// [`Error::Folder`] when the server rejects the name.
    pub async fn select(&mut self, folder: &str) -> Result<()> {
        let session = self.ensure_connected().await?;
        match session.select(folder).await {
            Ok(_) => Ok(()),
            Err(e) => {
                Err(self.classify(e, |d| Error::Folder(format!("Failed to select {folder}: {d}"))))
            }
        }
    }

    /// LIST all folder wire names.
    ///
    /// Unparseable list items are skipped with a warning rather than
    /// failing the whole listing.
    ///
    /// # Errors
    ///
    /// [`Error::Imap`] when the LIST command itself fails.
    pub async fn list_names(&mut self) -> Result<Vec<String>> {
        let session = self.ensure_connected().await?;

        // Drain the stream into an owned result so the session borrow
        // ends before error classification.
        let outcome = match session.list(Some(""), Some("*")).await {
            Ok(mut stream) => {
                let mut names = Vec::new();
                while let Some(item) = stream.next().await {
                    match item {
                        Ok(name) => names.push(name.name().to_string()),
                        Err(e) => warn!("Skipping unreadable LIST item: {e}"),
                    }
                }
                Ok(names)
            }
            Err(e) => Err(e),
        };

        outcome.map_err(|e| self.classify(e, |d| Error::Imap(format!("List folders failed: {d}"))))
    }

    /// UID SEARCH in the currently selected folder. UIDs come back
    /// sorted ascending.
    ///
    /// # Errors
    ///
    /// [`Error::Imap`] when the server rejects the query.
    pub async fn search_uids(&mut self, query: &str) -> Result<Vec<u32>> {
        let session = self.ensure_connected().await?;
        match session.uid_search(query).await {
            Ok(uids) => {
                let mut uid_list: Vec<u32> = uids.into_iter().collect();
                uid_list.sort_unstable();
                Ok(uid_list)
            }
            Err(e) => Err(self.classify(e, |d| Error::Imap(format!("Search failed: {d}")))),
        }
    }

    /// UID FETCH the raw RFC 2822 octets of one message.
    ///
    /// Returns `None` when the UID no longer exists in the folder.
    ///
    /// # Errors
    ///
    /// [`Error::Imap`] when the FETCH fails.
    pub async fn fetch_raw(&mut self, uid: u32) -> Result<Option<Vec<u8>>> {
        let session = self.ensure_connected().await?;
        let uid_set = format!("{uid}");

        let outcome = match session.uid_fetch(&uid_set, "(BODY.PEEK[])").await {
            Ok(mut messages) => {
                let mut body = None;
                let mut failure = None;
                while let Some(item) = messages.next().await {
                    match item {
                        Ok(msg) => {
                            if let Some(bytes) = msg.body() {
                                body = Some(bytes.to_vec());
                            }
                        }
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
                match failure {
                    Some(e) => Err(e),
                    None => Ok(body),
                }
            }
            Err(e) => Err(e),
        };

        outcome.map_err(|e| self.classify(e, |d| Error::Imap(format!("Fetch failed: {d}"))))
    }

    /// UID STORE a flag change, e.g. `+FLAGS (\Seen)`. The untagged
    /// FETCH responses are drained and discarded.
    ///
    /// # Errors
    ///
    /// [`Error::Imap`] when the STORE fails.
    pub async fn store_flags(&mut self, uid: u32, change: &str) -> Result<()> {
        let session = self.ensure_connected().await?;
        let uid_set = format!("{uid}");

        let outcome = match session.uid_store(&uid_set, change).await {
            Ok(mut responses) => {
                let mut failure = None;
                while let Some(item) = responses.next().await {
                    if let Err(e) = item {
                        failure = Some(e);
                        break;
                    }
                }
                failure.map_or(Ok(()), Err)
            }
            Err(e) => Err(e),
        };

        outcome.map_err(|e| self.classify(e, |d| Error::Imap(format!("Store failed: {d}"))))
    }

    /// UID COPY one message to another folder (wire name).
    ///
    /// # Errors
    ///
    /// [`Error::Imap`] when the COPY fails.
    pub async fn copy(&mut self, uid: u32, destination: &str) -> Result<()> {
        let session = self.ensure_connected().await?;
        let uid_set = format!("{uid}");

        match session.uid_copy(&uid_set, destination).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.classify(e, |d| Error::Imap(format!("Copy failed: {d}")))),
        }
    }

    /// EXPUNGE messages flagged `\Deleted` in the selected folder.
    ///
    /// # Errors
    ///
    /// [`Error::Imap`] when the EXPUNGE fails.
    pub async fn expunge(&mut self) -> Result<()> {
        let session = self.ensure_connected().await?;

        let outcome = match session.expunge().await {
            Ok(responses) => {
                // The expunge response stream is not Unpin.
                pin_mut!(responses);
                let mut failure = None;
                while let Some(item) = responses.next().await {
                    if let Err(e) = item {
                        failure = Some(e);
                        break;
                    }
                }
                failure.map_or(Ok(()), Err)
            }
            Err(e) => Err(e),
        };

        outcome.map_err(|e| self.classify(e, |d| Error::Imap(format!("Expunge failed: {d}"))))
    }

    /// Best-effort LOGOUT. The connection is dropped whatever the
    /// server says.
    pub async fn logout(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.logout().await {
                debug!("Logout failed (ignored): {e}");
            }
        }
    }
}

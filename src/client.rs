//! High-level mailbox operations
//!
//! [`MailboxClient`] is the one type callers touch. Every operation
//! names its folder explicitly and re-selects it before running, so no
//! call depends on state left behind by a previous one.

use crate::config::{CredentialProvider, EnvCredentials, ImapConfig};
use crate::error::{Error, Result, Step};
use crate::folder::Folder;
use crate::flag::Flag;
use crate::message::{DecodedMessage, MessageSummary};
use crate::session::MailSession;
use crate::utf7;
use tracing::{debug, info, warn};

/// Search queries without any of these tokens are not IMAP search
/// syntax and fall back to ALL.
const SEARCH_KEYWORDS: &[&str] = &[
    "FROM", "TO", "SUBJECT", "BODY", "TEXT", "SINCE", "BEFORE", "ON",
];

/// Body text beyond this many characters is cut and marked.
const BODY_PREVIEW_CHARS: usize = 2000;

const TRUNCATION_MARKER: &str = "...";

/// Mailbox client over a managed IMAP session.
pub struct MailboxClient {
    session: MailSession,
}

impl MailboxClient {
    #[must_use]
    pub fn new(config: ImapConfig, provider: Box<dyn CredentialProvider>) -> Self {
        Self {
            session: MailSession::new(config, provider),
        }
    }

    /// Build a client configured entirely from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the endpoint variables are
    /// malformed.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ImapConfig::from_env()?, Box::new(EnvCredentials)))
    }

    /// List all folders, decoded into ordinary text.
    ///
    /// # Errors
    ///
    /// Fails only when the connection or LIST command fails; a name
    /// that does not decode cleanly is kept in its literal wire form.
    pub async fn list_folders(&mut self) -> Result<Vec<String>> {
        let names = self.session.list_names().await?;
        Ok(names
            .iter()
            .map(|wire| {
                let decoded = utf7::decode(wire);
                debug!("Folder {wire:?} decoded as {decoded:?}");
                decoded
            })
            .collect())
    }

    /// Search a folder and return the most recent matches, newest
    /// last, at most `limit` of them.
    ///
    /// A query containing no IMAP search keyword (or an empty query)
    /// searches ALL. Messages that fail to fetch are skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Fails when the connection, SELECT, or SEARCH fails.
    pub async fn search(
        &mut self,
        folder: &Folder,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MessageSummary>> {
        self.session.select(&folder.to_wire()).await?;

        let effective = effective_query(query);
        let uids = self.session.search_uids(effective).await?;

        let start = uids.len().saturating_sub(limit);
        let recent = &uids[start..];
        info!(
            "Search '{}' in {} matched {} messages, returning {}",
            effective,
            folder,
            uids.len(),
            recent.len()
        );

        let mut summaries = Vec::with_capacity(recent.len());
        for &uid in recent {
            match self.session.fetch_raw(uid).await {
                Ok(Some(raw)) => summaries.push(MessageSummary::from_raw(uid, &raw)),
                Ok(None) => warn!("UID {uid} vanished between search and fetch"),
                Err(e) => warn!("Failed to fetch UID {uid}: {e}"),
            }
        }

        Ok(summaries)
    }

    /// Fetch and decode one message. Long bodies are truncated to a
    /// preview and marked.
    ///
    /// # Errors
    ///
    /// Fails when the connection, SELECT, or FETCH fails, or when the
    /// UID does not exist in the folder.
    pub async fn read(&mut self, folder: &Folder, uid: u32) -> Result<DecodedMessage> {
        self.session.select(&folder.to_wire()).await?;

        let raw = self
            .session
            .fetch_raw(uid)
            .await?
            .ok_or_else(|| Error::Imap(format!("No message with UID {uid} in {folder}")))?;

        let mut message = DecodedMessage::from_raw(uid, &raw);
        message.body = truncate_body(message.body);
        Ok(message)
    }

    /// Mark a message as read.
    ///
    /// # Errors
    ///
    /// Fails when the connection, SELECT, or STORE fails.
    pub async fn mark_read(&mut self, folder: &Folder, uid: u32) -> Result<()> {
        self.session.select(&folder.to_wire()).await?;
        self.session
            .store_flags(uid, &format!("+FLAGS ({})", Flag::Seen.as_imap_str()))
            .await
    }

    /// Mark a message as unread.
    ///
    /// # Errors
    ///
    /// Fails when the connection, SELECT, or STORE fails.
    pub async fn mark_unread(&mut self, folder: &Folder, uid: u32) -> Result<()> {
        self.session.select(&folder.to_wire()).await?;
        self.session
            .store_flags(uid, &format!("-FLAGS ({})", Flag::Seen.as_imap_str()))
            .await
    }

    /// Move a message to another folder: COPY, flag `\Deleted`,
    /// EXPUNGE.
    ///
    /// Not transactional. A failure after the COPY leaves the message
    /// in both folders; the error names the step that failed and the
    /// remaining steps are safe to retry.
    ///
    /// # Errors
    ///
    /// [`Error::Partial`] naming the step (copy, flag-deleted, or
    /// expunge) that failed; only the initial SELECT reports an
    /// ordinary error.
    pub async fn move_message(
        &mut self,
        folder: &Folder,
        uid: u32,
        destination: &Folder,
    ) -> Result<()> {
        self.session.select(&folder.to_wire()).await?;

        self.session
            .copy(uid, &destination.to_wire())
            .await
            .map_err(|e| partial("move", Step::Copy, &e))?;

        self.session
            .store_flags(uid, &format!("+FLAGS ({})", Flag::Deleted.as_imap_str()))
            .await
            .map_err(|e| partial("move", Step::FlagDeleted, &e))?;

        self.session
            .expunge()
            .await
            .map_err(|e| partial("move", Step::Expunge, &e))?;

        info!("Moved UID {uid} from {folder} to {destination}");
        Ok(())
    }

    /// Delete a message: flag `\Deleted`, EXPUNGE.
    ///
    /// # Errors
    ///
    /// [`Error::Partial`] when the flag sticks but the EXPUNGE fails;
    /// the message then stays flagged until a later EXPUNGE.
    pub async fn delete_message(&mut self, folder: &Folder, uid: u32) -> Result<()> {
        self.session.select(&folder.to_wire()).await?;

        self.session
            .store_flags(uid, &format!("+FLAGS ({})", Flag::Deleted.as_imap_str()))
            .await
            .map_err(|e| partial("delete", Step::FlagDeleted, &e))?;

        self.session
            .expunge()
            .await
            .map_err(|e| partial("delete", Step::Expunge, &e))?;

        info!("Deleted UID {uid} from {folder}");
        Ok(())
    }

    /// Count unread messages in a folder.
    ///
    /// # Errors
    ///
    /// Fails when the connection, SELECT, or SEARCH fails.
    pub async fn unread_count(&mut self, folder: &Folder) -> Result<usize> {
        self.session.select(&folder.to_wire()).await?;
        let uids = self.session.search_uids("UNSEEN").await?;
        Ok(uids.len())
    }

    /// Best-effort LOGOUT and disconnect.
    pub async fn logout(&mut self) {
        self.session.logout().await;
    }
}

/// Map a raw query onto the query actually sent: queries that carry no
/// search keyword search everything.
fn effective_query(query: &str) -> &str {
    let upper = query.to_uppercase();
    if !query.trim().is_empty() && SEARCH_KEYWORDS.iter().any(|k| upper.contains(k)) {
        query
    } else {
        "ALL"
    }
}

fn truncate_body(body: String) -> String {
    match body.char_indices().nth(BODY_PREVIEW_CHARS) {
        Some((cut, _)) => {
            let mut preview = body[..cut].to_string();
            preview.push_str(TRUNCATION_MARKER);
            preview
        }
        None => body,
    }
}

fn partial(op: &'static str, step: Step, source: &Error) -> Error {
    Error::Partial {
        op,
        step,
        detail: source.to_string(),
    }
}

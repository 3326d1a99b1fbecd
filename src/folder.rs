//! IMAP folder types
//!
//! Provides a strongly-typed enum for IMAP folders instead of raw
//! strings. Well-known folders like INBOX, Sent, and Trash have
//! dedicated constructors. User-defined folders use the `Custom`
//! variant.

use std::fmt;

/// An IMAP mailbox folder.
///
/// Well-known folders have dedicated variants that map to their
/// standard IMAP names. For user-created folders, use
/// [`Folder::custom`].
///
/// # Examples
///
/// ```
/// use mailbox_client::Folder;
///
/// let inbox = Folder::Inbox;
/// assert_eq!(inbox.as_str(), "INBOX");
///
/// let custom = Folder::custom("My Projects");
/// assert_eq!(custom.as_str(), "My Projects");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Folder {
    /// The INBOX folder (RFC 3501 required, case-insensitive).
    Inbox,
    /// Sent messages.
    Sent,
    /// Draft messages.
    Drafts,
    /// Deleted messages.
    Trash,
    /// Spam / junk messages.
    Spam,
    /// Archived messages.
    Archive,
    /// A user-defined or server-specific folder.
    Custom(String),
}

impl Folder {
    /// Create a folder for a user-defined or non-standard mailbox.
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// The IMAP folder name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inbox => "INBOX",
            Self::Sent => "Sent",
            Self::Drafts => "Drafts",
            Self::Trash => "Trash",
            Self::Spam => "Spam",
            Self::Archive => "Archive",
            Self::Custom(name) => name,
        }
    }

    /// The name to hand to SELECT and COPY. Non-ASCII custom names are
    /// re-encoded into the wire form.
    #[must_use]
    pub fn to_wire(&self) -> String {
        crate::utf7::encode(self.as_str())
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Folder {
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case("inbox") {
            Self::Inbox
        } else {
            match s {
                "Sent" => Self::Sent,
                "Drafts" => Self::Drafts,
                "Trash" => Self::Trash,
                "Spam" => Self::Spam,
                "Archive" => Self::Archive,
                other => Self::Custom(other.to_string()),
            }
        }
    }
}

impl From<String> for Folder {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

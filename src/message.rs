//! Decoded message records
//!
//! Built from the raw RFC 2822 octets a FETCH returns. Header values
//! go through the encoded-word decoder, the body through the MIME
//! selection policy. These are plain data: any display or wire
//! formatting is the caller's business.

use crate::body::{self, BodySource};
use crate::header;
use chrono::{DateTime, FixedOffset};
use mail_parser::MessageParser;
use serde::Serialize;

/// Lightweight search-result record: headers only, no body.
#[derive(Debug, Clone, Serialize)]
pub struct MessageSummary {
    pub id: u32,
    pub subject: String,
    pub from: String,
    pub date: String,
}

impl MessageSummary {
    /// Decode the summary headers out of raw message bytes.
    #[must_use]
    pub fn from_raw(id: u32, raw: &[u8]) -> Self {
        Self {
            id,
            subject: decoded_field(raw, "subject").unwrap_or_else(|| "No Subject".to_string()),
            from: decoded_field(raw, "from").unwrap_or_else(|| "Unknown".to_string()),
            date: decoded_field(raw, "date").unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// A fully decoded message as returned by `read`.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedMessage {
    pub id: u32,
    pub subject: String,
    pub from: String,
    pub to: String,
    pub date: String,
    pub body: String,
    pub body_source: BodySource,
}

impl DecodedMessage {
    /// Decode headers and body out of raw message bytes.
    ///
    /// Decoding is fail-soft throughout: a message the parser rejects
    /// still yields header text and the undecodable-body sentinel.
    #[must_use]
    pub fn from_raw(id: u32, raw: &[u8]) -> Self {
        let extracted = MessageParser::default().parse(raw).map_or_else(
            || body::ExtractedBody {
                text: body::UNDECODABLE_BODY.to_string(),
                source: BodySource::Unavailable,
            },
            |msg| body::extract(&msg),
        );

        Self {
            id,
            subject: decoded_field(raw, "subject").unwrap_or_else(|| "No Subject".to_string()),
            from: decoded_field(raw, "from").unwrap_or_else(|| "Unknown".to_string()),
            to: decoded_field(raw, "to").unwrap_or_else(|| "Unknown".to_string()),
            date: decoded_field(raw, "date").unwrap_or_else(|| "Unknown".to_string()),
            body: extracted.text,
            body_source: extracted.source,
        }
    }

    /// Parse the Date header, if it is valid RFC 2822.
    #[must_use]
    pub fn parsed_date(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc2822(self.date.trim()).ok()
    }
}

/// Pull one header field out of the raw bytes and decode its
/// encoded-word content.
fn decoded_field(raw: &[u8], name: &str) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let head = text
        .split("\r\n\r\n")
        .next()
        .and_then(|h| h.split("\n\n").next())
        .unwrap_or("");

    let value = unfolded_field(head, name)?;
    Some(header::decode(&value))
}

/// Find a header by name (case-insensitive), joining folded
/// continuation lines.
fn unfolded_field(head: &str, name: &str) -> Option<String> {
    let mut value: Option<String> = None;

    for line in head.lines() {
        if let Some(v) = &mut value {
            if line.starts_with(' ') || line.starts_with('\t') {
                v.push(' ');
                v.push_str(line.trim());
                continue;
            }
            break;
        }

        if let Some(colon) = line.find(':') {
            if line[..colon].trim().eq_ignore_ascii_case(name) {
                value = Some(line[colon + 1..].trim().to_string());
            }
        }
    }

    value
}

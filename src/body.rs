//! Best-body selection over a parsed MIME part tree
//!
//! Parsing raw octets into a part tree is `mail-parser`'s job; this
//! module only decides which textual part survives. The policy is
//! deliberately lossy: depth-first over the tree, attachments skipped,
//! the last `text/plain` part wins, HTML only as a fallback.

use mail_parser::{Message, MimeHeaders, PartType};
use serde::Serialize;

/// Fallback body when nothing textual could be recovered.
pub const UNDECODABLE_BODY: &str = "Could not decode message body";

/// Which representation the extracted body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySource {
    PlainText,
    Html,
    Unavailable,
}

/// A selected body text and its provenance.
#[derive(Debug, Clone)]
pub struct ExtractedBody {
    pub text: String,
    pub source: BodySource,
}

/// Select the best-available body text from a parsed message.
///
/// Never fails: an undecodable message yields [`UNDECODABLE_BODY`].
#[must_use]
pub fn extract(msg: &Message<'_>) -> ExtractedBody {
    // A single-part message returns its sole payload as text whatever
    // the declared type or disposition.
    if let Some(root) = msg.parts.first() {
        match &root.body {
            PartType::Text(text) => {
                return ExtractedBody {
                    text: text.to_string(),
                    source: BodySource::PlainText,
                };
            }
            PartType::Html(text) => {
                return ExtractedBody {
                    text: text.to_string(),
                    source: BodySource::Html,
                };
            }
            PartType::Binary(bytes) | PartType::InlineBinary(bytes) => {
                return ExtractedBody {
                    text: String::from_utf8_lossy(bytes).into_owned(),
                    source: BodySource::PlainText,
                };
            }
            PartType::Multipart(_) | PartType::Message(_) => {}
        }
    }

    let mut plain: Option<String> = None;
    let mut html: Option<String> = None;
    collect(msg, 0, &mut plain, &mut html);

    if let Some(text) = plain.filter(|t| !t.is_empty()) {
        ExtractedBody {
            text,
            source: BodySource::PlainText,
        }
    } else if let Some(text) = html.filter(|t| !t.is_empty()) {
        ExtractedBody {
            text,
            source: BodySource::Html,
        }
    } else {
        ExtractedBody {
            text: UNDECODABLE_BODY.to_string(),
            source: BodySource::Unavailable,
        }
    }
}

/// Depth-first visit accumulating the last plain and HTML parts seen.
fn collect(
    msg: &Message<'_>,
    part_id: usize,
    plain: &mut Option<String>,
    html: &mut Option<String>,
) {
    let Some(part) = msg.parts.get(part_id) else {
        return;
    };

    if is_attachment(part) {
        return;
    }

    match &part.body {
        PartType::Multipart(children) => {
            for &child in children {
                collect(msg, child, plain, html);
            }
        }
        PartType::Message(nested) => collect(nested, 0, plain, html),
        PartType::Text(text) => *plain = Some(text.to_string()),
        PartType::Html(text) => *html = Some(text.to_string()),
        PartType::Binary(_) | PartType::InlineBinary(_) => {}
    }
}

fn is_attachment(part: &mail_parser::MessagePart<'_>) -> bool {
    part.content_disposition()
        .is_some_and(|cd| cd.ctype().eq_ignore_ascii_case("attachment"))
}

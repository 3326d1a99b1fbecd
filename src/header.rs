//! RFC 2047 encoded-word header decoding
//!
//! Headers arrive as a mix of literal ASCII and `=?charset?B|Q?...?=`
//! segments, each carrying its own charset and transfer encoding.
//! [`decode`] concatenates every span in order and never fails: a
//! malformed segment degrades to UTF-8-lossy text (or is kept verbatim
//! when it is not an encoded word at all) instead of poisoning the
//! whole header.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::warn;

/// Decode a raw header value into plain text. Total function.
#[must_use]
pub fn decode(raw_header: &str) -> String {
    let mut result = String::with_capacity(raw_header.len());
    let mut remaining = raw_header;
    let mut last_was_encoded = false;

    while let Some(start) = remaining.find("=?") {
        let before = &remaining[..start];
        // Whitespace between two adjacent encoded words is not part of
        // the text (RFC 2047 section 6.2).
        if !last_was_encoded || !before.trim().is_empty() {
            result.push_str(before);
        }

        let after_start = &remaining[start + 2..];
        if let Some(word) = decode_one_word(after_start) {
            result.push_str(&word.text);
            remaining = &after_start[word.consumed..];
            last_was_encoded = true;
        } else {
            result.push_str("=?");
            remaining = after_start;
            last_was_encoded = false;
        }
    }

    result.push_str(remaining);
    result
}

struct DecodedWord {
    text: String,
    /// Bytes consumed after the opening `=?`.
    consumed: usize,
}

/// Parse and decode a single `charset?encoding?payload?=` tail.
fn decode_one_word(s: &str) -> Option<DecodedWord> {
    let first_q = s.find('?')?;
    let charset = &s[..first_q];

    let rest = &s[first_q + 1..];
    let second_q = rest.find('?')?;
    let encoding = &rest[..second_q];

    let payload = &rest[second_q + 1..];
    let end = payload.find("?=")?;
    let payload = &payload[..end];

    let consumed = first_q + 1 + second_q + 1 + end + 2;

    let bytes = match encoding {
        "B" | "b" => {
            let stripped: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
            STANDARD.decode(stripped).ok()?
        }
        "Q" | "q" => decode_q(payload),
        _ => return None,
    };

    Some(DecodedWord {
        text: decode_charset(charset, &bytes),
        consumed,
    })
}

/// Q-encoding: underscores are spaces, `=XX` is a raw byte.
fn decode_q(payload: &str) -> Vec<u8> {
    let bytes = payload.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                out.push(b' ');
                i += 1;
            }
            b'=' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    out.push(byte);
                    i += 3;
                } else {
                    out.push(b'=');
                    i += 1;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }

    out
}

/// Decode bytes using a named charset, falling back to UTF-8 lossy.
pub(crate) fn decode_charset(charset: &str, bytes: &[u8]) -> String {
    if charset.eq_ignore_ascii_case("utf-8") || charset.eq_ignore_ascii_case("utf8") {
        return String::from_utf8_lossy(bytes).into_owned();
    }

    if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
        let (decoded, _, _) = encoding.decode(bytes);
        decoded.into_owned()
    } else {
        warn!(charset, "unknown charset, decoding as UTF-8 lossy");
        String::from_utf8_lossy(bytes).into_owned()
    }
}

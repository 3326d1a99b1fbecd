//! IMAP modified UTF-7 folder-name codec (RFC 3501 section 5.1.3)
//!
//! Folder names come off the wire in a UTF-7 variant that escapes
//! non-ASCII runs as `&<base64>-`, Base64-encoding UTF-16BE code units
//! with `,` substituted for `/` so folder-path separators stay safe.
//!
//! [`decode`] is total: malformed escapes fall back to the literal wire
//! text instead of failing, so a broken name from a legacy server never
//! aborts a folder listing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Decode a wire-encoded folder name into ordinary text.
///
/// Never fails. An `&-` pair is a literal ampersand. An `&` followed by
/// a Base64 payload and a closing `-` decodes to UTF-16BE text; if the
/// payload does not decode, the literal `&<payload>-` is kept. An `&`
/// with no closing `-` is emitted as a literal `&`.
#[must_use]
pub fn decode(wire: &str) -> String {
    let chars: Vec<char> = wire.chars().collect();
    let mut out = String::with_capacity(wire.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '&' || i + 1 >= chars.len() {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let Some(end) = chars[i + 1..].iter().position(|&c| c == '-') else {
            // No closing dash before end of input.
            out.push('&');
            i += 1;
            continue;
        };
        let end = i + 1 + end;

        if end == i + 1 {
            out.push('&');
            i += 2;
            continue;
        }

        let payload: String = chars[i + 1..end].iter().collect();
        match decode_escape(&payload) {
            Some(text) => out.push_str(&text),
            None => {
                // Keep the visual wire form rather than dropping data.
                out.push('&');
                out.push_str(&payload);
                out.push('-');
            }
        }
        i = end + 1;
    }

    out
}

/// Decode one `&...-` payload: `,` back to `/`, pad, Base64, UTF-16BE.
fn decode_escape(payload: &str) -> Option<String> {
    let mut b64 = payload.replace(',', "/");
    while b64.len() % 4 != 0 {
        b64.push('=');
    }

    let bytes = STANDARD.decode(b64).ok()?;
    if bytes.len() % 2 != 0 {
        return None;
    }

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| (u16::from(pair[0]) << 8) | u16::from(pair[1]))
        .collect();
    String::from_utf16(&units).ok()
}

/// Encode text into the wire folder-name form.
///
/// The live system only decodes; this exists for symmetry and to test
/// the `decode(encode(x)) == x` invariant.
#[must_use]
pub fn encode(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut run: Vec<u16> = Vec::new();

    for ch in name.chars() {
        let code = u32::from(ch);
        if (0x20..=0x7e).contains(&code) && ch != '&' {
            flush_run(&mut run, &mut out);
            out.push(ch);
        } else if ch == '&' {
            flush_run(&mut run, &mut out);
            out.push_str("&-");
        } else {
            let mut buf = [0u16; 2];
            run.extend_from_slice(ch.encode_utf16(&mut buf));
        }
    }

    flush_run(&mut run, &mut out);
    out
}

fn flush_run(run: &mut Vec<u16>, out: &mut String) {
    if run.is_empty() {
        return;
    }

    let mut bytes = Vec::with_capacity(run.len() * 2);
    for unit in run.drain(..) {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }

    let b64 = STANDARD
        .encode(&bytes)
        .trim_end_matches('=')
        .replace('/', ",");
    out.push('&');
    out.push_str(&b64);
    out.push('-');
}

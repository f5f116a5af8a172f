//! Compatibility shim applied to every chunk before it reaches the engine.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a `To:` header whose value wraps onto a continuation line with no
/// leading token. `\s+` deliberately spans the line break so the wrapped
/// value is folded back onto the header line.
static WRAPPED_TO_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\nTo:\s+").expect("wrapped To: header pattern must compile"));

/// Decodes a raw chunk as UTF-8 (lossily) and collapses the whitespace after
/// a line-initial `To:` to a single space.
///
/// Some producers emit a `To:` header whose value wraps onto a new line with
/// only whitespace before the first address character; the engine cannot
/// parse a continuation line that begins with no printable token and rejects
/// the whole message. No other header, and no part of the body, is altered.
///
/// Pure and idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    WRAPPED_TO_HEADER.replace_all(&text, "\nTo: ").into_owned()
}

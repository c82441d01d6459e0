//! Builders for replies and surface-side scripts
//!
//! Replies to the backend are ordinary protocol lines. Deliveries into a
//! surface are script snippets evaluated by the surface's embedded runtime,
//! which settles pending calls and dispatches events.

use crate::encoding::encode_uri_component;

/// Global object the surface preload installs for the shell to call into
pub const SURFACE_BRIDGE: &str = "window.__opsh";

/// `state` value for a successful reply
pub const STATE_OK: &str = "0";

/// `state` value for a failed reply
pub const STATE_ERROR: &str = "1";

/// A `resolve` line addressed to the backend.
///
/// `value` must already be encoded (or be the literal `null`).
pub fn resolve_to_backend(seq: &str, state: &str, value: &str) -> String {
    format!("resolve seq={} state={} value={}", seq, state, value)
}

/// Acknowledge a `seq` with a `null` payload.
pub fn ack(seq: &str) -> String {
    resolve_to_backend(seq, STATE_OK, "null")
}

/// Reject a `seq`, carrying an encoded error message.
pub fn reject(seq: &str, message: &str) -> String {
    resolve_to_backend(seq, STATE_ERROR, &encode_uri_component(message))
}

/// Script that settles the pending surface call `seq`.
pub fn resolve_to_surface(seq: &str, state: &str, value: &str) -> String {
    format!(
        "{}.resolve('{}', '{}', '{}')",
        SURFACE_BRIDGE,
        js_escape(seq),
        js_escape(state),
        js_escape(value)
    )
}

/// Script that dispatches the event `event` with an encoded payload.
pub fn emit_to_surface(event: &str, value: &str) -> String {
    format!(
        "{}.emit('{}', '{}')",
        SURFACE_BRIDGE,
        js_escape(event),
        js_escape(value)
    )
}

/// Escape text for a single-quoted JavaScript string literal.
fn js_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

use serde_json::Value;

/// Phrase the matcher puts in its message when form and PDF agree.
/// Compared case-insensitively as a substring.
pub const SUCCESS_MARKER: &str = "success: all fields match";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictOutcome {
    Match,
    Mismatch,
}

/// The matcher's judgment, mapped into our own terms.
///
/// Persistence branches on `outcome` only. `upstream_status` and `raw` are
/// what the client receives back.
#[derive(Debug, Clone)]
pub struct MatchVerdict {
    pub outcome: VerdictOutcome,
    pub message: String,
    pub upstream_status: u16,
    pub raw: Value,
}

impl MatchVerdict {
    pub fn from_response(upstream_status: u16, raw: Value) -> Self {
        let message = message_content(&raw).to_string();
        let succeeded = (200..300).contains(&upstream_status);
        let outcome = if succeeded && indicates_match(&message) {
            VerdictOutcome::Match
        } else {
            VerdictOutcome::Mismatch
        };

        Self {
            outcome,
            message,
            upstream_status,
            raw,
        }
    }

    pub fn is_match(&self) -> bool {
        self.outcome == VerdictOutcome::Match
    }
}

/// `message.content` of the matcher body, or "" when the shape differs.
fn message_content(body: &Value) -> &str {
    body.get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .unwrap_or("")
}

pub fn indicates_match(message: &str) -> bool {
    message.to_lowercase().contains(SUCCESS_MARKER)
}

//! The classified, terminal result of one verification attempt.

use serde::Serialize;
use std::fmt;

/// The five-way result taxonomy downstream policy branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DkimResult {
    /// Signature present and verified.
    Pass,
    /// No signature found. Not itself a failure; policy decides later.
    None,
    /// Transient infrastructure failure (key retrieval, DNS). Retryable.
    Tempfail,
    /// Malformed input to the verifier, including a zero-length message.
    /// Not retryable; the message itself is defective.
    Invalid,
    /// Signature present but verification failed, or any unrecognized
    /// engine error. Not retryable; the message is suspect.
    Fail,
}

impl fmt::Display for DkimResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DkimResult::Pass => "pass",
            DkimResult::None => "none",
            DkimResult::Tempfail => "tempfail",
            DkimResult::Invalid => "invalid",
            DkimResult::Fail => "fail",
        };
        f.write_str(s)
    }
}

/// The outcome of one verification attempt, immutable once built.
///
/// `error` is `Some` if and only if `result != Pass`. The metadata fields
/// are each independently best-effort: a failed read from the engine
/// degrades to `""` and never disturbs the other fields or the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationOutcome {
    pub result: DkimResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub identity: String,
    pub domain: String,
    pub selector: String,
}

impl VerificationOutcome {
    /// Renders the Authentication-Results annotation for this outcome, e.g.
    /// `dkim=pass header.i=@example.com` or
    /// `dkim=none (No signature) header.i=`.
    pub fn auth_results(&self) -> String {
        match &self.error {
            Some(error) => format!(
                "dkim={} ({}) header.i={}",
                self.result, error, self.identity
            ),
            None => format!("dkim={} header.i={}", self.result, self.identity),
        }
    }

    /// Renders the structured log line recorded for every outcome.
    pub fn log_line(&self) -> String {
        let mut line = format!(
            "identity=\"{}\" domain=\"{}\" selector=\"{}\" result={}",
            self.identity, self.domain, self.selector, self.result
        );
        if let Some(error) = &self.error {
            line.push_str(&format!(" ({})", error));
        }
        line
    }
}

//! Maps raw engine failures onto the five-way result taxonomy.

use crate::verification::engine::{EngineError, VerificationEngine};
use crate::verification::outcome::{DkimResult, VerificationOutcome};

/// The engine's malformed-input signal for a zero-length chunk.
pub const ZERO_LENGTH_CHUNK: &str = "chunk(): length must be defined and non-zero";

/// Fixed message substituted for the zero-length case.
pub const INVALID_MESSAGE_SIZE: &str = "Invalid Message Size";

/// Placeholder when the engine failed without supplying a message.
const NO_ERROR_MESSAGE: &str = "No error message";

/// The whole message→taxonomy mapping in one auditable table. Any engine
/// message not listed here classifies as `Fail` (fail-closed).
const CLASSIFICATION_TABLE: &[(&str, DkimResult)] = &[
    ("No signature", DkimResult::None),
    ("Key retrieval failed", DkimResult::Tempfail),
    ("Resource unavailable", DkimResult::Tempfail),
    ("Try again later", DkimResult::Tempfail),
    ("Invalid parameter", DkimResult::Invalid),
    ("Invalid result", DkimResult::Invalid),
];

/// Classifies a raw engine failure (or its absence) into a result kind and
/// the error message carried alongside it.
///
/// The returned message is `Some` exactly when the kind is not `Pass`.
pub fn classify(error: Option<&EngineError>) -> (DkimResult, Option<String>) {
    let Some(error) = error else {
        return (DkimResult::Pass, None);
    };
    let message = error.message();

    if message == ZERO_LENGTH_CHUNK {
        return (DkimResult::Invalid, Some(INVALID_MESSAGE_SIZE.to_string()));
    }

    for (known, kind) in CLASSIFICATION_TABLE {
        if message == *known {
            return (*kind, Some(message.to_string()));
        }
    }

    let message = if message.is_empty() {
        NO_ERROR_MESSAGE
    } else {
        message
    };
    (DkimResult::Fail, Some(message.to_string()))
}

/// Builds the full outcome: classification plus best-effort metadata.
///
/// Identity, domain and selector are three independent fallible lookups.
/// Each failing read degrades to `""` with a debug log and never affects
/// the already computed result or the remaining fields.
pub fn build_outcome<E>(engine: &E, error: Option<&EngineError>) -> VerificationOutcome
where
    E: VerificationEngine + ?Sized,
{
    let (result, error_message) = classify(error);

    VerificationOutcome {
        result,
        error: error_message,
        identity: read_metadata("identity", engine.identity()),
        domain: read_metadata("domain", engine.domain()),
        selector: read_metadata("selector", engine.selector()),
    }
}

fn read_metadata(field: &str, value: Result<String, EngineError>) -> String {
    match value {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(target: "verification_stream", "missing {}: {}", field, err);
            String::new()
        }
    }
}

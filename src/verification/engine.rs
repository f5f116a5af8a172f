//! The verification-engine capability boundary.
//!
//! The engine (libopendkim or equivalent) is an external collaborator: it
//! parses signature headers, retrieves public keys, canonicalizes and hashes
//! the message. This crate only drives it. The engine keeps sequential
//! accumulator state across `chunk` calls, so callers must deliver chunks
//! strictly in order, one at a time, and call `finalize` exactly once.

use async_trait::async_trait;
use thiserror::Error;

/// A raw failure reported by the verification engine.
///
/// Engines report verdicts as free-text messages; the classifier in
/// [`classify`](crate::verification::classify) maps those messages onto the
/// result taxonomy. Nothing outside the classifier should interpret the
/// text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The opaque DKIM verification capability consumed by the stream.
///
/// Contract:
/// - `chunk` must only ever be called with non-empty input; a zero-length
///   unit is a distinct malformed-input signal at the engine boundary and
///   the stream filters it out before it gets here.
/// - `finalize` closes the chunk sequence, triggers signature evaluation
///   and key retrieval, and must be called exactly once per message.
/// - The metadata accessors may each fail independently when no signature
///   was found; callers degrade a failed read to `""`.
#[async_trait]
pub trait VerificationEngine {
    /// Feeds one ordered, non-empty piece of the message to the engine.
    async fn chunk(&mut self, message: &str) -> Result<(), EngineError>;

    /// Closes the chunk sequence and evaluates the signature. May block on
    /// key retrieval (DNS), so this is the unbounded-latency path.
    async fn finalize(&mut self) -> Result<(), EngineError>;

    /// The signing identity (`i=` tag), e.g. `@example.com`.
    fn identity(&self) -> Result<String, EngineError>;

    /// The signing domain (`d=` tag).
    fn domain(&self) -> Result<String, EngineError>;

    /// The key selector (`s=` tag).
    fn selector(&self) -> Result<String, EngineError>;
}

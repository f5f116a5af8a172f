//! The surface a mail-processing pipeline consumes: an end-to-end driver
//! that feeds a message stream through verification, plus the result-store
//! mapping and outcome logging the pipeline performs on completion.

use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::oneshot;

use crate::core::config::Config;
use crate::core::error::{AppError, Result};
use crate::verification::engine::{EngineError, VerificationEngine};
use crate::verification::outcome::{DkimResult, VerificationOutcome};
use crate::verification::stream::MessageVerificationStream;

/// How one outcome is recorded in the pipeline's result store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultEntry {
    /// Verified: store the signing domain.
    Pass { domain: String },
    /// No signature: store why verification was skipped.
    Skip { reason: String },
    /// Definitive verification failure: store domain and reason.
    Fail { domain: String, reason: String },
    /// Tempfail or invalid input: recorded as an error entry.
    Error { domain: String, reason: String },
}

impl ResultEntry {
    pub fn from_outcome(outcome: &VerificationOutcome) -> Self {
        let reason = outcome.error.clone().unwrap_or_default();
        match outcome.result {
            DkimResult::Pass => ResultEntry::Pass {
                domain: outcome.domain.clone(),
            },
            DkimResult::None => ResultEntry::Skip { reason },
            DkimResult::Fail => ResultEntry::Fail {
                domain: outcome.domain.clone(),
                reason,
            },
            DkimResult::Tempfail | DkimResult::Invalid => ResultEntry::Error {
                domain: outcome.domain.clone(),
                reason,
            },
        }
    }
}

/// Everything downstream consumers need from one verification attempt.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    /// The full classified outcome, persisted for downstream consumers.
    pub outcome: VerificationOutcome,
    /// The raw engine failure, absent on the pass path.
    pub failure: Option<EngineError>,
    /// The result-store entry derived from the outcome.
    pub entry: ResultEntry,
    /// The rendered Authentication-Results annotation.
    pub auth_results: String,
}

/// Drives one message through a [`MessageVerificationStream`] end to end.
///
/// Chunks are offered in order, retrying under backpressure via the drain
/// signal. After the last chunk the stream is finalized and the outcome
/// awaited under the configured verification budget. A budget overrun is
/// forced to a tempfail outcome, since the engine's key-retrieval path is
/// retryable by nature.
///
/// Exactly one report is returned per call; the exactly-once completion
/// guarantee of the underlying stream means the pipeline can resume
/// unconditionally on return.
pub async fn verify_message<E, S>(engine: E, config: &Config, mut chunks: S) -> Result<VerificationReport>
where
    E: VerificationEngine + Send + 'static,
    S: Stream<Item = Vec<u8>> + Unpin,
{
    let (done_tx, done_rx) = oneshot::channel();
    let stream = MessageVerificationStream::new(
        engine,
        config.verify_timeout(),
        move |failure, outcome| {
            let _ = done_tx.send((failure, outcome));
        },
    );

    while let Some(buf) = chunks.next().await {
        while !stream.accept_chunk(&buf) {
            stream.drained().await;
        }
    }
    stream.finalize(None).await;

    let (failure, outcome) = match tokio::time::timeout(stream.timeout_budget(), done_rx).await {
        Ok(Ok(completed)) => completed,
        Ok(Err(_)) => {
            return Err(AppError::Task(
                "verification worker exited without completing".to_string(),
            ));
        }
        Err(_) => {
            tracing::warn!(
                target: "pipeline",
                budget = ?stream.timeout_budget(),
                "verification budget exceeded; forcing tempfail"
            );
            let outcome = VerificationOutcome {
                result: DkimResult::Tempfail,
                error: Some("verification timed out".to_string()),
                identity: String::new(),
                domain: String::new(),
                selector: String::new(),
            };
            (None, outcome)
        }
    };

    tracing::info!(target: "pipeline", "{}", outcome.log_line());
    tracing::debug!(target: "pipeline", "{}", serde_json::to_string(&outcome)?);

    Ok(VerificationReport {
        auth_results: outcome.auth_results(),
        entry: ResultEntry::from_outcome(&outcome),
        failure,
        outcome,
    })
}

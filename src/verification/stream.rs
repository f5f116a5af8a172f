//! The per-message verification stream.
//!
//! One stream instance lives for the duration of one message's body
//! transfer. It accepts ordered byte chunks from a producer under a
//! backpressure contract, serializes them through the chunk normalizer into
//! the engine, enforces at-most-one finalize, and invokes the completion
//! callback exactly once with the classified outcome.
//!
//! Internally the stream is a worker task that exclusively owns the engine
//! and drains a bounded command channel. The bounded channel is the
//! backpressure: while a dispatch is outstanding, [`accept_chunk`] declines
//! further input and the producer waits on [`drained`] before retrying.
//! FIFO delivery over a single channel preserves producer order, and the
//! single worker loop guarantees at most one engine dispatch is outstanding
//! at any time.
//!
//! [`accept_chunk`]: MessageVerificationStream::accept_chunk
//! [`drained`]: MessageVerificationStream::drained

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Notify;

use crate::verification::classify;
use crate::verification::engine::{EngineError, VerificationEngine};
use crate::verification::normalize::normalize;
use crate::verification::outcome::VerificationOutcome;

/// Completion callback: `(failure, outcome)`. `failure` is `None` exactly
/// on the pass path; the outcome is fully populated either way, so callers
/// never branch on the failure to read identity/domain/selector.
type Completion = Box<dyn FnOnce(Option<EngineError>, VerificationOutcome) + Send>;

enum Command {
    Chunk(Vec<u8>),
    Finalize(Option<Vec<u8>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Open,
    Finished,
}

/// Mutable state owned by the worker task, never shared across messages.
struct StreamState {
    phase: Phase,
    /// Bytes accepted from the producer but not yet acknowledged by the
    /// engine.
    pending_bytes: usize,
    /// Total bytes the engine has acknowledged. Zero at finalize means the
    /// message was empty and classifies as invalid.
    delivered_bytes: u64,
}

/// A sink that feeds one message, chunk by chunk, into a verification
/// engine and emits exactly one classified [`VerificationOutcome`].
///
/// Streams are created per message and discarded after the completion
/// callback fires. Dropping the stream before [`finalize`] abandons the
/// message: the worker exits and no outcome is produced.
///
/// [`finalize`]: MessageVerificationStream::finalize
pub struct MessageVerificationStream {
    tx: mpsc::Sender<Command>,
    drained: Arc<Notify>,
    timeout_budget: Duration,
}

impl MessageVerificationStream {
    /// Creates a stream bound to one engine handle and one completion
    /// callback, and spawns its worker task.
    ///
    /// `timeout_budget` bounds how long finalize may remain outstanding.
    /// The stream itself carries the value but does not run a timer; the
    /// surrounding pipeline enforces it (the engine's key-retrieval path is
    /// the actual source of unbounded latency).
    pub fn new<E, F>(engine: E, timeout_budget: Duration, on_complete: F) -> Self
    where
        E: VerificationEngine + Send + 'static,
        F: FnOnce(Option<EngineError>, VerificationOutcome) + Send + 'static,
    {
        // Capacity 1: one chunk may queue while another is dispatched, so a
        // fast producer can never buffer an unbounded message ahead of a
        // slow engine.
        let (tx, rx) = mpsc::channel(1);
        let drained = Arc::new(Notify::new());
        tokio::spawn(run_worker(
            engine,
            rx,
            Arc::clone(&drained),
            Box::new(on_complete) as Completion,
        ));
        Self {
            tx,
            drained,
            timeout_budget,
        }
    }

    /// Offers one chunk to the stream.
    ///
    /// Returns `true` when the chunk was accepted (or was a no-op: empty
    /// input never reaches the engine, and writes after completion are
    /// silently discarded). Returns `false` under backpressure; the caller
    /// must wait on [`drained`](Self::drained) and offer the chunk again.
    pub fn accept_chunk(&self, buf: &[u8]) -> bool {
        if buf.is_empty() {
            return true;
        }
        match self.tx.try_send(Command::Chunk(buf.to_vec())) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Closed(_)) => {
                // Already finished; further writes are no-ops.
                tracing::debug!(target: "verification_stream", "chunk after completion discarded");
                true
            }
        }
    }

    /// Resolves once the worker has retired a command (or exited), i.e.
    /// when a producer that saw backpressure may retry.
    pub async fn drained(&self) {
        self.drained.notified().await;
    }

    /// Closes the chunk sequence and triggers signature evaluation.
    ///
    /// A non-empty `last` buffer is delivered as one final chunk before the
    /// engine is finalized. Calling `finalize` again after completion is a
    /// swallowed no-op: the callback never fires twice.
    pub async fn finalize(&self, last: Option<&[u8]>) {
        let command = Command::Finalize(last.map(<[u8]>::to_vec));
        if self.tx.send(command).await.is_err() {
            tracing::debug!(target: "verification_stream", "finalize after completion ignored");
        }
    }

    /// The configured bound on how long finalize may stay outstanding.
    pub fn timeout_budget(&self) -> Duration {
        self.timeout_budget
    }
}

async fn run_worker<E>(
    mut engine: E,
    mut rx: mpsc::Receiver<Command>,
    drained: Arc<Notify>,
    on_complete: Completion,
) where
    E: VerificationEngine,
{
    let mut state = StreamState {
        phase: Phase::Open,
        pending_bytes: 0,
        delivered_bytes: 0,
    };
    let mut on_complete = Some(on_complete);

    while let Some(command) = rx.recv().await {
        match command {
            Command::Chunk(buf) => {
                let dispatched = dispatch_chunk(&mut engine, &mut state, &buf).await;
                drained.notify_one();
                if let Err(err) = dispatched {
                    complete(&mut state, &mut on_complete, &engine, Some(err));
                    break;
                }
            }
            Command::Finalize(last) => {
                if let Some(buf) = last.filter(|buf| !buf.is_empty()) {
                    if let Err(err) = dispatch_chunk(&mut engine, &mut state, &buf).await {
                        complete(&mut state, &mut on_complete, &engine, Some(err));
                        break;
                    }
                }
                let failure = finalize_engine(&mut engine, &state).await;
                complete(&mut state, &mut on_complete, &engine, failure);
                break;
            }
        }
    }

    // Wake any producer still parked on drained(), whether we completed or
    // the stream handle was dropped mid-message.
    drained.notify_waiters();
    if state.phase == Phase::Open {
        tracing::debug!(
            target: "verification_stream",
            "stream dropped before finalize; no outcome produced"
        );
    }
}

async fn dispatch_chunk<E>(
    engine: &mut E,
    state: &mut StreamState,
    buf: &[u8],
) -> Result<(), EngineError>
where
    E: VerificationEngine,
{
    state.pending_bytes += buf.len();
    let text = normalize(buf);
    let result = engine.chunk(&text).await;
    state.pending_bytes = state.pending_bytes.saturating_sub(buf.len());
    if result.is_ok() {
        state.delivered_bytes += text.len() as u64;
    }
    result
}

async fn finalize_engine<E>(engine: &mut E, state: &StreamState) -> Option<EngineError>
where
    E: VerificationEngine,
{
    if state.delivered_bytes == 0 {
        // An all-empty message still gets the finalize call the engine
        // contract requires, but the outcome is always the zero-length
        // failure, which classifies as invalid.
        let _ = engine.finalize().await;
        return Some(EngineError::new(classify::ZERO_LENGTH_CHUNK));
    }
    engine.finalize().await.err()
}

/// The single terminal transition. The first failure or success to reach it
/// wins; the phase check plus `Option::take` on the callback make any later
/// attempt, from either the chunk path or the finalize path, a silent no-op.
fn complete<E>(
    state: &mut StreamState,
    on_complete: &mut Option<Completion>,
    engine: &E,
    failure: Option<EngineError>,
) where
    E: VerificationEngine,
{
    if state.phase == Phase::Finished {
        return;
    }
    state.phase = Phase::Finished;

    let Some(callback) = on_complete.take() else {
        return;
    };
    let outcome = classify::build_outcome(engine, failure.as_ref());
    tracing::debug!(
        target: "verification_stream",
        result = %outcome.result,
        delivered_bytes = state.delivered_bytes,
        "verification complete"
    );
    callback(failure, outcome);
}

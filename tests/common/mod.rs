//! Shared test fixtures: message constants and a scriptable mock engine.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use dkim_gate::{EngineError, VerificationEngine};

/// A well-formed signed message (identity `@example.com`, domain
/// `example.com`, selector `test`).
pub const MESSAGE_GOOD: &str = "DKIM-Signature: v=1; a=rsa-sha256; c=simple/simple; d=example.com; s=test;\r\n\tt=1302980504; bh=yTPm9U2wxXiHHzMRme5SOZaAyH4=;\r\n\th=Received:From:To:Subject;\r\n\tb=TEijanOTP5QEvvA2zbLvqTapCkM=\r\nFrom: Bob <bob@example.com>\r\nTo: alice@example.com\r\nSubject: Testing\r\n\r\nThis is a test message.\r\n";

/// The same message without any DKIM-Signature header.
pub const MESSAGE_NO_SIGNATURE: &str = "From: Bob <bob@example.com>\r\nTo: alice@example.com\r\nSubject: Testing\r\n\r\nThis is a test message.\r\n";

/// Signed message whose body was tampered with after signing.
pub const MESSAGE_BAD_ALTERED_BODY: &str = "DKIM-Signature: v=1; a=rsa-sha256; c=simple/simple; d=example.com; s=test;\r\n\tt=1302980504; bh=yTPm9U2wxXiHHzMRme5SOZaAyH4=;\r\n\th=Received:From:To:Subject;\r\n\tb=TEijanOTP5QEvvA2zbLvqTapCkM=\r\nFrom: Bob <bob@example.com>\r\nTo: alice@example.com\r\nSubject: Testing\r\n\r\nThis is an ALTERED test message.\r\n";

/// Good message whose `To:` value wraps onto a continuation line with no
/// leading token, the malformed pattern the normalizer repairs.
pub const MESSAGE_GOOD_WRAPPED_TO: &str = "DKIM-Signature: v=1; a=rsa-sha256; c=simple/simple; d=example.com; s=test;\r\n\tt=1302980504; bh=yTPm9U2wxXiHHzMRme5SOZaAyH4=;\r\n\th=Received:From:To:Subject;\r\n\tb=TEijanOTP5QEvvA2zbLvqTapCkM=\r\nFrom: Bob <bob@example.com>\r\nTo:\r\n   alice@example.com\r\nSubject: Testing\r\n\r\nThis is a test message.\r\n";

/// Shared handles into a [`MockEngine`] that survive moving the engine into
/// a stream's worker task.
#[derive(Clone)]
pub struct EngineProbe {
    pub received: Arc<Mutex<String>>,
    pub chunk_calls: Arc<AtomicUsize>,
    pub finalize_calls: Arc<AtomicUsize>,
}

impl EngineProbe {
    pub fn received_text(&self) -> String {
        self.received.lock().unwrap().clone()
    }

    pub fn chunk_calls(&self) -> usize {
        self.chunk_calls.load(Ordering::SeqCst)
    }

    pub fn finalize_calls(&self) -> usize {
        self.finalize_calls.load(Ordering::SeqCst)
    }
}

/// A scriptable stand-in for the opaque verification engine.
///
/// It accumulates chunk text and decides the finalize verdict from the
/// accumulated message: no `DKIM-Signature:` header means `No signature`, a
/// token-less `To:` continuation line means `Syntax error` (what a real
/// engine reports for input the normalizer should have repaired), a
/// tampered body means `Bad signature`, anything else passes.
pub struct MockEngine {
    received: Arc<Mutex<String>>,
    chunk_calls: Arc<AtomicUsize>,
    finalize_calls: Arc<AtomicUsize>,
    chunk_gate: Option<Arc<Semaphore>>,
    finalize_gate: Option<Arc<Semaphore>>,
    chunk_failure: Option<String>,
    fail_identity: bool,
    signature_seen: bool,
}

impl MockEngine {
    pub fn verifying() -> (Self, EngineProbe) {
        let probe = EngineProbe {
            received: Arc::new(Mutex::new(String::new())),
            chunk_calls: Arc::new(AtomicUsize::new(0)),
            finalize_calls: Arc::new(AtomicUsize::new(0)),
        };
        let engine = MockEngine {
            received: Arc::clone(&probe.received),
            chunk_calls: Arc::clone(&probe.chunk_calls),
            finalize_calls: Arc::clone(&probe.finalize_calls),
            chunk_gate: None,
            finalize_gate: None,
            chunk_failure: None,
            fail_identity: false,
            signature_seen: false,
        };
        (engine, probe)
    }

    /// Every `chunk` call waits for a permit before returning.
    pub fn with_chunk_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.chunk_gate = Some(gate);
        self
    }

    /// `finalize` waits for a permit before returning.
    pub fn with_finalize_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.finalize_gate = Some(gate);
        self
    }

    /// Every `chunk` call fails with the given engine message.
    pub fn failing_chunks(mut self, message: &str) -> Self {
        self.chunk_failure = Some(message.to_string());
        self
    }

    /// The identity accessor fails even when a signature was found.
    pub fn failing_identity(mut self) -> Self {
        self.fail_identity = true;
        self
    }
}

#[async_trait]
impl VerificationEngine for MockEngine {
    async fn chunk(&mut self, message: &str) -> Result<(), EngineError> {
        if let Some(gate) = &self.chunk_gate {
            gate.acquire().await.unwrap().forget();
        }
        self.chunk_calls.fetch_add(1, Ordering::SeqCst);
        if message.is_empty() {
            return Err(EngineError::new(
                "chunk(): length must be defined and non-zero",
            ));
        }
        if let Some(failure) = &self.chunk_failure {
            return Err(EngineError::new(failure.clone()));
        }
        self.received.lock().unwrap().push_str(message);
        Ok(())
    }

    async fn finalize(&mut self) -> Result<(), EngineError> {
        if let Some(gate) = &self.finalize_gate {
            gate.acquire().await.unwrap().forget();
        }
        self.finalize_calls.fetch_add(1, Ordering::SeqCst);
        let text = self.received.lock().unwrap().clone();
        if !text.contains("DKIM-Signature:") {
            return Err(EngineError::new("No signature"));
        }
        self.signature_seen = true;
        if text.contains("\nTo:\r\n") || text.contains("\nTo:\n") {
            return Err(EngineError::new("Syntax error"));
        }
        if text.contains("ALTERED") {
            return Err(EngineError::new("Bad signature"));
        }
        Ok(())
    }

    fn identity(&self) -> Result<String, EngineError> {
        if !self.signature_seen || self.fail_identity {
            return Err(EngineError::new("no signature data available"));
        }
        Ok("@example.com".to_string())
    }

    fn domain(&self) -> Result<String, EngineError> {
        if !self.signature_seen {
            return Err(EngineError::new("no signature data available"));
        }
        Ok("example.com".to_string())
    }

    fn selector(&self) -> Result<String, EngineError> {
        if !self.signature_seen {
            return Err(EngineError::new("no signature data available"));
        }
        Ok("test".to_string())
    }
}

/// Splits a message into byte chunks of at most `size`.
pub fn chunked(message: &str, size: usize) -> Vec<Vec<u8>> {
    message
        .as_bytes()
        .chunks(size)
        .map(<[u8]>::to_vec)
        .collect()
}

/// Installs a fmt subscriber honoring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

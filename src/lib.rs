//! Streaming DKIM message-verification adapter.
//!
//! This crate sits between a mail-processing pipeline and a stateful DKIM
//! verification engine. The pipeline feeds an email message as an ordered
//! sequence of byte chunks; the adapter serializes those chunks into the
//! engine (which maintains sequential canonicalization/hashing state),
//! finalizes exactly once, and classifies the raw engine verdict into the
//! five-way result taxonomy (`pass`/`none`/`tempfail`/`invalid`/`fail`)
//! that downstream policy depends on.
//!
//! The engine itself (signature parsing, key retrieval, canonicalization,
//! hashing) is an external collaborator consumed through the
//! [`VerificationEngine`] trait; this crate never implements it.

pub mod core;
pub mod pipeline;
pub mod verification;

pub use crate::core::config::Config;
pub use crate::core::error::{AppError, Result};
pub use crate::pipeline::{verify_message, ResultEntry, VerificationReport};
pub use crate::verification::engine::{EngineError, VerificationEngine};
pub use crate::verification::outcome::{DkimResult, VerificationOutcome};
pub use crate::verification::stream::MessageVerificationStream;

//! Streaming DKIM verification: the engine capability boundary, the chunk
//! normalizer, the per-message verification stream, and result
//! classification.

pub mod classify;
pub mod engine;
pub mod normalize;
pub mod outcome;
pub mod stream;

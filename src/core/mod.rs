//! Pure, side-effect-free building blocks shared by the orchestrator,
//! the document publisher, and the built-in workspace server.

pub mod segment;
pub mod trigger;

pub use segment::{MAX_BLOCK_CHARS, segment};
pub use trigger::{matched_keywords, should_publish};

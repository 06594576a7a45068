//! CLI command implementations

pub mod checklist;
pub mod compose;
pub mod export;
pub mod midi;
pub mod transcribe;
pub mod turn;
pub mod validate;

mod reporting;

//! The Response Synthesizer (spec.md §4.11, component C13): merges
//! multi-tool outputs into a structured [`qa_contracts::SynthesisResult`]
//! with caveats and alternatives. Pure and synchronous — no I/O, matching
//! the Confidence Aggregator's (`qa-confidence`) style.

mod categorize;
mod conflict;
mod priorities;
mod strategy;
mod synthesizer;

pub use priorities::priority_of;
pub use synthesizer::{fatal, synthesize};

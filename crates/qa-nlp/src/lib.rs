//! Question-understanding components: Intent Classifier (C3), Complexity
//! Analyzer (C4), and Context Extractor (C5). All three are pure functions
//! over `&str` — no I/O, no shared state across calls.

mod complexity;
mod context;
mod intent;

pub use complexity::analyze as analyze_complexity;
pub use context::extract as extract_context;
pub use intent::classify as classify_intent;

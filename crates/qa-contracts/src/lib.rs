//! Shared value types for the dynamic tool-chain execution core.
//!
//! Every component downstream (`qa-nlp`, `qa-planner`, `qa-resource`,
//! `qa-executor`, `qa-confidence`, `qa-synthesis`, `qa-orchestrator`) talks in
//! these types rather than passing opaque maps across boundaries.

mod chain;
mod complexity;
mod confidence;
mod context;
mod dag;
mod error;
mod execution;
mod intent;
mod plan;
mod resource;
mod synthesis;
mod tool;
pub mod well_known;

pub use chain::{ExecutionMode, ToolChain, ToolStep};
pub use complexity::{ComplexityLevel, ComplexityResult};
pub use confidence::{ConfidenceInput, ConfidenceMetrics, ConfidenceSource};
pub use context::{AggregationType, ComparisonType, Context};
pub use dag::{Dag, DependencyAnalysis};
pub use error::{CoreError, CoreErrorKind};
pub use execution::{ExecutionContext, ExecutedGroup, ToolOutcome};
pub use intent::{Intent, IntentResult};
pub use plan::{ExecutionPlan, OptimizerStrategy, PlannedStep};
pub use resource::{ResourceAllocation, ResourceRequest, ResourceType};
pub use synthesis::{
    ConflictPolicy, FragmentType, QualityMetrics, SynthesisFragment, SynthesisResult,
    SynthesisStrategy,
};
pub use tool::{ResourceTag, ToolContract, ToolId};

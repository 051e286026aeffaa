//! Wires every component of the dynamic tool-chain execution core (spec.md
//! §1) into one `Orchestrator::answer(question) -> AnswerOutcome` entry
//! point: Intent Classifier, Complexity Analyzer, Context Extractor
//! (`qa-nlp`); Tool-Chain Generator, Dependency Analyzer, DAG Builder /
//! Execution Planner, Execution Optimizer (`qa-planner`); Resource Manager
//! (`qa-resource`); Dynamic Executor (`qa-executor`); Confidence Aggregator
//! (`qa-confidence`); Response Synthesizer (`qa-synthesis`).

mod config;
mod error;
mod orchestrator;
mod structured_logging;

pub use config::{ConfidenceConfig, ExecutorConfig, OptimizerConfig, OrchestratorConfig, SynthesisConfig};
pub use error::OrchestratorError;
pub use orchestrator::{AnswerOutcome, ExecutionReport, Orchestrator};
pub use structured_logging::init_tracing;

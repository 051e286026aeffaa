//! Contract Analyzer (C2), Tool-Chain Generator (C6), Dependency Analyzer
//! (C7), DAG Builder / Execution Planner (C8), and Execution Optimizer (C9)
//! — everything between "intent + complexity + context" and a ready-to-run
//! [`qa_contracts::ExecutionPlan`].

mod adaptation;
mod contract_analyzer;
pub mod dag;
pub mod default_contracts;
pub mod dependency;
mod error;
mod generator;
mod optimizer;
mod planning;
mod registry;

pub use adaptation::compute as compute_adaptive_parameters;
pub use error::PlannerError;
pub use generator::generate;
pub use optimizer::{optimize, AdaptiveStrategySelector};
pub use planning::{plan, revise};
pub use registry::{InMemoryToolContractRegistry, ToolContractRegistry};

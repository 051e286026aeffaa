//! Dynamic Executor (spec.md §4.9, component C11): the ready-set
//! scheduling loop that turns a planned [`qa_contracts::ToolChain`] into a
//! [`RunOutcome`] by dispatching tool invocations through a [`ToolAdapter`].

mod adapter;
mod error;
mod executor;
mod gating;
mod outcome;

pub use adapter::ToolAdapter;
pub use error::ExecutorError;
pub use executor::DynamicExecutor;
pub use outcome::RunOutcome;

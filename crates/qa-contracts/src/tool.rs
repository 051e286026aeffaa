use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Opaque, globally-unique tool identifier, e.g. `"T23A_SPACY_NER"`.
pub type ToolId = String;

/// A resource declaration carried by a [`ToolContract`], used by the
/// dependency analyzer to decide parallel-safety without hardcoding tool
/// identifiers anywhere in its logic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceTag {
    /// Declares a read dependency on the named logical resource key.
    Reads(String),
    /// Declares a write dependency on the named logical resource key.
    Writes(String),
    /// Declares exclusive ownership of the named logical resource while
    /// running; no other tool may declare `Writes`/`Exclusive` on the same
    /// key concurrently.
    Exclusive(String),
}

/// Static, immutable metadata for one tool, loaded once at startup from the
/// [`ToolContractRegistry`](crate tool registry trait, defined in
/// `qa-planner`/`qa-orchestrator`) and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolContract {
    pub tool_id: ToolId,
    pub declared_inputs: BTreeSet<String>,
    pub declared_outputs: BTreeSet<String>,
    pub resource_tags: BTreeSet<ResourceTag>,
    /// Prior probability the tool's output should be trusted, in `[0, 1]`.
    pub reliability_prior: f64,
    pub base_duration_estimate: f64,
    pub base_memory_estimate: f64,
}

impl ToolContract {
    pub fn new(tool_id: impl Into<ToolId>) -> Self {
        Self {
            tool_id: tool_id.into(),
            declared_inputs: BTreeSet::new(),
            declared_outputs: BTreeSet::new(),
            resource_tags: BTreeSet::new(),
            reliability_prior: 0.8,
            base_duration_estimate: 1.0,
            base_memory_estimate: 64.0,
        }
    }

    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.declared_inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_outputs(mut self, outputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.declared_outputs = outputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_resource_tags(mut self, tags: impl IntoIterator<Item = ResourceTag>) -> Self {
        self.resource_tags = tags.into_iter().collect();
        self
    }

    pub fn with_reliability(mut self, prior: f64) -> Self {
        self.reliability_prior = prior.clamp(0.0, 1.0);
        self
    }

    pub fn with_estimates(mut self, duration: f64, memory: f64) -> Self {
        self.base_duration_estimate = duration;
        self.base_memory_estimate = memory;
        self
    }

    /// True if this contract declares an exclusive or write tag on `key`.
    pub fn writes(&self, key: &str) -> bool {
        self.resource_tags.iter().any(|t| match t {
            ResourceTag::Writes(k) | ResourceTag::Exclusive(k) => k == key,
            ResourceTag::Reads(_) => false,
        })
    }

    /// True if this contract declares a read tag on `key`.
    pub fn reads(&self, key: &str) -> bool {
        self.resource_tags.iter().any(|t| match t {
            ResourceTag::Reads(k) => k == key,
            ResourceTag::Writes(_) | ResourceTag::Exclusive(_) => false,
        })
    }

    /// True if this contract declares exclusive ownership of `key`.
    pub fn exclusive(&self, key: &str) -> bool {
        self.resource_tags
            .iter()
            .any(|t| matches!(t, ResourceTag::Exclusive(k) if k == key))
    }
}

use std::collections::BTreeMap;

use qa_contracts::{ToolContract, ToolId};

/// Read-only tool-contract source (spec.md §6). Contracts are loaded once
/// at startup; the registry itself never changes over the lifetime of a
/// process — mutating it requires a restart.
pub trait ToolContractRegistry: Send + Sync {
    fn get(&self, tool_id: &str) -> Option<ToolContract>;
    fn all(&self) -> Vec<ToolContract>;
}

/// Simple in-memory registry backing tests and a from-scratch process that
/// has no external contract store. Production deployments implement
/// [`ToolContractRegistry`] over whatever catalog their adapter exposes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryToolContractRegistry {
    contracts: BTreeMap<ToolId, ToolContract>,
}

impl InMemoryToolContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, contract: ToolContract) -> &mut Self {
        self.contracts.insert(contract.tool_id.clone(), contract);
        self
    }

    pub fn with(mut self, contract: ToolContract) -> Self {
        self.insert(contract);
        self
    }
}

impl ToolContractRegistry for InMemoryToolContractRegistry {
    fn get(&self, tool_id: &str) -> Option<ToolContract> {
        self.contracts.get(tool_id).cloned()
    }

    fn all(&self) -> Vec<ToolContract> {
        self.contracts.values().cloned().collect()
    }
}

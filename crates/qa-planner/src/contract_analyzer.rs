//! The Contract Analyzer (spec.md C2): derives tool-to-tool dependency
//! legality directly from `ToolContract` declarations, with no hardcoded
//! tool-pair table anywhere in this module or [`crate::dependency`].
//!
//! Two checks live here rather than in the generator or the dependency
//! analyzer because they are global properties of a *registry*, not of any
//! one chain: every declared input key must be produced by at least one
//! contract in the catalog (otherwise no chain that needs it could ever be
//! satisfied), and no two contracts may declare conflicting resource tags
//! on the same key in a way that makes the key unusable by anyone (e.g.
//! two different tools both claiming `Exclusive` ownership of the same
//! key).

use std::collections::{BTreeSet, HashMap};

use qa_contracts::ResourceTag;

use crate::error::PlannerError;
use crate::registry::ToolContractRegistry;

/// Validates global consistency of the contract catalog (spec.md §7
/// `ContractConflict`). Called once by [`crate::generate`] before a chain
/// is built from the registry's contracts; a conflict here is a fatal,
/// registry-level defect rather than a per-question failure.
pub fn validate(registry: &dyn ToolContractRegistry) -> Result<(), PlannerError> {
    let contracts = registry.all();

    let mut produced: BTreeSet<&str> = BTreeSet::new();
    for contract in &contracts {
        produced.extend(contract.declared_outputs.iter().map(String::as_str));
    }

    for contract in &contracts {
        for input in &contract.declared_inputs {
            if !produced.contains(input.as_str()) {
                return Err(PlannerError::ContractConflict(format!(
                    "tool {} declares input '{}' with no producer in the catalog",
                    contract.tool_id, input
                )));
            }
        }
    }

    let mut exclusive_owners: HashMap<&str, &str> = HashMap::new();
    for contract in &contracts {
        for tag in &contract.resource_tags {
            if let ResourceTag::Exclusive(key) = tag {
                if let Some(existing) = exclusive_owners.insert(key.as_str(), &contract.tool_id) {
                    if existing != contract.tool_id {
                        return Err(PlannerError::ContractConflict(format!(
                            "resource key '{}' is claimed exclusive by both {} and {}",
                            key, existing, contract.tool_id
                        )));
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_contracts::ToolContract;

    #[test]
    fn default_catalog_is_internally_consistent() {
        let registry = crate::default_contracts::build();
        assert!(validate(&registry).is_ok());
    }

    #[test]
    fn unproduced_input_is_a_contract_conflict() {
        let mut registry = crate::registry::InMemoryToolContractRegistry::new();
        registry.insert(ToolContract::new("T99_ORPHAN").with_inputs(["nonexistent_key"]));
        let err = validate(&registry).unwrap_err();
        assert!(matches!(err, PlannerError::ContractConflict(_)));
    }

    #[test]
    fn conflicting_exclusive_claims_are_a_contract_conflict() {
        let mut registry = crate::registry::InMemoryToolContractRegistry::new();
        registry.insert(
            ToolContract::new("T01").with_resource_tags([ResourceTag::Exclusive("lock".to_string())]),
        );
        registry.insert(
            ToolContract::new("T02").with_resource_tags([ResourceTag::Exclusive("lock".to_string())]),
        );
        let err = validate(&registry).unwrap_err();
        assert!(matches!(err, PlannerError::ContractConflict(_)));
    }
}

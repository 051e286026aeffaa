use serde::{Deserialize, Serialize};

use qa_contracts::ConfidenceInput;

use crate::reliability::ToolReliabilityTable;
use crate::stats;

/// Uncertainty decomposed into its contributing sources (spec.md §4.10
/// "reported separately across {aleatoric, epistemic, measurement,
/// systematic, temporal, total, reducible, irreducible}").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UncertaintyBreakdown {
    /// Spread of the confidence scores themselves — inherent disagreement
    /// in what was measured, not how it was measured.
    pub aleatoric: f64,
    /// Mean of the inputs' self-reported uncertainty.
    pub epistemic: f64,
    /// Coefficient of variation of execution time across inputs, as a
    /// proxy for how stable the measurement process was.
    pub measurement: f64,
    /// `1 - mean(tool reliability)`: bias contributed by tools with a
    /// known track record of being wrong.
    pub systematic: f64,
    /// Time-based uncertainty; no temporal-drift model is implemented yet,
    /// so this is always `0.0`.
    pub temporal: f64,
    pub total: f64,
    pub reducible: f64,
    pub irreducible: f64,
}

/// Quantifies uncertainty across `inputs` given the aggregator's current
/// `reliability` table.
pub fn quantify(inputs: &[ConfidenceInput], reliability: &ToolReliabilityTable) -> UncertaintyBreakdown {
    let confidences: Vec<f64> = inputs.iter().map(|i| i.confidence).collect();
    let aleatoric = stats::stdev(&confidences);

    let uncertainties: Vec<f64> = inputs.iter().map(|i| i.uncertainty).collect();
    let epistemic = stats::mean(&uncertainties);

    let exec_times: Vec<f64> = inputs.iter().map(|i| i.execution_time).filter(|t| *t > 0.0).collect();
    let measurement = if exec_times.len() > 1 {
        let avg = stats::mean(&exec_times);
        if avg > 0.0 {
            (stats::stdev(&exec_times) / avg).min(1.0)
        } else {
            0.0
        }
    } else {
        0.0
    };

    let reliabilities: Vec<f64> = inputs
        .iter()
        .map(|i| reliability.reliability_of(&i.source_id))
        .collect();
    let systematic = if reliabilities.is_empty() {
        0.0
    } else {
        1.0 - stats::mean(&reliabilities)
    };

    let temporal = 0.0;

    let total = (aleatoric.powi(2)
        + epistemic.powi(2)
        + measurement.powi(2)
        + systematic.powi(2)
        + temporal.powi(2))
    .sqrt()
    .min(1.0);

    let reducible = total.min(epistemic + measurement);
    let irreducible = total - reducible;

    UncertaintyBreakdown {
        aleatoric,
        epistemic,
        measurement,
        systematic,
        temporal,
        total,
        reducible,
        irreducible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_contracts::ConfidenceSource;

    #[test]
    fn agreeing_certain_inputs_have_low_total_uncertainty() {
        let reliability = ToolReliabilityTable::new();
        let inputs = vec![
            ConfidenceInput::new("a", ConfidenceSource::ToolOutput, 0.9),
            ConfidenceInput::new("b", ConfidenceSource::ToolOutput, 0.91),
        ];
        let breakdown = quantify(&inputs, &reliability);
        assert!(breakdown.total < 0.3);
    }

    #[test]
    fn total_never_exceeds_one() {
        let reliability = ToolReliabilityTable::new();
        let mut a = ConfidenceInput::new("a", ConfidenceSource::ToolOutput, 0.1);
        a.uncertainty = 1.0;
        let mut b = ConfidenceInput::new("b", ConfidenceSource::ToolOutput, 0.9);
        b.uncertainty = 1.0;
        let breakdown = quantify(&[a, b], &reliability);
        assert!(breakdown.total <= 1.0);
    }

    #[test]
    fn reducible_plus_irreducible_equals_total() {
        let reliability = ToolReliabilityTable::new();
        let inputs = vec![
            ConfidenceInput::new("a", ConfidenceSource::ToolOutput, 0.4),
            ConfidenceInput::new("b", ConfidenceSource::ToolOutput, 0.95),
        ];
        let breakdown = quantify(&inputs, &reliability);
        assert!((breakdown.reducible + breakdown.irreducible - breakdown.total).abs() < 1e-9);
    }
}

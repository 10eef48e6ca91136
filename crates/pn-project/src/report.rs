//! Run reports.

use std::fmt;

use pn_core::{Real, finite_mean};
use serde::{Deserialize, Serialize};

use crate::schema::AlgorithmKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlgorithmReport {
    pub name: String,
    pub kind: AlgorithmKind,
    pub phase: String,
    pub quantity: String,
    pub min: Real,
    pub max: Real,
    pub mean: Real,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_property: Option<Real>,
    pub values: Vec<Real>,
}

impl AlgorithmReport {
    pub fn new(
        name: &str,
        kind: AlgorithmKind,
        phase: &str,
        quantity: &str,
        values: Vec<Real>,
        effective_property: Option<Real>,
    ) -> Self {
        let finite = values.iter().copied().filter(|v| v.is_finite());
        let min = finite.clone().fold(Real::INFINITY, Real::min);
        let max = finite.fold(Real::NEG_INFINITY, Real::max);
        Self {
            name: name.to_string(),
            kind,
            phase: phase.to_string(),
            quantity: quantity.to_string(),
            min,
            max,
            mean: finite_mean(&values).unwrap_or(Real::NAN),
            effective_property,
            values,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaseReport {
    pub case: String,
    pub algorithms: Vec<AlgorithmReport>,
}

impl CaseReport {
    pub fn new(case: &str) -> Self {
        Self {
            case: case.to_string(),
            algorithms: Vec::new(),
        }
    }

    pub fn algorithm(&self, name: &str) -> Option<&AlgorithmReport> {
        self.algorithms.iter().find(|a| a.name == name)
    }
}

/// Human-readable summary, one line per algorithm.
impl fmt::Display for CaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Case: {}", self.case)?;
        for a in &self.algorithms {
            write!(
                f,
                "  {} ({}, phase {}): {} in [{:.6e}, {:.6e}], mean {:.6e}",
                a.name, a.kind, a.phase, a.quantity, a.min, a.max, a.mean
            )?;
            if let Some(eff) = a.effective_property {
                write!(f, ", effective {eff:.6e}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

//! Interleaving of partial provider arrays into full-length arrays.

use pn_core::{PnError, PropKey, Real};

use crate::error::{PhaseError, PhaseResult};
use crate::provider::Provider;

/// What to put at indices no provider covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum GapPolicy {
    /// Leave gaps at zero.
    #[default]
    Zero,
    /// Mark gaps as NaN so downstream arithmetic exposes them.
    Nan,
    /// Refuse to produce a partially covered array.
    Error,
}

/// A full-length array assembled from providers.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub values: Vec<Real>,
    /// Number of indices no provider covered.
    pub gaps: usize,
    /// `gaps / values.len()`, zero for an empty domain.
    pub gap_fraction: Real,
}

/// Scatter `key` from each provider into an array of length `count`.
///
/// Providers are visited in order; overlapping ownership resolves to the
/// last provider. Every provider must carry `key`, and `object` names the
/// composite in the error when none are registered. Nothing is cached.
pub fn interleave(
    providers: &[&dyn Provider],
    key: &PropKey,
    count: usize,
    policy: GapPolicy,
    object: &str,
) -> PhaseResult<Resolved> {
    if providers.is_empty() {
        return Err(PhaseError::MissingProperty {
            key: key.to_string(),
            object: object.to_string(),
        });
    }

    let mut values = vec![0.0; count];
    let mut covered = vec![false; count];

    for provider in providers {
        let src = provider
            .store()
            .get_key(key)
            .ok_or_else(|| PhaseError::MissingProperty {
                key: key.to_string(),
                object: provider.name().to_string(),
            })?;
        let locations = provider.locations(key.domain());
        if src.len() != locations.len() {
            return Err(PnError::LengthMismatch {
                what: format!("{} on {}", key, provider.name()),
                expected: locations.len(),
                actual: src.len(),
            }
            .into());
        }

        for (&index, &value) in locations.iter().zip(src) {
            if index >= count {
                return Err(PnError::IndexOob {
                    what: "provider location",
                    index,
                    len: count,
                }
                .into());
            }
            values[index] = value;
            covered[index] = true;
        }
    }

    let gaps = covered.iter().filter(|&&c| !c).count();
    let gap_fraction = if count == 0 {
        0.0
    } else {
        gaps as Real / count as Real
    };

    if gaps > 0 {
        match policy {
            GapPolicy::Zero => {}
            GapPolicy::Nan => {
                for (v, _) in values.iter_mut().zip(&covered).filter(|(_, c)| !**c) {
                    *v = Real::NAN;
                }
            }
            GapPolicy::Error => {
                return Err(PhaseError::IncompleteCoverage {
                    key: key.to_string(),
                    gaps,
                    fraction: gap_fraction,
                });
            }
        }
    }

    Ok(Resolved {
        values,
        gaps,
        gap_fraction,
    })
}

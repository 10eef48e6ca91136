//! Case file validation.
//!
//! Everything that can be checked without assembling a system is checked
//! here, so a case that validates fails at run time only for physical
//! reasons (singular systems, missing properties on providers).

use std::collections::{BTreeMap, HashSet};

use pn_algorithms::BcKind;
use pn_core::{Domain, PropKey};

use crate::schema::{AlgorithmDef, AlgorithmKind, CaseFile, NetworkDef, PhaseDef, Selection, ValueDef};

/// Newest case file version this crate understands.
pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate name: {name} in {context}")]
    DuplicateName { name: String, context: String },

    #[error("Missing reference: {name} in {context}")]
    MissingReference { name: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

pub fn validate_case(case: &CaseFile) -> Result<(), ValidationError> {
    if case.version == 0 || case.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: case.version,
        });
    }

    validate_network(&case.network)?;

    let mut phase_names = HashSet::new();
    for phase in &case.phases {
        if !phase_names.insert(&phase.name) {
            return Err(ValidationError::DuplicateName {
                name: phase.name.clone(),
                context: "phases".to_string(),
            });
        }
        validate_phase(phase, &case.network)?;
    }

    let mut algorithm_names = HashSet::new();
    for algorithm in &case.algorithms {
        if !algorithm_names.insert(&algorithm.name) {
            return Err(ValidationError::DuplicateName {
                name: algorithm.name.clone(),
                context: "algorithms".to_string(),
            });
        }
        if !phase_names.contains(&algorithm.phase) {
            return Err(ValidationError::MissingReference {
                name: algorithm.phase.clone(),
                context: format!("algorithm '{}' phase", algorithm.name),
            });
        }
        validate_algorithm(algorithm, &case.network)?;
    }

    Ok(())
}

fn validate_network(network: &NetworkDef) -> Result<(), ValidationError> {
    if network.pores == 0 {
        return Err(invalid("network.pores", 0, "a network needs at least one pore"));
    }
    for (t, &[i, j]) in network.throats.iter().enumerate() {
        if i >= network.pores || j >= network.pores {
            return Err(invalid(
                format!("network.throats[{t}]"),
                format!("[{i}, {j}]"),
                format!("pore index out of range (network has {} pores)", network.pores),
            ));
        }
        if i == j {
            return Err(invalid(
                format!("network.throats[{t}]"),
                format!("[{i}, {j}]"),
                "a throat cannot connect a pore to itself",
            ));
        }
    }

    let num_throats = network.throats.len();
    for (name, indices) in &network.pore_labels {
        check_indices(indices, network.pores, &format!("network.pore_labels.{name}"))?;
    }
    for (name, indices) in &network.throat_labels {
        check_indices(indices, num_throats, &format!("network.throat_labels.{name}"))?;
    }

    for (key, value) in &network.properties {
        let field = format!("network.properties.{key}");
        let domain = key_domain(key, &field)?;
        check_value(value, count(network, domain), &field)?;
    }
    Ok(())
}

fn validate_phase(phase: &PhaseDef, network: &NetworkDef) -> Result<(), ValidationError> {
    for (key, value) in &phase.properties {
        let field = format!("phase '{}' property {key}", phase.name);
        let domain = key_domain(key, &field)?;
        check_value(value, count(network, domain), &field)?;
    }

    let mut physics_names = HashSet::new();
    for physics in &phase.physics {
        if !physics_names.insert(&physics.name) {
            return Err(ValidationError::DuplicateName {
                name: physics.name.clone(),
                context: format!("phase '{}' physics", phase.name),
            });
        }
        let context = format!("physics '{}'", physics.name);
        let pores = selection_len(&physics.pores, network, Domain::Pore, &context)?;
        let throats = selection_len(&physics.throats, network, Domain::Throat, &context)?;

        for (key, value) in &physics.properties {
            let field = format!("{context} property {key}");
            if phase.properties.contains_key(key) {
                return Err(invalid(
                    field,
                    key,
                    "already set on the phase; a key belongs to one owner",
                ));
            }
            let expected = match key_domain(key, &field)? {
                Domain::Pore => pores,
                Domain::Throat => throats,
            };
            check_value(value, expected, &field)?;
        }
    }
    Ok(())
}

fn validate_algorithm(algorithm: &AlgorithmDef, network: &NetworkDef) -> Result<(), ValidationError> {
    let context = format!("algorithm '{}'", algorithm.name);
    let advective = algorithm.kind == AlgorithmKind::AdvectionDiffusion;

    for (field, key, domain) in [
        ("quantity", &algorithm.quantity, Domain::Pore),
        ("conductance", &algorithm.conductance, Domain::Throat),
        ("hydraulic_conductance", &algorithm.hydraulic_conductance, Domain::Throat),
        ("pressure", &algorithm.pressure, Domain::Pore),
    ] {
        let Some(key) = key else { continue };
        let field = format!("{context} {field}");
        if key_domain(key, &field)? != domain {
            return Err(invalid(field, key, format!("expected a {} key", domain.prefix())));
        }
    }

    if !advective
        && (algorithm.scheme.is_some()
            || algorithm.hydraulic_conductance.is_some()
            || algorithm.pressure.is_some())
    {
        return Err(ValidationError::Unsupported {
            feature: format!("{context} advection settings"),
            reason: format!("{} has no advective term", algorithm.kind),
        });
    }

    for (n, bc) in algorithm.bcs.iter().enumerate() {
        let field = format!("{context} bcs[{n}]");
        let selected = selection_len(&bc.pores, network, Domain::Pore, &field)?;
        match (bc.kind, &bc.value) {
            (BcKind::Outflow, _) if !advective => {
                return Err(ValidationError::Unsupported {
                    feature: format!("{field} outflow"),
                    reason: format!("{} has no advective flow to carry mass out", algorithm.kind),
                });
            }
            (BcKind::Outflow, _) => {}
            (kind, None) => {
                return Err(invalid(field, kind, "value and rate conditions need a value"));
            }
            (_, Some(value)) => check_value(value, selected, &field)?,
        }
    }

    if let Some(effective) = &algorithm.effective_property {
        if let Some(inlet) = &effective.inlet {
            selection_len(inlet, network, Domain::Pore, &format!("{context} effective inlet"))?;
        }
        for (field, value) in [
            ("domain_length", effective.domain_length),
            ("domain_area", effective.domain_area),
        ] {
            if let Some(v) = value {
                if !(v.is_finite() && v > 0.0) {
                    return Err(invalid(format!("{context} {field}"), v, "must be positive"));
                }
            }
        }
    }
    Ok(())
}

fn count(network: &NetworkDef, domain: Domain) -> usize {
    match domain {
        Domain::Pore => network.pores,
        Domain::Throat => network.throats.len(),
    }
}

fn key_domain(key: &str, field: &str) -> Result<Domain, ValidationError> {
    PropKey::parse(key)
        .map(|k| k.domain())
        .map_err(|e| invalid(field, key, e.to_string()))
}

fn check_indices(indices: &[usize], len: usize, field: &str) -> Result<(), ValidationError> {
    if let Some(&i) = indices.iter().find(|&&i| i >= len) {
        return Err(invalid(field, i, format!("index out of range (length {len})")));
    }
    Ok(())
}

fn check_value(value: &ValueDef, expected: usize, field: &str) -> Result<(), ValidationError> {
    match value {
        ValueDef::Scalar(v) if v.is_nan() => Err(invalid(field, v, "must be a number")),
        ValueDef::Scalar(_) => Ok(()),
        ValueDef::Array(values) if values.len() != expected => Err(invalid(
            field,
            format!("{} values", values.len()),
            format!("expected {expected}"),
        )),
        ValueDef::Array(_) => Ok(()),
    }
}

/// Number of elements a selection resolves to.
fn selection_len(
    selection: &Selection,
    network: &NetworkDef,
    domain: Domain,
    context: &str,
) -> Result<usize, ValidationError> {
    let len = count(network, domain);
    match selection {
        Selection::Indices(indices) => {
            check_indices(indices, len, context)?;
            let unique: HashSet<_> = indices.iter().collect();
            if unique.len() != indices.len() {
                return Err(invalid(context, format!("{indices:?}"), "indices repeat"));
            }
            Ok(indices.len())
        }
        Selection::Label(label) => {
            let labels = match domain {
                Domain::Pore => &network.pore_labels,
                Domain::Throat => &network.throat_labels,
            };
            label_len(labels, label, domain, len).ok_or_else(|| ValidationError::MissingReference {
                name: label.clone(),
                context: format!("{context} {} label", domain.prefix()),
            })
        }
    }
}

fn label_len(
    labels: &BTreeMap<String, Vec<usize>>,
    label: &str,
    domain: Domain,
    len: usize,
) -> Option<usize> {
    let bare = label
        .strip_prefix(domain.prefix())
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(label);
    if bare == "all" {
        return Some(len);
    }
    labels
        .get(bare)
        .or_else(|| labels.get(label))
        .map(|indices| indices.iter().collect::<HashSet<_>>().len())
}

//! Case file schema definitions.

use std::collections::BTreeMap;

use pn_algorithms::{BcKind, ConflictPolicy, Scheme, SolverKind};
use pn_model::GapPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseFile {
    pub version: u32,
    pub name: String,
    pub network: NetworkDef,
    #[serde(default)]
    pub phases: Vec<PhaseDef>,
    #[serde(default)]
    pub algorithms: Vec<AlgorithmDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkDef {
    pub pores: usize,
    #[serde(default)]
    pub throats: Vec<[usize; 2]>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pore_labels: BTreeMap<String, Vec<usize>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub throat_labels: BTreeMap<String, Vec<usize>>,
    /// Network-level arrays such as `pore.coords_x`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, ValueDef>,
}

/// A scalar broadcast over its target, or one value per element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ValueDef {
    Scalar(f64),
    Array(Vec<f64>),
}

/// Pores or throats: `all`, a label name, or explicit indices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Selection {
    Indices(Vec<usize>),
    Label(String),
}

impl Default for Selection {
    fn default() -> Self {
        Self::Label("all".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseDef {
    pub name: String,
    /// Arrays stored on the phase itself (full length or scalar).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, ValueDef>,
    #[serde(default)]
    pub physics: Vec<PhysicsDef>,
    #[serde(default)]
    pub gap_policy: GapPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhysicsDef {
    pub name: String,
    #[serde(default)]
    pub pores: Selection,
    #[serde(default)]
    pub throats: Selection,
    /// Scalars or arrays matching the selected subset.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, ValueDef>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmKind {
    FickianDiffusion,
    StokesFlow,
    #[serde(alias = "dispersion")]
    AdvectionDiffusion,
}

impl std::fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::FickianDiffusion => "fickian_diffusion",
            Self::StokesFlow => "stokes_flow",
            Self::AdvectionDiffusion => "advection_diffusion",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlgorithmDef {
    pub name: String,
    pub kind: AlgorithmKind,
    pub phase: String,
    /// Overrides of the kind's default keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conductance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hydraulic_conductance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,
    #[serde(default)]
    pub solver: SolverKind,
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
    #[serde(default)]
    pub bcs: Vec<BcDef>,
    /// Merge the solved quantity into the phase for later algorithms.
    #[serde(default)]
    pub update_phase: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_property: Option<EffectiveDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BcDef {
    pub kind: BcKind,
    pub pores: Selection,
    /// Required for `value` and `rate`, ignored for `outflow`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ValueDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EffectiveDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inlet: Option<Selection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_area: Option<f64>,
}

//! Turning a validated case into objects and running its algorithms.

use pn_algorithms::{
    AdvectionDiffusion, AdvectionSettings, BcKind, EffectiveOptions, FickianDiffusion,
    ResultsFilter, StokesFlow, TransportAlgorithm, TransportSettings,
};
use pn_core::{Domain, PropKey, PropertyStore, Real};
use pn_model::{Phase, Physics};
use pn_network::{Network, NetworkBuilder};
use tracing::{debug, info};

use crate::report::{AlgorithmReport, CaseReport};
use crate::schema::{AlgorithmDef, AlgorithmKind, CaseFile, NetworkDef, PhaseDef, Selection, ValueDef};
use crate::validate::validate_case;
use crate::{ProjectError, ProjectResult};

pub fn build_network(def: &NetworkDef) -> ProjectResult<Network> {
    let mut builder = NetworkBuilder::new();
    builder.add_pores(def.pores);
    for &[i, j] in &def.throats {
        builder.add_throat(i, j);
    }
    for (label, pores) in &def.pore_labels {
        builder.set_pore_label(label, pores);
    }
    for (label, throats) in &def.throat_labels {
        builder.set_throat_label(label, throats);
    }
    for (key, value) in &def.properties {
        let domain = PropKey::parse(key)?.domain();
        let len = match domain {
            Domain::Pore => def.pores,
            Domain::Throat => def.throats.len(),
        };
        builder.set_property(key.clone(), expand(value, len));
    }
    Ok(builder.build()?)
}

/// Build a phase with its physics on `network`.
pub fn build_phase<'a>(def: &PhaseDef, network: &'a Network) -> ProjectResult<Phase<'a>> {
    let mut phase = Phase::new(&def.name, network).with_gap_policy(def.gap_policy);
    for (key, value) in &def.properties {
        match value {
            ValueDef::Scalar(v) => phase.fill(key, *v)?,
            ValueDef::Array(values) => phase.set(key, values.clone())?,
        }
    }

    for physics_def in &def.physics {
        let pores = select(&physics_def.pores, network, Domain::Pore)?;
        let throats = select(&physics_def.throats, network, Domain::Throat)?;
        let mut physics = Physics::new(&physics_def.name, network, pores, throats)?;
        for (key, value) in &physics_def.properties {
            match value {
                ValueDef::Scalar(v) => physics.fill(key, *v)?,
                ValueDef::Array(values) => physics.set(key, values.clone())?,
            }
        }
        phase.add_physics(physics)?;
    }
    debug!(
        phase = %def.name,
        physics = def.physics.len(),
        "phase built"
    );
    Ok(phase)
}

/// Indices a selection resolves to on a built network.
pub fn select(selection: &Selection, network: &Network, domain: Domain) -> ProjectResult<Vec<usize>> {
    Ok(match selection {
        Selection::Indices(indices) => indices.clone(),
        Selection::Label(label) => match domain {
            Domain::Pore => network.pores(label)?,
            Domain::Throat => network.throats(label)?,
        },
    })
}

fn expand(value: &ValueDef, len: usize) -> Vec<Real> {
    match value {
        ValueDef::Scalar(v) => vec![*v; len],
        ValueDef::Array(values) => values.clone(),
    }
}

fn settings_for(def: &AlgorithmDef) -> TransportSettings {
    let mut settings = match def.kind {
        AlgorithmKind::FickianDiffusion => TransportSettings::fickian_diffusion(),
        AlgorithmKind::StokesFlow => TransportSettings::stokes_flow(),
        AlgorithmKind::AdvectionDiffusion => TransportSettings::advection_diffusion(),
    };
    if let Some(quantity) = &def.quantity {
        settings.quantity = quantity.clone();
    }
    if let Some(conductance) = &def.conductance {
        settings.conductance = conductance.clone();
    }
    settings
        .with_solver(def.solver)
        .with_conflict_policy(def.conflict_policy)
}

fn make_algorithm<'a>(def: &AlgorithmDef, network: &'a Network) -> Box<dyn TransportAlgorithm<'a> + 'a> {
    match def.kind {
        AlgorithmKind::FickianDiffusion => Box::new(FickianDiffusion::new(&def.name, network)),
        AlgorithmKind::StokesFlow => Box::new(StokesFlow::new(&def.name, network)),
        AlgorithmKind::AdvectionDiffusion => {
            let mut advection = AdvectionSettings::default();
            if let Some(key) = &def.hydraulic_conductance {
                advection.hydraulic_conductance = key.clone();
            }
            if let Some(key) = &def.pressure {
                advection.pressure = key.clone();
            }
            if let Some(scheme) = def.scheme {
                advection.scheme = scheme;
            }
            let mut ad = AdvectionDiffusion::new(&def.name, network);
            ad.set_advection(advection);
            Box::new(ad)
        }
    }
}

/// Set up one algorithm against `phase`, apply its conditions and run it.
fn run_algorithm<'a>(
    def: &AlgorithmDef,
    network: &'a Network,
    phase: &'a Phase<'a>,
) -> ProjectResult<(AlgorithmReport, PropertyStore)> {
    let mut algorithm = make_algorithm(def, network);
    let settings = settings_for(def);
    let quantity = settings.quantity.clone();
    algorithm.base_mut().setup(phase, settings)?;

    for bc in &def.bcs {
        let pores = select(&bc.pores, network, Domain::Pore)?;
        let values = || -> ProjectResult<Vec<Real>> {
            let value = bc.value.as_ref().ok_or_else(|| ProjectError::Build {
                what: format!("algorithm '{}': {} condition without a value", def.name, bc.kind),
            })?;
            Ok(expand(value, pores.len()))
        };
        let base = algorithm.base_mut();
        match bc.kind {
            BcKind::Value => base.set_value_bc(&pores, values()?)?,
            BcKind::Rate => base.set_rate_bc(&pores, values()?)?,
            BcKind::Outflow => base.set_outflow_bc(&pores)?,
        }
    }

    algorithm.run()?;
    let results = algorithm.base().results(&ResultsFilter::All)?;

    let effective_property = match &def.effective_property {
        Some(effective) => {
            let inlet = match &effective.inlet {
                Some(selection) => Some(select(selection, network, Domain::Pore)?),
                None => None,
            };
            let options = EffectiveOptions {
                inlet,
                domain_length: effective.domain_length,
                domain_area: effective.domain_area,
            };
            Some(algorithm.effective_property(&options)?)
        }
        None => None,
    };

    let values = results
        .get(&quantity)
        .map(<[Real]>::to_vec)
        .unwrap_or_default();
    let report = AlgorithmReport::new(&def.name, def.kind, &def.phase, &quantity, values, effective_property);
    info!(
        algorithm = %def.name,
        kind = %def.kind,
        min = report.min,
        max = report.max,
        "algorithm solved"
    );
    Ok((report, results))
}

/// Validate, build and run every algorithm of a case in file order.
///
/// Algorithms marked `update_phase` merge their quantity into their
/// phase, so later algorithms (an advection-diffusion after a Stokes flow,
/// typically) see it through the phase.
pub fn run_case(case: &CaseFile) -> ProjectResult<CaseReport> {
    validate_case(case)?;
    let network = build_network(&case.network)?;
    info!(
        case = %case.name,
        pores = network.num_pores(),
        throats = network.num_throats(),
        "network built"
    );

    let mut phases = case
        .phases
        .iter()
        .map(|def| build_phase(def, &network))
        .collect::<ProjectResult<Vec<_>>>()?;

    let mut report = CaseReport::new(&case.name);
    for def in &case.algorithms {
        let index = case
            .phases
            .iter()
            .position(|p| p.name == def.phase)
            .ok_or_else(|| ProjectError::Build {
                what: format!("algorithm '{}' references unknown phase '{}'", def.name, def.phase),
            })?;

        let (algorithm_report, results) = run_algorithm(def, &network, &phases[index])?;
        if def.update_phase {
            phases[index].update(&results)?;
            debug!(algorithm = %def.name, phase = %def.phase, "results merged into phase");
        }
        report.algorithms.push(algorithm_report);
    }
    Ok(report)
}

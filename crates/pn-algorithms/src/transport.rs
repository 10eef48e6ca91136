//! The generic linear transport algorithm.
//!
//! A transport algorithm solves `A x = b` for one pore quantity, where `A`
//! is assembled from throat conductances pulled through the phase's
//! resolver and `b` carries the boundary conditions. Concrete algorithms
//! differ in their default keys, in how throat weights are formed and in
//! how the effective property is scaled.

use pn_core::{Domain, PropKey, PropertyStore, Real};
use pn_model::Phase;
use pn_network::Network;

use crate::assembly::{DirectedWeights, LinearSystem};
use crate::bc::{BcKind, BcTable, BcValues, BoundaryCondition, ConflictPolicy};
use crate::error::{TransportError, TransportResult};
use crate::solve::{SolverKind, solve};

/// Keys an algorithm may never use for its quantity or conductance.
pub const RESERVED_KEYS: [&str; 6] = [
    "pore.all",
    "throat.all",
    "throat.conns",
    "pore.bc_value",
    "pore.bc_rate",
    "pore.bc_outflow",
];

/// Keys and solver options bound at `setup`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportSettings {
    /// Pore property the algorithm solves for.
    pub quantity: String,
    /// Throat property used as the coupling weight.
    pub conductance: String,
    pub solver: SolverKind,
    pub conflict_policy: ConflictPolicy,
}

impl TransportSettings {
    pub fn new(quantity: impl Into<String>, conductance: impl Into<String>) -> Self {
        Self {
            quantity: quantity.into(),
            conductance: conductance.into(),
            solver: SolverKind::default(),
            conflict_policy: ConflictPolicy::default(),
        }
    }

    pub fn fickian_diffusion() -> Self {
        Self::new("pore.mole_fraction", "throat.diffusive_conductance")
    }

    pub fn stokes_flow() -> Self {
        Self::new("pore.pressure", "throat.hydraulic_conductance")
    }

    pub fn advection_diffusion() -> Self {
        Self::new("pore.concentration", "throat.diffusive_conductance")
    }

    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    fn parse_keys(&self) -> TransportResult<(PropKey, PropKey)> {
        let quantity = checked_key(&self.quantity, Domain::Pore, "quantity")?;
        let conductance = checked_key(&self.conductance, Domain::Throat, "conductance")?;
        Ok((quantity, conductance))
    }
}

pub(crate) fn checked_key(key: &str, domain: Domain, role: &str) -> TransportResult<PropKey> {
    if RESERVED_KEYS.contains(&key) {
        return Err(TransportError::config(format!(
            "{role} key '{key}' is reserved"
        )));
    }
    let parsed = PropKey::parse(key)
        .map_err(|_| TransportError::config(format!("{role} key '{key}' is malformed")))?;
    if parsed.domain() != domain {
        return Err(TransportError::config(format!(
            "{role} key '{key}' must be a {} property",
            domain.prefix()
        )));
    }
    Ok(parsed)
}

/// Lifecycle of an algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmState {
    Unconfigured,
    Setup,
    BoundaryConditionsSet,
    Solved,
}

/// Which pores keep their values in [`GenericTransport::results`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultsFilter {
    #[default]
    All,
    /// NaN at every pore carrying a boundary condition.
    ExcludeBoundary,
    /// NaN at every pore outside the label.
    Label(String),
}

/// Options for the effective-property calculation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EffectiveOptions {
    /// Pores the rate is measured through. Defaults to the pores carrying
    /// the lowest value condition.
    pub inlet: Option<Vec<usize>>,
    pub domain_length: Option<Real>,
    pub domain_area: Option<Real>,
}

impl EffectiveOptions {
    fn geometry_factor(&self) -> TransportResult<Real> {
        let length = self.domain_length.unwrap_or(1.0);
        let area = self.domain_area.unwrap_or(1.0);
        if !(length.is_finite() && length > 0.0 && area.is_finite() && area > 0.0) {
            return Err(TransportError::config(format!(
                "domain length {length} and area {area} must be positive"
            )));
        }
        Ok(length / area)
    }
}

#[derive(Debug, Clone)]
struct Binding<'a> {
    phase: &'a Phase<'a>,
    settings: TransportSettings,
    quantity: PropKey,
    conductance: PropKey,
}

/// Shared state and operations of every transport algorithm.
#[derive(Debug, Clone)]
pub struct GenericTransport<'a> {
    name: String,
    network: &'a Network,
    binding: Option<Binding<'a>>,
    state: AlgorithmState,
    bcs: BcTable,
    allow_outflow: bool,
    store: PropertyStore,
    weights: Option<DirectedWeights>,
}

impl<'a> GenericTransport<'a> {
    pub fn new(name: impl Into<String>, network: &'a Network) -> Self {
        Self {
            name: name.into(),
            network,
            binding: None,
            state: AlgorithmState::Unconfigured,
            bcs: BcTable::new(network.num_pores()),
            allow_outflow: false,
            store: PropertyStore::new(network.num_pores(), network.num_throats()),
            weights: None,
        }
    }

    /// Accept outflow conditions. Only algorithms with an advective field
    /// can honor them.
    pub(crate) fn with_outflow(mut self) -> Self {
        self.allow_outflow = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn network(&self) -> &'a Network {
        self.network
    }

    pub fn state(&self) -> AlgorithmState {
        self.state
    }

    pub fn settings(&self) -> Option<&TransportSettings> {
        self.binding.as_ref().map(|b| &b.settings)
    }

    pub fn bcs(&self) -> &BcTable {
        &self.bcs
    }

    /// The algorithm's own store: the solved quantity plus the BC arrays.
    pub fn store(&self) -> &PropertyStore {
        &self.store
    }

    fn binding(&self) -> TransportResult<&Binding<'a>> {
        self.binding.as_ref().ok_or_else(|| {
            TransportError::config(format!("algorithm '{}' has not been set up", self.name))
        })
    }

    pub fn phase(&self) -> TransportResult<&'a Phase<'a>> {
        Ok(self.binding()?.phase)
    }

    pub fn quantity(&self) -> TransportResult<&PropKey> {
        Ok(&self.binding()?.quantity)
    }

    /// Bind a phase and settings. Clears registered BCs and results.
    pub fn setup(&mut self, phase: &'a Phase<'a>, settings: TransportSettings) -> TransportResult<()> {
        if !std::ptr::eq(phase.network(), self.network) {
            return Err(TransportError::config(format!(
                "phase '{}' lives on a different network",
                phase.name()
            )));
        }
        let (quantity, conductance) = settings.parse_keys()?;

        tracing::info!(
            algorithm = %self.name,
            phase = phase.name(),
            quantity = %quantity,
            conductance = %conductance,
            "setup"
        );
        self.binding = Some(Binding {
            phase,
            settings,
            quantity,
            conductance,
        });
        self.bcs.clear();
        self.invalidate();
        self.state = AlgorithmState::Setup;
        Ok(())
    }

    fn invalidate(&mut self) {
        self.store = PropertyStore::new(self.network.num_pores(), self.network.num_throats());
        self.weights = None;
    }

    fn after_bc_change(&mut self) {
        self.invalidate();
        self.state = if self.bcs.is_empty() {
            AlgorithmState::Setup
        } else {
            AlgorithmState::BoundaryConditionsSet
        };
    }

    fn assign(&mut self, pores: &[usize], bcs: Vec<BoundaryCondition>) -> TransportResult<()> {
        let policy = self.binding()?.settings.conflict_policy;
        self.bcs.assign(pores, &bcs, policy)?;
        self.after_bc_change();
        Ok(())
    }

    /// Fix the quantity at `pores` (Dirichlet).
    pub fn set_value_bc(
        &mut self,
        pores: &[usize],
        values: impl Into<BcValues>,
    ) -> TransportResult<()> {
        self.binding()?;
        self.bcs.check_pores(pores)?;
        let values = values.into().expand(pores.len())?;
        self.assign(pores, values.into_iter().map(BoundaryCondition::Value).collect())
    }

    /// Fix the net injection rate at `pores` (Neumann).
    pub fn set_rate_bc(
        &mut self,
        pores: &[usize],
        values: impl Into<BcValues>,
    ) -> TransportResult<()> {
        self.binding()?;
        self.bcs.check_pores(pores)?;
        let values = values.into().expand(pores.len())?;
        self.assign(pores, values.into_iter().map(BoundaryCondition::Rate).collect())
    }

    /// Let `pores` discharge whatever is advected into them.
    pub fn set_outflow_bc(&mut self, pores: &[usize]) -> TransportResult<()> {
        self.binding()?;
        if !self.allow_outflow {
            return Err(TransportError::bc(format!(
                "algorithm '{}' has no advective field for outflow conditions",
                self.name
            )));
        }
        self.assign(pores, vec![BoundaryCondition::Outflow; pores.len()])
    }

    /// Clear conditions, optionally only at `pores` and/or of one kind.
    /// Returns how many were removed.
    pub fn remove_bc(
        &mut self,
        pores: Option<&[usize]>,
        kind: Option<BcKind>,
    ) -> TransportResult<usize> {
        self.binding()?;
        let removed = self.bcs.remove(pores, kind)?;
        if removed > 0 {
            self.after_bc_change();
        }
        Ok(removed)
    }

    /// The bound conductance, checked finite and non-negative.
    pub fn conductance(&self) -> TransportResult<Vec<Real>> {
        let binding = self.binding()?;
        let key = binding.conductance.to_string();
        let g = binding.phase.get(&key)?;
        checked_throat_values(&g, &key, true)
    }

    /// Symmetric weights from the bound conductance.
    pub fn diffusive_weights(&self) -> TransportResult<DirectedWeights> {
        Ok(DirectedWeights::symmetric(self.conductance()?))
    }

    /// Assemble, apply BCs, solve and store the quantity.
    ///
    /// `inflow` is the net advective inflow per pore, required when
    /// outflow conditions are registered. Nothing is stored on failure.
    pub fn solve_with(
        &mut self,
        weights: DirectedWeights,
        inflow: Option<&[Real]>,
    ) -> TransportResult<()> {
        let binding = self.binding()?;
        let solver = binding.settings.solver;
        let quantity = binding.quantity.clone();
        let np = self.network.num_pores();
        let nt = self.network.num_throats();

        if weights.len() != nt {
            return Err(TransportError::LengthMismatch {
                what: "throat weights".to_string(),
                expected: nt,
                actual: weights.len(),
            });
        }
        let outflow = self.bcs.pores_of(BcKind::Outflow);
        if !outflow.is_empty() {
            let Some(q) = inflow else {
                return Err(TransportError::bc(
                    "outflow conditions need an advective field",
                ));
            };
            if q.len() != np {
                return Err(TransportError::LengthMismatch {
                    what: "advective inflow".to_string(),
                    expected: np,
                    actual: q.len(),
                });
            }
            let discharging: Vec<usize> = outflow.iter().copied().filter(|&i| q[i] < 0.0).collect();
            if !discharging.is_empty() {
                tracing::warn!(
                    algorithm = %self.name,
                    pores = ?discharging,
                    "outflow pores with net advective outflow"
                );
            }
        }

        let mut system = LinearSystem::assemble(np, self.network.conns(), &weights);
        system.apply_bcs(&self.bcs, inflow);

        if let Some(&pore) = system.a.empty_rows().first() {
            return Err(TransportError::singular(format!(
                "pore {pore} is not coupled to anything and has no fixed value"
            )));
        }
        self.check_anchored(&weights, inflow)?;

        tracing::debug!(
            algorithm = %self.name,
            pores = np,
            throats = nt,
            nnz = system.a.nnz(),
            "assembled"
        );

        let x = solve(&system.a, &system.b, solver)?;

        let mut store = PropertyStore::new(np, nt);
        store.set_key(quantity.clone(), x)?;
        store.set("pore.bc_value", self.bcs.to_array(BcKind::Value))?;
        store.set("pore.bc_rate", self.bcs.to_array(BcKind::Rate))?;
        store.set("pore.bc_outflow", self.bcs.to_array(BcKind::Outflow))?;
        self.store = store;
        self.weights = Some(weights);
        self.state = AlgorithmState::Solved;
        tracing::info!(algorithm = %self.name, quantity = %quantity, "solved");
        Ok(())
    }

    /// Every connected cluster needs a fixed value or a discharging pore.
    fn check_anchored(&self, weights: &DirectedWeights, inflow: Option<&[Real]>) -> TransportResult<()> {
        let clusters = self.network.clusters(|t| weights.connects(t));
        let count = clusters.iter().max().map_or(0, |m| m + 1);
        let mut anchored = vec![false; count];
        for (pore, bc) in self.bcs.iter() {
            let anchors = match bc {
                BoundaryCondition::Value(_) => true,
                BoundaryCondition::Outflow => inflow.is_some_and(|q| q[pore] > 0.0),
                BoundaryCondition::Rate(_) => false,
            };
            if anchors {
                anchored[clusters[pore]] = true;
            }
        }
        if let Some(c) = anchored.iter().position(|a| !a) {
            let members: Vec<usize> = (0..clusters.len()).filter(|&p| clusters[p] == c).collect();
            return Err(TransportError::singular(format!(
                "pores {members:?} form a cluster with no value or outflow condition"
            )));
        }
        Ok(())
    }

    fn solution(&self) -> TransportResult<&[Real]> {
        let quantity = self.quantity()?;
        match (self.state, self.store.get_key(quantity)) {
            (AlgorithmState::Solved, Some(x)) => Ok(x),
            _ => Err(TransportError::config(format!(
                "algorithm '{}' has not been run",
                self.name
            ))),
        }
    }

    /// Full-length copy of the solved quantity under `filter`.
    ///
    /// The phase is not touched; merge with [`Phase::update`].
    pub fn results(&self, filter: &ResultsFilter) -> TransportResult<PropertyStore> {
        let mut x = self.solution()?.to_vec();
        match filter {
            ResultsFilter::All => {}
            ResultsFilter::ExcludeBoundary => {
                for (pore, _) in self.bcs.iter() {
                    x[pore] = Real::NAN;
                }
            }
            ResultsFilter::Label(label) => {
                let mut keep = vec![false; x.len()];
                for p in self.network.pores(label)? {
                    keep[p] = true;
                }
                for (v, k) in x.iter_mut().zip(keep) {
                    if !k {
                        *v = Real::NAN;
                    }
                }
            }
        }
        let mut out = PropertyStore::new(self.network.num_pores(), self.network.num_throats());
        out.set_key(self.quantity()?.clone(), x)?;
        Ok(out)
    }

    /// Net rate leaving `pores` into the rest of the network.
    pub fn rate(&self, pores: &[usize]) -> TransportResult<Real> {
        let x = self.solution()?;
        let weights = self
            .weights
            .as_ref()
            .ok_or_else(|| TransportError::config("no weights from the last run"))?;
        let inside = self.membership(pores)?;

        let mut total = 0.0;
        for (t, &[i, j]) in self.network.conns().iter().enumerate() {
            match (inside[i], inside[j]) {
                (true, false) => total += weights.flux(t, x[i], x[j]),
                (false, true) => total -= weights.flux(t, x[i], x[j]),
                _ => {}
            }
        }
        Ok(total)
    }

    fn membership(&self, pores: &[usize]) -> TransportResult<Vec<bool>> {
        let np = self.network.num_pores();
        let mut inside = vec![false; np];
        for &p in pores {
            if p >= np {
                return Err(TransportError::PoreIndex { index: p, len: np });
            }
            inside[p] = true;
        }
        Ok(inside)
    }

    /// Unscaled effective property with default options.
    pub fn calc_effective_property(&self) -> TransportResult<Real> {
        self.calc_effective_property_with(&EffectiveOptions::default())
    }

    /// `|rate through the inlet| / Δvalue × length / area`.
    pub fn calc_effective_property_with(&self, options: &EffectiveOptions) -> TransportResult<Real> {
        if self.state != AlgorithmState::Solved {
            return Err(TransportError::bc(format!(
                "algorithm '{}' must be solved before computing an effective property",
                self.name
            )));
        }
        let values = self.bcs.values();
        let lo = values.iter().map(|&(_, v)| v).fold(Real::INFINITY, Real::min);
        let hi = values.iter().map(|&(_, v)| v).fold(Real::NEG_INFINITY, Real::max);
        if values.is_empty() || hi <= lo {
            return Err(TransportError::bc(
                "effective property needs at least two distinct value conditions",
            ));
        }

        let inlet: Vec<usize> = match &options.inlet {
            Some(pores) => pores.clone(),
            None => values
                .iter()
                .filter(|&&(_, v)| v == lo)
                .map(|&(p, _)| p)
                .collect(),
        };
        let inside = self.membership(&inlet)?;
        if let Some(weights) = &self.weights {
            for (t, &[i, j]) in self.network.conns().iter().enumerate() {
                if (inside[i] || inside[j]) && (weights.forward[t].is_nan() || weights.reverse[t].is_nan()) {
                    return Err(TransportError::bc(format!(
                        "conductance of throat {t} at the inlet is undefined"
                    )));
                }
            }
        }

        let rate = self.rate(&inlet)?;
        Ok(rate.abs() / (hi - lo) * options.geometry_factor()?)
    }

    /// Mean of a pore property of the bound phase, used to scale
    /// effective properties.
    pub fn phase_mean(&self, key: &str) -> TransportResult<Real> {
        let values = self.phase()?.get(key)?;
        pn_core::finite_mean(&values).ok_or_else(|| {
            TransportError::config(format!("'{key}' has no finite values to average"))
        })
    }
}

/// Check a throat array from the phase.
pub(crate) fn checked_throat_values(
    values: &[Real],
    key: &str,
    non_negative: bool,
) -> TransportResult<Vec<Real>> {
    if let Some((t, v)) = values
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || (non_negative && **v < 0.0))
    {
        return Err(TransportError::config(format!(
            "'{key}' at throat {t} is {v}; conductances must be finite and non-negative"
        )));
    }
    Ok(values.to_vec())
}

/// Behavior shared by the concrete algorithms.
///
/// Implementors supply the throat weights (and, for advective
/// algorithms, the inflow feeding outflow conditions); `run` does the rest.
pub trait TransportAlgorithm<'a> {
    fn base(&self) -> &GenericTransport<'a>;
    fn base_mut(&mut self) -> &mut GenericTransport<'a>;

    fn weights(&self) -> TransportResult<DirectedWeights> {
        self.base().diffusive_weights()
    }

    /// Net advective inflow per pore.
    fn advective_inflow(&self) -> TransportResult<Option<Vec<Real>>> {
        Ok(None)
    }

    fn run(&mut self) -> TransportResult<()> {
        self.base().binding()?;
        let weights = self.weights()?;
        let inflow = self.advective_inflow()?;
        self.base_mut().solve_with(weights, inflow.as_deref())
    }

    /// Effective property as reported by this algorithm (scaled where the
    /// algorithm defines a scaling property).
    fn effective_property(&self, options: &EffectiveOptions) -> TransportResult<Real> {
        self.base().calc_effective_property_with(options)
    }
}

impl<'a> TransportAlgorithm<'a> for GenericTransport<'a> {
    fn base(&self) -> &GenericTransport<'a> {
        self
    }

    fn base_mut(&mut self) -> &mut GenericTransport<'a> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pn_model::Physics;
    use pn_network::NetworkBuilder;

    fn chain(n: usize) -> Network {
        let mut b = NetworkBuilder::new();
        b.add_pores(n);
        for i in 1..n {
            b.add_throat(i - 1, i);
        }
        b.build().unwrap()
    }

    fn phase_with_g<'a>(net: &'a Network, g: Real) -> Phase<'a> {
        let mut phys = Physics::everywhere("phys", net);
        phys.fill("throat.g", g).unwrap();
        let mut phase = Phase::new("phase", net);
        phase.add_physics(phys).unwrap();
        phase
    }

    #[test]
    fn settings_reject_bad_keys() {
        let net = chain(2);
        let phase = phase_with_g(&net, 1.0);
        let mut alg = GenericTransport::new("alg", &net);
        for (q, g) in [
            ("pore.bc_value", "throat.g"),
            ("throat.x", "throat.g"),
            ("pore.x", "pore.g"),
            ("x", "throat.g"),
            ("pore.x", "throat.conns"),
        ] {
            let err = alg.setup(&phase, TransportSettings::new(q, g)).unwrap_err();
            assert!(matches!(err, TransportError::InvalidConfiguration { .. }), "{q} {g}");
        }
        assert_eq!(alg.state(), AlgorithmState::Unconfigured);
    }

    #[test]
    fn use_before_setup_fails() {
        let net = chain(2);
        let mut alg = GenericTransport::new("alg", &net);
        assert!(matches!(
            alg.set_value_bc(&[0], 1.0),
            Err(TransportError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            alg.run(),
            Err(TransportError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn state_machine() {
        let net = chain(3);
        let phase = phase_with_g(&net, 1.0);
        let mut alg = GenericTransport::new("alg", &net);
        alg.setup(&phase, TransportSettings::new("pore.x", "throat.g"))
            .unwrap();
        assert_eq!(alg.state(), AlgorithmState::Setup);
        alg.set_value_bc(&[0, 2], [0.0, 1.0]).unwrap();
        assert_eq!(alg.state(), AlgorithmState::BoundaryConditionsSet);
        alg.run().unwrap();
        assert_eq!(alg.state(), AlgorithmState::Solved);
        assert!(alg.results(&ResultsFilter::All).is_ok());

        // Changing BCs drops the stale solution.
        alg.set_rate_bc(&[1], 0.5).unwrap();
        assert_eq!(alg.state(), AlgorithmState::BoundaryConditionsSet);
        assert!(alg.results(&ResultsFilter::All).is_err());

        alg.setup(&phase, TransportSettings::new("pore.x", "throat.g"))
            .unwrap();
        assert!(alg.bcs().is_empty());
        assert_eq!(alg.state(), AlgorithmState::Setup);
    }

    #[test]
    fn outflow_needs_advection() {
        let net = chain(2);
        let phase = phase_with_g(&net, 1.0);
        let mut alg = GenericTransport::new("alg", &net);
        alg.setup(&phase, TransportSettings::new("pore.x", "throat.g"))
            .unwrap();
        assert!(matches!(
            alg.set_outflow_bc(&[1]),
            Err(TransportError::BoundaryCondition { .. })
        ));
    }

    #[test]
    fn negative_conductance_rejected() {
        let net = chain(3);
        let phase = phase_with_g(&net, -1.0);
        let mut alg = GenericTransport::new("alg", &net);
        alg.setup(&phase, TransportSettings::new("pore.x", "throat.g"))
            .unwrap();
        alg.set_value_bc(&[0, 2], [0.0, 1.0]).unwrap();
        assert!(matches!(
            alg.run(),
            Err(TransportError::InvalidConfiguration { .. })
        ));
        assert_eq!(alg.state(), AlgorithmState::BoundaryConditionsSet);
    }

    #[test]
    fn rate_balance_and_filters() {
        let net = chain(4);
        let phase = phase_with_g(&net, 2.0);
        let mut alg = GenericTransport::new("alg", &net);
        alg.setup(&phase, TransportSettings::new("pore.x", "throat.g"))
            .unwrap();
        alg.set_value_bc(&[0], 3.0).unwrap();
        alg.set_value_bc(&[3], 0.0).unwrap();
        alg.run().unwrap();

        // 2.0 * 3.0 / 3 throats leaves the high end and enters the low end.
        assert!((alg.rate(&[0]).unwrap() - 2.0).abs() < 1e-12);
        assert!((alg.rate(&[3]).unwrap() + 2.0).abs() < 1e-12);
        assert!(alg.rate(&[0, 1, 2, 3]).unwrap().abs() < 1e-12);

        let all = alg.results(&ResultsFilter::All).unwrap();
        let x = all.get("pore.x").unwrap();
        assert!((x[1] - 2.0).abs() < 1e-12);
        let interior = alg.results(&ResultsFilter::ExcludeBoundary).unwrap();
        let xi = interior.get("pore.x").unwrap();
        assert!(xi[0].is_nan() && xi[3].is_nan());
        assert!((xi[2] - 1.0).abs() < 1e-12);
        assert!(alg.results(&ResultsFilter::Label("nowhere".into())).is_err());

        let bc = alg.store().get("pore.bc_value").unwrap();
        assert_eq!(bc[0], 3.0);
        assert!(bc[1].is_nan());
    }

    #[test]
    fn effective_property_needs_two_values() {
        let net = chain(3);
        let phase = phase_with_g(&net, 1.0);
        let mut alg = GenericTransport::new("alg", &net);
        alg.setup(&phase, TransportSettings::new("pore.x", "throat.g"))
            .unwrap();
        alg.set_value_bc(&[0, 2], 1.0).unwrap();
        assert!(matches!(
            alg.calc_effective_property(),
            Err(TransportError::BoundaryCondition { .. })
        ));
        alg.run().unwrap();
        assert!(matches!(
            alg.calc_effective_property(),
            Err(TransportError::BoundaryCondition { .. })
        ));

        alg.set_value_bc(&[2], 0.0).unwrap();
        alg.run().unwrap();
        let k = alg
            .calc_effective_property_with(&EffectiveOptions {
                domain_length: Some(4.0),
                domain_area: Some(2.0),
                ..Default::default()
            })
            .unwrap();
        assert!((k - 0.5 * 2.0).abs() < 1e-12);
    }
}

//! Resolution through a phase with several physics providers.

use pn_model::{
    Constant, GapPolicy, Geometry, PhaseError, Phase, Physics, Provider, Scaled, from_fn,
};
use pn_network::{Network, NetworkBuilder};

/// Six pores in a row, split into a left half (pores 0..3, throats 0..2)
/// and a right half (pores 3..6, throats 3..5).
fn split_chain() -> Network {
    let mut b = NetworkBuilder::new();
    b.add_pores(6);
    for i in 1..6 {
        b.add_throat(i - 1, i);
    }
    b.set_pore_label("left", &[0, 1, 2]);
    b.set_pore_label("right", &[3, 4, 5]);
    b.build().unwrap()
}

#[test]
fn two_physics_cover_the_network() {
    let net = split_chain();
    let mut phase = Phase::new("water", &net);

    let mut left = Physics::new("left", &net, vec![0, 1, 2], vec![0, 1, 2]).unwrap();
    left.fill("throat.diffusive_conductance", 1.0).unwrap();
    let mut right = Physics::new("right", &net, vec![3, 4, 5], vec![3, 4]).unwrap();
    right.set("throat.diffusive_conductance", vec![2.0, 3.0]).unwrap();
    phase.add_physics(left).unwrap();
    phase.add_physics(right).unwrap();

    let g = phase.get("throat.diffusive_conductance").unwrap();
    assert_eq!(&*g, &[1.0, 1.0, 1.0, 2.0, 3.0]);

    let resolved = phase
        .resolve("throat.diffusive_conductance", GapPolicy::Error)
        .unwrap();
    assert_eq!(resolved.gaps, 0);
}

#[test]
fn gap_reporting_follows_policy() {
    let net = split_chain();
    let mut left = Physics::new("left", &net, vec![0, 1, 2], vec![0, 1]).unwrap();
    left.fill("throat.hydraulic_conductance", 4.0).unwrap();

    let mut phase = Phase::new("oil", &net);
    phase.add_physics(left).unwrap();

    let zero = phase.get("throat.hydraulic_conductance").unwrap();
    assert_eq!(&*zero, &[4.0, 4.0, 0.0, 0.0, 0.0]);

    phase.set_gap_policy(GapPolicy::Nan);
    let nan = phase.get("throat.hydraulic_conductance").unwrap();
    assert!(nan[2..].iter().all(|v| v.is_nan()));

    phase.set_gap_policy(GapPolicy::Error);
    let err = phase.get("throat.hydraulic_conductance").unwrap_err();
    match err {
        PhaseError::IncompleteCoverage { gaps, fraction, .. } => {
            assert_eq!(gaps, 3);
            assert!((fraction - 0.6).abs() < 1e-12);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_key_names_the_provider() {
    let net = split_chain();
    let mut a = Physics::new("a", &net, vec![0], vec![0]).unwrap();
    a.fill("throat.diffusive_conductance", 1.0).unwrap();
    let b = Physics::new("b", &net, vec![1], vec![1]).unwrap();

    let mut phase = Phase::new("air", &net);
    phase.add_physics(a).unwrap();
    phase.add_physics(b).unwrap();

    let err = phase.get("throat.diffusive_conductance").unwrap_err();
    assert_eq!(
        err,
        PhaseError::MissingProperty {
            key: "throat.diffusive_conductance".into(),
            object: "b".into(),
        }
    );

    let empty = Phase::new("empty", &net);
    let err = empty.get("pore.temperature").unwrap_err();
    assert!(matches!(err, PhaseError::MissingProperty { object, .. } if object == "empty"));
}

#[test]
fn shared_physics_updates_are_visible() {
    let net = split_chain();
    let shared = Physics::everywhere("bulk", &net).into_shared();
    shared
        .write()
        .fill("throat.diffusive_conductance", 1.0)
        .unwrap();

    let mut water = Phase::new("water", &net);
    let mut air = Phase::new("air", &net);
    water.add_physics(shared.clone()).unwrap();
    air.add_physics(shared.clone()).unwrap();

    shared
        .write()
        .fill("throat.diffusive_conductance", 7.0)
        .unwrap();
    assert_eq!(&*water.get("throat.diffusive_conductance").unwrap(), &[7.0; 5]);
    assert_eq!(&*air.get("throat.diffusive_conductance").unwrap(), &[7.0; 5]);
}

#[test]
fn regeneration_chains_phase_and_physics_models() {
    let net = split_chain();
    let mut phase = Phase::new("water", &net);
    phase.add_model("pore.temperature", Constant(300.0)).unwrap();
    phase
        .add_model(
            "pore.viscosity",
            from_fn(|ctx| {
                let t = ctx.values("pore.temperature")?;
                Ok(t.iter().map(|t| 1e-3 * 300.0 / t).collect())
            }),
        )
        .unwrap();

    let geo = Geometry::new("geo", &net, vec![0, 1, 2, 3, 4, 5], vec![0, 1, 2, 3, 4]).unwrap();
    let mut phys = Physics::for_geometry("phys", &geo);
    phys.add_model(
        "pore.fluidity",
        from_fn(|ctx| {
            let mu = ctx.phase_values("pore.viscosity")?;
            Ok(mu.iter().map(|m| 1.0 / m).collect())
        }),
    )
    .unwrap();
    phys.add_model(
        "pore.double_fluidity",
        Scaled {
            source: "pore.fluidity".into(),
            factor: 2.0,
        },
    )
    .unwrap();
    let shared = phys.into_shared();
    phase.add_physics(shared.clone()).unwrap();

    phase.regenerate().unwrap();
    let fluidity = phase.get("pore.double_fluidity").unwrap();
    assert!(fluidity.iter().all(|f| (f - 2000.0).abs() < 1e-9));
    assert_eq!(shared.read().store().get("pore.fluidity").map(|v| v.len()), Some(6));
}

#[test]
fn results_merge_through_update() {
    let net = split_chain();
    let mut phys = Physics::everywhere("phys", &net);
    phys.fill("pore.molar_density", 40.0).unwrap();
    let mut phase = Phase::new("air", &net);
    phase.add_physics(phys).unwrap();

    let mut results = pn_core::PropertyStore::new(6, 5);
    results.set("pore.mole_fraction", vec![0.5; 6]).unwrap();
    phase.update(&results).unwrap();
    assert_eq!(&*phase.get("pore.mole_fraction").unwrap(), &[0.5; 6]);

    let mut clash = pn_core::PropertyStore::new(6, 5);
    clash.set("pore.molar_density", vec![1.0; 6]).unwrap();
    assert!(matches!(
        phase.update(&clash),
        Err(PhaseError::PropertyConflict { .. })
    ));
}

#[test]
fn labels_pass_through() {
    let net = split_chain();
    let phase = Phase::new("water", &net);
    assert_eq!(phase.pores("left").unwrap(), vec![0, 1, 2]);
    assert!(phase.pores("middle").is_err());
}

#[test]
fn shared_physics_regenerates_through_its_own_phase() {
    let net = split_chain();
    let mut phys = Physics::everywhere("phys", &net);
    phys.fill("pore.molar_density", 40.0).unwrap();
    phys.add_model(
        "pore.half_density",
        from_fn(|ctx| {
            // Resolves through the phase, which reads this very provider.
            let c = ctx.phase_values("pore.molar_density")?;
            Ok(c.iter().map(|c| c / 2.0).collect())
        }),
    )
    .unwrap();
    let shared = phys.into_shared();
    let mut phase = Phase::new("air", &net);
    phase.add_physics(shared.clone()).unwrap();

    shared.regenerate(&phase).unwrap();
    assert_eq!(&*phase.get("pore.half_density").unwrap(), &[20.0; 6]);
    assert!(shared.write().fill("pore.molar_density", 10.0).is_ok());
}

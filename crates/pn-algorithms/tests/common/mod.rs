#![allow(dead_code)]

use pn_model::{Phase, Physics};
use pn_network::{Network, NetworkBuilder};

/// Pores `0..n` in a row.
pub fn chain(n: usize) -> Network {
    let mut b = NetworkBuilder::new();
    b.add_pores(n);
    for i in 1..n {
        b.add_throat(i - 1, i);
    }
    b.set_pore_label("left", &[0]);
    b.set_pore_label("right", &[n - 1]);
    b.build().unwrap()
}

/// An `nx × ny` lattice with pore index `i * ny + j`, `i` along x.
///
/// `front` is the `i = 0` face, `back` the `i = nx - 1` face.
pub fn lattice(nx: usize, ny: usize) -> Network {
    let mut b = NetworkBuilder::new();
    b.add_pores(nx * ny);
    let id = |i: usize, j: usize| i * ny + j;
    for i in 0..nx {
        for j in 0..ny {
            if i + 1 < nx {
                b.add_throat(id(i, j), id(i + 1, j));
            }
            if j + 1 < ny {
                b.add_throat(id(i, j), id(i, j + 1));
            }
        }
    }
    let front: Vec<usize> = (0..ny).map(|j| id(0, j)).collect();
    let back: Vec<usize> = (0..ny).map(|j| id(nx - 1, j)).collect();
    b.set_pore_label("front", &front);
    b.set_pore_label("back", &back);
    b.build().unwrap()
}

/// A phase whose single physics sets every listed throat property to a
/// constant.
pub fn uniform_phase<'a>(net: &'a Network, throat_props: &[(&str, f64)]) -> Phase<'a> {
    let mut phys = Physics::everywhere("phys", net);
    for &(key, value) in throat_props {
        phys.fill(key, value).unwrap();
    }
    let mut phase = Phase::new("phase", net);
    phase.add_physics(phys).unwrap();
    phase
}

pub fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= tol * e.abs().max(1.0),
            "index {i}: {a} != {e}"
        );
    }
}

//! Integration tests for pn-network.

use pn_core::Domain;
use pn_network::{NetworkBuilder, NetworkError};
use proptest::prelude::*;

#[test]
fn build_square_lattice() {
    // 2x2 lattice:
    //   2 -- 3
    //   |    |
    //   0 -- 1
    let mut builder = NetworkBuilder::new();
    builder.add_pores(4);
    builder.add_throat(0, 1);
    builder.add_throat(2, 3);
    builder.add_throat(0, 2);
    builder.add_throat(1, 3);
    builder.set_pore_label("left", &[0, 2]);
    builder.set_pore_label("right", &[1, 3]);
    builder.set_throat_label("horizontal", &[0, 1]);

    let net = builder.build().unwrap();

    assert_eq!(net.num_pores(), 4);
    assert_eq!(net.num_throats(), 4);
    assert_eq!(net.throat_conns(2), Some([0, 2]));
    assert_eq!(net.throat_conns(4), None);
    assert_eq!(net.neighbor_pores(0), vec![1, 2]);
    assert_eq!(net.neighbor_pores(3), vec![1, 2]);
    assert_eq!(net.pores("left").unwrap(), vec![0, 2]);
    assert_eq!(net.throats("throat.horizontal").unwrap(), vec![0, 1]);
    assert_eq!(
        net.labels(Domain::Pore),
        vec!["pore.all", "pore.left", "pore.right"]
    );
}

#[test]
fn disconnected_network_is_valid() {
    let mut builder = NetworkBuilder::new();
    builder.add_pores(5);
    builder.add_throat(0, 1);
    builder.add_throat(3, 4);
    let net = builder.build().unwrap();

    // Pore 2 is isolated.
    assert!(net.pore_throats(2).is_empty());
    assert_eq!(net.clusters(|_| true), vec![0, 0, 1, 2, 2]);
}

#[test]
fn invalid_endpoint_is_rejected() {
    let mut builder = NetworkBuilder::new();
    builder.add_pores(2);
    builder.add_throat(0, 5);
    let err = builder.build().unwrap_err();
    assert!(matches!(err, NetworkError::InvalidPoreRef { pore: 5, .. }));
}

proptest! {
    #[test]
    fn adjacency_degree_sum(n in 2usize..30, edges in proptest::collection::vec((0usize..30, 0usize..30), 0..60)) {
        let mut builder = NetworkBuilder::new();
        builder.add_pores(n);
        let mut seen = std::collections::HashSet::new();
        for (a, b) in edges {
            let (a, b) = (a % n, b % n);
            if a != b && seen.insert((a.min(b), a.max(b))) {
                builder.add_throat(a, b);
            }
        }
        let net = builder.build().unwrap();

        let total: usize = (0..n).map(|p| net.pore_throats(p).len()).sum();
        prop_assert_eq!(total, 2 * net.num_throats());
        for p in 0..n {
            for &t in net.pore_throats(p) {
                prop_assert!(net.conns()[t].contains(&p));
            }
        }
    }
}

//! Network validation logic.

use std::collections::HashMap;

use pn_core::PnError;

use crate::error::{NetworkError, NetworkResult};

/// Validate throat endpoints: in range, no self loops, no duplicate pairs.
pub(crate) fn validate_conns(num_pores: usize, conns: &[[usize; 2]]) -> NetworkResult<()> {
    let mut seen: HashMap<(usize, usize), usize> = HashMap::with_capacity(conns.len());

    for (throat, &[a, b]) in conns.iter().enumerate() {
        for pore in [a, b] {
            if pore >= num_pores {
                return Err(NetworkError::InvalidPoreRef {
                    throat,
                    pore,
                    num_pores,
                });
            }
        }

        if a == b {
            return Err(NetworkError::SelfLoop { throat, pore: a });
        }

        let pair = (a.min(b), a.max(b));
        if let Some(&other) = seen.get(&pair) {
            return Err(NetworkError::DuplicateThroat { throat, other });
        }
        seen.insert(pair, throat);
    }

    Ok(())
}

/// Validate that the adjacency lists agree with the throat endpoints.
pub(crate) fn validate_adjacency(
    conns: &[[usize; 2]],
    offsets: &[usize],
    flat: &[usize],
) -> NetworkResult<()> {
    if offsets.last().copied() != Some(2 * conns.len()) || flat.len() != 2 * conns.len() {
        return Err(PnError::Invariant {
            what: "adjacency size does not match throat count".to_string(),
        }
        .into());
    }

    for pore in 0..offsets.len() - 1 {
        for &throat in &flat[offsets[pore]..offsets[pore + 1]] {
            let ok = conns.get(throat).is_some_and(|c| c.contains(&pore));
            if !ok {
                return Err(PnError::Invariant {
                    what: format!(
                        "throat {} in pore {}'s adjacency list but doesn't touch that pore",
                        throat, pore
                    ),
                }
                .into());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_endpoint() {
        let err = validate_conns(2, &[[0, 1], [1, 2]]).unwrap_err();
        assert_eq!(
            err,
            NetworkError::InvalidPoreRef {
                throat: 1,
                pore: 2,
                num_pores: 2
            }
        );
    }

    #[test]
    fn self_loop() {
        let err = validate_conns(3, &[[1, 1]]).unwrap_err();
        assert_eq!(err, NetworkError::SelfLoop { throat: 0, pore: 1 });
    }

    #[test]
    fn duplicate_in_either_orientation() {
        let err = validate_conns(3, &[[0, 1], [1, 2], [1, 0]]).unwrap_err();
        assert_eq!(err, NetworkError::DuplicateThroat { throat: 2, other: 0 });
    }

    #[test]
    fn inconsistent_adjacency() {
        // Pore 0 claims throat 0, which joins pores 1 and 2.
        let conns = [[1, 2]];
        let offsets = [0, 1, 2, 2];
        let flat = [0, 0];
        assert!(validate_adjacency(&conns, &offsets, &flat).is_err());
    }
}

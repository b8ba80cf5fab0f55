//! Canonical form of 2-adic genus symbols.
//!
//! Different Jordan decompositions of the same 2-adic form can have
//! different symbols. Two moves relate them:
//!
//! - **oddity fusion**: only the total oddity of a compartment is an
//!   invariant, so it is collected on the compartment's first block;
//! - **sign walking**: determinant signs can move between blocks of a
//!   train, changing the oddity of the compartments crossed by 4.
//!
//! Applying both until every train carries at most one `-1`, on its first
//! block, gives a canonical symbol. Everything here is a pure function of
//! a slice of [`DyadicBlock`]s.
//!
//! # Citations
//! - Conway & Sloane, "Sphere Packings, Lattices and Groups", 3rd ed. (1999), Ch. 15 §7.3–7.6, pp. 381–382

use crate::symbol::{DyadicBlock, Parity};
use tracing::trace;

/// Indices of the compartments of a 2-adic symbol.
///
/// A compartment is a maximal run of odd blocks whose scales are
/// consecutive integers.
pub fn canonical_2_adic_compartments(symbol: &[DyadicBlock]) -> Vec<Vec<usize>> {
    let mut compartments = Vec::new();
    let mut i = 0;
    while i < symbol.len() {
        if !symbol[i].is_odd() {
            i += 1;
            continue;
        }
        let mut scale = Some(symbol[i].scale);
        let mut compartment = Vec::new();
        while i < symbol.len() && symbol[i].is_odd() && Some(symbol[i].scale) == scale {
            compartment.push(i);
            scale = symbol[i].scale.checked_add(1);
            i += 1;
        }
        compartments.push(compartment);
    }
    compartments
}

/// Indices of the trains of a 2-adic symbol.
///
/// A train is a maximal interval of blocks in which every adjacent pair,
/// counting absent (rank zero, even) scales in between, has an odd member.
/// Trains partition `0..symbol.len()`.
pub fn canonical_2_adic_trains(symbol: &[DyadicBlock]) -> Vec<Vec<usize>> {
    if symbol.is_empty() {
        return Vec::new();
    }
    let mut trains = Vec::new();
    let mut train = vec![0];
    for (i, pair) in symbol.windows(2).enumerate() {
        let (prev, cur) = (&pair[0], &pair[1]);
        let both_odd = prev.is_odd() && cur.is_odd();
        let either_odd = prev.is_odd() || cur.is_odd();
        // Out-of-order scales never continue a train.
        let continues = match cur.scale.checked_sub(prev.scale) {
            Some(1) => either_odd,
            Some(2) => both_odd,
            _ => false,
        };
        if continues {
            train.push(i + 1);
        } else {
            trains.push(std::mem::replace(&mut train, vec![i + 1]));
        }
    }
    trains.push(train);
    trains
}

/// Canonical 2-adic symbol: determinants reduced to `±1`, oddities fused
/// per compartment and signs walked to the start of each train.
///
/// The input is not modified, and the function is idempotent.
///
/// # Examples
/// ```
/// use genus_symbol::canonical::canonical_2_adic_reduction;
/// use genus_symbol::symbol::JordanBlocks;
///
/// let JordanBlocks::Dyadic(raw) =
///     JordanBlocks::from_tuples(2, &[[1, 2, 3, 1, 4], [2, 1, 1, 1, 1], [3, 1, 1, 1, 1]]).unwrap()
/// else {
///     unreachable!()
/// };
/// let canonical = canonical_2_adic_reduction(&raw);
/// let tuples: Vec<_> = canonical.iter().map(|b| b.to_tuple()).collect();
/// assert_eq!(tuples, vec![vec![1, 2, -1, 1, 6], vec![2, 1, 1, 1, 0], vec![3, 1, 1, 1, 0]]);
/// ```
pub fn canonical_2_adic_reduction(symbol: &[DyadicBlock]) -> Vec<DyadicBlock> {
    let mut canonical: Vec<DyadicBlock> = symbol
        .iter()
        .map(|b| DyadicBlock {
            det: b.det_sign(),
            ..*b
        })
        .collect();

    let compartments = canonical_2_adic_compartments(&canonical);
    for compartment in &compartments {
        let total = compartment
            .iter()
            .map(|&i| u32::from(canonical[i].oddity))
            .sum::<u32>()
            % 8;
        for &i in compartment {
            canonical[i].oddity = 0;
        }
        canonical[compartment[0]].oddity = total as u8;
    }

    for train in canonical_2_adic_trains(&canonical) {
        for &t in train.iter().skip(1).rev() {
            if canonical[t].det != -1 {
                continue;
            }
            canonical[t].det = 1;
            canonical[t - 1].det = -canonical[t - 1].det;
            for compartment in &compartments {
                if compartment.contains(&(t - 1)) || compartment.contains(&t) {
                    let head = compartment[0];
                    canonical[head].oddity = (canonical[head].oddity + 4) % 8;
                }
            }
            trace!(from = t, to = t - 1, "sign walk");
        }
    }
    canonical
}

/// Whether a raw 2-adic symbol satisfies the Conway–Sloane existence
/// conditions for every block.
pub fn is_2_adic_genus(symbol: &[DyadicBlock]) -> bool {
    symbol.iter().all(block_exists)
}

fn block_exists(b: &DyadicBlock) -> bool {
    let det = i64::from(b.det);
    let oddity = i64::from(b.oddity);
    if b.rank == 1 && (b.parity == Parity::Even || det != oddity) {
        return false;
    }
    if b.rank == 2 && b.is_odd() {
        let allowed: &[i64] = match det.rem_euclid(8) {
            1 | 7 => &[0, 2, 6],
            3 | 5 => &[2, 4, 6],
            _ => &[],
        };
        if !allowed.is_empty() && !allowed.contains(&oddity) {
            return false;
        }
    }
    if (b.rank as i64 - oddity).rem_euclid(2) == 1 {
        return false;
    }
    !(b.parity == Parity::Even && oddity != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::JordanBlocks;

    fn blocks(records: &[[i64; 5]]) -> Vec<DyadicBlock> {
        match JordanBlocks::from_tuples(2, records).unwrap() {
            JordanBlocks::Dyadic(b) => b,
            JordanBlocks::Odd(_) => unreachable!(),
        }
    }

    fn tuples(symbol: &[DyadicBlock]) -> Vec<Vec<i64>> {
        symbol.iter().map(DyadicBlock::to_tuple).collect()
    }

    #[test]
    fn compartments_of_small_symbols() {
        assert_eq!(canonical_2_adic_compartments(&blocks(&[[0, 2, 1, 1, 2]])), vec![vec![0]]);
        assert_eq!(
            canonical_2_adic_compartments(&blocks(&[[0, 1, 1, 1, 1], [1, 1, 1, 1, 1]])),
            vec![vec![0, 1]]
        );
        assert_eq!(
            canonical_2_adic_compartments(&blocks(&[
                [1, 2, 3, 1, 4],
                [2, 1, 1, 1, 1],
                [3, 1, 1, 1, 1]
            ])),
            vec![vec![0, 1, 2]]
        );
    }

    /// A single even block has no compartments.
    #[test]
    fn even_block_has_no_compartment() {
        assert!(canonical_2_adic_compartments(&blocks(&[[0, 2, 3, 0, 0]])).is_empty());
        assert_eq!(canonical_2_adic_trains(&blocks(&[[0, 2, 3, 0, 0]])), vec![vec![0]]);
    }

    #[test]
    fn compartments_break_on_scale_gap() {
        let s = blocks(&[[0, 1, 1, 1, 1], [2, 1, 1, 1, 1], [3, 1, 3, 1, 3], [4, 2, 1, 0, 0]]);
        assert_eq!(canonical_2_adic_compartments(&s), vec![vec![0], vec![1, 2]]);
    }

    #[test]
    fn trains_of_long_symbol() {
        let s = blocks(&[
            [0, 1, 1, 1, 1],
            [1, 2, 1, 0, 0],
            [2, 1, 1, 1, 1],
            [3, 1, 1, 1, 1],
            [4, 1, 1, 1, 1],
            [5, 2, 1, 0, 0],
            [7, 1, 1, 1, 1],
            [10, 1, 1, 1, 1],
            [11, 1, 1, 1, 1],
            [12, 1, 1, 1, 1],
        ]);
        assert_eq!(
            canonical_2_adic_trains(&s),
            vec![vec![0, 1, 2, 3, 4, 5], vec![6], vec![7, 8, 9]]
        );
    }

    #[test]
    fn trains_join_odd_blocks_two_apart() {
        let s = blocks(&[[0, 1, 1, 1, 1], [1, 3, 1, 1, 1]]);
        assert_eq!(canonical_2_adic_trains(&s), vec![vec![0, 1]]);
        let s = blocks(&[[0, 1, 1, 1, 1], [2, 1, 1, 1, 1]]);
        assert_eq!(canonical_2_adic_trains(&s), vec![vec![0, 1]]);
        let s = blocks(&[[0, 1, 1, 1, 1], [2, 2, 1, 0, 0]]);
        assert_eq!(canonical_2_adic_trains(&s), vec![vec![0], vec![1]]);
    }

    #[test]
    fn trains_of_empty_symbol() {
        assert!(canonical_2_adic_trains(&[]).is_empty());
        assert!(canonical_2_adic_reduction(&[]).is_empty());
    }

    #[test]
    fn reduction_examples() {
        let s = blocks(&[[0, 2, 1, 1, 2]]);
        assert_eq!(tuples(&canonical_2_adic_reduction(&s)), vec![vec![0, 2, 1, 1, 2]]);

        let s = blocks(&[[0, 1, 1, 1, 1], [1, 1, 1, 1, 1]]);
        assert_eq!(
            tuples(&canonical_2_adic_reduction(&s)),
            vec![vec![0, 1, 1, 1, 2], vec![1, 1, 1, 1, 0]]
        );

        let s = blocks(&[[2, 2, 3, 0, 0]]);
        assert_eq!(tuples(&canonical_2_adic_reduction(&s)), vec![vec![2, 2, -1, 0, 0]]);
    }

    /// diag(1, 6): the sign of 2^1 walks down and shifts the oddity by 4.
    #[test]
    fn sign_walks_across_compartment() {
        let s = blocks(&[[0, 1, 1, 1, 1], [1, 1, 3, 1, 3]]);
        let c = canonical_2_adic_reduction(&s);
        assert_eq!(tuples(&c), vec![vec![0, 1, -1, 1, 0], vec![1, 1, 1, 1, 0]]);
        assert_eq!(canonical_2_adic_reduction(&c), c);
    }

    /// Two signs in one train cancel.
    #[test]
    fn signs_cancel_within_train() {
        let s = blocks(&[[0, 2, 3, 0, 0], [1, 1, 3, 1, 3], [2, 2, 5, 0, 0]]);
        let c = canonical_2_adic_reduction(&s);
        let dets: Vec<i8> = c.iter().map(|b| b.det).collect();
        assert_eq!(dets, vec![-1, 1, 1]);
        assert_eq!(canonical_2_adic_trains(&s), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn reduction_leaves_input_alone() {
        let s = blocks(&[[0, 1, 1, 1, 1], [1, 1, 3, 1, 3]]);
        let before = s.clone();
        let _ = canonical_2_adic_reduction(&s);
        let _ = canonical_2_adic_trains(&s);
        assert_eq!(s, before);
    }

    /// Blocks given out of order split into singleton trains and compartments.
    #[test]
    fn unordered_scales_break_trains() {
        let s = blocks(&[[3, 1, 1, 1, 1], [1, 1, 1, 1, 1], [1, 1, 3, 1, 3]]);
        assert_eq!(canonical_2_adic_trains(&s), vec![vec![0], vec![1], vec![2]]);
        assert_eq!(canonical_2_adic_compartments(&s), vec![vec![0], vec![1], vec![2]]);
        assert_eq!(canonical_2_adic_reduction(&s).len(), 3);

        let top = DyadicBlock::new(u32::MAX, 1, 1, Parity::Odd, 1).unwrap();
        let low = DyadicBlock::new(0, 1, 1, Parity::Odd, 1).unwrap();
        assert_eq!(canonical_2_adic_compartments(&[top, low]), vec![vec![0], vec![1]]);
        assert_eq!(canonical_2_adic_trains(&[top, low]), vec![vec![0], vec![1]]);
    }

    #[test]
    fn existence_conditions() {
        assert!(is_2_adic_genus(&blocks(&[[0, 2, 1, 1, 2]])));
        assert!(is_2_adic_genus(&blocks(&[[0, 1, 1, 1, 1], [1, 1, 1, 1, 1]])));
        assert!(is_2_adic_genus(&blocks(&[[0, 2, 3, 0, 0]])));
        // rank 1 with oddity different from the determinant
        assert!(!is_2_adic_genus(&blocks(&[[0, 1, 3, 1, 1]])));
        // rank 2, det 5, oddity 0
        assert!(!is_2_adic_genus(&blocks(&[[0, 2, 3, 0, 0], [1, 2, 5, 1, 0]])));
        // rank 2, det 1, oddity 4
        assert!(!is_2_adic_genus(&blocks(&[[0, 2, 1, 1, 4]])));
        // rank and oddity of different parity
        assert!(!is_2_adic_genus(&blocks(&[[0, 3, 1, 1, 2]])));
    }

    mod property_based_tests {
        use super::*;
        use proptest::prelude::*;

        fn block() -> impl Strategy<Value = (u32, usize, i8, bool, u8)> {
            (
                1u32..3,
                1usize..4,
                prop::sample::select(vec![1i8, 3, 5, 7]),
                any::<bool>(),
                0u8..8,
            )
        }

        fn symbol() -> impl Strategy<Value = Vec<DyadicBlock>> {
            prop::collection::vec(block(), 0..8).prop_map(|raw| {
                let mut scale = 0;
                raw.into_iter()
                    .map(|(gap, rank, det, odd, oddity)| {
                        scale += gap;
                        let (parity, oddity) = if odd {
                            (Parity::Odd, oddity)
                        } else {
                            (Parity::Even, 0)
                        };
                        DyadicBlock {
                            scale,
                            rank,
                            det,
                            parity,
                            oddity,
                        }
                    })
                    .collect()
            })
        }

        proptest! {
            #[test]
            fn reduction_is_idempotent(s in symbol()) {
                let once = canonical_2_adic_reduction(&s);
                prop_assert_eq!(canonical_2_adic_reduction(&once), once);
            }

            /// Every index lies in exactly one train, in order, and every
            /// compartment lies inside a single train.
            #[test]
            fn trains_partition_and_nest_compartments(s in symbol()) {
                let trains = canonical_2_adic_trains(&s);
                let flat: Vec<usize> = trains.iter().flatten().copied().collect();
                prop_assert_eq!(flat, (0..s.len()).collect::<Vec<_>>());
                for compartment in canonical_2_adic_compartments(&s) {
                    prop_assert!(trains.iter().any(|t| compartment.iter().all(|i| t.contains(i))));
                }
            }

            /// At most one negative sign per train, on its first block.
            #[test]
            fn signs_collect_at_train_start(s in symbol()) {
                let c = canonical_2_adic_reduction(&s);
                for train in canonical_2_adic_trains(&c) {
                    prop_assert!(train.iter().skip(1).all(|&i| c[i].det == 1));
                }
            }
        }
    }
}

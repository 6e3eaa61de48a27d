//! Alpha (A,B)-pair synthesis from a merged boolean footprint matrix (§4.7).

use std::collections::BTreeSet;

use crate::codec::FootprintMatrix;
use crate::types::ActivityId;

/// An ordered set of activities — a candidate side of an (A,B) place.
pub type ActivitySet = BTreeSet<ActivityId>;

/// One surviving `(A,B)` pair: every activity in `a` directly-causes every
/// activity in `b`, and `a`/`b` are each internally independent.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AlphaPair {
    /// The "before" side of the place.
    pub a: ActivitySet,
    /// The "after" side of the place.
    pub b: ActivitySet,
}

fn causality(matrix: &FootprintMatrix, i: ActivityId, j: ActivityId) -> bool {
    matrix.directly_follows(i, j) && !matrix.directly_follows(j, i)
}

fn choice(matrix: &FootprintMatrix, i: ActivityId, j: ActivityId) -> bool {
    !matrix.directly_follows(i, j) && !matrix.directly_follows(j, i)
}

/// Activities with a recorded self-loop (`F[x][x]`).
pub fn self_loops(matrix: &FootprintMatrix) -> BTreeSet<ActivityId> {
    (0..matrix.len())
        .map(|i| ActivityId(i as u32))
        .filter(|&a| matrix.directly_follows(a, a))
        .collect()
}

/// Every non-empty subset of `[0, n)` that is pairwise independent (choice
/// between every two distinct members). A singleton `{x}` is independent
/// iff `x` is not a self-loop (§4.7 step 1) — a lone self-looping activity
/// is never admitted, so it can't seed a causal pair on its own.
fn independent_subsets(
    n: usize,
    matrix: &FootprintMatrix,
    loops: &BTreeSet<ActivityId>,
) -> Vec<ActivitySet> {
    let mut subsets = Vec::new();
    for mask in 1u64..(1u64 << n) {
        let members: Vec<ActivityId> = (0..n)
            .filter(|i| mask & (1 << i) != 0)
            .map(|i| ActivityId(i as u32))
            .collect();
        if members.len() == 1 && loops.contains(&members[0]) {
            continue;
        }
        let independent = members
            .iter()
            .enumerate()
            .all(|(idx, &x)| members[idx + 1..].iter().all(|&y| choice(matrix, x, y)));
        if independent {
            subsets.push(members.into_iter().collect());
        }
    }
    subsets
}

fn all_causal(matrix: &FootprintMatrix, a: &ActivitySet, b: &ActivitySet) -> bool {
    a.iter().all(|&x| b.iter().all(|&y| causality(matrix, x, y)))
}

fn is_subset_pair(lhs: &AlphaPair, rhs: &AlphaPair) -> bool {
    lhs.a.is_subset(&rhs.a) && lhs.b.is_subset(&rhs.b)
}

/// Drop any pair that is dominated by another surviving pair (§4.7 step 3).
fn keep_maximal(pairs: Vec<AlphaPair>) -> Vec<AlphaPair> {
    pairs
        .iter()
        .enumerate()
        .filter(|(idx, pair)| {
            !pairs
                .iter()
                .enumerate()
                .any(|(other_idx, other)| other_idx != *idx && is_subset_pair(pair, other))
        })
        .map(|(_, pair)| pair.clone())
        .collect()
}

fn insert_if_maximal(pairs: &mut Vec<AlphaPair>, candidate: AlphaPair) {
    if candidate.a.is_empty() || candidate.b.is_empty() {
        return;
    }
    if pairs.iter().any(|p| is_subset_pair(&candidate, p)) {
        return;
    }
    pairs.retain(|p| !is_subset_pair(p, &candidate));
    pairs.push(candidate);
}

/// §4.7 step 4: rewrite any surviving pair that has a self-loop activity
/// *alongside other members* on one of its sides, by dropping that activity
/// from the offending side. A pair where the self-loop activity is the sole
/// occupant of a side is left untouched — it is an ordinary causal edge to
/// or from that activity, orthogonal to its self-loop; only composite sides
/// (the self-loop member plus others it's questionable to call independent
/// of) need correcting.
fn rewrite_self_loops(pairs: Vec<AlphaPair>, loops: &BTreeSet<ActivityId>) -> Vec<AlphaPair> {
    let mut survivors = pairs;
    for &x in loops {
        let mut next = Vec::new();
        for pair in survivors.drain(..) {
            let in_a = pair.a.contains(&x) && pair.a.len() > 1;
            let in_b = pair.b.contains(&x) && pair.b.len() > 1;
            if !in_a && !in_b {
                next.push(pair);
                continue;
            }
            if in_a && !in_b {
                let mut a2 = pair.a.clone();
                a2.remove(&x);
                insert_if_maximal(&mut next, AlphaPair { a: a2, b: pair.b });
            } else if in_b && !in_a {
                let mut b2 = pair.b.clone();
                b2.remove(&x);
                insert_if_maximal(&mut next, AlphaPair { a: pair.a, b: b2 });
            } else {
                let mut a2 = pair.a.clone();
                let mut b2 = pair.b.clone();
                a2.remove(&x);
                b2.remove(&x);
                if a2.is_empty() || b2.is_empty() {
                    continue; // pure (x,x) self-loop pair — not representable as a place.
                }
                insert_if_maximal(&mut next, AlphaPair { a: a2, b: b2 });
            }
        }
        survivors = next;
    }
    survivors
}

/// Run the full §4.7 synthesis: independent subsets → causal pair candidates
/// → maximality filter → self-loop rewriting.
pub fn synthesize(matrix: &FootprintMatrix) -> Vec<AlphaPair> {
    let n = matrix.len();
    let loops = self_loops(matrix);
    let independent = independent_subsets(n, matrix, &loops);

    let mut candidates = Vec::new();
    for a in &independent {
        for b in &independent {
            if all_causal(matrix, a, b) {
                candidates.push(AlphaPair {
                    a: a.clone(),
                    b: b.clone(),
                });
            }
        }
    }

    let maximal = keep_maximal(candidates);
    rewrite_self_loops(maximal, &loops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CorrelationSnapshot, FootprintRow};

    fn matrix_from_edges(n: usize, edges: &[(u32, u32)]) -> FootprintMatrix {
        let mut rows: Vec<FootprintRow> = (0..n).map(|_| FootprintRow::zeroed(n)).collect();
        for &(i, j) in edges {
            rows[i as usize].observe(ActivityId(j));
        }
        let mut matrix = FootprintMatrix::empty(n);
        for (i, row) in rows.into_iter().enumerate() {
            matrix.merge(CorrelationSnapshot {
                activity: i as u32,
                row,
                is_start: i == 0,
                is_end: false,
                seq: 1,
            });
        }
        matrix
    }

    #[test]
    fn linear_trace_yields_two_causal_pairs() {
        // A -> B -> C
        let matrix = matrix_from_edges(3, &[(0, 1), (1, 2)]);
        let pairs = synthesize(&matrix);
        let expect_ab = AlphaPair {
            a: [ActivityId(0)].into_iter().collect(),
            b: [ActivityId(1)].into_iter().collect(),
        };
        let expect_bc = AlphaPair {
            a: [ActivityId(1)].into_iter().collect(),
            b: [ActivityId(2)].into_iter().collect(),
        };
        assert!(pairs.contains(&expect_ab));
        assert!(pairs.contains(&expect_bc));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn parallel_activities_are_not_a_choice_pair() {
        // A -> B, A -> C, B -> D, C -> D, B <-> C not observed either way (parallel requires both directions)
        let matrix = matrix_from_edges(4, &[(0, 1), (0, 2), (1, 3), (2, 3), (1, 2), (2, 1)]);
        let pairs = synthesize(&matrix);
        let rejected = AlphaPair {
            a: [ActivityId(0)].into_iter().collect(),
            b: [ActivityId(1), ActivityId(2)].into_iter().collect(),
        };
        assert!(!pairs.contains(&rejected));
    }

    #[test]
    fn choice_activities_form_one_place() {
        // A -> B, A -> C, B and C never follow each other: choice
        let matrix = matrix_from_edges(3, &[(0, 1), (0, 2)]);
        let pairs = synthesize(&matrix);
        let expect = AlphaPair {
            a: [ActivityId(0)].into_iter().collect(),
            b: [ActivityId(1), ActivityId(2)].into_iter().collect(),
        };
        assert!(pairs.contains(&expect));
    }

    #[test]
    fn self_loop_activity_excluded_from_its_own_side() {
        // A -> B, B -> B, B -> C
        let matrix = matrix_from_edges(3, &[(0, 1), (1, 1), (1, 2)]);
        let pairs = synthesize(&matrix);
        assert!(self_loops(&matrix).contains(&ActivityId(1)));
        for pair in &pairs {
            if pair.a.contains(&ActivityId(1)) {
                assert!(!pair.b.contains(&ActivityId(1)));
            }
        }
    }
}

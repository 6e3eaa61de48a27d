//! Petri net assembly from surviving (A,B) pairs (§4.8).
//!
//! Full PNML is explicitly out of scope (§1); this produces a minimal,
//! deterministic textual rendering of the same structure — places,
//! transitions, arcs, and the two markings — which is all `/process_model`
//! promises (§6).

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;

use super::alpha::AlphaPair;
use crate::types::ActivityId;

/// A place: `Source`, `Sink`, or one named after the (A,B) pair it encodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Place {
    /// The single source place, holding the initial token.
    Source,
    /// The single sink place, holding the final token.
    Sink,
    /// A place for surviving pair index `idx`.
    Pair(usize),
}

impl Place {
    fn id(&self) -> String {
        match self {
            Place::Source => "source".to_string(),
            Place::Sink => "sink".to_string(),
            Place::Pair(idx) => format!("p{idx}"),
        }
    }
}

/// One labeled transition, one per activity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    /// Activity id.
    pub activity: ActivityId,
    /// Human label.
    pub name: String,
}

impl Transition {
    fn id(&self) -> String {
        format!("t{}", self.activity.0)
    }
}

/// A discovered Petri net: places, transitions, arcs, and markings (§4.8).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PetriNet {
    /// All places, `source` and `sink` first.
    pub places: Vec<Place>,
    /// One transition per activity.
    pub transitions: Vec<Transition>,
    /// Directed arcs, `(from_id, to_id)`.
    pub arcs: Vec<(String, String)>,
}

/// Assemble the net from the synthesized pairs plus the merged start/end
/// activity sets (§4.8).
pub fn assemble(
    n: usize,
    pairs: &[AlphaPair],
    start: &BTreeSet<ActivityId>,
    end: &BTreeSet<ActivityId>,
    names: &HashMap<u32, String>,
) -> PetriNet {
    let transitions: Vec<Transition> = (0..n)
        .map(|i| Transition {
            activity: ActivityId(i as u32),
            name: names
                .get(&(i as u32))
                .cloned()
                .unwrap_or_else(|| format!("activity_{i}")),
        })
        .collect();

    let mut places = vec![Place::Source, Place::Sink];
    places.extend((0..pairs.len()).map(Place::Pair));

    let mut arcs = Vec::new();
    for t in &transitions {
        if start.contains(&t.activity) {
            arcs.push((Place::Source.id(), t.id()));
        }
        if end.contains(&t.activity) {
            arcs.push((t.id(), Place::Sink.id()));
        }
    }
    for (idx, pair) in pairs.iter().enumerate() {
        let place = Place::Pair(idx).id();
        for &a in &pair.a {
            arcs.push((transitions[a.as_usize()].id(), place.clone()));
        }
        for &b in &pair.b {
            arcs.push((place.clone(), transitions[b.as_usize()].id()));
        }
    }
    arcs.sort();
    arcs.dedup();

    PetriNet {
        places,
        transitions,
        arcs,
    }
}

impl PetriNet {
    /// Render a deterministic textual description: the minimal shape
    /// `/process_model` needs, not a full PNML document (§1, §6).
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "places: {}", self.places.iter().map(Place::id).collect::<Vec<_>>().join(", "));
        let _ = writeln!(
            out,
            "transitions: {}",
            self.transitions
                .iter()
                .map(|t| format!("{}({})", t.id(), t.name))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let _ = writeln!(
            out,
            "arcs: {}",
            self.arcs
                .iter()
                .map(|(from, to)| format!("{from}->{to}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let _ = writeln!(out, "initial: source");
        let _ = write!(out, "final: sink");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_event_case_has_only_source_and_sink() {
        let start: BTreeSet<ActivityId> = [ActivityId(0)].into_iter().collect();
        let end: BTreeSet<ActivityId> = [ActivityId(0)].into_iter().collect();
        let names = HashMap::from([(0, "A".to_string())]);
        let net = assemble(1, &[], &start, &end, &names);
        assert_eq!(net.places.len(), 2);
        assert!(net.arcs.contains(&("source".to_string(), "t0".to_string())));
        assert!(net.arcs.contains(&("t0".to_string(), "sink".to_string())));
    }

    #[test]
    fn pair_gets_arcs_both_sides() {
        let pair = AlphaPair {
            a: [ActivityId(0)].into_iter().collect(),
            b: [ActivityId(1)].into_iter().collect(),
        };
        let start: BTreeSet<ActivityId> = [ActivityId(0)].into_iter().collect();
        let end: BTreeSet<ActivityId> = [ActivityId(1)].into_iter().collect();
        let names = HashMap::new();
        let net = assemble(2, &[pair], &start, &end, &names);
        assert!(net.places.contains(&Place::Pair(0)));
        assert!(net.arcs.contains(&("t0".to_string(), "p0".to_string())));
        assert!(net.arcs.contains(&("p0".to_string(), "t1".to_string())));
    }
}

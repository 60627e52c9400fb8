//! Rewrite rules of the canonicalization engine.
use crate::graph::{Composite, Computation, Identity, Operator, Variable};
use std::collections::{BTreeSet, HashSet};

fn composite<O: Operator, V: Variable>(members: Vec<Computation<O, V>>) -> Computation<O, V> {
    Computation::Composite(Composite::raw(members))
}

/// Merges every identity member into one, minus the values some other member
/// produces. The identity vanishes when nothing is left to pass through.
pub(super) fn remove_identity<O: Operator, V: Variable>(
    comp: &Composite<O, V>,
) -> Option<Computation<O, V>> {
    let (identities, others): (Vec<_>, Vec<_>) = comp
        .members()
        .iter()
        .partition(|m| matches!(m, Computation::Identity(_)));
    if identities.is_empty() {
        return None;
    }

    let produced: HashSet<V> = others.iter().flat_map(|o| o.outputs()).collect();
    let kept: BTreeSet<V> = identities
        .iter()
        .flat_map(|m| match m {
            Computation::Identity(identity) => identity.values().to_vec(),
            _ => Vec::new(),
        })
        .filter(|v| !produced.contains(v))
        .collect();

    if let [Computation::Identity(only)] = identities.as_slice() {
        if only.values().len() == kept.len() && only.values().iter().all(|v| kept.contains(v)) {
            return None;
        }
    }

    let mut members: Vec<Computation<O, V>> = others.into_iter().cloned().collect();
    if !kept.is_empty() {
        members.push(Computation::Identity(Identity::from_parts(kept.into_iter().collect())));
    }
    Some(composite(members))
}

/// Splices the members of nested composites into the parent, one level deep.
pub(super) fn flatten<O: Operator, V: Variable>(
    comp: &Composite<O, V>,
) -> Option<Computation<O, V>> {
    if !comp.members().iter().any(|m| m.as_composite().is_some()) {
        return None;
    }
    let members = comp
        .members()
        .iter()
        .flat_map(|m| match m {
            Computation::Composite(inner) => inner.members().to_vec(),
            leaf => vec![leaf.clone()],
        })
        .collect();
    Some(composite(members))
}

/// A composite of one member is that member.
pub(super) fn unpack<O: Operator, V: Variable>(
    comp: &Composite<O, V>,
) -> Option<Computation<O, V>> {
    match comp.members() {
        [single] => Some(single.clone()),
        _ => None,
    }
}

/// Orders members by their structure (variant, operation, inputs, outputs).
pub(super) fn sort<O: Operator, V: Variable>(comp: &Composite<O, V>) -> Option<Computation<O, V>> {
    let members = comp.members();
    if members.windows(2).all(|pair| pair[0] <= pair[1]) {
        return None;
    }
    let mut sorted = members.to_vec();
    sorted.sort();
    Some(composite(sorted))
}

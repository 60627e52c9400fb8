//! A composite computation: an ordered collection of leaf computations whose
//! aggregate inputs and outputs are derived from its members.

use super::node::Computation;
use super::term::{Operator, Variable};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::hash::Hash;

/// Members are kept in canonical form; see [`Computation::compose`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Composite<O, V> {
    members: Vec<Computation<O, V>>,
}

impl<O: Operator, V: Variable> Composite<O, V> {
    /// Wraps a member list without canonicalizing it. Only the rewrite engine
    /// may observe the result.
    pub(crate) fn raw(members: Vec<Computation<O, V>>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[Computation<O, V>] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Values read by some member and written by none, in first-seen order.
    pub fn inputs(&self) -> Vec<V> {
        derived_io(&self.members).0
    }

    /// Values written by some member and read by none, in first-seen order.
    pub fn outputs(&self) -> Vec<V> {
        derived_io(&self.members).1
    }

    /// `{A: {Bs}}` such that A must run before each of the Bs.
    pub fn dag_io(&self) -> BTreeMap<&Computation<O, V>, BTreeSet<&Computation<O, V>>> {
        self.collect_dag(self.successors())
    }

    /// `{A: {Bs}}` such that A requires each of the Bs to have run.
    pub fn dag_oi(&self) -> BTreeMap<&Computation<O, V>, BTreeSet<&Computation<O, V>>> {
        let mut predecessors = vec![Vec::new(); self.members.len()];
        for (a, succ) in self.successors().into_iter().enumerate() {
            for b in succ {
                predecessors[b].push(a);
            }
        }
        self.collect_dag(predecessors)
    }

    /// For each member index, the indices of the members reading one of its
    /// outputs. A member never depends on itself.
    ///
    /// Pairwise intersection, quadratic in the member count.
    pub(crate) fn successors(&self) -> Vec<Vec<usize>> {
        let outputs: Vec<HashSet<V>> = self
            .members
            .iter()
            .map(|m| m.outputs().into_iter().collect())
            .collect();
        let inputs: Vec<Vec<V>> = self.members.iter().map(|m| m.inputs()).collect();

        outputs
            .iter()
            .enumerate()
            .map(|(a, produced)| {
                inputs
                    .iter()
                    .enumerate()
                    .filter(|&(b, consumed)| a != b && consumed.iter().any(|v| produced.contains(v)))
                    .map(|(b, _)| b)
                    .collect()
            })
            .collect()
    }

    fn collect_dag(
        &self,
        adjacency: Vec<Vec<usize>>,
    ) -> BTreeMap<&Computation<O, V>, BTreeSet<&Computation<O, V>>> {
        adjacency
            .into_iter()
            .enumerate()
            .map(|(a, linked)| {
                let linked = linked.into_iter().map(|b| &self.members[b]).collect();
                (&self.members[a], linked)
            })
            .collect()
    }
}

/// Aggregate `(inputs, outputs)` of a member list.
///
/// inputs = (all member inputs) minus (all member outputs), outputs the
/// converse; both deduplicated in first-seen order.
pub(crate) fn derived_io<O: Operator, V: Variable>(members: &[Computation<O, V>]) -> (Vec<V>, Vec<V>) {
    let all_in: Vec<V> = unique(members.iter().flat_map(|m| m.inputs())).collect();
    let all_out: Vec<V> = unique(members.iter().flat_map(|m| m.outputs())).collect();
    let in_set: HashSet<&V> = all_in.iter().collect();
    let out_set: HashSet<&V> = all_out.iter().collect();

    let inputs = all_in.iter().filter(|v| !out_set.contains(v)).cloned().collect();
    let outputs = all_out.iter().filter(|v| !in_set.contains(v)).cloned().collect();
    (inputs, outputs)
}

/// Yields each item once, in first-seen order.
pub fn unique<T, I>(items: I) -> impl Iterator<Item = T>
where
    T: Hash + Eq + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(move |item| seen.insert(item.clone()))
}

impl<O: fmt::Display, V: fmt::Display> fmt::Display for Composite<O, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[[")?;
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", member)?;
        }
        f.write_str("]]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Comp = Computation<&'static str, &'static str>;

    fn comp(op: &'static str, ins: &[&'static str], outs: &[&'static str]) -> Comp {
        Computation::op(op, ins.iter().copied(), outs.iter().copied()).unwrap()
    }

    #[test]
    fn test_unique_keeps_first_seen_order() {
        let items: Vec<_> = unique([1, 3, 1, 2]).collect();
        assert_eq!(items, vec![1, 3, 2]);
    }

    #[test]
    fn test_composite_io() {
        let add = comp("add", &["a", "b", "c"], &["d"]);
        let mul = comp("mul", &["d", "e"], &["f"]);
        let c = Computation::compose([add.clone(), mul.clone()]);

        assert_eq!(c.inputs(), vec!["a", "b", "c", "e"]);
        assert_eq!(c.outputs(), vec!["f"]);

        let edges: Vec<_> = c.edges().collect();
        assert_eq!(edges.len(), 7);

        let vars: HashSet<_> = c.variables().copied().collect();
        assert_eq!(vars, HashSet::from(["a", "b", "c", "d", "e", "f"]));
        assert_eq!(c.variables().count(), 6);
    }

    #[test]
    fn test_composite_dag() {
        let add = comp("add", &["a", "b", "c"], &["d"]);
        let mul = comp("mul", &["d", "e"], &["f"]);
        let c = Computation::compose([add.clone(), mul.clone()]);
        let composite = c.as_composite().unwrap();

        let io = composite.dag_io();
        assert_eq!(io[&add], BTreeSet::from([&mul]));
        assert!(io[&mul].is_empty());

        let oi = composite.dag_oi();
        assert_eq!(oi[&mul], BTreeSet::from([&add]));
        assert!(oi[&add].is_empty());
    }

    #[test]
    fn test_identity_has_no_self_dependency() {
        let id = Comp::identity(["e"]).unwrap();
        let foo = comp("foo", &["d"], &["f"]);
        let c = Computation::compose([id.clone(), foo]);
        let io = c.as_composite().unwrap().dag_io();
        assert!(io[&id].is_empty());
    }

    #[test]
    fn test_display() {
        let c = Computation::compose([comp("b", &["x"], &["y"]), comp("a", &["y"], &["z"])]);
        assert_eq!(c.to_string(), "[[[y] -> a -> [z], [x] -> b -> [y]]]");
    }
}

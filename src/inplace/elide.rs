//! Stage 3: copy elision.
//!
//! The following changes
//! ```text
//! In:  a -> Copy -> b -> A -> c
//! Out: a -> A -> c
//! ```
//! The following does not change
//! ```text
//! In:  a -> Copy -> b -> A -> c
//!        ->  B   -> d
//! ```

use super::token::ExprToken;
use super::tokenize::{is_copy, TokenComputation};
use crate::error::Result;
use crate::graph::{Operator, Variable};
use log::debug;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Removes every copy that is the only reader of its source, rewiring the
/// copy's readers to the source itself.
///
/// Readers are counted over the whole composite each time this runs, never
/// cached, since the same node may appear in several compilations.
pub fn elide_copies<O: Operator, V: Variable>(
    comp: &TokenComputation<O, V>,
) -> Result<TokenComputation<O, V>> {
    let schedule = comp.toposort()?;
    let readers = readers(&schedule);

    let mut removed = HashSet::new();
    let mut table: HashMap<ExprToken<V>, ExprToken<V>> = HashMap::new();
    for users in readers.values() {
        if users.len() != 1 {
            continue;
        }
        let Some(&only) = users.first() else {
            continue;
        };
        let member = schedule[only];
        if is_copy(member) && removed.insert(only) {
            let source = member.inputs().remove(0);
            let scratch = member.outputs().remove(0);
            table.insert(scratch, source);
        }
    }

    debug!(
        "elide_copies: removed {} of {} members",
        removed.len(),
        schedule.len()
    );
    let members = schedule
        .iter()
        .enumerate()
        .filter(|(i, _)| !removed.contains(i))
        .map(|(_, m)| m.substitute(&table));
    Ok(TokenComputation::compose(members))
}

/// For each token, the schedule positions of the members reading it.
pub fn readers<O: Operator, V: Variable>(
    schedule: &[&TokenComputation<O, V>],
) -> HashMap<ExprToken<V>, BTreeSet<usize>> {
    let mut readers: HashMap<ExprToken<V>, BTreeSet<usize>> = HashMap::new();
    for (i, member) in schedule.iter().enumerate() {
        for input in member.inputs() {
            readers.entry(input).or_default().insert(i);
        }
    }
    readers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Computation, InplaceMap};
    use crate::inplace::purify::purify;
    use crate::inplace::token::Tokenizer;
    use crate::inplace::tokenize::{tokenize, Step};

    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
    enum Op {
        Inc,
        Neg,
        Sum,
    }
    impl Operator for Op {
        fn inplace(&self) -> InplaceMap {
            match self {
                Op::Inc => InplaceMap::from([(0, 0)]),
                _ => InplaceMap::new(),
            }
        }
    }

    fn purified(graph: Computation<Op, &'static str>) -> TokenComputation<Op, &'static str> {
        let mut tok = Tokenizer::new();
        let t = tokenize(&graph, &mut tok).unwrap();
        purify(&t, &mut tok).unwrap()
    }

    fn copies(comp: &TokenComputation<Op, &'static str>) -> usize {
        comp.members().iter().filter(|m| is_copy(m)).count()
    }

    #[test]
    fn test_single_reader_copy_is_removed() {
        let graph = Computation::op(Op::Inc, ["a"], ["b"]).unwrap()
            + Computation::op(Op::Neg, ["b"], ["c"]).unwrap();
        let p = purified(graph);
        assert_eq!(copies(&p), 1);

        let e = elide_copies(&p).unwrap();
        assert_eq!(copies(&e), 0);
        let inc = e
            .members()
            .iter()
            .find(|m| matches!(m, Computation::Op(n) if *n.op() == Step::Op(Op::Inc)))
            .unwrap();
        assert_eq!(inc.inputs(), vec![ExprToken::new("a", "a")]);
        assert_eq!(e.inputs(), p.inputs());
        assert_eq!(e.outputs(), p.outputs());
    }

    #[test]
    fn test_fan_out_copy_is_kept() {
        let graph = Computation::op(Op::Inc, ["a"], ["b"]).unwrap()
            + Computation::op(Op::Neg, ["a"], ["c"]).unwrap();
        let p = purified(graph);
        let e = elide_copies(&p).unwrap();
        assert_eq!(e, p);

        // Every surviving copy's source still has another reader.
        let schedule = e.toposort().unwrap();
        let readers = readers(&schedule);
        for copy in e.members().iter().filter(|m| is_copy(m)) {
            assert!(readers[&copy.inputs()[0]].len() >= 2);
        }
    }

    #[test]
    fn test_counts_are_per_composite() {
        // The same in-place node is elided alone and kept when its input fans out.
        let inc = Computation::op(Op::Inc, ["a"], ["b"]).unwrap();
        let alone = elide_copies(&purified(inc.clone())).unwrap();
        assert_eq!(copies(&alone), 0);

        let shared = inc + Computation::op(Op::Sum, ["a", "x"], ["y"]).unwrap();
        let kept = elide_copies(&purified(shared)).unwrap();
        assert_eq!(copies(&kept), 1);
    }
}

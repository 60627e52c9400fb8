//! Stage 2: defensive copies.
//!
//! An in-place node overwrites the storage of some of its inputs. Another
//! member may still need those values, so each overwritten input is first
//! copied into fresh scratch storage and the node is rewired to consume the
//! copy instead. Afterwards every in-place write lands on storage that only
//! the writing node reads.

use super::token::{ExprToken, Tokenizer};
use super::tokenize::{Step, TokenComputation};
use crate::error::Result;
use crate::graph::{Computation, InplaceMap, OpComp, Operator, Variable};
use smallvec::smallvec;
use std::collections::HashMap;

type TokenOp<O, V> = OpComp<Step<O>, ExprToken<V>>;

/// Inserts the copies every in-place member needs. Pure members are untouched.
pub fn purify<O: Operator, V: Variable>(
    comp: &TokenComputation<O, V>,
    tokenizer: &mut Tokenizer<V>,
) -> Result<TokenComputation<O, V>> {
    match comp {
        Computation::Composite(composite) => {
            let members = composite
                .members()
                .iter()
                .map(|m| purify_one(m, tokenizer))
                .collect::<Result<Vec<_>>>()?;
            Ok(Computation::compose(members))
        }
        leaf => purify_one(leaf, tokenizer),
    }
}

fn purify_one<O: Operator, V: Variable>(
    comp: &TokenComputation<O, V>,
    tokenizer: &mut Tokenizer<V>,
) -> Result<TokenComputation<O, V>> {
    let Computation::Op(node) = comp else {
        return Ok(comp.clone());
    };
    let copies = copies_one(node, tokenizer)?;
    if copies.is_empty() {
        return Ok(comp.clone());
    }

    let replaced: HashMap<&ExprToken<V>, &ExprToken<V>> = copies
        .iter()
        .map(|cp| (&cp.inputs()[0], &cp.outputs()[0]))
        .collect();
    let inputs = node
        .inputs()
        .iter()
        .map(|i| (*replaced.get(i).unwrap_or(&i)).clone())
        .collect();
    let rewired = OpComp::from_parts(
        node.op().clone(),
        inputs,
        node.outputs().iter().cloned().collect(),
        node.inplace().clone(),
    );

    let members = std::iter::once(Computation::Op(rewired)).chain(copies.into_iter().map(Computation::Op));
    Ok(Computation::compose(members))
}

/// One copy per in-place output, reading the input it would overwrite.
fn copies_one<O: Operator, V: Variable>(
    node: &TokenOp<O, V>,
    tokenizer: &mut Tokenizer<V>,
) -> Result<Vec<TokenOp<O, V>>> {
    node.inplace()
        .iter()
        .map(|(&k, &v)| -> Result<TokenOp<O, V>> {
            let input = &node.inputs()[v];
            let output = &node.outputs()[k];
            let requested = (!input.is_anonymous()).then_some(input.token.as_str());
            let name = tokenizer.name_of_copy(&input.expr, &output.expr, requested)?;
            let scratch = ExprToken::new(input.expr.clone(), name);
            Ok(OpComp::from_parts(
                Step::Copy,
                smallvec![input.clone()],
                smallvec![scratch],
                InplaceMap::new(),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inplace::tokenize::{is_copy, tokenize};

    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
    enum Op {
        Inc,
        Neg,
    }
    impl Operator for Op {
        fn inplace(&self) -> InplaceMap {
            match self {
                Op::Inc => InplaceMap::from([(0, 0)]),
                Op::Neg => InplaceMap::new(),
            }
        }
    }

    #[test]
    fn test_pure_node_is_untouched() {
        let mut tok = Tokenizer::new();
        let t = tokenize(&Computation::op(Op::Neg, ["a"], ["b"]).unwrap(), &mut tok).unwrap();
        assert_eq!(purify(&t, &mut tok).unwrap(), t);
    }

    #[test]
    fn test_inplace_node_reads_scratch_copy() {
        let mut tok = Tokenizer::new();
        let inc = Computation::op(Op::Inc, ["a"], ["b"]).unwrap();
        let neg = Computation::op(Op::Neg, ["a"], ["c"]).unwrap();
        let t = tokenize(&(inc + neg), &mut tok).unwrap();
        let p = purify(&t, &mut tok).unwrap();

        let members = p.members();
        assert_eq!(members.len(), 3);
        let copy = members.iter().find(|m| is_copy(m)).unwrap();
        assert_eq!(copy.inputs(), vec![ExprToken::new("a", "a")]);
        assert_eq!(copy.outputs(), vec![ExprToken::new("a", "a_2")]);

        let writer = members.iter().find(|m| m.inplace().map_or(false, |map| !map.is_empty())).unwrap();
        assert_eq!(writer.inputs(), copy.outputs());

        // Nobody but the writer reads the storage it overwrites.
        let overwritten = &writer.inputs()[0];
        let readers = members.iter().filter(|m| m.inputs().contains(overwritten)).count();
        assert_eq!(readers, 1);
    }
}

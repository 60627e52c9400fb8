//! Stage 1: from mathematical values to storage tokens.

use super::token::{ExprToken, Tokenizer};
use crate::error::Result;
use crate::graph::{Computation, Identity, InplaceMap, OpComp, Operator, Slots, Variable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The operation tag of a tokenized computation: a user operation, or the
/// copy the compiler inserts to protect storage from in-place writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step<O> {
    Op(O),
    Copy,
}

impl<O: Operator> Operator for Step<O> {
    fn inplace(&self) -> InplaceMap {
        match self {
            Step::Op(op) => op.inplace(),
            Step::Copy => InplaceMap::new(),
        }
    }
}

impl<O: fmt::Display> fmt::Display for Step<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Op(op) => write!(f, "{}", op),
            Step::Copy => f.write_str("Copy"),
        }
    }
}

/// A computation over storage tokens.
pub type TokenComputation<O, V> = Computation<Step<O>, ExprToken<V>>;

/// True for the compiler's copy nodes.
pub fn is_copy<O: Operator, V: Variable>(comp: &TokenComputation<O, V>) -> bool {
    matches!(comp, Computation::Op(node) if *node.op() == Step::Copy)
}

/// Replaces every value by its token, carrying each node's in-place map.
///
/// The same `tokenizer` must be used for the whole compilation so that a value
/// maps to one storage name everywhere.
pub fn tokenize<O: Operator, V: Variable>(
    comp: &Computation<O, V>,
    tokenizer: &mut Tokenizer<V>,
) -> Result<TokenComputation<O, V>> {
    match comp {
        Computation::Op(node) => {
            let inputs = tokens(node.inputs(), tokenizer)?;
            let outputs = tokens(node.outputs(), tokenizer)?;
            Ok(Computation::Op(OpComp::from_parts(
                Step::Op(node.op().clone()),
                inputs,
                outputs,
                node.inplace().clone(),
            )))
        }
        Computation::Identity(node) => Ok(Computation::Identity(Identity::from_parts(tokens(
            node.values(),
            tokenizer,
        )?))),
        Computation::Composite(composite) => {
            let members = composite
                .members()
                .iter()
                .map(|m| tokenize(m, tokenizer))
                .collect::<Result<Vec<_>>>()?;
            Ok(Computation::compose(members))
        }
    }
}

fn tokens<V: Variable>(values: &[V], tokenizer: &mut Tokenizer<V>) -> Result<Slots<ExprToken<V>>> {
    values.iter().map(|v| tokenizer.token(v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
    struct Inc;
    impl Operator for Inc {
        fn inplace(&self) -> InplaceMap {
            InplaceMap::from([(0, 0)])
        }
    }

    #[test]
    fn test_tokenize_shares_names_across_members() {
        let a = Computation::op("add", ["a", "b"], ["c"]).unwrap();
        let m = Computation::op("mul", ["c", "a"], ["d"]).unwrap();
        let mut tok = Tokenizer::new();
        let t = tokenize(&(a + m), &mut tok).unwrap();

        let members = t.members();
        assert_eq!(members.len(), 2);
        let add = members.iter().find(|m| m.to_string().contains("add")).unwrap();
        let mul = members.iter().find(|m| m.to_string().contains("mul")).unwrap();
        assert_eq!(add.outputs()[0], mul.inputs()[0]);
        assert_eq!(add.inputs()[0], mul.inputs()[1]);
        assert_eq!(add.inputs()[0], ExprToken::new("a", "a"));
        assert_eq!(tok.len(), 4);
    }

    #[test]
    fn test_tokenize_carries_inplace_map() {
        let node = Computation::op(Inc, ["x"], ["y"]).unwrap();
        let t = tokenize(&node, &mut Tokenizer::new()).unwrap();
        assert_eq!(t.inplace(), Some(&InplaceMap::from([(0, 0)])));
        assert!(!is_copy(&t));
    }

    #[test]
    fn test_copy_step_is_pure() {
        assert!(Step::<Inc>::Copy.inplace().is_empty());
        assert_eq!(Step::Op(Inc).inplace(), InplaceMap::from([(0, 0)]));
        assert_eq!(Step::<&str>::Copy.to_string(), "Copy");
    }
}

//! Stage 4: aliasing resolution, and the safety check over its result.

use super::token::ExprToken;
use super::tokenize::TokenComputation;
use crate::error::{GraphError, Result};
use crate::graph::{Computation, Operator, Variable};
use std::collections::HashMap;

/// Renames each in-place output to the storage of the input it overwrites.
///
/// Walks the schedule once. Renames are collected in a table that grows as
/// in-place nodes are met and is applied to every node when it is reached, so
/// later readers of an output see the shared storage name.
pub fn resolve_aliases<O: Operator, V: Variable>(
    comp: &TokenComputation<O, V>,
) -> Result<Vec<TokenComputation<O, V>>> {
    let schedule = comp.toposort()?;
    let mut table: HashMap<ExprToken<V>, ExprToken<V>> = HashMap::new();
    let mut resolved = Vec::with_capacity(schedule.len());

    for member in schedule {
        let mut node = member.substitute(&table);
        let renames = alias_renames(&node);
        if !renames.is_empty() {
            node = node.substitute(&renames);
            table.extend(renames);
        }
        resolved.push(node);
    }
    Ok(resolved)
}

fn alias_renames<O: Operator, V: Variable>(
    node: &TokenComputation<O, V>,
) -> HashMap<ExprToken<V>, ExprToken<V>> {
    let Computation::Op(op) = node else {
        return HashMap::new();
    };
    op.inplace()
        .iter()
        .map(|(&k, &v)| {
            let output = &op.outputs()[k];
            let shared = ExprToken::new(output.expr.clone(), op.inputs()[v].token.clone());
            (output.clone(), shared)
        })
        .collect()
}

/// Checks that no member of `schedule` reads a value whose storage an earlier
/// member has overwritten with something else.
pub fn verify_schedule<O: Operator, V: Variable>(schedule: &[TokenComputation<O, V>]) -> Result<()> {
    // storage name -> value it currently holds
    let mut live: HashMap<String, V> = HashMap::new();
    for member in schedule {
        for input in member.inputs() {
            match live.get(&input.token) {
                Some(held) if *held != input.expr => {
                    return Err(GraphError::ClobberedRead {
                        node: format!("{:?}", member),
                        token: format!("{:?}", input),
                    });
                }
                Some(_) => {}
                None => {
                    live.insert(input.token, input.expr);
                }
            }
        }
        for output in member.outputs() {
            live.insert(output.token, output.expr);
        }
    }
    Ok(())
}

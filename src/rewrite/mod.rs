//! The canonicalization engine.
//!
//! A composite is rewritten by a fixed list of rules until none applies. Rules
//! are tried in order; after the first one that changes the graph, the scan
//! restarts from the top. Every rule strictly shrinks the measure
//! (identity values, nesting depth, member count, disorder), so the loop
//! terminates and the result does not depend on how the composite was built.

mod rules;

use crate::graph::{Composite, Computation, Operator, Variable};
use log::trace;

/// A rewrite of a composite. `None` means the rule does not apply.
pub type Rule<O, V> = fn(&Composite<O, V>) -> Option<Computation<O, V>>;

fn rule_set<O: Operator, V: Variable>() -> [(&'static str, Rule<O, V>); 4] {
    [
        ("remove_identity", rules::remove_identity::<O, V>),
        ("flatten", rules::flatten::<O, V>),
        ("unpack", rules::unpack::<O, V>),
        ("sort", rules::sort::<O, V>),
    ]
}

/// Rewrites `comp` to its normal form. Leaves are returned unchanged.
pub fn canonicalize<O: Operator, V: Variable>(comp: Computation<O, V>) -> Computation<O, V> {
    let rules = rule_set::<O, V>();
    let mut current = comp;
    let mut rewrites = 0usize;

    'exhaust: loop {
        let Computation::Composite(composite) = &current else {
            break;
        };
        for (name, rule) in &rules {
            if let Some(next) = rule(composite) {
                rewrites += 1;
                trace!("canonicalize: rule '{}' applied (rewrite #{})", name, rewrites);
                current = next;
                continue 'exhaust;
            }
        }
        break;
    }
    current
}

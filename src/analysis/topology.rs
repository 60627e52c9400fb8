use crate::error::{GraphError, Result};
use crate::graph::{Computation, Operator, Variable};
use std::collections::BTreeSet;

/// Performs a Topological Sort using Kahn's Algorithm.
///
/// Returns the members of `comp` such that every producer appears before each of
/// its consumers. A leaf computation sorts to itself.
///
/// When several members are ready at once, the one that comes first in the
/// composite's canonical order is scheduled first, so the result is
/// reproducible for equal composites.
pub fn sort<O: Operator, V: Variable>(comp: &Computation<O, V>) -> Result<Vec<&Computation<O, V>>> {
    let Computation::Composite(composite) = comp else {
        return Ok(vec![comp]);
    };
    let members = composite.members();
    let successors = composite.successors();
    let count = members.len();

    // 1. Initialize In-Degrees
    let mut in_degree = vec![0usize; count];
    for succ in &successors {
        for &b in succ {
            in_degree[b] += 1;
        }
    }
    let mut ready: BTreeSet<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(count);

    // 2. Eliminate
    while let Some(node) = ready.pop_first() {
        order.push(&members[node]);
        for &child in &successors[node] {
            in_degree[child] -= 1;
            if in_degree[child] == 0 {
                ready.insert(child);
            }
        }
    }

    if order.len() != count {
        return Err(GraphError::CycleDetected {
            remaining: count - order.len(),
        });
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Composite;
    use rstest::rstest;

    type Comp = Computation<&'static str, &'static str>;

    fn comp(op: &'static str, ins: &[&'static str], outs: &[&'static str]) -> Comp {
        Computation::op(op, ins.iter().copied(), outs.iter().copied()).unwrap()
    }

    fn position(order: &[&Comp], node: &Comp) -> usize {
        order.iter().position(|&x| x == node).unwrap()
    }

    #[test]
    fn test_sort_chain() {
        let add = comp("add", &["a", "b", "c"], &["d"]);
        let mul = comp("mul", &["d", "e"], &["f"]);
        let c = Computation::compose([mul.clone(), add.clone()]);
        assert_eq!(sort(&c).unwrap(), vec![&add, &mul]);
    }

    #[test]
    fn test_sort_multi_output() {
        let mm = comp("minmax", &["a", "b"], &["d", "e"]);
        let foo = comp("foo", &["d"], &["f"]);
        let bar = comp("bar", &["a", "f"], &["g", "h"]);
        let c = Computation::compose([mm.clone(), foo.clone(), bar.clone()]);
        assert_eq!(sort(&c).unwrap(), vec![&mm, &foo, &bar]);
    }

    #[rstest]
    #[case(["top", "left", "right", "bottom"])]
    #[case(["bottom", "right", "left", "top"])]
    #[case(["left", "bottom", "top", "right"])]
    fn test_sort_diamond_dependency(#[case] names: [&'static str; 4]) {
        // Shape: A -> B, A -> C, B+C -> D
        let node = |name: &'static str| match name {
            "top" => comp("top", &["x"], &["a"]),
            "left" => comp("left", &["a"], &["b"]),
            "right" => comp("right", &["a"], &["c"]),
            _ => comp("bottom", &["b", "c"], &["d"]),
        };
        let c = Computation::compose(names.iter().map(|&n| node(n)));
        let res = sort(&c).expect("Sort failed");

        let (top, left, right, bottom) = (node("top"), node("left"), node("right"), node("bottom"));
        assert!(position(&res, &top) < position(&res, &left));
        assert!(position(&res, &top) < position(&res, &right));
        assert!(position(&res, &left) < position(&res, &bottom));
        assert!(position(&res, &right) < position(&res, &bottom));
        // Ties broken by canonical order, independent of construction order.
        assert!(position(&res, &left) < position(&res, &right));
    }

    #[test]
    fn test_every_dag_edge_is_respected() {
        let c = Computation::compose([
            comp("p", &["a"], &["b", "c"]),
            comp("q", &["b"], &["d"]),
            comp("r", &["c", "d"], &["e"]),
            comp("s", &["a", "e"], &["f"]),
        ]);
        let order = sort(&c).unwrap();
        for (a, bs) in c.as_composite().unwrap().dag_io() {
            for b in bs {
                assert!(position(&order, a) < position(&order, b));
            }
        }
    }

    #[test]
    fn test_cycle_detection() {
        let a = comp("a", &["x"], &["y"]);
        let b = comp("b", &["y"], &["x"]);
        let c = Computation::compose([a, b]);
        let err = sort(&c).unwrap_err();
        assert!(matches!(err, GraphError::CycleDetected { remaining: 2 }));
        assert!(err.to_string().contains("Cycle detected"), "Msg: {}", err);
    }

    #[test]
    fn test_empty_composite_sorts_to_nothing() {
        let c: Comp = Computation::Composite(Composite::raw(Vec::new()));
        assert!(sort(&c).unwrap().is_empty());
    }
}

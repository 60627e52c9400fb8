//! Graphviz export of computation graphs. A debugging aid only.

use crate::graph::{Computation, Edge, Operator, Variable};
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::fmt::Display;

/// Renders `comp` as DOT: one node per value, one per leaf computation, and an
/// arc per read or write.
pub fn to_dot<O, V>(comp: &Computation<O, V>) -> String
where
    O: Operator + Display,
    V: Variable + Display,
{
    let mut graph: DiGraph<String, &str> = DiGraph::new();
    let mut values: HashMap<&V, NodeIndex> = HashMap::new();

    for member in comp.members() {
        let node = graph.add_node(label(member));
        for edge in member.edges() {
            match edge {
                Edge::Input(value, _) => {
                    let v = *values.entry(value).or_insert_with(|| graph.add_node(value.to_string()));
                    graph.add_edge(v, node, "");
                }
                Edge::Output(_, value) => {
                    let v = *values.entry(value).or_insert_with(|| graph.add_node(value.to_string()));
                    graph.add_edge(node, v, "");
                }
            }
        }
    }

    format!("{}", Dot::with_config(&graph, &[Config::EdgeNoLabel]))
}

fn label<O: Operator + Display, V: Variable>(member: &Computation<O, V>) -> String {
    match member {
        Computation::Op(node) => node.op().to_string(),
        Computation::Identity(_) => "Identity".to_string(),
        Computation::Composite(_) => "Composite".to_string(),
    }
}

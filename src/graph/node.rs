//! Defines `Computation`, the node type of the dataflow graph, and its leaf variants.

use super::composite::{unique, Composite};
use super::term::{InplaceMap, Operator, Variable};
use crate::error::{GraphError, Result, SlotKind};
use crate::rewrite;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Add;

/// Ordered input or output list of a node.
pub type Slots<V> = SmallVec<[V; 4]>;

/// A single operation reading `inputs` and producing `outputs`.
///
/// The in-place map is read from the operation once, at construction, and is
/// part of the node's identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpComp<O, V> {
    op: O,
    inputs: Slots<V>,
    outputs: Slots<V>,
    inplace: InplaceMap,
}

impl<O: Operator, V: Variable> OpComp<O, V> {
    /// Builds a node, querying `op` for its in-place map.
    pub fn new(
        op: O,
        inputs: impl IntoIterator<Item = V>,
        outputs: impl IntoIterator<Item = V>,
    ) -> Result<Self> {
        let inplace = op.inplace();
        Self::with_inplace(op, inputs, outputs, inplace)
    }

    /// Builds a node with an explicit in-place map.
    pub fn with_inplace(
        op: O,
        inputs: impl IntoIterator<Item = V>,
        outputs: impl IntoIterator<Item = V>,
        inplace: InplaceMap,
    ) -> Result<Self> {
        let node = Self::from_parts(
            op,
            inputs.into_iter().collect(),
            outputs.into_iter().collect(),
            inplace,
        );
        check_unique(&node.inputs, SlotKind::Input, &node.op)?;
        check_unique(&node.outputs, SlotKind::Output, &node.op)?;
        for (&output, &input) in &node.inplace {
            if output >= node.outputs.len() || input >= node.inputs.len() {
                return Err(GraphError::InplaceSlotOutOfRange {
                    node: format!("{:?}", node.op),
                    output,
                    input,
                    outputs: node.outputs.len(),
                    inputs: node.inputs.len(),
                });
            }
        }
        Ok(node)
    }

    /// Rebuilds a node from parts that are already known to be consistent.
    pub(crate) fn from_parts(
        op: O,
        inputs: Slots<V>,
        outputs: Slots<V>,
        inplace: InplaceMap,
    ) -> Self {
        Self {
            op,
            inputs,
            outputs,
            inplace,
        }
    }

    pub fn op(&self) -> &O {
        &self.op
    }

    pub fn inputs(&self) -> &[V] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[V] {
        &self.outputs
    }

    pub fn inplace(&self) -> &InplaceMap {
        &self.inplace
    }

    fn substitute(&self, table: &HashMap<V, V>) -> Self {
        Self::from_parts(
            self.op.clone(),
            substitute_slots(&self.inputs, table),
            substitute_slots(&self.outputs, table),
            self.inplace.clone(),
        )
    }
}

/// A pass-through node: its outputs are exactly its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity<V> {
    values: Slots<V>,
}

impl<V: Variable> Identity<V> {
    pub fn new(values: impl IntoIterator<Item = V>) -> Result<Self> {
        let values: Slots<V> = values.into_iter().collect();
        check_unique(&values, SlotKind::Output, &"Identity")?;
        Ok(Self { values })
    }

    pub(crate) fn from_parts(values: Slots<V>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }
}

/// A node of the dataflow graph.
///
/// Composites are only ever produced by [`Computation::compose`], so every
/// `Computation::Composite` observed outside this crate is in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Computation<O, V> {
    Op(OpComp<O, V>),
    Identity(Identity<V>),
    Composite(Composite<O, V>),
}

/// A dependency arc between a value and a leaf computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge<'a, O, V> {
    /// The value is read by the computation.
    Input(&'a V, &'a Computation<O, V>),
    /// The computation writes the value.
    Output(&'a Computation<O, V>, &'a V),
}

impl<O: Operator, V: Variable> Computation<O, V> {
    pub fn op(
        op: O,
        inputs: impl IntoIterator<Item = V>,
        outputs: impl IntoIterator<Item = V>,
    ) -> Result<Self> {
        OpComp::new(op, inputs, outputs).map(Computation::Op)
    }

    pub fn identity(values: impl IntoIterator<Item = V>) -> Result<Self> {
        Identity::new(values).map(Computation::Identity)
    }

    /// Combines `members` into a composite and rewrites it to canonical form.
    ///
    /// The result is not necessarily a composite: a single surviving member is
    /// returned as itself.
    pub fn compose(members: impl IntoIterator<Item = Self>) -> Self {
        let raw = Computation::Composite(Composite::raw(members.into_iter().collect()));
        rewrite::canonicalize(raw)
    }

    pub fn inputs(&self) -> Vec<V> {
        match self {
            Computation::Op(node) => node.inputs().to_vec(),
            Computation::Identity(node) => node.values().to_vec(),
            Computation::Composite(composite) => composite.inputs(),
        }
    }

    pub fn outputs(&self) -> Vec<V> {
        match self {
            Computation::Op(node) => node.outputs().to_vec(),
            Computation::Identity(node) => node.values().to_vec(),
            Computation::Composite(composite) => composite.outputs(),
        }
    }

    /// `(input, node)` arcs followed by `(node, output)` arcs, per leaf.
    pub fn edges(&self) -> Box<dyn Iterator<Item = Edge<'_, O, V>> + '_> {
        match self {
            Computation::Composite(composite) => {
                Box::new(composite.members().iter().flat_map(|m| m.edges()))
            }
            leaf => {
                let (inputs, outputs) = leaf.leaf_slots();
                Box::new(
                    inputs
                        .iter()
                        .map(move |v| Edge::Input(v, leaf))
                        .chain(outputs.iter().map(move |v| Edge::Output(leaf, v))),
                )
            }
        }
    }

    /// Inputs then outputs. Leaves repeat nothing but do not deduplicate;
    /// composites yield each value once.
    pub fn variables(&self) -> Box<dyn Iterator<Item = &V> + '_> {
        match self {
            Computation::Composite(composite) => Box::new(unique(
                composite.members().iter().flat_map(|m| m.variables()),
            )),
            leaf => {
                let (inputs, outputs) = leaf.leaf_slots();
                Box::new(inputs.iter().chain(outputs.iter()))
            }
        }
    }

    /// The leaves of a composite, or the node itself.
    pub fn members(&self) -> &[Self] {
        match self {
            Computation::Composite(composite) => composite.members(),
            leaf => std::slice::from_ref(leaf),
        }
    }

    pub fn as_composite(&self) -> Option<&Composite<O, V>> {
        match self {
            Computation::Composite(composite) => Some(composite),
            _ => None,
        }
    }

    /// The declared in-place map. Only operation nodes can have one.
    pub fn inplace(&self) -> Option<&InplaceMap> {
        match self {
            Computation::Op(node) => Some(node.inplace()),
            _ => None,
        }
    }

    /// Members in an order where producers precede consumers.
    pub fn toposort(&self) -> Result<Vec<&Self>> {
        crate::analysis::topology::sort(self)
    }

    /// Replaces every occurrence of a key of `table` by its value.
    ///
    /// Composites are rebuilt through [`Computation::compose`].
    pub fn substitute(&self, table: &HashMap<V, V>) -> Self {
        if table.is_empty() {
            return self.clone();
        }
        match self {
            Computation::Op(node) => Computation::Op(node.substitute(table)),
            Computation::Identity(node) => Computation::Identity(Identity::from_parts(
                substitute_slots(&node.values, table),
            )),
            Computation::Composite(composite) => Computation::compose(
                composite.members().iter().map(|m| m.substitute(table)),
            ),
        }
    }

    fn leaf_slots(&self) -> (&[V], &[V]) {
        match self {
            Computation::Op(node) => (node.inputs(), node.outputs()),
            Computation::Identity(node) => (node.values(), node.values()),
            Computation::Composite(_) => (&[], &[]),
        }
    }
}

impl<O: Operator, V: Variable> From<OpComp<O, V>> for Computation<O, V> {
    fn from(node: OpComp<O, V>) -> Self {
        Computation::Op(node)
    }
}

impl<O: Operator, V: Variable> Add for Computation<O, V> {
    type Output = Computation<O, V>;

    fn add(self, rhs: Self) -> Self::Output {
        Computation::compose([self, rhs])
    }
}

impl<'a, O: Operator, V: Variable> Add<&'a Computation<O, V>> for &'a Computation<O, V> {
    type Output = Computation<O, V>;

    fn add(self, rhs: &'a Computation<O, V>) -> Self::Output {
        Computation::compose([self.clone(), rhs.clone()])
    }
}

fn check_unique<V: Variable, T: fmt::Debug>(slots: &[V], slot: SlotKind, node: &T) -> Result<()> {
    let mut seen = HashSet::with_capacity(slots.len());
    for value in slots {
        if !seen.insert(value) {
            return Err(GraphError::DuplicateSlot {
                slot,
                node: format!("{:?}", node),
                value: format!("{:?}", value),
            });
        }
    }
    Ok(())
}

fn substitute_slots<V: Variable>(slots: &[V], table: &HashMap<V, V>) -> Slots<V> {
    slots
        .iter()
        .map(|v| table.get(v).unwrap_or(v).clone())
        .collect()
}

fn write_list<V: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[V]) -> fmt::Result {
    f.write_str("[")?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", v)?;
    }
    f.write_str("]")
}

impl<O: fmt::Display, V: fmt::Display> fmt::Display for OpComp<O, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, &self.inputs)?;
        write!(f, " -> {} -> ", self.op)?;
        write_list(f, &self.outputs)
    }
}

impl<V: fmt::Display> fmt::Display for Identity<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, &self.values)?;
        f.write_str(" -> Identity -> ")?;
        write_list(f, &self.values)
    }
}

impl<O: fmt::Display, V: fmt::Display> fmt::Display for Computation<O, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Computation::Op(node) => write!(f, "{}", node),
            Computation::Identity(node) => write!(f, "{}", node),
            Computation::Composite(composite) => write!(f, "{}", composite),
        }
    }
}

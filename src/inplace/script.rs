//! The executable form of a compiled graph.
//!
//! A script is a flat, ordered list of instructions over storage names. Two
//! instructions naming the same storage share one physical buffer; allocating
//! buffers and running the operations is the executor's job.

use super::tokenize::{Step, TokenComputation};
use crate::error::Result;
use crate::graph::{Computation, Operator, Variable};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction<O> {
    pub step: Step<O>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script<O> {
    /// Storage the caller fills before execution.
    pub inputs: Vec<String>,
    /// Storage holding the results after execution.
    pub outputs: Vec<String>,
    pub instructions: Vec<Instruction<O>>,
}

/// Shape statistics of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSummary<O> {
    pub instructions: usize,
    pub copies: usize,
    /// Distinct storage names, i.e. buffers the executor must allocate.
    pub buffers: usize,
    pub op_counts: BTreeMap<Step<O>, usize>,
}

impl<O: Operator> Script<O> {
    /// Lowers a resolved schedule. Identity members move no data and are dropped.
    pub fn from_schedule<V: Variable>(
        schedule: &[TokenComputation<O, V>],
        inputs: &[super::ExprToken<V>],
        outputs: &[super::ExprToken<V>],
    ) -> Self {
        let instructions = schedule
            .iter()
            .filter_map(|member| match member {
                Computation::Op(node) => Some(Instruction {
                    step: node.op().clone(),
                    inputs: node.inputs().iter().map(|t| t.token.clone()).collect(),
                    outputs: node.outputs().iter().map(|t| t.token.clone()).collect(),
                }),
                _ => None,
            })
            .collect();
        Self {
            inputs: inputs.iter().map(|t| t.token.clone()).collect(),
            outputs: outputs.iter().map(|t| t.token.clone()).collect(),
            instructions,
        }
    }

    pub fn summary(&self) -> ScriptSummary<O> {
        let mut op_counts = BTreeMap::new();
        let mut buffers = BTreeSet::new();
        buffers.extend(self.inputs.iter());
        for instr in &self.instructions {
            *op_counts.entry(instr.step.clone()).or_insert(0) += 1;
            buffers.extend(instr.inputs.iter().chain(&instr.outputs));
        }
        ScriptSummary {
            instructions: self.instructions.len(),
            copies: op_counts.get(&Step::Copy).copied().unwrap_or(0),
            buffers: buffers.len(),
            op_counts,
        }
    }
}

impl<O: Serialize + DeserializeOwned> Script<O> {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

impl<O: fmt::Display> fmt::Display for Instruction<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}) -> ({})",
            self.step,
            self.inputs.join(", "),
            self.outputs.join(", ")
        )
    }
}

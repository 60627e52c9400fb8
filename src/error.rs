//! Error types shared by every stage of graph construction and compilation.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    /// A value appears twice in the same input or output list of a node.
    #[error("Duplicate {slot} slot in `{node}`: {value}")]
    DuplicateSlot {
        slot: SlotKind,
        node: String,
        value: String,
    },
    /// An in-place map refers to a slot the node does not have.
    #[error("In-place map of `{node}` maps output {output} to input {input}, but the node has {outputs} outputs and {inputs} inputs")]
    InplaceSlotOutOfRange {
        node: String,
        output: usize,
        input: usize,
        outputs: usize,
        inputs: usize,
    },
    #[error("Cycle detected: {remaining} computations could not be scheduled")]
    CycleDetected { remaining: usize },
    /// The tokenizer was about to hand out a name twice. Indicates a tokenizer bug.
    #[error("Name collision: storage name '{name}' was already issued")]
    NameCollision { name: String },
    /// A scheduled computation reads storage after another computation overwrote it.
    #[error("Clobbered read: `{node}` reads {token} after its storage was overwritten")]
    ClobberedRead { node: String, token: String },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which slot list of a node an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Input,
    Output,
}

impl std::fmt::Display for SlotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotKind::Input => f.write_str("input"),
            SlotKind::Output => f.write_str("output"),
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;

//! Defines the core data structures for the computation graph.
pub mod composite;
pub mod node;
pub mod term;

// Re-export key types for convenient access
pub use composite::{unique, Composite};
pub use node::{Computation, Edge, Identity, OpComp, Slots};
pub use term::{InplaceMap, Operator, Variable};

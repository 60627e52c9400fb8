//! A dataflow-graph IR and an in-place memory-planning compiler.
//!
//! Computations read and write opaque values. They compose into canonical
//! composites, which are scheduled topologically and then compiled into a
//! script over named storage where in-place operations reuse the buffers of
//! their inputs whenever that is safe.

pub mod analysis;
pub mod config;
pub mod display;
pub mod error;
pub mod graph;
pub mod inplace;
pub mod rewrite;

pub use config::CompileOptions;
pub use error::{GraphError, Result};
pub use graph::{Composite, Computation, Edge, Identity, InplaceMap, OpComp, Operator, Variable};
pub use inplace::{compile, compile_batch, compile_with, Compiled, ExprToken, Script, Step, Tokenizer};

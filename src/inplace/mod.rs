//! The in-place compiler.
//!
//! Lowers a pure mathematical graph into a schedule over named storage where
//! in-place operations physically share buffers with their inputs:
//!
//! 1. [`tokenize`] binds every value to a storage name.
//! 2. [`purify`] copies every input an in-place node would overwrite.
//! 3. [`elide_copies`] drops copies whose source nobody else reads.
//! 4. [`resolve_aliases`] gives in-place outputs the storage of their inputs.

pub mod alias;
pub mod elide;
pub mod purify;
pub mod script;
pub mod token;
pub mod tokenize;

pub use alias::{resolve_aliases, verify_schedule};
pub use elide::elide_copies;
pub use purify::purify;
pub use script::{Instruction, Script, ScriptSummary};
pub use token::{ExprToken, Tokenizer};
pub use tokenize::{is_copy, tokenize, Step, TokenComputation};

use crate::config::CompileOptions;
use crate::error::Result;
use crate::graph::{composite::derived_io, Computation, Operator, Variable};
use log::debug;
use rayon::prelude::*;

/// The result of compiling one graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled<O, V> {
    schedule: Vec<TokenComputation<O, V>>,
    inputs: Vec<ExprToken<V>>,
    outputs: Vec<ExprToken<V>>,
}

impl<O: Operator, V: Variable> Compiled<O, V> {
    /// Leaf computations in execution order, with aliased storage names.
    pub fn schedule(&self) -> &[TokenComputation<O, V>] {
        &self.schedule
    }

    pub fn inputs(&self) -> &[ExprToken<V>] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ExprToken<V>] {
        &self.outputs
    }

    /// The schedule as a canonical composite.
    pub fn graph(&self) -> TokenComputation<O, V> {
        Computation::compose(self.schedule.iter().cloned())
    }

    pub fn copy_count(&self) -> usize {
        self.schedule.iter().filter(|m| is_copy(m)).count()
    }

    pub fn script(&self) -> Script<O> {
        Script::from_schedule(&self.schedule, &self.inputs, &self.outputs)
    }
}

/// Compiles `comp` with default options.
pub fn compile<O: Operator, V: Variable>(comp: &Computation<O, V>) -> Result<Compiled<O, V>> {
    compile_with(comp, &CompileOptions::default())
}

/// Runs the four stages with one tokenizer for the whole compilation.
pub fn compile_with<O: Operator, V: Variable>(
    comp: &Computation<O, V>,
    options: &CompileOptions,
) -> Result<Compiled<O, V>> {
    let mut tokenizer = Tokenizer::new();

    let stage1 = tokenize(comp, &mut tokenizer)?;
    debug!("compile: tokenized {} members", stage1.members().len());

    let stage2 = purify(&stage1, &mut tokenizer)?;
    debug!("compile: purified into {} members", stage2.members().len());

    let stage3 = if options.elide_copies {
        elide_copies(&stage2)?
    } else {
        stage2
    };

    let schedule = resolve_aliases(&stage3)?;
    if options.verify {
        verify_schedule(&schedule)?;
    }

    // Token-level I/O is unaffected by aliasing, which only renames storage.
    let (inputs, outputs) = derived_io(&schedule);
    let compiled = Compiled {
        schedule,
        inputs,
        outputs,
    };
    debug!(
        "compile: {} instructions, {} copies, {} names issued",
        compiled.schedule.len(),
        compiled.copy_count(),
        tokenizer.len()
    );
    Ok(compiled)
}

/// Compiles independent graphs in parallel, one tokenizer each. Results keep
/// the order of `graphs`.
pub fn compile_batch<O, V>(
    graphs: &[Computation<O, V>],
    options: &CompileOptions,
) -> Vec<Result<Compiled<O, V>>>
where
    O: Operator + Send + Sync,
    V: Variable + Send + Sync,
{
    graphs
        .par_iter()
        .map(|graph| compile_with(graph, options))
        .collect()
}

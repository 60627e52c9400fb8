//! Human-readable listing of a compiled script.
use crate::graph::Operator;
use crate::inplace::Script;
use std::fmt::{Display, Write};

pub fn format_script<O: Operator + Display>(script: &Script<O>) -> String {
    let summary = script.summary();
    let mut output = String::new();

    let _ = writeln!(
        output,
        "SCRIPT: {} instructions, {} copies, {} buffers",
        summary.instructions, summary.copies, summary.buffers
    );
    let _ = writeln!(output, "--------------------------------------------------");
    let _ = writeln!(output, "inputs:  [{}]", script.inputs.join(", "));
    for (i, instr) in script.instructions.iter().enumerate() {
        let _ = writeln!(output, "{:>4}: {}", i, instr);
    }
    let _ = writeln!(output, "outputs: [{}]", script.outputs.join(", "));
    output
}

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use nodable_graph::Graph;
use nodable_parser::{parse_report, ResolutionMode};

use crate::{EXIT_COMPILE_ERROR, EXIT_RUNTIME_ERROR, EXIT_SUCCESS, EXIT_SYNTAX_ERROR};

pub fn run(file: &Path, permissive: bool) -> Result<i32> {
    let source = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;

    let mode = if permissive { ResolutionMode::Permissive } else { ResolutionMode::Strict };
    let mut graph = Graph::new();
    let report = parse_report(&source, &mut graph, mode);
    if !report.success {
        for diagnostic in report.diagnostics.entries() {
            eprintln!("{}", diagnostic.to_string().red());
        }
        return Ok(EXIT_SYNTAX_ERROR);
    }

    let Some(bytecode) = nodable_compiler::compile(&graph) else {
        eprintln!("{}", "compilation failed; rerun with -vv for details".red());
        return Ok(EXIT_COMPILE_ERROR);
    };

    match nodable_vm::run(&bytecode) {
        Ok(result) => {
            println!("{}", result.into_value());
            Ok(EXIT_SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", format!("runtime error: {err}").red());
            Ok(EXIT_RUNTIME_ERROR)
        }
    }
}

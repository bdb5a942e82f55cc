use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use nodable_graph::Graph;
use nodable_parser::{parse_report, ResolutionMode};

use crate::{EXIT_SUCCESS, EXIT_SYNTAX_ERROR};

/// Parses `file` and prints the graph serialized back to source text — a
/// round-trip the caller can diff against the original to sanity-check the
/// serializer.
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

    print!("{}", nodable_serializer::serialize(&graph));
    Ok(EXIT_SUCCESS)
}

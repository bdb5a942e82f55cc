use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use nodable_graph::{Graph, NodeId, ScopeId};
use nodable_parser::{parse_report, ResolutionMode};

use crate::{EXIT_SUCCESS, EXIT_SYNTAX_ERROR};

/// Parses `file` and prints an indented tree of its graph: one line per
/// node (kind and name), recursing into every scope a node owns.
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

    print_scope(&graph, graph.root_scope(), 0);
    Ok(EXIT_SUCCESS)
}

fn print_scope(graph: &Graph, scope_id: ScopeId, depth: usize) {
    let Some(scope) = graph.scope(scope_id) else { return };
    for &node_id in scope.backbone() {
        print_node(graph, node_id, depth);
    }
}

fn print_node(graph: &Graph, node_id: NodeId, depth: usize) {
    let Some(node) = graph.node(node_id) else { return };
    let indent = "  ".repeat(depth);
    let name = node.name();
    if name.is_empty() {
        println!("{indent}{:?}", node.kind());
    } else {
        println!("{indent}{:?} {name}", node.kind());
    }
    if let Some(internal) = node.internal_scope() {
        let partitions = graph.scope(internal).map(|s| s.partitions().to_vec()).unwrap_or_default();
        if partitions.is_empty() {
            print_scope(graph, internal, depth + 1);
        } else {
            for partition in partitions {
                print_scope(graph, partition, depth + 1);
            }
        }
    }
}

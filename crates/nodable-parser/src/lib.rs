//! Recursive-descent parser with transactional backtracking, building a
//! [`nodable_graph::Graph`] from source text.
//!
//! Parsing never leaves a partially-built graph behind: on any failure the
//! graph is reset to just its root before returning. Each production
//! destroys the nodes it created before rolling back its own transaction,
//! so a failure deep in the grammar unwinds cleanly without leaking nodes
//! into an ancestor production's eventual success.

mod parser;
mod transaction;

use nodable_common::diagnostics::{Diagnostic, DiagnosticBag, diagnostic_codes};
use nodable_common::span::Span;
use nodable_graph::Graph;
use nodable_lang::Language;
use nodable_scanner::lex;

pub use parser::ResolutionMode;

/// The outcome of a parse: whether it succeeded, and every diagnostic
/// produced along the way (errors on failure, warnings on permissive
/// fallback even when the parse otherwise succeeds).
#[derive(Debug, Clone)]
pub struct ParseReport {
    pub success: bool,
    pub diagnostics: DiagnosticBag,
}

/// Parses `source` into `graph` using strict identifier resolution. On
/// failure the graph is reset to empty and `false` is returned.
pub fn parse(source: &str, graph: &mut Graph) -> bool {
    parse_report(source, graph, ResolutionMode::Strict).success
}

/// Like [`parse`], but undeclared identifiers are tolerated: each becomes
/// an `any`-typed, unconnected `variable_ref` and the graph is marked
/// incomplete via [`Graph::mark_complete`] rather than failing the parse.
pub fn parse_permissive(source: &str, graph: &mut Graph) -> bool {
    parse_report(source, graph, ResolutionMode::Permissive).success
}

/// Parses `source` into `graph` under the given [`ResolutionMode`],
/// returning the full diagnostic trail alongside the boolean result.
pub fn parse_report(source: &str, graph: &mut Graph, mode: ResolutionMode) -> ParseReport {
    let language = Language::default();
    let mut diagnostics = DiagnosticBag::new();

    let ribbon = match lex(source) {
        Ok(ribbon) => ribbon,
        Err(err) => {
            diagnostics.push(Diagnostic::error(diagnostic_codes::LEX_UNRECOGNIZED_BYTE, Span::at(err.position), err.to_string()));
            graph.reset();
            return ParseReport { success: false, diagnostics };
        }
    };

    if !parser::check_ribbon_validity(&ribbon, &mut diagnostics) {
        graph.reset();
        return ParseReport { success: false, diagnostics };
    }

    let root_scope = graph.root_scope();
    let mut p = parser::Parser::new(graph, ribbon, language, mode);
    let parsed_everything = p.code_block(root_scope) && p.ribbon().peek().is_none();
    let complete = p.is_complete();
    let mut bag = p.into_diagnostics();
    for entry in diagnostics.entries() {
        bag.push(entry.clone());
    }

    if !parsed_everything || bag.has_errors() {
        tracing::debug!(errors = bag.entries().len(), "parse failed, resetting graph");
        graph.reset();
        return ParseReport { success: false, diagnostics: bag };
    }

    tracing::debug!(complete, "parse succeeded");
    graph.mark_complete(complete);
    ParseReport { success: true, diagnostics: bag }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodable_graph::NodeKind;

    #[test]
    fn parses_a_variable_declaration() {
        let mut graph = Graph::new();
        assert!(parse("int x = 1;", &mut graph));
        let root_scope = graph.root_scope();
        let backbone = graph.scope(root_scope).unwrap().backbone();
        assert_eq!(backbone.len(), 1);
        let node = graph.node(backbone[0]).unwrap();
        assert_eq!(node.kind(), NodeKind::Variable);
        assert_eq!(node.name(), "x");
    }

    #[test]
    fn parses_a_binary_expression_statement() {
        let mut graph = Graph::new();
        assert!(parse("1 + 2;", &mut graph));
        let root_scope = graph.root_scope();
        let backbone = graph.scope(root_scope).unwrap().backbone();
        assert_eq!(backbone.len(), 1);
        assert_eq!(graph.node(backbone[0]).unwrap().kind(), NodeKind::Operator);
    }

    #[test]
    fn strict_mode_fails_on_undeclared_identifier() {
        let mut graph = Graph::new();
        assert!(!parse("x;", &mut graph));
        assert_eq!(graph.nodes().count(), 1, "graph must be reset to just the root on failure");
    }

    #[test]
    fn permissive_mode_accepts_undeclared_identifier() {
        let mut graph = Graph::new();
        assert!(parse_permissive("x;", &mut graph));
        assert!(!graph.is_complete());
    }

    #[test]
    fn rejects_unbalanced_parentheses() {
        let mut graph = Graph::new();
        let report = parse_report("(1 + 2;", &mut graph, ResolutionMode::Strict);
        assert!(!report.success);
        assert!(report.diagnostics.has_errors());
    }

    #[test]
    fn rejects_trailing_operator() {
        let mut graph = Graph::new();
        assert!(!parse("1 +;", &mut graph));
    }

    #[test]
    fn parses_nested_if_else_with_scopes() {
        let mut graph = Graph::new();
        assert!(parse("if (1 == 1) { int a = 1; } else { int b = 2; }", &mut graph));
        let root_scope = graph.root_scope();
        let backbone = graph.scope(root_scope).unwrap().backbone();
        assert_eq!(backbone.len(), 1);
        assert_eq!(graph.node(backbone[0]).unwrap().kind(), NodeKind::If);
    }

    #[test]
    fn parses_for_loop_with_declared_index_visible_in_body() {
        let mut graph = Graph::new();
        assert!(parse("for (int i = 0; i < 10; i = i + 1) { i; }", &mut graph));
    }

    #[test]
    fn reuses_variable_through_variable_ref_on_second_reference() {
        let mut graph = Graph::new();
        assert!(parse("int x = 1; x;", &mut graph));
        let root_scope = graph.root_scope();
        let backbone = graph.scope(root_scope).unwrap().backbone();
        assert_eq!(backbone.len(), 2);
        assert_eq!(graph.node(backbone[1]).unwrap().kind(), NodeKind::VariableRef);
    }

    #[test]
    fn a_failed_parse_does_not_block_redeclaring_the_same_name_later() {
        let mut graph = Graph::new();
        assert!(!parse("int a = 1; y;", &mut graph));
        assert!(parse("int a = 5;", &mut graph), "reset must free 'a' for redeclaration on the same graph");
    }

    #[test]
    fn function_call_wires_arguments_in_order() {
        let mut graph = Graph::new();
        assert!(parse("foo(1, 2);", &mut graph));
        let root_scope = graph.root_scope();
        let backbone = graph.scope(root_scope).unwrap().backbone();
        let call = graph.node(backbone[0]).unwrap();
        assert_eq!(call.kind(), NodeKind::FunctionCall);
        assert_eq!(call.name(), "foo");
        assert!(call.property("arg0").is_some());
        assert!(call.property("arg1").is_some());
    }
}

//! Depth-first serializer: walks a [`Graph`] back into source text.
//!
//! Most tokens the parser captured (literals, identifiers, keywords,
//! operators, the assignment sign) carry their original prefix/suffix
//! bytes, so reproducing them verbatim reconstructs the surrounding
//! whitespace exactly. A handful of punctuation characters — the
//! parentheses around a call's argument list or an `if`/`for`/`while`
//! header, the commas between arguments, the semicolons inside a `for`
//! header — are consumed by the parser without being stored on any node,
//! so the serializer re-synthesizes them as plain characters instead of
//! recovering the exact original bytes. Parenthesization around
//! sub-expressions is reconstructed the same way: the grammar parses
//! `(expr)` transparently (no wrapping node), so the serializer only adds
//! parens back where operator precedence requires them, not wherever the
//! original source happened to have them.

use nodable_graph::{
    Direction, Graph, NodeId, NodeKind, Order, ScopeId, SlotId, THIS_PROPERTY_NAME, TOKEN_ASSIGN,
    TOKEN_ELSE, TOKEN_IDENTIFIER, TOKEN_KEYWORD, TOKEN_OPERATOR, TOKEN_TYPE,
};
use nodable_lang::operator::UNARY_PRECEDENCE;
use nodable_lang::Language;
use nodable_scanner::Token;

/// Serializes the whole program back to source text.
#[must_use]
pub fn serialize(graph: &Graph) -> String {
    let language = Language::default();
    serialize_scope(graph, &language, graph.root_scope())
}

fn serialize_scope(graph: &Graph, language: &Language, scope_id: ScopeId) -> String {
    let Some(scope) = graph.scope(scope_id) else { return String::new() };
    scope.backbone().iter().map(|&node| serialize_node(graph, language, node)).collect()
}

fn token_text(token: Option<&Token>) -> String {
    token.map(Token::full_text).unwrap_or_default()
}

/// Follows an input slot back to the node on its other end, if connected.
fn connected_source(
    graph: &Graph,
    node: NodeId,
    property_name: &str,
    direction: Direction,
    order: Order,
) -> Option<NodeId> {
    let slot_id = graph.find_slot(node, property_name, direction, order)?;
    source_node(graph, slot_id)
}

fn source_node(graph: &Graph, slot_id: SlotId) -> Option<NodeId> {
    let slot = graph.slot(slot_id)?;
    let adjacent = slot.first_adjacent()?;
    Some(graph.slot(adjacent)?.owner())
}

fn serialize_node(graph: &Graph, language: &Language, node_id: NodeId) -> String {
    let node = graph.node(node_id).expect("node exists");

    if node.kind() == NodeKind::EmptyInstruction {
        // The trailing `;` *is* this node's whole content; it must not be
        // appended a second time by the shared suffix step below.
        return token_text(node.suffix_token());
    }

    let body = match node.kind() {
        NodeKind::Scope => {
            let internal = node.internal_scope().expect("scope node has an internal scope");
            let begin = graph.scope(internal).and_then(|s| s.begin_token()).map_or_else(String::new, Token::full_text);
            let end = graph.scope(internal).and_then(|s| s.end_token()).map_or_else(String::new, Token::full_text);
            format!("{begin}{}{end}", serialize_scope(graph, language, internal))
        }
        NodeKind::Default => String::new(),
        NodeKind::EmptyInstruction => unreachable!("handled above"),
        NodeKind::Literal => serialize_literal(graph, node_id),
        NodeKind::Variable => serialize_variable(graph, language, node_id),
        NodeKind::VariableRef => serialize_variable_ref(graph, node_id),
        NodeKind::Operator => serialize_operator(graph, language, node_id),
        NodeKind::FunctionCall => serialize_call(graph, language, node_id),
        NodeKind::If => serialize_if(graph, language, node_id),
        NodeKind::ForLoop => serialize_for(graph, language, node_id),
        NodeKind::WhileLoop => serialize_while(graph, language, node_id),
    };

    format!("{body}{}", token_text(node.suffix_token()))
}

fn serialize_literal(graph: &Graph, node_id: NodeId) -> String {
    let node = graph.node(node_id).expect("node exists");
    let Some(value) = node.property("value") else { return String::new() };
    token_text(graph.property(value).and_then(|p| p.token()))
}

fn serialize_variable(graph: &Graph, language: &Language, node_id: NodeId) -> String {
    let node = graph.node(node_id).expect("node exists");
    let mut out = String::new();
    out.push_str(&token_text(node.token(TOKEN_TYPE)));
    out.push_str(&token_text(node.token(TOKEN_IDENTIFIER)));
    if let Some(init) = connected_source(graph, node_id, "value", Direction::Input, Order::First) {
        let assign = node.token(TOKEN_ASSIGN);
        out.push_str(if assign.is_some() { &token_text(assign) } else { "=" });
        out.push_str(&serialize_node(graph, language, init));
    }
    out
}

fn serialize_variable_ref(graph: &Graph, node_id: NodeId) -> String {
    let node = graph.node(node_id).expect("node exists");
    let text = token_text(node.token(TOKEN_IDENTIFIER));
    if text.is_empty() { node.name().to_string() } else { text }
}

/// Controls whether [`serialize_operand`] wraps a child operator node in
/// parentheses.
#[derive(Clone, Copy)]
enum WrapPolicy {
    /// Unary's single operand: wrap any operator, regardless of precedence.
    Always,
    /// Binary's two operands: wrap only an operator strictly lower
    /// precedence than the parent.
    IfPrecedenceBelow(u8),
}

fn operator_is_binary(graph: &Graph, node_id: NodeId) -> bool {
    graph
        .find_slot(node_id, "rvalue", Direction::Input, Order::Second)
        .and_then(|s| graph.slot(s))
        .is_some_and(|s| s.first_adjacent().is_some())
}

fn operator_precedence(graph: &Graph, language: &Language, node_id: NodeId) -> u8 {
    let node = graph.node(node_id).expect("node exists");
    if operator_is_binary(graph, node_id) {
        language.operator(node.name()).map_or(0, |def| def.precedence)
    } else {
        UNARY_PRECEDENCE
    }
}

fn serialize_operand(graph: &Graph, language: &Language, node_id: NodeId, policy: WrapPolicy) -> String {
    let text = serialize_node(graph, language, node_id);
    let is_operator = graph.node(node_id).is_some_and(|n| n.kind() == NodeKind::Operator);
    let wrap = is_operator
        && match policy {
            WrapPolicy::Always => true,
            WrapPolicy::IfPrecedenceBelow(parent) => operator_precedence(graph, language, node_id) < parent,
        };
    if wrap { format!("({text})") } else { text }
}

fn serialize_operator(graph: &Graph, language: &Language, node_id: NodeId) -> String {
    let node = graph.node(node_id).expect("node exists");
    let op_text = token_text(node.token(TOKEN_OPERATOR));
    let op_text = if op_text.is_empty() { node.name().to_string() } else { op_text };

    if operator_is_binary(graph, node_id) {
        let precedence = operator_precedence(graph, language, node_id);
        let lvalue = connected_source(graph, node_id, "lvalue", Direction::Input, Order::First);
        let rvalue = connected_source(graph, node_id, "rvalue", Direction::Input, Order::Second);
        let left = lvalue
            .map(|n| serialize_operand(graph, language, n, WrapPolicy::IfPrecedenceBelow(precedence)))
            .unwrap_or_default();
        let right = rvalue
            .map(|n| serialize_operand(graph, language, n, WrapPolicy::IfPrecedenceBelow(precedence)))
            .unwrap_or_default();
        format!("{left}{op_text}{right}")
    } else {
        let operand = connected_source(graph, node_id, "lvalue", Direction::Input, Order::First)
            .map(|n| serialize_operand(graph, language, n, WrapPolicy::Always))
            .unwrap_or_default();
        format!("{op_text}{operand}")
    }
}

fn serialize_call(graph: &Graph, language: &Language, node_id: NodeId) -> String {
    let node = graph.node(node_id).expect("node exists");
    let mut out = String::new();
    if let Some(keyword) = node.token(TOKEN_KEYWORD) {
        out.push_str(&keyword.full_text());
        out.push_str(&token_text(node.token(TOKEN_OPERATOR)));
    } else {
        let identifier = token_text(node.token(TOKEN_IDENTIFIER));
        out.push_str(if identifier.is_empty() { node.name() } else { &identifier });
    }

    out.push('(');
    let args: Vec<String> = node
        .properties()
        .filter(|(name, _)| *name != THIS_PROPERTY_NAME && *name != "result")
        .filter_map(|(name, _)| connected_source(graph, node_id, name, Direction::Input, Order::First))
        .map(|arg| serialize_node(graph, language, arg))
        .collect();
    out.push_str(&args.join(", "));
    out.push(')');
    out
}

fn serialize_if(graph: &Graph, language: &Language, node_id: NodeId) -> String {
    let node = graph.node(node_id).expect("node exists");
    let mut out = token_text(node.token(TOKEN_KEYWORD));
    if out.is_empty() {
        out.push_str("if");
    }
    out.push('(');
    if let Some(condition) = connected_source(graph, node_id, "condition", Direction::Input, Order::First) {
        out.push_str(&serialize_node(graph, language, condition));
    }
    out.push(')');

    let internal = node.internal_scope().expect("if node has an internal scope");
    let partitions = graph.scope(internal).expect("just read").partitions();
    out.push_str(&serialize_scope(graph, language, partitions[0]));

    if let Some(else_token) = node.token(TOKEN_ELSE) {
        out.push_str(&else_token.full_text());
        out.push_str(&serialize_scope(graph, language, partitions[1]));
    }
    out
}

fn serialize_for(graph: &Graph, language: &Language, node_id: NodeId) -> String {
    let node = graph.node(node_id).expect("node exists");
    let mut out = token_text(node.token(TOKEN_KEYWORD));
    if out.is_empty() {
        out.push_str("for");
    }
    out.push('(');
    if let Some(init) = connected_source(graph, node_id, "initialization", Direction::Input, Order::First) {
        out.push_str(&serialize_node(graph, language, init));
    }
    out.push(';');
    if let Some(condition) = connected_source(graph, node_id, "condition", Direction::Input, Order::First) {
        out.push_str(&serialize_node(graph, language, condition));
    }
    out.push(';');
    if let Some(iteration) = connected_source(graph, node_id, "iteration", Direction::Input, Order::First) {
        out.push_str(&serialize_node(graph, language, iteration));
    }
    out.push(')');

    let internal = node.internal_scope().expect("for node has an internal scope");
    let body = graph.scope(internal).expect("just read").partitions()[0];
    out.push_str(&serialize_scope(graph, language, body));
    out
}

fn serialize_while(graph: &Graph, language: &Language, node_id: NodeId) -> String {
    let node = graph.node(node_id).expect("node exists");
    let mut out = token_text(node.token(TOKEN_KEYWORD));
    if out.is_empty() {
        out.push_str("while");
    }
    out.push('(');
    if let Some(condition) = connected_source(graph, node_id, "condition", Direction::Input, Order::First) {
        out.push_str(&serialize_node(graph, language, condition));
    }
    out.push(')');

    let internal = node.internal_scope().expect("while node has an internal scope");
    let body = graph.scope(internal).expect("just read").partitions()[0];
    out.push_str(&serialize_scope(graph, language, body));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodable_graph::Graph;
    use nodable_parser::parse;

    fn round_trip(source: &str) -> String {
        let mut graph = Graph::new();
        assert!(parse(source, &mut graph), "failed to parse {source:?}");
        serialize(&graph)
    }

    #[test]
    fn round_trips_variable_declaration_exactly() {
        assert_eq!(round_trip("int x = 1;"), "int x = 1;");
    }

    #[test]
    fn round_trips_binary_expression_exactly() {
        assert_eq!(round_trip("1 + 2;"), "1 + 2;");
    }

    #[test]
    fn round_trips_variable_declaration_without_initializer() {
        assert_eq!(round_trip("int x;"), "int x;");
    }

    #[test]
    fn round_trips_nested_scoped_block_exactly() {
        assert_eq!(round_trip("{ int x = 1; }"), "{ int x = 1; }");
    }

    #[test]
    fn round_trips_reused_variable_as_reference() {
        assert_eq!(round_trip("int x = 1; x;"), "int x = 1; x;");
    }

    #[test]
    fn reintroduces_parens_for_lower_precedence_left_operand() {
        // `(1 + 2) * 3` — without parens this would parse back as `1 + 2 * 3`.
        let mut graph = Graph::new();
        assert!(parse("(1 + 2) * 3;", &mut graph));
        let out = serialize(&graph);
        assert_eq!(out, "(1 + 2) * 3;");
        // Re-parsing the serialized text must reproduce an equivalent tree.
        let mut reparsed = Graph::new();
        assert!(parse(&out, &mut reparsed));
    }

    #[test]
    fn omits_unneeded_parens_for_same_or_higher_precedence_operand() {
        let out = round_trip("1 + 2 * 3;");
        assert_eq!(out, "1 + 2 * 3;");
    }

    #[test]
    fn wraps_unary_operand_operator_regardless_of_precedence() {
        let mut graph = Graph::new();
        assert!(parse("-(1 * 2);", &mut graph));
        let out = serialize(&graph);
        assert_eq!(out, "-(1 * 2);");
    }

    #[test]
    fn call_with_arguments_reparses_to_the_same_shape() {
        let mut graph = Graph::new();
        assert!(parse("foo(1, 2);", &mut graph));
        let out = serialize(&graph);
        assert_eq!(out, "foo(1, 2);");
        let mut reparsed = Graph::new();
        assert!(parse(&out, &mut reparsed));
        let root_scope = reparsed.root_scope();
        let backbone = reparsed.scope(root_scope).unwrap().backbone();
        let call = reparsed.node(backbone[0]).unwrap();
        assert_eq!(call.kind(), NodeKind::FunctionCall);
        assert_eq!(call.name(), "foo");
    }

    #[test]
    fn if_else_reparses_to_the_same_shape() {
        let mut graph = Graph::new();
        assert!(parse("int x = 1; if(x == 1) { int y = 2; } else { int y = 3; }", &mut graph));
        let out = serialize(&graph);
        let mut reparsed = Graph::new();
        assert!(parse(&out, &mut reparsed), "serialized output {out:?} failed to reparse");
        let root_scope = reparsed.root_scope();
        let backbone = reparsed.scope(root_scope).unwrap().backbone();
        assert_eq!(backbone.len(), 2);
        assert_eq!(reparsed.node(backbone[1]).unwrap().kind(), NodeKind::If);
    }

    #[test]
    fn for_loop_reparses_to_the_same_shape() {
        let mut graph = Graph::new();
        assert!(parse("for(int i = 0; i < 10; i = i + 1) { i; }", &mut graph));
        let out = serialize(&graph);
        let mut reparsed = Graph::new();
        assert!(parse(&out, &mut reparsed), "serialized output {out:?} failed to reparse");
    }

    #[test]
    fn empty_instruction_serializes_only_its_own_suffix() {
        assert_eq!(round_trip(";"), ";");
    }
}

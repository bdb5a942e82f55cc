//! Recursive-descent parser. Each production follows the same shape:
//! start a transaction, attempt the production, and either commit or
//! destroy everything it created and roll back.

use nodable_common::diagnostics::{Diagnostic, DiagnosticBag, diagnostic_codes};
use nodable_common::span::Span;
use nodable_graph::{
    ConnectFlags, Direction, Graph, LookupFlags, NodeId, NodeKind, Order, ScopeId, SlotId,
    TOKEN_ASSIGN, TOKEN_ELSE, TOKEN_IDENTIFIER, TOKEN_KEYWORD, TOKEN_OPERATOR, TOKEN_TYPE,
};
use nodable_lang::operator::{Arity, is_unary_operator};
use nodable_lang::{Language, ValueType};
use nodable_scanner::{Token, TokenKind, TokenRibbon};

use crate::transaction::TransactionGuard;

/// How an undeclared identifier is handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Undeclared identifiers fail the parse with `UndeclaredIdentifier`.
    Strict,
    /// Undeclared identifiers become an `any`-typed `variable_ref` with no
    /// declaration edge; the parse still succeeds but the resulting graph
    /// is marked incomplete.
    Permissive,
}

pub(crate) struct Parser<'g> {
    graph: &'g mut Graph,
    ribbon: TokenRibbon,
    language: Language,
    mode: ResolutionMode,
    diagnostics: DiagnosticBag,
    complete: bool,
    /// One entry per currently open transaction; holds the node ids
    /// created under that transaction so a rollback can destroy them and
    /// a commit can bubble them up into the enclosing transaction.
    created_stack: Vec<Vec<NodeId>>,
}

impl<'g> Parser<'g> {
    pub(crate) fn new(graph: &'g mut Graph, ribbon: TokenRibbon, language: Language, mode: ResolutionMode) -> Self {
        Self { graph, ribbon, language, mode, diagnostics: DiagnosticBag::new(), complete: true, created_stack: Vec::new() }
    }

    pub(crate) fn ribbon(&self) -> &TokenRibbon {
        &self.ribbon
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.complete
    }

    pub(crate) fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn into_diagnostics(self) -> DiagnosticBag {
        self.diagnostics
    }

    // ---- transactions --------------------------------------------------

    fn begin_transaction(&mut self) -> TransactionGuard {
        self.created_stack.push(Vec::new());
        TransactionGuard::new(self.ribbon.start_transaction())
    }

    fn commit_transaction(&mut self, guard: TransactionGuard) {
        let created = self.created_stack.pop().unwrap_or_default();
        if let Some(parent) = self.created_stack.last_mut() {
            parent.extend(created);
        }
        self.ribbon.commit(guard.saved());
        guard.resolve();
    }

    fn rollback_transaction(&mut self, guard: TransactionGuard) {
        let created = self.created_stack.pop().unwrap_or_default();
        for node in created.into_iter().rev() {
            self.graph.destroy(node);
        }
        self.ribbon.rollback(guard.saved());
        guard.resolve();
    }

    fn track_created(&mut self, node: NodeId) {
        if let Some(top) = self.created_stack.last_mut() {
            top.push(node);
        }
    }

    fn current_transaction_created(&self, node: NodeId) -> bool {
        self.created_stack.last().is_some_and(|v| v.contains(&node))
    }

    fn new_node(&mut self, kind: NodeKind, scope: ScopeId) -> NodeId {
        let id = self.graph.create_node(kind, scope);
        self.track_created(id);
        id
    }

    fn eat_exact(&mut self, kind: TokenKind) -> Option<Token> {
        let token = self.ribbon.eat_if(kind);
        (!token.is_none()).then_some(token)
    }

    /// The output slot that carries a node's own value, for wiring it as
    /// another node's input. Dispatches per kind since every kind names
    /// its output property differently (`value` vs `result`), and a
    /// `variable` additionally has two same-named output slots
    /// (declaration-output vs reference-output) distinguished by order.
    fn primary_output_slot(&self, node: NodeId) -> Option<SlotId> {
        let kind = self.graph.node(node)?.kind();
        match kind {
            NodeKind::Literal | NodeKind::VariableRef => {
                self.graph.find_slot(node, "value", Direction::Output, Order::First)
            }
            NodeKind::Variable => self.graph.find_slot(node, "value", Direction::Output, Order::First),
            NodeKind::Operator | NodeKind::FunctionCall => {
                self.graph.find_slot(node, "result", Direction::Output, Order::First)
            }
            _ => None,
        }
    }

    fn partition_scope(&self, node: NodeId, index: usize) -> ScopeId {
        let internal = self.graph.node(node).expect("block node has internal scope").internal_scope().expect("set by install_shape");
        self.graph.scope(internal).expect("just created").partitions()[index]
    }

    fn internal_scope_of(&self, node: NodeId) -> ScopeId {
        self.graph.node(node).expect("exists").internal_scope().expect("set by install_shape")
    }

    // ---- grammar --------------------------------------------------------

    /// `code_block := atomic_code_block*`, consumed greedily until `}` or
    /// end of ribbon.
    pub(crate) fn code_block(&mut self, scope: ScopeId) -> bool {
        loop {
            let next = self.ribbon.peek();
            if next.is_none() || next.kind() == TokenKind::ScopeEnd {
                return true;
            }
            match self.atomic_code_block(scope) {
                Some(node) => self.graph.attach_to_backbone(scope, node),
                None => return false,
            }
        }
    }

    fn atomic_code_block(&mut self, scope: ScopeId) -> Option<NodeId> {
        match self.ribbon.peek().kind() {
            TokenKind::ScopeBegin => self.scoped_block(scope),
            TokenKind::KeywordIf => self.if_block(scope),
            TokenKind::KeywordFor => self.for_block(scope),
            TokenKind::KeywordWhile => self.while_block(scope),
            TokenKind::EndOfInstruction => self.empty_block(scope),
            _ => self.expression_block(scope),
        }
    }

    fn scoped_block(&mut self, scope: ScopeId) -> Option<NodeId> {
        let guard = self.begin_transaction();
        let Some(begin_token) = self.eat_exact(TokenKind::ScopeBegin) else {
            self.rollback_transaction(guard);
            return None;
        };
        let node = self.new_node(NodeKind::Scope, scope);
        let inner = self.internal_scope_of(node);
        if !self.code_block(inner) {
            self.rollback_transaction(guard);
            return None;
        }
        let Some(end_token) = self.eat_exact(TokenKind::ScopeEnd) else {
            self.rollback_transaction(guard);
            return None;
        };
        self.graph.scope_mut(inner).expect("just created").set_begin_token(begin_token);
        self.graph.scope_mut(inner).expect("just created").set_end_token(end_token);
        self.commit_transaction(guard);
        Some(node)
    }

    fn expression_block(&mut self, scope: ScopeId) -> Option<NodeId> {
        let guard = self.begin_transaction();
        let Some(node) = self.expression(scope, 0) else {
            self.rollback_transaction(guard);
            return None;
        };
        let node = self.apply_rewriting_rule(scope, node);
        if let Some(token) = self.eat_exact(TokenKind::EndOfInstruction) {
            self.graph.node_mut(node).expect("exists").set_suffix_token(token);
        }
        self.commit_transaction(guard);
        Some(node)
    }

    /// If the expression's result is a bare `variable` node that this
    /// statement did not itself declare — i.e. it was already part of the
    /// flow, declared by an earlier statement — substitute a fresh
    /// `variable_ref` so a `variable` node never appears twice in the
    /// flow. Unreachable with the grammar's current `atom` resolution
    /// (identifiers always resolve to a reference already), but kept as
    /// the invariant's explicit enforcement point.
    fn apply_rewriting_rule(&mut self, scope: ScopeId, node: NodeId) -> NodeId {
        let is_stale_variable = self.graph.node(node).is_some_and(|n| n.kind() == NodeKind::Variable)
            && !self.current_transaction_created(node);
        if !is_stale_variable {
            return node;
        }
        let name = self.graph.node(node).expect("checked above").name().to_string();
        self.make_variable_ref(scope, &name, node)
    }

    fn make_variable_ref(&mut self, scope: ScopeId, name: &str, variable: NodeId) -> NodeId {
        let node = self.new_node(NodeKind::VariableRef, scope);
        self.graph.node_mut(node).expect("exists").set_name(name);
        let ref_out = self
            .graph
            .find_slot(variable, "value", Direction::Output, Order::Second)
            .expect("variable has a reference-output slot");
        let ref_in = self
            .graph
            .find_slot(node, "value", Direction::Input, Order::First)
            .expect("variable_ref has a value input slot");
        self.graph.connect(ref_out, ref_in, ConnectFlags::NONE);
        node
    }

    fn if_block(&mut self, scope: ScopeId) -> Option<NodeId> {
        let guard = self.begin_transaction();
        let Some(if_token) = self.eat_exact(TokenKind::KeywordIf) else {
            self.rollback_transaction(guard);
            return None;
        };
        if self.eat_exact(TokenKind::ParenthesisOpen).is_none() {
            self.rollback_transaction(guard);
            return None;
        }
        let node = self.new_node(NodeKind::If, scope);
        self.graph.node_mut(node).expect("exists").set_token(TOKEN_KEYWORD, if_token);
        let internal = self.internal_scope_of(node);

        if self.ribbon.peek().kind() != TokenKind::ParenthesisClose {
            let Some(condition) = self.expression(internal, 0) else {
                self.rollback_transaction(guard);
                return None;
            };
            self.wire_condition(node, condition);
        }
        if self.eat_exact(TokenKind::ParenthesisClose).is_none() {
            self.rollback_transaction(guard);
            return None;
        }

        let true_scope = self.partition_scope(node, 0);
        let Some(true_body) = self.atomic_code_block(true_scope) else {
            self.rollback_transaction(guard);
            return None;
        };
        self.graph.attach_to_backbone(true_scope, true_body);

        if self.ribbon.peek().kind() == TokenKind::KeywordElse {
            let else_token = self.ribbon.eat();
            self.graph.node_mut(node).expect("exists").set_token(TOKEN_ELSE, else_token);
            let false_scope = self.partition_scope(node, 1);
            let Some(false_body) = self.atomic_code_block(false_scope) else {
                self.rollback_transaction(guard);
                return None;
            };
            self.graph.attach_to_backbone(false_scope, false_body);
        }

        self.commit_transaction(guard);
        Some(node)
    }

    fn wire_condition(&mut self, node: NodeId, condition: NodeId) {
        let Some(cond_out) = self.primary_output_slot(condition) else { return };
        let Some(cond_in) = self.graph.find_slot(node, "condition", Direction::Input, Order::First) else { return };
        self.graph.connect(cond_out, cond_in, ConnectFlags::NONE);
    }

    fn for_block(&mut self, scope: ScopeId) -> Option<NodeId> {
        let guard = self.begin_transaction();
        let Some(for_token) = self.eat_exact(TokenKind::KeywordFor) else {
            self.rollback_transaction(guard);
            return None;
        };
        if self.eat_exact(TokenKind::ParenthesisOpen).is_none() {
            self.rollback_transaction(guard);
            return None;
        }
        let node = self.new_node(NodeKind::ForLoop, scope);
        self.graph.node_mut(node).expect("exists").set_token(TOKEN_KEYWORD, for_token);
        let internal = self.internal_scope_of(node);

        if self.ribbon.peek().kind() != TokenKind::EndOfInstruction {
            let Some(init) = self.expression(internal, 0) else {
                self.rollback_transaction(guard);
                return None;
            };
            if let (Some(out), Some(inp)) = (
                self.primary_output_slot(init),
                self.graph.find_slot(node, "initialization", Direction::Input, Order::First),
            ) {
                self.graph.connect(out, inp, ConnectFlags::NONE);
            }
        }
        if self.eat_exact(TokenKind::EndOfInstruction).is_none() {
            self.rollback_transaction(guard);
            return None;
        }

        if self.ribbon.peek().kind() != TokenKind::EndOfInstruction {
            let Some(condition) = self.expression(internal, 0) else {
                self.rollback_transaction(guard);
                return None;
            };
            self.wire_condition(node, condition);
        }
        if self.eat_exact(TokenKind::EndOfInstruction).is_none() {
            self.rollback_transaction(guard);
            return None;
        }

        if self.ribbon.peek().kind() != TokenKind::ParenthesisClose {
            let Some(iteration) = self.expression(internal, 0) else {
                self.rollback_transaction(guard);
                return None;
            };
            if let (Some(out), Some(inp)) = (
                self.primary_output_slot(iteration),
                self.graph.find_slot(node, "iteration", Direction::Input, Order::First),
            ) {
                self.graph.connect(out, inp, ConnectFlags::NONE);
            }
        }
        if self.eat_exact(TokenKind::ParenthesisClose).is_none() {
            self.rollback_transaction(guard);
            return None;
        }

        let body_scope = self.partition_scope(node, 0);
        let Some(body) = self.atomic_code_block(body_scope) else {
            self.rollback_transaction(guard);
            return None;
        };
        self.graph.attach_to_backbone(body_scope, body);
        self.commit_transaction(guard);
        Some(node)
    }

    fn while_block(&mut self, scope: ScopeId) -> Option<NodeId> {
        let guard = self.begin_transaction();
        let Some(while_token) = self.eat_exact(TokenKind::KeywordWhile) else {
            self.rollback_transaction(guard);
            return None;
        };
        if self.eat_exact(TokenKind::ParenthesisOpen).is_none() {
            self.rollback_transaction(guard);
            return None;
        }
        let node = self.new_node(NodeKind::WhileLoop, scope);
        self.graph.node_mut(node).expect("exists").set_token(TOKEN_KEYWORD, while_token);
        let internal = self.internal_scope_of(node);

        if self.ribbon.peek().kind() != TokenKind::ParenthesisClose {
            let Some(condition) = self.expression(internal, 0) else {
                self.rollback_transaction(guard);
                return None;
            };
            self.wire_condition(node, condition);
        }
        if self.eat_exact(TokenKind::ParenthesisClose).is_none() {
            self.rollback_transaction(guard);
            return None;
        }

        let body_scope = self.partition_scope(node, 0);
        let Some(body) = self.atomic_code_block(body_scope) else {
            self.rollback_transaction(guard);
            return None;
        };
        self.graph.attach_to_backbone(body_scope, body);
        self.commit_transaction(guard);
        Some(node)
    }

    fn empty_block(&mut self, scope: ScopeId) -> Option<NodeId> {
        let guard = self.begin_transaction();
        let Some(token) = self.eat_exact(TokenKind::EndOfInstruction) else {
            self.rollback_transaction(guard);
            return None;
        };
        let node = self.new_node(NodeKind::EmptyInstruction, scope);
        self.graph.node_mut(node).expect("exists").set_suffix_token(token);
        self.commit_transaction(guard);
        Some(node)
    }

    /// Precedence-climbing binary expression parser: while the next token
    /// is a binary operator whose precedence is at least `min_precedence`,
    /// consume it and recurse into the right operand at one precedence
    /// level higher (the standard left-associative climb; the left
    /// operand of an equal-precedence operator is never re-absorbed into
    /// the right side).
    fn expression(&mut self, scope: ScopeId, min_precedence: u8) -> Option<NodeId> {
        let mut left = self.operand(scope)?;
        loop {
            let token = self.ribbon.peek();
            if token.kind() != TokenKind::Operator {
                break;
            }
            let Some(def) = self.language.operator(token.lexeme()) else { break };
            if def.arity != Arity::Binary || def.precedence < min_precedence {
                break;
            }
            let op_token = self.ribbon.eat();
            let right = self.expression(scope, def.precedence + 1)?;
            left = self.build_binary_operator(scope, op_token, left, right)?;
        }
        Some(left)
    }

    fn operand(&mut self, scope: ScopeId) -> Option<NodeId> {
        let token = self.ribbon.peek();
        match token.kind() {
            TokenKind::ParenthesisOpen => self.parens(scope),
            TokenKind::Operator if is_unary_operator(token.lexeme()) => self.unary(scope),
            TokenKind::KeywordOperator => self.operator_call(scope),
            TokenKind::Identifier => self.try_call(scope).or_else(|| self.atom(scope)),
            kind if kind.is_type_keyword() => self.try_var_decl(scope),
            _ => self.atom(scope),
        }
    }

    fn parens(&mut self, scope: ScopeId) -> Option<NodeId> {
        let guard = self.begin_transaction();
        if self.eat_exact(TokenKind::ParenthesisOpen).is_none() {
            self.rollback_transaction(guard);
            return None;
        }
        let Some(inner) = self.expression(scope, 0) else {
            self.rollback_transaction(guard);
            return None;
        };
        if self.eat_exact(TokenKind::ParenthesisClose).is_none() {
            self.rollback_transaction(guard);
            return None;
        }
        self.commit_transaction(guard);
        Some(inner)
    }

    fn unary(&mut self, scope: ScopeId) -> Option<NodeId> {
        let guard = self.begin_transaction();
        let token = self.ribbon.peek();
        if token.kind() != TokenKind::Operator || !is_unary_operator(token.lexeme()) {
            self.rollback_transaction(guard);
            return None;
        }
        let op_token = self.ribbon.eat();
        let operand = if self.ribbon.peek().kind() == TokenKind::ParenthesisOpen {
            self.parens(scope)
        } else {
            self.atom(scope)
        };
        let Some(operand) = operand else {
            self.rollback_transaction(guard);
            return None;
        };
        let Some(node) = self.build_unary_operator(scope, op_token, operand) else {
            self.rollback_transaction(guard);
            return None;
        };
        self.commit_transaction(guard);
        Some(node)
    }

    fn build_binary_operator(&mut self, scope: ScopeId, op_token: Token, left: NodeId, right: NodeId) -> Option<NodeId> {
        let node = self.new_node(NodeKind::Operator, scope);
        self.graph.node_mut(node).expect("exists").set_name(op_token.lexeme().to_string());
        self.graph.node_mut(node).expect("exists").set_token(TOKEN_OPERATOR, op_token);
        let left_out = self.primary_output_slot(left)?;
        let right_out = self.primary_output_slot(right)?;
        let lvalue_in = self.graph.find_slot(node, "lvalue", Direction::Input, Order::First)?;
        let rvalue_in = self.graph.find_slot(node, "rvalue", Direction::Input, Order::Second)?;
        self.graph.connect(left_out, lvalue_in, ConnectFlags::NONE);
        self.graph.connect(right_out, rvalue_in, ConnectFlags::NONE);
        Some(node)
    }

    fn build_unary_operator(&mut self, scope: ScopeId, op_token: Token, operand: NodeId) -> Option<NodeId> {
        let node = self.new_node(NodeKind::Operator, scope);
        self.graph.node_mut(node).expect("exists").set_name(op_token.lexeme().to_string());
        self.graph.node_mut(node).expect("exists").set_token(TOKEN_OPERATOR, op_token);
        let operand_out = self.primary_output_slot(operand)?;
        let lvalue_in = self.graph.find_slot(node, "lvalue", Direction::Input, Order::First)?;
        self.graph.connect(operand_out, lvalue_in, ConnectFlags::NONE);
        Some(node)
    }

    /// `call := identifier '(' (expression (',' expression)*)? ')'`.
    fn try_call(&mut self, scope: ScopeId) -> Option<NodeId> {
        let guard = self.begin_transaction();
        let Some(identifier_token) = self.eat_exact(TokenKind::Identifier) else {
            self.rollback_transaction(guard);
            return None;
        };
        if self.eat_exact(TokenKind::ParenthesisOpen).is_none() {
            self.rollback_transaction(guard);
            return None;
        }
        let name = identifier_token.lexeme().to_string();
        let Some(node) = self.finish_call(scope, name, 0) else {
            self.rollback_transaction(guard);
            return None;
        };
        self.graph.node_mut(node).expect("exists").set_token(TOKEN_IDENTIFIER, identifier_token);
        self.commit_transaction(guard);
        Some(node)
    }

    /// `'operator' operator '(' expression (',' expression)* ')'` — at
    /// least one argument is mandatory, unlike a plain identifier call.
    fn operator_call(&mut self, scope: ScopeId) -> Option<NodeId> {
        let guard = self.begin_transaction();
        let Some(keyword_token) = self.eat_exact(TokenKind::KeywordOperator) else {
            self.rollback_transaction(guard);
            return None;
        };
        let op_token = self.ribbon.peek();
        if op_token.kind() != TokenKind::Operator || self.language.operator(op_token.lexeme()).is_none() {
            self.rollback_transaction(guard);
            return None;
        }
        let op_token = self.ribbon.eat();
        if self.eat_exact(TokenKind::ParenthesisOpen).is_none() {
            self.rollback_transaction(guard);
            return None;
        }
        let name = op_token.lexeme().to_string();
        let Some(node) = self.finish_call(scope, name, 1) else {
            self.rollback_transaction(guard);
            return None;
        };
        // `TOKEN_KEYWORD` carries the `operator` keyword itself; the
        // serializer prints it ahead of `TOKEN_OPERATOR` only when
        // present, which is how it tells this form apart from a plain
        // identifier call.
        self.graph.node_mut(node).expect("exists").set_token(TOKEN_KEYWORD, keyword_token);
        self.graph.node_mut(node).expect("exists").set_token(TOKEN_OPERATOR, op_token);
        self.commit_transaction(guard);
        Some(node)
    }

    /// Parses the `(args)` tail shared by both call forms, given the
    /// opening `(` already consumed. `min_args` distinguishes a regular
    /// call (zero or more) from an `operator` call (at least one).
    fn finish_call(&mut self, scope: ScopeId, name: String, min_args: usize) -> Option<NodeId> {
        let node = self.new_node(NodeKind::FunctionCall, scope);
        self.graph.node_mut(node).expect("exists").set_name(name);
        let mut count = 0usize;
        if self.ribbon.peek().kind() != TokenKind::ParenthesisClose {
            loop {
                let arg = self.expression(scope, 0)?;
                let arg_out = self.primary_output_slot(arg)?;
                let arg_prop_name = format!("arg{count}");
                self.graph.declare_argument(node, arg_prop_name.clone());
                let arg_in = self.graph.find_slot(node, &arg_prop_name, Direction::Input, Order::First)?;
                self.graph.connect(arg_out, arg_in, ConnectFlags::NONE);
                count += 1;
                if self.ribbon.eat_if(TokenKind::ListSeparator).is_none() {
                    break;
                }
            }
        }
        if count < min_args {
            return None;
        }
        self.eat_exact(TokenKind::ParenthesisClose)?;
        Some(node)
    }

    /// `var_decl := type_keyword identifier ('=' expression)?`.
    fn try_var_decl(&mut self, scope: ScopeId) -> Option<NodeId> {
        let guard = self.begin_transaction();
        if !self.ribbon.peek().kind().is_type_keyword() {
            self.rollback_transaction(guard);
            return None;
        }
        let type_token = self.ribbon.eat();
        let Some(identifier_token) = self.eat_exact(TokenKind::Identifier) else {
            self.rollback_transaction(guard);
            return None;
        };
        let name = identifier_token.lexeme().to_string();
        let node = self.new_node(NodeKind::Variable, scope);
        self.graph.node_mut(node).expect("exists").set_name(name.clone());
        self.graph.node_mut(node).expect("exists").set_token(TOKEN_TYPE, type_token.clone());
        self.graph.node_mut(node).expect("exists").set_token(TOKEN_IDENTIFIER, identifier_token);
        let value_ty = self.language.type_of_keyword(type_token.kind()).unwrap_or(ValueType::Any);
        if let Some(value_prop) = self.graph.node(node).expect("exists").property("value") {
            self.graph.property_mut(value_prop).expect("exists").set_value_type(value_ty);
        }

        if !self.graph.declare_variable(scope, name.clone(), node) {
            self.push_diagnostic(Diagnostic::error(
                diagnostic_codes::PARSE_PRODUCTION_FAILED,
                Span::new(type_token.body().start, type_token.body().end),
                format!("'{name}' is already declared in this scope"),
            ));
            self.rollback_transaction(guard);
            return None;
        }

        if let Some(assign_token) = self.ribbon.peek_kind(TokenKind::Operator).filter(|t| t.lexeme() == "=") {
            self.ribbon.eat();
            let Some(init) = self.expression(scope, 0) else {
                self.rollback_transaction(guard);
                return None;
            };
            self.graph.node_mut(node).expect("exists").set_token(TOKEN_ASSIGN, assign_token);
            let Some(init_out) = self.primary_output_slot(init) else {
                self.rollback_transaction(guard);
                return None;
            };
            let Some(value_in) = self.graph.find_slot(node, "value", Direction::Input, Order::First) else {
                self.rollback_transaction(guard);
                return None;
            };
            self.graph.connect(init_out, value_in, ConnectFlags::ALLOW_SIDE_EFFECTS);
        }

        self.commit_transaction(guard);
        Some(node)
    }

    /// `atom := literal | identifier`.
    fn atom(&mut self, scope: ScopeId) -> Option<NodeId> {
        let guard = self.begin_transaction();
        let token = self.ribbon.peek();
        let node = if token.kind().is_literal() {
            self.ribbon.eat();
            Some(self.build_literal(scope, token))
        } else if token.kind() == TokenKind::Identifier {
            self.ribbon.eat();
            self.resolve_identifier(scope, &token)
        } else {
            None
        };
        match node {
            Some(node) => {
                self.commit_transaction(guard);
                Some(node)
            }
            None => {
                self.rollback_transaction(guard);
                None
            }
        }
    }

    fn build_literal(&mut self, scope: ScopeId, token: Token) -> NodeId {
        let node = self.new_node(NodeKind::Literal, scope);
        let value_ty = match token.kind() {
            TokenKind::LiteralBool => ValueType::Bool,
            TokenKind::LiteralInt => ValueType::Int,
            TokenKind::LiteralDouble => ValueType::Double,
            TokenKind::LiteralString => ValueType::String,
            _ => ValueType::Any,
        };
        if let Some(value_prop) = self.graph.node(node).expect("just created").property("value") {
            self.graph.property_mut(value_prop).expect("just created").set_value_type(value_ty);
            self.graph.property_mut(value_prop).expect("just created").set_token(token);
        }
        node
    }

    /// Resolves an identifier atom to a `variable_ref` pointing at its
    /// declaration, recursing into parent scopes. Strict mode fails on an
    /// undeclared name; permissive mode emits an `any`-typed, unconnected
    /// `variable_ref` and marks the parse incomplete.
    fn resolve_identifier(&mut self, scope: ScopeId, token: &Token) -> Option<NodeId> {
        let name = token.lexeme().to_string();
        if let Some(variable) = self.graph.find_variable(&name, scope, LookupFlags::RECURSE_PARENT_SCOPES) {
            let node = self.make_variable_ref(scope, &name, variable);
            self.graph.node_mut(node).expect("exists").set_token(TOKEN_IDENTIFIER, token.clone());
            return Some(node);
        }

        let span = Span::new(token.body().start, token.body().end);
        match self.mode {
            ResolutionMode::Strict => {
                self.push_diagnostic(Diagnostic::error(
                    diagnostic_codes::UNDECLARED_IDENTIFIER,
                    span,
                    format!("undeclared identifier '{name}'"),
                ));
                None
            }
            ResolutionMode::Permissive => {
                let node = self.new_node(NodeKind::VariableRef, scope);
                self.graph.node_mut(node).expect("exists").set_name(name.clone());
                self.graph.node_mut(node).expect("exists").set_token(TOKEN_IDENTIFIER, token.clone());
                self.push_diagnostic(Diagnostic::warning(
                    diagnostic_codes::UNDECLARED_IDENTIFIER,
                    span,
                    format!("undeclared identifier '{name}' resolved permissively"),
                ));
                self.complete = false;
                Some(node)
            }
        }
    }
}

/// Scans the ribbon once for balanced parentheses and operator placement
/// errors before any graph mutation happens, per the parser's pre-parse
/// validity check.
pub(crate) fn check_ribbon_validity(ribbon: &TokenRibbon, diagnostics: &mut DiagnosticBag) -> bool {
    let mut depth: i32 = 0;
    let mut ok = true;
    let mut previous_was_operator = false;

    for token in ribbon.tokens() {
        match token.kind() {
            TokenKind::ParenthesisOpen => depth += 1,
            TokenKind::ParenthesisClose => {
                depth -= 1;
                if depth < 0 {
                    diagnostics.push(Diagnostic::error(
                        diagnostic_codes::SYNTAX_UNBALANCED_PARENS,
                        Span::new(token.body().start, token.body().end),
                        "unbalanced parentheses",
                    ));
                    ok = false;
                    depth = 0;
                }
            }
            TokenKind::Operator => {
                if previous_was_operator {
                    diagnostics.push(Diagnostic::error(
                        diagnostic_codes::SYNTAX_OPERATOR_FOLLOWED_BY_OPERATOR,
                        Span::new(token.body().start, token.body().end),
                        "an operator cannot directly follow another operator",
                    ));
                    ok = false;
                }
            }
            _ => {}
        }
        previous_was_operator = token.kind() == TokenKind::Operator;
    }

    if depth != 0 {
        let pos = u32::try_from(ribbon.buffer().len()).unwrap_or(u32::MAX);
        diagnostics.push(Diagnostic::error(diagnostic_codes::SYNTAX_UNBALANCED_PARENS, Span::at(pos), "unbalanced parentheses"));
        ok = false;
    }
    if previous_was_operator {
        let pos = u32::try_from(ribbon.buffer().len()).unwrap_or(u32::MAX);
        diagnostics.push(Diagnostic::error(diagnostic_codes::SYNTAX_TRAILING_OPERATOR, Span::at(pos), "trailing operator"));
        ok = false;
    }
    ok
}

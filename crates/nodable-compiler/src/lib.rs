//! Lowers a [`Graph`] into [`Bytecode`] per `spec.md` §4.5: a flat,
//! jump-addressed instruction stream the virtual machine executes
//! starting at index 0.

mod instruction;
mod invokable;
mod value;

pub use instruction::{Bytecode, Instruction, Operand, Register};
pub use invokable::{builtin_invokables, resolve, FunctionId, Invokable};
pub use value::Value;

use nodable_common::diagnostics::{diagnostic_codes, Diagnostic, DiagnosticBag};
use nodable_common::span::Span;
use nodable_graph::{Direction, Graph, NodeId, NodeKind, Order, ScopeId};
use nodable_lang::ValueType;
use tracing::debug;

/// Lowers `graph` into bytecode, or `None` if pre-compilation validity
/// checks fail or any node fails to lower. Never produces a partial
/// program — see `spec.md` §4.5's "never partially compiles".
#[must_use]
pub fn compile(graph: &Graph) -> Option<Bytecode> {
    let mut compiler = Compiler::new(graph);
    if !compiler.validate() {
        for diagnostic in compiler.diagnostics.entries() {
            debug!(%diagnostic, "compile validation failed");
        }
        return None;
    }
    compiler.compile_root()
}

/// `=` has no invokable entry (see `invokable::builtin_invokables`):
/// assignment isn't a two-value operation with a result type, it's a
/// store into a frame slot that already exists. Both `validate` and the
/// lowering pass special-case it ahead of the generic invokable path.
const ASSIGNMENT_OPERATOR: &str = "=";

struct Compiler<'a> {
    graph: &'a Graph,
    invokables: Vec<Invokable>,
    diagnostics: DiagnosticBag,
    bytecode: Bytecode,
}

impl<'a> Compiler<'a> {
    fn new(graph: &'a Graph) -> Self {
        Self {
            graph,
            invokables: builtin_invokables(),
            diagnostics: DiagnosticBag::new(),
            bytecode: Bytecode::default(),
        }
    }

    fn error(&mut self, code: u32, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(code, Span::at(0), message.into()));
    }

    // ---- pre-compilation validity --------------------------------------

    /// Walks every node in the graph: every `Operator`/`FunctionCall` node
    /// must resolve to a registered invokable (assignment is the one
    /// exception — it lowers to a store, not a call, so it only needs a
    /// resolvable target, see [`Self::assignment_target`]), and every
    /// `Variable` node must have a scope. Returns `false` (with
    /// diagnostics appended) on the first violation found, but keeps
    /// scanning so a caller inspecting `diagnostics` sees every problem,
    /// not just the first.
    fn validate(&mut self) -> bool {
        let mut ok = true;
        let node_ids: Vec<NodeId> = self.graph.nodes().map(|(id, _)| id).collect();
        for node_id in node_ids {
            let Some(node) = self.graph.node(node_id) else { continue };
            match node.kind() {
                NodeKind::Operator if node.name() == ASSIGNMENT_OPERATOR => {
                    if self.assignment_target(node_id).is_none() {
                        self.error(
                            diagnostic_codes::COMPILE_INVOKABLE_NOT_FOUND,
                            "'=' has no assignable variable on its left-hand side",
                        );
                        ok = false;
                    }
                }
                NodeKind::Operator | NodeKind::FunctionCall => {
                    if self.resolve_invokable(node_id).is_none() {
                        self.error(
                            diagnostic_codes::COMPILE_INVOKABLE_NOT_FOUND,
                            format!("no invokable registered for '{}'", node.name()),
                        );
                        ok = false;
                    }
                }
                NodeKind::Variable => {
                    if self.graph.scope(node.scope()).is_none() {
                        self.error(
                            diagnostic_codes::COMPILE_MISSING_SCOPE,
                            format!("variable '{}' has no owning scope", node.name()),
                        );
                        ok = false;
                    }
                }
                _ => {}
            }
        }
        ok
    }

    /// The call/operator name to resolve against the invokable table:
    /// `Operator` nodes are named after their symbol already; a
    /// `FunctionCall` built from `operator_call` syntax is likewise named
    /// after the symbol (see `nodable-parser`'s `operator_call`), so both
    /// kinds resolve through the same path.
    fn resolve_invokable(&self, node_id: NodeId) -> Option<FunctionId> {
        let arg_types = self.argument_types(node_id);
        let node = self.graph.node(node_id)?;
        resolve(&self.invokables, node.name(), &arg_types)
    }

    fn argument_types(&self, node_id: NodeId) -> Vec<ValueType> {
        self.call_arguments(node_id).into_iter().map(|arg| self.value_type_of(arg)).collect()
    }

    /// Returns the connected source node for each of `node_id`'s value
    /// input slots, in declaration order: `lvalue`/`rvalue` for an
    /// `Operator` (rvalue omitted for a unary operator), or each declared
    /// argument property for a `FunctionCall`.
    fn call_arguments(&self, node_id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.graph.node(node_id) else { return Vec::new() };
        match node.kind() {
            NodeKind::Operator => {
                let mut args = Vec::new();
                if let Some(lvalue) = self.source_node(node_id, "lvalue", Order::First) {
                    args.push(lvalue);
                }
                if let Some(rvalue) = self.source_node(node_id, "rvalue", Order::Second) {
                    args.push(rvalue);
                }
                args
            }
            NodeKind::FunctionCall => node
                .properties()
                .filter(|&(name, _)| name != nodable_graph::THIS_PROPERTY_NAME && name != "result")
                .filter_map(|(name, _)| self.source_node(node_id, name, Order::First))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn source_node(&self, node_id: NodeId, property_name: &str, order: Order) -> Option<NodeId> {
        let slot_id = self.graph.find_slot(node_id, property_name, Direction::Input, order)?;
        let slot = self.graph.slot(slot_id)?;
        let adjacent = slot.first_adjacent()?;
        self.graph.slot(adjacent).map(|s| s.owner())
    }

    /// The `Variable` node an `=` operator's `lvalue` ultimately writes
    /// into. The parser always wires an identifier's use through a
    /// `variable_ref` (see `nodable_parser::Parser::resolve_identifier`),
    /// so `lvalue` is ordinarily a `VariableRef`; a bare `Variable` is
    /// accepted too in case that rewriting is ever bypassed.
    fn assignment_target(&self, node_id: NodeId) -> Option<NodeId> {
        let lvalue = self.source_node(node_id, "lvalue", Order::First)?;
        match self.graph.node(lvalue)?.kind() {
            NodeKind::Variable => Some(lvalue),
            NodeKind::VariableRef => self.source_node(lvalue, "value", Order::First),
            _ => None,
        }
    }

    /// The static type of whatever flows out of `node_id`: a literal or
    /// declared variable's own type, a `variable_ref`'s type by following
    /// through to its declaration, or `Any` for anything computed
    /// (operator/call results aren't type-propagated, matching the parser,
    /// which never updates a `result`/`rvalue` property's declared type
    /// after `install_shape`).
    fn value_type_of(&self, node_id: NodeId) -> ValueType {
        let Some(node) = self.graph.node(node_id) else { return ValueType::Any };
        match node.kind() {
            NodeKind::Literal | NodeKind::Variable => node
                .property("value")
                .and_then(|p| self.graph.property(p))
                .map_or(ValueType::Any, |p| p.value_type()),
            NodeKind::VariableRef => self
                .source_node(node_id, "value", Order::First)
                .map_or(ValueType::Any, |v| self.value_type_of(v)),
            _ => ValueType::Any,
        }
    }

    // ---- lowering --------------------------------------------------------

    fn compile_root(&mut self) -> Option<Bytecode> {
        let root_scope = self.graph.root_scope();
        self.compile_scope(root_scope)?;
        self.bytecode.push(Instruction::Ret);
        Some(std::mem::take(&mut self.bytecode))
    }

    fn compile_scope(&mut self, scope_id: ScopeId) -> Option<()> {
        let scope = self.graph.scope(scope_id)?;
        let variables: Vec<NodeId> = scope.variables().map(|(_, id)| id).collect();
        let backbone: Vec<NodeId> = scope.backbone().to_vec();

        self.bytecode.push(Instruction::PushStackFrame(scope_id));
        for &variable in &variables {
            self.bytecode.push(Instruction::PushVar(variable));
        }
        for node_id in backbone {
            self.compile_statement(node_id)?;
        }
        for &variable in variables.iter().rev() {
            self.bytecode.push(Instruction::PopVar(variable));
        }
        self.bytecode.push(Instruction::PopStackFrame(scope_id));
        Some(())
    }

    fn compile_statement(&mut self, node_id: NodeId) -> Option<()> {
        let kind = self.graph.node(node_id)?.kind();
        match kind {
            NodeKind::EmptyInstruction | NodeKind::Default => Some(()),
            NodeKind::Variable => self.compile_variable_declaration(node_id),
            NodeKind::Operator if self.is_assignment(node_id) => {
                self.compile_assignment(node_id)?;
                Some(())
            }
            NodeKind::Operator | NodeKind::FunctionCall => {
                self.compile_call(node_id)?;
                Some(())
            }
            NodeKind::If => self.compile_if(node_id),
            NodeKind::ForLoop => self.compile_for(node_id),
            NodeKind::WhileLoop => self.compile_while(node_id),
            NodeKind::Scope => self.compile_scope(self.graph.node(node_id)?.internal_scope()?),
            NodeKind::VariableRef | NodeKind::Literal => {
                self.compile_operand(node_id);
                Some(())
            }
        }
    }

    /// The variable's frame slot was already allocated by its owning
    /// scope's `push_var` (hoisted ahead of every statement); here we only
    /// evaluate the initializer, if any, and store it.
    fn compile_variable_declaration(&mut self, node_id: NodeId) -> Option<()> {
        if let Some(init) = self.source_node(node_id, "value", Order::First) {
            self.compile_operand(init);
            self.bytecode.push(Instruction::Mov {
                dst: Operand::Variable(node_id),
                src: Operand::Register(Register::Rax),
            });
        }
        Some(())
    }

    /// Compiles whatever produces `node_id`'s value, leaving the result in
    /// `rax`. A `Variable` reached this way is a load, never a
    /// re-declaration — it was declared once, by its owning scope.
    fn compile_operand(&mut self, node_id: NodeId) {
        let Some(node) = self.graph.node(node_id) else { return };
        match node.kind() {
            NodeKind::Literal => {
                let value = self.literal_value(node_id);
                self.bytecode.push(Instruction::Mov {
                    dst: Operand::Register(Register::Rax),
                    src: Operand::Immediate(value),
                });
            }
            NodeKind::Variable => {
                self.bytecode.push(Instruction::Mov {
                    dst: Operand::Register(Register::Rax),
                    src: Operand::Variable(node_id),
                });
            }
            NodeKind::VariableRef => {
                if let Some(variable) = self.source_node(node_id, "value", Order::First) {
                    self.compile_operand(variable);
                }
            }
            NodeKind::Operator if self.is_assignment(node_id) => {
                self.compile_assignment(node_id);
            }
            NodeKind::Operator | NodeKind::FunctionCall => {
                self.compile_call(node_id);
            }
            _ => {}
        }
    }

    fn is_assignment(&self, node_id: NodeId) -> bool {
        self.graph.node(node_id).is_some_and(|n| n.name() == ASSIGNMENT_OPERATOR)
    }

    /// Lowers `lvalue = rvalue` straight to a store: evaluate the rvalue
    /// into `rax`, then `mov` it into the target variable's frame slot
    /// (already allocated by the variable's own declaration). Leaves the
    /// assigned value in `rax`, so `=` can itself be used as an operand
    /// (`y = x = 1;`).
    fn compile_assignment(&mut self, node_id: NodeId) -> Option<()> {
        let rvalue = self.source_node(node_id, "rvalue", Order::Second)?;
        self.compile_operand(rvalue);
        let target = self.assignment_target(node_id)?;
        self.bytecode.push(Instruction::Mov { dst: Operand::Variable(target), src: Operand::Register(Register::Rax) });
        Some(())
    }

    fn literal_value(&self, node_id: NodeId) -> Value {
        let Some(node) = self.graph.node(node_id) else { return Value::Void };
        let Some(property) = node.property("value").and_then(|p| self.graph.property(p)) else {
            return Value::Void;
        };
        let Some(text) = property.token().map(nodable_scanner::Token::lexeme) else {
            return Value::Void;
        };
        match property.value_type() {
            ValueType::Bool => Value::Bool(text == "true"),
            ValueType::Int => text.parse().map_or(Value::Void, Value::Int),
            ValueType::Double => text.parse().map_or(Value::Void, Value::Double),
            ValueType::String => Value::String(text.trim_matches('"').to_string()),
            _ => Value::Void,
        }
    }

    /// `rdx` holds the first argument (`lvalue`, or a call's first
    /// argument), `rax` the second (`rvalue`, or a call's second
    /// argument) — every registered invokable has arity 1 or 2, so two
    /// scratch slots are always enough.
    fn compile_call(&mut self, node_id: NodeId) -> Option<()> {
        let arguments = self.call_arguments(node_id);
        match arguments.len() {
            0 => {}
            1 => self.compile_operand(arguments[0]),
            2 => {
                self.compile_operand(arguments[0]);
                self.bytecode.push(Instruction::Mov {
                    dst: Operand::Register(Register::Rdx),
                    src: Operand::Register(Register::Rax),
                });
                self.compile_operand(arguments[1]);
            }
            _ => {
                self.error(
                    diagnostic_codes::COMPILE_ARITY_MISMATCH,
                    format!("'{}' takes more arguments than the register model supports", self.graph.node(node_id)?.name()),
                );
                return None;
            }
        }
        let id = self.resolve_invokable(node_id)?;
        self.bytecode.push(Instruction::Call(id));
        Some(())
    }

    /// Evaluates `condition_source` into `rax`, then compares it against
    /// `true` in `rdx` — `spec.md` §4.5's condition-instruction. Callers
    /// branch on the resulting zero flag with `Jne`/`Jeq`.
    fn compile_condition(&mut self, condition_source: NodeId) {
        self.compile_operand(condition_source);
        self.bytecode
            .push(Instruction::Mov { dst: Operand::Register(Register::Rdx), src: Operand::Immediate(Value::Bool(true)) });
        self.bytecode.push(Instruction::Cmp(Register::Rax, Register::Rdx));
    }

    fn compile_if(&mut self, node_id: NodeId) -> Option<()> {
        let condition = self.source_node(node_id, "condition", Order::First)?;
        self.compile_condition(condition);

        let jne_to_else = self.bytecode.push(Instruction::Jne(0));
        let internal_scope = self.graph.node(node_id)?.internal_scope()?;
        let partitions = self.graph.scope(internal_scope)?.partitions();
        let (true_branch, false_branch) = (partitions[0], partitions[1]);
        self.compile_scope(true_branch)?;

        let has_false_branch = !self.graph.scope(false_branch)?.backbone().is_empty();
        if has_false_branch {
            let jmp_to_end = self.bytecode.push(Instruction::Jmp(0));
            self.bytecode.patch(jne_to_else, Instruction::Jne(self.bytecode.next_index()));
            self.compile_scope(false_branch)?;
            self.bytecode.patch(jmp_to_end, Instruction::Jmp(self.bytecode.next_index()));
        } else {
            self.bytecode.patch(jne_to_else, Instruction::Jne(self.bytecode.next_index()));
        }
        Some(())
    }

    fn compile_for(&mut self, node_id: NodeId) -> Option<()> {
        if let Some(init) = self.source_node(node_id, "initialization", Order::First) {
            self.compile_statement(init)?;
        }

        let loop_top = self.bytecode.next_index();
        let condition = self.source_node(node_id, "condition", Order::First)?;
        self.compile_condition(condition);
        let jne_skip_body = self.bytecode.push(Instruction::Jne(0));

        let internal_scope = self.graph.node(node_id)?.internal_scope()?;
        let body = self.graph.scope(internal_scope)?.partitions()[0];
        self.compile_scope(body)?;

        if let Some(iteration) = self.source_node(node_id, "iteration", Order::First) {
            self.compile_statement(iteration)?;
        }

        self.bytecode.push(Instruction::Jmp(loop_top));
        self.bytecode.patch(jne_skip_body, Instruction::Jne(self.bytecode.next_index()));
        Some(())
    }

    fn compile_while(&mut self, node_id: NodeId) -> Option<()> {
        let loop_top = self.bytecode.next_index();
        let condition = self.source_node(node_id, "condition", Order::First)?;
        self.compile_condition(condition);
        let jne_skip_body = self.bytecode.push(Instruction::Jne(0));

        let internal_scope = self.graph.node(node_id)?.internal_scope()?;
        let body = self.graph.scope(internal_scope)?.partitions()[0];
        self.compile_scope(body)?;

        self.bytecode.push(Instruction::Jmp(loop_top));
        self.bytecode.patch(jne_skip_body, Instruction::Jne(self.bytecode.next_index()));
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodable_parser::parse;

    fn compile_source(source: &str) -> Bytecode {
        let mut graph = Graph::new();
        assert!(parse(source, &mut graph), "source failed to parse: {source}");
        compile(&graph).expect("compiles")
    }

    #[test]
    fn variable_declaration_pushes_and_initializes() {
        let bytecode = compile_source("int x = 1;");
        assert!(matches!(bytecode.instructions()[0], Instruction::PushStackFrame(_)));
        assert!(bytecode
            .instructions()
            .iter()
            .any(|i| matches!(i, Instruction::Mov { dst: Operand::Variable(_), .. })));
        assert!(matches!(bytecode.instructions().last(), Some(Instruction::Ret)));
    }

    #[test]
    fn binary_expression_emits_call_with_both_operands() {
        let bytecode = compile_source("1 + 2;");
        let calls: Vec<_> = bytecode.instructions().iter().filter(|i| matches!(i, Instruction::Call(_))).collect();
        assert_eq!(calls.len(), 1);
        assert!(bytecode
            .instructions()
            .iter()
            .any(|i| matches!(i, Instruction::Mov { dst: Operand::Register(Register::Rdx), .. })));
    }

    #[test]
    fn unary_expression_does_not_touch_rdx() {
        let bytecode = compile_source("-(1);");
        assert!(!bytecode
            .instructions()
            .iter()
            .any(|i| matches!(i, Instruction::Mov { dst: Operand::Register(Register::Rdx), .. })));
    }

    #[test]
    fn variable_reference_compiles_as_a_load() {
        let bytecode = compile_source("int x = 1; x;");
        let loads = bytecode
            .instructions()
            .iter()
            .filter(|i| matches!(i, Instruction::Mov { dst: Operand::Register(Register::Rax), src: Operand::Variable(_) }))
            .count();
        assert_eq!(loads, 1);
    }

    #[test]
    fn if_without_else_patches_jne_past_true_branch() {
        let bytecode = compile_source("int x = 1; if(x == 1) { x; }");
        let jne_count = bytecode.instructions().iter().filter(|i| matches!(i, Instruction::Jne(_))).count();
        assert_eq!(jne_count, 1);
        assert!(!bytecode.instructions().iter().any(|i| matches!(i, Instruction::Jmp(_))));
    }

    #[test]
    fn if_else_emits_jmp_past_false_branch() {
        let bytecode = compile_source("int x = 1; if(x == 1) { int y = 2; } else { int y = 3; }");
        assert!(bytecode.instructions().iter().any(|i| matches!(i, Instruction::Jmp(_))));
    }

    #[test]
    fn for_loop_jumps_back_to_condition() {
        let bytecode = compile_source("for(int i = 0; i < 10; i = i + 1) { i; }");
        let Instruction::Jmp(target) = bytecode.instructions().iter().rev().find(|i| matches!(i, Instruction::Jmp(_))).unwrap() else {
            unreachable!()
        };
        assert!(matches!(bytecode.instructions()[*target], Instruction::PushStackFrame(_) | Instruction::Mov { .. }));
    }

    #[test]
    fn assignment_stores_rvalue_into_existing_variable_slot() {
        let bytecode = compile_source("int x = 1; x = 2;");
        let stores = bytecode
            .instructions()
            .iter()
            .filter(|i| matches!(i, Instruction::Mov { dst: Operand::Variable(_), .. }))
            .count();
        assert_eq!(stores, 2, "one store for the declaration's initializer, one for the reassignment");
    }

    #[test]
    fn chained_assignment_leaves_rax_holding_the_assigned_value() {
        let bytecode = compile_source("int x = 1; int y = 0; y = x = 2;");
        let calls = bytecode.instructions().iter().filter(|i| matches!(i, Instruction::Call(_))).count();
        assert_eq!(calls, 0, "assignment lowers to a store, never a call");
    }

    #[test]
    fn empty_program_still_emits_trailing_ret() {
        let bytecode = compile_source("");
        assert!(matches!(bytecode.instructions().first(), Some(Instruction::PushStackFrame(_))));
        assert!(matches!(bytecode.instructions().last(), Some(Instruction::Ret)));
    }
}

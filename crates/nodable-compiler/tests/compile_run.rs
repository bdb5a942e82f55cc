//! Compile-then-run agreement: every concrete program here is both
//! compiled+run through `nodable_vm` and evaluated by a small
//! tree-walking reference evaluator written only for this test (never
//! shipped in non-test code), and the two must agree.

use std::collections::HashMap;

use nodable_compiler::{compile, Value};
use nodable_graph::{Direction, Graph, NodeId, NodeKind, Order, ScopeId};
use nodable_parser::parse;

fn run_both(source: &str) -> (Value, Value) {
    let mut graph = Graph::new();
    assert!(parse(source, &mut graph), "source failed to parse: {source}");
    let bytecode = compile(&graph).expect("compiles");
    let compiled = nodable_vm::run(&bytecode).expect("runs").into_value();
    let walked = eval_source(&graph);
    (compiled, walked)
}

#[test]
fn arithmetic_agrees() {
    let (compiled, walked) = run_both("1 + 2 * 3;");
    assert_eq!(compiled, Value::Int(7));
    assert_eq!(compiled, walked);
}

#[test]
fn variable_initialization_and_reference_agree() {
    let (compiled, walked) = run_both("int x = 10; x + 5;");
    assert_eq!(compiled, Value::Int(15));
    assert_eq!(compiled, walked);
}

#[test]
fn if_else_agrees_on_both_branches() {
    let (compiled, walked) = run_both("int x = 1; if(x == 1) { x + 100; } else { x + 200; }");
    assert_eq!(compiled, Value::Int(101));
    assert_eq!(compiled, walked);

    let (compiled, walked) = run_both("int x = 2; if(x == 1) { x + 100; } else { x + 200; }");
    assert_eq!(compiled, Value::Int(202));
    assert_eq!(compiled, walked);
}

#[test]
fn for_loop_accumulation_agrees() {
    let (compiled, walked) = run_both("int total = 0; for(int i = 0; i < 5; i = i + 1) { total = total + i; }");
    assert_eq!(compiled, Value::Int(10));
    assert_eq!(compiled, walked);
}

#[test]
fn nested_unary_and_binary_agree() {
    let (compiled, walked) = run_both("-(2) * 3;");
    assert_eq!(compiled, Value::Int(-6));
    assert_eq!(compiled, walked);
}

// ---- independent tree-walking reference evaluator ------------------------

fn eval_source(graph: &Graph) -> Value {
    let mut vars: HashMap<NodeId, Value> = HashMap::new();
    exec_scope(graph, graph.root_scope(), &mut vars)
}

fn exec_scope(graph: &Graph, scope: ScopeId, vars: &mut HashMap<NodeId, Value>) -> Value {
    let mut last = Value::Void;
    for &node in graph.scope(scope).expect("scope exists").backbone() {
        last = exec_statement(graph, node, vars);
    }
    last
}

fn exec_statement(graph: &Graph, node_id: NodeId, vars: &mut HashMap<NodeId, Value>) -> Value {
    let node = graph.node(node_id).expect("node exists");
    match node.kind() {
        NodeKind::EmptyInstruction | NodeKind::Default => Value::Void,
        NodeKind::Variable => {
            let value = source_node(graph, node_id, "value", Order::First)
                .map_or(Value::Void, |src| eval_operand(graph, src, vars));
            vars.insert(node_id, value.clone());
            value
        }
        NodeKind::Operator | NodeKind::FunctionCall => eval_operand(graph, node_id, vars),
        NodeKind::If => {
            let condition = source_node(graph, node_id, "condition", Order::First).expect("if has a condition");
            let taken = eval_operand(graph, condition, vars).as_bool().unwrap_or(false);
            let internal = node.internal_scope().expect("if has an internal scope");
            let partitions = graph.scope(internal).expect("scope exists").partitions();
            exec_scope(graph, if taken { partitions[0] } else { partitions[1] }, vars)
        }
        NodeKind::ForLoop => {
            if let Some(init) = source_node(graph, node_id, "initialization", Order::First) {
                exec_statement(graph, init, vars);
            }
            let internal = node.internal_scope().expect("for has an internal scope");
            let body = graph.scope(internal).expect("scope exists").partitions()[0];
            let mut last = Value::Void;
            loop {
                let condition = source_node(graph, node_id, "condition", Order::First).expect("for has a condition");
                if !eval_operand(graph, condition, vars).as_bool().unwrap_or(false) {
                    break;
                }
                last = exec_scope(graph, body, vars);
                if let Some(iteration) = source_node(graph, node_id, "iteration", Order::First) {
                    exec_statement(graph, iteration, vars);
                }
            }
            last
        }
        NodeKind::WhileLoop => {
            let internal = node.internal_scope().expect("while has an internal scope");
            let body = graph.scope(internal).expect("scope exists").partitions()[0];
            let mut last = Value::Void;
            loop {
                let condition = source_node(graph, node_id, "condition", Order::First).expect("while has a condition");
                if !eval_operand(graph, condition, vars).as_bool().unwrap_or(false) {
                    break;
                }
                last = exec_scope(graph, body, vars);
            }
            last
        }
        NodeKind::Scope => exec_scope(graph, node.internal_scope().expect("scope node has internal scope"), vars),
        NodeKind::VariableRef | NodeKind::Literal => eval_operand(graph, node_id, vars),
    }
}

fn eval_operand(graph: &Graph, node_id: NodeId, vars: &mut HashMap<NodeId, Value>) -> Value {
    let node = graph.node(node_id).expect("node exists");
    match node.kind() {
        NodeKind::Literal => literal_value(graph, node_id),
        NodeKind::Variable => vars.get(&node_id).cloned().unwrap_or(Value::Void),
        NodeKind::VariableRef => {
            let variable = source_node(graph, node_id, "value", Order::First).expect("variable_ref is connected");
            eval_operand(graph, variable, vars)
        }
        NodeKind::Operator if node.name() == "=" => {
            let rvalue = source_node(graph, node_id, "rvalue", Order::Second).expect("assignment has an rvalue");
            let value = eval_operand(graph, rvalue, vars);
            let target = assignment_target(graph, node_id).expect("assignment has a target");
            vars.insert(target, value.clone());
            value
        }
        NodeKind::Operator | NodeKind::FunctionCall => {
            let args: Vec<Value> = call_arguments(graph, node_id).into_iter().map(|a| eval_operand(graph, a, vars)).collect();
            apply(node.name(), &args)
        }
        _ => Value::Void,
    }
}

fn assignment_target(graph: &Graph, node_id: NodeId) -> Option<NodeId> {
    let lvalue = source_node(graph, node_id, "lvalue", Order::First)?;
    match graph.node(lvalue)?.kind() {
        NodeKind::Variable => Some(lvalue),
        NodeKind::VariableRef => source_node(graph, lvalue, "value", Order::First),
        _ => None,
    }
}

fn call_arguments(graph: &Graph, node_id: NodeId) -> Vec<NodeId> {
    let node = graph.node(node_id).expect("node exists");
    match node.kind() {
        NodeKind::Operator => {
            let mut args = Vec::new();
            if let Some(lvalue) = source_node(graph, node_id, "lvalue", Order::First) {
                args.push(lvalue);
            }
            if let Some(rvalue) = source_node(graph, node_id, "rvalue", Order::Second) {
                args.push(rvalue);
            }
            args
        }
        NodeKind::FunctionCall => node
            .properties()
            .filter(|&(name, _)| name != nodable_graph::THIS_PROPERTY_NAME && name != "result")
            .filter_map(|(name, _)| source_node(graph, node_id, name, Order::First))
            .collect(),
        _ => Vec::new(),
    }
}

fn source_node(graph: &Graph, node_id: NodeId, property_name: &str, order: Order) -> Option<NodeId> {
    let slot_id = graph.find_slot(node_id, property_name, Direction::Input, order)?;
    let adjacent = graph.slot(slot_id)?.first_adjacent()?;
    graph.slot(adjacent).map(|s| s.owner())
}

fn literal_value(graph: &Graph, node_id: NodeId) -> Value {
    let node = graph.node(node_id).expect("node exists");
    let property = node.property("value").and_then(|p| graph.property(p)).expect("literal has a value property");
    let text = property.token().expect("literal has a token").lexeme();
    match property.value_type() {
        nodable_lang::ValueType::Bool => Value::Bool(text == "true"),
        nodable_lang::ValueType::Int => Value::Int(text.parse().expect("valid int literal")),
        nodable_lang::ValueType::Double => Value::Double(text.parse().expect("valid double literal")),
        nodable_lang::ValueType::String => Value::String(text.trim_matches('"').to_string()),
        _ => Value::Void,
    }
}

fn apply(name: &str, args: &[Value]) -> Value {
    match (name, args) {
        ("+", [Value::String(a), Value::String(b)]) => Value::String(format!("{a}{b}")),
        ("+", [a, b]) => numeric(a, b, |x, y| x + y, |x, y| x + y),
        ("-", [a, b]) => numeric(a, b, |x, y| x - y, |x, y| x - y),
        ("-", [a]) => match a {
            Value::Int(i) => Value::Int(-i),
            other => Value::Double(-other.as_double().expect("numeric operand")),
        },
        ("*", [a, b]) => numeric(a, b, |x, y| x * y, |x, y| x * y),
        ("/", [a, b]) => numeric(a, b, |x, y| x / y, |x, y| x / y),
        ("==", [a, b]) => Value::Bool(values_equal(a, b)),
        ("!=", [a, b]) => Value::Bool(!values_equal(a, b)),
        ("<", [a, b]) => Value::Bool(a.as_double().unwrap() < b.as_double().unwrap()),
        (">", [a, b]) => Value::Bool(a.as_double().unwrap() > b.as_double().unwrap()),
        ("<=", [a, b]) => Value::Bool(a.as_double().unwrap() <= b.as_double().unwrap()),
        (">=", [a, b]) => Value::Bool(a.as_double().unwrap() >= b.as_double().unwrap()),
        ("!", [Value::Bool(b)]) => Value::Bool(!b),
        _ => Value::Void,
    }
}

fn numeric(a: &Value, b: &Value, int_op: fn(i64, i64) -> i64, double_op: fn(f64, f64) -> f64) -> Value {
    if let (Value::Int(x), Value::Int(y)) = (a, b) {
        Value::Int(int_op(*x, *y))
    } else {
        Value::Double(double_op(a.as_double().expect("numeric operand"), b.as_double().expect("numeric operand")))
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Int(_) | Value::Double(_), Value::Int(_) | Value::Double(_)) => a.as_double() == b.as_double(),
        _ => false,
    }
}

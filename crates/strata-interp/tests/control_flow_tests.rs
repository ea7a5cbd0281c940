use super::*;
use strata_ast::{AssignOp, BinaryOp, ClassSpec, ModifierFlags, NodeIndex, TypeSyntax, UnaryOp};
use strata_checker::{CheckerOptions, CheckerState, declare_types};
use strata_solver::TypeRegistry;

fn ty(text: &str) -> TypeSyntax {
    TypeSyntax::parse(text).expect("type syntax")
}

/// Check `class Main { static <ret> run() { statements } }`, run it and
/// return the result with everything printed.
fn run(arena: NodeArena, root: NodeIndex) -> (RuntimeResult<Value>, String) {
    let mut arena = arena;
    let mut registry = TypeRegistry::new();
    let mut model = SemanticModel::new();
    declare_types(&arena, root, &mut registry, &mut model);
    CheckerState::new(&mut arena, &registry, &mut model, CheckerOptions::default()).check(root);
    let codes: Vec<u32> = model.diagnostics().iter().map(|d| d.code).collect();
    assert!(codes.is_empty(), "unexpected diagnostics: {codes:?}");

    let mut interp = Interpreter::new(&arena, &registry, &model, InterpreterOptions::default());
    let mut ctx = ExecutionContext::new();
    let result = interp.call_static(&mut ctx, "Main", "run", Vec::new());
    assert_eq!(ctx.frame_depth(), 0, "frames leaked");
    assert!(ctx.current_label.is_none(), "label leaked");
    (result, ctx.take_output())
}

fn program(arena: &mut NodeArena, ret: &str, statements: Vec<NodeIndex>) -> NodeIndex {
    let body = arena.block(statements);
    let run = arena.method(ModifierFlags::STATIC, "run", vec![], ty(ret), body);
    let main = arena.class_decl(ClassSpec::class("Main"), vec![run]);
    arena.source_file(vec![main])
}

fn print_str(arena: &mut NodeArena, text: &str) -> NodeIndex {
    let value = arena.string(text);
    let call = arena.call("System.out.println", vec![value]);
    arena.expr_stmt(call)
}

fn int_of(result: RuntimeResult<Value>) -> i64 {
    match result {
        Ok(value) => value.as_i64().unwrap_or_else(|| panic!("int expected, got {value:?}")),
        Err(err) => panic!("evaluation failed: {err}"),
    }
}

/// `for (int <var> = 0; <var> < <bound>; <var>++) body`
fn counting_loop(arena: &mut NodeArena, var: &str, bound: i32, body: NodeIndex) -> NodeIndex {
    let zero = arena.int(0);
    let init = arena.var(ty("int"), var, zero);
    let v = arena.ident(var);
    let limit = arena.int(bound);
    let cond = arena.binary(BinaryOp::Lt, v, limit);
    let v2 = arena.ident(var);
    let incr = arena.unary(UnaryOp::PostIncrement, v2);
    arena.for_stmt(vec![init], cond, vec![incr], body)
}

#[test]
fn continue_skips_the_rest_of_the_iteration() {
    let mut arena = NodeArena::new();
    let zero = arena.int(0);
    let sum_decl = arena.var(ty("int"), "sum", zero);
    let i = arena.ident("i");
    let one = arena.int(1);
    let is_one = arena.binary(BinaryOp::Eq, i, one);
    let skip = arena.continue_stmt(None);
    let guard = arena.if_stmt(is_one, skip, NodeIndex::NONE);
    let sum = arena.ident("sum");
    let i2 = arena.ident("i");
    let add = arena.compound_assign(AssignOp::Add, sum, i2);
    let add = arena.expr_stmt(add);
    let body = arena.block(vec![guard, add]);
    let for_loop = counting_loop(&mut arena, "i", 3, body);
    let total = arena.ident("sum");
    let ret = arena.return_stmt(total);
    let root = program(&mut arena, "int", vec![sum_decl, for_loop, ret]);

    let (result, _) = run(arena, root);
    assert_eq!(int_of(result), 2);
}

#[test]
fn switch_falls_through_until_break() {
    let mut arena = NodeArena::new();
    let two = arena.int(2);
    let decl = arena.var(ty("int"), "x", two);
    let x = arena.ident("x");
    let c1 = arena.int(1);
    let case1 = arena.case_label(c1);
    let a = print_str(&mut arena, "a");
    let c2 = arena.int(2);
    let case2 = arena.case_label(c2);
    let b = print_str(&mut arena, "b");
    let c3 = arena.int(3);
    let case3 = arena.case_label(c3);
    let c = print_str(&mut arena, "c");
    let stop = arena.break_stmt(None);
    let default = arena.default_label();
    let d = print_str(&mut arena, "d");
    let switch = arena.switch_stmt(x, vec![case1, a, case2, b, case3, c, stop, default, d]);
    let after = print_str(&mut arena, "after");
    let root = program(&mut arena, "void", vec![decl, switch, after]);

    let (result, output) = run(arena, root);
    assert!(result.is_ok(), "{result:?}");
    assert_eq!(output, "b\nc\nafter\n");
}

#[test]
fn switch_without_a_match_runs_default() {
    let mut arena = NodeArena::new();
    let nine = arena.int(9);
    let c1 = arena.int(1);
    let case1 = arena.case_label(c1);
    let a = print_str(&mut arena, "a");
    let default = arena.default_label();
    let d = print_str(&mut arena, "d");
    let switch = arena.switch_stmt(nine, vec![case1, a, default, d]);
    let root = program(&mut arena, "void", vec![switch]);

    let (_, output) = run(arena, root);
    assert_eq!(output, "d\n");
}

#[test]
fn finally_runs_once_after_return() {
    let mut arena = NodeArena::new();
    let body_print = print_str(&mut arena, "body");
    let one = arena.int(1);
    let ret = arena.return_stmt(one);
    let block = arena.block(vec![body_print, ret]);
    let finally_print = print_str(&mut arena, "finally");
    let finally = arena.block(vec![finally_print]);
    let try_stmt = arena.try_stmt(block, vec![], finally);
    let two = arena.int(2);
    let unreachable = arena.return_stmt(two);
    let root = program(&mut arena, "int", vec![try_stmt, unreachable]);

    let (result, output) = run(arena, root);
    assert_eq!(int_of(result), 1);
    assert_eq!(output, "body\nfinally\n");
}

#[test]
fn return_in_finally_overrides_the_try_result() {
    let mut arena = NodeArena::new();
    let one = arena.int(1);
    let ret1 = arena.return_stmt(one);
    let block = arena.block(vec![ret1]);
    let two = arena.int(2);
    let ret2 = arena.return_stmt(two);
    let finally = arena.block(vec![ret2]);
    let try_stmt = arena.try_stmt(block, vec![], finally);
    let root = program(&mut arena, "int", vec![try_stmt]);

    let (result, _) = run(arena, root);
    assert_eq!(int_of(result), 2);
}

#[test]
fn finally_runs_when_an_exception_escapes() {
    let mut arena = NodeArena::new();
    let text = arena.string("x");
    let exception = arena.new_object(ty("RuntimeException"), vec![text]);
    let throw = arena.throw_stmt(exception);
    let block = arena.block(vec![throw]);
    let cleanup = print_str(&mut arena, "cleanup");
    let finally = arena.block(vec![cleanup]);
    let try_stmt = arena.try_stmt(block, vec![], finally);
    let root = program(&mut arena, "void", vec![try_stmt]);

    let (result, output) = run(arena, root);
    assert!(matches!(result, Err(RuntimeError::Thrown { .. })));
    assert_eq!(output, "cleanup\n");
}

#[test]
fn unmatched_catch_clauses_let_the_exception_propagate() {
    let mut arena = NodeArena::new();
    let zero = arena.int(0);
    let z = arena.var(ty("int"), "z", zero);
    let one = arena.int(1);
    let zr = arena.ident("z");
    let div = arena.binary(BinaryOp::Div, one, zr);
    let div = arena.expr_stmt(div);
    let block = arena.block(vec![div]);
    let handled = print_str(&mut arena, "handled");
    let handler = arena.block(vec![handled]);
    let clause = arena.catch_clause(vec![ty("NullPointerException")], "e", handler);
    let finally_print = print_str(&mut arena, "finally");
    let finally = arena.block(vec![finally_print]);
    let try_stmt = arena.try_stmt(block, vec![clause], finally);
    let root = program(&mut arena, "void", vec![z, try_stmt]);

    let (result, output) = run(arena, root);
    assert!(matches!(result, Err(RuntimeError::Arithmetic { .. })));
    assert_eq!(output, "finally\n");
}

#[test]
fn labeled_break_leaves_both_loops() {
    let mut arena = NodeArena::new();
    let zero = arena.int(0);
    let count_decl = arena.var(ty("int"), "count", zero);
    let j = arena.ident("j");
    let two = arena.int(2);
    let at_two = arena.binary(BinaryOp::Eq, j, two);
    let leave = arena.break_stmt(Some("outer"));
    let guard = arena.if_stmt(at_two, leave, NodeIndex::NONE);
    let count = arena.ident("count");
    let bump = arena.unary(UnaryOp::PostIncrement, count);
    let bump = arena.expr_stmt(bump);
    let inner_body = arena.block(vec![guard, bump]);
    let inner = counting_loop(&mut arena, "j", 5, inner_body);
    let outer_body = arena.block(vec![inner]);
    let outer = counting_loop(&mut arena, "i", 5, outer_body);
    let labeled = arena.labeled("outer", outer);
    let total = arena.ident("count");
    let ret = arena.return_stmt(total);
    let root = program(&mut arena, "int", vec![count_decl, labeled, ret]);

    let (result, _) = run(arena, root);
    assert_eq!(int_of(result), 2);
}

#[test]
fn labeled_continue_resumes_the_outer_loop() {
    let mut arena = NodeArena::new();
    let zero = arena.int(0);
    let count_decl = arena.var(ty("int"), "count", zero);
    let j = arena.ident("j");
    let one = arena.int(1);
    let at_one = arena.binary(BinaryOp::Eq, j, one);
    let next = arena.continue_stmt(Some("rows"));
    let guard = arena.if_stmt(at_one, next, NodeIndex::NONE);
    let count = arena.ident("count");
    let bump = arena.unary(UnaryOp::PostIncrement, count);
    let bump = arena.expr_stmt(bump);
    let inner_body = arena.block(vec![guard, bump]);
    let inner = counting_loop(&mut arena, "j", 4, inner_body);
    let outer_body = arena.block(vec![inner]);
    let outer = counting_loop(&mut arena, "i", 3, outer_body);
    let labeled = arena.labeled("rows", outer);
    let total = arena.ident("count");
    let ret = arena.return_stmt(total);
    let root = program(&mut arena, "int", vec![count_decl, labeled, ret]);

    let (result, _) = run(arena, root);
    // One increment (j == 0) per row.
    assert_eq!(int_of(result), 3);
}

#[test]
fn while_and_do_while_loops() {
    let mut arena = NodeArena::new();
    let zero = arena.int(0);
    let n_decl = arena.var(ty("int"), "n", zero);
    let n = arena.ident("n");
    let bump = arena.unary(UnaryOp::PreIncrement, n);
    let bump = arena.expr_stmt(bump);
    let do_body = arena.block(vec![bump]);
    let n2 = arena.ident("n");
    let ten = arena.int(10);
    let below = arena.binary(BinaryOp::Gt, n2, ten);
    // The body runs once even though the condition is false.
    let do_loop = arena.do_while(do_body, below);

    let n3 = arena.ident("n");
    let five = arena.int(5);
    let cond = arena.binary(BinaryOp::Lt, n3, five);
    let n4 = arena.ident("n");
    let two = arena.int(2);
    let step = arena.compound_assign(AssignOp::Add, n4, two);
    let step = arena.expr_stmt(step);
    let while_body = arena.block(vec![step]);
    let while_loop = arena.while_stmt(cond, while_body);
    let result = arena.ident("n");
    let ret = arena.return_stmt(result);
    let root = program(&mut arena, "int", vec![n_decl, do_loop, while_loop, ret]);

    let (result, _) = run(arena, root);
    assert_eq!(int_of(result), 5);
}

#[test]
fn return_inside_a_loop_leaves_the_method() {
    let mut arena = NodeArena::new();
    let i = arena.ident("i");
    let three = arena.int(3);
    let hit = arena.binary(BinaryOp::Eq, i, three);
    let i2 = arena.ident("i");
    let ret = arena.return_stmt(i2);
    let guard = arena.if_stmt(hit, ret, NodeIndex::NONE);
    let body = arena.block(vec![guard]);
    let for_loop = counting_loop(&mut arena, "i", 10, body);
    let minus = arena.int(-1);
    let fallback = arena.return_stmt(minus);
    let root = program(&mut arena, "int", vec![for_loop, fallback]);

    let (result, _) = run(arena, root);
    assert_eq!(int_of(result), 3);
}

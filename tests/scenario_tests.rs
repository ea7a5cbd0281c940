//! End-to-end scenarios: every program is checked and interpreted, then
//! lowered, re-checked and interpreted again. Both runs must agree.

use strata::ast::{
    AssignOp, BinaryOp, BindingDirection, ClassSpec, ModifierFlags, NodeArena, NodeIndex, NodeState,
    TypeSyntax, UnaryOp, param,
};
use strata::binding::{CycleInfo, CyclePolicy, MismatchPolicy};
use strata::checker::CheckerOptions;
use strata::emitter::{LoweringOptions, Target};
use strata::interp::InterpreterOptions;
use strata::{RunOutcome, Session};

fn ty(text: &str) -> TypeSyntax {
    TypeSyntax::parse(text).expect("type syntax")
}

fn checked(arena: NodeArena, root: NodeIndex) -> Session {
    let mut session = Session::new(arena, root);
    let diagnostics = session.check(CheckerOptions::default());
    assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
    session
}

fn run_main(session: &Session) -> RunOutcome {
    session.run("Main", "run", InterpreterOptions::default())
}

fn describe(outcome: &RunOutcome) -> (String, String) {
    let result = match &outcome.result {
        Ok(value) => value.to_string(),
        Err(err) => format!("error: {err}"),
    };
    (result, outcome.output.clone())
}

/// Interpret the program as written and after lowering; returns the common
/// `(result, output)` and the lowered session.
fn run_both(arena: NodeArena, root: NodeIndex) -> ((String, String), Session) {
    let original = checked(arena.clone(), root);
    let before = describe(&run_main(&original));

    let mut lowered = checked(arena, root);
    lowered.lower(&LoweringOptions::default(), CheckerOptions::default());
    assert!(lowered.diagnostics().is_empty(), "{:?}", lowered.diagnostics());
    let after = describe(&run_main(&lowered));
    assert_eq!(before, after, "lowering changed behaviour");
    (before, lowered)
}

/// `class Main { static <ret> run() { statements } members }` plus `extra`.
fn program(
    arena: &mut NodeArena,
    ret: &str,
    statements: Vec<NodeIndex>,
    members: Vec<NodeIndex>,
    extra: Vec<NodeIndex>,
) -> NodeIndex {
    let body = arena.block(statements);
    let run = arena.method(ModifierFlags::STATIC, "run", vec![], ty(ret), body);
    let mut all = vec![run];
    all.extend(members);
    let main = arena.class_decl(ClassSpec::class("Main"), all);
    let mut types = vec![main];
    types.extend(extra);
    arena.source_file(types)
}

fn println_str(arena: &mut NodeArena, text: &str) -> NodeIndex {
    let value = arena.string(text);
    let call = arena.call("System.out.println", vec![value]);
    arena.expr_stmt(call)
}

/// `for (int <var> = 0; <var> < <bound>; <var>++) body`
fn counting_loop(arena: &mut NodeArena, var: &str, bound: i32, body: NodeIndex) -> NodeIndex {
    let zero = arena.int(0);
    let init = arena.var(ty("int"), var, zero);
    let v = arena.ident(var);
    let limit = arena.int(bound);
    let cond = arena.binary(BinaryOp::Lt, v, limit);
    let v = arena.ident(var);
    let incr = arena.unary(UnaryOp::PostIncrement, v);
    arena.for_stmt(vec![init], cond, vec![incr], body)
}

/// `if (<var> == <value>) stmt`
fn when_equals(arena: &mut NodeArena, var: &str, value: i32, stmt: NodeIndex) -> NodeIndex {
    let v = arena.ident(var);
    let k = arena.int(value);
    let test = arena.binary(BinaryOp::Eq, v, k);
    arena.if_stmt(test, stmt, NodeIndex::NONE)
}

fn add_to(arena: &mut NodeArena, target: &str, value: NodeIndex) -> NodeIndex {
    let t = arena.ident(target);
    let add = arena.compound_assign(AssignOp::Add, t, value);
    arena.expr_stmt(add)
}

#[test]
fn continue_skips_one_iteration() {
    // int sum = 0; for (int i = 0; i < 3; i++) { if (i == 1) continue; sum += i; } return sum;
    let mut arena = NodeArena::new();
    let zero = arena.int(0);
    let sum = arena.var(ty("int"), "sum", zero);
    let skip = arena.continue_stmt(None);
    let guard = when_equals(&mut arena, "i", 1, skip);
    let i = arena.ident("i");
    let add = add_to(&mut arena, "sum", i);
    let body = arena.block(vec![guard, add]);
    let lp = counting_loop(&mut arena, "i", 3, body);
    let total = arena.ident("sum");
    let ret = arena.return_stmt(total);
    let root = program(&mut arena, "int", vec![sum, lp, ret], vec![], vec![]);

    let ((result, _), lowered) = run_both(arena, root);
    assert_eq!(result, "2");
    let js = lowered.print_js(Target::Es2022);
    assert!(js.contains("continue;"), "{js}");
}

#[test]
fn unlabeled_break_leaves_the_innermost_loop_and_labeled_break_all() {
    // outer: for (i < 3) { for (j < 3) { if (j == 1) break; if (i == 2) break outer; count++; } count += 10; }
    let mut arena = NodeArena::new();
    let zero = arena.int(0);
    let count = arena.var(ty("int"), "count", zero);
    let brk = arena.break_stmt(None);
    let inner_exit = when_equals(&mut arena, "j", 1, brk);
    let brk_outer = arena.break_stmt(Some("outer"));
    let outer_exit = when_equals(&mut arena, "i", 2, brk_outer);
    let c = arena.ident("count");
    let bump = arena.unary(UnaryOp::PostIncrement, c);
    let bump = arena.expr_stmt(bump);
    let inner_body = arena.block(vec![inner_exit, outer_exit, bump]);
    let inner = counting_loop(&mut arena, "j", 3, inner_body);
    let ten = arena.int(10);
    let add_ten = add_to(&mut arena, "count", ten);
    let outer_body = arena.block(vec![inner, add_ten]);
    let outer = counting_loop(&mut arena, "i", 3, outer_body);
    let labeled = arena.labeled("outer", outer);
    let c = arena.ident("count");
    let ret = arena.return_stmt(c);
    let root = program(&mut arena, "int", vec![count, labeled, ret], vec![], vec![]);

    let ((result, _), _) = run_both(arena, root);
    assert_eq!(result, "22");
}

#[test]
fn switch_falls_through_and_stops_before_default() {
    // switch (2) { case 1: a(); case 2: b(); case 3: c(); break; default: d(); }
    let mut arena = NodeArena::new();
    let mut members = Vec::new();
    for name in ["a", "b", "c", "d"] {
        let print = println_str(&mut arena, name);
        let body = arena.block(vec![print]);
        members.push(arena.method(ModifierFlags::STATIC, name, vec![], ty("void"), body));
    }
    let call = |arena: &mut NodeArena, name: &str| {
        let c = arena.call(name, vec![]);
        arena.expr_stmt(c)
    };
    let two = arena.int(2);
    let k1 = arena.int(1);
    let case1 = arena.case_label(k1);
    let a = call(&mut arena, "a");
    let k2 = arena.int(2);
    let case2 = arena.case_label(k2);
    let b = call(&mut arena, "b");
    let k3 = arena.int(3);
    let case3 = arena.case_label(k3);
    let c = call(&mut arena, "c");
    let stop = arena.break_stmt(None);
    let default = arena.default_label();
    let d = call(&mut arena, "d");
    let switch = arena.switch_stmt(two, vec![case1, a, case2, b, case3, c, stop, default, d]);
    let root = program(&mut arena, "void", vec![switch], members, vec![]);

    let ((_, output), lowered) = run_both(arena, root);
    assert_eq!(output, "b\nc\n");
    let js = lowered.print_js(Target::Es2022);
    assert!(js.contains("case 2:\n"), "{js}");
    assert!(js.contains("default:\n"), "{js}");
}

#[test]
fn finally_runs_exactly_once_on_every_exit() {
    let mut arena = NodeArena::new();
    let finallies = arena.field(ModifierFlags::STATIC, ty("int"), "finallies", NodeIndex::NONE);
    let count_finally = |arena: &mut NodeArena| {
        let f = arena.ident("finallies");
        let inc = arena.unary(UnaryOp::PostIncrement, f);
        let stmt = arena.expr_stmt(inc);
        arena.block(vec![stmt])
    };

    // static int early() { try { return 1; } finally { finallies++; } }
    let one = arena.int(1);
    let ret = arena.return_stmt(one);
    let block = arena.block(vec![ret]);
    let fin = count_finally(&mut arena);
    let try_early = arena.try_stmt(block, vec![], fin);
    let body = arena.block(vec![try_early]);
    let early = arena.method(ModifierFlags::STATIC, "early", vec![], ty("int"), body);

    // static void normal() { try { println("normal"); } finally { finallies++; } }
    let print = println_str(&mut arena, "normal");
    let block = arena.block(vec![print]);
    let fin = count_finally(&mut arena);
    let try_normal = arena.try_stmt(block, vec![], fin);
    let body = arena.block(vec![try_normal]);
    let normal = arena.method(ModifierFlags::STATIC, "normal", vec![], ty("void"), body);

    // static void thrown() { try { throw new RuntimeException("x"); } finally { finallies++; } }
    let text = arena.string("x");
    let error = arena.new_object(ty("RuntimeException"), vec![text]);
    let throw = arena.throw_stmt(error);
    let block = arena.block(vec![throw]);
    let fin = count_finally(&mut arena);
    let try_thrown = arena.try_stmt(block, vec![], fin);
    let body = arena.block(vec![try_thrown]);
    let thrown = arena.method(ModifierFlags::STATIC, "thrown", vec![], ty("void"), body);

    // early(); normal(); try { thrown(); } catch (RuntimeException e) { } return finallies;
    let call_early = arena.call("early", vec![]);
    let call_early = arena.expr_stmt(call_early);
    let call_normal = arena.call("normal", vec![]);
    let call_normal = arena.expr_stmt(call_normal);
    let call_thrown = arena.call("thrown", vec![]);
    let call_thrown = arena.expr_stmt(call_thrown);
    let guarded = arena.block(vec![call_thrown]);
    let handler = arena.block(vec![]);
    let clause = arena.catch_clause(vec![ty("RuntimeException")], "e", handler);
    let catch_all = arena.try_stmt(guarded, vec![clause], NodeIndex::NONE);
    let f = arena.ident("finallies");
    let ret = arena.return_stmt(f);
    let root = program(
        &mut arena,
        "int",
        vec![call_early, call_normal, catch_all, ret],
        vec![finallies, early, normal, thrown],
        vec![],
    );

    let ((result, output), _) = run_both(arena, root);
    assert_eq!(result, "3");
    assert_eq!(output, "normal\n");
}

#[test]
fn inner_declarations_shadow_until_their_block_ends() {
    let mut arena = NodeArena::new();
    let one = arena.int(1);
    let outer = arena.var(ty("int"), "x", one);
    let text = arena.string("inner");
    let inner_decl = arena.var(ty("String"), "x", text);
    let inner_x = arena.ident("x");
    let inner_call = arena.call("System.out.println", vec![inner_x]);
    let inner_print = arena.expr_stmt(inner_call);
    let inner = arena.block(vec![inner_decl, inner_print]);
    let outer_x = arena.ident("x");
    let outer_call = arena.call("System.out.println", vec![outer_x]);
    let outer_print = arena.expr_stmt(outer_call);
    let root = program(&mut arena, "void", vec![outer, inner, outer_print], vec![], vec![]);

    let ((_, output), _) = run_both(arena, root);
    assert_eq!(output, "inner\n1\n");
}

#[test]
fn property_increment_evaluates_its_receiver_once() {
    // Counter c = new Counter(); getObj(c).count++; getObj(c).count++;
    // return fetches * 10 + c.getCount();
    let mut arena = NodeArena::new();
    let value = arena.field(ModifierFlags::empty(), ty("int"), "value", NodeIndex::NONE);
    let read = arena.ident("value");
    let ret = arena.return_stmt(read);
    let body = arena.block(vec![ret]);
    let getter = arena.method(ModifierFlags::empty(), "getCount", vec![], ty("int"), body);
    let target = arena.ident("value");
    let v = arena.ident("v");
    let store = arena.assign(target, v);
    let store = arena.expr_stmt(store);
    let body = arena.block(vec![store]);
    let setter = arena.method(ModifierFlags::empty(), "setCount", vec![param(ty("int"), "v")], ty("void"), body);
    let counter = arena.class_decl(ClassSpec::class("Counter"), vec![value, getter, setter]);

    let fetches = arena.field(ModifierFlags::STATIC, ty("int"), "fetches", NodeIndex::NONE);
    let f = arena.ident("fetches");
    let bump = arena.unary(UnaryOp::PostIncrement, f);
    let bump = arena.expr_stmt(bump);
    let c = arena.ident("c");
    let ret = arena.return_stmt(c);
    let body = arena.block(vec![bump, ret]);
    let get_obj = arena.method(
        ModifierFlags::STATIC,
        "getObj",
        vec![param(ty("Counter"), "c")],
        ty("Counter"),
        body,
    );

    let ctor = arena.new_object(ty("Counter"), vec![]);
    let decl = arena.var(ty("Counter"), "c", ctor);
    let mut statements = vec![decl];
    for _ in 0..2 {
        let c = arena.ident("c");
        let fetch = arena.call("getObj", vec![c]);
        let sel = arena.field_sel("count");
        let access = arena.select(fetch, vec![sel]);
        let inc = arena.unary(UnaryOp::PostIncrement, access);
        statements.push(arena.expr_stmt(inc));
    }
    let f = arena.ident("fetches");
    let ten = arena.int(10);
    let scaled = arena.binary(BinaryOp::Mul, f, ten);
    let count = arena.call("c.getCount", vec![]);
    let total = arena.binary(BinaryOp::Add, scaled, count);
    statements.push(arena.return_stmt(total));
    let root = program(&mut arena, "int", statements, vec![fetches, get_obj], vec![counter]);

    let ((result, _), lowered) = run_both(arena, root);
    assert_eq!(result, "22");
    let js = lowered.print_js(Target::Es2022);
    assert_eq!(js.matches("Main.getObj(c)").count(), 2, "{js}");
}

#[test]
fn self_referencing_binding_is_a_cycle() {
    // class Counter { int total := total + 1; }
    let mut arena = NodeArena::new();
    let total = arena.ident("total");
    let one = arena.int(1);
    let sum = arena.binary(BinaryOp::Add, total, one);
    let field = arena.bound_field(ModifierFlags::empty(), ty("int"), "total", sum, BindingDirection::Forward);
    let counter = arena.class_decl(ClassSpec::class("Counter"), vec![field]);
    let root = arena.source_file(vec![counter]);
    let session = checked(arena, root);

    let reports = session.cycles(CyclePolicy::default());
    assert_eq!(reports.len(), 1);
    assert!(reports[0].is_error());
    assert_eq!(reports[0].trace(), "Counter.total -> Counter.total");
}

#[test]
fn bindings_on_plain_fields_are_not_cycles() {
    // class Gauge { int raw; int scaled := raw * 2; int label := scaled + 1; }
    let mut arena = NodeArena::new();
    let raw = arena.field(ModifierFlags::empty(), ty("int"), "raw", NodeIndex::NONE);
    let r = arena.ident("raw");
    let two = arena.int(2);
    let doubled = arena.binary(BinaryOp::Mul, r, two);
    let scaled = arena.bound_field(ModifierFlags::empty(), ty("int"), "scaled", doubled, BindingDirection::Forward);
    let s = arena.ident("scaled");
    let one = arena.int(1);
    let plus = arena.binary(BinaryOp::Add, s, one);
    let label = arena.bound_field(ModifierFlags::empty(), ty("int"), "label", plus, BindingDirection::Forward);
    let gauge = arena.class_decl(ClassSpec::class("Gauge"), vec![raw, scaled, label]);
    let root = arena.source_file(vec![gauge]);
    let session = checked(arena, root);

    assert!(session.cycles(CyclePolicy::default()).is_empty());

    let mut info = CycleInfo::new(&session.arena, &session.registry, &session.model, CyclePolicy {
        mismatch: MismatchPolicy::Error,
        ..CyclePolicy::default()
    });
    assert!(info.check_field(label).is_none());
    assert!(!info.is_visited(label));
}

#[test]
fn restarting_a_checked_tree_resolves_the_same_types() {
    let mut arena = NodeArena::new();
    let items = arena.new_object(ty("ArrayList<String>"), vec![]);
    let decl = arena.var(ty("List<String>"), "items", items);
    let hello = arena.string("hello");
    let add = arena.call("items.add", vec![hello]);
    let add = arena.expr_stmt(add);
    let first = arena.int(0);
    let get = arena.call("items.get", vec![first]);
    let length = arena.method_sel("length", vec![]);
    let len = arena.select(get, vec![length]);
    let ret = arena.return_stmt(len);
    let root = program(&mut arena, "int", vec![decl, add, ret], vec![], vec![]);

    let mut session = checked(arena, root);
    let declared: Vec<_> = session.declared_types().to_vec();
    let types_before: Vec<_> = [get, len].iter().map(|&idx| session.model.type_of(idx).cloned()).collect();
    assert!(types_before.iter().all(Option::is_some));

    let diagnostics = session.restart(CheckerOptions::default());
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    let types_after: Vec<_> = [get, len].iter().map(|&idx| session.model.type_of(idx).cloned()).collect();
    assert_eq!(types_before, types_after);
    for (node, id) in declared {
        assert_eq!(session.model.declared_type(node), Some(id));
    }
    assert_eq!(session.arena.state(root), NodeState::Validated);
    assert_eq!(describe(&run_main(&session)).0, "5");
}

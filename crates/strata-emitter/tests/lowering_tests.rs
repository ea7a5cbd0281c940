use super::*;
use strata_ast::{AssignOp, BinaryOp, ClassSpec, ModifierFlags, NodeData, NodeState, TypeSyntax, UnaryOp, param};
use strata_checker::declare_types;
use strata_interp::{ExecutionContext, Interpreter, InterpreterOptions, RuntimeResult, Value};
use strata_solver::TypeRegistry;

fn ty(text: &str) -> TypeSyntax {
    TypeSyntax::parse(text).expect("type syntax")
}

struct Lowered {
    arena: NodeArena,
    registry: TypeRegistry,
    model: SemanticModel,
    root: NodeIndex,
    stats: LoweringStats,
}

impl Lowered {
    fn new(arena: NodeArena, root: NodeIndex) -> Self {
        Self::with_options(arena, root, LoweringOptions::default())
    }

    /// Declare, check and lower `root`; both passes must check cleanly.
    fn with_options(mut arena: NodeArena, root: NodeIndex, options: LoweringOptions) -> Self {
        let mut registry = TypeRegistry::new();
        let mut model = SemanticModel::new();
        declare_types(&arena, root, &mut registry, &mut model);
        CheckerState::new(&mut arena, &registry, &mut model, CheckerOptions::default()).check(root);
        assert!(model.diagnostics().is_empty(), "diagnostics before lowering");
        let stats = lower_program(
            &mut arena,
            &registry,
            &mut model,
            root,
            &options,
            CheckerOptions::default(),
        );
        let codes: Vec<u32> = model.diagnostics().iter().map(|d| d.code).collect();
        assert!(codes.is_empty(), "diagnostics after lowering: {codes:?}");
        Lowered {
            arena,
            registry,
            model,
            root,
            stats,
        }
    }

    fn run(&self) -> (RuntimeResult<Value>, String) {
        let mut interp = Interpreter::new(&self.arena, &self.registry, &self.model, InterpreterOptions::default());
        let mut ctx = ExecutionContext::new();
        let result = interp.call_static(&mut ctx, "Main", "run", Vec::new());
        (result, ctx.take_output())
    }

    fn count(&self, kind: &str) -> usize {
        self.arena
            .descendants(self.root)
            .into_iter()
            .filter(|&idx| self.arena.kind_name(idx) == kind)
            .count()
    }
}

fn int_result(result: RuntimeResult<Value>) -> i64 {
    match result {
        Ok(value) => value.as_i64().unwrap_or_else(|| panic!("int expected, got {value:?}")),
        Err(err) => panic!("evaluation failed: {err}"),
    }
}

/// `class Main { static int run() { statements } }` plus extra classes.
fn program(arena: &mut NodeArena, statements: Vec<NodeIndex>, members: Vec<NodeIndex>, extra: Vec<NodeIndex>) -> NodeIndex {
    let body = arena.block(statements);
    let run = arena.method(ModifierFlags::STATIC, "run", vec![], ty("int"), body);
    let mut main_members = vec![run];
    main_members.extend(members);
    let main = arena.class_decl(ClassSpec::class("Main"), main_members);
    let mut types = vec![main];
    types.extend(extra);
    arena.source_file(types)
}

/// `class Counter { int value; int getCount() {..} void setCount(int v) {..} }`
fn counter_class(arena: &mut NodeArena) -> NodeIndex {
    let none = NodeIndex::NONE;
    let value = arena.field(ModifierFlags::empty(), ty("int"), "value", none);
    let read = arena.ident("value");
    let ret = arena.return_stmt(read);
    let get_body = arena.block(vec![ret]);
    let getter = arena.method(ModifierFlags::empty(), "getCount", vec![], ty("int"), get_body);
    let target = arena.ident("value");
    let v = arena.ident("v");
    let store = arena.assign(target, v);
    let store_stmt = arena.expr_stmt(store);
    let set_body = arena.block(vec![store_stmt]);
    let setter = arena.method(
        ModifierFlags::empty(),
        "setCount",
        vec![param(ty("int"), "v")],
        ty("void"),
        set_body,
    );
    arena.class_decl(ClassSpec::class("Counter"), vec![value, getter, setter])
}

/// `static int calls; static Counter getObj(Counter c) { calls++; return c; }`
fn counting_accessor(arena: &mut NodeArena) -> Vec<NodeIndex> {
    let calls = arena.field(ModifierFlags::STATIC, ty("int"), "calls", NodeIndex::NONE);
    let calls_ref = arena.ident("calls");
    let bump = arena.unary(UnaryOp::PostIncrement, calls_ref);
    let bump_stmt = arena.expr_stmt(bump);
    let c = arena.ident("c");
    let ret = arena.return_stmt(c);
    let body = arena.block(vec![bump_stmt, ret]);
    let get_obj = arena.method(
        ModifierFlags::STATIC,
        "getObj",
        vec![param(ty("Counter"), "c")],
        ty("Counter"),
        body,
    );
    vec![calls, get_obj]
}

#[test]
fn property_increment_evaluates_the_receiver_once() {
    let mut arena = NodeArena::new();
    let counter = counter_class(&mut arena);
    let members = counting_accessor(&mut arena);

    let ctor = arena.new_object(ty("Counter"), vec![]);
    let decl = arena.var(ty("Counter"), "c", ctor);
    let mut statements = vec![decl];
    for _ in 0..2 {
        let c = arena.ident("c");
        let call = arena.call("getObj", vec![c]);
        let count = arena.field_sel("count");
        let access = arena.select(call, vec![count]);
        let inc = arena.unary(UnaryOp::PostIncrement, access);
        statements.push(arena.expr_stmt(inc));
    }
    let calls = arena.ident("calls");
    let ten = arena.int(10);
    let scaled = arena.binary(BinaryOp::Mul, calls, ten);
    let value = arena.ident("c.value");
    let total = arena.binary(BinaryOp::Add, scaled, value);
    statements.push(arena.return_stmt(total));
    let root = program(&mut arena, statements, members, vec![counter]);

    let lowered = Lowered::new(arena, root);
    assert_eq!(lowered.stats.properties, 2);
    assert!(lowered.count("Sequence") >= 2);
    let (result, _) = lowered.run();
    assert_eq!(int_result(result), 22);
}

#[test]
fn prefix_property_update_yields_the_new_value() {
    let mut arena = NodeArena::new();
    let counter = counter_class(&mut arena);

    let ctor = arena.new_object(ty("Counter"), vec![]);
    let decl = arena.var(ty("Counter"), "c", ctor);
    let access = arena.ident("c.count");
    let inc = arena.unary(UnaryOp::PreIncrement, access);
    let first = arena.var(ty("int"), "first", inc);
    let target = arena.ident("c.count");
    let five = arena.int(5);
    let add = arena.compound_assign(AssignOp::Add, target, five);
    let second = arena.var(ty("int"), "second", add);
    let first_ref = arena.ident("first");
    let hundred = arena.int(100);
    let scaled = arena.binary(BinaryOp::Mul, first_ref, hundred);
    let second_ref = arena.ident("second");
    let total = arena.binary(BinaryOp::Add, scaled, second_ref);
    let ret = arena.return_stmt(total);
    let root = program(&mut arena, vec![decl, first, second, ret], vec![], vec![counter]);

    let lowered = Lowered::new(arena, root);
    assert_eq!(lowered.stats.properties, 2);
    let (result, _) = lowered.run();
    // first = 1, second = 6
    assert_eq!(int_result(result), 106);
}

fn labeled_sum(arena: &mut NodeArena, items: NodeIndex, element: &str) -> Vec<NodeIndex> {
    let zero = arena.int(0);
    let sum = arena.var(ty("int"), "sum", zero);
    let x = arena.ident("x");
    let two = arena.int(2);
    let is_two = arena.binary(BinaryOp::Eq, x, two);
    let skip = arena.continue_stmt(Some("outer"));
    let guard = arena.if_stmt(is_two, skip, NodeIndex::NONE);
    let total = arena.ident("sum");
    let x = arena.ident("x");
    let add = arena.compound_assign(AssignOp::Add, total, x);
    let add_stmt = arena.expr_stmt(add);
    let body = arena.block(vec![guard, add_stmt]);
    let each = arena.for_each(ty(element), "x", items, body);
    let labeled = arena.labeled("outer", each);
    let result = arena.ident("sum");
    let ret = arena.return_stmt(result);
    vec![sum, labeled, ret]
}

#[test]
fn for_each_over_an_array_becomes_an_indexed_loop() {
    let mut arena = NodeArena::new();
    let elements: Vec<NodeIndex> = [1, 2, 3, 4].into_iter().map(|v| arena.int(v)).collect();
    let init = arena.array_init(elements);
    let array = arena.new_array(ty("int"), vec![], init);
    let decl = arena.var(ty("int[]"), "items", array);
    let items = arena.ident("items");
    let mut statements = vec![decl];
    statements.extend(labeled_sum(&mut arena, items, "int"));
    let root = program(&mut arena, statements, vec![], vec![]);

    let lowered = Lowered::new(arena, root);
    assert_eq!(lowered.stats.for_each, 1);
    assert_eq!(lowered.count("ForEach"), 0);
    assert_eq!(lowered.count("For"), 1);
    let (result, _) = lowered.run();
    assert_eq!(int_result(result), 8);
}

fn list_program(arena: &mut NodeArena) -> NodeIndex {
    let list = arena.new_object(ty("ArrayList<Integer>"), vec![]);
    let decl = arena.var(ty("List<Integer>"), "items", list);
    let mut statements = vec![decl];
    for value in [1, 2, 5] {
        let v = arena.int(value);
        let add = arena.call("items.add", vec![v]);
        statements.push(arena.expr_stmt(add));
    }
    let items = arena.ident("items");
    statements.extend(labeled_sum(arena, items, "int"));
    program(arena, statements, vec![], vec![])
}

#[test]
fn for_each_over_a_list_uses_an_iterator_by_default() {
    let mut arena = NodeArena::new();
    let root = list_program(&mut arena);

    let lowered = Lowered::new(arena, root);
    assert_eq!(lowered.stats.for_each, 1);
    let labeled_loop = lowered.arena.descendants(root).into_iter().find_map(|idx| {
        match lowered.arena.data(idx) {
            Some(NodeData::Labeled { statement, .. }) => Some(*statement),
            _ => None,
        }
    });
    let labeled_loop = labeled_loop.expect("label kept");
    assert_eq!(lowered.arena.kind_name(labeled_loop), "For");
    assert_eq!(lowered.arena.state(labeled_loop), NodeState::Transformed);
    let (result, _) = lowered.run();
    assert_eq!(int_result(result), 6);
}

#[test]
fn for_each_over_a_list_can_index() {
    let mut arena = NodeArena::new();
    let root = list_program(&mut arena);
    let options = LoweringOptions {
        for_each: ForEachStrategy::Index,
        ..LoweringOptions::default()
    };

    let lowered = Lowered::with_options(arena, root, options);
    assert_eq!(lowered.stats.for_each, 1);
    let (result, _) = lowered.run();
    assert_eq!(int_result(result), 6);
}

#[test]
fn narrowing_casts_and_integer_division_use_runtime_helpers() {
    let mut arena = NodeArena::new();
    let seven = arena.int(7);
    let a = arena.var(ty("int"), "a", seven);
    let a_ref = arena.ident("a");
    let minus_two = arena.int(-2);
    let quotient = arena.binary(BinaryOp::Div, a_ref, minus_two);
    let q = arena.var(ty("int"), "q", quotient);
    let real = arena.double(-3.9);
    let truncated = arena.cast(ty("int"), real);
    let t = arena.var(ty("int"), "t", truncated);
    let wide = arena.int(70000);
    let narrowed = arena.cast(ty("short"), wide);
    let s = arena.var(ty("short"), "s", narrowed);
    let q_ref = arena.ident("q");
    let t_ref = arena.ident("t");
    let s_ref = arena.ident("s");
    let partial = arena.binary(BinaryOp::Add, q_ref, t_ref);
    let total = arena.binary(BinaryOp::Add, partial, s_ref);
    let ret = arena.return_stmt(total);
    let root = program(&mut arena, vec![a, q, t, s, ret], vec![], vec![]);

    let lowered = Lowered::new(arena, root);
    assert_eq!(lowered.stats.divisions, 1);
    assert_eq!(lowered.stats.casts, 2);
    assert_eq!(lowered.count("Cast"), 0);
    let (result, _) = lowered.run();
    // -3 + -3 + 4464
    assert_eq!(int_result(result), 4458);
}

#[test]
fn compound_assignment_keeps_the_target_width() {
    let mut arena = NodeArena::new();
    let hundred = arena.int(100);
    let narrow = arena.cast(ty("byte"), hundred);
    let b = arena.var(ty("byte"), "b", narrow);
    let target = arena.ident("b");
    let more = arena.int(100);
    let add = arena.compound_assign(AssignOp::Add, target, more);
    let add_stmt = arena.expr_stmt(add);
    let b_ref = arena.ident("b");
    let ret = arena.return_stmt(b_ref);
    let root = program(&mut arena, vec![b, add_stmt, ret], vec![], vec![]);

    let lowered = Lowered::new(arena, root);
    assert_eq!(lowered.stats.compound_assignments, 1);
    let (result, _) = lowered.run();
    assert_eq!(int_result(result), -56);
}

#[test]
fn disabled_rewrites_leave_the_tree_alone() {
    let mut arena = NodeArena::new();
    let seven = arena.int(7);
    let two = arena.int(2);
    let quotient = arena.binary(BinaryOp::Div, seven, two);
    let ret = arena.return_stmt(quotient);
    let root = program(&mut arena, vec![ret], vec![], vec![]);
    let options = LoweringOptions {
        integer_division: false,
        ..LoweringOptions::default()
    };

    let lowered = Lowered::with_options(arena, root, options);
    assert_eq!(lowered.stats.total(), 0);
    assert_eq!(lowered.count("Binary"), 1);
    let (result, _) = lowered.run();
    assert_eq!(int_result(result), 3);
}

#[test]
fn option_names_parse_case_insensitively() {
    assert_eq!(Target::from_name("ES2015"), Some(Target::Es2015));
    assert_eq!(Target::from_name("esnext"), Some(Target::Es2022));
    assert_eq!(Target::from_name("es5"), None);
    assert_eq!(ForEachStrategy::from_name("Index"), Some(ForEachStrategy::Index));
    assert!(Target::Es2022.has_static_fields());
    assert!(!Target::Es2015.has_static_fields());
}

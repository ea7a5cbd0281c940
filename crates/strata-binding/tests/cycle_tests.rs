use super::*;
use strata_ast::{
    BinaryOp, BindingDirection, ClassSpec, ModifierFlags, NodeArena, NodeIndex, TypeSyntax,
};
use strata_checker::{CheckerOptions, CheckerState, SemanticModel, declare_types};
use strata_common::diagnostics::diagnostic_codes;
use strata_solver::{TypeDatabase, TypeRegistry};

fn ty(text: &str) -> TypeSyntax {
    TypeSyntax::parse(text).expect("type syntax")
}

struct Program {
    arena: NodeArena,
    registry: TypeRegistry,
    model: SemanticModel,
    root: NodeIndex,
}

impl Program {
    fn new(mut arena: NodeArena, types: Vec<NodeIndex>) -> Self {
        let root = arena.source_file(types);
        let mut registry = TypeRegistry::new();
        let mut model = SemanticModel::new();
        declare_types(&arena, root, &mut registry, &mut model);
        CheckerState::new(&mut arena, &registry, &mut model, CheckerOptions::default()).check(root);
        let codes: Vec<u32> = model.diagnostics().iter().map(|d| d.code).collect();
        assert!(codes.is_empty(), "unexpected diagnostics: {codes:?}");
        Program {
            arena,
            registry,
            model,
            root,
        }
    }

    fn cycles(&self, policy: CyclePolicy) -> CycleInfo<'_> {
        CycleInfo::new(&self.arena, &self.registry, &self.model, policy)
    }

    fn type_id(&self, name: &str) -> strata_solver::TypeId {
        self.registry.find_type(name).expect("declared type")
    }
}

fn bound(arena: &mut NodeArena, type_name: &str, name: &str, init: NodeIndex) -> NodeIndex {
    arena.bound_field(ModifierFlags::empty(), ty(type_name), name, init, BindingDirection::Forward)
}

fn plain(arena: &mut NodeArena, type_name: &str, name: &str) -> NodeIndex {
    arena.field(ModifierFlags::empty(), ty(type_name), name, NodeIndex::NONE)
}

#[test]
fn field_bound_to_itself_is_a_cycle() {
    let mut arena = NodeArena::new();
    let total = arena.ident("total");
    let one = arena.int(1);
    let sum = arena.binary(BinaryOp::Add, total, one);
    let field = bound(&mut arena, "int", "total", sum);
    let counter = arena.class_decl(ClassSpec::class("Counter"), vec![field]);
    let program = Program::new(arena, vec![counter]);

    let mut info = program.cycles(CyclePolicy::default());
    let report = info.check_field(field).expect("cycle");
    assert!(report.is_error());
    assert_eq!(report.trace(), "Counter.total -> Counter.total");
    assert_eq!(report.to_string(), report.trace());
}

#[test]
fn explicit_this_reads_the_same_object() {
    let mut arena = NodeArena::new();
    let this = arena.this();
    let sel = arena.field_sel("total");
    let read = arena.select(this, vec![sel]);
    let field = bound(&mut arena, "int", "total", read);
    let counter = arena.class_decl(ClassSpec::class("Counter"), vec![field]);
    let program = Program::new(arena, vec![counter]);

    let report = program.cycles(CyclePolicy::default()).check_field(field);
    assert_eq!(report.map(|r| r.trace()).as_deref(), Some("Counter.total -> Counter.total"));
}

#[test]
fn bindings_across_two_classes_form_a_cycle() {
    // class A { B b; int x := b.y; }  class B { A a; int y := a.x; }
    let mut arena = NodeArena::new();
    let b_field = plain(&mut arena, "B", "b");
    let b_y = arena.ident("b.y");
    let x = bound(&mut arena, "int", "x", b_y);
    let a_class = arena.class_decl(ClassSpec::class("A"), vec![b_field, x]);
    let a_field = plain(&mut arena, "A", "a");
    let a_x = arena.ident("a.x");
    let y = bound(&mut arena, "int", "y", a_x);
    let b_class = arena.class_decl(ClassSpec::class("B"), vec![a_field, y]);
    let program = Program::new(arena, vec![a_class, b_class]);

    // `b.a` need not be this object, so the loop is only as certain as the
    // mismatch policy says.
    let strict = CyclePolicy {
        mismatch: MismatchPolicy::Error,
        ..CyclePolicy::default()
    };
    let mut info = program.cycles(strict.clone());
    let report = info.check_field(x).expect("cycle");
    assert_eq!(report.trace(), "A.x -> B.y -> A.x");
    let closing = report.closing_entry().expect("closing entry");
    assert_eq!(closing.context.prefix.as_deref(), Some("b.a"));
    assert_eq!(closing.context.enclosing, Some(program.type_id("A")));

    let all = program.cycles(strict).check_tree(program.root);
    assert_eq!(all.len(), 1, "one loop, reported once: {all:?}");

    let mut warn = program.cycles(CyclePolicy::default());
    assert!(warn.check_field(x).is_none());
    assert_eq!(warn.warnings().len(), 1);
    assert_eq!(warn.warnings()[0].trace(), "A.x -> B.y -> A.x");
}

#[test]
fn acyclic_bindings_leave_no_trace() {
    // class Shape { int side; int area := side * side; int doubled := area * 2; }
    let mut arena = NodeArena::new();
    let side = plain(&mut arena, "int", "side");
    let s1 = arena.ident("side");
    let s2 = arena.ident("side");
    let product = arena.binary(BinaryOp::Mul, s1, s2);
    let area = bound(&mut arena, "int", "area", product);
    let area_ref = arena.ident("area");
    let two = arena.int(2);
    let twice = arena.binary(BinaryOp::Mul, area_ref, two);
    let doubled = bound(&mut arena, "int", "doubled", twice);
    let shape = arena.class_decl(ClassSpec::class("Shape"), vec![side, area, doubled]);
    let program = Program::new(arena, vec![shape]);

    let mut info = program.cycles(CyclePolicy::default());
    assert!(info.check_field(doubled).is_none());
    assert!(!info.is_visited(doubled));
    assert!(!info.is_visited(area));
    assert!(info.warnings().is_empty());
    assert!(info.check_tree(program.root).is_empty());
}

#[test]
fn visited_map_is_kept_once_a_cycle_is_found() {
    let mut arena = NodeArena::new();
    let total = arena.ident("total");
    let field = bound(&mut arena, "int", "total", total);
    let counter = arena.class_decl(ClassSpec::class("Counter"), vec![field]);
    let program = Program::new(arena, vec![counter]);

    let mut info = program.cycles(CyclePolicy::default());
    assert!(info.check_field(field).is_some());
    assert!(info.is_visited(field));
    assert_eq!(info.visits(field).len(), 1);
    assert!(info.cycle().is_some());
}

#[test]
fn cycle_through_a_method_is_reported() {
    // class Temp { int celsius := fahrenheit() - 32; int fahrenheit() { return celsius + 32; } }
    let mut arena = NodeArena::new();
    let call = arena.call("fahrenheit", vec![]);
    let thirty_two = arena.int(32);
    let diff = arena.binary(BinaryOp::Sub, call, thirty_two);
    let celsius = bound(&mut arena, "int", "celsius", diff);
    let read = arena.ident("celsius");
    let offset = arena.int(32);
    let sum = arena.binary(BinaryOp::Add, read, offset);
    let ret = arena.return_stmt(sum);
    let body = arena.block(vec![ret]);
    let method = arena.method(ModifierFlags::empty(), "fahrenheit", vec![], ty("int"), body);
    let temp = arena.class_decl(ClassSpec::class("Temp"), vec![celsius, method]);
    let program = Program::new(arena, vec![temp]);

    let report = program
        .cycles(CyclePolicy::default())
        .check_field(celsius)
        .expect("cycle");
    assert_eq!(report.trace(), "Temp.celsius -> Temp.fahrenheit() -> Temp.celsius");
}

#[test]
fn static_bindings_referencing_each_other_cycle() {
    let mut arena = NodeArena::new();
    let b_ref = arena.ident("b");
    let a = arena.bound_field(ModifierFlags::STATIC, ty("int"), "a", b_ref, BindingDirection::Forward);
    let a_ref = arena.ident("a");
    let b = arena.bound_field(ModifierFlags::STATIC, ty("int"), "b", a_ref, BindingDirection::Forward);
    let config = arena.class_decl(ClassSpec::class("Config"), vec![a, b]);
    let program = Program::new(arena, vec![config]);

    let report = program
        .cycles(CyclePolicy::default())
        .check_field(a)
        .expect("cycle");
    assert_eq!(report.trace(), "Config.a -> Config.b -> Config.a");
}

/// class Base { B other; int level := other.level; }
/// class A extends Base {}  class B extends Base {}
fn receiver_program() -> (Program, NodeIndex) {
    let mut arena = NodeArena::new();
    let other = plain(&mut arena, "B", "other");
    let read = arena.ident("other.level");
    let level = bound(&mut arena, "int", "level", read);
    let base = arena.class_decl(ClassSpec::class("Base"), vec![other, level]);
    let a = arena.class_decl(ClassSpec::class("A").extends(ty("Base")), vec![]);
    let b = arena.class_decl(ClassSpec::class("B").extends(ty("Base")), vec![]);
    (Program::new(arena, vec![base, a, b]), level)
}

#[test]
fn unrelated_receiver_types_are_different_objects() {
    let (program, level) = receiver_program();
    let a = program.type_id("A");

    // Reached from an `A`, `other.level` reads a `B`: no cycle at that step.
    let mut info = program.cycles(CyclePolicy {
        mismatch: MismatchPolicy::Ignore,
        ..CyclePolicy::default()
    });
    assert!(!info.visit(level, ThisContext::of_type(a)));
    assert!(info.cycle().is_none());
    assert!(info.warnings().is_empty());
    assert!(!info.is_visited(level));
}

#[test]
fn related_receivers_on_different_paths_follow_the_mismatch_policy() {
    let (program, level) = receiver_program();
    let a = program.type_id("A");

    // `other.level` then `other.other.level`: both receivers are `B`.
    let mut warn = program.cycles(CyclePolicy::default());
    assert!(!warn.visit(level, ThisContext::of_type(a)));
    assert_eq!(warn.warnings().len(), 1);
    let warning = &warn.warnings()[0];
    assert!(!warning.is_error());
    assert_eq!(
        warning.closing_entry().and_then(|e| e.context.prefix.as_deref()),
        Some("other.other")
    );
    assert_eq!(
        warning.to_diagnostic(&program.arena).code,
        diagnostic_codes::BINDING_CONTEXT_MISMATCH
    );

    let mut strict = program.cycles(CyclePolicy {
        mismatch: MismatchPolicy::Error,
        ..CyclePolicy::default()
    });
    assert!(strict.visit(level, ThisContext::of_type(a)));
    assert!(strict.cycle().is_some_and(CycleReport::is_error));
}

#[test]
fn subclass_receiver_may_be_this() {
    let (program, level) = receiver_program();
    // Declared in Base, `other` (a B) may or may not be this very object.
    let mut warn = program.cycles(CyclePolicy::default());
    assert!(warn.check_field(level).is_none());
    assert_eq!(warn.warnings().len(), 1);
    assert_eq!(warn.warnings()[0].trace(), "Base.level -> Base.level");

    let report = program
        .cycles(CyclePolicy {
            mismatch: MismatchPolicy::Error,
            ..CyclePolicy::default()
        })
        .check_field(level)
        .expect("cycle");
    assert_eq!(report.trace(), "Base.level -> Base.level");
}

/// class Node { Node next; int size := next.size; }
fn linked_program() -> (Program, NodeIndex) {
    let mut arena = NodeArena::new();
    let next = plain(&mut arena, "Node", "next");
    let read = arena.ident("next.size");
    let size = bound(&mut arena, "int", "size", read);
    let node = arena.class_decl(ClassSpec::class("Node"), vec![next, size]);
    (Program::new(arena, vec![node]), size)
}

#[test]
fn recursive_structure_follows_the_mismatch_policy() {
    let (program, size) = linked_program();

    let mut ignore = program.cycles(CyclePolicy {
        mismatch: MismatchPolicy::Ignore,
        ..CyclePolicy::default()
    });
    assert!(ignore.check_field(size).is_none());
    assert!(ignore.warnings().is_empty());
    assert!(!ignore.is_visited(size));

    let mut warn = program.cycles(CyclePolicy::default());
    assert!(warn.check_field(size).is_none());
    assert_eq!(warn.warnings().len(), 1);
    let warning = &warn.warnings()[0];
    assert!(!warning.is_error());
    assert_eq!(warning.trace(), "Node.size -> Node.size");
    assert_eq!(
        warning.closing_entry().and_then(|e| e.context.prefix.as_deref()),
        Some("next")
    );
    let reports = program.cycles(CyclePolicy::default()).check_tree(program.root);
    assert_eq!(reports.len(), 1);
    assert!(!reports[0].is_error());

    let mut strict = program.cycles(CyclePolicy {
        mismatch: MismatchPolicy::Error,
        ..CyclePolicy::default()
    });
    let report = strict.check_field(size).expect("cycle");
    assert!(report.is_error());
    assert_eq!(report.trace(), "Node.size -> Node.size");
}

#[test]
fn context_relation_checks_types_before_paths() {
    let (program, _) = receiver_program();
    let db: &dyn TypeDatabase = &program.registry;
    let base = program.type_id("Base");
    let a = program.type_id("A");
    let b = program.type_id("B");

    let this_a = ThisContext::of_type(a);
    assert_eq!(this_a.relation(db, &ThisContext::of_type(b)), ContextRelation::Distinct);
    assert_eq!(this_a.relation(db, &ThisContext::of_type(base)), ContextRelation::Same);
    assert_eq!(
        this_a.relation(db, &ThisContext::qualified(Some(base), "next")),
        ContextRelation::Ambiguous
    );
    assert_eq!(
        ThisContext::qualified(Some(base), "next").relation(db, &this_a),
        ContextRelation::Ambiguous
    );
    assert_eq!(
        ThisContext::qualified(Some(a), "next").relation(db, &ThisContext::qualified(Some(base), "next")),
        ContextRelation::Same
    );
    assert_eq!(
        ThisContext::qualified(Some(a), "left").relation(db, &ThisContext::qualified(Some(base), "right")),
        ContextRelation::Ambiguous
    );
    assert_eq!(
        ThisContext::qualified(None, "left").relation(db, &ThisContext::qualified(Some(b), "left")),
        ContextRelation::Same
    );
    assert_eq!(ThisContext::qualified(Some(a), "p").describe(db), "p: A");
    assert_eq!(ThisContext::default().describe(db), "this");
}

#[test]
fn cycle_diagnostic_carries_the_trace() {
    let mut arena = NodeArena::new();
    let total = arena.ident("total");
    let field = bound(&mut arena, "int", "total", total);
    let counter = arena.class_decl(ClassSpec::class("Counter"), vec![field]);
    let program = Program::new(arena, vec![counter]);

    let report = program
        .cycles(CyclePolicy::default())
        .check_field(field)
        .expect("cycle");
    let diagnostic = report.to_diagnostic(&program.arena);
    assert_eq!(diagnostic.code, diagnostic_codes::BINDING_CYCLE);
    assert!(diagnostic.is_error());
    assert_eq!(
        diagnostic.message_text,
        "Binding cycle detected: Counter.total -> Counter.total."
    );
    assert_eq!(diagnostic.node, Some(field.0));
    assert!(report.detailed_trace(&program.registry).contains("[this: Counter]"));
}

#[test]
fn depth_limit_stops_the_walk() {
    // class Chain { Chain next; int value := next.value; } walked with no
    // room to descend.
    let mut arena = NodeArena::new();
    let next = plain(&mut arena, "Chain", "next");
    let read = arena.ident("next.value");
    let value = bound(&mut arena, "int", "value", read);
    let chain = arena.class_decl(ClassSpec::class("Chain"), vec![next, value]);
    let program = Program::new(arena, vec![chain]);

    let mut info = program.cycles(CyclePolicy {
        max_depth: 0,
        ..CyclePolicy::default()
    });
    assert!(info.check_field(value).is_none());
    assert!(!info.is_visited(value));
}

#[test]
fn mismatch_policy_parses_config_names() {
    assert_eq!(MismatchPolicy::from_name("ignore"), Some(MismatchPolicy::Ignore));
    assert_eq!(MismatchPolicy::from_name("Warn"), Some(MismatchPolicy::Warn));
    assert_eq!(MismatchPolicy::from_name("ERROR"), Some(MismatchPolicy::Error));
    assert_eq!(MismatchPolicy::from_name("fatal"), None);
    assert_eq!(CyclePolicy::default().mismatch, MismatchPolicy::Warn);
}

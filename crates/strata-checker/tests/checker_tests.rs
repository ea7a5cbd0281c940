use super::*;
use indexmap::IndexSet;
use strata_ast::{AssignOp, BinaryOp, ClassSpec, ModifierFlags, NodeArena, NodeIndex, TypeSyntax, UnaryOp, param};
use strata_common::diagnostics::diagnostic_codes;
use strata_solver::{TypeDatabase, TypeRef, TypeRegistry};

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
    fn new(arena: NodeArena, root: NodeIndex) -> Self {
        let mut program = Program {
            arena,
            registry: TypeRegistry::new(),
            model: SemanticModel::new(),
            root,
        };
        declare_types(&program.arena, root, &mut program.registry, &mut program.model);
        program
    }

    fn check(mut self) -> Self {
        let mut state = CheckerState::new(
            &mut self.arena,
            &self.registry,
            &mut self.model,
            CheckerOptions::default(),
        );
        state.check(self.root);
        self
    }

    fn codes(&self) -> Vec<u32> {
        self.model.diagnostics().iter().map(|d| d.code).collect()
    }

    fn code_at(&self, idx: NodeIndex) -> Option<u32> {
        self.model.error(idx).map(|d| d.code)
    }

    fn type_of(&self, idx: NodeIndex) -> TypeRef {
        self.model.type_of(idx).cloned().unwrap_or(TypeRef::Unresolved)
    }

    fn class(&self, name: &str) -> TypeRef {
        TypeRef::Class(self.registry.find_type(name).expect("type"))
    }
}

/// `class Main { static void run() { statements } }` plus extra classes.
fn program(arena: &mut NodeArena, statements: Vec<NodeIndex>, extra: Vec<NodeIndex>) -> NodeIndex {
    let body = arena.block(statements);
    let run = arena.method(ModifierFlags::STATIC, "run", vec![], ty("void"), body);
    let main = arena.class_decl(ClassSpec::class("Main"), vec![run]);
    let mut types = vec![main];
    types.extend(extra);
    arena.source_file(types)
}

#[test]
fn loop_with_locals_checks_cleanly() {
    let mut arena = NodeArena::new();
    let zero = arena.int(0);
    let sum_decl = arena.var(ty("int"), "sum", zero);
    let init = arena.int(0);
    let i_decl = arena.var(ty("int"), "i", init);
    let i = arena.ident("i");
    let three = arena.int(3);
    let cond = arena.binary(BinaryOp::Lt, i, three);
    let i2 = arena.ident("i");
    let incr = arena.unary(UnaryOp::PostIncrement, i2);
    let i3 = arena.ident("i");
    let one = arena.int(1);
    let is_one = arena.binary(BinaryOp::Eq, i3, one);
    let skip = arena.continue_stmt(None);
    let guard = arena.if_stmt(is_one, skip, NodeIndex::NONE);
    let sum = arena.ident("sum");
    let i4 = arena.ident("i");
    let add = arena.compound_assign(AssignOp::Add, sum, i4);
    let add_stmt = arena.expr_stmt(add);
    let body = arena.block(vec![guard, add_stmt]);
    let for_loop = arena.for_stmt(vec![i_decl], cond, vec![incr], body);
    let root = program(&mut arena, vec![sum_decl, for_loop], vec![]);

    let p = Program::new(arena, root).check();
    assert!(p.codes().is_empty(), "unexpected diagnostics: {:?}", p.codes());
    assert_eq!(p.type_of(cond), TypeRef::BOOLEAN);
    assert_eq!(p.type_of(add), TypeRef::INT);
    assert_eq!(p.type_of(incr), TypeRef::INT);
    assert_eq!(p.model.bindings(sum), &[MemberBinding::Local { name: "sum".into() }]);
    assert_eq!(p.model.cached_frame_size(for_loop), Some(1));
}

#[test]
fn inner_block_declaration_shadows_outer_one() {
    let mut arena = NodeArena::new();
    let one = arena.int(1);
    let outer_decl = arena.var(ty("int"), "x", one);
    let text = arena.string("s");
    let inner_decl = arena.var(ty("String"), "x", text);
    let inner_use = arena.ident("x");
    let inner_stmt = arena.expr_stmt(inner_use);
    let inner = arena.block(vec![inner_decl, inner_stmt]);
    let outer_use = arena.ident("x");
    let outer_stmt = arena.expr_stmt(outer_use);
    let root = program(&mut arena, vec![outer_decl, inner, outer_stmt], vec![]);

    let p = Program::new(arena, root).check();
    assert!(p.codes().is_empty());
    assert_eq!(p.type_of(inner_use), p.class("String"));
    assert_eq!(p.type_of(outer_use), TypeRef::INT);
}

#[test]
fn redeclaring_in_the_same_scope_is_reported_once() {
    let mut arena = NodeArena::new();
    let one = arena.int(1);
    let first = arena.var(ty("int"), "a", one);
    let two = arena.int(2);
    let second_decl = arena.var_declarator("a", two);
    let second = arena.var_stmt(ty("int"), vec![second_decl]);
    let root = program(&mut arena, vec![first, second], vec![]);

    let p = Program::new(arena, root).check();
    assert_eq!(p.code_at(second_decl), Some(diagnostic_codes::DUPLICATE_DEFINITION));
    assert_eq!(p.codes(), vec![diagnostic_codes::DUPLICATE_DEFINITION]);
}

#[test]
fn initializers_must_be_assignable() {
    let mut arena = NodeArena::new();
    let text = arena.string("no");
    let bad = arena.var(ty("int"), "a", text);
    let small = arena.int(5);
    let fits = arena.var(ty("byte"), "b", small);
    let large = arena.int(300);
    let overflow = arena.var(ty("byte"), "c", large);
    let number = arena.int(7);
    let boxed = arena.var(ty("Integer"), "d", number);
    let root = program(&mut arena, vec![bad, fits, overflow, boxed], vec![]);

    let p = Program::new(arena, root).check();
    assert_eq!(p.code_at(text), Some(diagnostic_codes::TYPE_MISMATCH));
    assert_eq!(p.code_at(small), None);
    assert_eq!(p.code_at(large), Some(diagnostic_codes::TYPE_MISMATCH));
    assert_eq!(p.code_at(number), None);
    assert_eq!(p.codes().len(), 2);
}

#[test]
fn conditions_and_operators_are_checked() {
    let mut arena = NodeArena::new();
    let one = arena.int(1);
    let empty = arena.block(vec![]);
    let bad_if = arena.if_stmt(one, empty, NodeIndex::NONE);
    let yes = arena.boolean(true);
    let two = arena.int(2);
    let bad_add = arena.binary(BinaryOp::Add, yes, two);
    let bad_stmt = arena.expr_stmt(bad_add);
    let text = arena.string("n=");
    let n = arena.int(3);
    let concat = arena.binary(BinaryOp::Add, text, n);
    let concat_stmt = arena.expr_stmt(concat);
    let root = program(&mut arena, vec![bad_if, bad_stmt, concat_stmt], vec![]);

    let p = Program::new(arena, root).check();
    assert_eq!(p.code_at(one), Some(diagnostic_codes::CONDITION_NOT_BOOLEAN));
    assert_eq!(p.code_at(bad_add), Some(diagnostic_codes::OPERATOR_NOT_APPLICABLE));
    assert_eq!(p.type_of(concat), p.class("String"));
}

#[test]
fn jumps_need_an_enclosing_target() {
    let mut arena = NodeArena::new();
    let stray = arena.break_stmt(None);
    let yes = arena.boolean(true);
    let missing = arena.continue_stmt(Some("nowhere"));
    let labeled_break = arena.break_stmt(Some("outer"));
    let body = arena.block(vec![missing, labeled_break]);
    let loop_stmt = arena.while_stmt(yes, body);
    let labeled = arena.labeled("outer", loop_stmt);
    let root = program(&mut arena, vec![stray, labeled], vec![]);

    let p = Program::new(arena, root).check();
    assert_eq!(p.code_at(stray), Some(diagnostic_codes::JUMP_OUTSIDE_LOOP));
    assert_eq!(p.code_at(missing), Some(diagnostic_codes::UNDEFINED_LABEL));
    assert_eq!(p.code_at(labeled_break), None);
}

#[test]
fn identifier_chains_bind_every_segment() {
    let mut arena = NodeArena::new();
    let x = arena.field(ModifierFlags::empty(), ty("int"), "x", NodeIndex::NONE);
    let one = arena.int(1);
    let ret = arena.return_stmt(one);
    let get_body = arena.block(vec![ret]);
    let get_y = arena.method(ModifierFlags::empty(), "getY", vec![], ty("int"), get_body);
    let set_body = arena.block(vec![]);
    let set_y = arena.method(
        ModifierFlags::empty(),
        "setY",
        vec![param(ty("int"), "v")],
        ty("void"),
        set_body,
    );
    let point = arena.class_decl(ClassSpec::class("Point"), vec![x, get_y, set_y]);

    let alloc = arena.new_object(ty("Point"), vec![]);
    let decl = arena.var(ty("Point"), "p", alloc);
    let px = arena.ident("p.x");
    let five = arena.int(5);
    let store = arena.assign(px, five);
    let store_stmt = arena.expr_stmt(store);
    let py = arena.ident("p.y");
    let read = arena.var(ty("int"), "y", py);
    let hi = arena.string("hi");
    let print = arena.call("System.out.println", vec![hi]);
    let print_stmt = arena.expr_stmt(print);
    let root = program(&mut arena, vec![decl, store_stmt, read, print_stmt], vec![point]);

    let p = Program::new(arena, root).check();
    assert!(p.codes().is_empty(), "unexpected diagnostics: {:?}", p.codes());
    let point_id = p.registry.find_type("Point").expect("Point");

    assert_eq!(
        p.model.bindings(px),
        &[
            MemberBinding::Local { name: "p".into() },
            MemberBinding::Property {
                accessor: PropertyAccessor::Field {
                    owner: point_id,
                    name: "x".into(),
                    is_static: false,
                },
                receiver: Receiver::Value,
            },
        ]
    );
    assert!(matches!(
        p.model.final_binding(py),
        Some(MemberBinding::Property {
            accessor: PropertyAccessor::Computed { getter, setter: Some(setter), .. },
            ..
        }) if getter == "getY" && setter == "setY"
    ));

    let bindings = p.model.bindings(print);
    assert_eq!(bindings.len(), 3);
    assert!(matches!(bindings[0], MemberBinding::Type(_)));
    assert!(matches!(
        bindings[1],
        MemberBinding::Property {
            accessor: PropertyAccessor::Native { key: "System.out" },
            ..
        }
    ));
    match &bindings[2] {
        MemberBinding::Method { target, receiver } => {
            assert_eq!(target.params, vec![p.class("String")]);
            assert_eq!(*receiver, Receiver::Value);
        }
        other => panic!("expected a method binding, got {other:?}"),
    }
    assert_eq!(p.type_of(print), TypeRef::VOID);
}

#[test]
fn unknown_names_and_members_are_reported() {
    let mut arena = NodeArena::new();
    let ghost = arena.ident("ghost");
    let ghost_stmt = arena.expr_stmt(ghost);
    let text = arena.string("abc");
    let decl = arena.var(ty("String"), "s", text);
    let missing = arena.ident("s.nothing");
    let missing_stmt = arena.expr_stmt(missing);
    let arg = arena.string("x");
    let wrong = arena.call("s.charAt", vec![arg]);
    let wrong_stmt = arena.expr_stmt(wrong);
    let root = program(&mut arena, vec![ghost_stmt, decl, missing_stmt, wrong_stmt], vec![]);

    let p = Program::new(arena, root).check();
    assert_eq!(p.code_at(ghost), Some(diagnostic_codes::UNRESOLVED_IDENTIFIER));
    assert_eq!(p.code_at(missing), Some(diagnostic_codes::NO_SUCH_MEMBER));
    assert_eq!(p.code_at(wrong), Some(diagnostic_codes::NO_MATCHING_METHOD));
    assert_eq!(p.type_of(ghost), TypeRef::Unresolved);
}

#[test]
fn lambdas_take_their_type_from_the_target() {
    let mut arena = NodeArena::new();
    let call = arena.call("s.length", vec![]);
    let lambda = arena.lambda(&["s"], call);
    let decl = arena.var(ty("Function<String, Integer>"), "f", lambda);
    let one = arena.int(1);
    let untyped = arena.lambda(&[], one);
    let object = arena.var(ty("Object"), "o", untyped);
    let root = program(&mut arena, vec![decl, object], vec![]);

    let p = Program::new(arena, root).check();
    let function = p.registry.find_type("Function").expect("Function");
    assert_eq!(
        p.type_of(lambda),
        TypeRef::parameterized(function, vec![p.class("String"), p.class("Integer")])
    );
    assert_eq!(p.type_of(call), TypeRef::INT);
    assert_eq!(p.model.cached_frame_size(lambda), Some(1));
    assert_eq!(p.code_at(untyped), Some(diagnostic_codes::LAMBDA_TARGET_UNKNOWN));
    assert_eq!(p.codes().len(), 1);
}

#[test]
fn diamond_allocation_uses_the_expected_type() {
    let mut arena = NodeArena::new();
    let alloc = arena.new_object(ty("ArrayList"), vec![]);
    let list = arena.var(ty("List<String>"), "names", alloc);
    let zero = arena.int(0);
    let get = arena.call("names.get", vec![zero]);
    let first = arena.var(ty("String"), "first", get);
    let root = program(&mut arena, vec![list, first], vec![]);

    let p = Program::new(arena, root).check();
    assert!(p.codes().is_empty(), "unexpected diagnostics: {:?}", p.codes());
    let array_list = p.registry.find_type("ArrayList").expect("ArrayList");
    assert_eq!(
        p.type_of(alloc),
        TypeRef::parameterized(array_list, vec![p.class("String")])
    );
    assert_eq!(p.type_of(get), p.class("String"));
}

#[test]
fn for_each_element_types() {
    let mut arena = NodeArena::new();
    let one = arena.int(1);
    let two = arena.int(2);
    let init = arena.array_init(vec![one, two]);
    let values = arena.new_array(ty("int"), vec![], init);
    let decl = arena.var(ty("int[]"), "values", values);
    let source = arena.ident("values");
    let body = arena.block(vec![]);
    let each = arena.for_each(ty("int"), "v", source, body);
    let scalar = arena.int(3);
    let body2 = arena.block(vec![]);
    let bad = arena.for_each(ty("int"), "w", scalar, body2);
    let root = program(&mut arena, vec![decl, each, bad], vec![]);

    let p = Program::new(arena, root).check();
    assert_eq!(p.type_of(values), TypeRef::array_of(TypeRef::INT));
    assert_eq!(p.type_of(init), TypeRef::array_of(TypeRef::INT));
    assert_eq!(p.model.inferred_type(each), Some(&TypeRef::INT));
    assert_eq!(p.code_at(scalar), Some(diagnostic_codes::NOT_ITERABLE));
    assert_eq!(p.codes().len(), 1);
}

#[test]
fn this_references_respect_static_context_and_nesting() {
    let mut arena = NodeArena::new();
    let outer_this = arena.outer_this("Outer");
    let ret = arena.return_stmt(outer_this);
    let body = arena.block(vec![ret]);
    let owner = arena.method(ModifierFlags::empty(), "owner", vec![], ty("Outer"), body);
    let inner = arena.class_decl(ClassSpec::class("Inner"), vec![owner]);
    let this = arena.this();
    let stmt = arena.expr_stmt(this);
    let static_body = arena.block(vec![stmt]);
    let helper = arena.method(ModifierFlags::STATIC, "helper", vec![], ty("void"), static_body);
    let outer = arena.class_decl(ClassSpec::class("Outer"), vec![inner, helper]);
    let file = arena.source_file(vec![outer]);

    let p = Program::new(arena, file).check();
    assert_eq!(p.type_of(outer_this), p.class("Outer"));
    assert_eq!(p.model.this_hops(outer_this), 1);
    assert_eq!(p.code_at(this), Some(diagnostic_codes::STATIC_CONTEXT_THIS));
    assert_eq!(p.codes().len(), 1);
}

#[test]
fn allocation_casts_and_assignment_targets() {
    let mut arena = NodeArena::new();
    let shape = arena.class_decl(ClassSpec::interface("Shape"), vec![]);
    let abstract_alloc = arena.new_object(ty("Shape"), vec![]);
    let alloc_stmt = arena.expr_stmt(abstract_alloc);
    let five = arena.int(5);
    let bad_cast = arena.cast(ty("String"), five);
    let cast_stmt = arena.expr_stmt(bad_cast);
    let real = arena.double(3.5);
    let narrowing = arena.cast(ty("int"), real);
    let narrowing_stmt = arena.expr_stmt(narrowing);
    let one = arena.int(1);
    let two = arena.int(2);
    let not_lvalue = arena.assign(one, two);
    let assign_stmt = arena.expr_stmt(not_lvalue);
    let root = program(&mut arena, vec![alloc_stmt, cast_stmt, narrowing_stmt, assign_stmt], vec![shape]);

    let p = Program::new(arena, root).check();
    assert_eq!(p.code_at(abstract_alloc), Some(diagnostic_codes::ABSTRACT_INSTANTIATION));
    assert_eq!(p.code_at(bad_cast), Some(diagnostic_codes::INVALID_CAST));
    assert_eq!(p.code_at(narrowing), None);
    assert_eq!(p.type_of(narrowing), TypeRef::INT);
    assert_eq!(p.code_at(one), Some(diagnostic_codes::NOT_AN_LVALUE));
}

#[test]
fn returns_match_the_method_signature() {
    let mut arena = NodeArena::new();
    let bare = arena.return_stmt(NodeIndex::NONE);
    let body = arena.block(vec![bare]);
    let count = arena.method(ModifierFlags::STATIC, "count", vec![], ty("int"), body);
    let text = arena.string("x");
    let wrong = arena.return_stmt(text);
    let body2 = arena.block(vec![wrong]);
    let size = arena.method(ModifierFlags::STATIC, "size", vec![], ty("int"), body2);
    let class = arena.class_decl(ClassSpec::class("Returns"), vec![count, size]);

    let p = Program::new(arena, class).check();
    assert_eq!(p.code_at(bare), Some(diagnostic_codes::MISSING_RETURN_VALUE));
    assert_eq!(p.code_at(text), Some(diagnostic_codes::TYPE_MISMATCH));
}

#[test]
fn dependencies_cover_referenced_types() {
    let mut arena = NodeArena::new();
    let point = arena.class_decl(ClassSpec::class("Point"), vec![]);
    let alloc = arena.new_object(ty("Point"), vec![]);
    let decl = arena.var(ty("Point"), "p", alloc);
    let text = arena.string("s");
    let label = arena.var(ty("String"), "label", text);
    let root = program(&mut arena, vec![decl, label], vec![point]);

    let mut p = Program::new(arena, root);
    let main = p.registry.find_type("Main").expect("Main");
    let main_node = p.registry.declaration(main).expect("decl").decl_node;

    let mut declared = IndexSet::new();
    let mut all = IndexSet::new();
    {
        let mut state = CheckerState::new(&mut p.arena, &p.registry, &mut p.model, CheckerOptions::default());
        state.collect_dependencies(main_node, &mut declared, DependencyMode::Declared);
        state.collect_dependencies(main_node, &mut all, DependencyMode::All);
    }
    assert!(declared.contains("Point"));
    assert!(declared.contains("java.lang.String"));
    assert!(declared.contains("Main"));
    assert!(!declared.contains("java.lang.Object"));
    assert!(all.contains("java.lang.Object"));
    assert_eq!(p.registry.qualified_type_name(main), "Main");
}

use super::*;
use strata_ast::{BinaryOp, ClassSpec, ModifierFlags, NodeArena, NodeIndex, NodeState, TypeSyntax};
use strata_solver::{TypeRef, TypeRegistry};

fn ty(text: &str) -> TypeSyntax {
    TypeSyntax::parse(text).expect("type syntax")
}

struct Fixture {
    arena: NodeArena,
    registry: TypeRegistry,
    model: SemanticModel,
    class: NodeIndex,
    method: NodeIndex,
    sum: NodeIndex,
    use_site: NodeIndex,
    bad: NodeIndex,
}

/// `class Calc { int total() { int a = 1; int b = a + 2; boolean c = 3; return b; } }`
fn fixture() -> Fixture {
    let mut arena = NodeArena::new();
    let one = arena.int(1);
    let a = arena.var(ty("int"), "a", one);
    let a_ref = arena.ident("a");
    let two = arena.int(2);
    let sum = arena.binary(BinaryOp::Add, a_ref, two);
    let b = arena.var(ty("int"), "b", sum);
    let bad = arena.int(3);
    let c = arena.var(ty("boolean"), "c", bad);
    let use_site = arena.ident("b");
    let ret = arena.return_stmt(use_site);
    let body = arena.block(vec![a, b, c, ret]);
    let method = arena.method(ModifierFlags::empty(), "total", vec![], ty("int"), body);
    let class = arena.class_decl(ClassSpec::class("Calc"), vec![method]);

    let mut registry = TypeRegistry::new();
    let mut model = SemanticModel::new();
    declare_types(&arena, class, &mut registry, &mut model);
    Fixture {
        arena,
        registry,
        model,
        class,
        method,
        sum,
        use_site,
        bad,
    }
}

impl Fixture {
    fn checker(&mut self) -> CheckerState<'_> {
        CheckerState::new(
            &mut self.arena,
            &self.registry,
            &mut self.model,
            CheckerOptions::default(),
        )
    }
}

#[test]
fn check_advances_every_node_to_validated() {
    let mut f = fixture();
    let class = f.class;
    f.checker().check(class);

    for idx in f.arena.descendants(class) {
        assert_eq!(f.arena.state(idx), NodeState::Validated, "node {}", idx.0);
    }
    assert_eq!(f.model.type_of(f.sum), Some(&TypeRef::INT));
    assert_eq!(f.model.diagnostics().len(), 1);
    assert!(f.model.error(f.bad).is_some());
}

#[test]
fn validating_again_does_not_duplicate_diagnostics() {
    let mut f = fixture();
    let class = f.class;
    let mut checker = f.checker();
    checker.check(class);
    checker.validate(class);
    checker.check(class);
    drop(checker);
    assert_eq!(f.model.diagnostics().len(), 1);
}

#[test]
fn stop_discards_results_and_restart_reproduces_them() {
    let mut f = fixture();
    let class = f.class;
    f.checker().check(class);
    let before = f.model.type_of(f.use_site).cloned();

    f.checker().stop(class);
    for idx in f.arena.descendants(class) {
        assert_eq!(f.arena.state(idx), NodeState::Stopped);
    }
    assert!(f.model.type_of(f.use_site).is_none());
    assert!(f.model.diagnostics().is_empty());
    // Declarations survive a stop.
    assert!(f.model.declared_type(class).is_some());

    f.checker().check(class);
    assert_eq!(f.model.type_of(f.use_site).cloned(), before);
    assert_eq!(f.model.diagnostics().len(), 1);
}

#[test]
fn stopping_an_expression_invalidates_up_to_its_member() {
    let mut f = fixture();
    let (class, method, sum) = (f.class, f.method, f.sum);
    f.checker().check(class);

    f.checker().stop(sum);
    let statement = f.arena.parent_of(f.arena.parent_of(sum));
    assert_eq!(f.arena.state(sum), NodeState::Stopped);
    assert_eq!(f.arena.state(statement), NodeState::Stopped);
    assert!(f.model.type_of(statement).is_none());
    assert_eq!(f.arena.state(method), NodeState::Validated);

    f.checker().validate(sum);
    assert_eq!(f.model.type_of(sum), Some(&TypeRef::INT));
    assert!(f.arena.state(sum).is_validated());
}

#[test]
fn resolve_type_outside_a_walk_starts_the_member() {
    let mut f = fixture();
    let use_site = f.use_site;
    let ty = f.checker().resolve_type(use_site);
    assert_eq!(ty, TypeRef::INT);
    assert_eq!(
        f.model.bindings(use_site),
        &[MemberBinding::Local { name: "b".into() }]
    );
    assert!(f.arena.state(use_site).is_started());
    assert!(!f.arena.state(use_site).is_validated());
}

#[test]
fn refresh_restarts_only_after_the_database_changed() {
    let mut f = fixture();
    let class = f.class;
    f.checker().check(class);
    assert!(!f.checker().refresh_bound_types(class));

    declare_types(&f.arena, class, &mut f.registry, &mut f.model);
    assert!(f.checker().refresh_bound_types(class));
    assert!(!f.checker().refresh_bound_types(class));
    assert!(f.arena.state(class).is_validated());
    assert_eq!(f.model.type_of(f.sum), Some(&TypeRef::INT));
}

#[test]
fn frame_sizes_match_declared_locals() {
    let mut f = fixture();
    let (class, method) = (f.class, f.method);
    let body = match f.arena.data(method) {
        Some(strata_ast::NodeData::MethodDeclaration { body, .. }) => *body,
        _ => panic!("method"),
    };
    let mut checker = f.checker();
    checker.check(class);
    assert_eq!(checker.frame_size(body), 3);
    assert_eq!(checker.frame_size(method), 0);
    assert_eq!(frame_size(checker.arena(), body), 3);
}

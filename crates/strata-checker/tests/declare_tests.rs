use super::*;
use strata_ast::{ClassSpec, ModifierFlags, NodeArena, TypeSyntax, param};
use strata_common::diagnostics::diagnostic_codes;
use strata_solver::find_field;

fn ty(text: &str) -> TypeSyntax {
    TypeSyntax::parse(text).expect("type syntax")
}

#[test]
fn classes_register_with_members_and_nested_names() {
    let mut arena = NodeArena::new();
    let count = arena.field(ModifierFlags::empty(), ty("int"), "count", NodeIndex::NONE);
    let body = arena.block(vec![]);
    let bump = arena.method(
        ModifierFlags::empty(),
        "bump",
        vec![param(ty("int"), "by")],
        ty("void"),
        body,
    );
    let inner = arena.class_decl(ClassSpec::class("Inner"), vec![]);
    let outer = arena.class_decl(ClassSpec::class("Counter"), vec![count, bump, inner]);
    let file = arena.source_file(vec![outer]);

    let mut registry = TypeRegistry::new();
    let mut model = SemanticModel::new();
    let declared = declare_types(&arena, file, &mut registry, &mut model);

    assert_eq!(declared.len(), 2);
    let counter = registry.find_type("Counter").expect("Counter");
    let nested = registry.find_type("Counter.Inner").expect("Counter.Inner");
    assert_eq!(model.declared_type(outer), Some(counter));
    assert_eq!(model.declared_type(inner), Some(nested));

    let decl = registry.declaration(counter).expect("decl");
    assert_eq!(decl.fields["count"].ty, TypeRef::INT);
    assert_eq!(decl.methods[0].name, "bump");
    assert_eq!(decl.methods[0].param_names, vec!["by".to_string()]);
    let inner_decl = registry.declaration(nested).expect("inner");
    assert_eq!(inner_decl.enclosing, Some(counter));
    assert!(!inner_decl.is_static);
}

#[test]
fn forward_references_between_classes_resolve() {
    let mut arena = NodeArena::new();
    let next = arena.field(ModifierFlags::empty(), ty("Node"), "next", NodeIndex::NONE);
    let list = arena.class_decl(ClassSpec::class("LinkedList"), vec![next]);
    let node = arena.class_decl(ClassSpec::class("Node"), vec![]);
    let file = arena.source_file(vec![list, node]);

    let mut registry = TypeRegistry::new();
    let mut model = SemanticModel::new();
    declare_types(&arena, file, &mut registry, &mut model);

    let node_id = registry.find_type("Node").expect("Node");
    let list_ty = TypeRef::Class(registry.find_type("LinkedList").expect("LinkedList"));
    let found = find_field(&registry, &list_ty, "next").expect("next");
    assert_eq!(found.ty, TypeRef::Class(node_id));
    assert!(model.diagnostics().is_empty());
}

#[test]
fn generic_class_fields_use_its_type_variables() {
    let mut arena = NodeArena::new();
    let value = arena.field(ModifierFlags::empty(), ty("T"), "value", NodeIndex::NONE);
    let boxed = arena.class_decl(ClassSpec::class("Box").type_param("T", None), vec![value]);

    let mut registry = TypeRegistry::new();
    let mut model = SemanticModel::new();
    declare_types(&arena, boxed, &mut registry, &mut model);

    let id = registry.find_type("Box").expect("Box");
    let string = registry.string_type();
    let viewed = TypeRef::parameterized(id, vec![string.clone()]);
    let found = find_field(&registry, &viewed, "value").expect("value");
    assert_eq!(found.ty, string);
}

#[test]
fn unknown_member_types_are_reported_on_the_member() {
    let mut arena = NodeArena::new();
    let bad = arena.field(ModifierFlags::empty(), ty("Missing"), "bad", NodeIndex::NONE);
    let class = arena.class_decl(ClassSpec::class("Holder"), vec![bad]);

    let mut registry = TypeRegistry::new();
    let mut model = SemanticModel::new();
    declare_types(&arena, class, &mut registry, &mut model);

    let diag = model.error(bad).expect("error on field");
    assert_eq!(diag.code, diagnostic_codes::UNRESOLVED_TYPE);
}

#[test]
fn duplicate_classes_are_reported() {
    let mut arena = NodeArena::new();
    let first = arena.class_decl(ClassSpec::class("Twice"), vec![]);
    let second = arena.class_decl(ClassSpec::class("Twice"), vec![]);
    let file = arena.source_file(vec![first, second]);

    let mut registry = TypeRegistry::new();
    let mut model = SemanticModel::new();
    let declared = declare_types(&arena, file, &mut registry, &mut model);

    assert_eq!(declared.len(), 1);
    assert_eq!(
        model.error(second).map(|d| d.code),
        Some(diagnostic_codes::DUPLICATE_TYPE)
    );
}

#[test]
fn modifying_class_layers_onto_existing_type() {
    let mut arena = NodeArena::new();
    let base_field = arena.field(ModifierFlags::empty(), ty("int"), "a", NodeIndex::NONE);
    let base = arena.class_decl(ClassSpec::class("Widget"), vec![base_field]);
    let extra = arena.field(ModifierFlags::empty(), ty("String"), "label", NodeIndex::NONE);
    let layer = arena.class_decl(ClassSpec::class("Widget").modifying(), vec![extra]);
    let file = arena.source_file(vec![base, layer]);

    let mut registry = TypeRegistry::new();
    let mut model = SemanticModel::new();
    declare_types(&arena, file, &mut registry, &mut model);

    let base_id = model.declared_type(base).expect("base");
    let layer_id = model.declared_type(layer).expect("layer");
    assert_ne!(base_id, layer_id);
    assert_eq!(registry.resolve(base_id, true), layer_id);
    assert_eq!(registry.resolve(base_id, false), base_id);

    // Both layers' fields are visible through the chain.
    let viewed = TypeRef::Class(base_id);
    assert!(find_field(&registry, &viewed, "a").is_some());
    assert!(find_field(&registry, &viewed, "label").is_some());
}

#[test]
fn redeclaring_the_same_tree_replaces_in_place() {
    let mut arena = NodeArena::new();
    let field = arena.field(ModifierFlags::empty(), ty("int"), "x", NodeIndex::NONE);
    let class = arena.class_decl(ClassSpec::class("Reloaded"), vec![field]);

    let mut registry = TypeRegistry::new();
    let mut model = SemanticModel::new();
    declare_types(&arena, class, &mut registry, &mut model);
    let id = model.declared_type(class).expect("declared");
    let generation = registry.generation();

    declare_types(&arena, class, &mut registry, &mut model);
    assert_eq!(model.declared_type(class), Some(id));
    assert!(registry.generation() > generation);
    assert!(model.error(class).is_none());
}

#[test]
fn type_scope_sees_enclosing_type_variables_and_nested_types() {
    let mut arena = NodeArena::new();
    let inner = arena.class_decl(ClassSpec::class("Entry"), vec![]);
    let outer = arena.class_decl(ClassSpec::class("Table").type_param("K", None), vec![inner]);

    let mut registry = TypeRegistry::new();
    let mut model = SemanticModel::new();
    declare_types(&arena, outer, &mut registry, &mut model);
    let entry = model.declared_type(inner).expect("entry");

    let scope = TypeScope::for_class(&registry, entry);
    assert!(scope.find_param("K").is_some());
    assert_eq!(
        resolve_syntax(&registry, &ty("Entry[]"), &scope),
        Ok(TypeRef::array_of(TypeRef::Class(entry)))
    );
    assert_eq!(
        resolve_syntax(&registry, &ty("Nope"), &scope),
        Err("Nope".to_string())
    );
}

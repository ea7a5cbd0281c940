use super::*;
use crate::types::{FieldDecl, TypeKind, TypeOrigin, TypeRef};

fn dynamic(name: &str) -> TypeDecl {
    TypeDecl::new(name, TypeKind::Class, TypeOrigin::Dynamic)
}

#[test]
fn builtins_are_registered_by_simple_and_qualified_name() {
    let registry = TypeRegistry::new();
    let string = registry.find_type("String").expect("String");
    assert_eq!(registry.find_type("java.lang.String"), Some(string));
    assert_eq!(registry.well_known().string, Some(string));
    assert!(registry.find_type("ArrayList").is_some());
    assert!(registry.find_type("NoSuchType").is_none());
}

#[test]
fn duplicate_qualified_names_are_rejected() {
    let mut registry = TypeRegistry::new();
    registry.declare(dynamic("app.Point")).expect("first");
    assert_eq!(
        registry.declare(dynamic("app.Point")),
        Err(RegistryError::DuplicateType("app.Point".to_string()))
    );
}

#[test]
fn simple_name_first_declaration_wins() {
    let mut registry = TypeRegistry::new();
    let a = registry.declare(dynamic("a.Node")).expect("a");
    let b = registry.declare(dynamic("b.Node")).expect("b");
    assert_eq!(registry.find_type("Node"), Some(a));
    assert_eq!(registry.find_type("b.Node"), Some(b));
}

#[test]
fn modify_builds_a_chain_and_bumps_generation() {
    let mut registry = TypeRegistry::new();
    let base = registry.declare(dynamic("app.Counter")).expect("base");
    let before = registry.generation();

    let mut layer = dynamic("ignored");
    layer.add_field(FieldDecl::new("extra", TypeRef::INT));
    let modified = registry.modify(base, layer).expect("modify");

    assert!(registry.generation() > before);
    assert_eq!(registry.resolve(base, true), modified);
    assert_eq!(registry.resolve(base, false), base);
    assert_eq!(registry.find_type("Counter"), Some(modified));
    assert_eq!(registry.chain_root(modified), base);
    let decl = registry.declaration(modified).expect("decl");
    assert_eq!(decl.qualified_name, "app.Counter");
    assert_eq!(decl.modifies, Some(base));
    assert_eq!(layers(&registry, base), vec![modified, base]);
}

#[test]
fn modify_appends_to_the_most_specific_layer() {
    let mut registry = TypeRegistry::new();
    let base = registry.declare(dynamic("app.W")).expect("base");
    let second = registry.modify(base, dynamic("x")).expect("second");
    let third = registry.modify(base, dynamic("y")).expect("third");
    assert_eq!(registry.declaration(third).and_then(|d| d.modifies), Some(second));
    assert_eq!(registry.resolve(second, true), third);
}

#[test]
fn replace_keeps_identity_and_links() {
    let mut registry = TypeRegistry::new();
    let base = registry.declare(dynamic("app.R")).expect("base");
    let layer = registry.modify(base, dynamic("r")).expect("layer");
    let generation = registry.generation();

    let mut replacement = dynamic("app.R");
    replacement.add_field(FieldDecl::new("v", TypeRef::LONG));
    registry.replace(base, replacement).expect("replace");

    let decl = registry.declaration(base).expect("decl");
    assert_eq!(decl.id, base);
    assert_eq!(decl.modified_by, Some(layer));
    assert!(decl.fields.contains_key("v"));
    assert_eq!(registry.generation(), generation + 1);
    assert!(registry.replace(TypeId(9_999), dynamic("z")).is_err());
}

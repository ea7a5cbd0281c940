use super::*;
use crate::registry::TypeRegistry;
use crate::types::{MethodDecl, TypeDecl, TypeKind, TypeOrigin, TypeParameter};

fn class(registry: &mut TypeRegistry, name: &str, extends: Option<TypeId>) -> TypeId {
    let mut decl = TypeDecl::new(name, TypeKind::Class, TypeOrigin::Dynamic);
    decl.extends = extends.map(TypeRef::Class);
    registry.declare(decl).expect("declare")
}

fn named(registry: &TypeRegistry, name: &str) -> TypeRef {
    TypeRef::Class(registry.find_type(name).expect(name))
}

#[test]
fn primitive_widening_and_boxing() {
    let registry = TypeRegistry::new();
    assert!(is_assignable_from(&registry, &TypeRef::LONG, &TypeRef::INT));
    assert!(is_assignable_from(&registry, &TypeRef::DOUBLE, &TypeRef::CHAR));
    assert!(!is_assignable_from(&registry, &TypeRef::INT, &TypeRef::LONG));
    assert!(!is_assignable_from(&registry, &TypeRef::INT, &TypeRef::BOOLEAN));

    let integer = named(&registry, "Integer");
    assert!(is_assignable_from(&registry, &integer, &TypeRef::INT));
    assert!(is_assignable_from(&registry, &TypeRef::LONG, &integer));
    assert!(is_assignable_from(&registry, &registry.object_type(), &TypeRef::INT));
    assert!(is_assignable_from(&registry, &named(&registry, "Number"), &TypeRef::DOUBLE));
    assert!(!is_strictly_assignable_from(&registry, &integer, &TypeRef::INT));
}

#[test]
fn null_and_void() {
    let registry = TypeRegistry::new();
    assert!(is_assignable_from(&registry, &registry.string_type(), &TypeRef::Null));
    assert!(!is_assignable_from(&registry, &TypeRef::INT, &TypeRef::Null));
    assert!(!is_assignable_from(&registry, &registry.object_type(), &TypeRef::VOID));
}

#[test]
fn classes_are_nominal() {
    let mut registry = TypeRegistry::new();
    let shape = class(&mut registry, "app.Shape", None);
    let circle = class(&mut registry, "app.Circle", Some(shape));
    let square = class(&mut registry, "app.Square", Some(shape));

    let (shape, circle, square) = (TypeRef::Class(shape), TypeRef::Class(circle), TypeRef::Class(square));
    assert!(is_assignable_from(&registry, &shape, &circle));
    assert!(!is_assignable_from(&registry, &circle, &shape));
    assert!(!is_assignable_from(&registry, &circle, &square));
    assert!(!is_compatible(&registry, &circle, &square));
    assert!(is_compatible(&registry, &shape, &square));
    assert!(is_assignable_from(&registry, &registry.object_type(), &circle));
}

#[test]
fn modification_layers_are_the_same_type() {
    let mut registry = TypeRegistry::new();
    let base = class(&mut registry, "app.Model", None);
    let layer = registry
        .modify(base, TypeDecl::new("m", TypeKind::Class, TypeOrigin::Dynamic))
        .expect("modify");
    assert!(is_assignable_from(&registry, &TypeRef::Class(base), &TypeRef::Class(layer)));
    assert!(is_assignable_from(&registry, &TypeRef::Class(layer), &TypeRef::Class(base)));

    let sub = class(&mut registry, "app.SubModel", Some(base));
    assert!(is_assignable_from(&registry, &TypeRef::Class(layer), &TypeRef::Class(sub)));
}

#[test]
fn interfaces_fall_back_to_structure() {
    let mut registry = TypeRegistry::new();
    let runnable = named(&registry, "Runnable");

    let mut task = TypeDecl::new("app.Task", TypeKind::Class, TypeOrigin::Dynamic);
    task.add_method(MethodDecl::new("run", vec![], TypeRef::VOID));
    let task = registry.declare(task).expect("task");
    let plain = class(&mut registry, "app.Plain", None);

    assert!(is_assignable_from(&registry, &runnable, &TypeRef::Class(task)));
    assert!(!is_assignable_from(&registry, &runnable, &TypeRef::Class(plain)));
}

#[test]
fn generic_arguments_are_invariant_but_raw_is_lenient() {
    let registry = TypeRegistry::new();
    let list = registry.find_type("List").expect("List");
    let array_list = registry.find_type("ArrayList").expect("ArrayList");
    let string = registry.string_type();
    let integer = named(&registry, "Integer");

    let list_string = TypeRef::parameterized(list, vec![string.clone()]);
    let array_list_string = TypeRef::parameterized(array_list, vec![string]);
    let array_list_integer = TypeRef::parameterized(array_list, vec![integer]);

    assert!(is_assignable_from(&registry, &list_string, &array_list_string));
    assert!(!is_assignable_from(&registry, &list_string, &array_list_integer));
    assert!(is_assignable_from(&registry, &TypeRef::Class(list), &array_list_integer));
    assert!(is_assignable_from(&registry, &list_string, &TypeRef::Class(array_list)));
}

#[test]
fn arrays_and_type_variables() {
    let registry = TypeRegistry::new();
    let object = registry.object_type();
    let strings = TypeRef::array_of(registry.string_type());
    assert!(is_assignable_from(&registry, &TypeRef::array_of(object.clone()), &strings));
    assert!(is_assignable_from(&registry, &object, &strings));
    assert!(!is_assignable_from(
        &registry,
        &TypeRef::array_of(TypeRef::LONG),
        &TypeRef::array_of(TypeRef::INT)
    ));

    let number = named(&registry, "Number");
    let n = TypeRef::TypeParam(TypeParameter::new("N", Some(number.clone())));
    assert!(is_assignable_from(&registry, &number, &n));
    assert!(!is_assignable_from(&registry, &n, &number));
}

#[test]
fn as_super_substitutes_arguments() {
    let registry = TypeRegistry::new();
    let array_list = registry.find_type("ArrayList").expect("ArrayList");
    let iterable = registry.find_type("Iterable").expect("Iterable");
    let source = TypeRef::parameterized(array_list, vec![registry.string_type()]);
    let viewed = as_super(&registry, &source, iterable).expect("iterable");
    assert_eq!(viewed, TypeRef::parameterized(iterable, vec![registry.string_type()]));
    assert_eq!(unboxed_kind(&registry, &named(&registry, "Character")), Some(PrimitiveKind::Char));
}

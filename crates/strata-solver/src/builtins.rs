//! Builtin compiled types.
//!
//! Every method here is native: `native` names the implementation the
//! interpreter dispatches to, keyed `Type.member`. Overloads share a key and
//! the native implementation inspects its arguments.

use crate::db::TypeDatabase;
use crate::registry::TypeRegistry;
use crate::types::{
    FieldDecl, MethodDecl, PrimitiveKind, TypeDecl, TypeId, TypeKind, TypeOrigin, TypeParameter,
    TypeRef,
};

fn method(name: &str, params: Vec<TypeRef>, ret: TypeRef, native: &'static str) -> MethodDecl {
    let mut m = MethodDecl::new(name, params, ret);
    m.native = Some(native);
    m
}

fn static_method(name: &str, params: Vec<TypeRef>, ret: TypeRef, native: &'static str) -> MethodDecl {
    let mut m = method(name, params, ret, native);
    m.is_static = true;
    m
}

fn abstract_method(name: &str, params: Vec<TypeRef>, ret: TypeRef) -> MethodDecl {
    let mut m = MethodDecl::new(name, params, ret);
    m.is_abstract = true;
    m
}

fn constructor(params: Vec<TypeRef>, native: &'static str) -> MethodDecl {
    method("<init>", params, TypeRef::VOID, native)
}

fn static_field(name: &str, ty: TypeRef, native: &'static str) -> FieldDecl {
    let mut f = FieldDecl::new(name, ty);
    f.is_static = true;
    f.is_final = true;
    f.native = Some(native);
    f
}

struct Builder<'a> {
    registry: &'a mut TypeRegistry,
}

impl Builder<'_> {
    fn add(&mut self, decl: TypeDecl) -> TypeId {
        let name = decl.qualified_name.clone();
        // A clash means the registry was already populated; reuse the entry.
        self.registry
            .declare(decl)
            .unwrap_or_else(|_| self.registry.find_type(&name).unwrap_or(TypeId(0)))
    }

    fn class(&self, name: &str, extends: Option<TypeId>) -> TypeDecl {
        let mut decl = TypeDecl::new(name, TypeKind::Class, TypeOrigin::Compiled);
        decl.extends = extends.map(TypeRef::Class);
        decl
    }

    fn interface(&self, name: &str) -> TypeDecl {
        TypeDecl::new(name, TypeKind::Interface, TypeOrigin::Compiled)
    }
}

/// Register all builtin types and record their ids in `WellKnown`.
pub fn install(registry: &mut TypeRegistry) {
    let mut b = Builder { registry };

    // java.lang.Object
    let mut object = b.class("java.lang.Object", None);
    object.constructors.push(constructor(vec![], "Object.<init>"));
    let object_id = b.add(object);
    let obj = TypeRef::Class(object_id);
    b.registry.well_known_mut().object = Some(object_id);
    // Methods referencing Object/String are added once both exist.

    let mut string = b.class("java.lang.String", Some(object_id));
    string.constructors.push(constructor(vec![], "String.<init>"));
    let string_id = b.add(string);
    let str_ty = TypeRef::Class(string_id);
    b.registry.well_known_mut().string = Some(string_id);

    if let Some(decl) = b.registry.declaration_mut(object_id) {
        decl.add_method(method("toString", vec![], str_ty.clone(), "Object.toString"));
        decl.add_method(method("equals", vec![obj.clone()], TypeRef::BOOLEAN, "Object.equals"));
        decl.add_method(method("hashCode", vec![], TypeRef::INT, "Object.hashCode"));
    }
    if let Some(decl) = b.registry.declaration_mut(string_id) {
        decl.add_method(method("length", vec![], TypeRef::INT, "String.length"));
        decl.add_method(method("isEmpty", vec![], TypeRef::BOOLEAN, "String.isEmpty"));
        decl.add_method(method("charAt", vec![TypeRef::INT], TypeRef::CHAR, "String.charAt"));
        decl.add_method(method(
            "substring",
            vec![TypeRef::INT],
            str_ty.clone(),
            "String.substring",
        ));
        decl.add_method(method(
            "substring",
            vec![TypeRef::INT, TypeRef::INT],
            str_ty.clone(),
            "String.substring",
        ));
        decl.add_method(method("indexOf", vec![str_ty.clone()], TypeRef::INT, "String.indexOf"));
        decl.add_method(method(
            "contains",
            vec![str_ty.clone()],
            TypeRef::BOOLEAN,
            "String.contains",
        ));
        decl.add_method(method(
            "startsWith",
            vec![str_ty.clone()],
            TypeRef::BOOLEAN,
            "String.startsWith",
        ));
        decl.add_method(method("concat", vec![str_ty.clone()], str_ty.clone(), "String.concat"));
        decl.add_method(method("toUpperCase", vec![], str_ty.clone(), "String.toUpperCase"));
        decl.add_method(method("toLowerCase", vec![], str_ty.clone(), "String.toLowerCase"));
        decl.add_method(method("trim", vec![], str_ty.clone(), "String.trim"));
        decl.add_method(static_method(
            "valueOf",
            vec![obj.clone()],
            str_ty.clone(),
            "String.valueOf",
        ));
    }

    // Number and the boxed primitives.
    let mut number = b.class("java.lang.Number", Some(object_id));
    number.is_abstract = true;
    number.add_method(method("intValue", vec![], TypeRef::INT, "Number.intValue"));
    number.add_method(method("longValue", vec![], TypeRef::LONG, "Number.longValue"));
    number.add_method(method("doubleValue", vec![], TypeRef::DOUBLE, "Number.doubleValue"));
    let number_id = b.add(number);
    b.registry.well_known_mut().number = Some(number_id);

    for kind in [
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
        PrimitiveKind::Boolean,
        PrimitiveKind::Char,
    ] {
        let Some(boxed) = kind.boxed_name() else {
            continue;
        };
        let parent = if kind.is_numeric() && kind != PrimitiveKind::Char {
            number_id
        } else {
            object_id
        };
        let mut decl = b.class(&format!("java.lang.{boxed}"), Some(parent));
        let prim = TypeRef::Primitive(kind);
        let boxed_ref_placeholder = TypeRef::Unresolved;
        decl.add_method(static_method("valueOf", vec![prim.clone()], boxed_ref_placeholder, "Boxed.valueOf"));
        match kind {
            PrimitiveKind::Int => {
                decl.add_field(static_field("MAX_VALUE", prim.clone(), "Integer.MAX_VALUE"));
                decl.add_field(static_field("MIN_VALUE", prim.clone(), "Integer.MIN_VALUE"));
                decl.add_method(static_method(
                    "parseInt",
                    vec![str_ty.clone()],
                    prim.clone(),
                    "Integer.parseInt",
                ));
            }
            PrimitiveKind::Long => {
                decl.add_field(static_field("MAX_VALUE", prim.clone(), "Long.MAX_VALUE"));
                decl.add_field(static_field("MIN_VALUE", prim.clone(), "Long.MIN_VALUE"));
            }
            PrimitiveKind::Double => {
                decl.add_method(static_method(
                    "parseDouble",
                    vec![str_ty.clone()],
                    prim.clone(),
                    "Double.parseDouble",
                ));
            }
            PrimitiveKind::Boolean => {
                decl.add_method(method("booleanValue", vec![], prim.clone(), "Boolean.booleanValue"));
            }
            PrimitiveKind::Char => {
                decl.add_method(method("charValue", vec![], prim.clone(), "Character.charValue"));
                decl.add_method(static_method(
                    "isDigit",
                    vec![prim.clone()],
                    TypeRef::BOOLEAN,
                    "Character.isDigit",
                ));
            }
            _ => {}
        }
        let id = b.add(decl);
        // valueOf returns its own boxed type.
        if let Some(decl) = b.registry.declaration_mut(id) {
            for m in decl.methods.iter_mut().filter(|m| m.name == "valueOf") {
                m.return_type = TypeRef::Class(id);
            }
        }
    }

    // Throwable hierarchy. The message and cause live in ordinary fields so
    // dynamic subclasses can read them.
    let mut throwable = b.class("java.lang.Throwable", Some(object_id));
    throwable.add_field(FieldDecl::new("message", str_ty.clone()));
    throwable.constructors.push(constructor(vec![], "Throwable.<init>"));
    throwable
        .constructors
        .push(constructor(vec![str_ty.clone()], "Throwable.<init>"));
    throwable.add_method(method("getMessage", vec![], str_ty.clone(), "Throwable.getMessage"));
    throwable.add_method(method("toString", vec![], str_ty.clone(), "Throwable.toString"));
    let throwable_id = b.add(throwable);
    if let Some(decl) = b.registry.declaration_mut(throwable_id) {
        let this_ty = TypeRef::Class(throwable_id);
        decl.add_field(FieldDecl::new("cause", this_ty.clone()));
        decl.constructors.push(constructor(
            vec![str_ty.clone(), this_ty.clone()],
            "Throwable.<init>",
        ));
        decl.add_method(method("getCause", vec![], this_ty, "Throwable.getCause"));
    }
    b.registry.well_known_mut().throwable = Some(throwable_id);

    let exception_class = |b: &mut Builder<'_>, name: &str, parent: TypeId| -> TypeId {
        let mut decl = b.class(name, Some(parent));
        decl.constructors.push(constructor(vec![], "Throwable.<init>"));
        decl.constructors
            .push(constructor(vec![str_ty.clone()], "Throwable.<init>"));
        b.add(decl)
    };
    let exception = exception_class(&mut b, "java.lang.Exception", throwable_id);
    let runtime_exception = exception_class(&mut b, "java.lang.RuntimeException", exception);
    let null_pointer = exception_class(&mut b, "java.lang.NullPointerException", runtime_exception);
    let class_cast = exception_class(&mut b, "java.lang.ClassCastException", runtime_exception);
    let arithmetic = exception_class(&mut b, "java.lang.ArithmeticException", runtime_exception);
    let illegal_argument =
        exception_class(&mut b, "java.lang.IllegalArgumentException", runtime_exception);
    exception_class(&mut b, "java.lang.IllegalStateException", runtime_exception);
    exception_class(&mut b, "java.lang.UnsupportedOperationException", runtime_exception);
    let index_oob = exception_class(&mut b, "java.lang.IndexOutOfBoundsException", runtime_exception);
    let array_index_oob =
        exception_class(&mut b, "java.lang.ArrayIndexOutOfBoundsException", index_oob);
    {
        let wk = b.registry.well_known_mut();
        wk.exception = Some(exception);
        wk.runtime_exception = Some(runtime_exception);
        wk.null_pointer = Some(null_pointer);
        wk.class_cast = Some(class_cast);
        wk.arithmetic = Some(arithmetic);
        wk.illegal_argument = Some(illegal_argument);
        wk.index_out_of_bounds = Some(array_index_oob);
    }

    // Collections.
    let t = TypeParameter::new("T", None);
    let t_ref = TypeRef::TypeParam(t.clone());
    let mut iterator = b.interface("java.util.Iterator");
    iterator.type_params.push(t.clone());
    iterator.add_method(abstract_method("hasNext", vec![], TypeRef::BOOLEAN));
    iterator.add_method(abstract_method("next", vec![], t_ref.clone()));
    let iterator_id = b.add(iterator);

    let mut iterable = b.interface("java.lang.Iterable");
    iterable.type_params.push(t.clone());
    iterable.add_method(abstract_method(
        "iterator",
        vec![],
        TypeRef::parameterized(iterator_id, vec![t_ref.clone()]),
    ));
    let iterable_id = b.add(iterable);

    let e = TypeParameter::new("E", None);
    let e_ref = TypeRef::TypeParam(e.clone());
    let list_methods = |native: bool| -> Vec<MethodDecl> {
        let mk = |name: &str, params: Vec<TypeRef>, ret: TypeRef, key: &'static str| {
            if native {
                method(name, params, ret, key)
            } else {
                abstract_method(name, params, ret)
            }
        };
        vec![
            mk("add", vec![e_ref.clone()], TypeRef::BOOLEAN, "List.add"),
            mk("get", vec![TypeRef::INT], e_ref.clone(), "List.get"),
            mk("set", vec![TypeRef::INT, e_ref.clone()], e_ref.clone(), "List.set"),
            mk("remove", vec![TypeRef::INT], e_ref.clone(), "List.remove"),
            mk("size", vec![], TypeRef::INT, "List.size"),
            mk("isEmpty", vec![], TypeRef::BOOLEAN, "List.isEmpty"),
            mk("contains", vec![obj.clone()], TypeRef::BOOLEAN, "List.contains"),
            mk("clear", vec![], TypeRef::VOID, "List.clear"),
            mk(
                "iterator",
                vec![],
                TypeRef::parameterized(iterator_id, vec![e_ref.clone()]),
                "List.iterator",
            ),
        ]
    };
    let mut list = b.interface("java.util.List");
    list.type_params.push(e.clone());
    list.implements
        .push(TypeRef::parameterized(iterable_id, vec![e_ref.clone()]));
    list.methods = list_methods(false);
    let list_id = b.add(list);

    let mut array_list = b.class("java.util.ArrayList", Some(object_id));
    array_list.type_params.push(e.clone());
    array_list
        .implements
        .push(TypeRef::parameterized(list_id, vec![e_ref.clone()]));
    array_list.methods = list_methods(true);
    array_list
        .constructors
        .push(constructor(vec![], "ArrayList.<init>"));
    let array_list_id = b.add(array_list);

    // Iterator handed out by ArrayList.iterator().
    let mut list_iterator = b.class("java.util.ArrayListIterator", Some(object_id));
    list_iterator.type_params.push(e.clone());
    list_iterator
        .implements
        .push(TypeRef::parameterized(iterator_id, vec![e_ref.clone()]));
    list_iterator.add_method(method("hasNext", vec![], TypeRef::BOOLEAN, "Iterator.hasNext"));
    list_iterator.add_method(method("next", vec![], e_ref.clone(), "Iterator.next"));
    b.add(list_iterator);

    {
        let wk = b.registry.well_known_mut();
        wk.iterable = Some(iterable_id);
        wk.iterator = Some(iterator_id);
        wk.list = Some(list_id);
        wk.array_list = Some(array_list_id);
    }

    // Functional interfaces.
    let mut runnable = b.interface("java.lang.Runnable");
    runnable.add_method(abstract_method("run", vec![], TypeRef::VOID));
    b.add(runnable);

    let mut supplier = b.interface("java.util.function.Supplier");
    supplier.type_params.push(t.clone());
    supplier.add_method(abstract_method("get", vec![], t_ref.clone()));
    b.add(supplier);

    let r = TypeParameter::new("R", None);
    let mut function = b.interface("java.util.function.Function");
    function.type_params = vec![t.clone(), r.clone()];
    function.add_method(abstract_method(
        "apply",
        vec![t_ref.clone()],
        TypeRef::TypeParam(r.clone()),
    ));
    b.add(function);

    let mut predicate = b.interface("java.util.function.Predicate");
    predicate.type_params.push(t.clone());
    predicate.add_method(abstract_method("test", vec![t_ref.clone()], TypeRef::BOOLEAN));
    b.add(predicate);

    // StringBuilder.
    let mut builder = b.class("java.lang.StringBuilder", Some(object_id));
    builder
        .constructors
        .push(constructor(vec![], "StringBuilder.<init>"));
    builder
        .constructors
        .push(constructor(vec![str_ty.clone()], "StringBuilder.<init>"));
    let builder_id = b.add(builder);
    if let Some(decl) = b.registry.declaration_mut(builder_id) {
        let this_ty = TypeRef::Class(builder_id);
        for param in [obj.clone(), str_ty.clone(), TypeRef::INT, TypeRef::CHAR] {
            decl.add_method(method(
                "append",
                vec![param],
                this_ty.clone(),
                "StringBuilder.append",
            ));
        }
        decl.add_method(method("length", vec![], TypeRef::INT, "StringBuilder.length"));
        decl.add_method(method("toString", vec![], str_ty.clone(), "StringBuilder.toString"));
    }

    // Math.
    let mut math = b.class("java.lang.Math", Some(object_id));
    for ty in [TypeRef::INT, TypeRef::LONG, TypeRef::DOUBLE] {
        math.add_method(static_method("abs", vec![ty.clone()], ty.clone(), "Math.abs"));
        math.add_method(static_method(
            "max",
            vec![ty.clone(), ty.clone()],
            ty.clone(),
            "Math.max",
        ));
        math.add_method(static_method(
            "min",
            vec![ty.clone(), ty.clone()],
            ty.clone(),
            "Math.min",
        ));
    }
    for name in ["sqrt", "floor", "ceil"] {
        let key = match name {
            "sqrt" => "Math.sqrt",
            "floor" => "Math.floor",
            _ => "Math.ceil",
        };
        math.add_method(static_method(name, vec![TypeRef::DOUBLE], TypeRef::DOUBLE, key));
    }
    math.add_method(static_method(
        "pow",
        vec![TypeRef::DOUBLE, TypeRef::DOUBLE],
        TypeRef::DOUBLE,
        "Math.pow",
    ));
    b.add(math);

    // System.out.
    let mut print_stream = b.class("java.io.PrintStream", Some(object_id));
    print_stream.add_method(method("println", vec![], TypeRef::VOID, "PrintStream.println"));
    for ty in [
        obj.clone(),
        str_ty.clone(),
        TypeRef::INT,
        TypeRef::LONG,
        TypeRef::DOUBLE,
        TypeRef::BOOLEAN,
        TypeRef::CHAR,
    ] {
        print_stream.add_method(method(
            "println",
            vec![ty.clone()],
            TypeRef::VOID,
            "PrintStream.println",
        ));
        print_stream.add_method(method("print", vec![ty], TypeRef::VOID, "PrintStream.print"));
    }
    let print_stream_id = b.add(print_stream);

    let mut system = b.class("java.lang.System", Some(object_id));
    system.add_field(static_field(
        "out",
        TypeRef::Class(print_stream_id),
        "System.out",
    ));
    system.add_method(static_method(
        "currentTimeMillis",
        vec![],
        TypeRef::LONG,
        "System.currentTimeMillis",
    ));
    b.add(system);

    // Helpers targeted by lowering: numeric semantics the secondary runtime
    // lacks natively.
    let mut runtime = b.class("strata.runtime.StrataRuntime", Some(object_id));
    let helpers: [(&str, Vec<TypeRef>, TypeRef, &'static str); 8] = [
        ("trunc", vec![TypeRef::DOUBLE], TypeRef::INT, "StrataRuntime.trunc"),
        ("truncLong", vec![TypeRef::DOUBLE], TypeRef::LONG, "StrataRuntime.truncLong"),
        ("toInt", vec![TypeRef::LONG], TypeRef::INT, "StrataRuntime.toInt"),
        (
            "toShort",
            vec![TypeRef::INT],
            TypeRef::Primitive(PrimitiveKind::Short),
            "StrataRuntime.toShort",
        ),
        (
            "toByte",
            vec![TypeRef::INT],
            TypeRef::Primitive(PrimitiveKind::Byte),
            "StrataRuntime.toByte",
        ),
        ("toChar", vec![TypeRef::INT], TypeRef::CHAR, "StrataRuntime.toChar"),
        (
            "idiv",
            vec![TypeRef::INT, TypeRef::INT],
            TypeRef::INT,
            "StrataRuntime.idiv",
        ),
        (
            "ldiv",
            vec![TypeRef::LONG, TypeRef::LONG],
            TypeRef::LONG,
            "StrataRuntime.ldiv",
        ),
    ];
    for (name, params, ret, key) in helpers {
        runtime.add_method(static_method(name, params, ret, key));
    }
    let runtime_id = b.add(runtime);
    b.registry.well_known_mut().runtime = Some(runtime_id);
}

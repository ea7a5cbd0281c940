//! Type representation.
//!
//! `TypeRef` is a cheap-to-clone reference to a type: primitives inline,
//! class types by [`TypeId`] into the type database, and composite types
//! (arrays, parameterized types) sharing their parts through `Arc`.

use indexmap::IndexMap;
use std::sync::Arc;
use strata_ast::{BindingDirection, NodeIndex, TypeSyntax};

use crate::db::TypeDatabase;

/// Index of a type declaration in the type database.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl PrimitiveKind {
    pub fn from_name(name: &str) -> Option<PrimitiveKind> {
        Some(match name {
            "boolean" => PrimitiveKind::Boolean,
            "byte" => PrimitiveKind::Byte,
            "short" => PrimitiveKind::Short,
            "char" => PrimitiveKind::Char,
            "int" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "float" => PrimitiveKind::Float,
            "double" => PrimitiveKind::Double,
            "void" => PrimitiveKind::Void,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Void => "void",
        }
    }

    /// Name of the wrapper class used for boxing.
    pub fn boxed_name(self) -> Option<&'static str> {
        Some(match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Short => "Short",
            PrimitiveKind::Char => "Character",
            PrimitiveKind::Int => "Integer",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Void => return None,
        })
    }

    pub fn from_boxed_name(name: &str) -> Option<PrimitiveKind> {
        Some(match name {
            "Boolean" | "java.lang.Boolean" => PrimitiveKind::Boolean,
            "Byte" | "java.lang.Byte" => PrimitiveKind::Byte,
            "Short" | "java.lang.Short" => PrimitiveKind::Short,
            "Character" | "java.lang.Character" => PrimitiveKind::Char,
            "Integer" | "java.lang.Integer" => PrimitiveKind::Int,
            "Long" | "java.lang.Long" => PrimitiveKind::Long,
            "Float" | "java.lang.Float" => PrimitiveKind::Float,
            "Double" | "java.lang.Double" => PrimitiveKind::Double,
            _ => return None,
        })
    }

    #[inline]
    pub fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Boolean | PrimitiveKind::Void)
    }

    #[inline]
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::Short
                | PrimitiveKind::Char
                | PrimitiveKind::Int
                | PrimitiveKind::Long
        )
    }

    /// Widening primitive conversion `self -> target` (identity included).
    pub fn widens_to(self, target: PrimitiveKind) -> bool {
        use PrimitiveKind::*;
        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short | Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => target == Double,
            Boolean | Double | Void => false,
        }
    }

    /// Binary numeric promotion of two numeric operand kinds.
    pub fn promote(a: PrimitiveKind, b: PrimitiveKind) -> PrimitiveKind {
        use PrimitiveKind::*;
        if a == Double || b == Double {
            Double
        } else if a == Float || b == Float {
            Float
        } else if a == Long || b == Long {
            Long
        } else {
            Int
        }
    }
}

/// A declared type variable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeParameter {
    pub name: Arc<str>,
    pub bound: Option<TypeRef>,
}

impl TypeParameter {
    pub fn new(name: &str, bound: Option<TypeRef>) -> Arc<TypeParameter> {
        Arc::new(TypeParameter {
            name: Arc::from(name),
            bound,
        })
    }
}

/// Reference to a resolved (or unresolvable) type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(PrimitiveKind),
    /// Type of the `null` literal.
    Null,
    Class(TypeId),
    Parameterized(TypeId, Arc<[TypeRef]>),
    Array(Arc<TypeRef>),
    TypeParam(Arc<TypeParameter>),
    Unresolved,
}

impl TypeRef {
    pub const BOOLEAN: TypeRef = TypeRef::Primitive(PrimitiveKind::Boolean);
    pub const CHAR: TypeRef = TypeRef::Primitive(PrimitiveKind::Char);
    pub const INT: TypeRef = TypeRef::Primitive(PrimitiveKind::Int);
    pub const LONG: TypeRef = TypeRef::Primitive(PrimitiveKind::Long);
    pub const FLOAT: TypeRef = TypeRef::Primitive(PrimitiveKind::Float);
    pub const DOUBLE: TypeRef = TypeRef::Primitive(PrimitiveKind::Double);
    pub const VOID: TypeRef = TypeRef::Primitive(PrimitiveKind::Void);

    pub fn array_of(element: TypeRef) -> TypeRef {
        TypeRef::Array(Arc::new(element))
    }

    pub fn parameterized(id: TypeId, args: Vec<TypeRef>) -> TypeRef {
        if args.is_empty() {
            TypeRef::Class(id)
        } else {
            TypeRef::Parameterized(id, args.into())
        }
    }

    #[inline]
    pub fn is_unresolved(&self) -> bool {
        matches!(self, TypeRef::Unresolved)
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Primitive(PrimitiveKind::Void))
    }

    #[inline]
    pub fn is_boolean(&self) -> bool {
        matches!(self, TypeRef::Primitive(PrimitiveKind::Boolean))
    }

    #[inline]
    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self {
            TypeRef::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    #[inline]
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    #[inline]
    pub fn is_reference(&self) -> bool {
        !matches!(self, TypeRef::Primitive(_) | TypeRef::Unresolved)
    }

    /// Declaration id for class and parameterized types.
    pub fn class_id(&self) -> Option<TypeId> {
        match self {
            TypeRef::Class(id) | TypeRef::Parameterized(id, _) => Some(*id),
            _ => None,
        }
    }

    pub fn type_args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Parameterized(_, args) => args,
            _ => &[],
        }
    }

    pub fn element(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Whether any type variable occurs in this type.
    pub fn has_type_params(&self) -> bool {
        match self {
            TypeRef::TypeParam(_) => true,
            TypeRef::Array(element) => element.has_type_params(),
            TypeRef::Parameterized(_, args) => args.iter().any(TypeRef::has_type_params),
            _ => false,
        }
    }

    /// Render for diagnostics.
    pub fn display(&self, db: &dyn TypeDatabase) -> String {
        match self {
            TypeRef::Primitive(kind) => kind.name().to_string(),
            TypeRef::Null => "null".to_string(),
            TypeRef::Class(id) => db.type_name(*id).to_string(),
            TypeRef::Parameterized(id, args) => {
                let args: Vec<String> = args.iter().map(|a| a.display(db)).collect();
                format!("{}<{}>", db.type_name(*id), args.join(", "))
            }
            TypeRef::Array(element) => format!("{}[]", element.display(db)),
            TypeRef::TypeParam(param) => param.name.to_string(),
            TypeRef::Unresolved => "<unresolved>".to_string(),
        }
    }

    /// Convert back to a syntactic reference (used when lowering
    /// synthesizes declarations).
    pub fn to_syntax(&self, db: &dyn TypeDatabase) -> TypeSyntax {
        match self {
            TypeRef::Primitive(kind) => TypeSyntax::named(kind.name()),
            TypeRef::Null | TypeRef::Unresolved => TypeSyntax::named("Object"),
            TypeRef::Class(id) => TypeSyntax::named(db.qualified_type_name(*id)),
            TypeRef::Parameterized(id, args) => TypeSyntax::named(db.qualified_type_name(*id))
                .with_args(args.iter().map(|a| a.to_syntax(db)).collect()),
            TypeRef::Array(element) => element.to_syntax(db).array_of(),
            TypeRef::TypeParam(param) => TypeSyntax::named(param.name.as_ref()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
}

/// Where a declaration came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeOrigin {
    /// Built into the engine; methods are native.
    Compiled,
    /// Declared by a `ClassDeclaration` node and interpreted.
    Dynamic,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    pub is_static: bool,
    pub is_final: bool,
    pub binding: BindingDirection,
    pub decl_node: NodeIndex,
    /// Native accessor key for compiled fields (`System.out`).
    pub native: Option<&'static str>,
}

impl FieldDecl {
    pub fn new(name: &str, ty: TypeRef) -> Self {
        FieldDecl {
            name: name.to_string(),
            ty,
            is_static: false,
            is_final: false,
            binding: BindingDirection::None,
            decl_node: NodeIndex::NONE,
            native: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub type_params: Vec<Arc<TypeParameter>>,
    pub params: Vec<TypeRef>,
    pub param_names: Vec<String>,
    pub return_type: TypeRef,
    pub is_static: bool,
    pub is_abstract: bool,
    pub decl_node: NodeIndex,
    /// Native implementation key for compiled methods (`String.length`).
    pub native: Option<&'static str>,
}

impl MethodDecl {
    pub fn new(name: &str, params: Vec<TypeRef>, return_type: TypeRef) -> Self {
        MethodDecl {
            name: name.to_string(),
            type_params: Vec::new(),
            param_names: (0..params.len()).map(|i| format!("arg{i}")).collect(),
            params,
            return_type,
            is_static: false,
            is_abstract: false,
            decl_node: NodeIndex::NONE,
            native: None,
        }
    }

    /// Same name and identical parameter types.
    pub fn overrides(&self, other: &MethodDecl) -> bool {
        self.name == other.name && self.params == other.params
    }
}

/// Resolved identity of a user or builtin type.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDecl {
    pub id: TypeId,
    pub name: String,
    pub qualified_name: String,
    pub kind: TypeKind,
    pub origin: TypeOrigin,
    pub is_abstract: bool,
    /// Nested type without an enclosing instance.
    pub is_static: bool,
    pub type_params: Vec<Arc<TypeParameter>>,
    pub extends: Option<TypeRef>,
    pub implements: Vec<TypeRef>,
    pub fields: IndexMap<String, FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub constructors: Vec<MethodDecl>,
    pub enclosing: Option<TypeId>,
    pub decl_node: NodeIndex,
    /// Earlier layer this declaration modifies.
    pub modifies: Option<TypeId>,
    /// Later layer modifying this declaration.
    pub modified_by: Option<TypeId>,
}

impl TypeDecl {
    pub fn new(qualified_name: &str, kind: TypeKind, origin: TypeOrigin) -> Self {
        let name = qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(qualified_name)
            .to_string();
        TypeDecl {
            id: TypeId(u32::MAX),
            name,
            qualified_name: qualified_name.to_string(),
            kind,
            origin,
            is_abstract: kind == TypeKind::Interface,
            is_static: true,
            type_params: Vec::new(),
            extends: None,
            implements: Vec::new(),
            fields: IndexMap::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            enclosing: None,
            decl_node: NodeIndex::NONE,
            modifies: None,
            modified_by: None,
        }
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn add_field(&mut self, field: FieldDecl) {
        self.fields.insert(field.name.clone(), field);
    }

    pub fn add_method(&mut self, method: MethodDecl) {
        self.methods.push(method);
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodDecl> + 'a {
        self.methods.iter().filter(move |m| m.name == name)
    }

    /// The single abstract method of a functional interface.
    pub fn functional_method(&self) -> Option<&MethodDecl> {
        if !self.is_interface() {
            return None;
        }
        let mut abstract_methods = self.methods.iter().filter(|m| m.is_abstract);
        let first = abstract_methods.next()?;
        abstract_methods.next().is_none().then_some(first)
    }
}

//! Type database abstraction.
//!
//! The checker, interpreter and lowering pass only see types through this
//! trait, so the layered build system can back it with whatever loader it
//! uses. [`TypeRegistry`](crate::TypeRegistry) is the in-process
//! implementation.

use crate::types::{TypeDecl, TypeId, TypeRef};

/// Ids of builtin types the engine refers to directly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WellKnown {
    pub object: Option<TypeId>,
    pub string: Option<TypeId>,
    pub number: Option<TypeId>,
    pub throwable: Option<TypeId>,
    pub exception: Option<TypeId>,
    pub runtime_exception: Option<TypeId>,
    pub null_pointer: Option<TypeId>,
    pub class_cast: Option<TypeId>,
    pub arithmetic: Option<TypeId>,
    pub index_out_of_bounds: Option<TypeId>,
    pub illegal_argument: Option<TypeId>,
    pub iterable: Option<TypeId>,
    pub iterator: Option<TypeId>,
    pub list: Option<TypeId>,
    pub array_list: Option<TypeId>,
    pub runtime: Option<TypeId>,
}

pub trait TypeDatabase {
    fn declaration(&self, id: TypeId) -> Option<&TypeDecl>;

    /// Look up a type by simple or qualified name. Returns the most specific
    /// layer of the type.
    fn find_type(&self, name: &str) -> Option<TypeId>;

    /// Follow the modification chain: with `modified = true` the most
    /// specific layer that modifies `id`, otherwise `id` itself.
    fn resolve(&self, id: TypeId, modified: bool) -> TypeId;

    fn well_known(&self) -> &WellKnown;

    /// Bumped every time a declaration is replaced or modified.
    fn generation(&self) -> u64;

    fn type_name(&self, id: TypeId) -> &str {
        self.declaration(id).map_or("<unknown>", |d| d.name.as_str())
    }

    fn qualified_type_name(&self, id: TypeId) -> &str {
        self.declaration(id)
            .map_or("<unknown>", |d| d.qualified_name.as_str())
    }

    fn object_type(&self) -> TypeRef {
        self.well_known()
            .object
            .map_or(TypeRef::Unresolved, TypeRef::Class)
    }

    fn string_type(&self) -> TypeRef {
        self.well_known()
            .string
            .map_or(TypeRef::Unresolved, TypeRef::Class)
    }
}

//! Method invocation, object construction and static initialisation.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use strata_ast::{NodeData, NodeIndex};
use strata_checker::MethodTarget;
use strata_common::limits::MAX_SUPERTYPE_DEPTH;
use strata_solver::{
    MethodDecl, MethodLookup, TypeId, TypeRef, chain_root, find_constructor, find_method, find_override, layers,
};
use tracing::{debug, trace};

use crate::context::ExecutionContext;
use crate::error::{RuntimeError, RuntimeResult};
use crate::natives;
use crate::value::{Closure, NativeState, Object, Value};
use crate::{Interpreter, StaticStorage};

impl<'a> Interpreter<'a> {
    fn enter_call(&mut self) -> RuntimeResult<()> {
        if self.call_depth >= self.options.max_call_depth {
            return Err(RuntimeError::CallDepthExceeded {
                depth: self.options.max_call_depth,
            });
        }
        self.call_depth += 1;
        Ok(())
    }

    /// Call `target` on `receiver` (`None` for static calls), dispatching
    /// instance methods on the receiver's runtime class.
    pub fn invoke_method(
        &mut self,
        ctx: &mut ExecutionContext,
        receiver: Option<Value>,
        target: &MethodTarget,
        args: Vec<Value>,
    ) -> RuntimeResult<Value> {
        self.enter_call()?;
        let result = self.dispatch(ctx, receiver, target, args);
        self.call_depth -= 1;
        result
    }

    fn dispatch(
        &mut self,
        ctx: &mut ExecutionContext,
        receiver: Option<Value>,
        target: &MethodTarget,
        args: Vec<Value>,
    ) -> RuntimeResult<Value> {
        let db = self.db;
        let receiver = match receiver {
            Some(Value::Type(_)) | None => None,
            Some(value) => Some(value),
        };
        let Some(receiver) = receiver.filter(|_| !target.method.is_static) else {
            return self.run_method(ctx, None, target.owner, &target.method, args);
        };
        if receiver.is_null() {
            return Err(RuntimeError::NullReference {
                member: target.method.name.clone(),
            });
        }
        if let Value::Lambda(closure) = &receiver
            && target.method.is_abstract
        {
            return self.call_closure(ctx, &closure.clone(), args);
        }
        let (owner, method) = match receiver.runtime_type(db).class_id() {
            Some(runtime) => find_override(db, runtime, &target.method)
                .unwrap_or_else(|| (target.owner, target.method.clone())),
            None => (target.owner, target.method.clone()),
        };
        if method.is_abstract && method.native.is_none() {
            return Err(RuntimeError::AbstractMethod {
                method: format!("{}.{}", db.type_name(owner), method.name),
            });
        }
        trace!(method = method.name.as_str(), owner = db.type_name(owner), "invoke");
        self.run_method(ctx, Some(receiver), owner, &method, args)
    }

    fn run_method(
        &mut self,
        ctx: &mut ExecutionContext,
        this: Option<Value>,
        owner: TypeId,
        method: &MethodDecl,
        args: Vec<Value>,
    ) -> RuntimeResult<Value> {
        if let Some(key) = method.native {
            return natives::call(self, ctx, key, this, args).map_err(|err| wrap_native(key, err));
        }
        let arena = self.arena;
        let body = match arena.data(method.decl_node) {
            Some(NodeData::MethodDeclaration { body, .. }) if body.is_some() => *body,
            _ => {
                return Err(RuntimeError::AbstractMethod {
                    method: method.name.clone(),
                });
            }
        };
        let this = this.unwrap_or(Value::Type(TypeRef::Class(owner)));
        self.run_body(ctx, this, method, args, body)
    }

    /// Execute a method or constructor body with `this` and the parameters
    /// bound.
    fn run_body(
        &mut self,
        ctx: &mut ExecutionContext,
        this: Value,
        method: &MethodDecl,
        args: Vec<Value>,
        body: NodeIndex,
    ) -> RuntimeResult<Value> {
        let db = self.db;
        ctx.push_current_object(this);
        let result = self.in_frame(ctx, method.param_names.len(), true, |interp, ctx| {
            for ((name, value), ty) in method.param_names.iter().zip(args).zip(&method.params) {
                ctx.define_variable(name, value.coerce(db, ty))?;
            }
            interp.exec(ctx, body)
        });
        ctx.pop_current_object();
        match result? {
            crate::ExecResult::Return => Ok(ctx.current_return_value.take().unwrap_or(Value::Void)),
            _ => Ok(Value::Void),
        }
    }

    pub(crate) fn call_closure(
        &mut self,
        ctx: &mut ExecutionContext,
        closure: &Rc<Closure>,
        args: Vec<Value>,
    ) -> RuntimeResult<Value> {
        let arena = self.arena;
        let Some(NodeData::Lambda { params, body }) = arena.data(closure.node) else {
            return Err(RuntimeError::Unresolved {
                node: closure.node,
                kind: "Lambda",
            });
        };
        let body = *body;
        let is_block = matches!(arena.data(body), Some(NodeData::Block { .. }));
        ctx.push_current_object(closure.this.clone());
        let result = self.in_frame(ctx, closure.captured.len(), true, |interp, ctx| {
            for (name, value) in &closure.captured {
                ctx.define_variable(name, value.clone())?;
            }
            interp.in_frame(ctx, params.len(), false, |interp, ctx| {
                for (name, value) in params.iter().zip(args) {
                    ctx.define_variable(name, value)?;
                }
                if !is_block {
                    return interp.evaluate(ctx, body);
                }
                match interp.exec(ctx, body)? {
                    crate::ExecResult::Return => Ok(ctx.current_return_value.take().unwrap_or(Value::Void)),
                    _ => Ok(Value::Void),
                }
            })
        });
        ctx.pop_current_object();
        result
    }

    /// Create an instance of `ty`. Superclass layers initialise first: field
    /// defaults, field initialisers, then the implicit no-argument
    /// constructor. `ctor` (or the constructor matching the argument values)
    /// runs last.
    pub fn instantiate(
        &mut self,
        ctx: &mut ExecutionContext,
        ty: &TypeRef,
        ctor: Option<&MethodTarget>,
        args: Vec<Value>,
        outer: Option<Value>,
    ) -> RuntimeResult<Value> {
        let db = self.db;
        let Some(id) = ty.class_id() else {
            return Err(RuntimeError::Unsupported {
                what: format!("instantiating {}", ty.display(db)),
            });
        };
        if db.well_known().string.is_some_and(|s| chain_root(db, s) == chain_root(db, id)) {
            return Ok(Value::string(""));
        }
        let class = db.resolve(id, true);
        if db.declaration(class).is_some_and(|d| d.is_abstract || d.is_interface()) {
            return Err(RuntimeError::Unsupported {
                what: format!("instantiating abstract type '{}'", db.type_name(class)),
            });
        }
        self.enter_call()?;
        let object = Rc::new(RefCell::new(Object {
            id: self.next_id(),
            class,
            fields: IndexMap::new(),
            outer,
            native: NativeState::None,
        }));
        let this = Value::Object(object);
        let result = self.construct(ctx, &this, class, ctor, args);
        self.call_depth -= 1;
        debug!(class = db.qualified_type_name(class), "instantiate");
        result.map(|()| this)
    }

    fn construct(
        &mut self,
        ctx: &mut ExecutionContext,
        this: &Value,
        class: TypeId,
        ctor: Option<&MethodTarget>,
        args: Vec<Value>,
    ) -> RuntimeResult<()> {
        let db = self.db;
        let chain = self.superclass_chain(class);
        let last = chain.len().saturating_sub(1);
        for (i, &layer) in chain.iter().enumerate() {
            self.ensure_static_init(ctx, layer)?;
            self.init_instance_fields(ctx, this, layer)?;
            if i < last
                && let MethodLookup::Found(found) = find_constructor(db, &TypeRef::Class(layer), &[])
            {
                self.run_constructor(ctx, this, &found.method, Vec::new())?;
            }
        }
        match ctor {
            Some(target) => self.run_constructor(ctx, this, &target.method, args),
            None => {
                let arg_types: Vec<TypeRef> = args.iter().map(|a| a.runtime_type(db)).collect();
                match find_constructor(db, &TypeRef::Class(class), &arg_types) {
                    MethodLookup::Found(found) => self.run_constructor(ctx, this, &found.method, args),
                    _ if args.is_empty() => Ok(()),
                    _ => Err(RuntimeError::Unsupported {
                        what: format!("no constructor of '{}' for these arguments", db.type_name(class)),
                    }),
                }
            }
        }
    }

    fn run_constructor(
        &mut self,
        ctx: &mut ExecutionContext,
        this: &Value,
        ctor: &MethodDecl,
        args: Vec<Value>,
    ) -> RuntimeResult<()> {
        if let Some(key) = ctor.native {
            return natives::construct(self, ctx, key, this, args).map_err(|err| wrap_native(key, err));
        }
        let arena = self.arena;
        if let Some(NodeData::ConstructorDeclaration { body, .. }) = arena.data(ctor.decl_node)
            && body.is_some()
        {
            self.run_body(ctx, this.clone(), ctor, args, *body)?;
        }
        Ok(())
    }

    /// Superclasses of `class`, root first, each resolved to its newest
    /// layer.
    fn superclass_chain(&self, class: TypeId) -> Vec<TypeId> {
        let db = self.db;
        let mut chain = Vec::new();
        let mut current = Some(db.resolve(class, true));
        while let Some(id) = current {
            if chain.len() as u32 >= MAX_SUPERTYPE_DEPTH || chain.contains(&id) {
                break;
            }
            chain.push(id);
            current = layers(db, id)
                .into_iter()
                .find_map(|layer| db.declaration(layer).and_then(|d| d.extends.as_ref()))
                .and_then(TypeRef::class_id)
                .map(|parent| db.resolve(parent, true))
                .or_else(|| {
                    let object = db.well_known().object?;
                    (chain_root(db, id) != chain_root(db, object)).then(|| db.resolve(object, true))
                });
        }
        chain.reverse();
        chain
    }

    fn init_instance_fields(&mut self, ctx: &mut ExecutionContext, this: &Value, class: TypeId) -> RuntimeResult<()> {
        let db = self.db;
        let Value::Object(object) = this else {
            return Ok(());
        };
        for layer in layers(db, class).into_iter().rev() {
            let Some(decl) = db.declaration(layer) else {
                continue;
            };
            for field in decl.fields.values().filter(|f| !f.is_static && f.native.is_none()) {
                object
                    .borrow_mut()
                    .fields
                    .insert(field.name.clone(), Value::default_for(&field.ty));
            }
            for field in decl.fields.values().filter(|f| !f.is_static) {
                if let Some(initializer) = self.field_initializer(field.decl_node) {
                    let value = self.eval_initializer(ctx, this.clone(), initializer)?;
                    let value = value.coerce(db, &field.ty);
                    object.borrow_mut().fields.insert(field.name.clone(), value);
                }
            }
        }
        Ok(())
    }

    fn field_initializer(&self, decl_node: NodeIndex) -> Option<NodeIndex> {
        match self.arena.data(decl_node) {
            Some(NodeData::FieldDeclaration { initializer, .. }) => initializer.to_option(),
            _ => None,
        }
    }

    fn eval_initializer(&mut self, ctx: &mut ExecutionContext, this: Value, initializer: NodeIndex) -> RuntimeResult<Value> {
        ctx.push_current_object(this);
        let result = self.in_frame(ctx, 0, true, |interp, ctx| interp.evaluate(ctx, initializer));
        ctx.pop_current_object();
        result
    }

    /// Run static initialisation of `class`'s chain once: defaults for every
    /// static field, then the initialisers in declaration order.
    pub(crate) fn ensure_static_init(&mut self, ctx: &mut ExecutionContext, class: TypeId) -> RuntimeResult<()> {
        let db = self.db;
        let root = chain_root(db, class);
        if self.statics.contains_key(&root) {
            return Ok(());
        }
        let mut storage = StaticStorage::default();
        let chain = layers(db, class);
        for &layer in chain.iter().rev() {
            if let Some(decl) = db.declaration(layer) {
                for field in decl.fields.values().filter(|f| f.is_static && f.native.is_none()) {
                    storage.fields.insert(field.name.clone(), Value::default_for(&field.ty));
                }
            }
        }
        self.statics.insert(root, storage);
        trace!(class = db.type_name(class), "static init");
        let this = Value::Type(TypeRef::Class(db.resolve(class, true)));
        for &layer in chain.iter().rev() {
            let Some(decl) = db.declaration(layer) else {
                continue;
            };
            for field in decl.fields.values().filter(|f| f.is_static) {
                if let Some(initializer) = self.field_initializer(field.decl_node) {
                    let value = self.eval_initializer(ctx, this.clone(), initializer)?.coerce(db, &field.ty);
                    if let Some(storage) = self.statics.get_mut(&root) {
                        storage.fields.insert(field.name.clone(), value);
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn static_get(&mut self, ctx: &mut ExecutionContext, owner: TypeId, name: &str) -> RuntimeResult<Value> {
        self.ensure_static_init(ctx, owner)?;
        let root = chain_root(self.db, owner);
        Ok(self
            .statics
            .get(&root)
            .and_then(|s| s.fields.get(name))
            .cloned()
            .unwrap_or(Value::Null))
    }

    pub(crate) fn static_set(
        &mut self,
        ctx: &mut ExecutionContext,
        owner: TypeId,
        name: &str,
        value: Value,
    ) -> RuntimeResult<()> {
        self.ensure_static_init(ctx, owner)?;
        let root = chain_root(self.db, owner);
        if let Some(storage) = self.statics.get_mut(&root) {
            storage.fields.insert(name.to_string(), value);
        }
        Ok(())
    }

    /// Call a static method by type and method name, choosing the overload
    /// from the argument values. Instance methods run on a fresh instance.
    pub fn call_static(
        &mut self,
        ctx: &mut ExecutionContext,
        type_name: &str,
        method: &str,
        args: Vec<Value>,
    ) -> RuntimeResult<Value> {
        let db = self.db;
        let Some(id) = db.find_type(type_name) else {
            return Err(RuntimeError::Unsupported {
                what: format!("unknown type '{type_name}'"),
            });
        };
        let arg_types: Vec<TypeRef> = args.iter().map(|a| a.runtime_type(db)).collect();
        let Some(found) = find_method(db, &TypeRef::Class(id), method, &arg_types).found() else {
            return Err(RuntimeError::Unsupported {
                what: format!("no method '{method}' on '{type_name}'"),
            });
        };
        let target = MethodTarget::from(found);
        let receiver = if target.method.is_static {
            None
        } else {
            Some(self.instantiate(ctx, &TypeRef::Class(id), None, Vec::new(), None)?)
        };
        self.invoke_method(ctx, receiver, &target, args)
    }

    /// Call the zero-argument method `name` on `receiver`.
    pub(crate) fn to_display_string(&mut self, ctx: &mut ExecutionContext, value: &Value) -> RuntimeResult<String> {
        match value {
            Value::Object(_) | Value::Lambda(_) => {
                let text = self.call_by_name(ctx, value.clone(), "toString")?;
                Ok(text.to_string())
            }
            other => Ok(other.to_string()),
        }
    }

    /// `Qualified.Name: message` of a thrown value.
    pub(crate) fn describe_exception(&self, value: &Value) -> String {
        let db = self.db;
        match value {
            Value::Object(object) => {
                let object = object.borrow();
                let name = db.qualified_type_name(object.class);
                match object.fields.get("message") {
                    Some(Value::Str(message)) => format!("{name}: {message}"),
                    _ => name.to_string(),
                }
            }
            other => other.to_string(),
        }
    }

    /// The exception object an interpreted `catch` observes for `err`, or
    /// `None` when the error cannot be caught.
    pub(crate) fn exception_for(&mut self, ctx: &mut ExecutionContext, err: &RuntimeError) -> Option<Value> {
        let db = self.db;
        let wk = db.well_known();
        let class = match err {
            RuntimeError::Thrown { value, .. } => return Some(value.clone()),
            RuntimeError::InvocationTarget { source, .. } => return self.exception_for(ctx, source),
            RuntimeError::NullReference { .. } => wk.null_pointer,
            RuntimeError::InvalidCast { .. } => wk.class_cast,
            RuntimeError::Arithmetic { .. } => wk.arithmetic,
            RuntimeError::IndexOutOfBounds { .. } => wk.index_out_of_bounds,
            RuntimeError::IllegalArgument { .. } => wk.illegal_argument,
            _ => return None,
        }?;
        let message = Value::string(&err.exception_message());
        match self.instantiate(ctx, &TypeRef::Class(class), None, vec![message], None) {
            Ok(exception) => Some(exception),
            Err(failure) => {
                debug!(error = %failure, "could not materialise exception");
                None
            }
        }
    }
}

/// Carry a catchable failure raised inside a native method.
fn wrap_native(key: &str, err: RuntimeError) -> RuntimeError {
    match err {
        RuntimeError::Thrown { .. } => err,
        err if err.is_catchable() => RuntimeError::InvocationTarget {
            method: key.to_string(),
            source: Box::new(err),
        },
        err => err,
    }
}

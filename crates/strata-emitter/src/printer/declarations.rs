//! Classes, constructors, fields and methods.
//!
//! A type modified by later layers is bound with `let` and each layer
//! rebinds the name to a subclass of the previous binding, so every reference
//! to the name reaches the most specific layer at run time.

use strata_ast::{ClassKind, ModifierFlags, NodeData, NodeIndex, NodeList, Param};
use strata_solver::MethodDecl;

use super::JsPrinter;
use super::runtime::default_value;

struct ClassMembers {
    instance_fields: Vec<NodeIndex>,
    static_fields: Vec<NodeIndex>,
    constructors: Vec<NodeIndex>,
    methods: Vec<NodeIndex>,
    nested: Vec<NodeIndex>,
}

impl JsPrinter<'_> {
    pub(crate) fn emit_top_level(&mut self, root: NodeIndex) {
        let arena = self.arena;
        match arena.data(root) {
            Some(NodeData::SourceFile { types }) => {
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        self.write_line();
                    }
                    self.emit_class(ty);
                }
            }
            Some(_) => self.emit_statement(root),
            None => {}
        }
    }

    fn partition_members(&self, members: &NodeList) -> ClassMembers {
        let mut out = ClassMembers {
            instance_fields: Vec::new(),
            static_fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            nested: Vec::new(),
        };
        for member in members.iter() {
            match self.arena.data(member) {
                Some(NodeData::FieldDeclaration { modifiers, .. }) => {
                    if modifiers.contains(ModifierFlags::STATIC) {
                        out.static_fields.push(member);
                    } else {
                        out.instance_fields.push(member);
                    }
                }
                Some(NodeData::ConstructorDeclaration { .. }) => out.constructors.push(member),
                Some(NodeData::MethodDeclaration { .. }) => out.methods.push(member),
                Some(NodeData::ClassDeclaration { .. }) => out.nested.push(member),
                _ => {}
            }
        }
        out
    }

    pub(crate) fn emit_class(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let Some(NodeData::ClassDeclaration {
            name,
            kind,
            members,
            modifies,
            ..
        }) = arena.data(idx)
        else {
            return;
        };
        let db = self.db;
        let decl = self.model.declared_type(idx).and_then(|id| db.declaration(id));
        let rebound = decl.is_some_and(|d| d.modified_by.is_some());
        let inner = decl.is_some_and(|d| d.enclosing.is_some() && !d.is_static);
        let object = db.well_known().object;

        let parent = if *modifies {
            Some(name.clone())
        } else {
            decl.and_then(|d| d.extends.as_ref())
                .and_then(|ty| ty.class_id())
                .filter(|id| Some(*id) != object && *kind == ClassKind::Class)
                .map(|id| self.type_name(id))
        };
        let extends = parent.as_ref().map(|p| format!(" extends {p}")).unwrap_or_default();
        let (header, close) = if *modifies {
            (format!("{name} = class{extends} {{"), "};")
        } else if rebound {
            (format!("let {name} = class{extends} {{"), "};")
        } else {
            (format!("class {name}{extends} {{"), "}")
        };

        let parts = self.partition_members(members);
        self.line(&header);
        self.increase_indent();
        let static_fields = self.target.has_static_fields();
        if static_fields {
            for &field in &parts.static_fields {
                let text = self.field_initializer(field);
                self.line(&format!("static {text};"));
            }
        }
        self.emit_constructor(&parts, parent.is_some(), *modifies, inner);
        for &method in &parts.methods {
            self.emit_method(method);
        }
        self.decrease_indent();
        self.line(close);

        if !static_fields {
            for &field in &parts.static_fields {
                let text = self.field_initializer(field);
                self.line(&format!("{name}.{text};"));
            }
        }
        for &nested in &parts.nested {
            self.write_line();
            self.emit_class(nested);
        }
    }

    /// `name = value`, the declared initializer or the type's zero value.
    fn field_initializer(&mut self, field: NodeIndex) -> String {
        let arena = self.arena;
        let Some(NodeData::FieldDeclaration {
            ty,
            name,
            initializer,
            ..
        }) = arena.data(field)
        else {
            return String::new();
        };
        let value = if initializer.is_some() {
            self.operand(*initializer, 2)
        } else {
            default_value(ty).to_string()
        };
        format!("{name} = {value}")
    }

    fn emit_constructor(&mut self, parts: &ClassMembers, has_super: bool, layer: bool, inner: bool) {
        if parts.constructors.is_empty() && parts.instance_fields.is_empty() && !inner {
            return;
        }
        let arena = self.arena;
        let ctors: Vec<(&Vec<Param>, NodeIndex)> = parts
            .constructors
            .iter()
            .filter_map(|&c| match arena.data(c) {
                Some(NodeData::ConstructorDeclaration { params, body, .. }) => Some((params, *body)),
                _ => None,
            })
            .collect();

        let outer = if inner { "$outer, " } else { "" };
        let spread = layer || ctors.len() > 1;
        let header = match ctors.first() {
            Some((params, _)) if !spread => format!("constructor({outer}{})", param_names(params)),
            _ if spread => format!("constructor({outer}...args)"),
            _ => format!("constructor({})", outer.trim_end_matches(", ")),
        };
        self.line(&format!("{header} {{"));
        self.increase_indent();
        if layer {
            self.line("super(...args);");
        } else if has_super {
            self.line("super();");
        }
        if inner {
            self.line("this.$outer = $outer;");
        }
        for &field in &parts.instance_fields {
            let text = self.field_initializer(field);
            self.line(&format!("this.{text};"));
        }
        match ctors.as_slice() {
            [] => {}
            [(_, body)] if !spread => self.emit_block_statements(*body),
            [(params, body)] => {
                if !params.is_empty() {
                    self.line(&format!("let [{}] = args;", param_names(params)));
                }
                self.emit_block_statements(*body);
            }
            many => {
                self.line("switch (args.length) {");
                self.increase_indent();
                for (params, body) in many {
                    self.line(&format!("case {}: {{", params.len()));
                    self.increase_indent();
                    if !params.is_empty() {
                        self.line(&format!("let [{}] = args;", param_names(params)));
                    }
                    self.emit_block_statements(*body);
                    self.line("break;");
                    self.decrease_indent();
                    self.line("}");
                }
                self.decrease_indent();
                self.line("}");
            }
        }
        self.decrease_indent();
        self.line("}");
    }

    fn emit_method(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let Some(NodeData::MethodDeclaration {
            modifiers,
            name,
            params,
            body,
            ..
        }) = arena.data(idx)
        else {
            return;
        };
        if body.is_none() {
            return;
        }
        let name = self.declared_method_name(name, params.len());
        let prefix = if modifiers.contains(ModifierFlags::STATIC) {
            "static "
        } else {
            ""
        };
        self.line(&format!("{prefix}{name}({}) {{", param_names(params)));
        self.increase_indent();
        self.emit_block_statements(*body);
        self.decrease_indent();
        self.line("}");
    }

    fn declared_method_name(&self, name: &str, arity: usize) -> String {
        if self.overloaded.contains(name) {
            format!("{name}${arity}")
        } else {
            name.to_string()
        }
    }

    /// Printed name of a resolved method.
    pub(crate) fn method_name(&self, method: &MethodDecl) -> String {
        if method.decl_node.is_some() {
            self.declared_method_name(&method.name, method.params.len())
        } else {
            method.name.clone()
        }
    }
}

fn param_names(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

use strata_ast::{NodeData, NodeIndex, NodeList};

use super::JsPrinter;

impl JsPrinter<'_> {
    pub(crate) fn emit_statement(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let Some(data) = arena.data(idx) else {
            return;
        };
        match data {
            NodeData::Block { statements } => {
                self.line("{");
                self.increase_indent();
                self.emit_statements(statements);
                self.decrease_indent();
                self.line("}");
            }
            NodeData::VariableStatement { declarations, .. } => {
                let text = self.declarators(declarations);
                self.line(&format!("let {text};"));
            }
            NodeData::ExpressionStatement { expression } => {
                let text = self.expression(*expression);
                self.line(&format!("{text};"));
            }
            NodeData::If {
                condition,
                then_statement,
                else_statement,
            } => self.emit_if(*condition, *then_statement, *else_statement),
            NodeData::While { condition, body } => {
                let condition = self.expression(*condition);
                self.emit_loop(&format!("while ({condition})"), *body);
            }
            NodeData::DoWhile { body, condition } => {
                self.line("do {");
                self.emit_body(*body);
                let condition = self.expression(*condition);
                self.line(&format!("}} while ({condition});"));
            }
            NodeData::For {
                initializer,
                condition,
                incrementor,
                body,
            } => {
                let init = self.for_initializer(initializer);
                let condition = if condition.is_some() {
                    self.expression(*condition)
                } else {
                    String::new()
                };
                let step = self.expression_list(incrementor);
                let header = format!("for ({init}; {condition}; {step})").replace("; )", ";)");
                self.emit_loop(&header, *body);
            }
            NodeData::ForEach {
                name,
                expression,
                body,
                ..
            } => {
                let items = self.expression(*expression);
                self.emit_loop(&format!("for (let {name} of {items})"), *body);
            }
            NodeData::Labeled { label, statement } => {
                self.line(&format!("{label}:"));
                self.emit_statement(*statement);
            }
            NodeData::Break { label } => match label {
                Some(label) => self.line(&format!("break {label};")),
                None => self.line("break;"),
            },
            NodeData::Continue { label } => match label {
                Some(label) => self.line(&format!("continue {label};")),
                None => self.line("continue;"),
            },
            NodeData::Return { expression } => {
                if expression.is_some() {
                    let value = self.expression(*expression);
                    self.line(&format!("return {value};"));
                } else {
                    self.line("return;");
                }
            }
            NodeData::Throw { expression } => {
                let value = self.expression(*expression);
                self.line(&format!("throw {value};"));
            }
            NodeData::Try {
                block,
                catches,
                finally_block,
            } => self.emit_try(*block, catches, *finally_block),
            NodeData::Switch {
                expression,
                statements,
            } => self.emit_switch(*expression, statements),
            NodeData::ClassDeclaration { .. } => self.emit_class(idx),
            NodeData::Empty => self.line(";"),
            data if data.is_expression() => {
                let text = self.expression(idx);
                self.line(&format!("{text};"));
            }
            _ => {}
        }
    }

    pub(crate) fn emit_statements(&mut self, statements: &NodeList) {
        for statement in statements.iter() {
            self.emit_statement(statement);
        }
    }

    /// Statements of a block, or the single statement, without braces.
    pub(crate) fn emit_block_statements(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        match arena.data(idx) {
            Some(NodeData::Block { statements }) => self.emit_statements(statements),
            Some(_) => self.emit_statement(idx),
            None => {}
        }
    }

    /// Indented body of a braced construct whose header is already written.
    fn emit_body(&mut self, idx: NodeIndex) {
        self.increase_indent();
        self.emit_block_statements(idx);
        self.decrease_indent();
    }

    fn emit_loop(&mut self, header: &str, body: NodeIndex) {
        self.line(&format!("{header} {{"));
        self.emit_body(body);
        self.line("}");
    }

    fn emit_if(&mut self, condition: NodeIndex, then_statement: NodeIndex, else_statement: NodeIndex) {
        let condition = self.expression(condition);
        self.line(&format!("if ({condition}) {{"));
        self.emit_body(then_statement);

        let arena = self.arena;
        let mut rest = else_statement;
        while rest.is_some() {
            if let Some(NodeData::If {
                condition,
                then_statement,
                else_statement,
            }) = arena.data(rest)
            {
                let condition = self.expression(*condition);
                self.line(&format!("}} else if ({condition}) {{"));
                self.emit_body(*then_statement);
                rest = *else_statement;
            } else {
                self.line("} else {");
                self.emit_body(rest);
                break;
            }
        }
        self.line("}");
    }

    /// One `catch ($e)` testing each clause's types in order; an exception
    /// no clause accepts is rethrown.
    fn emit_try(&mut self, block: NodeIndex, catches: &NodeList, finally_block: NodeIndex) {
        self.line("try {");
        self.emit_body(block);
        if !catches.is_empty() {
            self.line("} catch ($e) {");
            self.increase_indent();
            let arena = self.arena;
            let model = self.model;
            let mut first = true;
            for clause in catches.iter() {
                let Some(NodeData::CatchClause { name, block, .. }) = arena.data(clause) else {
                    continue;
                };
                let tests: Vec<String> = model
                    .catch_types(clause)
                    .iter()
                    .map(|ty| self.type_test("$e", ty))
                    .collect();
                let test = if tests.is_empty() {
                    "true".to_string()
                } else {
                    tests.join(" || ")
                };
                let keyword = if first { "if" } else { "} else if" };
                first = false;
                self.line(&format!("{keyword} ({test}) {{"));
                self.increase_indent();
                self.line(&format!("let {name} = $e;"));
                self.emit_block_statements(*block);
                self.decrease_indent();
            }
            if first {
                self.line("throw $e;");
            } else {
                self.line("} else {");
                self.increase_indent();
                self.line("throw $e;");
                self.decrease_indent();
                self.line("}");
            }
            self.decrease_indent();
        }
        if finally_block.is_some() {
            self.line("} finally {");
            self.emit_body(finally_block);
        }
        self.line("}");
    }

    fn emit_switch(&mut self, expression: NodeIndex, statements: &NodeList) {
        let value = self.expression(expression);
        self.line(&format!("switch ({value}) {{"));
        self.increase_indent();
        let arena = self.arena;
        for statement in statements.iter() {
            match arena.data(statement) {
                Some(NodeData::SwitchLabel { expression }) if expression.is_some() => {
                    let label = self.expression(*expression);
                    self.line(&format!("case {label}:"));
                }
                Some(NodeData::SwitchLabel { .. }) => self.line("default:"),
                _ => {
                    self.increase_indent();
                    self.emit_statement(statement);
                    self.decrease_indent();
                }
            }
        }
        self.decrease_indent();
        self.line("}");
    }

    /// `a = 1, b` for the declarations of one variable statement.
    fn declarators(&mut self, declarations: &NodeList) -> String {
        let arena = self.arena;
        let mut parts = Vec::new();
        for declaration in declarations.iter() {
            let Some(NodeData::VariableDeclaration { name, initializer }) = arena.data(declaration) else {
                continue;
            };
            if initializer.is_some() {
                let value = self.operand(*initializer, 2);
                parts.push(format!("{name} = {value}"));
            } else {
                parts.push(name.clone());
            }
        }
        parts.join(", ")
    }

    /// Declarations share one `let`; expressions are comma separated.
    fn for_initializer(&mut self, initializer: &NodeList) -> String {
        let arena = self.arena;
        let mut declarations = Vec::new();
        let mut expressions = Vec::new();
        for init in initializer.iter() {
            match arena.data(init) {
                Some(NodeData::VariableStatement { declarations: list, .. }) => {
                    declarations.push(self.declarators(list));
                }
                Some(NodeData::ExpressionStatement { expression }) => {
                    expressions.push(self.expression(*expression));
                }
                Some(_) => expressions.push(self.expression(init)),
                None => {}
            }
        }
        if declarations.is_empty() {
            expressions.join(", ")
        } else {
            format!("let {}", declarations.join(", "))
        }
    }

    fn expression_list(&mut self, list: &NodeList) -> String {
        let arena = self.arena;
        let mut parts = Vec::new();
        for item in list.iter() {
            let expression = match arena.data(item) {
                Some(NodeData::ExpressionStatement { expression }) => *expression,
                _ => item,
            };
            parts.push(self.expression(expression));
        }
        parts.join(", ")
    }
}

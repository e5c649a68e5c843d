//! Declaration instantiation. Walks statements without evaluating anything
//! and stops at function boundaries.

use super::*;

fn var_attributes(kind: VarKind) -> Attributes {
    match kind {
        VarKind::Variable => Attributes::DONT_DELETE,
        VarKind::Constant => Attributes::DONT_DELETE | Attributes::READ_ONLY,
    }
}

fn collect_vars<'a>(stmt: &'a Statement, out: &mut Vec<&'a VarDecl>) {
    match &stmt.kind {
        StatementKind::Var(decls) => out.extend(decls.iter()),
        StatementKind::For {
            init: Some(ForInit::Var(decls)),
            ..
        } => out.extend(decls.iter()),
        StatementKind::ForIn {
            target: ForInTarget::Var(decl),
            ..
        } => out.push(decl),
        _ => {}
    }
    let mut children: Vec<&'a Statement> = Vec::new();
    collect_children(stmt, &mut children);
    for child in children {
        collect_vars(child, out);
    }
}

fn collect_children<'a>(stmt: &'a Statement, out: &mut Vec<&'a Statement>) {
    match &stmt.kind {
        StatementKind::Block(body) => out.extend(body.iter()),
        StatementKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            out.push(then_branch);
            out.extend(else_branch.as_deref());
        }
        StatementKind::DoWhile { body, .. }
        | StatementKind::While { body, .. }
        | StatementKind::For { body, .. }
        | StatementKind::ForIn { body, .. }
        | StatementKind::With { body, .. }
        | StatementKind::Label { body, .. } => out.push(body),
        StatementKind::Switch { block, .. } => {
            for clause in &block.before_default {
                out.extend(clause.body.iter());
            }
            if let Some(default) = &block.default {
                out.extend(default.iter());
            }
            for clause in &block.after_default {
                out.extend(clause.body.iter());
            }
        }
        StatementKind::Try {
            block,
            catch,
            finally,
        } => {
            out.extend(block.iter());
            if let Some(catch) = catch {
                out.extend(catch.body.iter());
            }
            if let Some(finally) = finally {
                out.extend(finally.iter());
            }
        }
        _ => {}
    }
}

impl Interpreter {
    /// Binds each `var`/`const` name in `body` to `undefined` in the
    /// variable environment, leaving existing bindings untouched.
    pub fn process_var_decls(&mut self, body: &SourceElements) {
        let mut decls = Vec::new();
        for stmt in body {
            collect_vars(stmt, &mut decls);
        }
        let env = self.ctx.variable_env.clone();
        let mut env = env.borrow_mut();
        for decl in &decls {
            env.declare(&decl.ident, var_attributes(decl.kind));
        }
        debug!(count = decls.len(), "hoisted variables");
    }

    /// Creates and binds every function declared in `body`, including those
    /// nested in blocks. A later declaration of the same name wins.
    pub fn process_func_decls(&mut self, body: &SourceElements) {
        let mut defs: Vec<Rc<FunctionDef>> = Vec::new();
        for stmt in body {
            collect_funcs(stmt, &mut defs);
        }
        let scope = self.ctx.scope.clone();
        let env = self.ctx.variable_env.clone();
        for def in &defs {
            let Some(name) = def.name.clone() else {
                debug_assert!(false, "function declaration without a name");
                continue;
            };
            let func = self.create_function(JsFunction::User {
                def: def.clone(),
                scope: scope.clone(),
            });
            env.borrow_mut()
                .initialize(&name, JsValue::Object(func), Attributes::DONT_DELETE);
        }
        debug!(count = defs.len(), "hoisted functions");
    }
}

fn collect_funcs(stmt: &Statement, out: &mut Vec<Rc<FunctionDef>>) {
    if let StatementKind::FuncDecl(def) = &stmt.kind {
        out.push(def.clone());
        return;
    }
    let mut children = Vec::new();
    collect_children(stmt, &mut children);
    for child in children {
        collect_funcs(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn program(src: &str) -> Program {
        Parser::new(src, SourceId(0))
            .and_then(|mut p| p.parse_program())
            .unwrap()
    }

    fn names(src: &str) -> Vec<String> {
        let program = program(src);
        let mut decls = Vec::new();
        for stmt in &program.body {
            collect_vars(stmt, &mut decls);
        }
        decls.iter().map(|d| d.ident.to_string()).collect()
    }

    #[test]
    fn vars_are_found_in_every_nested_construct() {
        let src = "
            var a;
            if (x) { var b; } else var c;
            for (var d = 0; ; ) {}
            for (var e in o) {}
            while (0) { var f; }
            do var g; while (0);
            switch (x) { case 1: var h; default: var i; case 2: var j; }
            try { var k; } catch (err) { var l; } finally { var m; }
            lbl: { var n; }
            with (o) var p;
            function inner() { var hidden; }
        ";
        assert_eq!(
            names(src),
            ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "p"]
        );
    }

    #[test]
    fn funcs_hoist_from_blocks_but_not_bodies() {
        let program = program(
            "function a() { function hidden() {} } { function b() {} } if (0) function c() {}",
        );
        let mut defs = Vec::new();
        for stmt in &program.body {
            collect_funcs(stmt, &mut defs);
        }
        let names: Vec<_> = defs
            .iter()
            .filter_map(|d| d.name.as_ref().map(|n| n.to_string()))
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn hoisting_does_not_evaluate() {
        let mut interp = Interpreter::new(EngineConfig::default());
        let program = program("var x = sideEffect();");
        interp.process_var_decls(&program.body);
        let global = interp.global_object().clone();
        assert!(global.borrow().has_own_property("x"));
        assert!(matches!(global.borrow().get_property("x"), JsValue::Undefined));
    }
}

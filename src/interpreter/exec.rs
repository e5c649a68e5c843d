use super::*;

/// Unwraps an expression result inside a statement, turning an exception
/// into a throw completion.
macro_rules! try_eval {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(e) => return Completion::Throw(e),
        }
    };
}

/// Whether a loop or switch carrying `own` labels consumes a break or
/// continue aimed at `target`.
fn owns(target: &Option<Identifier>, own: &[Identifier]) -> bool {
    match target {
        None => true,
        Some(label) => own.contains(label),
    }
}

/// Folds one loop-body completion into the loop's running value. `Some`
/// means the loop is done and yields that completion.
fn after_body(
    completion: Completion,
    own: &[Identifier],
    value: &mut Option<JsValue>,
) -> Option<Completion> {
    match completion {
        Completion::Normal(v) => {
            if v.is_some() {
                *value = v;
            }
            None
        }
        Completion::Continue(label) if owns(&label, own) => None,
        Completion::Break(label) if owns(&label, own) => Some(Completion::Normal(value.take())),
        other => Some(other),
    }
}

impl Interpreter {
    /// Runs statements in order. The first abrupt completion wins; otherwise
    /// the value of the last statement that produced one is kept.
    pub(crate) fn exec_source_elements(&mut self, elements: &SourceElements) -> Completion {
        let mut value = None;
        for stmt in elements {
            match self.exec_statement(stmt) {
                Completion::Normal(v) => {
                    if v.is_some() {
                        value = v;
                    }
                }
                abrupt => return abrupt,
            }
        }
        Completion::Normal(value)
    }

    pub(crate) fn exec_statement(&mut self, stmt: &Statement) -> Completion {
        self.exec_with_labels(stmt, &[])
    }

    /// `own` holds the labels directly attached to `stmt`.
    fn exec_with_labels(&mut self, stmt: &Statement, own: &[Identifier]) -> Completion {
        trace!(line = stmt.loc.first_line, "statement");
        let completion = self.exec_kind(stmt, own);
        if let Completion::Throw(value) = &completion {
            self.attach_exception_details(value, &stmt.loc);
        }
        completion
    }

    fn exec_kind(&mut self, stmt: &Statement, own: &[Identifier]) -> Completion {
        match &stmt.kind {
            StatementKind::Empty | StatementKind::FuncDecl(_) => Completion::Normal(None),
            StatementKind::Expr(expr) => Completion::Normal(Some(try_eval!(self.eval_expr(expr)))),
            StatementKind::Var(decls) => {
                for decl in decls {
                    try_eval!(self.exec_var_decl(decl));
                }
                Completion::Normal(None)
            }
            StatementKind::Block(body) => self.exec_source_elements(body),
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let cond = try_eval!(self.eval_expr(condition));
                if helpers::to_boolean(&cond) {
                    self.exec_statement(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.exec_statement(else_branch)
                } else {
                    Completion::Normal(None)
                }
            }
            StatementKind::DoWhile { body, condition } => {
                let mut value = None;
                loop {
                    if let Some(done) = after_body(self.exec_statement(body), own, &mut value) {
                        return done;
                    }
                    let cond = try_eval!(self.eval_expr(condition));
                    if !helpers::to_boolean(&cond) {
                        break;
                    }
                }
                Completion::Normal(value)
            }
            StatementKind::While { condition, body } => {
                let mut value = None;
                loop {
                    let cond = try_eval!(self.eval_expr(condition));
                    if !helpers::to_boolean(&cond) {
                        break;
                    }
                    if let Some(done) = after_body(self.exec_statement(body), own, &mut value) {
                        return done;
                    }
                }
                Completion::Normal(value)
            }
            StatementKind::For {
                init,
                condition,
                update,
                body,
            } => self.exec_for(init.as_ref(), condition.as_ref(), update.as_ref(), body, own),
            StatementKind::ForIn {
                target,
                object,
                body,
            } => self.exec_for_in(target, object, body, own),
            StatementKind::Continue(label) => {
                if let Some(completion) = self.check_label(label) {
                    return completion;
                }
                Completion::Continue(label.clone())
            }
            StatementKind::Break(label) => {
                if let Some(completion) = self.check_label(label) {
                    return completion;
                }
                Completion::Break(label.clone())
            }
            StatementKind::Return(expr) => {
                let value = match expr {
                    Some(expr) => try_eval!(self.eval_expr(expr)),
                    None => JsValue::Undefined,
                };
                Completion::Return(value)
            }
            StatementKind::With { object, body } => {
                let value = try_eval!(self.eval_expr(object));
                let object = try_eval!(self.to_object(&value));
                let env = Environment::new_object(object, Some(self.ctx.scope.clone()));
                let saved = std::mem::replace(&mut self.ctx.scope, env);
                let completion = self.exec_statement(body);
                self.ctx.scope = saved;
                completion
            }
            StatementKind::Switch {
                discriminant,
                block,
            } => self.exec_switch(discriminant, block, own),
            StatementKind::Label { .. } => self.exec_label(stmt),
            StatementKind::Throw(expr) => Completion::Throw(try_eval!(self.eval_expr(expr))),
            StatementKind::Try {
                block,
                catch,
                finally,
            } => self.exec_try(block, catch.as_ref(), finally.as_ref()),
        }
    }

    /// Declarations were hoisted; only initializers run here. The write goes
    /// straight to the variable environment, so a `const` gets its value
    /// once despite being read-only.
    pub(crate) fn exec_var_decl(&mut self, decl: &VarDecl) -> JsResult<()> {
        let Some(init) = &decl.init else {
            return Ok(());
        };
        let value = self.eval_expr(init)?;
        let attributes = match decl.kind {
            VarKind::Variable => Attributes::DONT_DELETE,
            VarKind::Constant => Attributes::DONT_DELETE | Attributes::READ_ONLY,
        };
        self.ctx
            .variable_env
            .borrow_mut()
            .initialize(&decl.ident, value, attributes);
        Ok(())
    }

    /// Trees built by the parser never reference a missing label; other hosts
    /// get a SyntaxError.
    fn check_label(&mut self, label: &Option<Identifier>) -> Option<Completion> {
        let label = label.as_ref()?;
        if self.ctx.labels.contains(label) {
            return None;
        }
        Some(self.throw_completion(ErrorKind::Syntax, format!("Label {label} not found")))
    }

    fn exec_label(&mut self, stmt: &Statement) -> Completion {
        // `a: b: while (...)` gives the loop both labels.
        let mut own = Vec::new();
        let mut inner = stmt;
        while let StatementKind::Label { label, body } = &inner.kind {
            own.push(label.clone());
            inner = body;
        }
        let depth = self.ctx.labels.len();
        self.ctx.labels.extend(own.iter().cloned());
        let completion = self.exec_with_labels(inner, &own);
        self.ctx.labels.truncate(depth);
        match completion {
            Completion::Break(Some(label)) | Completion::Continue(Some(label))
                if own.contains(&label) =>
            {
                Completion::Normal(None)
            }
            other => other,
        }
    }

    fn exec_for(
        &mut self,
        init: Option<&ForInit>,
        condition: Option<&Expr>,
        update: Option<&Expr>,
        body: &Statement,
        own: &[Identifier],
    ) -> Completion {
        match init {
            Some(ForInit::Expr(expr)) => {
                try_eval!(self.eval_expr(expr));
            }
            Some(ForInit::Var(decls)) => {
                for decl in decls {
                    try_eval!(self.exec_var_decl(decl));
                }
            }
            None => {}
        }
        let mut value = None;
        loop {
            if let Some(condition) = condition {
                let cond = try_eval!(self.eval_expr(condition));
                if !helpers::to_boolean(&cond) {
                    break;
                }
            }
            if let Some(done) = after_body(self.exec_statement(body), own, &mut value) {
                return done;
            }
            if let Some(update) = update {
                try_eval!(self.eval_expr(update));
            }
        }
        Completion::Normal(value)
    }

    fn exec_for_in(
        &mut self,
        target: &ForInTarget,
        object: &Expr,
        body: &Statement,
        own: &[Identifier],
    ) -> Completion {
        if let ForInTarget::Var(decl) = target {
            try_eval!(self.exec_var_decl(decl));
        }
        let subject = try_eval!(self.eval_expr(object));
        if subject.is_nullish() {
            return Completion::Normal(None);
        }
        let subject = try_eval!(self.to_object(&subject));
        let keys = subject.borrow().enumerable_keys_with_proto();
        let mut value = None;
        for key in keys {
            // Deleted by an earlier iteration.
            if !self.has_property(&subject, &key) {
                continue;
            }
            let name = JsValue::from_str(&key);
            match target {
                ForInTarget::Var(decl) => try_eval!(self.assign_identifier(&decl.ident, name)),
                ForInTarget::Location(expr) => try_eval!(self.assign_to_location(expr, name)),
            }
            if let Some(done) = after_body(self.exec_statement(body), own, &mut value) {
                return done;
            }
        }
        Completion::Normal(value)
    }

    fn exec_switch(&mut self, discriminant: &Expr, block: &CaseBlock, own: &[Identifier]) -> Completion {
        let input = try_eval!(self.eval_expr(discriminant));
        let mut value = None;
        match self.exec_case_block(&input, block, &mut value) {
            Ok(()) => Completion::Normal(value),
            Err(Completion::Break(label)) if owns(&label, own) => Completion::Normal(value),
            Err(abrupt) => abrupt,
        }
    }

    /// Clauses before the default are scanned first, falling through to the
    /// end of that list on a match. The clauses after the default are then
    /// scanned regardless; only if none of them matches does the default run,
    /// followed by every clause after it.
    fn exec_case_block(
        &mut self,
        input: &JsValue,
        block: &CaseBlock,
        value: &mut Option<JsValue>,
    ) -> Result<(), Completion> {
        let mut before = block.before_default.iter();
        while let Some(clause) = before.next() {
            if self.case_matches(input, clause)? {
                self.run_clause(&clause.body, value)?;
                for rest in before.by_ref() {
                    self.run_clause(&rest.body, value)?;
                }
                break;
            }
        }

        let mut after = block.after_default.iter();
        let mut matched = false;
        for clause in after.by_ref() {
            if self.case_matches(input, clause)? {
                self.run_clause(&clause.body, value)?;
                matched = true;
                break;
            }
        }
        if !matched {
            if let Some(default) = &block.default {
                self.run_clause(default, value)?;
            }
            after = block.after_default.iter();
        }
        for clause in after {
            self.run_clause(&clause.body, value)?;
        }
        Ok(())
    }

    fn case_matches(&mut self, input: &JsValue, clause: &CaseClause) -> Result<bool, Completion> {
        let test = self.eval_expr(&clause.test).map_err(Completion::Throw)?;
        Ok(helpers::strict_equality(input, &test))
    }

    fn run_clause(&mut self, body: &SourceElements, value: &mut Option<JsValue>) -> Result<(), Completion> {
        match self.exec_source_elements(body) {
            Completion::Normal(v) => {
                if v.is_some() {
                    *value = v;
                }
                Ok(())
            }
            abrupt => Err(abrupt),
        }
    }

    /// An abrupt `finally` replaces whatever the try or catch block produced.
    fn exec_try(
        &mut self,
        block: &SourceElements,
        catch: Option<&CatchClause>,
        finally: Option<&SourceElements>,
    ) -> Completion {
        let mut completion = self.exec_source_elements(block);
        if let Completion::Throw(exception) = &completion
            && let Some(catch) = catch
        {
            let env = Environment::new(Some(self.ctx.scope.clone()));
            env.borrow_mut()
                .initialize(&catch.param, exception.clone(), Attributes::DONT_DELETE);
            let saved = std::mem::replace(&mut self.ctx.scope, env);
            completion = self.exec_source_elements(&catch.body);
            self.ctx.scope = saved;
        }
        if let Some(finally) = finally {
            let after = self.exec_source_elements(finally);
            if after.is_abrupt() {
                return after;
            }
        }
        completion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> Completion {
        let mut interp = Interpreter::new(EngineConfig::default());
        let program = interp.parse(src, SourceId(0)).unwrap();
        interp.run_program(&program)
    }

    fn number(src: &str) -> f64 {
        match run(src) {
            Completion::Normal(Some(JsValue::Number(n))) => n,
            other => panic!("expected a number from {src:?}, got {other:?}"),
        }
    }

    fn string(src: &str) -> String {
        match run(src) {
            Completion::Normal(Some(JsValue::String(s))) => s.to_rust_string(),
            other => panic!("expected a string from {src:?}, got {other:?}"),
        }
    }

    #[test]
    fn statement_list_keeps_last_value() {
        assert_eq!(number("1; 2; var x = 5;"), 2.0);
        assert!(matches!(run("var x;"), Completion::Normal(None)));
    }

    #[test]
    fn continue_skips_to_next_iteration() {
        assert_eq!(
            number("var sum = 0; for (var i = 0; i < 3; i++) { if (i == 1) continue; sum += i } sum"),
            2.0
        );
    }

    #[test]
    fn labeled_break_leaves_outer_loop() {
        let src = "
            var n = 0;
            outer: for (var i = 0; i < 3; i++) {
                for (var j = 0; j < 3; j++) { n++; break outer; }
                n += 100;
            }
            n";
        assert_eq!(number(src), 1.0);
    }

    #[test]
    fn labeled_continue_targets_outer_loop() {
        let src = "
            var n = 0;
            outer: for (var i = 0; i < 3; i++) {
                for (var j = 0; j < 3; j++) { if (j == 1) continue outer; n++; }
            }
            n";
        assert_eq!(number(src), 3.0);
    }

    #[test]
    fn stacked_labels_all_name_the_loop() {
        assert_eq!(number("var n = 0; a: b: while (true) { n++; if (n > 2) break a; continue b; } n"), 3.0);
    }

    #[test]
    fn break_out_of_labeled_block() {
        assert_eq!(string("var s = 'a'; blk: { s += 'b'; break blk; s += 'c'; } s"), "ab");
    }

    #[test]
    fn finally_return_overrides_throw() {
        let src = "function f() { try { throw 1; } finally { return 2; } } f()";
        assert_eq!(number(src), 2.0);
        let completion = run("x: try { throw 'A'; } finally { break x; }");
        assert!(matches!(completion, Completion::Normal(_)));
    }

    #[test]
    fn normal_finally_preserves_throw() {
        assert!(matches!(
            run("try { throw 'A'; } finally { 1; }"),
            Completion::Throw(JsValue::String(_))
        ));
    }

    #[test]
    fn catch_binds_in_fresh_scope() {
        assert_eq!(
            string("var e = 'outer'; try { throw 'inner'; } catch (e) { e; } e"),
            "outer"
        );
        assert_eq!(string("try { throw 'x'; } catch (e) { e + '!'; }"), "x!");
    }

    #[test]
    fn switch_falls_through_until_break() {
        let src = "
            var s = '';
            switch (2) { case 1: s += 'a'; case 2: s += 'b'; case 3: s += 'c'; break; case 4: s += 'd'; }
            s";
        assert_eq!(string(src), "bc");
    }

    #[test]
    fn switch_default_in_the_middle() {
        let src = |x: &str| {
            format!(
                "var s = ''; switch ({x}) {{ case 1: s += 'a'; default: s += 'd'; case 2: s += 'b'; }} s"
            )
        };
        assert_eq!(string(&src("1")), "adb");
        assert_eq!(string(&src("2")), "b");
        assert_eq!(string(&src("9")), "db");
    }

    #[test]
    fn switch_first_list_match_rescans_second_list() {
        // After falling off the end of the first list, a match in the second
        // list takes over and the default is skipped.
        let src = "var s = ''; switch (1) { case 1: s += 'a'; default: s += 'd'; case 1: s += 'c'; } s";
        assert_eq!(string(src), "ac");
    }

    #[test]
    fn switch_default_first() {
        let src = "var s = ''; switch (3) { default: s += 'd'; case 1: s += 'a'; break; case 3: s += 'c'; } s";
        assert_eq!(string(src), "c");
        let src = "var s = ''; switch (7) { default: s += 'd'; case 1: s += 'a'; break; case 3: s += 'c'; } s";
        assert_eq!(string(src), "da");
    }

    #[test]
    fn switch_does_not_absorb_continue() {
        let src = "
            var s = '';
            for (var i = 0; i < 3; i++) { switch (i) { case 1: continue; } s += i; }
            s";
        assert_eq!(string(src), "02");
    }

    #[test]
    fn for_in_over_nullish_does_nothing() {
        assert!(matches!(run("for (var k in null) { throw 1; }"), Completion::Normal(None)));
        assert!(matches!(run("for (var k in undefined) { throw 1; }"), Completion::Normal(None)));
    }

    #[test]
    fn for_in_visits_own_then_inherited() {
        let src = "
            function P() {} P.prototype.z = 1;
            var o = new P(); o.b = 1; o.a = 2;
            var s = ''; for (var k in o) s += k; s";
        assert_eq!(string(src), "baz");
    }

    #[test]
    fn for_in_skips_deleted_properties() {
        let src = "var o = { a: 1, b: 2, c: 3 }; var s = ''; for (var k in o) { s += k; delete o.b; } s";
        assert_eq!(string(src), "ac");
    }

    #[test]
    fn for_in_assigns_through_member_target() {
        assert_eq!(string("var o = { p: 1 }, t = {}; for (t.last in o); t.last"), "p");
    }

    #[test]
    fn do_while_runs_body_first() {
        assert_eq!(number("var n = 0; do n++; while (false); n"), 1.0);
    }

    #[test]
    fn with_resolves_through_object() {
        assert_eq!(number("var o = { x: 4 }; var x = 1; with (o) { x = x + 1; } o.x * 10 + x"), 51.0);
    }

    #[test]
    fn const_ignores_reassignment() {
        assert_eq!(number("const c = 1; c = 2; c"), 1.0);
    }

    #[test]
    fn throw_leaves_line_on_error_objects() {
        let Completion::Throw(JsValue::Object(err)) = run("1;\n\nnull.x;") else {
            panic!("expected a thrown error");
        };
        assert!(matches!(err.borrow().get_property("line"), JsValue::Number(n) if n == 3.0));
    }
}

//! Reconstruction of parseable source text from a tree.

use super::*;
use crate::types::number_ops;

const INDENT: &str = "  ";

#[derive(Default)]
pub struct SourceStream {
    out: String,
    depth: usize,
}

impl SourceStream {
    pub fn new() -> Self {
        SourceStream::default()
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
    }

    pub fn program(&mut self, program: &Program) {
        for (i, stmt) in program.body.iter().enumerate() {
            if i > 0 {
                self.newline();
            }
            self.statement(stmt);
        }
    }

    fn block(&mut self, elements: &SourceElements) {
        self.push("{");
        self.depth += 1;
        for stmt in elements {
            self.newline();
            self.statement(stmt);
        }
        self.depth -= 1;
        self.newline();
        self.push("}");
    }

    pub fn statement(&mut self, stmt: &Statement) {
        match &stmt.kind {
            StatementKind::Empty => self.push(";"),
            StatementKind::Expr(e) => {
                self.expr(e);
                self.push(";");
            }
            StatementKind::Var(decls) => {
                self.var_decls(decls);
                self.push(";");
            }
            StatementKind::Block(elements) => self.block(elements),
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.push("if (");
                self.expr(condition);
                self.push(") ");
                self.statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.push(" else ");
                    self.statement(else_branch);
                }
            }
            StatementKind::DoWhile { body, condition } => {
                self.push("do ");
                self.statement(body);
                self.push(" while (");
                self.expr(condition);
                self.push(");");
            }
            StatementKind::While { condition, body } => {
                self.push("while (");
                self.expr(condition);
                self.push(") ");
                self.statement(body);
            }
            StatementKind::For {
                init,
                condition,
                update,
                body,
            } => {
                self.push("for (");
                match init {
                    Some(ForInit::Expr(e)) => self.expr(e),
                    Some(ForInit::Var(decls)) => self.var_decls(decls),
                    None => {}
                }
                self.push(";");
                if let Some(c) = condition {
                    self.push(" ");
                    self.expr(c);
                }
                self.push(";");
                if let Some(u) = update {
                    self.push(" ");
                    self.expr(u);
                }
                self.push(") ");
                self.statement(body);
            }
            StatementKind::ForIn {
                target,
                object,
                body,
            } => {
                self.push("for (");
                match target {
                    ForInTarget::Var(decl) => {
                        self.push(var_keyword(decl.kind));
                        self.push(" ");
                        self.var_decl(decl);
                    }
                    ForInTarget::Location(e) => self.expr(e),
                }
                self.push(" in ");
                self.expr(object);
                self.push(") ");
                self.statement(body);
            }
            StatementKind::Continue(label) => self.jump("continue", label.as_ref()),
            StatementKind::Break(label) => self.jump("break", label.as_ref()),
            StatementKind::Return(value) => {
                self.push("return");
                if let Some(v) = value {
                    self.push(" ");
                    self.expr(v);
                }
                self.push(";");
            }
            StatementKind::With { object, body } => {
                self.push("with (");
                self.expr(object);
                self.push(") ");
                self.statement(body);
            }
            StatementKind::Switch {
                discriminant,
                block,
            } => {
                self.push("switch (");
                self.expr(discriminant);
                self.push(") {");
                for clause in &block.before_default {
                    self.case_clause(clause);
                }
                if let Some(default) = &block.default {
                    self.newline();
                    self.push("default:");
                    self.clause_body(default);
                }
                for clause in &block.after_default {
                    self.case_clause(clause);
                }
                self.newline();
                self.push("}");
            }
            StatementKind::Label { label, body } => {
                self.push(label.as_str());
                self.push(": ");
                self.statement(body);
            }
            StatementKind::Throw(e) => {
                self.push("throw ");
                self.expr(e);
                self.push(";");
            }
            StatementKind::Try {
                block,
                catch,
                finally,
            } => {
                self.push("try ");
                self.block(block);
                if let Some(c) = catch {
                    self.push(" catch (");
                    self.push(c.param.as_str());
                    self.push(") ");
                    self.block(&c.body);
                }
                if let Some(f) = finally {
                    self.push(" finally ");
                    self.block(f);
                }
            }
            StatementKind::FuncDecl(def) => self.function(def),
        }
    }

    fn jump(&mut self, keyword: &str, label: Option<&Identifier>) {
        self.push(keyword);
        if let Some(l) = label {
            self.push(" ");
            self.push(l.as_str());
        }
        self.push(";");
    }

    fn case_clause(&mut self, clause: &CaseClause) {
        self.newline();
        self.push("case ");
        self.expr(&clause.test);
        self.push(":");
        self.clause_body(&clause.body);
    }

    fn clause_body(&mut self, body: &SourceElements) {
        self.depth += 1;
        for stmt in body {
            self.newline();
            self.statement(stmt);
        }
        self.depth -= 1;
    }

    fn var_decls(&mut self, decls: &NodeList<VarDecl>) {
        let keyword = decls.first().map_or(VarKind::Variable, |d| d.kind);
        self.push(var_keyword(keyword));
        self.push(" ");
        for (i, decl) in decls.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.var_decl(decl);
        }
    }

    fn var_decl(&mut self, decl: &VarDecl) {
        self.push(decl.ident.as_str());
        if let Some(init) = &decl.init {
            self.push(" = ");
            self.expr(init);
        }
    }

    pub fn function(&mut self, def: &FunctionDef) {
        self.push("function ");
        if let Some(name) = &def.name {
            self.push(name.as_str());
        }
        self.push("(");
        for (i, p) in def.params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push(p.as_str());
        }
        self.push(") ");
        self.block(&def.body);
    }

    fn args(&mut self, args: &Arguments) {
        self.push("(");
        for (i, a) in args.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expr(a);
        }
        self.push(")");
    }

    fn binary(&mut self, left: &Expr, op: &dyn fmt::Display, right: &Expr) {
        self.expr(left);
        self.push(&format!(" {op} "));
        self.expr(right);
    }

    // Prefix operators need a space when the operand begins with the same
    // sign, otherwise `- -x` would re-lex as a decrement.
    fn prefix(&mut self, op: &str, operand: &Expr) {
        let mut inner = SourceStream {
            out: String::new(),
            depth: self.depth,
        };
        inner.expr(operand);
        self.push(op);
        let same_sign = matches!(op, "+" | "-") && inner.out.starts_with(op);
        if op.ends_with(|c: char| c.is_ascii_alphabetic()) || same_sign {
            self.push(" ");
        }
        self.push(&inner.out);
    }

    fn member_base(&mut self, base: &Expr) {
        // `1.x` would lex as a malformed number
        if let ExprKind::Number(_) = base.kind {
            self.push("(");
            self.expr(base);
            self.push(")");
        } else {
            self.expr(base);
        }
    }

    fn bracket(&mut self, base: &Expr, subscript: &Expr) {
        self.member_base(base);
        self.push("[");
        self.expr(subscript);
        self.push("]");
    }

    fn dot(&mut self, base: &Expr, ident: &Identifier) {
        self.member_base(base);
        self.push(".");
        self.push(ident.as_str());
    }

    pub fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Null => self.push("null"),
            ExprKind::Boolean(b) => self.push(if *b { "true" } else { "false" }),
            ExprKind::Number(n) => self.push(&number_ops::to_string(*n)),
            ExprKind::String(s) => self.push(&quote(s)),
            ExprKind::RegExp { pattern, flags } => {
                self.push("/");
                self.push(pattern);
                self.push("/");
                self.push(flags);
            }
            ExprKind::This => self.push("this"),
            ExprKind::Resolve(id) => self.push(id.as_str()),
            ExprKind::Group(inner) => {
                self.push("(");
                self.expr(inner);
                self.push(")");
            }
            ExprKind::Array {
                elements,
                trailing_elision,
            } => {
                self.push("[");
                for (i, el) in elements.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    for _ in 0..el.elision {
                        self.push(",");
                    }
                    self.expr(&el.value);
                }
                if *trailing_elision > 0 {
                    if !elements.is_empty() {
                        self.push(", ");
                    }
                    for _ in 0..*trailing_elision {
                        self.push(",");
                    }
                }
                self.push("]");
            }
            ExprKind::Object(props) => {
                if props.is_empty() {
                    self.push("{}");
                    return;
                }
                self.push("{");
                for (i, p) in props.iter().enumerate() {
                    self.push(if i > 0 { ", " } else { " " });
                    match &p.name {
                        PropertyName::Identifier(id) => self.push(id.as_str()),
                        PropertyName::String(s) => self.push(&quote(s)),
                        PropertyName::Number(n) => self.push(&number_ops::to_string(*n)),
                    }
                    self.push(": ");
                    self.expr(&p.value);
                }
                self.push(" }");
            }
            ExprKind::BracketAccessor { base, subscript } => self.bracket(base, subscript),
            ExprKind::DotAccessor { base, ident } => self.dot(base, ident),
            ExprKind::New { callee, args } => {
                self.push("new ");
                self.expr(callee);
                if let Some(args) = args {
                    self.args(args);
                }
            }
            ExprKind::FunctionCallValue { callee, args } => {
                self.expr(callee);
                self.args(args);
            }
            ExprKind::FunctionCallResolve { ident, args } => {
                self.push(ident.as_str());
                self.args(args);
            }
            ExprKind::FunctionCallBracket {
                base,
                subscript,
                args,
                parenthesized,
            } => {
                if *parenthesized {
                    self.push("(");
                }
                self.bracket(base, subscript);
                if *parenthesized {
                    self.push(")");
                }
                self.args(args);
            }
            ExprKind::FunctionCallDot {
                base,
                ident,
                args,
                parenthesized,
            } => {
                if *parenthesized {
                    self.push("(");
                }
                self.dot(base, ident);
                if *parenthesized {
                    self.push(")");
                }
                self.args(args);
            }
            ExprKind::PostfixResolve { ident, op } => {
                self.push(ident.as_str());
                self.push(&op.to_string());
            }
            ExprKind::PostfixBracket {
                base,
                subscript,
                op,
            } => {
                self.bracket(base, subscript);
                self.push(&op.to_string());
            }
            ExprKind::PostfixDot { base, ident, op } => {
                self.dot(base, ident);
                self.push(&op.to_string());
            }
            ExprKind::DeleteResolve(id) => {
                self.push("delete ");
                self.push(id.as_str());
            }
            ExprKind::DeleteBracket { base, subscript } => {
                self.push("delete ");
                self.bracket(base, subscript);
            }
            ExprKind::DeleteDot { base, ident } => {
                self.push("delete ");
                self.dot(base, ident);
            }
            ExprKind::DeleteValue(e) => self.prefix("delete", e),
            ExprKind::Void(e) => self.prefix("void", e),
            ExprKind::TypeOfResolve(id) => {
                self.push("typeof ");
                self.push(id.as_str());
            }
            ExprKind::TypeOfValue(e) => self.prefix("typeof", e),
            ExprKind::PrefixResolve { ident, op } => {
                self.push(&op.to_string());
                self.push(ident.as_str());
            }
            ExprKind::PrefixBracket {
                base,
                subscript,
                op,
            } => {
                self.push(&op.to_string());
                self.bracket(base, subscript);
            }
            ExprKind::PrefixDot { base, ident, op } => {
                self.push(&op.to_string());
                self.dot(base, ident);
            }
            ExprKind::UnaryPlus(e) => self.prefix("+", e),
            ExprKind::Negate(e) => self.prefix("-", e),
            ExprKind::BitwiseNot(e) => self.prefix("~", e),
            ExprKind::LogicalNot(e) => self.prefix("!", e),
            ExprKind::Mult { op, left, right } => self.binary(left, op, right),
            ExprKind::Add { op, left, right } => self.binary(left, op, right),
            ExprKind::Shift { op, left, right } => self.binary(left, op, right),
            ExprKind::Relational { op, left, right } => self.binary(left, op, right),
            ExprKind::Equal { op, left, right } => self.binary(left, op, right),
            ExprKind::BitOper { op, left, right } => self.binary(left, op, right),
            ExprKind::BinaryLogical { op, left, right } => self.binary(left, op, right),
            ExprKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                self.expr(condition);
                self.push(" ? ");
                self.expr(then_expr);
                self.push(" : ");
                self.expr(else_expr);
            }
            ExprKind::AssignResolve { ident, op, value } => {
                self.push(ident.as_str());
                self.push(&format!(" {op} "));
                self.expr(value);
            }
            ExprKind::AssignBracket {
                base,
                subscript,
                op,
                value,
            } => {
                self.bracket(base, subscript);
                self.push(&format!(" {op} "));
                self.expr(value);
            }
            ExprKind::AssignDot {
                base,
                ident,
                op,
                value,
            } => {
                self.dot(base, ident);
                self.push(&format!(" {op} "));
                self.expr(value);
            }
            ExprKind::Comma { left, right } => {
                self.expr(left);
                self.push(", ");
                self.expr(right);
            }
            ExprKind::FuncExpr(def) => self.function(def),
        }
    }
}

fn var_keyword(kind: VarKind) -> &'static str {
    match kind {
        VarKind::Variable => "var",
        VarKind::Constant => "const",
    }
}

/// Double-quoted literal; everything outside printable ASCII is escaped so
/// lone surrogates survive the trip.
pub fn quote(s: &JsString) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for &unit in &s.code_units {
        match unit {
            0x22 => out.push_str("\\\""),
            0x5C => out.push_str("\\\\"),
            0x0A => out.push_str("\\n"),
            0x0D => out.push_str("\\r"),
            0x09 => out.push_str("\\t"),
            0x08 => out.push_str("\\b"),
            0x0C => out.push_str("\\f"),
            0x0B => out.push_str("\\v"),
            0x20..=0x7E => out.push(char::from(unit as u8)),
            _ => out.push_str(&format!("\\u{unit:04X}")),
        }
    }
    out.push('"');
    out
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = SourceStream::new();
        s.program(self);
        f.write_str(&s.finish())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = SourceStream::new();
        s.statement(self);
        f.write_str(&s.finish())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = SourceStream::new();
        s.expr(self);
        f.write_str(&s.finish())
    }
}

impl fmt::Display for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = SourceStream::new();
        s.function(self);
        f.write_str(&s.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use pretty_assertions::assert_eq;

    fn stream(src: &str) -> String {
        Parser::new(src, SourceId(0))
            .and_then(|mut p| p.parse_program())
            .unwrap()
            .to_string()
    }

    fn assert_fixed_point(src: &str) {
        let once = stream(src);
        let twice = stream(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn streams_statements_with_indentation() {
        assert_eq!(
            stream("function f(a,b){if(a)return b;else{a=b}}"),
            "function f(a, b) {\n  if (a) return b; else {\n    a = b;\n  }\n}"
        );
    }

    #[test]
    fn preserves_source_parenthesization() {
        assert_eq!(stream("x = (a + b) * c;"), "x = (a + b) * c;");
        assert_eq!(stream("(a.b)();"), "(a.b)();");
        assert_eq!(stream("(a)();"), "a();");
    }

    #[test]
    fn separates_repeated_signs() {
        assert_eq!(stream("x = - -y;"), "x = - -y;");
        assert_eq!(stream("x = a - -b;"), "x = a - -b;");
        assert_eq!(stream("x = +(+y);"), "x = +(+y);");
        assert_eq!(stream("typeof (a);"), "typeof a;");
        assert_eq!(stream("void 0;"), "void 0;");
    }

    #[test]
    fn array_holes_round_trip() {
        assert_eq!(stream("[1,,2];"), "[1, ,2];");
        assert_eq!(stream("[,];"), "[,];");
        assert_eq!(stream("[1,2,];"), "[1, 2];");
        assert_fixed_point("[1,,2,,];");
        assert_fixed_point("[,,a];");
    }

    #[test]
    fn literals_are_requoted() {
        assert_eq!(stream("'it\\'s\\n';"), "\"it's\\n\";");
        assert_eq!(stream("x = /a\\/b/g;"), "x = /a\\/b/g;");
        assert_eq!(stream("(1).toString();"), "(1).toString();");
        assert_eq!(stream("o = {a: 1, 'b c': 2, 3: 4};"), "o = { a: 1, \"b c\": 2, 3: 4 };");
    }

    #[test]
    fn switch_keeps_default_position() {
        let src = "switch (x) { case 1: a(); default: b(); case 2: c(); break; }";
        assert_eq!(
            stream(src),
            "switch (x) {\ncase 1:\n  a();\ndefault:\n  b();\ncase 2:\n  c();\n  break;\n}"
        );
        assert_fixed_point(src);
    }

    #[test]
    fn complex_programs_reach_a_fixed_point() {
        assert_fixed_point(
            "outer: for (var i = 0, j; i < 10; i++) { for (k in o) { if (k) continue outer; } }\n\
             try { throw new Error('x') } catch (e) { e.message += '!' } finally { done = true }\n\
             var f = function g(x) { return x ? g(x - 1) : [x, {y: x}]; };\n\
             do x >>>= 1; while (x);\n\
             with (o) delete p, delete q[0], delete (1);",
        );
    }
}

use crate::ast::*;
use crate::lexer::{Keyword, LexError, Lexer, Token};
use thiserror::Error;

mod expressions;
mod shapes;
mod statements;

#[derive(Clone, Debug, Error)]
#[error("SyntaxError: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: u32,
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError {
            message: e.message,
            line: e.location.line,
        }
    }
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    current_line: u32,
    prev_line: u32,
    prev_line_terminator: bool,
    pushback: Option<(Token, bool, u32)>, // (token, had_line_terminator_before, line)
    source_id: SourceId,
    no_in: bool,
    in_function: u32,
    in_iteration: u32,
    in_switch: u32,
    labels: Vec<Identifier>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, source_id: SourceId) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let mut had_lt = false;
        let current = loop {
            let tok = lexer.next_token()?;
            if tok == Token::LineTerminator {
                had_lt = true;
                continue;
            }
            break tok;
        };
        let current_line = lexer.token_line();
        Ok(Self {
            lexer,
            current,
            current_line,
            prev_line: current_line,
            prev_line_terminator: had_lt,
            pushback: None,
            source_id,
            no_in: false,
            in_function: 0,
            in_iteration: 0,
            in_switch: 0,
            labels: Vec::new(),
        })
    }

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut body = ListBuilder::new();
        while self.current != Token::Eof {
            body.push(self.parse_statement()?);
        }
        Ok(Program {
            body: body.finish(),
            source_id: self.source_id,
        })
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        self.prev_line = self.current_line;
        let old = std::mem::replace(&mut self.current, Token::Eof);
        if let Some((tok, lt, line)) = self.pushback.take() {
            self.current = tok;
            self.prev_line_terminator = lt;
            self.current_line = line;
        } else {
            self.prev_line_terminator = false;
            loop {
                let tok = self.lexer.next_token()?;
                if tok == Token::LineTerminator {
                    self.prev_line_terminator = true;
                    continue;
                }
                self.current = tok;
                self.current_line = self.lexer.token_line();
                break;
            }
        }
        Ok(old)
    }

    /// Re-installs `token` as current, stashing what was current so the next
    /// `advance` returns to it.
    fn push_back(&mut self, token: Token, had_lt: bool, line: u32) {
        let old_current = std::mem::replace(&mut self.current, token);
        let old_lt = std::mem::replace(&mut self.prev_line_terminator, had_lt);
        let old_line = std::mem::replace(&mut self.current_line, line);
        self.pushback = Some((old_current, old_lt, old_line));
    }

    fn eat(&mut self, expected: &Token) -> Result<(), ParseError> {
        if &self.current == expected {
            self.advance()?;
            Ok(())
        } else {
            Err(self.error(format!("Expected {expected:?}, got {:?}", self.current)))
        }
    }

    fn eat_semicolon(&mut self) -> Result<(), ParseError> {
        if self.current == Token::Semicolon {
            self.advance()?;
            return Ok(());
        }
        // ASI
        if self.prev_line_terminator
            || self.current == Token::RightBrace
            || self.current == Token::Eof
        {
            return Ok(());
        }
        Err(self.error(format!("Expected ';', got {:?}", self.current)))
    }

    fn error(&self, msg: impl Into<String>) -> ParseError {
        ParseError {
            message: msg.into(),
            line: self.current_line,
        }
    }

    fn is_reserved_identifier(name: &str) -> bool {
        // Future reserved words the lexer leaves as identifiers.
        matches!(
            name,
            "class" | "debugger" | "enum" | "export" | "extends" | "import" | "super"
        )
    }

    fn current_identifier(&self) -> Option<Identifier> {
        match &self.current {
            Token::Identifier(name) if !Self::is_reserved_identifier(name) => {
                Some(Identifier::new(name))
            }
            _ => None,
        }
    }

    fn expect_identifier(&mut self) -> Result<Identifier, ParseError> {
        match self.current_identifier() {
            Some(id) => {
                self.advance()?;
                Ok(id)
            }
            None => Err(self.error(format!("Expected identifier, got {:?}", self.current))),
        }
    }

    fn statement(&self, kind: StatementKind, first_line: u32) -> Statement {
        Statement {
            kind,
            loc: StatementLoc {
                first_line,
                last_line: self.prev_line,
                source_id: self.source_id,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Program {
        Parser::new(src, SourceId(0))
            .unwrap()
            .parse_program()
            .unwrap()
    }

    fn parse_err(src: &str) -> String {
        match Parser::new(src, SourceId(0)).and_then(|mut p| p.parse_program()) {
            Ok(_) => panic!("expected a syntax error for {src:?}"),
            Err(e) => e.message,
        }
    }

    fn first_expr(src: &str) -> ExprKind {
        match parse(src).body.into_iter().next().map(|s| s.kind) {
            Some(StatementKind::Expr(e)) => e.kind,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn ungroup(kind: ExprKind) -> ExprKind {
        match kind {
            ExprKind::Group(inner) => inner.into_innermost().kind,
            other => other,
        }
    }

    #[test]
    fn parse_empty() {
        let prog = parse("");
        assert!(prog.body.is_empty());
    }

    #[test]
    fn parse_var_declaration_list_in_order() {
        let prog = parse("var a = 1, b, c = a;");
        let StatementKind::Var(decls) = &prog.body.first().unwrap().kind else {
            panic!("expected var");
        };
        let names: Vec<_> = decls.iter().map(|d| d.ident.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert!(decls.is_well_formed());
        assert!(decls.iter().nth(1).unwrap().init.is_none());
    }

    #[test]
    fn parse_const_declaration() {
        let prog = parse("const k = 3;");
        let StatementKind::Var(decls) = &prog.body.first().unwrap().kind else {
            panic!("expected var");
        };
        assert_eq!(decls.first().unwrap().kind, VarKind::Constant);
    }

    #[test]
    fn call_shapes_are_specialized() {
        assert!(matches!(first_expr("f(1, 2);"), ExprKind::FunctionCallResolve { .. }));
        assert!(matches!(
            first_expr("a.b();"),
            ExprKind::FunctionCallDot { parenthesized: false, .. }
        ));
        assert!(matches!(
            first_expr("(a[0])();"),
            ExprKind::FunctionCallBracket { parenthesized: true, .. }
        ));
        assert!(matches!(first_expr("((f))();"), ExprKind::FunctionCallResolve { .. }));
        assert!(matches!(first_expr("f()();"), ExprKind::FunctionCallValue { .. }));
    }

    #[test]
    fn assignment_shapes_see_through_groups() {
        assert!(matches!(
            first_expr("(x) += 1;"),
            ExprKind::AssignResolve { op: AssignOp::AddAssign, .. }
        ));
        assert!(matches!(first_expr("((o.p)) = 1;"), ExprKind::AssignDot { .. }));
        assert!(matches!(first_expr("o[k] >>>= 2;"), ExprKind::AssignBracket { .. }));
        assert!(matches!(first_expr("x++;"), ExprKind::PostfixResolve { .. }));
        assert!(matches!(first_expr("--o.p;"), ExprKind::PrefixDot { .. }));
    }

    #[test]
    fn delete_and_typeof_shapes() {
        assert!(matches!(first_expr("delete x;"), ExprKind::DeleteResolve(_)));
        assert!(matches!(first_expr("delete (o[1]);"), ExprKind::DeleteBracket { .. }));
        assert!(matches!(first_expr("delete 1;"), ExprKind::DeleteValue(_)));
        assert!(matches!(first_expr("typeof (y);"), ExprKind::TypeOfResolve(_)));
        assert!(matches!(first_expr("typeof f();"), ExprKind::TypeOfValue(_)));
    }

    #[test]
    fn argument_and_parameter_order() {
        let prog = parse("function f(a, b, c) { return g(c, b, a); }");
        let StatementKind::FuncDecl(def) = &prog.body.first().unwrap().kind else {
            panic!("expected function");
        };
        let params: Vec<_> = def.params.iter().map(Identifier::as_str).collect();
        assert_eq!(params, ["a", "b", "c"]);
        let StatementKind::Return(Some(ret)) = &def.body.first().unwrap().kind else {
            panic!("expected return");
        };
        let ExprKind::FunctionCallResolve { args, .. } = &ret.kind else {
            panic!("expected call");
        };
        let names: Vec<_> = args
            .iter()
            .map(|a| match &a.kind {
                ExprKind::Resolve(id) => id.as_str(),
                _ => "?",
            })
            .collect();
        assert_eq!(names, ["c", "b", "a"]);
    }

    #[test]
    fn array_elisions() {
        let ExprKind::Array {
            elements,
            trailing_elision,
        } = first_expr("[, 1, , 2, ,];")
        else {
            panic!("expected array");
        };
        let elisions: Vec<_> = elements.iter().map(|e| e.elision).collect();
        assert_eq!(elisions, [1, 1]);
        assert_eq!(trailing_elision, 1);
    }

    #[test]
    fn object_literal_keys() {
        let ExprKind::Object(props) = ungroup(first_expr("({a: 1, 'b': 2, 3: 4});"))
        else {
            panic!("expected object");
        };
        assert_eq!(props.len(), 3);
        assert!(matches!(props.first().unwrap().name, PropertyName::Identifier(_)));
    }

    #[test]
    fn switch_splits_clauses_around_default() {
        let prog = parse("switch (x) { case 1: a; default: b; case 2: c; case 3: }");
        let StatementKind::Switch { block, .. } = &prog.body.first().unwrap().kind else {
            panic!("expected switch");
        };
        assert_eq!(block.before_default.len(), 1);
        assert!(block.default.is_some());
        assert_eq!(block.after_default.len(), 2);
    }

    #[test]
    fn for_and_for_in_heads() {
        let prog = parse("for (var i = 0; i < 3; i++); for (k in o); for (var p in o);");
        let kinds: Vec<_> = prog.body.iter().map(|s| &s.kind).collect();
        assert!(matches!(kinds[0], StatementKind::For { init: Some(ForInit::Var(_)), .. }));
        assert!(matches!(
            kinds[1],
            StatementKind::ForIn { target: ForInTarget::Location(_), .. }
        ));
        assert!(matches!(kinds[2], StatementKind::ForIn { target: ForInTarget::Var(_), .. }));
    }

    #[test]
    fn in_operator_allowed_inside_parens_of_for_init() {
        let prog = parse("for (var x = ('a' in o); x; ) break;");
        assert!(matches!(prog.body.first().unwrap().kind, StatementKind::For { .. }));
    }

    #[test]
    fn regex_literal_in_operand_position() {
        assert!(matches!(
            first_expr("x = /ab+c/gi;"),
            ExprKind::AssignResolve { .. }
        ));
        let prog = parse("a = b / c / d;");
        assert_eq!(prog.body.len(), 1);
    }

    #[test]
    fn automatic_semicolon_insertion() {
        let prog = parse("a = 1\nb = 2\nreturn_ = a\n++b");
        assert_eq!(prog.body.len(), 4);
        let prog = parse("function f() { return\n1 }");
        let StatementKind::FuncDecl(def) = &prog.body.first().unwrap().kind else {
            panic!("expected function");
        };
        assert!(matches!(def.body.first().unwrap().kind, StatementKind::Return(None)));
    }

    #[test]
    fn statement_lines_are_recorded() {
        let prog = parse("a;\nif (b) {\n  c;\n}\n");
        let locs: Vec<_> = prog.body.iter().map(|s| (s.loc.first_line, s.loc.last_line)).collect();
        assert_eq!(locs, [(1, 1), (2, 4)]);
    }

    #[test]
    fn static_errors() {
        assert_eq!(parse_err("1 = 2;"), "Left side of assignment is not a reference.");
        assert_eq!(parse_err("f() += 2;"), "Left side of assignment is not a reference.");
        assert!(parse_err("1++;").contains("not a reference"));
        assert!(parse_err("break;").contains("Break"));
        assert!(parse_err("while (1) { function f() { continue; } }").contains("Continue"));
        assert_eq!(parse_err("while (1) break nope;"), "Label nope not found");
        assert_eq!(parse_err("a: a: ;"), "Duplicate label a");
        assert!(parse_err("switch (x) { default: default: }").contains("default"));
        assert!(parse_err("return 1;").contains("Return"));
        assert!(parse_err("var class = 1;").contains("identifier"));
        assert!(parse_err("try {}").contains("catch"));
    }

    #[test]
    fn dot_member_names_exclude_reserved_words() {
        assert_eq!(parse_err("o.if;"), "Unexpected keyword 'if' after '.'");
        assert_eq!(parse_err("o.null = 1;"), "Unexpected literal after '.'");
        assert!(parse_err("o.class;").contains("identifier"));
        parse("o.iffy; o.nullable; o.$x._y;");
    }

    #[test]
    fn labels_are_scoped_to_their_statement() {
        parse("a: { break a; } a: while (1) continue a;");
        assert_eq!(parse_err("a: ; break a;"), "Label a not found");
    }

    #[test]
    fn errors_carry_lines() {
        let err = Parser::new("x;\n\n1 = 2;", SourceId(0))
            .and_then(|mut p| p.parse_program())
            .unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.to_string(), "SyntaxError: Left side of assignment is not a reference.");
    }
}

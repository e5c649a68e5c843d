use super::*;
use std::rc::Rc;

impl<'a> Parser<'a> {
    pub(super) fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let line = self.current_line;
        let kind = match &self.current {
            Token::LeftBrace => StatementKind::Block(self.parse_block()?),
            Token::Semicolon => {
                self.advance()?;
                StatementKind::Empty
            }
            Token::Keyword(Keyword::Var) => self.parse_variable_statement(VarKind::Variable)?,
            Token::Keyword(Keyword::Const) => self.parse_variable_statement(VarKind::Constant)?,
            Token::Keyword(Keyword::Function) => {
                self.advance()?;
                let name = self.expect_identifier()?;
                StatementKind::FuncDecl(self.parse_function_rest(Some(name), line)?)
            }
            Token::Keyword(Keyword::If) => self.parse_if_statement()?,
            Token::Keyword(Keyword::While) => self.parse_while_statement()?,
            Token::Keyword(Keyword::Do) => self.parse_do_while_statement()?,
            Token::Keyword(Keyword::For) => self.parse_for_statement()?,
            Token::Keyword(Keyword::Return) => self.parse_return_statement()?,
            Token::Keyword(Keyword::Break) => self.parse_break_statement()?,
            Token::Keyword(Keyword::Continue) => self.parse_continue_statement()?,
            Token::Keyword(Keyword::Throw) => self.parse_throw_statement()?,
            Token::Keyword(Keyword::Try) => self.parse_try_statement()?,
            Token::Keyword(Keyword::Switch) => self.parse_switch_statement()?,
            Token::Keyword(Keyword::With) => self.parse_with_statement()?,
            _ => return self.parse_expression_statement_or_labeled(),
        };
        Ok(self.statement(kind, line))
    }

    fn parse_expression_statement_or_labeled(&mut self) -> Result<Statement, ParseError> {
        let line = self.current_line;
        if let Some(label) = self.current_identifier() {
            let orig_token = self.current.clone();
            let ident_lt = self.prev_line_terminator;
            self.advance()?;
            if self.current == Token::Colon {
                self.advance()?;
                if self.labels.contains(&label) {
                    return Err(self.error(format!("Duplicate label {label}")));
                }
                self.labels.push(label.clone());
                let body = self.parse_statement();
                self.labels.pop();
                let kind = StatementKind::Label {
                    label,
                    body: Box::new(body?),
                };
                return Ok(self.statement(kind, line));
            }
            // Not a label: put the identifier back in front of what follows.
            self.push_back(orig_token, ident_lt, line);
        }
        let expr = self.parse_expression()?;
        self.eat_semicolon()?;
        Ok(self.statement(StatementKind::Expr(expr), line))
    }

    pub(super) fn parse_block(&mut self) -> Result<SourceElements, ParseError> {
        self.eat(&Token::LeftBrace)?;
        let mut stmts = ListBuilder::new();
        while self.current != Token::RightBrace && self.current != Token::Eof {
            stmts.push(self.parse_statement()?);
        }
        self.eat(&Token::RightBrace)?;
        Ok(stmts.finish())
    }

    fn parse_variable_statement(&mut self, kind: VarKind) -> Result<StatementKind, ParseError> {
        self.advance()?; // var / const
        let decls = self.parse_var_declaration_list(kind)?;
        self.eat_semicolon()?;
        Ok(StatementKind::Var(decls))
    }

    fn parse_var_declaration_list(&mut self, kind: VarKind) -> Result<NodeList<VarDecl>, ParseError> {
        let mut decls = ListBuilder::new();
        loop {
            decls.push(self.parse_var_declaration(kind)?);
            if self.current != Token::Comma {
                break;
            }
            self.advance()?;
        }
        Ok(decls.finish())
    }

    fn parse_var_declaration(&mut self, kind: VarKind) -> Result<VarDecl, ParseError> {
        let ident = self.expect_identifier()?;
        let init = if self.current == Token::Assign {
            self.advance()?;
            Some(self.parse_assignment_expression()?)
        } else {
            None
        };
        Ok(VarDecl { kind, ident, init })
    }

    fn parse_paren_expression(&mut self) -> Result<Expr, ParseError> {
        self.eat(&Token::LeftParen)?;
        let expr = self.parse_expression()?;
        self.eat(&Token::RightParen)?;
        Ok(expr)
    }

    fn parse_if_statement(&mut self) -> Result<StatementKind, ParseError> {
        self.advance()?; // if
        let condition = self.parse_paren_expression()?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.current == Token::Keyword(Keyword::Else) {
            self.advance()?;
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(StatementKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_loop_body(&mut self) -> Result<Box<Statement>, ParseError> {
        self.in_iteration += 1;
        let body = self.parse_statement();
        self.in_iteration -= 1;
        Ok(Box::new(body?))
    }

    fn parse_while_statement(&mut self) -> Result<StatementKind, ParseError> {
        self.advance()?; // while
        let condition = self.parse_paren_expression()?;
        let body = self.parse_loop_body()?;
        Ok(StatementKind::While { condition, body })
    }

    fn parse_do_while_statement(&mut self) -> Result<StatementKind, ParseError> {
        self.advance()?; // do
        let body = self.parse_loop_body()?;
        self.eat(&Token::Keyword(Keyword::While))?;
        let condition = self.parse_paren_expression()?;
        // The semicolon after do-while is always optional.
        if self.current == Token::Semicolon {
            self.advance()?;
        }
        Ok(StatementKind::DoWhile { body, condition })
    }

    fn parse_for_statement(&mut self) -> Result<StatementKind, ParseError> {
        self.advance()?; // for
        self.eat(&Token::LeftParen)?;

        let init = match &self.current {
            Token::Semicolon => None,
            Token::Keyword(kw @ (Keyword::Var | Keyword::Const)) => {
                let kind = if *kw == Keyword::Var {
                    VarKind::Variable
                } else {
                    VarKind::Constant
                };
                self.advance()?;
                self.no_in = true;
                let decls = self.parse_var_declaration_list(kind);
                self.no_in = false;
                let decls = decls?;
                if self.current == Token::Keyword(Keyword::In) && decls.len() == 1 {
                    self.advance()?;
                    let Some(decl) = decls.into_iter().next() else {
                        return Err(self.error("Expected a declaration before 'in'"));
                    };
                    return self.parse_for_in_rest(ForInTarget::Var(decl));
                }
                Some(ForInit::Var(decls))
            }
            _ => {
                self.no_in = true;
                let expr = self.parse_expression();
                self.no_in = false;
                let expr = expr?;
                if self.current == Token::Keyword(Keyword::In) {
                    if !expr.is_location() {
                        return Err(self.error("Left side of for-in statement is not a reference."));
                    }
                    self.advance()?;
                    return self.parse_for_in_rest(ForInTarget::Location(expr));
                }
                Some(ForInit::Expr(expr))
            }
        };

        self.eat(&Token::Semicolon)?;
        let condition = if self.current == Token::Semicolon {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.eat(&Token::Semicolon)?;
        let update = if self.current == Token::RightParen {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.eat(&Token::RightParen)?;
        let body = self.parse_loop_body()?;
        Ok(StatementKind::For {
            init,
            condition,
            update,
            body,
        })
    }

    fn parse_for_in_rest(&mut self, target: ForInTarget) -> Result<StatementKind, ParseError> {
        let object = self.parse_expression()?;
        self.eat(&Token::RightParen)?;
        let body = self.parse_loop_body()?;
        Ok(StatementKind::ForIn {
            target,
            object,
            body,
        })
    }

    fn parse_optional_label(&mut self) -> Result<Option<Identifier>, ParseError> {
        if !self.prev_line_terminator
            && let Some(label) = self.current_identifier()
        {
            if !self.labels.contains(&label) {
                return Err(self.error(format!("Label {label} not found")));
            }
            self.advance()?;
            return Ok(Some(label));
        }
        Ok(None)
    }

    fn parse_return_statement(&mut self) -> Result<StatementKind, ParseError> {
        if self.in_function == 0 {
            return Err(self.error("Return statement is not inside a function."));
        }
        self.advance()?; // return
        let value = if self.current == Token::Semicolon
            || self.current == Token::RightBrace
            || self.current == Token::Eof
            || self.prev_line_terminator
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.eat_semicolon()?;
        Ok(StatementKind::Return(value))
    }

    fn parse_break_statement(&mut self) -> Result<StatementKind, ParseError> {
        self.advance()?; // break
        let label = self.parse_optional_label()?;
        if label.is_none() && self.in_iteration == 0 && self.in_switch == 0 {
            return Err(self.error("Break statement is not inside a loop or switch."));
        }
        self.eat_semicolon()?;
        Ok(StatementKind::Break(label))
    }

    fn parse_continue_statement(&mut self) -> Result<StatementKind, ParseError> {
        self.advance()?; // continue
        if self.in_iteration == 0 {
            return Err(self.error("Continue statement is not inside a loop."));
        }
        let label = self.parse_optional_label()?;
        self.eat_semicolon()?;
        Ok(StatementKind::Continue(label))
    }

    fn parse_throw_statement(&mut self) -> Result<StatementKind, ParseError> {
        self.advance()?; // throw
        if self.prev_line_terminator {
            return Err(self.error("Illegal newline after throw"));
        }
        let value = self.parse_expression()?;
        self.eat_semicolon()?;
        Ok(StatementKind::Throw(value))
    }

    fn parse_try_statement(&mut self) -> Result<StatementKind, ParseError> {
        self.advance()?; // try
        let block = self.parse_block()?;
        let catch = if self.current == Token::Keyword(Keyword::Catch) {
            self.advance()?;
            self.eat(&Token::LeftParen)?;
            let param = self.expect_identifier()?;
            self.eat(&Token::RightParen)?;
            let body = self.parse_block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };
        let finally = if self.current == Token::Keyword(Keyword::Finally) {
            self.advance()?;
            Some(self.parse_block()?)
        } else {
            None
        };
        if catch.is_none() && finally.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }
        Ok(StatementKind::Try {
            block,
            catch,
            finally,
        })
    }

    fn parse_switch_statement(&mut self) -> Result<StatementKind, ParseError> {
        self.advance()?; // switch
        let discriminant = self.parse_paren_expression()?;
        self.eat(&Token::LeftBrace)?;
        self.in_switch += 1;
        let block = self.parse_case_block();
        self.in_switch -= 1;
        Ok(StatementKind::Switch {
            discriminant,
            block: block?,
        })
    }

    fn parse_case_block(&mut self) -> Result<CaseBlock, ParseError> {
        let mut before_default = ListBuilder::new();
        let mut after_default = ListBuilder::new();
        let mut default = None;
        while self.current != Token::RightBrace {
            match &self.current {
                Token::Keyword(Keyword::Case) => {
                    self.advance()?;
                    let test = self.parse_expression()?;
                    self.eat(&Token::Colon)?;
                    let clause = CaseClause {
                        test,
                        body: self.parse_clause_body()?,
                    };
                    if default.is_none() {
                        before_default.push(clause);
                    } else {
                        after_default.push(clause);
                    }
                }
                Token::Keyword(Keyword::Default) => {
                    if default.is_some() {
                        return Err(self.error("More than one default clause in switch statement"));
                    }
                    self.advance()?;
                    self.eat(&Token::Colon)?;
                    default = Some(self.parse_clause_body()?);
                }
                other => return Err(self.error(format!("Expected case or default, got {other:?}"))),
            }
        }
        self.advance()?; // }
        Ok(CaseBlock {
            before_default: before_default.finish(),
            default,
            after_default: after_default.finish(),
        })
    }

    fn parse_clause_body(&mut self) -> Result<SourceElements, ParseError> {
        let mut body = ListBuilder::new();
        while !matches!(
            self.current,
            Token::Keyword(Keyword::Case | Keyword::Default) | Token::RightBrace | Token::Eof
        ) {
            body.push(self.parse_statement()?);
        }
        Ok(body.finish())
    }

    fn parse_with_statement(&mut self) -> Result<StatementKind, ParseError> {
        self.advance()?; // with
        let object = self.parse_paren_expression()?;
        let body = Box::new(self.parse_statement()?);
        Ok(StatementKind::With { object, body })
    }

    /// Parameters and body after `function name?`. Labels and loop nesting
    /// do not cross a function boundary.
    pub(super) fn parse_function_rest(
        &mut self,
        name: Option<Identifier>,
        first_line: u32,
    ) -> Result<Rc<FunctionDef>, ParseError> {
        self.eat(&Token::LeftParen)?;
        let mut params = ListBuilder::new();
        while self.current != Token::RightParen {
            params.push(self.expect_identifier()?);
            if self.current != Token::RightParen {
                self.eat(&Token::Comma)?;
            }
        }
        self.advance()?; // )

        let saved_labels = std::mem::take(&mut self.labels);
        let saved_iteration = std::mem::replace(&mut self.in_iteration, 0);
        let saved_switch = std::mem::replace(&mut self.in_switch, 0);
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        self.in_function += 1;
        let body = self.parse_block();
        self.in_function -= 1;
        self.labels = saved_labels;
        self.in_iteration = saved_iteration;
        self.in_switch = saved_switch;
        self.no_in = saved_no_in;

        Ok(Rc::new(FunctionDef {
            name,
            params: params.finish(),
            body: body?,
            loc: StatementLoc {
                first_line,
                last_line: self.prev_line,
                source_id: self.source_id,
            },
        }))
    }
}

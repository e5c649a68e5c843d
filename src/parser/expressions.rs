use super::*;

impl<'a> Parser<'a> {
    pub(super) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let mut left = self.parse_assignment_expression()?;
        while self.current == Token::Comma {
            self.advance()?;
            let right = self.parse_assignment_expression()?;
            left = Expr::new(
                ExprKind::Comma {
                    left: Box::new(left),
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(left)
    }

    fn assignment_operator(&self) -> Option<AssignOp> {
        Some(match self.current {
            Token::Assign => AssignOp::Assign,
            Token::PlusAssign => AssignOp::AddAssign,
            Token::MinusAssign => AssignOp::SubAssign,
            Token::StarAssign => AssignOp::MulAssign,
            Token::SlashAssign => AssignOp::DivAssign,
            Token::PercentAssign => AssignOp::ModAssign,
            Token::LeftShiftAssign => AssignOp::LShiftAssign,
            Token::RightShiftAssign => AssignOp::RShiftAssign,
            Token::UnsignedRightShiftAssign => AssignOp::URShiftAssign,
            Token::AmpersandAssign => AssignOp::BitAndAssign,
            Token::CaretAssign => AssignOp::BitXorAssign,
            Token::PipeAssign => AssignOp::BitOrAssign,
            _ => return None,
        })
    }

    pub(super) fn parse_assignment_expression(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let left = self.parse_conditional_expression()?;
        if let Some(op) = self.assignment_operator() {
            self.advance()?;
            let value = self.parse_assignment_expression()?;
            return self.make_assign_node(left, op, value, line);
        }
        Ok(left)
    }

    fn parse_conditional_expression(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let condition = self.parse_logical_or()?;
        if self.current != Token::Question {
            return Ok(condition);
        }
        self.advance()?;
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let then_expr = self.parse_assignment_expression();
        self.no_in = saved_no_in;
        let then_expr = then_expr?;
        self.eat(&Token::Colon)?;
        let else_expr = self.parse_assignment_expression()?;
        Ok(Expr::new(
            ExprKind::Conditional {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            line,
        ))
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let mut left = self.parse_logical_and()?;
        while self.current == Token::LogicalOr {
            self.advance()?;
            let right = self.parse_logical_and()?;
            left = Self::binary_logical(LogicalOp::Or, left, right, line);
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let mut left = self.parse_bitwise_or()?;
        while self.current == Token::LogicalAnd {
            self.advance()?;
            let right = self.parse_bitwise_or()?;
            left = Self::binary_logical(LogicalOp::And, left, right, line);
        }
        Ok(left)
    }

    fn binary_logical(op: LogicalOp, left: Expr, right: Expr, line: u32) -> Expr {
        Expr::new(
            ExprKind::BinaryLogical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            line,
        )
    }

    fn parse_bitwise_or(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let mut left = self.parse_bitwise_xor()?;
        while self.current == Token::Pipe {
            self.advance()?;
            let right = self.parse_bitwise_xor()?;
            left = Self::bit_oper(BitOp::Or, left, right, line);
        }
        Ok(left)
    }

    fn parse_bitwise_xor(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let mut left = self.parse_bitwise_and()?;
        while self.current == Token::Caret {
            self.advance()?;
            let right = self.parse_bitwise_and()?;
            left = Self::bit_oper(BitOp::Xor, left, right, line);
        }
        Ok(left)
    }

    fn parse_bitwise_and(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let mut left = self.parse_equality()?;
        while self.current == Token::Ampersand {
            self.advance()?;
            let right = self.parse_equality()?;
            left = Self::bit_oper(BitOp::And, left, right, line);
        }
        Ok(left)
    }

    fn bit_oper(op: BitOp, left: Expr, right: Expr, line: u32) -> Expr {
        Expr::new(
            ExprKind::BitOper {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            line,
        )
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let mut left = self.parse_relational()?;
        loop {
            let op = match &self.current {
                Token::Equal => EqualityOp::Eq,
                Token::NotEqual => EqualityOp::NotEq,
                Token::StrictEqual => EqualityOp::StrictEq,
                Token::StrictNotEqual => EqualityOp::StrictNotEq,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_relational()?;
            left = Expr::new(
                ExprKind::Equal {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let mut left = self.parse_shift()?;
        loop {
            let op = match &self.current {
                Token::LessThan => RelationalOp::Lt,
                Token::GreaterThan => RelationalOp::Gt,
                Token::LessThanEqual => RelationalOp::LtEq,
                Token::GreaterThanEqual => RelationalOp::GtEq,
                Token::Keyword(Keyword::Instanceof) => RelationalOp::InstanceOf,
                Token::Keyword(Keyword::In) if !self.no_in => RelationalOp::In,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_shift()?;
            left = Expr::new(
                ExprKind::Relational {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let mut left = self.parse_additive()?;
        loop {
            let op = match &self.current {
                Token::LeftShift => ShiftOp::LShift,
                Token::RightShift => ShiftOp::RShift,
                Token::UnsignedRightShift => ShiftOp::URShift,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_additive()?;
            left = Expr::new(
                ExprKind::Shift {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match &self.current {
                Token::Plus => AddOp::Add,
                Token::Minus => AddOp::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Expr::new(
                ExprKind::Add {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let mut left = self.parse_unary()?;
        loop {
            let op = match &self.current {
                Token::Star => MultOp::Mul,
                Token::Slash => MultOp::Div,
                Token::Percent => MultOp::Mod,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = Expr::new(
                ExprKind::Mult {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let wrap = |kind: fn(Box<Expr>) -> ExprKind, operand: Expr| {
            Expr::new(kind(Box::new(operand)), line)
        };
        match &self.current {
            Token::Keyword(Keyword::Delete) => {
                self.advance()?;
                let operand = self.parse_unary()?;
                Ok(Self::make_delete_node(operand, line))
            }
            Token::Keyword(Keyword::Typeof) => {
                self.advance()?;
                let operand = self.parse_unary()?;
                Ok(Self::make_typeof_node(operand, line))
            }
            Token::Keyword(Keyword::Void) => {
                self.advance()?;
                Ok(wrap(ExprKind::Void, self.parse_unary()?))
            }
            Token::Increment | Token::Decrement => {
                let op = if self.current == Token::Increment {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                self.advance()?;
                let operand = self.parse_unary()?;
                self.make_prefix_node(operand, op, line)
            }
            Token::Plus => {
                self.advance()?;
                Ok(wrap(ExprKind::UnaryPlus, self.parse_unary()?))
            }
            Token::Minus => {
                self.advance()?;
                Ok(wrap(ExprKind::Negate, self.parse_unary()?))
            }
            Token::Tilde => {
                self.advance()?;
                Ok(wrap(ExprKind::BitwiseNot, self.parse_unary()?))
            }
            Token::Bang => {
                self.advance()?;
                Ok(wrap(ExprKind::LogicalNot, self.parse_unary()?))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let expr = self.parse_left_hand_side_expression()?;
        if !self.prev_line_terminator {
            let op = match self.current {
                Token::Increment => Some(UpdateOp::Increment),
                Token::Decrement => Some(UpdateOp::Decrement),
                _ => None,
            };
            if let Some(op) = op {
                self.advance()?;
                return self.make_postfix_node(expr, op, line);
            }
        }
        Ok(expr)
    }

    // §11.2.1: the name after `.` is an Identifier, so reserved words are out
    fn parse_dot_member_name(&mut self) -> Result<Identifier, ParseError> {
        match &self.current {
            Token::Keyword(kw) => Err(self.error(format!("Unexpected keyword '{kw}' after '.'"))),
            Token::BooleanLiteral(_) | Token::NullLiteral => {
                Err(self.error("Unexpected literal after '.'"))
            }
            _ => self.expect_identifier(),
        }
    }

    /// MemberExpression, including `new` with optional arguments, without
    /// trailing call suffixes.
    fn parse_member_expression(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let mut expr = if self.current == Token::Keyword(Keyword::New) {
            self.advance()?;
            let callee = self.parse_member_expression()?;
            let args = if self.current == Token::LeftParen {
                Some(self.parse_arguments()?)
            } else {
                None
            };
            Expr::new(
                ExprKind::New {
                    callee: Box::new(callee),
                    args,
                },
                line,
            )
        } else {
            self.parse_primary_expression()?
        };
        loop {
            expr = match &self.current {
                Token::Dot => {
                    self.advance()?;
                    let ident = self.parse_dot_member_name()?;
                    Expr::new(
                        ExprKind::DotAccessor {
                            base: Box::new(expr),
                            ident,
                        },
                        line,
                    )
                }
                Token::LeftBracket => {
                    let subscript = self.parse_subscript()?;
                    Expr::new(
                        ExprKind::BracketAccessor {
                            base: Box::new(expr),
                            subscript: Box::new(subscript),
                        },
                        line,
                    )
                }
                _ => return Ok(expr),
            };
        }
    }

    fn parse_subscript(&mut self) -> Result<Expr, ParseError> {
        self.advance()?; // [
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let subscript = self.parse_expression();
        self.no_in = saved_no_in;
        let subscript = subscript?;
        self.eat(&Token::RightBracket)?;
        Ok(subscript)
    }

    fn parse_left_hand_side_expression(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let mut expr = self.parse_member_expression()?;
        loop {
            expr = match &self.current {
                Token::Dot => {
                    self.advance()?;
                    let ident = self.parse_dot_member_name()?;
                    Expr::new(
                        ExprKind::DotAccessor {
                            base: Box::new(expr),
                            ident,
                        },
                        line,
                    )
                }
                Token::LeftBracket => {
                    let subscript = self.parse_subscript()?;
                    Expr::new(
                        ExprKind::BracketAccessor {
                            base: Box::new(expr),
                            subscript: Box::new(subscript),
                        },
                        line,
                    )
                }
                Token::LeftParen => {
                    let args = self.parse_arguments()?;
                    Self::make_call_node(expr, args, line)
                }
                _ => return Ok(expr),
            };
        }
    }

    fn parse_arguments(&mut self) -> Result<Arguments, ParseError> {
        self.eat(&Token::LeftParen)?;
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let args = self.parse_argument_list();
        self.no_in = saved_no_in;
        args
    }

    fn parse_argument_list(&mut self) -> Result<Arguments, ParseError> {
        let mut args = ListBuilder::new();
        while self.current != Token::RightParen {
            args.push(self.parse_assignment_expression()?);
            if self.current != Token::RightParen {
                self.eat(&Token::Comma)?;
            }
        }
        self.advance()?; // )
        Ok(args.finish())
    }

    fn parse_primary_expression(&mut self) -> Result<Expr, ParseError> {
        let line = self.current_line;
        let kind = match &self.current {
            Token::Keyword(Keyword::This) => ExprKind::This,
            Token::NullLiteral => ExprKind::Null,
            Token::BooleanLiteral(b) => ExprKind::Boolean(*b),
            Token::NumericLiteral(n) => ExprKind::Number(*n),
            Token::StringLiteral(s) => ExprKind::String(s.clone()),
            Token::Identifier(_) => {
                let ident = self.expect_identifier()?;
                return Ok(Expr::new(ExprKind::Resolve(ident), line));
            }
            Token::Slash | Token::SlashAssign => return self.parse_regex_literal(line),
            Token::LeftParen => {
                self.advance()?;
                let saved_no_in = std::mem::replace(&mut self.no_in, false);
                let inner = self.parse_expression();
                self.no_in = saved_no_in;
                let inner = inner?;
                self.eat(&Token::RightParen)?;
                return Ok(Expr::new(ExprKind::Group(Box::new(inner)), line));
            }
            Token::LeftBracket => return self.parse_array_literal(line),
            Token::LeftBrace => return self.parse_object_literal(line),
            Token::Keyword(Keyword::Function) => {
                self.advance()?;
                let name = self.current_identifier();
                if name.is_some() {
                    self.advance()?;
                }
                let def = self.parse_function_rest(name, line)?;
                return Ok(Expr::new(ExprKind::FuncExpr(def), line));
            }
            other => return Err(self.error(format!("Unexpected token {other:?}"))),
        };
        self.advance()?;
        Ok(Expr::new(kind, line))
    }

    /// The lexer saw `/` or `/=` where an operand belongs; re-scan the rest
    /// as a regular expression literal.
    fn parse_regex_literal(&mut self, line: u32) -> Result<Expr, ParseError> {
        let prefix = if self.current == Token::SlashAssign {
            "="
        } else {
            ""
        };
        let Token::RegExpLiteral { pattern, flags } = self.lexer.lex_regex()? else {
            return Err(self.error("Expected regular expression literal"));
        };
        let pattern = format!("{prefix}{pattern}");
        // Step past the literal, which was never installed as current.
        self.current = Token::Semicolon;
        self.current_line = line;
        self.advance()?;
        Ok(Expr::new(ExprKind::RegExp { pattern, flags }, line))
    }

    fn parse_array_literal(&mut self, line: u32) -> Result<Expr, ParseError> {
        self.advance()?; // [
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let result = self.parse_element_list();
        self.no_in = saved_no_in;
        let (elements, trailing_elision) = result?;
        Ok(Expr::new(
            ExprKind::Array {
                elements,
                trailing_elision,
            },
            line,
        ))
    }

    fn parse_element_list(&mut self) -> Result<(NodeList<Element>, u32), ParseError> {
        let mut elements = ListBuilder::new();
        let mut elision = 0;
        loop {
            match self.current {
                Token::RightBracket => {
                    self.advance()?;
                    return Ok((elements.finish(), elision));
                }
                Token::Comma => {
                    self.advance()?;
                    elision += 1;
                }
                _ => {
                    let value = self.parse_assignment_expression()?;
                    elements.push(Element { elision, value });
                    elision = 0;
                    if self.current == Token::Comma {
                        self.advance()?;
                    } else if self.current != Token::RightBracket {
                        return Err(self.error(format!("Expected ',' or ']', got {:?}", self.current)));
                    }
                }
            }
        }
    }

    fn parse_object_literal(&mut self, line: u32) -> Result<Expr, ParseError> {
        self.advance()?; // {
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let props = self.parse_property_list();
        self.no_in = saved_no_in;
        Ok(Expr::new(ExprKind::Object(props?), line))
    }

    fn parse_property_list(&mut self) -> Result<NodeList<PropertyValue>, ParseError> {
        let mut props = ListBuilder::new();
        while self.current != Token::RightBrace {
            let name = match &self.current {
                Token::Identifier(n) => PropertyName::Identifier(Identifier::new(n)),
                Token::Keyword(kw) => PropertyName::Identifier(Identifier::from(kw.to_string())),
                Token::StringLiteral(s) => PropertyName::String(s.clone()),
                Token::NumericLiteral(n) => PropertyName::Number(*n),
                other => return Err(self.error(format!("Unexpected token {other:?} in object literal"))),
            };
            self.advance()?;
            self.eat(&Token::Colon)?;
            let value = self.parse_assignment_expression()?;
            props.push(PropertyValue { name, value });
            if self.current != Token::RightBrace {
                self.eat(&Token::Comma)?;
            }
        }
        self.advance()?; // }
        Ok(props.finish())
    }
}

use crate::types::JsString;
use std::fmt;
use std::str::Chars;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    // Identifiers and keywords
    Identifier(String),
    Keyword(Keyword),

    // Literals
    NumericLiteral(f64),
    StringLiteral(JsString),
    BooleanLiteral(bool),
    NullLiteral,
    RegExpLiteral { pattern: String, flags: String },

    // Grouping and separators: { } ( ) [ ] . ; , ? :
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Dot,
    Semicolon,
    Comma,
    Question,
    Colon,

    // Relational and equality
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,

    // Arithmetic, shifts and bitwise
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Increment,
    Decrement,
    LeftShift,
    RightShift,
    UnsignedRightShift,
    Ampersand,
    Pipe,
    Caret,
    Tilde,

    // Logical
    Bang,
    LogicalAnd,
    LogicalOr,

    // Assignment, `=` and the eleven compound forms
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    LeftShiftAssign,
    RightShiftAssign,
    UnsignedRightShiftAssign,
    AmpersandAssign,
    PipeAssign,
    CaretAssign,

    // Special
    LineTerminator,
    Eof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Break,
    Case,
    Catch,
    Const,
    Continue,
    Default,
    Delete,
    Do,
    Else,
    Finally,
    For,
    Function,
    If,
    In,
    Instanceof,
    New,
    Return,
    Switch,
    This,
    Throw,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
}

// ES3 §7.5.2 plus `const`
const KEYWORDS: [(&str, Keyword); 26] = [
    ("break", Keyword::Break),
    ("case", Keyword::Case),
    ("catch", Keyword::Catch),
    ("const", Keyword::Const),
    ("continue", Keyword::Continue),
    ("default", Keyword::Default),
    ("delete", Keyword::Delete),
    ("do", Keyword::Do),
    ("else", Keyword::Else),
    ("finally", Keyword::Finally),
    ("for", Keyword::For),
    ("function", Keyword::Function),
    ("if", Keyword::If),
    ("in", Keyword::In),
    ("instanceof", Keyword::Instanceof),
    ("new", Keyword::New),
    ("return", Keyword::Return),
    ("switch", Keyword::Switch),
    ("this", Keyword::This),
    ("throw", Keyword::Throw),
    ("try", Keyword::Try),
    ("typeof", Keyword::Typeof),
    ("var", Keyword::Var),
    ("void", Keyword::Void),
    ("while", Keyword::While),
    ("with", Keyword::With),
];

impl Keyword {
    pub fn from_str(s: &str) -> Option<Keyword> {
        KEYWORDS
            .iter()
            .find(|(text, _)| *text == s)
            .map(|&(_, keyword)| keyword)
    }

    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, keyword)| *keyword == self)
            .map_or("", |&(text, _)| text)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

#[derive(Clone, Debug, Error)]
#[error("{}:{}: {message}", .location.line, .location.column)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

pub struct Lexer<'a> {
    chars: Chars<'a>,
    current: Option<char>,
    offset: usize,
    line: u32,
    column: u32,
    token_line: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.chars();
        let current = chars.next();
        Self {
            chars,
            current,
            offset: 0,
            line: 1,
            column: 0,
            token_line: 1,
        }
    }

    /// Line on which the most recently returned token started.
    pub fn token_line(&self) -> u32 {
        self.token_line
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    fn peek(&self) -> Option<char> {
        self.current
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current;
        if let Some(c) = ch {
            self.offset += c.len_utf8();
            self.column += 1;
            self.current = self.chars.next();
        }
        ch
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            location: self.location(),
        }
    }

    fn is_line_terminator(ch: char) -> bool {
        matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
    }

    fn is_whitespace(ch: char) -> bool {
        matches!(
            ch,
            '\t' | '\u{000B}' | '\u{000C}' | ' ' | '\u{00A0}' | '\u{FEFF}'
        ) || ch.is_whitespace() && !Self::is_line_terminator(ch)
    }

    fn is_identifier_start(ch: char) -> bool {
        ch == '_' || ch == '$' || ch.is_ascii_alphabetic() || unicode_id_start(ch)
    }

    fn is_identifier_continue(ch: char) -> bool {
        ch == '_' || ch == '$' || ch.is_ascii_alphanumeric() || unicode_id_continue(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if Self::is_whitespace(ch) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if Self::is_line_terminator(ch) {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<bool, LexError> {
        let mut has_line_terminator = false;
        loop {
            match self.advance() {
                Some('*') => {
                    if self.peek() == Some('/') {
                        self.advance();
                        return Ok(has_line_terminator);
                    }
                }
                Some(ch) if Self::is_line_terminator(ch) => {
                    has_line_terminator = true;
                    self.handle_newline(ch);
                }
                Some(_) => {}
                None => return Err(self.error("Unterminated block comment")),
            }
        }
    }

    fn handle_newline(&mut self, ch: char) {
        if ch == '\r' && self.peek() == Some('\n') {
            self.advance();
        }
        self.line += 1;
        self.column = 0;
    }

    fn read_string(&mut self, quote: char) -> Result<JsString, LexError> {
        let mut units: Vec<u16> = Vec::new();
        loop {
            match self.advance() {
                None => return Err(self.error("Unterminated string literal")),
                Some(ch) if ch == quote => return Ok(JsString::from_code_units(units)),
                Some(ch) if Self::is_line_terminator(ch) => {
                    return Err(self.error("Unterminated string literal"));
                }
                Some('\\') => self.read_escape_sequence(&mut units)?,
                Some(ch) => {
                    let mut buf = [0u16; 2];
                    units.extend_from_slice(ch.encode_utf16(&mut buf));
                }
            }
        }
    }

    fn read_escape_sequence(&mut self, units: &mut Vec<u16>) -> Result<(), LexError> {
        let unit = match self.advance() {
            None => return Err(self.error("Unterminated escape sequence")),
            Some('n') => 0x0A,
            Some('r') => 0x0D,
            Some('t') => 0x09,
            Some('b') => 0x08,
            Some('f') => 0x0C,
            Some('v') => 0x0B,
            Some(ch @ '0'..='7') => {
                let mut val = ch as u32 - '0' as u32;
                if let Some(d) = self.peek().and_then(octal_val) {
                    self.advance();
                    val = val * 8 + d;
                    if ch <= '3'
                        && let Some(d) = self.peek().and_then(octal_val)
                    {
                        self.advance();
                        val = val * 8 + d;
                    }
                }
                val as u16
            }
            Some('x') => self.read_hex_digits(2)?,
            Some('u') => self.read_hex_digits(4)?,
            Some(ch) if Self::is_line_terminator(ch) => {
                // Line continuation contributes nothing.
                self.handle_newline(ch);
                return Ok(());
            }
            Some(ch) => {
                let mut buf = [0u16; 2];
                units.extend_from_slice(ch.encode_utf16(&mut buf));
                return Ok(());
            }
        };
        units.push(unit);
        Ok(())
    }

    fn read_hex_digits(&mut self, count: usize) -> Result<u16, LexError> {
        let mut val: u32 = 0;
        for _ in 0..count {
            let d = self
                .advance()
                .and_then(hex_val)
                .ok_or_else(|| self.error("Invalid escape sequence"))?;
            val = val * 16 + d;
        }
        Ok(val as u16)
    }

    fn read_numeric_literal(&mut self, first: char) -> Result<Token, LexError> {
        let mut s = String::new();
        s.push(first);

        if first == '0' {
            match self.peek() {
                Some('x' | 'X') => return self.read_hex_literal(),
                Some(c) if c.is_ascii_digit() => {
                    return self.read_legacy_octal_or_decimal(s);
                }
                _ => {}
            }
        }

        self.read_decimal_digits(&mut s);
        if first != '.' && self.peek() == Some('.') {
            s.push('.');
            self.advance();
            self.read_decimal_digits(&mut s);
        }
        self.read_exponent(&mut s)?;

        if self.peek().is_some_and(Self::is_identifier_start) {
            return Err(self.error("Identifier starts immediately after numeric literal"));
        }
        let val: f64 = s
            .parse()
            .map_err(|_| self.error("Invalid numeric literal"))?;
        Ok(Token::NumericLiteral(val))
    }

    fn read_decimal_digits(&mut self, s: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                s.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_exponent(&mut self, s: &mut String) -> Result<(), LexError> {
        if let Some(e @ ('e' | 'E')) = self.peek() {
            s.push(e);
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                s.push(sign);
                self.advance();
            }
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error("Invalid numeric literal"));
            }
            self.read_decimal_digits(s);
        }
        Ok(())
    }

    fn read_hex_literal(&mut self) -> Result<Token, LexError> {
        self.advance(); // x/X
        let mut val = 0f64;
        let mut digits = 0;
        while let Some(d) = self.peek().and_then(hex_val) {
            val = val * 16.0 + f64::from(d);
            digits += 1;
            self.advance();
        }
        if digits == 0 {
            return Err(self.error("Invalid hex literal"));
        }
        Ok(Token::NumericLiteral(val))
    }

    fn read_legacy_octal_or_decimal(&mut self, mut s: String) -> Result<Token, LexError> {
        let mut is_octal = true;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                if ch >= '8' {
                    is_octal = false;
                }
                s.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        if is_octal && !matches!(self.peek(), Some('.' | 'e' | 'E')) {
            let val = s[1..]
                .chars()
                .filter_map(octal_val)
                .fold(0f64, |acc, d| acc * 8.0 + f64::from(d));
            return Ok(Token::NumericLiteral(val));
        }
        if self.peek() == Some('.') {
            s.push('.');
            self.advance();
            self.read_decimal_digits(&mut s);
        }
        self.read_exponent(&mut s)?;
        let val: f64 = s.parse().map_err(|_| self.error("Invalid numeric literal"))?;
        Ok(Token::NumericLiteral(val))
    }

    fn read_identifier(&mut self, first: char) -> Result<Token, LexError> {
        let mut name = String::new();
        name.push(first);
        while let Some(ch) = self.peek() {
            if Self::is_identifier_continue(ch) {
                name.push(ch);
                self.advance();
            } else if ch == '\\' {
                self.advance();
                name.push(self.read_identifier_escape()?);
            } else {
                break;
            }
        }

        Ok(match name.as_str() {
            "true" => Token::BooleanLiteral(true),
            "false" => Token::BooleanLiteral(false),
            "null" => Token::NullLiteral,
            _ => match Keyword::from_str(&name) {
                Some(kw) => Token::Keyword(kw),
                None => Token::Identifier(name),
            },
        })
    }

    fn read_identifier_escape(&mut self) -> Result<char, LexError> {
        if self.advance() != Some('u') {
            return Err(self.error("Invalid identifier escape"));
        }
        let unit = self.read_hex_digits(4)?;
        char::from_u32(u32::from(unit))
            .filter(|&c| Self::is_identifier_continue(c))
            .ok_or_else(|| self.error("Invalid identifier escape"))
    }

    /// Re-lex from just after a `/` the parser has already consumed, in a
    /// position where a regular expression literal is expected.
    pub fn lex_regex(&mut self) -> Result<Token, LexError> {
        let mut pattern = String::new();
        let mut in_class = false;
        loop {
            match self.peek() {
                None => return Err(self.error("Unterminated regular expression")),
                Some(ch) if Self::is_line_terminator(ch) => {
                    return Err(self.error("Unterminated regular expression"));
                }
                Some('/') if !in_class => {
                    self.advance();
                    break;
                }
                Some(ch) => {
                    self.advance();
                    pattern.push(ch);
                    match ch {
                        '[' => in_class = true,
                        ']' => in_class = false,
                        '\\' => {
                            if let Some(esc) = self.peek()
                                && !Self::is_line_terminator(esc)
                            {
                                self.advance();
                                pattern.push(esc);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        let mut flags = String::new();
        while let Some(c) = self.peek() {
            if Self::is_identifier_continue(c) {
                flags.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Ok(Token::RegExpLiteral { pattern, flags })
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            self.skip_whitespace();
            self.token_line = self.line;

            let ch = match self.peek() {
                None => return Ok(Token::Eof),
                Some(ch) => ch,
            };

            if Self::is_line_terminator(ch) {
                self.advance();
                self.handle_newline(ch);
                return Ok(Token::LineTerminator);
            }

            if ch == '/' {
                if self.peek_next() == Some('/') {
                    self.advance();
                    self.advance();
                    self.skip_line_comment();
                    continue;
                }
                if self.peek_next() == Some('*') {
                    self.advance();
                    self.advance();
                    if self.skip_block_comment()? {
                        return Ok(Token::LineTerminator);
                    }
                    continue;
                }
            }

            self.advance();

            if ch == '\'' || ch == '"' {
                return Ok(Token::StringLiteral(self.read_string(ch)?));
            }
            if ch.is_ascii_digit() {
                return self.read_numeric_literal(ch);
            }
            if ch == '.' && self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return self.read_numeric_literal(ch);
            }
            if Self::is_identifier_start(ch) {
                return self.read_identifier(ch);
            }
            if ch == '\\' {
                let first = self.read_identifier_escape()?;
                return self.read_identifier(first);
            }
            return self.read_punctuator(ch);
        }
    }

    fn read_punctuator(&mut self, ch: char) -> Result<Token, LexError> {
        match ch {
            '{' => Ok(Token::LeftBrace),
            '}' => Ok(Token::RightBrace),
            '(' => Ok(Token::LeftParen),
            ')' => Ok(Token::RightParen),
            '[' => Ok(Token::LeftBracket),
            ']' => Ok(Token::RightBracket),
            ';' => Ok(Token::Semicolon),
            ',' => Ok(Token::Comma),
            '~' => Ok(Token::Tilde),
            ':' => Ok(Token::Colon),
            '?' => Ok(Token::Question),
            '.' => Ok(Token::Dot),

            '<' => {
                if self.eat_char('<') {
                    Ok(self.with_assign(Token::LeftShift, Token::LeftShiftAssign))
                } else if self.eat_char('=') {
                    Ok(Token::LessThanEqual)
                } else {
                    Ok(Token::LessThan)
                }
            }

            '>' => {
                if self.eat_char('>') {
                    if self.eat_char('>') {
                        Ok(self.with_assign(
                            Token::UnsignedRightShift,
                            Token::UnsignedRightShiftAssign,
                        ))
                    } else {
                        Ok(self.with_assign(Token::RightShift, Token::RightShiftAssign))
                    }
                } else if self.eat_char('=') {
                    Ok(Token::GreaterThanEqual)
                } else {
                    Ok(Token::GreaterThan)
                }
            }

            '=' => {
                if self.eat_char('=') {
                    Ok(self.with_assign(Token::Equal, Token::StrictEqual))
                } else {
                    Ok(Token::Assign)
                }
            }

            '!' => {
                if self.eat_char('=') {
                    Ok(self.with_assign(Token::NotEqual, Token::StrictNotEqual))
                } else {
                    Ok(Token::Bang)
                }
            }

            '+' => {
                if self.eat_char('+') {
                    Ok(Token::Increment)
                } else {
                    Ok(self.with_assign(Token::Plus, Token::PlusAssign))
                }
            }

            '-' => {
                if self.eat_char('-') {
                    Ok(Token::Decrement)
                } else {
                    Ok(self.with_assign(Token::Minus, Token::MinusAssign))
                }
            }

            '&' => {
                if self.eat_char('&') {
                    Ok(Token::LogicalAnd)
                } else {
                    Ok(self.with_assign(Token::Ampersand, Token::AmpersandAssign))
                }
            }

            '|' => {
                if self.eat_char('|') {
                    Ok(Token::LogicalOr)
                } else {
                    Ok(self.with_assign(Token::Pipe, Token::PipeAssign))
                }
            }

            '*' => Ok(self.with_assign(Token::Star, Token::StarAssign)),
            '/' => Ok(self.with_assign(Token::Slash, Token::SlashAssign)),
            '%' => Ok(self.with_assign(Token::Percent, Token::PercentAssign)),
            '^' => Ok(self.with_assign(Token::Caret, Token::CaretAssign)),

            _ => Err(self.error(format!("Unexpected character: {ch}"))),
        }
    }

    fn eat_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    // `op` or `op=` depending on a trailing '='
    fn with_assign(&mut self, plain: Token, assign: Token) -> Token {
        if self.eat_char('=') { assign } else { plain }
    }

    pub fn tokenize_all(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if token == Token::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }
}

fn hex_val(ch: char) -> Option<u32> {
    ch.to_digit(16)
}

fn octal_val(ch: char) -> Option<u32> {
    ch.to_digit(8)
}

fn unicode_id_start(ch: char) -> bool {
    !ch.is_ascii() && unicode_ident::is_xid_start(ch)
}

fn unicode_id_continue(ch: char) -> bool {
    !ch.is_ascii() && unicode_ident::is_xid_continue(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        lexer.tokenize_all().unwrap()
    }

    fn lex_no_lt(src: &str) -> Vec<Token> {
        lex(src)
            .into_iter()
            .filter(|t| !matches!(t, Token::LineTerminator))
            .collect()
    }

    fn string(s: &str) -> Token {
        Token::StringLiteral(JsString::from_str(s))
    }

    #[test]
    fn empty_source() {
        assert_eq!(lex(""), vec![Token::Eof]);
    }

    #[test]
    fn identifiers_and_keywords() {
        assert_eq!(
            lex_no_lt("var x = 42;"),
            vec![
                Token::Keyword(Keyword::Var),
                Token::Identifier("x".into()),
                Token::Assign,
                Token::NumericLiteral(42.0),
                Token::Semicolon,
                Token::Eof,
            ]
        );
        assert_eq!(
            lex_no_lt("let class"),
            vec![
                Token::Identifier("let".into()),
                Token::Identifier("class".into()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn string_literals() {
        assert_eq!(lex_no_lt(r#""hello""#), vec![string("hello"), Token::Eof]);
        assert_eq!(lex_no_lt(r"'he\nllo'"), vec![string("he\nllo"), Token::Eof]);
        assert_eq!(lex_no_lt(r#""\x41\101B""#), vec![string("AAB"), Token::Eof]);
        assert_eq!(lex_no_lt("'a\\\nb'"), vec![string("ab"), Token::Eof]);
    }

    #[test]
    fn lone_surrogate_escape_is_preserved() {
        let tokens = lex_no_lt(r#""\uD800""#);
        assert_eq!(
            tokens[0],
            Token::StringLiteral(JsString::from_code_units(vec![0xD800]))
        );
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(lex_no_lt("0xff"), vec![Token::NumericLiteral(255.0), Token::Eof]);
        assert_eq!(lex_no_lt("017"), vec![Token::NumericLiteral(15.0), Token::Eof]);
        assert_eq!(lex_no_lt("019"), vec![Token::NumericLiteral(19.0), Token::Eof]);
        assert_eq!(lex_no_lt("1e3"), vec![Token::NumericLiteral(1000.0), Token::Eof]);
        assert_eq!(lex_no_lt(".5"), vec![Token::NumericLiteral(0.5), Token::Eof]);
        assert_eq!(lex_no_lt("2.5E-1"), vec![Token::NumericLiteral(0.25), Token::Eof]);
        assert!(Lexer::new("3in").tokenize_all().is_err());
    }

    #[test]
    fn boolean_null() {
        assert_eq!(
            lex_no_lt("true false null"),
            vec![
                Token::BooleanLiteral(true),
                Token::BooleanLiteral(false),
                Token::NullLiteral,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn punctuators() {
        assert_eq!(lex_no_lt("==="), vec![Token::StrictEqual, Token::Eof]);
        assert_eq!(lex_no_lt("!=="), vec![Token::StrictNotEqual, Token::Eof]);
        assert_eq!(
            lex_no_lt(">>>="),
            vec![Token::UnsignedRightShiftAssign, Token::Eof]
        );
        assert_eq!(
            lex_no_lt("a+++b"),
            vec![
                Token::Identifier("a".into()),
                Token::Increment,
                Token::Plus,
                Token::Identifier("b".into()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn comments_and_line_terminators() {
        assert_eq!(
            lex_no_lt("// comment\n42"),
            vec![Token::NumericLiteral(42.0), Token::Eof]
        );
        assert_eq!(
            lex("/* a\nb */ 42"),
            vec![Token::LineTerminator, Token::NumericLiteral(42.0), Token::Eof]
        );
        assert_eq!(lex("/* ab */ 42"), vec![Token::NumericLiteral(42.0), Token::Eof]);
    }

    #[test]
    fn token_lines_are_tracked() {
        let mut lexer = Lexer::new("a\n\nb");
        assert_eq!(lexer.next_token().unwrap(), Token::Identifier("a".into()));
        assert_eq!(lexer.token_line(), 1);
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        assert_eq!(lexer.next_token().unwrap(), Token::Identifier("b".into()));
        assert_eq!(lexer.token_line(), 3);
    }

    #[test]
    fn regex_relex_after_slash() {
        let mut lexer = Lexer::new("/a[/]b\\//gi;");
        assert_eq!(lexer.next_token().unwrap(), Token::Slash);
        assert_eq!(
            lexer.lex_regex().unwrap(),
            Token::RegExpLiteral {
                pattern: "a[/]b\\/".into(),
                flags: "gi".into()
            }
        );
        assert_eq!(lexer.next_token().unwrap(), Token::Semicolon);
    }

    #[test]
    fn unterminated_string_reports_location() {
        let err = Lexer::new("\n'abc").tokenize_all().unwrap_err();
        assert_eq!(err.location.line, 2);
        assert_eq!(err.to_string(), "2:4: Unterminated string literal");
    }
}

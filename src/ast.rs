use crate::types::JsString;
use std::borrow::Borrow;
use std::fmt;
use std::rc::Rc;

pub mod list;
pub mod stream;

pub use list::{ListBuilder, NodeList};

/// Interned-by-refcount identifier. Clones are cheap and compare by content.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Rc<str>);

impl Identifier {
    pub fn new(name: &str) -> Self {
        Identifier(Rc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier::new(name)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Identifier(Rc::from(name))
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

/// Identifies the compilation unit a node came from, for multi-source hosts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SourceId(pub u32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatementLoc {
    pub first_line: u32,
    pub last_line: u32,
    pub source_id: SourceId,
}

pub type SourceElements = NodeList<Statement>;
pub type Arguments = NodeList<Expr>;

#[derive(Debug)]
pub struct Program {
    pub body: SourceElements,
    pub source_id: SourceId,
}

#[derive(Debug)]
pub struct FunctionDef {
    pub name: Option<Identifier>,
    pub params: NodeList<Identifier>,
    pub body: SourceElements,
    pub loc: StatementLoc,
}

#[derive(Debug)]
pub struct Statement {
    pub kind: StatementKind,
    pub loc: StatementLoc,
}

#[derive(Debug)]
pub enum StatementKind {
    Empty,
    Expr(Expr),
    Var(NodeList<VarDecl>),
    Block(SourceElements),
    If {
        condition: Expr,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    DoWhile {
        body: Box<Statement>,
        condition: Expr,
    },
    While {
        condition: Expr,
        body: Box<Statement>,
    },
    For {
        init: Option<ForInit>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Box<Statement>,
    },
    ForIn {
        target: ForInTarget,
        object: Expr,
        body: Box<Statement>,
    },
    Continue(Option<Identifier>),
    Break(Option<Identifier>),
    Return(Option<Expr>),
    With {
        object: Expr,
        body: Box<Statement>,
    },
    Switch {
        discriminant: Expr,
        block: CaseBlock,
    },
    Label {
        label: Identifier,
        body: Box<Statement>,
    },
    Throw(Expr),
    Try {
        block: SourceElements,
        catch: Option<CatchClause>,
        finally: Option<SourceElements>,
    },
    FuncDecl(Rc<FunctionDef>),
}

impl StatementKind {
    /// Iteration statements and `switch` absorb unlabeled `break`.
    pub fn is_breakable(&self) -> bool {
        matches!(
            self,
            StatementKind::DoWhile { .. }
                | StatementKind::While { .. }
                | StatementKind::For { .. }
                | StatementKind::ForIn { .. }
                | StatementKind::Switch { .. }
        )
    }

    pub fn is_iteration(&self) -> bool {
        self.is_breakable() && !matches!(self, StatementKind::Switch { .. })
    }
}

#[derive(Debug)]
pub enum ForInit {
    Expr(Expr),
    Var(NodeList<VarDecl>),
}

#[derive(Debug)]
pub enum ForInTarget {
    Var(VarDecl),
    Location(Expr),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Variable,
    Constant,
}

#[derive(Debug)]
pub struct VarDecl {
    pub kind: VarKind,
    pub ident: Identifier,
    pub init: Option<Expr>,
}

#[derive(Debug)]
pub struct CaseClause {
    pub test: Expr,
    pub body: SourceElements,
}

/// Clauses are split around the `default` clause, which may sit anywhere.
#[derive(Debug)]
pub struct CaseBlock {
    pub before_default: NodeList<CaseClause>,
    pub default: Option<SourceElements>,
    pub after_default: NodeList<CaseClause>,
}

#[derive(Debug)]
pub struct CatchClause {
    pub param: Identifier,
    pub body: SourceElements,
}

#[derive(Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
}

#[derive(Debug)]
pub struct Element {
    /// Holes immediately before this element.
    pub elision: u32,
    pub value: Expr,
}

#[derive(Debug)]
pub enum PropertyName {
    Identifier(Identifier),
    String(JsString),
    Number(f64),
}

#[derive(Debug)]
pub struct PropertyValue {
    pub name: PropertyName,
    pub value: Expr,
}

impl PropertyName {
    /// The property key this name denotes at run time.
    pub fn to_key(&self) -> JsString {
        match self {
            PropertyName::Identifier(id) => JsString::from_str(id.as_str()),
            PropertyName::String(s) => s.clone(),
            PropertyName::Number(n) => JsString::from(crate::types::number_ops::to_string(*n)),
        }
    }
}

#[derive(Debug)]
pub enum ExprKind {
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    RegExp {
        pattern: String,
        flags: String,
    },
    This,
    Resolve(Identifier),
    Group(Box<Expr>),
    Array {
        elements: NodeList<Element>,
        trailing_elision: u32,
    },
    Object(NodeList<PropertyValue>),
    BracketAccessor {
        base: Box<Expr>,
        subscript: Box<Expr>,
    },
    DotAccessor {
        base: Box<Expr>,
        ident: Identifier,
    },
    New {
        callee: Box<Expr>,
        args: Option<Arguments>,
    },
    FunctionCallValue {
        callee: Box<Expr>,
        args: Arguments,
    },
    FunctionCallResolve {
        ident: Identifier,
        args: Arguments,
    },
    FunctionCallBracket {
        base: Box<Expr>,
        subscript: Box<Expr>,
        args: Arguments,
        parenthesized: bool,
    },
    FunctionCallDot {
        base: Box<Expr>,
        ident: Identifier,
        args: Arguments,
        parenthesized: bool,
    },
    PostfixResolve {
        ident: Identifier,
        op: UpdateOp,
    },
    PostfixBracket {
        base: Box<Expr>,
        subscript: Box<Expr>,
        op: UpdateOp,
    },
    PostfixDot {
        base: Box<Expr>,
        ident: Identifier,
        op: UpdateOp,
    },
    DeleteResolve(Identifier),
    DeleteBracket {
        base: Box<Expr>,
        subscript: Box<Expr>,
    },
    DeleteDot {
        base: Box<Expr>,
        ident: Identifier,
    },
    DeleteValue(Box<Expr>),
    Void(Box<Expr>),
    TypeOfResolve(Identifier),
    TypeOfValue(Box<Expr>),
    PrefixResolve {
        ident: Identifier,
        op: UpdateOp,
    },
    PrefixBracket {
        base: Box<Expr>,
        subscript: Box<Expr>,
        op: UpdateOp,
    },
    PrefixDot {
        base: Box<Expr>,
        ident: Identifier,
        op: UpdateOp,
    },
    UnaryPlus(Box<Expr>),
    Negate(Box<Expr>),
    BitwiseNot(Box<Expr>),
    LogicalNot(Box<Expr>),
    Mult {
        op: MultOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Add {
        op: AddOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Shift {
        op: ShiftOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Relational {
        op: RelationalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Equal {
        op: EqualityOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    BitOper {
        op: BitOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    BinaryLogical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    AssignResolve {
        ident: Identifier,
        op: AssignOp,
        value: Box<Expr>,
    },
    AssignBracket {
        base: Box<Expr>,
        subscript: Box<Expr>,
        op: AssignOp,
        value: Box<Expr>,
    },
    AssignDot {
        base: Box<Expr>,
        ident: Identifier,
        op: AssignOp,
        value: Box<Expr>,
    },
    Comma {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    FuncExpr(Rc<FunctionDef>),
}

impl Expr {
    pub fn new(kind: ExprKind, line: u32) -> Self {
        Expr { kind, line }
    }

    /// The expression with every enclosing grouping paren removed.
    pub fn innermost(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Group(inner) = &expr.kind {
            expr = inner;
        }
        expr
    }

    pub fn into_innermost(self) -> Expr {
        let mut expr = self;
        while let ExprKind::Group(inner) = expr.kind {
            expr = *inner;
        }
        expr
    }

    /// Identifier, bracket or dot access, possibly parenthesized.
    pub fn is_location(&self) -> bool {
        matches!(
            self.innermost().kind,
            ExprKind::Resolve(_) | ExprKind::BracketAccessor { .. } | ExprKind::DotAccessor { .. }
        )
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, ExprKind::Group(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MultOp {
    Mul,
    Div,
    Mod,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOp {
    Add,
    Sub,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftOp {
    LShift,
    RShift,
    URShift,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationalOp {
    Lt,
    Gt,
    LtEq,
    GtEq,
    In,
    InstanceOf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EqualityOp {
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitOp {
    And,
    Xor,
    Or,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    LShiftAssign,
    RShiftAssign,
    URShiftAssign,
    BitAndAssign,
    BitXorAssign,
    BitOrAssign,
}

impl fmt::Display for UpdateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        })
    }
}

impl fmt::Display for MultOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MultOp::Mul => "*",
            MultOp::Div => "/",
            MultOp::Mod => "%",
        })
    }
}

impl fmt::Display for AddOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AddOp::Add => "+",
            AddOp::Sub => "-",
        })
    }
}

impl fmt::Display for ShiftOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShiftOp::LShift => "<<",
            ShiftOp::RShift => ">>",
            ShiftOp::URShift => ">>>",
        })
    }
}

impl fmt::Display for RelationalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RelationalOp::Lt => "<",
            RelationalOp::Gt => ">",
            RelationalOp::LtEq => "<=",
            RelationalOp::GtEq => ">=",
            RelationalOp::In => "in",
            RelationalOp::InstanceOf => "instanceof",
        })
    }
}

impl fmt::Display for EqualityOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EqualityOp::Eq => "==",
            EqualityOp::NotEq => "!=",
            EqualityOp::StrictEq => "===",
            EqualityOp::StrictNotEq => "!==",
        })
    }
}

impl fmt::Display for BitOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BitOp::And => "&",
            BitOp::Xor => "^",
            BitOp::Or => "|",
        })
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        })
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::ModAssign => "%=",
            AssignOp::LShiftAssign => "<<=",
            AssignOp::RShiftAssign => ">>=",
            AssignOp::URShiftAssign => ">>>=",
            AssignOp::BitAndAssign => "&=",
            AssignOp::BitXorAssign => "^=",
            AssignOp::BitOrAssign => "|=",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(name: &str) -> Expr {
        Expr::new(ExprKind::Resolve(Identifier::new(name)), 1)
    }

    fn group(inner: Expr) -> Expr {
        Expr::new(ExprKind::Group(Box::new(inner)), 1)
    }

    #[test]
    fn innermost_unwraps_every_group() {
        let e = group(group(resolve("a")));
        assert!(matches!(&e.innermost().kind, ExprKind::Resolve(id) if id.as_str() == "a"));
        assert!(e.is_location());
        assert!(matches!(e.into_innermost().kind, ExprKind::Resolve(_)));
    }

    #[test]
    fn literals_and_calls_are_not_locations() {
        assert!(!Expr::new(ExprKind::Number(1.0), 1).is_location());
        let call = Expr::new(
            ExprKind::FunctionCallResolve {
                ident: Identifier::new("f"),
                args: NodeList::empty(),
            },
            1,
        );
        assert!(!group(call).is_location());
    }

    #[test]
    fn dot_access_is_a_location() {
        let e = Expr::new(
            ExprKind::DotAccessor {
                base: Box::new(resolve("a")),
                ident: Identifier::new("b"),
            },
            1,
        );
        assert!(e.is_location());
    }

    #[test]
    fn switch_is_breakable_but_not_iteration() {
        let block = CaseBlock {
            before_default: NodeList::empty(),
            default: None,
            after_default: NodeList::empty(),
        };
        let kind = StatementKind::Switch {
            discriminant: resolve("x"),
            block,
        };
        assert!(kind.is_breakable());
        assert!(!kind.is_iteration());
    }

    #[test]
    fn identifier_compares_by_content() {
        assert_eq!(Identifier::new("x"), Identifier::from("x".to_string()));
        assert_eq!(Identifier::new("x").to_string(), "x");
    }
}

//! Node construction for operators whose node kind depends on the shape of
//! their target. Grouping parens are transparent here: `(a.b) = 1` builds the
//! same node as `a.b = 1`.

use super::*;

enum Location {
    Resolve(Identifier),
    Bracket { base: Box<Expr>, subscript: Box<Expr> },
    Dot { base: Box<Expr>, ident: Identifier },
}

/// Splits a location into its shape, or hands the expression back untouched
/// (groups included) when it isn't one.
fn split_location(expr: Expr) -> Result<Location, Expr> {
    if !expr.is_location() {
        return Err(expr);
    }
    let inner = expr.into_innermost();
    match inner.kind {
        ExprKind::Resolve(ident) => Ok(Location::Resolve(ident)),
        ExprKind::BracketAccessor { base, subscript } => Ok(Location::Bracket { base, subscript }),
        ExprKind::DotAccessor { base, ident } => Ok(Location::Dot { base, ident }),
        kind => Err(Expr::new(kind, inner.line)),
    }
}

impl<'a> Parser<'a> {
    pub(super) fn make_assign_node(
        &self,
        target: Expr,
        op: AssignOp,
        value: Expr,
        line: u32,
    ) -> Result<Expr, ParseError> {
        let value = Box::new(value);
        let kind = match split_location(target) {
            Ok(Location::Resolve(ident)) => ExprKind::AssignResolve { ident, op, value },
            Ok(Location::Bracket { base, subscript }) => ExprKind::AssignBracket {
                base,
                subscript,
                op,
                value,
            },
            Ok(Location::Dot { base, ident }) => ExprKind::AssignDot {
                base,
                ident,
                op,
                value,
            },
            Err(_) => return Err(self.error("Left side of assignment is not a reference.")),
        };
        Ok(Expr::new(kind, line))
    }

    pub(super) fn make_prefix_node(
        &self,
        target: Expr,
        op: UpdateOp,
        line: u32,
    ) -> Result<Expr, ParseError> {
        let kind = match split_location(target) {
            Ok(Location::Resolve(ident)) => ExprKind::PrefixResolve { ident, op },
            Ok(Location::Bracket { base, subscript }) => ExprKind::PrefixBracket {
                base,
                subscript,
                op,
            },
            Ok(Location::Dot { base, ident }) => ExprKind::PrefixDot { base, ident, op },
            Err(_) => {
                return Err(self.error(format!(
                    "Prefix {op} operator applied to value that is not a reference."
                )));
            }
        };
        Ok(Expr::new(kind, line))
    }

    pub(super) fn make_postfix_node(
        &self,
        target: Expr,
        op: UpdateOp,
        line: u32,
    ) -> Result<Expr, ParseError> {
        let kind = match split_location(target) {
            Ok(Location::Resolve(ident)) => ExprKind::PostfixResolve { ident, op },
            Ok(Location::Bracket { base, subscript }) => ExprKind::PostfixBracket {
                base,
                subscript,
                op,
            },
            Ok(Location::Dot { base, ident }) => ExprKind::PostfixDot { base, ident, op },
            Err(_) => {
                return Err(self.error(format!(
                    "Postfix {op} operator applied to value that is not a reference."
                )));
            }
        };
        Ok(Expr::new(kind, line))
    }

    pub(super) fn make_delete_node(target: Expr, line: u32) -> Expr {
        let kind = match split_location(target) {
            Ok(Location::Resolve(ident)) => ExprKind::DeleteResolve(ident),
            Ok(Location::Bracket { base, subscript }) => ExprKind::DeleteBracket { base, subscript },
            Ok(Location::Dot { base, ident }) => ExprKind::DeleteDot { base, ident },
            Err(value) => ExprKind::DeleteValue(Box::new(value)),
        };
        Expr::new(kind, line)
    }

    pub(super) fn make_typeof_node(target: Expr, line: u32) -> Expr {
        // Only a bare identifier avoids the ReferenceError of a normal read.
        let kind = if matches!(target.innermost().kind, ExprKind::Resolve(_)) {
            match target.into_innermost().kind {
                ExprKind::Resolve(ident) => ExprKind::TypeOfResolve(ident),
                other => ExprKind::TypeOfValue(Box::new(Expr::new(other, line))),
            }
        } else {
            ExprKind::TypeOfValue(Box::new(target))
        };
        Expr::new(kind, line)
    }

    /// A call on a parenthesized member keeps the parens on record so the
    /// tree streams back to the same text.
    pub(super) fn make_call_node(callee: Expr, args: Arguments, line: u32) -> Expr {
        let parenthesized = callee.is_group();
        let kind = match split_location(callee) {
            Ok(Location::Resolve(ident)) => ExprKind::FunctionCallResolve { ident, args },
            Ok(Location::Bracket { base, subscript }) => ExprKind::FunctionCallBracket {
                base,
                subscript,
                args,
                parenthesized,
            },
            Ok(Location::Dot { base, ident }) => ExprKind::FunctionCallDot {
                base,
                ident,
                args,
                parenthesized,
            },
            Err(callee) => ExprKind::FunctionCallValue {
                callee: Box::new(callee),
                args,
            },
        };
        Expr::new(kind, line)
    }
}

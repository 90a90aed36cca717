//! Condition synthesis: one match over the closed set of kinds.

use crate::ast::{Argument, Expr, InfixOp};

use super::family::AssertionKind;

/// Builds the expression a kind asserts, from its operands in call order.
///
/// Operands are parenthesized first when `defensive` is set. Returns `None`
/// for kinds that have no single condition (unconditional failure and the
/// two throw expectations) or when too few operands are supplied.
pub fn synthesize_condition(kind: AssertionKind, operands: &[Expr], defensive: bool) -> Option<Expr> {
    use AssertionKind::*;

    let wrap = |expr: &Expr| expr.clone().parenthesized_if(defensive);

    let condition = match (kind, operands) {
        (Assert | AssertTrue, [x, ..]) => bool_of(wrap(x)),
        (AssertFalse, [x, ..]) => bool_of(Expr::not(wrap(x))),
        (AssertNil, [x, ..]) => Expr::infix(wrap(x), InfixOp::Equal, Expr::Absent),
        (AssertNotNil, [x, ..]) => Expr::infix(wrap(x), InfixOp::NotEqual, Expr::Absent),
        (Unwrap, [x, ..]) => wrap(x),
        (
            Equal | NotEqual | Identical | NotIdentical | LessThan | LessThanOrEqual | GreaterThan
            | GreaterThanOrEqual,
            [lhs, rhs, ..],
        ) => Expr::infix(wrap(lhs), comparison_operator(kind)?, wrap(rhs)),
        (EqualWithAccuracy | NotEqualWithAccuracy, [lhs, rhs, tolerance, ..]) => {
            let difference = Expr::infix(wrap(lhs), InfixOp::Subtract, wrap(rhs));
            let comparison = if kind == EqualWithAccuracy {
                InfixOp::LessOrEqual
            } else {
                InfixOp::Greater
            };
            Expr::infix(
                Expr::call(Expr::ident("abs"), vec![Argument::unlabeled(difference)]),
                comparison,
                wrap(tolerance),
            )
        }
        _ => return None,
    };

    Some(condition)
}

fn comparison_operator(kind: AssertionKind) -> Option<InfixOp> {
    use AssertionKind::*;
    Some(match kind {
        Equal => InfixOp::Equal,
        NotEqual => InfixOp::NotEqual,
        Identical => InfixOp::Identical,
        NotIdentical => InfixOp::NotIdentical,
        LessThan => InfixOp::Less,
        LessThanOrEqual => InfixOp::LessOrEqual,
        GreaterThan => InfixOp::Greater,
        GreaterThanOrEqual => InfixOp::GreaterOrEqual,
        _ => return None,
    })
}

/// Explicit boolean conversion, `Bool(x)`.
fn bool_of(expr: Expr) -> Expr {
    Expr::call(Expr::ident("Bool"), vec![Argument::unlabeled(expr)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Renderer;

    fn synth(kind: AssertionKind, operands: &[&str], defensive: bool) -> Option<String> {
        let operands: Vec<Expr> = operands.iter().map(|op| Expr::verbatim(*op)).collect();
        synthesize_condition(kind, &operands, defensive).map(|e| Renderer::default().render_expr(&e))
    }

    #[test]
    fn test_unary_conditions() {
        assert_eq!(synth(AssertionKind::Assert, &["x"], true).as_deref(), Some("Bool((x))"));
        assert_eq!(synth(AssertionKind::AssertFalse, &["x"], true).as_deref(), Some("Bool(!(x))"));
        assert_eq!(synth(AssertionKind::AssertNil, &["a ?? b"], true).as_deref(), Some("(a ?? b) == nil"));
        assert_eq!(synth(AssertionKind::AssertNotNil, &["x"], true).as_deref(), Some("(x) != nil"));
        assert_eq!(synth(AssertionKind::Unwrap, &["x"], false).as_deref(), Some("x"));
    }

    #[test]
    fn test_every_binary_operator() {
        let cases = [
            (AssertionKind::Equal, "=="),
            (AssertionKind::NotEqual, "!="),
            (AssertionKind::Identical, "==="),
            (AssertionKind::NotIdentical, "!=="),
            (AssertionKind::LessThan, "<"),
            (AssertionKind::LessThanOrEqual, "<="),
            (AssertionKind::GreaterThan, ">"),
            (AssertionKind::GreaterThanOrEqual, ">="),
        ];
        for (kind, op) in cases {
            assert_eq!(synth(kind, &["0", "1"], true), Some(format!("(0) {op} (1)")));
        }
    }

    #[test]
    fn test_tolerance_references_each_operand_once() {
        let text = synth(AssertionKind::EqualWithAccuracy, &["a", "b", "t"], true).expect("condition");
        assert_eq!(text, "abs((a) - (b)) <= (t)");
        let text = synth(AssertionKind::NotEqualWithAccuracy, &["a", "b", "t"], true).expect("condition");
        assert_eq!(text, "abs((a) - (b)) > (t)");
    }

    #[test]
    fn test_repeated_synthesis_is_identical() {
        let first = synth(AssertionKind::LessThan, &["f(x)", "g(y)"], true);
        let second = synth(AssertionKind::LessThan, &["f(x)", "g(y)"], true);
        assert_eq!(first, second);
    }

    #[test]
    fn test_kinds_without_condition_and_short_operands() {
        assert_eq!(synth(AssertionKind::Fail, &[], false), None);
        assert_eq!(synth(AssertionKind::ThrowsError, &["f()"], false), None);
        assert_eq!(synth(AssertionKind::Equal, &["a"], true), None);
    }
}

//! Structural validity checks for synthesized trees.
//!
//! Every rewrite result passes through `validate_expr` before it is handed
//! back. A failure here means a synthesizer built something the host grammar
//! would reject, which is reported as an internal error rather than emitted.

use super::{Argument, CallExpr, Callee, Closure, Expr, Stmt, StringSegment};
use crate::syntax::{is_balanced, is_identifier};

/// Checks `expr` and everything beneath it. The error string names the first
/// offending construct.
pub fn validate_expr(expr: &Expr) -> Result<(), String> {
    match expr {
        Expr::Verbatim(text) => {
            if text.trim().is_empty() {
                return Err("empty expression fragment".into());
            }
            if !is_balanced(text) {
                return Err(format!("unbalanced expression fragment `{text}`"));
            }
            Ok(())
        }
        Expr::Identifier(name) => check_identifier(name, "identifier"),
        Expr::StringLiteral(text) => {
            if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
                Ok(())
            } else {
                Err(format!("string literal `{text}` is not quoted"))
            }
        }
        Expr::InterpolatedString(segments) => segments.iter().try_for_each(validate_segment),
        Expr::Absent => Ok(()),
        Expr::Paren(inner) | Expr::Try(inner) => validate_expr(inner),
        Expr::Prefix { operand, .. } => validate_expr(operand),
        Expr::Infix { lhs, rhs, .. } => {
            validate_expr(lhs)?;
            validate_expr(rhs)
        }
        Expr::Member { base, member } => {
            validate_expr(base)?;
            check_identifier(member, "member name")
        }
        Expr::Call(call) => validate_call(call),
        Expr::Closure(closure) => validate_closure(closure),
    }
}

pub fn validate_call(call: &CallExpr) -> Result<(), String> {
    match &call.callee {
        Callee::Macro(name) => check_identifier(name, "macro name")?,
        Callee::Function(callee) => validate_expr(callee)?,
    }
    if !call.parenthesized && !call.arguments.is_empty() {
        return Err("arguments without parentheses".into());
    }
    call.arguments.iter().try_for_each(validate_argument)?;
    if let Some(closure) = &call.trailing_closure {
        validate_closure(&closure.value)?;
    }
    for labeled in &call.additional_trailing_closures {
        check_identifier(&labeled.label, "closure label")?;
        validate_closure(&labeled.closure.value)?;
    }
    Ok(())
}

fn validate_argument(argument: &Argument) -> Result<(), String> {
    if let Some(label) = &argument.label {
        check_identifier(label, "argument label")?;
    }
    validate_expr(argument.expr())
}

fn validate_closure(closure: &Closure) -> Result<(), String> {
    match closure {
        Closure::Verbatim(text) => {
            if is_balanced(text) {
                Ok(())
            } else {
                Err("unbalanced closure body".into())
            }
        }
        Closure::Block { body, .. } => {
            if body.is_empty() {
                return Err("empty closure body".into());
            }
            body.iter().try_for_each(validate_stmt)
        }
    }
}

fn validate_stmt(stmt: &Stmt) -> Result<(), String> {
    match stmt {
        Stmt::Expr(expr) | Stmt::Return(expr) | Stmt::Throw(expr) => validate_expr(expr),
        Stmt::Let { name, value } => {
            if name != "_" {
                check_identifier(name, "binding")?;
            }
            validate_expr(value)
        }
        Stmt::IfLet { name, then } => {
            check_identifier(name, "binding")?;
            if then.is_empty() {
                return Err("empty `if let` body".into());
            }
            then.iter().try_for_each(validate_stmt)
        }
        Stmt::DoCatch { body, catch } => {
            if body.is_empty() || catch.is_empty() {
                return Err("empty `do`/`catch` block".into());
            }
            body.iter().chain(catch).try_for_each(validate_stmt)
        }
    }
}

fn validate_segment(segment: &StringSegment) -> Result<(), String> {
    match segment {
        StringSegment::Text(text) => {
            if text.contains('\n') {
                return Err("newline inside single-line string".into());
            }
            if has_unescaped_quote(text) {
                return Err(format!("unescaped quote in string text `{text}`"));
            }
            Ok(())
        }
        StringSegment::Interpolation(expr) => validate_expr(expr),
    }
}

fn has_unescaped_quote(text: &str) -> bool {
    let mut escaped = false;
    for ch in text.chars() {
        match ch {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return true,
            _ => escaped = false,
        }
    }
    false
}

fn check_identifier(name: &str, what: &str) -> Result<(), String> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(format!("invalid {what} `{name}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::InfixOp;

    #[test]
    fn test_well_formed_comparison_passes() {
        let expr = Expr::infix(
            Expr::verbatim("f(x)").paren(),
            InfixOp::Equal,
            Expr::Absent,
        );
        assert!(validate_expr(&expr).is_ok());
    }

    #[test]
    fn test_unbalanced_fragment_fails() {
        let err = validate_expr(&Expr::verbatim("f(x")).unwrap_err();
        assert!(err.contains("unbalanced"));
    }

    #[test]
    fn test_bad_label_fails() {
        let call = CallExpr::macro_call(
            "expect",
            vec![Argument::labeled("source location", Expr::ident("x"))],
        );
        assert!(validate_call(&call).is_err());
    }

    #[test]
    fn test_empty_block_closure_fails() {
        assert!(validate_expr(&Expr::Closure(Closure::block(vec![]))).is_err());
    }

    #[test]
    fn test_interpolated_text_with_quote_fails() {
        let expr = Expr::InterpolatedString(vec![StringSegment::Text("a\"b".into())]);
        assert!(validate_expr(&expr).is_err());
        let expr = Expr::InterpolatedString(vec![StringSegment::Text("a\\\"b".into())]);
        assert!(validate_expr(&expr).is_ok());
    }
}

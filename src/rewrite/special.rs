//! Throw expectations, which do not fit the single-condition shape.
//!
//! `XCTAssertThrowsError` becomes `#expect(throws:)` with the operand moved
//! into a trailing closure; with an error handler the result is bound to a
//! fresh temporary and the handler only runs when an error was captured; that
//! closure is invoked immediately and its value discarded with `_ =`.
//! `XCTAssertNoThrow` becomes an immediately invoked closure that returns the
//! operand's value and records an issue before rethrowing.

use crate::ast::{Argument, CallExpr, Callee, Closure, Expr, Span, Stmt, StringSegment, WithSpan};
use crate::errors::ErrorKind;

use super::assemble::{issue_record, target_call};
use super::context_args::ContextArguments;
use super::ExpansionContext;

const THROWN_ERROR_HINT: &str = "thrownError";
const UNEXPECTED_ERROR_MESSAGE: &str = "Unexpected error thrown: ";

// ============================================================================
// THROWING EXPECTATION
// ============================================================================

pub fn throws_error(
    name: &str,
    call: &CallExpr,
    operand: &Expr,
    context: &ContextArguments,
    ctx: &mut ExpansionContext,
) -> CallExpr {
    warn_labeled_closures(name, call, ctx);

    let mut expect = target_call(
        call,
        "expect",
        vec![Argument::labeled("throws", any_error_type())],
        context,
    );
    expect.trailing_closure = Some(WithSpan::new(
        Closure::block(vec![Stmt::Expr(operand.clone())]),
        call.span,
    ));
    expect.additional_trailing_closures.clear();

    let Some(handler) = error_handler(call) else {
        tracing::debug!(assertion = name, "throw expectation without handler");
        return expect;
    };

    let temporary = ctx.fresh_name(THROWN_ERROR_HINT);
    tracing::debug!(assertion = name, temporary = %temporary, "throw expectation with handler");

    expect.leading_trivia.clear();
    expect.trailing_trivia.clear();

    let invoke_handler = Expr::call(
        Expr::Closure(handler).paren(),
        vec![Argument::unlabeled(Expr::ident(temporary.clone()))],
    );
    let body = vec![
        Stmt::Let {
            name: temporary.clone(),
            value: Expr::Call(Box::new(expect)),
        },
        Stmt::IfLet {
            name: temporary.clone(),
            then: vec![Stmt::Expr(invoke_handler)],
        },
        Stmt::Return(Expr::ident(temporary)),
    ];

    // A bare `{ ... }()` would attach to a preceding call as its trailing
    // closure, so the form is spliced as `_ = { ... }()`.
    CallExpr {
        discard_result: true,
        ..immediately_invoked(call, Expr::Closure(Closure::block(body)))
    }
}

/// The trailing closure, or else the last unlabeled closure argument after
/// the operand. A labeled closure never qualifies.
fn error_handler(call: &CallExpr) -> Option<Closure> {
    if let Some(trailing) = &call.trailing_closure {
        return Some(trailing.value.clone());
    }
    call.arguments
        .iter()
        .skip(1)
        .rev()
        .find(|arg| arg.label.is_none() && arg.expr().is_closure())
        .and_then(|arg| match arg.expr() {
            Expr::Closure(closure) => Some(closure.clone()),
            _ => None,
        })
}

fn warn_labeled_closures(name: &str, call: &CallExpr, ctx: &mut ExpansionContext) {
    let labeled_arguments = call
        .arguments
        .iter()
        .skip(1)
        .filter(|arg| arg.expr().is_closure())
        .filter_map(|arg| arg.label.as_ref().map(|label| (label.clone(), arg.value.span)));
    let labeled_trailing = call
        .additional_trailing_closures
        .iter()
        .map(|labeled| (labeled.label.clone(), labeled.closure.span));

    let found: Vec<(String, Span)> = labeled_arguments.chain(labeled_trailing).collect();
    for (label, span) in found {
        ctx.warn(
            ErrorKind::LabeledClosureIgnored {
                assertion: name.to_string(),
                label,
            },
            span,
        );
    }
}

/// `(any Error).self`
fn any_error_type() -> Expr {
    Expr::member(Expr::verbatim("any Error").paren(), "self")
}

// ============================================================================
// NON-THROWING EXPECTATION
// ============================================================================

pub fn no_throw(call: &CallExpr, operand: &Expr, context: &ContextArguments) -> CallExpr {
    let mut segments = vec![
        StringSegment::Text(UNEXPECTED_ERROR_MESSAGE.to_string()),
        StringSegment::Interpolation(Expr::ident("error")),
    ];
    if let Some(message) = &context.message {
        segments.push(StringSegment::Text(" - ".to_string()));
        segments.push(StringSegment::Interpolation(message.clone()));
    }

    let mut record_arguments = vec![Argument::unlabeled(Expr::InterpolatedString(segments))];
    record_arguments.extend(context.source_location_argument());
    let record = Expr::call(issue_record(), record_arguments);

    let body = vec![Stmt::DoCatch {
        body: vec![Stmt::Return(with_try(operand))],
        catch: vec![Stmt::Expr(record), Stmt::Throw(Expr::ident("error"))],
    }];

    immediately_invoked(call, Expr::Try(Box::new(Expr::Closure(Closure::block(body)))))
}

/// Prefixes `try` unless the operand already starts with it.
fn with_try(operand: &Expr) -> Expr {
    let already_tried = match operand {
        Expr::Try(_) => true,
        Expr::Verbatim(text) => {
            let text = text.trim_start();
            text.strip_prefix("try").is_some_and(|rest| {
                rest.starts_with(|c: char| c.is_whitespace() || c == '?' || c == '!')
            })
        }
        _ => false,
    };
    if already_tried {
        operand.clone()
    } else {
        Expr::Try(Box::new(operand.clone()))
    }
}

/// `callee()` carrying the original call's trivia and span.
fn immediately_invoked(original: &CallExpr, callee: Expr) -> CallExpr {
    CallExpr {
        leading_trivia: original.leading_trivia.clone(),
        trailing_trivia: original.trailing_trivia.clone(),
        span: original.span,
        ..CallExpr::new(Callee::Function(Box::new(callee)), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_try_does_not_double_up() {
        assert_eq!(
            with_try(&Expr::verbatim("try f()")),
            Expr::verbatim("try f()")
        );
        assert_eq!(
            with_try(&Expr::verbatim("tryHarder()")),
            Expr::Try(Box::new(Expr::verbatim("tryHarder()")))
        );
    }

    #[test]
    fn test_handler_prefers_trailing_closure() {
        let mut call = CallExpr::macro_call(
            "XCTAssertThrowsError",
            vec![
                Argument::unlabeled(Expr::verbatim("try f()")),
                Argument::unlabeled(Expr::Closure(Closure::Verbatim(" a ".into()))),
            ],
        );
        assert_eq!(error_handler(&call), Some(Closure::Verbatim(" a ".into())));
        call.trailing_closure = Some(WithSpan::new(
            Closure::Verbatim(" b ".into()),
            Span::default(),
        ));
        assert_eq!(error_handler(&call), Some(Closure::Verbatim(" b ".into())));
    }

    #[test]
    fn test_labeled_closure_is_not_a_handler() {
        let call = CallExpr::macro_call(
            "XCTAssertThrowsError",
            vec![
                Argument::unlabeled(Expr::verbatim("try f()")),
                Argument::labeled("handler", Expr::Closure(Closure::Verbatim(" a ".into()))),
            ],
        );
        assert_eq!(error_handler(&call), None);
    }

    #[test]
    fn test_operand_closure_is_not_a_handler() {
        let call = CallExpr::macro_call(
            "XCTAssertThrowsError",
            vec![Argument::unlabeled(Expr::Closure(Closure::Verbatim(" a ".into())))],
        );
        assert_eq!(error_handler(&call), None);
    }
}

//! Target-call assembly.

use crate::ast::{Argument, CallExpr, Callee, Expr};

use super::context_args::ContextArguments;

/// `#name(leading..., message?, sourceLocation: ...?)`, reusing the original
/// call's generic clause and trailing closures. Only the invocation name and
/// the argument list change.
pub fn target_call(
    original: &CallExpr,
    name: &str,
    leading: Vec<Argument>,
    context: &ContextArguments,
) -> CallExpr {
    let mut arguments = leading;
    arguments.extend(context.to_arguments());

    CallExpr {
        callee: Callee::Macro(name.to_string()),
        parenthesized: true,
        arguments,
        span: original.span,
        ..original.clone()
    }
}

/// `Issue.record(message?, sourceLocation: ...?)`.
pub fn record_issue(original: &CallExpr, context: &ContextArguments) -> CallExpr {
    CallExpr {
        callee: Callee::Function(Box::new(issue_record())),
        parenthesized: true,
        arguments: context.to_arguments(),
        span: original.span,
        ..original.clone()
    }
}

/// The bare `Issue.record` callee.
pub fn issue_record() -> Expr {
    Expr::member(Expr::ident("Issue"), "record")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Closure, Renderer, Span, WithSpan};

    #[test]
    fn test_target_call_keeps_generics_and_closures() {
        let mut original = CallExpr::macro_call("XCTUnwrap", vec![]);
        original.generic_clause = Some("<Int>".into());
        original.trailing_closure = Some(WithSpan::new(Closure::Verbatim(" x ".into()), Span::default()));
        let context = ContextArguments {
            message: Some(Expr::StringLiteral("\"m\"".into())),
            ..Default::default()
        };
        let call = target_call(&original, "require", vec![Argument::unlabeled(Expr::ident("v"))], &context);
        assert_eq!(
            Renderer::default().render_call(&call),
            "#require<Int>(v, \"m\") { x }"
        );
    }

    #[test]
    fn test_record_issue_always_has_parentheses() {
        let mut original = CallExpr::macro_call("XCTFail", vec![]);
        original.parenthesized = false;
        let call = record_issue(&original, &ContextArguments::default());
        assert_eq!(Renderer::default().render_call(&call), "Issue.record()");
    }
}

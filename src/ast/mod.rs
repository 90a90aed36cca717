//! AST module for Retrofit
//!
//! This module provides the syntax tree the rewriter inspects and constructs:
//! call expressions with their arguments, trailing closures, and formatting
//! trivia, plus the handful of expression and statement shapes the target
//! dialect needs.

// ============================================================================
// IMPORTS
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Represents a byte span in the source code.
///
/// # Examples
///
/// ```rust
/// use retrofit::ast::Span;
/// let span = Span::new(0, 5);
/// assert_eq!(span.len(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Wrapper for carrying source span information with any value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithSpan<T> {
    pub value: T,
    pub span: Span,
}

/// An expression as the rewriter sees it.
///
/// Operands coming from user code are never decomposed: they stay
/// `Verbatim` (or the few leaf shapes the parser can classify) so the
/// rewrite cannot change what they evaluate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Source text carried through unchanged.
    Verbatim(String),
    Identifier(String),
    /// A string literal, including its delimiters.
    StringLiteral(String),
    InterpolatedString(Vec<StringSegment>),
    /// The absence sentinel (`nil`).
    Absent,
    Paren(Box<Expr>),
    Prefix {
        op: PrefixOp,
        operand: Box<Expr>,
    },
    Infix {
        lhs: Box<Expr>,
        op: InfixOp,
        rhs: Box<Expr>,
    },
    Try(Box<Expr>),
    Member {
        base: Box<Expr>,
        member: String,
    },
    Call(Box<CallExpr>),
    Closure(Closure),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StringSegment {
    /// Literal text, already escaped for the host language.
    Text(String),
    Interpolation(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefixOp {
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfixOp {
    Equal,
    NotEqual,
    Identical,
    NotIdentical,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Subtract,
}

/// What a call invokes: a freestanding macro (`#name`) or an ordinary callee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Callee {
    Macro(String),
    Function(Box<Expr>),
}

/// A call expression with everything needed to rebuild it faithfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    pub leading_trivia: String,
    pub callee: Callee,
    pub generic_clause: Option<String>,
    /// Whether the argument list was written with parentheses.
    pub parenthesized: bool,
    pub arguments: Vec<Argument>,
    pub trailing_closure: Option<WithSpan<Closure>>,
    pub additional_trailing_closures: Vec<LabeledClosure>,
    pub trailing_trivia: String,
    pub span: Span,
    /// Printed as `_ = call`, so the call can stand as a statement even
    /// when its callee starts with a closure literal.
    #[serde(default)]
    pub discard_result: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub label: Option<String>,
    pub value: WithSpan<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledClosure {
    pub label: String,
    pub closure: WithSpan<Closure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Closure {
    /// A closure taken from source; holds the text between the braces.
    Verbatim(String),
    /// A synthesized closure.
    Block {
        signature: Option<String>,
        body: Vec<Stmt>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Expr(Expr),
    Let { name: String, value: Expr },
    /// `if let name { ... }`
    IfLet { name: String, then: Vec<Stmt> },
    Return(Expr),
    DoCatch { body: Vec<Stmt>, catch: Vec<Stmt> },
    Throw(Expr),
}

// ============================================================================
// PUBLIC API IMPLEMENTATION
// ============================================================================

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shifts the span by `offset` bytes.
    pub fn offset(self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

impl<T> WithSpan<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }
}

impl InfixOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            InfixOp::Equal => "==",
            InfixOp::NotEqual => "!=",
            InfixOp::Identical => "===",
            InfixOp::NotIdentical => "!==",
            InfixOp::Less => "<",
            InfixOp::LessOrEqual => "<=",
            InfixOp::Greater => ">",
            InfixOp::GreaterOrEqual => ">=",
            InfixOp::Subtract => "-",
        }
    }
}

impl Expr {
    pub fn verbatim(text: impl Into<String>) -> Self {
        Expr::Verbatim(text.into())
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Identifier(name.into())
    }

    pub fn paren(self) -> Self {
        Expr::Paren(Box::new(self))
    }

    /// Wraps in parentheses only when asked to.
    pub fn parenthesized_if(self, wrap: bool) -> Self {
        if wrap {
            self.paren()
        } else {
            self
        }
    }

    pub fn infix(lhs: Expr, op: InfixOp, rhs: Expr) -> Self {
        Expr::Infix {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        }
    }

    pub fn not(operand: Expr) -> Self {
        Expr::Prefix {
            op: PrefixOp::Not,
            operand: Box::new(operand),
        }
    }

    pub fn member(base: Expr, member: impl Into<String>) -> Self {
        Expr::Member {
            base: Box::new(base),
            member: member.into(),
        }
    }

    /// `callee(arguments...)` as an ordinary function call.
    pub fn call(callee: Expr, arguments: Vec<Argument>) -> Self {
        Expr::Call(Box::new(CallExpr::function(callee, arguments)))
    }

    pub fn is_closure(&self) -> bool {
        matches!(self, Expr::Closure(_))
    }
}

impl CallExpr {
    /// A bare call with no trivia, generics, or trailing closures.
    pub fn new(callee: Callee, arguments: Vec<Argument>) -> Self {
        Self {
            leading_trivia: String::new(),
            callee,
            generic_clause: None,
            parenthesized: true,
            arguments,
            trailing_closure: None,
            additional_trailing_closures: Vec::new(),
            trailing_trivia: String::new(),
            span: Span::default(),
            discard_result: false,
        }
    }

    pub fn macro_call(name: impl Into<String>, arguments: Vec<Argument>) -> Self {
        Self::new(Callee::Macro(name.into()), arguments)
    }

    pub fn function(callee: Expr, arguments: Vec<Argument>) -> Self {
        Self::new(Callee::Function(Box::new(callee)), arguments)
    }

    /// The macro name this call invokes, trimmed of incidental formatting.
    pub fn invocation_name(&self) -> Option<&str> {
        match &self.callee {
            Callee::Macro(name) => Some(name.trim()),
            Callee::Function(_) => None,
        }
    }

    /// Every piece of user source text held by this call (verbatim operands,
    /// closure arguments, trailing closures), which may contain nested calls.
    /// Each fragment comes with the absolute offset of its first byte.
    pub fn fragments_mut(&mut self) -> impl Iterator<Item = (&mut String, usize)> {
        let from_arguments = self.arguments.iter_mut().filter_map(|arg| {
            let start = arg.value.span.start;
            match &mut arg.value.value {
                Expr::Verbatim(text) => Some((text, start)),
                Expr::Closure(Closure::Verbatim(text)) => Some((text, start + 1)),
                _ => None,
            }
        });
        let from_trailing = self
            .trailing_closure
            .iter_mut()
            .chain(
                self.additional_trailing_closures
                    .iter_mut()
                    .map(|labeled| &mut labeled.closure),
            )
            .filter_map(|closure| {
                let start = closure.span.start;
                match &mut closure.value {
                    Closure::Verbatim(text) => Some((text, start + 1)),
                    Closure::Block { .. } => None,
                }
            });
        from_arguments.chain(from_trailing)
    }
}

impl Argument {
    pub fn unlabeled(value: Expr) -> Self {
        Self {
            label: None,
            value: WithSpan::new(value, Span::default()),
        }
    }

    pub fn labeled(label: impl Into<String>, value: Expr) -> Self {
        Self {
            label: Some(label.into()),
            value: WithSpan::new(value, Span::default()),
        }
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.label.as_deref() == Some(label)
    }

    pub fn expr(&self) -> &Expr {
        &self.value.value
    }
}

impl Closure {
    pub fn block(body: Vec<Stmt>) -> Self {
        Closure::Block {
            signature: None,
            body,
        }
    }
}

// ============================================================================
// MODULE EXPORTS
// ============================================================================

pub mod render;
pub mod validate;

pub use render::Renderer;

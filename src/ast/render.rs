//! Deterministic printer from the syntax tree back to source text.
//!
//! Synthesized blocks are laid out one statement per line, indented by
//! `indent_width` spaces per nesting level on top of a base indentation.
//! Verbatim fragments and closures taken from source keep their text; when
//! one spans several lines and lands inside a synthesized block, its later
//! lines are shifted right by that block's depth so its layout relative to
//! the surrounding code is kept.

use super::{Argument, CallExpr, Callee, Closure, Expr, PrefixOp, Stmt, StringSegment};

pub const DEFAULT_INDENT_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    indent_width: usize,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(DEFAULT_INDENT_WIDTH)
    }
}

impl Renderer {
    pub fn new(indent_width: usize) -> Self {
        Self { indent_width }
    }

    pub fn render_expr(&self, expr: &Expr) -> String {
        let mut printer = self.printer("");
        printer.expr(expr);
        printer.out
    }

    pub fn render_call(&self, call: &CallExpr) -> String {
        self.render_call_at(call, "")
    }

    /// Renders `call` for splicing into a line indented by `base`: every
    /// line the printer starts itself begins with `base`.
    pub fn render_call_at(&self, call: &CallExpr, base: &str) -> String {
        let mut printer = self.printer(base);
        printer.call(call);
        printer.out
    }

    fn printer<'a>(&self, base: &'a str) -> Printer<'a> {
        Printer {
            out: String::new(),
            base,
            depth: 0,
            indent_width: self.indent_width,
        }
    }
}

struct Printer<'a> {
    out: String,
    base: &'a str,
    depth: usize,
    indent_width: usize,
}

impl Printer<'_> {
    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Verbatim(text) | Expr::StringLiteral(text) => self.verbatim(text),
            Expr::Identifier(text) => self.out.push_str(text),
            Expr::InterpolatedString(segments) => self.interpolated(segments),
            Expr::Absent => self.out.push_str("nil"),
            Expr::Paren(inner) => {
                self.out.push('(');
                self.expr(inner);
                self.out.push(')');
            }
            Expr::Prefix { op, operand } => {
                match op {
                    PrefixOp::Not => self.out.push('!'),
                }
                self.expr(operand);
            }
            Expr::Infix { lhs, op, rhs } => {
                self.expr(lhs);
                self.out.push(' ');
                self.out.push_str(op.symbol());
                self.out.push(' ');
                self.expr(rhs);
            }
            Expr::Try(inner) => {
                self.out.push_str("try ");
                self.expr(inner);
            }
            Expr::Member { base, member } => {
                self.expr(base);
                self.out.push('.');
                self.out.push_str(member);
            }
            Expr::Call(call) => self.call(call),
            Expr::Closure(closure) => self.closure(closure),
        }
    }

    fn interpolated(&mut self, segments: &[StringSegment]) {
        self.out.push('"');
        for segment in segments {
            match segment {
                StringSegment::Text(text) => self.out.push_str(text),
                StringSegment::Interpolation(expr) => {
                    self.out.push_str("\\(");
                    self.expr(expr);
                    self.out.push(')');
                }
            }
        }
        self.out.push('"');
    }

    fn call(&mut self, call: &CallExpr) {
        self.out.push_str(&call.leading_trivia);
        if call.discard_result {
            self.out.push_str("_ = ");
        }
        match &call.callee {
            Callee::Macro(name) => {
                self.out.push('#');
                self.out.push_str(name);
            }
            Callee::Function(callee) => self.expr(callee),
        }
        if let Some(generics) = &call.generic_clause {
            self.out.push_str(generics);
        }
        if call.parenthesized {
            self.out.push('(');
            self.arguments(&call.arguments);
            self.out.push(')');
        }
        if let Some(closure) = &call.trailing_closure {
            self.out.push(' ');
            self.closure(&closure.value);
        }
        for labeled in &call.additional_trailing_closures {
            self.out.push(' ');
            self.out.push_str(&labeled.label);
            self.out.push_str(": ");
            self.closure(&labeled.closure.value);
        }
        self.out.push_str(&call.trailing_trivia);
    }

    fn arguments(&mut self, arguments: &[Argument]) {
        for (index, argument) in arguments.iter().enumerate() {
            if index > 0 {
                self.out.push_str(", ");
            }
            if let Some(label) = &argument.label {
                self.out.push_str(label);
                self.out.push_str(": ");
            }
            self.expr(&argument.value.value);
        }
    }

    fn closure(&mut self, closure: &Closure) {
        match closure {
            Closure::Verbatim(text) => {
                self.out.push('{');
                self.verbatim(text);
                self.out.push('}');
            }
            Closure::Block { signature, body } => {
                self.out.push('{');
                if let Some(signature) = signature {
                    self.out.push(' ');
                    self.out.push_str(signature);
                    self.out.push_str(" in");
                }
                self.out.push('\n');
                self.block_body(body);
                self.indent();
                self.out.push('}');
            }
        }
    }

    /// Writes statements one level deeper than the current depth, each
    /// terminated by a newline.
    fn block_body(&mut self, body: &[Stmt]) {
        self.depth += 1;
        for stmt in body {
            self.indent();
            self.stmt(stmt);
            self.out.push('\n');
        }
        self.depth -= 1;
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) => self.expr(expr),
            Stmt::Let { name, value } => {
                self.out.push_str("let ");
                self.out.push_str(name);
                self.out.push_str(" = ");
                self.expr(value);
            }
            Stmt::IfLet { name, then } => {
                self.out.push_str("if let ");
                self.out.push_str(name);
                self.out.push_str(" {\n");
                self.block_body(then);
                self.indent();
                self.out.push('}');
            }
            Stmt::Return(expr) => {
                self.out.push_str("return ");
                self.expr(expr);
            }
            Stmt::DoCatch { body, catch } => {
                self.out.push_str("do {\n");
                self.block_body(body);
                self.indent();
                self.out.push_str("} catch {\n");
                self.block_body(catch);
                self.indent();
                self.out.push('}');
            }
            Stmt::Throw(expr) => {
                self.out.push_str("throw ");
                self.expr(expr);
            }
        }
    }

    /// Source text; continuation lines move right by the block depth. Empty
    /// lines stay empty.
    fn verbatim(&mut self, text: &str) {
        let shift = self.depth * self.indent_width;
        if shift == 0 {
            self.out.push_str(text);
            return;
        }
        for (index, line) in text.split('\n').enumerate() {
            if index > 0 {
                self.out.push('\n');
                if !line.is_empty() {
                    self.out.extend(std::iter::repeat(' ').take(shift));
                }
            }
            self.out.push_str(line);
        }
    }

    fn indent(&mut self) {
        self.out.push_str(self.base);
        for _ in 0..self.depth * self.indent_width {
            self.out.push(' ');
        }
    }
}

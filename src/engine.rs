//! Source-level rewriting.
//!
//! `SourceRewriter` walks a whole file: every call site the registry knows is
//! replaced by its rewrite, everything else is copied through. Nested legacy
//! calls (inside operands, closure arguments, trailing closures, or inside
//! macros nobody recognizes) are rewritten before the call around them.

use crate::ast::{CallExpr, Renderer};
use crate::config::RetrofitConfig;
use crate::errors::{RetrofitError, SourceContext};
use crate::rewrite::{rewrite_call, AssertionRegistry, ExpansionContext, FreshNames};
use crate::syntax::{parse_call, scan_call_sites};

/// Deepest nesting of call sites that is still rewritten; anything below is
/// copied through unchanged.
pub const MAX_NESTING_DEPTH: usize = 128;

// ============================================================================
// OUTCOME
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RewriteOutcome {
    pub output: String,
    /// Number of call sites replaced, nested ones included.
    pub rewritten: usize,
    /// Errors for call sites left as written, plus warnings.
    pub diagnostics: Vec<RetrofitError>,
}

impl RewriteOutcome {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| !d.is_warning())
    }

    pub fn errors(&self) -> impl Iterator<Item = &RetrofitError> {
        self.diagnostics.iter().filter(|d| !d.is_warning())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &RetrofitError> {
        self.diagnostics.iter().filter(|d| d.is_warning())
    }

    fn absorb(&mut self, other: RewriteOutcome) {
        self.rewritten += other.rewritten;
        self.diagnostics.extend(other.diagnostics);
    }
}

// ============================================================================
// REWRITER
// ============================================================================

#[derive(Debug, Clone)]
pub struct SourceRewriter {
    registry: AssertionRegistry,
    renderer: Renderer,
    fresh_name_prefix: String,
}

impl SourceRewriter {
    pub fn new(config: &RetrofitConfig) -> Result<Self, RetrofitError> {
        Ok(Self {
            registry: AssertionRegistry::with_config(config)?,
            renderer: Renderer::new(config.indent_width),
            fresh_name_prefix: config.fresh_name_prefix.clone(),
        })
    }

    pub fn standard() -> Result<Self, RetrofitError> {
        Self::new(&RetrofitConfig::default())
    }

    pub fn registry(&self) -> &AssertionRegistry {
        &self.registry
    }

    /// Rewrites every call site in `source`. Never fails as a whole: a call
    /// that cannot be rewritten keeps its text and adds a diagnostic.
    pub fn rewrite(&self, source: &SourceContext) -> RewriteOutcome {
        let _span = tracing::debug_span!("rewrite", source = %source.name).entered();

        let mut outcome = RewriteOutcome::default();
        match self.rewrite_fragment(source, &source.content, 0, 0, None, &mut outcome) {
            Ok(output) => outcome.output = output,
            Err(error) => {
                outcome.output = source.content.clone();
                outcome.diagnostics.push(error);
            }
        }

        tracing::debug!(
            rewritten = outcome.rewritten,
            diagnostics = outcome.diagnostics.len(),
            "finished source"
        );
        outcome
    }

    /// Rewrites text holding exactly one call expression (plus surrounding
    /// whitespace and comments). Fails with the first error diagnostic.
    pub fn rewrite_call_text(&self, text: &str) -> Result<String, RetrofitError> {
        let source = SourceContext::from_file("<input>", text);
        parse_call(&source)?;
        let outcome = self.rewrite(&source);
        let first = outcome.errors().next().cloned();
        match first {
            Some(error) => Err(error),
            None => Ok(outcome.output),
        }
    }

    fn rewrite_fragment(
        &self,
        source: &SourceContext,
        text: &str,
        offset: usize,
        depth: usize,
        parent: Option<&FreshNames>,
        outcome: &mut RewriteOutcome,
    ) -> Result<String, RetrofitError> {
        let calls = scan_call_sites(source, text, offset)?;
        if calls.is_empty() {
            return Ok(text.to_string());
        }

        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;
        for call in calls {
            let start = call.span.start - offset;
            let end = call.span.end - offset;
            output.push_str(&text[cursor..start]);

            let fresh = match parent {
                Some(parent) => parent.child(call.span.start),
                None => FreshNames::root(self.fresh_name_prefix.clone(), &source.name, call.span.start),
            };
            let replacement = self.rewrite_site(source, call, &text[start..end], depth, fresh, outcome);
            output.push_str(&replacement);
            cursor = end;
        }
        output.push_str(&text[cursor..]);
        Ok(output)
    }

    fn rewrite_site(
        &self,
        source: &SourceContext,
        mut call: CallExpr,
        original: &str,
        depth: usize,
        fresh: FreshNames,
        outcome: &mut RewriteOutcome,
    ) -> String {
        if depth >= MAX_NESTING_DEPTH {
            tracing::warn!(offset = call.span.start, "nesting too deep, leaving call as written");
            return original.to_string();
        }

        let Some(rule) = self.registry.resolve(&call) else {
            return self.pass_through(source, &call, original, depth, &fresh, outcome);
        };

        let mut nested = RewriteOutcome::default();
        for (fragment, at) in call.fragments_mut() {
            match self.rewrite_fragment(source, fragment, at, depth + 1, Some(&fresh), &mut nested) {
                Ok(rewritten) => *fragment = rewritten,
                Err(error) => nested.diagnostics.push(error),
            }
        }

        let mut ctx = ExpansionContext::new(source, fresh.clone());
        ctx.reserved = self.renderer.render_call(&call);

        match rewrite_call(rule, &call, &mut ctx) {
            Ok(rewritten) => {
                outcome.absorb(nested);
                outcome.diagnostics.extend(ctx.diagnostics);
                outcome.rewritten += 1;
                let text = self
                    .renderer
                    .render_call_at(&rewritten, line_indentation(&source.content, call.span.start));
                tracing::trace!(assertion = %rule.name, output = %text, "rewrote call site");
                text
            }
            Err(error) => {
                tracing::warn!(code = %error.diagnostic_info.error_code, "{}", error);
                outcome.diagnostics.extend(ctx.diagnostics);
                outcome.diagnostics.push(error);
                self.pass_through(source, &call, original, depth, &fresh, outcome)
            }
        }
    }

    /// Keeps the call's own text but still rewrites legacy calls inside it.
    fn pass_through(
        &self,
        source: &SourceContext,
        call: &CallExpr,
        original: &str,
        depth: usize,
        fresh: &FreshNames,
        outcome: &mut RewriteOutcome,
    ) -> String {
        let Some(rest) = original.strip_prefix('#') else {
            return original.to_string();
        };
        match self.rewrite_fragment(source, rest, call.span.start + 1, depth + 1, Some(fresh), outcome) {
            Ok(rewritten) => format!("#{rewritten}"),
            Err(error) => {
                outcome.diagnostics.push(error);
                original.to_string()
            }
        }
    }
}

/// Leading spaces and tabs of the line containing `offset`.
fn line_indentation(content: &str, offset: usize) -> &str {
    let line_start = content[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line = &content[line_start..];
    let width = line
        .bytes()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count();
    &line[..width]
}

// ============================================================================
// CONVENIENCE API
// ============================================================================

/// Rewrites a single call expression with the standard vocabulary.
pub fn rewrite_call_text(text: &str) -> Result<String, RetrofitError> {
    SourceRewriter::standard()?.rewrite_call_text(text)
}

/// Rewrites a whole source text with the standard vocabulary.
pub fn rewrite_source_text(name: &str, text: &str) -> Result<RewriteOutcome, RetrofitError> {
    Ok(SourceRewriter::standard()?.rewrite(&SourceContext::from_file(name, text)))
}

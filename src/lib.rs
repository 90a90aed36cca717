//! Retrofit rewrites legacy XCTest assertion macros (`#XCTAssertEqual(a, b)`)
//! into the expectation dialect (`#expect((a) == (b))`), one call site at a
//! time, keeping every other byte of the source as written.

pub mod ast;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod rewrite;
pub mod syntax;

pub use config::RetrofitConfig;
pub use engine::{rewrite_call_text, rewrite_source_text, RewriteOutcome, SourceRewriter};
pub use errors::{ErrorCategory, ErrorKind, RetrofitError, SourceContext};

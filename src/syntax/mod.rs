//! Syntax layer for Retrofit
//!
//! A small pest grammar stands in for the host compiler's parser: it finds
//! freestanding macro call sites in source text and captures their operands
//! as balanced fragments.

pub mod parser;

pub use parser::{is_balanced, is_identifier, parse_call, scan_call_sites};

//! Parses exported TypeScript declarations and generates equivalent Rust,
//! Protocol Buffers or JSON Schema definitions.

pub mod ast;
pub mod config;
pub mod conformance;
pub mod errors;
pub mod generated;
pub mod naming;
pub mod syntax;
pub mod transpile;

pub use ast::Module;
pub use config::Config;
pub use errors::{Error, Result};
pub use generated::{generate, Generated, Staleness};
pub use syntax::{parse_file, parse_module};
pub use transpile::{transpiler_for, Diagnostic, Output, Target, Transpiler};

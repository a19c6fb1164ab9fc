//! Compiler front end for the ELFIN control-systems language.
//!
//! ELFIN describes dynamical systems, Lyapunov and barrier certificates,
//! controller modes and planners in a small declarative syntax. This
//! crate lexes, parses and resolves ELFIN source into a typed IR with
//! physical-unit checking and constant folding over parameters; code
//! generation and verification live downstream.
//!
//! The pipeline never aborts on bad input: every stage collects
//! diagnostics and hands partial IR to the next, so one compile reports
//! as many problems as it can find.
//!
//! ```
//! let source = "system S { params { m [kg] = 1.0; l [m] = 0.5; i = m * l * l; } }";
//! let output = elfin_lang::compile("model.elfin", source.to_string());
//! assert!(!output.has_errors());
//! ```

pub mod ast;
pub mod compile;
pub mod error;
pub mod foundation;
pub mod lexer;
pub mod parser;
pub mod resolve;

pub use compile::{
    compile, compile_with_loader, CompileOutput, FsLoader, LoadError, MemoryLoader, SourceLoader,
};
pub use error::{CompileError, DiagnosticFormatter, ErrorKind, Severity};
pub use foundation::{SourceMap, Span, Unit, UnitDimensions};

/// Crate version, surfaced by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

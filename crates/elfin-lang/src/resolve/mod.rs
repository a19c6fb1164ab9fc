//! Semantic resolution: names, references, units, constant folding.
//!
//! Two independent passes. [`resolve_names`] is read-only and reports
//! duplicates, dangling references and out-of-scope variables.
//! [`fold_units`] mutates the unit, attaching a [`crate::ast::FoldedValue`]
//! to every parameter whose defining expression is compile-time constant,
//! and reports unit violations found along the way.

pub mod fold;
pub mod names;
pub mod units;

pub use fold::fold_units;
pub use names::{resolve_names, SymbolTables, BUILTIN_CONSTANTS, BUILTIN_FUNCTIONS};
pub use units::resolve_unit_expr;

use crate::ast::CompilationUnit;
use crate::error::CompileError;

/// Run the name-resolution pass.
pub fn resolve(unit: &CompilationUnit) -> Vec<CompileError> {
    resolve_names(unit)
}

//! Foundation types shared by every compiler stage.

pub mod span;
pub mod unit;

pub use span::{SourceFile, SourceMap, Span};
pub use unit::{Unit, UnitDimensions};

//! Abstract syntax tree for the ELFIN DSL.
//!
//! The tree is built bottom-up by the parser and is structurally immutable
//! afterwards; the unit/constant-folding pass only adds annotations
//! (`ParamDef::folded`), it never reshapes nodes.

pub mod decl;
pub mod expr;

pub use decl::{
    BarrierDecl, CompilationUnit, Declaration, Equation, FoldedValue, HelperFunction,
    HelpersBlock, ImportDecl, IntegrationDecl, LyapunovDecl, ModeDecl, ParamDef, PlannerDecl,
    SystemDecl,
};
pub use expr::{BinaryOp, Expr, ExprKind, UnaryOp, UnitExpr};

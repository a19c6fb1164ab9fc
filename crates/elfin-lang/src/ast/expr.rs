//! Expression nodes.
//!
//! Each node owns its children exclusively (a tree, no sharing, no
//! cycles). `Parenthesized` is kept as an explicit node so the printed
//! tree round-trips the source's grouping.

use crate::foundation::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `**`
    Pow,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl BinaryOp {
    /// Source symbol for this operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Pow => "**",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }

    /// True for `==`, `!=`, `<`, `<=`, `>`, `>=`.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `-`
    Neg,
}

/// Expression node kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    /// Numeric literal
    Number(f64),
    /// String literal
    Str(String),
    /// Variable reference (a bare NAME not followed by `(`)
    Var(String),
    /// List literal `[a, b, c]`
    List(Vec<Expr>),
    /// Object literal `{k: v, ...}`
    ///
    /// Keys are not required to be unique at parse time; duplicates are a
    /// resolver concern.
    Object(Vec<(String, Expr)>),
    /// Member access `base.field`
    Member {
        /// Accessed expression
        base: Box<Expr>,
        /// Field name
        field: String,
    },
    /// Unary operation
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },
    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
    },
    /// Conditional `if cond then a else b`
    Conditional {
        /// Condition
        cond: Box<Expr>,
        /// Value when the condition holds
        then_branch: Box<Expr>,
        /// Value otherwise
        else_branch: Box<Expr>,
    },
    /// Function call `name(args...)`
    Call {
        /// Callee name
        name: String,
        /// Arguments in source order
        args: Vec<Expr>,
    },
    /// Parenthesized expression `( inner )`
    Parenthesized(Box<Expr>),
}

/// Expression with source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// Expression kind
    pub kind: ExprKind,
    /// Source location for error messages
    pub span: Span,
}

impl Expr {
    /// Create a new expression node.
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Create a numeric literal.
    pub fn number(value: f64, span: Span) -> Self {
        Self::new(ExprKind::Number(value), span)
    }

    /// Create a variable reference.
    pub fn var(name: impl Into<String>, span: Span) -> Self {
        Self::new(ExprKind::Var(name.into()), span)
    }

    /// Strip any number of `Parenthesized` wrappers.
    pub fn unparenthesized(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Parenthesized(inner) = &expr.kind {
            expr = inner;
        }
        expr
    }
}

/// Unit annotation syntax, as written inside `[...]` brackets.
///
/// Resolution into a semantic [`crate::foundation::Unit`] happens in
/// `resolve::units`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnitExpr {
    /// Base unit name: `m`, `kg`, `s`, ...
    Base(String),
    /// Dimensionless shorthand: `1`
    Dimensionless,
    /// Multiplication: `N*m`
    Multiply(Box<UnitExpr>, Box<UnitExpr>),
    /// Division: `m/s`
    Divide(Box<UnitExpr>, Box<UnitExpr>),
    /// Power: `s^2`, `s^-1`
    Power(Box<UnitExpr>, i8),
}

impl fmt::Display for UnitExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitExpr::Base(name) => write!(f, "{}", name),
            UnitExpr::Dimensionless => write!(f, "1"),
            UnitExpr::Multiply(a, b) => write!(f, "{}*{}", a, b),
            UnitExpr::Divide(a, b) => write!(f, "{}/{}", a, b),
            UnitExpr::Power(base, exp) => write!(f, "{}^{}", base, exp),
        }
    }
}

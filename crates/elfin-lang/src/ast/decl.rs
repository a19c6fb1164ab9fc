//! Top-level declarations and the compilation unit.
//!
//! One struct per section kind, collected behind the [`Declaration`] enum.
//! Ordered collections (`Vec`) are used wherever the language makes source
//! order significant: parameters, equations, object items, barrier
//! references. Name-keyed lookup belongs to the resolver, not the tree.

use crate::ast::expr::{Expr, UnitExpr};
use crate::foundation::{Span, Unit};
use serde::{Deserialize, Serialize};

/// `import Alias from "path";`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDecl {
    /// Alias the import is known by
    pub alias: String,
    /// Relative path string, resolved by a caller-supplied loader
    pub path: String,
    /// Source location
    pub span: Span,
}

/// One function inside a `helpers` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelperFunction {
    /// Function name
    pub name: String,
    /// Parameter names in source order
    pub parameters: Vec<String>,
    /// Body expression
    pub body: Expr,
    /// Source location
    pub span: Span,
}

/// `helpers Name? { fn(a, b) = expr; ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpersBlock {
    /// Optional block name
    pub name: Option<String>,
    /// Functions in source order
    pub functions: Vec<HelperFunction>,
    /// Source location
    pub span: Span,
}

/// Constant-folding result attached to a [`ParamDef`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldedValue {
    /// Compile-time numeric value
    pub value: f64,
    /// Resolved unit of that value
    pub unit: Unit,
}

/// One parameter definition inside a `params` block.
///
/// Surface form: `name (":" dimension)? ("[" unit "]")? "=" expr ";"?` —
/// the dimension label (`g: acceleration[m/s^2] = 9.81`) is recorded but
/// uninterpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    /// Parameter name
    pub name: String,
    /// Optional dimension label (uninterpreted)
    pub dimension: Option<String>,
    /// Optional unit annotation
    pub unit: Option<UnitExpr>,
    /// Defining expression
    pub value: Expr,
    /// Populated by the fold pass iff the expression is compile-time-constant
    pub folded: Option<FoldedValue>,
    /// Source location
    pub span: Span,
}

/// `lhs = rhs;` inside `flow_dynamics` or `controller`.
///
/// Order within a block is significant: later equations may reference
/// earlier left-hand sides, never the reverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equation {
    /// Left-hand-side name
    pub lhs: String,
    /// Right-hand-side expression
    pub rhs: Expr,
    /// Source location
    pub span: Span,
}

/// `system Name { continuous_state ... input ... params ... flow_dynamics ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDecl {
    /// System name
    pub name: String,
    /// Continuous state variable names in source order
    pub continuous_state: Vec<String>,
    /// Input variable names in source order
    pub inputs: Vec<String>,
    /// Parameters in source order
    pub params: Vec<ParamDef>,
    /// ODE right-hand-side equations in source order
    pub flow_dynamics: Vec<Equation>,
    /// Source location
    pub span: Span,
}

/// `lyapunov Name { system Sys; V = expr; params { ... } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyapunovDecl {
    /// Declaration name
    pub name: String,
    /// Referenced system name (None only for structurally broken input)
    pub system_ref: Option<String>,
    /// Candidate Lyapunov function
    pub v: Option<Expr>,
    /// Parameters in source order
    pub params: Vec<ParamDef>,
    /// Source location
    pub span: Span,
}

/// `barrier Name { system Sys; B = expr; alphafun = expr; params { ... } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarrierDecl {
    /// Declaration name
    pub name: String,
    /// Referenced system name
    pub system_ref: Option<String>,
    /// Barrier function (B >= 0 is the safe set)
    pub b: Option<Expr>,
    /// Class-K alpha function
    pub alpha_fun: Option<Expr>,
    /// Parameters in source order
    pub params: Vec<ParamDef>,
    /// Source location
    pub span: Span,
}

/// `mode Name { system ...; lyapunov ...; barrier ...; controller { ... } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeDecl {
    /// Declaration name
    pub name: String,
    /// Referenced system name
    pub system_ref: Option<String>,
    /// Optional Lyapunov certificate reference
    pub lyapunov_ref: Option<String>,
    /// Barrier references in source order (repeatable, accumulates)
    pub barrier_refs: Vec<String>,
    /// Controller equations in source order
    pub controller: Vec<Equation>,
    /// Parameters in source order
    pub params: Vec<ParamDef>,
    /// Source location
    pub span: Span,
}

/// `planner Name { system ...; config { ... } obstacles [...]; params { ... } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerDecl {
    /// Declaration name
    pub name: String,
    /// Referenced system name
    pub system_ref: Option<String>,
    /// Configuration entries in source order
    pub config: Vec<(String, Expr)>,
    /// Obstacle expressions in source order
    pub obstacles: Vec<Expr>,
    /// Parameters in source order
    pub params: Vec<ParamDef>,
    /// Source location
    pub span: Span,
}

/// `integration Name { planner P; controller M; config { ... } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationDecl {
    /// Declaration name
    pub name: String,
    /// Referenced planner name
    pub planner_ref: Option<String>,
    /// Referenced controller (mode) name
    pub controller_ref: Option<String>,
    /// Configuration entries in source order
    pub config: Vec<(String, Expr)>,
    /// Source location
    pub span: Span,
}

/// Any top-level declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Declaration {
    /// Import statement
    Import(ImportDecl),
    /// Helpers block
    Helpers(HelpersBlock),
    /// Dynamical system
    System(SystemDecl),
    /// Lyapunov certificate
    Lyapunov(LyapunovDecl),
    /// Barrier certificate
    Barrier(BarrierDecl),
    /// Controller mode
    Mode(ModeDecl),
    /// Planner
    Planner(PlannerDecl),
    /// Planner/controller integration
    Integration(IntegrationDecl),
}

impl Declaration {
    /// Declaration name, if the kind has one (imports use their alias).
    pub fn name(&self) -> Option<&str> {
        match self {
            Declaration::Import(d) => Some(&d.alias),
            Declaration::Helpers(d) => d.name.as_deref(),
            Declaration::System(d) => Some(&d.name),
            Declaration::Lyapunov(d) => Some(&d.name),
            Declaration::Barrier(d) => Some(&d.name),
            Declaration::Mode(d) => Some(&d.name),
            Declaration::Planner(d) => Some(&d.name),
            Declaration::Integration(d) => Some(&d.name),
        }
    }

    /// Kind name for diagnostics ("system", "mode", ...).
    pub fn kind_name(&self) -> &'static str {
        match self {
            Declaration::Import(_) => "import",
            Declaration::Helpers(_) => "helpers",
            Declaration::System(_) => "system",
            Declaration::Lyapunov(_) => "lyapunov",
            Declaration::Barrier(_) => "barrier",
            Declaration::Mode(_) => "mode",
            Declaration::Planner(_) => "planner",
            Declaration::Integration(_) => "integration",
        }
    }

    /// Source location of the whole declaration.
    pub fn span(&self) -> Span {
        match self {
            Declaration::Import(d) => d.span,
            Declaration::Helpers(d) => d.span,
            Declaration::System(d) => d.span,
            Declaration::Lyapunov(d) => d.span,
            Declaration::Barrier(d) => d.span,
            Declaration::Mode(d) => d.span,
            Declaration::Planner(d) => d.span,
            Declaration::Integration(d) => d.span,
        }
    }
}

/// All declarations parsed from one root source file plus the helper
/// blocks merged in from its transitive imports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// Declarations in source order (imported helpers appended after the
    /// root file's own declarations, in deterministic import order)
    pub decls: Vec<Declaration>,
    /// True once the fold pass has run over this unit; a second run is a
    /// no-op, so diagnostics are never duplicated
    #[serde(skip)]
    pub(crate) units_folded: bool,
}

impl CompilationUnit {
    /// Create an empty unit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate systems.
    pub fn systems(&self) -> impl Iterator<Item = &SystemDecl> {
        self.decls.iter().filter_map(|d| match d {
            Declaration::System(s) => Some(s),
            _ => None,
        })
    }

    /// Iterate helpers blocks.
    pub fn helpers(&self) -> impl Iterator<Item = &HelpersBlock> {
        self.decls.iter().filter_map(|d| match d {
            Declaration::Helpers(h) => Some(h),
            _ => None,
        })
    }

    /// Iterate imports.
    pub fn imports(&self) -> impl Iterator<Item = &ImportDecl> {
        self.decls.iter().filter_map(|d| match d {
            Declaration::Import(i) => Some(i),
            _ => None,
        })
    }

    /// Find a system by name.
    pub fn find_system(&self, name: &str) -> Option<&SystemDecl> {
        self.systems().find(|s| s.name == name)
    }

    /// Iterate modes.
    pub fn modes(&self) -> impl Iterator<Item = &ModeDecl> {
        self.decls.iter().filter_map(|d| match d {
            Declaration::Mode(m) => Some(m),
            _ => None,
        })
    }
}

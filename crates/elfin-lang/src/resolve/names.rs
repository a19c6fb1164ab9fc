//! Name tables and reference/scope checking.
//!
//! Two passes over the compilation unit: the first collects per-kind name
//! tables (declarations may reference sections declared later in source,
//! so nothing is checked until the tables are complete), the second
//! verifies cross-section references and the free variables of every
//! expression.
//!
//! Severity policy: duplicate names and dangling section references are
//! errors; an unknown variable inside an expression is a warning, since
//! downstream consumers may inject extra symbols.

use crate::ast::{
    CompilationUnit, Declaration, Expr, ExprKind, HelperFunction, SystemDecl,
};
use crate::error::{CompileError, ErrorKind};
use crate::foundation::Span;
use indexmap::{IndexMap, IndexSet};

/// Function names the resolver treats as always defined.
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "atan", "atan2", "asin", "acos", "tanh", "exp", "log", "sqrt", "abs",
    "min", "max", "sign", "floor", "ceil",
];

/// Constant names the resolver treats as always defined.
pub const BUILTIN_CONSTANTS: &[&str] = &["pi"];

/// Per-kind name tables, in declaration order.
pub struct SymbolTables<'a> {
    /// Systems by name
    pub systems: IndexMap<&'a str, &'a SystemDecl>,
    /// Lyapunov certificates by name
    pub lyapunovs: IndexMap<&'a str, Span>,
    /// Barrier certificates by name
    pub barriers: IndexMap<&'a str, Span>,
    /// Controller modes by name
    pub modes: IndexMap<&'a str, Span>,
    /// Planners by name
    pub planners: IndexMap<&'a str, Span>,
    /// Integrations by name
    pub integrations: IndexMap<&'a str, Span>,
    /// Helper functions by name, across all helpers blocks
    pub helpers: IndexMap<&'a str, &'a HelperFunction>,
    /// Import aliases
    pub imports: IndexMap<&'a str, Span>,
}

impl SymbolTables<'_> {
    /// True if the name is any declaration or import alias.
    fn is_declared(&self, name: &str) -> bool {
        self.systems.contains_key(name)
            || self.lyapunovs.contains_key(name)
            || self.barriers.contains_key(name)
            || self.modes.contains_key(name)
            || self.planners.contains_key(name)
            || self.integrations.contains_key(name)
            || self.imports.contains_key(name)
    }
}

/// Run the whole name-resolution pass.
pub fn resolve_names(unit: &CompilationUnit) -> Vec<CompileError> {
    let (tables, mut errors) = build_tables(unit);
    check_references(unit, &tables, &mut errors);
    check_scopes(unit, &tables, &mut errors);
    errors
}

/// Build the per-kind tables, reporting duplicates.
pub fn build_tables(unit: &CompilationUnit) -> (SymbolTables<'_>, Vec<CompileError>) {
    let mut errors = Vec::new();
    let mut tables = SymbolTables {
        systems: IndexMap::new(),
        lyapunovs: IndexMap::new(),
        barriers: IndexMap::new(),
        modes: IndexMap::new(),
        planners: IndexMap::new(),
        integrations: IndexMap::new(),
        helpers: IndexMap::new(),
        imports: IndexMap::new(),
    };

    for decl in &unit.decls {
        match decl {
            Declaration::Import(import) => {
                define(
                    &mut tables.imports,
                    &import.alias,
                    import.span,
                    import.span,
                    |s| *s,
                    "import alias",
                    &mut errors,
                );
            }
            Declaration::Helpers(block) => {
                for function in &block.functions {
                    define(
                        &mut tables.helpers,
                        &function.name,
                        function,
                        function.span,
                        |f| f.span,
                        "helper function",
                        &mut errors,
                    );
                }
            }
            Declaration::System(sys) => {
                define(
                    &mut tables.systems,
                    &sys.name,
                    sys,
                    sys.span,
                    |s| s.span,
                    "system",
                    &mut errors,
                );
            }
            Declaration::Lyapunov(lyap) => {
                define(
                    &mut tables.lyapunovs,
                    &lyap.name,
                    lyap.span,
                    lyap.span,
                    |s| *s,
                    "lyapunov",
                    &mut errors,
                );
            }
            Declaration::Barrier(barrier) => {
                define(
                    &mut tables.barriers,
                    &barrier.name,
                    barrier.span,
                    barrier.span,
                    |s| *s,
                    "barrier",
                    &mut errors,
                );
            }
            Declaration::Mode(mode) => {
                define(
                    &mut tables.modes,
                    &mode.name,
                    mode.span,
                    mode.span,
                    |s| *s,
                    "mode",
                    &mut errors,
                );
            }
            Declaration::Planner(planner) => {
                define(
                    &mut tables.planners,
                    &planner.name,
                    planner.span,
                    planner.span,
                    |s| *s,
                    "planner",
                    &mut errors,
                );
            }
            Declaration::Integration(integration) => {
                define(
                    &mut tables.integrations,
                    &integration.name,
                    integration.span,
                    integration.span,
                    |s| *s,
                    "integration",
                    &mut errors,
                );
            }
        }
    }

    (tables, errors)
}

fn define<'a, V>(
    map: &mut IndexMap<&'a str, V>,
    name: &'a str,
    value: V,
    span: Span,
    span_of: fn(&V) -> Span,
    kind: &str,
    errors: &mut Vec<CompileError>,
) {
    if let Some(first) = map.get(name) {
        errors.push(
            CompileError::new(
                ErrorKind::DuplicateName,
                span,
                format!("duplicate {} name '{}'", kind, name),
            )
            .with_label(span_of(first), "first defined here".to_string()),
        );
    } else {
        map.insert(name, value);
    }
}

/// Verify every cross-section reference points at a declaration of the
/// right kind.
fn check_references(unit: &CompilationUnit, tables: &SymbolTables, errors: &mut Vec<CompileError>) {
    for decl in &unit.decls {
        match decl {
            Declaration::Lyapunov(lyap) => {
                let referrer = Referrer::new("lyapunov", &lyap.name);
                require_system(tables, &lyap.system_ref, referrer, lyap.span, errors);
            }
            Declaration::Barrier(barrier) => {
                let referrer = Referrer::new("barrier", &barrier.name);
                require_system(tables, &barrier.system_ref, referrer, barrier.span, errors);
            }
            Declaration::Mode(mode) => {
                let referrer = Referrer::new("mode", &mode.name);
                require_system(tables, &mode.system_ref, referrer, mode.span, errors);
                require_in(
                    &tables.lyapunovs,
                    &mode.lyapunov_ref,
                    "lyapunov",
                    referrer,
                    mode.span,
                    errors,
                );
                for barrier in &mode.barrier_refs {
                    if !tables.barriers.contains_key(barrier.as_str()) {
                        errors.push(CompileError::new(
                            ErrorKind::UndefinedReference,
                            mode.span,
                            format!("unknown barrier '{}' referenced by {}", barrier, referrer),
                        ));
                    }
                }
            }
            Declaration::Planner(planner) => {
                let referrer = Referrer::new("planner", &planner.name);
                require_system(tables, &planner.system_ref, referrer, planner.span, errors);
            }
            Declaration::Integration(integration) => {
                let referrer = Referrer::new("integration", &integration.name);
                require_in(
                    &tables.planners,
                    &integration.planner_ref,
                    "planner",
                    referrer,
                    integration.span,
                    errors,
                );
                require_in(
                    &tables.modes,
                    &integration.controller_ref,
                    "controller mode",
                    referrer,
                    integration.span,
                    errors,
                );
            }
            _ => {}
        }
    }
}

/// The declaration holding a dangling reference, for diagnostics.
#[derive(Clone, Copy)]
struct Referrer<'a> {
    kind: &'a str,
    name: &'a str,
}

impl<'a> Referrer<'a> {
    fn new(kind: &'a str, name: &'a str) -> Self {
        Self { kind, name }
    }
}

impl std::fmt::Display for Referrer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)
    }
}

fn require_in(
    table: &IndexMap<&str, Span>,
    name: &Option<String>,
    kind: &str,
    referrer: Referrer,
    span: Span,
    errors: &mut Vec<CompileError>,
) {
    if let Some(name) = name {
        if !table.contains_key(name.as_str()) {
            errors.push(CompileError::new(
                ErrorKind::UndefinedReference,
                span,
                format!("unknown {} '{}' referenced by {}", kind, name, referrer),
            ));
        }
    }
}

fn require_system(
    tables: &SymbolTables,
    name: &Option<String>,
    referrer: Referrer,
    span: Span,
    errors: &mut Vec<CompileError>,
) {
    if let Some(name) = name {
        if !tables.systems.contains_key(name.as_str()) {
            errors.push(CompileError::new(
                ErrorKind::UndefinedReference,
                span,
                format!("unknown system '{}' referenced by {}", name, referrer),
            ));
        }
    }
}

/// Names visible inside a system's expressions: state, inputs, params.
fn system_scope<'a>(sys: &'a SystemDecl) -> IndexSet<&'a str> {
    let mut scope = IndexSet::new();
    scope.extend(sys.continuous_state.iter().map(String::as_str));
    scope.extend(sys.inputs.iter().map(String::as_str));
    scope.extend(sys.params.iter().map(|p| p.name.as_str()));
    scope
}

/// Scope for a declaration that references a system: the system's names
/// plus the declaration's own params.
fn referencing_scope<'a>(
    tables: &SymbolTables<'a>,
    system_ref: &Option<String>,
    own_params: &'a [crate::ast::ParamDef],
) -> IndexSet<&'a str> {
    let mut scope = match system_ref {
        Some(name) => match tables.systems.get(name.as_str()) {
            Some(sys) => system_scope(sys),
            None => IndexSet::new(),
        },
        None => IndexSet::new(),
    };
    scope.extend(own_params.iter().map(|p| p.name.as_str()));
    scope
}

/// Check the free variables of every expression in the unit.
fn check_scopes(unit: &CompilationUnit, tables: &SymbolTables, errors: &mut Vec<CompileError>) {
    for decl in &unit.decls {
        match decl {
            Declaration::Import(_) => {}
            Declaration::Helpers(block) => {
                for function in &block.functions {
                    let scope: IndexSet<&str> =
                        function.parameters.iter().map(String::as_str).collect();
                    check_expr(&function.body, &scope, &[], tables, errors);
                }
            }
            Declaration::System(sys) => {
                let scope = system_scope(sys);
                check_param_names(&sys.params, errors);
                for param in &sys.params {
                    check_expr(&param.value, &scope, &[], tables, errors);
                }
                check_equations(&sys.flow_dynamics, scope, tables, errors);
            }
            Declaration::Lyapunov(lyap) => {
                let scope = referencing_scope(tables, &lyap.system_ref, &lyap.params);
                check_param_names(&lyap.params, errors);
                for param in &lyap.params {
                    check_expr(&param.value, &scope, &[], tables, errors);
                }
                if let Some(v) = &lyap.v {
                    check_expr(v, &scope, &[], tables, errors);
                }
            }
            Declaration::Barrier(barrier) => {
                let scope = referencing_scope(tables, &barrier.system_ref, &barrier.params);
                check_param_names(&barrier.params, errors);
                for param in &barrier.params {
                    check_expr(&param.value, &scope, &[], tables, errors);
                }
                if let Some(b) = &barrier.b {
                    check_expr(b, &scope, &[], tables, errors);
                }
                if let Some(alpha) = &barrier.alpha_fun {
                    check_expr(alpha, &scope, &[], tables, errors);
                }
            }
            Declaration::Mode(mode) => {
                let scope = referencing_scope(tables, &mode.system_ref, &mode.params);
                check_param_names(&mode.params, errors);
                for param in &mode.params {
                    check_expr(&param.value, &scope, &[], tables, errors);
                }
                check_equations(&mode.controller, scope, tables, errors);
            }
            Declaration::Planner(planner) => {
                let scope = referencing_scope(tables, &planner.system_ref, &planner.params);
                check_param_names(&planner.params, errors);
                for param in &planner.params {
                    check_expr(&param.value, &scope, &[], tables, errors);
                }
                for (_, value) in &planner.config {
                    check_expr(value, &scope, &[], tables, errors);
                }
                for obstacle in &planner.obstacles {
                    check_expr(obstacle, &scope, &[], tables, errors);
                }
            }
            Declaration::Integration(integration) => {
                let scope = IndexSet::new();
                for (_, value) in &integration.config {
                    check_expr(value, &scope, &[], tables, errors);
                }
            }
        }
    }
}

/// Equation blocks see earlier left-hand sides; a reference to a later
/// one is flagged with a pointer at the definition. Each left-hand side
/// may be defined at most once per block.
fn check_equations<'a>(
    equations: &'a [crate::ast::Equation],
    mut scope: IndexSet<&'a str>,
    tables: &SymbolTables,
    errors: &mut Vec<CompileError>,
) {
    let mut defined: IndexMap<&str, Span> = IndexMap::new();
    for eq in equations {
        if let Some(first) = defined.get(eq.lhs.as_str()) {
            errors.push(
                CompileError::new(
                    ErrorKind::DuplicateName,
                    eq.span,
                    format!("duplicate equation for '{}'", eq.lhs),
                )
                .with_label(*first, "first defined here".to_string()),
            );
        } else {
            defined.insert(&eq.lhs, eq.span);
        }
    }

    let lhs_spans: Vec<(&str, Span)> = equations
        .iter()
        .map(|eq| (eq.lhs.as_str(), eq.span))
        .collect();
    for (i, eq) in equations.iter().enumerate() {
        check_expr(&eq.rhs, &scope, &lhs_spans[i..], tables, errors);
        scope.insert(&eq.lhs);
    }
}

/// Parameter names are unique within their block.
fn check_param_names(params: &[crate::ast::ParamDef], errors: &mut Vec<CompileError>) {
    let mut defined: IndexMap<&str, Span> = IndexMap::new();
    for param in params {
        if let Some(first) = defined.get(param.name.as_str()) {
            errors.push(
                CompileError::new(
                    ErrorKind::DuplicateName,
                    param.span,
                    format!("duplicate parameter name '{}'", param.name),
                )
                .with_label(*first, "first defined here".to_string()),
            );
        } else {
            defined.insert(&param.name, param.span);
        }
    }
}

fn check_expr(
    expr: &Expr,
    scope: &IndexSet<&str>,
    later: &[(&str, Span)],
    tables: &SymbolTables,
    errors: &mut Vec<CompileError>,
) {
    match &expr.kind {
        ExprKind::Number(_) | ExprKind::Str(_) => {}
        ExprKind::Var(name) => {
            check_var(name, expr.span, scope, later, tables, errors);
        }
        ExprKind::List(items) => {
            for item in items {
                check_expr(item, scope, later, tables, errors);
            }
        }
        ExprKind::Object(items) => {
            let mut seen: IndexMap<&str, Span> = IndexMap::new();
            for (key, value) in items {
                if let Some(first) = seen.get(key.as_str()) {
                    errors.push(
                        CompileError::new(
                            ErrorKind::DuplicateName,
                            value.span,
                            format!("duplicate key '{}' in object literal", key),
                        )
                        .with_label(*first, "first defined here".to_string()),
                    );
                } else {
                    seen.insert(key, value.span);
                }
                check_expr(value, scope, later, tables, errors);
            }
        }
        ExprKind::Member { base, .. } => {
            // only the root of a member chain resolves against the scope;
            // fields are opaque to this front end
            let root = member_root(base);
            if let ExprKind::Var(name) = &root.kind {
                if !tables.is_declared(name) {
                    check_var(name, root.span, scope, later, tables, errors);
                }
            } else {
                check_expr(root, scope, later, tables, errors);
            }
        }
        ExprKind::Unary { operand, .. } => {
            check_expr(operand, scope, later, tables, errors);
        }
        ExprKind::Binary { left, right, .. } => {
            check_expr(left, scope, later, tables, errors);
            check_expr(right, scope, later, tables, errors);
        }
        ExprKind::Conditional {
            cond,
            then_branch,
            else_branch,
        } => {
            check_expr(cond, scope, later, tables, errors);
            check_expr(then_branch, scope, later, tables, errors);
            check_expr(else_branch, scope, later, tables, errors);
        }
        ExprKind::Call { name, args } => {
            if let Some(helper) = tables.helpers.get(name.as_str()) {
                if helper.parameters.len() != args.len() {
                    errors.push(CompileError::new(
                        ErrorKind::Syntax,
                        expr.span,
                        format!(
                            "helper '{}' takes {} arguments, {} given",
                            name,
                            helper.parameters.len(),
                            args.len()
                        ),
                    ));
                }
            } else if !BUILTIN_FUNCTIONS.contains(&name.as_str()) {
                errors.push(CompileError::warning(
                    ErrorKind::UndefinedVariable,
                    expr.span,
                    format!("undefined function '{}'", name),
                ));
            }
            for arg in args {
                check_expr(arg, scope, later, tables, errors);
            }
        }
        ExprKind::Parenthesized(inner) => {
            check_expr(inner, scope, later, tables, errors);
        }
    }
}

fn check_var(
    name: &str,
    span: Span,
    scope: &IndexSet<&str>,
    later: &[(&str, Span)],
    tables: &SymbolTables,
    errors: &mut Vec<CompileError>,
) {
    if scope.contains(name) || BUILTIN_CONSTANTS.contains(&name) {
        return;
    }
    if let Some((_, def_span)) = later.iter().find(|(lhs, _)| *lhs == name) {
        errors.push(
            CompileError::warning(
                ErrorKind::ForwardReference,
                span,
                format!("'{}' is used before its defining equation", name),
            )
            .with_label(*def_span, "defined later here".to_string()),
        );
        return;
    }
    // helper names used as bare values would be caught here too
    if tables.helpers.contains_key(name) {
        return;
    }
    errors.push(CompileError::warning(
        ErrorKind::UndefinedVariable,
        span,
        format!("undefined variable '{}'", name),
    ));
}

fn member_root(expr: &Expr) -> &Expr {
    match &expr.kind {
        ExprKind::Member { base, .. } => member_root(base),
        _ => expr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse_unit;

    fn resolve(source: &str) -> Vec<CompileError> {
        let lexed = tokenize(source, 0);
        assert!(lexed.diagnostics.is_empty());
        let (unit, errors) = parse_unit(&lexed.tokens, &lexed.spans, 0);
        assert!(errors.is_empty(), "parse errors: {:?}", errors);
        resolve_names(&unit)
    }

    #[test]
    fn duplicate_system_names() {
        let errors = resolve("system A { }\nsystem A { }");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::DuplicateName);
        assert_eq!(errors[0].labels.len(), 1);
    }

    #[test]
    fn same_name_in_different_kinds_is_fine() {
        let errors = resolve("system A { }\nlyapunov A { system A; V = 1; }");
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn unknown_system_reference_names_both_ends() {
        let errors = resolve("mode M { system Ghost; controller { u = 0; } }");
        assert!(errors.iter().any(|e| e.kind == ErrorKind::UndefinedReference
            && e.message.contains("Ghost")
            && e.message.contains("mode 'M'")));
    }

    #[test]
    fn equation_sees_state_inputs_params_and_earlier_lhs() {
        let errors = resolve(
            "system S {\n\
             continuous_state: [x];\n\
             input: [u];\n\
             params { k = 2; }\n\
             flow_dynamics { v = k * u; x = v + x; }\n\
             }",
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn forward_equation_reference_warns_with_pointer() {
        let errors = resolve(
            "system S { continuous_state: [x]; flow_dynamics { x = v; v = 1; } }",
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::ForwardReference);
        assert_eq!(errors[0].severity, crate::error::Severity::Warning);
        assert_eq!(errors[0].labels.len(), 1);
    }

    #[test]
    fn builtins_and_helpers_resolve() {
        let errors = resolve(
            "helpers H { sq(x) = x * x; }\n\
             system S { continuous_state: [x]; flow_dynamics { x = sq(sin(x)) + pi; } }",
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn helper_arity_is_checked() {
        let errors = resolve(
            "helpers H { sq(x) = x * x; }\n\
             system S { continuous_state: [x]; flow_dynamics { x = sq(x, x); } }",
        );
        assert!(errors.iter().any(|e| e.message.contains("takes 1 arguments")));
    }

    #[test]
    fn undefined_variable_is_a_warning() {
        let errors = resolve("system S { continuous_state: [x]; flow_dynamics { x = y; } }");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::UndefinedVariable);
        assert_eq!(errors[0].severity, crate::error::Severity::Warning);
    }

    #[test]
    fn duplicate_equation_lhs_is_reported() {
        let errors = resolve(
            "system S { continuous_state: [x]; flow_dynamics { x = 1; x = 2; } }",
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::DuplicateName);
        assert!(errors[0].message.contains("duplicate equation for 'x'"));
        assert_eq!(errors[0].labels[0].message, "first defined here");
    }

    #[test]
    fn duplicate_param_name_is_reported() {
        let errors = resolve("system S { params { m = 1; m = 2; } }");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::DuplicateName);
        assert!(errors[0].message.contains("duplicate parameter name 'm'"));
    }

    #[test]
    fn duplicate_object_key_is_reported() {
        let errors = resolve(
            "planner P { system S; obstacles [ {center: 1, center: 2} ]; }\n\
             system S { }",
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::DuplicateName);
        assert!(errors[0].message.contains("duplicate key 'center'"));
    }

    #[test]
    fn member_chain_checks_only_the_root() {
        let errors = resolve(
            "system S { }\n\
             planner P { system S; config { goal: S.params.target; } }",
        );
        assert!(errors.is_empty(), "{:?}", errors);
    }
}

//! Unit propagation and constant folding over parameter definitions.
//!
//! Each `params` block is folded top to bottom: a parameter may use the
//! values of parameters defined above it (and, for declarations that
//! reference a system, that system's parameters). References to state or
//! input names are never foldable, so a parameter mentioning one keeps
//! `folded: None` without complaint; the name resolver has already
//! vetted the names themselves.
//!
//! Number literals carry a known dimensionless unit; `unit: None` is
//! reserved for operands whose unit genuinely cannot be determined, such
//! as a state reference. Adding a unitful parameter to a bare literal is
//! therefore a dimensional mismatch, while adding it to a state variable
//! is not checkable and stays silent.
//!
//! The pass runs at most once per unit: a flag on the compilation unit
//! makes a re-run a no-op, so the IR is stable and no diagnostic is ever
//! emitted twice.

use super::units::resolve_unit_expr;
use crate::ast::{BinaryOp, CompilationUnit, Declaration, Expr, ExprKind, FoldedValue, ParamDef, UnaryOp};
use crate::error::{CompileError, ErrorKind};
use crate::foundation::{Span, Unit};
use indexmap::IndexMap;

/// Partial fold result: either side may be unknown.
#[derive(Debug, Clone, Copy, Default)]
struct Folded {
    value: Option<f64>,
    unit: Option<Unit>,
}

impl Folded {
    const UNKNOWN: Folded = Folded {
        value: None,
        unit: None,
    };
}

/// Fold every `params` block in the unit. Systems are folded first so
/// their parameters are available to the declarations referencing them.
pub fn fold_units(unit: &mut CompilationUnit) -> Vec<CompileError> {
    if unit.units_folded {
        return Vec::new();
    }
    unit.units_folded = true;

    let mut errors = Vec::new();

    for decl in &mut unit.decls {
        if let Declaration::System(sys) = decl {
            fold_params(&mut sys.params, &IndexMap::new(), &mut errors);
        }
    }

    // snapshot of each system's folded params for pass two
    let mut system_envs: IndexMap<String, IndexMap<String, Folded>> = IndexMap::new();
    for sys in unit.systems() {
        let mut env = IndexMap::new();
        for param in &sys.params {
            env.insert(param.name.clone(), env_entry(param));
        }
        system_envs.insert(sys.name.clone(), env);
    }
    for decl in &mut unit.decls {
        match decl {
            Declaration::Lyapunov(lyap) => {
                let base = system_env(&system_envs, &lyap.system_ref);
                fold_params(&mut lyap.params, &base, &mut errors);
            }
            Declaration::Barrier(barrier) => {
                let base = system_env(&system_envs, &barrier.system_ref);
                fold_params(&mut barrier.params, &base, &mut errors);
            }
            Declaration::Mode(mode) => {
                let base = system_env(&system_envs, &mode.system_ref);
                fold_params(&mut mode.params, &base, &mut errors);
            }
            Declaration::Planner(planner) => {
                let base = system_env(&system_envs, &planner.system_ref);
                fold_params(&mut planner.params, &base, &mut errors);
            }
            _ => {}
        }
    }

    errors
}

fn system_env(
    envs: &IndexMap<String, IndexMap<String, Folded>>,
    name: &Option<String>,
) -> IndexMap<String, Folded> {
    name.as_ref()
        .and_then(|n| envs.get(n))
        .cloned()
        .unwrap_or_default()
}

fn env_entry(param: &ParamDef) -> Folded {
    match &param.folded {
        Some(folded) => Folded {
            value: Some(folded.value),
            unit: Some(folded.unit),
        },
        None => Folded::UNKNOWN,
    }
}

fn fold_params(
    params: &mut [ParamDef],
    base_env: &IndexMap<String, Folded>,
    errors: &mut Vec<CompileError>,
) {
    let names: Vec<(String, Span)> = params.iter().map(|p| (p.name.clone(), p.span)).collect();
    let mut env = base_env.clone();

    for i in 0..params.len() {
        if params[i].folded.is_some() {
            let entry = env_entry(&params[i]);
            env.insert(params[i].name.clone(), entry);
            continue;
        }

        let folded = fold_expr(&params[i].value, &env, &names[i..], errors);

        let declared = match &params[i].unit {
            Some(unit_expr) => match resolve_unit_expr(unit_expr, params[i].span) {
                Ok(unit) => Some(unit),
                Err(err) => {
                    errors.push(err);
                    None
                }
            },
            None => None,
        };

        // a dimensionless value (a literal, typically) takes the annotation
        // as its unit; only a conflicting non-trivial unit is worth a warning
        if let (Some(declared), Some(computed)) = (&declared, &folded.unit) {
            if !computed.is_dimensionless() && !declared.is_compatible_with(computed) {
                errors.push(CompileError::warning(
                    ErrorKind::DimensionalMismatch,
                    params[i].span,
                    format!(
                        "parameter '{}' is declared [{}] but its value has unit [{}]",
                        params[i].name, declared, computed
                    ),
                ));
            }
        }

        // the declared annotation wins over the computed unit
        let unit = declared.or(folded.unit);
        if let Some(value) = folded.value {
            params[i].folded = Some(FoldedValue {
                value,
                unit: unit.unwrap_or(Unit::DIMENSIONLESS),
            });
        }
        env.insert(
            params[i].name.clone(),
            Folded {
                value: folded.value,
                unit,
            },
        );
    }
}

fn fold_expr(
    expr: &Expr,
    env: &IndexMap<String, Folded>,
    later: &[(String, Span)],
    errors: &mut Vec<CompileError>,
) -> Folded {
    match &expr.kind {
        ExprKind::Number(value) => Folded {
            value: Some(*value),
            unit: Some(Unit::DIMENSIONLESS),
        },
        ExprKind::Str(_) => Folded::UNKNOWN,
        ExprKind::Var(name) => {
            if let Some(entry) = env.get(name) {
                return *entry;
            }
            if let Some((_, def_span)) = later.iter().find(|(n, _)| n == name) {
                errors.push(
                    CompileError::new(
                        ErrorKind::ForwardReference,
                        expr.span,
                        format!("parameter '{}' is used before its definition", name),
                    )
                    .with_label(*def_span, "defined later here".to_string()),
                );
                return Folded::UNKNOWN;
            }
            if name == "pi" {
                return Folded {
                    value: Some(std::f64::consts::PI),
                    unit: Some(Unit::DIMENSIONLESS),
                };
            }
            // state, input, or unknown name: not foldable
            Folded::UNKNOWN
        }
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => {
            let inner = fold_expr(operand, env, later, errors);
            Folded {
                value: inner.value.map(|v| -v),
                unit: inner.unit,
            }
        }
        ExprKind::Binary { op, left, right } => {
            let l = fold_expr(left, env, later, errors);
            let r = fold_expr(right, env, later, errors);
            fold_binary(*op, l, r, left, expr.span, errors)
        }
        ExprKind::Conditional {
            cond,
            then_branch,
            else_branch,
        } => {
            let c = fold_expr(cond, env, later, errors);
            let t = fold_expr(then_branch, env, later, errors);
            let e = fold_expr(else_branch, env, later, errors);
            match c.value {
                Some(value) => {
                    if value != 0.0 {
                        t
                    } else {
                        e
                    }
                }
                None => {
                    if let (Some(tu), Some(eu)) = (&t.unit, &e.unit) {
                        if !tu.is_compatible_with(eu) {
                            errors.push(CompileError::warning(
                                ErrorKind::UnitMismatchBetweenBranches,
                                expr.span,
                                format!(
                                    "conditional branches have different units: [{}] vs [{}]",
                                    tu, eu
                                ),
                            ));
                        }
                    }
                    Folded {
                        value: None,
                        unit: t.unit.or(e.unit),
                    }
                }
            }
        }
        ExprKind::Call { args, .. } => {
            // calls are never folded; still walk arguments so nested
            // parameter misuse is reported
            for arg in args {
                fold_expr(arg, env, later, errors);
            }
            Folded::UNKNOWN
        }
        ExprKind::List(items) => {
            for item in items {
                fold_expr(item, env, later, errors);
            }
            Folded::UNKNOWN
        }
        ExprKind::Object(items) => {
            for (_, value) in items {
                fold_expr(value, env, later, errors);
            }
            Folded::UNKNOWN
        }
        ExprKind::Member { .. } => Folded::UNKNOWN,
        ExprKind::Parenthesized(inner) => fold_expr(inner, env, later, errors),
    }
}

fn fold_binary(
    op: BinaryOp,
    l: Folded,
    r: Folded,
    left_expr: &Expr,
    span: Span,
    errors: &mut Vec<CompileError>,
) -> Folded {
    match op {
        BinaryOp::Add | BinaryOp::Sub => {
            let unit = checked_same_unit(op, &l, &r, span, errors);
            let value = match (l.value, r.value) {
                (Some(a), Some(b)) => Some(if op == BinaryOp::Add { a + b } else { a - b }),
                _ => None,
            };
            Folded { value, unit }
        }
        BinaryOp::Mul => Folded {
            value: l.value.zip(r.value).map(|(a, b)| a * b),
            unit: combine_units(&l, &r, Unit::multiply),
        },
        BinaryOp::Div => Folded {
            value: l.value.zip(r.value).map(|(a, b)| a / b),
            unit: combine_units(&l, &r, Unit::divide),
        },
        BinaryOp::Pow => fold_pow(l, r, left_expr, span, errors),
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            checked_same_unit(op, &l, &r, span, errors);
            let value = l.value.zip(r.value).map(|(a, b)| {
                let holds = match op {
                    BinaryOp::Eq => a == b,
                    BinaryOp::Ne => a != b,
                    BinaryOp::Lt => a < b,
                    BinaryOp::Le => a <= b,
                    BinaryOp::Gt => a > b,
                    BinaryOp::Ge => a >= b,
                    _ => unreachable!(),
                };
                if holds {
                    1.0
                } else {
                    0.0
                }
            });
            // a truth value is dimensionless
            Folded {
                value,
                unit: Some(Unit::DIMENSIONLESS),
            }
        }
    }
}

/// Unit rule for addition, subtraction and comparison: exponent vectors
/// must match. On mismatch a warning is recorded and the left operand's
/// unit carries the result.
fn checked_same_unit(
    op: BinaryOp,
    l: &Folded,
    r: &Folded,
    span: Span,
    errors: &mut Vec<CompileError>,
) -> Option<Unit> {
    match (&l.unit, &r.unit) {
        (Some(a), Some(b)) => {
            if !a.is_compatible_with(b) {
                let verb = match op {
                    BinaryOp::Add => "add",
                    BinaryOp::Sub => "subtract",
                    _ => "compare",
                };
                errors.push(CompileError::warning(
                    ErrorKind::DimensionalMismatch,
                    span,
                    format!("cannot {} [{}] and [{}]", verb, a, b),
                ));
            }
            Some(*a)
        }
        (Some(a), None) => Some(*a),
        (None, Some(b)) => Some(*b),
        (None, None) => None,
    }
}

/// Unit rule for `*` and `/`: a unitless side acts as dimensionless.
fn combine_units(l: &Folded, r: &Folded, combine: fn(&Unit, &Unit) -> Unit) -> Option<Unit> {
    match (&l.unit, &r.unit) {
        (None, None) => None,
        (a, b) => Some(combine(
            &a.unwrap_or(Unit::DIMENSIONLESS),
            &b.unwrap_or(Unit::DIMENSIONLESS),
        )),
    }
}

/// `**`: the exponent must be a compile-time constant for the unit to be
/// checkable; a unitful base additionally needs an integer exponent.
fn fold_pow(
    l: Folded,
    r: Folded,
    left_expr: &Expr,
    span: Span,
    errors: &mut Vec<CompileError>,
) -> Folded {
    let Some(exponent) = r.value else {
        if matches!(&l.unit, Some(u) if !u.is_dimensionless()) {
            errors.push(CompileError::note(
                ErrorKind::UnresolvedUnitExponent,
                span,
                format!(
                    "exponent of '{}' is not a compile-time constant; unit left unchecked",
                    display_hint(left_expr)
                ),
            ));
        }
        return Folded::UNKNOWN;
    };

    let value = l.value.map(|base| base.powf(exponent));
    let unit = match &l.unit {
        Some(unit) if !unit.is_dimensionless() => {
            if exponent.fract() == 0.0 && exponent.abs() <= i8::MAX as f64 {
                Some(unit.pow(exponent as i8))
            } else {
                errors.push(CompileError::note(
                    ErrorKind::UnresolvedUnitExponent,
                    span,
                    format!(
                        "non-integer exponent {} on unit [{}]; unit left unchecked",
                        exponent, unit
                    ),
                ));
                None
            }
        }
        Some(_) => Some(Unit::DIMENSIONLESS),
        None => None,
    };
    Folded { value, unit }
}

/// Short source-ish rendering of an expression for messages.
fn display_hint(expr: &Expr) -> String {
    match &expr.unparenthesized().kind {
        ExprKind::Var(name) => name.clone(),
        ExprKind::Number(value) => value.to_string(),
        _ => "expression".to_string(),
    }
}

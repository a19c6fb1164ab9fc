//! Unit propagation and constant folding across parameter blocks.

use elfin_lang::ast::{CompilationUnit, Declaration, ParamDef};
use elfin_lang::error::{CompileError, ErrorKind, Severity};
use elfin_lang::foundation::UnitDimensions;
use elfin_lang::lexer::tokenize;
use elfin_lang::parser::parse_unit;
use elfin_lang::resolve::fold_units;

fn fold(source: &str) -> (CompilationUnit, Vec<CompileError>) {
    let lexed = tokenize(source, 0);
    assert!(lexed.diagnostics.is_empty());
    let (mut unit, errors) = parse_unit(&lexed.tokens, &lexed.spans, 0);
    assert!(errors.is_empty(), "parse errors: {:?}", errors);
    let diags = fold_units(&mut unit);
    (unit, diags)
}

fn params(unit: &CompilationUnit) -> &[ParamDef] {
    for decl in &unit.decls {
        if let Declaration::System(sys) = decl {
            return &sys.params;
        }
    }
    panic!("no system");
}

#[test]
fn chained_params_fold_bottom_up() {
    let (unit, diags) = fold(
        "system S { params {\n\
         m [kg] = 1.0;\n\
         l [m] = 0.5;\n\
         inertia [kg*m^2] = m * l * l;\n\
         half_inertia = inertia / 2;\n\
         } }",
    );
    assert!(diags.is_empty(), "{:?}", diags);
    let params = params(&unit);
    let inertia = params[2].folded.as_ref().unwrap();
    assert_eq!(inertia.value, 0.25);
    assert_eq!(inertia.unit.dims, UnitDimensions::new(2, 1, 0, 0, 0, 0, 0, 0));
    assert_eq!(inertia.unit.to_string(), "m^2*kg");

    let half = params[3].folded.as_ref().unwrap();
    assert_eq!(half.value, 0.125);
    assert_eq!(half.unit.dims, inertia.unit.dims);
}

#[test]
fn derived_unit_names_match_their_expansion() {
    let (unit, diags) = fold(
        "system S { params {\n\
         m [kg] = 2.0;\n\
         g [m/s^2] = 9.81;\n\
         l [m] = 1.0;\n\
         e [J] = m * g * l;\n\
         } }",
    );
    assert!(diags.is_empty(), "energy in joules: {:?}", diags);
    let e = params(&unit)[3].folded.as_ref().unwrap();
    assert_eq!(e.unit.dims, UnitDimensions::new(2, 1, -2, 0, 0, 0, 0, 0));
}

#[test]
fn si_prefixes_scale_the_unit() {
    let (unit, diags) = fold("system S { params { d [km] = 3.0; t [ms] = 10.0; } }");
    assert!(diags.is_empty(), "{:?}", diags);
    let d = params(&unit)[0].folded.as_ref().unwrap();
    assert_eq!(d.unit.dims, UnitDimensions::METER);
    assert_eq!(d.unit.scale, 1e3);
    let t = params(&unit)[1].folded.as_ref().unwrap();
    assert_eq!(t.unit.dims, UnitDimensions::SECOND);
    assert_eq!(t.unit.scale, 1e-3);
}

#[test]
fn annotation_mismatch_is_warning_and_still_folds() {
    let (unit, diags) = fold("system S { params { l [m] = 2.0; t [s] = l; } }");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, ErrorKind::DimensionalMismatch);
    assert_eq!(diags[0].severity, Severity::Warning);
    // IR is still produced with the declared unit
    let t = params(&unit)[1].folded.as_ref().unwrap();
    assert_eq!(t.value, 2.0);
    assert_eq!(t.unit.dims, UnitDimensions::SECOND);
}

#[test]
fn literal_added_to_unitful_param_warns() {
    let (unit, diags) = fold("system S { params { x [m] = 1.0; y = x + 2.0; } }");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, ErrorKind::DimensionalMismatch);
    assert_eq!(diags[0].severity, Severity::Warning);
    // the left operand's unit carries
    let y = params(&unit)[1].folded.as_ref().unwrap();
    assert_eq!(y.value, 3.0);
    assert_eq!(y.unit.dims, UnitDimensions::METER);
}

#[test]
fn mixed_dimension_addition_warns_with_left_unit() {
    let (unit, diags) = fold("system S { params { m [kg] = 1.0; l [m] = 2.0; x = m + l; } }");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, ErrorKind::DimensionalMismatch);
    let x = params(&unit)[2].folded.as_ref().unwrap();
    assert_eq!(x.value, 3.0);
    assert_eq!(x.unit.dims, UnitDimensions::KILOGRAM);
}

#[test]
fn division_subtracts_exponents() {
    let (unit, diags) = fold("system S { params { l [m] = 10.0; t [s] = 2.0; v = l / t; } }");
    assert!(diags.is_empty(), "{:?}", diags);
    let v = params(&unit)[2].folded.as_ref().unwrap();
    assert_eq!(v.value, 5.0);
    assert_eq!(v.unit.dims, UnitDimensions::new(1, 0, -1, 0, 0, 0, 0, 0));
}

#[test]
fn unknown_unit_name_is_an_error() {
    let (unit, diags) = fold("system S { params { x [parsec] = 1.0; } }");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, ErrorKind::InvalidUnit);
    assert_eq!(diags[0].severity, Severity::Error);
    // the value still folds, dimensionless for lack of a better answer
    assert!(params(&unit)[0].folded.is_some());
}

#[test]
fn pow_by_nonconstant_is_a_note() {
    let (_, diags) = fold(
        "system S { continuous_state: [x]; params { l [m] = 2.0; y = l ** x; } }",
    );
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, ErrorKind::UnresolvedUnitExponent);
    assert_eq!(diags[0].severity, Severity::Note);
}

#[test]
fn dimensionless_base_ignores_nonconstant_exponent() {
    let (_, diags) = fold(
        "system S { continuous_state: [x]; params { k = 2.0; y = k ** x; } }",
    );
    assert!(diags.is_empty(), "{:?}", diags);
}

#[test]
fn conditional_branch_units_checked_when_unfoldable() {
    let (_, diags) = fold(
        "system S { continuous_state: [x]; params {\n\
         m [kg] = 1.0; l [m] = 2.0;\n\
         pick = if x > 0 then m else l;\n\
         } }",
    );
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, ErrorKind::UnitMismatchBetweenBranches);
    assert_eq!(diags[0].severity, Severity::Warning);
}

#[test]
fn constant_conditional_folds_to_one_branch() {
    let (unit, diags) = fold(
        "system S { params { lo = 1.0; hi = 2.0; pick = if lo < hi then lo else hi; } }",
    );
    assert!(diags.is_empty(), "{:?}", diags);
    assert_eq!(params(&unit)[2].folded.as_ref().unwrap().value, 1.0);
}

#[test]
fn forward_param_reference_is_error() {
    let (_, diags) = fold("system S { params { a = b + 1; b = 2; } }");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, ErrorKind::ForwardReference);
    assert_eq!(diags[0].severity, Severity::Error);
}

#[test]
fn fold_is_idempotent() {
    let source = "system S { params { m [kg] = 1.0; l [m] = 0.5; i [kg*m^2] = m * l * l; } }\n\
                  lyapunov L { system S; V = 1; params { k = i * 2; } }";
    let (mut unit, diags) = fold(source);
    assert!(diags.is_empty(), "{:?}", diags);
    let snapshot = unit.clone();
    let rerun = fold_units(&mut unit);
    assert!(rerun.is_empty(), "second run produced {:?}", rerun);
    assert_eq!(unit, snapshot);
}

#[test]
fn rerun_with_unfoldable_params_adds_no_diagnostics() {
    let (mut unit, diags) = fold("system S { params { a = b + 1; b = 2; } }");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, ErrorKind::ForwardReference);
    let snapshot = unit.clone();
    let rerun = fold_units(&mut unit);
    assert!(rerun.is_empty(), "{:?}", rerun);
    assert_eq!(unit, snapshot);
}

#[test]
fn mode_params_fold_against_their_system() {
    let (unit, diags) = fold(
        "system S { params { max_tau [N*m] = 5.0; } }\n\
         mode M { system S; controller { u = 0; } params { soft_limit = max_tau * 0.8; } }",
    );
    assert!(diags.is_empty(), "{:?}", diags);
    for decl in &unit.decls {
        if let Declaration::Mode(mode) = decl {
            let folded = mode.params[0].folded.as_ref().unwrap();
            assert_eq!(folded.value, 4.0);
            assert_eq!(folded.unit.dims, UnitDimensions::new(2, 1, -2, 0, 0, 0, 0, 0));
            return;
        }
    }
    panic!("no mode");
}

//! Resolution of surface unit syntax into semantic [`Unit`] values.
//!
//! A base name is looked up in the unit table first; if that fails, one SI
//! prefix is split off the front and the remainder looked up again, so
//! `km`, `ms`, `MHz` resolve without the table listing every combination.
//! Names in [`RESERVED_UNITS`] are never prefix-decomposed (`min` is
//! minutes, not milli-inches).

use crate::ast::UnitExpr;
use crate::error::{CompileError, ErrorKind};
use crate::foundation::{Span, Unit, UnitDimensions};

/// Unit names that must never be interpreted as prefix + unit.
const RESERVED_UNITS: &[&str] = &["min", "mol", "cd", "Pa"];

/// SI prefixes, longest spelling first so `da` wins over `d`.
const SI_PREFIXES: &[(&str, f64)] = &[
    ("da", 1e1),
    ("Y", 1e24),
    ("Z", 1e21),
    ("E", 1e18),
    ("P", 1e15),
    ("T", 1e12),
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("h", 1e2),
    ("d", 1e-1),
    ("c", 1e-2),
    ("m", 1e-3),
    ("u", 1e-6),
    ("n", 1e-9),
    ("p", 1e-12),
    ("f", 1e-15),
    ("a", 1e-18),
    ("z", 1e-21),
    ("y", 1e-24),
];

/// Look up an unprefixed unit name.
fn base_unit(name: &str) -> Option<Unit> {
    let unit = match name {
        "m" => Unit::base(UnitDimensions::METER),
        // mass is anchored at kilogram, so the gram carries a scale
        "g" => Unit::new(UnitDimensions::KILOGRAM, 1e-3),
        "s" => Unit::base(UnitDimensions::SECOND),
        "K" => Unit::base(UnitDimensions::KELVIN),
        "A" => Unit::base(UnitDimensions::AMPERE),
        "mol" => Unit::base(UnitDimensions::MOLE),
        "cd" => Unit::base(UnitDimensions::CANDELA),
        "rad" => Unit::base(UnitDimensions::RADIAN),
        "deg" => Unit::new(UnitDimensions::RADIAN, std::f64::consts::PI / 180.0),
        "N" => Unit::base(UnitDimensions::new(1, 1, -2, 0, 0, 0, 0, 0)),
        "J" => Unit::base(UnitDimensions::new(2, 1, -2, 0, 0, 0, 0, 0)),
        "W" => Unit::base(UnitDimensions::new(2, 1, -3, 0, 0, 0, 0, 0)),
        "Pa" => Unit::base(UnitDimensions::new(-1, 1, -2, 0, 0, 0, 0, 0)),
        "Hz" => Unit::base(UnitDimensions::new(0, 0, -1, 0, 0, 0, 0, 0)),
        "min" => Unit::new(UnitDimensions::SECOND, 60.0),
        _ => return None,
    };
    Some(unit)
}

/// Resolve a single unit name, trying a prefix split if the plain lookup
/// fails.
fn resolve_name(name: &str, span: Span) -> Result<Unit, CompileError> {
    if let Some(unit) = base_unit(name) {
        return Ok(unit);
    }
    if !RESERVED_UNITS.contains(&name) {
        for (prefix, factor) in SI_PREFIXES {
            if let Some(rest) = name.strip_prefix(prefix) {
                if let Some(unit) = base_unit(rest) {
                    return Ok(Unit::new(unit.dims, factor * unit.scale));
                }
            }
        }
    }
    Err(CompileError::new(
        ErrorKind::InvalidUnit,
        span,
        format!("unknown unit '{}'", name),
    ))
}

/// Resolve a parsed unit annotation into a semantic unit.
///
/// The whole annotation shares one source span; unit syntax is short
/// enough that finer blame is not worth carrying through the AST.
pub fn resolve_unit_expr(expr: &UnitExpr, span: Span) -> Result<Unit, CompileError> {
    match expr {
        UnitExpr::Base(name) => resolve_name(name, span),
        UnitExpr::Dimensionless => Ok(Unit::DIMENSIONLESS),
        UnitExpr::Multiply(a, b) => {
            let a = resolve_unit_expr(a, span)?;
            let b = resolve_unit_expr(b, span)?;
            Ok(a.multiply(&b))
        }
        UnitExpr::Divide(a, b) => {
            let a = resolve_unit_expr(a, span)?;
            let b = resolve_unit_expr(b, span)?;
            Ok(a.divide(&b))
        }
        UnitExpr::Power(base, exponent) => {
            let base = resolve_unit_expr(base, span)?;
            Ok(base.pow(*exponent))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::TokenStream;

    fn resolve(source: &str) -> Result<Unit, CompileError> {
        let lexed = tokenize(source, 0);
        let mut stream = TokenStream::new(&lexed.tokens, &lexed.spans, 0);
        let parsed = crate::parser::parse_unit_annotation(&mut stream).expect("unit syntax");
        resolve_unit_expr(&parsed, Span::zero(0))
    }

    #[test]
    fn acceleration() {
        let unit = resolve("m/s^2").unwrap();
        assert_eq!(unit.dims, UnitDimensions::new(1, 0, -2, 0, 0, 0, 0, 0));
        assert_eq!(unit.scale, 1.0);
    }

    #[test]
    fn prefixed_units() {
        let km = resolve("km").unwrap();
        assert_eq!(km.dims, UnitDimensions::METER);
        assert_eq!(km.scale, 1e3);

        let kg = resolve("kg").unwrap();
        assert_eq!(kg.dims, UnitDimensions::KILOGRAM);
        assert_eq!(kg.scale, 1.0);

        let mhz = resolve("MHz").unwrap();
        assert_eq!(mhz.dims.time, -1);
        assert_eq!(mhz.scale, 1e6);
    }

    #[test]
    fn reserved_names_are_not_decomposed() {
        // min = 60 s, not milli-"in"
        let min = resolve("min").unwrap();
        assert_eq!(min.dims, UnitDimensions::SECOND);
        assert_eq!(min.scale, 60.0);
    }

    #[test]
    fn newton_expands_to_base_dims() {
        let n = resolve("N").unwrap();
        let derived = resolve("kg*m/s^2").unwrap();
        assert_eq!(n, derived);
    }

    #[test]
    fn unknown_unit_is_invalid() {
        let err = resolve("furlong").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidUnit);
        assert!(err.message.contains("furlong"));
    }
}

//! Parser for unit annotations inside `[...]` brackets.
//!
//! Grammar:
//!
//! ```text
//! unit   := factor (("*" | "/") factor)*
//! factor := base ("^" "-"? NUMBER)?
//! base   := NAME | "1" | "(" unit ")"
//! ```
//!
//! `*` and `/` are left associative at equal precedence, so `m/s*s`
//! means `(m/s)*s`. Exponents must be integers.

use super::error::ParseError;
use super::stream::TokenStream;
use crate::ast::UnitExpr;
use crate::lexer::Token;

/// Parse a unit expression. Stops at the first token that cannot
/// continue the grammar (usually the closing `]`).
pub(super) fn parse_unit_expr(stream: &mut TokenStream) -> Result<UnitExpr, ParseError> {
    let mut expr = parse_factor(stream)?;
    loop {
        match stream.peek() {
            Some(Token::Star) => {
                stream.advance();
                let rhs = parse_factor(stream)?;
                expr = UnitExpr::Multiply(Box::new(expr), Box::new(rhs));
            }
            Some(Token::Slash) => {
                stream.advance();
                let rhs = parse_factor(stream)?;
                expr = UnitExpr::Divide(Box::new(expr), Box::new(rhs));
            }
            _ => break,
        }
    }
    Ok(expr)
}

fn parse_factor(stream: &mut TokenStream) -> Result<UnitExpr, ParseError> {
    let base = parse_base(stream)?;
    if stream.eat(&Token::Caret) {
        let negative = stream.eat(&Token::Minus);
        let span = stream.current_span();
        let exponent = match stream.advance() {
            Some(Token::Number(value)) => {
                if value.fract() != 0.0 || *value > i8::MAX as f64 {
                    return Err(ParseError::invalid_syntax(
                        format!("unit exponent must be a small integer, got {}", value),
                        span,
                    ));
                }
                let magnitude = *value as i8;
                if negative { -magnitude } else { magnitude }
            }
            other => {
                return Err(ParseError::unexpected_token(
                    other,
                    "after '^' (expected integer exponent)",
                    span,
                ));
            }
        };
        return Ok(UnitExpr::Power(Box::new(base), exponent));
    }
    Ok(base)
}

fn parse_base(stream: &mut TokenStream) -> Result<UnitExpr, ParseError> {
    let span = stream.current_span();
    match stream.peek() {
        Some(Token::Name(name)) => {
            let name = name.clone();
            stream.advance();
            Ok(UnitExpr::Base(name))
        }
        Some(Token::Number(value)) if *value == 1.0 => {
            stream.advance();
            Ok(UnitExpr::Dimensionless)
        }
        Some(Token::LParen) => {
            stream.advance();
            let inner = parse_unit_expr(stream)?;
            stream.expect(Token::RParen)?;
            Ok(inner)
        }
        other => Err(ParseError::unexpected_token(
            other,
            "in unit annotation (expected unit name, '1', or '(')",
            span,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(source: &str) -> UnitExpr {
        let lexed = tokenize(source, 0);
        let mut stream = TokenStream::new(&lexed.tokens, &lexed.spans, 0);
        let unit = parse_unit_expr(&mut stream).expect("unit parse failed");
        assert!(stream.at_end(), "unit parse left tokens in {:?}", source);
        unit
    }

    #[test]
    fn division_chain_is_left_associative() {
        assert_eq!(parse("m/s*s").to_string(), "m/s*s");
        let UnitExpr::Multiply(lhs, _) = parse("m/s*s") else {
            panic!("expected multiply at the top");
        };
        assert!(matches!(*lhs, UnitExpr::Divide(_, _)));
    }

    #[test]
    fn negative_exponent() {
        let unit = parse("s^-2");
        assert_eq!(unit, UnitExpr::Power(Box::new(UnitExpr::Base("s".into())), -2));
    }

    #[test]
    fn dimensionless_one() {
        assert_eq!(parse("1"), UnitExpr::Dimensionless);
        assert_eq!(parse("1/s"), UnitExpr::Divide(
            Box::new(UnitExpr::Dimensionless),
            Box::new(UnitExpr::Base("s".into())),
        ));
    }

    #[test]
    fn parenthesized_group() {
        let unit = parse("kg*(m/s^2)");
        assert!(matches!(unit, UnitExpr::Multiply(_, _)));
    }

    #[test]
    fn fractional_exponent_rejected() {
        let lexed = tokenize("m^0.5", 0);
        let mut stream = TokenStream::new(&lexed.tokens, &lexed.spans, 0);
        assert!(parse_unit_expr(&mut stream).is_err());
    }
}

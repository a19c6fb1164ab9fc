//! Expression parsing with precedence climbing.
//!
//! Precedence levels (loosest to tightest):
//!
//! | level | operators            | assoc |
//! |-------|----------------------|-------|
//! | 20    | `==` `!=`            | left  |
//! | 30    | `<` `<=` `>` `>=`    | left  |
//! | 40    | `+` `-`              | left  |
//! | 50    | `*` `/`              | left  |
//! | 60    | `**`                 | right |
//!
//! `if ... then ... else ...` sits below all of them and is right
//! associative. Unary minus binds tighter than `**`, so `-x**2`
//! parses as `(-x)**2`.

use super::error::ParseError;
use super::stream::TokenStream;
use crate::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::lexer::Token;

/// Operator associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

/// Binding power and associativity for a binary operator token.
fn binary_op_info(token: &Token) -> Option<(u8, Assoc, BinaryOp)> {
    match token {
        Token::EqEq => Some((20, Assoc::Left, BinaryOp::Eq)),
        Token::BangEq => Some((20, Assoc::Left, BinaryOp::Ne)),
        Token::Lt => Some((30, Assoc::Left, BinaryOp::Lt)),
        Token::LtEq => Some((30, Assoc::Left, BinaryOp::Le)),
        Token::Gt => Some((30, Assoc::Left, BinaryOp::Gt)),
        Token::GtEq => Some((30, Assoc::Left, BinaryOp::Ge)),
        Token::Plus => Some((40, Assoc::Left, BinaryOp::Add)),
        Token::Minus => Some((40, Assoc::Left, BinaryOp::Sub)),
        Token::Star => Some((50, Assoc::Left, BinaryOp::Mul)),
        Token::Slash => Some((50, Assoc::Left, BinaryOp::Div)),
        Token::StarStar => Some((60, Assoc::Right, BinaryOp::Pow)),
        _ => None,
    }
}

/// Parse a full expression, conditional form included.
pub(super) fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    if matches!(stream.peek(), Some(Token::If)) {
        parse_conditional(stream)
    } else {
        parse_pratt(stream, 0)
    }
}

/// `if cond then a else b`, right associative via recursion on both arms.
fn parse_conditional(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::If)?;
    let cond = parse_pratt(stream, 0)?;
    stream.expect(Token::Then)?;
    let then_branch = parse_expr(stream)?;
    stream.expect(Token::Else)?;
    let else_branch = parse_expr(stream)?;
    Ok(Expr::new(
        ExprKind::Conditional {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        },
        stream.span_from(start),
    ))
}

/// Precedence-climbing loop over binary operators.
fn parse_pratt(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let mut left = parse_prefix(stream)?;

    while let Some(token) = stream.peek() {
        let Some((prec, assoc, op)) = binary_op_info(token) else {
            break;
        };
        if prec < min_prec {
            break;
        }
        stream.advance();

        let next_min = match assoc {
            Assoc::Left => prec + 1,
            Assoc::Right => prec,
        };
        let right = parse_pratt(stream, next_min)?;
        left = Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            stream.span_from(start),
        );
    }

    Ok(left)
}

/// Prefix operators. Unary minus applies to the whole postfix chain,
/// which makes it bind tighter than any binary operator.
fn parse_prefix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    if matches!(stream.peek(), Some(Token::Minus)) {
        let start = stream.current_pos();
        stream.advance();
        let operand = parse_prefix(stream)?;
        return Ok(Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            },
            stream.span_from(start),
        ));
    }
    parse_postfix(stream)
}

/// Postfix chain: member access only.
fn parse_postfix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let mut expr = parse_atom(stream)?;

    while matches!(stream.peek(), Some(Token::Dot)) {
        stream.advance();
        // keywords are legal field names: `Sys.params.mass`
        let field = match stream.advance() {
            Some(token) => match token.name_lexeme() {
                Some(name) => name.to_string(),
                None => {
                    return Err(ParseError::unexpected_token(
                        Some(token),
                        "after '.' (expected field name)",
                        stream.span_from(start),
                    ));
                }
            },
            None => {
                return Err(ParseError::unexpected_token(
                    None,
                    "after '.' (expected field name)",
                    stream.span_from(start),
                ));
            }
        };
        expr = Expr::new(
            ExprKind::Member {
                base: Box::new(expr),
                field,
            },
            stream.span_from(start),
        );
    }

    Ok(expr)
}

fn parse_atom(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let span = stream.current_span();
    match stream.peek() {
        Some(Token::Number(value)) => {
            let value = *value;
            stream.advance();
            Ok(Expr::number(value, span))
        }
        Some(Token::Str(text)) => {
            let text = text.clone();
            stream.advance();
            Ok(Expr::new(ExprKind::Str(text), span))
        }
        Some(Token::Name(name)) => {
            let name = name.clone();
            stream.advance();
            if stream.check(&Token::LParen) {
                let args = parse_call_args(stream)?;
                Ok(Expr::new(
                    ExprKind::Call { name, args },
                    stream.span_from(start),
                ))
            } else {
                Ok(Expr::var(name, span))
            }
        }
        Some(Token::LBracket) => parse_list(stream),
        Some(Token::LBrace) => parse_object(stream),
        Some(Token::LParen) => {
            stream.advance();
            let inner = parse_expr(stream)?;
            stream.expect(Token::RParen)?;
            Ok(Expr::new(
                ExprKind::Parenthesized(Box::new(inner)),
                stream.span_from(start),
            ))
        }
        other => Err(ParseError::unexpected_token(
            other,
            "in expression",
            span,
        )),
    }
}

/// `( expr, expr, ... )` after a callee name.
fn parse_call_args(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    stream.expect(Token::LParen)?;
    let mut args = Vec::new();
    if !stream.check(&Token::RParen) {
        loop {
            args.push(parse_expr(stream)?);
            if !stream.eat(&Token::Comma) {
                break;
            }
            // trailing comma
            if stream.check(&Token::RParen) {
                break;
            }
        }
    }
    stream.expect(Token::RParen)?;
    Ok(args)
}

/// `[ expr, expr, ... ]`
fn parse_list(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::LBracket)?;
    let mut items = Vec::new();
    if !stream.check(&Token::RBracket) {
        loop {
            items.push(parse_expr(stream)?);
            if !stream.eat(&Token::Comma) {
                break;
            }
            if stream.check(&Token::RBracket) {
                break;
            }
        }
    }
    stream.expect(Token::RBracket)?;
    Ok(Expr::new(ExprKind::List(items), stream.span_from(start)))
}

/// `{ key: expr, key: expr, ... }`
fn parse_object(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::LBrace)?;
    let mut items = Vec::new();
    if !stream.check(&Token::RBrace) {
        loop {
            // keys follow the same rule as member fields: keywords allowed
            let key = match stream.advance() {
                Some(token) => match token.name_lexeme() {
                    Some(name) => name.to_string(),
                    None => {
                        return Err(ParseError::unexpected_token(
                            Some(token),
                            "in object literal (expected key name)",
                            stream.span_from(start),
                        ));
                    }
                },
                None => {
                    return Err(ParseError::unexpected_token(
                        None,
                        "in object literal (expected key name)",
                        stream.span_from(start),
                    ));
                }
            };
            stream.expect(Token::Colon)?;
            let value = parse_expr(stream)?;
            items.push((key, value));
            if !stream.eat(&Token::Comma) {
                break;
            }
            if stream.check(&Token::RBrace) {
                break;
            }
        }
    }
    stream.expect(Token::RBrace)?;
    Ok(Expr::new(ExprKind::Object(items), stream.span_from(start)))
}

#[cfg(test)]
mod tests {
    use crate::ast::{BinaryOp, ExprKind, UnaryOp};
    use crate::lexer::tokenize;
    use crate::parser::parse_expr;

    fn parse(source: &str) -> crate::ast::Expr {
        let lexed = tokenize(source, 0);
        assert!(lexed.diagnostics.is_empty(), "lex errors in {:?}", source);
        parse_expr(&lexed.tokens, &lexed.spans, 0).expect("parse failed")
    }

    #[test]
    fn pow_is_right_associative() {
        let expr = parse("2 ** 3 ** 2");
        let ExprKind::Binary { op, right, .. } = &expr.kind else {
            panic!("expected binary, got {:?}", expr.kind);
        };
        assert_eq!(*op, BinaryOp::Pow);
        assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Pow, .. }));
    }

    #[test]
    fn unary_minus_binds_tighter_than_pow() {
        let expr = parse("-x ** 2");
        let ExprKind::Binary { op, left, .. } = &expr.kind else {
            panic!("expected binary, got {:?}", expr.kind);
        };
        assert_eq!(*op, BinaryOp::Pow);
        assert!(matches!(
            left.kind,
            ExprKind::Unary { op: UnaryOp::Neg, .. }
        ));
    }

    #[test]
    fn equality_binds_looser_than_relational() {
        // a == b < c parses as a == (b < c)
        let expr = parse("a == b < c");
        let ExprKind::Binary { op, right, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Eq);
        assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Lt, .. }));
    }

    #[test]
    fn conditional_is_lowest_and_right_nested() {
        let expr = parse("if a < b then x + 1 else if c then y else z");
        let ExprKind::Conditional { else_branch, .. } = &expr.kind else {
            panic!("expected conditional");
        };
        assert!(matches!(else_branch.kind, ExprKind::Conditional { .. }));
    }

    #[test]
    fn call_vs_var_disambiguated_by_paren() {
        let expr = parse("sin(theta) + omega");
        let ExprKind::Binary { left, right, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert!(matches!(&left.kind, ExprKind::Call { name, args } if name == "sin" && args.len() == 1));
        assert!(matches!(&right.kind, ExprKind::Var(name) if name == "omega"));
    }

    #[test]
    fn member_access_chains() {
        let expr = parse("Sys.params.mass");
        let ExprKind::Member { base, field } = &expr.kind else {
            panic!("expected member");
        };
        assert_eq!(field, "mass");
        assert!(matches!(&base.kind, ExprKind::Member { .. }));
    }

    #[test]
    fn keywords_are_valid_field_names_and_object_keys() {
        let expr = parse("S.params.mass + S.config.rate");
        assert!(matches!(expr.kind, ExprKind::Binary { .. }));

        let expr = parse("{input: 1, obstacles: [2]}");
        let ExprKind::Object(items) = &expr.kind else {
            panic!("expected object");
        };
        assert_eq!(items[0].0, "input");
        assert_eq!(items[1].0, "obstacles");
    }

    #[test]
    fn parenthesized_node_is_preserved() {
        let expr = parse("(a + b) * c");
        let ExprKind::Binary { op, left, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Mul);
        assert!(matches!(left.kind, ExprKind::Parenthesized(_)));
        assert!(matches!(
            left.unparenthesized().kind,
            ExprKind::Binary { op: BinaryOp::Add, .. }
        ));
    }

    #[test]
    fn object_and_list_literals() {
        let expr = parse("{center: [0, 1], radius: 0.5}");
        let ExprKind::Object(items) = &expr.kind else {
            panic!("expected object");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].0, "center");
        assert!(matches!(&items[0].1.kind, ExprKind::List(xs) if xs.len() == 2));
    }

    #[test]
    fn trailing_tokens_are_an_error() {
        let lexed = tokenize("a + b c", 0);
        assert!(parse_expr(&lexed.tokens, &lexed.spans, 0).is_err());
    }
}

//! Operator precedence and associativity of the expression grammar.

use elfin_lang::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use elfin_lang::lexer::tokenize;
use elfin_lang::parser::parse_expr;

fn parse(source: &str) -> Expr {
    let lexed = tokenize(source, 0);
    assert!(lexed.diagnostics.is_empty(), "lex errors in {:?}", source);
    parse_expr(&lexed.tokens, &lexed.spans, 0).unwrap_or_else(|e| panic!("{:?}: {:?}", source, e))
}

/// Binary node destructuring helper.
fn binary(expr: &Expr) -> (BinaryOp, &Expr, &Expr) {
    match &expr.unparenthesized().kind {
        ExprKind::Binary { op, left, right } => (*op, left, right),
        other => panic!("expected binary, got {:?}", other),
    }
}

#[test]
fn mul_binds_tighter_than_add() {
    let expr = parse("a + b * c");
    let (op, left, right) = binary(&expr);
    assert_eq!(op, BinaryOp::Add);
    assert!(matches!(&left.kind, ExprKind::Var(n) if n == "a"));
    assert_eq!(binary(right).0, BinaryOp::Mul);
}

#[test]
fn add_chain_is_left_associative() {
    // a - b + c parses as (a - b) + c
    let expr = parse("a - b + c");
    let (op, left, _) = binary(&expr);
    assert_eq!(op, BinaryOp::Add);
    assert_eq!(binary(left).0, BinaryOp::Sub);
}

#[test]
fn pow_chain_is_right_associative() {
    // 2 ** 3 ** 2 parses as 2 ** (3 ** 2)
    let expr = parse("2 ** 3 ** 2");
    let (op, left, right) = binary(&expr);
    assert_eq!(op, BinaryOp::Pow);
    assert!(matches!(left.kind, ExprKind::Number(v) if v == 2.0));
    assert_eq!(binary(right).0, BinaryOp::Pow);
}

#[test]
fn pow_binds_tighter_than_mul() {
    let expr = parse("a * b ** c");
    let (op, _, right) = binary(&expr);
    assert_eq!(op, BinaryOp::Mul);
    assert_eq!(binary(right).0, BinaryOp::Pow);
}

#[test]
fn unary_minus_applies_before_pow() {
    // -x ** 2 parses as (-x) ** 2
    let expr = parse("-x ** 2");
    let (op, left, _) = binary(&expr);
    assert_eq!(op, BinaryOp::Pow);
    assert!(matches!(
        &left.kind,
        ExprKind::Unary { op: UnaryOp::Neg, .. }
    ));
}

#[test]
fn double_negation_nests() {
    let expr = parse("--x");
    let ExprKind::Unary { operand, .. } = &expr.kind else {
        panic!("expected unary");
    };
    assert!(matches!(operand.kind, ExprKind::Unary { .. }));
}

#[test]
fn relational_binds_tighter_than_equality() {
    // a < b == c < d parses as (a < b) == (c < d)
    let expr = parse("a < b == c < d");
    let (op, left, right) = binary(&expr);
    assert_eq!(op, BinaryOp::Eq);
    assert_eq!(binary(left).0, BinaryOp::Lt);
    assert_eq!(binary(right).0, BinaryOp::Lt);
}

#[test]
fn arithmetic_binds_tighter_than_relational() {
    let expr = parse("a + b < c * d");
    let (op, left, right) = binary(&expr);
    assert_eq!(op, BinaryOp::Lt);
    assert_eq!(binary(left).0, BinaryOp::Add);
    assert_eq!(binary(right).0, BinaryOp::Mul);
}

#[test]
fn conditional_is_lowest_precedence() {
    let expr = parse("if a < b then x + 1 else y * 2");
    let ExprKind::Conditional {
        cond,
        then_branch,
        else_branch,
    } = &expr.kind
    else {
        panic!("expected conditional");
    };
    assert_eq!(binary(cond).0, BinaryOp::Lt);
    assert_eq!(binary(then_branch).0, BinaryOp::Add);
    assert_eq!(binary(else_branch).0, BinaryOp::Mul);
}

#[test]
fn nested_conditional_binds_to_the_right() {
    let expr = parse("if a then b else if c then d else e");
    let ExprKind::Conditional { else_branch, .. } = &expr.kind else {
        panic!("expected conditional");
    };
    assert!(matches!(else_branch.kind, ExprKind::Conditional { .. }));
}

#[test]
fn parentheses_override_precedence() {
    let expr = parse("(a + b) * c");
    let (op, left, _) = binary(&expr);
    assert_eq!(op, BinaryOp::Mul);
    assert!(matches!(left.kind, ExprKind::Parenthesized(_)));
    assert_eq!(binary(left).0, BinaryOp::Add);
}

#[test]
fn member_access_binds_tightest() {
    let expr = parse("-a.b ** c.d");
    let (op, left, right) = binary(&expr);
    assert_eq!(op, BinaryOp::Pow);
    let ExprKind::Unary { operand, .. } = &left.kind else {
        panic!("expected unary on the left");
    };
    assert!(matches!(operand.kind, ExprKind::Member { .. }));
    assert!(matches!(right.kind, ExprKind::Member { .. }));
}

#[test]
fn call_arguments_take_full_expressions() {
    let expr = parse("atan2(y + 1, x * 2)");
    let ExprKind::Call { name, args } = &expr.kind else {
        panic!("expected call");
    };
    assert_eq!(name, "atan2");
    assert_eq!(args.len(), 2);
    assert_eq!(binary(&args[0]).0, BinaryOp::Add);
    assert_eq!(binary(&args[1]).0, BinaryOp::Mul);
}

#[test]
fn comparison_of_pow_terms() {
    // B = r ** 2 - x ** 2 >= 0 style expressions
    let expr = parse("r ** 2 - x ** 2 >= 0");
    let (op, left, _) = binary(&expr);
    assert_eq!(op, BinaryOp::Ge);
    assert_eq!(binary(left).0, BinaryOp::Sub);
}

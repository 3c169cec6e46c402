//! Edge-case tests for the parser as a whole.

use crate::test_helpers::{parse_expr, parse_source};
use crate::{Expr, LitValue, Stmt};

#[test]
fn test_empty_source() {
    let (stmts, handler) = parse_source("");
    assert!(stmts.is_empty());
    assert!(!handler.has_errors());
}

#[test]
fn test_deterministic_shape() {
    // Parsing the same source twice yields structurally identical
    // statement lists.
    let source = "func f(a) return a * ২ end\nprint f(3)";
    let (a, _) = parse_source(source);
    let (b, _) = parse_source(source);
    assert_eq!(format!("{a:?}"), format!("{b:?}"));
}

#[test]
fn test_digit_scripts_parse_to_same_value() {
    let ascii = parse_expr("123");
    let bengali = parse_expr("১২৩");
    let (a, b) = match (ascii, bengali) {
        (
            Expr::Literal {
                value: LitValue::Number(a),
                ..
            },
            Expr::Literal {
                value: LitValue::Number(b),
                ..
            },
        ) => (a, b),
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(a, b);
}

#[test]
fn test_fully_bengali_program() {
    let source = "\
ধরি ক = ০
যতক্ষণ ক < ৩ করো
    print ক
    ক = ক + ১
শেষ";
    let (stmts, handler) = parse_source(source);
    assert!(!handler.has_errors(), "{:?}", handler.diagnostics());
    assert_eq!(stmts.len(), 2);
    assert!(matches!(&stmts[1], Stmt::While { .. }));
}

#[test]
fn test_nested_functions() {
    let source = "\
func outer()
    func inner() return 1 end
    return inner()
end";
    let (stmts, handler) = parse_source(source);
    assert!(!handler.has_errors());
    assert_eq!(stmts.len(), 1);
}

#[test]
fn test_several_errors_reported() {
    // Recovery lets one run surface multiple independent errors.
    let source = "let = 1\nlet = 2\nlet ok = 3";
    let (stmts, handler) = parse_source(source);
    assert!(handler.error_count() >= 2);
    assert!(stmts.iter().any(|s| matches!(s, Stmt::Let { .. })));
}

#[test]
fn test_deep_grouping() {
    let expr = parse_expr("((((((1))))))");
    let mut node = &expr;
    let mut depth = 0;
    while let Expr::Grouping { inner } = node {
        node = inner;
        depth += 1;
    }
    assert_eq!(depth, 6);
    assert!(matches!(node, Expr::Literal { .. }));
}

#[test]
fn test_call_with_trailing_error_does_not_panic() {
    let (_, handler) = parse_source("f(1,");
    assert!(handler.has_errors());
}

#[test]
fn test_panic_statement() {
    let (stmts, handler) = parse_source("panic \"boom\"");
    assert!(!handler.has_errors());
    assert!(matches!(&stmts[0], Stmt::Panic { .. }));
}

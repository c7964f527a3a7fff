//! Integration tests for filter parsing and three-valued evaluation.

use std::collections::HashMap;
use xd_filter::{check_syntax, Filter, FilterError, Operand, Resolver};

struct MapResolver(HashMap<&'static str, Operand>);

impl Resolver for MapResolver {
    fn resolve(&mut self, path: &str) -> Option<Operand> {
        self.0.get(path).cloned()
    }
}

fn data(pairs: &[(&'static str, &str)]) -> MapResolver {
    MapResolver(
        pairs
            .iter()
            .map(|(k, v)| (*k, Operand::text(*v)))
            .collect(),
    )
}

fn check(expression: &str, expected: Option<bool>, pairs: &[(&'static str, &str)]) {
    let filter =
        Filter::parse(expression).unwrap_or_else(|e| panic!("parse({}) failed: {}", expression, e));
    let mut resolver = data(pairs);
    assert_eq!(
        filter.evaluate(&mut resolver),
        expected,
        "expression: {}",
        expression
    );
}

fn check_err(expression: &str) -> FilterError {
    Filter::parse(expression)
        .err()
        .unwrap_or_else(|| panic!("expected error for {}", expression))
}

// ----------------------------------------------------------------- Comparison

#[test]
fn test_eq_ne() {
    check("a eq 5", Some(true), &[("a", "5")]);
    check("a eq 5", Some(false), &[("a", "6")]);
    check("a ne 5", Some(true), &[("a", "6")]);
    check("a eq 5", None, &[]);
}

#[test]
fn test_numeric_ordering() {
    check("a gt 5", Some(true), &[("a", "5.5")]);
    check("a ge 5", Some(true), &[("a", "5")]);
    check("a lt 5", Some(false), &[("a", "5")]);
    check("a le -1e3", Some(true), &[("a", "-1000")]);
}

#[test]
fn test_non_numeric_left_is_unknown() {
    check("a gt 5", None, &[("a", "five")]);
    check("a gt 5 or b eq x", Some(true), &[("a", "five"), ("b", "x")]);
}

#[test]
fn test_decoded_literals() {
    check("name eq hello%20world", Some(true), &[("name", "hello world")]);
    check("a%2Fb eq 1", Some(true), &[("a/b", "1")]);
}

// ----------------------------------------------------------------- Logic

#[test]
fn test_and_with_unknown_is_false() {
    check("a eq 5 and b eq 6", Some(false), &[("a", "5")]);
    check("a eq 5 and b eq 6", None, &[]);
    check("a eq 5 and b eq 6", Some(true), &[("a", "5"), ("b", "6")]);
}

#[test]
fn test_or_with_unknown_takes_other_side() {
    check("a eq 5 or b eq 6", Some(true), &[("a", "5")]);
    check("a eq 5 or b eq 6", Some(false), &[("a", "4")]);
    check("a eq 5 or b eq 6", None, &[]);
}

#[test]
fn test_not() {
    check("not a eq 5", Some(false), &[("a", "5")]);
    check("not a eq 5", None, &[]);
    check("not (a eq 5 or b)", Some(false), &[("b", "true")]);
}

#[test]
fn test_bare_paths_use_truthiness() {
    check("flag", Some(true), &[("flag", "true")]);
    check("flag", Some(false), &[("flag", "false")]);
    check("flag and other", Some(false), &[("flag", "true")]);
}

#[test]
fn test_child_named_not() {
    check("not eq 1", Some(true), &[("not", "1")]);
    check("not and x", Some(true), &[("not", "true"), ("x", "yes")]);
}

#[test]
fn test_grouping() {
    check(
        "(a eq 1 or b eq 2) and c eq 3",
        Some(false),
        &[("b", "2"), ("c", "4")],
    );
    check(
        "a eq 1 or (b eq 2 and c eq 3)",
        Some(true),
        &[("a", "1")],
    );
}

#[test]
fn test_unknown_does_not_match() {
    let filter = Filter::parse("missing").unwrap();
    assert!(!filter.matches(&mut data(&[])));
    assert_eq!(filter.source(), "missing");
}

#[test]
fn test_function_calls_are_single_paths() {
    let filter = Filter::parse("count(x%20y) gt 2").unwrap();
    let mut seen = Vec::new();
    let mut resolver = |path: &str| {
        seen.push(path.to_string());
        Some(Operand::text("3"))
    };
    assert!(filter.matches(&mut resolver));
    assert_eq!(seen, vec!["count(x%20y)"]);
}

// ----------------------------------------------------------------- Errors

#[test]
fn test_syntax_errors() {
    assert!(matches!(check_err("(a eq 1"), FilterError::Syntax(_)));
    assert!(matches!(check_err("a eq"), FilterError::Syntax(_)));
    assert!(matches!(check_err("a foo b"), FilterError::Syntax(_)));
    assert!(matches!(check_err("f(a"), FilterError::Syntax(_)));
    assert!(matches!(check_err("a%G1"), FilterError::Syntax(_)));
}

#[test]
fn test_non_numeric_literal_rejected_up_front() {
    let err = check_err("a lt abc");
    assert!(matches!(err, FilterError::ValueFormat(_)));
    assert!(err.to_string().contains("abc"), "got: {}", err);
    assert!(check_syntax("a lt 3").is_ok());
}

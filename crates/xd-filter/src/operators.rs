//! Comparison operators.

use crate::types::{operators_to_map, CompareOp, Literal, Operand, OperatorDefinition, OperatorMap};
use std::sync::Arc;
use std::sync::OnceLock;

fn eq_eval(left: &Operand, right: &Literal) -> Option<bool> {
    Some(left.text == right.text)
}

fn ne_eval(left: &Operand, right: &Literal) -> Option<bool> {
    Some(left.text != right.text)
}

/// Both sides as doubles; an unparsable left side is unknown.
fn numbers(left: &Operand, right: &Literal) -> Option<(f64, f64)> {
    let l = left.text.trim().parse::<f64>().ok()?;
    Some((l, right.number?))
}

fn gt_eval(left: &Operand, right: &Literal) -> Option<bool> {
    numbers(left, right).map(|(l, r)| l > r)
}

fn ge_eval(left: &Operand, right: &Literal) -> Option<bool> {
    numbers(left, right).map(|(l, r)| l >= r)
}

fn lt_eval(left: &Operand, right: &Literal) -> Option<bool> {
    numbers(left, right).map(|(l, r)| l < r)
}

fn le_eval(left: &Operand, right: &Literal) -> Option<bool> {
    numbers(left, right).map(|(l, r)| l <= r)
}

pub fn operators() -> Vec<Arc<OperatorDefinition>> {
    vec![
        Arc::new(OperatorDefinition {
            name: "eq",
            op: CompareOp::Eq,
            eval_fn: eq_eval,
        }),
        Arc::new(OperatorDefinition {
            name: "ne",
            op: CompareOp::Ne,
            eval_fn: ne_eval,
        }),
        Arc::new(OperatorDefinition {
            name: "gt",
            op: CompareOp::Gt,
            eval_fn: gt_eval,
        }),
        Arc::new(OperatorDefinition {
            name: "ge",
            op: CompareOp::Ge,
            eval_fn: ge_eval,
        }),
        Arc::new(OperatorDefinition {
            name: "lt",
            op: CompareOp::Lt,
            eval_fn: lt_eval,
        }),
        Arc::new(OperatorDefinition {
            name: "le",
            op: CompareOp::Le,
            eval_fn: le_eval,
        }),
    ]
}

/// Shared operator map, built once.
pub fn operators_map() -> &'static OperatorMap {
    static MAP: OnceLock<OperatorMap> = OnceLock::new();
    MAP.get_or_init(|| operators_to_map(operators()))
}

pub fn lookup(op: CompareOp) -> Option<&'static Arc<OperatorDefinition>> {
    operators_map().get(op.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(text: &str) -> Literal {
        Literal {
            text: text.to_string(),
            number: text.parse().ok(),
        }
    }

    #[test]
    fn test_all_operators_registered() {
        for name in ["eq", "ne", "gt", "ge", "lt", "le"] {
            assert!(operators_map().contains_key(name), "missing {}", name);
        }
    }

    #[test]
    fn test_ordering_with_non_numeric_left_is_unknown() {
        assert_eq!(gt_eval(&Operand::text("abc"), &lit("1")), None);
        assert_eq!(gt_eval(&Operand::text("2"), &lit("1")), Some(true));
        assert_eq!(le_eval(&Operand::text("1.0"), &lit("1")), Some(true));
    }

    #[test]
    fn test_equality_is_textual() {
        assert_eq!(eq_eval(&Operand::text("1.0"), &lit("1")), Some(false));
        assert_eq!(ne_eval(&Operand::text("x"), &lit("y")), Some(true));
    }
}

//! Three-valued evaluation. `None` is "unknown".

use crate::operators::lookup;
use crate::types::{Expr, Resolver};

/// AND: unknown with unknown stays unknown, unknown with anything else is
/// false.
pub fn and3(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (None, None) => None,
        (None, _) | (_, None) => Some(false),
        (Some(l), Some(r)) => Some(l && r),
    }
}

/// OR: unknown with unknown stays unknown, otherwise unknown yields the
/// other side.
pub fn or3(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (None, None) => None,
        (None, r) => r,
        (l, None) => l,
        (Some(l), Some(r)) => Some(l || r),
    }
}

/// Evaluate an expression against the candidate behind `resolver`.
pub fn evaluate(expr: &Expr, resolver: &mut dyn Resolver) -> Option<bool> {
    match expr {
        Expr::Or(l, r) => {
            let left = evaluate(l, resolver);
            or3(left, evaluate(r, resolver))
        }
        Expr::And(l, r) => {
            let left = evaluate(l, resolver);
            and3(left, evaluate(r, resolver))
        }
        Expr::Not(inner) => evaluate(inner, resolver).map(|b| !b),
        Expr::Path(path) => resolver.resolve(path).map(|operand| operand.truthy),
        Expr::Compare { path, op, literal } => {
            let operand = resolver.resolve(path)?;
            let def = lookup(*op)?;
            (def.eval_fn)(&operand, literal)
        }
    }
}

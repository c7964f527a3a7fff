//! Filter expression tree and comparison operator table.

use std::collections::HashMap;
use std::sync::Arc;

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    /// A bare path, true when the resolved item converts to `true`.
    Path(String),
    Compare {
        path: String,
        op: CompareOp,
        literal: Literal,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn name(self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
        }
    }

    /// Ordering operators compare numerically.
    pub fn is_numeric(self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::Ne)
    }
}

/// Right-hand side of a comparison, already URL-decoded.
///
/// `number` is filled for ordering operators at parse time.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub text: String,
    pub number: Option<f64>,
}

/// What a path resolved to on the candidate item.
#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    /// String form of the resolved value.
    pub text: String,
    /// Boolean conversion of the resolved item.
    pub truthy: bool,
}

impl Operand {
    pub fn new(text: impl Into<String>, truthy: bool) -> Self {
        Operand {
            text: text.into(),
            truthy,
        }
    }

    /// An operand whose truthiness follows its text (`true`/non-empty).
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        let truthy = !text.is_empty() && text != "false";
        Operand { text, truthy }
    }
}

/// Resolves paths against the item currently being filtered.
///
/// `None` means the path could not be resolved; the comparison is then
/// "unknown" rather than an error.
pub trait Resolver {
    fn resolve(&mut self, path: &str) -> Option<Operand>;
}

impl<F> Resolver for F
where
    F: FnMut(&str) -> Option<Operand>,
{
    fn resolve(&mut self, path: &str) -> Option<Operand> {
        self(path)
    }
}

/// Evaluation function of a comparison operator.
pub type CompareFn = fn(&Operand, &Literal) -> Option<bool>;

pub struct OperatorDefinition {
    pub name: &'static str,
    pub op: CompareOp,
    pub eval_fn: CompareFn,
}

impl std::fmt::Debug for OperatorDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorDefinition")
            .field("name", &self.name)
            .field("op", &self.op)
            .finish()
    }
}

pub type OperatorMap = HashMap<&'static str, Arc<OperatorDefinition>>;

pub fn operators_to_map(ops: Vec<Arc<OperatorDefinition>>) -> OperatorMap {
    ops.into_iter().map(|def| (def.name, def)).collect()
}

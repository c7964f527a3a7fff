//! Filter expressions for data queries.
//!
//! A filter is a small boolean language over paths:
//!
//! ```text
//! expr := term (("and" | "or") term)*
//! term := "(" expr ")" | "not" term | path [op literal]
//! op   := eq | ne | gt | ge | lt | le
//! ```
//!
//! Paths are resolved through a [`Resolver`]. A path that cannot be resolved
//! makes its comparison "unknown", which combines with three-valued logic.
//! An expression that ends up unknown does not match.
//!
//! # Example
//!
//! ```
//! use xd_filter::{Filter, Operand};
//!
//! let filter = Filter::parse("a eq 5 or b gt 10").unwrap();
//! let mut resolver = |path: &str| match path {
//!     "b" => Some(Operand::text("12")),
//!     _ => None,
//! };
//! assert!(filter.matches(&mut resolver));
//! ```

pub mod error;
pub mod evaluate;
pub mod operators;
pub mod parse;
pub mod tokenize;
pub mod types;

pub use error::FilterError;
pub use evaluate::{and3, evaluate, or3};
pub use operators::operators_map;
pub use types::{CompareOp, Expr, Literal, Operand, OperatorMap, Resolver};

/// A parsed filter expression, ready to evaluate against many candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    source: String,
    expr: Expr,
}

impl Filter {
    /// Parse a filter. Malformed expressions are rejected here, before any
    /// candidate is evaluated.
    pub fn parse(source: &str) -> Result<Filter, FilterError> {
        let tokens = tokenize::tokenize(source)?;
        let expr = parse::parse(&tokens)?;
        Ok(Filter {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Three-valued result for one candidate.
    pub fn evaluate(&self, resolver: &mut dyn Resolver) -> Option<bool> {
        evaluate::evaluate(&self.expr, resolver)
    }

    /// Unknown counts as not matching.
    pub fn matches(&self, resolver: &mut dyn Resolver) -> bool {
        self.evaluate(resolver).unwrap_or(false)
    }
}

/// Check the syntax of a filter without keeping the parsed form.
pub fn check_syntax(source: &str) -> Result<(), FilterError> {
    Filter::parse(source).map(|_| ())
}

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// The expression is not well formed.
    #[error("Filter syntax: {0}")]
    Syntax(String),

    /// A comparison literal is not a number where a number is required.
    #[error("Filter value format: {0}")]
    ValueFormat(String),
}

//! Recursive-descent parser producing an [`Expr`].
//!
//! ```text
//! expr := and ("or" and)*
//! and  := term ("and" term)*
//! term := "(" expr ")" | "not" term | path [op literal]
//! ```

use crate::error::FilterError;
use crate::operators::operators_map;
use crate::tokenize::Token;
use crate::types::{Expr, Literal};

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

const NOT_OPERAND_FOLLOWERS: &[&str] = &["and", "or", "eq", "ne", "gt", "ge", "lt", "le"];

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<&'a Token, FilterError> {
        let token = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| FilterError::Syntax("expected more in filter expression".into()))?;
        self.pos += 1;
        Ok(token)
    }

    fn peek_word(&self, word: &str) -> bool {
        self.peek().is_some_and(|t| t.is_word(word))
    }

    fn parse_or(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.parse_and()?;
        while self.peek_word("or") {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.parse_term()?;
        while self.peek_word("and") {
            self.pos += 1;
            let right = self.parse_term()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// `not` is unary unless what follows could only continue a path.
    fn not_is_unary(&self) -> bool {
        match self.peek() {
            None | Some(Token::Close) => false,
            Some(Token::Open) => true,
            Some(Token::Word(w)) => !NOT_OPERAND_FOLLOWERS.contains(&w.as_str()),
        }
    }

    fn parse_term(&mut self) -> Result<Expr, FilterError> {
        match self.next()? {
            Token::Open => {
                let inner = self.parse_or()?;
                match self.next() {
                    Ok(Token::Close) => Ok(inner),
                    _ => Err(FilterError::Syntax(
                        "filter expression missing right parenthesis".into(),
                    )),
                }
            }
            Token::Close => Err(FilterError::Syntax("unexpected ')' in filter expression".into())),
            Token::Word(w) if w == "not" && self.not_is_unary() => {
                Ok(Expr::Not(Box::new(self.parse_term()?)))
            }
            Token::Word(w) if w == "and" || w == "or" => Err(FilterError::Syntax(format!(
                "unexpected operation in filter expression: {}",
                w
            ))),
            Token::Word(path) => self.parse_comparison(path),
        }
    }

    fn parse_comparison(&mut self, path: &str) -> Result<Expr, FilterError> {
        let def = match self.peek() {
            None | Some(Token::Close) => return Ok(Expr::Path(path.to_string())),
            Some(Token::Word(w)) if w == "and" || w == "or" => {
                return Ok(Expr::Path(path.to_string()))
            }
            Some(Token::Word(w)) => operators_map().get(w.as_str()).ok_or_else(|| {
                FilterError::Syntax(format!("unexpected operation in filter expression: {}", w))
            })?,
            Some(Token::Open) => {
                return Err(FilterError::Syntax(
                    "unexpected operation in filter expression: (".into(),
                ))
            }
        };
        self.pos += 1;
        let text = match self.next()? {
            Token::Word(w) => w.clone(),
            Token::Open => "(".to_string(),
            Token::Close => ")".to_string(),
        };
        let number = if def.op.is_numeric() {
            let n = text.trim().parse::<f64>().map_err(|_| {
                FilterError::ValueFormat(format!("comparison to non-number '{}'", text))
            })?;
            Some(n)
        } else {
            text.trim().parse::<f64>().ok()
        };
        Ok(Expr::Compare {
            path: path.to_string(),
            op: def.op,
            literal: Literal { text, number },
        })
    }
}

/// Parse tokens into an expression tree. All tokens must be consumed.
pub fn parse(tokens: &[Token]) -> Result<Expr, FilterError> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(Token::Close) => Err(FilterError::Syntax(
            "unbalanced ')' in filter expression".into(),
        )),
        Some(Token::Open) => Err(FilterError::Syntax(
            "unexpected operation in filter expression: (".into(),
        )),
        Some(Token::Word(w)) => Err(FilterError::Syntax(format!(
            "unexpected operation in filter expression: {}",
            w
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::tokenize;
    use crate::types::CompareOp;

    fn p(source: &str) -> Result<Expr, FilterError> {
        parse(&tokenize(source)?)
    }

    fn path(p: &str) -> Box<Expr> {
        Box::new(Expr::Path(p.to_string()))
    }

    #[test]
    fn test_or_binds_loosest() {
        assert_eq!(
            p("a and b or c").unwrap(),
            Expr::Or(Box::new(Expr::And(path("a"), path("b"))), path("c"))
        );
        assert_eq!(
            p("a or b and c").unwrap(),
            Expr::Or(path("a"), Box::new(Expr::And(path("b"), path("c"))))
        );
    }

    #[test]
    fn test_not_as_child_name() {
        assert_eq!(p("not").unwrap(), Expr::Path("not".into()));
        assert_eq!(
            p("not eq 3").unwrap(),
            Expr::Compare {
                path: "not".into(),
                op: CompareOp::Eq,
                literal: Literal {
                    text: "3".into(),
                    number: Some(3.0)
                }
            }
        );
        assert_eq!(p("not and x").unwrap(), Expr::And(path("not"), path("x")));
        assert_eq!(p("(not)").unwrap(), Expr::Path("not".into()));
        assert_eq!(p("not x").unwrap(), Expr::Not(path("x")));
    }

    #[test]
    fn test_numeric_literal_required() {
        assert!(matches!(p("a gt b"), Err(FilterError::ValueFormat(_))));
        assert!(p("a eq b").is_ok());
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(p("(a"), Err(FilterError::Syntax(_))));
        assert!(matches!(p("a eq"), Err(FilterError::Syntax(_))));
        assert!(matches!(p("a b"), Err(FilterError::Syntax(_))));
        assert!(matches!(p("a and"), Err(FilterError::Syntax(_))));
        assert!(matches!(p(""), Err(FilterError::Syntax(_))));
        assert!(matches!(p("a)"), Err(FilterError::Syntax(_))));
    }
}

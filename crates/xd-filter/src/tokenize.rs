//! Splits a filter string into tokens.

use crate::error::FilterError;
use xd_path::percent_decode;

/// One lexical token of a filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Open,
    Close,
    /// A word, URL-decoded, or a fused `name(args)` function call whose
    /// arguments are kept as written.
    Word(String),
}

impl Token {
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Word(w) if w == word)
    }
}

fn opens_group(previous: Option<&str>) -> bool {
    matches!(previous, None | Some("(") | Some("and") | Some("or") | Some("not"))
}

/// Tokenize a filter string.
///
/// Tokens are separated by whitespace and parentheses. A `(` that follows a
/// word other than `and`/`or`/`not` starts a function call: the word, the
/// raw arguments and the closing `)` are fused into one token.
///
/// ```
/// use xd_filter::tokenize::{tokenize, Token};
///
/// let tokens = tokenize("(b or(not f(a%20x)))").unwrap();
/// assert_eq!(tokens, vec![
///     Token::Open,
///     Token::Word("b".into()),
///     Token::Word("or".into()),
///     Token::Open,
///     Token::Word("not".into()),
///     Token::Word("f(a%20x)".into()),
///     Token::Close,
///     Token::Close,
/// ]);
/// ```
pub fn tokenize(source: &str) -> Result<Vec<Token>, FilterError> {
    let mut tokens = Vec::new();
    // Raw text of the previous token, used to tell calls from groups.
    let mut previous: Option<String> = None;
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == ')' {
            chars.next();
            tokens.push(Token::Close);
            previous = Some(")".to_string());
            continue;
        }
        if c == '(' {
            chars.next();
            if opens_group(previous.as_deref()) {
                tokens.push(Token::Open);
                previous = Some("(".to_string());
                continue;
            }
            let function = match (previous.take(), tokens.last()) {
                (Some(raw), Some(Token::Word(_))) => raw,
                _ => return Err(FilterError::Syntax("unexpected '(' in filter expression".into())),
            };
            let mut args = String::new();
            let mut closed = false;
            for (_, c) in chars.by_ref() {
                if c == ')' {
                    closed = true;
                    break;
                }
                args.push(c);
            }
            if !closed {
                return Err(FilterError::Syntax(format!(
                    "missing right paren for function '{}' in filter expression",
                    function
                )));
            }
            tokens.pop();
            tokens.push(Token::Word(format!("{}({})", function, args.trim())));
            previous = Some(")".to_string());
            continue;
        }
        let mut end = source.len();
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() || c == '(' || c == ')' {
                end = i;
                break;
            }
            chars.next();
        }
        let raw = &source[start..end];
        let decoded = percent_decode(raw).map_err(|_| {
            FilterError::Syntax(format!("bad URL encoding for '{}' in filter expression", raw))
        })?;
        tokens.push(Token::Word(decoded));
        previous = Some(raw.to_string());
    }
    Ok(tokens)
}

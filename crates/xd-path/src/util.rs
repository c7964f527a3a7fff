use crate::types::{DataPath, Segment};
use crate::PathError;

/// Parse a path string into segments.
///
/// A leading `/` becomes [`Segment::Root`]. Empty segments and `.` become
/// [`Segment::Current`] so callers can skip them.
///
/// # Example
///
/// ```
/// use xd_path::{parse_path, Segment};
///
/// assert_eq!(parse_path(""), vec![]);
/// assert_eq!(
///     parse_path("/a/../$b"),
///     vec![
///         Segment::Root,
///         Segment::Name("a".into()),
///         Segment::Parent,
///         Segment::Name("$b".into()),
///     ]
/// );
/// ```
pub fn parse_path(path: &str) -> DataPath {
    if path.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let rest = match path.strip_prefix('/') {
        Some(rest) => {
            out.push(Segment::Root);
            rest
        }
        None => path,
    };
    if rest.is_empty() {
        return out;
    }
    out.extend(rest.split('/').map(Segment::classify));
    out
}

/// Split a path into its raw, non-empty segment strings.
pub fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join segment names into a relative path.
///
/// # Example
///
/// ```
/// use xd_path::format_path;
///
/// assert_eq!(format_path(&[]), "");
/// assert_eq!(format_path(&["a".to_string(), "$b".to_string()]), "a/$b");
/// ```
pub fn format_path(segments: &[String]) -> String {
    segments.join("/")
}

/// Join segment names into an absolute path (`/a/b`).
pub fn format_absolute_path(segments: &[String]) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Decode a form-encoded URI component: `+` becomes a space and `%XX`
/// sequences become the byte they name. The result must be valid UTF-8.
///
/// # Example
///
/// ```
/// use xd_path::percent_decode;
///
/// assert_eq!(percent_decode("a%20b+c").unwrap(), "a b c");
/// assert!(percent_decode("bad%2").is_err());
/// ```
pub fn percent_decode(component: &str) -> Result<String, PathError> {
    if !component.contains('%') && !component.contains('+') {
        return Ok(component.to_string());
    }
    let bytes = component.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let hi = bytes.get(i + 1).and_then(|b| hex_digit(*b));
                let lo = bytes.get(i + 2).and_then(|b| hex_digit(*b));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => out.push(hi << 4 | lo),
                    _ => return Err(PathError::BadEncoding(component.to_string())),
                }
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|_| PathError::BadEncoding(component.to_string()))
}

/// Encode a URI query component. Unreserved characters pass through, a
/// space becomes `+` and everything else is `%XX`-escaped.
///
/// ```
/// use xd_path::{percent_decode, percent_encode};
///
/// assert_eq!(percent_encode("a b&c"), "a+b%26c");
/// assert_eq!(percent_decode(&percent_encode("x/y;z")).unwrap(), "x/y;z");
/// ```
pub fn percent_encode(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for b in component.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Replace characters that cannot appear in a node name with `_`.
///
/// Control characters and `/ \ : ; | < > * ? " [ ] { } ( )` are replaced
/// anywhere; `$` is replaced only in the first position.
pub fn make_legal_path_name(candidate: &str) -> String {
    candidate
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let illegal = (c as u32) < 0x20
                || matches!(
                    c,
                    '/' | '\\'
                        | ':'
                        | ';'
                        | '|'
                        | '<'
                        | '>'
                        | '*'
                        | '?'
                        | '"'
                        | '['
                        | ']'
                        | '{'
                        | '}'
                        | '('
                        | ')'
                )
                || (c == '$' && i == 0);
            if illegal {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Check if a segment is a valid 1-based position (`1`, `2`, ... without
/// leading zeros).
pub fn is_valid_index(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.starts_with('0')
        && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Check if a segment is an unsigned decimal integer.
pub fn is_integer(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_root_only() {
        assert_eq!(parse_path("/"), vec![Segment::Root]);
    }

    #[test]
    fn test_parse_relative() {
        assert_eq!(
            parse_path("a//b"),
            vec![
                Segment::Name("a".into()),
                Segment::Current,
                Segment::Name("b".into())
            ]
        );
    }

    #[test]
    fn test_make_legal_path_name() {
        assert_eq!(make_legal_path_name("$a/b(c)"), "_a_b_c_");
        assert_eq!(make_legal_path_name("a$b"), "a$b");
    }

    #[test]
    fn test_index_checks() {
        assert!(is_valid_index("1"));
        assert!(is_valid_index("42"));
        assert!(!is_valid_index("0"));
        assert!(!is_valid_index("01"));
        assert!(!is_valid_index("a"));
        assert!(is_integer("0"));
        assert!(!is_integer(""));
    }

    #[test]
    fn test_percent_decode_utf8() {
        assert_eq!(percent_decode("caf%C3%A9").unwrap(), "café");
        assert!(percent_decode("%FF").is_err());
    }
}

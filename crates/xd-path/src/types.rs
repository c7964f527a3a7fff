//! Type definitions for data paths.

/// One step of a parsed data path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `.` or an empty segment (`a//b`): stay on the current node.
    Current,
    /// `..`: move to the parent, if there is one.
    Parent,
    /// `...` or a leading `/`: move to the root of the tree.
    Root,
    /// A named child or metadata item.
    Name(String),
    /// `name(args)`: a function invocation on the current node.
    Call { function: String, args: String },
}

impl Segment {
    /// Classifies a single raw segment string.
    pub fn classify(raw: &str) -> Segment {
        match raw {
            "" | "." => Segment::Current,
            ".." => Segment::Parent,
            "..." => Segment::Root,
            _ => match raw.find('(') {
                Some(open) if raw.ends_with(')') && open > 0 => Segment::Call {
                    function: raw[..open].to_string(),
                    args: raw[open + 1..raw.len() - 1].to_string(),
                },
                _ => Segment::Name(raw.to_string()),
            },
        }
    }

    /// Returns the name if this is a [`Segment::Name`].
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Segment::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_navigation(&self) -> bool {
        matches!(self, Segment::Current | Segment::Parent | Segment::Root)
    }
}

/// A parsed data path.
pub type DataPath = Vec<Segment>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_navigation() {
        assert_eq!(Segment::classify(""), Segment::Current);
        assert_eq!(Segment::classify("."), Segment::Current);
        assert_eq!(Segment::classify(".."), Segment::Parent);
        assert_eq!(Segment::classify("..."), Segment::Root);
        assert!(Segment::classify("..").is_navigation());
    }

    #[test]
    fn test_classify_hidden_names_are_names() {
        // "..x" is a hidden child, not navigation
        assert_eq!(Segment::classify("..x"), Segment::Name("..x".to_string()));
        assert_eq!(
            Segment::classify("$..binding"),
            Segment::Name("$..binding".to_string())
        );
    }

    #[test]
    fn test_classify_call() {
        assert_eq!(
            Segment::classify("contains(a,b)"),
            Segment::Call {
                function: "contains".to_string(),
                args: "a,b".to_string()
            }
        );
        // no function name: plain name
        assert_eq!(Segment::classify("(x)"), Segment::Name("(x)".to_string()));
        assert_eq!(Segment::classify("f(x"), Segment::Name("f(x".to_string()));
    }
}

use proptest::prelude::*;
use xd_path::{format_path, parse_path, percent_decode, split_path, Segment};

#[test]
fn test_absolute_path_starts_at_root() {
    let path = parse_path("/.bacnet/dev/1");
    assert_eq!(path[0], Segment::Root);
    assert_eq!(path.len(), 4);
}

#[test]
fn test_dot_segments_are_navigation() {
    let path = parse_path("a/./../.../b");
    let nav: Vec<bool> = path.iter().map(Segment::is_navigation).collect();
    assert_eq!(nav, vec![false, true, true, true, false]);
}

#[test]
fn test_call_segment_inside_path() {
    let path = parse_path("list/count()");
    assert_eq!(
        path[1],
        Segment::Call {
            function: "count".into(),
            args: String::new()
        }
    );
}

#[test]
fn test_percent_decode_reserved() {
    assert_eq!(percent_decode("a%20eq%205").unwrap(), "a eq 5");
    assert_eq!(percent_decode("plain").unwrap(), "plain");
    assert!(percent_decode("%zz").is_err());
}

proptest! {
    #[test]
    fn prop_split_then_format_keeps_names(names in proptest::collection::vec("[a-z$][a-z0-9-]{0,8}", 1..8)) {
        let joined = format_path(&names);
        prop_assert_eq!(split_path(&joined), names.clone());
        let parsed = parse_path(&joined);
        prop_assert_eq!(parsed.len(), names.len());
        for (segment, name) in parsed.iter().zip(names.iter()) {
            prop_assert_eq!(segment.as_name(), Some(name.as_str()));
        }
    }

    #[test]
    fn prop_decode_is_identity_without_escapes(s in "[a-zA-Z0-9._~$-]{0,24}") {
        prop_assert_eq!(percent_decode(&s).unwrap(), s);
    }
}

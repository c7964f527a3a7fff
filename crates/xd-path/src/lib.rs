//! Data path utilities.
//!
//! Paths address nodes in a data tree with `/`-separated names. Besides plain
//! names a path may contain `.` (stay), `..` (parent), `...` (root) and
//! function invocations such as `contains(a,b)`.
//!
//! # Example
//!
//! ```
//! use xd_path::{parse_path, percent_decode, Segment};
//!
//! let path = parse_path("../$writable");
//! assert_eq!(path, vec![Segment::Parent, Segment::Name("$writable".into())]);
//!
//! assert_eq!(percent_decode("a%2Fb").unwrap(), "a/b");
//! ```

use thiserror::Error;

pub mod types;
pub use types::{DataPath, Segment};

pub mod util;
pub use util::{
    format_absolute_path, format_path, is_integer, is_valid_index,
    make_legal_path_name, parse_path, percent_decode, percent_encode, split_path,
};

pub mod validate;
pub use validate::{validate_path, MAX_PATH_SEGMENTS};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path has {segments} segments, limit is {max}")]
    TooLong { segments: usize, max: usize },
    #[error("bad URL encoding for '{0}'")]
    BadEncoding(String),
}

//! Validation functions for data paths.

use crate::util::split_path;
use crate::PathError;

/// Default maximum number of segments in a path.
pub const MAX_PATH_SEGMENTS: usize = 256;

/// Validate a path string against a segment limit.
///
/// # Example
///
/// ```
/// use xd_path::validate_path;
///
/// validate_path("a/b/c", 8).unwrap();
/// validate_path("a/b/c", 2).unwrap_err();
/// ```
pub fn validate_path(path: &str, max_segments: usize) -> Result<(), PathError> {
    let segments = split_path(path).len();
    if segments > max_segments {
        return Err(PathError::TooLong {
            segments,
            max: max_segments,
        });
    }
    Ok(())
}

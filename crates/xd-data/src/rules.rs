//! Static rules about metadata names and child naming.

use crate::base::Base;
use crate::error::{ErrorKind, XdError};
use crate::meta::*;

pub static ALL_METADATA: &[&str] = &[
    NAME, VALUE, BASE, TYPE, EXTENDS, OVERLAYS, MEMBER_TYPE, WRITABLE, OPTIONAL, UNITS, MINIMUM,
    MAXIMUM, RESOLUTION, MINIMUM_LENGTH, MAXIMUM_LENGTH, MINIMUM_SIZE, MAXIMUM_SIZE,
    MAXIMUM_SIZE_FOR_WRITING, VARIABILITY, VOLATILITY, WRITE_EFFECTIVE, ALLOWED_TYPES,
    ALLOWED_CHOICES, DISPLAY_NAME, DESCRIPTION, COMMENT, LENGTH, ERROR, ABSENT, CONTEXT_TAG,
    PROPERTY_IDENTIFIER, COMMANDABLE, BIT, READABLE, MINIMUM_FOR_WRITING, MAXIMUM_FOR_WRITING,
    MINIMUM_LENGTH_FOR_WRITING, MAXIMUM_LENGTH_FOR_WRITING, MINIMUM_ENCODED_LENGTH,
    MAXIMUM_ENCODED_LENGTH, MINIMUM_ENCODED_LENGTH_FOR_WRITING, MAXIMUM_ENCODED_LENGTH_FOR_WRITING,
    ASSOCIATED_WITH, REQUIRED_WITH, REQUIRED_WITHOUT, NOT_PRESENT_WITH, WRITABLE_WHEN,
    REQUIRED_WHEN, WRITABLE_WHEN_TEXT, REQUIRED_WHEN_TEXT, TARGET, HREF, DOCUMENTATION,
    ERROR_TEXT, UNITS_TEXT, PRIORITY_ARRAY, DISPLAY_NAME_FOR_WRITING, HAS_HISTORY, HISTORY,
    UNSPECIFIED_VALUE, NAMED_VALUES, NAMED_BITS, CHOICES, MEMBER_TYPE_DEFINITION, LINKS, TAGS,
    NOT_FOR_READING, NOT_FOR_WRITING, PUBLISHED, IS_MULTILINE, TRUNCATED, IN_ALARM, OVERRIDDEN,
    FAULT, OUT_OF_SERVICE, NODE_TYPE, COUNT, MEDIA_TYPE, AUTH_READ, AUTH_WRITE, CHILDREN,
    DESCENDANTS, RELINQUISH_DEFAULT, ETAG, NEXT, SELF, VIA, PHYSICAL, RELATED, ALTERNATE,
    UPDATED, AUTHOR, EDIT, FAILURES, SUBSCRIPTION, ID, SOURCE_ID, ADD_REV, REM_REV, MOD_REV,
    DATA_REV, REVISIONS, TARGET_TYPE, OBJECT_TYPE, VALUE_TAGS, REPRESENTS, VIA_EXTERNAL, VIA_MAP,
    REL,
];

/// Always included whatever the category selector says.
pub static ALWAYS_METADATA: &[&str] = &[NAME, TRUNCATED, ETAG, NEXT, SELF, SUBSCRIPTION];

pub static NEVER_FILTERED_OUT: &[&str] =
    &[PARTIAL, NEXT, ABSENT, FAILURES, HREF, SELF, SUBSCRIPTION, TRUNCATED];

static DOES_NOT_INHERIT_FROM_DEFINITION: &[&str] = &[
    EXTENDS, OVERLAYS, OPTIONAL, ERROR, ABSENT, ERROR_TEXT, HAS_HISTORY, HISTORY, TRUNCATED,
    IN_ALARM, OVERRIDDEN, FAULT, OUT_OF_SERVICE, COUNT, CHILDREN, DESCENDANTS, ETAG, NEXT, SELF,
    UPDATED, AUTHOR, EDIT, FAILURES, SUBSCRIPTION, ID, SOURCE_ID,
];

static INHERITS_FROM_PARENTS: &[&str] = &[
    WRITABLE, VARIABILITY, VOLATILITY, WRITE_EFFECTIVE, ERROR, ABSENT, READABLE, ERROR_TEXT,
    PUBLISHED, AUTH_READ, AUTH_WRITE, AUTH_VISIBLE, UPDATED, AUTHOR,
];

static NOT_ALLOWED_FOR_PUT: &[&str] = &[
    COUNT, CHILDREN, DESCENDANTS, TRUNCATED, HISTORY, ETAG, NEXT, SELF, EDIT, FAILURES,
    SUBSCRIPTION, ID,
];

static NOT_ALLOWED_FOR_POST: &[&str] = &[
    COUNT, CHILDREN, DESCENDANTS, TRUNCATED, HISTORY, ETAG, NEXT, SELF, EDIT, FAILURES, ID,
];

static NOT_ALLOWED_IN_INSTANCES: &[&str] = &[
    EXTENDS, OVERLAYS, OPTIONAL, MEMBER_TYPE_DEFINITION, NOT_FOR_READING, NOT_FOR_WRITING,
    ADD_REV, REM_REV, MOD_REV, DATA_REV, REVISIONS,
];

pub static TYPE_METADATA: &[&str] = &[
    BASE, TYPE, EXTENDS, MEMBER_TYPE, MEMBER_TYPE_DEFINITION, OVERLAYS, ALLOWED_TYPES,
    ALLOWED_CHOICES, OPTIONAL, ABSENT, HREF, TARGET_TYPE, OBJECT_TYPE,
];

pub static TAG_METADATA: &[&str] = &[NODE_TYPE, TAGS, VALUE_TAGS, HREF];

pub static LINK_METADATA: &[&str] = &[
    LINKS, SELF, EDIT, ALTERNATE, VIA, RELATED, PHYSICAL, NEXT, SUBSCRIPTION, HREF, REPRESENTS,
    VIA_EXTERNAL, VIA_MAP, REL, MEDIA_TYPE,
];

pub static UI_METADATA: &[&str] =
    &[DISPLAY_NAME, DISPLAY_NAME_FOR_WRITING, DESCRIPTION, COMMENT, HREF];

pub static DOC_METADATA: &[&str] = &[DOCUMENTATION, HREF];

pub static DATA_METADATA: &[&str] = &[
    BASE, WRITABLE, READABLE, OPTIONAL, ABSENT, UNITS, UNITS_TEXT, VOLATILITY, VARIABILITY,
    MINIMUM, MAXIMUM, MINIMUM_FOR_WRITING, MAXIMUM_FOR_WRITING, RESOLUTION, MINIMUM_LENGTH,
    MAXIMUM_LENGTH, MINIMUM_ENCODED_LENGTH, MAXIMUM_ENCODED_LENGTH, MINIMUM_LENGTH_FOR_WRITING,
    MAXIMUM_LENGTH_FOR_WRITING, MINIMUM_ENCODED_LENGTH_FOR_WRITING,
    MAXIMUM_ENCODED_LENGTH_FOR_WRITING, MINIMUM_SIZE, MAXIMUM_SIZE, MAXIMUM_SIZE_FOR_WRITING,
    ASSOCIATED_WITH, REQUIRED_WITH, REQUIRED_WITHOUT, NOT_PRESENT_WITH, NOT_FOR_READING,
    NOT_FOR_WRITING, NAMED_VALUES, NAMED_BITS, BIT, WRITE_EFFECTIVE, IS_MULTILINE, WRITABLE_WHEN,
    WRITABLE_WHEN_TEXT, REQUIRED_WHEN, REQUIRED_WHEN_TEXT, CONTEXT_TAG, PROPERTY_IDENTIFIER,
    COMMANDABLE, HREF, ADD_REV, REM_REV, MOD_REV, DATA_REV, REVISIONS,
];

pub static AUTH_METADATA: &[&str] = &[AUTH_READ, AUTH_WRITE, HREF];

pub static CHANGE_METADATA: &[&str] = &[PUBLISHED, UPDATED, AUTHOR, HREF];

pub static VALUE_METADATA: &[&str] = &[
    VALUE, ERROR, ERROR_TEXT, UNSPECIFIED_VALUE, LENGTH, IN_ALARM, OVERRIDDEN, FAULT,
    OUT_OF_SERVICE, TRUNCATED, MEDIA_TYPE, ETAG, PRIORITY_ARRAY, RELINQUISH_DEFAULT, FAILURES,
    HREF,
];

fn contains(table: &[&str], name: &str) -> bool {
    table.iter().any(|n| *n == name)
}

pub fn is_metadata(name: &str) -> bool {
    name.starts_with('$')
}

/// Internal names never leave the server: `..x` and `$..x`.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with("..") || name.starts_with("$..")
}

pub fn is_server_specific(name: &str) -> bool {
    name.starts_with("$..")
}

/// Extended metadata carries a namespace: `$vendor.thing` or `$1-thing`.
pub fn is_extended(name: &str) -> bool {
    name.len() > 3
        && name.starts_with('$')
        && !name[1..].starts_with('$')
        && (name.contains('-') || name.contains('.'))
}

pub fn is_standard(name: &str) -> bool {
    name.len() > 1
        && name.starts_with('$')
        && !name[1..].starts_with('$')
        && !name.contains('-')
        && !name.contains('.')
}

pub fn is_known_metadata(name: &str) -> bool {
    contains(ALL_METADATA, name)
}

pub fn inherits_from_definition(name: &str) -> bool {
    !contains(DOES_NOT_INHERIT_FROM_DEFINITION, name)
}

pub fn inherits_from_parent(name: &str) -> bool {
    contains(INHERITS_FROM_PARENTS, name)
}

pub fn never_filtered_out(name: &str) -> bool {
    contains(NEVER_FILTERED_OUT, name)
}

pub fn not_allowed_for_put(name: &str) -> bool {
    contains(NOT_ALLOWED_FOR_PUT, name)
}

pub fn not_allowed_for_post(name: &str) -> bool {
    contains(NOT_ALLOWED_FOR_POST, name)
}

pub fn not_allowed_in_instances(name: &str) -> bool {
    contains(NOT_ALLOWED_IN_INSTANCES, name)
}

/// Picks the name a new child of a `base` node will get.
///
/// `existing` holds the names of the current children. Positional bases
/// number children `1..N`; in `partial` mode a caller may pick an unused
/// number itself. Collections keep the requested `prefix` when it is free,
/// otherwise they append `_N` past the highest suffix already in use.
pub fn next_available_child_name(
    base: Base,
    prefix: &str,
    existing: &[String],
    partial: bool,
) -> Result<String, XdError> {
    let count = existing.len();
    match base {
        Base::Array | Base::List | Base::SequenceOf | Base::Unknown => {
            if !partial || prefix.is_empty() {
                return Ok((count + 1).to_string());
            }
            if !xd_path::is_valid_index(prefix) {
                return Err(XdError::new(
                    ErrorKind::CannotCreate,
                    format!("Name '{prefix}' for a new member of a partial list is not a number"),
                ));
            }
            if existing.iter().any(|n| n == prefix) {
                return Err(XdError::new(
                    ErrorKind::CannotCreate,
                    format!("Member '{prefix}' already exists"),
                ));
            }
            Ok(prefix.to_string())
        }
        Base::Poly | Base::Collection => {
            let wanted = if prefix.is_empty() {
                (count + 1).to_string()
            } else {
                prefix.to_string()
            };
            if !existing.iter().any(|n| *n == wanted) {
                return Ok(wanted);
            }
            let mut highest = 0u64;
            for name in existing {
                let Some(rest) = name.strip_prefix(prefix) else {
                    continue;
                };
                let digits = rest.strip_prefix('_').unwrap_or(rest);
                if !xd_path::is_integer(digits) {
                    continue;
                }
                if let Ok(n) = digits.parse::<u64>() {
                    highest = highest.max(n);
                }
            }
            let next = highest + 1;
            if prefix.is_empty() {
                Ok(next.to_string())
            } else {
                Ok(format!("{prefix}_{next}"))
            }
        }
        _ => Ok(prefix.to_string()),
    }
}

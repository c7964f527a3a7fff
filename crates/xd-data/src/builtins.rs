//! Builtin prototypes, one per base.
//!
//! A builtin declares every optional metadata item its base may carry. Each
//! declaration is itself marked `$optional`, so it only tells
//! `create_metadata` what may be created and never supplies a value.

use crate::base::Base;
use crate::flags;
use crate::meta::*;
use crate::tree::{DataTree, NodeId};
use crate::value::Value;

/// Name, base and an optional `$memberType` for list-valued declarations.
type Decl = (&'static str, Base, Option<&'static str>);

static COMMON: &[Decl] = &[
    (ID, Base::String, None),
    (TYPE, Base::String, None),
    (EXTENDS, Base::String, None),
    (OVERLAYS, Base::String, None),
    (NODE_TYPE, Base::Enumerated, None),
    (NODE_SUBTYPE, Base::String, None),
    (DISPLAY_NAME, Base::String, None),
    (DESCRIPTION, Base::String, None),
    (DOCUMENTATION, Base::String, None),
    (COMMENT, Base::String, None),
    (WRITABLE, Base::Boolean, None),
    (COMMANDABLE, Base::Boolean, None),
    (FAILURES, Base::List, Some("Link")),
    (READABLE, Base::Boolean, None),
    (ASSOCIATED_WITH, Base::String, None),
    (REQUIRED_WITH, Base::String, None),
    (REQUIRED_WITHOUT, Base::String, None),
    (NOT_PRESENT_WITH, Base::String, None),
    (WRITE_EFFECTIVE, Base::Enumerated, None),
    (OPTIONAL, Base::Boolean, None),
    (ABSENT, Base::Boolean, None),
    (VARIABILITY, Base::Enumerated, None),
    (VOLATILITY, Base::Enumerated, None),
    (IS_MULTILINE, Base::Boolean, None),
    (IN_ALARM, Base::Boolean, None),
    (OVERRIDDEN, Base::Boolean, None),
    (FAULT, Base::Boolean, None),
    (OUT_OF_SERVICE, Base::Boolean, None),
    (LINKS, Base::List, Some("Link")),
    (TAGS, Base::StringSet, None),
    (VALUE_TAGS, Base::Collection, None),
    (AUTH_READ, Base::String, None),
    (AUTH_WRITE, Base::String, None),
    (AUTH_VISIBLE, Base::Boolean, None),
    (HREF, Base::String, None),
    (SOURCE_ID, Base::String, None),
    (ETAG, Base::String, None),
    (TARGET_TYPE, Base::String, None),
    (DISPLAY_NAME_FOR_WRITING, Base::String, None),
    (NOT_FOR_READING, Base::Boolean, None),
    (NOT_FOR_WRITING, Base::Boolean, None),
    (ERROR, Base::Unsigned, None),
    (ERROR_TEXT, Base::String, None),
    (DISPLAY_ORDER, Base::Unsigned, None),
    (PUBLISHED, Base::DateTime, None),
    (UPDATED, Base::DateTime, None),
    (AUTHOR, Base::String, None),
    (ADD_REV, Base::String, None),
    (REM_REV, Base::String, None),
    (MOD_REV, Base::String, None),
    (REVISIONS, Base::Collection, None),
    (WRITABLE_WHEN, Base::Enumerated, None),
    (WRITABLE_WHEN_TEXT, Base::String, None),
    (REQUIRED_WHEN, Base::Enumerated, None),
    (REQUIRED_WHEN_TEXT, Base::String, None),
    (CONTEXT_TAG, Base::Unsigned, None),
    (PROPERTY_IDENTIFIER, Base::Unsigned, None),
    (COUNT, Base::Unsigned, None),
    (DESCENDANTS, Base::List, Some("Link")),
    (HISTORY, Base::List, None),
    (TRUNCATED, Base::Boolean, None),
    (PARTIAL, Base::Boolean, None),
    (VIA, Base::Link, None),
    (SELF, Base::Link, None),
    (NEXT, Base::Link, None),
    (EDIT, Base::Link, None),
    (SUBSCRIPTION, Base::Link, None),
    (RELATED, Base::Link, None),
    (ALTERNATE, Base::String, None),
    (MATCH_ANY, Base::Boolean, None),
    (BINDING, Base::String, None),
    (HISTORY_LOCATION, Base::String, None),
    (UI_DEFINITIONS, Base::Collection, None),
];

/// Declarations shared by every base that holds a plain value.
fn valued(base: Base) -> Vec<Decl> {
    vec![
        (NAMED_VALUES, Base::Collection, Some(base.name())),
        (PRIORITY_ARRAY, Base::Array, None),
        (RELINQUISH_DEFAULT, base, None),
    ]
}

fn numeric(base: Base) -> Vec<Decl> {
    let mut decls = valued(base);
    decls.extend([
        (MINIMUM, base, None),
        (MAXIMUM, base, None),
        (MINIMUM_FOR_WRITING, base, None),
        (MAXIMUM_FOR_WRITING, base, None),
        (RESOLUTION, base, None),
        (UNITS, Base::Enumerated, None),
        (UNITS_TEXT, Base::String, None),
    ]);
    decls
}

fn lengths(with_encoded: bool) -> Vec<Decl> {
    let mut decls = vec![
        (MINIMUM_LENGTH, Base::Unsigned, None),
        (MAXIMUM_LENGTH, Base::Unsigned, None),
        (MINIMUM_LENGTH_FOR_WRITING, Base::Unsigned, None),
        (MAXIMUM_LENGTH_FOR_WRITING, Base::Unsigned, None),
    ];
    if with_encoded {
        decls.extend([
            (MINIMUM_ENCODED_LENGTH, Base::Unsigned, None),
            (MAXIMUM_ENCODED_LENGTH, Base::Unsigned, None),
            (MINIMUM_ENCODED_LENGTH_FOR_WRITING, Base::Unsigned, None),
            (MAXIMUM_ENCODED_LENGTH_FOR_WRITING, Base::Unsigned, None),
        ]);
    }
    decls
}

fn sized() -> Vec<Decl> {
    vec![
        (MEMBER_TYPE, Base::String, None),
        (MEMBER_TYPE_DEFINITION, Base::List, None),
        (MINIMUM_SIZE, Base::Unsigned, None),
        (MAXIMUM_SIZE, Base::Unsigned, None),
        (MINIMUM_SIZE_FOR_WRITING, Base::Unsigned, None),
        (MAXIMUM_SIZE_FOR_WRITING, Base::Unsigned, None),
    ]
}

fn ranged(base: Base, limit: Base) -> Vec<Decl> {
    let mut decls = valued(base);
    decls.extend([
        (MINIMUM, limit, None),
        (MAXIMUM, limit, None),
        (UNSPECIFIED_VALUE, Base::Boolean, None),
    ]);
    decls
}

fn extras(base: Base) -> Vec<Decl> {
    use Base::*;
    match base {
        Any => vec![(ALLOWED_TYPES, StringSet, None)],
        Boolean => valued(base),
        Unsigned | Integer | Real | Double => numeric(base),
        OctetString => {
            let mut decls = valued(base);
            decls.extend(lengths(false));
            decls.push((MEDIA_TYPE, String, None));
            decls
        }
        String => {
            let mut decls = valued(base);
            decls.extend(lengths(true));
            decls.push((MEDIA_TYPE, String, None));
            decls
        }
        BitString => {
            let mut decls = valued(base);
            decls.push((NAMED_BITS, Collection, Some("Bit")));
            decls.push((LENGTH, Unsigned, None));
            decls.extend(lengths(false));
            decls
        }
        Enumerated => vec![
            (NAMED_VALUES, Collection, Some("Unsigned")),
            (PRIORITY_ARRAY, Array, None),
            (RELINQUISH_DEFAULT, base, None),
            (MINIMUM, Unsigned, None),
            (MAXIMUM, Unsigned, None),
        ],
        Date | DateTime | Time => ranged(base, base),
        ObjectIdentifier => {
            let mut decls = ranged(base, Unsigned);
            decls.push((OBJECT_TYPE, String, None));
            decls
        }
        ObjectIdentifierPattern => {
            let mut decls = valued(base);
            decls.push((OBJECT_TYPE, String, None));
            decls
        }
        DatePattern | DateTimePattern | TimePattern | WeekNDay => valued(base),
        Sequence => {
            let mut decls = valued(base);
            decls.push((MEMBER_TYPE, String, None));
            decls.push((MEMBER_TYPE_DEFINITION, List, None));
            decls
        }
        Array | List | SequenceOf | Unknown => {
            let mut decls = valued(base);
            decls.extend(sized());
            decls
        }
        Collection => {
            let mut decls = vec![(NAMED_VALUES, Collection, Some("Collection"))];
            decls.extend(sized());
            decls
        }
        Choice => {
            let mut decls = valued(base);
            decls.push((CHOICES, Collection, None));
            decls.push((ALLOWED_CHOICES, String, None));
            decls
        }
        Bit => vec![(BIT, Unsigned, None)],
        Link => vec![
            (MEDIA_TYPE, String, None),
            (REPRESENTS, String, None),
            (REL, String, None),
        ],
        StringSet => {
            let mut decls = vec![(NAMED_VALUES, Collection, Some("StringSet"))];
            decls.extend(lengths(true));
            decls
        }
        Raw => vec![
            (PRIORITY_ARRAY, Array, None),
            (RELINQUISH_DEFAULT, Array, None),
        ],
        Poly => {
            let mut decls = vec![
                (NAMED_VALUES, Collection, None),
                (PRIORITY_ARRAY, Array, None),
                (RELINQUISH_DEFAULT, Poly, None),
                (ALLOWED_TYPES, String, None),
                (MINIMUM, Poly, None),
                (MAXIMUM, Poly, None),
                (MINIMUM_FOR_WRITING, Poly, None),
                (MAXIMUM_FOR_WRITING, Poly, None),
                (RESOLUTION, Poly, None),
                (UNITS, Enumerated, None),
                (UNITS_TEXT, String, None),
                (MEDIA_TYPE, String, None),
                (UNSPECIFIED_VALUE, Boolean, None),
                (OBJECT_TYPE, String, None),
                (CHOICES, Collection, None),
                (ALLOWED_CHOICES, String, None),
                (BIT, Unsigned, None),
            ];
            decls.extend(sized());
            decls.extend(lengths(true));
            decls
        }
        Invalid | Null | Object | Composition => Vec::new(),
    }
}

fn declare(tree: &mut DataTree, builtin: NodeId, (name, base, member_type): Decl) {
    let item = tree.create_node(base, name);
    let optional = tree.create_node(Base::Boolean, OPTIONAL);
    tree.set_local_value(optional, Some(Value::Boolean(true)));
    tree.add_local(item, optional);
    if let Some(member_type) = member_type {
        let declared = tree.create_node(Base::String, MEMBER_TYPE);
        tree.set_local_value(declared, Some(Value::Text(member_type.to_string())));
        tree.add_local(item, declared);
    }
    tree.add_local(builtin, item);
}

/// Creates the builtin for every base, indexed by `Base as usize`.
pub(crate) fn install(tree: &mut DataTree) -> Vec<NodeId> {
    // empty shells first, so declarations can refer to any base
    let shells: Vec<NodeId> = Base::ALL
        .iter()
        .map(|base| {
            let id = tree.create_node(*base, base.name());
            tree.set_flag(id, flags::BUILTIN | flags::PROTOTYPE | flags::IMMUTABLE, true);
            id
        })
        .collect();
    for base in Base::ALL {
        let builtin = shells[*base as usize];
        if !matches!(base, Base::Raw | Base::Invalid) {
            for decl in COMMON {
                declare(tree, builtin, *decl);
            }
        }
        for decl in extras(*base) {
            declare(tree, builtin, decl);
        }
    }
    shells
}

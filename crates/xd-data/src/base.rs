//! Base type registry.

use std::fmt;

macro_rules! bases {
    ($($variant:ident => $name:literal,)*) => {
        /// The primitive or constructed kind of a node.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Base {
            $($variant,)*
        }

        impl Base {
            pub const ALL: &'static [Base] = &[$(Base::$variant,)*];

            pub fn name(self) -> &'static str {
                match self {
                    $(Base::$variant => $name,)*
                }
            }

            /// Looks a base up by its name. Unknown names give
            /// [`Base::Invalid`], never an error.
            pub fn from_name(name: &str) -> Base {
                match name {
                    $($name => Base::$variant,)*
                    _ => Base::Invalid,
                }
            }
        }
    };
}

bases! {
    Invalid => "Invalid",
    Null => "Null",
    Boolean => "Boolean",
    Unsigned => "Unsigned",
    Integer => "Integer",
    Real => "Real",
    Double => "Double",
    OctetString => "OctetString",
    String => "String",
    BitString => "BitString",
    Enumerated => "Enumerated",
    Date => "Date",
    DatePattern => "DatePattern",
    DateTime => "DateTime",
    DateTimePattern => "DateTimePattern",
    Time => "Time",
    TimePattern => "TimePattern",
    ObjectIdentifier => "ObjectIdentifier",
    ObjectIdentifierPattern => "ObjectIdentifierPattern",
    WeekNDay => "WeekNDay",
    Sequence => "Sequence",
    Array => "Array",
    List => "List",
    SequenceOf => "SequenceOf",
    Choice => "Choice",
    Object => "Object",
    Bit => "Bit",
    Link => "Link",
    Any => "Any",
    StringSet => "StringSet",
    Composition => "Composition",
    Collection => "Collection",
    Unknown => "Unknown",
    Raw => "Raw",
    Poly => "Poly",
}

/// Native form a base stores its value in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Unsigned,
    Integer,
    Real,
    Text,
    Octets,
    Set,
    DateTime,
}

impl Base {
    pub fn is_valid(self) -> bool {
        self != Base::Invalid
    }

    pub fn value_kind(self) -> Option<ValueKind> {
        use Base::*;
        match self {
            Boolean | Bit => Some(ValueKind::Boolean),
            Unsigned => Some(ValueKind::Unsigned),
            Integer => Some(ValueKind::Integer),
            Real | Double => Some(ValueKind::Real),
            OctetString => Some(ValueKind::Octets),
            BitString | StringSet => Some(ValueKind::Set),
            DateTime => Some(ValueKind::DateTime),
            String | Enumerated | Date | DatePattern | DateTimePattern | Time | TimePattern
            | ObjectIdentifier | ObjectIdentifierPattern | WeekNDay | Link | Raw | Poly => {
                Some(ValueKind::Text)
            }
            Invalid | Null | Sequence | Array | List | SequenceOf | Choice | Object | Any
            | Composition | Collection | Unknown => None,
        }
    }

    pub fn can_have_value(self) -> bool {
        self.value_kind().is_some()
    }

    pub fn can_have_children(self) -> bool {
        use Base::*;
        matches!(
            self,
            Sequence
                | Array
                | List
                | SequenceOf
                | Choice
                | Object
                | Composition
                | Collection
                | Unknown
                | Poly
        )
    }

    /// Children are renumbered `1..N` after a deletion.
    pub fn is_positional(self) -> bool {
        matches!(self, Base::List | Base::SequenceOf)
    }

    /// Children are created from a member type and named by position.
    pub fn is_list_like(self) -> bool {
        matches!(
            self,
            Base::SequenceOf | Base::Array | Base::List | Base::Collection | Base::Unknown
        )
    }

    /// Children are declared one by one by the type.
    pub fn is_struct_like(self) -> bool {
        matches!(self, Base::Object | Base::Composition | Base::Sequence)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Base::Unsigned | Base::Integer | Base::Real | Base::Double
        )
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

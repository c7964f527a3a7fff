//! Lookup, effective inheritance and value accessors.

use chrono::{DateTime, FixedOffset};

use crate::error::{ErrorKind, XdError};
use crate::meta;
use crate::rules;
use crate::string_set::StringSet;
use crate::tree::{DataTree, NodeId};
use crate::value::Value;

/// The error for a missing item, by whether the name is metadata.
pub(crate) fn not_found(tree: &DataTree, id: NodeId, name: &str) -> XdError {
    let kind = if rules::is_metadata(name) {
        ErrorKind::MetadataNotFound
    } else {
        ErrorKind::DataNotFound
    };
    XdError::new(kind, format!("'{name}' not found")).with_target(tree.path_of(id))
}

/// Generates the three flavors of a typed accessor: on the node itself, on
/// a named sub, and on an effective sub.
macro_rules! accessors {
    ($($ty:ty => $value:ident, $value_of:ident, $effective:ident, $cast:expr;)*) => {
        impl DataTree {
            $(
                pub fn $value(&mut self, id: NodeId, default: $ty) -> $ty {
                    let cast: fn(&Value) -> Option<$ty> = $cast;
                    match self.value(id) {
                        Ok(Some(value)) => cast(&value).unwrap_or(default),
                        _ => default,
                    }
                }

                pub fn $value_of(&mut self, id: NodeId, name: &str, default: $ty) -> $ty {
                    match self.find(id, name) {
                        Ok(Some(found)) => self.$value(found, default),
                        _ => default,
                    }
                }

                pub fn $effective(&mut self, id: NodeId, name: &str, default: $ty) -> $ty {
                    match self.find_effective(id, name) {
                        Ok(Some(found)) => self.$value(found, default),
                        _ => default,
                    }
                }
            )*
        }
    };
}

accessors! {
    String => string_value, string_value_of, effective_string_value_of, |v| Some(v.to_string());
    bool => bool_value, bool_value_of, effective_bool_value_of, |v| Some(v.to_bool());
    i64 => int_value, int_value_of, effective_int_value_of, Value::as_i64;
    f64 => real_value, real_value_of, effective_real_value_of, Value::as_f64;
    Vec<u8> => octets_value, octets_value_of, effective_octets_value_of, |v| match v {
        Value::Octets(o) => Some(o.clone()),
        _ => None,
    };
    StringSet => string_set_value, string_set_value_of, effective_string_set_value_of, |v| match v {
        Value::Set(s) => Some(s.clone()),
        Value::Text(t) => Some(StringSet::parse(t)),
        _ => None,
    };
    Option<DateTime<FixedOffset>> => datetime_value, datetime_value_of, effective_datetime_value_of, |v| match v {
        Value::DateTime(d) => Some(Some(*d)),
        Value::Text(t) => DateTime::parse_from_rfc3339(t).ok().map(Some),
        _ => None,
    };
}

impl DataTree {
    /// Looks up a child or metadata item. The node is preread first and its
    /// binding gets a second chance at names it does not have.
    pub fn find(&mut self, id: NodeId, name: &str) -> Result<Option<NodeId>, XdError> {
        self.preread(id)?;
        if let Some(found) = self.find_local(id, name) {
            return Ok((!self.is_deleted(found)).then_some(found));
        }
        if let Some(binding) = self.local_binding(id) {
            if let Some(found) = binding.prefind(self, id, name)? {
                return Ok(Some(found));
            }
        }
        Ok(self
            .find_local(id, name)
            .filter(|found| !self.is_deleted(*found)))
    }

    pub fn get(&mut self, id: NodeId, name: &str) -> Result<NodeId, XdError> {
        self.find(id, name)?
            .ok_or_else(|| not_found(self, id, name))
    }

    /// `find` that falls back to `default` on absence or error.
    pub fn find_or(&mut self, id: NodeId, name: &str, default: NodeId) -> NodeId {
        self.find(id, name).ok().flatten().unwrap_or(default)
    }

    fn carries_value(&self, id: NodeId) -> bool {
        !self.base(id).can_have_value() || self.local_value(id).is_some()
    }

    fn is_usable(&mut self, id: NodeId) -> bool {
        !self.is_optional(id) && self.carries_value(id)
    }

    /// Resolves `name` through local presence, then the type definition,
    /// then the parent, as the name's inheritance rules allow.
    pub fn find_effective(&mut self, id: NodeId, name: &str) -> Result<Option<NodeId>, XdError> {
        if let Some(local) = self.find(id, name)? {
            if self.carries_value(local) {
                return Ok(Some(local));
            }
        }
        if rules::inherits_from_definition(name) {
            if self.is_from_any(id) {
                let effective = self.effective_prototype(id)?;
                if !self.is_builtin(effective) {
                    if let Some(found) = self.find_effective(effective, name)? {
                        if self.is_usable(found) {
                            return Ok(Some(found));
                        }
                    }
                }
            }
            let prototype = self.prototype_of(id);
            let found = if self.is_builtin(prototype) {
                self.find(prototype, name)?
            } else {
                self.find_effective(prototype, name)?
            };
            if let Some(found) = found {
                if self.is_usable(found) {
                    return Ok(Some(found));
                }
            }
        }
        if rules::inherits_from_parent(name) {
            if let Some(parent) = self.parent(id) {
                return self.find_effective(parent, name);
            }
        }
        Ok(None)
    }

    /// The node's value after preread.
    pub fn value(&mut self, id: NodeId) -> Result<Option<Value>, XdError> {
        self.preread(id)?;
        Ok(self.local_value(id).cloned())
    }

    pub fn has_value(&mut self, id: NodeId) -> bool {
        matches!(self.value(id), Ok(Some(_)))
    }

    /// Children in order, without the ones deleted in this session.
    pub fn children(&mut self, id: NodeId) -> Result<Vec<NodeId>, XdError> {
        self.preread(id)?;
        Ok(self
            .local_children(id)
            .into_iter()
            .filter(|c| !self.is_deleted(*c))
            .collect())
    }

    pub fn metadata(&mut self, id: NodeId) -> Result<Vec<NodeId>, XdError> {
        self.preread(id)?;
        Ok(self
            .local_metadata(id)
            .into_iter()
            .filter(|m| !self.is_deleted(*m))
            .collect())
    }

    /// Number of children. A binding may know of more than are loaded.
    pub fn count(&mut self, id: NodeId) -> Result<usize, XdError> {
        let loaded = self.children(id)?.len();
        Ok(self
            .local_binding(id)
            .and_then(|b| b.total_count(self, id))
            .unwrap_or(loaded))
    }

    // ------------------------------------------------------------ Derived properties

    pub fn is_optional(&mut self, id: NodeId) -> bool {
        self.bool_value_of(id, meta::OPTIONAL, false)
    }

    pub fn is_writable(&mut self, id: NodeId) -> bool {
        self.effective_bool_value_of(id, meta::WRITABLE, false)
    }

    pub fn is_commandable(&mut self, id: NodeId) -> bool {
        self.effective_bool_value_of(id, meta::COMMANDABLE, false)
    }

    pub fn is_readable(&mut self, id: NodeId) -> bool {
        self.effective_bool_value_of(id, meta::READABLE, true)
    }

    /// Hidden names and deleted items are never visible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        !rules::is_hidden(self.name(id)) && !self.is_deleted(id)
    }
}

//! Creating children and metadata.

use crate::base::Base;
use crate::error::{ErrorKind, XdError};
use crate::flags;
use crate::meta;
use crate::rules;
use crate::tree::{DataTree, NodeId};
use crate::value::Value;

fn cannot_create(message: impl Into<String>) -> XdError {
    XdError::new(ErrorKind::CannotCreate, message)
}

impl DataTree {
    /// Name a new child of `id` will get when `prefix` is asked for.
    pub fn next_name(&mut self, id: NodeId, prefix: &str) -> Result<String, XdError> {
        self.preread(id)?;
        // positional names stay taken until a pending delete is committed
        let children = if self.base(id).is_positional() {
            self.local_children(id)
        } else {
            self.children(id)?
        };
        let existing: Vec<String> = children
            .into_iter()
            .map(|c| self.name(c).to_string())
            .collect();
        let partial = self.bool_value_of(id, meta::PARTIAL, false);
        rules::next_available_child_name(self.base(id), prefix, &existing, partial)
    }

    /// Creates metadata `name` on `target`. Known names are instantiated
    /// from the prototype or the builtin declaration; extended names need a
    /// type or base.
    pub fn create_metadata(
        &mut self,
        target: NodeId,
        name: &str,
        type_name: Option<&str>,
        base: Option<Base>,
    ) -> Result<NodeId, XdError> {
        if self.is_immutable(target) {
            return Err(XdError::internal(format!(
                "creating '{name}' on immutable '{}'",
                self.path_of(target)
            )));
        }
        if self.is_instance(target) && rules::not_allowed_in_instances(name) {
            return Err(XdError::new(
                ErrorKind::IllegalMetadata,
                format!("Can't create metadata '{name}' on an instance"),
            )
            .with_target(self.path_of(target)));
        }
        let base = base.filter(|b| *b != Base::Poly);
        let prototype = self.prototype_of(target);
        let item = match self.find(prototype, name)? {
            Some(declared) => self.make_instance_of(declared, name)?,
            None if rules::is_standard(name) || rules::is_server_specific(name) => {
                let builtin = self.builtin(self.base(target));
                match self.find(builtin, name)? {
                    Some(declared) => self.make_instance_of(declared, name)?,
                    None => {
                        return Err(XdError::new(
                            ErrorKind::IllegalMetadata,
                            format!("Illegal metadata '{name}' for base type {}", self.base(target)),
                        )
                        .with_target(self.path_of(target)))
                    }
                }
            }
            None => self.make_instance_typed(type_name, base, name)?,
        };
        let policy = self.policy_for(target);
        if !policy.allow_create(self, target, name, type_name, base) {
            return Err(cannot_create(format!("Not allowed to create metadata '{name}' here"))
                .with_target(self.path_of(target)));
        }
        self.mark_dirty(target);
        self.add_local(target, item);
        Ok(item)
    }

    /// Creates child `name` on `target` following the rules of its base.
    /// List-like bases may pick a different name; the created child tells.
    pub fn create_child(
        &mut self,
        target: NodeId,
        name: &str,
        type_name: Option<&str>,
        base: Option<Base>,
    ) -> Result<NodeId, XdError> {
        let policy = self.policy_for(target);
        if !policy.allow_create(self, target, name, type_name, base) {
            return Err(cannot_create(format!(
                "Can't create child '{name}' here (denied by policy)"
            ))
            .with_target(self.path_of(target)));
        }
        let type_name = type_name.filter(|t| !t.is_empty());
        let base = base.filter(|b| *b != Base::Poly);
        let child = self
            .build_child(target, name, type_name, base)
            .map_err(|e| {
                e.with_target(self.path_of(target))
                    .annotate(format!("creating child '{name}'"))
            })?;
        self.mark_dirty(target);
        self.add_local(target, child);
        Ok(child)
    }

    fn from_nothing(
        &mut self,
        name: &str,
        type_name: Option<&str>,
        base: Option<Base>,
    ) -> Result<NodeId, XdError> {
        if type_name.is_none() && base.is_none() {
            return Err(cannot_create(format!(
                "Can't create child '{name}' without a specified or defined base type"
            )));
        }
        let child = self.make_instance_typed(type_name, base, name)?;
        self.set_flag(child, flags::FROM_NOTHING, true);
        Ok(child)
    }

    fn build_child(
        &mut self,
        target: NodeId,
        name: &str,
        type_name: Option<&str>,
        base: Option<Base>,
    ) -> Result<NodeId, XdError> {
        if self.is_definition(target) {
            // definitions may hold forward references, so no type checks
            let base = base.ok_or_else(|| {
                XdError::new(
                    ErrorKind::InvalidDatatype,
                    format!("Missing $base for '{name}' in definition context"),
                )
            })?;
            let name = self.next_name(target, name)?;
            return Ok(self.create_node(base, &name));
        }
        let prototype = self.prototype_of(target);
        match self.base(target) {
            Base::SequenceOf | Base::Array | Base::List | Base::Collection | Base::Unknown => {
                let name = self.next_name(target, name)?;
                if let Some(declared) = self.find_effective(target, meta::MEMBER_TYPE)? {
                    let member_type = self.string_value(declared, String::new());
                    if member_type.is_empty() {
                        return Err(XdError::new(
                            ErrorKind::InvalidDatatype,
                            "Provided $memberType is empty",
                        ));
                    }
                    let child = match type_name {
                        Some(type_name) => {
                            let member_proto = self.prototype_for(&member_type)?;
                            if !self.is_compatible_type(member_proto, type_name) {
                                return Err(XdError::new(
                                    ErrorKind::InconsistentValues,
                                    format!("Given type '{type_name}' is not compatible with member type '{member_type}'"),
                                ));
                            }
                            let child = self.make_instance(type_name, &name)?;
                            if member_type == type_name {
                                self.remove_local(child, meta::TYPE);
                            }
                            child
                        }
                        None => {
                            let child = self.make_instance(&member_type, &name)?;
                            self.remove_local(child, meta::TYPE);
                            child
                        }
                    };
                    return Ok(child);
                }
                if let Some(definition) = self.find(prototype, meta::MEMBER_TYPE_DEFINITION)? {
                    if !self.is_optional(definition) {
                        let member = self.get(definition, "1")?;
                        let effective = self.effective_type(member)?;
                        if let Some(type_name) = type_name {
                            if type_name != effective {
                                return Err(XdError::new(
                                    ErrorKind::InvalidDatatype,
                                    format!("Provided $type '{type_name}' disagrees with $memberTypeDefinition '{effective}'"),
                                ));
                            }
                        }
                        return self.make_instance_of(member, &name);
                    }
                }
                self.from_nothing(&name, type_name, base)
            }
            Base::Choice => {
                let choices = if self.is_builtin(prototype) {
                    None
                } else {
                    self.find_effective(prototype, meta::CHOICES)?
                };
                let child = match choices {
                    Some(choices) => {
                        let choice = self.find(choices, name)?.ok_or_else(|| {
                            cannot_create(format!("Data named '{name}' is not a valid choice"))
                        })?;
                        self.make_instance_of(choice, name)?
                    }
                    None if !self.is_builtin(prototype) => {
                        let effective = self.effective_type(target)?;
                        return Err(cannot_create(format!(
                            "Can't create '{name}' because type '{effective}' has no defined choices"
                        )));
                    }
                    None => self.from_nothing(name, type_name, base)?,
                };
                // at most one choice
                for existing in self.children(target)? {
                    self.discard_child(target, existing);
                }
                Ok(child)
            }
            Base::Composition | Base::Object | Base::Sequence => match self.find(prototype, name)? {
                Some(declared) => {
                    if !self.is_optional(declared) {
                        return Err(XdError::internal(format!(
                            "non-optional '{name}' found in prototype but not in instance '{}'",
                            self.path_of(target)
                        )));
                    }
                    if self.base(declared) == Base::Any {
                        let child = if type_name.is_none() && base.is_none() {
                            self.make_instance_of(declared, name)?
                        } else {
                            self.make_instance_typed(type_name, base, name)?
                        };
                        self.set_flag(child, flags::FROM_ANY, true);
                        Ok(child)
                    } else {
                        self.make_instance_of(declared, name)
                    }
                }
                None => {
                    if !(self.is_builtin(prototype) || self.base(prototype) == Base::Any) {
                        let effective = self.effective_type(target)?;
                        return Err(cannot_create(format!(
                            "Can't create '{name}' because type '{effective}' does not define that child"
                        )));
                    }
                    self.from_nothing(name, type_name, base)
                }
            },
            other => {
                let hint = if name == "value" {
                    ". Attempted child name is \"value\"; did you mean \"$value\"?"
                } else {
                    ""
                };
                Err(cannot_create(format!(
                    "Can't create new children under base type {other}{hint}"
                )))
            }
        }
    }

    /// Finds `name`, creating it when missing.
    pub fn get_or_create(
        &mut self,
        target: NodeId,
        name: &str,
        type_name: Option<&str>,
        base: Option<Base>,
    ) -> Result<NodeId, XdError> {
        if let Some(found) = self.find(target, name)? {
            return Ok(found);
        }
        if rules::is_metadata(name) {
            self.create_metadata(target, name, type_name, base)
        } else {
            self.create_child(target, name, type_name, base)
        }
    }

    /// Stores a value under `name`, creating the item if needed. A new child
    /// takes the base that holds the value natively.
    pub fn set(&mut self, target: NodeId, name: &str, value: impl Into<Value>) -> Result<NodeId, XdError> {
        let value = value.into();
        let item = self.get_or_create(target, name, None, Some(value.natural_base()))?;
        self.set_value(item, value)?;
        Ok(item)
    }

    /// Replaces the value of a node, converting it to the node's base.
    pub fn set_value(&mut self, id: NodeId, value: Value) -> Result<(), XdError> {
        if self.is_immutable(id) {
            return Err(XdError::internal(format!(
                "setting the value of immutable '{}'",
                self.path_of(id)
            )));
        }
        let value = value.conform(self.base(id))?;
        self.preread(id)?;
        self.mark_dirty(id);
        self.set_local_value(id, Some(value));
        Ok(())
    }

    /// Drops the value of a node.
    pub fn clear_value(&mut self, id: NodeId) -> Result<(), XdError> {
        self.preread(id)?;
        self.mark_dirty(id);
        self.set_local_value(id, None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_metadata_from_builtin() {
        let mut tree = DataTree::new();
        let root = tree.root();
        let node = tree.create_node(Base::Real, "r");
        tree.add_local(root, node);
        let units = tree.create_metadata(node, meta::UNITS, None, None).unwrap();
        assert_eq!(tree.base(units), Base::Enumerated);
        let err = tree.create_metadata(node, meta::CHOICES, None, None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalMetadata);
        let err = tree.create_metadata(node, meta::OPTIONAL, None, None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalMetadata);
    }

    #[test]
    fn test_extended_metadata_needs_a_base() {
        let mut tree = DataTree::new();
        let root = tree.root();
        let err = tree
            .create_metadata(root, "$com.example.note", None, None)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotRepresentable);
        let note = tree
            .create_metadata(root, "$com.example.note", None, Some(Base::String))
            .unwrap();
        assert_eq!(tree.base(note), Base::String);
    }

    #[test]
    fn test_list_members_are_numbered() {
        let mut tree = DataTree::new();
        let root = tree.root();
        let list = tree.create_child(root, "list", None, Some(Base::List)).unwrap();
        assert!(tree.is_from_nothing(list));
        let first = tree.create_child(list, "whatever", None, Some(Base::Real)).unwrap();
        let second = tree.create_child(list, "", None, Some(Base::Real)).unwrap();
        assert_eq!(tree.name(first), "1");
        assert_eq!(tree.name(second), "2");
        let err = tree.create_child(list, "x", None, None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CannotCreate);
    }

    #[test]
    fn test_member_type_from_builtin_declaration() {
        let mut tree = DataTree::new();
        let root = tree.root();
        let links = tree.create_metadata(root, meta::LINKS, None, None).unwrap();
        let link = tree.create_child(links, "", None, None).unwrap();
        assert_eq!(tree.base(link), Base::Link);
        assert!(tree.find_local(link, meta::TYPE).is_none());
    }

    #[test]
    fn test_choice_keeps_one() {
        let mut tree = DataTree::new();
        let root = tree.root();
        let choice = tree.create_child(root, "c", None, Some(Base::Choice)).unwrap();
        tree.create_child(choice, "a", None, Some(Base::Real)).unwrap();
        tree.create_child(choice, "b", None, Some(Base::String)).unwrap();
        let names: Vec<_> = tree
            .local_children(choice)
            .into_iter()
            .map(|c| tree.name(c).to_string())
            .collect();
        assert_eq!(names, vec!["b"]);
    }

    #[test]
    fn test_leaf_cannot_have_children() {
        let mut tree = DataTree::new();
        let root = tree.root();
        let leaf = tree.set(root, "leaf", 1.5).unwrap();
        assert_eq!(tree.base(leaf), Base::Real);
        let err = tree.create_child(leaf, "value", None, Some(Base::Real)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CannotCreate);
        assert!(err.message.contains("$value"));
    }
}

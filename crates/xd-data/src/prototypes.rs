//! Definitions, prototypes and instances.
//!
//! A definition is authored data registered on the tree under a type name.
//! The first time the type is needed it is rolled up into a prototype: the
//! prototype of whatever it extends, instantiated, then overlaid with the
//! definition's own metadata, children and value. Prototypes live under
//! [`DataTree::prototypes_root`], are immutable once built, and are shared by
//! every instance of the type.

use tracing::debug;

use crate::base::Base;
use crate::error::{ErrorKind, XdError};
use crate::flags;
use crate::given::Given;
use crate::meta;
use crate::tree::{DataTree, NodeId};
use crate::value::Value;

fn circular(name: &str) -> XdError {
    XdError::new(
        ErrorKind::InconsistentValues,
        format!("Circular definition encountered for '{name}'"),
    )
}

impl DataTree {
    /// Registers a definition without building its prototype yet, so that
    /// definitions may refer to ones registered later. A cached prototype
    /// of the same name is dropped.
    pub fn register_definition(&mut self, definition: Given) {
        let name = definition.name.clone();
        let prototypes = self.prototypes_root();
        self.remove_local(prototypes, &name);
        self.definitions.insert(name, definition);
    }

    /// Registers a definition and builds its prototype.
    pub fn define(&mut self, definition: Given) -> Result<NodeId, XdError> {
        let name = definition.name.clone();
        self.register_definition(definition);
        self.prototype_for(&name)
    }

    pub fn definition(&self, name: &str) -> Option<&Given> {
        self.definitions.get(name)
    }

    /// The prototype for a type name. Builtin base names resolve to the
    /// builtin; `Top/child` names descend through nested prototypes.
    pub fn prototype_for(&mut self, type_name: &str) -> Result<NodeId, XdError> {
        let mut depth = 0;
        self.prototype_for_depth(type_name, &mut depth)
    }

    fn enter(&self, depth: &mut usize, name: &str) -> Result<(), XdError> {
        *depth += 1;
        if *depth > self.config().max_definition_depth {
            return Err(circular(name));
        }
        Ok(())
    }

    fn prototype_for_depth(&mut self, type_name: &str, depth: &mut usize) -> Result<NodeId, XdError> {
        self.enter(depth, type_name)?;
        let result = if type_name.contains('/') {
            self.nested_prototype(type_name, depth)
        } else {
            self.top_prototype(type_name, depth)
        };
        *depth -= 1;
        result
    }

    fn nested_prototype(&mut self, type_name: &str, depth: &mut usize) -> Result<NodeId, XdError> {
        let mut segments = type_name.split('/');
        let top = segments.next().unwrap_or_default();
        let mut found = self.prototype_for_depth(top, depth)?;
        for segment in segments {
            let mut sub = self.find(found, segment)?;
            // prototypes don't copy their own prototype's metadata
            let mut proto = self.prototype_of(found);
            while sub.is_none() && !self.is_builtin(proto) {
                sub = self.find(proto, segment)?;
                proto = self.prototype_of(proto);
            }
            found = sub.ok_or_else(|| {
                XdError::new(
                    ErrorKind::InvalidDatatype,
                    format!("When resolving type name '{type_name}', '{segment}' was not found"),
                )
            })?;
        }
        Ok(found)
    }

    fn top_prototype(&mut self, type_name: &str, depth: &mut usize) -> Result<NodeId, XdError> {
        let prototypes = self.prototypes_root();
        if let Some(existing) = self.find_local(prototypes, type_name) {
            return Ok(existing);
        }
        let base = Base::from_name(type_name);
        if base.is_valid() {
            return Ok(self.builtin(base));
        }
        let definition = self.definitions.get(type_name).cloned().ok_or_else(|| {
            XdError::new(
                ErrorKind::InconsistentValues,
                format!("Missing definition for '{type_name}'"),
            )
        })?;
        let prototype = self.make_prototype(&definition, None, depth)?;
        self.add_local(prototypes, prototype);
        self.set_flag(prototype, flags::PROTOTYPE | flags::IMMUTABLE, true);
        debug!(type_name, base = %self.base(prototype), "built prototype");
        Ok(prototype)
    }

    /// Base a builtin declares for metadata `name` on `owner` nodes.
    fn declared_base(&self, owner: Base, name: &str) -> Option<Base> {
        self.find_local(self.builtin(owner), name)
            .map(|decl| self.base(decl))
    }

    /// Base a builtin declares for the members of metadata `name`.
    fn declared_member_base(&self, owner: Base, name: &str) -> Option<Base> {
        let decl = self.find_local(self.builtin(owner), name)?;
        let member = self.find_local(decl, meta::MEMBER_TYPE)?;
        let base = Base::from_name(self.local_value(member)?.as_str()?);
        base.is_valid().then_some(base)
    }

    /// Rolls a definition up into a detached prototype node. `hint` is the
    /// base to use when the definition does not name one.
    fn make_prototype(
        &mut self,
        definition: &Given,
        hint: Option<Base>,
        depth: &mut usize,
    ) -> Result<NodeId, XdError> {
        self.enter(depth, &definition.name)?;
        let extension = definition
            .meta_text(meta::EXTENDS)
            .or_else(|| definition.meta_text(meta::TYPE))
            .or_else(|| definition.meta_text(meta::OVERLAYS));
        let result = match extension {
            Some(extended) => {
                let prototype = self.prototype_for_depth(&extended, depth)?;
                self.make_instance_of_depth(prototype, &definition.name, depth)?
            }
            None => {
                let base = definition
                    .base
                    .or(hint)
                    .unwrap_or_else(|| definition.inferred_base());
                self.create_node(base, &definition.name)
            }
        };
        self.set_flag(result, flags::PROTOTYPE, true);
        let base = self.base(result);

        for given_meta in &definition.metadata {
            let name = given_meta.name.as_str();
            match name {
                meta::TYPE | meta::EXTENDS | meta::OVERLAYS => {}
                meta::MEMBER_TYPE_DEFINITION => {
                    let member = given_meta.child("1").ok_or_else(|| {
                        XdError::new(
                            ErrorKind::InconsistentValues,
                            format!("'{}' has a $memberTypeDefinition without member '1'", definition.name),
                        )
                    })?;
                    let member_proto = self.make_prototype(member, None, depth)?;
                    let wrapper = self.create_node(Base::List, meta::MEMBER_TYPE_DEFINITION);
                    self.add_local(wrapper, member_proto);
                    self.add_local(result, wrapper);
                }
                meta::NAMED_VALUES | meta::NAMED_BITS => {
                    self.merge_named(result, given_meta, depth)?;
                }
                meta::CHOICES => match self.find_effective(result, meta::CHOICES)? {
                    Some(existing) if self.parent(existing) == Some(result) => {
                        self.overlay_definition(existing, given_meta, depth)?;
                    }
                    Some(inherited) => {
                        let copy = self.make_deep_copy(inherited)?;
                        self.add_local(result, copy);
                        self.overlay_definition(copy, given_meta, depth)?;
                    }
                    None => {
                        let choices = self.make_prototype(given_meta, Some(Base::Collection), depth)?;
                        self.add_local(result, choices);
                    }
                },
                _ => match self.find(result, name)? {
                    Some(existing) => self.overlay_definition(existing, given_meta, depth)?,
                    None => {
                        let hint = self.declared_base(base, name);
                        let item = self.make_prototype(given_meta, hint, depth)?;
                        self.add_local(result, item);
                    }
                },
            }
        }

        if base.is_list_like() {
            for child in self.local_children(result) {
                let name = self.name(child).to_string();
                self.remove_local(result, &name);
            }
            for given_child in &definition.children {
                let child = self.make_prototype(given_child, None, depth)?;
                self.add_local(result, child);
            }
            if !definition.children.is_empty() {
                self.remove_local(result, meta::OPTIONAL);
            }
        } else if base.is_struct_like() || base == Base::Choice {
            for given_child in &definition.children {
                let child = self.make_prototype(given_child, None, depth)?;
                self.add_local(result, child);
            }
        }

        if base.can_have_value() {
            if let Some(value) = &definition.value {
                let value = value.clone().conform(base)?;
                self.set_local_value(result, Some(value));
                self.remove_local(result, meta::OPTIONAL);
            }
        }
        *depth -= 1;
        Ok(result)
    }

    /// Updates part of a prototype under construction from more definition
    /// data. Existing items are overlaid, new ones are added.
    fn overlay_definition(
        &mut self,
        target: NodeId,
        definition: &Given,
        depth: &mut usize,
    ) -> Result<(), XdError> {
        let base = self.base(target);
        for given_meta in &definition.metadata {
            match self.find_local(target, &given_meta.name) {
                Some(existing) => self.overlay_definition(existing, given_meta, depth)?,
                None => {
                    let hint = self.declared_base(base, &given_meta.name);
                    let item = self.make_prototype(given_meta, hint, depth)?;
                    self.add_local(target, item);
                }
            }
        }
        for given_child in &definition.children {
            match self.find_local(target, &given_child.name) {
                Some(existing) => self.overlay_definition(existing, given_child, depth)?,
                None => {
                    let item = self.make_prototype(given_child, None, depth)?;
                    self.add_local(target, item);
                }
            }
        }
        if base.can_have_value() {
            if let Some(value) = &definition.value {
                let value = value.clone().conform(base)?;
                self.set_local_value(target, Some(value));
            }
        }
        Ok(())
    }

    fn assigned_number(&mut self, item: NodeId, bits: bool) -> i64 {
        if bits {
            self.effective_int_value_of(item, meta::BIT, -1)
        } else {
            self.int_value(item, -1)
        }
    }

    fn assign_number(&mut self, item: NodeId, number: i64, bits: bool) -> Result<(), XdError> {
        let value = Value::Integer(number);
        if bits {
            let bit = self.create_node(Base::Unsigned, meta::BIT);
            self.set_local_value(bit, Some(value.conform(Base::Unsigned)?));
            self.add_local(item, bit);
        } else if self.base(item).can_have_value() {
            let base = self.base(item);
            self.set_local_value(item, Some(value.conform(base)?));
        }
        Ok(())
    }

    /// Flattens `$namedValues` / `$namedBits`: the extended entries are
    /// copied, then the given ones overlaid or appended. Entries without a
    /// number get one past the highest seen so far.
    fn merge_named(&mut self, result: NodeId, given_meta: &Given, depth: &mut usize) -> Result<(), XdError> {
        let name = given_meta.name.as_str();
        let bits = name == meta::NAMED_BITS;
        let base = self.base(result);
        let member_hint = self.declared_member_base(base, name);
        let extended = self.find_effective(result, name)?;
        let combined = self.create_node(Base::Collection, name);
        let mut highest: i64 = -1;
        if let Some(extended) = extended {
            for thing in self.children(extended)? {
                let copy = self.make_deep_copy(thing)?;
                if self.assigned_number(copy, bits) == -1 {
                    highest += 1;
                    self.assign_number(copy, highest, bits)?;
                }
                highest = highest.max(self.assigned_number(copy, bits));
                self.add_local(combined, copy);
            }
        }
        for given_thing in &given_meta.children {
            match self.find_local(combined, &given_thing.name) {
                Some(existing) => {
                    let given_number = if bits {
                        given_thing
                            .meta(meta::BIT)
                            .and_then(|b| b.value.as_ref())
                            .and_then(Value::as_i64)
                    } else {
                        given_thing.value.as_ref().and_then(Value::as_i64)
                    };
                    if let Some(given_number) = given_number {
                        if given_number != self.assigned_number(existing, bits) {
                            return Err(XdError::new(
                                ErrorKind::InconsistentValues,
                                format!("Can't change value of extended item '{}'", given_thing.name),
                            )
                            .with_target(name));
                        }
                    }
                    self.overlay_definition(existing, given_thing, depth)?;
                }
                None => {
                    let thing = self.make_prototype(given_thing, member_hint, depth)?;
                    let number = self.assigned_number(thing, bits);
                    if number == -1 {
                        highest += 1;
                        self.assign_number(thing, highest, bits)?;
                    } else {
                        highest = highest.max(number);
                    }
                    self.add_local(combined, thing);
                }
            }
        }
        self.add_local(result, combined);
        Ok(())
    }

    // ------------------------------------------------------------ Instances

    /// Creates a detached instance of a prototype. Non-optional children are
    /// instantiated along with it; metadata stays with the prototype.
    pub fn make_instance_of(&mut self, prototype: NodeId, name: &str) -> Result<NodeId, XdError> {
        let mut depth = 0;
        self.make_instance_of_depth(prototype, name, &mut depth)
    }

    fn make_instance_of_depth(
        &mut self,
        prototype: NodeId,
        name: &str,
        depth: &mut usize,
    ) -> Result<NodeId, XdError> {
        if !self.is_prototype(prototype) {
            return Err(XdError::internal(format!(
                "'{}' is not a prototype",
                self.path_of(prototype)
            )));
        }
        self.enter(depth, self.name(prototype))?;
        let base = self.base(prototype);
        let instance = self.create_node(base, name);
        // builtin shells stay implicit; builtin declarations are linked so
        // their `$memberType` applies
        if prototype != self.builtin(base) {
            self.set_prototype(instance, Some(prototype));
        }
        for child_proto in self.children(prototype)? {
            if !self.is_optional(child_proto) {
                let child_name = self.name(child_proto).to_string();
                let child = self.make_instance_of_depth(child_proto, &child_name, depth)?;
                self.add_local(instance, child);
            }
        }
        if base.can_have_value() {
            let value = self.local_value(prototype).cloned();
            self.set_local_value(instance, value);
        }
        *depth -= 1;
        Ok(instance)
    }

    /// Creates a detached instance of a named type. Types that are not base
    /// names are recorded in a local `$type`.
    pub fn make_instance(&mut self, type_name: &str, name: &str) -> Result<NodeId, XdError> {
        let prototype = self.prototype_for(type_name)?;
        let instance = self.make_instance_of(prototype, name)?;
        if !Base::from_name(type_name).is_valid() {
            let declared = self.create_node(Base::String, meta::TYPE);
            self.set_local_value(declared, Some(Value::from(type_name)));
            self.add_local(instance, declared);
        }
        Ok(instance)
    }

    /// Instance from a type name if there is one, else a plain node of
    /// `base`.
    pub fn make_instance_typed(
        &mut self,
        type_name: Option<&str>,
        base: Option<Base>,
        name: &str,
    ) -> Result<NodeId, XdError> {
        match (type_name, base) {
            (Some(type_name), _) => self.make_instance(type_name, name),
            (None, Some(base)) => Ok(self.create_node(base, name)),
            (None, None) => Err(XdError::new(
                ErrorKind::NotRepresentable,
                format!("Neither type nor base provided for '{name}'"),
            )),
        }
    }

    // ------------------------------------------------------------ Types

    /// The prototype that defines what `id` is meant to be. For nodes that
    /// replaced an `Any` placeholder this is the placeholder's definition,
    /// not the concrete prototype.
    pub fn effective_prototype(&mut self, id: NodeId) -> Result<NodeId, XdError> {
        if self.is_from_any(id) {
            if let Some(parent) = self.parent(id) {
                let parent_proto = self.prototype_of(parent);
                if !self.is_builtin(parent_proto) {
                    let name = self.name(id).to_string();
                    match self.base(parent) {
                        Base::Object | Base::Composition | Base::Sequence => {
                            return self.find(parent_proto, &name)?.ok_or_else(|| {
                                XdError::internal(format!(
                                    "'{name}' does not exist in definition {}",
                                    self.prototype_path(parent_proto)
                                ))
                            });
                        }
                        Base::Choice => {
                            if let Some(choices) = self.find_effective(parent_proto, meta::CHOICES)? {
                                return self.find(choices, &name)?.ok_or_else(|| {
                                    XdError::internal(format!(
                                        "'{name}' is not a valid choice in {}",
                                        self.prototype_path(parent_proto)
                                    ))
                                });
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(self.prototype_of(id))
    }

    /// Name of the effective type, empty for plain base types.
    pub fn effective_type(&mut self, id: NodeId) -> Result<String, XdError> {
        let prototype = self.effective_prototype(id)?;
        Ok(if self.is_builtin(prototype) {
            String::new()
        } else {
            self.prototype_path(prototype)
        })
    }

    /// Type name of a prototype, `Top/child` for nested ones.
    pub fn prototype_path(&self, prototype: NodeId) -> String {
        let prototypes = self.prototypes_root();
        let mut names = Vec::new();
        let mut cur = prototype;
        loop {
            names.push(self.name(cur).to_string());
            match self.parent(cur) {
                Some(parent) if parent == prototypes => break,
                Some(parent) => cur = parent,
                None => return self.name(prototype).to_string(),
            }
        }
        names.reverse();
        xd_path::format_path(&names)
    }

    /// Whether data declared as `given_type` may be stored in `target`:
    /// exact matches, and given types that extend the target's type.
    pub fn is_compatible_type(&mut self, target: NodeId, given_type: &str) -> bool {
        self.compatible(target, given_type).unwrap_or(false)
    }

    fn compatible(&mut self, target: NodeId, given_type: &str) -> Result<bool, XdError> {
        if self.base(target) == Base::Any || self.is_from_any(target) {
            return Ok(true);
        }
        if self.string_value_of(target, meta::TYPE, String::new()) == given_type {
            return Ok(true);
        }
        if self.effective_type(target)? == given_type {
            return Ok(true);
        }
        let target_proto = self.prototype_of(target);
        let given_proto = self.prototype_for(given_type)?;
        if self.extends(given_proto, target_proto) {
            return Ok(true);
        }
        // the target may only be implied by a builtin
        if !self.is_builtin(target_proto) {
            let above = self.prototype_of(target_proto);
            if self.extends(given_proto, above) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Walks the prototype chain from `from` looking for `ancestor`.
    fn extends(&self, from: NodeId, ancestor: NodeId) -> bool {
        let mut cur = from;
        for _ in 0..=self.config().max_definition_depth {
            if cur == ancestor {
                return true;
            }
            if self.is_builtin(cur) {
                break;
            }
            cur = self.prototype_of(cur);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> Given {
        Given::new("Point", Base::Sequence)
            .with_meta(Given::new(meta::DISPLAY_NAME, Base::String).with_value("A point"))
            .with_child(Given::new("x", Base::Real).with_value(0.0))
            .with_child(Given::new("y", Base::Real).with_value(0.0))
            .with_child(
                Given::new("label", Base::String)
                    .with_meta(Given::new(meta::OPTIONAL, Base::Boolean).with_value(true)),
            )
    }

    #[test]
    fn test_define_and_instantiate() {
        let mut tree = DataTree::new();
        let proto = tree.define(point()).unwrap();
        assert!(tree.is_prototype(proto));
        assert!(tree.is_immutable(proto));
        assert_eq!(tree.prototype_path(proto), "Point");
        let p = tree.make_instance("Point", "p").unwrap();
        let names: Vec<String> = tree
            .local_children(p)
            .into_iter()
            .map(|c| tree.name(c).to_string())
            .collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(tree.string_value_of(p, meta::TYPE, String::new()), "Point");
        assert_eq!(
            tree.effective_string_value_of(p, meta::DISPLAY_NAME, String::new()),
            "A point"
        );
    }

    #[test]
    fn test_extension_appends_children() {
        let mut tree = DataTree::new();
        tree.register_definition(point());
        tree.register_definition(
            Given::new("Point3", Base::Sequence)
                .with_meta_text(meta::EXTENDS, "Point")
                .with_child(Given::new("z", Base::Real).with_value(0.0)),
        );
        let p = tree.make_instance("Point3", "p").unwrap();
        assert_eq!(tree.local_children(p).len(), 3);
        assert!(tree.is_compatible_type(p, "Point3"));
        let plain = tree.make_instance("Point", "q").unwrap();
        assert!(tree.is_compatible_type(plain, "Point3"));
        assert!(!tree.is_compatible_type(p, "Nope"));
    }

    #[test]
    fn test_missing_and_circular_definitions() {
        let mut tree = DataTree::new();
        let err = tree.prototype_for("Nope").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InconsistentValues);
        tree.register_definition(Given::new("A", Base::Sequence).with_meta_text(meta::EXTENDS, "B"));
        tree.register_definition(Given::new("B", Base::Sequence).with_meta_text(meta::EXTENDS, "A"));
        let err = tree.prototype_for("A").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InconsistentValues);
        assert!(err.message.contains("Circular"));
    }

    #[test]
    fn test_nested_type_names() {
        let mut tree = DataTree::new();
        tree.register_definition(point());
        let x = tree.prototype_for("Point/x").unwrap();
        assert_eq!(tree.base(x), Base::Real);
        assert_eq!(tree.prototype_path(x), "Point/x");
        let err = tree.prototype_for("Point/w").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidDatatype);
    }

    #[test]
    fn test_named_values_are_numbered() {
        let mut tree = DataTree::new();
        tree.register_definition(
            Given::new("Color", Base::Enumerated).with_meta(
                Given::new(meta::NAMED_VALUES, Base::Collection)
                    .with_child(Given::untyped("red"))
                    .with_child(Given::untyped("green").with_value(Value::Unsigned(5)))
                    .with_child(Given::untyped("blue")),
            ),
        );
        tree.register_definition(
            Given::new("MoreColor", Base::Enumerated)
                .with_meta_text(meta::EXTENDS, "Color")
                .with_meta(
                    Given::new(meta::NAMED_VALUES, Base::Collection)
                        .with_child(Given::untyped("cyan")),
                ),
        );
        let proto = tree.prototype_for("MoreColor").unwrap();
        let named = tree.find_local(proto, meta::NAMED_VALUES).unwrap();
        let numbers: Vec<(String, i64)> = tree
            .local_children(named)
            .into_iter()
            .map(|c| (tree.name(c).to_string(), tree.int_value(c, -1)))
            .collect();
        assert_eq!(
            numbers,
            vec![
                ("red".to_string(), 0),
                ("green".to_string(), 5),
                ("blue".to_string(), 6),
                ("cyan".to_string(), 7),
            ]
        );
    }
}

//! Merging given data onto the tree.

use std::ops::BitOr;

use tracing::debug;

use crate::base::Base;
use crate::context::Context;
use crate::error::{ErrorKind, XdError};
use crate::flags;
use crate::given::Given;
use crate::meta;
use crate::rules;
use crate::tree::{DataTree, NodeId};
use crate::value::Value;

/// Modifiers for [`DataTree::put`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutOptions(u32);

impl PutOptions {
    pub const NONE: PutOptions = PutOptions(0);
    /// Metadata a server computes is accepted, as when loading data a
    /// client received.
    pub const USE_CLIENT_RULES: PutOptions = PutOptions(0x01);
    /// Skip the replacement of `Any` data.
    pub const NO_TYPE_CHECK: PutOptions = PutOptions(0x02);
    /// Treat the given data as partial even without `$partial`.
    pub const GIVEN_PARTIAL: PutOptions = PutOptions(0x04);
    /// Write even where `$writable` says no.
    pub const FORCE_WRITE: PutOptions = PutOptions(0x08);
    /// Check metadata against the POST list instead of the PUT list.
    pub const USE_POST_RULES: PutOptions = PutOptions(0x10);

    pub fn contains(self, other: PutOptions) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PutOptions {
    type Output = PutOptions;

    fn bitor(self, rhs: PutOptions) -> PutOptions {
        PutOptions(self.0 | rhs.0)
    }
}

fn value_format(message: impl Into<String>) -> XdError {
    XdError::new(ErrorKind::ValueFormat, message)
}

/// Name of the slot choice that holds a commanded value of `base`.
fn slot_choice_name(base: Base) -> &'static str {
    match base {
        Base::Real => "real",
        Base::Unsigned => "unsigned",
        Base::Boolean => "boolean",
        Base::Integer => "integer",
        Base::Double => "double",
        Base::Enumerated => "enumerated",
        Base::String => "characterstring",
        Base::OctetString => "octetstring",
        Base::BitString => "bitstring",
        Base::Date => "date",
        Base::Time => "time",
        Base::DateTime => "datetime",
        Base::ObjectIdentifier => "objectidentifier",
        _ => "constructed-value",
    }
}

const NULL_CHOICE: &str = "null";

impl DataTree {
    /// Puts `given` on top of `target` and returns the resulting node. That
    /// is `target` itself unless `Any` data had to be replaced by data of
    /// the given type.
    pub fn put(
        &mut self,
        target: NodeId,
        given: &Given,
        ctx: &Context,
        options: PutOptions,
    ) -> Result<NodeId, XdError> {
        self.put_checked(target, given, ctx, options).map_err(|e| {
            e.with_target(self.path_of(target))
                .with_given(given.name.clone())
        })
    }

    fn put_checked(
        &mut self,
        target: NodeId,
        given: &Given,
        ctx: &Context,
        options: PutOptions,
    ) -> Result<NodeId, XdError> {
        self.preread(target)?;
        if self.is_immutable(target) {
            return Err(XdError::internal(format!(
                "modifying immutable '{}'",
                self.path_of(target)
            )));
        }
        let authorizer = ctx.authorizer();
        let privileged = authorizer.in_god_mode() || options.contains(PutOptions::FORCE_WRITE);
        if !privileged && !self.is_writable(target) {
            return Err(XdError::new(ErrorKind::NotWritable, "Data is not writable"));
        }
        if !authorizer.check_write(self, target) {
            return Err(XdError::new(
                ErrorKind::NotAuthorized,
                "Data is not writable with given authorization",
            ));
        }
        self.mark_dirty(target);

        let target_base = self.base(target);
        let given_base = given.base_or_poly();
        if given_base == Base::Poly && target_base == Base::Any {
            return Err(value_format(
                "Failed to give a base type on data for a target of base type 'Any'",
            ));
        }
        if given_base != Base::Poly
            && given_base != target_base
            && target_base != Base::Any
            && target_base != Base::Poly
            && !(given_base == Base::Null && self.is_commandable(target))
            && !self.is_from_nothing(target)
            && !self.is_from_any(target)
        {
            return Err(XdError::new(
                ErrorKind::TargetDatatype,
                format!("Given base type {given_base} is not compatible with target base type {target_base}"),
            ));
        }

        let given_type = self.check_declarations(target, given)?;
        if let Some(type_name) = &given_type {
            if self.is_instance(target) && !self.is_compatible_type(target, type_name) {
                let effective = self.effective_type(target)?;
                return Err(XdError::new(
                    ErrorKind::InconsistentValues,
                    format!("Given type name {type_name} is not compatible with target type {effective}"),
                ));
            }
        }

        if (self.is_from_any(target) || target_base == Base::Any)
            && !options.contains(PutOptions::NO_TYPE_CHECK)
        {
            let prototype = self.prototype_of(target);
            let current_type = if self.is_builtin(prototype) {
                String::new()
            } else {
                self.prototype_path(prototype)
            };
            if (given_base != Base::Poly && given_base != target_base)
                || given_type.as_ref().is_some_and(|t| *t != current_type)
            {
                return self.replace_any(target, given, given_type.as_deref(), ctx, options);
            }
        }

        self.put_metadata(target, given, ctx, options)?;
        self.reconcile_children(target, given, ctx, options)?;
        self.put_children(target, given, ctx, options)?;
        if self.base(target).can_have_value() {
            self.put_value_helper(target, given, ctx)?;
        }
        self.validate_consistency(target)?;
        Ok(target)
    }

    /// Checks `$type`, `$extends` and `$overlays` of the given data against
    /// each other and against the target. Returns the given `$type`.
    fn check_declarations(&mut self, target: NodeId, given: &Given) -> Result<Option<String>, XdError> {
        // present without a value counts as empty
        let declared = |name: &str| {
            given
                .meta(name)
                .map(|m| m.value.as_ref().map(Value::to_string).unwrap_or_default())
        };
        let given_type = declared(meta::TYPE);
        let given_extends = declared(meta::EXTENDS);
        let given_overlays = declared(meta::OVERLAYS);
        let mut local = |name: &str| -> Result<Option<String>, XdError> {
            Ok(match self.find(target, name)? {
                Some(found) => Some(self.string_value(found, String::new())),
                None => None,
            })
        };
        let target_type = local(meta::TYPE)?;
        let target_extends = local(meta::EXTENDS)?;
        let target_overlays = local(meta::OVERLAYS)?;

        if given_type.is_some() && given_extends.is_some() {
            return Err(value_format("Given both $type and $extends"));
        }
        if given_extends.is_some() && given_overlays.is_some() {
            return Err(value_format("Given both $extends and $overlays"));
        }
        if given_overlays.is_some() && given_type.is_some() {
            return Err(value_format("Given both $type and $overlays"));
        }
        for (name, declared) in [
            (meta::TYPE, &given_type),
            (meta::EXTENDS, &given_extends),
            (meta::OVERLAYS, &given_overlays),
        ] {
            if declared.as_deref() == Some("") {
                return Err(value_format(format!("Given {name} name is empty")));
            }
        }
        if let Some(given_type) = &given_type {
            let replaceable = self.is_from_any(target) || self.base(target) == Base::Any;
            if !replaceable && target_type.as_ref().is_some_and(|t| t != given_type) {
                return Err(value_format("Given $type does not match target $type"));
            }
            if target_extends.is_some() {
                return Err(value_format("Given $type but target already has $extends"));
            }
            if target_overlays.is_some() {
                return Err(value_format("Given $type but target already has $overlays"));
            }
        }
        if let Some(given_extends) = &given_extends {
            if target_type.is_some() {
                return Err(value_format("Given $extends but target already has $type"));
            }
            if target_extends.as_ref().is_some_and(|t| t != given_extends) {
                return Err(value_format("Given $extends does not match existing $extends"));
            }
            if target_overlays.is_some() {
                return Err(value_format("Given $extends but target already has $overlays"));
            }
        }
        if let Some(given_overlays) = &given_overlays {
            if target_type.is_some() {
                return Err(value_format("Given $overlays but target already has $type"));
            }
            if target_extends.is_some() {
                return Err(value_format("Given $overlays but target already has $extends"));
            }
            if target_overlays.as_ref().is_some_and(|t| t != given_overlays) {
                return Err(value_format("Given $overlays does not match target $overlays"));
            }
        }
        Ok(given_type)
    }

    /// Swaps `Any` data for a fresh node of the given base or type, in the
    /// same slot of the same parent.
    fn replace_any(
        &mut self,
        target: NodeId,
        given: &Given,
        given_type: Option<&str>,
        ctx: &Context,
        options: PutOptions,
    ) -> Result<NodeId, XdError> {
        let name = self.name(target).to_string();
        let replacement = match given_type {
            Some(type_name) => self.make_instance(type_name, &name)?,
            None => self.create_node(given.base_or_poly(), &name),
        };
        debug!(
            path = %self.path_of(target),
            from = %self.base(target),
            to = %self.base(replacement),
            "replacing any"
        );
        // the replacement stays replaceable
        self.set_flag(replacement, flags::FROM_ANY, true);
        if let Some(parent) = self.parent(target) {
            self.mark_dirty(parent);
            self.add_local(parent, replacement);
        }
        self.put(replacement, given, ctx, options | PutOptions::NO_TYPE_CHECK)
    }

    fn put_metadata(
        &mut self,
        target: NodeId,
        given: &Given,
        ctx: &Context,
        options: PutOptions,
    ) -> Result<(), XdError> {
        let privileged = ctx.authorizer().in_god_mode() || options.contains(PutOptions::FORCE_WRITE);
        for given_meta in &given.metadata {
            let name = given_meta.name.as_str();
            if !options.contains(PutOptions::USE_CLIENT_RULES) {
                if name == meta::PARTIAL {
                    continue;
                }
                if options.contains(PutOptions::USE_POST_RULES) {
                    if rules::not_allowed_for_post(name) {
                        return Err(value_format(format!("Can't post computed metadata '{name}'")));
                    }
                } else if rules::not_allowed_for_put(name) {
                    return Err(value_format(format!("Can't put computed metadata '{name}'")));
                }
            }
            let target_meta = match self.find(target, name)? {
                Some(found) => found,
                None => {
                    let type_name = given_meta.meta_text(meta::TYPE);
                    let base = given_meta.base.filter(|b| *b != Base::Poly);
                    let policy = self.policy_for(target);
                    // metadata that may not be created is ignored on PUT
                    if !policy.allow_create(self, target, name, type_name.as_deref(), base) {
                        continue;
                    }
                    self.create_metadata(target, name, type_name.as_deref(), base)?
                }
            };
            if !privileged && !self.is_writable(target_meta) {
                continue;
            }
            self.put(target_meta, given_meta, ctx, options)?;
        }
        Ok(())
    }

    /// Deletes the children the given data leaves out, as far as the base
    /// allows it. Partial and truncated data deletes nothing.
    fn reconcile_children(
        &mut self,
        target: NodeId,
        given: &Given,
        ctx: &Context,
        options: PutOptions,
    ) -> Result<(), XdError> {
        let partial = given.is_partial();
        let truncated = given.is_truncated();
        if !partial {
            self.remove_local(target, meta::PARTIAL);
        }
        if !truncated {
            self.remove_local(target, meta::TRUNCATED);
        }
        let partial = partial || options.contains(PutOptions::GIVEN_PARTIAL);
        let base = self.base(target);
        if !base.can_have_children() || !self.is_instance(target) || partial || truncated {
            return Ok(());
        }
        let mut doomed = Vec::new();
        for child in self.children(target)? {
            let name = self.name(child).to_string();
            // what the client can't see, it can't be blamed for leaving out
            if given.child(&name).is_none() && ctx.authorizer().check_visible(self, child) {
                doomed.push((child, name));
            }
        }
        match base {
            Base::Array | Base::Unknown => {
                let count = given.children.len();
                for i in 1..=count {
                    if given.child(&i.to_string()).is_none() {
                        return Err(XdError::new(
                            ErrorKind::InconsistentValues,
                            format!("Given data contains {count} array members, but member '{i}' was not provided"),
                        ));
                    }
                }
            }
            Base::List | Base::SequenceOf | Base::Poly | Base::Collection => {}
            Base::Choice => {
                if given.children.is_empty() {
                    return Err(XdError::new(
                        ErrorKind::CannotDelete,
                        "Provided data is not marked $partial and a valid choice was not provided",
                    ));
                }
            }
            Base::Object | Base::Composition | Base::Sequence => {
                for (child, name) in &doomed {
                    let prototype = self.prototype_of(*child);
                    if !self.is_builtin(prototype) && !self.is_optional(prototype) {
                        return Err(XdError::new(
                            ErrorKind::CannotDelete,
                            format!("Provided data is not marked $partial and non-optional child '{name}' was not provided"),
                        ));
                    }
                }
            }
            other => {
                return Err(XdError::internal(format!("unhandled base {other} in put")));
            }
        }
        // from the end, so positional names stay valid
        for (_, name) in doomed.iter().rev() {
            self.delete(target, name, ctx)?;
        }
        Ok(())
    }

    fn put_children(
        &mut self,
        target: NodeId,
        given: &Given,
        ctx: &Context,
        options: PutOptions,
    ) -> Result<(), XdError> {
        let count = given.children.len() as i64;
        let max = self.effective_int_value_of(target, meta::MAXIMUM_SIZE_FOR_WRITING, i64::MAX);
        if count > max {
            return Err(XdError::new(
                ErrorKind::ValueOutOfRange,
                format!("Number of provided children ({count}) is greater than allowed by $maximumSizeForWriting ({max})"),
            ));
        }
        let min = self.effective_int_value_of(target, meta::MINIMUM_SIZE_FOR_WRITING, 0);
        if count < min {
            return Err(XdError::new(
                ErrorKind::ValueOutOfRange,
                format!("Number of provided children ({count}) is fewer than allowed by $minimumSizeForWriting ({min})"),
            ));
        }
        for given_child in &given.children {
            let target_child = match self.find(target, &given_child.name)? {
                Some(found) => found,
                None => {
                    let type_name = given_child.meta_text(meta::TYPE);
                    let base = given_child.base.filter(|b| *b != Base::Poly);
                    self.create_child(target, &given_child.name, type_name.as_deref(), base)?
                }
            };
            self.put(target_child, given_child, ctx, options)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------ Values

    fn put_value_helper(&mut self, target: NodeId, given: &Given, ctx: &Context) -> Result<(), XdError> {
        let base = self.base(target);
        if self.is_commandable(target) {
            let command = match (&given.value, given.base_or_poly()) {
                (_, Base::Null) => None,
                (Some(value), _) => Some(value.clone().conform(base)?),
                // metadata-only data commands nothing
                (None, _) => return Ok(()),
            };
            let priority = if ctx.is_target(target) { ctx.priority() } else { 16 };
            let array = self.priority_array(target)?;
            let slot = self.get(array, &priority.to_string())?;
            for old in self.children(slot)? {
                self.discard_child(slot, old);
            }
            let chosen = match command {
                Some(value) => {
                    let chosen = self.create_node(base, slot_choice_name(base));
                    self.set_local_value(chosen, Some(value));
                    chosen
                }
                None => self.create_node(Base::Null, NULL_CHOICE),
            };
            self.mark_dirty(slot);
            self.add_local(slot, chosen);
            let value = self.evaluate_priority_array(target, array)?;
            self.mark_dirty(target);
            self.set_local_value(target, value);
        } else if ctx.is_target(target) && ctx.has_priority() {
            // an explicit priority on data that is not commandable writes nothing
        } else if let Some(value) = &given.value {
            let value = value.clone().conform(base)?;
            self.mark_dirty(target);
            self.set_local_value(target, Some(value));
        }
        Ok(())
    }

    /// Finds or builds `$priorityArray` with all sixteen slots.
    pub fn priority_array(&mut self, target: NodeId) -> Result<NodeId, XdError> {
        let array = self.get_or_create(target, meta::PRIORITY_ARRAY, None, Some(Base::Array))?;
        for i in 1..=16 {
            let name = i.to_string();
            if self.find(array, &name)?.is_none() {
                let slot = self.create_node(Base::Choice, &name);
                self.set_flag(slot, flags::FROM_NOTHING, true);
                let null = self.create_node(Base::Null, NULL_CHOICE);
                self.add_local(slot, null);
                self.mark_dirty(array);
                self.add_local(array, slot);
            }
        }
        Ok(array)
    }

    /// Value of the lowest occupied slot, else the relinquish default.
    fn evaluate_priority_array(&mut self, target: NodeId, array: NodeId) -> Result<Option<Value>, XdError> {
        for i in 1..=16 {
            let slot = self.get(array, &i.to_string())?;
            let Some(chosen) = self.children(slot)?.first().copied() else {
                return Err(XdError::internal(format!("priority array slot '{i}' is uninitialized")));
            };
            if self.name(chosen) == NULL_CHOICE {
                continue;
            }
            return self.value(chosen);
        }
        match self.find_effective(target, meta::RELINQUISH_DEFAULT)? {
            Some(default) => self.value(default),
            None => Ok(None),
        }
    }

    /// Checks the value against the limits in effect for it.
    pub fn validate_consistency(&mut self, target: NodeId) -> Result<(), XdError> {
        let Some(value) = self.local_value(target).cloned() else {
            return Ok(());
        };
        let base = self.base(target);
        if base.is_numeric() {
            if let Some(x) = value.as_f64() {
                let min = self.effective_real_value_of(target, meta::MINIMUM, f64::NEG_INFINITY);
                let max = self.effective_real_value_of(target, meta::MAXIMUM, f64::INFINITY);
                if x < min || x > max {
                    return Err(XdError::new(
                        ErrorKind::ValueOutOfRange,
                        format!("Value {value} is outside of $minimum {min} and $maximum {max}"),
                    ));
                }
            }
        }
        if matches!(base, Base::String | Base::OctetString) {
            if let Some(len) = value.length() {
                let len = len as i64;
                let min = self.effective_int_value_of(target, meta::MINIMUM_LENGTH, 0);
                let max = self.effective_int_value_of(target, meta::MAXIMUM_LENGTH, i64::MAX);
                if len < min || len > max {
                    return Err(XdError::new(
                        ErrorKind::ValueOutOfRange,
                        format!("Length {len} is outside of $minimumLength {min} and $maximumLength {max}"),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn ctx() -> Context {
        Context::new(Config::default())
    }

    #[test]
    fn test_put_leaf_value() {
        let mut tree = DataTree::new();
        let root = tree.root();
        let leaf = tree.set(root, "leaf", "original").unwrap();
        let given = Given::new("leaf", Base::String).with_value("changed");
        tree.put(leaf, &given, &ctx(), PutOptions::NONE).unwrap();
        assert_eq!(tree.local_value(leaf), Some(&Value::from("changed")));
    }

    #[test]
    fn test_untyped_given_takes_target_base() {
        let mut tree = DataTree::new();
        let root = tree.root();
        let leaf = tree.set(root, "n", 1u64).unwrap();
        let given = Given::untyped("n").with_value("42");
        tree.put(leaf, &given, &ctx(), PutOptions::NONE).unwrap();
        assert_eq!(tree.local_value(leaf), Some(&Value::Unsigned(42)));
        let given = Given::untyped("n").with_value("x");
        let err = tree.put(leaf, &given, &ctx(), PutOptions::NONE).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueFormat);
        assert_eq!(err.given.as_deref(), Some("n"));
    }

    #[test]
    fn test_wrong_base_is_rejected() {
        let mut tree = DataTree::new();
        let root = tree.root();
        let leaf = tree.create_node(Base::Real, "r");
        tree.add_local(root, leaf);
        let given = Given::new("r", Base::Boolean).with_value(true);
        let err = tree.put(leaf, &given, &ctx(), PutOptions::NONE).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TargetDatatype);
    }

    #[test]
    fn test_not_writable_without_privilege() {
        let mut tree = DataTree::new();
        let root = tree.root();
        let leaf = tree.set(root, "leaf", 1.0).unwrap();
        let ctx = ctx().with_authorizer(std::sync::Arc::new(crate::auth::Unprivileged));
        let given = Given::new("leaf", Base::Real).with_value(2.0);
        let err = tree.put(leaf, &given, &ctx, PutOptions::NONE).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotWritable);
        tree.put(leaf, &given, &ctx, PutOptions::FORCE_WRITE).unwrap();
    }

    #[test]
    fn test_declaration_conflicts() {
        let mut tree = DataTree::new();
        let root = tree.root();
        let node = tree.create_child(root, "s", None, Some(Base::Sequence)).unwrap();
        let given = Given::new("s", Base::Sequence)
            .with_meta_text(meta::TYPE, "A")
            .with_meta_text(meta::EXTENDS, "B");
        let err = tree.put(node, &given, &ctx(), PutOptions::NONE).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueFormat);
    }

    #[test]
    fn test_limits() {
        let mut tree = DataTree::new();
        let root = tree.root();
        let leaf = tree.set(root, "r", 5.0).unwrap();
        tree.set(leaf, meta::MAXIMUM, 10.0).unwrap();
        let given = Given::new("r", Base::Real).with_value(11.0);
        let err = tree.put(leaf, &given, &ctx(), PutOptions::NONE).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueOutOfRange);
        let text = tree.set(root, "t", "ab").unwrap();
        tree.set(text, meta::MAXIMUM_LENGTH, 3u64).unwrap();
        let given = Given::new("t", Base::String).with_value("abcd");
        let err = tree.put(text, &given, &ctx(), PutOptions::NONE).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueOutOfRange);
    }

    #[test]
    fn test_computed_metadata_is_refused() {
        let mut tree = DataTree::new();
        let root = tree.root();
        let leaf = tree.set(root, "r", 5.0).unwrap();
        let given = Given::new("r", Base::Real).with_meta(Given::new(meta::NEXT, Base::Link).with_value("x"));
        let err = tree.put(leaf, &given, &ctx(), PutOptions::NONE).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValueFormat);
    }

    #[test]
    fn test_options_combine() {
        let options = PutOptions::NO_TYPE_CHECK | PutOptions::GIVEN_PARTIAL;
        assert!(options.contains(PutOptions::GIVEN_PARTIAL));
        assert!(!options.contains(PutOptions::FORCE_WRITE));
    }
}

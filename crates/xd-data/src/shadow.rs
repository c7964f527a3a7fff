//! Copy-on-write shadows.
//!
//! A shadow stands in for an original node inside a session. It starts
//! empty and fills itself from the original on first access (`preread`).
//! Edits mark shadows dirty; `commit` walks the dirty markers and pushes the
//! changes to the originals, `discard` walks away from them.

use std::sync::Arc;

use tracing::trace;

use crate::base::Base;
use crate::binding::Binding;
use crate::error::XdError;
use crate::flags;
use crate::given::Given;
use crate::meta;
use crate::tree::{DataTree, NodeId};

/// Flags a shadow carries for its original.
const SHADOWED: u32 = flags::PERSIST_MASK | flags::BINDING_MASK;

impl DataTree {
    /// Creates an empty shadow of `original`. Subs are shadowed lazily.
    pub fn make_shadow(&mut self, original: NodeId) -> NodeId {
        let base = self.base(original);
        let name = self.name(original).to_string();
        let shadowed_flags = self.flags(original) & SHADOWED;
        let prototype = self.local_prototype(original);
        let shadow = self.create_node(base, &name);
        let node = self.node_mut(shadow);
        node.flags = shadowed_flags;
        node.prototype = prototype;
        node.original = Some(original);
        shadow
    }

    /// The binding attached to a node, either directly or by name through
    /// `$..binding`.
    pub(crate) fn binding_of(&self, id: NodeId) -> Option<Arc<dyn Binding>> {
        if let Some(binding) = self.local_binding(id) {
            return Some(binding);
        }
        let named = self.find_local(id, meta::BINDING)?;
        let name = self.local_value(named)?.to_string();
        self.registered_binding(&name)
    }

    /// Materializes a node before its first read. Runs at most once per
    /// node.
    pub fn preread(&mut self, id: NodeId) -> Result<(), XdError> {
        if self.has_flag(id, flags::PREREAD_DONE) {
            return Ok(());
        }
        self.set_flag(id, flags::PREREAD_DONE, true);
        let binding = match self.original(id) {
            Some(original) => {
                self.preread(original)?;
                let subs: Vec<NodeId> = self
                    .local_subs(original)
                    .into_iter()
                    .filter(|sub| !self.is_deleted(*sub))
                    .collect();
                trace!(path = %self.path_of(id), subs = subs.len(), "shadowing original");
                for sub in subs {
                    if self.find_local(id, self.name(sub)).is_none() {
                        let shadow = self.make_shadow(sub);
                        self.add_local(id, shadow);
                    }
                }
                let value = self.local_value(original).cloned();
                self.set_local_value(id, value);
                self.local_binding(id).or_else(|| self.binding_of(original))
            }
            None => self.binding_of(id),
        };
        if let Some(binding) = binding {
            if self.local_binding(id).is_none() {
                self.set_binding(id, binding.clone());
            }
            binding.preread(self, id)?;
        }
        Ok(())
    }

    /// Records a change at `id` so `commit` will visit it. Does nothing
    /// outside a session.
    pub(crate) fn mark_dirty(&mut self, id: NodeId) {
        if !self.has_session(id) {
            return;
        }
        self.set_flag(id, flags::DIRTY, true);
        let mut cur = id;
        while !self.has_flag(cur, flags::SESSION_ROOT) {
            let Some(parent) = self.parent(cur) else {
                break;
            };
            self.set_flag(parent, flags::DIRTY_BELOW, true);
            cur = parent;
        }
    }

    fn clear_dirty(&mut self, id: NodeId) {
        self.set_flag(id, flags::DIRTY | flags::DIRTY_BELOW, false);
        for sub in self.local_subs(id) {
            if self.parent(sub) == Some(id) {
                self.clear_dirty(sub);
            }
        }
    }

    /// Pushes the changes recorded under shadow `id` to its original.
    pub fn commit(&mut self, id: NodeId) -> Result<(), XdError> {
        let Some(original) = self.original(id) else {
            return Err(XdError::internal(format!(
                "commit called on '{}', which is not a shadow",
                self.path_of(id)
            )));
        };
        if self.base(id) == Base::Poly {
            return Err(XdError::internal(format!(
                "commit called on polymorphic '{}'",
                self.path_of(id)
            )));
        }
        if self.is_dirty(id) {
            if let Some(binding) = self.local_binding(id) {
                if binding.commit(self, id)? {
                    return Ok(());
                }
            }
            let shadow_flags = self.flags(id) & SHADOWED;
            let prototype = self.local_prototype(id);
            let value = self.local_value(id).cloned();
            let can_have_value = self.base(original).can_have_value();
            let target = self.node_mut(original);
            target.flags = (target.flags & !SHADOWED) | shadow_flags;
            target.prototype = prototype;
            if can_have_value {
                target.value = value;
            }
            for sub in self.local_subs(id) {
                if self.parent(sub) != Some(id) {
                    continue;
                }
                match self.original(sub) {
                    Some(sub_original) => {
                        if self.is_deleted(sub) {
                            let name = self.name(sub_original).to_string();
                            self.remove_local(original, &name);
                        } else if self.is_dirty(sub) || self.is_dirty_below(sub) {
                            self.commit(sub)?;
                        }
                    }
                    None => {
                        self.clear_dirty(sub);
                        self.add_local(original, sub);
                    }
                }
            }
            if self.base(original).is_positional() {
                self.renumber(original);
            }
        } else if self.is_dirty_below(id) {
            for sub in self.local_subs(id) {
                if self.parent(sub) == Some(id)
                    && self.is_shadow(sub)
                    && (self.is_dirty(sub) || self.is_dirty_below(sub))
                {
                    self.commit(sub)?;
                }
            }
        }
        Ok(())
    }

    /// Abandons the changes under `id`. Bindings get first refusal.
    pub fn discard(&mut self, id: NodeId) {
        if let Some(binding) = self.local_binding(id) {
            if binding.discard(self, id) {
                return;
            }
        }
        for sub in self.local_subs(id) {
            if self.parent(sub) == Some(id) && self.is_shadow(sub) {
                self.discard(sub);
            }
        }
    }

    /// A parentless structural clone. Definition, immutable, prototype,
    /// builtin and rooted flags are not carried over, and the copy is never a
    /// shadow.
    pub fn make_deep_copy(&mut self, id: NodeId) -> Result<NodeId, XdError> {
        let base = self.base(id);
        let name = self.name(id).to_string();
        let copy = self.create_node(base, &name);
        let copied_flags = self.flags(id) & flags::COPIED;
        let prototype = self.local_prototype(id);
        self.set_flag(copy, copied_flags, true);
        self.set_prototype(copy, prototype);
        let mut subs = self.metadata(id)?;
        subs.extend(self.children(id)?);
        for sub in subs {
            let sub_copy = self.make_deep_copy(sub)?;
            self.add_local(copy, sub_copy);
        }
        if base.can_have_value() {
            let value = self.local_value(id).cloned();
            self.set_local_value(copy, value);
        }
        Ok(copy)
    }

    /// A detached snapshot of a node and everything below it.
    pub fn to_given(&mut self, id: NodeId) -> Result<Given, XdError> {
        let mut given = Given::new(self.name(id), self.base(id));
        given.value = self.value(id)?;
        for sub in self.metadata(id)? {
            given.metadata.push(self.to_given(sub)?);
        }
        for sub in self.children(id)? {
            given.children.push(self.to_given(sub)?);
        }
        Ok(given)
    }
}

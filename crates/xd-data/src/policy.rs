//! Creation and deletion policies.

use std::sync::Arc;

use crate::base::Base;
use crate::rules;
use crate::tree::{DataTree, NodeId};

pub trait Policy: Send + Sync {
    fn allow_create(
        &self,
        tree: &DataTree,
        target: NodeId,
        name: &str,
        type_name: Option<&str>,
        base: Option<Base>,
    ) -> bool;

    fn allow_delete(&self, tree: &DataTree, target: NodeId, name: &str) -> bool;
}

/// Allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl Policy for DefaultPolicy {
    fn allow_create(
        &self,
        _tree: &DataTree,
        _target: NodeId,
        _name: &str,
        _type_name: Option<&str>,
        _base: Option<Base>,
    ) -> bool {
        true
    }

    fn allow_delete(&self, _tree: &DataTree, _target: NodeId, _name: &str) -> bool {
        true
    }
}

/// Used under bindings: children may come and go, metadata is fixed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBindingPolicy;

impl Policy for DefaultBindingPolicy {
    fn allow_create(
        &self,
        _tree: &DataTree,
        _target: NodeId,
        name: &str,
        _type_name: Option<&str>,
        _base: Option<Base>,
    ) -> bool {
        !rules::is_metadata(name)
    }

    fn allow_delete(&self, _tree: &DataTree, _target: NodeId, _name: &str) -> bool {
        true
    }
}

impl DataTree {
    /// The policy governing `id`: the nearest binding that supplies one,
    /// else the tree default.
    pub fn policy_for(&self, id: NodeId) -> Arc<dyn Policy> {
        let mut cur = Some(id);
        while let Some(node) = cur {
            if let Some(policy) = self.local_binding(node).and_then(|b| b.policy()) {
                return policy;
            }
            cur = self.parent(node);
        }
        self.default_policy()
    }
}

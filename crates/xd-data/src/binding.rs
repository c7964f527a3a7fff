//! Live-data delegates.
//!
//! A [`Binding`] connects a node to something outside the tree: a device, a
//! file, a computed source. Every hook has a default that defers to the
//! tree's own behavior, so an implementation only overrides what it needs.

use std::sync::Arc;

use crate::context::{ChildList, Context};
use crate::error::XdError;
use crate::given::Given;
use crate::policy::{DefaultBindingPolicy, Policy};
use crate::tree::{DataTree, NodeId};

/// What a binding decided to do with a POST.
#[derive(Debug, Clone, PartialEq)]
pub enum Prepost {
    /// Go on and create a child from this data.
    Persist(Given),
    /// Nothing durable was created; hand this back to the caller.
    Ephemeral(Given),
}

pub trait Binding: Send + Sync {
    /// Called once per node before its children, metadata or value are
    /// first read.
    fn preread(&self, _tree: &mut DataTree, _target: NodeId) -> Result<(), XdError> {
        Ok(())
    }

    /// Second chance for a name the node does not have locally. A binding
    /// may add the item and return it.
    fn prefind(
        &self,
        _tree: &mut DataTree,
        _target: NodeId,
        _name: &str,
    ) -> Result<Option<NodeId>, XdError> {
        Ok(None)
    }

    fn prepost(
        &self,
        _tree: &mut DataTree,
        _target: NodeId,
        given: Given,
    ) -> Result<Prepost, XdError> {
        Ok(Prepost::Persist(given))
    }

    /// Returns `true` when the binding persisted the change itself.
    fn commit(&self, _tree: &mut DataTree, _target: NodeId) -> Result<bool, XdError> {
        Ok(false)
    }

    /// Returns `true` when the binding handled the discard itself.
    fn discard(&self, _tree: &mut DataTree, _target: NodeId) -> bool {
        false
    }

    fn policy(&self) -> Option<Arc<dyn Policy>> {
        Some(Arc::new(DefaultBindingPolicy))
    }

    /// True child count for sparse bindings.
    fn total_count(&self, _tree: &DataTree, _target: NodeId) -> Option<usize> {
        None
    }

    fn contextualized_children(
        &self,
        _tree: &mut DataTree,
        _context: &Context,
        _target: NodeId,
    ) -> Result<Option<ChildList>, XdError> {
        Ok(None)
    }

    fn contextualized_metadata(
        &self,
        _tree: &mut DataTree,
        _context: &Context,
        _target: NodeId,
    ) -> Result<Option<Vec<NodeId>>, XdError> {
        Ok(None)
    }

    fn contextualized_value(
        &self,
        _tree: &mut DataTree,
        _context: &Context,
        _target: NodeId,
    ) -> Result<Option<String>, XdError> {
        Ok(None)
    }
}

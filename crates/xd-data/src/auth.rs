//! Authorization contract.
//!
//! Decisions are made elsewhere; the tree only asks yes/no questions.

use crate::error::{ErrorKind, XdError};
use crate::tree::{DataTree, NodeId};

pub trait Authorizer: Send + Sync {
    /// Bypasses `$writable` checks.
    fn in_god_mode(&self) -> bool {
        false
    }

    fn check_visible(&self, _tree: &DataTree, _id: NodeId) -> bool {
        true
    }

    fn check_read(&self, _tree: &DataTree, _id: NodeId) -> bool {
        true
    }

    fn check_write(&self, _tree: &DataTree, _id: NodeId) -> bool {
        true
    }
}

/// Allows everything, including writes to nodes that are not `$writable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn in_god_mode(&self) -> bool {
        true
    }
}

/// Passes every check but honors `$writable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unprivileged;

impl Authorizer for Unprivileged {}

/// Invisible items are reported as missing.
pub fn require_visible(auth: &dyn Authorizer, tree: &DataTree, id: NodeId) -> Result<(), XdError> {
    if auth.check_visible(tree, id) {
        Ok(())
    } else {
        Err(XdError::new(ErrorKind::DataNotFound, "Data not found").with_target(tree.path_of(id)))
    }
}

pub fn require_read(auth: &dyn Authorizer, tree: &DataTree, id: NodeId) -> Result<(), XdError> {
    if auth.check_read(tree, id) {
        Ok(())
    } else {
        Err(XdError::new(ErrorKind::NotAuthorized, "Not authorized to read").with_target(tree.path_of(id)))
    }
}

pub fn require_write(auth: &dyn Authorizer, tree: &DataTree, id: NodeId) -> Result<(), XdError> {
    if auth.check_write(tree, id) {
        Ok(())
    } else {
        Err(XdError::new(ErrorKind::NotAuthorized, "Not authorized to write").with_target(tree.path_of(id)))
    }
}

//! Deleting children and metadata.

use tracing::debug;

use crate::auth;
use crate::context::Context;
use crate::error::{ErrorKind, XdError};
use crate::flags;
use crate::tree::{DataTree, NodeId};

impl DataTree {
    /// Deletes `name` from `target`. Inside a session the item is only
    /// flagged; the commit removes it from the original. Deleting something
    /// that is not there succeeds.
    pub fn delete(&mut self, target: NodeId, name: &str, ctx: &Context) -> Result<(), XdError> {
        let Some(item) = self.find(target, name)? else {
            return Ok(());
        };
        if self.is_immutable(target) {
            return Err(XdError::new(
                ErrorKind::NotWritable,
                format!("Can't delete '{name}' from immutable data"),
            )
            .with_target(self.path_of(target)));
        }
        let policy = self.policy_for(target);
        if !policy.allow_delete(self, target, name) {
            return Err(XdError::new(
                ErrorKind::CannotDelete,
                format!("Not allowed to delete '{name}'"),
            )
            .with_target(self.path_of(target)));
        }
        auth::require_write(ctx.authorizer(), self, item)?;
        self.remove_item(target, item);
        Ok(())
    }

    fn remove_item(&mut self, target: NodeId, item: NodeId) {
        if self.is_shadow(target) && self.is_shadow(item) {
            self.mark_dirty(target);
            self.set_flag(item, flags::DELETED | flags::DIRTY, true);
        } else {
            // items added in this session have no original to prune
            let name = self.name(item).to_string();
            self.mark_dirty(target);
            self.remove_local(target, &name);
            if self.base(target).is_positional() {
                self.renumber(target);
            }
        }
    }

    /// Deletes every child of `target`.
    pub fn delete_children(&mut self, target: NodeId, ctx: &Context) -> Result<(), XdError> {
        let names: Vec<String> = self
            .children(target)?
            .into_iter()
            .map(|c| self.name(c).to_string())
            .collect();
        debug!(path = %self.path_of(target), count = names.len(), "deleting children");
        for name in names.iter().rev() {
            self.delete(target, name, ctx)?;
        }
        Ok(())
    }

    /// Removes a child without policy or authorization checks, as when a
    /// new choice evicts the old one.
    pub(crate) fn discard_child(&mut self, target: NodeId, child: NodeId) {
        self.remove_item(target, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Base;
    use crate::config::Config;
    use crate::policy::Policy;
    use std::sync::Arc;

    struct NoDelete;

    impl Policy for NoDelete {
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
            false
        }
    }

    #[test]
    fn test_delete_renumbers_lists() {
        let mut tree = DataTree::new();
        let ctx = Context::new(Config::default());
        let root = tree.root();
        let list = tree.create_child(root, "list", None, Some(Base::List)).unwrap();
        for _ in 0..3 {
            tree.create_child(list, "", None, Some(Base::Real)).unwrap();
        }
        tree.delete(list, "2", &ctx).unwrap();
        let names: Vec<_> = tree
            .local_children(list)
            .into_iter()
            .map(|c| tree.name(c).to_string())
            .collect();
        assert_eq!(names, vec!["1", "2"]);
        tree.delete(list, "9", &ctx).unwrap();
    }

    #[test]
    fn test_policy_can_refuse() {
        let mut tree = DataTree::new();
        tree.set_default_policy(Arc::new(NoDelete));
        let ctx = Context::new(Config::default());
        let root = tree.root();
        tree.set(root, "x", 1.0).unwrap();
        let err = tree.delete(root, "x", &ctx).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CannotDelete);
    }
}

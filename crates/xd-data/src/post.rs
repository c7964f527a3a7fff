//! Adding new children with POST.

use tracing::debug;

use crate::base::Base;
use crate::binding::Prepost;
use crate::context::Context;
use crate::error::{ErrorKind, XdError};
use crate::given::Given;
use crate::meta;
use crate::put::PutOptions;
use crate::tree::{DataTree, NodeId};

/// What a POST produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PostOutcome {
    /// A child was added to the tree.
    Created(NodeId),
    /// A binding consumed the data and nothing was stored.
    Ephemeral(Given),
}

impl DataTree {
    /// Adds `given` as a new child of `target`. The given name is only a
    /// hint; list-like targets number their members.
    pub fn post(&mut self, target: NodeId, given: &Given, ctx: &Context) -> Result<PostOutcome, XdError> {
        self.preread(target)?;
        let authorizer = ctx.authorizer();
        if self.is_immutable(target) || (!authorizer.in_god_mode() && !self.is_writable(target)) {
            return Err(XdError::new(ErrorKind::NotWritable, "Target data is not writable")
                .with_target(self.path_of(target)));
        }
        if !authorizer.check_write(self, target) {
            return Err(XdError::new(
                ErrorKind::NotAuthorized,
                "Target data is not writable with given authorization",
            )
            .with_target(self.path_of(target)));
        }
        let name = self.next_name(target, &xd_path::make_legal_path_name(&given.name))?;
        let mut given = given.clone();
        given.name = name.clone();
        if let Some(binding) = self.binding_of(target) {
            match binding.prepost(self, target, given)? {
                Prepost::Ephemeral(result) => {
                    debug!(path = %self.path_of(target), "post consumed by binding");
                    return Ok(PostOutcome::Ephemeral(result));
                }
                Prepost::Persist(persist) => given = persist,
            }
        }
        self.mark_dirty(target);
        let type_name = given.meta_text(meta::TYPE);
        let base = given.base.filter(|b| *b != Base::Poly);
        let child = self
            .create_child(target, &given.name, type_name.as_deref(), base)
            .map_err(|e| e.with_given(given.name.clone()))?;
        let child = self.put(child, &given, ctx, PutOptions::USE_POST_RULES)?;
        debug!(path = %self.path_of(child), "posted");
        Ok(PostOutcome::Created(child))
    }
}

//! Sessions over a shared tree.
//!
//! A [`Store`] owns the tree. Every session works on a shadow of the tree
//! root, so its edits stay private until [`Session::commit`] pushes them to
//! the originals. Only one write session exists at a time; readers never
//! wait for it.

use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::{ErrorKind, XdError};
use crate::eval::EvalMode;
use crate::flags;
use crate::given::Given;
use crate::post::PostOutcome;
use crate::put::PutOptions;
use crate::tree::{DataTree, NodeId};

/// A tree shared between sessions.
pub struct Store {
    tree: Mutex<DataTree>,
    writer: Mutex<()>,
    write_lock_timeout: Duration,
}

/// Result of [`Store::atomic_post`].
#[derive(Debug, Clone, PartialEq)]
pub enum Posted {
    /// Path of the created child.
    Created(String),
    Ephemeral(Given),
}

impl Store {
    pub fn new(tree: DataTree) -> Store {
        let write_lock_timeout = Duration::from_millis(tree.config().write_lock_timeout_ms);
        Store {
            tree: Mutex::new(tree),
            writer: Mutex::new(()),
            write_lock_timeout,
        }
    }

    /// Direct access to the tree, outside of any session. For setup.
    pub fn with_tree<R>(&self, f: impl FnOnce(&mut DataTree) -> R) -> R {
        f(&mut self.tree.lock())
    }

    pub fn read_session(&self, context: Context) -> Session<'_> {
        Session::open(self, context, None)
    }

    /// Opens the single write session, waiting up to the configured
    /// timeout for the current one to end.
    pub fn write_session(&self, context: Context) -> Result<Session<'_>, XdError> {
        let Some(guard) = self.writer.try_lock_for(self.write_lock_timeout) else {
            warn!(
                timeout_ms = self.write_lock_timeout.as_millis() as u64,
                "write session lock not acquired"
            );
            return Err(XdError::new(
                ErrorKind::InternalTimeout,
                "Timed out waiting for another write session to finish",
            ));
        };
        Ok(Session::open(self, context, Some(guard)))
    }

    // ------------------------------------------------------------ Atomic operations

    /// The contextualized value at `path`, empty when it has none.
    pub fn atomic_get_string(&self, path: &str, context: Context) -> Result<String, XdError> {
        let session = self.read_session(context);
        session.with_tree(|tree, root, ctx| {
            let target = tree.eval(root, path, ctx, EvalMode::Get)?;
            ctx.set_target(Some(target));
            Ok(tree.contextualized_value(ctx, target)?.unwrap_or_default())
        })
    }

    /// A contextualized copy of the data at `path`.
    pub fn atomic_get_copy(&self, path: &str, context: Context) -> Result<Given, XdError> {
        let session = self.read_session(context);
        session.with_tree(|tree, root, ctx| {
            let target = tree.eval(root, path, ctx, EvalMode::Get)?;
            ctx.set_target(Some(target));
            ctx.reset_counters();
            tree.to_given_in(ctx, target)
        })
    }

    pub fn atomic_put(&self, path: &str, given: &Given, context: Context) -> Result<(), XdError> {
        let session = self.write_session(context)?;
        session.with_tree(|tree, root, ctx| {
            let target = tree.eval(root, path, ctx, EvalMode::Put)?;
            ctx.set_target(Some(target));
            tree.put(target, given, ctx, PutOptions::NONE).map(|_| ())
        })?;
        session.commit()
    }

    pub fn atomic_post(&self, path: &str, given: &Given, context: Context) -> Result<Posted, XdError> {
        let session = self.write_session(context)?;
        let outcome = session.with_tree(|tree, root, ctx| {
            let target = tree.eval(root, path, ctx, EvalMode::Post)?;
            ctx.set_target(Some(target));
            Ok::<_, XdError>(match tree.post(target, given, ctx)? {
                PostOutcome::Created(child) => Posted::Created(tree.path_of(child)),
                PostOutcome::Ephemeral(result) => Posted::Ephemeral(result),
            })
        })?;
        if let Posted::Created(_) = outcome {
            session.commit()?;
        }
        Ok(outcome)
    }

    pub fn atomic_delete(&self, path: &str, context: Context) -> Result<(), XdError> {
        let session = self.write_session(context)?;
        session.with_tree(|tree, root, ctx| {
            let target = tree.eval(root, path, ctx, EvalMode::Delete)?;
            let Some(parent) = tree.parent(target) else {
                return Err(XdError::new(ErrorKind::CannotDelete, "The root can't be deleted"));
            };
            let name = tree.name(target).to_string();
            tree.delete(parent, &name, ctx)
        })?;
        session.commit()
    }
}

/// One transaction over a [`Store`].
pub struct Session<'a> {
    store: &'a Store,
    writer: Option<MutexGuard<'a, ()>>,
    root: NodeId,
    context: Context,
}

impl<'a> Session<'a> {
    fn open(store: &'a Store, context: Context, writer: Option<MutexGuard<'a, ()>>) -> Session<'a> {
        let root = {
            let mut tree = store.tree.lock();
            tree.session_opened();
            let original = tree.root();
            let root = tree.make_shadow(original);
            tree.set_flag(root, flags::SESSION_ROOT, true);
            root
        };
        debug!(write = writer.is_some(), "session opened");
        Session {
            store,
            writer,
            root,
            context,
        }
    }

    /// Shadow of the tree root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn is_writable(&self) -> bool {
        self.writer.is_some()
    }

    /// Runs `f` with the tree locked, handing it the session root and
    /// context.
    pub fn with_tree<R>(&self, f: impl FnOnce(&mut DataTree, NodeId, &Context) -> R) -> R {
        let mut tree = self.store.tree.lock();
        f(&mut tree, self.root, &self.context)
    }

    /// Pushes the session's edits to the shared tree.
    pub fn commit(self) -> Result<(), XdError> {
        if self.writer.is_none() {
            return Err(XdError::new(
                ErrorKind::NotWritable,
                "A read session can't commit",
            ));
        }
        let mut tree = self.store.tree.lock();
        tree.commit(self.root)?;
        debug!("session committed");
        Ok(())
    }

    /// Drops the session's edits.
    pub fn discard(self) {
        self.store.tree.lock().discard(self.root);
        debug!("session discarded");
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        let mut tree = self.store.tree.lock();
        tree.free_subtree(self.root);
        tree.session_closed();
    }
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("root", &self.root)
            .field("write", &self.writer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Base;
    use crate::config::Config;

    fn store() -> Store {
        let mut tree = DataTree::new();
        let root = tree.root();
        tree.set(root, "x", 1.0).unwrap();
        Store::new(tree)
    }

    #[test]
    fn test_edits_are_private_until_commit() {
        let store = store();
        let session = store.write_session(Context::new(Config::default())).unwrap();
        session.with_tree(|tree, root, _| {
            let x = tree.get(root, "x").unwrap();
            tree.set_value(x, 2.0.into()).unwrap();
        });
        let seen = store.atomic_get_string("x", Context::new(Config::default())).unwrap();
        assert_eq!(seen, "1");
        session.commit().unwrap();
        let seen = store.atomic_get_string("x", Context::new(Config::default())).unwrap();
        assert_eq!(seen, "2");
        assert_eq!(store.with_tree(|tree| tree.open_sessions()), 0);
    }

    #[test]
    fn test_second_writer_times_out() {
        let mut tree = DataTree::with_config(Config {
            write_lock_timeout_ms: 10,
            ..Config::default()
        });
        let root = tree.root();
        tree.create_child(root, "a", None, Some(Base::Collection)).unwrap();
        let store = Store::new(tree);
        let _first = store.write_session(Context::new(Config::default())).unwrap();
        let err = store.write_session(Context::new(Config::default())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InternalTimeout);
    }

    #[test]
    fn test_refused_put_leaves_session_clean() {
        let store = store();
        let ctx = Context::new(Config::default())
            .with_authorizer(std::sync::Arc::new(crate::auth::Unprivileged));
        let session = store.write_session(ctx).unwrap();
        session.with_tree(|tree, root, ctx| {
            let x = tree.eval(root, "x", ctx, EvalMode::Put).unwrap();
            let given = Given::new("x", Base::Real).with_value(2.0);
            let err = tree.put(x, &given, ctx, PutOptions::NONE).unwrap_err();
            assert_eq!(err.kind, ErrorKind::NotWritable);
            assert!(!tree.is_dirty(x));
            assert!(!tree.is_dirty_below(root));
        });
        session.commit().unwrap();
        assert_eq!(store.atomic_get_string("x", Context::new(Config::default())).unwrap(), "1");
    }

    #[test]
    fn test_read_session_cannot_commit() {
        let store = store();
        let session = store.read_session(Context::new(Config::default()));
        assert_eq!(session.commit().unwrap_err().kind, ErrorKind::NotWritable);
    }

    #[test]
    fn test_root_cannot_be_deleted() {
        let store = store();
        let err = store.atomic_delete("/", Context::new(Config::default())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CannotDelete);
        store.atomic_delete("x", Context::new(Config::default())).unwrap();
        let err = store.atomic_get_string("x", Context::new(Config::default())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DataNotFound);
    }
}

//! Path evaluation.

use xd_filter::{Operand, Resolver};
use xd_path::Segment;

use crate::auth;
use crate::context::Context;
use crate::error::{ErrorKind, XdError};
use crate::rules;
use crate::tree::{DataTree, NodeId};

/// What the resolved item will be used for. Writes may address optional
/// items that do not exist yet; they are created on the way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalMode {
    Get,
    Put,
    Post,
    Delete,
}

impl DataTree {
    /// Resolves a slash path relative to `base`. Names are taken as they
    /// are; see [`DataTree::eval_uri`] for percent-encoded paths.
    pub fn eval(
        &mut self,
        base: NodeId,
        path: &str,
        ctx: &Context,
        mode: EvalMode,
    ) -> Result<NodeId, XdError> {
        self.check_path_length(path)?;
        let mut segments = Vec::new();
        for segment in xd_path::parse_path(path) {
            if let Segment::Name(name) = &segment {
                self.check_call_syntax(base, name)?;
            }
            segments.push(segment);
        }
        self.walk(base, path, segments, ctx, mode)
    }

    /// [`DataTree::eval`] for the path part of a request URI. Every name is
    /// percent-decoded after the path is split, so `a%2Fb` names one item.
    pub fn eval_uri(
        &mut self,
        base: NodeId,
        path: &str,
        ctx: &Context,
        mode: EvalMode,
    ) -> Result<NodeId, XdError> {
        self.check_path_length(path)?;
        let mut segments = Vec::new();
        for segment in xd_path::parse_path(path) {
            segments.push(match segment {
                Segment::Name(raw) => {
                    self.check_call_syntax(base, &raw)?;
                    let name = xd_path::percent_decode(&raw)
                        .map_err(|e| XdError::new(ErrorKind::PathSyntax, e.to_string()))?;
                    Segment::Name(name)
                }
                other => other,
            });
        }
        self.walk(base, path, segments, ctx, mode)
    }

    fn check_path_length(&self, path: &str) -> Result<(), XdError> {
        xd_path::validate_path(path, self.config().max_path_length)
            .map_err(|e| XdError::new(ErrorKind::PathSyntax, e.to_string()))
    }

    fn check_call_syntax(&self, base: NodeId, raw: &str) -> Result<(), XdError> {
        if raw.contains('(') {
            return Err(XdError::new(
                ErrorKind::ArgSyntax,
                "Function invocation does not end with ')'",
            )
            .with_target(self.path_of(base)));
        }
        Ok(())
    }

    fn walk(
        &mut self,
        base: NodeId,
        path: &str,
        segments: Vec<Segment>,
        ctx: &Context,
        mode: EvalMode,
    ) -> Result<NodeId, XdError> {
        let authorizer = ctx.authorizer();
        let mut target = base;
        for segment in segments {
            let name = match segment {
                Segment::Current => continue,
                Segment::Parent => {
                    if let Some(parent) = self.parent(target) {
                        target = parent;
                    }
                    continue;
                }
                Segment::Root => {
                    target = self.top_of(target);
                    continue;
                }
                Segment::Name(name) => name,
                Segment::Call { function, .. } => {
                    return Err(XdError::new(
                        ErrorKind::FunctionName,
                        format!("Unknown function '{function}'"),
                    )
                    .with_target(self.path_of(target)))
                }
            };
            if let Some(found) = self.find(target, &name)? {
                auth::require_visible(authorizer, self, found)?;
                target = found;
                continue;
            }
            if matches!(mode, EvalMode::Put | EvalMode::Post) {
                target = if rules::is_metadata(&name) {
                    if rules::not_allowed_for_put(&name) {
                        return Err(XdError::new(
                            ErrorKind::IllegalMetadata,
                            format!("Can't PUT or POST to computed metadata '{name}'"),
                        )
                        .with_target(self.path_of(target)));
                    }
                    self.create_metadata(target, &name, None, None)?
                } else {
                    self.create_child(target, &name, None, None).map_err(|e| {
                        XdError::new(
                            ErrorKind::CannotCreate,
                            format!("Can't create child for PUT or POST '{name}': {}", e.message),
                        )
                        .with_target(self.path_of(target))
                    })?
                };
                continue;
            }
            let kind = if rules::is_metadata(&name) {
                ErrorKind::MetadataNotFound
            } else {
                ErrorKind::DataNotFound
            };
            let what = if rules::is_metadata(&name) { "Metadata" } else { "Data" };
            return Err(XdError::new(kind, format!("{what} '{name}' not found in path '{path}'"))
                .with_target(self.path_of(target)));
        }
        if mode == EvalMode::Get {
            auth::require_read(authorizer, self, target)?;
        }
        Ok(target)
    }

    /// `eval` for reads that falls back to `None`.
    pub fn eval_or_none(&mut self, base: NodeId, path: &str, ctx: &Context) -> Option<NodeId> {
        self.eval(base, path, ctx, EvalMode::Get).ok()
    }
}

/// Resolves filter paths against one candidate node.
pub struct NodeResolver<'a> {
    tree: &'a mut DataTree,
    ctx: &'a Context,
    candidate: NodeId,
}

impl<'a> NodeResolver<'a> {
    pub fn new(tree: &'a mut DataTree, ctx: &'a Context, candidate: NodeId) -> Self {
        NodeResolver {
            tree,
            ctx,
            candidate,
        }
    }
}

impl Resolver for NodeResolver<'_> {
    fn resolve(&mut self, path: &str) -> Option<Operand> {
        let found = self.tree.eval_or_none(self.candidate, path, self.ctx)?;
        match self.tree.value(found).ok()? {
            Some(value) => Some(Operand::new(value.to_string(), value.to_bool())),
            None => {
                let has_children = !self.tree.children(found).ok()?.is_empty();
                Some(Operand::new("", has_children))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Base;
    use crate::config::Config;
    use crate::meta;

    fn sample() -> (DataTree, NodeId, NodeId) {
        let mut tree = DataTree::new();
        let root = tree.root();
        let folder = tree.create_child(root, "folder", None, Some(Base::Collection)).unwrap();
        let leaf = tree.set(folder, "a b", 5u64).unwrap();
        (tree, folder, leaf)
    }

    #[test]
    fn test_navigation() {
        let (mut tree, folder, leaf) = sample();
        let ctx = Context::new(Config::default());
        let root = tree.root();
        assert_eq!(tree.eval(root, "folder/a b", &ctx, EvalMode::Get).unwrap(), leaf);
        assert_eq!(tree.eval(leaf, "..", &ctx, EvalMode::Get).unwrap(), folder);
        assert_eq!(tree.eval(leaf, ".../folder/./", &ctx, EvalMode::Get).unwrap(), folder);
        assert_eq!(tree.eval(leaf, "/", &ctx, EvalMode::Get).unwrap(), root);
        assert_eq!(tree.eval(root, "../..", &ctx, EvalMode::Get).unwrap(), root);
    }

    #[test]
    fn test_uri_paths_decode_each_name() {
        let (mut tree, folder, leaf) = sample();
        let ctx = Context::new(Config::default());
        let root = tree.root();
        assert_eq!(tree.eval_uri(root, "folder/a%20b", &ctx, EvalMode::Get).unwrap(), leaf);
        let odd = tree.set(folder, "50%/x", 1u64).unwrap();
        assert_eq!(tree.eval_uri(folder, "50%25%2Fx", &ctx, EvalMode::Get).unwrap(), odd);
        let err = tree.eval_uri(folder, "50%", &ctx, EvalMode::Get).unwrap_err();
        assert_eq!(err.kind, ErrorKind::PathSyntax);
        // plain paths keep '%' as part of the name
        let pct = tree.set(folder, "50%", 2u64).unwrap();
        assert_eq!(tree.eval(folder, "50%", &ctx, EvalMode::Get).unwrap(), pct);
    }

    #[test]
    fn test_eval_errors() {
        let (mut tree, folder, _) = sample();
        let ctx = Context::new(Config::default());
        let err = tree.eval(folder, "missing", &ctx, EvalMode::Get).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DataNotFound);
        assert!(err.message.contains("not found in path 'missing'"));
        let err = tree.eval(folder, "$displayName", &ctx, EvalMode::Get).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MetadataNotFound);
        let err = tree.eval(folder, "count(x)", &ctx, EvalMode::Get).unwrap_err();
        assert_eq!(err.kind, ErrorKind::FunctionName);
        let err = tree.eval(folder, "count(x", &ctx, EvalMode::Get).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArgSyntax);
        let long = vec!["a"; 300].join("/");
        let err = tree.eval(folder, &long, &ctx, EvalMode::Get).unwrap_err();
        assert_eq!(err.kind, ErrorKind::PathSyntax);
    }

    #[test]
    fn test_put_creates_missing_items() {
        let (mut tree, folder, _) = sample();
        let ctx = Context::new(Config::default());
        let name = tree.eval(folder, meta::DISPLAY_NAME, &ctx, EvalMode::Put).unwrap();
        assert_eq!(tree.base(name), Base::String);
        let err = tree.eval(folder, "newchild", &ctx, EvalMode::Put).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CannotCreate);
    }

    #[test]
    fn test_resolver_operands() {
        let (mut tree, folder, _) = sample();
        let ctx = Context::new(Config::default());
        let mut resolver = NodeResolver::new(&mut tree, &ctx, folder);
        assert_eq!(resolver.resolve("a b"), Some(Operand::new("5", true)));
        assert_eq!(resolver.resolve("a%20b"), None);
        assert_eq!(resolver.resolve("nope"), None);
    }
}

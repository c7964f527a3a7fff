//! Arena storage for data nodes.
//!
//! Every node lives in one [`DataTree`] and is addressed by a [`NodeId`].
//! Parents own their children and metadata through the name maps; the
//! `parent`, `prototype` and `original` links are plain ids and never own
//! anything.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::base::Base;
use crate::binding::Binding;
use crate::builtins;
use crate::config::Config;
use crate::flags;
use crate::given::Given;
use crate::meta;
use crate::policy::{DefaultPolicy, Policy};
use crate::rules;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) base: Base,
    pub(crate) flags: u32,
    pub(crate) value: Option<Value>,
    pub(crate) children: IndexMap<String, NodeId>,
    pub(crate) metadata: IndexMap<String, NodeId>,
    pub(crate) parent: Option<NodeId>,
    /// `None` means the builtin prototype of `base`.
    pub(crate) prototype: Option<NodeId>,
    /// Set on shadows only.
    pub(crate) original: Option<NodeId>,
    pub(crate) binding: Option<Arc<dyn Binding>>,
}

impl Node {
    fn new(base: Base, name: &str) -> Node {
        Node {
            name: name.to_string(),
            base,
            flags: 0,
            value: None,
            children: IndexMap::new(),
            metadata: IndexMap::new(),
            parent: None,
            prototype: None,
            original: None,
            binding: None,
        }
    }

    fn vacant() -> Node {
        Node::new(Base::Invalid, "")
    }

    fn subs(&self, name: &str) -> &IndexMap<String, NodeId> {
        if rules::is_metadata(name) {
            &self.metadata
        } else {
            &self.children
        }
    }

    fn subs_mut(&mut self, name: &str) -> &mut IndexMap<String, NodeId> {
        if rules::is_metadata(name) {
            &mut self.metadata
        } else {
            &mut self.children
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("base", &self.base)
            .field("flags", &format_args!("{:#x}", self.flags))
            .field("value", &self.value)
            .field("children", &self.children.len())
            .field("metadata", &self.metadata.len())
            .field("parent", &self.parent)
            .field("prototype", &self.prototype)
            .field("original", &self.original)
            .field("bound", &self.binding.is_some())
            .finish()
    }
}

/// The node arena together with its builtin prototypes, the definitions
/// registered on it and the prototypes built from them.
pub struct DataTree {
    nodes: Vec<Node>,
    free: Vec<usize>,
    /// Detached nodes that a stale shadow may still point at. Recycled once
    /// no session is open.
    retired: Vec<usize>,
    open_sessions: usize,
    root: NodeId,
    builtins: Vec<NodeId>,
    prototypes: NodeId,
    pub(crate) definitions: IndexMap<String, Given>,
    bindings: HashMap<String, Arc<dyn Binding>>,
    default_policy: Arc<dyn Policy>,
    config: Config,
}

impl fmt::Debug for DataTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTree")
            .field("nodes", &(self.nodes.len() - self.free.len()))
            .field("open_sessions", &self.open_sessions)
            .field("definitions", &self.definitions.len())
            .finish()
    }
}

impl Default for DataTree {
    fn default() -> Self {
        DataTree::new()
    }
}

impl DataTree {
    pub fn new() -> DataTree {
        DataTree::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> DataTree {
        let mut tree = DataTree {
            nodes: Vec::new(),
            free: Vec::new(),
            retired: Vec::new(),
            open_sessions: 0,
            root: NodeId(0),
            builtins: Vec::new(),
            prototypes: NodeId(0),
            definitions: IndexMap::new(),
            bindings: HashMap::new(),
            default_policy: Arc::new(DefaultPolicy),
            config,
        };
        tree.root = tree.create_node(Base::Collection, "");
        tree.node_mut(tree.root).flags |= flags::ROOTED;
        tree.prototypes = tree.create_node(Base::Collection, "..prototypes");
        tree.builtins = builtins::install(&mut tree);
        tree
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Root of the data.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Parent of every prototype built from a definition.
    pub fn prototypes_root(&self) -> NodeId {
        self.prototypes
    }

    pub fn builtin(&self, base: Base) -> NodeId {
        self.builtins[base as usize]
    }

    pub fn set_default_policy(&mut self, policy: Arc<dyn Policy>) {
        self.default_policy = policy;
    }

    pub(crate) fn default_policy(&self) -> Arc<dyn Policy> {
        self.default_policy.clone()
    }

    /// Makes a binding available to `$..binding` metadata under `name`.
    pub fn register_binding(&mut self, name: impl Into<String>, binding: Arc<dyn Binding>) {
        self.bindings.insert(name.into(), binding);
    }

    pub(crate) fn registered_binding(&self, name: &str) -> Option<Arc<dyn Binding>> {
        self.bindings.get(name).cloned()
    }

    // ------------------------------------------------------------ Storage

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Allocates a detached node using the builtin prototype of `base`.
    pub fn create_node(&mut self, base: Base, name: &str) -> NodeId {
        let node = Node::new(base, name);
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = node;
                NodeId(index)
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<usize>) {
        out.push(id.0);
        let node = self.node(id);
        for sub in node.metadata.values().chain(node.children.values()) {
            if self.node(*sub).parent == Some(id) {
                self.collect_subtree(*sub, out);
            }
        }
    }

    /// Frees a subtree right away. Only for nodes nothing else can see,
    /// like the shadows of a closing session.
    pub(crate) fn free_subtree(&mut self, id: NodeId) {
        let mut doomed = Vec::new();
        self.collect_subtree(id, &mut doomed);
        for index in doomed {
            self.nodes[index] = Node::vacant();
            self.free.push(index);
        }
    }

    fn retire_subtree(&mut self, id: NodeId) {
        let mut doomed = Vec::new();
        self.collect_subtree(id, &mut doomed);
        if self.open_sessions == 0 {
            for index in doomed {
                self.nodes[index] = Node::vacant();
                self.free.push(index);
            }
        } else {
            self.retired.extend(doomed);
        }
    }

    pub(crate) fn session_opened(&mut self) {
        self.open_sessions += 1;
    }

    pub(crate) fn session_closed(&mut self) {
        self.open_sessions = self.open_sessions.saturating_sub(1);
        if self.open_sessions == 0 {
            for index in std::mem::take(&mut self.retired) {
                self.nodes[index] = Node::vacant();
                self.free.push(index);
            }
        }
    }

    pub fn open_sessions(&self) -> usize {
        self.open_sessions
    }

    /// Number of live nodes, builtins included.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len() - self.retired.len()
    }

    // ------------------------------------------------------------ Identity

    pub fn name(&self, id: NodeId) -> &str {
        &self.node(id).name
    }

    pub fn base(&self, id: NodeId) -> Base {
        self.node(id).base
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn original(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).original
    }

    pub fn is_shadow(&self, id: NodeId) -> bool {
        self.node(id).original.is_some()
    }

    pub fn is_metadata(&self, id: NodeId) -> bool {
        rules::is_metadata(self.name(id))
    }

    /// Renames a node that is not yet attached anywhere.
    pub fn set_name(&mut self, id: NodeId, name: &str) -> Result<(), crate::XdError> {
        if self.is_shadow(id) {
            return Err(crate::XdError::internal(format!(
                "can't rename shadow '{}'",
                self.name(id)
            )));
        }
        if let Some(parent) = self.parent(id) {
            let old = self.name(id).to_string();
            let subs = self.node_mut(parent).subs_mut(&old);
            if let Some(index) = subs.get_index_of(&old) {
                subs.shift_remove_index(index);
                let (new_index, _) = subs.insert_full(name.to_string(), id);
                subs.move_index(new_index, index.min(subs.len() - 1));
            }
        }
        self.node_mut(id).name = name.to_string();
        Ok(())
    }

    /// Absolute path of a node from its parentless ancestor.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut cur = id;
        while let Some(parent) = self.parent(cur) {
            names.push(self.name(cur).to_string());
            cur = parent;
        }
        names.reverse();
        xd_path::format_absolute_path(&names)
    }

    /// The parentless ancestor of `id`.
    pub fn top_of(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        while let Some(parent) = self.parent(cur) {
            cur = parent;
        }
        cur
    }

    // ------------------------------------------------------------ Flags

    pub fn flags(&self, id: NodeId) -> u32 {
        self.node(id).flags
    }

    pub(crate) fn has_flag(&self, id: NodeId, flag: u32) -> bool {
        self.node(id).flags & flag != 0
    }

    pub(crate) fn set_flag(&mut self, id: NodeId, flag: u32, on: bool) {
        let node = self.node_mut(id);
        if on {
            node.flags |= flag;
        } else {
            node.flags &= !flag;
        }
    }

    fn has_inherited_flag(&self, id: NodeId, flag: u32) -> bool {
        let mut cur = Some(id);
        while let Some(node) = cur {
            if self.has_flag(node, flag) {
                return true;
            }
            cur = self.parent(node);
        }
        false
    }

    pub fn is_definition(&self, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(node) = cur {
            if self.has_flag(node, flags::DEFINITION) || self.name(node) == meta::UI_DEFINITIONS {
                return true;
            }
            cur = self.parent(node);
        }
        false
    }

    pub fn is_immutable(&self, id: NodeId) -> bool {
        self.has_inherited_flag(id, flags::IMMUTABLE)
    }

    pub fn is_prototype(&self, id: NodeId) -> bool {
        self.has_inherited_flag(id, flags::PROTOTYPE)
    }

    pub fn is_builtin(&self, id: NodeId) -> bool {
        self.has_inherited_flag(id, flags::BUILTIN)
    }

    pub fn is_rooted(&self, id: NodeId) -> bool {
        self.has_inherited_flag(id, flags::ROOTED)
    }

    pub fn is_from_any(&self, id: NodeId) -> bool {
        self.has_flag(id, flags::FROM_ANY)
    }

    pub fn is_from_nothing(&self, id: NodeId) -> bool {
        self.has_flag(id, flags::FROM_NOTHING)
    }

    pub fn is_localizable(&self, id: NodeId) -> bool {
        self.has_flag(id, flags::LOCALIZABLE)
    }

    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.has_flag(id, flags::DIRTY)
    }

    pub fn is_dirty_below(&self, id: NodeId) -> bool {
        self.has_flag(id, flags::DIRTY_BELOW)
    }

    pub fn is_deleted(&self, id: NodeId) -> bool {
        self.has_flag(id, flags::DELETED)
    }

    /// Neither a definition, a builtin nor a prototype.
    pub fn is_instance(&self, id: NodeId) -> bool {
        !(self.is_definition(id) || self.is_builtin(id) || self.is_prototype(id))
    }

    pub fn set_immutable(&mut self, id: NodeId, on: bool) {
        self.set_flag(id, flags::IMMUTABLE, on);
    }

    pub fn set_definition(&mut self, id: NodeId, on: bool) {
        self.set_flag(id, flags::DEFINITION, on);
    }

    pub fn set_rooted(&mut self, id: NodeId, on: bool) {
        self.set_flag(id, flags::ROOTED, on);
    }

    pub fn set_localizable(&mut self, id: NodeId, on: bool) {
        self.set_flag(id, flags::LOCALIZABLE, on);
    }

    /// Reads one of the four bits reserved for bindings.
    pub fn binding_flag(&self, id: NodeId, bit: u32) -> bool {
        self.has_flag(id, bit & flags::BINDING_MASK)
    }

    pub fn set_binding_flag(&mut self, id: NodeId, bit: u32, on: bool) {
        self.set_flag(id, bit & flags::BINDING_MASK, on);
    }

    /// True when `id` sits under a session root.
    pub fn has_session(&self, id: NodeId) -> bool {
        self.has_inherited_flag(id, flags::SESSION_ROOT)
    }

    // ------------------------------------------------------------ Local structure

    /// Looks up a child or metadata item without preread or binding calls.
    /// Items flagged deleted are included.
    pub fn find_local(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.node(id).subs(name).get(name).copied()
    }

    pub fn local_children(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).children.values().copied().collect()
    }

    pub fn local_metadata(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).metadata.values().copied().collect()
    }

    /// Metadata first, then children.
    pub(crate) fn local_subs(&self, id: NodeId) -> Vec<NodeId> {
        let node = self.node(id);
        node.metadata
            .values()
            .chain(node.children.values())
            .copied()
            .collect()
    }

    /// Attaches `child` under `parent`. An existing item with the same name
    /// is replaced in its slot and dropped.
    pub fn add_local(&mut self, parent: NodeId, child: NodeId) {
        let name = self.name(child).to_string();
        let replaced = self.node_mut(parent).subs_mut(&name).insert(name, child);
        if let Some(old) = replaced {
            if old != child && self.parent(old) == Some(parent) {
                self.node_mut(old).parent = None;
                self.retire_subtree(old);
            }
        }
        self.node_mut(child).parent = Some(parent);
    }

    /// Detaches and drops an item. Returns whether there was one.
    pub fn remove_local(&mut self, parent: NodeId, name: &str) -> bool {
        match self.node_mut(parent).subs_mut(name).shift_remove(name) {
            Some(old) => {
                if self.parent(old) == Some(parent) {
                    self.node_mut(old).parent = None;
                    self.retire_subtree(old);
                }
                true
            }
            None => false,
        }
    }

    /// Numbers children `1..N` in their current order.
    pub(crate) fn renumber(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.node_mut(id).children);
        let mut renamed = IndexMap::with_capacity(children.len());
        for (position, child) in children.into_values().enumerate() {
            let name = (position + 1).to_string();
            self.node_mut(child).name = name.clone();
            renamed.insert(name, child);
        }
        self.node_mut(id).children = renamed;
    }

    // ------------------------------------------------------------ Values and links

    /// The value stored on the node itself, without preread.
    pub fn local_value(&self, id: NodeId) -> Option<&Value> {
        self.node(id).value.as_ref()
    }

    pub(crate) fn set_local_value(&mut self, id: NodeId, value: Option<Value>) {
        self.node_mut(id).value = value;
    }

    pub(crate) fn local_prototype(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prototype
    }

    pub(crate) fn set_prototype(&mut self, id: NodeId, prototype: Option<NodeId>) {
        self.node_mut(id).prototype = prototype;
    }

    /// The explicit prototype, or the builtin for the node's base.
    pub fn prototype_of(&self, id: NodeId) -> NodeId {
        match self.node(id).prototype {
            Some(prototype) => prototype,
            None => self.builtin(self.base(id)),
        }
    }

    /// Attaches a live-data delegate to a node.
    pub fn set_binding(&mut self, id: NodeId, binding: Arc<dyn Binding>) {
        self.node_mut(id).binding = Some(binding);
    }

    pub(crate) fn local_binding(&self, id: NodeId) -> Option<Arc<dyn Binding>> {
        self.node(id).binding.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_replaces_in_slot() {
        let mut tree = DataTree::new();
        let parent = tree.create_node(Base::Collection, "p");
        for name in ["a", "b", "c"] {
            let child = tree.create_node(Base::String, name);
            tree.add_local(parent, child);
        }
        let replacement = tree.create_node(Base::Real, "b");
        tree.add_local(parent, replacement);
        let names: Vec<_> = tree
            .local_children(parent)
            .into_iter()
            .map(|c| tree.name(c).to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(tree.base(tree.find_local(parent, "b").unwrap()), Base::Real);
    }

    #[test]
    fn test_metadata_and_children_are_separate() {
        let mut tree = DataTree::new();
        let parent = tree.create_node(Base::Sequence, "p");
        let meta = tree.create_node(Base::String, "$displayName");
        let child = tree.create_node(Base::String, "displayName");
        tree.add_local(parent, meta);
        tree.add_local(parent, child);
        assert_eq!(tree.local_metadata(parent), vec![meta]);
        assert_eq!(tree.local_children(parent), vec![child]);
    }

    #[test]
    fn test_inherited_flags_and_paths() {
        let mut tree = DataTree::new();
        let root = tree.root();
        let a = tree.create_node(Base::Sequence, "a");
        let b = tree.create_node(Base::String, "b");
        tree.add_local(root, a);
        tree.add_local(a, b);
        assert!(tree.is_rooted(b));
        assert!(tree.is_instance(b));
        assert_eq!(tree.path_of(b), "/a/b");
        assert_eq!(tree.path_of(root), "/");
        tree.set_immutable(a, true);
        assert!(tree.is_immutable(b));
    }

    #[test]
    fn test_renumber() {
        let mut tree = DataTree::new();
        let list = tree.create_node(Base::List, "l");
        for name in ["1", "3", "4"] {
            let child = tree.create_node(Base::Unsigned, name);
            tree.add_local(list, child);
        }
        tree.renumber(list);
        let names: Vec<_> = tree
            .local_children(list)
            .into_iter()
            .map(|c| tree.name(c).to_string())
            .collect();
        assert_eq!(names, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_freed_slots_are_reused() {
        let mut tree = DataTree::new();
        let before = tree.node_count();
        let parent = tree.create_node(Base::Collection, "p");
        let child = tree.create_node(Base::String, "c");
        tree.add_local(parent, child);
        tree.free_subtree(parent);
        assert_eq!(tree.node_count(), before);
        let again = tree.create_node(Base::String, "d");
        assert!(again.index() == parent.index() || again.index() == child.index());
    }
}

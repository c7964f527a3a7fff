//! Node flag bits.
//!
//! The low twelve bits survive a commit. The transient bits describe the
//! state of a node inside a session. The top four bits belong to bindings.

pub const DEFINITION: u32 = 0x0000_0001;
pub const IMMUTABLE: u32 = 0x0000_0002;
pub const PROTOTYPE: u32 = 0x0000_0004;
pub const BUILTIN: u32 = 0x0000_0008;
pub const FROM_ANY: u32 = 0x0000_0010;
pub const FROM_NOTHING: u32 = 0x0000_0020;
pub const LOCALIZABLE: u32 = 0x0000_0040;
pub const ROOTED: u32 = 0x0000_0080;
pub const PERSIST_MASK: u32 = 0x0000_0fff;

pub const DIRTY: u32 = 0x0000_1000;
pub const DIRTY_BELOW: u32 = 0x0000_2000;
pub const DELETED: u32 = 0x0000_4000;
pub const PREREAD_DONE: u32 = 0x0000_8000;
pub const SESSION_ROOT: u32 = 0x0001_0000;

pub const BINDING_1: u32 = 0x1000_0000;
pub const BINDING_2: u32 = 0x2000_0000;
pub const BINDING_3: u32 = 0x4000_0000;
pub const BINDING_4: u32 = 0x8000_0000;
pub const BINDING_MASK: u32 = 0xf000_0000;

/// Set on a node when set on any ancestor.
pub const INHERITED: u32 = DEFINITION | IMMUTABLE | PROTOTYPE | BUILTIN | ROOTED;

/// Kept by a deep copy; everything else marks a specialised node.
pub const COPIED: u32 = FROM_ANY | FROM_NOTHING | LOCALIZABLE;

//! Self-describing data tree.
//!
//! Every node carries a base type, optional value, ordered children and
//! `$`-named metadata. Nodes inherit metadata from prototypes built out of
//! type definitions, and from their parents for a few names. Edits happen in
//! sessions on lazily filled shadows and reach the shared tree on commit.
//!
//! # Example
//!
//! ```
//! use xd_data::{Base, Config, Context, DataTree, Given, PutOptions, Value};
//!
//! let mut tree = DataTree::new();
//! let root = tree.root();
//! let temp = tree.set(root, "temp", 21.5).unwrap();
//!
//! let ctx = Context::new(Config::default());
//! let given = Given::new("temp", Base::Real).with_value(22.0);
//! tree.put(temp, &given, &ctx, PutOptions::NONE).unwrap();
//! assert_eq!(tree.local_value(temp), Some(&Value::Real(22.0)));
//! ```

pub mod auth;
pub mod base;
pub mod binding;
pub mod builtins;
pub mod config;
pub mod context;
pub mod create;
pub mod delete;
pub mod error;
pub mod eval;
pub mod find;
pub mod flags;
pub mod given;
pub mod meta;
pub mod policy;
pub mod post;
pub mod prototypes;
pub mod put;
pub mod rules;
pub mod session;
pub mod shadow;
pub mod string_set;
pub mod tree;
pub mod value;

pub use auth::{AllowAll, Authorizer, Unprivileged};
pub use base::{Base, ValueKind};
pub use binding::{Binding, Prepost};
pub use config::Config;
pub use context::{Alt, ChildList, Context, Method, NextCursor};
pub use error::{ErrorKind, StatusClass, XdError};
pub use eval::{EvalMode, NodeResolver};
pub use given::Given;
pub use policy::{DefaultBindingPolicy, DefaultPolicy, Policy};
pub use post::PostOutcome;
pub use put::PutOptions;
pub use session::{Posted, Session, Store};
pub use string_set::StringSet;
pub use tree::{DataTree, NodeId};
pub use value::Value;

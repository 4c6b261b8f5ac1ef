//! Core layer - storage and host seams.
//!
//! This module provides:
//! - [`AttributeStore`] / [`MemoryStore`] - Per-component attribute dictionaries
//! - Key names for animation attributes and the [`VarKey`] command vocabulary
//! - [`HostContext`] / [`EditScopes`] - Scene and undo collaborators

mod attrs;
mod host;
pub mod keys;

pub use attrs::{AttrValue, AttributeStore, MemoryStore};
pub use host::{EditScope, EditScopes, EntityId, EntityKind, Host, HostContext};
pub use keys::{HsField, VarKey};

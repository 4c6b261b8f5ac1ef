//! Host collaborator contracts.
//!
//! The modeling environment owns the scene, the attribute dictionaries and the
//! undo stack. The animation core only sees it through these traits.

use std::fmt;

use super::attrs::AttributeStore;
use crate::util::{DMat4, Result};

/// Opaque handle to a host entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a host entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Instance of a component definition.
    ComponentInstance,
    /// Group (an anonymous component).
    Group,
    /// Anything else: faces, edges, guides...
    Other,
}

impl EntityKind {
    /// Components and groups can carry animations and contain other entities.
    #[inline]
    pub fn is_component_like(self) -> bool {
        matches!(self, Self::ComponentInstance | Self::Group)
    }
}

/// Scene access needed by the animation core.
pub trait HostContext {
    /// Per-entity attribute storage.
    type Attrs: AttributeStore;

    /// Kind of an entity, `None` once it has been deleted.
    fn kind(&self, id: EntityId) -> Option<EntityKind>;

    /// Display name of an entity.
    fn name(&self, id: EntityId) -> String;

    /// Attributes of an entity.
    fn attributes(&self, id: EntityId) -> Option<&Self::Attrs>;

    /// Mutable attributes of an entity.
    fn attributes_mut(&mut self, id: EntityId) -> Option<&mut Self::Attrs>;

    /// Transform of an entity as the host currently reports it.
    fn local_transform(&self, id: EntityId) -> Option<DMat4>;

    /// Replace the transform of an entity.
    fn set_local_transform(&mut self, id: EntityId, transform: DMat4) -> Result<()>;

    /// Parent component or group of an entity, `None` at model root.
    fn parent(&self, id: EntityId) -> Option<EntityId>;

    /// Entities contained by a component or group.
    fn children(&self, id: EntityId) -> Vec<EntityId>;

    /// Component or group currently open for editing, `None` at model root.
    fn edit_focus(&self) -> Option<EntityId>;

    /// Entities of the context currently open for editing.
    fn edit_set(&self) -> Vec<EntityId>;

    /// Transform the host folds into children of the open context.
    ///
    /// Identity when nothing is open.
    fn edit_correction(&self) -> DMat4;
}

/// Descriptor of one undoable edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditScope {
    /// Human-readable operation name shown in the host's undo menu.
    pub op_name: &'static str,
    /// Consecutive scopes with equal `Some` keys may merge into one undo step.
    pub merge_key: Option<String>,
}

impl EditScope {
    /// Scope that never merges.
    pub fn single(op_name: &'static str) -> Self {
        Self {
            op_name,
            merge_key: None,
        }
    }

    /// Scope that merges with a directly preceding scope of the same key.
    pub fn mergeable(op_name: &'static str, merge_key: impl Into<String>) -> Self {
        Self {
            op_name,
            merge_key: Some(merge_key.into()),
        }
    }
}

/// Host undo stack protocol.
pub trait EditScopes {
    /// Open a new undo step.
    fn start(&mut self, scope: &EditScope);

    /// Reopen the previous undo step so the next changes fold into it.
    fn resume(&mut self, scope: &EditScope);

    /// Close the open step.
    fn commit(&mut self, scope: &EditScope);

    /// Discard the open step and roll back its changes.
    fn abort(&mut self, scope: &EditScope);
}

/// Everything a controller needs from the host.
pub trait Host: HostContext + EditScopes {}

impl<T: HostContext + EditScopes> Host for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind() {
        assert!(EntityKind::ComponentInstance.is_component_like());
        assert!(EntityKind::Group.is_component_like());
        assert!(!EntityKind::Other.is_component_like());
    }

    #[test]
    fn test_edit_scope() {
        let s = EditScope::single("Add Keyframe");
        assert!(s.merge_key.is_none());

        let m = EditScope::mergeable("Set Value", "set_var:loop");
        assert_eq!(m.merge_key.as_deref(), Some("set_var:loop"));
    }
}

//! In-memory host for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use keyanim::core::{AttributeStore, EditScope, EditScopes, EntityId, EntityKind, HostContext, MemoryStore};
use keyanim::util::{mat4_to_row_major, DMat4};
use keyanim::Result;

pub const DICT: &str = "X-Plane";

/// Undo stack call recorded by [`FakeHost`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScopeCall {
    Start(String),
    Resume(String),
    Commit(String),
    Abort(String),
}

struct Entity {
    kind: EntityKind,
    name: String,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
    transform: DMat4,
    attrs: MemoryStore,
}

/// Scene of entities with attributes and a recording undo stack.
#[derive(Default)]
pub struct FakeHost {
    entities: HashMap<EntityId, Entity>,
    next_id: u64,
    pub focus: Option<EntityId>,
    pub correction: DMat4,
    pub scopes: Vec<ScopeCall>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            correction: DMat4::IDENTITY,
            next_id: 1,
            ..Default::default()
        }
    }

    /// Add an entity under `parent` (model root when `None`).
    pub fn add(&mut self, kind: EntityKind, name: &str, parent: Option<EntityId>, transform: DMat4) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.insert(
            id,
            Entity {
                kind,
                name: name.to_string(),
                parent,
                children: Vec::new(),
                transform,
                attrs: MemoryStore::new(),
            },
        );
        if let Some(p) = parent.and_then(|p| self.entities.get_mut(&p)) {
            p.children.push(id);
        }
        id
    }

    pub fn component(&mut self, name: &str, transform: DMat4) -> EntityId {
        self.add(EntityKind::ComponentInstance, name, None, transform)
    }

    /// Delete an entity and its subtree.
    pub fn remove(&mut self, id: EntityId) {
        if let Some(e) = self.entities.remove(&id) {
            for child in e.children {
                self.remove(child);
            }
            if let Some(p) = e.parent.and_then(|p| self.entities.get_mut(&p)) {
                p.children.retain(|c| *c != id);
            }
        }
    }

    /// Open `id` for editing, or close back to model root with `None`.
    pub fn open_context(&mut self, id: Option<EntityId>) {
        self.focus = id;
    }

    pub fn transform(&self, id: EntityId) -> DMat4 {
        self.entities[&id].transform
    }

    pub fn attrs(&self, id: EntityId) -> &MemoryStore {
        &self.entities[&id].attrs
    }

    pub fn text(&self, id: EntityId, key: &str) -> Option<String> {
        self.attrs(id).get_text(DICT, key)
    }

    /// Write an attribute directly, as another editor would.
    pub fn poke(&mut self, id: EntityId, key: &str, value: &str) {
        if let Some(e) = self.entities.get_mut(&id) {
            e.attrs.set(DICT, key, value.into());
        }
    }

    /// Store a keyframe directly.
    pub fn poke_frame(&mut self, id: EntityId, index: usize, value: f64, transform: DMat4) {
        if let Some(e) = self.entities.get_mut(&id) {
            e.attrs
                .set(DICT, &format!("anim_frame_{}", index), value.to_string().into());
            e.attrs.set(
                DICT,
                &format!("anim_matrix_{}", index),
                keyanim::core::AttrValue::Array(mat4_to_row_major(&transform).to_vec()),
            );
        }
    }

    pub fn set_transform(&mut self, id: EntityId, transform: DMat4) {
        if let Some(e) = self.entities.get_mut(&id) {
            e.transform = transform;
        }
    }

    pub fn take_scopes(&mut self) -> Vec<ScopeCall> {
        std::mem::take(&mut self.scopes)
    }
}

impl HostContext for FakeHost {
    type Attrs = MemoryStore;

    fn kind(&self, id: EntityId) -> Option<EntityKind> {
        self.entities.get(&id).map(|e| e.kind)
    }

    fn name(&self, id: EntityId) -> String {
        self.entities.get(&id).map(|e| e.name.clone()).unwrap_or_default()
    }

    fn attributes(&self, id: EntityId) -> Option<&MemoryStore> {
        self.entities.get(&id).map(|e| &e.attrs)
    }

    fn attributes_mut(&mut self, id: EntityId) -> Option<&mut MemoryStore> {
        self.entities.get_mut(&id).map(|e| &mut e.attrs)
    }

    fn local_transform(&self, id: EntityId) -> Option<DMat4> {
        self.entities.get(&id).map(|e| e.transform)
    }

    fn set_local_transform(&mut self, id: EntityId, transform: DMat4) -> Result<()> {
        let e = self
            .entities
            .get_mut(&id)
            .ok_or(keyanim::Error::StaleReference(id))?;
        e.transform = transform;
        Ok(())
    }

    fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.entities.get(&id).and_then(|e| e.parent)
    }

    fn children(&self, id: EntityId) -> Vec<EntityId> {
        self.entities.get(&id).map(|e| e.children.clone()).unwrap_or_default()
    }

    fn edit_focus(&self) -> Option<EntityId> {
        self.focus
    }

    fn edit_set(&self) -> Vec<EntityId> {
        match self.focus {
            Some(f) => self.children(f),
            None => self
                .entities
                .iter()
                .filter(|(_, e)| e.parent.is_none())
                .map(|(id, _)| *id)
                .collect(),
        }
    }

    fn edit_correction(&self) -> DMat4 {
        if self.focus.is_some() {
            self.correction
        } else {
            DMat4::IDENTITY
        }
    }
}

impl EditScopes for FakeHost {
    fn start(&mut self, scope: &EditScope) {
        self.scopes.push(ScopeCall::Start(scope.op_name.to_string()));
    }

    fn resume(&mut self, scope: &EditScope) {
        self.scopes.push(ScopeCall::Resume(scope.op_name.to_string()));
    }

    fn commit(&mut self, scope: &EditScope) {
        self.scopes.push(ScopeCall::Commit(scope.op_name.to_string()));
    }

    fn abort(&mut self, scope: &EditScope) {
        self.scopes.push(ScopeCall::Abort(scope.op_name.to_string()));
    }
}

//! Registry of open controllers, one per component.

use std::collections::HashMap;

use tracing::debug;

use super::controller::AnimationController;
use super::events::{EventHandler, HostEvent};
use super::presentation::PresentationSink;
use crate::core::{EntityId, Host};
use crate::settings::Settings;
use crate::util::Result;

/// Open controllers keyed by the component they edit.
///
/// Owned by the application shell so a component never gets two editors.
pub struct ControllerRegistry<P: PresentationSink> {
    open: HashMap<EntityId, AnimationController<P>>,
}

impl<P: PresentationSink> Default for ControllerRegistry<P> {
    fn default() -> Self {
        Self {
            open: HashMap::new(),
        }
    }
}

impl<P: PresentationSink> ControllerRegistry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: EntityId) -> Option<&AnimationController<P>> {
        self.open.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut AnimationController<P>> {
        self.open.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.open.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    /// Register a controller, returning the one it replaces.
    pub fn insert(&mut self, controller: AnimationController<P>) -> Option<AnimationController<P>> {
        self.open.insert(controller.id(), controller)
    }

    /// Unregister the controller for `id`.
    pub fn remove(&mut self, id: EntityId) -> Option<AnimationController<P>> {
        self.open.remove(&id)
    }

    /// Existing controller for `id`, or a newly opened one.
    ///
    /// `sink` is only called when a controller has to be opened.
    pub fn get_or_open<H: Host>(
        &mut self,
        host: &mut H,
        id: EntityId,
        settings: &Settings,
        sink: impl FnOnce() -> P,
    ) -> Result<&mut AnimationController<P>> {
        if self.open.get(&id).is_some_and(|c| c.is_closed()) {
            self.open.remove(&id);
        }
        if !self.open.contains_key(&id) {
            let controller = AnimationController::open(host, id, sink(), settings.clone())?;
            debug!(id = %id, "editor opened");
            self.open.insert(id, controller);
        }
        self.open
            .get_mut(&id)
            .ok_or_else(|| crate::Error::other("controller vanished from registry"))
    }

    /// Deliver `event` and drop the controllers that closed.
    ///
    /// Events about one component only reach that component's controller.
    /// Scene-wide events reach every controller, even if an earlier one
    /// fails; the first error is returned.
    pub fn dispatch<H: Host>(&mut self, host: &mut H, event: HostEvent) -> Result<()> {
        let result = match event.target() {
            Some(id) => match self.open.get_mut(&id) {
                Some(controller) => controller.handle(host, event),
                None => Ok(()),
            },
            None => {
                let mut first_err = None;
                for controller in self.open.values_mut() {
                    if let Err(e) = controller.handle(host, event) {
                        first_err.get_or_insert(e);
                    }
                }
                first_err.map_or(Ok(()), Err)
            }
        };
        self.prune_closed();
        result
    }

    /// Remove controllers that reached the closed state.
    pub fn prune_closed(&mut self) -> usize {
        let before = self.open.len();
        self.open.retain(|_, c| !c.is_closed());
        before - self.open.len()
    }
}

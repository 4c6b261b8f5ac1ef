//! Host notifications.

use crate::core::{EntityId, Host};
use crate::util::Result;

/// Something the host observed that may invalidate the current display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostEvent {
    /// The host undid a step.
    Undo,
    /// The host redid a step.
    Redo,
    /// A different context was opened or closed for editing.
    FocusChanged,
    /// A component was deleted.
    Erased(EntityId),
    /// Attributes of a component changed.
    ///
    /// `external` is false for the echo of the controller's own writes.
    AttributeChanged { id: EntityId, external: bool },
}

impl HostEvent {
    /// Component the event is about, `None` for scene-wide events.
    pub fn target(&self) -> Option<EntityId> {
        match self {
            Self::Undo | Self::Redo | Self::FocusChanged => None,
            Self::Erased(id) | Self::AttributeChanged { id, .. } => Some(*id),
        }
    }

    /// Check if a controller bound to `id` should see this event.
    pub fn concerns(&self, id: EntityId) -> bool {
        match self.target() {
            Some(target) => target == id,
            None => true,
        }
    }

    /// Whether this event breaks merging of consecutive edit scopes.
    pub fn is_external_change(&self) -> bool {
        match self {
            Self::Undo | Self::Redo | Self::FocusChanged | Self::Erased(_) => true,
            Self::AttributeChanged { external, .. } => *external,
        }
    }
}

/// Single dispatch entry point for host notifications.
pub trait EventHandler {
    /// React to `event`. Events are delivered one at a time, in order.
    fn handle<H: Host>(&mut self, host: &mut H, event: HostEvent) -> Result<()>;
}

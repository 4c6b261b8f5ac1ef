//! Editing orchestration.
//!
//! - [`AnimationController`] - Command surface and state machine for one component
//! - [`ControllerRegistry`] - One controller per component
//! - [`HostEvent`] / [`EventHandler`] - Host notifications
//! - [`PresentationSink`] - Display directives pushed to the editing surface

#[allow(clippy::module_inception)]
mod controller;
mod events;
mod presentation;
mod registry;

pub use controller::{AnimationController, ControllerState};
pub use events::{EventHandler, HostEvent};
pub use presentation::{Directive, PresentationSink};
pub use registry::ControllerRegistry;

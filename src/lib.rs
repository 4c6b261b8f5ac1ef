//! # keyanim
//!
//! Keyframe transform animations and hide/show rules for 3D components,
//! stored as attribute metadata on the component and previewed live.
//!
//! ## Modules
//!
//! - [`util`] - Errors, glam re-exports, transform helpers
//! - [`core`] - Attribute storage, key names, host collaborator traits
//! - [`anim`] - Keyframes, hide/show rules, channel evaluation, coordinate conversion
//! - [`controller`] - Editor controller, registry, events, presentation seam
//! - [`settings`] - Persistent settings
//!
//! ## Example
//!
//! ```ignore
//! use keyanim::prelude::*;
//!
//! let mut editor = AnimationController::open(&mut host, id, Vec::<Directive>::new(), Settings::load())?;
//! editor.set_var(&mut host, "dataref", "sim/flightmodel2/gear/deploy_ratio")?;
//! editor.preview(&mut host, 0.5)?;
//! ```

pub mod util;
pub mod core;
pub mod anim;
pub mod controller;
pub mod settings;

// Re-export commonly used types
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::anim::{AnimationChannel, CoordinateAdapter, HideShowMode, HideShowRule, Visibility};
    pub use crate::controller::{
        AnimationController, ControllerRegistry, ControllerState, Directive, EventHandler, HostEvent,
        PresentationSink,
    };
    pub use crate::core::{AttrValue, AttributeStore, EditScope, EditScopes, EntityId, EntityKind, Host, HostContext, MemoryStore};
    pub use crate::settings::Settings;
    pub use crate::util::{Error, Result};
}

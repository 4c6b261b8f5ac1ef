//! Animation data model.
//!
//! - [`KeyframeStore`] - Ordered driver value / transform pairs
//! - [`HideShowStore`] - Ordered visibility rules
//! - [`AnimationChannel`] - Driver, loop period, validity and evaluation
//! - [`CoordinateAdapter`] - Live <-> stored transform conversion

mod channel;
mod coords;
mod hide_show;
mod keyframe;

pub use channel::{AnimationChannel, Evaluation, Segment};
pub use coords::CoordinateAdapter;
pub use hide_show::{HideShowMode, HideShowRule, HideShowStore, Visibility};
pub use keyframe::{Keyframe, KeyframeStore};

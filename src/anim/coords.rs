//! Conversion between live and stored transforms.
//!
//! Stored keyframe transforms are always relative to the component's parent
//! and carry no scale. The host may report a component's transform with an
//! extra correction folded in (when the parent is the context open for
//! editing), and the component itself may be scaled by the user.

use std::collections::HashSet;

use smallvec::SmallVec;

use crate::core::{EntityId, HostContext};
use crate::util::{basis_scale, DMat4, DVec3};

/// Axis scales below this are treated as 1 to keep the inverse finite.
const MIN_SCALE: f64 = 1e-12;

/// Stateless live/stored transform conversion.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoordinateAdapter;

impl CoordinateAdapter {
    /// Per-axis scale of a live transform.
    pub fn live_scale(live: &DMat4) -> DVec3 {
        basis_scale(live)
    }

    /// Convert a live transform into the unit-scale, parent-relative form kept
    /// in keyframes.
    pub fn to_stored(live: &DMat4, correction: Option<&DMat4>) -> DMat4 {
        let scale = sanitize(Self::live_scale(live));
        let unscaled = *live * DMat4::from_scale(scale.recip());
        match correction {
            Some(c) => c.inverse() * unscaled,
            None => unscaled,
        }
    }

    /// Convert a stored transform back into live space, reapplying `live_scale`.
    pub fn from_stored(stored: &DMat4, correction: Option<&DMat4>, live_scale: DVec3) -> DMat4 {
        let corrected = match correction {
            Some(c) => *c * *stored,
            None => *stored,
        };
        corrected * DMat4::from_scale(sanitize(live_scale))
    }

    /// Correction the host applies to `id`, if any.
    ///
    /// Only direct children of the context open for editing are affected.
    pub fn correction<H: HostContext + ?Sized>(host: &H, id: EntityId) -> Option<DMat4> {
        let focus = host.edit_focus()?;
        (host.parent(id) == Some(focus)).then(|| host.edit_correction())
    }

    /// Check if `id` may be edited in the host's current editing context.
    ///
    /// At model root everything is editable. Inside an open context the
    /// component must be one of its entities or nested inside one of them.
    pub fn is_editable<H: HostContext + ?Sized>(host: &H, id: EntityId) -> bool {
        if host.edit_focus().is_none() {
            return true;
        }
        let mut seen: HashSet<EntityId> = HashSet::new();
        let mut stack: SmallVec<[EntityId; 16]> = host.edit_set().into_iter().collect();
        while let Some(e) = stack.pop() {
            if e == id {
                return true;
            }
            if !seen.insert(e) {
                continue;
            }
            if host.kind(e).is_some_and(|k| k.is_component_like()) {
                stack.extend(host.children(e));
            }
        }
        false
    }
}

fn sanitize(scale: DVec3) -> DVec3 {
    DVec3::select(scale.cmplt(DVec3::splat(MIN_SCALE)), DVec3::ONE, scale)
}

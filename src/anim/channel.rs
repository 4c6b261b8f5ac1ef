//! Animation channel: driver, keyframes, hide/show rules and loop period.
//!
//! A channel is a snapshot loaded from a component's attributes. It is never
//! kept across edits made by anyone else; callers load it, use it and drop it.

use tracing::debug;

use super::hide_show::{HideShowStore, Visibility};
use super::keyframe::{Keyframe, KeyframeStore};
use crate::core::keys::{frame_key, hs_key, matrix_key, KEY_DATAREF, KEY_INDEX, KEY_LOOP};
use crate::core::{AttributeStore, HsField};
use crate::util::{interpolate_rigid, DMat4, DriverValue, Error, Result};

/// Keyframe segment selected for a driver value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Index of the segment's first keyframe.
    pub lo: usize,
    /// Index of the segment's second keyframe, always `lo + 1`.
    pub hi: usize,
    /// Position inside the segment; outside `[0, 1]` when extrapolating.
    pub t: f64,
}

/// Result of evaluating a channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    /// Driver value the progress mapped to.
    pub value: DriverValue,
    /// Segment used for interpolation.
    pub segment: Segment,
    /// Interpolated stored-space transform.
    pub transform: DMat4,
    /// Visibility from the hide/show rules driven by the same dataref.
    pub visibility: Visibility,
}

/// One component's animation.
#[derive(Clone, Debug, Default)]
pub struct AnimationChannel {
    /// Driver (dataref) name, empty while unset.
    pub dataref: String,
    /// Array index into the driver, empty for scalars.
    pub index: String,
    /// Loop period as entered, empty when not looping.
    pub loop_text: String,
    pub keyframes: KeyframeStore,
    pub rules: HideShowStore,
}

impl AnimationChannel {
    /// Check if the component carries an animation.
    pub fn exists<S: AttributeStore + ?Sized>(store: &S, dict: &str) -> bool {
        store.contains(dict, KEY_DATAREF)
    }

    /// Load the channel, `None` if the component is not animated.
    pub fn load<S: AttributeStore + ?Sized>(store: &S, dict: &str) -> Result<Option<Self>> {
        let Some(dataref) = store.get_text(dict, KEY_DATAREF) else {
            return Ok(None);
        };
        Ok(Some(Self {
            dataref,
            index: store.get_text(dict, KEY_INDEX).unwrap_or_default(),
            loop_text: store.get_text(dict, KEY_LOOP).unwrap_or_default(),
            keyframes: KeyframeStore::load(store, dict)?,
            rules: HideShowStore::load(store, dict)?,
        }))
    }

    /// Start a new animation on a component.
    ///
    /// Writes an empty driver and two keyframes at driver values 0 and 1, both
    /// holding `transform`.
    pub fn create<S: AttributeStore + ?Sized>(store: &mut S, dict: &str, transform: DMat4) -> Result<Self> {
        let mut keyframes = KeyframeStore::load(store, dict)?;
        while !keyframes.is_empty() {
            keyframes.delete_at(keyframes.len() - 1)?;
        }
        keyframes.insert_at(0, transform)?;
        keyframes.insert_at(1, transform)?;
        keyframes.set_value(0, 0.0)?;
        keyframes.set_value(1, 1.0)?;
        keyframes.flush(store, dict);

        store.set(dict, KEY_DATAREF, "".into());
        store.delete(dict, KEY_INDEX);
        store.delete(dict, KEY_LOOP);
        debug!(dict, "created animation channel");

        Ok(Self {
            keyframes,
            rules: HideShowStore::load(store, dict)?,
            ..Self::default()
        })
    }

    /// Remove every animation key from a component.
    pub fn erase<S: AttributeStore + ?Sized>(store: &mut S, dict: &str) {
        let frames = KeyframeStore::count(store, dict);
        for i in 0..frames {
            store.delete(dict, &frame_key(i));
            store.delete(dict, &matrix_key(i));
        }
        let rules = HideShowStore::count(store, dict);
        for i in 0..rules {
            for field in HsField::ALL {
                store.delete(dict, &hs_key(i, field));
            }
        }
        store.delete(dict, KEY_DATAREF);
        store.delete(dict, KEY_INDEX);
        store.delete(dict, KEY_LOOP);
        debug!(dict, frames, rules, "erased animation channel");
    }

    /// Write keyframes and rules back to the attribute store.
    pub fn flush<S: AttributeStore + ?Sized>(&mut self, store: &mut S, dict: &str) {
        self.keyframes.flush(store, dict);
        self.rules.flush(store, dict);
    }

    /// Loop period, `None` when empty or not a finite number.
    pub fn loop_period(&self) -> Option<f64> {
        self.loop_text.trim().parse().ok().filter(|p: &f64| p.is_finite())
    }

    /// Check if the loop field is empty.
    pub fn is_looping(&self) -> bool {
        !self.loop_text.trim().is_empty()
    }

    /// Index at which the non-decreasing scan of driver values stopped.
    ///
    /// Scanning starts at keyframe 1 and stops at the first keyframe whose
    /// value is below its predecessor, or at the end. Values after the stop
    /// are not looked at.
    pub fn valid_prefix(&self) -> usize {
        let values: Vec<DriverValue> = self.keyframes.values().collect();
        let mut frame = 1;
        while frame < values.len() && values[frame] >= values[frame - 1] {
            frame += 1;
        }
        frame.min(values.len())
    }

    /// Whether the channel can be previewed.
    pub fn can_preview(&self) -> bool {
        if self.dataref.is_empty() {
            return false;
        }
        let loop_ok = !self.is_looping() || self.loop_period().is_some_and(|p| p > 0.0);
        self.valid_prefix() >= 2 && loop_ok
    }

    /// Driver range covered by progress 0..1.
    pub fn range(&self) -> Result<(DriverValue, DriverValue)> {
        if let Some(period) = self.loop_period().filter(|p| *p > 0.0) {
            return Ok((0.0, period));
        }
        let first = self.keyframes.get(0)?;
        let last = self.keyframes.get(self.keyframes.len().saturating_sub(1))?;
        Ok((first.value, last.value))
    }

    /// Pick the keyframe segment for driver value `v`.
    ///
    /// Uses the first keyframe with a value above `v`. Past the end the final
    /// segment extrapolates, before the start the first one does.
    pub fn locate(&self, v: DriverValue) -> Result<Segment> {
        let n = self.keyframes.len();
        if n < 2 {
            return Err(Error::precondition(format!(
                "evaluation needs at least 2 keyframes, have {}",
                n
            )));
        }
        let mut k = 0;
        while k < n && self.keyframes.get(k)?.value <= v {
            k += 1;
        }
        if k == n {
            k = n - 1;
        }
        if k == 0 {
            k = 1;
        }

        let a = self.keyframes.get(k - 1)?.value;
        let b = self.keyframes.get(k)?.value;
        let t = if b == a {
            // Zero-width segment: snap to whichever end v has reached
            if v >= b { 1.0 } else { 0.0 }
        } else {
            (v - a) / (b - a)
        };
        Ok(Segment { lo: k - 1, hi: k, t })
    }

    /// Evaluate the channel at `progress` (0..1 across its range).
    pub fn evaluate(&self, progress: f64) -> Result<Evaluation> {
        let (start, stop) = self.range()?;
        let value = start + (stop - start) * progress;
        let segment = self.locate(value)?;
        let a: &Keyframe = self.keyframes.get(segment.lo)?;
        let b: &Keyframe = self.keyframes.get(segment.hi)?;
        Ok(Evaluation {
            value,
            segment,
            transform: interpolate_rigid(&a.transform, &b.transform, segment.t),
            visibility: self.rules.visibility_at(&self.dataref, &self.index, value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemoryStore;
    use crate::util::{mat4_approx_eq, DVec3};

    const DICT: &str = "X-Plane";

    fn translation(x: f64) -> DMat4 {
        DMat4::from_translation(DVec3::new(x, 0.0, 0.0))
    }

    fn channel(values: &[f64]) -> AnimationChannel {
        let mut keyframes = KeyframeStore::new();
        for (i, v) in values.iter().enumerate() {
            keyframes.insert_at(i, translation(10.0 * i as f64)).unwrap();
            keyframes.set_value(i, *v).unwrap();
        }
        AnimationChannel {
            dataref: "sim/cockpit/gear".to_string(),
            keyframes,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_dataref_never_previews() {
        let mut c = channel(&[0.0, 0.5, 1.0]);
        assert!(c.can_preview());
        c.dataref.clear();
        assert!(!c.can_preview());
    }

    #[test]
    fn test_needs_two_ordered_frames() {
        assert!(!channel(&[0.0]).can_preview());
        assert!(!channel(&[1.0, 0.0]).can_preview());
        assert!(channel(&[0.0, 0.0]).can_preview());
    }

    #[test]
    fn test_prefix_validity() {
        // Out-of-order tail does not invalidate the channel
        let c = channel(&[0.0, 0.3, 0.2]);
        assert_eq!(c.valid_prefix(), 2);
        assert!(c.can_preview());

        let c = channel(&[0.0, 0.3, 0.6]);
        assert_eq!(c.valid_prefix(), 3);
    }

    #[test]
    fn test_loop_period_gate() {
        let mut c = channel(&[0.0, 1.0]);
        c.loop_text = "2".to_string();
        assert!(c.can_preview());
        c.loop_text = "0".to_string();
        assert!(!c.can_preview());
        c.loop_text = "-1".to_string();
        assert!(!c.can_preview());
        c.loop_text = "often".to_string();
        assert!(!c.can_preview());
        c.loop_text = "inf".to_string();
        assert!(!c.can_preview());
        c.loop_text = "NaN".to_string();
        assert!(!c.can_preview());
        c.loop_text = "  ".to_string();
        assert!(c.can_preview());
    }

    #[test]
    fn test_evaluate_interpolates() {
        let c = channel(&[0.0, 0.5, 1.0]);
        let e = c.evaluate(0.25).unwrap();
        assert_eq!(e.value, 0.25);
        assert_eq!((e.segment.lo, e.segment.hi), (0, 1));
        assert!((e.segment.t - 0.5).abs() < 1e-12);
        assert!((e.transform.w_axis.x - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_evaluate_endpoints() {
        let c = channel(&[0.0, 0.5, 1.0]);
        let first = c.evaluate(0.0).unwrap();
        assert_eq!(first.transform, c.keyframes.get(0).unwrap().transform);

        let last = c.evaluate(1.0).unwrap();
        assert_eq!((last.segment.lo, last.segment.hi), (1, 2));
        assert_eq!(last.transform, c.keyframes.get(2).unwrap().transform);
    }

    #[test]
    fn test_evaluate_loop_extrapolates() {
        let mut c = channel(&[0.0, 1.0]);
        c.loop_text = "2.0".to_string();
        assert_eq!(c.range().unwrap(), (0.0, 2.0));

        let e = c.evaluate(1.0).unwrap();
        assert_eq!(e.value, 2.0);
        assert_eq!((e.segment.lo, e.segment.hi), (0, 1));
        assert_eq!(e.segment.t, 2.0);
        assert!(mat4_approx_eq(&e.transform, &translation(20.0), 1e-9));
    }

    #[test]
    fn test_locate_before_first() {
        let c = channel(&[1.0, 2.0, 3.0]);
        let s = c.locate(0.0).unwrap();
        assert_eq!((s.lo, s.hi), (0, 1));
        assert_eq!(s.t, -1.0);
    }

    #[test]
    fn test_locate_zero_width_segment() {
        let c = channel(&[0.0, 1.0, 1.0]);
        let s = c.locate(1.0).unwrap();
        assert_eq!((s.lo, s.hi), (1, 2));
        assert_eq!(s.t, 1.0);
    }

    #[test]
    fn test_evaluate_needs_two_frames() {
        let c = channel(&[0.0]);
        assert!(matches!(c.evaluate(0.5), Err(Error::Precondition(_))));
    }

    #[test]
    fn test_create_load_erase() {
        let mut store = MemoryStore::new();
        assert!(AnimationChannel::load(&store, DICT).unwrap().is_none());

        let created = AnimationChannel::create(&mut store, DICT, translation(3.0)).unwrap();
        assert_eq!(created.keyframes.len(), 2);
        assert!(AnimationChannel::exists(&store, DICT));

        let loaded = AnimationChannel::load(&store, DICT).unwrap().unwrap();
        assert_eq!(loaded.dataref, "");
        assert_eq!(loaded.keyframes.values().collect::<Vec<_>>(), vec![0.0, 1.0]);
        assert_eq!(loaded.keyframes.get(1).unwrap().transform, translation(3.0));
        // Not previewable until a dataref is chosen
        assert!(!loaded.can_preview());

        store.set(DICT, "unrelated", "keep".into());
        AnimationChannel::erase(&mut store, DICT);
        assert!(!AnimationChannel::exists(&store, DICT));
        assert_eq!(store.keys(DICT).collect::<Vec<_>>(), vec!["unrelated"]);
    }
}

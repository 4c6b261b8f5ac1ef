//! Keyframe storage.
//!
//! Keyframes live in the attribute store as densely numbered
//! `anim_frame_<i>` / `anim_matrix_<i>` pairs. [`KeyframeStore`] loads them
//! into a vector, edits the vector, and flushes it back, deleting any slots
//! left over past the new end so the numbering stays contiguous.

use crate::core::keys::{frame_key, matrix_key};
use crate::core::{AttrValue, AttributeStore};
use crate::util::{mat4_from_row_major, mat4_to_row_major, DMat4, DriverValue, Error, Result};

/// A single keyframe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe {
    /// Driver value at which this pose applies.
    pub value: DriverValue,
    /// Local, ancestor-corrected, unit-scale transform.
    pub transform: DMat4,
}

impl Keyframe {
    pub fn new(value: DriverValue, transform: DMat4) -> Self {
        Self { value, transform }
    }
}

/// Ordered keyframes of one animation channel.
#[derive(Clone, Debug, Default)]
pub struct KeyframeStore {
    frames: Vec<Keyframe>,
    /// Number of slots present in the attribute store when loaded.
    loaded: usize,
}

impl KeyframeStore {
    /// Create an empty store not backed by any attributes yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count keyframes present in the attribute store.
    ///
    /// Scans `anim_frame_0`, `anim_frame_1`, ... until the first gap.
    pub fn count<S: AttributeStore + ?Sized>(store: &S, dict: &str) -> usize {
        let mut n = 0;
        while store.contains(dict, &frame_key(n)) {
            n += 1;
        }
        n
    }

    /// Read all keyframes from the attribute store.
    pub fn load<S: AttributeStore + ?Sized>(store: &S, dict: &str) -> Result<Self> {
        let n = Self::count(store, dict);
        let mut frames = Vec::with_capacity(n);
        for i in 0..n {
            let key = frame_key(i);
            let raw = store.get(dict, &key);
            let value = raw
                .as_ref()
                .and_then(AttrValue::as_f64)
                .ok_or_else(|| Error::invalid_value(&key, raw.as_ref().map(|v| v.to_string()).unwrap_or_default()))?;

            let key = matrix_key(i);
            let raw = store.get(dict, &key);
            let transform = raw
                .as_ref()
                .and_then(AttrValue::as_array)
                .and_then(mat4_from_row_major)
                .ok_or_else(|| Error::invalid_value(&key, raw.as_ref().map(|v| v.to_string()).unwrap_or_default()))?;

            frames.push(Keyframe { value, transform });
        }
        Ok(Self { frames, loaded: n })
    }

    /// Write keyframes back, removing slots past the current end.
    pub fn flush<S: AttributeStore + ?Sized>(&mut self, store: &mut S, dict: &str) {
        for (i, frame) in self.frames.iter().enumerate() {
            store.set(dict, &frame_key(i), AttrValue::Str(frame.value.to_string()));
            store.set(
                dict,
                &matrix_key(i),
                AttrValue::Array(mat4_to_row_major(&frame.transform).to_vec()),
            );
        }
        for i in self.frames.len()..self.loaded {
            store.delete(dict, &frame_key(i));
            store.delete(dict, &matrix_key(i));
        }
        self.loaded = self.frames.len();
    }

    /// Number of keyframes.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if there are no keyframes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Keyframe at `index`.
    pub fn get(&self, index: usize) -> Result<&Keyframe> {
        self.frames
            .get(index)
            .ok_or_else(|| Error::not_found("keyframe", index, self.frames.len()))
    }

    /// Iterate over keyframes in order.
    pub fn iter(&self) -> impl Iterator<Item = &Keyframe> {
        self.frames.iter()
    }

    /// Driver values in order.
    pub fn values(&self) -> impl Iterator<Item = DriverValue> + '_ {
        self.frames.iter().map(|f| f.value)
    }

    /// Replace the transform of keyframe `index`.
    pub fn set_transform(&mut self, index: usize, transform: DMat4) -> Result<()> {
        let count = self.frames.len();
        let frame = self
            .frames
            .get_mut(index)
            .ok_or_else(|| Error::not_found("keyframe", index, count))?;
        frame.transform = transform;
        Ok(())
    }

    /// Replace the driver value of keyframe `index`.
    pub fn set_value(&mut self, index: usize, value: DriverValue) -> Result<()> {
        let count = self.frames.len();
        let frame = self
            .frames
            .get_mut(index)
            .ok_or_else(|| Error::not_found("keyframe", index, count))?;
        frame.value = value;
        Ok(())
    }

    /// Insert a keyframe holding `transform` at `index`, shifting later ones up.
    ///
    /// The new keyframe takes the driver value previously at `index`; when
    /// appending it repeats the last keyframe's value.
    pub fn insert_at(&mut self, index: usize, transform: DMat4) -> Result<()> {
        let n = self.frames.len();
        if index > n {
            return Err(Error::not_found("keyframe", index, n));
        }
        let value = match n {
            0 => 0.0,
            _ => self.frames[index.min(n - 1)].value,
        };
        self.frames.insert(index, Keyframe { value, transform });
        Ok(())
    }

    /// Remove keyframe `index`, shifting later ones down.
    ///
    /// No minimum count is enforced here.
    pub fn delete_at(&mut self, index: usize) -> Result<Keyframe> {
        let n = self.frames.len();
        if index >= n {
            return Err(Error::not_found("keyframe", index, n));
        }
        Ok(self.frames.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemoryStore;
    use crate::util::DVec3;

    const DICT: &str = "X-Plane";

    fn translation(x: f64) -> DMat4 {
        DMat4::from_translation(DVec3::new(x, 0.0, 0.0))
    }

    fn store_with(values: &[f64]) -> MemoryStore {
        let mut store = MemoryStore::new();
        let mut frames = KeyframeStore::new();
        for (i, v) in values.iter().enumerate() {
            frames.insert_at(i, translation(i as f64)).unwrap();
            frames.set_value(i, *v).unwrap();
        }
        frames.flush(&mut store, DICT);
        store
    }

    /// Every slot below `count` is present and the slot at `count` is not.
    fn assert_dense(store: &MemoryStore, expected: usize) {
        assert_eq!(KeyframeStore::count(store, DICT), expected);
        for i in 0..expected {
            assert!(store.contains(DICT, &matrix_key(i)), "matrix_{} missing", i);
        }
        assert!(!store.contains(DICT, &frame_key(expected)));
        assert!(!store.contains(DICT, &matrix_key(expected)));
    }

    #[test]
    fn test_load_and_count() {
        let store = store_with(&[0.0, 0.5, 1.0]);
        assert_eq!(KeyframeStore::count(&store, DICT), 3);

        let frames = KeyframeStore::load(&store, DICT).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames.values().collect::<Vec<_>>(), vec![0.0, 0.5, 1.0]);
        assert_eq!(frames.get(2).unwrap().transform, translation(2.0));
    }

    #[test]
    fn test_count_stops_at_gap() {
        let mut store = store_with(&[0.0, 1.0]);
        store.set(DICT, &frame_key(3), "3".into());
        assert_eq!(KeyframeStore::count(&store, DICT), 2);
    }

    #[test]
    fn test_insert_middle_shifts_up() {
        let mut store = store_with(&[0.0, 0.5, 1.0]);
        let mut frames = KeyframeStore::load(&store, DICT).unwrap();
        frames.insert_at(1, translation(9.0)).unwrap();
        frames.flush(&mut store, DICT);

        let frames = KeyframeStore::load(&store, DICT).unwrap();
        assert_eq!(frames.len(), 4);
        // New slot reuses the value that was at its position
        assert_eq!(frames.values().collect::<Vec<_>>(), vec![0.0, 0.5, 0.5, 1.0]);
        assert_eq!(frames.get(1).unwrap().transform, translation(9.0));
        assert_eq!(frames.get(2).unwrap().transform, translation(1.0));
        assert_eq!(frames.get(3).unwrap().transform, translation(2.0));
    }

    #[test]
    fn test_append_repeats_last_value() {
        let mut frames = KeyframeStore::new();
        frames.insert_at(0, translation(0.0)).unwrap();
        frames.set_value(0, 0.0).unwrap();
        frames.insert_at(1, translation(1.0)).unwrap();
        frames.set_value(1, 2.5).unwrap();

        frames.insert_at(2, translation(2.0)).unwrap();
        assert_eq!(frames.get(2).unwrap().value, 2.5);
        assert_eq!(frames.get(2).unwrap().transform, translation(2.0));
    }

    #[test]
    fn test_delete_removes_trailing_slot() {
        let mut store = store_with(&[0.0, 0.5, 1.0]);
        let mut frames = KeyframeStore::load(&store, DICT).unwrap();
        let removed = frames.delete_at(0).unwrap();
        assert_eq!(removed.value, 0.0);
        frames.flush(&mut store, DICT);

        assert_dense(&store, 2);
        let frames = KeyframeStore::load(&store, DICT).unwrap();
        assert_eq!(frames.values().collect::<Vec<_>>(), vec![0.5, 1.0]);
        assert_eq!(frames.get(0).unwrap().transform, translation(1.0));
    }

    #[test]
    fn test_out_of_range() {
        let mut frames = KeyframeStore::new();
        assert!(matches!(
            frames.insert_at(1, DMat4::IDENTITY),
            Err(Error::NotFound { index: 1, count: 0, .. })
        ));
        assert!(frames.delete_at(0).is_err());
        assert!(frames.get(0).is_err());
        assert!(frames.set_transform(0, DMat4::IDENTITY).is_err());
        assert!(frames.set_value(0, 1.0).is_err());

        frames.insert_at(0, DMat4::IDENTITY).unwrap();
        assert!(frames.get(0).is_ok());
        assert!(frames.get(1).is_err());
    }

    #[test]
    fn test_indices_stay_contiguous() {
        let mut store = store_with(&[0.0, 1.0]);
        // Deterministic mix of inserts and deletes at varying positions
        let mut seed: u64 = 0x2545_f491;
        for step in 0..200 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let mut frames = KeyframeStore::load(&store, DICT).unwrap();
            let n = frames.len();
            let pos = (seed >> 33) as usize;
            if n == 0 || (seed >> 20) % 3 != 0 {
                frames.insert_at(pos % (n + 1), translation(step as f64)).unwrap();
            } else {
                frames.delete_at(pos % n).unwrap();
            }
            let expected = frames.len();
            frames.flush(&mut store, DICT);
            assert_dense(&store, expected);
        }
    }

    #[test]
    fn test_load_rejects_bad_values() {
        let mut store = store_with(&[0.0, 1.0]);
        store.set(DICT, &frame_key(1), "fast".into());
        assert!(matches!(
            KeyframeStore::load(&store, DICT),
            Err(Error::InvalidValue { .. })
        ));

        let mut store = store_with(&[0.0, 1.0]);
        store.set(DICT, &matrix_key(0), vec![1.0, 0.0].into());
        assert!(KeyframeStore::load(&store, DICT).is_err());
    }
}

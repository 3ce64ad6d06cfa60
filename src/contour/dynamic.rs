use std::sync::Arc;

use super::{ContourVertex, trace_level};
use crate::{
    arena::Scratch,
    field::FieldStore,
    types::{AXES, Value},
};

/// Most contour vertices one padded cell can emit on one axis (two segments).
pub const MAX_CELL_VERTICES: usize = 4;

/// Scratch vertices reserved per padded cell: six times the most all three axes
/// can emit, so live updates never grow the buffer mid-interaction.
pub const DYNAMIC_VERTICES_PER_CELL: usize = MAX_CELL_VERTICES * AXES * 6;

/// The live contours, one level per axis, as published after a
/// [`DynamicContourTracker::update`].
#[derive(Clone, Debug)]
pub struct DynamicContours {
    /// The written prefix of the scratch buffer.
    pub vertices: Arc<[ContourVertex]>,
    pub levels: [Value; AXES],
    pub offsets: [usize; AXES],
    pub counts: [usize; AXES],
}

impl Default for DynamicContours {
    fn default() -> Self {
        Self {
            vertices: Arc::from(Vec::new()),
            levels: [Value::NAN; AXES],
            offsets: [0; AXES],
            counts: [0; AXES],
        }
    }
}

impl DynamicContours {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices[..])
    }

    /// `true` when no axis has a live contour.
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|c| *c == 0)
    }
}

/// Recomputes one transient contour per axis into a pre-sized scratch buffer.
///
/// Meant for interactive use (a contour following the cursor): each update is a
/// full recomputation, but the staging memory is reused across calls.
#[derive(Debug, Default)]
pub struct DynamicContourTracker {
    scratch: Scratch<ContourVertex>,
}

impl DynamicContourTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sizes the scratch buffer for a field of logical `shape`.
    pub fn reserve_for(&mut self, shape: [usize; 2]) {
        let cells = (shape[0] + 1) * (shape[1] + 1);
        self.scratch.reserve(cells * DYNAMIC_VERTICES_PER_CELL);
    }

    pub fn capacity(&self) -> usize {
        self.scratch.capacity()
    }

    /// Traces `levels[axis]` on every axis. A `NaN` level disables that axis.
    pub fn update(&mut self, store: &FieldStore, levels: [Value; AXES]) -> DynamicContours {
        self.reserve_for(store.shape());
        self.scratch.scope(|buf| {
            let mut offsets = [0; AXES];
            let mut counts = [0; AXES];
            for axis in 0..AXES {
                offsets[axis] = buf.len();
                if levels[axis].is_nan() {
                    continue;
                }
                counts[axis] = trace_level(store, axis, levels[axis], buf);
            }
            tracing::trace!(?counts, "dynamic contours updated");
            DynamicContours {
                vertices: Arc::from(&buf[..]),
                levels,
                offsets,
                counts,
            }
        })
    }

    pub fn release(&mut self) {
        self.scratch.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::ContourExtractor;
    use ndarray::Array2;

    fn store() -> FieldStore {
        let mut store = FieldStore::new();
        let field = Array2::from_shape_fn((6, 5), |(i, j)| (i as f32 - 2.5).hypot(j as f32 - 2.0));
        store.set_field(field.view(), None).unwrap();
        store
    }

    #[test]
    fn reservation_is_six_times_the_worst_case() {
        let store = store();
        let mut tracker = DynamicContourTracker::new();
        tracker.update(&store, [Value::NAN; AXES]);
        let [rows, cols] = store.shape();
        let worst = (rows + 1) * (cols + 1) * MAX_CELL_VERTICES * AXES;
        assert!(tracker.capacity() >= 6 * worst);

        let capacity = tracker.capacity();
        tracker.update(&store, [1.0, 2.0, 1.5]);
        assert_eq!(tracker.capacity(), capacity);
    }

    #[test]
    fn nan_level_disables_an_axis() {
        let store = store();
        let mut tracker = DynamicContourTracker::new();
        let live = tracker.update(&store, [Value::NAN, 2.5, 1.5]);
        assert_eq!(live.counts[0], 0);
        assert!(live.counts[1] > 0);
        assert!(live.counts[2] > 0);
        assert_eq!(live.offsets[1], 0);
        assert_eq!(live.offsets[2], live.counts[1]);
        assert_eq!(live.vertices.len(), live.counts[1] + live.counts[2]);
    }

    #[test]
    fn matches_static_extraction() {
        let store = store();
        let mut tracker = DynamicContourTracker::new();
        let live = tracker.update(&store, [Value::NAN, Value::NAN, 1.5]);

        let mut reference = Vec::new();
        ContourExtractor.build(&store, 2, &[1.5], &mut reference);
        assert_eq!(&live.vertices[..], &reference[..]);
    }

    #[test]
    fn scratch_is_reused_between_updates() {
        let store = store();
        let mut tracker = DynamicContourTracker::new();
        tracker.update(&store, [1.0, 1.0, 1.0]);
        let capacity = tracker.capacity();
        assert!(capacity >= 7 * 6 * DYNAMIC_VERTICES_PER_CELL);
        let live = tracker.update(&store, [Value::NAN; 3]);
        assert!(live.is_empty());
        assert!(live.vertices.is_empty());
        assert_eq!(tracker.capacity(), capacity);
    }
}

use std::sync::Arc;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use super::{ContourLevels, ContourRange, ContourVertex, trace_level};
use crate::{
    field::FieldStore,
    types::{AXES, Value},
};

/// Published contour geometry: one shared line buffer and a range per (axis, level).
#[derive(Clone, Debug)]
pub struct ContourSet {
    pub vertices: Arc<[ContourVertex]>,
    /// `ranges[axis][k]` is the contour of the `k`-th sorted level of `axis`.
    pub ranges: [Vec<ContourRange>; AXES],
}

impl Default for ContourSet {
    fn default() -> Self {
        Self {
            vertices: Arc::from(Vec::new()),
            ranges: Default::default(),
        }
    }
}

impl ContourSet {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Line vertices as bytes for a GPU buffer update.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices[..])
    }

    /// Vertices of one contour.
    pub fn level_vertices(&self, axis: usize, level_index: usize) -> &[ContourVertex] {
        match self.ranges[axis].get(level_index) {
            Some(range) => &self.vertices[range.offset..range.end()],
            None => &[],
        }
    }
}

/// Extracts the contours of every level of every axis into one line buffer.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContourExtractor;

impl ContourExtractor {
    /// Appends the contours of `levels` for field `axis` to `out` and returns one
    /// range per level, in the order of `levels`.
    ///
    /// Levels are traced in parallel and concatenated in level order, so offsets
    /// and vertex order are reproducible.
    pub fn build(
        &self,
        store: &FieldStore,
        axis: usize,
        levels: &[Value],
        out: &mut Vec<ContourVertex>,
    ) -> Vec<ContourRange> {
        let traced: Vec<Vec<ContourVertex>> = levels
            .par_iter()
            .map(|&level| {
                let mut local = Vec::new();
                trace_level(store, axis, level, &mut local);
                local
            })
            .collect();

        traced
            .into_iter()
            .map(|mut local| {
                let range = ContourRange {
                    offset: out.len(),
                    count: local.len(),
                };
                out.append(&mut local);
                range
            })
            .collect()
    }

    /// Builds the contours of all three axes into `out` (cleared first).
    pub fn build_all(
        &self,
        store: &FieldStore,
        levels: &ContourLevels,
        out: &mut Vec<ContourVertex>,
    ) -> [Vec<ContourRange>; AXES] {
        out.clear();
        let ranges = std::array::from_fn(|axis| self.build(store, axis, levels.axis(axis), out));
        tracing::trace!(vertices = out.len(), "extracted contours");
        ranges
    }
}

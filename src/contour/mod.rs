//! Per-axis iso-contours of the surface fields.
//!
//! Axis 0 and 1 contour the x and y coordinate fields, axis 2 the value field.
//! Every contour vertex is mapped to world space by bilinearly blending the two
//! *other* fields around it; the contoured axis itself takes the level.

pub mod dynamic;
pub mod extract;
pub mod nets;

use bytemuck::{Pod, Zeroable};

use crate::{
    field::FieldStore,
    interp::{bilinear, split},
    types::{AXES, Value, is_valid},
};

pub use dynamic::{DynamicContourTracker, DynamicContours};
pub use extract::{ContourExtractor, ContourSet};
pub use nets::IsoGraph;

/// One endpoint of a contour line segment, laid out for direct upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ContourVertex {
    /// World position.
    pub position: [f32; 3],
    /// Continuous logical `[row, col]` grid coordinate.
    pub grid: [f32; 2],
}

/// Slice of a shared line-vertex buffer holding one contour.
///
/// `count` is in vertices and always even: consecutive pairs are line segments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContourRange {
    pub offset: usize,
    pub count: usize,
}

impl ContourRange {
    pub fn end(&self) -> usize {
        self.offset + self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Sorted contour levels for each axis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContourLevels(pub [Vec<Value>; AXES]);

impl ContourLevels {
    /// Sorts each axis ascending and drops non-finite levels.
    pub fn new(levels: [Vec<Value>; AXES]) -> Self {
        Self(levels.map(|mut axis| {
            axis.retain(|v| is_valid(*v));
            axis.sort_by(|a, b| a.total_cmp(b));
            axis
        }))
    }

    pub fn axis(&self, axis: usize) -> &[Value] {
        &self.0[axis]
    }
}

/// Maps an iso-graph vertex (padded grid space) of the `axis` field to a contour vertex.
///
/// Returns `None` when any sample of either interpolation stencil is a hole.
pub(crate) fn map_vertex(
    store: &FieldStore,
    axis: usize,
    level: Value,
    p: [Value; 2],
) -> Option<ContourVertex> {
    let (ix, fx) = split(p[0]);
    let (iy, fy) = split(p[1]);

    let mut position = [0.0; 3];
    position[axis] = level;
    for step in 1..AXES {
        let other = (axis + step) % AXES;
        position[other] = bilinear(&store.padded(other), ix, iy, fx, fy)?;
    }

    Some(ContourVertex {
        position,
        grid: [p[0] - 1.0, p[1] - 1.0],
    })
}

/// Appends the segments of `graph` to `out`, applying the hole rule.
///
/// Edges are all-or-nothing: if the first endpoint is a hole the edge is skipped,
/// and if the second one is, the already-written first endpoint is retracted.
/// Returns the number of vertices written.
pub(crate) fn emit_graph(
    store: &FieldStore,
    axis: usize,
    level: Value,
    graph: &IsoGraph,
    out: &mut Vec<ContourVertex>,
) -> usize {
    let start = out.len();
    'edges: for edge in &graph.edges {
        for (k, &v) in edge.iter().enumerate() {
            match map_vertex(store, axis, level, graph.positions[v as usize]) {
                Some(vertex) => out.push(vertex),
                None => {
                    if k > 0 {
                        out.pop();
                    }
                    continue 'edges;
                }
            }
        }
    }
    out.len() - start
}

/// Extracts the contour of field `axis` at `level` and appends its segments to `out`.
pub(crate) fn trace_level(
    store: &FieldStore,
    axis: usize,
    level: Value,
    out: &mut Vec<ContourVertex>,
) -> usize {
    let graph = nets::extract(&store.padded(axis), level);
    emit_graph(store, axis, level, &graph, out)
}

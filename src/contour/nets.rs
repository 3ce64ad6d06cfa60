//! Iso-line graph extraction over a 2-D grid.
//!
//! Zero crossings of `field - level` are located on grid edges and linked cell by
//! cell into a line graph. A crossing shared by two cells is a single graph vertex,
//! so closed contours come out as closed loops.

use ndarray::ArrayView2;

use crate::{
    interp::{find_t, lerp},
    types::{Value, is_valid},
};

const NO_VERTEX: u32 = u32::MAX;

/// Segments per cell case, as pairs of cell edges.
///
/// Corners and edges of a cell at `(i, j)`:
///
/// ```text
///   c0 --e0-- c1        c0 = (i,   j)     e0 = c0-c1
///   |          |        c1 = (i,   j+1)   e1 = c1-c2
///   e3        e1        c2 = (i+1, j+1)   e2 = c3-c2
///   |          |        c3 = (i+1, j)     e3 = c0-c3
///   c3 --e2-- c2
/// ```
///
/// Bit `k` of the case is set when corner `k` lies above the level. The saddle
/// cases 5 and 10 are resolved separately using the cell centre.
const SEGMENTS: [&[[usize; 2]]; 16] = [
    &[],
    &[[3, 0]],
    &[[0, 1]],
    &[[3, 1]],
    &[[1, 2]],
    &[],
    &[[0, 2]],
    &[[3, 2]],
    &[[2, 3]],
    &[[0, 2]],
    &[],
    &[[1, 2]],
    &[[1, 3]],
    &[[0, 1]],
    &[[0, 3]],
    &[],
];

/// Line graph of an iso-contour in continuous grid-index space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IsoGraph {
    /// `[row, col]` positions; every vertex lies on a grid edge.
    pub positions: Vec<[Value; 2]>,
    /// Pairs of indices into `positions`.
    pub edges: Vec<[u32; 2]>,
}

impl IsoGraph {
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Computes the cell case bitmask for corners `[c0, c1, c2, c3]`.
///
/// ```text
/// corner index:  3  2  1  0
/// case bits:    [_][_][_][_]
///                         ^-- c0 above the level?
/// ```
#[inline]
pub fn cell_case(corners: [Value; 4], level: Value) -> usize {
    corners
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > level)
        .fold(0, |case, (k, _)| case | (1 << k))
}

/// Segments of a saddle cell; `centre_above` tells whether the bilinear centre value
/// is above the level, which decides which diagonal pair of corners is connected.
fn saddle_segments(case: usize, centre_above: bool) -> [[usize; 2]; 2] {
    match (case, centre_above) {
        // c0 and c2 above: joined through the centre, c1 and c3 are cut off.
        (5, true) | (10, false) => [[0, 1], [2, 3]],
        // c1 and c3 joined, or c0 and c2 separated: c0 and c2 are cut off.
        _ => [[3, 0], [1, 2]],
    }
}

/// Extracts the iso-line graph of `field` at `level`.
///
/// Cells with a non-finite corner produce no segments. Vertices are numbered in
/// the order the row-major cell scan first reaches them, so the graph is fully
/// determined by the input.
pub fn extract(field: &ArrayView2<Value>, level: Value) -> IsoGraph {
    let (rows, cols) = field.dim();
    let mut graph = IsoGraph::default();
    if rows < 2 || cols < 2 || !is_valid(level) {
        return graph;
    }

    // Vertex ids of crossings on horizontal edges (i, j)-(i, j+1) and vertical
    // edges (i, j)-(i+1, j).
    let mut horizontal = vec![NO_VERTEX; rows * (cols - 1)];
    let mut vertical = vec![NO_VERTEX; (rows - 1) * cols];

    for i in 0..rows - 1 {
        for j in 0..cols - 1 {
            let corners = [
                field[[i, j]],
                field[[i, j + 1]],
                field[[i + 1, j + 1]],
                field[[i + 1, j]],
            ];
            if !corners.iter().all(|v| is_valid(*v)) {
                continue;
            }

            let case = cell_case(corners, level);
            let saddle;
            let segments: &[[usize; 2]] = match case {
                5 | 10 => {
                    let centre = corners.iter().sum::<Value>() * 0.25;
                    saddle = saddle_segments(case, centre > level);
                    &saddle
                }
                _ => SEGMENTS[case],
            };

            for &[a, b] in segments {
                let va = edge_vertex(&mut graph, &mut horizontal, &mut vertical, field, i, j, a, level);
                let vb = edge_vertex(&mut graph, &mut horizontal, &mut vertical, field, i, j, b, level);
                graph.edges.push([va, vb]);
            }
        }
    }

    graph
}

/// Returns the graph vertex on cell edge `edge` of cell `(i, j)`, creating it on
/// first use.
fn edge_vertex(
    graph: &mut IsoGraph,
    horizontal: &mut [u32],
    vertical: &mut [u32],
    field: &ArrayView2<Value>,
    i: usize,
    j: usize,
    edge: usize,
    level: Value,
) -> u32 {
    let cols = field.ncols();
    let (slot, from, to) = match edge {
        0 => (&mut horizontal[i * (cols - 1) + j], [i, j], [i, j + 1]),
        1 => (&mut vertical[i * cols + j + 1], [i, j + 1], [i + 1, j + 1]),
        2 => (&mut horizontal[(i + 1) * (cols - 1) + j], [i + 1, j], [i + 1, j + 1]),
        _ => (&mut vertical[i * cols + j], [i, j], [i + 1, j]),
    };
    if *slot != NO_VERTEX {
        return *slot;
    }

    let t = find_t(field[from], field[to], level);
    let position = [
        lerp(from[0] as Value, to[0] as Value, t),
        lerp(from[1] as Value, to[1] as Value, t),
    ];
    let id = graph.positions.len() as u32;
    graph.positions.push(position);
    *slot = id;
    id
}

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use ndarray::ArrayView2;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    field::FieldStore,
    gradient::surface_normal,
    types::{AXES, Bounds, Value, is_valid},
};

/// Corner offsets of the two triangles emitted per grid cell.
///
/// ```text
///  (0,0)---(0,1)      tri 0: (0,0) (0,1) (1,0)
///    |    /  |        tri 1: (1,1) (1,0) (0,1)
///    |   /   |
///  (1,0)---(1,1)
/// ```
pub const QUAD: [[usize; 2]; 6] = [[0, 0], [0, 1], [1, 0], [1, 1], [1, 0], [0, 1]];

/// Vertices emitted per valid cell.
pub const VERTICES_PER_CELL: usize = QUAD.len();

/// One vertex of the tessellated height surface, laid out for direct upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SurfaceVertex {
    /// Logical `[row, col]` of the sample, read back by the pick pass.
    pub grid: [f32; 2],
    /// World `[x, y]` from the coordinate fields.
    pub coord: [f32; 2],
    /// `[value, flags]`; the flag channel is reserved for per-vertex overrides.
    pub value: [f32; 2],
    /// Unit normal from the central-difference gradient of the three fields.
    pub normal: [f32; 3],
}

impl SurfaceVertex {
    /// World position `[x, y, value]`.
    pub fn position(&self) -> [f32; 3] {
        [self.coord[0], self.coord[1], self.value[0]]
    }
}

/// Published surface geometry: the emitted vertex stream and the bounds of valid data.
///
/// The vertex count varies with the number of hole cells and is the draw length;
/// it is *not* `6 * (rows - 1) * (cols - 1)` in general.
#[derive(Clone, Debug)]
pub struct SurfaceMesh {
    pub vertices: Arc<[SurfaceVertex]>,
    pub bounds: Bounds,
}

impl Default for SurfaceMesh {
    fn default() -> Self {
        Self {
            vertices: Arc::from(Vec::new()),
            bounds: Bounds::empty(),
        }
    }
}

impl SurfaceMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Vertex stream as bytes for a GPU buffer update.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices[..])
    }
}

/// Turns the padded fields of a [`FieldStore`] into two triangles per valid cell.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeshTessellator;

impl MeshTessellator {
    /// Writes the vertex stream into `out` (which is cleared first) and returns the
    /// bounds of the emitted vertices.
    ///
    /// A cell is emitted only when all four corners are finite in all three fields.
    /// Rows are tessellated in parallel and merged in row order, so the output is
    /// identical from run to run.
    pub fn build(&self, store: &FieldStore, out: &mut Vec<SurfaceVertex>) -> Bounds {
        out.clear();
        let [rows, cols] = store.shape();
        if rows < 2 || cols < 2 {
            return Bounds::empty();
        }

        let fields = [store.padded(0), store.padded(1), store.padded(2)];
        let per_row: Vec<(Vec<SurfaceVertex>, Bounds)> = (0..rows - 1)
            .into_par_iter()
            .map(|i| tessellate_row(&fields, i, cols))
            .collect();

        let total: usize = per_row.iter().map(|(v, _)| v.len()).sum();
        out.reserve(total);
        let mut bounds = Bounds::empty();
        for (mut verts, row_bounds) in per_row {
            out.append(&mut verts);
            bounds = bounds.union(&row_bounds);
        }

        tracing::trace!(rows, cols, vertices = out.len(), "tessellated surface");
        bounds
    }
}

/// `true` when the 2×2 stencil at logical cell `(i, j)` is finite in every field.
#[inline]
fn cell_is_valid(fields: &[ArrayView2<Value>; AXES], i: usize, j: usize) -> bool {
    fields.iter().all(|field| {
        (0..2).all(|dx| (0..2).all(|dy| is_valid(field[[i + 1 + dx, j + 1 + dy]])))
    })
}

fn tessellate_row(
    fields: &[ArrayView2<Value>; AXES],
    i: usize,
    cols: usize,
) -> (Vec<SurfaceVertex>, Bounds) {
    let mut local = Vec::with_capacity((cols - 1) * VERTICES_PER_CELL);
    let mut bounds = Bounds::empty();

    for j in 0..cols - 1 {
        if !cell_is_valid(fields, i, j) {
            continue;
        }
        for [dr, dc] in QUAD {
            let (r, c) = (i + dr, j + dc);
            let vertex = SurfaceVertex {
                grid: [r as f32, c as f32],
                coord: [fields[0][[r + 1, c + 1]], fields[1][[r + 1, c + 1]]],
                value: [fields[2][[r + 1, c + 1]], 0.0],
                normal: surface_normal(fields, r + 1, c + 1),
            };
            bounds.include(vertex.position());
            local.push(vertex);
        }
    }

    (local, bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{field::Coordinates, types::Point};
    use ndarray::{Array2, array};

    fn build(field: &Array2<Value>) -> (Vec<SurfaceVertex>, Bounds) {
        let mut store = FieldStore::new();
        store.set_field(field.view(), None).unwrap();
        let mut out = Vec::new();
        let bounds = MeshTessellator.build(&store, &mut out);
        (out, bounds)
    }

    #[test]
    fn uniform_field_emits_every_cell() {
        let field = Array2::from_elem((4, 5), 2.5);
        let (verts, bounds) = build(&field);
        assert_eq!(verts.len(), 6 * 3 * 4);
        assert_eq!(bounds.lo, Point::new(0.0, 0.0, 2.5));
        assert_eq!(bounds.hi, Point::new(3.0, 4.0, 2.5));
    }

    #[test]
    fn cells_share_the_same_fan() {
        let field = Array2::zeros((3, 3));
        let (verts, _) = build(&field);
        for (cell, chunk) in verts.chunks(6).enumerate() {
            let origin = chunk[0].grid;
            for (k, v) in chunk.iter().enumerate() {
                assert_eq!(v.grid[0] - origin[0], QUAD[k][0] as f32, "cell {cell}");
                assert_eq!(v.grid[1] - origin[1], QUAD[k][1] as f32, "cell {cell}");
            }
        }
    }

    #[test]
    fn interior_hole_removes_exactly_four_cells() {
        let mut field = Array2::from_elem((5, 5), 1.0);
        field[[2, 2]] = Value::NAN;
        let (verts, _) = build(&field);
        assert_eq!(verts.len(), 6 * (16 - 4));
        assert!(verts.iter().all(|v| v.grid != [2.0, 2.0]));
    }

    #[test]
    fn corner_hole_removes_one_cell_and_shrinks_bounds() {
        let mut field = Array2::from_elem((3, 3), 1.0);
        field[[0, 0]] = Value::INFINITY;
        field[[2, 2]] = 4.0;
        let (verts, bounds) = build(&field);
        assert_eq!(verts.len(), 6 * 3);
        assert_eq!(bounds.lo, Point::new(0.0, 0.0, 1.0));
        assert_eq!(bounds.hi, Point::new(2.0, 2.0, 4.0));
    }

    #[test]
    fn coordinate_hole_removes_its_cells() {
        let field = Array2::from_elem((4, 4), 1.0);
        let mut x = Array2::from_shape_fn((4, 4), |(i, _)| i as Value);
        let y = Array2::from_shape_fn((4, 4), |(_, j)| j as Value);
        x[[1, 1]] = Value::NAN;

        let mut store = FieldStore::new();
        store
            .set_field(field.view(), Some(&Coordinates::Grid { x, y }))
            .unwrap();
        let mut verts = Vec::new();
        let bounds = MeshTessellator.build(&store, &mut verts);

        assert_eq!(verts.len(), 6 * (9 - 4));
        assert!(verts.iter().all(|v| v.grid != [1.0, 1.0]));
        assert_eq!(bounds.lo, Point::new(0.0, 0.0, 1.0));
        assert_eq!(bounds.hi, Point::new(3.0, 3.0, 1.0));
    }

    #[test]
    fn tick_hole_removes_a_column_of_cells() {
        let field = Array2::from_elem((4, 4), 1.0);
        let ticks = Coordinates::Ticks {
            x: array![0.0, 1.0, 2.0, 3.0],
            y: array![Value::NAN, 10.0, 20.0, 30.0],
        };
        let mut store = FieldStore::new();
        store.set_field(field.view(), Some(&ticks)).unwrap();
        let mut verts = Vec::new();
        let bounds = MeshTessellator.build(&store, &mut verts);

        assert_eq!(verts.len(), 6 * 6);
        assert_eq!(bounds.lo, Point::new(0.0, 10.0, 1.0));
        assert_eq!(bounds.hi, Point::new(3.0, 30.0, 1.0));
    }

    #[test]
    fn flat_field_normals_point_up() {
        let (verts, _) = build(&Array2::from_elem((3, 4), 0.5));
        assert!(verts.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn fully_invalid_field_has_empty_bounds() {
        let field = Array2::from_elem((3, 3), Value::NAN);
        let (verts, bounds) = build(&field);
        assert!(verts.is_empty());
        assert!(bounds.is_empty());
    }

    #[test]
    fn peak_field_bounds() {
        let field = array![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        let (verts, bounds) = build(&field);
        assert_eq!(verts.len(), 8 * 3);
        assert_eq!(bounds.lo, Point::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.hi, Point::new(2.0, 2.0, 1.0));
    }
}

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut2, s};

use crate::{
    arena::grown_capacity,
    error::{Result, SurfaceError},
    types::{AXES, VALUE_AXIS, Value},
};

/// Explicit world coordinates for the samples of a field.
///
/// `x` runs along rows and `y` along columns. Ticks are broadcast across the
/// orthogonal axis: `x[i]` applies to every sample of row `i`, `y[j]` to every
/// sample of column `j`.
#[derive(Clone, Debug, PartialEq)]
pub enum Coordinates {
    Grid {
        x: Array2<Value>,
        y: Array2<Value>,
    },
    Ticks {
        x: Array1<Value>,
        y: Array1<Value>,
    },
}

impl Coordinates {
    /// Checks the coordinates against a field of logical `shape`.
    pub fn validate(&self, shape: [usize; 2]) -> Result<()> {
        match self {
            Coordinates::Grid { x, y } => {
                for (what, grid) in [("x coordinates", x), ("y coordinates", y)] {
                    if grid.shape() != shape {
                        return Err(SurfaceError::shape_mismatch(what, &shape, grid.shape()));
                    }
                }
            }
            Coordinates::Ticks { x, y } => {
                if x.len() != shape[0] {
                    return Err(SurfaceError::shape_mismatch("x ticks", &shape[..1], &[x.len()]));
                }
                if y.len() != shape[1] {
                    return Err(SurfaceError::shape_mismatch("y ticks", &shape[1..], &[y.len()]));
                }
            }
        }
        Ok(())
    }
}

/// Owns the three padded fields of a surface: x coordinates, y coordinates, values.
///
/// Each field is stored with a one-sample ghost border replicated from the nearest
/// edge, so every 2×2 stencil around a logical sample stays in bounds:
///
/// ```text
///  c e e e c      c = copy of the nearest logical corner
///  e . . . e      e = copy of the adjacent logical edge sample
///  e . . . e      . = logical sample
///  c e e e c
/// ```
///
/// Backing storage is a grow-only arena shared by the three fields. It is
/// reallocated only when a larger field arrives.
#[derive(Debug, Default)]
pub struct FieldStore {
    shape: [usize; 2],
    storage: [Vec<Value>; AXES],
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logical `[rows, cols]` of the current field.
    pub fn shape(&self) -> [usize; 2] {
        self.shape
    }

    /// `[rows + 2, cols + 2]`.
    pub fn padded_shape(&self) -> [usize; 2] {
        [self.shape[0] + 2, self.shape[1] + 2]
    }

    /// Number of samples each field can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.storage[VALUE_AXIS].len()
    }

    /// `true` until a field has been stored.
    pub fn is_empty(&self) -> bool {
        self.shape[0] == 0 || self.shape[1] == 0
    }

    /// Padded view of field `axis` (0 = x, 1 = y, 2 = value).
    pub fn padded(&self, axis: usize) -> ArrayView2<'_, Value> {
        let [rows, cols] = self.padded_shape();
        let len = rows * cols;
        if self.storage[axis].len() < len {
            let empty: &[Value] = &[];
            return ArrayView2::from_shape((0, 0), empty).expect("empty view");
        }
        ArrayView2::from_shape((rows, cols), &self.storage[axis][..len])
            .expect("padded shape fits storage")
    }

    /// Logical (unpadded) view of field `axis`.
    pub fn logical(&self, axis: usize) -> ArrayView2<'_, Value> {
        let [rows, cols] = self.shape;
        let padded = self.padded(axis);
        if padded.is_empty() {
            return padded;
        }
        padded.slice_move(s![1..rows + 1, 1..cols + 1])
    }

    /// Replaces the stored fields.
    ///
    /// Coordinates are validated before anything is written, so a
    /// [`SurfaceError::ShapeMismatch`] leaves the store untouched. Without
    /// coordinates the x/y fields default to row/column indices.
    pub fn set_field(
        &mut self,
        values: ArrayView2<Value>,
        coordinates: Option<&Coordinates>,
    ) -> Result<()> {
        let (rows, cols) = values.dim();
        if let Some(coordinates) = coordinates {
            coordinates.validate([rows, cols])?;
        }

        self.shape = [rows, cols];
        let required = (rows + 2) * (cols + 2);
        if required > self.capacity() {
            let capacity = grown_capacity(required);
            tracing::debug!(rows, cols, capacity, "growing field storage");
            for field in self.storage.iter_mut() {
                *field = vec![0.0; capacity];
            }
        }

        if rows == 0 || cols == 0 {
            for field in self.storage.iter_mut() {
                field[..required].fill(Value::NAN);
            }
            return Ok(());
        }

        let shape = [rows, cols];
        let [x_store, y_store, v_store] = &mut self.storage;
        match coordinates {
            Some(Coordinates::Grid { x, y }) => {
                pad_into(padded_mut(x_store, shape), x.view());
                pad_into(padded_mut(y_store, shape), y.view());
            }
            Some(Coordinates::Ticks { x, y }) => {
                pad_into(padded_mut(x_store, shape), broadcast_rows(x.view(), cols).view());
                pad_into(padded_mut(y_store, shape), broadcast_cols(y.view(), rows).view());
            }
            None => {
                let row_index = Array2::from_shape_fn((rows, cols), |(i, _)| i as Value);
                let col_index = Array2::from_shape_fn((rows, cols), |(_, j)| j as Value);
                pad_into(padded_mut(x_store, shape), row_index.view());
                pad_into(padded_mut(y_store, shape), col_index.view());
            }
        }
        pad_into(padded_mut(v_store, shape), values);
        Ok(())
    }

    /// Copies the logical value field out of the store.
    pub fn values(&self) -> Array2<Value> {
        self.logical(VALUE_AXIS).to_owned()
    }

    /// Returns the arena memory to the allocator.
    pub fn release(&mut self) {
        self.shape = [0, 0];
        self.storage = Default::default();
    }
}

/// Mutable padded view over the front of `store` for a field of logical `shape`.
fn padded_mut(store: &mut [Value], shape: [usize; 2]) -> ArrayViewMut2<'_, Value> {
    let padded = (shape[0] + 2, shape[1] + 2);
    ArrayViewMut2::from_shape(padded, &mut store[..padded.0 * padded.1])
        .expect("padded shape fits storage")
}

/// `ticks[i]` repeated along every column of row `i`.
fn broadcast_rows(ticks: ArrayView1<Value>, cols: usize) -> Array2<Value> {
    Array2::from_shape_fn((ticks.len(), cols), |(i, _)| ticks[i])
}

/// `ticks[j]` repeated along every row of column `j`.
fn broadcast_cols(ticks: ArrayView1<Value>, rows: usize) -> Array2<Value> {
    Array2::from_shape_fn((rows, ticks.len()), |(_, j)| ticks[j])
}

/// Writes `src` into the interior of `dst` and replicates its edges and corners
/// into the one-sample border. `dst` must be `src.dim() + (2, 2)`.
pub fn pad_into(mut dst: ArrayViewMut2<Value>, src: ArrayView2<Value>) {
    let (rows, cols) = src.dim();
    debug_assert_eq!(dst.dim(), (rows + 2, cols + 2));

    dst.slice_mut(s![1..rows + 1, 1..cols + 1]).assign(&src);

    dst.slice_mut(s![1..rows + 1, 0]).assign(&src.column(0));
    dst.slice_mut(s![1..rows + 1, cols + 1]).assign(&src.column(cols - 1));
    dst.slice_mut(s![0, 1..cols + 1]).assign(&src.row(0));
    dst.slice_mut(s![rows + 1, 1..cols + 1]).assign(&src.row(rows - 1));

    dst[[0, 0]] = src[[0, 0]];
    dst[[0, cols + 1]] = src[[0, cols - 1]];
    dst[[rows + 1, 0]] = src[[rows - 1, 0]];
    dst[[rows + 1, cols + 1]] = src[[rows - 1, cols - 1]];
}

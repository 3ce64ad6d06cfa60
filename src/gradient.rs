use ndarray::ArrayView2;

use crate::types::{AXES, Value, Vector, is_valid};

/// Normal used where the gradient is undefined (holes, degenerate coordinates).
pub const FLAT_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];

/// Central difference of `field` at padded sample `(r, c)` along rows and columns.
///
/// The caller must keep `(r, c)` off the ghost border. Because the border replicates
/// the outermost logical samples, differences at the logical edge degrade to a
/// half-weighted one-sided difference.
#[inline]
pub fn central_difference(field: &ArrayView2<Value>, r: usize, c: usize) -> [Value; 2] {
    [
        0.5 * (field[[r + 1, c]] - field[[r - 1, c]]),
        0.5 * (field[[r, c + 1]] - field[[r, c - 1]]),
    ]
}

/// Unit surface normal at padded sample `(r, c)`.
///
/// The surface point is `(x, y, value)` taken from the three padded fields, so the
/// normal is the cross product of its partial derivatives along rows and columns.
pub fn surface_normal(fields: &[ArrayView2<Value>; AXES], r: usize, c: usize) -> [f32; 3] {
    let mut du = Vector::zeros();
    let mut dv = Vector::zeros();
    for (axis, field) in fields.iter().enumerate() {
        let [d_row, d_col] = central_difference(field, r, c);
        du[axis] = d_row;
        dv[axis] = d_col;
    }

    let n = du.cross(&dv);
    let length = n.norm();
    if !is_valid(length) || length <= Value::EPSILON {
        return FLAT_NORMAL;
    }
    let n = n / length;
    [n.x, n.y, n.z]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldStore;
    use ndarray::Array2;

    fn fields(store: &FieldStore) -> [ArrayView2<'_, Value>; AXES] {
        [store.padded(0), store.padded(1), store.padded(2)]
    }

    #[test]
    fn flat_field_points_up() {
        let mut store = FieldStore::new();
        store.set_field(Array2::from_elem((4, 4), 3.0).view(), None).unwrap();
        let fields = fields(&store);
        for r in 1..5 {
            for c in 1..5 {
                assert_eq!(surface_normal(&fields, r, c), [0.0, 0.0, 1.0]);
            }
        }
    }

    #[test]
    fn ramp_tilts_against_the_slope() {
        let mut store = FieldStore::new();
        let ramp = Array2::from_shape_fn((5, 5), |(i, _)| i as Value);
        store.set_field(ramp.view(), None).unwrap();
        let n = surface_normal(&fields(&store), 3, 3);
        let s = std::f32::consts::FRAC_1_SQRT_2;
        assert!((n[0] + s).abs() < 1e-6);
        assert!(n[1].abs() < 1e-6);
        assert!((n[2] - s).abs() < 1e-6);
    }

    #[test]
    fn hole_in_the_stencil_falls_back_to_flat() {
        let mut store = FieldStore::new();
        let mut field = Array2::from_shape_fn((4, 4), |(i, j)| (i * j) as Value);
        field[[1, 2]] = Value::NAN;
        store.set_field(field.view(), None).unwrap();
        assert_eq!(surface_normal(&fields(&store), 2, 2), FLAT_NORMAL);
    }
}

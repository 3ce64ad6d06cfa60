use ndarray::ArrayView2;

use crate::types::{Value, is_valid};

// Return the interpolation factor t corresponding to iso_val
#[inline]
pub fn find_t(v0: Value, v1: Value, iso_val: Value) -> Value {
    (iso_val - v0) / (v1 - v0)
}

// Linear interpolation
#[inline]
pub fn lerp(a: Value, b: Value, t: Value) -> Value {
    a + (b - a) * t
}

/// Splits a continuous grid coordinate into its cell index and in-cell fraction.
///
/// Negative coordinates clamp to cell 0 with fraction 0.
#[inline]
pub fn split(x: Value) -> (usize, Value) {
    let floor = x.floor();
    if floor < 0.0 || !floor.is_finite() {
        return (0, 0.0);
    }
    (floor as usize, x - floor)
}

/// Bilinearly blends the four samples `(ix + dx, iy + dy)` of `field` with weights
/// `fx`/`1 - fx` and `fy`/`1 - fy`.
///
/// Stencil indices are clamped to the field. Returns `None` when any sample is a hole.
#[inline]
pub fn bilinear(
    field: &ArrayView2<Value>,
    ix: usize,
    iy: usize,
    fx: Value,
    fy: Value,
) -> Option<Value> {
    let (rows, cols) = field.dim();
    if rows == 0 || cols == 0 {
        return None;
    }
    let mut acc = 0.0;
    for dx in 0..2 {
        let s = if dx == 1 { fx } else { 1.0 - fx };
        let r = (ix + dx).min(rows - 1);
        for dy in 0..2 {
            let t = if dy == 1 { fy } else { 1.0 - fy };
            let c = (iy + dy).min(cols - 1);
            let f = field[[r, c]];
            if !is_valid(f) {
                return None;
            }
            acc += s * t * f;
        }
    }
    Some(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn find_t_inverts_lerp() {
        let t = find_t(2.0, 6.0, 3.0);
        assert_eq!(t, 0.25);
        assert_eq!(lerp(2.0, 6.0, t), 3.0);
    }

    #[test]
    fn split_clamps_negative() {
        assert_eq!(split(2.75), (2, 0.75));
        assert_eq!(split(-0.5), (0, 0.0));
    }

    #[test]
    fn bilinear_blends_corners() {
        let f = array![[0.0, 1.0], [2.0, 3.0]];
        let v = bilinear(&f.view(), 0, 0, 0.5, 0.5).unwrap();
        assert_eq!(v, 1.5);
        assert_eq!(bilinear(&f.view(), 0, 0, 0.0, 1.0), Some(1.0));
    }

    #[test]
    fn bilinear_reports_holes() {
        let f = array![[0.0, Value::NAN], [2.0, 3.0]];
        assert_eq!(bilinear(&f.view(), 0, 0, 0.0, 0.0), None);
    }
}

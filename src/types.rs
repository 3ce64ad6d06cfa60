use nalgebra::{Matrix4, Point3, Vector3};

/// Scalar sample stored in a field.
pub type Value = f32;

/// A 3D point with [`Value`] components.
pub type Point = Point3<Value>;

/// A 3D vector with [`Value`] components.
pub type Vector = Vector3<Value>;

/// Column-major 4×4 transform used for model/view/projection matrices.
pub type Matrix = Matrix4<Value>;

/// Linear RGBA colour with components in `0..=1`.
pub type Rgba = [f32; 4];

/// Number of field axes: x-coordinate, y-coordinate and value.
pub const AXES: usize = 3;

/// Index of the value field among the three field axes.
pub const VALUE_AXIS: usize = 2;

/// Returns `true` when a sample takes part in geometry.
///
/// Non-finite samples (`NaN`, `±∞`) are holes.
#[inline]
pub fn is_valid(v: Value) -> bool {
    v.is_finite()
}

/// Axis-aligned box spanned by `lo` and `hi`.
///
/// An empty box has `lo = +∞` and `hi = -∞`, so [`include`](Bounds::include)
/// can fold points into it without a special first case.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub lo: Point,
    pub hi: Point,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bounds {
    pub fn new(lo: Point, hi: Point) -> Self {
        Self { lo, hi }
    }

    /// The empty box.
    pub fn empty() -> Self {
        Self {
            lo: Point::new(Value::INFINITY, Value::INFINITY, Value::INFINITY),
            hi: Point::new(
                Value::NEG_INFINITY,
                Value::NEG_INFINITY,
                Value::NEG_INFINITY,
            ),
        }
    }

    /// A box covering all of space, used when no axes bounds were supplied.
    pub fn unbounded() -> Self {
        Self {
            lo: Point::new(
                Value::NEG_INFINITY,
                Value::NEG_INFINITY,
                Value::NEG_INFINITY,
            ),
            hi: Point::new(Value::INFINITY, Value::INFINITY, Value::INFINITY),
        }
    }

    /// `true` when no point has been included yet.
    pub fn is_empty(&self) -> bool {
        (0..AXES).any(|i| self.lo[i] > self.hi[i])
    }

    /// Grows the box to contain `p`.
    #[inline]
    pub fn include(&mut self, p: [Value; 3]) {
        for (i, &v) in p.iter().enumerate() {
            self.lo[i] = self.lo[i].min(v);
            self.hi[i] = self.hi[i].max(v);
        }
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let mut out = *self;
        for i in 0..AXES {
            out.lo[i] = out.lo[i].min(other.lo[i]);
            out.hi[i] = out.hi[i].max(other.hi[i]);
        }
        out
    }

    /// Returns the `lo` corner for `false` and the `hi` corner for `true`.
    pub fn corner(&self, upper: bool) -> &Point {
        if upper { &self.hi } else { &self.lo }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bounds_fold_points() {
        let mut b = Bounds::empty();
        assert!(b.is_empty());
        b.include([1.0, -2.0, 3.0]);
        b.include([0.0, 4.0, 3.0]);
        assert!(!b.is_empty());
        assert_eq!(b.lo, Point::new(0.0, -2.0, 3.0));
        assert_eq!(b.hi, Point::new(1.0, 4.0, 3.0));
    }

    #[test]
    fn union_with_empty_is_identity() {
        let mut b = Bounds::empty();
        b.include([1.0, 2.0, 3.0]);
        assert_eq!(b.union(&Bounds::empty()), b);
    }
}

//! Pick-pass encoding and decoding.
//!
//! The pick pass renders every pickable object with a colour that identifies the
//! object and the location under each pixel:
//!
//! ```text
//!   R = row cell    (8 bit, scaled so the whole field spans 0..255)
//!   G = column cell (8 bit, same scaling)
//!   B = [ row fraction : 4 | column fraction : 4 ]   (1/16 steps)
//!   A = pick id
//! ```
//!
//! [`PickDecoder`] turns a sampled pixel back into grid and world coordinates
//! and the nearest contour level on each axis.

use crate::{
    contour::ContourLevels,
    field::FieldStore,
    interp::{bilinear, split},
    types::{AXES, Point, Value},
};

/// Quantisation steps of the sub-cell fraction nibbles.
pub const FRACTION_STEPS: Value = 16.0;

/// Full scale of the 8-bit cell channels.
pub const CELL_SCALE: Value = 255.0;

/// A pixel read back from the pick pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PickSample {
    /// Object id, from the alpha channel or a side id buffer.
    pub id: u8,
    /// `[R, G, B, A]`.
    pub value: [u8; 4],
}

/// A successfully decoded pick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickResult {
    /// World position blended from the three fields.
    pub position: Point,
    /// Logical grid cell nearest to the pick.
    pub cell_index: [usize; 2],
    /// Pick coordinate normalised by the field shape.
    pub uv: [Value; 2],
    /// Nearest contour level per axis; `None` for axes without levels.
    pub level_index: [Option<usize>; AXES],
    /// Continuous logical grid coordinate of the pick.
    pub coordinate: [Value; 2],
    /// Field values `(x, y, value)` at `cell_index`.
    pub data_coordinate: Point,
}

/// Encodes a logical grid coordinate the way the pick shader does.
///
/// `coordinate` is in `0..=shape` along each axis.
pub fn encode(id: u8, shape: [usize; 2], coordinate: [Value; 2]) -> PickSample {
    let mut cells = [0u8; 2];
    let mut fractions = [0u8; 2];
    for axis in 0..2 {
        let extent = shape[axis].max(1) as Value;
        let q = (coordinate[axis] * CELL_SCALE / extent).clamp(0.0, CELL_SCALE);
        let cell = q.floor();
        cells[axis] = cell as u8;
        fractions[axis] = (((q - cell) * FRACTION_STEPS).floor() as u8).min(15);
    }
    PickSample {
        id,
        value: [cells[0], cells[1], (fractions[0] << 4) | fractions[1], id],
    }
}

/// Picks the index of the level nearest to `x` in an ascending `levels` list.
///
/// Starts from the greatest level `<= x` (index 0 if there is none) and moves to
/// the next level only when it is strictly closer, so ties keep the lower index.
pub fn nearest_level(levels: &[Value], x: Value) -> Option<usize> {
    if levels.is_empty() {
        return None;
    }
    let below = levels.partition_point(|&level| level <= x);
    if below == 0 {
        return Some(0);
    }
    let i = below - 1;
    match levels.get(i + 1) {
        Some(&next) if (next - x).abs() < (levels[i] - x).abs() => Some(i + 1),
        _ => Some(i),
    }
}

/// Decodes pick samples against the fields and levels of one surface.
#[derive(Clone, Copy, Debug)]
pub struct PickDecoder<'a> {
    pub store: &'a FieldStore,
    pub levels: &'a ContourLevels,
    pub pick_id: u8,
}

impl<'a> PickDecoder<'a> {
    pub fn new(store: &'a FieldStore, levels: &'a ContourLevels, pick_id: u8) -> Self {
        Self {
            store,
            levels,
            pick_id,
        }
    }

    /// Returns `None` when the sample belongs to another object (or the background),
    /// when no field is loaded, or when the pick lands on a hole.
    pub fn decode(&self, sample: &PickSample) -> Option<PickResult> {
        if sample.id == 0 || sample.id != self.pick_id || self.store.is_empty() {
            return None;
        }
        let [rows, cols] = self.store.shape();
        let [r, g, b, _] = sample.value;

        let x = rows as Value * (r as Value + (b >> 4) as Value / FRACTION_STEPS) / CELL_SCALE;
        let y = cols as Value * (g as Value + (b & 15) as Value / FRACTION_STEPS) / CELL_SCALE;
        let (ix, fx) = split(x);
        let (iy, fy) = split(y);

        // Padded fields are offset by one sample.
        let mut position = Point::origin();
        for axis in 0..AXES {
            position[axis] = bilinear(&self.store.padded(axis), ix + 1, iy + 1, fx, fy)?;
        }

        let level_index =
            std::array::from_fn(|axis| nearest_level(self.levels.axis(axis), position[axis]));

        let cell_index = [
            round_cell(ix, fx).min(rows - 1),
            round_cell(iy, fy).min(cols - 1),
        ];
        let mut data_coordinate = Point::origin();
        for axis in 0..AXES {
            data_coordinate[axis] = self.store.logical(axis)[cell_index];
        }

        Some(PickResult {
            position,
            cell_index,
            uv: [x / rows as Value, y / cols as Value],
            level_index,
            coordinate: [x, y],
            data_coordinate,
        })
    }
}

#[inline]
fn round_cell(i: usize, f: Value) -> usize {
    if f < 0.5 { i } else { i + 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn store(shape: (usize, usize)) -> FieldStore {
        let mut store = FieldStore::new();
        let field = Array2::from_shape_fn(shape, |(i, j)| (i * 3 + j * j) as Value);
        store.set_field(field.view(), None).unwrap();
        store
    }

    #[test]
    fn nearest_level_examples() {
        let levels = [0.0, 10.0, 20.0];
        assert_eq!(nearest_level(&levels, 7.0), Some(1));
        assert_eq!(nearest_level(&levels, 3.0), Some(0));
        assert_eq!(nearest_level(&levels, 16.0), Some(2));
        assert_eq!(nearest_level(&levels, -5.0), Some(0));
        assert_eq!(nearest_level(&levels, 99.0), Some(2));
        assert_eq!(nearest_level(&[], 1.0), None);
    }

    #[test]
    fn nearest_level_ties_keep_lower_index() {
        assert_eq!(nearest_level(&[0.0, 10.0, 20.0], 5.0), Some(0));
        assert_eq!(nearest_level(&[0.0, 10.0, 20.0], 15.0), Some(1));
    }

    #[test]
    fn encode_packs_nibbles() {
        let sample = encode(3, [255, 255], [10.0 + 3.0 / 16.0, 200.0 + 15.0 / 16.0]);
        assert_eq!(sample.value, [10, 200, 0x3f, 3]);
        assert_eq!(sample.id, 3);
    }

    #[test]
    fn decode_inverts_encode() {
        let store = store((255, 255));
        let levels = ContourLevels::default();
        let decoder = PickDecoder::new(&store, &levels, 7);

        for (ix, iy, nx, ny) in [(10, 20, 3, 12), (0, 0, 0, 0), (100, 253, 15, 8)] {
            let coordinate = [
                ix as Value + nx as Value / 16.0,
                iy as Value + ny as Value / 16.0,
            ];
            let sample = encode(7, [255, 255], coordinate);
            let pick = decoder.decode(&sample).unwrap();
            assert!((pick.coordinate[0] - coordinate[0]).abs() <= 1.0 / 16.0);
            assert!((pick.coordinate[1] - coordinate[1]).abs() <= 1.0 / 16.0);
            assert_eq!(pick.coordinate[0].floor() as usize, ix);
            assert_eq!(pick.coordinate[1].floor() as usize, iy);
        }
    }

    #[test]
    fn position_is_bilinear_blend_of_the_cell() {
        let store = store((255, 255));
        let levels = ContourLevels::default();
        let decoder = PickDecoder::new(&store, &levels, 1);
        let (ix, iy, fx, fy) = (4usize, 6usize, 0.25, 0.75);
        let sample = encode(1, [255, 255], [ix as Value + fx, iy as Value + fy]);
        let pick = decoder.decode(&sample).unwrap();

        let value = |i: usize, j: usize| (i * 3 + j * j) as Value;
        let expected = (1.0 - fx) * (1.0 - fy) * value(ix, iy)
            + (1.0 - fx) * fy * value(ix, iy + 1)
            + fx * (1.0 - fy) * value(ix + 1, iy)
            + fx * fy * value(ix + 1, iy + 1);
        assert!((pick.position.z - expected).abs() < 1e-3);
        assert!((pick.position.x - (ix as Value + fx)).abs() < 1e-4);
        assert!((pick.position.y - (iy as Value + fy)).abs() < 1e-4);
        assert_eq!(pick.cell_index, [4, 7]);
        assert_eq!(pick.data_coordinate, Point::new(4.0, 7.0, value(4, 7)));
    }

    #[test]
    fn wrong_id_is_a_miss() {
        let store = store((4, 4));
        let levels = ContourLevels::default();
        let decoder = PickDecoder::new(&store, &levels, 2);
        assert!(decoder.decode(&encode(1, [4, 4], [1.0, 1.0])).is_none());
        assert!(decoder.decode(&encode(2, [4, 4], [1.0, 1.0])).is_some());
    }

    #[test]
    fn levels_are_resolved_per_axis() {
        let store = store((255, 255));
        let levels = ContourLevels::new([vec![0.0, 10.0], vec![], vec![0.0, 50.0, 100.0]]);
        let decoder = PickDecoder::new(&store, &levels, 1);
        let pick = decoder.decode(&encode(1, [255, 255], [8.0, 5.0])).unwrap();
        // x = 8, value = 8 * 3 + 25 = 49
        assert_eq!(pick.level_index, [Some(1), None, Some(1)]);
    }

    #[test]
    fn hole_under_the_pick_is_a_miss() {
        let mut store = FieldStore::new();
        let mut field = Array2::<Value>::zeros((255, 255));
        field[[5, 5]] = Value::NAN;
        store.set_field(field.view(), None).unwrap();
        let levels = ContourLevels::default();
        let decoder = PickDecoder::new(&store, &levels, 1);
        assert!(decoder.decode(&encode(1, [255, 255], [4.5, 4.5])).is_none());
        assert!(decoder.decode(&encode(1, [255, 255], [20.5, 4.5])).is_some());
    }
}

//! Built-in colormaps for the surface colour lookup texture.

use crate::error::{Result, SurfaceError};

/// Entries in a colormap lookup table.
pub const PALETTE_SIZE: usize = 256;

/// A 256-entry RGBA8 lookup table, sampled by normalised field value.
pub type ColorTable = [[u8; 4]; PALETTE_SIZE];

/// Source of colormap tables by name.
pub trait Palette: Send + Sync {
    /// Returns the table for `name`, or [`SurfaceError::UnknownColormap`].
    fn table(&self, name: &str) -> Result<ColorTable>;
}

/// Named colormaps shipped with the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMap {
    Jet,
    Hot,
    Cool,
    Greys,
    BlueRed,
    Viridis,
}

impl ColorMap {
    pub const ALL: [ColorMap; 6] = [
        ColorMap::Jet,
        ColorMap::Hot,
        ColorMap::Cool,
        ColorMap::Greys,
        ColorMap::BlueRed,
        ColorMap::Viridis,
    ];

    pub fn from_name(name: &str) -> Option<ColorMap> {
        match name {
            "jet" => Some(ColorMap::Jet),
            "hot" => Some(ColorMap::Hot),
            "cool" => Some(ColorMap::Cool),
            "greys" => Some(ColorMap::Greys),
            "bluered" => Some(ColorMap::BlueRed),
            "viridis" => Some(ColorMap::Viridis),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorMap::Jet => "jet",
            ColorMap::Hot => "hot",
            ColorMap::Cool => "cool",
            ColorMap::Greys => "greys",
            ColorMap::BlueRed => "bluered",
            ColorMap::Viridis => "viridis",
        }
    }

    /// `(position, rgb)` anchors, positions ascending from 0 to 1.
    fn anchors(&self) -> &'static [(f32, [u8; 3])] {
        match self {
            ColorMap::Jet => &[
                (0.0, [0, 0, 131]),
                (0.125, [0, 60, 170]),
                (0.375, [5, 255, 255]),
                (0.625, [255, 255, 0]),
                (0.875, [250, 0, 0]),
                (1.0, [128, 0, 0]),
            ],
            ColorMap::Hot => &[
                (0.0, [0, 0, 0]),
                (0.3, [230, 0, 0]),
                (0.6, [255, 210, 0]),
                (1.0, [255, 255, 255]),
            ],
            ColorMap::Cool => &[(0.0, [0, 255, 255]), (1.0, [255, 0, 255])],
            ColorMap::Greys => &[(0.0, [0, 0, 0]), (1.0, [255, 255, 255])],
            ColorMap::BlueRed => &[(0.0, [0, 0, 255]), (1.0, [255, 0, 0])],
            ColorMap::Viridis => &[
                (0.0, [68, 1, 84]),
                (0.13, [71, 44, 122]),
                (0.25, [59, 81, 139]),
                (0.38, [44, 113, 142]),
                (0.5, [33, 144, 141]),
                (0.63, [39, 173, 129]),
                (0.75, [92, 200, 99]),
                (0.88, [170, 220, 50]),
                (1.0, [253, 231, 37]),
            ],
        }
    }

    /// Colour at `t` in `0..=1` by piecewise-linear interpolation of the anchors.
    pub fn sample(&self, t: f32) -> [u8; 4] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let anchors = self.anchors();
        let upper = anchors
            .iter()
            .position(|(at, _)| *at >= t)
            .unwrap_or(anchors.len() - 1);
        if upper == 0 {
            let [r, g, b] = anchors[0].1;
            return [r, g, b, 255];
        }

        let (t0, c0) = anchors[upper - 1];
        let (t1, c1) = anchors[upper];
        let f = (t - t0) / (t1 - t0);
        let channel = |k: usize| (c0[k] as f32 + (c1[k] as f32 - c0[k] as f32) * f).round() as u8;
        [channel(0), channel(1), channel(2), 255]
    }

    pub fn table(&self) -> ColorTable {
        std::array::from_fn(|i| self.sample(i as f32 / (PALETTE_SIZE - 1) as f32))
    }
}

/// The palette service backed by [`ColorMap`].
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinPalette;

impl Palette for BuiltinPalette {
    fn table(&self, name: &str) -> Result<ColorTable> {
        ColorMap::from_name(name)
            .map(|map| map.table())
            .ok_or_else(|| SurfaceError::UnknownColormap(name.to_owned()))
    }
}

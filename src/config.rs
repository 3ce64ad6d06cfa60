//! Update options and the persistent drawing style they resolve into.
//!
//! Options that may be given once for all axes or separately per axis are carried
//! as [`AxisOption`] and resolved into plain `[T; 3]` arrays when they are merged
//! into a [`SurfaceStyle`]. Everything left unset in a [`SurfaceOptions`] keeps its
//! previous value.

use ndarray::{Array1, Array2};

use crate::{
    contour::ContourLevels,
    field::Coordinates,
    types::{AXES, Bounds, Rgba, VALUE_AXIS, Value},
};

/// A setting given either once for every axis or per axis.
#[derive(Clone, Debug, PartialEq)]
pub enum AxisOption<T> {
    Scalar(T),
    PerAxis([T; AXES]),
}

impl<T: Clone> AxisOption<T> {
    /// Canonical per-axis form.
    pub fn resolve(&self) -> [T; AXES] {
        match self {
            AxisOption::Scalar(v) => std::array::from_fn(|_| v.clone()),
            AxisOption::PerAxis(v) => v.clone(),
        }
    }
}

/// Contour levels as supplied by the caller. Unsorted input is fine.
#[derive(Clone, Debug, PartialEq)]
pub enum Levels {
    /// A plain list contours the value field only.
    Value(Vec<Value>),
    PerAxis([Vec<Value>; AXES]),
}

impl Levels {
    pub fn resolve(&self) -> ContourLevels {
        match self {
            Levels::Value(levels) => {
                let mut axes: [Vec<Value>; AXES] = Default::default();
                axes[VALUE_AXIS] = levels.clone();
                ContourLevels::new(axes)
            }
            Levels::PerAxis(levels) => ContourLevels::new(levels.clone()),
        }
    }
}

/// Colormap selection.
#[derive(Clone, Debug, PartialEq)]
pub enum Colormap {
    /// One of the built-in palette names.
    Named(String),
    /// Explicit colour table. Accepted but ignored: only named colormaps are applied.
    Table(Vec<[u8; 4]>),
}

pub const DEFAULT_COLORMAP: &str = "jet";
pub const DEFAULT_PICK_ID: u8 = 1;

/// Input of a surface update. Unset fields leave the current state unchanged.
///
/// ```rust,ignore
/// let options = SurfaceOptions::new()
///     .with_field(heights)
///     .with_ticks(xs, ys)
///     .with_levels(Levels::Value(vec![0.0, 0.5, 1.0]))
///     .with_colormap("viridis");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurfaceOptions {
    pub field: Option<Array2<Value>>,
    /// Explicit coordinates; `coords` and `ticks` are mutually exclusive by construction.
    pub coordinates: Option<Coordinates>,
    pub levels: Option<Levels>,
    pub colormap: Option<Colormap>,
    pub contour_width: Option<AxisOption<f32>>,
    pub dynamic_width: Option<AxisOption<f32>>,
    pub highlight_width: Option<AxisOption<f32>>,
    pub show_surface: Option<bool>,
    pub show_contour: Option<AxisOption<bool>>,
    pub pick_id: Option<u8>,
    pub contour_color: Option<AxisOption<Rgba>>,
    pub dynamic_color: Option<AxisOption<Rgba>>,
    pub highlight_color: Option<AxisOption<Rgba>>,
    pub surface_project: Option<[bool; AXES]>,
    pub contour_project: Option<[bool; AXES]>,
    pub axes_bounds: Option<Bounds>,
    pub opacity: Option<f32>,
}

impl SurfaceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: Array2<Value>) -> Self {
        self.field = Some(field);
        self
    }

    /// Full coordinate grids, each matching the field's shape.
    pub fn with_coords(mut self, x: Array2<Value>, y: Array2<Value>) -> Self {
        self.coordinates = Some(Coordinates::Grid { x, y });
        self
    }

    /// Row ticks (`x`, one per row) and column ticks (`y`, one per column).
    pub fn with_ticks(mut self, x: Array1<Value>, y: Array1<Value>) -> Self {
        self.coordinates = Some(Coordinates::Ticks { x, y });
        self
    }

    pub fn with_levels(mut self, levels: Levels) -> Self {
        self.levels = Some(levels);
        self
    }

    pub fn with_colormap(mut self, name: impl Into<String>) -> Self {
        self.colormap = Some(Colormap::Named(name.into()));
        self
    }

    pub fn with_contour_width(mut self, width: AxisOption<f32>) -> Self {
        self.contour_width = Some(width);
        self
    }

    pub fn with_dynamic_width(mut self, width: AxisOption<f32>) -> Self {
        self.dynamic_width = Some(width);
        self
    }

    pub fn with_highlight_width(mut self, width: AxisOption<f32>) -> Self {
        self.highlight_width = Some(width);
        self
    }

    pub fn with_show_surface(mut self, show: bool) -> Self {
        self.show_surface = Some(show);
        self
    }

    pub fn with_show_contour(mut self, show: AxisOption<bool>) -> Self {
        self.show_contour = Some(show);
        self
    }

    pub fn with_pick_id(mut self, id: u8) -> Self {
        self.pick_id = Some(id);
        self
    }

    pub fn with_contour_color(mut self, color: AxisOption<Rgba>) -> Self {
        self.contour_color = Some(color);
        self
    }

    pub fn with_dynamic_color(mut self, color: AxisOption<Rgba>) -> Self {
        self.dynamic_color = Some(color);
        self
    }

    pub fn with_highlight_color(mut self, color: AxisOption<Rgba>) -> Self {
        self.highlight_color = Some(color);
        self
    }

    pub fn with_surface_project(mut self, project: [bool; AXES]) -> Self {
        self.surface_project = Some(project);
        self
    }

    pub fn with_contour_project(mut self, project: [bool; AXES]) -> Self {
        self.contour_project = Some(project);
        self
    }

    pub fn with_axes_bounds(mut self, bounds: Bounds) -> Self {
        self.axes_bounds = Some(bounds);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    /// Name of the requested colormap, if a named one was given.
    pub fn colormap_name(&self) -> Option<&str> {
        match &self.colormap {
            Some(Colormap::Named(name)) => Some(name),
            _ => None,
        }
    }
}

/// Resolved drawing state of a surface.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceStyle {
    pub colormap: String,
    pub contour_width: [f32; AXES],
    pub dynamic_width: [f32; AXES],
    pub highlight_width: [f32; AXES],
    pub show_surface: bool,
    pub show_contour: [bool; AXES],
    pub pick_id: u8,
    pub contour_color: [Rgba; AXES],
    pub dynamic_color: [Rgba; AXES],
    pub highlight_color: [Rgba; AXES],
    pub surface_project: [bool; AXES],
    pub contour_project: [bool; AXES],
    /// Box the projections flatten onto.
    pub axes_bounds: Bounds,
    pub opacity: f32,
}

impl Default for SurfaceStyle {
    fn default() -> Self {
        const BLACK: Rgba = [0.0, 0.0, 0.0, 1.0];
        Self {
            colormap: DEFAULT_COLORMAP.to_owned(),
            contour_width: [1.0; AXES],
            dynamic_width: [1.0; AXES],
            highlight_width: [1.0; AXES],
            show_surface: true,
            show_contour: [true; AXES],
            pick_id: DEFAULT_PICK_ID,
            contour_color: [BLACK; AXES],
            dynamic_color: [BLACK; AXES],
            highlight_color: [BLACK; AXES],
            surface_project: [false; AXES],
            contour_project: [false; AXES],
            axes_bounds: Bounds::unbounded(),
            opacity: 1.0,
        }
    }
}

impl SurfaceStyle {
    /// Returns a copy of `self` with every option set in `options` applied.
    pub fn merged(&self, options: &SurfaceOptions) -> SurfaceStyle {
        let mut style = self.clone();
        if let Some(name) = options.colormap_name() {
            style.colormap = name.to_owned();
        }
        resolve_into(&mut style.contour_width, &options.contour_width);
        resolve_into(&mut style.dynamic_width, &options.dynamic_width);
        resolve_into(&mut style.highlight_width, &options.highlight_width);
        resolve_into(&mut style.show_contour, &options.show_contour);
        resolve_into(&mut style.contour_color, &options.contour_color);
        resolve_into(&mut style.dynamic_color, &options.dynamic_color);
        resolve_into(&mut style.highlight_color, &options.highlight_color);
        if let Some(show) = options.show_surface {
            style.show_surface = show;
        }
        if let Some(id) = options.pick_id {
            style.pick_id = id;
        }
        if let Some(project) = options.surface_project {
            style.surface_project = project;
        }
        if let Some(project) = options.contour_project {
            style.contour_project = project;
        }
        if let Some(bounds) = options.axes_bounds {
            style.axes_bounds = bounds;
        }
        if let Some(opacity) = options.opacity {
            style.opacity = opacity.clamp(0.0, 1.0);
        }
        style
    }
}

fn resolve_into<T: Clone>(target: &mut [T; AXES], option: &Option<AxisOption<T>>) {
    if let Some(option) = option {
        *target = option.resolve();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_option_fans_out() {
        assert_eq!(AxisOption::Scalar(2.0).resolve(), [2.0, 2.0, 2.0]);
        assert_eq!(
            AxisOption::PerAxis([true, false, true]).resolve(),
            [true, false, true]
        );
    }

    #[test]
    fn plain_level_list_targets_the_value_axis() {
        let levels = Levels::Value(vec![3.0, 1.0, 2.0]).resolve();
        assert!(levels.axis(0).is_empty());
        assert!(levels.axis(1).is_empty());
        assert_eq!(levels.axis(2), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn merge_keeps_unset_options() {
        let base = SurfaceStyle::default().merged(
            &SurfaceOptions::new()
                .with_contour_width(AxisOption::PerAxis([1.0, 2.0, 3.0]))
                .with_pick_id(9),
        );
        let style = base.merged(&SurfaceOptions::new().with_colormap("hot"));
        assert_eq!(style.colormap, "hot");
        assert_eq!(style.contour_width, [1.0, 2.0, 3.0]);
        assert_eq!(style.pick_id, 9);
        assert!(style.show_surface);
    }

    #[test]
    fn table_colormap_is_ignored() {
        let options = SurfaceOptions {
            colormap: Some(Colormap::Table(vec![[255, 0, 0, 255]])),
            ..Default::default()
        };
        let style = SurfaceStyle::default().merged(&options);
        assert_eq!(style.colormap, DEFAULT_COLORMAP);
    }

    #[test]
    fn opacity_is_clamped() {
        let style = SurfaceStyle::default().merged(&SurfaceOptions::new().with_opacity(3.0));
        assert_eq!(style.opacity, 1.0);
    }
}

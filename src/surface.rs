use std::sync::Arc;

use ndarray::Array2;

use crate::{
    arena::Scratch,
    config::{SurfaceOptions, SurfaceStyle},
    contour::{
        ContourExtractor, ContourLevels, ContourSet, ContourVertex, DynamicContourTracker,
        DynamicContours,
    },
    error::{Result, SurfaceError},
    field::FieldStore,
    mesh::{MeshTessellator, SurfaceMesh, SurfaceVertex, VERTICES_PER_CELL},
    palette::{BuiltinPalette, ColorTable, Palette},
    pick::{PickDecoder, PickResult, PickSample},
    types::{AXES, Bounds, Value},
};

/// Revision counters of the parts of a snapshot, for renderers that upload lazily.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Revisions {
    /// Surface mesh and static contours.
    pub geometry: u64,
    pub dynamic: u64,
    pub colormap: u64,
    /// Style options and highlight.
    pub style: u64,
}

/// Everything a renderer needs to draw a surface, frozen at publication time.
///
/// Published as `Arc<SurfaceSnapshot>` after every successful mutation; draws and
/// picks only ever see a complete snapshot.
#[derive(Clone, Debug)]
pub struct SurfaceSnapshot {
    pub revisions: Revisions,
    /// Logical `[rows, cols]` of the field.
    pub shape: [usize; 2],
    pub mesh: SurfaceMesh,
    pub contours: ContourSet,
    pub dynamic: DynamicContours,
    pub levels: ContourLevels,
    pub style: SurfaceStyle,
    pub colormap: Arc<ColorTable>,
    /// Highlighted level index per axis.
    pub highlight: [Option<usize>; AXES],
}

impl Default for SurfaceSnapshot {
    fn default() -> Self {
        Self {
            revisions: Revisions::default(),
            shape: [0, 0],
            mesh: SurfaceMesh::default(),
            contours: ContourSet::default(),
            dynamic: DynamicContours::default(),
            levels: ContourLevels::default(),
            style: SurfaceStyle::default(),
            colormap: Arc::new([[0; 4]; crate::palette::PALETTE_SIZE]),
            highlight: [None; AXES],
        }
    }
}

/// A height surface with per-axis contours over a 2-D scalar field.
///
/// ```rust,ignore
/// let mut plot = SurfacePlot::new(
///     &SurfaceOptions::new()
///         .with_field(heights)
///         .with_levels(Levels::Value(vec![0.25, 0.5, 0.75])),
/// )?;
/// plot.dynamic([f32::NAN, f32::NAN, 0.4]);
/// let hit = plot.pick(&sample);
/// plot.highlight(hit.as_ref());
/// ```
#[derive(Debug)]
pub struct SurfacePlot<P: Palette = BuiltinPalette> {
    store: FieldStore,
    tracker: DynamicContourTracker,
    mesh_scratch: Scratch<SurfaceVertex>,
    contour_scratch: Scratch<ContourVertex>,
    palette: P,
    snapshot: Arc<SurfaceSnapshot>,
}

impl SurfacePlot<BuiltinPalette> {
    /// Creates a plot from its first options, which must include a field.
    pub fn new(options: &SurfaceOptions) -> Result<Self> {
        Self::with_palette(BuiltinPalette, options)
    }
}

impl<P: Palette> SurfacePlot<P> {
    pub fn with_palette(palette: P, options: &SurfaceOptions) -> Result<Self> {
        if options.field.is_none() {
            return Err(SurfaceError::MissingField);
        }
        let mut plot = Self {
            store: FieldStore::new(),
            tracker: DynamicContourTracker::new(),
            mesh_scratch: Scratch::new(),
            contour_scratch: Scratch::new(),
            palette,
            snapshot: Arc::new(SurfaceSnapshot::default()),
        };

        let style = SurfaceStyle::default();
        let name = options.colormap_name().unwrap_or(&style.colormap).to_owned();
        plot.snapshot = Arc::new(SurfaceSnapshot {
            colormap: Arc::new(plot.palette.table(&name)?),
            style: SurfaceStyle {
                colormap: name,
                ..style
            },
            ..SurfaceSnapshot::default()
        });
        plot.update(options)?;
        Ok(plot)
    }

    /// Applies `options` and publishes a new snapshot.
    ///
    /// All inputs are checked before anything is touched: on error the plot and its
    /// published snapshot are exactly as before the call.
    pub fn update(&mut self, options: &SurfaceOptions) -> Result<()> {
        let current = Arc::clone(&self.snapshot);
        let shape = match &options.field {
            Some(field) => [field.nrows(), field.ncols()],
            None => self.store.shape(),
        };
        if let Some(coordinates) = &options.coordinates {
            coordinates.validate(shape)?;
        }
        if options.pick_id == Some(0) {
            return Err(SurfaceError::InvalidPickId);
        }
        let colormap = match options.colormap_name() {
            Some(name) if name != current.style.colormap => {
                Some(Arc::new(self.palette.table(name)?))
            }
            _ => None,
        };

        let style = current.style.merged(options);
        let levels = match &options.levels {
            Some(levels) => levels.resolve(),
            None => current.levels.clone(),
        };
        let fields_changed = options.field.is_some() || options.coordinates.is_some();
        let levels_changed = levels != current.levels;

        let mut next = SurfaceSnapshot {
            style,
            levels,
            ..(*current).clone()
        };

        if fields_changed {
            match &options.field {
                Some(field) => self.store.set_field(field.view(), options.coordinates.as_ref())?,
                None => {
                    let values: Array2<Value> = self.store.values();
                    self.store.set_field(values.view(), options.coordinates.as_ref())?;
                }
            }
            next.shape = self.store.shape();
            next.mesh = self.tessellate();
            next.dynamic = DynamicContours::default();
        }
        if fields_changed || levels_changed {
            next.contours = self.extract_contours(&next.levels);
            next.highlight = [None; AXES];
            next.revisions.geometry += 1;
        }
        if let Some(table) = colormap {
            next.colormap = table;
            next.revisions.colormap += 1;
        }
        if fields_changed {
            next.revisions.dynamic += 1;
        }
        if next.style != current.style || next.highlight != current.highlight {
            next.revisions.style += 1;
        }

        tracing::debug!(
            shape = ?next.shape,
            vertices = next.mesh.vertex_count(),
            contour_vertices = next.contours.vertex_count(),
            "surface updated"
        );
        self.snapshot = Arc::new(next);
        Ok(())
    }

    /// Recomputes the live contours: one level per axis, `NaN` for none.
    pub fn dynamic(&mut self, levels: [Value; AXES]) {
        let dynamic = self.tracker.update(&self.store, levels);
        let mut next = (*self.snapshot).clone();
        next.dynamic = dynamic;
        next.revisions.dynamic += 1;
        self.snapshot = Arc::new(next);
    }

    /// Highlights the contour levels nearest to a pick, or clears the highlight.
    pub fn highlight(&mut self, pick: Option<&PickResult>) {
        let highlight = pick.map_or([None; AXES], |p| p.level_index);
        if highlight == self.snapshot.highlight {
            return;
        }
        let mut next = (*self.snapshot).clone();
        next.highlight = highlight;
        next.revisions.style += 1;
        self.snapshot = Arc::new(next);
    }

    /// Decodes a pick-pass pixel against the current field and levels.
    pub fn pick(&self, sample: &PickSample) -> Option<PickResult> {
        let snapshot = &self.snapshot;
        PickDecoder::new(&self.store, &snapshot.levels, snapshot.style.pick_id).decode(sample)
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<SurfaceSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Bounds of the emitted surface vertices.
    pub fn bounds(&self) -> Bounds {
        self.snapshot.mesh.bounds
    }

    pub fn shape(&self) -> [usize; 2] {
        self.store.shape()
    }

    pub fn style(&self) -> &SurfaceStyle {
        &self.snapshot.style
    }

    /// Returns all pooled memory. Snapshots already handed out stay valid.
    pub fn dispose(mut self) {
        self.store.release();
        self.tracker.release();
        self.mesh_scratch.release();
        self.contour_scratch.release();
        tracing::debug!("surface disposed");
    }

    fn tessellate(&mut self) -> SurfaceMesh {
        let [rows, cols] = self.store.shape();
        let cells = rows.saturating_sub(1) * cols.saturating_sub(1);
        self.mesh_scratch.reserve(cells * VERTICES_PER_CELL);
        let store = &self.store;
        self.mesh_scratch.scope(|buf| {
            let bounds = MeshTessellator.build(store, buf);
            SurfaceMesh {
                vertices: Arc::from(&buf[..]),
                bounds,
            }
        })
    }

    fn extract_contours(&mut self, levels: &ContourLevels) -> ContourSet {
        let store = &self.store;
        self.contour_scratch.scope(|buf| {
            let ranges = ContourExtractor.build_all(store, levels, buf);
            ContourSet {
                vertices: Arc::from(&buf[..]),
                ranges,
            }
        })
    }
}

use bevy::{asset::RenderAssetUsages, mesh::PrimitiveTopology, prelude::*};

use crate::{
    config::SurfaceOptions,
    contour::ContourVertex,
    palette::ColorTable,
    pick::{PickResult, PickSample},
    surface::{Revisions, SurfacePlot, SurfaceSnapshot},
    types::{AXES, Rgba, Value},
};

/// System sets for the surface plot pipeline.
///
/// Use these to order your own systems relative to the geometry rebuild:
///
/// ```rust,ignore
/// // Read fresh pick results before the meshes are re-uploaded:
/// app.add_systems(Update, show_tooltip.after(SurfacePlotSet::Update)
///                                     .before(SurfacePlotSet::Upload));
/// ```
///
/// ```text
/// SurfacePlotSet::Update  →  [your systems]  →  SurfacePlotSet::Upload
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SurfacePlotSet {
    /// Applies [`SurfaceRequest`], [`DynamicContourRequest`] and [`PickRequest`] components.
    Update,
    /// Rebuilds the Bevy meshes of every [`Surface`] whose snapshot changed.
    Upload,
}

/// Asks for a surface update. On an entity without a [`Surface`] it creates one, in
/// which case the options must carry a field.
///
/// Removed once applied, whether or not the update succeeded.
#[derive(Component, Clone, Debug)]
pub struct SurfaceRequest(pub SurfaceOptions);

/// Asks for the live contours to be recomputed, one level per axis (`NaN` for none).
#[derive(Component, Clone, Copy, Debug)]
pub struct DynamicContourRequest(pub [Value; AXES]);

/// Asks for a pick-pass pixel to be decoded against the surface.
#[derive(Component, Clone, Copy, Debug)]
pub struct PickRequest {
    pub sample: PickSample,
    /// Also highlight the nearest contour levels of the hit (or clear on a miss).
    pub highlight: bool,
}

/// Outcome of the last [`PickRequest`].
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Picked(pub Option<PickResult>);

/// Marker of the child entity holding the static contour lines.
#[derive(Component)]
pub struct ContourLines;

/// Marker of the child entity holding the live contour lines.
#[derive(Component)]
pub struct DynamicLines;

/// A plotted surface. The surface mesh lives on this entity; contour lines live on
/// [`ContourLines`] and [`DynamicLines`] children.
#[derive(Component)]
#[require(Transform, Visibility)]
pub struct Surface {
    plot: SurfacePlot,
    uploaded: Option<Revisions>,
    contours: Option<Entity>,
    dynamic: Option<Entity>,
    /// Surface material and the opacity it was built for.
    surface_material: Option<(f32, Handle<StandardMaterial>)>,
    line_material: Option<Handle<StandardMaterial>>,
}

impl Surface {
    pub fn new(plot: SurfacePlot) -> Self {
        Self {
            plot,
            uploaded: None,
            contours: None,
            dynamic: None,
            surface_material: None,
            line_material: None,
        }
    }

    pub fn plot(&self) -> &SurfacePlot {
        &self.plot
    }

    /// Mutable access; changes are picked up by the next [`SurfacePlotSet::Upload`].
    pub fn plot_mut(&mut self) -> &mut SurfacePlot {
        &mut self.plot
    }
}

/// Runtime configuration for the surface plot pipeline.
///
/// Inserted as a resource by [`SurfacePlotPlugin`]:
///
/// ```rust,ignore
/// app.add_plugins(SurfacePlotPlugin { max_updates_per_frame: 1 });
/// ```
#[derive(Resource)]
pub struct SurfacePlotConfig {
    /// Maximum number of [`SurfaceRequest`]s applied per frame.
    ///
    /// Each request may re-tessellate a whole field, so a burst of requests is
    /// spread over several frames. Default: `4`.
    pub max_updates_per_frame: usize,
}

impl Default for SurfacePlotConfig {
    fn default() -> Self {
        Self {
            max_updates_per_frame: 4,
        }
    }
}

/// Bevy plugin that keeps [`Surface`] entities and their meshes up to date.
///
/// ```text
/// SurfaceRequest inserted
///   → SurfacePlot created or updated     (SurfacePlotSet::Update)
///   → [your systems here]
///   → Mesh3d (re)built for changed parts (SurfacePlotSet::Upload)
/// ```
pub struct SurfacePlotPlugin {
    /// Initial value for [`SurfacePlotConfig::max_updates_per_frame`].
    pub max_updates_per_frame: usize,
}

impl Default for SurfacePlotPlugin {
    fn default() -> Self {
        Self {
            max_updates_per_frame: SurfacePlotConfig::default().max_updates_per_frame,
        }
    }
}

impl Plugin for SurfacePlotPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SurfacePlotConfig {
            max_updates_per_frame: self.max_updates_per_frame,
        });

        #[cfg(feature = "auto_update")]
        app.configure_sets(
            Update,
            (SurfacePlotSet::Update, SurfacePlotSet::Upload).chain(),
        )
        .add_systems(
            Update,
            (
                (
                    apply_surface_requests,
                    apply_dynamic_requests,
                    apply_pick_requests,
                )
                    .chain()
                    .in_set(SurfacePlotSet::Update),
                upload_surfaces.in_set(SurfacePlotSet::Upload),
            ),
        );
    }
}

/// Applies pending [`SurfaceRequest`]s, up to [`SurfacePlotConfig::max_updates_per_frame`] per frame.
fn apply_surface_requests(
    mut commands: Commands,
    config: Res<SurfacePlotConfig>,
    mut query: Query<(Entity, &SurfaceRequest, Option<&mut Surface>)>,
) {
    for (entity, request, surface) in query.iter_mut().take(config.max_updates_per_frame) {
        let mut entity_commands = commands.entity(entity);
        entity_commands.remove::<SurfaceRequest>();
        match surface {
            Some(mut surface) => {
                if let Err(err) = surface.plot.update(&request.0) {
                    warn!("surface update on {entity} rejected: {err}");
                }
            }
            None => match SurfacePlot::new(&request.0) {
                Ok(plot) => {
                    debug!("surface created on {entity}, shape {:?}", plot.shape());
                    entity_commands.insert(Surface::new(plot));
                }
                Err(err) => error!("could not create surface on {entity}: {err}"),
            },
        }
    }
}

fn apply_dynamic_requests(
    mut commands: Commands,
    mut query: Query<(Entity, &DynamicContourRequest, &mut Surface)>,
) {
    for (entity, request, mut surface) in query.iter_mut() {
        surface.plot.dynamic(request.0);
        commands.entity(entity).remove::<DynamicContourRequest>();
    }
}

fn apply_pick_requests(
    mut commands: Commands,
    mut query: Query<(Entity, &PickRequest, &mut Surface)>,
) {
    for (entity, request, mut surface) in query.iter_mut() {
        let hit = surface.plot.pick(&request.sample);
        if request.highlight {
            surface.plot.highlight(hit.as_ref());
        }
        commands
            .entity(entity)
            .insert(Picked(hit))
            .remove::<PickRequest>();
    }
}

/// Which Bevy meshes of a [`Surface`] are out of date against its snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StaleParts {
    pub surface: bool,
    pub contours: bool,
    pub dynamic: bool,
}

impl StaleParts {
    pub const ALL: StaleParts = StaleParts {
        surface: true,
        contours: true,
        dynamic: true,
    };

    /// Compares the revisions last uploaded (`None` before the first upload) with
    /// the current ones.
    pub fn between(uploaded: Option<Revisions>, current: Revisions) -> Self {
        let Some(uploaded) = uploaded else {
            return Self::ALL;
        };
        let geometry = uploaded.geometry != current.geometry;
        let style = uploaded.style != current.style;
        Self {
            surface: geometry || style || uploaded.colormap != current.colormap,
            contours: geometry || style,
            dynamic: style || uploaded.dynamic != current.dynamic,
        }
    }

    pub fn any(&self) -> bool {
        self.surface || self.contours || self.dynamic
    }
}

/// Rebuilds the meshes of surfaces whose snapshot revisions moved since the last
/// upload. Only the stale parts are rebuilt; materials are kept across uploads.
fn upload_surfaces(
    mut commands: Commands,
    mut query: Query<(Entity, &mut Surface)>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (entity, mut surface) in query.iter_mut() {
        let snapshot = surface.plot.snapshot();
        let stale = StaleParts::between(surface.uploaded, snapshot.revisions);
        if !stale.any() {
            continue;
        }

        let contours = *surface.contours.get_or_insert_with(|| {
            commands
                .spawn((ContourLines, Transform::default(), Visibility::default(), ChildOf(entity)))
                .id()
        });
        let dynamic = *surface.dynamic.get_or_insert_with(|| {
            commands
                .spawn((DynamicLines, Transform::default(), Visibility::default(), ChildOf(entity)))
                .id()
        });
        let line_material = surface
            .line_material
            .get_or_insert_with(|| materials.add(line_material()))
            .clone();

        if stale.surface {
            let opacity = snapshot.style.opacity;
            let reused = surface
                .surface_material
                .as_ref()
                .filter(|(built_for, _)| *built_for == opacity)
                .map(|(_, handle)| handle.clone());
            let material = match reused {
                Some(handle) => handle,
                None => {
                    let handle = materials.add(surface_material(opacity));
                    surface.surface_material = Some((opacity, handle.clone()));
                    handle
                }
            };
            attach(&mut commands, entity, surface_mesh(&snapshot), material, &mut meshes);
        }
        if stale.contours {
            let mesh = contour_mesh(&snapshot);
            attach(&mut commands, contours, mesh, line_material.clone(), &mut meshes);
        }
        if stale.dynamic {
            attach(&mut commands, dynamic, dynamic_mesh(&snapshot), line_material, &mut meshes);
        }

        debug!("uploaded {stale:?} of surface {entity} at {:?}", snapshot.revisions);
        surface.uploaded = Some(snapshot.revisions);
    }
}

/// Puts `mesh` on `target`, or strips the mesh components when there is nothing to draw.
fn attach(
    commands: &mut Commands,
    target: Entity,
    mesh: Option<Mesh>,
    material: Handle<StandardMaterial>,
    meshes: &mut Assets<Mesh>,
) {
    let mut target = commands.entity(target);
    match mesh {
        Some(mesh) => {
            target.insert((Mesh3d(meshes.add(mesh)), MeshMaterial3d(material)));
        }
        None => {
            target.remove::<(Mesh3d, MeshMaterial3d<StandardMaterial>)>();
        }
    }
}

fn surface_material(opacity: f32) -> StandardMaterial {
    StandardMaterial {
        base_color: Color::srgba(1.0, 1.0, 1.0, opacity),
        alpha_mode: if opacity < 1.0 {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        },
        double_sided: true,
        cull_mode: None,
        perceptual_roughness: 0.8,
        ..default()
    }
}

fn line_material() -> StandardMaterial {
    StandardMaterial {
        base_color: Color::WHITE,
        unlit: true,
        ..default()
    }
}

/// Converts an sRGB colour to the linear vertex colour Bevy expects.
fn linear(color: Rgba) -> [f32; 4] {
    let c = Color::srgba(color[0], color[1], color[2], color[3]).to_linear();
    [c.red, c.green, c.blue, c.alpha]
}

/// Colormap entry for `value`, normalised into the value range `[lo, hi]`.
fn colormap_lookup(table: &ColorTable, value: Value, lo: Value, hi: Value) -> [f32; 4] {
    let t = if hi > lo { (value - lo) / (hi - lo) } else { 0.0 };
    let index = (t.clamp(0.0, 1.0) * (table.len() - 1) as Value).round() as usize;
    let [r, g, b, a] = table[index];
    linear([r, g, b, a].map(|c| c as f32 / 255.0))
}

/// Triangle-list mesh of the surface, coloured through the colormap.
///
/// Positions are the data-space `(x, y, value)` of each vertex; orient the entity's
/// [`Transform`] to choose which data axis points up.
pub fn surface_mesh(snapshot: &SurfaceSnapshot) -> Option<Mesh> {
    let vertices = &snapshot.mesh.vertices;
    if !snapshot.style.show_surface || vertices.is_empty() {
        return None;
    }
    let (lo, hi) = (snapshot.mesh.bounds.lo.z, snapshot.mesh.bounds.hi.z);

    let positions: Vec<[f32; 3]> = vertices.iter().map(|v| v.position()).collect();
    let normals: Vec<[f32; 3]> = vertices.iter().map(|v| v.normal).collect();
    let uvs: Vec<[f32; 2]> = vertices.iter().map(|v| v.grid).collect();
    let colors: Vec<[f32; 4]> = vertices
        .iter()
        .map(|v| colormap_lookup(&snapshot.colormap, v.value[0], lo, hi))
        .collect();

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    Some(mesh)
}

/// Line-list mesh of every visible static contour, highlighted levels in their own colour.
pub fn contour_mesh(snapshot: &SurfaceSnapshot) -> Option<Mesh> {
    let style = &snapshot.style;
    let mut positions = Vec::new();
    let mut colors = Vec::new();
    for axis in (0..AXES).filter(|axis| style.show_contour[*axis]) {
        for level in 0..snapshot.contours.ranges[axis].len() {
            let color = if snapshot.highlight[axis] == Some(level) {
                style.highlight_color[axis]
            } else {
                style.contour_color[axis]
            };
            let vertices = snapshot.contours.level_vertices(axis, level);
            push_lines(&mut positions, &mut colors, vertices, linear(color));
        }
    }
    line_mesh(positions, colors)
}

/// Line-list mesh of the live contours.
pub fn dynamic_mesh(snapshot: &SurfaceSnapshot) -> Option<Mesh> {
    let dynamic = &snapshot.dynamic;
    let mut positions = Vec::new();
    let mut colors = Vec::new();
    for axis in 0..AXES {
        let range = dynamic.offsets[axis]..dynamic.offsets[axis] + dynamic.counts[axis];
        let color = linear(snapshot.style.dynamic_color[axis]);
        push_lines(&mut positions, &mut colors, &dynamic.vertices[range], color);
    }
    line_mesh(positions, colors)
}

fn push_lines(
    positions: &mut Vec<[f32; 3]>,
    colors: &mut Vec<[f32; 4]>,
    vertices: &[ContourVertex],
    color: [f32; 4],
) {
    positions.extend(vertices.iter().map(|v| v.position));
    colors.extend(std::iter::repeat_n(color, vertices.len()));
}

fn line_mesh(positions: Vec<[f32; 3]>, colors: Vec<[f32; 4]>) -> Option<Mesh> {
    if positions.is_empty() {
        return None;
    }
    let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::RENDER_WORLD);
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    Some(mesh)
}

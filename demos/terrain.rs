use bevy::prelude::*;
use bevy_infinite_grid::{InfiniteGridBundle, InfiniteGridPlugin, InfiniteGridSettings};
use bevy_surface_plot::{
    AxisOption, Levels, SurfaceOptions, SurfacePlotPlugin,
    pick::encode,
    plugin::{DynamicContourRequest, PickRequest, Picked, Surface, SurfaceRequest},
};
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};
use ndarray::Array2;
use noiz::prelude::*;

const ROWS: usize = 128;
const COLS: usize = 128;
const HEIGHT: f32 = 24.0;

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            SurfacePlotPlugin::default(),
            PanOrbitCameraPlugin,
            InfiniteGridPlugin,
        ))
        .add_systems(Startup, setup)
        .add_systems(Update, (sweep_dynamic_contour, pick_on_space, report_picks))
        .run();
}

fn terrain() -> Array2<f32> {
    let mut noise = Noise::<
        LayeredNoise<
            Normed<f32>,
            Persistence,
            Octave<MixCellGradients<OrthoGrid, Smoothstep, QuickGradients>>,
        >,
    >::default();
    noise.set_frequency(0.03);

    Array2::from_shape_fn((ROWS, COLS), |(i, j)| {
        let sample: f32 = noise.sample_for(Vec2::new(i as f32, j as f32));
        sample * HEIGHT
    })
}

fn setup(mut commands: Commands) {
    commands.spawn(InfiniteGridBundle {
        settings: InfiniteGridSettings {
            fadeout_distance: 1000.0,
            ..Default::default()
        },
        ..Default::default()
    });

    commands.spawn((
        Camera3d::default(),
        PanOrbitCamera {
            button_orbit: MouseButton::Right,
            button_pan: MouseButton::Middle,
            ..default()
        },
        Transform::from_xyz(0., 150., 150.).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: light_consts::lux::FULL_DAYLIGHT,
            ..Default::default()
        },
        Transform::default().with_rotation(Quat::from_rotation_x(-45.0_f32.to_radians())),
    ));

    let levels: Vec<f32> = (-4..=4).map(|k| k as f32 * HEIGHT / 5.0).collect();
    commands.spawn((
        SurfaceRequest(
            SurfaceOptions::new()
                .with_field(terrain())
                .with_levels(Levels::PerAxis([vec![32.0, 64.0, 96.0], vec![], levels]))
                .with_colormap("viridis")
                .with_contour_color(AxisOption::Scalar([0.1, 0.1, 0.1, 1.0]))
                .with_dynamic_color(AxisOption::Scalar([1.0, 0.3, 0.1, 1.0]))
                .with_highlight_color(AxisOption::Scalar([1.0, 1.0, 1.0, 1.0])),
        ),
        // Data space is (row, column, value); put the value axis up and centre the grid.
        Transform::from_rotation(Quat::from_rotation_x(-90.0_f32.to_radians()))
            .with_translation(Vec3::new(-(ROWS as f32) / 2.0, 0.0, COLS as f32 / 2.0)),
    ));
}

/// Sweeps a live value contour up and down the terrain.
fn sweep_dynamic_contour(
    mut commands: Commands,
    time: Res<Time>,
    query: Query<Entity, With<Surface>>,
) {
    let level = HEIGHT * 0.8 * time.elapsed_secs().sin();
    for entity in query.iter() {
        commands
            .entity(entity)
            .insert(DynamicContourRequest([f32::NAN, f32::NAN, level]));
    }
}

/// Stands in for a pick-pass readback: picks a random grid location on Space.
fn pick_on_space(
    mut commands: Commands,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    query: Query<Entity, With<Surface>>,
) {
    if !keyboard.just_pressed(KeyCode::Space) {
        return;
    }
    let t = time.elapsed_secs();
    let coordinate = [
        (t * 37.0) % ROWS as f32,
        (t * 53.0) % COLS as f32,
    ];
    for entity in query.iter() {
        commands.entity(entity).insert(PickRequest {
            sample: encode(1, [ROWS, COLS], coordinate),
            highlight: true,
        });
    }
}

fn report_picks(query: Query<&Picked, Changed<Picked>>) {
    for picked in query.iter() {
        match &picked.0 {
            Some(hit) => info!(
                "picked cell {:?} at {:?}, nearest levels {:?}",
                hit.cell_index, hit.position, hit.level_index
            ),
            None => info!("pick missed"),
        }
    }
}

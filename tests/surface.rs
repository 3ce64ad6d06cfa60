use std::sync::Arc;

use bevy_surface_plot::{
    AxisOption, Levels, SurfaceError, SurfaceOptions, SurfacePlot,
    pick::encode,
    types::{Point, Value},
};
use ndarray::{Array1, Array2, array};

fn peak() -> SurfaceOptions {
    SurfaceOptions::new()
        .with_field(array![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]])
        .with_levels(Levels::Value(vec![0.5]))
}

fn waves(rows: usize, cols: usize) -> Array2<Value> {
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        (i as Value * 0.35).sin() * (j as Value * 0.22).cos()
    })
}

#[test]
fn peak_end_to_end() {
    let plot = SurfacePlot::new(&peak()).unwrap();
    let snapshot = plot.snapshot();

    assert_eq!(snapshot.shape, [3, 3]);
    assert_eq!(snapshot.mesh.vertex_count(), 8 * 3);
    assert_eq!(plot.bounds().lo, Point::new(0.0, 0.0, 0.0));
    assert_eq!(plot.bounds().hi, Point::new(2.0, 2.0, 1.0));

    let ranges = &snapshot.contours.ranges;
    assert!(ranges[0].is_empty());
    assert!(ranges[1].is_empty());
    assert_eq!(ranges[2].len(), 1);
    assert_eq!(ranges[2][0].count, 8);

    // one closed loop: every endpoint appears in exactly two segments
    let loop_vertices = snapshot.contours.level_vertices(2, 0);
    for v in loop_vertices {
        assert_eq!(loop_vertices.iter().filter(|w| w.grid == v.grid).count(), 2);
        assert_eq!(v.position[2], 0.5);
    }
}

#[test]
fn identical_updates_are_byte_identical() {
    let options = SurfaceOptions::new()
        .with_field(waves(40, 33))
        .with_levels(Levels::PerAxis([
            vec![4.0, 12.5],
            vec![7.0],
            vec![-0.5, 0.0, 0.25, 0.5],
        ]));
    let a = SurfacePlot::new(&options).unwrap().snapshot();
    let b = SurfacePlot::new(&options).unwrap().snapshot();

    assert_eq!(a.mesh.as_bytes(), b.mesh.as_bytes());
    assert_eq!(a.contours.as_bytes(), b.contours.as_bytes());
    assert_eq!(a.contours.ranges, b.contours.ranges);
}

#[test]
fn shape_mismatch_leaves_everything_untouched() {
    let mut plot = SurfacePlot::new(&peak()).unwrap();
    let before = plot.snapshot();

    let err = plot
        .update(
            &SurfaceOptions::new()
                .with_field(waves(5, 4))
                .with_ticks(Array1::linspace(0.0, 1.0, 5), Array1::linspace(0.0, 1.0, 3))
                .with_opacity(0.2),
        )
        .unwrap_err();
    assert_eq!(
        err,
        SurfaceError::ShapeMismatch {
            what: "y ticks",
            expected: vec![4],
            found: vec![3],
        }
    );
    assert!(Arc::ptr_eq(&before, &plot.snapshot()));
    assert_eq!(plot.shape(), [3, 3]);

    // the plot still works after the rejected update
    plot.update(&SurfaceOptions::new().with_field(waves(5, 4))).unwrap();
    assert_eq!(plot.snapshot().mesh.vertex_count(), 6 * 4 * 3);
}

#[test]
fn coordinates_without_a_field_reuse_the_values() {
    let mut plot = SurfacePlot::new(&peak()).unwrap();
    plot.update(&SurfaceOptions::new().with_ticks(array![10.0, 20.0, 30.0], array![0.0, 1.0, 2.0]))
        .unwrap();
    let bounds = plot.bounds();
    assert_eq!(bounds.lo, Point::new(10.0, 0.0, 0.0));
    assert_eq!(bounds.hi, Point::new(30.0, 2.0, 1.0));
}

#[test]
fn missing_field_on_construction() {
    let err = SurfacePlot::new(&SurfaceOptions::new().with_colormap("hot")).unwrap_err();
    assert_eq!(err, SurfaceError::MissingField);
    assert_eq!(err.to_string(), "a surface requires a field on construction");
}

#[test]
fn holes_shrink_the_mesh_but_keep_contours_paired() {
    let mut field = waves(12, 12);
    field[[5, 6]] = Value::NAN;
    field[[0, 0]] = Value::INFINITY;
    let plot = SurfacePlot::new(
        &SurfaceOptions::new()
            .with_field(field)
            .with_levels(Levels::Value(vec![-0.3, 0.0, 0.3])),
    )
    .unwrap();
    let snapshot = plot.snapshot();

    assert_eq!(snapshot.mesh.vertex_count(), 6 * (11 * 11 - 4 - 1));
    for range in &snapshot.contours.ranges[2] {
        assert_eq!(range.count % 2, 0);
    }
    assert!(
        snapshot
            .contours
            .vertices
            .iter()
            .all(|v| v.position.iter().all(|c| c.is_finite()))
    );
}

#[test]
fn pick_through_the_plot() {
    let field = Array2::from_shape_fn((255, 128), |(i, j)| (i + j) as Value);
    let mut plot = SurfacePlot::new(
        &SurfaceOptions::new()
            .with_field(field)
            .with_pick_id(3)
            .with_levels(Levels::PerAxis([vec![0.0, 100.0, 200.0], vec![], vec![50.0, 150.0]])),
    )
    .unwrap();

    let sample = encode(3, [255, 128], [120.5, 40.25]);
    let hit = plot.pick(&sample).unwrap();
    assert_eq!(hit.cell_index, [121, 40]);
    assert!((hit.position.x - 120.5).abs() < 0.1);
    assert!((hit.position.z - (hit.position.x + hit.position.y)).abs() < 1e-3);
    assert_eq!(hit.level_index, [Some(1), None, Some(1)]);
    assert!((hit.uv[0] - hit.coordinate[0] / 255.0).abs() < 1e-6);

    assert!(plot.pick(&encode(1, [255, 128], [120.5, 40.25])).is_none());

    plot.highlight(Some(&hit));
    assert_eq!(plot.snapshot().highlight, [Some(1), None, Some(1)]);
}

#[test]
fn dynamic_contours_follow_the_requested_levels() {
    let mut plot = SurfacePlot::new(&SurfaceOptions::new().with_field(waves(20, 20))).unwrap();
    plot.dynamic([5.5, Value::NAN, 0.1]);
    let live = plot.snapshot().dynamic.clone();
    assert!(live.counts[0] > 0);
    assert_eq!(live.counts[1], 0);
    assert!(live.counts[2] > 0);
    assert_eq!(live.offsets[2], live.counts[0]);
    assert!(
        live.vertices[..live.counts[0]]
            .iter()
            .all(|v| v.position[0] == 5.5)
    );

    let previous = plot.snapshot().revisions.dynamic;
    plot.dynamic([Value::NAN; 3]);
    assert!(plot.snapshot().dynamic.is_empty());
    assert!(plot.snapshot().revisions.dynamic > previous);
}

#[test]
fn per_axis_style_options_resolve() {
    let mut plot = SurfacePlot::new(&peak()).unwrap();
    plot.update(
        &SurfaceOptions::new()
            .with_contour_width(AxisOption::Scalar(2.0))
            .with_show_contour(AxisOption::PerAxis([false, true, true]))
            .with_contour_color(AxisOption::PerAxis([
                [1.0, 0.0, 0.0, 1.0],
                [0.0, 1.0, 0.0, 1.0],
                [0.0, 0.0, 1.0, 1.0],
            ])),
    )
    .unwrap();
    let style = plot.style();
    assert_eq!(style.contour_width, [2.0; 3]);
    assert_eq!(style.show_contour, [false, true, true]);
    assert_eq!(style.contour_color[2], [0.0, 0.0, 1.0, 1.0]);
}

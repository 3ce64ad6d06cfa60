use crate::{
    contour::ContourRange,
    gpu::{
        Camera, DrawCall, DrawKind, DrawUniforms, GpuBackend, GpuBuffer, GpuTexture, Pass,
        Primitive,
    },
    palette::PALETTE_SIZE,
    surface::{Revisions, SurfaceSnapshot},
    types::{AXES, Bounds, Matrix, Rgba},
};

/// Half-extent the clip box is widened to along a projected axis.
pub const PROJECTION_CLIP: f32 = 1e8;

/// Model matrix that flattens geometry onto the axes-bounds face of `axis`.
///
/// Coordinate `axis` is zeroed and replaced by the `hi` face when the camera sees the
/// positive side of that axis (`cube_axis[axis] > 0`), the `lo` face otherwise.
pub fn projection_model(
    model: &Matrix,
    axes_bounds: &Bounds,
    cube_axis: i8,
    axis: usize,
) -> Matrix {
    let mut squish = Matrix::identity();
    squish[(axis, axis)] = 0.0;
    squish[(axis, 3)] = axes_bounds.corner(cube_axis > 0)[axis];
    model * squish
}

/// Clip box with `axis` opened up so flattened geometry is never clipped away.
pub fn projection_clip(clip_bounds: &Bounds, axis: usize) -> Bounds {
    let mut clip = *clip_bounds;
    clip.lo[axis] = -PROJECTION_CLIP;
    clip.hi[axis] = PROJECTION_CLIP;
    clip
}

/// Draws [`SurfaceSnapshot`]s through a [`GpuBackend`].
///
/// Device buffers are refreshed lazily: a part of the snapshot is uploaded only when
/// its revision differs from the last one seen.
pub struct SurfaceRenderer<B: GpuBackend> {
    backend: B,
    surface_buffer: B::Buffer,
    contour_buffer: B::Buffer,
    dynamic_buffer: B::Buffer,
    colormap: B::Texture,
    synced: Option<Revisions>,
}

impl<B: GpuBackend> SurfaceRenderer<B> {
    pub fn new(mut backend: B) -> Self {
        let surface_buffer = backend.create_buffer("surface");
        let contour_buffer = backend.create_buffer("contours");
        let dynamic_buffer = backend.create_buffer("dynamic contours");
        let colormap = backend.create_texture(PALETTE_SIZE, 1);
        Self {
            backend,
            surface_buffer,
            contour_buffer,
            dynamic_buffer,
            colormap,
            synced: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Uploads whatever changed since the last sync.
    pub fn sync(&mut self, snapshot: &SurfaceSnapshot) {
        let next = snapshot.revisions;
        let prev = self.synced;
        let stale = |part: fn(&Revisions) -> u64| prev.is_none_or(|p| part(&p) != part(&next));

        if stale(|r| r.geometry) {
            self.surface_buffer.update(snapshot.mesh.as_bytes());
            self.contour_buffer.update(snapshot.contours.as_bytes());
        }
        if stale(|r| r.dynamic) {
            self.dynamic_buffer.update(snapshot.dynamic.as_bytes());
        }
        if stale(|r| r.colormap) {
            self.colormap.set_pixels(&snapshot.colormap);
        }
        if prev != Some(next) {
            tracing::trace!(revisions = ?next, "surface buffers synced");
        }
        self.synced = Some(next);
    }

    /// Colour pass: surface, static contours (with highlight), live contours and the
    /// requested projections of each.
    pub fn draw(&mut self, snapshot: &SurfaceSnapshot, camera: &Camera) {
        self.sync(snapshot);
        let calls = color_calls(snapshot, camera);
        self.colormap.bind(0);
        self.submit(calls);
    }

    /// Pick pass: every pickable draw, encoded with the surface's pick id.
    pub fn draw_pick(&mut self, snapshot: &SurfaceSnapshot, camera: &Camera) {
        self.sync(snapshot);
        let calls = pick_calls(snapshot, camera);
        self.submit(calls);
    }

    /// Releases every device resource and hands the backend back.
    pub fn dispose(mut self) -> B {
        self.surface_buffer.dispose();
        self.contour_buffer.dispose();
        self.dynamic_buffer.dispose();
        self.colormap.dispose();
        tracing::debug!("surface renderer disposed");
        self.backend
    }

    fn submit(&mut self, calls: Vec<DrawCall>) {
        for call in calls {
            let buffer = match call.kind {
                DrawKind::Surface => &self.surface_buffer,
                DrawKind::Contour { .. } => &self.contour_buffer,
                DrawKind::Dynamic { .. } => &self.dynamic_buffer,
            };
            buffer.bind();
            self.backend.draw(buffer, &call);
        }
    }
}

fn base_uniforms(snapshot: &SurfaceSnapshot, camera: &Camera) -> DrawUniforms {
    DrawUniforms {
        model: camera.model,
        view: camera.view,
        projection: camera.projection,
        clip_bounds: camera.clip_bounds,
        lower_bound: snapshot.mesh.bounds.lo,
        upper_bound: snapshot.mesh.bounds.hi,
        color: None,
        line_width: 1.0,
        opacity: snapshot.style.opacity,
        shape: snapshot.shape,
        pick_id: snapshot.style.pick_id,
    }
}

/// Pushes `call`, then one flattened copy per axis enabled in `project`.
fn push_projected(
    calls: &mut Vec<DrawCall>,
    call: DrawCall,
    project: &[bool; AXES],
    snapshot: &SurfaceSnapshot,
    camera: &Camera,
) {
    for axis in (0..AXES).filter(|axis| project[*axis]) {
        let mut flat = call.clone();
        flat.uniforms.model = projection_model(
            &camera.model,
            &snapshot.style.axes_bounds,
            camera.cube_axis[axis],
            axis,
        );
        flat.uniforms.clip_bounds = projection_clip(&camera.clip_bounds, axis);
        flat.projected = Some(axis);
        calls.push(flat);
    }
    calls.push(call);
}

fn line_call(
    pass: Pass,
    kind: DrawKind,
    range: &ContourRange,
    color: Rgba,
    width: f32,
    base: &DrawUniforms,
) -> DrawCall {
    DrawCall {
        pass,
        primitive: Primitive::Lines,
        kind,
        range: range.offset..range.end(),
        uniforms: DrawUniforms {
            color: Some(color),
            line_width: width,
            ..*base
        },
        projected: None,
    }
}

fn surface_call(pass: Pass, snapshot: &SurfaceSnapshot, base: &DrawUniforms) -> Option<DrawCall> {
    let count = snapshot.mesh.vertex_count();
    (snapshot.style.show_surface && count > 0).then(|| DrawCall {
        pass,
        primitive: Primitive::Triangles,
        kind: DrawKind::Surface,
        range: 0..count,
        uniforms: *base,
        projected: None,
    })
}

fn color_calls(snapshot: &SurfaceSnapshot, camera: &Camera) -> Vec<DrawCall> {
    let style = &snapshot.style;
    let base = base_uniforms(snapshot, camera);
    let mut calls = Vec::new();

    if let Some(call) = surface_call(Pass::Color, snapshot, &base) {
        push_projected(&mut calls, call, &style.surface_project, snapshot, camera);
    }

    for axis in (0..AXES).filter(|axis| style.show_contour[*axis]) {
        for (level, range) in snapshot.contours.ranges[axis].iter().enumerate() {
            if range.is_empty() {
                continue;
            }
            let (color, width) = if snapshot.highlight[axis] == Some(level) {
                (style.highlight_color[axis], style.highlight_width[axis])
            } else {
                (style.contour_color[axis], style.contour_width[axis])
            };
            let call = line_call(
                Pass::Color,
                DrawKind::Contour { axis, level },
                range,
                color,
                width,
                &base,
            );
            push_projected(&mut calls, call, &style.contour_project, snapshot, camera);
        }
    }

    let dynamic = &snapshot.dynamic;
    for axis in (0..AXES).filter(|axis| dynamic.counts[*axis] > 0) {
        let range = ContourRange {
            offset: dynamic.offsets[axis],
            count: dynamic.counts[axis],
        };
        let call = line_call(
            Pass::Color,
            DrawKind::Dynamic { axis },
            &range,
            style.dynamic_color[axis],
            style.dynamic_width[axis],
            &base,
        );
        push_projected(&mut calls, call, &style.contour_project, snapshot, camera);
    }

    calls
}

fn pick_calls(snapshot: &SurfaceSnapshot, camera: &Camera) -> Vec<DrawCall> {
    let style = &snapshot.style;
    let base = base_uniforms(snapshot, camera);
    let mut calls = Vec::new();

    if let Some(call) = surface_call(Pass::Pick, snapshot, &base) {
        calls.push(call);
    }
    for axis in (0..AXES).filter(|axis| style.show_contour[*axis]) {
        for (level, range) in snapshot.contours.ranges[axis].iter().enumerate() {
            if range.is_empty() {
                continue;
            }
            calls.push(line_call(
                Pass::Pick,
                DrawKind::Contour { axis, level },
                range,
                [0.0; 4],
                style.contour_width[axis],
                &base,
            ));
        }
    }
    calls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    #[test]
    fn projection_flattens_onto_the_visible_face() {
        let bounds = Bounds::new(Point::new(-1.0, -2.0, -3.0), Point::new(1.0, 2.0, 3.0));
        let p = Point::new(0.5, 0.5, 0.5);

        let hi = projection_model(&Matrix::identity(), &bounds, 1, 2);
        assert_eq!(hi.transform_point(&p), Point::new(0.5, 0.5, 3.0));

        let lo = projection_model(&Matrix::identity(), &bounds, -1, 0);
        assert_eq!(lo.transform_point(&p), Point::new(-1.0, 0.5, 0.5));
    }

    #[test]
    fn projection_composes_with_the_model() {
        let bounds = Bounds::new(Point::origin(), Point::new(4.0, 4.0, 4.0));
        let model = Matrix::new_translation(&crate::types::Vector::new(10.0, 0.0, 0.0));
        let m = projection_model(&model, &bounds, 1, 1);
        assert_eq!(m.transform_point(&Point::new(1.0, 1.0, 1.0)), Point::new(11.0, 4.0, 1.0));
    }

    #[test]
    fn projected_clip_is_opened_on_one_axis() {
        let clip = Bounds::new(Point::origin(), Point::new(1.0, 1.0, 1.0));
        let wide = projection_clip(&clip, 1);
        assert_eq!(wide.lo, Point::new(0.0, -PROJECTION_CLIP, 0.0));
        assert_eq!(wide.hi, Point::new(1.0, PROJECTION_CLIP, 1.0));
    }
}

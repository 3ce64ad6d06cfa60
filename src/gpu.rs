//! The seam between the geometry core and whatever draws it.
//!
//! A backend hands out opaque buffers and textures and executes draw calls. The
//! core only ever uploads bytes, binds, draws ranges and disposes.

use std::ops::Range;

use crate::{
    palette::ColorTable,
    types::{AXES, Bounds, Matrix, Point, Rgba},
};

/// A vertex buffer living on the device.
pub trait GpuBuffer {
    /// Replaces the buffer contents.
    fn update(&mut self, bytes: &[u8]);
    fn bind(&self);
    fn dispose(&mut self);
}

/// A lookup texture living on the device.
pub trait GpuTexture {
    fn set_pixels(&mut self, table: &ColorTable);
    /// Binds to texture unit `unit`.
    fn bind(&self, unit: u32);
    fn dispose(&mut self);
}

/// Creates device resources and executes draws.
pub trait GpuBackend {
    type Buffer: GpuBuffer;
    type Texture: GpuTexture;

    fn create_buffer(&mut self, label: &'static str) -> Self::Buffer;
    fn create_texture(&mut self, width: usize, height: usize) -> Self::Texture;
    /// Draws `call.range` of `buffer`, which the caller has bound.
    fn draw(&mut self, buffer: &Self::Buffer, call: &DrawCall);
}

/// Which pass a draw belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pass {
    /// Visible colour pass.
    Color,
    /// Offscreen pick pass; fragments write the encoded pick colour.
    Pick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Triangles,
    Lines,
}

/// What a draw call renders, for backends that pick pipelines per kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawKind {
    Surface,
    /// Static contour of `axis` at sorted level `level`.
    Contour { axis: usize, level: usize },
    /// Live contour of `axis`.
    Dynamic { axis: usize },
}

/// Camera state supplied by the render harness each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub model: Matrix,
    pub view: Matrix,
    pub projection: Matrix,
    /// Fragments outside this box are discarded.
    pub clip_bounds: Bounds,
    /// For each axis, the sign of the visible cube face; projections flatten
    /// onto the `hi` face when positive and the `lo` face otherwise.
    pub cube_axis: [i8; AXES],
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            model: Matrix::identity(),
            view: Matrix::identity(),
            projection: Matrix::identity(),
            clip_bounds: Bounds::unbounded(),
            cube_axis: [1; AXES],
        }
    }
}

/// Uniform block of a single draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawUniforms {
    pub model: Matrix,
    pub view: Matrix,
    pub projection: Matrix,
    pub clip_bounds: Bounds,
    /// Data bounds used to normalise values into the colormap.
    pub lower_bound: Point,
    pub upper_bound: Point,
    /// Flat colour of line draws; surfaces sample the colormap instead.
    pub color: Option<Rgba>,
    pub line_width: f32,
    pub opacity: f32,
    /// Logical `[rows, cols]` for pick encoding.
    pub shape: [usize; 2],
    pub pick_id: u8,
}

/// A single draw request.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub pass: Pass,
    pub primitive: Primitive,
    pub kind: DrawKind,
    /// Vertex range into the bound buffer.
    pub range: Range<usize>,
    pub uniforms: DrawUniforms,
    /// Axis the geometry is flattened along, for projected copies.
    pub projected: Option<usize>,
}

use derive_more::Display;

pub type Result<T> = core::result::Result<T, SurfaceError>;

/// Structural failures of a surface update.
///
/// Numeric invalidity (`NaN`, `±∞`) is never an error: such samples are holes
/// and are silently left out of the mesh and the contours.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum SurfaceError {
    /// Coordinates or ticks don't match the field's logical shape.
    #[display("{what} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    /// The surface was created without a field.
    #[display("a surface requires a field on construction")]
    MissingField,
    /// The palette service doesn't know the requested colormap.
    #[display("unknown colormap {_0:?}")]
    UnknownColormap(String),
    /// Pick id 0 is reserved for the background of the pick pass.
    #[display("pick id must be positive")]
    InvalidPickId,
}

impl std::error::Error for SurfaceError {}

impl SurfaceError {
    pub(crate) fn shape_mismatch(what: &'static str, expected: &[usize], found: &[usize]) -> Self {
        SurfaceError::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }
}

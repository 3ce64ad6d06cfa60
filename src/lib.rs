pub mod arena;
pub mod config;
pub mod contour;
pub mod error;
pub mod field;
pub mod gpu;
pub mod gradient;
pub mod interp;
pub mod mesh;
pub mod palette;
pub mod pick;
pub mod plugin;
pub mod render;
pub mod surface;
pub mod types;

pub use config::{AxisOption, Colormap, Levels, SurfaceOptions, SurfaceStyle};
pub use error::{Result, SurfaceError};
pub use pick::{PickResult, PickSample};
pub use plugin::SurfacePlotPlugin;
pub use surface::{SurfacePlot, SurfaceSnapshot};

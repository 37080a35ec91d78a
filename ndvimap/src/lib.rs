pub mod collect;
pub mod commons;
pub mod config;
pub mod error;
pub mod geo_core;
pub mod geometric;
pub mod ndvi_map;

pub use config::NdviConfig;
pub use error::{ArchiveError, InvalidAoiError, NdviError, RasterError};
pub use ndvi_map::{MapRequest, MapUpdate, NdviMapViewer};

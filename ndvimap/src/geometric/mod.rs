pub mod aoi;
pub mod raster;
pub mod vegetation;
pub mod visualization;

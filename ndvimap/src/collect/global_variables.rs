/// Sentinel-2 surface reflectance collection queried for every composite
pub const COLLECTION_ID: &str = "COPERNICUS/S2_SR";

/// Near-infrared band (10 m)
pub const NIR_BAND: &str = "B8";

/// Red band (10 m)
pub const RED_BAND: &str = "B4";

/// Name of the derived index band appended to each scene
pub const NDVI_BAND: &str = "NDVI";

/// Label under which the composite layer is added to the map
pub const LAYER_NAME: &str = "Median NDVI";

pub const INVALID_AOI_MESSAGE: &str =
    "Invalid AOI. Please draw a valid area of interest (AOI) on the map.";

pub const NDVI_MIN: f64 = -1.0;
pub const NDVI_MAX: f64 = 1.0;

pub const NDVI_PALETTE: [&str; 5] = ["red", "orange", "yellow", "green", "darkgreen"];

/// First day offered by the date form
pub const DEFAULT_START_DATE: &str = "2023-01-01";

pub const DEFAULT_OPACITY: f64 = 1.0;

/// Environment variable read by the CLI for the archive endpoint
pub const ARCHIVE_URL_ENV: &str = "NDVIMAP_ARCHIVE_URL";

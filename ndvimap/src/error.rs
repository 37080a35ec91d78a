use thiserror::Error;

use crate::collect::global_variables::INVALID_AOI_MESSAGE;
use crate::geo_core::GeoTransform;

/// Why an AOI input could not be turned into a polygon
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidAoiError {
    #[error("no AOI was drawn")]
    Missing,
    #[error("AOI has no coordinate rings")]
    MissingRings,
    #[error("ring {ring} is not an array of positions")]
    MalformedRing { ring: usize },
    #[error("position {position} of ring {ring} is not a [longitude, latitude] pair")]
    MalformedPosition { ring: usize, position: usize },
    #[error("position {position} of ring {ring} is outside longitude/latitude bounds")]
    OutOfRange { ring: usize, position: usize },
    #[error("ring {ring} has {count} distinct vertices, at least 3 are required")]
    TooFewVertices { ring: usize, count: usize },
    #[error("ring {ring} intersects itself")]
    SelfIntersecting { ring: usize },
    #[error("AOI encloses no area")]
    ZeroArea,
}

impl InvalidAoiError {
    /// Message shown to the user whatever the structural defect was
    pub fn user_message(&self) -> &'static str {
        INVALID_AOI_MESSAGE
    }
}

/// Failures raised while talking to the imagery archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("archive returned error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid archive endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("could not decode archive response: {0}")]
    Decode(String),
    #[error("unknown collection: {0}")]
    UnknownCollection(String),
    #[error("scene {scene} has no band {band}")]
    MissingBand { scene: String, band: String },
    #[error(transparent)]
    Raster(#[from] RasterError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RasterError {
    #[error("raster of {width}x{height} needs {expected} samples, got {actual}")]
    LengthMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
    #[error("raster of {width}x{height} is too large")]
    TooLarge { width: usize, height: usize },
    #[error("raster shapes differ: {expected:?} vs {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("rasters are not on the same grid: {expected:?} vs {found:?}")]
    GridMismatch {
        expected: GeoTransform,
        found: GeoTransform,
    },
    #[error("cannot reduce an empty raster stack")]
    EmptyStack,
}

/// Error returned by one run of the NDVI pipeline
#[derive(Debug, Error)]
pub enum NdviError {
    #[error("{}", INVALID_AOI_MESSAGE)]
    InvalidAoi(#[source] InvalidAoiError),
    #[error("archive query failed")]
    ArchiveQuery(#[source] ArchiveError),
    #[error("no {collection} scenes intersect the AOI between {start} and {end}")]
    NoData {
        collection: String,
        start: String,
        end: String,
    },
    #[error("scene {scene} has no band {band}")]
    MissingBand { scene: String, band: String },
    #[error("acquisition timestamp {0} ms is out of range")]
    InvalidTimestamp(i64),
    #[error(transparent)]
    Raster(#[from] RasterError),
}

impl From<InvalidAoiError> for NdviError {
    fn from(err: InvalidAoiError) -> Self {
        NdviError::InvalidAoi(err)
    }
}

impl From<ArchiveError> for NdviError {
    fn from(err: ArchiveError) -> Self {
        NdviError::ArchiveQuery(err)
    }
}

impl NdviError {
    /// AOI errors are reported to the user; everything else aborts the run
    pub fn is_invalid_aoi(&self) -> bool {
        matches!(self, NdviError::InvalidAoi(_))
    }
}

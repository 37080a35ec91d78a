use geo::{Intersects, Polygon};
use serde::{Deserialize, Serialize, Serializer};

/// EPSG code of the coordinates drawn on the map (WGS84 longitude/latitude)
pub const WGS84_EPSG: i32 = 4326;

/// Validated area of interest
/// Only built by `geometric::aoi::validate`, so holding one means the polygon
/// is closed, simple and encloses area.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaOfInterest {
    polygon: Polygon<f64>,
}

impl AreaOfInterest {
    pub(crate) fn from_validated(polygon: Polygon<f64>) -> Self {
        AreaOfInterest { polygon }
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Whether a scene footprint overlaps this AOI
    pub fn intersects(&self, footprint: &Polygon<f64>) -> bool {
        self.polygon.intersects(footprint)
    }

    /// GeoJSON geometry sent to the archive as the spatial filter
    pub fn to_geojson(&self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::from(&self.polygon))
    }
}

impl Serialize for AreaOfInterest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_geojson().serialize(serializer)
    }
}

/// Bounding box structure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64, // min longitude
    pub min_y: f64, // min latitude
    pub max_x: f64, // max longitude
    pub max_y: f64, // max latitude
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }
}

/// Placement of a north-up grid in WGS84 degrees.
/// `origin_x`/`origin_y` is the outer corner of the first pixel; `pixel_height`
/// is negative when rows run southwards, as in GDAL geotransforms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        GeoTransform {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Grid of `width` x `height` pixels covering `bbox`, first row at the north edge
    pub fn from_bounds(bbox: BoundingBox, width: usize, height: usize) -> Self {
        GeoTransform {
            origin_x: bbox.min_x,
            origin_y: bbox.max_y,
            pixel_width: (bbox.max_x - bbox.min_x) / width.max(1) as f64,
            pixel_height: -(bbox.max_y - bbox.min_y) / height.max(1) as f64,
        }
    }

    /// Extent of a `width` x `height` grid placed by this transform
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let far_x = self.origin_x + self.pixel_width * width as f64;
        let far_y = self.origin_y + self.pixel_height * height as f64;
        BoundingBox::new(
            self.origin_x.min(far_x),
            self.origin_y.min(far_y),
            self.origin_x.max(far_x),
            self.origin_y.max(far_y),
        )
    }

    /// Same grid, up to a thousandth of a pixel
    pub fn aligned_with(&self, other: &GeoTransform) -> bool {
        let tolerance_x = self.pixel_width.abs() * 1e-3;
        let tolerance_y = self.pixel_height.abs() * 1e-3;
        (self.origin_x - other.origin_x).abs() <= tolerance_x
            && (self.origin_y - other.origin_y).abs() <= tolerance_y
            && (self.pixel_width - other.pixel_width).abs() <= tolerance_x
            && (self.pixel_height - other.pixel_height).abs() <= tolerance_y
    }
}

impl Default for GeoTransform {
    /// Unplaced grid: unit pixels from (0, 0), the GDAL default
    fn default() -> Self {
        GeoTransform::new(0.0, 0.0, 1.0, 1.0)
    }
}

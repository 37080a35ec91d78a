use chrono::NaiveDate;
use serde::Serialize;

use crate::collect::archive::scene::{Band, Scene};
use crate::commons::basic_functions::date_to_epoch_millis;
use crate::error::ArchiveError;
use crate::geo_core::AreaOfInterest;
use crate::geometric::raster::Raster;

/// Calendar date range of a query.
/// `start` is inclusive and `end` exclusive, both at 00:00 UTC; an inverted
/// range simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains_millis(&self, millis: i64) -> bool {
        millis >= date_to_epoch_millis(self.start) && millis < date_to_epoch_millis(self.end)
    }
}

/// Per-scene band derivation carried by a query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BandTransform {
    /// `(bands[0] - bands[1]) / (bands[0] + bands[1])` appended as `name`
    NormalizedDifference { bands: [String; 2], name: String },
}

impl BandTransform {
    pub fn normalized_difference(first: &str, second: &str, name: &str) -> Self {
        BandTransform::NormalizedDifference {
            bands: [first.to_string(), second.to_string()],
            name: name.to_string(),
        }
    }

    /// Append the derived band to `scene`, keeping every existing band
    pub fn apply(&self, scene: &mut Scene) -> Result<(), ArchiveError> {
        match self {
            BandTransform::NormalizedDifference { bands, name } => {
                let first = band_or_err(scene, &bands[0])?;
                let second = band_or_err(scene, &bands[1])?;
                let raster = Raster::normalized_difference(&first.raster, &second.raster)?;
                let band = Band::new(name, first.nominal_scale_m, raster);
                scene.add_band(band);
            }
        }
        Ok(())
    }
}

fn band_or_err<'a>(scene: &'a Scene, band: &str) -> Result<&'a Band, ArchiveError> {
    scene.band(band).ok_or_else(|| ArchiveError::MissingBand {
        scene: scene.id.clone(),
        band: band.to_string(),
    })
}

/// Description of a filtered, transformed scene collection.
/// Nothing is fetched until it is passed to `ArchiveClient::execute`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneQuery {
    pub collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<AreaOfInterest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateRange>,
    pub transforms: Vec<BandTransform>,
}

impl SceneQuery {
    pub fn new(collection: &str) -> Self {
        SceneQuery {
            collection: collection.to_string(),
            bounds: None,
            date: None,
            transforms: Vec::new(),
        }
    }

    pub fn filter_bounds(mut self, aoi: AreaOfInterest) -> Self {
        self.bounds = Some(aoi);
        self
    }

    pub fn filter_date(mut self, range: DateRange) -> Self {
        self.date = Some(range);
        self
    }

    pub fn map(mut self, transform: BandTransform) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Whether a scene passes the spatial and temporal filters
    pub fn matches(&self, scene: &Scene) -> bool {
        let in_bounds = self
            .bounds
            .as_ref()
            .map_or(true, |aoi| aoi.intersects(&scene.footprint));
        let in_range = self
            .date
            .map_or(true, |range| range.contains_millis(scene.acquired_ms));
        in_bounds && in_range
    }

    /// Run the transform list over one scene, in order
    pub fn apply_transforms(&self, scene: &mut Scene) -> Result<(), ArchiveError> {
        for transform in &self.transforms {
            transform.apply(scene)?;
        }
        Ok(())
    }
}

use geo::Polygon;

use crate::geometric::raster::Raster;

/// One spectral band of a scene
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub name: String,
    /// Native ground sampling distance of the band, in meters
    pub nominal_scale_m: f64,
    pub raster: Raster,
}

impl Band {
    pub fn new(name: &str, nominal_scale_m: f64, raster: Raster) -> Self {
        Band {
            name: name.to_string(),
            nominal_scale_m,
            raster,
        }
    }
}

/// Remote-sensed acquisition with its bands
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub id: String,
    /// Acquisition start, epoch milliseconds
    pub acquired_ms: i64,
    /// Footprint in longitude/latitude
    pub footprint: Polygon<f64>,
    pub bands: Vec<Band>,
}

impl Scene {
    pub fn new(id: &str, acquired_ms: i64, footprint: Polygon<f64>, bands: Vec<Band>) -> Self {
        Scene {
            id: id.to_string(),
            acquired_ms,
            footprint,
            bands,
        }
    }

    pub fn band(&self, name: &str) -> Option<&Band> {
        self.bands.iter().find(|b| b.name == name)
    }

    /// Append a band; a band with the same name is replaced in place
    pub fn add_band(&mut self, band: Band) {
        match self.bands.iter_mut().find(|b| b.name == band.name) {
            Some(existing) => *existing = band,
            None => self.bands.push(band),
        }
    }
}

/// Scenes returned by one query, in ascending acquisition order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneCollection {
    scenes: Vec<Scene>,
}

impl SceneCollection {
    /// Stable sort by acquisition time; ties keep archive order
    pub fn new(mut scenes: Vec<Scene>) -> Self {
        scenes.sort_by_key(|s| s.acquired_ms);
        SceneCollection { scenes }
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn first(&self) -> Option<&Scene> {
        self.scenes.first()
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn into_scenes(self) -> Vec<Scene> {
        self.scenes
    }

    /// Acquisition times of every scene in the collection
    pub fn aggregate_time_start(&self) -> Vec<i64> {
        self.scenes.iter().map(|s| s.acquired_ms).collect()
    }

    /// The named band of every scene; `None` if any scene lacks it
    pub fn select(&self, band: &str) -> Option<Vec<&Raster>> {
        self.scenes
            .iter()
            .map(|s| s.band(band).map(|b| &b.raster))
            .collect()
    }
}

use chrono::NaiveDate;

use crate::collect::archive::{ArchiveClient, DateRange};
use crate::collect::global_variables::DEFAULT_OPACITY;
use crate::config::NdviConfig;
use crate::error::NdviError;
use crate::geometric::aoi::{validate, AoiInput};
use crate::geometric::raster::Raster;
use crate::geometric::vegetation::Vegetation;
use crate::geometric::visualization::{visualize_with, RenderableLayer};

/// Inputs collected from the map and the form for one update
#[derive(Debug, Clone)]
pub struct MapRequest {
    /// Drawn AOI; `None` when nothing was drawn
    pub aoi: Option<AoiInput>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub show_ndvi: bool,
    /// Layer opacity in [0, 1]
    pub opacity: f64,
}

impl MapRequest {
    pub fn new(aoi: Option<AoiInput>, start: NaiveDate, end: NaiveDate) -> Self {
        MapRequest {
            aoi,
            start,
            end,
            show_ndvi: true,
            opacity: DEFAULT_OPACITY,
        }
    }

    pub fn show_ndvi(mut self, show: bool) -> Self {
        self.show_ndvi = show;
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }
}

/// Outcome of one update: the layer to overlay (if shown) and the diagnostics
#[derive(Debug, Clone)]
pub struct MapUpdate {
    pub layer: Option<RenderableLayer>,
    pub composite: Raster,
    pub dates: Vec<String>,
    pub resolution_m: f64,
}

impl MapUpdate {
    /// Lines printed under the map
    pub fn diagnostics(&self) -> Vec<String> {
        vec![
            format!(
                "Timestamps of the images contributing to the median NDVI: {:?}",
                self.dates
            ),
            format!("Spatial resolution of the NDVI: {} meters", self.resolution_m),
        ]
    }
}

/// Runs validation, compositing and visualization for one trigger.
/// Holds no state between updates besides the archive session and config.
pub struct NdviMapViewer<A: ArchiveClient> {
    vegetation: Vegetation<A>,
}

impl<A: ArchiveClient> NdviMapViewer<A> {
    pub fn new(archive: A, config: NdviConfig) -> Self {
        NdviMapViewer {
            vegetation: Vegetation::new(archive, config),
        }
    }

    pub fn archive(&self) -> &A {
        self.vegetation.archive()
    }

    /// Handle one "Update Map" trigger.
    ///
    /// An invalid or missing AOI stops here with `NdviError::InvalidAoi`
    /// (its message is meant for the user) and the archive is never queried.
    /// With `show_ndvi` off the composite and diagnostics are still computed,
    /// only the layer is left out.
    pub fn update_map(&self, request: MapRequest) -> Result<MapUpdate, NdviError> {
        let aoi = validate(request.aoi).map_err(|err| {
            log::error!("{} ({})", err.user_message(), err);
            NdviError::from(err)
        })?;

        let range = DateRange::new(request.start, request.end);
        let composite = self.vegetation.composite(&aoi, range)?;

        let update = {
            let config = self.vegetation.config();
            let spec = config.visualization.spec(request.opacity);
            MapUpdate {
                layer: visualize_with(
                    &composite.image,
                    request.show_ndvi,
                    &spec,
                    &config.layer_name,
                ),
                composite: composite.image,
                dates: composite.dates,
                resolution_m: composite.resolution_m,
            }
        };

        for line in update.diagnostics() {
            log::info!("{}", line);
        }
        Ok(update)
    }
}

use crate::collect::archive::{ArchiveClient, BandTransform, DateRange, SceneQuery};
use crate::commons::basic_functions::epoch_millis_to_date;
use crate::config::NdviConfig;
use crate::error::NdviError;
use crate::geo_core::AreaOfInterest;
use crate::geometric::raster::Raster;

/// Median NDVI over one AOI and date range
#[derive(Debug, Clone, PartialEq)]
pub struct NdviComposite {
    /// Per-pixel median of the index band; `NaN` where no scene contributed
    pub image: Raster,
    /// Acquisition times of the filtered scenes, epoch milliseconds, ascending
    pub timestamps_ms: Vec<i64>,
    /// Same acquisitions as `YYYY-MM-DD` strings
    pub dates: Vec<String>,
    /// Native ground sampling distance of the NIR band, in meters
    pub resolution_m: f64,
}

/// Vegetation index compositor
/// Queries the archive for scenes over the AOI, derives NDVI on each one and
/// reduces the stack to its per-pixel median.
pub struct Vegetation<A: ArchiveClient> {
    /// Archive session used for every query
    archive: A,
    /// Collection and band names
    config: NdviConfig,
}

impl<A: ArchiveClient> Vegetation<A> {
    pub fn new(archive: A, config: NdviConfig) -> Self {
        Vegetation { archive, config }
    }

    pub fn archive(&self) -> &A {
        &self.archive
    }

    pub fn config(&self) -> &NdviConfig {
        &self.config
    }

    /// Query descriptor for one composite: bounds, dates and the NDVI transform
    pub fn query(&self, aoi: &AreaOfInterest, range: DateRange) -> SceneQuery {
        SceneQuery::new(&self.config.collection)
            .filter_bounds(aoi.clone())
            .filter_date(range)
            .map(BandTransform::normalized_difference(
                &self.config.nir_band,
                &self.config.red_band,
                &self.config.index_band,
            ))
    }

    /// Compute the median NDVI composite.
    ///
    /// 1. One blocking query to the archive (filters + NDVI transform)
    /// 2. Acquisition dates of every scene that passed the filters
    /// 3. Resolution of the first scene's NIR band
    /// 4. Per-pixel median of the NDVI bands
    ///
    /// An empty collection is `NdviError::NoData`; archive failures are
    /// `NdviError::ArchiveQuery`. Nothing is returned partially.
    pub fn composite(
        &self,
        aoi: &AreaOfInterest,
        range: DateRange,
    ) -> Result<NdviComposite, NdviError> {
        let query = self.query(aoi, range);
        log::info!(
            "Querying {} from {} to {}",
            query.collection,
            range.start,
            range.end
        );

        let collection = self.archive.execute(&query)?;

        // Dates of the filtered collection, not of each pixel's contributors
        let timestamps_ms = collection.aggregate_time_start();
        let dates = timestamps_ms
            .iter()
            .map(|&ms| epoch_millis_to_date(ms).ok_or(NdviError::InvalidTimestamp(ms)))
            .collect::<Result<Vec<_>, _>>()?;

        let first = collection.first().ok_or_else(|| NdviError::NoData {
            collection: self.config.collection.clone(),
            start: range.start.to_string(),
            end: range.end.to_string(),
        })?;
        let resolution_m = first
            .band(&self.config.nir_band)
            .ok_or_else(|| NdviError::MissingBand {
                scene: first.id.clone(),
                band: self.config.nir_band.clone(),
            })?
            .nominal_scale_m;

        let stack = collection.select(&self.config.index_band).ok_or_else(|| {
            // Report the first scene the archive returned without the index band
            let scene = collection
                .scenes()
                .iter()
                .find(|s| s.band(&self.config.index_band).is_none())
                .map(|s| s.id.clone())
                .unwrap_or_default();
            NdviError::MissingBand {
                scene,
                band: self.config.index_band.clone(),
            }
        })?;
        let image = Raster::median(&stack)?;

        log::info!(
            "Median NDVI from {} scenes, {}x{} pixels, {} m",
            collection.len(),
            image.width(),
            image.height(),
            resolution_m
        );

        Ok(NdviComposite {
            image,
            timestamps_ms,
            dates,
            resolution_m,
        })
    }
}

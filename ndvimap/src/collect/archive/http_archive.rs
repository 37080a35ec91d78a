use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use url::Url;

use crate::collect::archive::query::SceneQuery;
use crate::collect::archive::scene::{Band, Scene, SceneCollection};
use crate::collect::archive::ArchiveClient;
use crate::error::ArchiveError;
use crate::geo_core::GeoTransform;
use crate::geometric::raster::Raster;

/// Archive reached through a JSON query API.
///
/// A query is sent as `POST {endpoint}/collections/{collection}/scenes` with
/// the serialized `SceneQuery` as body. The server filters, runs the
/// transforms and answers with the scenes and their band rasters, every
/// band placed by its `grid` on a common grid covering the AOI.
pub struct HttpArchive {
    client: Client,
    endpoint: Url,
}

/// Body returned by the archive
#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    scenes: Vec<SceneRecord>,
}

#[derive(Debug, Deserialize)]
struct SceneRecord {
    id: String,
    #[serde(rename = "system:time_start")]
    time_start: i64,
    footprint: geojson::Geometry,
    bands: Vec<BandRecord>,
}

#[derive(Debug, Deserialize)]
struct BandRecord {
    name: String,
    /// Nominal scale in meters
    scale: f64,
    width: usize,
    height: usize,
    /// Placement of the first pixel and pixel size, in degrees
    grid: GeoTransform,
    /// Row-major samples, `null` for no-data
    values: Vec<Option<f64>>,
}

impl HttpArchive {
    /// Create a client for the archive at `endpoint`.
    /// No request timeout is set: a slow archive blocks the caller.
    pub fn new(endpoint: &str) -> Result<Self, ArchiveError> {
        let endpoint = Url::parse(endpoint)?;
        if endpoint.cannot_be_a_base() {
            return Err(ArchiveError::Endpoint(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        let client = Client::builder().timeout(None::<Duration>).build()?;
        Ok(HttpArchive { client, endpoint })
    }

    /// `{endpoint}/collections/{collection}/scenes`, with the collection id kept as one segment
    pub fn scenes_url(&self, collection: &str) -> Result<Url, ArchiveError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ArchiveError::Endpoint(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["collections", collection, "scenes"]);
        Ok(url)
    }

    /// Parse an archive answer into a scene collection
    pub fn decode_response(body: &str) -> Result<SceneCollection, ArchiveError> {
        let response: ArchiveResponse =
            serde_json::from_str(body).map_err(|e| ArchiveError::Decode(e.to_string()))?;

        let scenes = response
            .scenes
            .into_iter()
            .map(scene_from_record)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SceneCollection::new(scenes))
    }
}

fn scene_from_record(record: SceneRecord) -> Result<Scene, ArchiveError> {
    let geometry: geo::Geometry<f64> = (&record.footprint).try_into().map_err(|e| {
        ArchiveError::Decode(format!("footprint of scene {}: {}", record.id, e))
    })?;
    let footprint = match geometry {
        geo::Geometry::Polygon(polygon) => polygon,
        _ => {
            return Err(ArchiveError::Decode(format!(
                "footprint of scene {} is not a polygon",
                record.id
            )))
        }
    };

    let bands = record
        .bands
        .into_iter()
        .map(|band| {
            let data = band
                .values
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            let raster = Raster::new(band.width, band.height, data)?.with_transform(band.grid);
            Ok(Band::new(&band.name, band.scale, raster))
        })
        .collect::<Result<Vec<_>, ArchiveError>>()?;

    Ok(Scene::new(&record.id, record.time_start, footprint, bands))
}

impl ArchiveClient for HttpArchive {
    fn execute(&self, query: &SceneQuery) -> Result<SceneCollection, ArchiveError> {
        let url = self.scenes_url(&query.collection)?;
        log::debug!("Request URL archive: {}", url);

        let response = self.client.post(url).json(query).send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(ArchiveError::Status { status, body });
        }

        let body = response.text()?;
        let collection = Self::decode_response(&body)?;
        log::debug!("Archive returned {} scenes", collection.len());
        Ok(collection)
    }
}

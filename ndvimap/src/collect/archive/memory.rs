use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};

use crate::collect::archive::http_archive::HttpArchive;
use crate::collect::archive::query::SceneQuery;
use crate::collect::archive::scene::{Scene, SceneCollection};
use crate::collect::archive::ArchiveClient;
use crate::error::ArchiveError;

/// Archive backed by scenes held in memory.
/// Evaluates queries locally with the same filter and transform rules a
/// remote archive applies; counts the queries it receives.
pub struct InMemoryArchive {
    collection: String,
    scenes: Vec<Scene>,
    calls: AtomicUsize,
}

impl InMemoryArchive {
    pub fn new(collection: &str, scenes: Vec<Scene>) -> Self {
        InMemoryArchive {
            collection: collection.to_string(),
            scenes,
            calls: AtomicUsize::new(0),
        }
    }

    /// Load scenes from a JSON file laid out like an archive answer
    /// (`{"scenes": [...]}`), e.g. an export of a previous query
    pub fn from_json_file(collection: &str, path: &Path) -> Result<Self> {
        let body = std::fs::read_to_string(path)
            .context(format!("Failed to read scene file: {:?}", path))?;
        let scenes = HttpArchive::decode_response(&body)
            .context(format!("Failed to parse scene file: {:?}", path))?;
        Ok(InMemoryArchive::new(collection, scenes.into_scenes()))
    }

    /// Number of `execute` calls received so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ArchiveClient for InMemoryArchive {
    fn execute(&self, query: &SceneQuery) -> Result<SceneCollection, ArchiveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if query.collection != self.collection {
            return Err(ArchiveError::UnknownCollection(query.collection.clone()));
        }

        let mut matched = Vec::new();
        for scene in self.scenes.iter().filter(|s| query.matches(s)) {
            let mut scene = scene.clone();
            query.apply_transforms(&mut scene)?;
            matched.push(scene);
        }
        log::debug!(
            "In-memory archive matched {} of {} scenes",
            matched.len(),
            self.scenes.len()
        );

        Ok(SceneCollection::new(matched))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::archive::query::{BandTransform, DateRange};
    use crate::collect::archive::scene::Band;
    use crate::commons::basic_functions::date_to_epoch_millis;
    use crate::geometric::raster::Raster;
    use chrono::NaiveDate;
    use geo::polygon;

    fn scene(id: &str, day: u32) -> Scene {
        let acquired = date_to_epoch_millis(NaiveDate::from_ymd_opt(2023, 1, day).unwrap());
        Scene::new(
            id,
            acquired,
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)],
            vec![
                Band::new("B8", 10.0, Raster::filled(1, 1, 0.6)),
                Band::new("B4", 10.0, Raster::filled(1, 1, 0.2)),
            ],
        )
    }

    fn range(start: u32, end: u32) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2023, 1, start).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, end).unwrap(),
        )
    }

    #[test]
    fn test_execute_filters_and_transforms() {
        let archive = InMemoryArchive::new(
            "COPERNICUS/S2_SR",
            vec![scene("late", 20), scene("early", 3), scene("outside", 28)],
        );
        let query = SceneQuery::new("COPERNICUS/S2_SR")
            .filter_date(range(1, 25))
            .map(BandTransform::normalized_difference("B8", "B4", "NDVI"));

        let collection = archive.execute(&query).unwrap();
        let ids: Vec<&str> = collection.scenes().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
        for s in collection.scenes() {
            assert_eq!(s.bands.len(), 3);
            assert!((s.band("NDVI").unwrap().raster.get(0, 0).unwrap() - 0.5).abs() < 1e-12);
        }
        assert_eq!(archive.calls(), 1);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenes.json");
        let body = serde_json::json!({
            "scenes": [{
                "id": "S2B_20230110",
                "system:time_start": 1673344800000i64,
                "footprint": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]},
                "bands": [
                    {"name": "B8", "scale": 10.0, "width": 1, "height": 1, "grid": {"origin_x": 0.0, "origin_y": 1.0, "pixel_width": 1.0, "pixel_height": -1.0}, "values": [0.6]},
                    {"name": "B4", "scale": 10.0, "width": 1, "height": 1, "grid": {"origin_x": 0.0, "origin_y": 1.0, "pixel_width": 1.0, "pixel_height": -1.0}, "values": [0.2]}
                ]
            }]
        });
        std::fs::write(&path, body.to_string()).unwrap();

        let archive = InMemoryArchive::from_json_file("COPERNICUS/S2_SR", &path).unwrap();
        let query = SceneQuery::new("COPERNICUS/S2_SR")
            .map(BandTransform::normalized_difference("B8", "B4", "NDVI"));
        let collection = archive.execute(&query).unwrap();
        assert_eq!(collection.len(), 1);
        assert!(collection.first().unwrap().band("NDVI").is_some());
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(InMemoryArchive::from_json_file("COPERNICUS/S2_SR", &dir.path().join("none.json")).is_err());
    }

    #[test]
    fn test_unknown_collection() {
        let archive = InMemoryArchive::new("COPERNICUS/S2_SR", vec![]);
        let err = archive.execute(&SceneQuery::new("LANDSAT/LC08")).unwrap_err();
        assert!(matches!(err, ArchiveError::UnknownCollection(_)));
        assert_eq!(archive.calls(), 1);
    }
}

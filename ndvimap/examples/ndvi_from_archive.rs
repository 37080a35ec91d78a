use anyhow::{Context, Result};
use chrono::NaiveDate;
use geo::polygon;
use ndvimap::collect::archive::{ArchiveClient, Band, HttpArchive, InMemoryArchive, Scene};
use ndvimap::collect::global_variables::{ARCHIVE_URL_ENV, COLLECTION_ID};
use ndvimap::commons::basic_functions::date_to_epoch_millis;
use ndvimap::geo_core::{BoundingBox, GeoTransform};
use ndvimap::geometric::aoi::AoiInput;
use ndvimap::geometric::raster::Raster;
use ndvimap::{MapRequest, NdviConfig, NdviMapViewer};
use serde_json::json;

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .context(format!("Invalid date: {}-{}-{}", year, month, day))
}

/// Synthetic 4x4 Sentinel-2 scene over Chesapeake Bay, for runs without an archive
fn synthetic_scene(id: &str, date: NaiveDate, greenness: f64) -> Result<Scene> {
    // Grid covering the drawn rectangle
    let grid = GeoTransform::from_bounds(BoundingBox::new(-75.8420, 38.6080, -75.8330, 38.6140), 4, 4);
    let red = Raster::filled(4, 4, 0.08).with_transform(grid);
    let nir: Vec<f64> = (0..16)
        .map(|i| 0.08 + greenness * (i % 4) as f64 / 3.0)
        .collect();
    Ok(Scene::new(
        id,
        date_to_epoch_millis(date) + 15 * 3_600_000 + 47 * 60_000,
        polygon![
            (x: -76.4, y: 38.2),
            (x: -75.2, y: 38.2),
            (x: -75.2, y: 39.2),
            (x: -76.4, y: 39.2),
        ],
        vec![
            Band::new("B8", 10.0, Raster::new(4, 4, nir)?.with_transform(grid)),
            Band::new("B4", 10.0, red),
        ],
    ))
}

/// Example: median NDVI over a drawn AOI for January 2023
fn main() -> Result<()> {
    println!("=== Example: Median NDVI from a Sentinel-2 archive ===\n");

    // Rectangle drawn around (-75.8374, 38.6109)
    let aoi = json!({
        "type": "Polygon",
        "coordinates": [[
            [-75.8420, 38.6080],
            [-75.8330, 38.6080],
            [-75.8330, 38.6140],
            [-75.8420, 38.6140],
            [-75.8420, 38.6080]
        ]]
    });

    let start = date(2023, 1, 1)?;
    let end = date(2023, 1, 31)?;

    let archive: Box<dyn ArchiveClient> = match std::env::var(ARCHIVE_URL_ENV) {
        Ok(url) => {
            println!("Using archive at {}", url);
            Box::new(HttpArchive::new(&url)?)
        }
        Err(_) => {
            println!("{} not set, using synthetic scenes", ARCHIVE_URL_ENV);
            let scenes = vec![
                synthetic_scene("S2A_20230103", date(2023, 1, 3)?, 0.20)?,
                synthetic_scene("S2B_20230113", date(2023, 1, 13)?, 0.35)?,
                synthetic_scene("S2A_20230123", date(2023, 1, 23)?, 0.50)?,
            ];
            Box::new(InMemoryArchive::new(COLLECTION_ID, scenes))
        }
    };

    println!("Date range: {} to {}", start, end);
    println!("Computing median NDVI = median((B8 - B4) / (B8 + B4))...\n");

    let viewer = NdviMapViewer::new(archive, NdviConfig::default());
    let request = MapRequest::new(Some(AoiInput::Raw(aoi)), start, end).opacity(0.8);
    let update = viewer.update_map(request)?;

    for line in update.diagnostics() {
        println!("{}", line);
    }

    if let Some(layer) = &update.layer {
        std::fs::create_dir_all("./output")?;
        let path = std::path::Path::new("./output/median_ndvi.png");
        layer.save_png(path)?;
        println!("\n✅ Layer '{}' saved to {:?}", layer.name, path);
        println!(
            "   Bounds (EPSG:{}): [{}, {}, {}, {}]",
            layer.epsg, layer.bounds.min_x, layer.bounds.min_y, layer.bounds.max_x, layer.bounds.max_y
        );
    }

    Ok(())
}

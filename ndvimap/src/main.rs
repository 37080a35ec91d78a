use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;

use ndvimap::collect::archive::{ArchiveClient, HttpArchive, InMemoryArchive};
use ndvimap::collect::global_variables::{ARCHIVE_URL_ENV, DEFAULT_OPACITY, DEFAULT_START_DATE};
use ndvimap::geometric::aoi::AoiInput;
use ndvimap::{MapRequest, NdviConfig, NdviMapViewer};

/// Median NDVI map over a drawn area of interest
#[derive(Debug, Parser)]
#[command(name = "ndvimap", version, about)]
struct Cli {
    /// GeoJSON file with the AOI (Polygon geometry or Feature)
    #[arg(long)]
    aoi: Option<PathBuf>,

    /// First day of the range (inclusive)
    #[arg(long, default_value = DEFAULT_START_DATE)]
    start: NaiveDate,

    /// Last day of the range, defaults to today
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Compute the composite and diagnostics without producing a layer
    #[arg(long)]
    hide_ndvi: bool,

    /// Layer opacity
    #[arg(long, default_value_t = DEFAULT_OPACITY, value_parser = parse_opacity)]
    opacity: f64,

    /// Base URL of the imagery archive query API
    #[arg(long, env = ARCHIVE_URL_ENV, conflicts_with = "scenes")]
    archive_url: Option<String>,

    /// Local scene file used instead of a remote archive
    #[arg(long)]
    scenes: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the layer as PNG
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn parse_opacity(value: &str) -> Result<f64, String> {
    let opacity: f64 = value.parse().map_err(|e| format!("{}", e))?;
    if (0.0..=1.0).contains(&opacity) {
        Ok(opacity)
    } else {
        Err(format!("opacity must be within [0, 1], got {}", opacity))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => NdviConfig::from_json_file(path)?,
        None => NdviConfig::default(),
    };

    let archive: Box<dyn ArchiveClient> = match (&cli.scenes, &cli.archive_url) {
        (Some(path), _) => Box::new(InMemoryArchive::from_json_file(&config.collection, path)?),
        (None, Some(url)) => Box::new(
            HttpArchive::new(url).context(format!("Failed to create archive client for {}", url))?,
        ),
        (None, None) => anyhow::bail!(
            "No archive configured: pass --archive-url (or set {}) or --scenes",
            ARCHIVE_URL_ENV
        ),
    };

    let aoi = match &cli.aoi {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .context(format!("Failed to read AOI file: {:?}", path))?;
            let value: serde_json::Value = serde_json::from_str(&content)
                .context(format!("Failed to parse AOI file: {:?}", path))?;
            Some(AoiInput::Raw(value))
        }
        None => None,
    };

    let end = cli.end.unwrap_or_else(|| Utc::now().date_naive());
    let request = MapRequest::new(aoi, cli.start, end)
        .show_ndvi(!cli.hide_ndvi)
        .opacity(cli.opacity);

    let viewer = NdviMapViewer::new(archive, config);
    let update = match viewer.update_map(request) {
        Ok(update) => update,
        Err(err) if err.is_invalid_aoi() => {
            eprintln!("{}", err);
            std::process::exit(2);
        }
        Err(err) => return Err(err).context("NDVI update failed"),
    };

    for line in update.diagnostics() {
        println!("{}", line);
    }

    match (&update.layer, &cli.output) {
        (Some(layer), Some(path)) => {
            layer.save_png(path)?;
            println!("Layer '{}' saved to: {:?}", layer.name, path);
        }
        (Some(layer), None) => {
            println!(
                "Layer '{}' ready ({}x{}, opacity {}, EPSG:{} [{}, {}, {}, {}])",
                layer.name,
                layer.width,
                layer.height,
                layer.opacity,
                layer.epsg,
                layer.bounds.min_x,
                layer.bounds.min_y,
                layer.bounds.max_x,
                layer.bounds.max_y
            );
        }
        (None, _) => println!("NDVI layer hidden"),
    }

    Ok(())
}

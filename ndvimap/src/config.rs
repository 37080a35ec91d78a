use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::collect::global_variables::{
    COLLECTION_ID, LAYER_NAME, NDVI_BAND, NDVI_MAX, NDVI_MIN, NDVI_PALETTE, NIR_BAND, RED_BAND,
};
use crate::geometric::visualization::{Color, VisualizationSpec};

/// Pipeline settings; every field falls back to the Sentinel-2 NDVI defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NdviConfig {
    /// Archive collection queried for scenes
    pub collection: String,
    pub nir_band: String,
    pub red_band: String,
    /// Name of the derived index band
    pub index_band: String,
    /// Label of the layer added to the map
    pub layer_name: String,
    pub visualization: VisualizationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    pub min: f64,
    pub max: f64,
    pub palette: Vec<Color>,
}

impl Default for NdviConfig {
    fn default() -> Self {
        NdviConfig {
            collection: COLLECTION_ID.to_string(),
            nir_band: NIR_BAND.to_string(),
            red_band: RED_BAND.to_string(),
            index_band: NDVI_BAND.to_string(),
            layer_name: LAYER_NAME.to_string(),
            visualization: VisualizationConfig::default(),
        }
    }
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        VisualizationConfig {
            min: NDVI_MIN,
            max: NDVI_MAX,
            palette: NDVI_PALETTE.iter().filter_map(|name| Color::parse(name)).collect(),
        }
    }
}

impl VisualizationConfig {
    pub fn spec(&self, opacity: f64) -> VisualizationSpec {
        VisualizationSpec {
            min: self.min,
            max: self.max,
            palette: self.palette.clone(),
            opacity,
        }
    }
}

impl NdviConfig {
    /// Load settings from a JSON file; missing keys keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {:?}", path))?;
        let config: NdviConfig = serde_json::from_str(&content)
            .context(format!("Failed to parse config file: {:?}", path))?;
        if config.visualization.max <= config.visualization.min {
            anyhow::bail!(
                "Visualization range is empty: min {} >= max {}",
                config.visualization.min,
                config.visualization.max
            );
        }
        Ok(config)
    }
}

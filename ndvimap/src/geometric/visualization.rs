use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::collect::global_variables::{
    DEFAULT_OPACITY, LAYER_NAME, NDVI_MAX, NDVI_MIN, NDVI_PALETTE,
};
use crate::geo_core::{BoundingBox, WGS84_EPSG};
use crate::geometric::raster::Raster;

/// RGB color stop of a ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// CSS color name or `#RRGGBB`
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return None;
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            return Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?));
        }
        let color = match value.to_ascii_lowercase().as_str() {
            "black" => Color::rgb(0, 0, 0),
            "white" => Color::rgb(255, 255, 255),
            "red" => Color::rgb(255, 0, 0),
            "orange" => Color::rgb(255, 165, 0),
            "yellow" => Color::rgb(255, 255, 0),
            "green" => Color::rgb(0, 128, 0),
            "darkgreen" => Color::rgb(0, 100, 0),
            "lime" => Color::rgb(0, 255, 0),
            "blue" => Color::rgb(0, 0, 255),
            "brown" => Color::rgb(165, 42, 42),
            _ => return None,
        };
        Some(color)
    }

    fn lerp(self, other: Color, t: f64) -> Color {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color::rgb(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Color::parse(&value).ok_or_else(|| format!("unknown color: {}", value))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
    }
}

/// Value range, color ramp and opacity used to draw an index raster
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationSpec {
    pub min: f64,
    pub max: f64,
    pub palette: Vec<Color>,
    pub opacity: f64,
}

impl VisualizationSpec {
    /// NDVI display: [-1, 1], red → orange → yellow → green → darkgreen
    pub fn ndvi(opacity: f64) -> Self {
        let palette = NDVI_PALETTE
            .iter()
            .filter_map(|name| Color::parse(name))
            .collect();
        VisualizationSpec {
            min: NDVI_MIN,
            max: NDVI_MAX,
            palette,
            opacity,
        }
    }

    /// Ramp color for a value; stops are spread evenly over [min, max]
    pub fn color_for(&self, value: f64) -> Color {
        let span = self.max - self.min;
        let t = if span > 0.0 {
            ((value - self.min) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        match self.palette.len() {
            0 => Color::rgb(0, 0, 0),
            1 => self.palette[0],
            n => {
                let position = t * (n - 1) as f64;
                let lower = (position.floor() as usize).min(n - 2);
                self.palette[lower].lerp(self.palette[lower + 1], position - lower as f64)
            }
        }
    }

    /// Opacity within [0, 1]; NaN counts as fully transparent
    pub fn effective_opacity(&self) -> f64 {
        if self.opacity.is_nan() {
            0.0
        } else {
            self.opacity.clamp(0.0, 1.0)
        }
    }

    fn alpha(&self) -> u8 {
        (self.effective_opacity() * 255.0).round() as u8
    }

    /// Colorize a raster into RGBA; no-data pixels are transparent
    pub fn colorize(&self, raster: &Raster) -> Vec<u8> {
        let alpha = self.alpha();
        let mut rgba = Vec::with_capacity(raster.data().len() * 4);
        for &value in raster.data() {
            if value.is_nan() {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
            } else {
                let c = self.color_for(value);
                rgba.extend_from_slice(&[c.r, c.g, c.b, alpha]);
            }
        }
        rgba
    }
}

impl Default for VisualizationSpec {
    fn default() -> Self {
        VisualizationSpec::ndvi(DEFAULT_OPACITY)
    }
}

/// Colorized layer handed to the map
#[derive(Debug, Clone, PartialEq)]
pub struct RenderableLayer {
    pub name: String,
    pub width: usize,
    pub height: usize,
    /// Extent covered on the map
    pub bounds: BoundingBox,
    /// Coordinate system of `bounds`
    pub epsg: i32,
    /// Row-major RGBA8 pixels
    pub rgba: Vec<u8>,
    pub opacity: f64,
}

impl RenderableLayer {
    /// Write the layer as a PNG image
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let image = image::RgbaImage::from_raw(self.width as u32, self.height as u32, self.rgba.clone())
            .context("Layer buffer does not match its dimensions")?;
        image
            .save_with_format(path, image::ImageFormat::Png)
            .context(format!("Failed to write layer PNG: {:?}", path))?;
        Ok(())
    }
}

/// Turn a composite into a map layer placed on the composite's grid, or
/// nothing when display is off.
/// Opacity is expected in [0, 1] and is clamped otherwise.
pub fn visualize(composite: &Raster, show: bool, opacity: f64) -> Option<RenderableLayer> {
    visualize_with(composite, show, &VisualizationSpec::ndvi(opacity), LAYER_NAME)
}

/// `visualize` with an explicit spec and layer name
pub fn visualize_with(
    composite: &Raster,
    show: bool,
    spec: &VisualizationSpec,
    name: &str,
) -> Option<RenderableLayer> {
    if !show {
        return None;
    }
    if !(0.0..=1.0).contains(&spec.opacity) {
        log::warn!("Opacity {} outside [0, 1], clamping", spec.opacity);
    }
    Some(RenderableLayer {
        name: name.to_string(),
        width: composite.width(),
        height: composite.height(),
        bounds: composite.transform().bounds(composite.width(), composite.height()),
        epsg: WGS84_EPSG,
        rgba: spec.colorize(composite),
        opacity: spec.effective_opacity(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_core::GeoTransform;

    fn composite() -> Raster {
        Raster::new(3, 2, vec![-1.0, 0.0, 1.0, 0.5, f64::NAN, -0.5])
            .unwrap()
            .with_transform(GeoTransform::new(-75.8400, 38.6140, 0.0002, -0.0003))
    }

    #[test]
    fn test_parse_colors() {
        assert_eq!(Color::parse("darkgreen"), Some(Color::rgb(0, 100, 0)));
        assert_eq!(Color::parse("#FFA500"), Some(Color::rgb(255, 165, 0)));
        assert_eq!(Color::parse("#FFA5"), None);
        assert_eq!(Color::parse("teal-ish"), None);
    }

    #[test]
    fn test_ndvi_spec() {
        let spec = VisualizationSpec::ndvi(0.5);
        assert_eq!(spec.min, -1.0);
        assert_eq!(spec.max, 1.0);
        assert_eq!(spec.palette.len(), 5);
        assert_eq!(spec.palette[0], Color::rgb(255, 0, 0));
        assert_eq!(spec.palette[4], Color::rgb(0, 100, 0));
    }

    #[test]
    fn test_color_ramp() {
        let spec = VisualizationSpec::ndvi(1.0);
        assert_eq!(spec.color_for(-1.0), Color::rgb(255, 0, 0));
        assert_eq!(spec.color_for(0.0), Color::rgb(255, 255, 0));
        assert_eq!(spec.color_for(0.5), Color::rgb(0, 128, 0));
        assert_eq!(spec.color_for(1.0), Color::rgb(0, 100, 0));
        // Out-of-range values stick to the ends of the ramp
        assert_eq!(spec.color_for(-3.0), Color::rgb(255, 0, 0));
        assert_eq!(spec.color_for(7.0), Color::rgb(0, 100, 0));
        // Halfway between red and orange
        assert_eq!(spec.color_for(-0.75), Color::rgb(255, 83, 0));
    }

    #[test]
    fn test_hidden_layer_is_none() {
        for opacity in [0.0, 0.5, 1.0] {
            assert!(visualize(&composite(), false, opacity).is_none());
        }
    }

    #[test]
    fn test_layer_carries_opacity() {
        for opacity in [0.0, 0.5, 1.0] {
            let layer = visualize(&composite(), true, opacity).unwrap();
            assert_eq!(layer.opacity, opacity);
            assert_eq!(layer.name, "Median NDVI");
            assert_eq!((layer.width, layer.height), (3, 2));
            assert_eq!(layer.rgba.len(), 3 * 2 * 4);
            let expected_alpha = (opacity * 255.0).round() as u8;
            assert_eq!(layer.rgba[3], expected_alpha);
        }
    }

    #[test]
    fn test_no_data_is_transparent() {
        let layer = visualize(&composite(), true, 1.0).unwrap();
        // pixel (1, 1) is no-data
        let offset = (1 * 3 + 1) * 4;
        assert_eq!(&layer.rgba[offset..offset + 4], &[0, 0, 0, 0]);
        assert_eq!(&layer.rgba[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_opacity_is_clamped() {
        let layer = visualize(&composite(), true, 1.7).unwrap();
        assert_eq!(layer.opacity, 1.0);
        let layer = visualize(&composite(), true, -0.2).unwrap();
        assert_eq!(layer.opacity, 0.0);
    }

    #[test]
    fn test_nan_opacity_is_transparent() {
        let layer = visualize(&composite(), true, f64::NAN).unwrap();
        assert_eq!(layer.opacity, 0.0);
        assert_eq!(layer.rgba[3], 0);
    }

    #[test]
    fn test_layer_is_placed_on_composite_grid() {
        let layer = visualize(&composite(), true, 1.0).unwrap();
        assert_eq!(layer.epsg, 4326);
        assert!((layer.bounds.min_x + 75.8400).abs() < 1e-9);
        assert!((layer.bounds.max_x + 75.8394).abs() < 1e-9);
        assert!((layer.bounds.min_y - 38.6134).abs() < 1e-9);
        assert!((layer.bounds.max_y - 38.6140).abs() < 1e-9);
    }

    #[test]
    fn test_color_serde() {
        let color: Color = serde_json::from_str("\"orange\"").unwrap();
        assert_eq!(color, Color::rgb(255, 165, 0));
        assert_eq!(serde_json::to_string(&color).unwrap(), "\"#ffa500\"");
        assert!(serde_json::from_str::<Color>("\"nope\"").is_err());
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ndvi.png");
        let layer = visualize(&composite(), true, 0.8).unwrap();
        layer.save_png(&path).unwrap();
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0, 204]);
    }
}

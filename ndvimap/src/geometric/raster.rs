#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::error::RasterError;
use crate::geo_core::GeoTransform;

/// Single-band raster stored row-major; `NaN` marks no-data
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    data: Vec<f64>,
    /// Position of the grid in WGS84 degrees
    transform: GeoTransform,
}

impl Raster {
    pub fn new(width: usize, height: usize, data: Vec<f64>) -> Result<Self, RasterError> {
        let expected = width
            .checked_mul(height)
            .ok_or(RasterError::TooLarge { width, height })?;
        if data.len() != expected {
            return Err(RasterError::LengthMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Raster {
            width,
            height,
            data,
            transform: GeoTransform::default(),
        })
    }

    pub fn filled(width: usize, height: usize, value: f64) -> Self {
        Raster {
            width,
            height,
            data: vec![value; width * height],
            transform: GeoTransform::default(),
        }
    }

    /// Place the grid on the map
    pub fn with_transform(mut self, transform: GeoTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Pixel value, `None` outside the grid or on no-data
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let value = self.data[y * self.width + x];
        if value.is_nan() {
            None
        } else {
            Some(value)
        }
    }

    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    fn ensure_same_grid(&self, other: &Raster) -> Result<(), RasterError> {
        if self.shape() != other.shape() {
            return Err(RasterError::ShapeMismatch {
                expected: self.shape(),
                found: other.shape(),
            });
        }
        if !self.transform.aligned_with(&other.transform) {
            return Err(RasterError::GridMismatch {
                expected: self.transform,
                found: other.transform,
            });
        }
        Ok(())
    }

    /// `(a - b) / (a + b)` per pixel, clamped to [-1, 1].
    /// A zero sum or a no-data input gives no-data.
    pub fn normalized_difference(a: &Raster, b: &Raster) -> Result<Raster, RasterError> {
        a.ensure_same_grid(b)?;
        let data = a
            .data
            .iter()
            .zip(b.data.iter())
            .map(|(&a, &b)| normalized_difference_value(a, b))
            .collect();
        Ok(Raster {
            width: a.width,
            height: a.height,
            data,
            transform: a.transform,
        })
    }

    /// Per-pixel median across a temporal stack sharing one grid.
    /// No-data samples are skipped; a pixel without any valid sample stays no-data.
    pub fn median(stack: &[&Raster]) -> Result<Raster, RasterError> {
        let first = stack.first().ok_or(RasterError::EmptyStack)?;
        for raster in &stack[1..] {
            first.ensure_same_grid(raster)?;
        }

        let pixel_median = |i: usize| {
            let mut samples: Vec<f64> = stack
                .iter()
                .map(|r| r.data[i])
                .filter(|v| !v.is_nan())
                .collect();
            median_of(&mut samples)
        };

        let len = first.width * first.height;
        #[cfg(feature = "rayon")]
        let data: Vec<f64> = (0..len).into_par_iter().map(pixel_median).collect();
        #[cfg(not(feature = "rayon"))]
        let data: Vec<f64> = (0..len).map(pixel_median).collect();

        Ok(Raster {
            width: first.width,
            height: first.height,
            data,
            transform: first.transform,
        })
    }
}

fn normalized_difference_value(a: f64, b: f64) -> f64 {
    let sum = a + b;
    if a.is_nan() || b.is_nan() || sum == 0.0 {
        return f64::NAN;
    }
    ((a - b) / sum).clamp(-1.0, 1.0)
}

/// Median of non-NaN samples; mean of the two central values for even counts
fn median_of(samples: &mut [f64]) -> f64 {
    if samples.is_empty() {
        return f64::NAN;
    }
    samples.sort_by(|a, b| a.total_cmp(b));
    let mid = samples.len() / 2;
    if samples.len() % 2 == 1 {
        samples[mid]
    } else {
        (samples[mid - 1] + samples[mid]) / 2.0
    }
}

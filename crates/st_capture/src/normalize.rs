//! OCR input size normalization.
//!
//! Recognition accuracy drops off for very narrow and very wide inputs, so the cropped
//! bitmap is rescaled until its width falls inside [`WidthWindow`], independent of the
//! capture resolution. Normalization only improves quality: whenever the scaled bitmap is
//! unusable the original is passed through instead.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tracing::{debug, warn};

pub const MIN_OCR_WIDTH: u32 = 600;
pub const MAX_OCR_WIDTH: u32 = 2000;

/// Target width range for OCR input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthWindow {
    pub min: u32,
    pub max: u32,
}

impl Default for WidthWindow {
    fn default() -> Self {
        Self {
            min: MIN_OCR_WIDTH,
            max: MAX_OCR_WIDTH,
        }
    }
}

impl WidthWindow {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Scale factor that brings `width` into the window (1.0 when already inside).
    pub fn scale_for(&self, width: u32) -> f64 {
        if width == 0 {
            1.0
        } else if width < self.min {
            f64::from(self.min) / f64::from(width)
        } else if width > self.max {
            f64::from(self.max) / f64::from(width)
        } else {
            1.0
        }
    }
}

/// Bitmap handed to the OCR engine.
#[derive(Debug, Clone)]
pub struct OcrSource {
    pub bitmap: DynamicImage,
    pub width: u32,
    pub height: u32,
    /// Factor applied to the cropped bitmap (1.0 when passed through).
    pub scale: f64,
}

impl OcrSource {
    pub fn unscaled(bitmap: DynamicImage) -> Self {
        let (width, height) = bitmap.dimensions();
        Self {
            bitmap,
            width,
            height,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("resampling failed: {0}")]
pub struct ResampleError(pub String);

/// Renders a bitmap at a new size.
pub trait Resampler {
    fn resample(
        &self,
        source: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, ResampleError>;
}

/// High-quality Lanczos3 resampling.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lanczos3;

impl Resampler for Lanczos3 {
    fn resample(
        &self,
        source: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, ResampleError> {
        Ok(source.resize_exact(width, height, FilterType::Lanczos3))
    }
}

/// Normalize with the default Lanczos3 resampler.
pub fn normalize(source: DynamicImage, window: WidthWindow) -> OcrSource {
    normalize_with(source, window, &Lanczos3)
}

pub fn normalize_with<R: Resampler + ?Sized>(
    source: DynamicImage,
    window: WidthWindow,
    resampler: &R,
) -> OcrSource {
    let (width, height) = source.dimensions();
    let scale = window.scale_for(width);

    if scale == 1.0 || width == 0 || height == 0 {
        return OcrSource::unscaled(source);
    }

    let target_w = (f64::from(width) * scale).round() as u32;
    let target_h = (f64::from(height) * scale).round() as u32;
    if target_w == 0 || target_h == 0 {
        warn!(
            width,
            height, scale, "Scaled OCR source would be empty, using original"
        );
        return OcrSource::unscaled(source);
    }

    match resampler.resample(&source, target_w, target_h) {
        Ok(scaled) if scaled.dimensions() == (target_w, target_h) => {
            debug!(
                "Rescaled OCR source {}x{} -> {}x{} (x{:.3})",
                width, height, target_w, target_h, scale
            );
            OcrSource {
                bitmap: scaled,
                width: target_w,
                height: target_h,
                scale,
            }
        }
        Ok(scaled) => {
            let (got_w, got_h) = scaled.dimensions();
            warn!(
                "Resampler returned {}x{} instead of {}x{}, using original",
                got_w, got_h, target_w, target_h
            );
            OcrSource::unscaled(source)
        }
        Err(e) => {
            warn!("Could not read back scaled OCR source ({e}), using original");
            OcrSource::unscaled(source)
        }
    }
}

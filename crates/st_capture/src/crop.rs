//! Viewport → source-bitmap coordinate transform.
//!
//! A selection is drawn in viewport (CSS) pixels, while the captured bitmap is in device
//! pixels (device pixel ratio, external screenshot resolution, ...). The scale between the
//! two is derived from the bitmap and viewport sizes, and the crop is clamped to the bitmap
//! so a selection touching the viewport edge never reads out of range.

use image::{DynamicImage, GenericImageView};
use st_app::Rect;

/// Logical viewport size the selection rectangle is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Crop region in source-bitmap pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// The transformed crop has a non-positive width or height.
///
/// Typically the selection lies outside the captured bitmap because the page scrolled or
/// resized between selection and capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Selection is out of bounds.")]
pub struct OutOfBounds {
    pub sx: i64,
    pub sy: i64,
    pub sw: i64,
    pub sh: i64,
}

/// Crop region plus the scale factors (bitmap pixels per viewport pixel) that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropPlan {
    pub region: CropRegion,
    pub scale_x: f64,
    pub scale_y: f64,
}

/// Cropped bitmap for one OCR request.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub cropped: DynamicImage,
    pub region: CropRegion,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl CaptureResult {
    /// Map a box in OCR-source pixels back to viewport coordinates.
    ///
    /// `source_scale` is the factor the normalizer applied to the cropped bitmap (1.0 when
    /// the crop was fed to OCR unchanged).
    pub fn bbox_to_viewport(&self, x0: f64, y0: f64, x1: f64, y1: f64, source_scale: f64) -> Rect {
        let source_scale = if source_scale > 0.0 { source_scale } else { 1.0 };
        let to_x = |v: f64| (v / source_scale + self.region.x as f64) / self.scale_x;
        let to_y = |v: f64| (v / source_scale + self.region.y as f64) / self.scale_y;

        let left = to_x(x0).round() as i32;
        let top = to_y(y0).round() as i32;
        let right = to_x(x1).round() as i32;
        let bottom = to_y(y1).round() as i32;
        Rect::from_points(left, top, right, bottom)
    }
}

// Half-up rounding, matching how the browser side rounds canvas coordinates.
#[inline]
fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

/// Compute the source-pixel crop for `rect` on a bitmap of `bitmap_size`.
pub fn crop_region(
    rect: Rect,
    bitmap_size: (u32, u32),
    viewport: Viewport,
) -> Result<CropPlan, OutOfBounds> {
    let (bitmap_w, bitmap_h) = (i64::from(bitmap_size.0), i64::from(bitmap_size.1));

    if viewport.width == 0 || viewport.height == 0 {
        return Err(OutOfBounds {
            sx: 0,
            sy: 0,
            sw: 0,
            sh: 0,
        });
    }

    let scale_x = bitmap_size.0 as f64 / viewport.width as f64;
    let scale_y = bitmap_size.1 as f64 / viewport.height as f64;

    let sx = round_half_up(f64::from(rect.left) * scale_x).max(0);
    let sy = round_half_up(f64::from(rect.top) * scale_y).max(0);
    let sw = (bitmap_w - sx).min(round_half_up(f64::from(rect.width) * scale_x));
    let sh = (bitmap_h - sy).min(round_half_up(f64::from(rect.height) * scale_y));

    if sw <= 0 || sh <= 0 {
        return Err(OutOfBounds { sx, sy, sw, sh });
    }

    // sx < bitmap_w and sy < bitmap_h here, so everything fits in u32.
    Ok(CropPlan {
        region: CropRegion {
            x: sx as u32,
            y: sy as u32,
            width: sw as u32,
            height: sh as u32,
        },
        scale_x,
        scale_y,
    })
}

/// Crop the viewport bitmap to the selection.
pub fn crop_capture(
    bitmap: &DynamicImage,
    rect: Rect,
    viewport: Viewport,
) -> Result<CaptureResult, OutOfBounds> {
    let plan = crop_region(rect, bitmap.dimensions(), viewport)?;
    let CropRegion {
        x,
        y,
        width,
        height,
    } = plan.region;

    Ok(CaptureResult {
        cropped: bitmap.crop_imm(x, y, width, height),
        region: plan.region,
        scale_x: plan.scale_x,
        scale_y: plan.scale_y,
    })
}

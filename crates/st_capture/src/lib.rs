pub mod crop;
pub mod load;
pub mod normalize;

pub use crop::{
    CaptureResult, CropPlan, CropRegion, OutOfBounds, Viewport, crop_capture, crop_region,
};
pub use load::{IMAGE_LOAD_TIMEOUT, PayloadError, decode_bitmap, decode_image_payload, load_bitmap};
pub use normalize::{MAX_OCR_WIDTH, MIN_OCR_WIDTH, OcrSource, WidthWindow, normalize};

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use st_app::Rect;
use st_capture::Viewport;

#[derive(Parser)]
#[command(
    name = "snaptext",
    version,
    about = "Select a region of a screenshot and extract clean text from it"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (default: ~/.snaptext/settings.json)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Replay a recorded OCR result instead of running the OCR engine
    #[arg(long, global = true, value_name = "FILE")]
    pub replay: Option<PathBuf>,

    /// Fetch the viewport screenshot from this URL when none is given
    #[arg(long, global = true, value_name = "URL")]
    pub capture_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// OCR a whole image file
    Image {
        /// Path to a PNG/JPEG/... image
        file: PathBuf,
    },
    /// Select a region of a screenshot and OCR it
    Region {
        /// Screenshot of the viewport (omit to use --capture-url)
        screenshot: Option<PathBuf>,

        /// Region to select, in viewport pixels: LEFT,TOP,WIDTH,HEIGHT
        #[arg(long, value_parser = parse_rect)]
        rect: Rect,

        /// Viewport size the region is expressed in: WIDTHxHEIGHT (default: screenshot size)
        #[arg(long, value_parser = parse_viewport)]
        viewport: Option<Viewport>,
    },
    /// Serve one JSON request (`-` reads it from stdin)
    Request {
        json: String,

        /// Region dragged for `select-region` requests: LEFT,TOP,WIDTH,HEIGHT
        #[arg(long, value_parser = parse_rect)]
        rect: Option<Rect>,
    },
}

pub fn parse_rect(s: &str) -> Result<Rect, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid rectangle {s:?}: {e}"))?;

    match parts[..] {
        [left, top, width, height] if width >= 0 && height >= 0 => {
            Ok(Rect::new(left, top, width, height))
        }
        [_, _, _, _] => Err(format!("rectangle {s:?} has a negative size")),
        _ => Err(format!("expected LEFT,TOP,WIDTH,HEIGHT, got {s:?}")),
    }
}

pub fn parse_viewport(s: &str) -> Result<Viewport, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let width = w.trim().parse::<u32>().map_err(|e| format!("invalid width: {e}"))?;
    let height = h.trim().parse::<u32>().map_err(|e| format!("invalid height: {e}"))?;
    Ok(Viewport::new(width, height))
}

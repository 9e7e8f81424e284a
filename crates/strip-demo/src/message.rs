use std::path::PathBuf;
use std::time::Instant;

use strip_config::StripConfig;
use strip_core::{GridImage, Point, Rect};

#[derive(Debug, Clone)]
pub enum Message {
    DirectoryScanned {
        dir: Option<PathBuf>,
        images: Vec<PathBuf>,
        /// File the strip should open centered on
        target: Option<PathBuf>,
    },
    ThumbnailReady {
        index: usize,
        path: PathBuf,
        image: GridImage,
    },
    ThumbnailFailed {
        index: usize,
        path: PathBuf,
        error: String,
    },
    /// The strip widget was laid out at new bounds
    Bounds(Rect),
    Tap(Point),
    Drag {
        dx: f32,
        dy: f32,
    },
    DragEnd {
        velocity_x: f32,
    },
    Wheel(f32),
    /// Next UI pass after the grid was configured
    RunDeferred,
    Frame(Instant),
    ConfigChanged(StripConfig),
}

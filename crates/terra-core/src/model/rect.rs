use serde::{Deserialize, Serialize};

/// A rectangle in PDF points, origin top-left, y increasing downward — the
/// convention used throughout the layout/alignment pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectPoints {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl RectPoints {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn normalized(&self, page_w: f64, page_h: f64) -> RectNormalized {
        let (w, h) = (page_w.max(1.0), page_h.max(1.0));
        RectNormalized {
            x0: self.x0 / w,
            y0: self.y0 / h,
            x1: self.x1 / w,
            y1: self.y1 / h,
        }
    }
}

/// Same rectangle, coordinates scaled to `[0, 1]` against page width/height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectNormalized {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

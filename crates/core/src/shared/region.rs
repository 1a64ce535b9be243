/// A detected face: axis-aligned box in frame pixels plus the detector score.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub score: f64,
}

impl Region {
    /// Builds a region from corner coordinates, clamped to the frame bounds.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64, score: f64, fw: u32, fh: u32) -> Self {
        let x1 = x1.clamp(0.0, fw as f64);
        let y1 = y1.clamp(0.0, fh as f64);
        let x2 = x2.clamp(0.0, fw as f64);
        let y2 = y2.clamp(0.0, fh as f64);
        Self {
            x: x1 as i32,
            y: y1 as i32,
            width: (x2 - x1).max(0.0) as i32,
            height: (y2 - y1).max(0.0) as i32,
            score,
        }
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }
}

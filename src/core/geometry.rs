use serde::{Deserialize, Serialize};

/// Axis-aligned pixel box in x0/y0/x1/y1 form, always clamped to the source
/// image bounds by the constructors below. Serialized as `[x0, y0, x1, y1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BBox {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl From<[i32; 4]> for BBox {
    fn from(v: [i32; 4]) -> Self {
        Self {
            x0: v[0],
            y0: v[1],
            x1: v[2],
            y1: v[3],
        }
    }
}

impl From<BBox> for [i32; 4] {
    fn from(b: BBox) -> Self {
        [b.x0, b.y0, b.x1, b.y1]
    }
}

impl BBox {
    /// Clip raw coordinates into [0, W] x [0, H]. Never fails; degenerate
    /// inputs stay degenerate, so callers needing positive extent must
    /// guarantee it themselves.
    pub fn clamp(x0: i32, y0: i32, x1: i32, y1: i32, width: u32, height: u32) -> Self {
        let w = width as i32;
        let h = height as i32;
        Self {
            x0: x0.clamp(0, w),
            y0: y0.clamp(0, h),
            x1: x1.clamp(0, w),
            y1: y1.clamp(0, h),
        }
    }

    /// Expand by `pad` pixels on every side, then clip to image bounds.
    pub fn pad(&self, pad: i32, width: u32, height: u32) -> Self {
        Self::clamp(
            self.x0 - pad,
            self.y0 - pad,
            self.x1 + pad,
            self.y1 + pad,
            width,
            height,
        )
    }

    pub fn width(&self) -> u32 {
        (self.x1 - self.x0).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.y1 - self.y0).max(0) as u32
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn exceeds(&self, max_dimension: u32) -> bool {
        self.width > max_dimension || self.height > max_dimension
    }
}

/// Scales `source` down so its longer side equals `max_dimension`.
///
/// Images already within the limit are returned unchanged; nothing is ever
/// upscaled. Only the shorter side is rounded, and it never drops below one pixel.
/// Square images scale both sides to the limit.
pub fn fit_within(source: Dimensions, max_dimension: u32) -> Dimensions {
    if !source.exceeds(max_dimension) {
        return source;
    }

    if source.width > source.height {
        Dimensions {
            width: max_dimension,
            height: scale_side(source.height, max_dimension, source.width),
        }
    } else {
        Dimensions {
            width: scale_side(source.width, max_dimension, source.height),
            height: max_dimension,
        }
    }
}

fn scale_side(side: u32, max_dimension: u32, longer: u32) -> u32 {
    let scaled = (side as f64 * max_dimension as f64 / longer as f64).round();
    (scaled as u32).max(1)
}

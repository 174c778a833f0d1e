//! Mapping a source image's native size onto the display stage.
//!
//! Every overlay (text boxes and paint strokes) lives in the stage coordinate
//! space produced here, so the image and its overlays stay aligned whatever
//! the image's aspect ratio.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Both sides strictly positive and finite.
    pub fn is_usable(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitPolicy {
    /// The stage takes the image's pixel grid; overlay coordinates are
    /// image pixels.
    #[default]
    Native,
    /// The stage keeps the target size and the image is scaled to its height,
    /// centered horizontally.
    Letterbox,
}

/// Where the image sits on the stage, and how large the stage is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageGeometry {
    pub stage: Size,
    pub image: Size,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl ImageGeometry {
    fn fallback(target: Size) -> Self {
        Self {
            stage: target,
            image: target,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    pub fn image_contains(&self, x: f32, y: f32) -> bool {
        x >= self.offset_x
            && x <= self.offset_x + self.image.width
            && y >= self.offset_y
            && y <= self.offset_y + self.image.height
    }
}

/// Computes the displayed image geometry.
///
/// `native` is `None` while the image is still loading or failed to decode;
/// zero-sized images are treated the same way. Letterbox results are not
/// clamped: a wide image overflows the stage with a negative offset.
pub fn fit_image(native: Option<Size>, target: Size, policy: FitPolicy) -> ImageGeometry {
    let Some(native) = native.filter(|n| n.is_usable()) else {
        return ImageGeometry::fallback(target);
    };
    match policy {
        FitPolicy::Native => ImageGeometry {
            stage: native,
            image: native,
            offset_x: 0.0,
            offset_y: 0.0,
        },
        FitPolicy::Letterbox => {
            let height = target.height;
            let width = height * (native.width / native.height);
            ImageGeometry {
                stage: target,
                image: Size::new(width, height),
                offset_x: (target.width - width) / 2.0,
                offset_y: 0.0,
            }
        }
    }
}

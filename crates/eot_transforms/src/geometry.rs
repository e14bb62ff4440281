//! Angle ranges and planar rotations about an image centre.
//!
//! Coordinates follow the image convention: `x` to the right, `y` down,
//! origin at the top-left corner of the top-left pixel. A positive angle
//! rotates counter-clockwise as the image is displayed.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use eot_core::{BoundingBox, CoreError, Result};

/// Range that rotation angles (in degrees) are sampled from.
///
/// Serialized untagged, so a config may write either `30.0` or `[-10.0, 20.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AngleRange {
    /// `[-a, a]` for a positive scalar `a`.
    Symmetric(f32),
    /// `[lo, hi]`.
    Range(f32, f32),
}

impl Default for AngleRange {
    fn default() -> Self {
        Self::Symmetric(45.0)
    }
}

impl From<f32> for AngleRange {
    fn from(angle: f32) -> Self {
        Self::Symmetric(angle)
    }
}

impl From<(f32, f32)> for AngleRange {
    fn from((lo, hi): (f32, f32)) -> Self {
        Self::Range(lo, hi)
    }
}

impl AngleRange {
    /// Check the range.
    ///
    /// A scalar must lie in `(0, 180]`. A pair must be finite with `lo <= hi`.
    pub fn validate(&self) -> Result<()> {
        match *self {
            AngleRange::Symmetric(a) => {
                if !(a > 0.0 && a <= 180.0) {
                    return Err(CoreError::invalid_config(format!(
                        "The range of angles must be a float in the range (0.0, 180.0], got {a}"
                    )));
                }
            }
            AngleRange::Range(lo, hi) => {
                if !lo.is_finite() || !hi.is_finite() || lo > hi {
                    return Err(CoreError::invalid_config(format!(
                        "The range of angles must be a pair (low, high) of finite floats with low <= high, got ({lo}, {hi})"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Inclusive bounds `(lo, hi)`.
    #[must_use]
    pub fn bounds(&self) -> (f32, f32) {
        match *self {
            AngleRange::Symmetric(a) => (-a, a),
            AngleRange::Range(lo, hi) => (lo, hi),
        }
    }

    /// Draw an angle uniformly from the range.
    pub fn sample(&self, rng: &mut dyn RngCore) -> f32 {
        let (lo, hi) = self.bounds();
        if lo == hi {
            lo
        } else {
            rng.gen_range(lo..=hi)
        }
    }
}

/// A rotation by `angle_deg` about `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation2d {
    angle_deg: f32,
    center: (f32, f32),
    cos: f32,
    sin: f32,
}

impl Rotation2d {
    /// Rotation about an arbitrary point.
    #[must_use]
    pub fn new(angle_deg: f32, center: (f32, f32)) -> Self {
        let rad = (angle_deg as f64).to_radians();
        Self {
            angle_deg,
            center,
            cos: rad.cos() as f32,
            sin: rad.sin() as f32,
        }
    }

    /// Rotation about the centre of a `height x width` image.
    #[must_use]
    pub fn about_image_center(angle_deg: f32, height: usize, width: usize) -> Self {
        Self::new(angle_deg, (width as f32 / 2.0, height as f32 / 2.0))
    }

    /// The angle in degrees.
    #[must_use]
    pub const fn angle(&self) -> f32 {
        self.angle_deg
    }

    /// The centre of rotation.
    #[must_use]
    pub const fn center(&self) -> (f32, f32) {
        self.center
    }

    /// The rotation undoing this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            angle_deg: -self.angle_deg,
            center: self.center,
            cos: self.cos,
            sin: -self.sin,
        }
    }

    /// Map a point.
    #[must_use]
    pub fn apply(&self, (x, y): (f32, f32)) -> (f32, f32) {
        let dx = x - self.center.0;
        let dy = y - self.center.1;
        (
            self.center.0 + dx * self.cos + dy * self.sin,
            self.center.1 - dx * self.sin + dy * self.cos,
        )
    }

    /// Rotate the corners of a box and re-fit an axis-aligned box around them.
    #[must_use]
    pub fn rotate_box(&self, bbox: &BoundingBox) -> BoundingBox {
        let corners = bbox.corners().map(|p| self.apply(p));
        BoundingBox::enclosing(corners).unwrap_or(*bbox)
    }
}

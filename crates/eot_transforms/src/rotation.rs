//! Random image rotation.
//!
//! Every sample of the (fanned-out) batch is rotated about its centre by
//! its own angle drawn uniformly from the configured [`AngleRange`]. The
//! output keeps the input size; pixels whose source falls outside the image
//! take the fill value. Detection labels are rotated with the same angle as
//! their image.

use burn::prelude::*;
use burn::tensor::TensorData;
use image::{ImageBuffer, Luma};
use imageproc::geometric_transformations::{self as warp, Interpolation as Resampling};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use eot_core::{
    BoundingBox, CoreError, DetectionTarget, ImageShape, ImageTensor, LabelType, Labels, Result,
};

use crate::eot::{EoTConfig, EoTStrategy, ExpectationOverTransformation};
use crate::geometry::{AngleRange, Rotation2d};

/// Pixel resampling used when rotating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Nearest source pixel.
    #[default]
    Nearest,
    /// Bilinear blend of the four surrounding pixels.
    Bilinear,
}

impl From<Interpolation> for Resampling {
    fn from(interpolation: Interpolation) -> Self {
        match interpolation {
            Interpolation::Nearest => Resampling::Nearest,
            Interpolation::Bilinear => Resampling::Bilinear,
        }
    }
}

/// Configuration for the rotation strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRotationConfig {
    /// Sampling range in degrees.
    #[serde(default)]
    pub angles: AngleRange,
    /// How labels co-transform with the images.
    #[serde(default)]
    pub label_type: LabelType,
    /// Image resampling.
    #[serde(default)]
    pub interpolation: Interpolation,
    /// Value for pixels rotated in from outside the image.
    #[serde(default)]
    pub fill: f32,
}

impl Default for ImageRotationConfig {
    fn default() -> Self {
        Self {
            angles: AngleRange::default(),
            label_type: LabelType::Classification,
            interpolation: Interpolation::Nearest,
            fill: 0.0,
        }
    }
}

impl ImageRotationConfig {
    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        self.angles.validate()?;
        if !self.fill.is_finite() {
            return Err(CoreError::invalid_config(format!(
                "fill must be finite, got {}",
                self.fill
            )));
        }
        Ok(())
    }
}

/// Randomly rotates images, and detection labels along with them.
#[derive(Debug, Clone)]
pub struct ImageRotation {
    config: ImageRotationConfig,
}

impl ImageRotation {
    /// Create a rotation strategy.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the angle range is invalid.
    pub fn new(config: ImageRotationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration.
    #[must_use]
    pub const fn config(&self) -> &ImageRotationConfig {
        &self.config
    }

    fn rotate_detection<B: Backend>(
        &self,
        targets: Vec<DetectionTarget<B>>,
        angles: &[f32],
        shape: ImageShape,
    ) -> Result<Vec<DetectionTarget<B>>> {
        targets
            .into_iter()
            .zip(angles)
            .map(|(target, &angle)| rotate_target(target, angle, shape))
            .collect()
    }
}

impl<B: Backend> EoTStrategy<B> for ImageRotation {
    fn name(&self) -> &str {
        "ImageRotation"
    }

    fn transform(
        &self,
        x: ImageTensor<B>,
        y: Option<Labels<B>>,
        rng: &mut dyn RngCore,
    ) -> Result<(ImageTensor<B>, Option<Labels<B>>)> {
        let shape = x.shape();
        if let Some(labels) = &y {
            if labels.label_type() != self.config.label_type {
                return Err(CoreError::LabelMismatch(format!(
                    "configured for {} labels, got {} labels",
                    self.config.label_type,
                    labels.label_type()
                )));
            }
            if labels.len() != shape.batch() {
                return Err(CoreError::ShapeMismatch(format!(
                    "x batch size {} != y batch size {}",
                    shape.batch(),
                    labels.len()
                )));
            }
        }

        let device = x.device();
        let angles: Vec<f32> = (0..shape.batch())
            .map(|_| self.config.angles.sample(rng))
            .collect();
        tracing::trace!(?angles, "sampled rotation angles");

        let values = x.to_values()?;
        let image_len = shape.image_len();
        let mut rotated = Vec::with_capacity(values.len());
        for (image, &angle) in values.chunks(image_len.max(1)).zip(&angles) {
            rotated.extend(rotate_planes(
                image,
                shape.height(),
                shape.width(),
                angle,
                self.config.interpolation,
                self.config.fill,
            )?);
        }
        let x = ImageTensor::from_values(rotated, shape, &device)?;

        let y = match y {
            None => None,
            Some(Labels::Classification(y)) => Some(Labels::Classification(y)),
            Some(Labels::Detection(targets)) => {
                Some(Labels::Detection(self.rotate_detection(targets, &angles, shape)?))
            }
        };

        Ok((x, y))
    }
}

/// Configuration for [`EoTImageRotation`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EoTImageRotationConfig {
    /// Fan-out, clipping and phase gating.
    #[serde(flatten)]
    pub eot: EoTConfig,
    /// Rotation parameters.
    #[serde(flatten)]
    pub rotation: ImageRotationConfig,
}

/// Expectation over Transformation with random image rotation.
///
/// # Example
///
/// ```rust,ignore
/// use eot_transforms::EoTImageRotation;
/// use eot_core::{LabelType, Phase, Seed, Transform};
///
/// let eot = EoTImageRotation::new(4, (0.0, 1.0), 30.0, LabelType::Classification)?;
/// let mut rng = Seed::new(42).to_rng();
/// let out = eot.apply(batch, Phase::Predict, &mut rng)?;
/// assert_eq!(out.batch_size(), 4 * batch_size);
/// ```
pub type EoTImageRotation = ExpectationOverTransformation<ImageRotation>;

impl ExpectationOverTransformation<ImageRotation> {
    /// Create an EoT rotation step with default phase gating
    /// (predict only), nearest interpolation and zero fill.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] for an invalid sample count,
    /// clip range or angle range.
    pub fn new(
        nb_samples: usize,
        clip_values: (f32, f32),
        angles: impl Into<AngleRange>,
        label_type: LabelType,
    ) -> Result<Self> {
        Self::from_config(EoTImageRotationConfig {
            eot: EoTConfig {
                nb_samples,
                clip_values,
                ..Default::default()
            },
            rotation: ImageRotationConfig {
                angles: angles.into(),
                label_type,
                ..Default::default()
            },
        })
    }

    /// Create from config.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if either part of the config is invalid.
    pub fn from_config(config: EoTImageRotationConfig) -> Result<Self> {
        Self::with_strategy(config.eot, ImageRotation::new(config.rotation)?)
    }
}

/// Rotate every `height x width` plane in `planes` counter-clockwise by
/// `angle_deg`.
///
/// Each plane goes through `imageproc` as a single-channel `f32` image.
/// Pixel centres sit at integer coordinates there, so the rotation centre
/// `(W/2, H/2)` of the box geometry becomes `((W-1)/2, (H-1)/2)`.
pub(crate) fn rotate_planes(
    planes: &[f32],
    height: usize,
    width: usize,
    angle_deg: f32,
    interpolation: Interpolation,
    fill: f32,
) -> Result<Vec<f32>> {
    let plane_len = height * width;
    if plane_len == 0 {
        return Ok(planes.to_vec());
    }
    let (w, h) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(CoreError::TransformError(format!(
                "image of {height}x{width} is too large to rotate"
            )))
        }
    };

    let center = ((width as f32 - 1.0) / 2.0, (height as f32 - 1.0) / 2.0);
    // imageproc turns clockwise for positive angles.
    let theta = -angle_deg.to_radians();

    let mut out = Vec::with_capacity(planes.len());
    for plane in planes.chunks(plane_len) {
        let image = ImageBuffer::<Luma<f32>, Vec<f32>>::from_raw(w, h, plane.to_vec())
            .ok_or_else(|| {
                CoreError::TransformError(format!(
                    "{} values do not form a {height}x{width} plane",
                    plane.len()
                ))
            })?;
        let rotated = warp::rotate(&image, center, theta, interpolation.into(), Luma([fill]));
        out.extend(rotated.into_raw());
    }
    Ok(out)
}

/// Rotate one image's detection target by `angle_deg`.
///
/// Boxes are rotated about the image centre, re-fit axis-aligned and clipped
/// to the image. Boxes left with no area are dropped with their class and mask.
fn rotate_target<B: Backend>(
    target: DetectionTarget<B>,
    angle_deg: f32,
    shape: ImageShape,
) -> Result<DetectionTarget<B>> {
    target.validate()?;
    let (height, width) = (shape.height(), shape.width());
    let rotation = Rotation2d::about_image_center(angle_deg, height, width);

    let rotated: Vec<BoundingBox> = target
        .boxes
        .iter()
        .map(|b| rotation.rotate_box(b).clip(width as f32, height as f32))
        .collect();
    let keep: Vec<usize> = rotated
        .iter()
        .enumerate()
        .filter(|(_, b)| b.area() > 0.0)
        .map(|(i, _)| i)
        .collect();

    if keep.len() < rotated.len() {
        tracing::warn!(
            dropped = rotated.len() - keep.len(),
            angle = angle_deg,
            "boxes rotated out of the image were dropped"
        );
    }

    let masks = match target.masks {
        None => None,
        Some(_) if keep.is_empty() => None,
        Some(masks) => {
            let device = masks.device();
            let [n, h, w] = masks.dims();
            let mask_values = masks
                .into_data()
                .convert::<f32>()
                .to_vec::<f32>()
                .map_err(|e| CoreError::TransformError(format!("Failed to get mask data: {e:?}")))?;
            let rotated_masks = rotate_planes(&mask_values, h, w, angle_deg, Interpolation::Nearest, 0.0)?;
            let masks: Tensor<B, 3> =
                Tensor::from_data(TensorData::new(rotated_masks, [n, h, w]), &device);

            if keep.len() == n {
                Some(masks)
            } else {
                let indices: Vec<i64> = keep.iter().map(|&i| i as i64).collect();
                let len = indices.len();
                let indices = Tensor::<B, 1, Int>::from_data(TensorData::new(indices, [len]), &device);
                Some(masks.select(0, indices))
            }
        }
    };

    Ok(DetectionTarget {
        boxes: keep.iter().map(|&i| rotated[i]).collect(),
        classes: keep.iter().map(|&i| target.classes[i]).collect(),
        masks,
    })
}

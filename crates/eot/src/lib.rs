//! # eot
//!
//! Expectation over Transformation (EoT) image augmentation on Burn tensors.
//!
//! EoT evaluates a model against the average over many randomly transformed
//! copies of each input. This crate bundles:
//!
//! - **Core**: image batches, labels, seeds, phases and the [`Transform`](core::Transform) trait
//! - **Transforms**: the EoT wrapper and its rotation, brightness, contrast
//!   and noise strategies
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use eot::prelude::*;
//!
//! let eot = EoTImageRotation::new(8, (0.0, 1.0), 30.0, LabelType::ObjectDetection)?;
//! let batch = ImageBatch::with_labels(images, Labels::Detection(targets))?;
//!
//! let mut rng = Seed::new(42).to_rng();
//! let augmented = eot.apply(batch, Phase::Predict, &mut rng)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `backend-ndarray` (default): CPU backend using ndarray

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub use eot_core as core;
pub use eot_transforms as transforms;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use eot::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use eot_core::{
        BoundingBox, Compose, CoreError, DetectionTarget, Identity, ImageBatch, ImageShape,
        ImageTensor, LabelType, Labels, Phase, Result, Seed, Transform,
    };

    // Transforms
    pub use eot_transforms::{
        AngleRange, EoTBrightness, EoTConfig, EoTContrast, EoTGaussianNoise, EoTImageRotation,
        EoTImageRotationConfig, EoTPipelineConfig, EoTStrategy, EoTStrategyConfig,
        ExpectationOverTransformation, ImageRotation, ImageRotationConfig, Interpolation,
        Rotation2d,
    };

    #[cfg(feature = "backend-ndarray")]
    pub use eot_core::backend::NdArray;
}

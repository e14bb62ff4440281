//! # eot_transforms
//!
//! Expectation over Transformation (EoT) preprocessing steps.
//!
//! This crate provides:
//! - [`ExpectationOverTransformation`]: fans each image out into
//!   `nb_samples` randomly transformed copies and clips them
//! - Strategies: [`ImageRotation`] (with detection-label rotation),
//!   [`Brightness`], [`Contrast`], [`GaussianNoise`]
//! - [`EoTPipelineConfig`] for choosing a strategy from JSON
//!
//! ## Example
//!
//! ```rust,ignore
//! use eot_transforms::EoTImageRotation;
//! use eot_core::{LabelType, Phase, Seed, Transform};
//!
//! let eot = EoTImageRotation::new(8, (0.0, 1.0), 30.0, LabelType::Classification)?;
//! let mut rng = Seed::new(42).to_rng();
//! let batch = eot.apply(batch, Phase::Predict, &mut rng)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod eot;
pub mod geometry;
pub mod photometric;
pub mod rotation;

pub use config::*;
pub use eot::*;
pub use geometry::*;
pub use photometric::*;
pub use rotation::*;

pub use eot_core::{Compose, Identity};

//! # eot_core
//!
//! Core types and traits for Expectation over Transformation (EoT) image
//! preprocessing.
//!
//! This crate provides:
//! - [`Seed`] for deterministic random number generation
//! - [`ImageShape`], [`ImageTensor`] and [`ImageBatch`] wrapping Burn tensors
//! - [`Labels`] and [`LabelType`] for classification and detection targets
//! - [`Phase`] for fit/predict gating
//! - [`Transform`] trait for preprocessing steps
//! - Error types and common utilities
//!
//! ## Shape Convention
//!
//! Image batches follow the convention `(B, C, H, W)`:
//! - `B`: Batch size (number of images)
//! - `C`: Channels
//! - `H`, `W`: Height and width in pixels
//!
//! ## Example
//!
//! ```rust,ignore
//! use eot_core::{ImageShape, Seed};
//!
//! let mut rng = Seed::new(42).to_rng();
//! let shape = ImageShape::new(2, 3, 32, 32);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod labels;
mod phase;
mod seed;
mod shape;
mod tensor;
mod transform;

pub use error::{CoreError, Result};
pub use labels::{BoundingBox, DetectionTarget, LabelType, Labels};
pub use phase::Phase;
pub use seed::Seed;
pub use shape::ImageShape;
pub use tensor::{ImageBatch, ImageTensor};
pub use transform::{Compose, Identity, Transform};

/// Backend type aliases for convenience
pub mod backend {
    #[cfg(feature = "backend-ndarray")]
    pub use burn_ndarray::NdArray;
}

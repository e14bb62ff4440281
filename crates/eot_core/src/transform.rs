//! Transform trait for image preprocessing.

use burn::prelude::*;
use rand::RngCore;

use crate::error::Result;
use crate::phase::Phase;
use crate::tensor::ImageBatch;

/// A transform that can be applied to image batches.
///
/// Transforms are the unit a preprocessing pipeline is built from. They
/// hold only immutable configuration; all randomness comes from the `rng`
/// passed to [`Transform::apply`], so one transform can serve many
/// threads, each with its own generator.
///
/// # Implementation Notes
///
/// - Draw fresh values from `rng` on every call, never cache them
/// - Return `Result` instead of panicking
/// - Document the effect on the batch size
///
/// # Example
///
/// ```rust,ignore
/// use eot_core::{ImageBatch, Phase, Result, Transform};
/// use burn::prelude::*;
/// use rand::RngCore;
///
/// struct Invert;
///
/// impl<B: Backend> Transform<B> for Invert {
///     fn apply(&self, batch: ImageBatch<B>, _phase: Phase, _rng: &mut dyn RngCore) -> Result<ImageBatch<B>> {
///         // Flip intensities...
///         Ok(batch)
///     }
/// }
/// ```
pub trait Transform<B: Backend>: Send + Sync {
    /// Apply the transform to a batch.
    ///
    /// # Arguments
    ///
    /// * `batch` - The input batch to transform
    /// * `phase` - The pipeline phase (fit/predict)
    /// * `rng` - Random source for this call
    fn apply(&self, batch: ImageBatch<B>, phase: Phase, rng: &mut dyn RngCore) -> Result<ImageBatch<B>>;

    /// Get the name of this transform for logging/debugging.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Check if this transform should be applied in the given phase.
    ///
    /// By default, transforms are applied in every phase.
    fn should_apply(&self, _phase: Phase) -> bool {
        true
    }
}

impl<B: Backend> Transform<B> for Box<dyn Transform<B>> {
    fn apply(&self, batch: ImageBatch<B>, phase: Phase, rng: &mut dyn RngCore) -> Result<ImageBatch<B>> {
        self.as_ref().apply(batch, phase, rng)
    }

    fn name(&self) -> &str {
        self.as_ref().name()
    }

    fn should_apply(&self, phase: Phase) -> bool {
        self.as_ref().should_apply(phase)
    }
}

/// Identity transform that passes through data unchanged.
#[derive(Debug, Clone, Default)]
pub struct Identity;

impl<B: Backend> Transform<B> for Identity {
    fn apply(&self, batch: ImageBatch<B>, _phase: Phase, _rng: &mut dyn RngCore) -> Result<ImageBatch<B>> {
        Ok(batch)
    }

    fn name(&self) -> &str {
        "Identity"
    }
}

/// A composed transform that applies multiple transforms in sequence.
///
/// Steps that are inactive for the current phase are skipped.
#[derive(Default)]
pub struct Compose<B: Backend> {
    transforms: Vec<Box<dyn Transform<B>>>,
}

impl<B: Backend> Compose<B> {
    /// Create a new empty composition.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Add a transform to the composition.
    pub fn push<T: Transform<B> + 'static>(&mut self, transform: T) {
        self.transforms.push(Box::new(transform));
    }

    /// Builder-style [`Compose::push`].
    #[must_use]
    pub fn add<T: Transform<B> + 'static>(mut self, transform: T) -> Self {
        self.push(transform);
        self
    }

    /// Create a composition from a vector of transforms.
    #[must_use]
    pub fn from_vec(transforms: Vec<Box<dyn Transform<B>>>) -> Self {
        Self { transforms }
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Whether the composition has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl<B: Backend> Transform<B> for Compose<B> {
    fn apply(&self, mut batch: ImageBatch<B>, phase: Phase, rng: &mut dyn RngCore) -> Result<ImageBatch<B>> {
        for transform in &self.transforms {
            if transform.should_apply(phase) {
                batch = transform.apply(batch, phase, rng)?;
            }
        }
        Ok(batch)
    }

    fn name(&self) -> &str {
        "Compose"
    }

    fn should_apply(&self, phase: Phase) -> bool {
        self.transforms.iter().any(|t| t.should_apply(phase))
    }
}

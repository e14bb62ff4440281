//! Expectation over Transformation.
//!
//! EoT estimates how a model behaves on average over random transforms of
//! its input. [`ExpectationOverTransformation`] fans every image of a batch
//! out into `nb_samples` copies, hands them to a strategy that transforms
//! each copy with independently drawn parameters, and clips the result to
//! the valid pixel range.

use burn::prelude::*;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use eot_core::{CoreError, ImageBatch, ImageTensor, Labels, Phase, Result, Transform};

fn default_true() -> bool {
    true
}

/// Configuration shared by every EoT step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EoTConfig {
    /// Number of random samples per input image.
    pub nb_samples: usize,
    /// `(min, max)` range valid pixel values are clipped to.
    pub clip_values: (f32, f32),
    /// Whether the step runs while fitting.
    #[serde(default)]
    pub apply_fit: bool,
    /// Whether the step runs while predicting.
    #[serde(default = "default_true")]
    pub apply_predict: bool,
}

impl Default for EoTConfig {
    fn default() -> Self {
        Self {
            nb_samples: 1,
            clip_values: (0.0, 1.0),
            apply_fit: false,
            apply_predict: true,
        }
    }
}

impl EoTConfig {
    /// Set the phase gating.
    #[must_use]
    pub fn with_phases(mut self, apply_fit: bool, apply_predict: bool) -> Self {
        self.apply_fit = apply_fit;
        self.apply_predict = apply_predict;
        self
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.nb_samples < 1 {
            return Err(CoreError::invalid_config(format!(
                "The number of samples needs to be an integer greater than or equal to 1, got {}",
                self.nb_samples
            )));
        }
        let (min, max) = self.clip_values;
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(CoreError::invalid_config(format!(
                "clip_values has to be a pair of finite floats (min, max) with min <= max, got ({min}, {max})"
            )));
        }
        Ok(())
    }
}

/// A transform family member that EoT samples from.
///
/// Receives the already fanned-out batch and must draw its parameters
/// independently for every sample. Clipping is done by the caller.
pub trait EoTStrategy<B: Backend>: Send + Sync {
    /// Name for logging/debugging.
    fn name(&self) -> &str;

    /// Transform images and their labels.
    fn transform(
        &self,
        x: ImageTensor<B>,
        y: Option<Labels<B>>,
        rng: &mut dyn RngCore,
    ) -> Result<(ImageTensor<B>, Option<Labels<B>>)>;
}

/// An EoT preprocessing step: shared configuration plus one strategy.
#[derive(Debug, Clone)]
pub struct ExpectationOverTransformation<S> {
    config: EoTConfig,
    strategy: S,
}

impl<S> ExpectationOverTransformation<S> {
    /// Combine a configuration with a strategy.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the configuration is invalid.
    pub fn with_strategy(config: EoTConfig, strategy: S) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, strategy })
    }

    /// The shared configuration.
    #[must_use]
    pub const fn config(&self) -> &EoTConfig {
        &self.config
    }

    /// The strategy.
    #[must_use]
    pub const fn strategy(&self) -> &S {
        &self.strategy
    }
}

impl<B: Backend, S: EoTStrategy<B>> Transform<B> for ExpectationOverTransformation<S> {
    /// Output batch size is `nb_samples` times the input batch size; the
    /// samples of input image `i` occupy rows `i * nb_samples ..`.
    fn apply(&self, batch: ImageBatch<B>, phase: Phase, rng: &mut dyn RngCore) -> Result<ImageBatch<B>> {
        if !Transform::<B>::should_apply(self, phase) {
            return Ok(batch);
        }

        let n = self.config.nb_samples;
        tracing::debug!(
            strategy = self.strategy.name(),
            %phase,
            batch = batch.batch_size(),
            nb_samples = n,
            "applying expectation over transformation"
        );

        let x = batch.x.repeat_interleave(n);
        let y = batch.y.map(|y| y.repeat_interleave(n));
        let (x, y) = self.strategy.transform(x, y, rng)?;

        let (min, max) = self.config.clip_values;
        Ok(ImageBatch {
            x: x.clamp(min, max),
            y,
        })
    }

    fn name(&self) -> &str {
        self.strategy.name()
    }

    fn should_apply(&self, phase: Phase) -> bool {
        phase.select(self.config.apply_fit, self.config.apply_predict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eot_core::backend::NdArray;
    use eot_core::{ImageShape, Seed};

    type TestBackend = NdArray;

    /// Adds a fresh random offset to every sample.
    struct Jitter;

    impl<B: Backend> EoTStrategy<B> for Jitter {
        fn name(&self) -> &str {
            "Jitter"
        }

        fn transform(
            &self,
            x: ImageTensor<B>,
            y: Option<Labels<B>>,
            rng: &mut dyn RngCore,
        ) -> Result<(ImageTensor<B>, Option<Labels<B>>)> {
            use rand::Rng;
            let shape = x.shape();
            let device = x.device();
            let mut values = x.to_values()?;
            for image in values.chunks_mut(shape.image_len()) {
                let offset: f32 = rng.gen_range(0.0..0.1);
                image.iter_mut().for_each(|v| *v += offset);
            }
            Ok((ImageTensor::from_values(values, shape, &device)?, y))
        }
    }

    #[test]
    fn test_eot_config_default() {
        let config = EoTConfig::default();
        assert_eq!(config.nb_samples, 1);
        assert_eq!(config.clip_values, (0.0, 1.0));
        assert!(!config.apply_fit);
        assert!(config.apply_predict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_eot_config_validation() {
        let zero_samples = EoTConfig {
            nb_samples: 0,
            ..Default::default()
        };
        assert!(matches!(zero_samples.validate(), Err(CoreError::InvalidConfig(_))));

        let inverted_clip = EoTConfig {
            clip_values: (1.0, 0.0),
            ..Default::default()
        };
        assert!(inverted_clip.validate().is_err());

        let point_clip = EoTConfig {
            clip_values: (0.5, 0.5),
            ..Default::default()
        };
        assert!(point_clip.validate().is_ok());
    }

    #[test]
    fn test_fan_out_and_clip() {
        let device = Default::default();
        let eot = ExpectationOverTransformation::with_strategy(
            EoTConfig {
                nb_samples: 3,
                clip_values: (0.0, 1.0),
                ..Default::default()
            },
            Jitter,
        )
        .unwrap();

        let x = ImageTensor::<TestBackend>::from_values(
            vec![0.5, 0.5, 2.0, 2.0],
            ImageShape::new(2, 1, 1, 2),
            &device,
        )
        .unwrap();
        let y = Tensor::<TestBackend, 2>::from_floats([[0.0], [1.0]], &device);
        let batch = ImageBatch::with_labels(x, Labels::Classification(y)).unwrap();

        let mut rng = Seed::new(7).to_rng();
        let out = eot.apply(batch, Phase::Predict, &mut rng).unwrap();

        assert_eq!(out.x.shape(), ImageShape::new(6, 1, 1, 2));
        let values = out.x.to_values().unwrap();
        assert!(values[..6].iter().all(|v| (0.5..0.6).contains(v)));
        assert!(values[6..].iter().all(|&v| v == 1.0));

        let Some(Labels::Classification(y)) = out.y else {
            panic!("expected classification labels");
        };
        assert_eq!(
            y.into_data().to_vec::<f32>().unwrap(),
            vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]
        );
    }

    #[test]
    fn test_phase_gating() {
        let device = Default::default();
        let eot = ExpectationOverTransformation::with_strategy(
            EoTConfig {
                nb_samples: 2,
                ..Default::default()
            },
            Jitter,
        )
        .unwrap();
        assert!(<_ as Transform<TestBackend>>::should_apply(&eot, Phase::Predict));
        assert!(!<_ as Transform<TestBackend>>::should_apply(&eot, Phase::Fit));

        let batch = ImageBatch::new(ImageTensor::<TestBackend>::full(
            ImageShape::new(1, 1, 2, 2),
            5.0,
            &device,
        ));
        let mut rng = Seed::new(7).to_rng();
        let out = eot.apply(batch, Phase::Fit, &mut rng).unwrap();
        assert_eq!(out.batch_size(), 1);
        assert_eq!(out.x.to_values().unwrap(), vec![5.0; 4]);
    }

    #[test]
    fn test_name_comes_from_strategy() {
        let eot = ExpectationOverTransformation::with_strategy(EoTConfig::default(), Jitter).unwrap();
        assert_eq!(<_ as Transform<TestBackend>>::name(&eot), "Jitter");
    }
}

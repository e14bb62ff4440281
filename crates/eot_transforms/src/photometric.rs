//! Photometric EoT strategies: brightness, contrast and Gaussian noise.
//!
//! These change pixel intensities only, so labels of every type pass
//! through untouched.

use burn::prelude::*;
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use eot_core::{CoreError, ImageTensor, Labels, Result};

use crate::eot::{EoTConfig, EoTStrategy, ExpectationOverTransformation};

fn check_range(name: &str, (lo, hi): (f32, f32), min: Option<f32>) -> Result<()> {
    if !lo.is_finite() || !hi.is_finite() || lo > hi {
        return Err(CoreError::invalid_config(format!(
            "{name} must be a pair (low, high) of finite floats with low <= high, got ({lo}, {hi})"
        )));
    }
    if let Some(min) = min {
        if lo < min {
            return Err(CoreError::invalid_config(format!(
                "{name} must not go below {min}, got ({lo}, {hi})"
            )));
        }
    }
    Ok(())
}

fn sample_range(rng: &mut dyn RngCore, (lo, hi): (f32, f32)) -> f32 {
    if lo == hi {
        lo
    } else {
        rng.gen_range(lo..=hi)
    }
}

/// Apply `f` to every image of `x` with a freshly drawn per-image parameter.
fn map_images<B: Backend>(
    x: ImageTensor<B>,
    rng: &mut dyn RngCore,
    mut f: impl FnMut(&mut [f32], &mut dyn RngCore) -> Result<()>,
) -> Result<ImageTensor<B>> {
    let shape = x.shape();
    let device = x.device();
    let mut values = x.to_values()?;
    for image in values.chunks_mut(shape.image_len().max(1)) {
        f(image, rng)?;
    }
    ImageTensor::from_values(values, shape, &device)
}

/// Configuration for random brightness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrightnessConfig {
    /// Range of the additive delta.
    pub delta: (f32, f32),
}

impl Default for BrightnessConfig {
    fn default() -> Self {
        Self { delta: (-0.1, 0.1) }
    }
}

/// Adds a random constant to every pixel of each sample.
#[derive(Debug, Clone)]
pub struct Brightness {
    config: BrightnessConfig,
}

impl Brightness {
    /// Create a brightness strategy.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the delta range is invalid.
    pub fn new(config: BrightnessConfig) -> Result<Self> {
        check_range("delta", config.delta, None)?;
        Ok(Self { config })
    }
}

impl<B: Backend> EoTStrategy<B> for Brightness {
    fn name(&self) -> &str {
        "Brightness"
    }

    fn transform(
        &self,
        x: ImageTensor<B>,
        y: Option<Labels<B>>,
        rng: &mut dyn RngCore,
    ) -> Result<(ImageTensor<B>, Option<Labels<B>>)> {
        let delta = self.config.delta;
        let x = map_images(x, rng, |image, rng| {
            let d = sample_range(rng, delta);
            image.iter_mut().for_each(|v| *v += d);
            Ok(())
        })?;
        Ok((x, y))
    }
}

/// Configuration for random contrast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastConfig {
    /// Range of the contrast factor; `1.0` leaves an image unchanged.
    pub factor: (f32, f32),
}

impl Default for ContrastConfig {
    fn default() -> Self {
        Self { factor: (0.8, 1.2) }
    }
}

/// Scales each sample's deviation from its mean by a random factor.
#[derive(Debug, Clone)]
pub struct Contrast {
    config: ContrastConfig,
}

impl Contrast {
    /// Create a contrast strategy.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the factor range is invalid or negative.
    pub fn new(config: ContrastConfig) -> Result<Self> {
        check_range("factor", config.factor, Some(0.0))?;
        Ok(Self { config })
    }
}

impl<B: Backend> EoTStrategy<B> for Contrast {
    fn name(&self) -> &str {
        "Contrast"
    }

    fn transform(
        &self,
        x: ImageTensor<B>,
        y: Option<Labels<B>>,
        rng: &mut dyn RngCore,
    ) -> Result<(ImageTensor<B>, Option<Labels<B>>)> {
        let factor = self.config.factor;
        let x = map_images(x, rng, |image, rng| {
            let f = sample_range(rng, factor);
            let mean = image.iter().sum::<f32>() / image.len() as f32;
            image.iter_mut().for_each(|v| *v = mean + f * (*v - mean));
            Ok(())
        })?;
        Ok((x, y))
    }
}

/// Configuration for random Gaussian noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianNoiseConfig {
    /// Range the per-sample standard deviation is drawn from.
    pub std: (f32, f32),
}

impl Default for GaussianNoiseConfig {
    fn default() -> Self {
        Self { std: (0.0, 0.1) }
    }
}

/// Adds zero-mean Gaussian noise with a random standard deviation per sample.
#[derive(Debug, Clone)]
pub struct GaussianNoise {
    config: GaussianNoiseConfig,
}

impl GaussianNoise {
    /// Create a Gaussian noise strategy.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the std range is invalid or negative.
    pub fn new(config: GaussianNoiseConfig) -> Result<Self> {
        check_range("std", config.std, Some(0.0))?;
        Ok(Self { config })
    }
}

impl<B: Backend> EoTStrategy<B> for GaussianNoise {
    fn name(&self) -> &str {
        "GaussianNoise"
    }

    fn transform(
        &self,
        x: ImageTensor<B>,
        y: Option<Labels<B>>,
        rng: &mut dyn RngCore,
    ) -> Result<(ImageTensor<B>, Option<Labels<B>>)> {
        let std = self.config.std;
        let x = map_images(x, rng, |image, rng| {
            let sigma = sample_range(rng, std);
            let normal = Normal::new(0.0f32, sigma).map_err(|e| {
                CoreError::TransformError(format!("invalid noise std {sigma}: {e}"))
            })?;
            image.iter_mut().for_each(|v| *v += normal.sample(rng));
            Ok(())
        })?;
        Ok((x, y))
    }
}

/// EoT with random brightness.
pub type EoTBrightness = ExpectationOverTransformation<Brightness>;

impl ExpectationOverTransformation<Brightness> {
    /// Create an EoT brightness step.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if any parameter is invalid.
    pub fn new(nb_samples: usize, clip_values: (f32, f32), delta: (f32, f32)) -> Result<Self> {
        let config = EoTConfig {
            nb_samples,
            clip_values,
            ..Default::default()
        };
        Self::with_strategy(config, Brightness::new(BrightnessConfig { delta })?)
    }
}

/// EoT with random contrast.
pub type EoTContrast = ExpectationOverTransformation<Contrast>;

impl ExpectationOverTransformation<Contrast> {
    /// Create an EoT contrast step.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if any parameter is invalid.
    pub fn new(nb_samples: usize, clip_values: (f32, f32), factor: (f32, f32)) -> Result<Self> {
        let config = EoTConfig {
            nb_samples,
            clip_values,
            ..Default::default()
        };
        Self::with_strategy(config, Contrast::new(ContrastConfig { factor })?)
    }
}

/// EoT with random Gaussian noise.
pub type EoTGaussianNoise = ExpectationOverTransformation<GaussianNoise>;

impl ExpectationOverTransformation<GaussianNoise> {
    /// Create an EoT Gaussian noise step.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if any parameter is invalid.
    pub fn new(nb_samples: usize, clip_values: (f32, f32), std: (f32, f32)) -> Result<Self> {
        let config = EoTConfig {
            nb_samples,
            clip_values,
            ..Default::default()
        };
        Self::with_strategy(config, GaussianNoise::new(GaussianNoiseConfig { std })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eot_core::backend::NdArray;
    use eot_core::{ImageBatch, ImageShape, Phase, Seed, Transform};

    type TestBackend = NdArray;

    fn images(values: Vec<f32>, shape: ImageShape) -> ImageTensor<TestBackend> {
        ImageTensor::from_values(values, shape, &Default::default()).unwrap()
    }

    #[test]
    fn test_photometric_config_defaults() {
        assert_eq!(BrightnessConfig::default().delta, (-0.1, 0.1));
        assert_eq!(ContrastConfig::default().factor, (0.8, 1.2));
        assert_eq!(GaussianNoiseConfig::default().std, (0.0, 0.1));
    }

    #[test]
    fn test_photometric_validation() {
        assert!(Brightness::new(BrightnessConfig { delta: (0.2, -0.2) }).is_err());
        assert!(Brightness::new(BrightnessConfig { delta: (-0.3, -0.1) }).is_ok());
        assert!(Contrast::new(ContrastConfig { factor: (-0.5, 1.0) }).is_err());
        assert!(GaussianNoise::new(GaussianNoiseConfig { std: (-0.1, 0.1) }).is_err());
        assert!(GaussianNoise::new(GaussianNoiseConfig { std: (0.0, f32::INFINITY) }).is_err());
    }

    #[test]
    fn test_gaussian_noise_reports_bad_std() {
        // Bypasses `GaussianNoise::new`, which would reject this range.
        let noise = GaussianNoise {
            config: GaussianNoiseConfig { std: (-1.0, -1.0) },
        };
        let x = images(vec![0.5; 4], ImageShape::new(1, 1, 2, 2));
        let mut rng = Seed::new(0).to_rng();
        let result = EoTStrategy::<TestBackend>::transform(&noise, x, None, &mut rng);
        assert!(matches!(result, Err(CoreError::TransformError(_))));
    }

    #[test]
    fn test_brightness_constant_delta() {
        let strategy = Brightness::new(BrightnessConfig { delta: (0.25, 0.25) }).unwrap();
        let x = images(vec![0.0, 0.5, 1.0, 1.5], ImageShape::new(1, 1, 2, 2));
        let mut rng = Seed::new(0).to_rng();

        let (x, _) = EoTStrategy::<TestBackend>::transform(&strategy, x, None, &mut rng).unwrap();
        assert_eq!(x.to_values().unwrap(), vec![0.25, 0.75, 1.25, 1.75]);
    }

    #[test]
    fn test_contrast_preserves_mean() {
        let strategy = Contrast::new(ContrastConfig { factor: (0.0, 2.0) }).unwrap();
        let x = images(vec![0.0, 1.0, 2.0, 3.0], ImageShape::new(1, 1, 2, 2));
        let mut rng = Seed::new(11).to_rng();

        let (x, _) = EoTStrategy::<TestBackend>::transform(&strategy, x, None, &mut rng).unwrap();
        let values = x.to_values().unwrap();
        let mean = values.iter().sum::<f32>() / 4.0;
        assert!((mean - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_zero_noise_is_identity() {
        let strategy = GaussianNoise::new(GaussianNoiseConfig { std: (0.0, 0.0) }).unwrap();
        let x = images(vec![0.1, 0.2, 0.3, 0.4], ImageShape::new(1, 1, 2, 2));
        let mut rng = Seed::new(5).to_rng();

        let (x, _) = EoTStrategy::<TestBackend>::transform(&strategy, x, None, &mut rng).unwrap();
        assert_eq!(x.to_values().unwrap(), vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_eot_noise_stays_clipped() {
        let eot = EoTGaussianNoise::new(4, (0.0, 1.0), (0.5, 1.0)).unwrap();
        let batch = ImageBatch::new(ImageTensor::<TestBackend>::full(
            ImageShape::new(2, 3, 8, 8),
            0.5,
            &Default::default(),
        ));
        let mut rng = Seed::new(9).to_rng();

        let out = eot.apply(batch, Phase::Predict, &mut rng).unwrap();
        assert_eq!(out.batch_size(), 8);
        assert!(out
            .x
            .to_values()
            .unwrap()
            .iter()
            .all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_eot_constructors() {
        assert!(EoTBrightness::new(2, (0.0, 1.0), (-0.2, 0.2)).is_ok());
        assert!(EoTContrast::new(0, (0.0, 1.0), (0.5, 1.5)).is_err());
        assert!(EoTGaussianNoise::new(1, (1.0, 0.0), (0.0, 0.1)).is_err());
    }
}

//! Selecting an EoT strategy from configuration.
//!
//! ```json
//! {
//!   "nb_samples": 8,
//!   "clip_values": [0.0, 1.0],
//!   "strategy": { "kind": "image_rotation", "angles": 30.0 }
//! }
//! ```

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use eot_core::{CoreError, Result, Transform};

use crate::eot::{EoTConfig, ExpectationOverTransformation};
use crate::photometric::{
    Brightness, BrightnessConfig, Contrast, ContrastConfig, GaussianNoise, GaussianNoiseConfig,
};
use crate::rotation::{ImageRotation, ImageRotationConfig};

/// The strategy an EoT step samples from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EoTStrategyConfig {
    /// Random rotation, see [`ImageRotation`].
    ImageRotation(ImageRotationConfig),
    /// Random brightness, see [`Brightness`].
    Brightness(BrightnessConfig),
    /// Random contrast, see [`Contrast`].
    Contrast(ContrastConfig),
    /// Random Gaussian noise, see [`GaussianNoise`].
    GaussianNoise(GaussianNoiseConfig),
}

impl Default for EoTStrategyConfig {
    fn default() -> Self {
        Self::ImageRotation(ImageRotationConfig::default())
    }
}

/// A complete EoT step: shared settings plus the strategy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EoTPipelineConfig {
    /// Fan-out, clipping and phase gating.
    #[serde(flatten)]
    pub eot: EoTConfig,
    /// Strategy parameters.
    #[serde(default)]
    pub strategy: EoTStrategyConfig,
}

impl EoTPipelineConfig {
    /// Parse a config from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SerializationError`] for malformed JSON or unknown
    /// variants (e.g. an unsupported `label_type`).
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::SerializationError(e.to_string()))
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SerializationError`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::SerializationError(e.to_string()))
    }

    /// Validate and build the step.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if any parameter is invalid.
    pub fn build<B: Backend>(&self) -> Result<Box<dyn Transform<B>>> {
        let eot = self.eot.clone();
        let step: Box<dyn Transform<B>> = match &self.strategy {
            EoTStrategyConfig::ImageRotation(c) => Box::new(ExpectationOverTransformation::with_strategy(
                eot,
                ImageRotation::new(c.clone())?,
            )?),
            EoTStrategyConfig::Brightness(c) => Box::new(ExpectationOverTransformation::with_strategy(
                eot,
                Brightness::new(c.clone())?,
            )?),
            EoTStrategyConfig::Contrast(c) => Box::new(ExpectationOverTransformation::with_strategy(
                eot,
                Contrast::new(c.clone())?,
            )?),
            EoTStrategyConfig::GaussianNoise(c) => Box::new(ExpectationOverTransformation::with_strategy(
                eot,
                GaussianNoise::new(c.clone())?,
            )?),
        };
        tracing::debug!(step = step.name(), "built EoT step");
        Ok(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::AngleRange;
    use eot_core::backend::NdArray;
    use eot_core::{LabelType, Phase};

    type TestBackend = NdArray;

    #[test]
    fn test_pipeline_config_rotation_json() {
        let config = EoTPipelineConfig::from_json(
            r#"{
                "nb_samples": 8,
                "clip_values": [0.0, 1.0],
                "apply_fit": true,
                "strategy": { "kind": "image_rotation", "angles": 30.0, "label_type": "object_detection" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.eot.nb_samples, 8);
        assert!(config.eot.apply_fit);
        let EoTStrategyConfig::ImageRotation(rotation) = &config.strategy else {
            panic!("expected rotation strategy");
        };
        assert_eq!(rotation.angles, AngleRange::Symmetric(30.0));
        assert_eq!(rotation.label_type, LabelType::ObjectDetection);

        let step = config.build::<TestBackend>().unwrap();
        assert_eq!(step.name(), "ImageRotation");
        assert!(step.should_apply(Phase::Fit));
        assert!(step.should_apply(Phase::Predict));
    }

    #[test]
    fn test_pipeline_config_photometric_json() {
        let config = EoTPipelineConfig::from_json(
            r#"{
                "nb_samples": 2,
                "clip_values": [0.0, 255.0],
                "strategy": { "kind": "contrast", "factor": [0.5, 1.5] }
            }"#,
        )
        .unwrap();
        let step = config.build::<TestBackend>().unwrap();
        assert_eq!(step.name(), "Contrast");
        assert!(!step.should_apply(Phase::Fit));
    }

    #[test]
    fn test_pipeline_config_rejects_invalid_values() {
        let bad_angle = EoTPipelineConfig::from_json(
            r#"{ "nb_samples": 1, "clip_values": [0.0, 1.0],
                 "strategy": { "kind": "image_rotation", "angles": 190.0 } }"#,
        )
        .unwrap();
        assert!(matches!(
            bad_angle.build::<TestBackend>(),
            Err(CoreError::InvalidConfig(_))
        ));

        let bad_label = EoTPipelineConfig::from_json(
            r#"{ "nb_samples": 1, "clip_values": [0.0, 1.0],
                 "strategy": { "kind": "image_rotation", "label_type": "segmentation" } }"#,
        );
        assert!(matches!(bad_label, Err(CoreError::SerializationError(_))));

        let unknown_kind = EoTPipelineConfig::from_json(
            r#"{ "nb_samples": 1, "clip_values": [0.0, 1.0], "strategy": { "kind": "zoom_blur" } }"#,
        );
        assert!(unknown_kind.is_err());
    }

    #[test]
    fn test_pipeline_config_json_roundtrip() {
        let config = EoTPipelineConfig {
            eot: EoTConfig::default().with_phases(true, false),
            strategy: EoTStrategyConfig::GaussianNoise(GaussianNoiseConfig { std: (0.0, 0.05) }),
        };
        let restored = EoTPipelineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(restored.eot, config.eot);
        let EoTStrategyConfig::GaussianNoise(noise) = restored.strategy else {
            panic!("expected gaussian noise strategy");
        };
        assert_eq!(noise.std, (0.0, 0.05));
    }
}

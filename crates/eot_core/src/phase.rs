//! Pipeline phases a preprocessing step can be active in.

use serde::{Deserialize, Serialize};

/// The pipeline phase a batch is flowing through.
///
/// Preprocessing steps carry `apply_fit` / `apply_predict` flags; the
/// enclosing pipeline passes the current phase and each step decides
/// whether it runs.
///
/// # Example
///
/// ```rust
/// use eot_core::Phase;
///
/// let phase = Phase::Predict;
/// assert!(phase.is_predict());
/// assert!(!phase.is_fit());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Fitting/training a model.
    Fit,
    /// Predicting with a model, including attack-time gradient queries.
    #[default]
    Predict,
}

impl Phase {
    /// Check if this is the fit phase.
    #[must_use]
    pub const fn is_fit(&self) -> bool {
        matches!(self, Phase::Fit)
    }

    /// Check if this is the predict phase.
    #[must_use]
    pub const fn is_predict(&self) -> bool {
        matches!(self, Phase::Predict)
    }

    /// Select the flag that governs this phase.
    #[must_use]
    pub const fn select(&self, apply_fit: bool, apply_predict: bool) -> bool {
        match self {
            Phase::Fit => apply_fit,
            Phase::Predict => apply_predict,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Fit => write!(f, "fit"),
            Phase::Predict => write!(f, "predict"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_checks() {
        assert!(Phase::Fit.is_fit());
        assert!(!Phase::Fit.is_predict());
        assert!(Phase::Predict.is_predict());
        assert!(!Phase::Predict.is_fit());
        assert_eq!(Phase::default(), Phase::Predict);
    }

    #[test]
    fn test_phase_select() {
        assert!(!Phase::Fit.select(false, true));
        assert!(Phase::Predict.select(false, true));
        assert!(Phase::Fit.select(true, false));
        assert!(!Phase::Predict.select(true, false));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(format!("{}", Phase::Fit), "fit");
        assert_eq!(format!("{}", Phase::Predict), "predict");
    }
}

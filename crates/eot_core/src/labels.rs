//! Label types that travel with an image batch.

use std::str::FromStr;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// The semantic category of the prediction target.
///
/// Decides how labels co-transform with their images: classification
/// targets are invariant under geometric transforms, detection targets
/// move with the pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LabelType {
    /// One class (or class distribution) per image.
    #[default]
    Classification,
    /// Bounding boxes, classes and optional instance masks per image.
    ObjectDetection,
}

impl LabelType {
    /// All supported label types.
    pub const ALL: [LabelType; 2] = [LabelType::Classification, LabelType::ObjectDetection];

    /// The canonical string name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LabelType::Classification => "classification",
            LabelType::ObjectDetection => "object_detection",
        }
    }
}

impl std::fmt::Display for LabelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|label_type| label_type.as_str() == s)
            .ok_or_else(|| {
                let supported: Vec<&str> = Self::ALL.iter().map(LabelType::as_str).collect();
                CoreError::invalid_config(format!(
                    "label_type needs to be one of {supported:?}, currently receiving `{s}`"
                ))
            })
    }
}

/// An axis-aligned bounding box in pixel coordinates.
///
/// `x` runs along the image width and `y` along the height, both from the
/// top-left corner. Pixel `i` covers `[i, i + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x1: f32,
    /// Top edge.
    pub y1: f32,
    /// Right edge.
    pub x2: f32,
    /// Bottom edge.
    pub y2: f32,
}

impl BoundingBox {
    /// Create a box from its corners, normalising the order.
    #[must_use]
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// The smallest box enclosing all the given points.
    ///
    /// Returns `None` for an empty iterator.
    pub fn enclosing(points: impl IntoIterator<Item = (f32, f32)>) -> Option<Self> {
        let mut points = points.into_iter();
        let (x, y) = points.next()?;
        let init = Self { x1: x, y1: y, x2: x, y2: y };
        Some(points.fold(init, |b, (x, y)| Self {
            x1: b.x1.min(x),
            y1: b.y1.min(y),
            x2: b.x2.max(x),
            y2: b.y2.max(y),
        }))
    }

    /// Corners in the order top-left, top-right, bottom-right, bottom-left.
    #[must_use]
    pub const fn corners(&self) -> [(f32, f32); 4] {
        [
            (self.x1, self.y1),
            (self.x2, self.y1),
            (self.x2, self.y2),
            (self.x1, self.y2),
        ]
    }

    /// Box width.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    /// Box height.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Box area.
    #[must_use]
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Clip to `[0, width] x [0, height]`.
    #[must_use]
    pub fn clip(&self, width: f32, height: f32) -> Self {
        Self {
            x1: self.x1.clamp(0.0, width),
            y1: self.y1.clamp(0.0, height),
            x2: self.x2.clamp(0.0, width),
            y2: self.y2.clamp(0.0, height),
        }
    }

    /// Whether `other` lies inside this box, up to `tol`.
    #[must_use]
    pub fn contains(&self, other: &Self, tol: f32) -> bool {
        other.x1 >= self.x1 - tol
            && other.y1 >= self.y1 - tol
            && other.x2 <= self.x2 + tol
            && other.y2 <= self.y2 + tol
    }
}

/// Detection target for one image.
#[derive(Debug, Clone)]
pub struct DetectionTarget<B: Backend> {
    /// Boxes in pixel coordinates.
    pub boxes: Vec<BoundingBox>,
    /// Class index per box.
    pub classes: Vec<i64>,
    /// Optional instance masks `(n_boxes, H, W)`.
    pub masks: Option<Tensor<B, 3>>,
}

impl<B: Backend> DetectionTarget<B> {
    /// Create a target from boxes and their classes.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of boxes and classes differ.
    pub fn new(boxes: Vec<BoundingBox>, classes: Vec<i64>) -> Result<Self> {
        if boxes.len() != classes.len() {
            return Err(CoreError::ShapeMismatch(format!(
                "{} boxes but {} classes",
                boxes.len(),
                classes.len()
            )));
        }
        Ok(Self {
            boxes,
            classes,
            masks: None,
        })
    }

    /// Attach instance masks.
    ///
    /// # Errors
    ///
    /// Returns an error if the mask count differs from the box count.
    pub fn with_masks(mut self, masks: Tensor<B, 3>) -> Result<Self> {
        let n_masks = masks.dims()[0];
        if n_masks != self.boxes.len() {
            return Err(CoreError::ShapeMismatch(format!(
                "{} masks but {} boxes",
                n_masks,
                self.boxes.len()
            )));
        }
        self.masks = Some(masks);
        Ok(self)
    }

    /// Check that boxes, classes and masks describe the same objects.
    ///
    /// The fields are public, so a target built by hand may disagree with
    /// itself; [`DetectionTarget::new`] and [`DetectionTarget::with_masks`]
    /// never produce one that fails this check.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ShapeMismatch`] if the counts differ.
    pub fn validate(&self) -> Result<()> {
        if self.classes.len() != self.boxes.len() {
            return Err(CoreError::ShapeMismatch(format!(
                "{} boxes but {} classes",
                self.boxes.len(),
                self.classes.len()
            )));
        }
        if let Some(masks) = &self.masks {
            let n_masks = masks.dims()[0];
            if n_masks != self.boxes.len() {
                return Err(CoreError::ShapeMismatch(format!(
                    "{} masks but {} boxes",
                    n_masks,
                    self.boxes.len()
                )));
            }
        }
        Ok(())
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether the target has no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// Labels for a batch, tagged by label type.
#[derive(Debug, Clone)]
pub enum Labels<B: Backend> {
    /// `(batch, k)` class indices or class distributions.
    Classification(Tensor<B, 2>),
    /// One detection target per image.
    Detection(Vec<DetectionTarget<B>>),
}

impl<B: Backend> Labels<B> {
    /// The label type these labels belong to.
    #[must_use]
    pub const fn label_type(&self) -> LabelType {
        match self {
            Labels::Classification(_) => LabelType::Classification,
            Labels::Detection(_) => LabelType::ObjectDetection,
        }
    }

    /// Number of images the labels describe.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Labels::Classification(y) => y.dims()[0],
            Labels::Detection(targets) => targets.len(),
        }
    }

    /// Whether the labels describe no images.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Repeat every entry `n` times consecutively.
    ///
    /// Entry `i` ends up at positions `i * n .. (i + 1) * n`, matching the
    /// layout of [`crate::ImageTensor::repeat_interleave`].
    #[must_use]
    pub fn repeat_interleave(self, n: usize) -> Self {
        if n == 1 {
            return self;
        }
        match self {
            Labels::Classification(y) => {
                let rows = y.dims()[0];
                let indices = crate::tensor::interleave_indices::<B>(rows, n, &y.device());
                Labels::Classification(y.select(0, indices))
            }
            Labels::Detection(targets) => Labels::Detection(
                targets
                    .into_iter()
                    .flat_map(|t| std::iter::repeat(t).take(n))
                    .collect(),
            ),
        }
    }
}

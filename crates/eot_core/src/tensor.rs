//! Image tensor types.

use burn::prelude::*;
use burn::tensor::TensorData;

use crate::error::{CoreError, Result};
use crate::labels::Labels;
use crate::shape::ImageShape;

/// An image batch tensor with shape metadata.
///
/// Wraps a rank-4 Burn tensor laid out as `(B, C, H, W)`.
///
/// # Example
///
/// ```rust,ignore
/// use eot_core::ImageTensor;
///
/// let tensor = Tensor::<NdArray, 4>::zeros([2, 3, 32, 32], &device);
/// let images = ImageTensor::new(tensor);
/// ```
#[derive(Debug, Clone)]
pub struct ImageTensor<B: Backend> {
    inner: Tensor<B, 4>,
    shape: ImageShape,
}

impl<B: Backend> ImageTensor<B> {
    /// Wrap a `(B, C, H, W)` Burn tensor.
    pub fn new(tensor: Tensor<B, 4>) -> Self {
        let shape = ImageShape::from(tensor.dims());
        Self {
            inner: tensor,
            shape,
        }
    }

    /// Build a tensor from flat row-major values.
    ///
    /// # Errors
    ///
    /// Returns an error if `values` does not hold exactly `shape.numel()` elements.
    pub fn from_values(values: Vec<f32>, shape: ImageShape, device: &B::Device) -> Result<Self> {
        if values.len() != shape.numel() {
            return Err(CoreError::InvalidShape {
                expected: format!("{} values for {}", shape.numel(), shape),
                got: format!("{} values", values.len()),
            });
        }
        let data = TensorData::new(values, shape.as_array());
        Ok(Self {
            inner: Tensor::from_data(data, device),
            shape,
        })
    }

    /// Copy the elements out as flat row-major `f32` values.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend data cannot be read as `f32`.
    pub fn to_values(&self) -> Result<Vec<f32>> {
        self.inner
            .clone()
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| CoreError::TransformError(format!("Failed to get tensor data: {e:?}")))
    }

    /// Create a tensor filled with `value`.
    pub fn full(shape: ImageShape, value: f32, device: &B::Device) -> Self {
        Self {
            inner: Tensor::full(shape.as_array(), value, device),
            shape,
        }
    }

    /// Get the shape metadata.
    #[must_use]
    pub const fn shape(&self) -> ImageShape {
        self.shape
    }

    /// Get the batch size.
    #[must_use]
    pub const fn batch(&self) -> usize {
        self.shape.batch()
    }

    /// Get a reference to the underlying Burn tensor.
    #[must_use]
    pub const fn inner(&self) -> &Tensor<B, 4> {
        &self.inner
    }

    /// Consume self and return the underlying Burn tensor.
    #[must_use]
    pub fn into_inner(self) -> Tensor<B, 4> {
        self.inner
    }

    /// Get the device the tensor is on.
    pub fn device(&self) -> B::Device {
        self.inner.device()
    }

    /// Clamp every element into `[min, max]`.
    #[must_use]
    pub fn clamp(self, min: f32, max: f32) -> Self {
        Self {
            inner: self.inner.clamp(min, max),
            shape: self.shape,
        }
    }

    /// Repeat every image `n` times consecutively along the batch axis.
    #[must_use]
    pub fn repeat_interleave(self, n: usize) -> Self {
        if n == 1 {
            return self;
        }
        let indices = interleave_indices::<B>(self.batch(), n, &self.device());
        Self {
            inner: self.inner.select(0, indices),
            shape: self.shape.with_batch(self.shape.batch() * n),
        }
    }
}

/// Indices `[0, 0, .., 1, 1, .., rows - 1]` with every row repeated `n` times.
pub(crate) fn interleave_indices<B: Backend>(
    rows: usize,
    n: usize,
    device: &B::Device,
) -> Tensor<B, 1, Int> {
    let indices: Vec<i64> = (0..rows as i64)
        .flat_map(|i| std::iter::repeat(i).take(n))
        .collect();
    let len = indices.len();
    Tensor::from_data(TensorData::new(indices, [len]), device)
}

/// A batch of images with optional labels.
///
/// This is the value passed through every [`crate::Transform`].
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Images `(B, C, H, W)`.
    pub x: ImageTensor<B>,

    /// Optional labels, one entry per image.
    pub y: Option<Labels<B>>,
}

impl<B: Backend> ImageBatch<B> {
    /// Create a batch with just images.
    pub fn new(x: ImageTensor<B>) -> Self {
        Self { x, y: None }
    }

    /// Create a batch with images and labels.
    ///
    /// # Errors
    ///
    /// Returns an error if the label count differs from the image count, a
    /// detection target's boxes, classes and masks disagree in number, or a
    /// detection mask does not match the image size.
    pub fn with_labels(x: ImageTensor<B>, y: Labels<B>) -> Result<Self> {
        let x_batch = x.batch();
        let y_batch = y.len();

        if x_batch != y_batch {
            return Err(CoreError::ShapeMismatch(format!(
                "x batch size {} != y batch size {}",
                x_batch, y_batch
            )));
        }

        if let Labels::Detection(targets) = &y {
            let shape = x.shape();
            for target in targets {
                target.validate()?;
                if let Some(masks) = &target.masks {
                    let [_, h, w] = masks.dims();
                    if h != shape.height() || w != shape.width() {
                        return Err(CoreError::InvalidShape {
                            expected: format!("masks of {}x{}", shape.height(), shape.width()),
                            got: format!("masks of {h}x{w}"),
                        });
                    }
                }
            }
        }

        Ok(Self { x, y: Some(y) })
    }

    /// Get the batch size.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.x.batch()
    }

    /// Get the device.
    pub fn device(&self) -> B::Device {
        self.x.device()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NdArray;
    use crate::labels::{BoundingBox, DetectionTarget};

    type TestBackend = NdArray;

    #[test]
    fn test_from_values_roundtrip_layout() {
        let device = Default::default();
        let values: Vec<f32> = (0..8).map(|v| v as f32).collect();
        let images =
            ImageTensor::<TestBackend>::from_values(values.clone(), ImageShape::new(2, 1, 2, 2), &device)
                .unwrap();

        assert_eq!(images.inner().dims(), [2, 1, 2, 2]);
        assert_eq!(images.to_values().unwrap(), values);
    }

    #[test]
    fn test_from_values_wrong_len() {
        let device = Default::default();
        let result =
            ImageTensor::<TestBackend>::from_values(vec![0.0; 3], ImageShape::new(1, 1, 2, 2), &device);
        assert!(matches!(result, Err(CoreError::InvalidShape { .. })));
    }

    #[test]
    fn test_clamp() {
        let device = Default::default();
        let images = ImageTensor::<TestBackend>::from_values(
            vec![-1.0, 0.5, 2.0, 300.0],
            ImageShape::new(1, 1, 2, 2),
            &device,
        )
        .unwrap()
        .clamp(0.0, 1.0);

        assert_eq!(images.to_values().unwrap(), vec![0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_repeat_interleave() {
        let device = Default::default();
        let images = ImageTensor::<TestBackend>::from_values(
            vec![1.0, 2.0],
            ImageShape::new(2, 1, 1, 1),
            &device,
        )
        .unwrap()
        .repeat_interleave(2);

        assert_eq!(images.shape(), ImageShape::new(4, 1, 1, 1));
        assert_eq!(images.to_values().unwrap(), vec![1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_batch_label_count_mismatch() {
        let device = Default::default();
        let x = ImageTensor::<TestBackend>::full(ImageShape::new(2, 1, 4, 4), 0.0, &device);
        let y = Tensor::<TestBackend, 2>::zeros([3, 1], &device);
        assert!(ImageBatch::with_labels(x, Labels::Classification(y)).is_err());
    }

    #[test]
    fn test_batch_mask_size_mismatch() {
        let device = Default::default();
        let x = ImageTensor::<TestBackend>::full(ImageShape::new(1, 1, 4, 4), 0.0, &device);
        let target = DetectionTarget::new(vec![BoundingBox::new(0.0, 0.0, 2.0, 2.0)], vec![1])
            .unwrap()
            .with_masks(Tensor::zeros([1, 3, 3], &device))
            .unwrap();
        let result = ImageBatch::with_labels(x, Labels::Detection(vec![target]));
        assert!(matches!(result, Err(CoreError::InvalidShape { .. })));
    }

    #[test]
    fn test_batch_rejects_inconsistent_detection_target() {
        let device = Default::default();
        let x = ImageTensor::<TestBackend>::full(ImageShape::new(1, 1, 4, 4), 0.0, &device);
        let target = DetectionTarget {
            boxes: vec![
                BoundingBox::new(0.0, 0.0, 2.0, 2.0),
                BoundingBox::new(1.0, 1.0, 3.0, 3.0),
            ],
            classes: vec![1],
            masks: None,
        };
        let result = ImageBatch::with_labels(x, Labels::Detection(vec![target]));
        assert!(matches!(result, Err(CoreError::ShapeMismatch(_))));
    }
}

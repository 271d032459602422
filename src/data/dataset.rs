//! In-memory dataset of preprocessed images
//!
//! Training draws random batches with replacement rather than iterating over
//! epochs of the data, so the dataset only needs uniform index sampling.

use std::path::Path;

use ndarray::{Array1, Array4};
use rand::Rng;
use tch::{Device, Tensor};
use tracing::info;

use super::cifar;
use super::preprocessing::{filter_classes, normalize_images};
use crate::error::Result;

/// Preprocessed images and remapped labels
pub struct InpaintingDataset {
    /// Images of shape (n, channels, rows, cols), values in [-1, 1]
    images: Tensor,
    /// Labels in 0..num_classes, shape (n,)
    labels: Tensor,
    len: usize,
}

impl InpaintingDataset {
    /// Build a dataset from normalized images and remapped labels
    pub fn from_arrays(images: Array4<f32>, labels: Array1<i64>, device: Device) -> Result<Self> {
        let len = labels.len();
        let images = Tensor::try_from(images)?.to_device(device);
        let labels = Tensor::try_from(labels)?.to_device(device);
        Ok(Self { images, labels, len })
    }

    /// Load CIFAR-10 from `dir`, keep `class_ids` and rescale to [-1, 1]
    pub fn load<P: AsRef<Path>>(dir: P, class_ids: &[u8], device: Device) -> Result<Self> {
        let raw = cifar::load_dir(dir)?;
        let (images, labels) = filter_classes(&raw, class_ids)?;
        info!(
            "Kept {} of {} records for classes {:?}",
            labels.len(),
            raw.len(),
            class_ids
        );
        Self::from_arrays(normalize_images(&images), labels, device)
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All images
    pub fn images(&self) -> &Tensor {
        &self.images
    }

    /// All labels
    pub fn labels(&self) -> &Tensor {
        &self.labels
    }

    /// Image shape as (channels, rows, cols)
    pub fn image_shape(&self) -> [i64; 3] {
        let size = self.images.size();
        [size[1], size[2], size[3]]
    }

    /// Draw `batch_size` samples uniformly at random with replacement
    ///
    /// Returns (images, labels)
    pub fn sample_batch<R: Rng>(&self, batch_size: usize, rng: &mut R) -> (Tensor, Tensor) {
        let indices: Vec<i64> = (0..batch_size)
            .map(|_| rng.gen_range(0..self.len) as i64)
            .collect();
        let index = Tensor::from_slice(&indices).to_device(self.images.device());

        (
            self.images.index_select(0, &index),
            self.labels.index_select(0, &index),
        )
    }
}

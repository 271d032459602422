//! Data preprocessing for CCGAN training
//!
//! This module provides functions for:
//! - Keeping only the requested CIFAR-10 classes and remapping their labels
//! - Rescaling pixels to the [-1, 1] range required by the tanh generator

use ndarray::{Array1, Array4, Axis};

use super::cifar::CifarSplit;
use crate::error::{CcganError, Result};

/// Keep only records whose label is in `class_ids`, remapping each kept label
/// to its position in `class_ids`.
///
/// Records are grouped by class in `class_ids` order, matching how the splits
/// are stacked one class after another.
pub fn filter_classes(split: &CifarSplit, class_ids: &[u8]) -> Result<(Array4<u8>, Array1<i64>)> {
    let mut indices = Vec::new();
    let mut labels = Vec::new();

    for (new_label, &class_id) in class_ids.iter().enumerate() {
        for (idx, &label) in split.labels.iter().enumerate() {
            if label == class_id {
                indices.push(idx);
                labels.push(new_label as i64);
            }
        }
    }

    if indices.is_empty() {
        return Err(CcganError::EmptyDataset(class_ids.to_vec()));
    }

    let images = split.images.select(Axis(0), &indices);
    Ok((images, Array1::from(labels)))
}

/// Rescale 8-bit pixels to [-1, 1]
///
/// Formula: x_norm = 2 * (x / 255) - 1
pub fn normalize_images(images: &Array4<u8>) -> Array4<f32> {
    images.mapv(|p| 2.0 * (p as f32 / 255.0) - 1.0)
}

/// Map [-1, 1] values back to 8-bit pixels, clamping out-of-range values
pub fn denormalize_pixel(value: f32) -> u8 {
    ((0.5 * value + 0.5).clamp(0.0, 1.0) * 255.0).round() as u8
}

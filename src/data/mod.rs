//! Data module for loading and preparing CIFAR-10 images
//!
//! This module provides:
//! - A reader for the CIFAR-10 binary batch files
//! - Class filtering, label remapping and rescaling
//! - An in-memory dataset with random batch sampling
//! - Random rectangular masking

pub mod cifar;
mod dataset;
mod masking;
pub mod preprocessing;

pub use cifar::{load_dir, CifarSplit};
pub use dataset::InpaintingDataset;
pub use masking::{MaskRegion, Masker};
pub use preprocessing::{filter_classes, normalize_images};

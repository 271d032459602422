//! # CCGAN Image Inpainting
//!
//! This crate trains a context-conditional generative adversarial network
//! (CCGAN) that fills in randomly masked square regions of CIFAR-10 cat and
//! dog images.
//!
//! ## Modules
//!
//! - `data`: CIFAR-10 loading, class filtering and random masking
//! - `model`: Generator, Discriminator and the combined CCGAN
//! - `training`: Training loop, loss functions and metrics
//! - `utils`: Configuration, checkpoints and sample grids

pub mod data;
pub mod error;
pub mod model;
pub mod training;
pub mod utils;

pub use data::{InpaintingDataset, MaskRegion, Masker};
pub use error::{CcganError, Result};
pub use model::{Ccgan, Discriminator, Generator};
pub use training::{Trainer, TrainingConfig, TrainingMetrics};
pub use utils::{load_checkpoint, save_checkpoint, Config};

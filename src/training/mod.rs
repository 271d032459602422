//! Training module for the CCGAN
//!
//! This module provides:
//! - Training loop implementation
//! - Loss functions (weighted discriminator loss, combined generator loss)
//! - Training configuration and metrics

mod trainer;
pub mod losses;
mod metrics;

pub use trainer::{Trainer, TrainingConfig, METRICS_FILE};
pub use losses::{class_weights, discriminator_loss, generator_loss};
pub use metrics::TrainingMetrics;

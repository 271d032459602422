//! Utility modules
//!
//! - Configuration management
//! - Checkpoint save/load
//! - Sample grid rendering

pub mod checkpoint;
pub mod config;
pub mod visualize;

pub use checkpoint::{load_checkpoint, save_checkpoint};
pub use config::Config;
pub use visualize::save_sample_grid;

//! Configuration management
//!
//! Provides unified configuration for the CCGAN pipeline. The defaults are the
//! hyperparameters of the reference experiment, so running without a config
//! file reproduces it.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::cifar::{IMAGE_CHANNELS, IMAGE_SIZE};
use crate::error::CcganError;

/// Image height in pixels
pub const IMG_ROWS: i64 = 32;
/// Image width in pixels
pub const IMG_COLS: i64 = 32;
/// Colour channels
pub const CHANNELS: i64 = 3;
/// Masked rectangle height
pub const MASK_HEIGHT: i64 = 10;
/// Masked rectangle width
pub const MASK_WIDTH: i64 = 10;
/// Number of real object classes
pub const NUM_CLASSES: i64 = 2;
/// CIFAR-10 label ids kept for training (cat, dog)
pub const CLASS_IDS: [u8; 2] = [3, 5];
/// Number of training epochs
pub const EPOCHS: usize = 20_000;
/// Full batch size for the generator step
pub const BATCH_SIZE: usize = 64;
/// Write samples and checkpoints every N epochs
pub const SAVE_INTERVAL: usize = 50;
/// Number of sample columns in the image grid
pub const SAMPLE_COLUMNS: usize = 6;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data configuration
    pub data: DataConfig,
    /// Model configuration
    pub model: ModelConfig,
    /// Training configuration
    pub training: TrainingConfigFile,
}

/// Data-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the CIFAR-10 binary batch files
    pub data_dir: String,
    /// CIFAR-10 label ids to keep; remapped to 0..n in this order
    pub class_ids: Vec<u8>,
}

/// Model-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Image height
    pub img_rows: i64,
    /// Image width
    pub img_cols: i64,
    /// Colour channels
    pub channels: i64,
    /// Mask height
    pub mask_height: i64,
    /// Mask width
    pub mask_width: i64,
    /// Number of real classes (the discriminator adds one "generated" class)
    pub num_classes: i64,
}

/// Training-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfigFile {
    /// Number of epochs
    pub epochs: usize,
    /// Batch size (the discriminator sees half of it per update)
    pub batch_size: usize,
    /// Sample grid and checkpoint frequency
    pub save_interval: usize,
    /// Adam learning rate for both networks
    pub learning_rate: f64,
    /// Adam beta1
    pub beta1: f64,
    /// Columns in the sample grid
    pub sample_columns: usize,
    /// RNG seed; unseeded runs draw from OS entropy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Directory for sample grids
    pub image_dir: String,
    /// Directory for checkpoints
    pub checkpoint_dir: String,
    /// Device: "cpu" or "cuda"
    pub device: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig {
                data_dir: "data/cifar-10-batches-bin".to_string(),
                class_ids: CLASS_IDS.to_vec(),
            },
            model: ModelConfig {
                img_rows: IMG_ROWS,
                img_cols: IMG_COLS,
                channels: CHANNELS,
                mask_height: MASK_HEIGHT,
                mask_width: MASK_WIDTH,
                num_classes: NUM_CLASSES,
            },
            training: TrainingConfigFile {
                epochs: EPOCHS,
                batch_size: BATCH_SIZE,
                save_interval: SAVE_INTERVAL,
                learning_rate: 2e-4,
                beta1: 0.5,
                sample_columns: SAMPLE_COLUMNS,
                seed: None,
                image_dir: "ccgan/images".to_string(),
                checkpoint_dir: "ccgan/saved_model".to_string(),
                device: "cpu".to_string(),
            },
        }
    }
}

impl ModelConfig {
    /// Image shape as (channels, rows, cols)
    pub fn image_shape(&self) -> [i64; 3] {
        [self.channels, self.img_rows, self.img_cols]
    }
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_toml(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_toml(&self, path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn from_json(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn save_json(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load a config file, picking the format from the extension.
    /// Falls back to the defaults when the file does not exist.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        if !Path::new(path).exists() {
            tracing::info!("Config file {} not found, using defaults", path);
            return Ok(Self::default());
        }
        if path.ends_with(".toml") {
            Self::from_toml(path)
        } else {
            Self::from_json(path)
        }
    }

    /// Save to a file, picking the format from the extension
    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        if path.ends_with(".toml") {
            self.save_toml(path)
        } else {
            self.save_json(path)
        }
    }

    /// Get device from configuration
    pub fn get_device(&self) -> tch::Device {
        match self.training.device.to_lowercase().as_str() {
            "cuda" | "gpu" => {
                if tch::Cuda::is_available() {
                    tch::Device::Cuda(0)
                } else {
                    tracing::warn!("CUDA requested but not available, falling back to CPU");
                    tch::Device::Cpu
                }
            }
            _ => tch::Device::Cpu,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), CcganError> {
        let invalid = |msg: &str| Err(CcganError::InvalidConfig(msg.to_string()));

        let m = &self.model;
        if m.img_rows <= 0 || m.img_cols <= 0 || m.channels <= 0 {
            return invalid("image dimensions must be > 0");
        }
        let cifar_shape = [IMAGE_CHANNELS as i64, IMAGE_SIZE as i64, IMAGE_SIZE as i64];
        if m.image_shape() != cifar_shape {
            return invalid(&format!(
                "image shape {:?} does not match the CIFAR-10 shape {:?}",
                m.image_shape(),
                cifar_shape
            ));
        }
        if m.mask_height <= 0
            || m.mask_width <= 0
            || m.mask_height >= m.img_rows
            || m.mask_width >= m.img_cols
        {
            return Err(CcganError::InvalidMask {
                image_height: m.img_rows,
                image_width: m.img_cols,
                mask_height: m.mask_height,
                mask_width: m.mask_width,
            });
        }

        let ids = &self.data.class_ids;
        if ids.len() as i64 != m.num_classes {
            return invalid("number of class ids must equal num_classes");
        }
        if ids.iter().any(|&id| id > 9) {
            return invalid("class ids must be CIFAR-10 labels (0-9)");
        }
        if ids.iter().enumerate().any(|(i, id)| ids[..i].contains(id)) {
            return invalid("class ids must be distinct");
        }

        let t = &self.training;
        if t.epochs == 0 {
            return invalid("number of epochs must be > 0");
        }
        if t.batch_size < 2 || t.batch_size % 2 != 0 {
            return invalid("batch size must be an even number >= 2");
        }
        if t.save_interval == 0 {
            return invalid("save interval must be > 0");
        }
        if t.sample_columns == 0 {
            return invalid("sample columns must be > 0");
        }
        Ok(())
    }
}

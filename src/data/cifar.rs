//! CIFAR-10 binary batch reader
//!
//! Each record is one label byte followed by 3072 pixel bytes: the red plane,
//! then green, then blue, each 32x32 in row-major order. This is already the
//! channels-first layout the networks consume.

use std::path::Path;

use ndarray::{Array1, Array4, Axis};
use tracing::{debug, info};

use crate::error::{CcganError, Result};

/// Side length of a CIFAR-10 image
pub const IMAGE_SIZE: usize = 32;
/// Channels per image
pub const IMAGE_CHANNELS: usize = 3;
/// Bytes per record: label + pixels
pub const RECORD_LEN: usize = 1 + IMAGE_CHANNELS * IMAGE_SIZE * IMAGE_SIZE;

/// Training split file names
pub const TRAIN_FILES: [&str; 5] = [
    "data_batch_1.bin",
    "data_batch_2.bin",
    "data_batch_3.bin",
    "data_batch_4.bin",
    "data_batch_5.bin",
];
/// Test split file name
pub const TEST_FILE: &str = "test_batch.bin";

/// Raw labelled images as stored on disk
#[derive(Debug, Clone)]
pub struct CifarSplit {
    /// Pixels of shape (n, 3, 32, 32)
    pub images: Array4<u8>,
    /// CIFAR-10 label ids (0-9)
    pub labels: Array1<u8>,
}

impl CifarSplit {
    /// Number of records
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the split holds no records
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Parse records from raw bytes
    pub fn from_bytes(bytes: &[u8], source: &str) -> Result<Self> {
        if bytes.len() % RECORD_LEN != 0 {
            return Err(CcganError::MalformedDataset {
                path: source.to_string(),
                len: bytes.len(),
                record_len: RECORD_LEN,
            });
        }

        let n = bytes.len() / RECORD_LEN;
        let mut labels = Vec::with_capacity(n);
        let mut pixels = Vec::with_capacity(n * (RECORD_LEN - 1));
        for record in bytes.chunks_exact(RECORD_LEN) {
            labels.push(record[0]);
            pixels.extend_from_slice(&record[1..]);
        }

        let images = Array4::from_shape_vec(
            (n, IMAGE_CHANNELS, IMAGE_SIZE, IMAGE_SIZE),
            pixels,
        )?;

        Ok(Self {
            images,
            labels: Array1::from(labels),
        })
    }

    /// Read a single batch file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let split = Self::from_bytes(&bytes, &path.display().to_string())?;
        debug!("Read {} records from {}", split.len(), path.display());
        Ok(split)
    }

    /// Concatenate several splits along the sample axis
    pub fn concat(splits: &[CifarSplit]) -> Result<Self> {
        let images: Vec<_> = splits.iter().map(|s| s.images.view()).collect();
        let labels: Vec<_> = splits.iter().map(|s| s.labels.view()).collect();

        if images.is_empty() {
            return Ok(Self {
                images: Array4::zeros((0, IMAGE_CHANNELS, IMAGE_SIZE, IMAGE_SIZE)),
                labels: Array1::zeros(0),
            });
        }

        Ok(Self {
            images: ndarray::concatenate(Axis(0), &images)?,
            labels: ndarray::concatenate(Axis(0), &labels)?,
        })
    }
}

/// Load the training and test splits found in `dir` and concatenate them,
/// training files first.
///
/// Missing files are skipped so a partial download still trains; finding none
/// of them is an error.
pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<CifarSplit> {
    let dir = dir.as_ref();
    let mut splits = Vec::new();

    for name in TRAIN_FILES.iter().chain(std::iter::once(&TEST_FILE)) {
        let path = dir.join(name);
        if path.is_file() {
            splits.push(CifarSplit::load_file(&path)?);
        }
    }

    if splits.is_empty() {
        return Err(CcganError::NoDatasetFiles(dir.display().to_string()));
    }

    let all = CifarSplit::concat(&splits)?;
    info!(
        "Loaded {} CIFAR-10 records from {} files in {}",
        all.len(),
        splits.len(),
        dir.display()
    );
    Ok(all)
}

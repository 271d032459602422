//! Error types for the CCGAN inpainting crate

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, CcganError>;

/// Domain errors raised before or during training
#[derive(Error, Debug)]
pub enum CcganError {
    /// Mask does not fit strictly inside the image
    #[error("Invalid mask: {mask_height}x{mask_width} mask does not fit inside {image_height}x{image_width} image")]
    InvalidMask {
        image_height: i64,
        image_width: i64,
        mask_height: i64,
        mask_width: i64,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dataset file has a size that is not a whole number of records
    #[error("Malformed dataset file {path}: {len} bytes is not a multiple of the {record_len}-byte record size")]
    MalformedDataset {
        path: String,
        len: usize,
        record_len: usize,
    },

    /// None of the expected dataset files exist
    #[error("No CIFAR-10 batch files found in {0}")]
    NoDatasetFiles(String),

    /// Filtering left nothing to train on
    #[error("Dataset is empty after filtering to classes {0:?}")]
    EmptyDataset(Vec<u8>),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Array shape mismatch
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Tensor library error
    #[error("Tensor error: {0}")]
    Tch(#[from] tch::TchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_mask_message() {
        let err = CcganError::InvalidMask {
            image_height: 32,
            image_width: 32,
            mask_height: 32,
            mask_width: 10,
        };
        assert_eq!(
            err.to_string(),
            "Invalid mask: 32x10 mask does not fit inside 32x32 image"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CcganError = io.into();
        assert!(matches!(err, CcganError::Io(_)));
    }
}

//! Sample grid rendering
//!
//! Lays out real, masked and reconstructed images as three rows of a PNG so
//! training progress can be inspected by eye.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use tch::{Device, Kind, Tensor};

use crate::data::preprocessing::denormalize_pixel;

/// Grid layout options
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Integer upscaling of each image
    pub scale: u32,
    /// Gap between cells in output pixels
    pub padding: u32,
    /// Colour of the gaps
    pub background: Rgb<u8>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            scale: 4,
            padding: 4,
            background: Rgb([255, 255, 255]),
        }
    }
}

/// Row-major pixels of one batch, kept on the CPU
struct HostBatch {
    data: Vec<f32>,
    channels: usize,
    rows: usize,
    cols: usize,
}

impl HostBatch {
    fn from_tensor(images: &Tensor) -> anyhow::Result<Self> {
        let size = images.size();
        anyhow::ensure!(size.len() == 4, "expected (n, c, h, w) images, got {:?}", size);

        let data = Vec::<f32>::try_from(
            images
                .to_device(Device::Cpu)
                .to_kind(Kind::Float)
                .flatten(0, -1),
        )?;

        Ok(Self {
            data,
            channels: size[1] as usize,
            rows: size[2] as usize,
            cols: size[3] as usize,
        })
    }

    fn pixel(&self, index: usize, y: usize, x: usize) -> Rgb<u8> {
        let plane = self.rows * self.cols;
        let base = index * self.channels * plane + y * self.cols + x;
        let channel = |c: usize| denormalize_pixel(self.data[base + c.min(self.channels - 1) * plane]);
        Rgb([channel(0), channel(1), channel(2)])
    }
}

/// Render rows of image batches into one grid
///
/// Every batch is a row; the first `columns` images of each are drawn.
pub fn render_grid(rows: &[&Tensor], columns: usize, config: &GridConfig) -> anyhow::Result<RgbImage> {
    let batches = rows
        .iter()
        .map(|t| HostBatch::from_tensor(t))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let first = batches.first().ok_or_else(|| anyhow::anyhow!("no rows to render"))?;
    let (h, w) = (first.rows as u32, first.cols as u32);
    for batch in &batches {
        let n = batch.data.len() / (batch.channels * batch.rows * batch.cols);
        anyhow::ensure!(
            batch.rows == first.rows && batch.cols == first.cols,
            "all rows must share one image size"
        );
        anyhow::ensure!(n >= columns, "row has {} images, need {}", n, columns);
    }

    let cell_w = w * config.scale;
    let cell_h = h * config.scale;
    let width = columns as u32 * (cell_w + config.padding) + config.padding;
    let height = batches.len() as u32 * (cell_h + config.padding) + config.padding;

    let mut grid = RgbImage::from_pixel(width, height, config.background);

    for (row, batch) in batches.iter().enumerate() {
        let top = config.padding + row as u32 * (cell_h + config.padding);
        for col in 0..columns {
            let left = config.padding + col as u32 * (cell_w + config.padding);
            for py in 0..cell_h {
                for px in 0..cell_w {
                    let color = batch.pixel(
                        col,
                        (py / config.scale) as usize,
                        (px / config.scale) as usize,
                    );
                    grid.put_pixel(left + px, top + py, color);
                }
            }
        }
    }

    Ok(grid)
}

/// Path of the sample grid for `epoch`
pub fn sample_path(dir: &Path, epoch: usize) -> PathBuf {
    dir.join(format!("cifar_{}.png", epoch))
}

/// Write the real / masked / reconstructed grid for `epoch` into `dir`
pub fn save_sample_grid<P: AsRef<Path>>(
    dir: P,
    epoch: usize,
    real: &Tensor,
    masked: &Tensor,
    reconstructed: &Tensor,
    columns: usize,
) -> anyhow::Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let grid = render_grid(&[real, masked, reconstructed], columns, &GridConfig::default())?;
    let path = sample_path(dir, epoch);
    grid.save(&path)?;

    tracing::debug!("Saved sample grid to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_render_grid_layout() {
        let real = Tensor::ones([2, 3, 4, 4], (Kind::Float, Device::Cpu));
        let masked = Tensor::zeros([2, 3, 4, 4], (Kind::Float, Device::Cpu)) - 1.0;
        let config = GridConfig {
            scale: 2,
            padding: 1,
            background: Rgb([0, 0, 255]),
        };

        let grid = render_grid(&[&real, &masked], 2, &config).unwrap();

        assert_eq!(grid.width(), 2 * (8 + 1) + 1);
        assert_eq!(grid.height(), 2 * (8 + 1) + 1);
        assert_eq!(*grid.get_pixel(0, 0), Rgb([0, 0, 255]));
        assert_eq!(*grid.get_pixel(1, 1), Rgb([255, 255, 255]));
        assert_eq!(*grid.get_pixel(1, 10), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_render_grid_channel_order() {
        let img = Tensor::from_slice(&[1.0f32, -1.0, -1.0]).view([1, 3, 1, 1]);
        let config = GridConfig {
            scale: 1,
            padding: 0,
            background: Rgb([0, 0, 0]),
        };

        let grid = render_grid(&[&img], 1, &config).unwrap();
        assert_eq!(*grid.get_pixel(0, 0), Rgb([255, 0, 0]));
    }

    #[test]
    fn test_render_grid_too_few_images() {
        let real = Tensor::ones([2, 3, 4, 4], (Kind::Float, Device::Cpu));
        assert!(render_grid(&[&real], 3, &GridConfig::default()).is_err());
    }

    #[test]
    fn test_save_sample_grid() {
        let dir = tempdir().unwrap();
        let images = Tensor::zeros([6, 3, 32, 32], (Kind::Float, Device::Cpu));

        let path = save_sample_grid(dir.path(), 50, &images, &images, &images, 6).unwrap();
        assert_eq!(path, dir.path().join("cifar_50.png"));

        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded.height(), 3 * (32 * 4 + 4) + 4);
    }
}

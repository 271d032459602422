//! Random rectangular masking
//!
//! Turns a batch of complete images into the inpainting task: every image gets
//! one rectangle of fixed size zeroed at an independently drawn position.

use rand::Rng;
use tch::Tensor;

use crate::error::{CcganError, Result};

/// Top-left corner of a masked rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskRegion {
    /// Row offset
    pub y: i64,
    /// Column offset
    pub x: i64,
}

/// Draws and applies fixed-size rectangular masks
#[derive(Debug, Clone)]
pub struct Masker {
    image_height: i64,
    image_width: i64,
    mask_height: i64,
    mask_width: i64,
}

impl Masker {
    /// Create a masker; the mask must be non-empty and strictly smaller than
    /// the image in both dimensions
    pub fn new(image_height: i64, image_width: i64, mask_height: i64, mask_width: i64) -> Result<Self> {
        if mask_height <= 0
            || mask_width <= 0
            || mask_height >= image_height
            || mask_width >= image_width
        {
            return Err(CcganError::InvalidMask {
                image_height,
                image_width,
                mask_height,
                mask_width,
            });
        }

        Ok(Self {
            image_height,
            image_width,
            mask_height,
            mask_width,
        })
    }

    /// Mask height
    pub fn mask_height(&self) -> i64 {
        self.mask_height
    }

    /// Mask width
    pub fn mask_width(&self) -> i64 {
        self.mask_width
    }

    /// Draw one region per image, offsets uniform in `[0, dim - mask)`
    pub fn sample_regions<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<MaskRegion> {
        (0..n)
            .map(|_| MaskRegion {
                y: rng.gen_range(0..self.image_height - self.mask_height),
                x: rng.gen_range(0..self.image_width - self.mask_width),
            })
            .collect()
    }

    /// Zero each image's region in a copy of `images` (shape `[n, c, h, w]`)
    ///
    /// `regions` must hold exactly one region per image.
    pub fn apply(&self, images: &Tensor, regions: &[MaskRegion]) -> Result<Tensor> {
        let n = images.size().first().copied().unwrap_or(0);
        if n != regions.len() as i64 {
            return Err(CcganError::InvalidConfig(format!(
                "{} mask regions for a batch of {} images",
                regions.len(),
                n
            )));
        }
        Ok(self.fill_regions(images, regions))
    }

    fn fill_regions(&self, images: &Tensor, regions: &[MaskRegion]) -> Tensor {
        tch::no_grad(|| {
            let masked = images.copy();
            for (i, region) in regions.iter().enumerate() {
                let _ = masked
                    .get(i as i64)
                    .narrow(1, region.y, self.mask_height)
                    .narrow(2, region.x, self.mask_width)
                    .fill_(0.0);
            }
            masked
        })
    }

    /// Mask every image in the batch at a freshly drawn position
    pub fn mask_batch<R: Rng>(&self, images: &Tensor, rng: &mut R) -> Tensor {
        let regions = self.sample_regions(images.size()[0] as usize, rng);
        self.fill_regions(images, &regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tch::{Device, Kind};

    fn masker() -> Masker {
        Masker::new(32, 32, 10, 10).unwrap()
    }

    #[test]
    fn test_rejects_oversized_mask() {
        assert!(Masker::new(32, 32, 32, 10).is_err());
        assert!(Masker::new(32, 32, 10, 40).is_err());
        assert!(Masker::new(32, 32, 0, 10).is_err());
        assert!(Masker::new(32, 32, 31, 31).is_ok());
    }

    #[test]
    fn test_regions_fit_inside_image() {
        let masker = Masker::new(32, 20, 10, 5).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        for region in masker.sample_regions(500, &mut rng) {
            assert!(region.y >= 0 && region.y + 10 < 32);
            assert!(region.x >= 0 && region.x + 5 < 20);
        }
    }

    #[test]
    fn test_zeroes_exactly_one_rectangle_per_image() {
        let masker = masker();
        let mut rng = StdRng::seed_from_u64(11);
        let images = Tensor::rand([4, 3, 32, 32], (Kind::Float, Device::Cpu)) + 0.5;

        let regions = masker.sample_regions(4, &mut rng);
        let masked = masker.apply(&images, &regions).unwrap();
        assert_eq!(masked.size(), images.size());

        for (i, region) in regions.iter().enumerate() {
            let img = images.get(i as i64);
            let out = masked.get(i as i64);

            let zeroed = out.eq(0.0).to_kind(Kind::Int64).sum(Kind::Int64).int64_value(&[]);
            assert_eq!(zeroed, 3 * 10 * 10);

            let hole = out.narrow(1, region.y, 10).narrow(2, region.x, 10);
            assert_eq!(hole.abs().sum(Kind::Float).double_value(&[]), 0.0);

            // everything outside the hole is untouched
            let keep = Tensor::ones([3, 32, 32], (Kind::Float, Device::Cpu));
            let _ = keep.narrow(1, region.y, 10).narrow(2, region.x, 10).fill_(0.0);
            assert!((&out * &keep).equal(&(&img * &keep)));
        }
    }

    #[test]
    fn test_mask_batch_masks_every_image() {
        let masker = masker();
        let mut rng = StdRng::seed_from_u64(17);
        let images = Tensor::ones([5, 3, 32, 32], (Kind::Float, Device::Cpu));

        let masked = masker.mask_batch(&images, &mut rng);
        assert_eq!(masked.size(), images.size());
        for i in 0..5 {
            let zeroed = masked
                .get(i)
                .eq(0.0)
                .to_kind(Kind::Int64)
                .sum(Kind::Int64)
                .int64_value(&[]);
            assert_eq!(zeroed, 3 * 10 * 10);
        }
    }

    #[test]
    fn test_apply_rejects_region_count_mismatch() {
        let masker = masker();
        let mut rng = StdRng::seed_from_u64(2);
        let images = Tensor::ones([3, 3, 32, 32], (Kind::Float, Device::Cpu));

        let regions = masker.sample_regions(2, &mut rng);
        assert!(matches!(
            masker.apply(&images, &regions),
            Err(CcganError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_input_is_not_modified() {
        let masker = masker();
        let mut rng = StdRng::seed_from_u64(5);
        let images = Tensor::ones([2, 3, 32, 32], (Kind::Float, Device::Cpu));
        let original = images.copy();

        let _masked = masker.mask_batch(&images, &mut rng);
        assert!(images.equal(&original));
    }

    #[test]
    fn test_seeded_masks_are_reproducible() {
        let masker = masker();
        let a = masker.sample_regions(8, &mut StdRng::seed_from_u64(9));
        let b = masker.sample_regions(8, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}

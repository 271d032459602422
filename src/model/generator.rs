//! Generator network for the CCGAN
//!
//! Maps a masked image to a full reconstruction of the same shape. Three
//! stride-2 convolutions encode the context, three upsample + convolution
//! stages decode it back to image resolution. There is no noise input: the
//! mask position is the only source of variation.

use tch::{nn, nn::Module, Tensor};

use super::architecture::{conv, Activation, ArchitectureDescriptor, LayerSpec, NetworkKind};

/// Kernel size used by every generator convolution
const KERNEL: i64 = 4;

/// Generator network configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Image shape as (channels, rows, cols)
    pub img_shape: [i64; 3],
    /// Filters of the first encoder stage; doubled at each further stage
    pub base_filters: i64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            img_shape: [3, 32, 32],
            base_filters: 64,
        }
    }
}

/// Generator network
///
/// Architecture:
/// 1. Encoder: 3 x [Conv2d(k4, s2, same) + ReLU] with base, 2*base, 4*base filters
/// 2. Decoder: 3 x [nearest upsample x2 + Conv2d(k4, same)] with 2*base, base,
///    channels filters; ReLU between stages, tanh at the end
#[derive(Debug)]
pub struct Generator {
    config: GeneratorConfig,
    enc1: nn::Conv2D,
    enc2: nn::Conv2D,
    enc3: nn::Conv2D,
    dec1: nn::Conv2D,
    dec2: nn::Conv2D,
    dec3: nn::Conv2D,
}

impl Generator {
    /// Create a new Generator network
    pub fn new(vs: &nn::Path, config: GeneratorConfig) -> Self {
        let base = config.base_filters;
        let channels = config.img_shape[0];

        // k4 s2 with one pixel each side halves the resolution exactly
        let down = nn::ConvConfig {
            stride: 2,
            padding: 1,
            ..Default::default()
        };
        // decoder convolutions are padded by hand, see `same_conv`
        let keep = nn::ConvConfig {
            stride: 1,
            padding: 0,
            ..Default::default()
        };

        let enc1 = nn::conv2d(vs / "enc1", channels, base, KERNEL, down);
        let enc2 = nn::conv2d(vs / "enc2", base, base * 2, KERNEL, down);
        let enc3 = nn::conv2d(vs / "enc3", base * 2, base * 4, KERNEL, down);

        let dec1 = nn::conv2d(vs / "dec1", base * 4, base * 2, KERNEL, keep);
        let dec2 = nn::conv2d(vs / "dec2", base * 2, base, KERNEL, keep);
        let dec3 = nn::conv2d(vs / "dec3", base, channels, KERNEL, keep);

        Self {
            config,
            enc1,
            enc2,
            enc3,
            dec1,
            dec2,
            dec3,
        }
    }

    /// Reconstruct images (inference mode, no gradient recorded)
    pub fn generate(&self, masked: &Tensor) -> Tensor {
        tch::no_grad(|| self.forward(masked))
    }

    /// Get configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Describe the layer stack for checkpoints
    pub fn architecture(&self) -> ArchitectureDescriptor {
        let base = self.config.base_filters;
        let channels = self.config.img_shape[0];
        let up = || LayerSpec::Upsample2d { factor: 2 };

        ArchitectureDescriptor {
            kind: NetworkKind::Generator,
            input_shape: self.config.img_shape,
            num_classes: None,
            base_filters: base,
            layers: vec![
                conv("enc1", base, KERNEL, 2, Activation::Relu),
                conv("enc2", base * 2, KERNEL, 2, Activation::Relu),
                conv("enc3", base * 4, KERNEL, 2, Activation::Relu),
                up(),
                conv("dec1", base * 2, KERNEL, 1, Activation::Relu),
                up(),
                conv("dec2", base, KERNEL, 1, Activation::Relu),
                up(),
                conv("dec3", channels, KERNEL, 1, Activation::Tanh),
            ],
        }
    }
}

/// Stride-1 "same" convolution for an even kernel: pad one pixel before and
/// two after so the output keeps the input's spatial size
fn same_conv(conv: &nn::Conv2D, xs: &Tensor) -> Tensor {
    xs.zero_pad2d(1, 2, 1, 2).apply(conv)
}

fn upsample(xs: &Tensor) -> Tensor {
    let size = xs.size();
    let (h, w) = (size[2], size[3]);
    xs.upsample_nearest2d([h * 2, w * 2], Some(2.0), Some(2.0))
}

impl Module for Generator {
    fn forward(&self, xs: &Tensor) -> Tensor {
        // Encoder
        let x = xs.apply(&self.enc1).relu();
        let x = x.apply(&self.enc2).relu();
        let x = x.apply(&self.enc3).relu();

        // Decoder
        let x = same_conv(&self.dec1, &upsample(&x)).relu();
        let x = same_conv(&self.dec2, &upsample(&x)).relu();
        same_conv(&self.dec3, &upsample(&x)).tanh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{nn::VarStore, Device, Kind};

    #[test]
    fn test_generator_output_shape() {
        let vs = VarStore::new(Device::Cpu);
        let gen = Generator::new(&vs.root(), GeneratorConfig::default());

        let input = Tensor::rand([4, 3, 32, 32], (Kind::Float, Device::Cpu)) * 2.0 - 1.0;
        let output = gen.generate(&input);

        assert_eq!(output.size(), input.size());
    }

    #[test]
    fn test_generator_output_range() {
        let vs = VarStore::new(Device::Cpu);
        let gen = Generator::new(&vs.root(), GeneratorConfig::default());

        // large inputs push tanh towards saturation
        let input = Tensor::randn([2, 3, 32, 32], (Kind::Float, Device::Cpu)) * 50.0;
        let output = gen.generate(&input);

        let min_val = output.min().double_value(&[]);
        let max_val = output.max().double_value(&[]);
        assert!(min_val >= -1.0 && max_val <= 1.0);
    }

    #[test]
    fn test_generator_non_square_image() {
        let vs = VarStore::new(Device::Cpu);
        let config = GeneratorConfig {
            img_shape: [3, 16, 24],
            base_filters: 8,
        };
        let gen = Generator::new(&vs.root(), config);

        let input = Tensor::zeros([1, 3, 16, 24], (Kind::Float, Device::Cpu));
        assert_eq!(gen.generate(&input).size(), vec![1, 3, 16, 24]);
    }

    #[test]
    fn test_generator_architecture() {
        let vs = VarStore::new(Device::Cpu);
        let gen = Generator::new(&vs.root(), GeneratorConfig::default());
        let arch = gen.architecture();

        assert_eq!(arch.kind, NetworkKind::Generator);
        assert_eq!(arch.num_trainable_layers(), 6);
        assert_eq!(vs.variables().len(), 12); // weight + bias per conv
    }
}

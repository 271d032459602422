//! Discriminator network for the CCGAN
//!
//! An auxiliary-classifier critic: one head scores how real an image looks,
//! the other classifies it into the real classes plus one "generated" class.

use tch::{nn, Tensor};

use super::architecture::{conv, dense, Activation, ArchitectureDescriptor, LayerSpec, NetworkKind};

/// Discriminator network configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DiscriminatorConfig {
    /// Image shape as (channels, rows, cols)
    pub img_shape: [i64; 3],
    /// Number of real classes; the class head has one more output
    pub num_classes: i64,
    /// Filters of the first convolution
    pub base_filters: i64,
}

impl Default for DiscriminatorConfig {
    fn default() -> Self {
        Self {
            img_shape: [3, 32, 32],
            num_classes: 2,
            base_filters: 32,
        }
    }
}

/// Raw outputs of a discriminator forward pass
#[derive(Debug)]
pub struct DiscriminatorOutput {
    /// Realism logits, shape (batch, 1)
    pub validity_logits: Tensor,
    /// Class logits, shape (batch, num_classes + 1)
    pub class_logits: Tensor,
}

impl DiscriminatorOutput {
    /// Probability that each image is real
    pub fn validity(&self) -> Tensor {
        self.validity_logits.sigmoid()
    }

    /// Distribution over the real classes and "generated"
    pub fn class_probs(&self) -> Tensor {
        self.class_logits.softmax(-1, tch::Kind::Float)
    }
}

/// Discriminator network
///
/// Architecture:
/// 1. 3x3 convolutions with ReLU, 2x2 max pooling after the 1st, 2nd, 4th and
///    6th convolution
/// 2. Flatten, then two parallel dense heads (sigmoid realism, softmax class)
#[derive(Debug)]
pub struct Discriminator {
    config: DiscriminatorConfig,
    convs: Vec<nn::Conv2D>,
    valid: nn::Linear,
    label: nn::Linear,
}

/// Filter multiplier of each convolution and whether a pooling follows it
const CONV_PLAN: [(i64, bool); 6] = [
    (1, true),
    (2, true),
    (4, false),
    (4, true),
    (8, false),
    (8, true),
];

impl Discriminator {
    /// Create a new Discriminator network
    pub fn new(vs: &nn::Path, config: DiscriminatorConfig) -> Self {
        let base = config.base_filters;
        let [channels, rows, cols] = config.img_shape;

        let same = nn::ConvConfig {
            padding: 1,
            ..Default::default()
        };

        let mut convs = Vec::with_capacity(CONV_PLAN.len());
        let mut in_channels = channels;
        for (i, &(mult, _)) in CONV_PLAN.iter().enumerate() {
            let out_channels = base * mult;
            convs.push(nn::conv2d(
                vs / format!("conv{}", i + 1),
                in_channels,
                out_channels,
                3,
                same,
            ));
            in_channels = out_channels;
        }

        // four poolings shrink each side by 16
        let flat_size = in_channels * (rows / 16) * (cols / 16);

        let valid = nn::linear(vs / "valid", flat_size, 1, Default::default());
        let label = nn::linear(
            vs / "label",
            flat_size,
            config.num_classes + 1,
            Default::default(),
        );

        Self {
            config,
            convs,
            valid,
            label,
        }
    }

    /// Forward pass returning logits for both heads
    ///
    /// # Arguments
    ///
    /// * `input` - Tensor of shape (batch, channels, rows, cols)
    pub fn forward(&self, input: &Tensor) -> DiscriminatorOutput {
        let mut x = input.shallow_clone();
        for (conv, &(_, pool)) in self.convs.iter().zip(CONV_PLAN.iter()) {
            x = x.apply(conv).relu();
            if pool {
                x = x.max_pool2d_default(2);
            }
        }

        let features = x.flatten(1, -1);

        DiscriminatorOutput {
            validity_logits: features.apply(&self.valid),
            class_logits: features.apply(&self.label),
        }
    }

    /// Score images without recording gradients
    pub fn classify(&self, input: &Tensor) -> DiscriminatorOutput {
        tch::no_grad(|| self.forward(input))
    }

    /// Get configuration
    pub fn config(&self) -> &DiscriminatorConfig {
        &self.config
    }

    /// Index of the "generated" class
    pub fn fake_class(&self) -> i64 {
        self.config.num_classes
    }

    /// Describe the layer stack for checkpoints
    pub fn architecture(&self) -> ArchitectureDescriptor {
        let base = self.config.base_filters;
        let mut layers = Vec::new();

        for (i, &(mult, pool)) in CONV_PLAN.iter().enumerate() {
            layers.push(conv(&format!("conv{}", i + 1), base * mult, 3, 1, Activation::Relu));
            if pool {
                layers.push(LayerSpec::MaxPool2d { size: 2 });
            }
        }
        layers.push(LayerSpec::Flatten);
        layers.push(dense("valid", 1, Activation::Sigmoid));
        layers.push(dense("label", self.config.num_classes + 1, Activation::Softmax));

        ArchitectureDescriptor {
            kind: NetworkKind::Discriminator,
            input_shape: self.config.img_shape,
            num_classes: Some(self.config.num_classes),
            base_filters: base,
            layers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{nn::VarStore, Device, Kind};

    #[test]
    fn test_discriminator_output_shape() {
        let vs = VarStore::new(Device::Cpu);
        let disc = Discriminator::new(&vs.root(), DiscriminatorConfig::default());

        let input = Tensor::randn([4, 3, 32, 32], (Kind::Float, Device::Cpu));
        let output = disc.classify(&input);

        assert_eq!(output.validity_logits.size(), vec![4, 1]);
        assert_eq!(output.class_logits.size(), vec![4, 3]);
        assert_eq!(disc.fake_class(), 2);
    }

    #[test]
    fn test_validity_is_probability() {
        let vs = VarStore::new(Device::Cpu);
        let disc = Discriminator::new(&vs.root(), DiscriminatorConfig::default());

        let input = Tensor::randn([8, 3, 32, 32], (Kind::Float, Device::Cpu)) * 10.0;
        let validity = disc.classify(&input).validity();

        let min_val = validity.min().double_value(&[]);
        let max_val = validity.max().double_value(&[]);
        assert!(min_val >= 0.0 && max_val <= 1.0);
    }

    #[test]
    fn test_class_probs_sum_to_one() {
        let vs = VarStore::new(Device::Cpu);
        let disc = Discriminator::new(&vs.root(), DiscriminatorConfig::default());

        let input = Tensor::randn([8, 3, 32, 32], (Kind::Float, Device::Cpu));
        let probs = disc.classify(&input).class_probs();
        let sums = probs.sum_dim_intlist([-1i64].as_slice(), false, Kind::Float);

        for i in 0..8 {
            assert!((sums.double_value(&[i]) - 1.0).abs() < 1e-5);
        }
        assert!(probs.min().double_value(&[]) >= 0.0);
    }

    #[test]
    fn test_discriminator_architecture() {
        let vs = VarStore::new(Device::Cpu);
        let disc = Discriminator::new(&vs.root(), DiscriminatorConfig::default());
        let arch = disc.architecture();

        assert_eq!(arch.num_classes, Some(2));
        assert_eq!(arch.num_trainable_layers(), 8);
        assert_eq!(vs.variables().len(), 16);
    }
}

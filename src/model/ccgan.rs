//! CCGAN wrapper combining Generator and Discriminator
//!
//! The discriminator's parameters live in one `VarStore` used by two update
//! paths: its own optimizer trains it directly, while the combined
//! generator step runs through it with its variables frozen and only ever
//! steps the generator's optimizer.

use tch::{nn, nn::Module, nn::OptimizerConfig, nn::VarStore, Device, Kind, Tensor};

use super::discriminator::{Discriminator, DiscriminatorConfig};
use super::generator::{Generator, GeneratorConfig};
use crate::training::losses::{
    class_accuracy, discriminator_loss, generator_loss, validity_accuracy,
};
use crate::utils::config::ModelConfig;

/// Outcome of one discriminator update
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiscriminatorStep {
    /// Weighted total loss
    pub loss: f64,
    /// Realism head accuracy
    pub validity_acc: f64,
    /// Class head accuracy
    pub class_acc: f64,
}

impl DiscriminatorStep {
    /// Unweighted mean of two steps
    pub fn mean(a: &Self, b: &Self) -> Self {
        Self {
            loss: 0.5 * (a.loss + b.loss),
            validity_acc: 0.5 * (a.validity_acc + b.validity_acc),
            class_acc: 0.5 * (a.class_acc + b.class_acc),
        }
    }
}

/// Outcome of one combined (generator) update
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeneratorStep {
    /// Weighted total loss
    pub loss: f64,
    /// Reconstruction mean squared error
    pub mse: f64,
}

/// Complete CCGAN model
pub struct Ccgan {
    /// Generator network
    pub generator: Generator,
    /// Discriminator network
    pub discriminator: Discriminator,
    /// Variable store for generator
    pub gen_vs: VarStore,
    /// Variable store for discriminator
    pub disc_vs: VarStore,
    /// Device (CPU/GPU)
    pub device: Device,
}

impl Ccgan {
    /// Create a new CCGAN model
    pub fn new(gen_config: GeneratorConfig, disc_config: DiscriminatorConfig, device: Device) -> Self {
        let gen_vs = VarStore::new(device);
        let disc_vs = VarStore::new(device);

        let generator = Generator::new(&gen_vs.root(), gen_config);
        let discriminator = Discriminator::new(&disc_vs.root(), disc_config);

        Self {
            generator,
            discriminator,
            gen_vs,
            disc_vs,
            device,
        }
    }

    /// Create a CCGAN with the standard layer widths for the configured images
    pub fn from_config(config: &ModelConfig, device: Device) -> Self {
        let gen_config = GeneratorConfig {
            img_shape: config.image_shape(),
            ..Default::default()
        };
        let disc_config = DiscriminatorConfig {
            img_shape: config.image_shape(),
            num_classes: config.num_classes,
            ..Default::default()
        };
        Self::new(gen_config, disc_config, device)
    }

    /// Number of real classes
    pub fn num_classes(&self) -> i64 {
        self.discriminator.config().num_classes
    }

    /// Image shape as (channels, rows, cols)
    pub fn image_shape(&self) -> [i64; 3] {
        self.generator.config().img_shape
    }

    /// Inpaint masked images (inference mode)
    pub fn inpaint(&self, masked: &Tensor) -> Tensor {
        self.generator.generate(masked)
    }

    /// Get generator optimizer (Adam)
    pub fn gen_optimizer(&self, lr: f64, beta1: f64) -> anyhow::Result<nn::Optimizer> {
        Ok(adam(beta1).build(&self.gen_vs, lr)?)
    }

    /// Get discriminator optimizer (Adam)
    pub fn disc_optimizer(&self, lr: f64, beta1: f64) -> anyhow::Result<nn::Optimizer> {
        Ok(adam(beta1).build(&self.disc_vs, lr)?)
    }

    /// One discriminator update on a single sub-batch
    ///
    /// # Arguments
    ///
    /// * `disc_opt` - Optimizer bound to the discriminator's variables
    /// * `images` - Real or generated images
    /// * `validity_target` - 1.0 for real images, 0.0 for generated ones
    /// * `class_targets` - Int64 class indices, the "generated" class for fakes
    /// * `class_weights` - Per-class loss weights
    pub fn train_discriminator(
        &self,
        disc_opt: &mut nn::Optimizer,
        images: &Tensor,
        validity_target: f64,
        class_targets: &Tensor,
        class_weights: &Tensor,
    ) -> DiscriminatorStep {
        let output = self.discriminator.forward(images);
        let loss = discriminator_loss(&output, validity_target, class_targets, class_weights);

        disc_opt.zero_grad();
        loss.backward();
        disc_opt.step();

        DiscriminatorStep {
            loss: loss.double_value(&[]),
            validity_acc: validity_accuracy(&output.validity_logits, validity_target),
            class_acc: class_accuracy(&output.class_logits, class_targets),
        }
    }

    /// One update of the combined graph: masked -> generator -> frozen
    /// discriminator -> realism, trained towards (ground truth, real)
    ///
    /// Only `gen_opt` steps; the discriminator's variables are frozen for the
    /// duration of the step and unfrozen before returning.
    pub fn train_combined(
        &mut self,
        gen_opt: &mut nn::Optimizer,
        masked: &Tensor,
        targets: &Tensor,
    ) -> GeneratorStep {
        self.disc_vs.freeze();

        let reconstruction = self.generator.forward(masked);
        let output = self.discriminator.forward(&reconstruction);
        let (loss, mse) = generator_loss(&reconstruction, targets, &output.validity_logits);

        gen_opt.zero_grad();
        loss.backward();
        gen_opt.step();

        self.disc_vs.unfreeze();

        GeneratorStep {
            loss: loss.double_value(&[]),
            mse: mse.double_value(&[]),
        }
    }

    /// Per-class weights as a tensor on the model's device
    pub fn class_weight_tensor(&self, weights: &[f64]) -> Tensor {
        Tensor::from_slice(weights)
            .to_kind(Kind::Float)
            .to_device(self.device)
    }
}

fn adam(beta1: f64) -> nn::Adam {
    nn::Adam {
        beta1,
        beta2: 0.999,
        wd: 0.0,
        ..Default::default()
    }
}

//! Training loop implementation for the CCGAN
//!
//! Each epoch is one discriminator round (a real and a generated half-batch)
//! followed by one generator update through the combined graph. Batches are
//! drawn with replacement, so an "epoch" here is a single step, not a pass
//! over the data.

use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use tch::{nn, Kind, Tensor};
use tracing::info;

use super::losses::class_weights;
use super::metrics::TrainingMetrics;
use crate::data::{InpaintingDataset, Masker};
use crate::model::{Ccgan, DiscriminatorStep, GeneratorStep};
use crate::utils::checkpoint::save_checkpoint;
use crate::utils::config::Config;
use crate::utils::visualize::save_sample_grid;

/// File name of the metrics CSV written next to the checkpoints
pub const METRICS_FILE: &str = "training_metrics.csv";

/// Training configuration
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Number of training epochs
    pub epochs: usize,
    /// Generator batch size; the discriminator uses half per update
    pub batch_size: usize,
    /// Write samples and checkpoints when `epoch % save_interval == 0`
    pub save_interval: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Adam beta1
    pub beta1: f64,
    /// Columns in the sample grid
    pub sample_columns: usize,
    /// Directory for sample grids
    pub image_dir: PathBuf,
    /// Directory for checkpoints
    pub checkpoint_dir: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for TrainingConfig {
    fn from(config: &Config) -> Self {
        let t = &config.training;
        Self {
            epochs: t.epochs,
            batch_size: t.batch_size,
            save_interval: t.save_interval,
            learning_rate: t.learning_rate,
            beta1: t.beta1,
            sample_columns: t.sample_columns,
            image_dir: PathBuf::from(&t.image_dir),
            checkpoint_dir: PathBuf::from(&t.checkpoint_dir),
        }
    }
}

impl TrainingConfig {
    /// Half of the batch size
    pub fn half_batch(&self) -> usize {
        self.batch_size / 2
    }
}

/// CCGAN Trainer
pub struct Trainer {
    config: TrainingConfig,
    masker: Masker,
    rng: StdRng,
    metrics: TrainingMetrics,
}

impl Trainer {
    /// Create a new trainer
    ///
    /// `rng` drives batch sampling and mask placement; seed it for
    /// reproducible runs.
    pub fn new(config: TrainingConfig, masker: Masker, rng: StdRng) -> Self {
        Self {
            config,
            masker,
            rng,
            metrics: TrainingMetrics::new(),
        }
    }

    /// Train the CCGAN model
    ///
    /// Always starts at epoch 0. Any error (for instance a failed checkpoint
    /// write) stops training and is returned to the caller.
    ///
    /// # Returns
    ///
    /// Training metrics
    pub fn train(&mut self, model: &mut Ccgan, dataset: &InpaintingDataset) -> anyhow::Result<&TrainingMetrics> {
        let mut gen_opt = model.gen_optimizer(self.config.learning_rate, self.config.beta1)?;
        let mut disc_opt = model.disc_optimizer(self.config.learning_rate, self.config.beta1)?;

        info!(
            "Starting training for {} epochs on {} images (batch size {})",
            self.config.epochs,
            dataset.len(),
            self.config.batch_size
        );

        let pb = ProgressBar::new(self.config.epochs as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
                .progress_chars("##-"),
        );

        for epoch in 0..self.config.epochs {
            let (d, g) = self.train_step(model, dataset, &mut gen_opt, &mut disc_opt);
            self.metrics.record_epoch(epoch, &d, &g);

            pb.suspend(|| {
                info!(
                    "{} [D loss: {:.6}, acc: {:.2}%, op_acc: {:.2}%] [G loss: {:.6}, mse: {:.6}]",
                    epoch,
                    d.loss,
                    100.0 * d.validity_acc,
                    100.0 * d.class_acc,
                    g.loss,
                    g.mse
                )
            });
            pb.set_message(format!("D: {:.4}, G: {:.4}", d.loss, g.loss));
            pb.inc(1);

            if epoch % self.config.save_interval == 0 {
                self.save_progress(model, dataset, epoch)?;
            }
        }

        pb.finish_with_message("done");

        info!(
            "Training complete. Final D_loss: {:.4}, G_loss: {:.4}, recent mse: {:.4}",
            self.metrics.latest_disc_loss().unwrap_or(0.0),
            self.metrics.latest_gen_loss().unwrap_or(0.0),
            self.metrics.gen_mse_ma(self.config.save_interval)
        );

        Ok(&self.metrics)
    }

    /// One epoch: two discriminator updates, then one generator update
    pub fn train_step(
        &mut self,
        model: &mut Ccgan,
        dataset: &InpaintingDataset,
        gen_opt: &mut nn::Optimizer,
        disc_opt: &mut nn::Optimizer,
    ) -> (DiscriminatorStep, GeneratorStep) {
        let half_batch = self.config.half_batch();
        let device = model.device;
        let weights = model.class_weight_tensor(&class_weights(model.num_classes(), half_batch));

        // ---------- Discriminator ----------
        let (imgs, labels) = dataset.sample_batch(half_batch, &mut self.rng);
        let masked = self.masker.mask_batch(&imgs, &mut self.rng);
        let gen_imgs = model.inpaint(&masked);

        let fake_labels = Tensor::full(
            [half_batch as i64],
            model.discriminator.fake_class(),
            (Kind::Int64, device),
        );

        let d_real = model.train_discriminator(disc_opt, &imgs, 1.0, &labels, &weights);
        let d_fake = model.train_discriminator(disc_opt, &gen_imgs, 0.0, &fake_labels, &weights);
        let d = DiscriminatorStep::mean(&d_real, &d_fake);

        // ---------- Generator ----------
        let (imgs, _) = dataset.sample_batch(self.config.batch_size, &mut self.rng);
        let masked = self.masker.mask_batch(&imgs, &mut self.rng);
        let g = model.train_combined(gen_opt, &masked, &imgs);

        (d, g)
    }

    /// Write the sample grid, both checkpoints and the metrics so far
    fn save_progress(&mut self, model: &Ccgan, dataset: &InpaintingDataset, epoch: usize) -> anyhow::Result<()> {
        let (imgs, _) = dataset.sample_batch(self.config.sample_columns, &mut self.rng);
        let masked = self.masker.mask_batch(&imgs, &mut self.rng);
        let gen_imgs = model.inpaint(&masked);

        save_sample_grid(
            &self.config.image_dir,
            epoch,
            &imgs,
            &masked,
            &gen_imgs,
            self.config.sample_columns,
        )?;
        save_checkpoint(model, epoch, &self.config.checkpoint_dir)?;
        self.metrics
            .save_csv(self.config.checkpoint_dir.join(METRICS_FILE))?;

        info!("Saved samples and checkpoint at epoch {}", epoch);
        Ok(())
    }

    /// Get training metrics
    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// Get configuration
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DiscriminatorConfig, GeneratorConfig};
    use ndarray::{Array1, Array4};
    use rand::SeedableRng;
    use tch::Device;

    #[test]
    fn test_training_config_default() {
        let config = TrainingConfig::default();
        assert_eq!(config.epochs, 20_000);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.half_batch(), 32);
        assert_eq!(config.save_interval, 50);
    }

    #[test]
    fn test_train_step_runs() {
        tch::manual_seed(1);
        let images = Array4::<f32>::from_elem((6, 3, 16, 16), 0.25);
        let labels = Array1::from(vec![0i64, 0, 0, 1, 1, 1]);
        let dataset = InpaintingDataset::from_arrays(images, labels, Device::Cpu).unwrap();

        let mut model = Ccgan::new(
            GeneratorConfig {
                img_shape: [3, 16, 16],
                base_filters: 8,
            },
            DiscriminatorConfig {
                img_shape: [3, 16, 16],
                num_classes: 2,
                base_filters: 4,
            },
            Device::Cpu,
        );
        let mut gen_opt = model.gen_optimizer(2e-4, 0.5).unwrap();
        let mut disc_opt = model.disc_optimizer(2e-4, 0.5).unwrap();

        let config = TrainingConfig {
            batch_size: 4,
            ..Default::default()
        };
        let masker = Masker::new(16, 16, 4, 4).unwrap();
        let mut trainer = Trainer::new(config, masker, StdRng::seed_from_u64(0));

        let (d, g) = trainer.train_step(&mut model, &dataset, &mut gen_opt, &mut disc_opt);
        assert!(d.loss.is_finite() && d.loss > 0.0);
        assert!(g.loss.is_finite() && g.mse > 0.0);
        assert!((0.0..=1.0).contains(&d.validity_acc));
    }
}

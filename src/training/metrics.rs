//! Training metrics for monitoring CCGAN progress
//!
//! Provides structures for tracking and logging training progress.

use std::path::Path;

use crate::model::{DiscriminatorStep, GeneratorStep};

/// Metrics collected during training, one entry per epoch
#[derive(Debug, Clone, Default)]
pub struct TrainingMetrics {
    /// Epoch indices
    pub epochs: Vec<usize>,
    /// Discriminator losses (mean of real and generated updates)
    pub disc_losses: Vec<f64>,
    /// Discriminator realism accuracy
    pub disc_acc: Vec<f64>,
    /// Discriminator class accuracy
    pub disc_class_acc: Vec<f64>,
    /// Combined generator losses
    pub gen_losses: Vec<f64>,
    /// Generator reconstruction MSE
    pub gen_mse: Vec<f64>,
}

impl TrainingMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record epoch metrics
    pub fn record_epoch(&mut self, epoch: usize, disc: &DiscriminatorStep, gen: &GeneratorStep) {
        self.epochs.push(epoch);
        self.disc_losses.push(disc.loss);
        self.disc_acc.push(disc.validity_acc);
        self.disc_class_acc.push(disc.class_acc);
        self.gen_losses.push(gen.loss);
        self.gen_mse.push(gen.mse);
    }

    /// Get number of recorded epochs
    pub fn num_epochs(&self) -> usize {
        self.epochs.len()
    }

    /// Get latest generator loss
    pub fn latest_gen_loss(&self) -> Option<f64> {
        self.gen_losses.last().copied()
    }

    /// Get latest discriminator loss
    pub fn latest_disc_loss(&self) -> Option<f64> {
        self.disc_losses.last().copied()
    }

    /// Moving average of reconstruction MSE
    pub fn gen_mse_ma(&self, window: usize) -> f64 {
        moving_average(&self.gen_mse, window)
    }

    /// Moving average of discriminator loss
    pub fn disc_loss_ma(&self, window: usize) -> f64 {
        moving_average(&self.disc_losses, window)
    }

    /// Save metrics to CSV file
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record(["epoch", "d_loss", "d_acc", "d_class_acc", "g_loss", "g_mse"])?;

        for i in 0..self.num_epochs() {
            writer.write_record([
                self.epochs[i].to_string(),
                self.disc_losses[i].to_string(),
                self.disc_acc[i].to_string(),
                self.disc_class_acc[i].to_string(),
                self.gen_losses[i].to_string(),
                self.gen_mse[i].to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Load metrics from CSV file
    pub fn load_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut metrics = Self::new();

        for result in reader.records() {
            let record = result?;
            metrics.epochs.push(record[0].parse()?);
            metrics.disc_losses.push(record[1].parse()?);
            metrics.disc_acc.push(record[2].parse()?);
            metrics.disc_class_acc.push(record[3].parse()?);
            metrics.gen_losses.push(record[4].parse()?);
            metrics.gen_mse.push(record[5].parse()?);
        }

        Ok(metrics)
    }
}

/// Calculate moving average of last `window` values
fn moving_average(values: &[f64], window: usize) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let n = window.min(values.len());
    let sum: f64 = values.iter().rev().take(n).sum();
    sum / n as f64
}

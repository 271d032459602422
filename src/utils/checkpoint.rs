//! Checkpoint save/load utilities
//!
//! Each network is stored as an architecture descriptor (JSON) plus its
//! weights. Files have fixed names and are overwritten on every save.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tch::Device;

use crate::model::{
    ArchitectureDescriptor, Ccgan, DiscriminatorConfig, GeneratorConfig, NetworkKind,
};

/// File stem of the generator checkpoint
pub const GENERATOR_NAME: &str = "ccgan_generator";
/// File stem of the discriminator checkpoint
pub const DISCRIMINATOR_NAME: &str = "ccgan_discriminator";

/// Contents of an architecture file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedArchitecture {
    /// Layer stack
    pub architecture: ArchitectureDescriptor,
    /// Epoch at which the checkpoint was written
    pub epoch: usize,
    /// Timestamp of checkpoint
    pub saved_at: String,
}

/// Path of the architecture file for `name`
pub fn architecture_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.json", name))
}

/// Path of the weights file for `name`
pub fn weights_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}_weights.ot", name))
}

fn save_network(
    dir: &Path,
    name: &str,
    architecture: ArchitectureDescriptor,
    vs: &tch::nn::VarStore,
    epoch: usize,
) -> anyhow::Result<()> {
    let saved = SavedArchitecture {
        architecture,
        epoch,
        saved_at: chrono::Utc::now().to_rfc3339(),
    };
    std::fs::write(
        architecture_path(dir, name),
        serde_json::to_string_pretty(&saved)?,
    )?;
    vs.save(weights_path(dir, name))?;
    Ok(())
}

/// Read an architecture file
pub fn load_architecture(dir: &Path, name: &str) -> anyhow::Result<SavedArchitecture> {
    let path = architecture_path(dir, name);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(serde_json::from_str(&content)?)
}

/// Save both networks to `dir`, overwriting any previous checkpoint
pub fn save_checkpoint<P: AsRef<Path>>(model: &Ccgan, epoch: usize, dir: P) -> anyhow::Result<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    save_network(
        dir,
        GENERATOR_NAME,
        model.generator.architecture(),
        &model.gen_vs,
        epoch,
    )?;
    save_network(
        dir,
        DISCRIMINATOR_NAME,
        model.discriminator.architecture(),
        &model.disc_vs,
        epoch,
    )?;

    tracing::debug!("Saved checkpoint for epoch {} to {}", epoch, dir.display());
    Ok(())
}

/// Rebuild both networks from their architecture files and load their weights
///
/// # Returns
///
/// Tuple of (model, epoch the checkpoint was written at)
pub fn load_checkpoint<P: AsRef<Path>>(dir: P, device: Device) -> anyhow::Result<(Ccgan, usize)> {
    let dir = dir.as_ref();

    let gen = load_architecture(dir, GENERATOR_NAME)?;
    let disc = load_architecture(dir, DISCRIMINATOR_NAME)?;

    if gen.architecture.kind != NetworkKind::Generator {
        bail!("{} does not describe a generator", GENERATOR_NAME);
    }
    if disc.architecture.kind != NetworkKind::Discriminator {
        bail!("{} does not describe a discriminator", DISCRIMINATOR_NAME);
    }
    let num_classes = disc
        .architecture
        .num_classes
        .context("discriminator architecture has no class count")?;

    let gen_config = GeneratorConfig {
        img_shape: gen.architecture.input_shape,
        base_filters: gen.architecture.base_filters,
    };
    let disc_config = DiscriminatorConfig {
        img_shape: disc.architecture.input_shape,
        num_classes,
        base_filters: disc.architecture.base_filters,
    };

    let mut model = Ccgan::new(gen_config, disc_config, device);
    model
        .gen_vs
        .load(weights_path(dir, GENERATOR_NAME))
        .context("loading generator weights")?;
    model
        .disc_vs
        .load(weights_path(dir, DISCRIMINATOR_NAME))
        .context("loading discriminator weights")?;

    tracing::info!("Loaded checkpoint from {} (epoch {})", dir.display(), gen.epoch);
    Ok((model, gen.epoch))
}

//! CCGAN image inpainting
//!
//! Main entry point providing CLI interface for:
//! - Training the CCGAN on CIFAR-10 cats and dogs
//! - Inpainting samples with a saved generator
//! - Writing a default configuration file

use anyhow::Result;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ccgan_inpainting::{
    data::{InpaintingDataset, Masker},
    model::Ccgan,
    training::{Trainer, TrainingConfig},
    utils::{load_checkpoint, save_sample_grid, Config},
};

/// Context-conditional GAN for image inpainting
#[derive(Parser)]
#[command(name = "ccgan")]
#[command(version = "0.1.0")]
#[command(about = "Train a CCGAN that inpaints masked CIFAR-10 images")]
struct Cli {
    /// Path to configuration file (JSON or TOML)
    #[arg(short, long, default_value = "ccgan.json")]
    config: String,

    /// Verbosity level
    #[arg(short, long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the CCGAN model from scratch
    Train {
        /// Directory with the CIFAR-10 binary batch files
        #[arg(short, long)]
        data_dir: Option<String>,

        /// Number of epochs
        #[arg(short, long)]
        epochs: Option<usize>,

        /// Seed for weight init, batch sampling and mask placement
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Inpaint random dataset images with a saved checkpoint
    Inpaint {
        /// Checkpoint directory (defaults to the configured one)
        #[arg(short, long)]
        model: Option<String>,

        /// Directory to write the sample grid to
        #[arg(short, long, default_value = "ccgan/inpainted")]
        output: String,

        /// Seed for sample selection and mask placement
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Initialize default configuration file
    Init {
        /// Output configuration file path
        #[arg(short, long, default_value = "ccgan.json")]
        output: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = match cli.verbosity.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Train {
            data_dir,
            epochs,
            seed,
        } => {
            let mut config = Config::load(&cli.config)?;
            if let Some(dir) = data_dir {
                config.data.data_dir = dir;
            }
            if let Some(epochs) = epochs {
                config.training.epochs = epochs;
            }
            if seed.is_some() {
                config.training.seed = seed;
            }
            train_model(&config)?;
        }
        Commands::Inpaint {
            model,
            output,
            seed,
        } => {
            let config = Config::load(&cli.config)?;
            let model_dir = model.unwrap_or_else(|| config.training.checkpoint_dir.clone());
            inpaint_samples(&config, &model_dir, &output, seed)?;
        }
        Commands::Init { output } => {
            Config::default().save(&output)?;
            info!("Created default configuration at {}", output);
        }
    }

    Ok(())
}

/// Seeded RNG when a seed is given, OS entropy otherwise
fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            tch::manual_seed(seed as i64);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    }
}

/// Train the CCGAN model
fn train_model(config: &Config) -> Result<()> {
    config.validate()?;

    let device = config.get_device();
    info!("Using device: {:?}", device);

    let rng = make_rng(config.training.seed);

    let dataset = InpaintingDataset::load(&config.data.data_dir, &config.data.class_ids, device)?;
    info!("Training on {} images", dataset.len());

    let m = &config.model;
    let masker = Masker::new(m.img_rows, m.img_cols, m.mask_height, m.mask_width)?;
    let mut model = Ccgan::from_config(m, device);

    let mut trainer = Trainer::new(TrainingConfig::from(config), masker, rng);
    trainer.train(&mut model, &dataset)?;

    Ok(())
}

/// Inpaint random images with a saved generator and write a sample grid
fn inpaint_samples(config: &Config, model_dir: &str, output: &str, seed: Option<u64>) -> Result<()> {
    let device = config.get_device();
    let mut rng = make_rng(seed);

    let (model, epoch) = load_checkpoint(model_dir, device)?;
    let dataset = InpaintingDataset::load(&config.data.data_dir, &config.data.class_ids, device)?;

    anyhow::ensure!(
        model.image_shape() == dataset.image_shape(),
        "checkpoint expects images of shape {:?}, dataset has {:?}",
        model.image_shape(),
        dataset.image_shape()
    );
    let [_, rows, cols] = model.image_shape();
    let masker = Masker::new(rows, cols, config.model.mask_height, config.model.mask_width)?;

    let columns = config.training.sample_columns;
    let (imgs, _) = dataset.sample_batch(columns, &mut rng);
    let masked = masker.mask_batch(&imgs, &mut rng);
    let inpainted = model.inpaint(&masked);

    let path = save_sample_grid(output, epoch, &imgs, &masked, &inpainted, columns)?;
    info!("Saved inpainted samples to {}", path.display());

    Ok(())
}

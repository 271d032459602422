//! End-to-end training on a synthetic CIFAR-10 batch file

use std::path::Path;

use ccgan_inpainting::data::cifar::RECORD_LEN;
use ccgan_inpainting::data::{InpaintingDataset, Masker};
use ccgan_inpainting::model::Ccgan;
use ccgan_inpainting::training::{Trainer, TrainingConfig, METRICS_FILE};
use ccgan_inpainting::utils::checkpoint::{
    architecture_path, weights_path, DISCRIMINATOR_NAME, GENERATOR_NAME,
};
use ccgan_inpainting::utils::visualize::sample_path;
use ccgan_inpainting::{load_checkpoint, Config};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tch::{Device, Kind};
use tempfile::tempdir;

/// Write `per_class` random records for each label in `labels`
fn write_batch_file(path: &Path, labels: &[u8], per_class: usize, rng: &mut StdRng) {
    let mut bytes = Vec::new();
    for &label in labels {
        for _ in 0..per_class {
            bytes.push(label);
            bytes.extend((1..RECORD_LEN).map(|_| rng.gen::<u8>()));
        }
    }
    std::fs::write(path, bytes).unwrap();
}

fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.data.data_dir = root.join("cifar").to_string_lossy().to_string();
    config.training.epochs = 1;
    config.training.batch_size = 8;
    config.training.save_interval = 1;
    config.training.seed = Some(0);
    config.training.image_dir = root.join("images").to_string_lossy().to_string();
    config.training.checkpoint_dir = root.join("saved_model").to_string_lossy().to_string();
    config
}

fn prepare_dataset(config: &Config) {
    let mut rng = StdRng::seed_from_u64(42);
    let dir = Path::new(&config.data.data_dir);
    std::fs::create_dir_all(dir).unwrap();
    // cats and dogs in the training split, unrelated classes in the test split
    write_batch_file(&dir.join("data_batch_1.bin"), &[3, 5], 10, &mut rng);
    write_batch_file(&dir.join("test_batch.bin"), &[0, 9], 3, &mut rng);
}

#[test]
fn test_preprocessing_keeps_two_classes() {
    let root = tempdir().unwrap();
    let config = test_config(root.path());
    prepare_dataset(&config);

    let dataset =
        InpaintingDataset::load(&config.data.data_dir, &config.data.class_ids, Device::Cpu)
            .unwrap();
    assert_eq!(dataset.len(), 20);

    let labels = dataset.labels();
    assert_eq!(labels.min().int64_value(&[]), 0);
    assert_eq!(labels.max().int64_value(&[]), 1);
    assert_eq!(labels.sum(Kind::Int64).int64_value(&[]), 10);

    let images = dataset.images();
    assert_eq!(images.size(), vec![20, 3, 32, 32]);
    assert_eq!(dataset.image_shape(), config.model.image_shape());
    assert!(config.validate().is_ok());
    assert!(images.min().double_value(&[]) >= -1.0);
    assert!(images.max().double_value(&[]) <= 1.0);
}

#[test]
fn test_one_epoch_writes_checkpoints_and_samples() {
    let root = tempdir().unwrap();
    let config = test_config(root.path());
    config.validate().unwrap();
    prepare_dataset(&config);

    tch::manual_seed(0);
    let dataset =
        InpaintingDataset::load(&config.data.data_dir, &config.data.class_ids, Device::Cpu)
            .unwrap();
    let m = &config.model;
    let masker = Masker::new(m.img_rows, m.img_cols, m.mask_height, m.mask_width).unwrap();
    let mut model = Ccgan::from_config(m, Device::Cpu);

    let mut trainer = Trainer::new(
        TrainingConfig::from(&config),
        masker,
        StdRng::seed_from_u64(0),
    );
    let metrics = trainer.train(&mut model, &dataset).unwrap();
    assert_eq!(metrics.num_epochs(), 1);
    assert!(metrics.latest_disc_loss().unwrap().is_finite());
    assert!(metrics.latest_gen_loss().unwrap().is_finite());

    let checkpoint_dir = Path::new(&config.training.checkpoint_dir);
    for name in [GENERATOR_NAME, DISCRIMINATOR_NAME] {
        assert!(architecture_path(checkpoint_dir, name).is_file());
        assert!(weights_path(checkpoint_dir, name).is_file());
    }
    assert!(checkpoint_dir.join(METRICS_FILE).is_file());

    let image_dir = Path::new(&config.training.image_dir);
    assert!(sample_path(image_dir, 0).is_file());
    assert_eq!(std::fs::read_dir(image_dir).unwrap().count(), 1);

    let (restored, epoch) = load_checkpoint(checkpoint_dir, Device::Cpu).unwrap();
    assert_eq!(epoch, 0);
    let (imgs, _) = dataset.sample_batch(2, &mut StdRng::seed_from_u64(1));
    assert!(restored.inpaint(&imgs).equal(&model.inpaint(&imgs)));
}

#[test]
fn test_no_samples_between_intervals() {
    let root = tempdir().unwrap();
    let mut config = test_config(root.path());
    config.training.epochs = 3;
    config.training.save_interval = 2;
    prepare_dataset(&config);

    let dataset =
        InpaintingDataset::load(&config.data.data_dir, &config.data.class_ids, Device::Cpu)
            .unwrap();
    let m = &config.model;
    let masker = Masker::new(m.img_rows, m.img_cols, m.mask_height, m.mask_width).unwrap();
    let mut model = Ccgan::from_config(m, Device::Cpu);

    let mut trainer = Trainer::new(
        TrainingConfig::from(&config),
        masker,
        StdRng::seed_from_u64(3),
    );
    trainer.train(&mut model, &dataset).unwrap();

    let image_dir = Path::new(&config.training.image_dir);
    assert!(sample_path(image_dir, 0).is_file());
    assert!(!sample_path(image_dir, 1).exists());
    assert!(sample_path(image_dir, 2).is_file());
}

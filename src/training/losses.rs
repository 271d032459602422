//! Loss functions for CCGAN training
//!
//! The discriminator is trained on two objectives at once (realism and class),
//! the generator on reconstruction fidelity plus a small adversarial term.

use tch::{Kind, Reduction, Tensor};

use crate::model::DiscriminatorOutput;

/// Weight of each discriminator head in its total loss
pub const DISC_HEAD_WEIGHT: f64 = 0.5;
/// Weight of the pixel reconstruction term in the generator loss
pub const RECONSTRUCTION_WEIGHT: f64 = 0.999;
/// Weight of the adversarial term in the generator loss
pub const ADVERSARIAL_WEIGHT: f64 = 0.001;

/// Per-class weights for the discriminator's class head
///
/// Half of every label the discriminator sees is "generated", so that class is
/// weighted 1 / half_batch while each real class gets
/// num_classes / half_batch. Index `num_classes` is the "generated" class.
pub fn class_weights(num_classes: i64, half_batch: usize) -> Vec<f64> {
    let half_batch = half_batch as f64;
    let mut weights = vec![num_classes as f64 / half_batch; num_classes as usize];
    weights.push(1.0 / half_batch);
    weights
}

/// Binary cross entropy of realism logits against a constant target
pub fn validity_loss(validity_logits: &Tensor, target: f64) -> Tensor {
    let targets = Tensor::full_like(validity_logits, target);
    validity_logits.binary_cross_entropy_with_logits::<Tensor>(
        &targets,
        None,
        None,
        Reduction::Mean,
    )
}

/// Categorical cross entropy of class logits, each sample scaled by the
/// weight of its target class, averaged over the batch
///
/// # Arguments
///
/// * `class_logits` - Tensor of shape (batch, num_classes + 1)
/// * `targets` - Int64 class indices of shape (batch,)
/// * `weights` - Per-class weights of shape (num_classes + 1,)
pub fn weighted_class_loss(class_logits: &Tensor, targets: &Tensor, weights: &Tensor) -> Tensor {
    let log_probs = class_logits.log_softmax(-1, Kind::Float);
    let nll = -log_probs
        .gather(1, &targets.unsqueeze(1), false)
        .squeeze_dim(1);
    let sample_weights = weights.index_select(0, targets);
    (nll * sample_weights).mean(Kind::Float)
}

/// Discriminator loss: 0.5 * realism BCE + 0.5 * class-weighted CCE
///
/// # Arguments
///
/// * `output` - Discriminator output on the batch
/// * `validity_target` - 1.0 for real images, 0.0 for generated ones
/// * `class_targets` - True class for real images, the "generated" class otherwise
/// * `class_weights` - Per-class weights from [`class_weights`]
pub fn discriminator_loss(
    output: &DiscriminatorOutput,
    validity_target: f64,
    class_targets: &Tensor,
    class_weights: &Tensor,
) -> Tensor {
    let validity = validity_loss(&output.validity_logits, validity_target);
    let class = weighted_class_loss(&output.class_logits, class_targets, class_weights);
    validity * DISC_HEAD_WEIGHT + class * DISC_HEAD_WEIGHT
}

/// Combined generator loss
///
/// Returns (total loss, reconstruction MSE) where
/// total = 0.999 * MSE(reconstruction, target) + 0.001 * BCE(realism, 1)
pub fn generator_loss(reconstruction: &Tensor, target: &Tensor, validity_logits: &Tensor) -> (Tensor, Tensor) {
    let mse = reconstruction.mse_loss(target, Reduction::Mean);
    let adversarial = validity_loss(validity_logits, 1.0);
    let total = &mse * RECONSTRUCTION_WEIGHT + adversarial * ADVERSARIAL_WEIGHT;
    (total, mse)
}

/// Fraction of realism predictions on the right side of 0.5
pub fn validity_accuracy(validity_logits: &Tensor, target: f64) -> f64 {
    let predicted_real = validity_logits.sigmoid().ge(0.5);
    let correct = if target >= 0.5 {
        predicted_real
    } else {
        predicted_real.logical_not()
    };
    correct.to_kind(Kind::Float).mean(Kind::Float).double_value(&[])
}

/// Fraction of class predictions equal to the target class
pub fn class_accuracy(class_logits: &Tensor, targets: &Tensor) -> f64 {
    class_logits
        .argmax(-1, false)
        .eq_tensor(targets)
        .to_kind(Kind::Float)
        .mean(Kind::Float)
        .double_value(&[])
}

//! Serializable description of a network's layer stack
//!
//! Written next to the weights so a checkpoint can be rebuilt without the
//! code that trained it having to be told the shapes again.

use serde::{Deserialize, Serialize};

/// Which network a descriptor belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    Generator,
    Discriminator,
}

/// Activation applied after a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Linear,
    Relu,
    Tanh,
    Sigmoid,
    Softmax,
}

/// One layer of the stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Conv2d {
        name: String,
        filters: i64,
        kernel: i64,
        stride: i64,
        activation: Activation,
    },
    Upsample2d {
        factor: i64,
    },
    MaxPool2d {
        size: i64,
    },
    Flatten,
    Dense {
        name: String,
        units: i64,
        activation: Activation,
    },
}

/// Architecture of a whole network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureDescriptor {
    /// Network kind
    pub kind: NetworkKind,
    /// Input shape as (channels, rows, cols)
    pub input_shape: [i64; 3],
    /// Real classes, for the discriminator's class head
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_classes: Option<i64>,
    /// Base filter count the layer widths derive from
    pub base_filters: i64,
    /// Layers in application order
    pub layers: Vec<LayerSpec>,
}

impl ArchitectureDescriptor {
    /// Number of trainable layers (convolutions and dense heads)
    pub fn num_trainable_layers(&self) -> usize {
        self.layers
            .iter()
            .filter(|l| matches!(l, LayerSpec::Conv2d { .. } | LayerSpec::Dense { .. }))
            .count()
    }
}

pub(crate) fn conv(name: &str, filters: i64, kernel: i64, stride: i64, activation: Activation) -> LayerSpec {
    LayerSpec::Conv2d {
        name: name.to_string(),
        filters,
        kernel,
        stride,
        activation,
    }
}

pub(crate) fn dense(name: &str, units: i64, activation: Activation) -> LayerSpec {
    LayerSpec::Dense {
        name: name.to_string(),
        units,
        activation,
    }
}

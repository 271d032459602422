//! Model module containing the CCGAN components
//!
//! This module provides:
//! - Generator network that inpaints masked images
//! - Discriminator network scoring realism and class
//! - CCGAN wrapper owning both networks and their update steps
//! - Serializable architecture descriptors for checkpoints

mod architecture;
mod generator;
mod discriminator;
mod ccgan;

pub use architecture::{Activation, ArchitectureDescriptor, LayerSpec, NetworkKind};
pub use generator::{Generator, GeneratorConfig};
pub use discriminator::{Discriminator, DiscriminatorConfig, DiscriminatorOutput};
pub use ccgan::{Ccgan, DiscriminatorStep, GeneratorStep};

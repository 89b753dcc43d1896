//! Descriptor model shared by the scanning and rendering stages.

pub mod descriptor;
pub mod error;

pub use descriptor::{DISCRIMINATOR_FIELD, RenderData, RenderDescriptor};
pub use error::DescriptorError;

use thiserror::Error;

use crate::buffer::BufferDesc;

#[derive(Error, Debug)]
pub enum RMatError {
    #[error("RMat is empty, no adapter is bound")]
    EmptyHandle,

    #[error("Adapter type mismatch: requested {requested}, held {}", .held.unwrap_or("nothing"))]
    TypeMismatch {
        requested: &'static str,
        held: Option<&'static str>,
    },

    #[error("Buffer is in use by another view")]
    Busy,

    #[error("View was opened for reading and cannot be written")]
    ReadOnlyView,

    #[error("Descriptor mismatch: expected {expected}, got {actual}")]
    DescMismatch {
        expected: BufferDesc,
        actual: BufferDesc,
    },

    #[error("Data size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Row step {step} is smaller than the row size of {row_bytes} bytes")]
    InvalidStep { step: usize, row_bytes: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported image layout: {0}")]
    UnsupportedImage(String),

    #[error("Vulkan error: {0}")]
    Vulkan(String),
}

// Convert vk::Result (Vulkan return codes) into RMatError
impl From<vulkanalia::vk::Result> for RMatError {
    fn from(r: vulkanalia::vk::Result) -> Self {
        RMatError::Vulkan(format!("vk::Result: {:?}", r))
    }
}

impl From<vulkanalia::vk::ErrorCode> for RMatError {
    fn from(c: vulkanalia::vk::ErrorCode) -> Self {
        RMatError::Vulkan(format!("vk::ErrorCode: {:?}", c))
    }
}

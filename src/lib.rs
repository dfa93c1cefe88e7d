//! rmat - type-erased handles to 2-D buffers living on any backend
//!
//! An [`RMat`] owns one [`Adapter`] and hands out [`View`]s onto its memory.
//! Whether a view points straight into backend storage or into a staged host
//! copy is up to the adapter; writes made through a [`Access::Write`] view are
//! synchronized back exactly once, when the view is released.

mod buffer;

mod gpu;

mod rmat;

mod utils;

pub use buffer::{BufferDesc, Depth, ElemType, HostMat, MatCell};
pub use gpu::gpu_memory::GpuMemory;
pub use rmat::device::{
    config::StagingConfig, direct::DirectAdapter, gpu::GpuAdapter, staging::StagingAdapter,
};
pub use rmat::{Access, Adapter, AsAny, RMat, ReleaseCallback, View, make_rmat};
pub use utils::error::RMatError;

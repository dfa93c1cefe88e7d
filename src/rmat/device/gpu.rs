use log::debug;

use crate::{
    buffer::{BufferDesc, MatCell},
    gpu::gpu_memory::GpuMemory,
    rmat::{
        adapter::Adapter,
        device::{WriteTracker, config::StagingConfig},
        view::{Access, View},
    },
    utils::{error::RMatError, expect_msg::ExpectMsg},
};

/// Staged adapter over host-visible Vulkan memory.
///
/// Reads map the allocation and copy it into a host staging buffer, write
/// views copy the staging buffer back to the device on release. Mapping
/// failures inside `access` or a release are fatal, as is opening a view
/// while a write view is alive or a write view while any view is alive.
pub struct GpuAdapter {
    memory: GpuMemory,
    desc: BufferDesc,
    host: MatCell,
    writes: WriteTracker,
}

impl GpuAdapter {
    pub fn new(desc: BufferDesc, memory: GpuMemory) -> Result<Self, RMatError> {
        Self::with_config(desc, memory, StagingConfig::default())
    }

    pub fn with_config(
        desc: BufferDesc,
        memory: GpuMemory,
        config: StagingConfig,
    ) -> Result<Self, RMatError> {
        let config = config.build()?;
        memory.check_fits(desc)?;

        let mut host = config.staging_buffer(desc);
        memory.download(&mut host)?;
        debug!(
            "GPU adapter for {} staged with step {}",
            desc,
            host.step()
        );

        Ok(Self {
            memory,
            desc,
            host: MatCell::new(host),
            writes: WriteTracker::default(),
        })
    }

    /// Device allocation backing this adapter.
    pub fn memory(&self) -> &GpuMemory {
        &self.memory
    }

    pub fn write_back_count(&self) -> usize {
        self.writes.completed()
    }
}

impl Adapter for GpuAdapter {
    fn access(&self, access: Access) -> View<'_> {
        match access {
            Access::Read => {
                {
                    let mut host = self
                        .host
                        .try_write()
                        .expect_msg("Cannot stage GPU memory for reading");
                    self.memory
                        .download(&mut host)
                        .expect_msg("Failed to read GPU memory");
                }
                let host = self
                    .host
                    .try_read()
                    .expect_msg("Cannot stage GPU memory for reading");
                unsafe { View::new(host.desc(), host.as_ptr(), host.step()) }.holding(host)
            }
            Access::Write => {
                let mut host = self
                    .host
                    .try_write()
                    .expect_msg("Cannot open GPU staging buffer for writing");
                let (desc, data, step) = (host.desc(), host.as_mut_ptr(), host.step());

                self.writes.open();
                let release = move || {
                    self.memory
                        .upload(&host)
                        .expect_msg("Failed to write data back to GPU memory");
                    let n = self.writes.release();
                    debug!("Uploaded {} to GPU (write #{})", self.desc, n);
                };
                unsafe { View::with_callback(desc, data, step, release) }
            }
        }
    }

    fn desc(&self) -> BufferDesc {
        self.desc
    }
}

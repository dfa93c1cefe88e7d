use std::{slice, sync::Arc};

use vulkanalia::{Device, vk, vk::DeviceV1_0};

use crate::{
    buffer::{BufferDesc, HostMat},
    utils::error::RMatError,
};

/// Host-visible, host-coherent Vulkan allocation holding a densely packed buffer.
///
/// The backend that created the buffer and its memory also frees them.
pub struct GpuMemory {
    pub buffer: vk::Buffer,
    pub memory: vk::DeviceMemory,
    pub size: vk::DeviceSize,
    pub device: Arc<Device>,
}

impl GpuMemory {
    pub fn new(
        buffer: vk::Buffer,
        memory: vk::DeviceMemory,
        size: vk::DeviceSize,
        device: Arc<Device>,
    ) -> Self {
        Self {
            buffer,
            memory,
            size,
            device,
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        self.size as usize
    }

    /// Device memory must hold `desc` exactly, without row padding.
    pub fn check_fits(&self, desc: BufferDesc) -> Result<(), RMatError> {
        if desc.size_in_bytes() != self.size_in_bytes() {
            return Err(RMatError::SizeMismatch {
                expected: self.size_in_bytes(),
                actual: desc.size_in_bytes(),
            });
        }
        Ok(())
    }

    // Map the whole allocation for the duration of `f`
    fn with_mapped<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> Result<R, RMatError> {
        let data_ptr = unsafe {
            self.device
                .map_memory(self.memory, 0, self.size, vk::MemoryMapFlags::empty())?
        } as *mut u8;
        let _unmap = Unmap::new(|| unsafe { self.device.unmap_memory(self.memory) });

        let mapped = unsafe { slice::from_raw_parts_mut(data_ptr, self.size_in_bytes()) };
        Ok(f(mapped))
    }

    /// Gather the rows of `src` into device memory.
    pub fn upload(&self, src: &HostMat) -> Result<(), RMatError> {
        self.check_fits(src.desc())?;
        if src.desc().is_empty() {
            return Ok(());
        }
        self.with_mapped(|mapped| src.gather_rows(mapped))?
    }

    /// Scatter device memory into the rows of `dst`.
    pub fn download(&self, dst: &mut HostMat) -> Result<(), RMatError> {
        self.check_fits(dst.desc())?;
        if dst.desc().is_empty() {
            return Ok(());
        }
        self.with_mapped(|mapped| dst.scatter_rows(mapped))?
    }
}

// Runs the unmap on drop, including when the mapped closure unwinds
struct Unmap<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> Unmap<F> {
    fn new(unmap: F) -> Self {
        Self(Some(unmap))
    }
}

impl<F: FnOnce()> Drop for Unmap<F> {
    fn drop(&mut self) {
        if let Some(unmap) = self.0.take() {
            unmap();
        }
    }
}

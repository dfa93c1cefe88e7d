use crate::{
    buffer::{BufferDesc, HostMat},
    utils::{error::RMatError, expect_msg::ExpectMsg},
};

/// Layout of the host staging buffers owned by staged adapters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StagingConfig {
    /// Staging rows start on multiples of this many bytes.
    pub row_alignment: usize,
}

impl StagingConfig {
    pub fn build(self) -> Result<Self, RMatError> {
        if !self.row_alignment.is_power_of_two() {
            return Err(RMatError::InvalidConfig(format!(
                "row alignment must be a non-zero power of two, got {}",
                self.row_alignment
            )));
        }
        Ok(self)
    }

    pub fn step_for(&self, desc: BufferDesc) -> usize {
        desc.row_bytes().next_multiple_of(self.row_alignment)
    }

    pub(crate) fn staging_buffer(&self, desc: BufferDesc) -> HostMat {
        HostMat::with_step(desc, self.step_for(desc))
            .expect_msg("Aligned staging step must cover a row")
    }
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self { row_alignment: 1 }
    }
}

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

use crate::{
    buffer::host::HostMat,
    utils::{error::RMatError, expect_msg::ExpectMsg},
};

/// Host buffer shared between a backend and the adapter that exposes it.
///
/// Borrows never block: a borrow that conflicts with one already alive fails
/// with [`RMatError::Busy`]. Any number of readers, or a single writer.
pub struct MatCell {
    mat: RwLock<HostMat>,
}

impl MatCell {
    pub fn new(mat: HostMat) -> Self {
        Self {
            mat: RwLock::new(mat),
        }
    }

    pub fn try_read(&self) -> Result<RwLockReadGuard<'_, HostMat>, RMatError> {
        match self.mat.try_read() {
            Ok(guard) => Ok(guard),
            // a consumer that panicked while holding a view leaves valid bytes behind
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => Err(RMatError::Busy),
        }
    }

    pub fn try_write(&self) -> Result<RwLockWriteGuard<'_, HostMat>, RMatError> {
        match self.mat.try_write() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => Err(RMatError::Busy),
        }
    }

    /// Snapshot of the current contents.
    ///
    /// Panics while a write borrow is alive.
    pub fn snapshot(&self) -> HostMat {
        self.try_read().expect_msg("Cannot snapshot buffer").clone()
    }

    pub fn into_inner(self) -> HostMat {
        self.mat
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

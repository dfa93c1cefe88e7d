use std::sync::Arc;

use log::trace;

use crate::{
    buffer::{BufferDesc, MatCell},
    rmat::{
        adapter::Adapter,
        device::WriteTracker,
        view::{Access, View},
    },
    utils::expect_msg::ExpectMsg,
};

/// Zero-copy adapter over host-addressable storage.
///
/// Views point straight into the shared storage and borrow it until they are
/// dropped. Read views may overlap; a write view excludes every other view, and
/// an access that would break that panics. Releasing a write view moves no
/// data, it only updates the write bookkeeping.
pub struct DirectAdapter {
    storage: Arc<MatCell>,
    writes: WriteTracker,
}

impl DirectAdapter {
    pub fn new(storage: Arc<MatCell>) -> Self {
        Self {
            storage,
            writes: WriteTracker::default(),
        }
    }

    pub fn storage(&self) -> &Arc<MatCell> {
        &self.storage
    }

    /// Write views opened and not yet released.
    pub fn pending_writes(&self) -> usize {
        self.writes.pending()
    }

    /// Write views released so far.
    pub fn write_count(&self) -> usize {
        self.writes.completed()
    }
}

impl Adapter for DirectAdapter {
    fn access(&self, access: Access) -> View<'_> {
        match access {
            Access::Read => {
                let mat = self
                    .storage
                    .try_read()
                    .expect_msg("Cannot read direct storage");
                unsafe { View::new(mat.desc(), mat.as_ptr(), mat.step()) }.holding(mat)
            }
            Access::Write => {
                let mut mat = self
                    .storage
                    .try_write()
                    .expect_msg("Cannot write direct storage");
                self.writes.open();
                let view = unsafe {
                    View::with_callback(mat.desc(), mat.as_mut_ptr(), mat.step(), move || {
                        let n = self.writes.release();
                        trace!("Direct write #{} released", n);
                    })
                };
                view.holding(mat)
            }
        }
    }

    fn desc(&self) -> BufferDesc {
        self.storage
            .try_read()
            .expect_msg("Cannot describe direct storage")
            .desc()
    }
}

pub mod config;
pub mod direct;
pub mod gpu;
pub mod staging;

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::utils::expect_msg::ExpectMsg;

/// Open/released bookkeeping for write views handed out by an adapter.
#[derive(Debug, Default)]
pub(crate) struct WriteTracker {
    pending: AtomicUsize,
    completed: AtomicUsize,
}

impl WriteTracker {
    pub(crate) fn open(&self) {
        self.pending.fetch_add(1, Ordering::AcqRel);
    }

    /// Panics when more writes are released than were opened.
    pub(crate) fn release(&self) -> usize {
        self.pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .map_err(|_| "no write view is open")
            .expect_msg("Write view released twice");
        self.completed.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub(crate) fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }
}

use std::{fmt, marker::PhantomData, ptr, slice};

use log::trace;

use crate::{
    buffer::{BufferDesc, ElemType, HostMat},
    utils::error::RMatError,
};

/// Requested access mode for [`crate::RMat::access`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
}

/// Runs once when a write view goes away.
pub type ReleaseCallback<'a> = Box<dyn FnOnce() + 'a>;

// Anything a view keeps alive until it is dropped, typically a borrow guard
trait Keepalive {}

impl<T> Keepalive for T {}

/// Short-lived, non-owning window onto an adapter's memory.
///
/// A view produced for [`Access::Write`] owns a release callback that fires
/// exactly once: on drop, or earlier through [`View::release`]. Moving a view
/// moves the callback with it.
///
/// A borrow attached with [`View::holding`] is released after the callback.
pub struct View<'a> {
    desc: BufferDesc,
    data: *mut u8,
    step: usize,
    writable: bool,
    callback: Option<ReleaseCallback<'a>>,
    borrow: Option<Box<dyn Keepalive + 'a>>,
    _memory: PhantomData<&'a mut [u8]>,
}

impl<'a> View<'a> {
    /// Read-only view without a callback.
    ///
    /// # Safety
    /// `data` must point to `desc.rows()` rows of `desc.row_bytes()` bytes laid
    /// out `step` bytes apart, valid for reads for the whole of `'a`.
    pub unsafe fn new(desc: BufferDesc, data: *const u8, step: usize) -> Self {
        assert!(
            step >= desc.row_bytes(),
            "View step {} is smaller than the row size {}",
            step,
            desc.row_bytes()
        );
        Self {
            desc,
            data: data as *mut u8,
            step,
            writable: false,
            callback: None,
            borrow: None,
            _memory: PhantomData,
        }
    }

    /// Writable view whose `callback` runs when the view is released.
    ///
    /// # Safety
    /// Same layout requirements as [`View::new`]; the memory must also be valid
    /// for writes and not aliased by anything else for the whole of `'a`.
    pub unsafe fn with_callback<F>(desc: BufferDesc, data: *mut u8, step: usize, callback: F) -> Self
    where
        F: FnOnce() + 'a,
    {
        let mut view = unsafe { Self::new(desc, data, step) };
        view.writable = true;
        view.callback = Some(Box::new(callback));
        view
    }

    /// Keep `borrow` alive for as long as the view exists.
    pub fn holding<B: 'a>(mut self, borrow: B) -> Self {
        self.borrow = Some(Box::new(borrow));
        self
    }

    pub fn desc(&self) -> BufferDesc {
        self.desc
    }

    /// `(rows, cols)`
    pub fn size(&self) -> (usize, usize) {
        self.desc.size()
    }

    pub fn rows(&self) -> usize {
        self.desc.rows()
    }

    pub fn cols(&self) -> usize {
        self.desc.cols()
    }

    pub fn elem_type(&self) -> ElemType {
        self.desc.elem_type()
    }

    pub fn ptr(&self) -> *const u8 {
        self.data
    }

    /// Distance in bytes between the starts of two consecutive rows.
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// True for the placeholder view, which exposes no memory.
    pub fn is_empty(&self) -> bool {
        self.data.is_null() || self.desc.is_empty()
    }

    fn span(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.rows() - 1) * self.step + self.desc.row_bytes()
        }
    }

    /// All rows including inter-row padding; the last row carries none.
    pub fn data(&self) -> &[u8] {
        if self.is_empty() {
            return &[];
        }
        unsafe { slice::from_raw_parts(self.data, self.span()) }
    }

    pub fn data_mut(&mut self) -> Result<&mut [u8], RMatError> {
        if !self.writable {
            return Err(RMatError::ReadOnlyView);
        }
        if self.is_empty() {
            return Ok(&mut []);
        }
        Ok(unsafe { slice::from_raw_parts_mut(self.data, self.span()) })
    }

    pub fn row(&self, y: usize) -> &[u8] {
        assert!(y < self.rows(), "Row {} out of range for {}", y, self.desc);
        let start = y * self.step;
        &self.data()[start..start + self.desc.row_bytes()]
    }

    pub fn row_mut(&mut self, y: usize) -> Result<&mut [u8], RMatError> {
        assert!(y < self.rows(), "Row {} out of range for {}", y, self.desc);
        let start = y * self.step;
        let len = self.desc.row_bytes();
        Ok(&mut self.data_mut()?[start..start + len])
    }

    /// Overwrite the viewed rows with the contents of `src`.
    pub fn copy_from(&mut self, src: &HostMat) -> Result<(), RMatError> {
        if !self.writable {
            return Err(RMatError::ReadOnlyView);
        }
        if src.desc() != self.desc {
            return Err(RMatError::DescMismatch {
                expected: self.desc,
                actual: src.desc(),
            });
        }
        for y in 0..self.rows() {
            self.row_mut(y)?.copy_from_slice(src.row(y));
        }
        Ok(())
    }

    /// Release now instead of at the end of scope.
    pub fn release(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(callback) = self.callback.take() {
            trace!("Releasing write view {}", self.desc);
            callback();
        }
    }
}

impl Default for View<'_> {
    fn default() -> Self {
        Self {
            desc: BufferDesc::default(),
            data: ptr::null_mut(),
            step: 0,
            writable: false,
            callback: None,
            borrow: None,
            _memory: PhantomData,
        }
    }
}

impl Drop for View<'_> {
    fn drop(&mut self) {
        self.fire();
    }
}

impl fmt::Debug for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("desc", &self.desc)
            .field("data", &self.data)
            .field("step", &self.step)
            .field("writable", &self.writable)
            .field("armed", &self.callback.is_some())
            .field("borrowed", &self.borrow.is_some())
            .finish()
    }
}

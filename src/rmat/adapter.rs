use std::any::Any;

use crate::{
    buffer::BufferDesc,
    rmat::view::{Access, View},
};

/// Runtime type identity for adapters behind a trait object.
///
/// Implemented for every `'static` type, adapters never implement it by hand.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;

    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Backend strategy exposing one 2-D buffer.
///
/// `access` may be called any number of times in sequence, each call yielding
/// an independent view. Backends that stage through host memory copy in before
/// returning a read view and hand the copy-back to the write view's callback.
/// A view keeps its memory borrowed until dropped; an access that would
/// overlap a write view panics rather than alias it.
pub trait Adapter: AsAny + Send + Sync {
    fn access(&self, access: Access) -> View<'_>;

    /// Must agree with the descriptor of the views `access` returns.
    fn desc(&self) -> BufferDesc;
}

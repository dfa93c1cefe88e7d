use std::{any::type_name, fmt, sync::Arc};

use log::{debug, trace};

use crate::{
    buffer::BufferDesc,
    rmat::{
        adapter::Adapter,
        view::{Access, View},
    },
    utils::{error::RMatError, expect_msg::ExpectMsg},
};

/// Backend-agnostic handle to a remote buffer.
///
/// An `RMat` is either empty (the default) or bound to exactly one adapter for
/// its whole life. Clones share the adapter.
#[derive(Clone, Default)]
pub struct RMat {
    adapter: Option<Arc<dyn Adapter>>,
}

impl RMat {
    pub fn new<A: Adapter>(adapter: A) -> Self {
        debug!("Binding RMat to {}", type_name::<A>());
        Self {
            adapter: Some(Arc::new(adapter)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.adapter.is_none()
    }

    fn adapter(&self) -> Result<&dyn Adapter, RMatError> {
        self.adapter.as_deref().ok_or(RMatError::EmptyHandle)
    }

    pub fn try_access(&self, access: Access) -> Result<View<'_>, RMatError> {
        let adapter = self.adapter()?;
        trace!("{:?} access through {}", access, adapter.type_name());
        Ok(adapter.access(access))
    }

    /// Panics on an empty handle.
    pub fn access(&self, access: Access) -> View<'_> {
        self.try_access(access).expect_msg("Cannot access RMat")
    }

    pub fn try_desc(&self) -> Result<BufferDesc, RMatError> {
        Ok(self.adapter()?.desc())
    }

    /// Panics on an empty handle.
    pub fn desc(&self) -> BufferDesc {
        self.try_desc().expect_msg("Cannot describe RMat")
    }

    /// True iff the bound adapter is exactly a `T`.
    pub fn holds<T: Adapter>(&self) -> bool {
        self.adapter
            .as_deref()
            .is_some_and(|adapter| adapter.as_any().is::<T>())
    }

    /// The bound adapter as its concrete type.
    pub fn get<T: Adapter>(&self) -> Result<&T, RMatError> {
        self.adapter
            .as_deref()
            .and_then(|adapter| adapter.as_any().downcast_ref::<T>())
            .ok_or_else(|| RMatError::TypeMismatch {
                requested: type_name::<T>(),
                held: self.adapter_type_name(),
            })
    }

    pub fn adapter_type_name(&self) -> Option<&'static str> {
        self.adapter.as_deref().map(|adapter| adapter.type_name())
    }
}

impl fmt::Debug for RMat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RMat")
            .field("adapter", &self.adapter_type_name())
            .finish()
    }
}

/// Build a bound handle around a fully constructed adapter.
pub fn make_rmat<A: Adapter>(adapter: A) -> RMat {
    RMat::new(adapter)
}

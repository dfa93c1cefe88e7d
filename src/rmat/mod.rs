mod adapter;
pub use adapter::{Adapter, AsAny};
pub mod device;
#[allow(clippy::module_inception)]
mod rmat;
pub use rmat::{RMat, make_rmat};
mod view;
pub use view::{Access, ReleaseCallback, View};

mod cell;
pub use cell::MatCell;
mod desc;
pub use desc::{BufferDesc, Depth, ElemType};
mod host;
pub use host::HostMat;

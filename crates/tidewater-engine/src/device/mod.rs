//! GPU device management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - the device-fatal error type shared by the fence and the backends

mod context;
mod error;
mod init;

pub use context::Gpu;
pub use error::DeviceError;
pub use init::GpuInit;

#![forbid(unsafe_code)]

pub mod device;
pub mod distance;
pub mod fps;

pub use device::Device;
pub use fps::{select, FpsConfig, SeedPolicy, SelectError};

#![forbid(unsafe_code)]

pub mod error;
pub mod npy;
pub mod pcd;

pub use error::FileError;
pub use npy::{describe, read_cloud_stack, read_points, write_points, Dtype, NpyInfo};
pub use pcd::{read_pcd, write_pcd, PcdFormat};

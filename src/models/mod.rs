pub mod common;
pub mod download;
pub mod image;

pub use common::*;
pub use download::*;
pub use image::*;

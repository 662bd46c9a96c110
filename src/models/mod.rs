pub mod common;
pub mod image;
pub mod upstream;

pub use common::*;
pub use image::*;
pub use upstream::*;

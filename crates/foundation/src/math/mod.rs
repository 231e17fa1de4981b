pub mod color;
pub mod geodesy;
pub mod mat4;
pub mod precision;
pub mod quat;
pub mod vec;

pub use color::*;
pub use geodesy::*;
pub use mat4::*;
pub use precision::*;
pub use quat::*;
pub use vec::*;

pub mod layer;
pub mod markers;
pub mod starfield;
pub mod symbology;

pub use layer::*;

//! Math, time and handle primitives shared by every Flare crate.

pub mod handles;
pub mod math;
pub mod time;

pub use handles::*;
pub use time::*;

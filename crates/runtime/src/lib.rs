pub mod event_bus;
pub mod frame;
pub mod spin;

pub use event_bus::*;
pub use frame::*;
pub use spin::*;

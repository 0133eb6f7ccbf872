//! Type definitions

pub mod customer;
pub mod device;
pub mod import;
pub mod inspection_item;
pub mod messages;

pub use customer::*;
pub use device::*;
pub use import::*;
pub use inspection_item::*;
pub use messages::*;

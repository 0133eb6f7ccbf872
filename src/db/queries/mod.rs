//! Database queries

pub mod customer;
pub mod device;
pub mod inspection_item;
pub mod item_name;

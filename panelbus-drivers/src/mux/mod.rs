//! Channel switch drivers

pub mod tca9548a;

pub use tca9548a::Tca9548a;

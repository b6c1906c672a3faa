//! Seams between the core and the hardware drivers
//!
//! These traits define the interface between the transport logic and the
//! concrete switch and panel implementations.

pub mod sink;
pub mod switch;

pub use sink::MessageSink;
pub use switch::ChannelSwitch;

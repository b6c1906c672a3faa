//! Display panel drivers
//!
//! Panels do not talk to the bus directly. They emit transport messages
//! into a [`MessageSink`](panelbus_core::MessageSink), which frames and
//! routes them.

pub mod sh1106;

pub use sh1106::{Sh1106, HEIGHT, PAGES, WIDTH};

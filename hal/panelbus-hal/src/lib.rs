//! Panelbus Hardware Abstraction Layer
//!
//! This crate defines the platform traits the transport core is written
//! against. A platform crate (Linux `i2c-dev`, or a mock in tests) provides
//! the implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  panelbus-app / panelbus-drivers        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  panelbus-core (transport, router)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  panelbus-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ panelbus-hal- │
//!             │    linux      │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`bus::BusProvider`], [`bus::BusHandle`] - Addressed bus access
//! - [`time::Sleep`] - Blocking sleep that may be woken early

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod error;
pub mod time;

pub use bus::{BusHandle, BusProvider};
pub use error::OsError;
pub use time::{Sleep, SleepError};

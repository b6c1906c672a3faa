//! Hardware driver implementations
//!
//! This crate provides concrete implementations on top of the traits
//! defined in panelbus-core:
//!
//! - Channel switches (TCA9548A)
//! - Display panels (SH1106 command stream)

#![no_std]
#![deny(unsafe_code)]

pub mod mux;
pub mod panel;

//! sdrsync-core: Core traits, types, and error definitions for sdrsync.
//!
//! This crate defines the server-agnostic abstractions the sync engine is
//! written against. The SDRangel HTTP backend and the test harness both
//! implement [`SdrControl`].
//!
//! # Key types
//!
//! - [`SdrControl`] -- read/write access to device and channel settings
//! - [`DeviceType`] / [`DeviceTypeHint`] -- supported device families
//! - [`SyncTarget`] -- the values one sync tick drives towards
//! - [`Error`] / [`Result`] -- error handling

pub mod control;
pub mod error;
pub mod helpers;
pub mod types;

pub use control::SdrControl;
pub use error::{Error, ErrorKind, Result};
pub use helpers::{format_freq_mhz, format_shift_hz};
pub use types::*;

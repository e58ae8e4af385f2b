//! sdrsync-test-harness: Test utilities and mock servers for sdrsync.
//!
//! This crate provides [`MockSdr`], an in-memory
//! [`SdrControl`](sdrsync_core::SdrControl) that records every write and can
//! inject failures per call, and [`MockHttpServer`] for testing the HTTP
//! backend against scripted responses without a running SDRangel.

pub mod mock_http;
pub mod mock_sdr;

pub use mock_http::{MockHttpServer, RecordedRequest};
pub use mock_sdr::{MockCall, MockSdr, WriteCall};

//! The `SdrControl` trait -- read/write access to an SDR control server.
//!
//! The sync engine programs against `SdrControl` rather than a concrete
//! HTTP client, so the same tick logic runs against a live server
//! (`sdrsync-sdrangel`) or the in-memory `MockSdr` from
//! `sdrsync-test-harness`.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChannelAddr, ChannelConfig, ChannelKind, DeviceConfig};

/// Asynchronous interface to the device and channel settings of an SDR
/// control server.
///
/// Every method is a single logical round trip against the live server.
/// Implementations do not cache between calls and do not retry; retry
/// policy belongs to the caller.
#[async_trait]
pub trait SdrControl: Send + Sync {
    /// Read the settings of a device set, including its center frequency.
    ///
    /// Fails with [`NotFound`](crate::Error::NotFound) if the device set does
    /// not exist and [`Schema`](crate::Error::Schema) if the center frequency
    /// cannot be located for the device's type.
    async fn read_device(&self, device_set: u32) -> Result<DeviceConfig>;

    /// Read the settings of a channel, including its frequency shift.
    ///
    /// Fails with [`Schema`](crate::Error::Schema) if the channel is not of
    /// the expected `kind` or carries no shift field.
    async fn read_channel(&self, addr: ChannelAddr, kind: ChannelKind) -> Result<ChannelConfig>;

    /// Set the frequency shift of a channel in hertz.
    ///
    /// Idempotent: writing the value already in place changes nothing.
    async fn write_channel_shift(
        &self,
        addr: ChannelAddr,
        kind: ChannelKind,
        shift_hz: i64,
    ) -> Result<()>;

    /// Set the center frequency of a device set in hertz.
    ///
    /// Idempotent: writing the value already in place changes nothing.
    async fn write_device_center_freq(&self, device_set: u32, freq_hz: u64) -> Result<()>;
}

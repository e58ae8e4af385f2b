//! In-memory SDR control server for deterministic engine tests.
//!
//! [`MockSdr`] implements [`SdrControl`] over a table of device sets and
//! channels held in memory. Every call is logged, writes mutate the table,
//! and any call can be made to fail with a chosen [`Error`].
//!
//! # Example
//!
//! ```
//! use sdrsync_core::{ChannelKind, Error};
//! use sdrsync_test_harness::{MockCall, MockSdr};
//!
//! let mock = MockSdr::new()
//!     .with_device(0, 145_500_000)
//!     .with_device(1, 145_500_000)
//!     .with_channel(0, 0, ChannelKind::SsbDemod, 1500)
//!     .with_channel(1, 0, ChannelKind::SsbMod, 1000);
//!
//! // Make every read of device set 1 fail.
//! mock.fail_on(MockCall::ReadDevice(1), Error::Timeout);
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::json;

use sdrsync_core::error::{Error, Result};
use sdrsync_core::{
    ChannelAddr, ChannelConfig, ChannelKind, DeviceConfig, DeviceType, Direction, SdrControl,
};

/// A call made against the mock, used both for the call log and for
/// failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    ReadDevice(u32),
    ReadChannel(ChannelAddr),
    WriteChannelShift(ChannelAddr),
    WriteDeviceCenterFreq(u32),
}

/// A write that reached the mock (successful or not).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteCall {
    ChannelShift { addr: ChannelAddr, shift_hz: i64 },
    DeviceCenterFreq { device_set: u32, freq_hz: u64 },
}

#[derive(Debug, Default)]
struct MockState {
    devices: HashMap<u32, u64>,
    channels: HashMap<ChannelAddr, (ChannelKind, i64)>,
    failures: HashMap<MockCall, Error>,
    calls: Vec<MockCall>,
    writes: Vec<WriteCall>,
}

/// An in-memory [`SdrControl`] for testing the sync engine.
///
/// Devices are reported as LimeSDR device sets. Reading a device set or
/// channel that was never added fails with [`Error::NotFound`]; reading a
/// channel as the wrong [`ChannelKind`] fails with [`Error::Schema`].
#[derive(Debug, Default)]
pub struct MockSdr {
    state: Mutex<MockState>,
}

impl MockSdr {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device set with the given center frequency.
    pub fn with_device(self, device_set: u32, center_freq_hz: u64) -> Self {
        self.lock().devices.insert(device_set, center_freq_hz);
        self
    }

    /// Add a channel of `kind` with the given shift.
    pub fn with_channel(self, device_set: u32, channel: u32, kind: ChannelKind, shift_hz: i64) -> Self {
        self.lock()
            .channels
            .insert(ChannelAddr::new(device_set, channel), (kind, shift_hz));
        self
    }

    /// Make every subsequent `call` fail with `error` until cleared.
    pub fn fail_on(&self, call: MockCall, error: Error) {
        self.lock().failures.insert(call, error);
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Every write attempted so far, in order.
    pub fn writes(&self) -> Vec<WriteCall> {
        self.lock().writes.clone()
    }

    /// Current center frequency of a device set.
    pub fn center_freq(&self, device_set: u32) -> Option<u64> {
        self.lock().devices.get(&device_set).copied()
    }

    /// Current shift of a channel.
    pub fn shift(&self, addr: ChannelAddr) -> Option<i64> {
        self.lock().channels.get(&addr).map(|(_, shift)| *shift)
    }

    /// Change a device's center frequency out of band (as a user would).
    pub fn set_center_freq(&self, device_set: u32, center_freq_hz: u64) {
        self.lock().devices.insert(device_set, center_freq_hz);
    }

    /// Change a channel's shift out of band (as a user would).
    pub fn set_shift(&self, addr: ChannelAddr, shift_hz: i64) {
        if let Some(entry) = self.lock().channels.get_mut(&addr) {
            entry.1 = shift_hz;
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panic in one test thread must not cascade into unrelated
        // assertions.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Log the call and return its injected failure, if any.
    fn enter(state: &mut MockState, call: MockCall) -> Result<()> {
        state.calls.push(call);
        match state.failures.get(&call) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn channel(state: &MockState, addr: ChannelAddr, kind: ChannelKind) -> Result<i64> {
        match state.channels.get(&addr) {
            None => Err(Error::NotFound(format!("no channel at {addr}"))),
            Some((k, _)) if *k != kind => Err(Error::schema(
                kind.to_string(),
                format!("channel at {addr} is {k}"),
            )),
            Some((_, shift)) => Ok(*shift),
        }
    }
}

#[async_trait]
impl SdrControl for MockSdr {
    async fn read_device(&self, device_set: u32) -> Result<DeviceConfig> {
        let mut state = self.lock();
        Self::enter(&mut state, MockCall::ReadDevice(device_set))?;
        let center_freq_hz = *state
            .devices
            .get(&device_set)
            .ok_or_else(|| Error::NotFound(format!("no device set {device_set}")))?;
        Ok(DeviceConfig {
            device_set,
            device_type: DeviceType::LimeSdr,
            direction: Some(Direction::Rx),
            center_freq_hz,
            raw: json!({
                "deviceHwType": "LimeSDR",
                "direction": 0,
                "limeSdrInputSettings": {"centerFrequency": center_freq_hz}
            }),
        })
    }

    async fn read_channel(&self, addr: ChannelAddr, kind: ChannelKind) -> Result<ChannelConfig> {
        let mut state = self.lock();
        Self::enter(&mut state, MockCall::ReadChannel(addr))?;
        let shift_hz = Self::channel(&state, addr, kind)?;
        Ok(ChannelConfig {
            addr,
            kind,
            shift_hz,
            raw: json!({ "inputFrequencyOffset": shift_hz }),
        })
    }

    async fn write_channel_shift(
        &self,
        addr: ChannelAddr,
        kind: ChannelKind,
        shift_hz: i64,
    ) -> Result<()> {
        let mut state = self.lock();
        state.writes.push(WriteCall::ChannelShift { addr, shift_hz });
        Self::enter(&mut state, MockCall::WriteChannelShift(addr))?;
        Self::channel(&state, addr, kind)?;
        if let Some(entry) = state.channels.get_mut(&addr) {
            entry.1 = shift_hz;
        }
        Ok(())
    }

    async fn write_device_center_freq(&self, device_set: u32, freq_hz: u64) -> Result<()> {
        let mut state = self.lock();
        state.writes.push(WriteCall::DeviceCenterFreq {
            device_set,
            freq_hz,
        });
        Self::enter(&mut state, MockCall::WriteDeviceCenterFreq(device_set))?;
        match state.devices.get_mut(&device_set) {
            Some(freq) => {
                *freq = freq_hz;
                Ok(())
            }
            None => Err(Error::NotFound(format!("no device set {device_set}"))),
        }
    }
}

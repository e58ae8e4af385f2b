//! Core types used throughout sdrsync.
//!
//! These types describe what the synchronizer reads from and writes to an
//! SDR control server: device sets and their center frequencies, SSB
//! channels and their frequency shifts, and the per-tick sync target.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{Error, Result};

/// Address of one channel inside a device set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelAddr {
    /// Device set index on the server.
    pub device_set: u32,
    /// Channel index within the device set.
    pub channel: u32,
}

impl ChannelAddr {
    pub fn new(device_set: u32, channel: u32) -> Self {
        ChannelAddr {
            device_set,
            channel,
        }
    }
}

impl fmt::Display for ChannelAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deviceset {} channel {}", self.device_set, self.channel)
    }
}

/// Signal direction of a device set or channel.
///
/// The server encodes this as `0` (Rx) / `1` (Tx) in the `direction` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Rx,
    Tx,
}

impl Direction {
    /// Decode the server's numeric direction code.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Direction::Rx),
            1 => Some(Direction::Tx),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Rx => write!(f, "Rx"),
            Direction::Tx => write!(f, "Tx"),
        }
    }
}

/// Kind of channel whose frequency shift is synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// SSB demodulator on a receive device set.
    SsbDemod,
    /// SSB modulator on a transmit device set.
    SsbMod,
}

impl ChannelKind {
    /// Direction of the device set this channel kind lives on.
    pub fn direction(&self) -> Direction {
        match self {
            ChannelKind::SsbDemod => Direction::Rx,
            ChannelKind::SsbMod => Direction::Tx,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::SsbDemod => write!(f, "SSB-demod"),
            ChannelKind::SsbMod => write!(f, "SSB-mod"),
        }
    }
}

/// User-supplied field locations for a device family without a built-in
/// table entry.
///
/// Each entry is a JSON pointer (RFC 6901), tried in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPaths {
    pub center_frequency: Vec<String>,
}

/// Closed set of supported device families.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceType {
    /// LimeSDR (USB / Mini), input or output device set.
    LimeSdr,
    /// Ettus USRP B200 family, input or output device set.
    UsrpB200,
    /// Any other device, located through explicit field paths.
    Other(FieldPaths),
}

impl DeviceType {
    /// Short display name used in log lines and schema errors.
    pub fn name(&self) -> &'static str {
        match self {
            DeviceType::LimeSdr => "LimeSDR",
            DeviceType::UsrpB200 => "USRP-B200",
            DeviceType::Other(_) => "Other",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Configured expectation about a device set's family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum DeviceTypeHint {
    /// Resolve from the document's `deviceHwType` on every read.
    #[default]
    Auto,
    /// Always interpret documents as this family.
    Fixed(DeviceType),
}

impl fmt::Display for DeviceTypeHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceTypeHint::Auto => write!(f, "auto"),
            DeviceTypeHint::Fixed(DeviceType::Other(paths)) => {
                write!(f, "other:{}", paths.center_frequency.join(","))
            }
            DeviceTypeHint::Fixed(t) => write!(f, "{t}"),
        }
    }
}

/// Error returned when a string cannot be parsed into a [`DeviceTypeHint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDeviceTypeError(String);

impl fmt::Display for ParseDeviceTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown device type: {}", self.0)
    }
}

impl std::error::Error for ParseDeviceTypeError {}

/// Prefix of a hint carrying user-supplied center frequency pointers.
const OTHER_PREFIX: &str = "other:";

impl FromStr for DeviceTypeHint {
    type Err = ParseDeviceTypeError;

    /// Accepts `auto`, `limesdr`, `usrp` (or `usrp-b200`), and
    /// `other:<pointer>[,<pointer>...]`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let other = s
            .get(..OTHER_PREFIX.len())
            .filter(|p| p.eq_ignore_ascii_case(OTHER_PREFIX))
            .map(|_| &s[OTHER_PREFIX.len()..]);
        if let Some(rest) = other {
            let paths: Vec<String> = rest
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            if paths.is_empty() || paths.iter().any(|p| !p.starts_with('/')) {
                return Err(ParseDeviceTypeError(s.to_string()));
            }
            return Ok(DeviceTypeHint::Fixed(DeviceType::Other(FieldPaths {
                center_frequency: paths,
            })));
        }

        match s.to_lowercase().as_str() {
            "auto" => Ok(DeviceTypeHint::Auto),
            "limesdr" | "lime" => Ok(DeviceTypeHint::Fixed(DeviceType::LimeSdr)),
            "usrp" | "usrp-b200" | "usrp_b200" | "b200" => {
                Ok(DeviceTypeHint::Fixed(DeviceType::UsrpB200))
            }
            _ => Err(ParseDeviceTypeError(s.to_string())),
        }
    }
}

/// Snapshot of one device set's settings, read fresh every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    pub device_set: u32,
    /// Family the document was interpreted as.
    pub device_type: DeviceType,
    /// Direction reported by the server, if present.
    pub direction: Option<Direction>,
    /// Tuned center frequency in hertz.
    pub center_freq_hz: u64,
    /// The raw settings document as returned by the server.
    pub raw: Value,
}

/// Snapshot of one channel's settings, read fresh every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    pub addr: ChannelAddr,
    pub kind: ChannelKind,
    /// Frequency shift relative to the device center frequency, in hertz.
    pub shift_hz: i64,
    /// The raw settings document as returned by the server.
    pub raw: Value,
}

/// Values one tick drives the server towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTarget {
    pub tx_shift_hz: i64,
    pub r1_center_hz: u64,
}

impl SyncTarget {
    /// `tx_shift = rx_shift + offset`, `r1_center = r0_center`.
    ///
    /// Integer arithmetic throughout; overflow is reported rather than
    /// wrapped.
    pub fn compute(rx_shift_hz: i64, offset_hz: i64, r0_center_hz: u64) -> Result<Self> {
        let tx_shift_hz = rx_shift_hz.checked_add(offset_hz).ok_or_else(|| {
            Error::InvalidParameter(format!(
                "shift {rx_shift_hz} Hz + offset {offset_hz} Hz overflows"
            ))
        })?;
        Ok(SyncTarget {
            tx_shift_hz,
            r1_center_hz: r0_center_hz,
        })
    }
}

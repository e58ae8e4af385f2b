//! SDRangel device and channel schema tables.
//!
//! SDRangel nests device settings under a per-driver key whose name depends
//! on both the hardware family and the direction of the device set, e.g.
//! `limeSdrInputSettings` for a LimeSDR receive device set and
//! `usrpOutputSettings` for a USRP transmit device set. Channel settings are
//! nested under a per-channel-type key such as `SSBDemodSettings`.
//!
//! Each supported family is described by a [`DeviceModel`] returned from a
//! factory function. The Field Extractor only ever consults these tables;
//! it never probes documents for keys that look plausible.
//!
//! | Device type | `deviceHwType` | Rx key                 | Tx key                  |
//! |-------------|----------------|------------------------|-------------------------|
//! | LimeSDR     | `LimeSDR`      | `limeSdrInputSettings` | `limeSdrOutputSettings` |
//! | USRP-B200   | `USRP`         | `usrpInputSettings`    | `usrpOutputSettings`    |
//!
//! | Channel kind | `channelType` | Settings key       | Shift field            |
//! |--------------|---------------|--------------------|------------------------|
//! | SSB-demod    | `SSBDemod`    | `SSBDemodSettings` | `inputFrequencyOffset` |
//! | SSB-mod      | `SSBMod`      | `SSBModSettings`   | `inputFrequencyOffset` |

use sdrsync_core::{ChannelKind, DeviceType, Direction};

/// Name of the center frequency field inside a driver settings object.
pub const CENTER_FREQUENCY_FIELD: &str = "centerFrequency";

/// Name of the shift field inside an SSB channel settings object.
pub const SHIFT_FIELD: &str = "inputFrequencyOffset";

/// Static schema definition for one device family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceModel {
    /// The family this model describes.
    pub device_type: DeviceType,
    /// Value of the document's `deviceHwType` field for this family.
    pub hw_type: &'static str,
    /// Settings key used by receive device sets.
    pub input_key: &'static str,
    /// Settings key used by transmit device sets.
    pub output_key: &'static str,
}

impl DeviceModel {
    /// JSON pointers to the center frequency.
    ///
    /// The side matching `direction` comes first; receive first when the
    /// direction is unknown.
    pub fn center_freq_paths(&self, direction: Option<Direction>) -> Vec<String> {
        let input = format!("/{}/{}", self.input_key, CENTER_FREQUENCY_FIELD);
        let output = format!("/{}/{}", self.output_key, CENTER_FREQUENCY_FIELD);
        match direction {
            Some(Direction::Tx) => vec![output, input],
            _ => vec![input, output],
        }
    }
}

/// LimeSDR USB / LimeSDR Mini.
pub fn lime_sdr() -> DeviceModel {
    DeviceModel {
        device_type: DeviceType::LimeSdr,
        hw_type: "LimeSDR",
        input_key: "limeSdrInputSettings",
        output_key: "limeSdrOutputSettings",
    }
}

/// Ettus USRP B200 / B210 (SDRangel reports the whole UHD family as `USRP`).
pub fn usrp_b200() -> DeviceModel {
    DeviceModel {
        device_type: DeviceType::UsrpB200,
        hw_type: "USRP",
        input_key: "usrpInputSettings",
        output_key: "usrpOutputSettings",
    }
}

/// All built-in device models.
pub fn all_models() -> Vec<DeviceModel> {
    vec![lime_sdr(), usrp_b200()]
}

/// Look up the built-in model whose `deviceHwType` matches `hw_type`.
pub fn model_for_hw_type(hw_type: &str) -> Option<DeviceModel> {
    all_models().into_iter().find(|m| m.hw_type == hw_type)
}

/// Center frequency pointers for a device type, in lookup order.
///
/// User-supplied paths keep their given order regardless of direction.
pub fn center_freq_paths(device_type: &DeviceType, direction: Option<Direction>) -> Vec<String> {
    match device_type {
        DeviceType::LimeSdr => lime_sdr().center_freq_paths(direction),
        DeviceType::UsrpB200 => usrp_b200().center_freq_paths(direction),
        DeviceType::Other(paths) => paths.center_frequency.clone(),
    }
}

/// Static schema definition for one channel kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelModel {
    pub kind: ChannelKind,
    /// Value of the document's `channelType` field.
    pub channel_type: &'static str,
    /// Key of the nested settings object.
    pub settings_key: &'static str,
}

impl ChannelModel {
    /// JSON pointer to the frequency shift.
    pub fn shift_path(&self) -> String {
        format!("/{}/{}", self.settings_key, SHIFT_FIELD)
    }
}

/// Schema for a channel kind.
pub fn channel_model(kind: ChannelKind) -> ChannelModel {
    match kind {
        ChannelKind::SsbDemod => ChannelModel {
            kind,
            channel_type: "SSBDemod",
            settings_key: "SSBDemodSettings",
        },
        ChannelKind::SsbMod => ChannelModel {
            kind,
            channel_type: "SSBMod",
            settings_key: "SSBModSettings",
        },
    }
}

//! Field extraction from SDRangel settings documents.
//!
//! Every lookup goes through the tables in [`crate::models`]. A field that
//! is absent, or present with a non-numeric value, is a
//! [`Schema`](Error::Schema) error naming the device type and the field.
//!
//! Frequencies are carried as integer hertz. JSON integers are taken as-is;
//! finite JSON floats are rounded to the nearest hertz. Center frequencies
//! must be non-negative.
//!
//! All functions in this module are pure -- no I/O is performed.

use serde_json::Value;

use sdrsync_core::{ChannelKind, DeviceType, DeviceTypeHint, Direction, Error, Result};

use crate::models::{self, channel_model};

/// Top-level key carrying the driver family of a device settings document.
pub const DEVICE_HW_TYPE_KEY: &str = "deviceHwType";

/// Top-level key carrying the direction of a settings document.
pub const DIRECTION_KEY: &str = "direction";

/// Top-level key carrying the channel type of a channel settings document.
pub const CHANNEL_TYPE_KEY: &str = "channelType";

/// Decide which device family a document is interpreted as.
///
/// A fixed hint is returned unchanged; `Auto` resolves the document's
/// `deviceHwType` through the built-in model table.
pub fn resolve_device_type(doc: &Value, hint: &DeviceTypeHint) -> Result<DeviceType> {
    match hint {
        DeviceTypeHint::Fixed(t) => Ok(t.clone()),
        DeviceTypeHint::Auto => {
            let hw_type = doc
                .get(DEVICE_HW_TYPE_KEY)
                .and_then(Value::as_str)
                .ok_or_else(|| Error::schema("auto", DEVICE_HW_TYPE_KEY))?;
            models::model_for_hw_type(hw_type)
                .map(|m| m.device_type)
                .ok_or_else(|| Error::schema(hw_type, DEVICE_HW_TYPE_KEY))
        }
    }
}

/// The direction recorded in a settings document, if any.
pub fn extract_direction(doc: &Value) -> Option<Direction> {
    doc.get(DIRECTION_KEY)
        .and_then(Value::as_u64)
        .and_then(Direction::from_code)
}

/// Locate the center frequency pointer for `device_type` within `doc`.
///
/// Returns the first table path that resolves to a value. The document's
/// `direction` decides whether input or output settings are tried first.
pub fn center_freq_pointer(doc: &Value, device_type: &DeviceType) -> Result<String> {
    let paths = models::center_freq_paths(device_type, extract_direction(doc));
    paths
        .iter()
        .find(|p| doc.pointer(p).is_some())
        .cloned()
        .ok_or_else(|| Error::schema(device_type.name(), paths.join(" or ")))
}

/// Extract the device center frequency in hertz.
pub fn extract_center_freq(doc: &Value, device_type: &DeviceType) -> Result<u64> {
    let pointer = center_freq_pointer(doc, device_type)?;
    doc.pointer(&pointer)
        .and_then(hz_from_json)
        .and_then(|hz| u64::try_from(hz).ok())
        .ok_or_else(|| Error::schema(device_type.name(), pointer))
}

/// Extract the SSB channel frequency shift in hertz.
pub fn extract_shift(doc: &Value, kind: ChannelKind) -> Result<i64> {
    let pointer = channel_model(kind).shift_path();
    doc.pointer(&pointer)
        .and_then(hz_from_json)
        .ok_or_else(|| Error::schema(kind.to_string(), pointer))
}

/// Check that a channel document reports the channel type and direction
/// expected for `kind`. Documents without these fields pass.
pub fn check_channel_type(doc: &Value, kind: ChannelKind) -> Result<()> {
    if let Some(t) = doc.get(CHANNEL_TYPE_KEY).and_then(Value::as_str) {
        if t != channel_model(kind).channel_type {
            return Err(Error::schema(kind.to_string(), format!("{CHANNEL_TYPE_KEY}={t}")));
        }
    }
    match extract_direction(doc) {
        Some(d) if d != kind.direction() => {
            Err(Error::schema(kind.to_string(), format!("{DIRECTION_KEY}={d}")))
        }
        _ => Ok(()),
    }
}

/// Replace the center frequency in a device settings document.
pub fn set_center_freq(doc: &mut Value, device_type: &DeviceType, freq_hz: u64) -> Result<()> {
    let pointer = center_freq_pointer(doc, device_type)?;
    match doc.pointer_mut(&pointer) {
        Some(slot) => {
            *slot = Value::from(freq_hz);
            Ok(())
        }
        None => Err(Error::schema(device_type.name(), pointer)),
    }
}

/// Replace the frequency shift in a channel settings document.
pub fn set_shift(doc: &mut Value, kind: ChannelKind, shift_hz: i64) -> Result<()> {
    let pointer = channel_model(kind).shift_path();
    match doc.pointer_mut(&pointer) {
        Some(slot) => {
            *slot = Value::from(shift_hz);
            Ok(())
        }
        None => Err(Error::schema(kind.to_string(), pointer)),
    }
}

/// Convert a JSON number to integer hertz.
fn hz_from_json(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    if n.is_u64() {
        // Beyond i64::MAX; no real frequency lives there.
        return None;
    }
    let f = n.as_f64()?;
    let rounded = f.round();
    if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        Some(rounded as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdrsync_core::FieldPaths;
    use serde_json::json;

    fn lime_rx_doc() -> Value {
        json!({
            "deviceHwType": "LimeSDR",
            "direction": 0,
            "limeSdrInputSettings": {
                "centerFrequency": 145_500_000,
                "devSampleRate": 3_200_000,
                "gain": 50
            }
        })
    }

    fn usrp_tx_doc() -> Value {
        json!({
            "deviceHwType": "USRP",
            "direction": 1,
            "usrpOutputSettings": {
                "centerFrequency": 435_100_000u64,
                "gain": 60
            }
        })
    }

    fn ssb_demod_doc(shift: Value) -> Value {
        json!({
            "channelType": "SSBDemod",
            "direction": 0,
            "SSBDemodSettings": {
                "inputFrequencyOffset": shift,
                "rfBandwidth": 3000
            }
        })
    }

    #[test]
    fn lime_center_freq() {
        assert_eq!(
            extract_center_freq(&lime_rx_doc(), &DeviceType::LimeSdr).unwrap(),
            145_500_000
        );
    }

    #[test]
    fn usrp_output_center_freq() {
        assert_eq!(
            extract_center_freq(&usrp_tx_doc(), &DeviceType::UsrpB200).unwrap(),
            435_100_000
        );
    }

    #[test]
    fn lime_doc_under_usrp_hint_is_schema_error() {
        let err = extract_center_freq(&lime_rx_doc(), &DeviceType::UsrpB200).unwrap_err();
        match err {
            Error::Schema { device_type, field } => {
                assert_eq!(device_type, "USRP-B200");
                assert!(field.contains("/usrpInputSettings/centerFrequency"));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn missing_center_freq_never_defaults_to_zero() {
        let doc = json!({"deviceHwType": "LimeSDR", "limeSdrInputSettings": {"gain": 50}});
        assert!(matches!(
            extract_center_freq(&doc, &DeviceType::LimeSdr),
            Err(Error::Schema { .. })
        ));
    }

    #[test]
    fn non_numeric_center_freq_is_schema_error() {
        let doc = json!({"limeSdrInputSettings": {"centerFrequency": "145500000"}});
        assert!(matches!(
            extract_center_freq(&doc, &DeviceType::LimeSdr),
            Err(Error::Schema { .. })
        ));
    }

    #[test]
    fn negative_center_freq_is_schema_error() {
        let doc = json!({"limeSdrInputSettings": {"centerFrequency": -1}});
        assert!(matches!(
            extract_center_freq(&doc, &DeviceType::LimeSdr),
            Err(Error::Schema { .. })
        ));
    }

    #[test]
    fn other_type_uses_supplied_paths() {
        let t = DeviceType::Other(FieldPaths {
            center_frequency: vec![
                "/missing/centerFrequency".into(),
                "/airspyHFSettings/centerFrequency".into(),
            ],
        });
        let doc = json!({"airspyHFSettings": {"centerFrequency": 7_074_000}});
        assert_eq!(extract_center_freq(&doc, &t).unwrap(), 7_074_000);
    }

    #[test]
    fn shift_integer() {
        assert_eq!(
            extract_shift(&ssb_demod_doc(json!(1500)), ChannelKind::SsbDemod).unwrap(),
            1500
        );
        assert_eq!(
            extract_shift(&ssb_demod_doc(json!(-2400)), ChannelKind::SsbDemod).unwrap(),
            -2400
        );
    }

    #[test]
    fn shift_float_rounds_to_nearest_hz() {
        assert_eq!(
            extract_shift(&ssb_demod_doc(json!(1500.4)), ChannelKind::SsbDemod).unwrap(),
            1500
        );
        assert_eq!(
            extract_shift(&ssb_demod_doc(json!(-1500.6)), ChannelKind::SsbDemod).unwrap(),
            -1501
        );
    }

    #[test]
    fn demod_doc_under_mod_kind_is_schema_error() {
        let err = extract_shift(&ssb_demod_doc(json!(1500)), ChannelKind::SsbMod).unwrap_err();
        assert_eq!(
            err,
            Error::schema("SSB-mod", "/SSBModSettings/inputFrequencyOffset")
        );
    }

    #[test]
    fn channel_type_mismatch_is_schema_error() {
        let doc = ssb_demod_doc(json!(1500));
        assert!(check_channel_type(&doc, ChannelKind::SsbDemod).is_ok());
        assert_eq!(
            check_channel_type(&doc, ChannelKind::SsbMod).unwrap_err(),
            Error::schema("SSB-mod", "channelType=SSBDemod")
        );
        assert!(check_channel_type(&json!({}), ChannelKind::SsbMod).is_ok());
    }

    #[test]
    fn channel_on_wrong_side_is_schema_error() {
        let mut doc = ssb_demod_doc(json!(1500));
        doc["direction"] = json!(1);
        assert_eq!(
            check_channel_type(&doc, ChannelKind::SsbDemod).unwrap_err(),
            Error::schema("SSB-demod", "direction=Tx")
        );
    }

    #[test]
    fn tx_device_prefers_output_center_freq() {
        let doc = json!({
            "deviceHwType": "LimeSDR",
            "direction": 1,
            "limeSdrInputSettings": {"centerFrequency": 145_500_000},
            "limeSdrOutputSettings": {"centerFrequency": 435_100_000}
        });
        assert_eq!(
            extract_center_freq(&doc, &DeviceType::LimeSdr).unwrap(),
            435_100_000
        );

        let mut doc = doc;
        set_center_freq(&mut doc, &DeviceType::LimeSdr, 435_200_000).unwrap();
        assert_eq!(doc["limeSdrOutputSettings"]["centerFrequency"], json!(435_200_000));
        assert_eq!(doc["limeSdrInputSettings"]["centerFrequency"], json!(145_500_000));
    }

    #[test]
    fn null_shift_is_schema_error() {
        assert!(matches!(
            extract_shift(&ssb_demod_doc(Value::Null), ChannelKind::SsbDemod),
            Err(Error::Schema { .. })
        ));
    }

    #[test]
    fn resolve_fixed_hint_ignores_document() {
        let t = resolve_device_type(&lime_rx_doc(), &DeviceTypeHint::Fixed(DeviceType::UsrpB200))
            .unwrap();
        assert_eq!(t, DeviceType::UsrpB200);
    }

    #[test]
    fn resolve_auto_hint_from_hw_type() {
        assert_eq!(
            resolve_device_type(&lime_rx_doc(), &DeviceTypeHint::Auto).unwrap(),
            DeviceType::LimeSdr
        );
        assert_eq!(
            resolve_device_type(&usrp_tx_doc(), &DeviceTypeHint::Auto).unwrap(),
            DeviceType::UsrpB200
        );
    }

    #[test]
    fn resolve_auto_unknown_hw_type_is_schema_error() {
        let doc = json!({"deviceHwType": "HackRF", "hackRFInputSettings": {"centerFrequency": 1}});
        assert_eq!(
            resolve_device_type(&doc, &DeviceTypeHint::Auto).unwrap_err(),
            Error::schema("HackRF", "deviceHwType")
        );
    }

    #[test]
    fn resolve_auto_without_hw_type_is_schema_error() {
        let doc = json!({"limeSdrInputSettings": {"centerFrequency": 1}});
        assert!(matches!(
            resolve_device_type(&doc, &DeviceTypeHint::Auto),
            Err(Error::Schema { .. })
        ));
    }

    #[test]
    fn direction_extraction() {
        assert_eq!(extract_direction(&lime_rx_doc()), Some(Direction::Rx));
        assert_eq!(extract_direction(&usrp_tx_doc()), Some(Direction::Tx));
        assert_eq!(extract_direction(&json!({})), None);
    }

    #[test]
    fn set_center_freq_touches_only_the_resolved_field() {
        let mut doc = lime_rx_doc();
        set_center_freq(&mut doc, &DeviceType::LimeSdr, 144_300_000).unwrap();
        assert_eq!(doc["limeSdrInputSettings"]["centerFrequency"], json!(144_300_000));
        assert_eq!(doc["limeSdrInputSettings"]["gain"], json!(50));
        assert_eq!(doc["deviceHwType"], json!("LimeSDR"));
    }

    #[test]
    fn set_shift_writes_integer() {
        let mut doc = ssb_demod_doc(json!(1500.0));
        set_shift(&mut doc, ChannelKind::SsbDemod, 1300).unwrap();
        assert_eq!(doc["SSBDemodSettings"]["inputFrequencyOffset"], json!(1300));
    }

    #[test]
    fn set_shift_on_wrong_kind_fails() {
        let mut doc = ssb_demod_doc(json!(1500));
        assert!(set_shift(&mut doc, ChannelKind::SsbMod, 1300).is_err());
    }
}

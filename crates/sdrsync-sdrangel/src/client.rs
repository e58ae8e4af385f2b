//! SDRangel REST API client.
//!
//! [`SdrangelClient`] implements [`SdrControl`] on top of SDRangel's
//! device-settings and channel-settings endpoints:
//!
//! ```text
//! GET   /sdrangel                                     instance summary
//! GET   /sdrangel/deviceset/{d}/device/settings       device settings
//! PATCH /sdrangel/deviceset/{d}/device/settings
//! GET   /sdrangel/deviceset/{d}/channel/{c}/settings  channel settings
//! PATCH /sdrangel/deviceset/{d}/channel/{c}/settings
//! ```
//!
//! Writes follow SDRangel's PATCH semantics: the current settings document
//! is fetched, the single resolved field is replaced, and the document is
//! sent back. When the field already holds the requested value the PATCH is
//! skipped. There is no caching and no retry at this layer.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use sdrsync_core::error::{Error, Result};
use sdrsync_core::{
    ChannelAddr, ChannelConfig, ChannelKind, DeviceConfig, DeviceTypeHint, SdrControl,
};

use crate::extract;

/// Summary returned by `GET /sdrangel`.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceSummary {
    #[serde(default)]
    pub appname: String,
    pub version: String,
    #[serde(default)]
    pub devicesetlist: Option<DeviceSetList>,
}

/// Device set overview embedded in [`InstanceSummary`].
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSetList {
    #[serde(default)]
    pub devicesetcount: u32,
}

/// Error body SDRangel attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Whether a request reads or writes server state; decides how 4xx
/// statuses are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

/// HTTP client for one SDRangel instance.
///
/// Construct through [`SdrangelBuilder`](crate::SdrangelBuilder).
#[derive(Debug, Clone)]
pub struct SdrangelClient {
    http: reqwest::Client,
    /// Base URL without a trailing slash, e.g. `http://localhost:8091`.
    base_url: String,
    /// Declared device family per device set index.
    device_types: HashMap<u32, DeviceTypeHint>,
}

impl SdrangelClient {
    pub(crate) fn new(
        http: reqwest::Client,
        base_url: String,
        device_types: HashMap<u32, DeviceTypeHint>,
    ) -> Self {
        SdrangelClient {
            http,
            base_url,
            device_types,
        }
    }

    /// The validated base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The declared device family of a device set (`Auto` if undeclared).
    pub fn device_type_hint(&self, device_set: u32) -> DeviceTypeHint {
        self.device_types
            .get(&device_set)
            .cloned()
            .unwrap_or_default()
    }

    /// Fetch the instance summary (`GET /sdrangel`).
    ///
    /// Used as a reachability probe at startup.
    pub async fn instance_summary(&self) -> Result<InstanceSummary> {
        let url = self.url("/sdrangel");
        let doc = self.get_json(&url).await?;
        serde_json::from_value(doc).map_err(|e| Error::Parse(format!("{url}: {e}")))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn device_settings_url(&self, device_set: u32) -> String {
        self.url(&format!("/sdrangel/deviceset/{device_set}/device/settings"))
    }

    fn channel_settings_url(&self, addr: ChannelAddr) -> String {
        self.url(&format!(
            "/sdrangel/deviceset/{}/channel/{}/settings",
            addr.device_set, addr.channel
        ))
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        tracing::trace!(url = %url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(url, e))?;
        tracing::trace!(url = %url, status = status.as_u16(), len = body.len(), "GET response");

        if !status.is_success() {
            return Err(status_error(url, status, &body, Access::Read));
        }
        serde_json::from_str(&body).map_err(|e| Error::Parse(format!("{url}: {e}")))
    }

    async fn patch_json(&self, url: &str, doc: &Value) -> Result<()> {
        tracing::trace!(url = %url, "PATCH");
        let response = self
            .http
            .patch(url)
            .json(doc)
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(url, status, &body, Access::Write))
    }
}

#[async_trait]
impl SdrControl for SdrangelClient {
    async fn read_device(&self, device_set: u32) -> Result<DeviceConfig> {
        let url = self.device_settings_url(device_set);
        let doc = self.get_json(&url).await?;
        let device_type = extract::resolve_device_type(&doc, &self.device_type_hint(device_set))?;
        let center_freq_hz = extract::extract_center_freq(&doc, &device_type)?;
        tracing::debug!(
            device_set,
            device_type = %device_type,
            center_freq_hz,
            "read device settings"
        );
        Ok(DeviceConfig {
            device_set,
            direction: extract::extract_direction(&doc),
            device_type,
            center_freq_hz,
            raw: doc,
        })
    }

    async fn read_channel(&self, addr: ChannelAddr, kind: ChannelKind) -> Result<ChannelConfig> {
        let url = self.channel_settings_url(addr);
        let doc = self.get_json(&url).await?;
        extract::check_channel_type(&doc, kind)?;
        let shift_hz = extract::extract_shift(&doc, kind)?;
        tracing::debug!(%addr, kind = %kind, shift_hz, "read channel settings");
        Ok(ChannelConfig {
            addr,
            kind,
            shift_hz,
            raw: doc,
        })
    }

    async fn write_channel_shift(
        &self,
        addr: ChannelAddr,
        kind: ChannelKind,
        shift_hz: i64,
    ) -> Result<()> {
        let url = self.channel_settings_url(addr);
        let mut doc = self.get_json(&url).await?;
        extract::check_channel_type(&doc, kind)?;
        if extract::extract_shift(&doc, kind)? == shift_hz {
            tracing::debug!(%addr, shift_hz, "channel shift already in place, PATCH skipped");
            return Ok(());
        }
        extract::set_shift(&mut doc, kind, shift_hz)?;
        self.patch_json(&url, &doc).await?;
        tracing::debug!(%addr, kind = %kind, shift_hz, "channel shift written");
        Ok(())
    }

    async fn write_device_center_freq(&self, device_set: u32, freq_hz: u64) -> Result<()> {
        let url = self.device_settings_url(device_set);
        let mut doc = self.get_json(&url).await?;
        let device_type = extract::resolve_device_type(&doc, &self.device_type_hint(device_set))?;
        if extract::extract_center_freq(&doc, &device_type)? == freq_hz {
            tracing::debug!(device_set, freq_hz, "center frequency already in place, PATCH skipped");
            return Ok(());
        }
        extract::set_center_freq(&mut doc, &device_type, freq_hz)?;
        self.patch_json(&url, &doc).await?;
        tracing::debug!(device_set, device_type = %device_type, freq_hz, "center frequency written");
        Ok(())
    }
}

/// Classify a failed request.
fn transport_error(url: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else {
        Error::Transport(format!("{url}: {e}"))
    }
}

/// Classify a non-2xx response.
///
/// 404 is `NotFound` for both reads and writes; any other 4xx on a write is
/// the server refusing the value. Everything else is a transport failure.
fn status_error(url: &str, status: StatusCode, body: &str, access: Access) -> Error {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("").to_string());

    if status == StatusCode::NOT_FOUND {
        Error::NotFound(format!("{url}: {detail}"))
    } else if access == Access::Write && status.is_client_error() {
        Error::Rejected(format!("HTTP {}: {detail}", status.as_u16()))
    } else {
        Error::Transport(format!("{url}: HTTP {}: {detail}", status.as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SdrangelBuilder;
    use sdrsync_core::{DeviceType, Direction};
    use sdrsync_test_harness::MockHttpServer;
    use serde_json::json;
    use std::time::Duration;

    const DEVICE0: &str = "/sdrangel/deviceset/0/device/settings";
    const DEVICE1: &str = "/sdrangel/deviceset/1/device/settings";
    const RX_CHANNEL: &str = "/sdrangel/deviceset/0/channel/0/settings";
    const TX_CHANNEL: &str = "/sdrangel/deviceset/1/channel/0/settings";

    fn lime_rx(center: u64) -> String {
        json!({
            "deviceHwType": "LimeSDR",
            "direction": 0,
            "limeSdrInputSettings": {"centerFrequency": center, "gain": 50}
        })
        .to_string()
    }

    fn ssb_mod(shift: i64) -> String {
        json!({
            "channelType": "SSBMod",
            "direction": 1,
            "SSBModSettings": {"inputFrequencyOffset": shift, "toneFrequency": 1000.0}
        })
        .to_string()
    }

    fn client_for(server: &MockHttpServer) -> SdrangelClient {
        SdrangelBuilder::new()
            .base_url(&server.base_url())
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn read_device_lime() {
        let mut server = MockHttpServer::new().await.unwrap();
        server.expect("GET", DEVICE0, 200, &lime_rx(145_500_000));
        server.start();

        let client = client_for(&server);
        let dev = client.read_device(0).await.unwrap();
        assert_eq!(dev.device_set, 0);
        assert_eq!(dev.device_type, DeviceType::LimeSdr);
        assert_eq!(dev.direction, Some(Direction::Rx));
        assert_eq!(dev.center_freq_hz, 145_500_000);

        server.wait().await.unwrap();
    }

    #[tokio::test]
    async fn read_device_with_wrong_fixed_hint_is_schema_error() {
        let mut server = MockHttpServer::new().await.unwrap();
        server.expect("GET", DEVICE0, 200, &lime_rx(145_500_000));
        server.start();

        let client = SdrangelBuilder::new()
            .base_url(&server.base_url())
            .device_type(0, sdrsync_core::DeviceTypeHint::Fixed(DeviceType::UsrpB200))
            .build()
            .unwrap();
        let err = client.read_device(0).await.unwrap_err();
        assert!(matches!(err, Error::Schema { .. }), "got {err:?}");

        server.wait().await.unwrap();
    }

    #[tokio::test]
    async fn read_channel_ssb_mod() {
        let mut server = MockHttpServer::new().await.unwrap();
        server.expect("GET", TX_CHANNEL, 200, &ssb_mod(1000));
        server.start();

        let client = client_for(&server);
        let ch = client
            .read_channel(ChannelAddr::new(1, 0), ChannelKind::SsbMod)
            .await
            .unwrap();
        assert_eq!(ch.shift_hz, 1000);
        assert_eq!(ch.kind, ChannelKind::SsbMod);

        server.wait().await.unwrap();
    }

    #[tokio::test]
    async fn read_channel_of_other_kind_is_schema_error() {
        let mut server = MockHttpServer::new().await.unwrap();
        server.expect("GET", RX_CHANNEL, 200, &ssb_mod(1000));
        server.start();

        let client = client_for(&server);
        let err = client
            .read_channel(ChannelAddr::new(0, 0), ChannelKind::SsbDemod)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Schema { .. }), "got {err:?}");

        server.wait().await.unwrap();
    }

    #[tokio::test]
    async fn missing_device_set_is_not_found() {
        let mut server = MockHttpServer::new().await.unwrap();
        server.expect(
            "GET",
            "/sdrangel/deviceset/7/device/settings",
            404,
            r#"{"message": "There is no device set with index 7"}"#,
        );
        server.start();

        let client = client_for(&server);
        match client.read_device(7).await.unwrap_err() {
            Error::NotFound(msg) => assert!(msg.contains("no device set with index 7")),
            other => panic!("expected NotFound, got {other:?}"),
        }

        server.wait().await.unwrap();
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let mut server = MockHttpServer::new().await.unwrap();
        server.expect("GET", DEVICE0, 200, "{\"deviceHwType\": \"LimeSDR\",");
        server.start();

        let client = client_for(&server);
        assert!(matches!(
            client.read_device(0).await.unwrap_err(),
            Error::Parse(_)
        ));

        server.wait().await.unwrap();
    }

    #[tokio::test]
    async fn server_error_is_transport_error() {
        let mut server = MockHttpServer::new().await.unwrap();
        server.expect("GET", DEVICE0, 500, r#"{"message": "internal"}"#);
        server.start();

        let client = client_for(&server);
        assert!(matches!(
            client.read_device(0).await.unwrap_err(),
            Error::Transport(_)
        ));

        server.wait().await.unwrap();
    }

    #[tokio::test]
    async fn write_channel_shift_patches_resolved_field() {
        let mut server = MockHttpServer::new().await.unwrap();
        server.expect("GET", TX_CHANNEL, 200, &ssb_mod(1000));
        server.expect("PATCH", TX_CHANNEL, 200, &ssb_mod(1300));
        server.start();

        let client = client_for(&server);
        client
            .write_channel_shift(ChannelAddr::new(1, 0), ChannelKind::SsbMod, 1300)
            .await
            .unwrap();

        let requests = server.wait().await.unwrap();
        assert_eq!(requests.len(), 2);
        let patched = requests[1].json().unwrap();
        assert_eq!(patched["SSBModSettings"]["inputFrequencyOffset"], json!(1300));
        assert_eq!(patched["SSBModSettings"]["toneFrequency"], json!(1000.0));
        assert_eq!(patched["channelType"], json!("SSBMod"));
    }

    #[tokio::test]
    async fn write_same_shift_skips_patch() {
        let mut server = MockHttpServer::new().await.unwrap();
        server.expect("GET", TX_CHANNEL, 200, &ssb_mod(1300));
        server.start();

        let client = client_for(&server);
        client
            .write_channel_shift(ChannelAddr::new(1, 0), ChannelKind::SsbMod, 1300)
            .await
            .unwrap();

        let requests = server.wait().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
    }

    #[tokio::test]
    async fn write_center_freq_patches_device() {
        let mut server = MockHttpServer::new().await.unwrap();
        server.expect("GET", DEVICE1, 200, &lime_rx(144_000_000));
        server.expect("PATCH", DEVICE1, 200, &lime_rx(145_500_000));
        server.start();

        let client = client_for(&server);
        client.write_device_center_freq(1, 145_500_000).await.unwrap();

        let requests = server.wait().await.unwrap();
        let patched = requests[1].json().unwrap();
        assert_eq!(
            patched["limeSdrInputSettings"]["centerFrequency"],
            json!(145_500_000)
        );
        assert_eq!(patched["limeSdrInputSettings"]["gain"], json!(50));
    }

    #[tokio::test]
    async fn rejected_write() {
        let mut server = MockHttpServer::new().await.unwrap();
        server.expect("GET", DEVICE1, 200, &lime_rx(144_000_000));
        server.expect(
            "PATCH",
            DEVICE1,
            400,
            r#"{"message": "centerFrequency out of range"}"#,
        );
        server.start();

        let client = client_for(&server);
        match client.write_device_center_freq(1, 9_000_000_000).await.unwrap_err() {
            Error::Rejected(msg) => assert!(msg.contains("out of range")),
            other => panic!("expected Rejected, got {other:?}"),
        }

        server.wait().await.unwrap();
    }

    #[tokio::test]
    async fn stalled_server_times_out() {
        let mut server = MockHttpServer::new().await.unwrap();
        server.expect_stall("GET", DEVICE0);
        server.start();

        let client = SdrangelBuilder::new()
            .base_url(&server.base_url())
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        assert_eq!(client.read_device(0).await.unwrap_err(), Error::Timeout);

        server.wait().await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let client = SdrangelBuilder::new()
            .base_url(&format!("http://{addr}"))
            .build()
            .unwrap();
        assert!(matches!(
            client.read_device(0).await.unwrap_err(),
            Error::Transport(_)
        ));
    }

    #[tokio::test]
    async fn instance_summary_parses() {
        let mut server = MockHttpServer::new().await.unwrap();
        server.expect(
            "GET",
            "/sdrangel",
            200,
            r#"{"appname": "SDRangel", "version": "7.22.1", "qtVersion": "6.4.2",
                "architecture": "x86_64", "devicesetlist": {"devicesetcount": 2}}"#,
        );
        server.start();

        let client = client_for(&server);
        let summary = client.instance_summary().await.unwrap();
        assert_eq!(summary.appname, "SDRangel");
        assert_eq!(summary.version, "7.22.1");
        assert_eq!(summary.devicesetlist.unwrap().devicesetcount, 2);

        server.wait().await.unwrap();
    }
}

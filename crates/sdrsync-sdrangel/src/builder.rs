//! SdrangelBuilder -- fluent builder for constructing [`SdrangelClient`]
//! instances.
//!
//! Separates configuration from construction so that callers can set the
//! server address, per-call timeout, and device type hints before the HTTP
//! client is created. Building validates the base URL; nothing is sent to
//! the server until the first call.
//!
//! # Example
//!
//! ```no_run
//! use sdrsync_sdrangel::SdrangelBuilder;
//! use sdrsync_core::{DeviceType, DeviceTypeHint};
//! use std::time::Duration;
//!
//! # fn example() -> sdrsync_core::Result<()> {
//! let client = SdrangelBuilder::new()
//!     .host("192.168.1.20")
//!     .port(8091)
//!     .timeout(Duration::from_millis(500))
//!     .device_type(0, DeviceTypeHint::Fixed(DeviceType::LimeSdr))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::time::Duration;

use sdrsync_core::error::{Error, Result};
use sdrsync_core::DeviceTypeHint;

use crate::client::SdrangelClient;

/// Default SDRangel host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default SDRangel REST API port.
pub const DEFAULT_PORT: u16 = 8091;

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Fluent builder for [`SdrangelClient`].
///
/// All configuration has sensible defaults, so the simplest usage is:
///
/// ```ignore
/// let client = SdrangelBuilder::new().build()?;
/// ```
pub struct SdrangelBuilder {
    host: String,
    port: u16,
    base_url: Option<String>,
    timeout: Duration,
    device_types: HashMap<u32, DeviceTypeHint>,
}

impl SdrangelBuilder {
    /// Create a new builder pointing at `http://localhost:8091`.
    pub fn new() -> Self {
        SdrangelBuilder {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            device_types: HashMap::new(),
        }
    }

    /// Set the server hostname or IP address (default: `localhost`).
    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    /// Set the REST API port (default: 8091).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Use a full base URL (e.g. `https://radio.lan:8443`) instead of
    /// host and port.
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    /// Set the timeout for a single request/response round trip
    /// (default: 2000ms).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Declare the device family of a device set.
    ///
    /// Device sets without a declaration use [`DeviceTypeHint::Auto`].
    pub fn device_type(mut self, device_set: u32, hint: DeviceTypeHint) -> Self {
        self.device_types.insert(device_set, hint);
        self
    }

    /// Validate the configuration and construct the client.
    ///
    /// Fails with [`Error::InvalidParameter`] if the base URL does not parse
    /// or is not an `http`/`https` URL with a host.
    pub fn build(self) -> Result<SdrangelClient> {
        let raw = self
            .base_url
            .unwrap_or_else(|| format!("http://{}:{}", self.host, self.port));

        let url = reqwest::Url::parse(&raw)
            .map_err(|e| Error::InvalidParameter(format!("invalid base URL {raw:?}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidParameter(format!(
                "unsupported URL scheme {:?} in {raw:?}",
                url.scheme()
            )));
        }
        match url.host_str() {
            Some(host) if !host.is_empty() => {}
            _ => return Err(Error::InvalidParameter(format!("no host in {raw:?}"))),
        }

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::InvalidParameter(format!("failed to create HTTP client: {e}")))?;

        let base_url = url.as_str().trim_end_matches('/').to_string();
        tracing::debug!(
            base_url = %base_url,
            timeout_ms = self.timeout.as_millis() as u64,
            "SDRangel client configured"
        );

        Ok(SdrangelClient::new(http, base_url, self.device_types))
    }
}

impl Default for SdrangelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

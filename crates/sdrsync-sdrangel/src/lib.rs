//! sdrsync-sdrangel: SDRangel REST API backend for sdrsync.
//!
//! Provides [`SdrangelClient`], an [`SdrControl`](sdrsync_core::SdrControl)
//! implementation over SDRangel's HTTP/JSON API, together with the schema
//! tables ([`models`]) and pure field extraction ([`extract`]) it relies on.
//!
//! # Example
//!
//! ```no_run
//! use sdrsync_core::{ChannelAddr, ChannelKind, SdrControl};
//! use sdrsync_sdrangel::SdrangelBuilder;
//!
//! # async fn example() -> sdrsync_core::Result<()> {
//! let client = SdrangelBuilder::new().host("localhost").port(8091).build()?;
//! let rx = client
//!     .read_channel(ChannelAddr::new(0, 0), ChannelKind::SsbDemod)
//!     .await?;
//! println!("Rx shift: {} Hz", rx.shift_hz);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod client;
pub mod extract;
pub mod models;

pub use builder::SdrangelBuilder;
pub use client::{InstanceSummary, SdrangelClient};

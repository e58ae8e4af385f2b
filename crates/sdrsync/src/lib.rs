//! # sdrsync -- keep an SDRangel Tx chain locked to its Rx chain
//!
//! `sdrsync` polls an SDRangel instance over its REST API and keeps two
//! relationships true:
//!
//! - the Tx SSB modulator shift equals the Rx SSB demodulator shift plus a
//!   fixed offset, and
//! - the center frequency of a secondary device set (R1) equals that of the
//!   primary device set (R0).
//!
//! Each tick reads all four values, computes the targets, and writes only
//! what has drifted.
//!
//! ```no_run
//! use std::time::Duration;
//! use sdrsync::{driver, SdrangelBuilder, SyncEngine, SyncPlan};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> sdrsync::Result<()> {
//! let client = SdrangelBuilder::new().host("localhost").port(8091).build()?;
//! let plan = SyncPlan {
//!     offset_hz: -200,
//!     ..SyncPlan::default()
//! };
//! let engine = SyncEngine::new(client, plan);
//!
//! let cancel = CancellationToken::new();
//! let exit = driver::run(&engine, Duration::from_millis(300), 0, &cancel).await;
//! println!("{exit:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! | Crate                  | Purpose                                         |
//! |------------------------|-------------------------------------------------|
//! | `sdrsync-core`         | [`SdrControl`] trait, types, errors             |
//! | `sdrsync-sdrangel`     | SDRangel REST client and device field tables    |
//! | **`sdrsync`**          | This crate -- the sync engine and polling loop  |
//!
//! The engine is generic over [`SdrControl`], so tests drive it with the
//! in-memory `MockSdr` from `sdrsync-test-harness`.

pub mod driver;
pub mod engine;

pub use sdrsync_core::*;

pub use driver::LoopExit;
pub use engine::{Action, SyncEngine, SyncPlan, TickFailure, TickReport, TickStep};

/// SDRangel REST backend.
pub mod sdrangel {
    pub use sdrsync_sdrangel::*;
}

pub use sdrsync_sdrangel::{SdrangelBuilder, SdrangelClient};

// sdrsync -- keep an SDRangel Tx SSB modulator locked to an Rx SSB
// demodulator, and a second device set's center frequency locked to the
// first's.
//
// Usage:
//   sdrsync                                   # localhost:8091, R0=0 R1=1 Tx=1
//   sdrsync --host 192.168.1.20 --offset -200
//   sdrsync --url http://radio.lan:8091 --r0-type limesdr --r1-type usrp
//   sdrsync --r1-type other:/airspyHFSettings/centerFrequency --once -v

mod logging;

use std::future::Future;
use std::io;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use sdrsync::driver::{self, LoopExit};
use sdrsync::{
    format_freq_mhz, format_shift_hz, ChannelAddr, DeviceTypeHint, SdrControl, SdrangelBuilder,
    SyncEngine, SyncPlan,
};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Mirror the Rx SSB demod shift (plus an offset) onto the Tx SSB mod, and
/// align R1's center frequency to R0's.
#[derive(Parser, Debug)]
#[command(name = "sdrsync", version, about)]
struct Cli {
    /// SDRangel host name or IP address.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// SDRangel REST API port.
    #[arg(long, default_value_t = 8091)]
    port: u16,

    /// Full base URL (e.g. https://radio.lan:8443). Overrides --host/--port.
    #[arg(long)]
    url: Option<String>,

    /// Device set of the primary receiver R0 (holds the SSB demod).
    #[arg(long, default_value_t = 0)]
    r0: u32,

    /// Channel index of the SSB demod within R0.
    #[arg(long, default_value_t = 0)]
    r0_channel: u32,

    /// Device set whose center frequency follows R0.
    #[arg(long, default_value_t = 1)]
    r1: u32,

    /// Device set holding the SSB mod.
    #[arg(long, default_value_t = 1)]
    tx: u32,

    /// Channel index of the SSB mod within the Tx device set.
    #[arg(long, default_value_t = 0)]
    tx_channel: u32,

    /// Hertz added to the Rx shift to form the Tx shift (may be negative).
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    offset: i64,

    /// Delay between ticks in milliseconds.
    #[arg(long, default_value_t = 300)]
    delay_ms: u64,

    /// R0 device type: auto, limesdr, usrp, or other:<pointer>[,<pointer>...].
    #[arg(long, default_value = "auto")]
    r0_type: DeviceTypeHint,

    /// R1 device type: auto, limesdr, usrp, or other:<pointer>[,<pointer>...].
    #[arg(long, default_value = "auto")]
    r1_type: DeviceTypeHint,

    /// Per-request timeout in milliseconds.
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,

    /// Stop after this many consecutive failed ticks (0 = never).
    #[arg(long, default_value_t = 0)]
    max_failures: u32,

    /// Run a single tick and exit with its status.
    #[arg(long)]
    once: bool,

    /// Log every value read, not just writes and failures.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn plan(&self) -> SyncPlan {
        SyncPlan {
            rx: ChannelAddr::new(self.r0, self.r0_channel),
            tx: ChannelAddr::new(self.tx, self.tx_channel),
            r0: self.r0,
            r1: self.r1,
            offset_hz: self.offset,
        }
    }
}

fn validate_options(cli: &Cli) -> Result<()> {
    if cli.timeout_ms == 0 {
        bail!("--timeout-ms must be greater than zero");
    }
    if cli.r0 == cli.r1 {
        bail!("--r0 and --r1 name the same device set ({})", cli.r0);
    }
    if cli.r0 == cli.tx && cli.r0_channel == cli.tx_channel {
        bail!(
            "Rx and Tx name the same channel ({})",
            ChannelAddr::new(cli.r0, cli.r0_channel)
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    validate_options(&cli)?;

    let mut builder = SdrangelBuilder::new()
        .host(&cli.host)
        .port(cli.port)
        .timeout(Duration::from_millis(cli.timeout_ms))
        .device_type(cli.r0, cli.r0_type.clone())
        .device_type(cli.r1, cli.r1_type.clone());
    if let Some(url) = cli.url.as_deref() {
        builder = builder.base_url(url);
    }
    let client = builder.build().context("invalid SDRangel address")?;

    match client.instance_summary().await {
        Ok(summary) => tracing::info!(
            url = client.base_url(),
            app = %summary.appname,
            version = %summary.version,
            device_sets = summary.devicesetlist.as_ref().map(|l| l.devicesetcount).unwrap_or(0),
            "connected to SDRangel"
        ),
        Err(e) => tracing::warn!(
            url = client.base_url(),
            kind = %e.kind(),
            "SDRangel not reachable yet: {e}"
        ),
    }

    let plan = cli.plan();
    tracing::info!(
        rx = %plan.rx,
        tx = %plan.tx,
        r0 = plan.r0,
        r1 = plan.r1,
        r0_type = %cli.r0_type,
        r1_type = %cli.r1_type,
        offset = %format_shift_hz(plan.offset_hz),
        "sync plan"
    );
    let engine = SyncEngine::new(client, plan);

    if cli.once {
        let report = engine
            .tick()
            .await
            .with_context(|| format!("sync tick failed ({})", engine.control().base_url()))?;
        tracing::info!(
            tx_shift = %format_shift_hz(report.target.tx_shift_hz),
            r1_center = %format_freq_mhz(report.target.r1_center_hz),
            writes = report.writes(),
            "in sync"
        );
        return Ok(());
    }

    let delay = Duration::from_millis(cli.delay_ms);
    let exit = run_until_interrupted(&engine, delay, cli.max_failures, tokio::signal::ctrl_c()).await?;
    match exit {
        LoopExit::Cancelled => Ok(()),
        LoopExit::FailureCeiling { failures, last } => {
            bail!("giving up after {failures} consecutive failed ticks; last: {last}")
        }
    }
}

/// Run the sync loop until `interrupt` resolves or the loop gives up.
///
/// An interrupt source that cannot be installed is an error, not a
/// request to stop. After an interrupt the tick in flight completes.
async fn run_until_interrupted<C, S>(
    engine: &SyncEngine<C>,
    delay: Duration,
    max_failures: u32,
    interrupt: S,
) -> Result<LoopExit>
where
    C: SdrControl,
    S: Future<Output = io::Result<()>>,
{
    let cancel = CancellationToken::new();
    let run = driver::run(engine, delay, max_failures, &cancel);
    tokio::pin!(run);

    tokio::select! {
        exit = &mut run => Ok(exit),
        signal = interrupt => {
            signal.context("cannot listen for Ctrl-C")?;
            tracing::info!("interrupted, stopping");
            cancel.cancel();
            Ok(run.await)
        }
    }
}

//! SyncEngine -- one read-compute-write pass over the four synced values.
//!
//! A tick reads the Rx demodulator shift, the Tx modulator shift, and the
//! R0 and R1 center frequencies, computes a [`SyncTarget`], and writes the
//! Tx shift and the R1 center frequency only where they differ from the
//! target. Every read happens before any write, so a read failure never
//! leaves a half-applied tick behind.

use std::fmt;

use sdrsync_core::error::Error;
use sdrsync_core::{
    format_freq_mhz, format_shift_hz, ChannelAddr, ChannelKind, SdrControl, SyncTarget,
};

/// Which device sets and channels to keep in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPlan {
    /// SSB demodulator whose shift is mirrored.
    pub rx: ChannelAddr,
    /// SSB modulator that follows the demodulator.
    pub tx: ChannelAddr,
    /// Device set whose center frequency is authoritative.
    pub r0: u32,
    /// Device set that follows R0's center frequency.
    pub r1: u32,
    /// Added to the Rx shift to form the Tx shift, in hertz.
    pub offset_hz: i64,
}

impl Default for SyncPlan {
    fn default() -> Self {
        SyncPlan {
            rx: ChannelAddr::new(0, 0),
            tx: ChannelAddr::new(1, 0),
            r0: 0,
            r1: 1,
            offset_hz: 0,
        }
    }
}

/// The call within a tick that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickStep {
    ReadRxShift,
    ReadTxShift,
    ReadR0Center,
    ReadR1Center,
    ComputeTarget,
    WriteTxShift,
    WriteR1Center,
}

impl fmt::Display for TickStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TickStep::ReadRxShift => "read Rx shift",
            TickStep::ReadTxShift => "read Tx shift",
            TickStep::ReadR0Center => "read R0 center frequency",
            TickStep::ReadR1Center => "read R1 center frequency",
            TickStep::ComputeTarget => "compute target",
            TickStep::WriteTxShift => "write Tx shift",
            TickStep::WriteR1Center => "write R1 center frequency",
        };
        f.write_str(s)
    }
}

/// A tick that stopped at `step` because of `error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{step} failed: {error}")]
pub struct TickFailure {
    pub step: TickStep,
    #[source]
    pub error: Error,
}

impl TickFailure {
    fn at(step: TickStep) -> impl FnOnce(Error) -> TickFailure {
        move |error| TickFailure { step, error }
    }
}

/// What a tick did about one synced value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The value was out of date and has been written.
    Written,
    /// The value already matched; nothing was sent.
    Skipped,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Written => f.write_str("written"),
            Action::Skipped => f.write_str("skipped"),
        }
    }
}

/// Values observed and decisions taken by one successful tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub rx_shift_hz: i64,
    pub tx_shift_hz: i64,
    pub r0_center_hz: u64,
    pub r1_center_hz: u64,
    pub target: SyncTarget,
    pub tx_action: Action,
    pub r1_action: Action,
}

impl TickReport {
    /// Number of writes the tick issued.
    pub fn writes(&self) -> usize {
        [self.tx_action, self.r1_action]
            .iter()
            .filter(|a| **a == Action::Written)
            .count()
    }
}

/// Runs sync ticks against any [`SdrControl`] implementation.
pub struct SyncEngine<C> {
    control: C,
    plan: SyncPlan,
}

impl<C: SdrControl> SyncEngine<C> {
    pub fn new(control: C, plan: SyncPlan) -> Self {
        SyncEngine { control, plan }
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn plan(&self) -> &SyncPlan {
        &self.plan
    }

    /// Run one read-compute-write pass.
    ///
    /// Reads happen in a fixed order (Rx shift, Tx shift, R0, R1) and all
    /// complete before the first write. If the Tx write fails the R1 write
    /// is not attempted.
    pub async fn tick(&self) -> std::result::Result<TickReport, TickFailure> {
        let plan = &self.plan;

        let rx = self
            .control
            .read_channel(plan.rx, ChannelKind::SsbDemod)
            .await
            .map_err(TickFailure::at(TickStep::ReadRxShift))?;
        let tx = self
            .control
            .read_channel(plan.tx, ChannelKind::SsbMod)
            .await
            .map_err(TickFailure::at(TickStep::ReadTxShift))?;
        let r0 = self
            .control
            .read_device(plan.r0)
            .await
            .map_err(TickFailure::at(TickStep::ReadR0Center))?;
        let r1 = self
            .control
            .read_device(plan.r1)
            .await
            .map_err(TickFailure::at(TickStep::ReadR1Center))?;

        tracing::debug!(
            r0_type = %r0.device_type,
            r0_direction = ?r0.direction,
            r1_type = %r1.device_type,
            r1_direction = ?r1.direction,
            "tick read"
        );

        let target = SyncTarget::compute(rx.shift_hz, plan.offset_hz, r0.center_freq_hz)
            .map_err(TickFailure::at(TickStep::ComputeTarget))?;

        let tx_action = if tx.shift_hz == target.tx_shift_hz {
            Action::Skipped
        } else {
            self.control
                .write_channel_shift(plan.tx, ChannelKind::SsbMod, target.tx_shift_hz)
                .await
                .map_err(TickFailure::at(TickStep::WriteTxShift))?;
            tracing::info!(
                tx = %plan.tx,
                from = %format_shift_hz(tx.shift_hz),
                to = %format_shift_hz(target.tx_shift_hz),
                "Tx shift updated"
            );
            Action::Written
        };

        let r1_action = if r1.center_freq_hz == target.r1_center_hz {
            Action::Skipped
        } else {
            self.control
                .write_device_center_freq(plan.r1, target.r1_center_hz)
                .await
                .map_err(TickFailure::at(TickStep::WriteR1Center))?;
            tracing::info!(
                r1 = plan.r1,
                from = %format_freq_mhz(r1.center_freq_hz),
                to = %format_freq_mhz(target.r1_center_hz),
                "R1 center frequency updated"
            );
            Action::Written
        };

        tracing::info!(
            rx_shift = %format_shift_hz(rx.shift_hz),
            tx_shift = %format_shift_hz(tx.shift_hz),
            r0_center = %format_freq_mhz(r0.center_freq_hz),
            r1_center = %format_freq_mhz(r1.center_freq_hz),
            tx = %tx_action,
            r1 = %r1_action,
            "tick"
        );

        Ok(TickReport {
            rx_shift_hz: rx.shift_hz,
            tx_shift_hz: tx.shift_hz,
            r0_center_hz: r0.center_freq_hz,
            r1_center_hz: r1.center_freq_hz,
            target,
            tx_action,
            r1_action,
        })
    }
}

//! Formatting helpers for log lines.

/// Format a frequency in hertz as a human-readable MHz string.
///
/// Returns a string like `"145.500000 MHz"` with six decimal places.
///
/// # Example
///
/// ```
/// use sdrsync_core::format_freq_mhz;
///
/// assert_eq!(format_freq_mhz(145_500_000), "145.500000 MHz");
/// assert_eq!(format_freq_mhz(432_100_000), "432.100000 MHz");
/// ```
pub fn format_freq_mhz(freq_hz: u64) -> String {
    let mhz = freq_hz as f64 / 1_000_000.0;
    format!("{mhz:.6} MHz")
}

/// Format a signed frequency shift with an explicit sign.
///
/// ```
/// use sdrsync_core::format_shift_hz;
///
/// assert_eq!(format_shift_hz(1300), "+1300 Hz");
/// assert_eq!(format_shift_hz(-200), "-200 Hz");
/// ```
pub fn format_shift_hz(shift_hz: i64) -> String {
    format!("{shift_hz:+} Hz")
}

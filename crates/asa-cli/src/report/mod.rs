//! Report rendering over a finalized metrics result.
//!
//! The analysis core hands one immutable `MetricsResult` to this boundary;
//! everything about document structure and copy lives here.

pub mod html;
pub mod json;
pub mod markdown;
mod strings;

pub use strings::ReportStrings;

/// Format a duration in seconds for display.
pub(crate) fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{seconds:.1}s")
    } else if seconds < 3600.0 {
        format!("{:.1}m", seconds / 60.0)
    } else {
        format!("{:.1}h", seconds / 3600.0)
    }
}

/// Share of `part` in `whole` as a percentage.
pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    #[expect(clippy::cast_precision_loss, reason = "report-scale counts")]
    let ratio = part as f64 / whole as f64;
    100.0 * ratio
}

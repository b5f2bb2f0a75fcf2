//! Common types and tuning constants for ensemble forecasting

/// Forecast horizon used for the hourly ensemble series (7 days).
pub const HOURLY_HORIZON: usize = 168;

/// Lead times (in hours) at which forecast snapshots are stored for
/// later verification.
///
/// 24h/48h are the next-day forecasts users rely on most, 72h is the
/// industry "extended" boundary, 120h and 168h track medium- and
/// long-range degradation. Each forecast recording writes one snapshot
/// row per lead time, so adding entries grows storage linearly.
pub const LEAD_HOURS: [usize; 5] = [24, 48, 72, 120, 168];

/// Scalar forecast metrics that participate in confidence estimation
/// and accuracy scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Temperature,
    Precipitation,
    WindSpeed,
}

impl MetricKind {
    /// Typical inter-model spread for this metric, derived from
    /// historical model disagreement. Confidence is 100 at zero spread
    /// and ~37 at one typical spread.
    pub fn typical_spread(self) -> f64 {
        match self {
            MetricKind::Temperature => 3.0,  // °C
            MetricKind::Precipitation => 5.0, // mm
            MetricKind::WindSpeed => 5.0,    // km/h
        }
    }

    /// Acceptable forecast error for accuracy scoring. Scores degrade
    /// progressively beyond this threshold.
    ///
    /// These values affect scores derived from stored snapshots, so
    /// changing them breaks comparability with historical reports.
    pub fn tolerance(self) -> f64 {
        match self {
            MetricKind::Temperature => 2.0,  // °C - users notice >2°C errors
            MetricKind::Precipitation => 1.0, // mm - light rain vs dry
            MetricKind::WindSpeed => 5.0,    // km/h - gust variability
        }
    }
}

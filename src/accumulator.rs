//! Consumption accumulator
//!
//! Integrates the flow-rate series (volume per hour) into a cumulative
//! volume using the rectangular rule: the previous flow rate is held for the
//! wall-clock time elapsed until the current sample.

use chrono::{DateTime, Utc};

/// Number of decimal digits reported for the cumulative total
pub const TOTAL_DECIMALS: i32 = 4;

/// Cumulative consumption derived from flow samples
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumptionAccumulator {
    total: f64,
    last_flow: Option<f64>,
    last_update: Option<DateTime<Utc>>,
}

impl ConsumptionAccumulator {
    /// Create an accumulator with a zero total
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a flow sample taken now
    pub fn record(&mut self, flow_rate: f64) -> f64 {
        self.record_at(flow_rate, Utc::now())
    }

    /// Record a flow sample taken at `at` and return the new total.
    ///
    /// The first sample only initializes the state. Negative rates and
    /// non-increasing timestamps contribute nothing, so the total never
    /// decreases.
    pub fn record_at(&mut self, flow_rate: f64, at: DateTime<Utc>) -> f64 {
        if let (Some(last_flow), Some(last_update)) = (self.last_flow, self.last_update) {
            let elapsed_secs =
                at.signed_duration_since(last_update).num_milliseconds() as f64 / 1000.0;
            if elapsed_secs > 0.0 && last_flow.is_finite() && last_flow > 0.0 {
                self.total += last_flow * elapsed_secs / 3600.0;
            }
        }

        self.last_flow = Some(flow_rate);
        self.last_update = Some(at);
        self.total
    }

    /// Unrounded cumulative total
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Cumulative total rounded to [`TOTAL_DECIMALS`] digits
    pub fn rounded_total(&self) -> f64 {
        let factor = 10f64.powi(TOTAL_DECIMALS);
        (self.total * factor).round() / factor
    }

    /// Cumulative total formatted for the property map
    pub fn formatted_total(&self) -> String {
        format!("{:.*}", TOTAL_DECIMALS as usize, self.rounded_total())
    }

    /// Flow rate of the previous sample
    pub fn last_flow_rate(&self) -> Option<f64> {
        self.last_flow
    }

    /// Timestamp of the previous sample
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }
}

//! MUX protocol constants for the softliQ device family
//!
//! The query dialect is `id=<client>[&code=<code>][&edit=<prop>><value>]&show=<p1>|...~`
//! posted as a form body to `/mux_http`. Property identifiers follow the
//! device's `D_<group>_<index>[_<sub>]` naming.

use std::time::Duration;

// ============================================================================
// Session / Transport Constants
// ============================================================================

/// Client id namespacing this client's multiplexed session on the device
pub const CLIENT_ID: u32 = 2444;

/// Path of the MUX endpoint on the device's embedded web server
pub const MUX_PATH: &str = "/mux_http";

/// Content type of every MUX request body
pub const MUX_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Total attempts per query (1 initial + 4 retries)
pub const MAX_ATTEMPTS: u32 = 5;

/// Timeout of a single HTTP attempt
pub const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause between attempts, only long enough to yield the scheduler
pub const RETRY_DELAY: Duration = Duration::from_millis(1);

/// Default polling interval of the consuming layer
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Terminator closing every query string
pub const QUERY_TERMINATOR: char = '~';

/// Separator between `show` properties
pub const SHOW_SEPARATOR: char = '|';

/// Separator between edited property and new value
pub const EDIT_SEPARATOR: char = '>';

/// Response element carrying metadata rather than a property
pub const CODE_ELEMENT: &str = "code";

// ============================================================================
// Subsystem Codes
// ============================================================================

/// Device information page (device type)
pub const CODE_DEVICE_INFO: &str = "290";

/// Meter/statistics page
pub const CODE_METER_VALUES: &str = "245";

/// Clears the device's error memory
pub const CODE_RESET_ERROR_MEMORY: &str = "189";

// ============================================================================
// Property Identifiers
// ============================================================================

/// Current flow (m³/h), input of the consumption accumulator
pub const PROP_CURRENT_FLOW: &str = "D_A_1_1";

/// Remaining capacity (m³)
pub const PROP_REMAINING_CAPACITY: &str = "D_A_1_2";

/// Remaining capacity (%)
pub const PROP_CAPACITY_PERCENT: &str = "D_A_1_3";

/// Selectable regeneration mode
pub const PROP_MODE: &str = "D_C_5_1";

/// Soft water flow (m³/h)
pub const PROP_SOFT_WATER_FLOW: &str = "D_A_1_7";

/// Remaining time of the running regeneration (min)
pub const PROP_REGENERATION_REMAINING: &str = "D_A_2_1";

/// Days until maintenance
pub const PROP_MAINTENANCE_DAYS: &str = "D_A_2_2";

/// Salt range (days)
pub const PROP_SALT_RANGE: &str = "D_A_2_3";

/// Current regeneration step
pub const PROP_REGENERATION_STEP: &str = "D_A_3_1";

/// Progress of the last regeneration (%)
pub const PROP_LAST_REGENERATION: &str = "D_A_3_2";

/// Water consumption of yesterday (l)
pub const PROP_YESTERDAY_CONSUMPTION: &str = "D_Y_1";

/// Salt consumption per year (kg)
pub const PROP_SALT_PER_YEAR: &str = "D_Y_3";

/// Current step of the device program
pub const PROP_CURRENT_STEP: &str = "D_Y_5";

/// Software version string
pub const PROP_SOFTWARE_VERSION: &str = "D_Y_6";

/// Raw water hardness
pub const PROP_RAW_WATER_HARDNESS: &str = "D_D_1";

/// Coded device type
pub const PROP_DEVICE_TYPE: &str = "D_F_4";

/// Peak flow (m³/h)
pub const PROP_PEAK_FLOW: &str = "D_K_3";

/// Water volume meter (m³)
pub const PROP_VOLUME_METER: &str = "D_K_2";

/// Chlorine current
pub const PROP_CHLORINE_CURRENT: &str = "D_K_5";

/// Consumption/capacity rate
pub const PROP_CAPACITY_RATE: &str = "D_K_8";

/// Average consumption of the last three days
pub const PROP_THREE_DAY_AVERAGE: &str = "D_K_9";

/// Last error code, composite `<code>_<hours>h`
pub const PROP_LAST_ERROR: &str = "D_K_10_1";

/// Manual regeneration trigger
pub const PROP_MANUAL_REGENERATION: &str = "D_B_1";

// ============================================================================
// Fixed Property Lists
// ============================================================================

/// Properties read by `get_current_values`
pub const CURRENT_VALUE_PROPERTIES: [&str; 15] = [
    PROP_CURRENT_FLOW,
    PROP_REMAINING_CAPACITY,
    PROP_CAPACITY_PERCENT,
    PROP_MODE,
    PROP_SOFT_WATER_FLOW,
    PROP_REGENERATION_REMAINING,
    PROP_MAINTENANCE_DAYS,
    PROP_SALT_RANGE,
    PROP_REGENERATION_STEP,
    PROP_LAST_REGENERATION,
    PROP_YESTERDAY_CONSUMPTION,
    PROP_SALT_PER_YEAR,
    PROP_CURRENT_STEP,
    PROP_SOFTWARE_VERSION,
    PROP_RAW_WATER_HARDNESS,
];

/// Properties read by `get_meter_values` (with [`CODE_METER_VALUES`])
pub const METER_VALUE_PROPERTIES: [&str; 6] = [
    PROP_PEAK_FLOW,
    PROP_VOLUME_METER,
    PROP_CHLORINE_CURRENT,
    PROP_CAPACITY_RATE,
    PROP_THREE_DAY_AVERAGE,
    PROP_LAST_ERROR,
];

// ============================================================================
// Derived Keys
// ============================================================================

/// Integrated consumption derived from the flow series
pub const TOTAL_CONSUMPTION: &str = "total_consumption";

/// Suffix of the elapsed-hours part split off the last error code
pub const HOURS_SUFFIX: &str = "_Hours";

/// Value the device reports for "no reading"
pub const NO_VALUE: &str = "-";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_bound() {
        assert_eq!(MAX_ATTEMPTS, 5);
        assert_eq!(ATTEMPT_TIMEOUT, Duration::from_secs(5));
        assert!(RETRY_DELAY < Duration::from_millis(10));
    }

    #[test]
    fn test_property_lists_have_no_duplicates() {
        let mut current = CURRENT_VALUE_PROPERTIES.to_vec();
        current.sort_unstable();
        current.dedup();
        assert_eq!(current.len(), CURRENT_VALUE_PROPERTIES.len());

        let mut meter = METER_VALUE_PROPERTIES.to_vec();
        meter.sort_unstable();
        meter.dedup();
        assert_eq!(meter.len(), METER_VALUE_PROPERTIES.len());
    }

    #[test]
    fn test_flow_is_read_with_current_values() {
        assert_eq!(CURRENT_VALUE_PROPERTIES[0], PROP_CURRENT_FLOW);
        assert!(!METER_VALUE_PROPERTIES.contains(&PROP_CURRENT_FLOW));
        assert_eq!(METER_VALUE_PROPERTIES[5], PROP_LAST_ERROR);
    }
}

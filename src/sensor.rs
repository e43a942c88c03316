//! Sensor descriptions for the softliQ property set
//!
//! Maps property identifiers to a human-readable name, a unit and the kind
//! of reading, and renders a [`PropertyMap`] into typed [`Reading`]s.

use std::fmt;

use crate::codec::PropertyMap;
use crate::value::MuxValue;

use self::ReadingKind::{Diagnostic, Measurement, TotalIncreasing};

/// Unit of a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// m³
    CubicMeters,
    /// m³/h
    CubicMetersPerHour,
    /// l
    Liters,
    /// kg
    Kilograms,
    /// %
    Percent,
    /// min
    Minutes,
    /// h
    Hours,
    /// d
    Days,
}

impl Unit {
    /// Unit symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::CubicMeters => "m³",
            Unit::CubicMetersPerHour => "m³/h",
            Unit::Liters => "l",
            Unit::Kilograms => "kg",
            Unit::Percent => "%",
            Unit::Minutes => "min",
            Unit::Hours => "h",
            Unit::Days => "d",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// How a consumer should treat a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingKind {
    /// Instantaneous measurement
    Measurement,
    /// Monotonically increasing total
    TotalIncreasing,
    /// Diagnostic information (text, codes)
    Diagnostic,
}

/// Static description of one property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorDescription {
    /// Property identifier or derived key
    pub key: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Unit, if the value is a quantity
    pub unit: Option<Unit>,
    /// Reading kind
    pub kind: ReadingKind,
}

const fn sensor(
    key: &'static str,
    name: &'static str,
    unit: Option<Unit>,
    kind: ReadingKind,
) -> SensorDescription {
    SensorDescription {
        key,
        name,
        unit,
        kind,
    }
}

/// Every property the client reads, plus the derived keys
pub const SENSORS: &[SensorDescription] = &[
    sensor("D_A_1_1", "Current flow", Some(Unit::CubicMetersPerHour), Measurement),
    sensor("D_A_1_2", "Remaining capacity", Some(Unit::CubicMeters), Measurement),
    sensor("D_A_1_3", "Remaining capacity", Some(Unit::Percent), Measurement),
    sensor("D_C_5_1", "Regeneration mode", None, Diagnostic),
    sensor("D_A_1_7", "Soft water flow", Some(Unit::CubicMetersPerHour), Measurement),
    sensor("D_A_2_1", "Regeneration time remaining", Some(Unit::Minutes), Measurement),
    sensor("D_A_2_2", "Maintenance in", Some(Unit::Days), Measurement),
    sensor("D_A_2_3", "Salt range", Some(Unit::Days), Measurement),
    sensor("D_A_3_1", "Regeneration step", None, Measurement),
    sensor("D_A_3_2", "Last regeneration", Some(Unit::Percent), Measurement),
    sensor("D_Y_1", "Consumption yesterday", Some(Unit::Liters), Measurement),
    sensor("D_Y_3", "Salt per year", Some(Unit::Kilograms), Measurement),
    sensor("D_Y_5", "Current step", None, Diagnostic),
    sensor("D_Y_6", "Software version", None, Diagnostic),
    sensor("D_D_1", "Raw water hardness", None, Measurement),
    sensor("D_K_3", "Peak flow", Some(Unit::CubicMetersPerHour), Measurement),
    sensor("D_K_2", "Volume meter", Some(Unit::CubicMeters), Measurement),
    sensor("D_K_5", "Chlorine current", None, Measurement),
    sensor("D_K_8", "Consumption/capacity rate", None, Measurement),
    sensor("D_K_9", "Three-day average", None, Measurement),
    sensor("D_K_10_1", "Last error code", None, Diagnostic),
    sensor("D_K_10_1_Hours", "Last error age", Some(Unit::Hours), Measurement),
    sensor("total_consumption", "Total consumption", Some(Unit::CubicMeters), TotalIncreasing),
];

/// Look up the description of a key
pub fn describe(key: &str) -> Option<&'static SensorDescription> {
    SENSORS.iter().find(|s| s.key == key)
}

/// A described, typed value
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Description of the property
    pub description: &'static SensorDescription,
    /// Interpreted value
    pub value: MuxValue,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.description.name, self.value)?;
        if let (Some(unit), true) = (self.description.unit, self.value.is_available()) {
            write!(f, " {}", unit)?;
        }
        Ok(())
    }
}

/// Render every described key, in table order.
///
/// Keys missing from `values` render as [`MuxValue::Unavailable`].
pub fn render_readings(values: &PropertyMap) -> Vec<Reading> {
    SENSORS
        .iter()
        .map(|description| Reading {
            description,
            value: values
                .get(description.key)
                .map(|raw| MuxValue::parse(raw))
                .unwrap_or(MuxValue::Unavailable),
        })
        .collect()
}

//! # MUX Value Types
//!
//! Typed interpretation of the raw string values the device reports.

use std::fmt;
use std::str::FromStr;

use crate::constants::NO_VALUE;
use crate::error::MuxError;

/// A device reading after interpretation.
///
/// The device reports every property as text. Numeric text becomes
/// [`MuxValue::Number`], the placeholder `-` becomes
/// [`MuxValue::Unavailable`], anything else stays [`MuxValue::Text`].
///
/// # Example
///
/// ```rust
/// use softliq_mux::MuxValue;
///
/// assert_eq!(MuxValue::parse("0.82"), MuxValue::Number(0.82));
/// assert_eq!(MuxValue::parse("-"), MuxValue::Unavailable);
/// assert_eq!(MuxValue::parse("V01.01.05"), MuxValue::Text("V01.01.05".into()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum MuxValue {
    /// Numeric reading
    Number(f64),
    /// Free-form text (versions, codes)
    Text(String),
    /// The device has no value for this property
    Unavailable,
}

impl MuxValue {
    /// Interpret a raw property value
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == NO_VALUE {
            return MuxValue::Unavailable;
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => MuxValue::Number(v),
            _ => MuxValue::Text(raw.to_string()),
        }
    }

    /// Numeric value, if this is a number
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MuxValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Text value, if this is text
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MuxValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the device reported a value
    #[inline]
    pub fn is_available(&self) -> bool {
        !matches!(self, MuxValue::Unavailable)
    }

    /// Returns the type name as a string for logging/debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            MuxValue::Number(_) => "number",
            MuxValue::Text(_) => "text",
            MuxValue::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for MuxValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MuxValue::Number(v) => write!(f, "{}", v),
            MuxValue::Text(s) => f.write_str(s),
            MuxValue::Unavailable => f.write_str(NO_VALUE),
        }
    }
}

impl From<f64> for MuxValue {
    fn from(v: f64) -> Self {
        MuxValue::Number(v)
    }
}

impl From<&str> for MuxValue {
    fn from(raw: &str) -> Self {
        MuxValue::parse(raw)
    }
}

// ============================================================================
// Regeneration mode
// ============================================================================

/// Options of the selectable mode property `D_C_5_1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegenerationMode {
    /// Option `"0"`
    Mode0,
    /// Option `"1"`
    Mode1,
}

impl RegenerationMode {
    /// All options in device order
    pub const ALL: [RegenerationMode; 2] = [RegenerationMode::Mode0, RegenerationMode::Mode1];

    /// Wire value of the option
    pub fn as_str(&self) -> &'static str {
        match self {
            RegenerationMode::Mode0 => "0",
            RegenerationMode::Mode1 => "1",
        }
    }
}

impl FromStr for RegenerationMode {
    type Err = MuxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(RegenerationMode::Mode0),
            "1" => Ok(RegenerationMode::Mode1),
            other => Err(MuxError::invalid_data(format!(
                "unknown regeneration mode '{}' (expected 0 or 1)",
                other
            ))),
        }
    }
}

impl fmt::Display for RegenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(MuxValue::parse("1.5"), MuxValue::Number(1.5));
        assert_eq!(MuxValue::parse(" 42 "), MuxValue::Number(42.0));
        assert_eq!(MuxValue::parse("-3"), MuxValue::Number(-3.0));
        assert_eq!(MuxValue::parse("-"), MuxValue::Unavailable);
        assert_eq!(MuxValue::parse("7_12h"), MuxValue::Text("7_12h".to_string()));
        assert_eq!(MuxValue::parse("NaN"), MuxValue::Text("NaN".to_string()));
        assert_eq!(MuxValue::parse(""), MuxValue::Text(String::new()));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(MuxValue::Number(2.5).as_f64(), Some(2.5));
        assert_eq!(MuxValue::Text("x".into()).as_f64(), None);
        assert_eq!(MuxValue::Text("x".into()).as_text(), Some("x"));
        assert!(!MuxValue::Unavailable.is_available());
        assert!(MuxValue::Number(0.0).is_available());
    }

    #[test]
    fn test_display() {
        assert_eq!(MuxValue::Number(1.25).to_string(), "1.25");
        assert_eq!(MuxValue::Text("V1".into()).to_string(), "V1");
        assert_eq!(MuxValue::Unavailable.to_string(), "-");
    }

    #[test]
    fn test_type_name() {
        assert_eq!(MuxValue::Number(0.0).type_name(), "number");
        assert_eq!(MuxValue::from("abc").type_name(), "text");
        assert_eq!(MuxValue::from("-").type_name(), "unavailable");
    }

    #[test]
    fn test_regeneration_mode() {
        assert_eq!("0".parse::<RegenerationMode>().unwrap(), RegenerationMode::Mode0);
        assert_eq!("1".parse::<RegenerationMode>().unwrap(), RegenerationMode::Mode1);
        assert!("2".parse::<RegenerationMode>().is_err());
        assert_eq!(RegenerationMode::Mode1.to_string(), "1");
        assert_eq!(RegenerationMode::ALL.len(), 2);
    }
}

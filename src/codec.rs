//! # MUX Response Codec
//!
//! Decoding of the device's XML payload into a flat property map, plus the
//! post-processing steps applied to specific properties.
//!
//! ## Response Shape
//!
//! ```text
//! <data>
//!   <code>245</code>        metadata, never part of the map
//!   <D_K_3>1.2</D_K_3>      property -> "1.2"
//!   <D_K_10_1>7_12h</D_K_10_1>
//! </data>
//! ```
//!
//! Decoding is pure. Feeding the flow value into the consumption
//! accumulator is a separate step done by the client.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::constants::{CODE_ELEMENT, HOURS_SUFFIX, PROP_LAST_ERROR};
use crate::error::{MuxError, MuxResult};

/// Property name to raw string value
pub type PropertyMap = HashMap<String, String>;

/// Decode an XML response into a property map.
///
/// Every direct child element of the root except `<code>` becomes an entry
/// with its trimmed text; an element without text maps to `""`.
///
/// ```rust
/// use softliq_mux::codec::decode_response;
///
/// let map = decode_response("<data><code>245</code><D_K_3> 1.5 </D_K_3></data>").unwrap();
/// assert_eq!(map.get("D_K_3").map(String::as_str), Some("1.5"));
/// assert!(!map.contains_key("code"));
/// ```
pub fn decode_response(xml: &str) -> MuxResult<PropertyMap> {
    let document =
        roxmltree::Document::parse(xml).map_err(|e| MuxError::malformed(e.to_string()))?;

    let mut properties = PropertyMap::new();
    for element in document.root_element().children().filter(|n| n.is_element()) {
        let tag = element.tag_name().name();
        if tag == CODE_ELEMENT {
            continue;
        }
        let text = element.text().unwrap_or_default().trim();
        properties.insert(tag.to_string(), text.to_string());
    }

    debug!("Decoded MUX response: {} properties", properties.len());
    Ok(properties)
}

/// Split the composite last-error-code property in place.
///
/// `"7_12h"` becomes `D_K_10_1 = "7"` and `D_K_10_1_Hours = "12"`. A value
/// without `_` is left untouched and no hours key is added.
pub fn split_last_error_code(properties: &mut PropertyMap) {
    let Some(raw) = properties.get(PROP_LAST_ERROR) else {
        return;
    };
    if !raw.contains('_') {
        return;
    }

    let mut parts = raw.split('_');
    let code = parts.next().unwrap_or_default().to_string();
    let hours = parts.next().unwrap_or_default().replace('h', "");

    properties.insert(PROP_LAST_ERROR.to_string(), code);
    properties.insert(format!("{}{}", PROP_LAST_ERROR, HOURS_SUFFIX), hours);
}

/// Softener model resolved from the coded device type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceModel {
    /// Device type `1`
    Sc18,
    /// Device type `2`
    Sc23,
    /// Any other reported device type
    Unknown,
}

impl DeviceModel {
    /// Resolve a raw device type value
    pub fn from_code(code: &str) -> Self {
        match code {
            "1" => Self::Sc18,
            "2" => Self::Sc23,
            _ => Self::Unknown,
        }
    }

    /// Display name of the model
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sc18 => "softliQ:SC18",
            Self::Sc23 => "softliQ:SC23",
            Self::Unknown => "Unknown Device",
        }
    }
}

impl fmt::Display for DeviceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve the model from a device-type probe response; `None` when absent
pub fn resolve_model(properties: &PropertyMap, type_property: &str) -> Option<DeviceModel> {
    properties
        .get(type_property)
        .map(|code| DeviceModel::from_code(code))
}

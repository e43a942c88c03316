//! MUX query model and encoder
//!
//! A query names the properties to show, optionally a subsystem code and
//! optionally one property to edit. Encoding is deterministic: segments
//! always appear in the order `id`, `code`, `edit`, `show`, followed by the
//! terminator.

use std::fmt::Write as _;

use crate::constants::{
    CLIENT_ID, CODE_DEVICE_INFO, CODE_METER_VALUES, CODE_RESET_ERROR_MEMORY,
    CURRENT_VALUE_PROPERTIES, EDIT_SEPARATOR, METER_VALUE_PROPERTIES, PROP_DEVICE_TYPE,
    PROP_MANUAL_REGENERATION, PROP_SOFTWARE_VERSION, QUERY_TERMINATOR, SHOW_SEPARATOR,
};

/// A single MUX request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MuxQuery {
    show: Vec<String>,
    code: Option<String>,
    edit: Option<(String, String)>,
}

impl MuxQuery {
    /// Create an empty query (no properties, no code, no edit)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a query showing the given properties
    pub fn show<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            show: properties.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Select a device subsystem/page
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Edit one property to a new value
    pub fn with_edit(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.edit = Some((property.into(), value.into()));
        self
    }

    /// Properties requested by this query, in request order
    pub fn properties(&self) -> &[String] {
        &self.show
    }

    /// Subsystem code, if any
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Edited property and value, if any
    pub fn edit(&self) -> Option<(&str, &str)> {
        self.edit.as_ref().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    /// Whether this query mutates device state
    pub fn is_write(&self) -> bool {
        self.edit.is_some()
    }

    /// Encode with the library's fixed client id
    pub fn encode(&self) -> String {
        self.encode_with_id(CLIENT_ID)
    }

    /// Encode with an explicit client id
    pub fn encode_with_id(&self, client_id: u32) -> String {
        let show_len: usize = self.show.iter().map(|p| p.len() + 1).sum();
        let mut out = String::with_capacity(32 + show_len);

        // Writing into a String cannot fail
        let _ = write!(out, "id={}", client_id);
        if let Some(code) = &self.code {
            let _ = write!(out, "&code={}", code);
        }
        if let Some((property, value)) = &self.edit {
            let _ = write!(out, "&edit={}{}{}", property, EDIT_SEPARATOR, value);
        }
        out.push_str("&show=");
        for (i, property) in self.show.iter().enumerate() {
            if i > 0 {
                out.push(SHOW_SEPARATOR);
            }
            out.push_str(property);
        }
        out.push(QUERY_TERMINATOR);
        out
    }

    // ========================================================================
    // Fixed queries of the softliQ operation surface
    // ========================================================================

    /// Software version probe
    pub fn software_version() -> Self {
        Self::show([PROP_SOFTWARE_VERSION])
    }

    /// Device type probe on the device-info page
    pub fn device_type() -> Self {
        Self::show([PROP_DEVICE_TYPE]).with_code(CODE_DEVICE_INFO)
    }

    /// Instantaneous readings
    pub fn current_values() -> Self {
        Self::show(CURRENT_VALUE_PROPERTIES)
    }

    /// Lifetime/meter counters on the meter page
    pub fn meter_values() -> Self {
        Self::show(METER_VALUE_PROPERTIES).with_code(CODE_METER_VALUES)
    }

    /// Parameter write with an empty show list
    pub fn set_parameter(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new().with_edit(property, value)
    }

    /// Manual regeneration trigger
    pub fn manual_regeneration() -> Self {
        Self::show([PROP_MANUAL_REGENERATION]).with_edit(PROP_MANUAL_REGENERATION, "1")
    }

    /// Error memory reset
    pub fn reset_error_memory() -> Self {
        Self::new().with_code(CODE_RESET_ERROR_MEMORY)
    }
}

/// Encode a query string from its parts.
///
/// An edit segment is emitted only when `edit_property` is given; a missing
/// `edit_value` then encodes as an empty value.
///
/// ```rust
/// use softliq_mux::query::encode_query;
///
/// let query = encode_query(&["D_A_1_1", "D_Y_6"], Some("245"), None, None);
/// assert_eq!(query, "id=2444&code=245&show=D_A_1_1|D_Y_6~");
/// ```
pub fn encode_query<S: AsRef<str>>(
    properties: &[S],
    code: Option<&str>,
    edit_property: Option<&str>,
    edit_value: Option<&str>,
) -> String {
    let mut query = MuxQuery::show(properties.iter().map(|p| p.as_ref().to_string()));
    if let Some(code) = code {
        query = query.with_code(code);
    }
    if let Some(property) = edit_property {
        query = query.with_edit(property, edit_value.unwrap_or_default());
    }
    query.encode()
}

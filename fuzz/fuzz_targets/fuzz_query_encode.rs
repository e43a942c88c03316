#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use softliq_mux::encode_query;

#[derive(Debug, Arbitrary)]
struct Input {
    properties: Vec<String>,
    code: Option<String>,
    edit: Option<(String, Option<String>)>,
}

fuzz_target!(|input: Input| {
    let (edit_property, edit_value) = match &input.edit {
        Some((property, value)) => (Some(property.as_str()), value.as_deref()),
        None => (None, None),
    };
    let query = encode_query(
        &input.properties,
        input.code.as_deref(),
        edit_property,
        edit_value,
    );
    assert!(query.starts_with("id=2444&"));
    assert!(query.ends_with('~'));
});

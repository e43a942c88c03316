#![no_main]

use libfuzzer_sys::fuzz_target;
use softliq_mux::codec::{decode_response, split_last_error_code};

fuzz_target!(|data: &[u8]| {
    let Ok(xml) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(mut properties) = decode_response(xml) {
        assert!(!properties.contains_key("code"));
        split_last_error_code(&mut properties);
    }
});

#![no_main]
use std::sync::RwLock;

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Every inbound datagram path must reject arbitrary bytes without
    // panicking: settings (JSON key/value), commands (JSON), predictions
    // (binary f64x4).
    let config = RwLock::new(exo_core::RuntimeConfig::default());
    let _ = exo_core::channels::apply_settings_payload(data, &config);
    let _ = exo_core::channels::parse_command(data);
    let _ = exo_core::channels::decode_prediction(data);
});

#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Fuzz TOML config parsing and validation - should never panic
        if let Ok(config) = toml::from_str::<mention_router::Config>(s) {
            let _ = config.validate();
        }
    }
});

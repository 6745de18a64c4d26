#![no_main]

use libfuzzer_sys::fuzz_target;
use pathorder::config::AnalysisConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Malformed or out-of-range configuration must surface as an error
        if let Ok(config) = AnalysisConfig::from_toml_str(input) {
            assert!(config.validate().is_ok());
        }
    }
});

#![no_main]

use libfuzzer_sys::fuzz_target;
use pathorder::config::SelectionConfig;
use pathorder::paths::from_sequences;
use pathorder::selection::select;

fuzz_target!(|data: &[u8]| {
    // Each byte is an entity among 8; 0xFF ends a path
    let sequences: Vec<(Vec<String>, f64)> = data
        .split(|&b| b == 0xFF)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| (chunk.iter().map(|b| (b % 8).to_string()).collect(), 1.0))
        .collect();

    if let Ok(stats) = from_sequences(sequences, 16) {
        let config = SelectionConfig {
            workers: 1,
            ..SelectionConfig::new(3, 0.01)
        };
        let model = select(&stats, &config).expect("selection on training data never fails");
        assert!(model.optimal_order() <= 3);
    }
});

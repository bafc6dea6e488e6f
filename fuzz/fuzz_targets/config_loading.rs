#![no_main]

use keyed_di::ContainerConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Parsing must never panic, whatever the input
    let Ok(config) = ContainerConfig::from_json_str(text) else {
        return;
    };

    let ids: Vec<String> = config
        .values
        .keys()
        .chain(config.definitions.keys())
        .cloned()
        .collect();

    let Ok(container) = config.build() else {
        return;
    };

    // Every configured entry is visible; lookups may fail but must not panic
    for id in ids.iter().filter(|id| !id.is_empty()) {
        assert!(container.has(id).unwrap_or(false));
        let _ = container.get(id);
    }
});

#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz snapshot loading and the diff engine behind it.
///
/// Feeds arbitrary UTF-8 strings to `parse_policy_str`. Snapshots that load
/// are diffed against themselves, which must never fail and never report
/// changes.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(policy) = poldiff::parsers::parse_policy_str(s) {
            let result = poldiff::DiffEngine::new()
                .with_parallel(false)
                .diff(&policy, &policy)
                .expect("self-diff of a loaded snapshot");
            assert!(!result.has_changes());
        }
    }
});

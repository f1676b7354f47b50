#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Scenario files carry raw input events; parsing must never panic
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(event) = serde_json::from_str::<pomodoro_types::InputEvent>(s) {
            let _ = event.kind.is_structural();
        }
    }
});

//! Unknown-field warnings for the config file.
//!
//! Unknown keys are not errors; a typo such as `fadeInTime` would otherwise
//! silently fall back to the default.

use serde_json::Value;
use tracing::warn;

const DIALOG_KEYS: &[&str] = &[
    "idleTimeToPushModalMs",
    "pushModalTimeLimitSecs",
    "pushModalRate",
    "motionDistanceToClose",
    "idleTimeToOpenMs",
    "idleTimeToCloseMs",
    "minDisplayTimeMs",
    "fadeInTimeMs",
    "fadeOutTimeMs",
    "openWhenIdleMinRemainingSecs",
    "description",
];

/// Top-level sections of `Config` and the keys each accepts
const SECTIONS: &[(&str, &[&str])] = &[("dialog", DIALOG_KEYS)];

/// Log a warning for every key `Config` does not know about.
pub fn warn_unknown_fields(content: &str, config_name: &str) {
    let Ok(value) = serde_json::from_str::<Value>(content) else {
        return;
    };

    for path in unknown_keys(&value) {
        warn!("Unknown config field in {config_name}: {path}");
    }
}

/// Dotted paths of unknown keys, e.g. `dialog.fadeInTime`.
fn unknown_keys(value: &Value) -> Vec<String> {
    let Value::Object(root) = value else {
        return Vec::new();
    };

    let mut unknowns = Vec::new();
    for (section, body) in root {
        let Some((_, known)) = SECTIONS.iter().find(|(name, _)| name == section) else {
            unknowns.push(section.clone());
            continue;
        };

        if let Value::Object(fields) = body {
            unknowns.extend(
                fields
                    .keys()
                    .filter(|key| !known.contains(&key.as_str()))
                    .map(|key| format!("{section}.{key}")),
            );
        }
    }
    unknowns
}

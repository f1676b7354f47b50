//! Shared types for the pomodoro break dialog.
//!
//! This crate provides the plain data used across pomodoro-core and
//! pomodoro-cli. All types are serializable so scenarios and event logs
//! can be written as JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Host event time in milliseconds, as handed to grab requests.
pub type Timestamp = u32;

/// Lifecycle state of a dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogState {
    /// Fully visible
    Opened,
    /// Hidden
    #[default]
    Closed,
    /// Fading in
    Opening,
    /// Fading out
    Closing,
}

impl DialogState {
    /// `open()` is a no-op in these states.
    #[must_use]
    pub fn is_open_or_opening(self) -> bool {
        matches!(self, Self::Opened | Self::Opening)
    }

    /// `close()` is a no-op in these states.
    #[must_use]
    pub fn is_closed_or_closing(self) -> bool {
        matches!(self, Self::Closed | Self::Closing)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Closing => "closing",
        }
    }
}

impl fmt::Display for DialogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notifications emitted by a dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogEvent {
    /// The `state` property changed
    StateChanged { state: DialogState },

    /// Open transition started
    Opening,

    /// Open transition finished
    Opened,

    /// Close transition started
    Closing,

    /// Close transition finished
    Closed,
}

impl DialogEvent {
    /// Name of the event as shown in logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "notify::state",
            Self::Opening => "opening",
            Self::Opened => "opened",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

/// Key symbols the dialog cares about.
///
/// Only media, brightness and display keys are told apart; everything else
/// is carried as a character or a raw keysym.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeySymbol {
    AudioCycleTrack,
    AudioForward,
    AudioLowerVolume,
    AudioNext,
    AudioPause,
    AudioPlay,
    AudioPrev,
    AudioRaiseVolume,
    AudioRandomPlay,
    AudioRecord,
    AudioRepeat,
    AudioRewind,
    AudioStop,
    AudioMicMute,
    AudioMute,
    MonBrightnessDown,
    MonBrightnessUp,
    Display,
    Escape,
    Return,
    Space,
    Character(char),
    Other(u32),
}

impl KeySymbol {
    /// Keys that keep working while the dialog is up.
    pub const MEDIA_KEYS: [KeySymbol; 18] = [
        Self::AudioCycleTrack,
        Self::AudioForward,
        Self::AudioLowerVolume,
        Self::AudioNext,
        Self::AudioPause,
        Self::AudioPlay,
        Self::AudioPrev,
        Self::AudioRaiseVolume,
        Self::AudioRandomPlay,
        Self::AudioRecord,
        Self::AudioRepeat,
        Self::AudioRewind,
        Self::AudioStop,
        Self::AudioMicMute,
        Self::AudioMute,
        Self::MonBrightnessDown,
        Self::MonBrightnessUp,
        Self::Display,
    ];

    #[must_use]
    pub fn is_media_key(self) -> bool {
        Self::MEDIA_KEYS.contains(&self)
    }
}

/// Kind of a raw input event delivered to the overlay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventKind {
    Motion { x: f64, y: f64 },
    ButtonPress { button: u32 },
    ButtonRelease { button: u32 },
    Scroll { dx: f64, dy: f64 },
    KeyPress { key: KeySymbol },
    KeyRelease { key: KeySymbol },
    TouchBegin { x: f64, y: f64 },
    TouchUpdate { x: f64, y: f64 },
    TouchEnd { x: f64, y: f64 },
    Enter,
    Leave,
    StageState,
    DestroyNotify,
    ClientMessage,
    Delete,
}

impl EventKind {
    /// Window-system bookkeeping events that never count as user input
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Enter
                | Self::Leave
                | Self::StageState
                | Self::DestroyNotify
                | Self::ClientMessage
                | Self::Delete
        )
    }
}

fn default_has_device() -> bool {
    true
}

/// A raw input event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEvent {
    pub kind: EventKind,

    /// Whether the event originates from an input device.
    /// Synthesized events have no device.
    #[serde(default = "default_has_device")]
    pub has_device: bool,
}

impl InputEvent {
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            has_device: true,
        }
    }

    /// Event without an originating device
    #[must_use]
    pub fn synthetic(kind: EventKind) -> Self {
        Self {
            kind,
            has_device: false,
        }
    }

    #[must_use]
    pub fn motion(x: f64, y: f64) -> Self {
        Self::new(EventKind::Motion { x, y })
    }

    #[must_use]
    pub fn key_press(key: KeySymbol) -> Self {
        Self::new(EventKind::KeyPress { key })
    }

    #[must_use]
    pub fn button_press(button: u32) -> Self {
        Self::new(EventKind::ButtonPress { button })
    }
}

/// Whether an event handler consumed the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Propagation {
    /// Let other handlers see the event
    Propagate,
    /// Event consumed
    Stop,
}

/// Read-only view of the pomodoro timer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub is_break: bool,
    pub remaining_secs: f64,
}

impl TimerSnapshot {
    /// Whole minutes and seconds left, clamped at zero.
    // Remaining time is clamped to >= 0 and floored before the casts
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn countdown(&self) -> (u64, u64) {
        let remaining = self.remaining_secs.max(0.0);
        let minutes = (remaining / 60.0).floor() as u64;
        let seconds = (remaining % 60.0).floor() as u64;
        (minutes, seconds)
    }
}

/// What the host knows about the focused window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    /// Window belongs to a media player
    pub is_player: bool,
    pub is_fullscreen: bool,
}

impl WindowInfo {
    #[must_use]
    pub fn is_fullscreen_player(&self) -> bool {
        self.is_player && self.is_fullscreen
    }
}

/// Which shell actions stay available while a grab is held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionMode {
    Normal,
    #[default]
    SystemModal,
}

/// Parameters of a grab request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrabOptions {
    pub action_mode: ActionMode,

    /// Time of the user request that led to the grab
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

impl GrabOptions {
    #[must_use]
    pub fn system_modal(timestamp: Option<Timestamp>) -> Self {
        Self {
            action_mode: ActionMode::SystemModal,
            timestamp,
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)] // Exact float comparisons are intentional in tests
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn dialog_state_defaults_to_closed() {
        assert_eq!(DialogState::default(), DialogState::Closed);
    }

    #[test]
    fn dialog_state_groups() {
        assert!(DialogState::Opened.is_open_or_opening());
        assert!(DialogState::Opening.is_open_or_opening());
        assert!(!DialogState::Closing.is_open_or_opening());
        assert!(DialogState::Closed.is_closed_or_closing());
        assert!(DialogState::Closing.is_closed_or_closing());
        assert!(!DialogState::Opened.is_closed_or_closing());
    }

    #[test]
    fn dialog_state_display() {
        assert_eq!(DialogState::Opening.to_string(), "opening");
        assert_eq!(DialogState::Closed.to_string(), "closed");
    }

    #[test]
    fn dialog_event_serializes_with_tag() {
        let value = serde_json::to_value(DialogEvent::StateChanged {
            state: DialogState::Opening,
        })
        .unwrap();
        assert_eq!(value, json!({"type": "state_changed", "state": "opening"}));

        let value = serde_json::to_value(DialogEvent::Closed).unwrap();
        assert_eq!(value, json!({"type": "closed"}));
    }

    #[test]
    fn media_keys_are_recognized() {
        assert!(KeySymbol::AudioPlay.is_media_key());
        assert!(KeySymbol::MonBrightnessUp.is_media_key());
        assert!(KeySymbol::Display.is_media_key());
        assert!(!KeySymbol::Escape.is_media_key());
        assert!(!KeySymbol::Character('a').is_media_key());
    }

    #[test]
    fn input_event_parses_without_device_field() {
        let event: InputEvent =
            serde_json::from_value(json!({"kind": {"type": "motion", "x": 4.0, "y": 2.5}}))
                .unwrap();
        assert!(event.has_device);
        assert_eq!(event.kind, EventKind::Motion { x: 4.0, y: 2.5 });
    }

    #[test]
    fn input_event_parses_key_press() {
        let event: InputEvent = serde_json::from_value(json!({
            "kind": {"type": "keyPress", "key": "audioMute"},
            "hasDevice": false
        }))
        .unwrap();
        assert!(!event.has_device);
        assert_eq!(
            event.kind,
            EventKind::KeyPress {
                key: KeySymbol::AudioMute
            }
        );

        let event: InputEvent = serde_json::from_value(json!({
            "kind": {"type": "keyPress", "key": {"character": "q"}}
        }))
        .unwrap();
        assert_eq!(event, InputEvent::key_press(KeySymbol::Character('q')));
    }

    #[test]
    fn structural_events() {
        assert!(EventKind::Enter.is_structural());
        assert!(EventKind::Delete.is_structural());
        assert!(!EventKind::ButtonPress { button: 1 }.is_structural());
        assert!(!EventKind::Motion { x: 0.0, y: 0.0 }.is_structural());
    }

    #[test]
    fn countdown_splits_minutes_and_seconds() {
        let snapshot = TimerSnapshot {
            is_break: true,
            remaining_secs: 299.7,
        };
        assert_eq!(snapshot.countdown(), (4, 59));
    }

    #[test]
    fn countdown_clamps_negative_remaining() {
        let snapshot = TimerSnapshot {
            is_break: true,
            remaining_secs: -3.0,
        };
        assert_eq!(snapshot.countdown(), (0, 0));
    }

    #[test]
    fn fullscreen_player_needs_both_flags() {
        let info = WindowInfo {
            is_player: true,
            is_fullscreen: true,
        };
        assert!(info.is_fullscreen_player());
        let info = WindowInfo {
            is_player: true,
            is_fullscreen: false,
        };
        assert!(!info.is_fullscreen_player());
    }

    #[test]
    fn grab_options_skip_missing_timestamp() {
        let value = serde_json::to_value(GrabOptions::system_modal(None)).unwrap();
        assert_eq!(value, json!({"actionMode": "system_modal"}));
    }

    proptest! {
        #[test]
        fn raw_keysyms_are_never_media_keys(code in any::<u32>()) {
            prop_assert!(!KeySymbol::Other(code).is_media_key());
        }

        #[test]
        fn countdown_seconds_stay_below_sixty(remaining in -1000.0f64..100_000.0) {
            let snapshot = TimerSnapshot { is_break: true, remaining_secs: remaining };
            let (minutes, seconds) = snapshot.countdown();
            prop_assert!(seconds < 60);
            prop_assert!(minutes * 60 + seconds <= remaining.max(0.0).ceil() as u64);
        }
    }
}

//! Decides which input dismisses an open dialog.

use super::DialogInner;
use crate::config::DialogConfig;
use pomodoro_types::{EventKind, InputEvent, Propagation};
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

/// Outcome of classifying one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Let the event through to the shell
    Propagate,
    /// Swallow the event
    Stop,
    /// The user is back: close the dialog and swallow the event
    Dismiss,
}

/// Classifies raw input while the dialog waits for the user to come back.
///
/// Pointer motion is compared against the previous motion sample only, so a
/// slow drift never adds up to a dismissal.
#[derive(Debug)]
pub struct InputFilter {
    distance_squared: f64,
    last_sample: Cell<Option<(f64, f64)>>,
}

impl InputFilter {
    /// `distance` is the pointer travel between two samples that counts as
    /// intentional.
    #[must_use]
    pub fn new(distance: f64) -> Self {
        Self {
            distance_squared: distance * distance,
            last_sample: Cell::new(None),
        }
    }

    #[must_use]
    pub fn from_config(config: &DialogConfig) -> Self {
        Self {
            distance_squared: config.motion_distance_squared(),
            last_sample: Cell::new(None),
        }
    }

    /// Forget the previous motion sample.
    pub fn reset(&self) {
        self.last_sample.set(None);
    }

    pub fn classify(&self, event: &InputEvent) -> Verdict {
        if !event.has_device {
            return Verdict::Stop;
        }

        match event.kind {
            kind if kind.is_structural() => Verdict::Propagate,
            EventKind::Motion { x, y } => self.classify_motion(x, y),
            EventKind::KeyPress { key } if key.is_media_key() => Verdict::Propagate,
            EventKind::KeyPress { .. }
            | EventKind::ButtonPress { .. }
            | EventKind::TouchBegin { .. } => Verdict::Dismiss,
            _ => Verdict::Stop,
        }
    }

    fn classify_motion(&self, x: f64, y: f64) -> Verdict {
        let travelled = match self.last_sample.replace(Some((x, y))) {
            Some((last_x, last_y)) => (x - last_x).powi(2) + (y - last_y).powi(2),
            None => 0.0,
        };

        if travelled > self.distance_squared {
            Verdict::Dismiss
        } else {
            Verdict::Stop
        }
    }
}

impl DialogInner {
    pub(super) fn arm_input_filter(self: &Rc<Self>) {
        if self.destroyed.get() || self.state.get().is_closed_or_closing() {
            return;
        }
        if self.event_handler.get().is_some() {
            return;
        }

        self.filter.reset();
        let weak = Rc::downgrade(self);
        let id = self.collab.overlay.connect_event(Box::new(move |event| {
            weak.upgrade()
                .map_or(Propagation::Propagate, |inner| inner.on_overlay_event(event))
        }));
        self.event_handler.set(Some(id));
        debug!("input filter armed");
    }

    pub(super) fn disarm_input_filter(&self) {
        if let Some(id) = self.event_handler.take() {
            self.collab.overlay.disconnect(id);
        }
    }

    fn on_overlay_event(self: &Rc<Self>, event: &InputEvent) -> Propagation {
        match self.filter.classify(event) {
            Verdict::Propagate => Propagation::Propagate,
            Verdict::Stop => Propagation::Stop,
            Verdict::Dismiss => {
                debug!(?event, "user is back, dismissing");
                self.close(true);
                Propagation::Stop
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomodoro_types::KeySymbol;

    fn filter() -> InputFilter {
        InputFilter::new(20.0)
    }

    #[test]
    fn first_motion_sample_never_dismisses() {
        assert_eq!(filter().classify(&InputEvent::motion(500.0, 500.0)), Verdict::Stop);
    }

    #[test]
    fn small_steps_do_not_add_up() {
        let filter = filter();
        for step in 0..50 {
            let x = f64::from(step) * 15.0;
            assert_eq!(filter.classify(&InputEvent::motion(x, 0.0)), Verdict::Stop);
        }
    }

    #[test]
    fn large_jump_dismisses() {
        let filter = filter();
        filter.classify(&InputEvent::motion(0.0, 0.0));
        assert_eq!(
            filter.classify(&InputEvent::motion(15.0, 15.0)),
            Verdict::Dismiss
        );
    }

    #[test]
    fn exact_threshold_is_not_enough() {
        let filter = filter();
        filter.classify(&InputEvent::motion(0.0, 0.0));
        assert_eq!(filter.classify(&InputEvent::motion(12.0, 16.0)), Verdict::Stop);
    }

    #[test]
    fn reset_forgets_last_sample() {
        let filter = filter();
        filter.classify(&InputEvent::motion(0.0, 0.0));
        filter.reset();
        assert_eq!(
            filter.classify(&InputEvent::motion(400.0, 400.0)),
            Verdict::Stop
        );
    }

    #[test]
    fn media_keys_pass_through() {
        for key in KeySymbol::MEDIA_KEYS {
            assert_eq!(
                filter().classify(&InputEvent::key_press(key)),
                Verdict::Propagate,
                "{key:?}"
            );
        }
    }

    #[test]
    fn other_keys_dismiss() {
        assert_eq!(
            filter().classify(&InputEvent::key_press(KeySymbol::Character('a'))),
            Verdict::Dismiss
        );
        assert_eq!(
            filter().classify(&InputEvent::key_press(KeySymbol::Escape)),
            Verdict::Dismiss
        );
    }

    #[test]
    fn key_release_is_swallowed() {
        let event = InputEvent::new(EventKind::KeyRelease {
            key: KeySymbol::Return,
        });
        assert_eq!(filter().classify(&event), Verdict::Stop);
    }

    #[test]
    fn button_and_touch_dismiss() {
        assert_eq!(filter().classify(&InputEvent::button_press(1)), Verdict::Dismiss);
        let touch = InputEvent::new(EventKind::TouchBegin { x: 1.0, y: 2.0 });
        assert_eq!(filter().classify(&touch), Verdict::Dismiss);
    }

    #[test]
    fn structural_events_propagate() {
        for kind in [
            EventKind::Enter,
            EventKind::Leave,
            EventKind::StageState,
            EventKind::DestroyNotify,
            EventKind::ClientMessage,
            EventKind::Delete,
        ] {
            assert_eq!(filter().classify(&InputEvent::new(kind)), Verdict::Propagate);
        }
    }

    #[test]
    fn events_without_device_are_swallowed() {
        let synthetic = InputEvent::synthetic(EventKind::KeyPress {
            key: KeySymbol::Space,
        });
        assert_eq!(filter().classify(&synthetic), Verdict::Stop);

        let synthetic_enter = InputEvent::synthetic(EventKind::Enter);
        assert_eq!(filter().classify(&synthetic_enter), Verdict::Stop);
    }

    #[test]
    fn scroll_and_release_are_swallowed() {
        let scroll = InputEvent::new(EventKind::Scroll { dx: 0.0, dy: 3.0 });
        assert_eq!(filter().classify(&scroll), Verdict::Stop);
        let release = InputEvent::new(EventKind::ButtonRelease { button: 1 });
        assert_eq!(filter().classify(&release), Verdict::Stop);
    }
}

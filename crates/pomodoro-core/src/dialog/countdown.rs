use super::DialogInner;
use std::rc::Rc;

impl DialogInner {
    pub(super) fn connect_countdown(self: &Rc<Self>) {
        if self.countdown.get().is_some() {
            return;
        }
        let id = self
            .collab
            .timer
            .connect_update(self.handler(|inner| inner.update_countdown()));
        self.countdown.set(Some(id));
        self.update_countdown();
    }

    pub(super) fn disconnect_countdown(&self) {
        if let Some(id) = self.countdown.take() {
            self.collab.timer.disconnect(id);
        }
    }

    fn update_countdown(&self) {
        let snapshot = self.collab.timer.snapshot();
        if snapshot.is_break {
            let (minutes, seconds) = snapshot.countdown();
            self.collab.overlay.set_countdown(minutes, seconds);
        }
    }
}

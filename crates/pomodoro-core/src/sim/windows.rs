use crate::collab::WindowInspector;
use pomodoro_types::WindowInfo;
use std::cell::Cell;

#[derive(Default)]
pub struct SimWindows {
    focused: Cell<Option<WindowInfo>>,
}

impl SimWindows {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_focused(&self, window: Option<WindowInfo>) {
        self.focused.set(window);
    }
}

impl WindowInspector for SimWindows {
    fn focused_window(&self) -> Option<WindowInfo> {
        self.focused.get()
    }
}

//! Scripted sessions replayed against the simulated desktop.
//!
//! A scenario is a JSON document listing timed actions: what the user does,
//! what the host does and what the caller asks of the dialog. Replaying it
//! on a [`VirtualScheduler`] gives a deterministic log of lifecycle events.

use crate::collab::{IdleMonitor, Scheduler};
use crate::config::DialogConfig;
use crate::dialog::BreakDialog;
use crate::runtime::VirtualScheduler;
use crate::sim::SimDesktop;
use crate::{Error, Result};
use pomodoro_types::{DialogEvent, DialogState, InputEvent, Timestamp, TimerSnapshot, WindowInfo};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

fn default_true() -> bool {
    true
}

fn default_settle_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,

    /// Overrides the loaded configuration for this replay
    #[serde(default)]
    pub config: Option<DialogConfig>,

    /// How long the user has been idle when the replay starts
    #[serde(default)]
    pub initial_idle_ms: u64,

    #[serde(default)]
    pub timer: TimerSnapshot,

    pub steps: Vec<Step>,

    /// Time to keep running after the last step
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub at_ms: u64,
    pub action: Action,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    Open {
        #[serde(default = "default_true")]
        animate: bool,
    },
    Close {
        #[serde(default = "default_true")]
        animate: bool,
    },
    OpenWhenIdle,
    PushModal {
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    PopModal {
        #[serde(default)]
        timestamp: Option<Timestamp>,
    },
    /// The user touches an input device
    Input { event: InputEvent },
    /// Input that never reaches the overlay, e.g. typing in another app
    /// before the grab is taken
    Activity,
    #[serde(rename_all = "camelCase")]
    SetBreak { is_break: bool, remaining_secs: f64 },
    /// Make the host refuse grabs
    RefuseGrab {
        #[serde(default)]
        count: u64,
        #[serde(default)]
        always: bool,
    },
    /// Another surface takes key focus
    FocusOut,
    SetDescription { text: String },
    FullscreenPlayer { active: bool },
    Destroy,
}

impl Scenario {
    /// Load and check a scenario file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a valid scenario
    /// or has steps out of order.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// # Errors
    ///
    /// Returns an error if `content` is not a valid scenario.
    pub fn from_json(content: &str) -> Result<Self> {
        let scenario: Self = serde_json::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// # Errors
    ///
    /// Returns `Error::StepOrder` for steps that go back in time and
    /// `Error::Config` for an invalid embedded configuration.
    pub fn validate(&self) -> Result<()> {
        for (index, pair) in self.steps.windows(2).enumerate() {
            if pair[1].at_ms < pair[0].at_ms {
                return Err(Error::StepOrder {
                    step: index + 1,
                    at_ms: pair[1].at_ms,
                    previous_ms: pair[0].at_ms,
                });
            }
        }
        if let Some(config) = &self.config {
            config.validate()?;
        }
        Ok(())
    }

    /// Configuration the replay runs with
    #[must_use]
    pub fn effective_config(&self, fallback: &DialogConfig) -> DialogConfig {
        self.config.clone().unwrap_or_else(|| fallback.clone())
    }

    /// Time of the last step plus the settle time
    #[must_use]
    pub fn duration(&self) -> Duration {
        let last = self.steps.last().map_or(0, |step| step.at_ms);
        Duration::from_millis(last.saturating_add(self.settle_ms))
    }
}

/// A lifecycle event stamped with the loop time it was emitted at
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedEvent {
    pub at_ms: u64,
    pub event: DialogEvent,
}

/// Where the replay ended up
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub final_state: DialogState,
    pub has_modal: bool,
    pub destroyed: bool,
    pub grab_attempts: u64,
    pub grab_releases: u64,
    pub events: u64,
    pub elapsed_ms: u64,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// A dialog on a simulated desktop, driven one action at a time.
pub struct Replay {
    desktop: SimDesktop,
    dialog: BreakDialog,
    events: Rc<Cell<u64>>,
}

impl Replay {
    /// `sink` sees every lifecycle event as it is emitted.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `config` is invalid.
    pub fn new(
        scenario: &Scenario,
        scheduler: Rc<dyn Scheduler>,
        config: DialogConfig,
        sink: impl Fn(&LoggedEvent) + 'static,
    ) -> Result<Self> {
        config.validate()?;

        let desktop = SimDesktop::new(
            Rc::clone(&scheduler),
            Duration::from_millis(scenario.initial_idle_ms),
        );
        desktop
            .timer
            .set_phase(scenario.timer.is_break, scenario.timer.remaining_secs);

        let dialog = BreakDialog::new(desktop.collaborators(), config);
        let events = Rc::new(Cell::new(0));

        let counter = Rc::clone(&events);
        dialog.connect(move |event| {
            counter.set(counter.get() + 1);
            sink(&LoggedEvent {
                at_ms: millis(scheduler.now()),
                event: *event,
            });
        });

        Ok(Self {
            desktop,
            dialog,
            events,
        })
    }

    pub fn apply(&self, action: &Action) {
        debug!(?action, "replay step");
        let dialog = &self.dialog;
        let desktop = &self.desktop;

        match action {
            Action::Open { animate } => dialog.open(*animate),
            Action::Close { animate } => dialog.close(*animate),
            Action::OpenWhenIdle => dialog.open_when_idle(),
            Action::PushModal { timestamp } => {
                dialog.push_modal(*timestamp);
            }
            Action::PopModal { timestamp } => dialog.pop_modal(*timestamp),
            Action::Input { event } => {
                let propagation = desktop.user_input(event);
                debug!(?propagation, "input delivered");
            }
            Action::Activity => desktop.idle.report_activity(),
            Action::SetBreak {
                is_break,
                remaining_secs,
            } => desktop.timer.set_phase(*is_break, *remaining_secs),
            Action::RefuseGrab { count, always } => {
                desktop.grab.refuse_next(*count);
                desktop.grab.set_refuse_always(*always);
            }
            Action::FocusOut => desktop.overlay.steal_focus(),
            Action::SetDescription { text } => dialog.set_description(text.clone()),
            Action::FullscreenPlayer { active } => {
                desktop.windows.set_focused(active.then_some(WindowInfo {
                    is_player: true,
                    is_fullscreen: true,
                }));
            }
            Action::Destroy => dialog.destroy(),
        }
    }

    #[must_use]
    pub fn dialog(&self) -> &BreakDialog {
        &self.dialog
    }

    #[must_use]
    pub fn desktop(&self) -> &SimDesktop {
        &self.desktop
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary {
            final_state: self.dialog.state(),
            has_modal: self.dialog.has_modal(),
            destroyed: self.dialog.is_destroyed(),
            grab_attempts: self.desktop.grab.attempts(),
            grab_releases: self.desktop.grab.releases(),
            events: self.events.get(),
            elapsed_ms: millis(self.desktop.scheduler.now()),
        }
    }

    /// Idle time of the simulated user
    #[must_use]
    pub fn idle_time(&self) -> Duration {
        self.desktop.idle.idle_time()
    }
}

/// Replay `scenario` on a virtual clock.
///
/// # Errors
///
/// Returns `Error::Config` if the effective configuration is invalid.
pub fn run_virtual(
    scenario: &Scenario,
    fallback: &DialogConfig,
    sink: impl Fn(&LoggedEvent) + 'static,
) -> Result<Summary> {
    let scheduler = Rc::new(VirtualScheduler::new());
    let replay = Replay::new(
        scenario,
        scheduler.clone(),
        scenario.effective_config(fallback),
        sink,
    )?;

    for step in &scenario.steps {
        scheduler.advance_to(Duration::from_millis(step.at_ms));
        replay.apply(&step.action);
    }
    scheduler.advance(Duration::from_millis(scenario.settle_ms));

    Ok(replay.summary())
}

use std::collections::HashSet;
use std::sync::Arc;

use sieve_core::{
    BookmarkSaver, NavigationController, ReadStateSynchronizer, ReloadOutcome, Sieve, Transport,
    ViewAdapter, Warning,
};

use crate::action::Action;
use crate::theme::Theme;
use crate::tui_event::UiEvent;

/// Lifecycle of the sieve content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Initial fetch in progress.
    Loading,
    /// Content loaded, triage running.
    Ready,
    /// The fetch failed; `r` retries.
    LoadFailed(String),
    /// Draining read markers before a re-fetch.
    Reloading,
}

/// Side effects the main loop must run for the app. Everything that needs
/// the concrete transport (fetching, draining) or the host system (opening
/// a browser) is returned here instead of spawned from inside the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Open the url in the system browser.
    OpenUrl(String),
    /// Start a fresh sieve fetch.
    Refetch,
    /// Drain read markers, then re-fetch on success.
    Drain,
}

/// Focus state of the item pane: the terminal "page" the controller
/// drives. Shows complete instantly (no animation), so each show command
/// is relayed back as a finished transition in the same update pass.
#[derive(Debug, Default)]
pub struct SievePane {
    /// Item currently shown expanded, if any.
    pub focused: Option<usize>,
    shown: Option<usize>,
}

impl SievePane {
    /// Take the pending show-completion, if a show command was issued.
    pub fn take_shown(&mut self) -> Option<usize> {
        self.shown.take()
    }
}

impl ViewAdapter for SievePane {
    fn show_item(&mut self, index: usize) {
        self.focused = Some(index);
        self.shown = Some(index);
    }

    fn hide_item(&mut self, index: usize) {
        if self.focused == Some(index) {
            self.focused = None;
        }
    }
}

/// Main application state.
pub struct App<T: Transport> {
    pub phase: Phase,
    pub controller: NavigationController<T>,
    pub pane: SievePane,
    /// Banners currently raised.
    pub warnings: HashSet<Warning>,
    /// Server-side unread total reported at load time.
    pub num_unread: u64,
    pub theme: Theme,
    pub tick: usize,
    pub should_quit: bool,
    pub show_help: bool,
}

impl<T: Transport> App<T> {
    pub fn new(sync: Arc<ReadStateSynchronizer<T>>, saver: Arc<BookmarkSaver<T>>) -> Self {
        Self {
            phase: Phase::Loading,
            controller: NavigationController::new(Arc::new(Sieve::empty()), sync, saver),
            pane: SievePane::default(),
            warnings: HashSet::new(),
            num_unread: 0,
            theme: Theme::dark(),
            tick: 0,
            should_quit: false,
            show_help: false,
        }
    }

    /// Process a user action. Returns the effect the main loop must run.
    pub fn update(&mut self, action: Action) -> Effect {
        // When help overlay is shown, only allow a few actions through
        if self.show_help {
            match action {
                Action::Quit => self.should_quit = true,
                Action::ToggleHelp => self.show_help = false,
                Action::Tick => self.tick = self.tick.wrapping_add(1),
                _ => {} // swallow everything else
            }
            return Effect::None;
        }

        match action {
            Action::Quit => {
                self.should_quit = true;
                Effect::None
            }
            Action::ToggleHelp => {
                self.show_help = true;
                Effect::None
            }
            Action::NextItem if self.phase == Phase::Ready => {
                self.controller.next(&mut self.pane);
                self.complete_transition();
                Effect::None
            }
            Action::PreviousItem if self.phase == Phase::Ready => {
                self.controller.previous(&mut self.pane);
                self.complete_transition();
                Effect::None
            }
            Action::OpenCurrent if self.phase == Phase::Ready => {
                match self.controller.reveal() {
                    Some(url) => Effect::OpenUrl(url.to_string()),
                    None => Effect::None,
                }
            }
            Action::SaveCurrent if self.phase == Phase::Ready => {
                self.controller.save();
                Effect::None
            }
            Action::ReloadSieve => self.request_reload(),
            Action::Tick => {
                self.tick = self.tick.wrapping_add(1);
                Effect::None
            }
            _ => Effect::None,
        }
    }

    /// Process an event from a background task.
    pub fn handle_ui_event(&mut self, event: UiEvent) -> Effect {
        match event {
            UiEvent::SieveLoaded {
                descriptors,
                num_unread,
            } => {
                self.controller.reset(Arc::new(Sieve::new(descriptors)));
                self.pane = SievePane::default();
                self.num_unread = num_unread;
                self.phase = Phase::Ready;
                Effect::None
            }
            UiEvent::SieveLoadFailed { error } => {
                self.phase = Phase::LoadFailed(error);
                Effect::None
            }
            UiEvent::Warning { warning, visible } => {
                if visible {
                    self.warnings.insert(warning);
                } else {
                    self.warnings.remove(&warning);
                }
                Effect::None
            }
            UiEvent::DrainFinished { ok } => {
                if ok {
                    self.phase = Phase::Loading;
                    Effect::Refetch
                } else {
                    // markers are preserved and the banner is up; stay put
                    self.phase = Phase::Ready;
                    Effect::None
                }
            }
        }
    }

    /// Render the current screen.
    pub fn view(&self, f: &mut ratatui::Frame) {
        crate::view::sieve::render(f, self);
        if self.show_help {
            crate::view::help::render(f, &self.theme);
        }
    }

    fn request_reload(&mut self) -> Effect {
        match self.phase {
            Phase::Ready | Phase::LoadFailed(_) => match self.controller.reload() {
                ReloadOutcome::Immediate => {
                    self.phase = Phase::Loading;
                    Effect::Refetch
                }
                ReloadOutcome::AfterDrain => {
                    self.phase = Phase::Reloading;
                    Effect::Drain
                }
            },
            // a fetch or drain is already running
            Phase::Loading | Phase::Reloading => Effect::None,
        }
    }

    /// Relay the pane's instantly-completed show command back to the
    /// controller, keeping the lock discipline intact.
    fn complete_transition(&mut self) {
        if let Some(index) = self.pane.take_shown() {
            self.controller.focus_changed(index);
        }
    }
}

//! Mode enumeration and the interrupt history that restores it.
use log::debug;
use serde::{Deserialize, Serialize};

/// The mutually exclusive activities of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Keep station behind the leader.
    Follow,
    /// Run the wander planner.
    Wander,
    /// Walk to a spotted loot item.
    GoingToLoot,
    /// Take claimed loot home.
    Carrying,
    /// Close on and strike a hostile.
    Attacking,
}

impl Mode {
    /// Interrupt modes temporarily supersede a standing mode and restore it
    /// afterwards.
    #[must_use]
    pub const fn is_interrupt(self) -> bool {
        matches!(self, Self::GoingToLoot | Self::Carrying | Self::Attacking)
    }
}

/// Requested change, applied by the controller after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Enter an interrupt mode.
    Interrupt(Mode),
    /// Switch between standing modes.
    Standing(Mode),
    /// End the interrupt episode.
    RestoreOriginal,
    /// Undo the most recent transition, used when a loot goal is abandoned.
    ReturnToPrevious,
}

/// Current mode plus the two pieces of history used to restore it.
///
/// `previous` is the mode one transition ago. `original` is the standing
/// mode to return to once the whole interrupt episode is over; it is `Some`
/// exactly while an episode is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeHistory {
    current: Mode,
    previous: Mode,
    original: Option<Mode>,
    standing: Mode,
}

impl ModeHistory {
    /// Starts in `initial`, which must be a standing mode; interrupts fall
    /// back to [`Mode::Wander`].
    #[must_use]
    pub const fn new(initial: Mode) -> Self {
        let standing = if initial.is_interrupt() {
            Mode::Wander
        } else {
            initial
        };
        Self {
            current: standing,
            previous: standing,
            original: None,
            standing,
        }
    }

    /// Mode in effect.
    #[must_use]
    pub const fn current(&self) -> Mode {
        self.current
    }

    /// Mode before the last change.
    #[must_use]
    pub const fn previous(&self) -> Mode {
        self.previous
    }

    /// Standing mode the running episode will restore.
    #[must_use]
    pub const fn original(&self) -> Option<Mode> {
        self.original
    }

    /// Whether an interrupt episode is in progress.
    #[must_use]
    pub const fn in_episode(&self) -> bool {
        self.original.is_some()
    }

    /// Applies `transition`, returning `true` when the current mode changed.
    pub fn apply(&mut self, transition: Transition) -> bool {
        let before = self.current;
        match transition {
            Transition::Interrupt(mode) => self.enter_interrupt(mode),
            Transition::Standing(mode) => self.set_standing(mode),
            Transition::RestoreOriginal => self.restore_original(),
            Transition::ReturnToPrevious => self.return_to_previous(),
        }
        if before != self.current {
            debug!("mode {before:?} -> {:?} via {transition:?}", self.current);
        }
        before != self.current
    }

    fn switch_to(&mut self, mode: Mode) {
        self.previous = self.current;
        self.current = mode;
    }

    fn enter_interrupt(&mut self, mode: Mode) {
        if !mode.is_interrupt() {
            self.set_standing(mode);
            return;
        }
        if self.current == mode {
            return;
        }
        if self.original.is_none() {
            self.original = Some(self.current);
        }
        self.switch_to(mode);
    }

    fn set_standing(&mut self, mode: Mode) {
        if mode.is_interrupt() {
            self.enter_interrupt(mode);
            return;
        }
        self.standing = mode;
        if self.current != mode {
            self.switch_to(mode);
        }
        self.original = None;
    }

    fn restore_original(&mut self) {
        let target = self.original.take().unwrap_or(self.standing);
        self.standing = target;
        if self.current != target {
            self.switch_to(target);
        }
    }

    fn return_to_previous(&mut self) {
        if self.previous.is_interrupt() || self.previous == self.current {
            self.restore_original();
            return;
        }
        let target = self.previous;
        self.switch_to(target);
        self.standing = target;
        self.original = None;
    }
}

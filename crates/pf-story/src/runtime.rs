use crate::choice::{ChoiceId, StoryChoice};
use crate::error::StoryResult;
use crate::path::LocationPath;
use crate::snapshot::StateSnapshot;

/// What a runtime was doing when a `continue_until` call returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinueOutcome {
    /// The runtime advanced one beat (a location transition, a stretch of
    /// content, or the end of content) without pausing.
    Ran,
    /// Execution stalled: the story is waiting on a choice. The pending
    /// options are available from `current_choices`.
    Stalled,
    /// Execution paused just before evaluating a conditional branch at the
    /// given decision site. Continuing again re-encounters the same site.
    PausedAtCondition(LocationPath),
}

/// A source of forced decisions consulted by a runtime while it advances.
///
/// Guides queue decisions per site; a recurring site consumes its queued
/// values in order. Because runtimes snapshot and rewind their own state
/// internally (text-formatting lookahead), a guide must mirror that
/// discipline for its read positions: `snapshot` pushes a mark, and exactly
/// one matching `restore` or `commit` pops it, innermost first. A decision
/// consumed during a rewound lookahead is consumed again when the runtime
/// re-executes it for real.
pub trait DecisionGuide {
    /// Is an unconsumed forced value queued for this condition site?
    fn will_force_condition(&self, site: &LocationPath) -> bool;

    /// Pop the next forced value for this condition site, or None when the
    /// site's queue is exhausted.
    fn force_condition(&mut self, site: &LocationPath) -> Option<bool>;

    /// Is an unconsumed forced selection queued for this choice site?
    fn will_force_choice(&self, site: &LocationPath) -> bool;

    /// Pop the next forced selection for this choice site, or None when the
    /// site's queue is exhausted.
    fn force_choice(&mut self, site: &LocationPath) -> Option<ChoiceId>;

    /// The runtime saved its state internally; remember the current read
    /// positions under a new mark.
    fn snapshot(&mut self);

    /// The runtime rewound to its most recent internal save; rewind the read
    /// positions to the matching mark and discard it.
    fn restore(&mut self);

    /// The runtime kept the state it looked ahead into; discard the most
    /// recent mark without moving the read positions.
    fn commit(&mut self);
}

/// A guide that forces nothing. Useful for plain playback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGuide;

impl DecisionGuide for NoopGuide {
    fn will_force_condition(&self, _site: &LocationPath) -> bool {
        false
    }

    fn force_condition(&mut self, _site: &LocationPath) -> Option<bool> {
        None
    }

    fn will_force_choice(&self, _site: &LocationPath) -> bool {
        false
    }

    fn force_choice(&mut self, _site: &LocationPath) -> Option<ChoiceId> {
        None
    }

    fn snapshot(&mut self) {}

    fn restore(&mut self) {}

    fn commit(&mut self) {}
}

/// The execution surface a compiled story runtime exposes to tooling.
///
/// The contract the route engine relies on:
/// - `save_state`/`load_state` round-trip the complete execution state, and
///   loading clears any transient error state.
/// - `previous_location` names the location that most recently finished
///   executing; `current_location` names where the execution head is now.
/// - While stalled on a choice, `can_continue` is false and
///   `current_choices` is non-empty; after the story ends, both are
///   false/empty.
pub trait StoryRuntime {
    /// Return to the pristine pre-execution state.
    fn reset_state(&mut self) -> StoryResult<()>;

    /// Move the execution head to a location, clearing any pending stall.
    fn choose_path(&mut self, path: &LocationPath) -> StoryResult<()>;

    /// Serialize the complete execution state.
    fn save_state(&self) -> StoryResult<StateSnapshot>;

    /// Restore a state previously produced by `save_state` on the same
    /// program, clearing any transient error state.
    fn load_state(&mut self, snapshot: &StateSnapshot) -> StoryResult<()>;

    /// Can `continue_until` advance execution right now?
    fn can_continue(&self) -> bool;

    /// The options pending at the current stall, in offer order. Empty when
    /// the story is not stalled.
    fn current_choices(&self) -> Vec<StoryChoice>;

    /// The location that most recently finished executing a step.
    fn previous_location(&self) -> Option<LocationPath>;

    /// The location the execution head points at now.
    fn current_location(&self) -> Option<LocationPath>;

    /// Resolve the current stall by taking the option with this id.
    fn choose_choice(&mut self, choice: ChoiceId) -> StoryResult<()>;

    /// Advance one beat: run until the next location transition, choice
    /// stall, condition pause, or the end of content.
    ///
    /// The guide is consulted at every condition site; a queued value
    /// resolves the branch without pausing. When no value is queued and
    /// `pause_before_conditions` is set, the call returns
    /// [`ContinueOutcome::PausedAtCondition`] with the head still before the
    /// site. `step_budget` bounds the number of steps executed in this call
    /// (None means the runtime's own safety limit applies); exhausting it is
    /// a runtime fault, not an outcome.
    fn continue_until(
        &mut self,
        guide: &mut dyn DecisionGuide,
        pause_before_conditions: bool,
        step_budget: Option<u32>,
    ) -> StoryResult<ContinueOutcome>;
}

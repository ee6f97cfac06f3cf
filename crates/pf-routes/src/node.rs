//! Frontier nodes: immutable resume points with their decision history.

use pf_story::choice::ChoiceId;
use pf_story::path::LocationPath;
use pf_story::snapshot::StateSnapshot;

use crate::replayer::ReplayCursor;
use crate::route::{ChoiceRecord, RouteOverride, RoutePlan};

/// One unexplored walk prefix on the search frontier.
///
/// A node is a resume point (a runtime snapshot plus the replay position
/// that produced it) together with everything the walk decided and saw on
/// the way there. Nodes never change once created: forking at a decision
/// site copies the parent and appends, so siblings cannot observe each
/// other's history.
#[derive(Debug, Clone)]
pub struct SearchNode {
    snapshot: StateSnapshot,
    cursor: ReplayCursor,
    overrides: Vec<RouteOverride>,
    choices: Vec<ChoiceRecord>,
    trail: Vec<LocationPath>,
}

impl SearchNode {
    /// The root node: a fresh runtime state with nothing decided yet.
    pub fn seed(snapshot: StateSnapshot) -> Self {
        Self {
            snapshot,
            cursor: ReplayCursor::default(),
            overrides: Vec::new(),
            choices: Vec::new(),
            trail: Vec::new(),
        }
    }

    /// The runtime state this node resumes from.
    pub fn snapshot(&self) -> &StateSnapshot {
        &self.snapshot
    }

    pub(crate) fn cursor(&self) -> &ReplayCursor {
        &self.cursor
    }

    /// Every decision forced on the walk so far, in walk order.
    pub fn overrides(&self) -> &[RouteOverride] {
        &self.overrides
    }

    /// The menus resolved on the walk so far, in walk order.
    pub fn choices(&self) -> &[ChoiceRecord] {
        &self.choices
    }

    /// Locations the walk has passed through, in first-visit order.
    pub fn trail(&self) -> &[LocationPath] {
        &self.trail
    }

    /// The walk so far as a finished, replayable plan.
    pub fn to_plan(&self) -> RoutePlan {
        RoutePlan { steps: self.overrides.clone(), choices: self.choices.clone() }
    }

    pub(crate) fn fork_condition(
        &self,
        snapshot: StateSnapshot,
        cursor: ReplayCursor,
        site: &LocationPath,
        value: bool,
        encountered: &[LocationPath],
    ) -> Self {
        let mut overrides = self.overrides.clone();
        overrides.push(RouteOverride::Condition { path: site.clone(), value });
        Self {
            snapshot,
            cursor,
            overrides,
            choices: self.choices.clone(),
            trail: merge_trail(&self.trail, encountered),
        }
    }

    pub(crate) fn fork_choice(
        &self,
        snapshot: StateSnapshot,
        cursor: ReplayCursor,
        site: &LocationPath,
        value: ChoiceId,
        record: ChoiceRecord,
        encountered: &[LocationPath],
    ) -> Self {
        let mut overrides = self.overrides.clone();
        overrides.push(RouteOverride::Choice { path: site.clone(), value });
        let mut choices = self.choices.clone();
        choices.push(record);
        Self {
            snapshot,
            cursor,
            overrides,
            choices,
            trail: merge_trail(&self.trail, encountered),
        }
    }
}

/// Extends a trail with newly encountered locations, keeping first-visit
/// order and dropping repeats.
pub(crate) fn merge_trail(trail: &[LocationPath], extra: &[LocationPath]) -> Vec<LocationPath> {
    let mut merged = trail.to_vec();
    for path in extra {
        if !merged.contains(path) {
            merged.push(path.clone());
        }
    }
    merged
}

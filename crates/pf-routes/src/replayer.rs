//! Per-site queues of forced decisions.
//!
//! A [`Replayer`] is built from a flat override history and hands the
//! recorded values back out site by site, in recording order. Each
//! decision site keeps its own queue, so a site that recurs on a walk
//! (a loop passing the same branch twice) is fed its recorded values
//! one per encounter and goes live once the queue is dry.

use std::collections::BTreeMap;

use pf_story::choice::ChoiceId;
use pf_story::path::LocationPath;
use pf_story::runtime::DecisionGuide;

use crate::route::RouteOverride;

/// A resume position inside a [`Replayer`].
///
/// Opaque to callers: capture one with [`Replayer::cursor`] when a walk
/// forks, and hand it to [`Replayer::seek`] after rebuilding the replayer
/// from the grown override history. Positions are keyed by site, so a
/// rebuild that introduces new sites or appends values to existing queues
/// leaves every already-consumed prefix intact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayCursor {
    conditions: BTreeMap<LocationPath, usize>,
    choices: BTreeMap<LocationPath, usize>,
}

impl ReplayCursor {
    /// The cursor as seen by a child node whose snapshot already has one
    /// more forced choice at `site` applied.
    pub(crate) fn with_choice_consumed(&self, site: &LocationPath) -> Self {
        let mut cursor = self.clone();
        *cursor.choices.entry(site.clone()).or_insert(0) += 1;
        cursor
    }

    /// The cursor as seen by a child node whose snapshot already has one
    /// more forced condition at `site` applied.
    pub(crate) fn with_condition_consumed(&self, site: &LocationPath) -> Self {
        let mut cursor = self.clone();
        *cursor.conditions.entry(site.clone()).or_insert(0) += 1;
        cursor
    }
}

#[derive(Debug, Clone)]
struct ForcedQueue<T> {
    values: Vec<T>,
    next: usize,
}

impl<T: Copy> ForcedQueue<T> {
    fn new() -> Self {
        Self { values: Vec::new(), next: 0 }
    }

    fn push(&mut self, value: T) {
        self.values.push(value);
    }

    fn has_pending(&self) -> bool {
        self.next < self.values.len()
    }

    fn pop(&mut self) -> Option<T> {
        let value = self.values.get(self.next).copied();
        if value.is_some() {
            self.next += 1;
        }
        value
    }
}

/// Feeds recorded decisions back to a runtime, one site at a time.
#[derive(Debug, Clone)]
pub struct Replayer {
    conditions: BTreeMap<LocationPath, ForcedQueue<bool>>,
    choices: BTreeMap<LocationPath, ForcedQueue<ChoiceId>>,
    marks: Vec<ReplayCursor>,
}

impl Replayer {
    /// Builds the per-site queues from a flat override history.
    pub fn new(overrides: &[RouteOverride]) -> Self {
        let mut conditions: BTreeMap<LocationPath, ForcedQueue<bool>> = BTreeMap::new();
        let mut choices: BTreeMap<LocationPath, ForcedQueue<ChoiceId>> = BTreeMap::new();
        for step in overrides {
            match step {
                RouteOverride::Condition { path, value } => {
                    conditions.entry(path.clone()).or_insert_with(ForcedQueue::new).push(*value);
                }
                RouteOverride::Choice { path, value } => {
                    choices.entry(path.clone()).or_insert_with(ForcedQueue::new).push(*value);
                }
            }
        }
        Self { conditions, choices, marks: Vec::new() }
    }

    /// Captures how far each queue has been consumed.
    pub fn cursor(&self) -> ReplayCursor {
        ReplayCursor {
            conditions: self
                .conditions
                .iter()
                .map(|(path, queue)| (path.clone(), queue.next))
                .collect(),
            choices: self
                .choices
                .iter()
                .map(|(path, queue)| (path.clone(), queue.next))
                .collect(),
        }
    }

    /// Seats every queue at a previously captured position.
    ///
    /// Sites absent from the cursor start unconsumed; positions are
    /// clamped to the queue length.
    pub fn seek(&mut self, cursor: &ReplayCursor) {
        for (path, queue) in &mut self.conditions {
            let at = cursor.conditions.get(path).copied().unwrap_or(0);
            queue.next = at.min(queue.values.len());
        }
        for (path, queue) in &mut self.choices {
            let at = cursor.choices.get(path).copied().unwrap_or(0);
            queue.next = at.min(queue.values.len());
        }
    }
}

impl DecisionGuide for Replayer {
    fn will_force_condition(&self, site: &LocationPath) -> bool {
        self.conditions.get(site).is_some_and(ForcedQueue::has_pending)
    }

    fn force_condition(&mut self, site: &LocationPath) -> Option<bool> {
        self.conditions.get_mut(site).and_then(ForcedQueue::pop)
    }

    fn will_force_choice(&self, site: &LocationPath) -> bool {
        self.choices.get(site).is_some_and(ForcedQueue::has_pending)
    }

    fn force_choice(&mut self, site: &LocationPath) -> Option<ChoiceId> {
        self.choices.get_mut(site).and_then(ForcedQueue::pop)
    }

    fn snapshot(&mut self) {
        let cursor = self.cursor();
        self.marks.push(cursor);
    }

    fn restore(&mut self) {
        if let Some(cursor) = self.marks.pop() {
            self.seek(&cursor);
        }
    }

    fn commit(&mut self) {
        self.marks.pop();
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn path(p: &str) -> LocationPath {
        LocationPath::new(p)
    }

    fn condition(p: &str, value: bool) -> RouteOverride {
        RouteOverride::Condition { path: path(p), value }
    }

    fn choice(p: &str, value: usize) -> RouteOverride {
        RouteOverride::Choice { path: path(p), value: ChoiceId(value) }
    }

    #[test]
    fn queues_split_by_site_and_kind() {
        let mut replayer = Replayer::new(&[
            condition("gate.b0", true),
            choice("hall", 1),
            condition("gate.b0", false),
        ]);

        assert!(replayer.will_force_condition(&path("gate.b0")));
        assert!(replayer.will_force_choice(&path("hall")));
        assert!(!replayer.will_force_choice(&path("gate.b0")));

        assert_eq!(replayer.force_condition(&path("gate.b0")), Some(true));
        assert_eq!(replayer.force_condition(&path("gate.b0")), Some(false));
        assert_eq!(replayer.force_condition(&path("gate.b0")), None);
        assert!(!replayer.will_force_condition(&path("gate.b0")));

        assert_eq!(replayer.force_choice(&path("hall")), Some(ChoiceId(1)));
        assert_eq!(replayer.force_choice(&path("hall")), None);
    }

    #[test]
    fn recurring_site_replays_in_recording_order() {
        let site = path("loop.b0");
        let mut replayer = Replayer::new(&[
            condition("loop.b0", false),
            condition("loop.b0", false),
            condition("loop.b0", true),
        ]);

        assert_eq!(replayer.force_condition(&site), Some(false));
        assert_eq!(replayer.force_condition(&site), Some(false));
        assert_eq!(replayer.force_condition(&site), Some(true));
        assert_eq!(replayer.force_condition(&site), None);
    }

    #[test]
    fn cursor_survives_a_rebuild_with_new_sites() {
        // Consume the only queue, then rebuild from a grown history whose
        // new site sorts ahead of the old one.
        let mut parent = Replayer::new(&[condition("m.b0", true)]);
        assert_eq!(parent.force_condition(&path("m.b0")), Some(true));
        let cursor = parent.cursor();

        let mut child = Replayer::new(&[condition("m.b0", true), condition("a.b0", false)]);
        child.seek(&cursor);

        assert!(!child.will_force_condition(&path("m.b0")));
        assert_eq!(child.force_condition(&path("a.b0")), Some(false));
    }

    #[test]
    fn cursor_keeps_consumed_prefix_when_a_queue_grows() {
        let site = path("loop.b0");
        let mut parent = Replayer::new(&[condition("loop.b0", true)]);
        assert_eq!(parent.force_condition(&site), Some(true));
        let cursor = parent.cursor();

        let mut child = Replayer::new(&[condition("loop.b0", true), condition("loop.b0", false)]);
        child.seek(&cursor);

        assert_eq!(child.force_condition(&site), Some(false));
        assert_eq!(child.force_condition(&site), None);
    }

    #[test]
    fn child_cursor_marks_the_fork_decision_consumed() {
        let parent = Replayer::new(&[]);
        let cursor = parent.cursor().with_choice_consumed(&path("hall"));

        let mut child = Replayer::new(&[choice("hall", 1)]);
        child.seek(&cursor);

        assert!(!child.will_force_choice(&path("hall")));
        assert_eq!(child.force_choice(&path("hall")), None);
    }

    #[test]
    fn marks_nest_and_unwind_in_reverse_order() {
        let site = path("gate.b0");
        let mut replayer = Replayer::new(&[
            condition("gate.b0", true),
            condition("gate.b0", false),
            condition("gate.b0", true),
        ]);

        replayer.snapshot();
        assert_eq!(replayer.force_condition(&site), Some(true));
        replayer.snapshot();
        assert_eq!(replayer.force_condition(&site), Some(false));

        replayer.restore();
        assert_eq!(replayer.force_condition(&site), Some(false));

        replayer.restore();
        assert_eq!(replayer.force_condition(&site), Some(true));
    }

    #[test]
    fn commit_keeps_the_consumed_position() {
        let site = path("gate.b0");
        let mut replayer = Replayer::new(&[condition("gate.b0", true), condition("gate.b0", false)]);

        replayer.snapshot();
        assert_eq!(replayer.force_condition(&site), Some(true));
        replayer.commit();

        assert_eq!(replayer.force_condition(&site), Some(false));
    }

    fn override_strategy() -> impl Strategy<Value = RouteOverride> {
        let paths = prop_oneof![Just("a.b0"), Just("hall"), Just("loop.b1")];
        prop_oneof![
            (paths.clone(), any::<bool>()).prop_map(|(p, v)| condition(p, v)),
            (paths, 0usize..3).prop_map(|(p, v)| choice(p, v)),
        ]
    }

    proptest! {
        #[test]
        fn consumption_order_matches_recording_order(history in prop::collection::vec(override_strategy(), 0..12)) {
            let mut replayer = Replayer::new(&history);
            for site in ["a.b0", "hall", "loop.b1"] {
                let site = path(site);
                let conditions: Vec<bool> = history
                    .iter()
                    .filter_map(|step| match step {
                        RouteOverride::Condition { path, value } if *path == site => Some(*value),
                        _ => None,
                    })
                    .collect();
                for expected in conditions {
                    prop_assert_eq!(replayer.force_condition(&site), Some(expected));
                }
                prop_assert_eq!(replayer.force_condition(&site), None);

                let choices: Vec<ChoiceId> = history
                    .iter()
                    .filter_map(|step| match step {
                        RouteOverride::Choice { path, value } if *path == site => Some(*value),
                        _ => None,
                    })
                    .collect();
                for expected in choices {
                    prop_assert_eq!(replayer.force_choice(&site), Some(expected));
                }
                prop_assert_eq!(replayer.force_choice(&site), None);
            }
        }

        #[test]
        fn seek_to_own_cursor_is_a_no_op(history in prop::collection::vec(override_strategy(), 0..12), spent in 0usize..6) {
            let mut replayer = Replayer::new(&history);
            for step in history.iter().take(spent) {
                match step {
                    RouteOverride::Condition { path, .. } => {
                        replayer.force_condition(path);
                    }
                    RouteOverride::Choice { path, .. } => {
                        replayer.force_choice(path);
                    }
                }
            }
            let cursor = replayer.cursor();
            let mut reseated = replayer.clone();
            reseated.seek(&cursor);
            prop_assert_eq!(reseated.cursor(), cursor);
        }
    }
}

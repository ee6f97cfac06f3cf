//! Runs one frontier node until its walk forks, finishes, or hits the
//! target.

use std::time::Instant;

use pf_story::error::StoryResult;
use pf_story::path::LocationPath;
use pf_story::runtime::{ContinueOutcome, DecisionGuide, StoryRuntime};

use crate::node::SearchNode;
use crate::replayer::Replayer;
use crate::route::{ChoiceRecord, RouteOverride};

/// Walk-independent inputs shared by every segment of one search.
#[derive(Debug, Clone, Copy)]
pub struct SegmentParams<'a> {
    /// Scope of the location the search started from.
    pub origin_scope: &'a str,
    /// Stop the walk as soon as this location has executed, if set.
    pub target: Option<&'a LocationPath>,
    /// Abandon walks once they execute a location outside the origin scope.
    pub stay_within_scope: bool,
    /// Scopes a confined walk may still execute through.
    pub transparent_scopes: &'a [String],
    /// Preferred option index per menu ordinal; favored children fork first.
    pub favored_choice_indices: &'a [Option<usize>],
    /// Wall-clock cutoff shared by the whole search.
    pub deadline: Instant,
}

/// What one segment run produced.
#[derive(Debug)]
pub struct RunResult {
    /// The target location executed during this segment.
    pub hit_target: bool,
    /// The walk is finished: nothing was forked for the frontier. Holds
    /// for story ends, dead stalls, scope exits, target hits, and
    /// deadline-truncated walks alike.
    pub terminal: bool,
    /// Child nodes forked at the decision site that stopped the segment,
    /// in exploration order.
    pub branches: Vec<SearchNode>,
    /// The node's full override history (the walk's replayable plan).
    pub steps: Vec<RouteOverride>,
    /// The node's menu records, aligned with its choice overrides.
    pub choices: Vec<ChoiceRecord>,
    /// Locations that finished executing during this segment, in
    /// first-visit order.
    pub encountered: Vec<LocationPath>,
}

/// Resume a node's walk and drive it to the next decision.
///
/// The runtime is restored from the node's snapshot, its recorded
/// decisions are queued for replay, and execution advances beat by beat
/// until the walk hits the target, stalls at an unforced menu, pauses at
/// an unforced condition, dead-ends, leaves the origin scope, or runs out
/// of deadline. An unforced decision site forks one child per alternative
/// (favored option first); each child snapshots the state with its
/// alternative already applied.
///
/// The runtime is left wherever the segment stopped. Callers restore
/// state per node, so nothing is put back here; faults bubble up for the
/// orchestrator to contain.
pub fn run_until_decision_or_branch<R>(
    runtime: &mut R,
    node: &SearchNode,
    params: &SegmentParams<'_>,
) -> StoryResult<RunResult>
where
    R: StoryRuntime + ?Sized,
{
    runtime.load_state(node.snapshot())?;
    let mut replayer = Replayer::new(node.overrides());
    replayer.seek(node.cursor());

    let mut encountered: Vec<LocationPath> = Vec::new();
    let mut branches: Vec<SearchNode> = Vec::new();
    let mut hit_target = false;

    loop {
        if Instant::now() >= params.deadline {
            break;
        }

        let previous = runtime.previous_location();
        if let Some(previous) = &previous {
            if !encountered.contains(previous) {
                encountered.push(previous.clone());
            }
            if params.target == Some(previous) {
                hit_target = true;
                break;
            }
        }

        if params.stay_within_scope && leaves_scope(params, previous.as_ref()) {
            break;
        }

        let offers = runtime.current_choices();
        if !offers.is_empty() {
            let Some(site) = previous else {
                break;
            };
            // A recorded decision still ahead of the resume point replays
            // here instead of forking.
            if let Some(forced) = replayer.force_choice(&site) {
                runtime.choose_choice(forced)?;
                continue;
            }
            // Each child snapshots the state with its option already taken,
            // so siblings stay distinguishable to the revisit guard.
            let stalled = runtime.save_state()?;
            let cursor = replayer.cursor().with_choice_consumed(&site);
            let options: Vec<String> = offers.iter().map(|offer| offer.text.clone()).collect();
            for index in fork_order(params, node, offers.len()) {
                runtime.load_state(&stalled)?;
                runtime.choose_choice(offers[index].id)?;
                let record = ChoiceRecord { options: options.clone(), selected: index };
                branches.push(node.fork_choice(
                    runtime.save_state()?,
                    cursor.clone(),
                    &site,
                    offers[index].id,
                    record,
                    &encountered,
                ));
            }
            break;
        }

        if !runtime.can_continue() {
            break;
        }

        match runtime.continue_until(&mut replayer, true, None)? {
            ContinueOutcome::PausedAtCondition(site) => {
                let paused = runtime.save_state()?;
                let cursor = replayer.cursor().with_condition_consumed(&site);
                for value in [true, false] {
                    runtime.load_state(&paused)?;
                    // Resolve the site once with the forced value; the call
                    // stops right after the branch transition.
                    let mut one_shot =
                        Replayer::new(&[RouteOverride::Condition { path: site.clone(), value }]);
                    runtime.continue_until(&mut one_shot, true, None)?;
                    branches.push(node.fork_condition(
                        runtime.save_state()?,
                        cursor.clone(),
                        &site,
                        value,
                        &encountered,
                    ));
                }
                break;
            }
            ContinueOutcome::Ran | ContinueOutcome::Stalled => {}
        }
    }

    let terminal = branches.is_empty();
    Ok(RunResult {
        hit_target,
        terminal,
        branches,
        steps: node.overrides().to_vec(),
        choices: node.choices().to_vec(),
        encountered,
    })
}

/// A confined walk stops once it has executed a location outside the
/// origin scope. The boundary location itself still runs (and counts for
/// coverage and target hits); the walk just never continues deeper.
fn leaves_scope(params: &SegmentParams<'_>, previous: Option<&LocationPath>) -> bool {
    let Some(previous) = previous else {
        return false;
    };
    let scope = previous.scope();
    scope != params.origin_scope
        && !params.transparent_scopes.iter().any(|transparent| transparent == scope)
}

/// Option indices in fork order: the favored option for this menu ordinal
/// first (when configured and offered), then the rest in offer order, each
/// exactly once.
fn fork_order(params: &SegmentParams<'_>, node: &SearchNode, offered: usize) -> Vec<usize> {
    let ordinal = node.choices().len();
    let favored = params
        .favored_choice_indices
        .get(ordinal)
        .copied()
        .flatten()
        .filter(|index| *index < offered);
    let mut order: Vec<usize> = Vec::with_capacity(offered);
    order.extend(favored);
    order.extend((0..offered).filter(|index| Some(*index) != favored));
    order
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pf_script::{Condition, Location, Script, ScriptRuntime};
    use pf_story::snapshot::StateSnapshot;

    use super::*;

    fn doors() -> Script {
        Script::new()
            .with_location(
                Location::new("hall")
                    .with_text("Two doors face you.")
                    .with_choice("Left", "left")
                    .with_choice("Right", "right"),
            )
            .with_location(Location::new("left").with_text("A broom closet.").with_end())
            .with_location(Location::new("right").with_text("Stairs lead up.").with_end())
    }

    fn gated() -> Script {
        Script::new()
            .with_location(
                Location::new("gate").with_branch(Condition::Flag("key".into()), "open", "locked"),
            )
            .with_location(Location::new("open").with_text("The gate swings wide.").with_end())
            .with_location(Location::new("locked").with_text("It will not budge.").with_end())
    }

    fn seeded(script: Script, at: &str) -> (ScriptRuntime, SearchNode) {
        let mut runtime = ScriptRuntime::new(script);
        runtime.choose_path(&at.into()).unwrap();
        let node = SearchNode::seed(runtime.save_state().unwrap());
        (runtime, node)
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    fn open_params<'a>(origin_scope: &'a str, target: Option<&'a LocationPath>) -> SegmentParams<'a> {
        SegmentParams {
            origin_scope,
            target,
            stay_within_scope: false,
            transparent_scopes: &[],
            favored_choice_indices: &[],
            deadline: far_deadline(),
        }
    }

    #[test]
    fn linear_walk_hits_the_target() {
        let script = Script::new()
            .with_location(Location::new("hall").with_text("A long hallway.").with_divert("cellar"))
            .with_location(Location::new("cellar").with_text("Dark down here.").with_end());
        let (mut runtime, node) = seeded(script, "hall");
        let target = LocationPath::new("cellar");

        let result =
            run_until_decision_or_branch(&mut runtime, &node, &open_params("hall", Some(&target)))
                .unwrap();

        assert!(result.hit_target);
        assert!(result.terminal);
        assert!(result.branches.is_empty());
        assert!(result.steps.is_empty());
        assert_eq!(result.encountered, vec!["hall".into(), "cellar".into()]);
    }

    #[test]
    fn unforced_menu_forks_every_option() {
        let (mut runtime, node) = seeded(doors(), "hall");

        let result =
            run_until_decision_or_branch(&mut runtime, &node, &open_params("hall", None)).unwrap();

        assert!(!result.terminal);
        assert!(!result.hit_target);
        assert_eq!(result.branches.len(), 2);
        assert_eq!(
            result.branches[0].overrides(),
            &[RouteOverride::Choice { path: "hall".into(), value: pf_story::ChoiceId(0) }]
        );
        assert_eq!(
            result.branches[1].overrides(),
            &[RouteOverride::Choice { path: "hall".into(), value: pf_story::ChoiceId(1) }]
        );
        assert_eq!(result.branches[0].choices()[0].options, vec!["Left", "Right"]);
        assert_eq!(result.branches[0].choices()[0].selected, 0);
    }

    #[test]
    fn sibling_forks_carry_distinct_snapshots() {
        let (mut runtime, node) = seeded(doors(), "hall");

        let result =
            run_until_decision_or_branch(&mut runtime, &node, &open_params("hall", None)).unwrap();

        assert_ne!(result.branches[0].snapshot(), result.branches[1].snapshot());
    }

    #[test]
    fn favored_option_forks_first() {
        let (mut runtime, node) = seeded(doors(), "hall");
        let favored = [Some(1)];
        let mut params = open_params("hall", None);
        params.favored_choice_indices = &favored;

        let result = run_until_decision_or_branch(&mut runtime, &node, &params).unwrap();

        let picks: Vec<usize> =
            result.branches.iter().map(|branch| branch.choices()[0].selected).collect();
        assert_eq!(picks, vec![1, 0]);
    }

    #[test]
    fn out_of_range_favored_index_is_ignored() {
        let (mut runtime, node) = seeded(doors(), "hall");
        let favored = [Some(5)];
        let mut params = open_params("hall", None);
        params.favored_choice_indices = &favored;

        let result = run_until_decision_or_branch(&mut runtime, &node, &params).unwrap();

        let picks: Vec<usize> =
            result.branches.iter().map(|branch| branch.choices()[0].selected).collect();
        assert_eq!(picks, vec![0, 1]);
    }

    #[test]
    fn forked_choice_children_resume_past_their_menu() {
        let (mut runtime, node) = seeded(doors(), "hall");
        let params = open_params("hall", None);

        let forks = run_until_decision_or_branch(&mut runtime, &node, &params).unwrap();
        let left = run_until_decision_or_branch(&mut runtime, &forks.branches[0], &params).unwrap();

        assert!(left.terminal);
        assert_eq!(left.encountered, vec!["hall".into(), "left".into()]);
        assert_eq!(
            left.steps,
            vec![RouteOverride::Choice { path: "hall".into(), value: pf_story::ChoiceId(0) }]
        );
        assert_eq!(left.choices.len(), 1);
    }

    #[test]
    fn queued_choice_resolves_a_stall_without_forking() {
        let (mut runtime, seed) = seeded(doors(), "hall");
        let mut idle = Replayer::new(&[]);
        runtime.continue_until(&mut idle, true, None).unwrap();
        let stalled = runtime.save_state().unwrap();

        // A resume point still sitting at the menu, its recorded decision
        // not yet consumed.
        let record = ChoiceRecord { options: vec!["Left".into(), "Right".into()], selected: 0 };
        let queued = seed.fork_choice(
            stalled,
            seed.cursor().clone(),
            &"hall".into(),
            pf_story::ChoiceId(0),
            record,
            &[],
        );

        let result =
            run_until_decision_or_branch(&mut runtime, &queued, &open_params("hall", None))
                .unwrap();

        assert!(result.terminal);
        assert!(result.branches.is_empty());
        assert_eq!(
            result.steps,
            vec![RouteOverride::Choice { path: "hall".into(), value: pf_story::ChoiceId(0) }]
        );
        assert_eq!(result.encountered, vec!["hall".into(), "left".into()]);
    }

    #[test]
    fn unforced_condition_forks_both_sides() {
        let (mut runtime, node) = seeded(gated(), "gate");
        let params = open_params("gate", None);

        let result = run_until_decision_or_branch(&mut runtime, &node, &params).unwrap();

        assert!(!result.terminal);
        assert_eq!(result.branches.len(), 2);
        assert_eq!(
            result.branches[0].overrides(),
            &[RouteOverride::Condition { path: "gate.b0".into(), value: true }]
        );
        assert_eq!(
            result.branches[1].overrides(),
            &[RouteOverride::Condition { path: "gate.b0".into(), value: false }]
        );
    }

    #[test]
    fn condition_children_resume_on_their_forced_sides() {
        let (mut runtime, node) = seeded(gated(), "gate");
        let params = open_params("gate", None);

        let forks = run_until_decision_or_branch(&mut runtime, &node, &params).unwrap();
        let taken = run_until_decision_or_branch(&mut runtime, &forks.branches[0], &params).unwrap();
        let refused =
            run_until_decision_or_branch(&mut runtime, &forks.branches[1], &params).unwrap();

        assert!(taken.terminal);
        assert!(taken.encountered.contains(&"open".into()));
        assert!(refused.terminal);
        assert!(refused.encountered.contains(&"locked".into()));
    }

    #[test]
    fn walk_stops_after_leaving_the_origin_scope() {
        let script = Script::new()
            .with_location(Location::new("hub.a").with_text("Setting out.").with_divert("away.b"))
            .with_location(Location::new("away.b").with_text("Elsewhere.").with_divert("away.c"))
            .with_location(Location::new("away.c").with_text("Deeper still.").with_end());
        let (mut runtime, node) = seeded(script, "hub.a");
        let mut params = open_params("hub", None);
        params.stay_within_scope = true;

        let result = run_until_decision_or_branch(&mut runtime, &node, &params).unwrap();

        assert!(result.terminal);
        assert_eq!(result.encountered, vec!["hub.a".into(), "away.b".into()]);
    }

    #[test]
    fn transparent_scopes_let_a_confined_walk_pass() {
        let script = Script::new()
            .with_location(Location::new("hub.a").with_text("Setting out.").with_divert("away.b"))
            .with_location(Location::new("away.b").with_text("Elsewhere.").with_divert("away.c"))
            .with_location(Location::new("away.c").with_text("Deeper still.").with_end());
        let (mut runtime, node) = seeded(script, "hub.a");
        let transparent = ["away".to_string()];
        let mut params = open_params("hub", None);
        params.stay_within_scope = true;
        params.transparent_scopes = &transparent;

        let result = run_until_decision_or_branch(&mut runtime, &node, &params).unwrap();

        assert!(result.terminal);
        assert_eq!(
            result.encountered,
            vec!["hub.a".into(), "away.b".into(), "away.c".into()]
        );
    }

    #[test]
    fn expired_deadline_ends_the_segment_before_it_runs() {
        let (mut runtime, node) = seeded(doors(), "hall");
        let mut params = open_params("hall", None);
        params.deadline = Instant::now();

        let result = run_until_decision_or_branch(&mut runtime, &node, &params).unwrap();

        assert!(result.terminal);
        assert!(result.branches.is_empty());
        assert!(result.encountered.is_empty());
    }

    #[test]
    fn corrupt_node_snapshot_surfaces_as_a_fault() {
        let (mut runtime, _) = seeded(doors(), "hall");
        let node = SearchNode::seed(StateSnapshot::new("not json"));

        let result = run_until_decision_or_branch(&mut runtime, &node, &open_params("hall", None));

        assert!(result.is_err());
    }
}

//! Replays finished plans without the search machinery.
//!
//! A [`crate::route::RoutePlan`] is a self-contained recipe: queue its
//! overrides in a fresh [`Replayer`] and let the runtime run. This module
//! does exactly that, for callers that want to drive a preview or verify a
//! route independently of how it was found.

use pf_story::error::StoryResult;
use pf_story::path::LocationPath;
use pf_story::runtime::{DecisionGuide, StoryRuntime};

use crate::replayer::Replayer;
use crate::route::RoutePlan;

/// Ceiling on continue calls per replay. A plan that needs more is stuck
/// in a cycle its overrides no longer break.
const BEAT_LIMIT: u32 = 10_000;

/// Where a replay got to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    /// Locations that finished executing, in first-visit order.
    pub visited: Vec<LocationPath>,
    /// The story ran to an end. False when the walk stopped at a menu the
    /// plan had no selection left for, or when the beat ceiling cut a
    /// cycling story short.
    pub completed: bool,
}

/// Runs a story from `from`, resolving decisions from the plan.
///
/// Conditions with no queued value evaluate live; a menu with no queued
/// selection stops the replay. The runtime is left wherever the replay
/// stopped so callers can inspect it; faults propagate unchanged.
pub fn replay_plan<R>(
    runtime: &mut R,
    from: &LocationPath,
    plan: &RoutePlan,
) -> StoryResult<ReplayReport>
where
    R: StoryRuntime + ?Sized,
{
    runtime.reset_state()?;
    runtime.choose_path(from)?;
    let mut replayer = Replayer::new(&plan.steps);

    let mut visited: Vec<LocationPath> = Vec::new();
    let mut completed = false;
    for _ in 0..BEAT_LIMIT {
        if let Some(previous) = runtime.previous_location() {
            if !visited.contains(&previous) {
                visited.push(previous);
            }
        }
        if runtime.can_continue() {
            runtime.continue_until(&mut replayer, false, None)?;
            continue;
        }
        let offers = runtime.current_choices();
        if offers.is_empty() {
            completed = true;
            break;
        }
        let Some(site) = runtime.previous_location() else {
            break;
        };
        let Some(selection) = replayer.force_choice(&site) else {
            break;
        };
        runtime.choose_choice(selection)?;
    }

    Ok(ReplayReport { visited, completed })
}

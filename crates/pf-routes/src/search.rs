//! The search orchestrators: targeted planning and exhaustive exploration.
//!
//! Both entry points own the runtime for the whole call: they check a node
//! out of the frontier, restore the runtime to it, run one segment, and fold
//! the forked children back in. The runtime is reset before returning on
//! every exit path, so a caller can hand the same instance to the next
//! search unconditionally.

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use pf_story::error::StoryResult;
use pf_story::path::LocationPath;
use pf_story::runtime::StoryRuntime;
use pf_story::snapshot::StateSnapshot;

use crate::driver::{SegmentParams, run_until_decision_or_branch};
use crate::node::{SearchNode, merge_trail};
use crate::options::{SearchOptions, SearchStrategy};
use crate::route::{RouteMap, RoutePlan};

/// Finds a replayable walk from one location to another.
///
/// Returns `None` when no walk reaches the target before the frontier
/// drains or the deadline expires; neither case is an error. Runtime
/// faults under individual frontier nodes abandon those walks without
/// aborting the search.
pub fn plan_route<R>(
    runtime: &mut R,
    from: &LocationPath,
    to: &LocationPath,
    options: &SearchOptions,
) -> Option<RoutePlan>
where
    R: StoryRuntime + ?Sized,
{
    let deadline = deadline_from(options);
    let plan = drive_plan(runtime, from, to, options, deadline);
    let _ = runtime.reset_state();
    plan
}

/// Enumerates every discoverable walk from a starting location.
///
/// Walks are recorded as routes when they finish (story end, dead stall,
/// scope exit) or when they run back into an already-expanded state, the
/// cycle-breaker for stories that loop without consuming a decision. Every
/// location visited during the search is attributed to the first recorded
/// route that reached it. Deadline and caps bound the search; whatever was
/// found by then is returned, with the cause noted in [`RouteMap::stats`].
pub fn explore_routes<R>(runtime: &mut R, from: &LocationPath, options: &SearchOptions) -> RouteMap
where
    R: StoryRuntime + ?Sized,
{
    let deadline = deadline_from(options);
    let mut map = RouteMap::default();
    drive_explore(runtime, from, options, deadline, &mut map);
    let _ = runtime.reset_state();
    map
}

fn drive_plan<R>(
    runtime: &mut R,
    from: &LocationPath,
    to: &LocationPath,
    options: &SearchOptions,
    deadline: Instant,
) -> Option<RoutePlan>
where
    R: StoryRuntime + ?Sized,
{
    let mut frontier = Frontier::new(options.search_strategy);
    frontier.push(seed_node(runtime, from).ok()?);
    let params = SegmentParams {
        origin_scope: from.scope(),
        target: Some(to),
        stay_within_scope: options.stay_within_scope,
        transparent_scopes: &options.transparent_scopes,
        favored_choice_indices: &options.favored_choice_indices,
        deadline,
    };

    loop {
        if Instant::now() >= deadline {
            return None;
        }
        let node = frontier.pop()?;
        let Ok(result) = run_until_decision_or_branch(runtime, &node, &params) else {
            continue;
        };
        if result.hit_target {
            return Some(RoutePlan { steps: result.steps, choices: result.choices });
        }
        for branch in result.branches {
            frontier.push(branch);
        }
    }
}

fn drive_explore<R>(
    runtime: &mut R,
    from: &LocationPath,
    options: &SearchOptions,
    deadline: Instant,
    map: &mut RouteMap,
) where
    R: StoryRuntime + ?Sized,
{
    let seed = match seed_node(runtime, from) {
        Ok(seed) => seed,
        Err(_) => {
            map.stats.faulted_nodes += 1;
            return;
        }
    };
    let mut frontier = Frontier::new(options.search_strategy);
    frontier.push(seed);
    let mut expanded: HashSet<StateSnapshot> = HashSet::new();
    let mut seen_routes: HashSet<String> = HashSet::new();
    let params = SegmentParams {
        origin_scope: from.scope(),
        target: None,
        stay_within_scope: options.stay_within_scope,
        transparent_scopes: &options.transparent_scopes,
        favored_choice_indices: &options.favored_choice_indices,
        deadline,
    };

    loop {
        if Instant::now() >= deadline {
            map.stats.deadline_expired = true;
            break;
        }
        if options.max_routes.is_some_and(|max| map.routes.len() >= max) {
            map.stats.route_cap_hit = true;
            break;
        }
        if options.max_nodes.is_some_and(|max| map.stats.nodes_expanded >= max) {
            map.stats.node_cap_hit = true;
            break;
        }
        let Some(node) = frontier.pop() else {
            break;
        };
        if !expanded.insert(node.snapshot().clone()) {
            // The walk ran back into a state some earlier walk was expanded
            // from: everything past here is already covered, so the prefix
            // stands as a finished (cycling) route.
            map.stats.revisit_skips += 1;
            record_route(map, &mut seen_routes, node.to_plan(), node.trail());
            continue;
        }
        map.stats.nodes_expanded += 1;
        match run_until_decision_or_branch(runtime, &node, &params) {
            Ok(result) if result.terminal => {
                let trail = merge_trail(node.trail(), &result.encountered);
                let plan = RoutePlan { steps: result.steps, choices: result.choices };
                record_route(map, &mut seen_routes, plan, &trail);
            }
            Ok(result) => {
                map.stats.branches_forked += result.branches.len();
                for branch in result.branches {
                    frontier.push(branch);
                }
            }
            Err(_) => map.stats.faulted_nodes += 1,
        }
    }
}

/// Record a finished walk, claiming its locations for coverage.
///
/// Structurally equal plans record once; locations already claimed by an
/// earlier route keep their first claimant.
fn record_route(
    map: &mut RouteMap,
    seen: &mut HashSet<String>,
    plan: RoutePlan,
    trail: &[LocationPath],
) {
    if !seen.insert(plan.canonical_key()) {
        map.stats.duplicate_routes += 1;
        return;
    }
    let index = map.routes.len();
    for path in trail {
        map.path_routes.entry(path.clone()).or_insert(index);
    }
    map.routes.push(plan);
    map.stats.routes_recorded += 1;
}

fn seed_node<R>(runtime: &mut R, from: &LocationPath) -> StoryResult<SearchNode>
where
    R: StoryRuntime + ?Sized,
{
    runtime.reset_state()?;
    runtime.choose_path(from)?;
    Ok(SearchNode::seed(runtime.save_state()?))
}

fn deadline_from(options: &SearchOptions) -> Instant {
    let budget = Duration::from_millis(options.search_timeout_ms);
    // Absurd budgets clamp to a day rather than overflowing the clock.
    Instant::now()
        .checked_add(budget)
        .unwrap_or_else(|| Instant::now() + Duration::from_secs(86_400))
}

/// Pending walk prefixes, popped FIFO for breadth-first search and LIFO
/// for depth-first.
struct Frontier {
    nodes: VecDeque<SearchNode>,
    strategy: SearchStrategy,
}

impl Frontier {
    fn new(strategy: SearchStrategy) -> Self {
        Self { nodes: VecDeque::new(), strategy }
    }

    fn push(&mut self, node: SearchNode) {
        self.nodes.push_back(node);
    }

    fn pop(&mut self) -> Option<SearchNode> {
        match self.strategy {
            SearchStrategy::Bfs => self.nodes.pop_front(),
            SearchStrategy::Dfs => self.nodes.pop_back(),
        }
    }
}

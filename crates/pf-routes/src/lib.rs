//! Deterministic route planning and exploration for branching stories.
//!
//! Given any runtime implementing [`pf_story::StoryRuntime`], this crate
//! answers two questions about a compiled story: "how do I get from here to
//! there?" ([`plan_route`]) and "where can I get to from here?"
//! ([`explore_routes`]). Answers come back as [`RoutePlan`]s: flat lists of
//! forced decisions that replay the walk on a fresh runtime, with no search
//! machinery involved ([`replay_plan`]).

/// The segment driver: runs one frontier node to its next decision.
pub mod driver;
/// Frontier nodes and their decision histories.
pub mod node;
/// Search configuration.
pub mod options;
/// Standalone plan replay.
pub mod playback;
/// Per-site queues feeding recorded decisions back to a runtime.
pub mod replayer;
/// Route overrides, plans, and coverage maps.
pub mod route;
/// The search orchestrators.
pub mod search;
/// Search counters and stop causes.
pub mod stats;

/// Re-export the segment driver surface.
pub use driver::{RunResult, SegmentParams, run_until_decision_or_branch};
/// Re-export the frontier node type.
pub use node::SearchNode;
/// Re-export search configuration.
pub use options::{SearchOptions, SearchStrategy};
/// Re-export plan replay.
pub use playback::{ReplayReport, replay_plan};
/// Re-export the decision replayer.
pub use replayer::{ReplayCursor, Replayer};
/// Re-export route and coverage types.
pub use route::{ChoiceRecord, RouteMap, RouteOverride, RoutePlan};
/// Re-export the search entry points.
pub use search::{explore_routes, plan_route};
/// Re-export search counters.
pub use stats::SearchStats;

use serde::{Deserialize, Serialize};

/// Counters describing what a search did and why it stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Nodes whose segments were run.
    pub nodes_expanded: usize,
    /// Child nodes forked at decision sites.
    pub branches_forked: usize,
    /// Routes recorded into the map.
    pub routes_recorded: usize,
    /// Terminal walks whose plan duplicated an already recorded route.
    pub duplicate_routes: usize,
    /// Nodes not re-expanded because their state had already been expanded.
    pub revisit_skips: usize,
    /// Nodes abandoned because the runtime faulted while driving them.
    pub faulted_nodes: usize,
    /// The wall-clock budget expired before the frontier drained.
    pub deadline_expired: bool,
    /// The node expansion cap stopped the search.
    pub node_cap_hit: bool,
    /// The recorded route cap stopped the search.
    pub route_cap_hit: bool,
}

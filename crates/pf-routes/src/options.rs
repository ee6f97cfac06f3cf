use serde::{Deserialize, Serialize};

/// Frontier discipline for a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Expand nodes oldest-first: shortest routes surface first.
    #[default]
    Bfs,
    /// Expand nodes newest-first: one walk is pushed deep before siblings.
    Dfs,
}

/// Configuration for a route search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Frontier discipline.
    pub search_strategy: SearchStrategy,
    /// Wall-clock budget for the whole call. 0 gives up immediately.
    pub search_timeout_ms: u64,
    /// Stop a walk that leaves the scope the search started in.
    pub stay_within_scope: bool,
    /// Scopes a walk may enter without counting as leaving, for callee
    /// scopes that are guaranteed to divert back.
    pub transparent_scopes: Vec<String>,
    /// Preferred option index for the Nth choice decision of a walk. Sparse:
    /// None entries and out-of-range indexes are ignored. The favored option
    /// is forked first.
    pub favored_choice_indices: Vec<Option<usize>>,
    /// Stop exploration after this many recorded routes (explore only).
    pub max_routes: Option<usize>,
    /// Stop exploration after this many node expansions (explore only).
    pub max_nodes: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            search_strategy: SearchStrategy::Bfs,
            search_timeout_ms: 1000,
            stay_within_scope: true,
            transparent_scopes: Vec::new(),
            favored_choice_indices: Vec::new(),
            max_routes: None,
            max_nodes: None,
        }
    }
}

impl SearchOptions {
    /// Set the frontier discipline.
    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.search_strategy = strategy;
        self
    }

    /// Set the wall-clock budget in milliseconds.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.search_timeout_ms = timeout_ms;
        self
    }

    /// Allow or forbid walks that leave the origin scope.
    pub fn with_stay_within_scope(mut self, stay: bool) -> Self {
        self.stay_within_scope = stay;
        self
    }

    /// Add a scope walks may pass through without stopping.
    pub fn with_transparent_scope(mut self, scope: impl Into<String>) -> Self {
        self.transparent_scopes.push(scope.into());
        self
    }

    /// Set the favored option index per choice decision.
    pub fn with_favored_choices(mut self, favored: Vec<Option<usize>>) -> Self {
        self.favored_choice_indices = favored;
        self
    }

    /// Cap the number of recorded routes.
    pub fn with_max_routes(mut self, max: usize) -> Self {
        self.max_routes = Some(max);
        self
    }

    /// Cap the number of node expansions.
    pub fn with_max_nodes(mut self, max: usize) -> Self {
        self.max_nodes = Some(max);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let options = SearchOptions::default();
        assert_eq!(options.search_strategy, SearchStrategy::Bfs);
        assert_eq!(options.search_timeout_ms, 1000);
        assert!(options.stay_within_scope);
        assert!(options.transparent_scopes.is_empty());
        assert_eq!(options.max_routes, None);
    }

    #[test]
    fn builder_chain() {
        let options = SearchOptions::default()
            .with_strategy(SearchStrategy::Dfs)
            .with_timeout_ms(50)
            .with_transparent_scope("helpers")
            .with_max_nodes(100);
        assert_eq!(options.search_strategy, SearchStrategy::Dfs);
        assert_eq!(options.search_timeout_ms, 50);
        assert_eq!(options.transparent_scopes, vec!["helpers"]);
        assert_eq!(options.max_nodes, Some(100));
    }
}

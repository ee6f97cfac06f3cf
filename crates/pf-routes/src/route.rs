use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use pf_story::{ChoiceId, LocationPath};

use crate::stats::SearchStats;

/// One forced decision along a walk.
///
/// Overrides are ordered; the same site may recur when the story loops, and
/// each recurrence consumes the next queued value for that site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteOverride {
    /// Force a boolean branch at a decision site.
    Condition {
        /// The decision site.
        path: LocationPath,
        /// The branch value to take.
        value: bool,
    },
    /// Force a menu selection at a choice site.
    Choice {
        /// The stalled location.
        path: LocationPath,
        /// The option to take.
        value: ChoiceId,
    },
}

impl RouteOverride {
    /// The site this override applies to.
    pub fn path(&self) -> &LocationPath {
        match self {
            Self::Condition { path, .. } | Self::Choice { path, .. } => path,
        }
    }
}

impl fmt::Display for RouteOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Condition { path, value } => write!(f, "branch {path} -> {value}"),
            Self::Choice { path, value } => write!(f, "choice {path} -> option {value}"),
        }
    }
}

/// What a choice menu offered and which option a walk took. Kept alongside
/// the overrides so a route can be played back in human terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRecord {
    /// The option texts, in offer order.
    pub options: Vec<String>,
    /// Index of the option taken.
    pub selected: usize,
}

/// A finished, independently replayable walk: the forced decisions in order
/// plus the menu records behind the choice decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePlan {
    /// Every forced decision of the walk, in consumption order.
    pub steps: Vec<RouteOverride>,
    /// One record per choice decision, in the same order.
    pub choices: Vec<ChoiceRecord>,
}

impl RoutePlan {
    /// A stable textual identity for deduplication: two walks that forced
    /// the same decisions at the same sites produce the same key.
    pub fn canonical_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }

    /// Render the plan as a numbered playback listing.
    pub fn describe(&self) -> String {
        if self.steps.is_empty() {
            return "no forced decisions".to_string();
        }
        let mut records = self.choices.iter();
        let lines: Vec<String> = self
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| match step {
                RouteOverride::Condition { .. } => format!("{}. {step}", index + 1),
                RouteOverride::Choice { path, .. } => match records.next() {
                    Some(record) => {
                        let text = record
                            .options
                            .get(record.selected)
                            .map(String::as_str)
                            .unwrap_or("?");
                        format!(
                            "{}. at {path} choose \"{text}\" (option {} of {})",
                            index + 1,
                            record.selected + 1,
                            record.options.len()
                        )
                    }
                    None => format!("{}. {step}", index + 1),
                },
            })
            .collect();
        lines.join("\n")
    }
}

/// Everything `explore_routes` discovered: the deduplicated routes and, for
/// every location reached, the first route that covers it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMap {
    /// The recorded routes, in discovery order.
    pub routes: Vec<RoutePlan>,
    /// Location -> index into `routes` of the first route whose walk visits
    /// it.
    pub path_routes: BTreeMap<LocationPath, usize>,
    /// What the search did and why it stopped.
    pub stats: SearchStats,
}

impl RouteMap {
    /// The route covering a location, if any walk reached it.
    pub fn route_to(&self, path: &LocationPath) -> Option<&RoutePlan> {
        self.path_routes
            .get(path)
            .and_then(|&index| self.routes.get(index))
    }

    /// True when no route was discovered.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

//! Story-domain vocabulary and the runtime contract for Pfadfinder.
//!
//! This crate defines what a compiled branching story looks like from the
//! outside (location paths, choice menus, opaque state snapshots) and the
//! [`StoryRuntime`] trait the route engine drives. It contains no engine and
//! no interpreter; see `pf-routes` and `pf-script` for those.

/// Choice menu options and their identifiers.
pub mod choice;
/// Error types used throughout the crate.
pub mod error;
/// Hierarchical location paths and scope extraction.
pub mod path;
/// The runtime execution surface and the decision-forcing guide.
pub mod runtime;
/// Opaque execution state snapshots.
pub mod snapshot;

/// Re-export choice types.
pub use choice::{ChoiceId, StoryChoice};
/// Re-export error types.
pub use error::{StoryError, StoryResult};
/// Re-export the location path type.
pub use path::LocationPath;
/// Re-export the runtime contract.
pub use runtime::{ContinueOutcome, DecisionGuide, NoopGuide, StoryRuntime};
/// Re-export the snapshot type.
pub use snapshot::StateSnapshot;

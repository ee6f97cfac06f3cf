//! A scripted reference runtime for Pfadfinder.
//!
//! Programs are small in-memory scripts (locations made of text beats, flag
//! sets, diverts, boolean branches, and choice menus) interpreted behind the
//! `pf-story` runtime contract. The crate exists so route-engine behavior can
//! be exercised and demonstrated without a real story compiler.

/// The interpreter implementing `StoryRuntime`.
pub mod runtime;
/// In-memory story programs and their builders.
pub mod script;

/// Re-export the interpreter.
pub use runtime::ScriptRuntime;
/// Re-export program builder types.
pub use script::{ChoiceDef, Condition, Location, Script, Step};

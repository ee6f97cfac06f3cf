use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one option within a pending choice menu.
///
/// Runtimes number the options they offer; the id is stable for a given
/// story state, so a recorded selection replays to the same option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChoiceId(pub usize);

impl fmt::Display for ChoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One option offered while the story is stalled at a choice menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryChoice {
    /// The option text shown to a player.
    pub text: String,
    /// The id to pass to `choose_choice` to take this option.
    pub id: ChoiceId,
}

impl StoryChoice {
    /// Build an option from its text and id.
    pub fn new(text: impl Into<String>, id: ChoiceId) -> Self {
        Self {
            text: text.into(),
            id,
        }
    }
}

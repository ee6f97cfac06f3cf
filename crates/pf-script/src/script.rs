//! In-memory story programs: named locations made of executable steps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pf_story::LocationPath;

/// A boolean expression a branch evaluates when no forced value is queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// True when the named flag is set.
    Flag(String),
    /// Negation of the inner condition.
    Not(Box<Condition>),
}

/// One option of a choice menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceDef {
    /// Text shown for this option.
    pub text: String,
    /// Location the story diverts to when the option is taken.
    pub to: LocationPath,
}

impl ChoiceDef {
    /// Build an option from its text and target location.
    pub fn new(text: impl Into<String>, to: impl Into<LocationPath>) -> Self {
        Self {
            text: text.into(),
            to: to.into(),
        }
    }
}

/// A single executable step inside a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// Emit a line of text. With `glue` set, the next text joins this line.
    Text {
        /// The text to emit.
        text: String,
        /// Join the following text onto the same line.
        glue: bool,
    },
    /// Set a story flag.
    Set {
        /// The flag name.
        flag: String,
        /// The value to store.
        value: bool,
    },
    /// Jump to another location.
    Divert(LocationPath),
    /// A boolean decision site: divert to one of two locations.
    Branch {
        /// The site identifier forced values are queued under.
        site: LocationPath,
        /// Evaluated when no forced value is queued.
        condition: Condition,
        /// Target when the branch is taken.
        then_to: LocationPath,
        /// Target when it is not.
        else_to: LocationPath,
    },
    /// Stall and offer a menu of options.
    Choices(Vec<ChoiceDef>),
    /// Finish the story.
    End,
}

/// A named stretch of story content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// The path this location is addressed by.
    pub path: LocationPath,
    /// The steps executed in order when the story enters.
    pub steps: Vec<Step>,
}

impl Location {
    /// Create an empty location at the given path.
    pub fn new(path: impl Into<LocationPath>) -> Self {
        Self {
            path: path.into(),
            steps: Vec::new(),
        }
    }

    /// Append a text line.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.steps.push(Step::Text {
            text: text.into(),
            glue: false,
        });
        self
    }

    /// Append a text line that glues the following text onto itself.
    pub fn with_glued_text(mut self, text: impl Into<String>) -> Self {
        self.steps.push(Step::Text {
            text: text.into(),
            glue: true,
        });
        self
    }

    /// Append a flag assignment.
    pub fn with_set(mut self, flag: impl Into<String>, value: bool) -> Self {
        self.steps.push(Step::Set {
            flag: flag.into(),
            value,
        });
        self
    }

    /// Append a jump to another location.
    pub fn with_divert(mut self, to: impl Into<LocationPath>) -> Self {
        self.steps.push(Step::Divert(to.into()));
        self
    }

    /// Append a boolean decision site. Sites are numbered in order of
    /// appearance: the first branch in a location `hall` is `hall.b0`, the
    /// next `hall.b1`, and so on.
    pub fn with_branch(
        mut self,
        condition: Condition,
        then_to: impl Into<LocationPath>,
        else_to: impl Into<LocationPath>,
    ) -> Self {
        let index = self
            .steps
            .iter()
            .filter(|step| matches!(step, Step::Branch { .. }))
            .count();
        self.steps.push(Step::Branch {
            site: self.path.child(format!("b{index}")),
            condition,
            then_to: then_to.into(),
            else_to: else_to.into(),
        });
        self
    }

    /// Append a menu option. Consecutive options build one menu: the option
    /// joins a trailing [`Step::Choices`] if present, otherwise a new menu
    /// step starts.
    pub fn with_choice(mut self, text: impl Into<String>, to: impl Into<LocationPath>) -> Self {
        let option = ChoiceDef::new(text, to);
        match self.steps.last_mut() {
            Some(Step::Choices(options)) => options.push(option),
            _ => self.steps.push(Step::Choices(vec![option])),
        }
        self
    }

    /// Append an explicit story end.
    pub fn with_end(mut self) -> Self {
        self.steps.push(Step::End);
        self
    }
}

/// A complete story program: locations keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    locations: BTreeMap<LocationPath, Location>,
}

impl Script {
    /// Create an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a location. A location added under an already-used path replaces
    /// the earlier one.
    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.insert(location.path.clone(), location);
        self
    }

    /// Look up a location by path.
    pub fn location(&self, path: &LocationPath) -> Option<&Location> {
        self.locations.get(path)
    }

    /// Number of locations in the program.
    pub fn location_count(&self) -> usize {
        self.locations.len()
    }
}

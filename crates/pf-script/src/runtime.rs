//! Interpreter that runs a [`Script`] behind the `StoryRuntime` contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pf_story::{
    ChoiceId, ContinueOutcome, DecisionGuide, LocationPath, StateSnapshot, StoryChoice,
    StoryError, StoryResult, StoryRuntime,
};

use crate::script::{ChoiceDef, Condition, Script, Step};

/// Ceiling on steps per continue call. A program that crosses it is stuck
/// in a runaway loop and surfaces as a runtime fault.
const STEP_LIMIT: u32 = 10_000;

/// Where the execution head points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Head {
    location: LocationPath,
    step: usize,
}

/// The complete execution state. Everything that affects future behavior
/// lives here; snapshots serialize exactly this.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct ExecState {
    head: Option<Head>,
    flags: BTreeMap<String, bool>,
    pending: Vec<ChoiceDef>,
    previous: Option<LocationPath>,
}

/// A reference runtime interpreting an in-memory [`Script`].
///
/// State serializes to canonical JSON, so two identical execution states
/// produce identical snapshots. Emitted text accumulates in a transcript
/// kept outside the snapshotted state: rewinding state does not rewind the
/// transcript.
#[derive(Debug)]
pub struct ScriptRuntime {
    script: Script,
    state: ExecState,
    transcript: Vec<String>,
}

impl ScriptRuntime {
    /// Wrap a script in a fresh runtime. Execution starts once a path is
    /// chosen with `choose_path`.
    pub fn new(script: Script) -> Self {
        Self {
            script,
            state: ExecState::default(),
            transcript: Vec::new(),
        }
    }

    /// Drain the lines emitted so far.
    pub fn take_transcript(&mut self) -> Vec<String> {
        std::mem::take(&mut self.transcript)
    }

    fn step_at(&self, head: &Head) -> StoryResult<Option<Step>> {
        let location = self
            .script
            .location(&head.location)
            .ok_or_else(|| StoryError::UnknownLocation(head.location.clone()))?;
        Ok(location.steps.get(head.step).cloned())
    }

    fn enter(&mut self, path: &LocationPath) -> StoryResult<()> {
        if self.script.location(path).is_none() {
            return Err(StoryError::UnknownLocation(path.clone()));
        }
        self.state.head = Some(Head {
            location: path.clone(),
            step: 0,
        });
        Ok(())
    }

    fn advance(&mut self, head: &Head) {
        self.state.head = Some(Head {
            location: head.location.clone(),
            step: head.step + 1,
        });
        self.state.previous = Some(head.location.clone());
    }

    fn finish(&mut self, at: &LocationPath) {
        self.state.previous = Some(at.clone());
        self.state.head = None;
    }

    fn eval(&self, condition: &Condition) -> bool {
        match condition {
            Condition::Flag(name) => self.state.flags.get(name).copied().unwrap_or(false),
            Condition::Not(inner) => !self.eval(inner),
        }
    }

    /// Join glued text to whatever text follows, looking ahead through
    /// diverts, flag sets, and forced branches. The peek is transactional:
    /// state and guide read positions rewind when nothing can be glued.
    fn glue_chain(
        &mut self,
        first: String,
        guide: &mut dyn DecisionGuide,
    ) -> StoryResult<String> {
        let mut line = first;
        loop {
            let saved = self.state.clone();
            guide.snapshot();
            match self.peek_text(guide) {
                Ok(Some((text, glue))) => {
                    guide.commit();
                    line.push_str(&text);
                    if !glue {
                        break;
                    }
                }
                Ok(None) => {
                    self.state = saved;
                    guide.restore();
                    break;
                }
                Err(error) => {
                    self.state = saved;
                    guide.restore();
                    return Err(error);
                }
            }
        }
        Ok(line)
    }

    /// Advance through non-text steps looking for the next text. Consumes
    /// forced branch values through the guide; never crosses an unforced
    /// branch, a menu, or the end of content.
    fn peek_text(
        &mut self,
        guide: &mut dyn DecisionGuide,
    ) -> StoryResult<Option<(String, bool)>> {
        let mut hops: u32 = 0;
        loop {
            if hops >= STEP_LIMIT {
                return Err(StoryError::StepLimitExceeded { limit: STEP_LIMIT });
            }
            hops += 1;
            let Some(head) = self.state.head.clone() else {
                return Ok(None);
            };
            let Some(step) = self.step_at(&head)? else {
                return Ok(None);
            };
            match step {
                Step::Text { text, glue } => {
                    self.advance(&head);
                    return Ok(Some((text, glue)));
                }
                Step::Set { flag, value } => {
                    self.state.flags.insert(flag, value);
                    self.advance(&head);
                }
                Step::Divert(to) => {
                    self.state.previous = Some(head.location.clone());
                    self.enter(&to)?;
                }
                Step::Branch {
                    site,
                    condition,
                    then_to,
                    else_to,
                } => {
                    if !guide.will_force_condition(&site) {
                        return Ok(None);
                    }
                    let taken = match guide.force_condition(&site) {
                        Some(value) => value,
                        None => self.eval(&condition),
                    };
                    self.state.previous = Some(head.location.clone());
                    self.enter(if taken { &then_to } else { &else_to })?;
                }
                Step::Choices(_) | Step::End => return Ok(None),
            }
        }
    }
}

impl StoryRuntime for ScriptRuntime {
    fn reset_state(&mut self) -> StoryResult<()> {
        self.state = ExecState::default();
        Ok(())
    }

    fn choose_path(&mut self, path: &LocationPath) -> StoryResult<()> {
        self.enter(path)?;
        self.state.pending.clear();
        self.state.previous = Some(path.clone());
        Ok(())
    }

    fn save_state(&self) -> StoryResult<StateSnapshot> {
        let blob = serde_json::to_string(&self.state)
            .map_err(|error| StoryError::SnapshotCorrupt(error.to_string()))?;
        Ok(StateSnapshot::new(blob))
    }

    fn load_state(&mut self, snapshot: &StateSnapshot) -> StoryResult<()> {
        self.state = serde_json::from_str(snapshot.as_str())
            .map_err(|error| StoryError::SnapshotCorrupt(error.to_string()))?;
        Ok(())
    }

    fn can_continue(&self) -> bool {
        self.state.head.is_some() && self.state.pending.is_empty()
    }

    fn current_choices(&self) -> Vec<StoryChoice> {
        self.state
            .pending
            .iter()
            .enumerate()
            .map(|(index, option)| StoryChoice::new(option.text.clone(), ChoiceId(index)))
            .collect()
    }

    fn previous_location(&self) -> Option<LocationPath> {
        self.state.previous.clone()
    }

    fn current_location(&self) -> Option<LocationPath> {
        self.state.head.as_ref().map(|head| head.location.clone())
    }

    fn choose_choice(&mut self, choice: ChoiceId) -> StoryResult<()> {
        let Some(option) = self.state.pending.get(choice.0).cloned() else {
            return Err(StoryError::InvalidChoice(choice));
        };
        self.enter(&option.to)?;
        self.state.pending.clear();
        Ok(())
    }

    fn continue_until(
        &mut self,
        guide: &mut dyn DecisionGuide,
        pause_before_conditions: bool,
        step_budget: Option<u32>,
    ) -> StoryResult<ContinueOutcome> {
        if !self.can_continue() {
            return Err(StoryError::CannotContinue);
        }
        let limit = step_budget.unwrap_or(STEP_LIMIT).min(STEP_LIMIT);
        let mut steps_taken: u32 = 0;
        loop {
            if steps_taken >= limit {
                return Err(StoryError::StepLimitExceeded { limit });
            }
            steps_taken += 1;
            let Some(head) = self.state.head.clone() else {
                return Ok(ContinueOutcome::Ran);
            };
            let Some(step) = self.step_at(&head)? else {
                // Fell off the end of the location's steps.
                self.finish(&head.location);
                return Ok(ContinueOutcome::Ran);
            };
            match step {
                Step::Text { text, glue } => {
                    self.advance(&head);
                    let line = if glue {
                        self.glue_chain(text, guide)?
                    } else {
                        text
                    };
                    self.transcript.push(line);
                }
                Step::Set { flag, value } => {
                    self.state.flags.insert(flag, value);
                    self.advance(&head);
                }
                Step::Divert(to) => {
                    self.state.previous = Some(head.location.clone());
                    self.enter(&to)?;
                    return Ok(ContinueOutcome::Ran);
                }
                Step::Branch {
                    site,
                    condition,
                    then_to,
                    else_to,
                } => {
                    let forced = if guide.will_force_condition(&site) {
                        guide.force_condition(&site)
                    } else {
                        None
                    };
                    let taken = match forced {
                        Some(value) => value,
                        None if pause_before_conditions => {
                            // Head stays before the site: the next continue
                            // re-encounters it.
                            self.state.previous = Some(head.location.clone());
                            return Ok(ContinueOutcome::PausedAtCondition(site));
                        }
                        None => self.eval(&condition),
                    };
                    self.state.previous = Some(head.location.clone());
                    self.enter(if taken { &then_to } else { &else_to })?;
                    return Ok(ContinueOutcome::Ran);
                }
                Step::Choices(options) => {
                    self.state.previous = Some(head.location.clone());
                    self.state.pending = options;
                    return Ok(ContinueOutcome::Stalled);
                }
                Step::End => {
                    self.finish(&head.location);
                    return Ok(ContinueOutcome::Ran);
                }
            }
        }
    }
}

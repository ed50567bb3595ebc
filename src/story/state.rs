// Session state threaded through one pipeline run, and the partial updates
// each stage hands back to the controller.

use serde::{Deserialize, Serialize};

use super::types::{Brief, JudgeResult};

/// The complete mutable record for one run.
///
/// Only the controller mutates it, and only through [`SessionState::apply`].
/// `user_input` and `max_iterations` are fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    user_input: String,
    pub age: u8,
    pub tone: Option<String>,
    pub refined_brief: Option<Brief>,
    pub story: Option<String>,
    pub judge_result: Option<JudgeResult>,
    /// `None` = passed; `Some(text)` = violation description
    pub safety_notes: Option<String>,
    iteration_count: u32,
    max_iterations: u32,
    final_story: Option<String>,
    /// Reader-supplied revision instruction; beats the judge's edit
    /// instruction for the next generation pass
    pub feedback_request: Option<String>,
}

impl SessionState {
    pub fn new(
        user_input: impl Into<String>,
        age: u8,
        tone: Option<String>,
        max_iterations: u32,
    ) -> Self {
        Self {
            user_input: user_input.into(),
            age,
            tone,
            refined_brief: None,
            story: None,
            judge_result: None,
            safety_notes: None,
            iteration_count: 0,
            max_iterations,
            final_story: None,
            feedback_request: None,
        }
    }

    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn final_story(&self) -> Option<&str> {
        self.final_story.as_deref()
    }

    /// Safety notes carrying an actual violation.
    pub fn safety_violation(&self) -> Option<&str> {
        self.safety_notes.as_deref().filter(|n| !n.is_empty())
    }

    /// Merge a stage's partial update, field by field, last write wins.
    ///
    /// The iteration count never decreases and the final story is written
    /// at most once.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(brief) = update.refined_brief {
            self.refined_brief = Some(brief);
        }
        if let Some(story) = update.story {
            self.story = Some(story);
        }
        if let Some(result) = update.judge_result {
            self.judge_result = Some(result);
        }
        if let Some(notes) = update.safety_notes {
            self.safety_notes = notes;
        }
        if let Some(count) = update.iteration_count {
            debug_assert!(count >= self.iteration_count, "iteration count went backwards");
            self.iteration_count = self.iteration_count.max(count);
        }
        if let Some(final_story) = update.final_story {
            if self.final_story.is_none() {
                self.final_story = Some(final_story);
            } else {
                tracing::warn!("Ignoring second write to final_story");
            }
        }
        if let Some(feedback) = update.feedback_request {
            self.feedback_request = feedback;
        }
    }
}

/// Fields a stage changed. `None` leaves the state field untouched; the
/// nested options on `safety_notes` / `feedback_request` let a stage clear
/// the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub refined_brief: Option<Brief>,
    pub story: Option<String>,
    pub judge_result: Option<JudgeResult>,
    pub safety_notes: Option<Option<String>>,
    pub iteration_count: Option<u32>,
    pub final_story: Option<String>,
    pub feedback_request: Option<Option<String>>,
}

impl StateUpdate {
    pub fn brief(brief: Brief) -> Self {
        Self {
            refined_brief: Some(brief),
            ..Default::default()
        }
    }

    pub fn story(story: String) -> Self {
        Self {
            story: Some(story),
            ..Default::default()
        }
    }

    pub fn judged(result: JudgeResult, iteration_count: u32) -> Self {
        Self {
            judge_result: Some(result),
            iteration_count: Some(iteration_count),
            ..Default::default()
        }
    }

    pub fn safety(notes: Option<String>) -> Self {
        Self {
            safety_notes: Some(notes),
            ..Default::default()
        }
    }

    pub fn finalized(story: Option<String>) -> Self {
        Self {
            final_story: story,
            ..Default::default()
        }
    }

    /// Mark the reader feedback as used.
    pub fn consume_feedback(mut self) -> Self {
        self.feedback_request = Some(None);
        self
    }
}

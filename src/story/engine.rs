// Story engine: drives one session through the pipeline

use serde::Serialize;
use std::sync::Arc;

use super::brief::refine;
use super::error::StoryError;
use super::invoke::StageContext;
use super::judge::judge;
use super::pipeline::{Stage, PIPELINE};
use super::safety::safety_check;
use super::state::{SessionState, StateUpdate};
use super::storyteller::generate;
use crate::config::constants::{DEFAULT_AGE, MAX_AGE, MIN_AGE};
use crate::config::Config;
use crate::providers::LlmProvider;

/// Clamp a requested age into the supported range, defaulting to 7.
pub fn normalize_age(age: i64) -> u8 {
    u8::try_from(age)
        .ok()
        .filter(|a| (MIN_AGE..=MAX_AGE).contains(a))
        .unwrap_or(DEFAULT_AGE)
}

/// Inputs for one run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub seed_idea: String,
    /// Outside 5-10 the session falls back to 7
    pub age: u8,
    pub tone: Option<String>,
    /// Falls back to the configured cap
    pub max_iterations: Option<u32>,
    /// Finished session to continue from
    pub prior_session: Option<SessionState>,
    /// Reader revision instruction for the first generation pass
    pub feedback: Option<String>,
}

impl RunRequest {
    pub fn new(seed_idea: impl Into<String>, age: u8) -> Self {
        Self {
            seed_idea: seed_idea.into(),
            age,
            ..Default::default()
        }
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        let tone = tone.into();
        self.tone = (!tone.trim().is_empty()).then_some(tone);
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = Some(max);
        self
    }

    /// Continue from `prior` with a reader instruction.
    pub fn continuing(mut self, prior: SessionState, feedback: Option<String>) -> Self {
        self.prior_session = Some(prior);
        self.feedback = feedback.filter(|f| !f.trim().is_empty());
        self
    }
}

/// Final state plus the best available story text.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub state: SessionState,
    pub final_story: Option<String>,
}

/// FINALIZE stage: copy the current draft into the output slot.
pub fn finalize(state: &SessionState) -> StateUpdate {
    StateUpdate::finalized(state.story.clone())
}

pub struct StoryEngine {
    provider: Arc<dyn LlmProvider>,
    config: Config,
}

impl StoryEngine {
    pub fn new(provider: Arc<dyn LlmProvider>, config: Config) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn initial_state(&self, request: RunRequest) -> SessionState {
        let max = request
            .max_iterations
            .filter(|m| *m > 0)
            .unwrap_or(self.config.max_iterations);
        let age = normalize_age(i64::from(request.age));
        if age != request.age {
            tracing::warn!(requested = request.age, age, "Age out of range, using default");
        }
        let mut state = SessionState::new(request.seed_idea, age, request.tone, max);

        if let Some(prior) = request.prior_session {
            let story = prior
                .final_story()
                .map(str::to_string)
                .or_else(|| prior.story.clone());
            state.refined_brief = prior.refined_brief;
            state.story = story;
        }
        state.feedback_request = request.feedback;
        state
    }

    /// Run the pipeline to completion.
    ///
    /// Quality or safety failures that persist until the iteration cap are
    /// not errors; the last draft is still returned.
    pub async fn run(&self, request: RunRequest) -> Result<RunOutcome, StoryError> {
        let mut state = self.initial_state(request);
        let ctx = StageContext::new(self.provider.as_ref(), &self.config);
        let pipeline = &*PIPELINE;

        let mut stage = pipeline.entry(&state);
        tracing::info!(
            idea = %state.user_input(),
            age = state.age,
            max_iterations = state.max_iterations(),
            entry = %stage,
            "Starting story run"
        );

        while stage != Stage::Done {
            tracing::debug!(stage = %stage, iteration = state.iteration_count(), "Entering stage");
            let update = match stage {
                Stage::Refine => refine(ctx, &state).await?,
                Stage::Generate => generate(ctx, &state).await?,
                Stage::Judge => judge(ctx, &state).await?,
                Stage::Safety => safety_check(&state, &self.config.safety),
                Stage::Finalize => finalize(&state),
                Stage::Done => StateUpdate::default(),
            };
            state.apply(update);

            let (next, decision) = pipeline.advance(stage, &state, &self.config.thresholds);
            if let Some(decision) = decision {
                tracing::info!(
                    iteration = state.iteration_count(),
                    route = ?decision.route,
                    reason = %decision.reason,
                    "Loop decision"
                );
            }
            stage = next;
        }

        let final_story = state
            .final_story()
            .map(str::to_string)
            .or_else(|| state.story.clone());

        tracing::info!(
            iterations = state.iteration_count(),
            passed_safety = state.safety_violation().is_none(),
            "Story run finished"
        );

        Ok(RunOutcome { state, final_story })
    }
}

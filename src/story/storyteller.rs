// Story generator: first draft from the brief, or a revision of the
// current draft against an instruction.

use super::error::StoryError;
use super::invoke::StageContext;
use super::pipeline::Stage;
use super::prompts::{self, InstructionSource};
use super::state::{SessionState, StateUpdate};
use crate::config::constants::{INITIAL_STORY_TEMPERATURE, REVISION_TEMPERATURE};

/// Which kind of generation pass the state calls for.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationMode<'a> {
    Initial,
    Revision {
        source: InstructionSource,
        instruction: &'a str,
        story: &'a str,
    },
}

/// Pick the mode. Revision needs an existing draft plus an instruction;
/// reader feedback beats the judge's edit instruction.
pub fn select_mode(state: &SessionState) -> GenerationMode<'_> {
    let Some(story) = state.story.as_deref() else {
        return GenerationMode::Initial;
    };

    let reader = state
        .feedback_request
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|f| (InstructionSource::Reader, f));
    let judge = state
        .judge_result
        .as_ref()
        .and_then(|r| r.edit_instruction())
        .map(|i| (InstructionSource::Judge, i));

    match reader.or(judge) {
        Some((source, instruction)) => GenerationMode::Revision {
            source,
            instruction,
            story,
        },
        None => GenerationMode::Initial,
    }
}

/// GENERATE stage.
pub async fn generate(ctx: StageContext<'_>, state: &SessionState) -> Result<StateUpdate, StoryError> {
    let system = prompts::storyteller_system(&ctx.config.safety);

    let (user, temperature, used_feedback) = match select_mode(state) {
        GenerationMode::Revision {
            source,
            instruction,
            story,
        } => {
            tracing::debug!(source = source.label(), "Revising story");
            (
                prompts::revision_user(source, instruction, story, &ctx.config.safety),
                REVISION_TEMPERATURE,
                source == InstructionSource::Reader,
            )
        }
        GenerationMode::Initial => {
            let brief = state.refined_brief.as_ref().ok_or_else(|| {
                StoryError::precondition(Stage::Generate, "a brief is required for the first draft")
            })?;
            let brief_json = serde_json::to_string_pretty(brief).map_err(|e| {
                StoryError::precondition(Stage::Generate, format!("brief not serializable: {}", e))
            })?;
            tracing::debug!(topic = %brief.topic, "Writing first draft");
            (
                prompts::initial_story_user(&brief_json),
                INITIAL_STORY_TEMPERATURE,
                false,
            )
        }
    };

    let text = ctx
        .complete(Stage::Generate, &system, &user, temperature)
        .await?;
    let update = StateUpdate::story(text.trim().to_string());

    Ok(if used_feedback {
        update.consume_feedback()
    } else {
        update
    })
}

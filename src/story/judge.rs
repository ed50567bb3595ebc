// Quality judge: scores the current draft on six dimensions

use serde::Deserialize;

use super::error::StoryError;
use super::invoke::StageContext;
use super::pipeline::Stage;
use super::prompts;
use super::state::{SessionState, StateUpdate};
use super::types::{Dimension, DimensionName, JudgeResult};
use crate::config::constants::{DEFAULT_AGE, JUDGE_TEMPERATURE};

#[derive(Debug, Deserialize)]
struct RawDimension {
    name: String,
    score: f32,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawJudgeResult {
    overall: f32,
    dimensions: Vec<RawDimension>,
    #[serde(default)]
    edit_instructions: Option<String>,
}

fn clamp_score(score: f32) -> f32 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 10.0)
    }
}

/// Map the model's dimensions onto the fixed six, in report order.
fn normalize(raw: RawJudgeResult) -> Result<JudgeResult, String> {
    let mut dimensions = Vec::with_capacity(DimensionName::ALL.len());
    for name in DimensionName::ALL {
        let found = raw
            .dimensions
            .iter()
            .find(|d| DimensionName::from_label(&d.name) == Some(name))
            .ok_or_else(|| format!("missing dimension \"{}\"", name))?;
        dimensions.push(Dimension {
            name,
            score: clamp_score(found.score),
            reason: found.reason.clone().unwrap_or_default(),
        });
    }

    Ok(JudgeResult {
        overall: clamp_score(raw.overall),
        dimensions,
        edit_instructions: raw.edit_instructions.unwrap_or_default().trim().to_string(),
    })
}

/// JUDGE stage. Bumps the iteration count by one once a result is in hand.
pub async fn judge(ctx: StageContext<'_>, state: &SessionState) -> Result<StateUpdate, StoryError> {
    let story = state
        .story
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| StoryError::precondition(Stage::Judge, "no story to judge"))?;

    let age = state
        .refined_brief
        .as_ref()
        .map(|b| b.age)
        .unwrap_or(DEFAULT_AGE);

    let system = prompts::judge_system(&ctx.config.thresholds, &ctx.config.safety);
    let user = prompts::judge_user(age, story);

    let result = ctx
        .complete_json(Stage::Judge, &system, &user, JUDGE_TEMPERATURE, normalize)
        .await?;

    let iteration = state.iteration_count() + 1;
    tracing::info!(iteration, overall = result.overall, "Story judged");
    Ok(StateUpdate::judged(result, iteration))
}

// Integration tests for the story pipeline, driven by a scripted provider

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bedtime::config::constants::DEFAULT_TONE;
use bedtime::config::Config;
use bedtime::providers::{LlmProvider, ProviderRequest, ProviderResponse};
use bedtime::story::invoke::StageContext;
use bedtime::story::{judge, storyteller};
use bedtime::story::{RunRequest, SessionState, Stage, StoryEngine, StoryError};

/// Replays canned replies in order and records every request.
struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn ok(replies: Vec<String>) -> Arc<Self> {
        Self::new(replies.into_iter().map(Ok).collect())
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("script exhausted"))?;
        let content = reply.map_err(anyhow::Error::msg)?;
        Ok(ProviderResponse {
            id: "scripted".to_string(),
            model: "scripted-1".to_string(),
            content,
            stop_reason: Some("stop".to_string()),
            provider: "scripted".to_string(),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-1"
    }
}

fn brief_reply() -> String {
    format!(
        "Here is the brief:\n{}",
        json!({
            "topic": "A gentle trip to the moon",
            "age": 7,
            "setting": "a cozy bedroom and the moon",
            "main_characters": ["Mia", "a friendly star"],
            "moral": "Curiosity is wonderful when shared"
        })
    )
}

/// A safe story of `words` words whose first word identifies the draft.
fn story(tag: &str, words: usize) -> String {
    let mut parts = vec![tag.to_string()];
    parts.extend(std::iter::repeat("moon".to_string()).take(words - 1));
    parts.join(" ")
}

fn judge_reply(overall: f32, dimension: f32, edit: &str) -> String {
    let names = [
        "Age-fit",
        "Clarity",
        "Coherence",
        "Safety/Positivity",
        "Engagement",
        "Length-fit",
    ];
    let dimensions: Vec<_> = names
        .iter()
        .map(|name| json!({"name": name, "score": dimension, "reason": "ok"}))
        .collect();
    json!({
        "overall": overall,
        "dimensions": dimensions,
        "edit_instructions": edit
    })
    .to_string()
}

fn engine(provider: &Arc<ScriptedProvider>) -> StoryEngine {
    StoryEngine::new(provider.clone(), Config::default())
}

fn moon_request() -> RunRequest {
    RunRequest::new("a trip to the moon", 7).with_max_iterations(3)
}

fn user_text(request: &ProviderRequest) -> &str {
    request.last_user_text().unwrap_or_default()
}

#[tokio::test]
async fn test_scenario_passes_first_iteration() -> Result<()> {
    let draft = story("Once", 300);
    let provider = ScriptedProvider::ok(vec![
        brief_reply(),
        draft.clone(),
        judge_reply(8.5, 7.5, "Describe the stars."),
    ]);

    let outcome = engine(&provider).run(moon_request()).await?;

    assert_eq!(outcome.state.iteration_count(), 1);
    assert_eq!(outcome.final_story.as_deref(), Some(draft.as_str()));
    assert_eq!(outcome.state.final_story(), Some(draft.as_str()));
    assert!(outcome.state.safety_notes.is_none());

    let brief = outcome.state.refined_brief.as_ref().unwrap();
    assert_eq!(brief.age, 7);
    assert_eq!(brief.tone, DEFAULT_TONE);
    assert_eq!(brief.main_characters.len(), 2);

    let requests = provider.requests();
    assert_eq!(requests.len(), 3);
    let temps: Vec<_> = requests.iter().map(|r| r.temperature.unwrap()).collect();
    assert_eq!(temps, vec![0.3, 0.7, 0.1]);
    assert!(user_text(&requests[0]).starts_with("Raw topic: \"a trip to the moon\""));
    assert!(user_text(&requests[1]).contains("\"topic\": \"A gentle trip to the moon\""));
    assert!(user_text(&requests[2]).starts_with("Please evaluate the following story for ages 7"));
    assert!(requests.iter().all(|r| r.system.is_some()));
    Ok(())
}

#[tokio::test]
async fn test_scenario_revises_once_then_passes() -> Result<()> {
    let first = story("First", 300);
    let second = story("Second", 320);
    let provider = ScriptedProvider::ok(vec![
        brief_reply(),
        first.clone(),
        judge_reply(6.0, 6.5, "Add a cozy ending."),
        second.clone(),
        judge_reply(8.2, 7.0, ""),
    ]);

    let outcome = engine(&provider).run(moon_request()).await?;

    assert_eq!(outcome.state.iteration_count(), 2);
    assert_ne!(first, second);
    assert_eq!(outcome.final_story.as_deref(), Some(second.as_str()));

    let requests = provider.requests();
    assert_eq!(requests.len(), 5);
    let revision = &requests[3];
    assert_eq!(revision.temperature, Some(0.3));
    assert!(user_text(revision).contains("Edit instructions:\n\nAdd a cozy ending."));
    assert!(user_text(revision).contains(&first));
    Ok(())
}

#[tokio::test]
async fn test_scenario_iteration_cap_finalizes_failing_story() -> Result<()> {
    let first = story("First", 300);
    let second = story("Second", 300);
    let provider = ScriptedProvider::ok(vec![
        brief_reply(),
        first,
        judge_reply(5.0, 5.0, "Make it calmer."),
        second.clone(),
        judge_reply(5.0, 5.0, "Make it calmer still."),
        // Never requested: the cap stops the loop
        story("Third", 300),
    ]);

    let request = RunRequest::new("a trip to the moon", 7).with_max_iterations(2);
    let outcome = engine(&provider).run(request).await?;

    assert_eq!(outcome.state.iteration_count(), 2);
    assert_eq!(outcome.final_story.as_deref(), Some(second.as_str()));
    assert_eq!(outcome.state.judge_result.as_ref().unwrap().overall, 5.0);
    assert_eq!(provider.remaining(), 1);
    Ok(())
}

#[tokio::test]
async fn test_safety_violation_triggers_revision() -> Result<()> {
    let short = story("Short", 120);
    let good = story("Longer", 300);
    let provider = ScriptedProvider::ok(vec![
        brief_reply(),
        short,
        judge_reply(9.0, 9.0, "Lengthen the middle."),
        good.clone(),
        judge_reply(9.0, 9.0, ""),
    ]);

    let outcome = engine(&provider).run(moon_request()).await?;

    assert_eq!(outcome.state.iteration_count(), 2);
    assert_eq!(outcome.final_story.as_deref(), Some(good.as_str()));
    assert!(outcome.state.safety_notes.is_none());
    Ok(())
}

#[tokio::test]
async fn test_cap_keeps_outstanding_safety_notes() -> Result<()> {
    let provider = ScriptedProvider::ok(vec![
        brief_reply(),
        story("Tiny", 50),
        judge_reply(9.0, 9.0, "Lengthen it."),
    ]);

    let request = RunRequest::new("a trip to the moon", 7).with_max_iterations(1);
    let outcome = engine(&provider).run(request).await?;

    assert_eq!(outcome.state.iteration_count(), 1);
    assert_eq!(
        outcome.state.safety_notes.as_deref(),
        Some("Story too short: 50 words (minimum 200)")
    );
    assert!(outcome.final_story.is_some());
    Ok(())
}

#[tokio::test]
async fn test_malformed_brief_retried_once() -> Result<()> {
    let draft = story("Once", 300);
    let provider = ScriptedProvider::ok(vec![
        "Sure! A lovely moon story brief coming up.".to_string(),
        brief_reply(),
        draft.clone(),
        judge_reply(8.5, 8.0, ""),
    ]);

    let outcome = engine(&provider).run(moon_request()).await?;
    assert_eq!(outcome.final_story.as_deref(), Some(draft.as_str()));

    let requests = provider.requests();
    assert_eq!(requests.len(), 4);
    assert!(!user_text(&requests[0]).ends_with("Return STRICT JSON only."));
    assert!(user_text(&requests[1]).ends_with("\n\nReturn STRICT JSON only."));
    Ok(())
}

#[tokio::test]
async fn test_wrong_typed_brief_fields_take_defaults() -> Result<()> {
    let draft = story("Once", 300);
    let provider = ScriptedProvider::ok(vec![
        json!({"topic": "Moon", "age": "7", "main_characters": [{"name": "Mia"}]}).to_string(),
        draft.clone(),
        judge_reply(8.5, 8.0, ""),
    ]);

    let request = RunRequest::new("a trip to the moon", 6).with_max_iterations(3);
    let outcome = engine(&provider).run(request).await?;

    assert_eq!(outcome.final_story.as_deref(), Some(draft.as_str()));
    let brief = outcome.state.refined_brief.as_ref().unwrap();
    assert_eq!(brief.topic, "Moon");
    assert_eq!(brief.age, 6);
    assert!(brief.main_characters.is_empty());
    assert_eq!(provider.requests().len(), 3, "no strict-JSON retry");
    Ok(())
}

#[tokio::test]
async fn test_out_of_range_age_falls_back_to_default() -> Result<()> {
    let draft = story("Once", 300);
    let provider = ScriptedProvider::ok(vec![
        brief_reply(),
        draft.clone(),
        judge_reply(8.5, 8.0, ""),
    ]);

    let request = RunRequest::new("a trip to the moon", 42).with_max_iterations(3);
    let outcome = engine(&provider).run(request).await?;

    assert_eq!(outcome.state.age, 7);
    assert!(user_text(&provider.requests()[0]).contains("Age (5–10): 7"));
    Ok(())
}

#[tokio::test]
async fn test_second_malformed_judge_reply_is_fatal() {
    let provider = ScriptedProvider::ok(vec![
        brief_reply(),
        story("Once", 300),
        "The story is lovely, 9/10.".to_string(),
        r#"{"overall": 9.0, "dimensions": [{"name": "Clarity", "score": 9.0}]}"#.to_string(),
    ]);

    let err = engine(&provider).run(moon_request()).await.unwrap_err();
    assert!(matches!(
        err,
        StoryError::MalformedOutput {
            stage: Stage::Judge,
            ..
        }
    ));
    assert!(err.to_string().contains("missing dimension"));
    assert_eq!(provider.requests().len(), 4);
}

#[tokio::test]
async fn test_provider_failure_aborts_run() {
    let provider = ScriptedProvider::new(vec![
        Ok(brief_reply()),
        Err("503 Service Unavailable".to_string()),
    ]);

    let err = engine(&provider).run(moon_request()).await.unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Generate));
    assert!(err.to_string().contains("503 Service Unavailable"));
    // No retry on transport failures
    assert_eq!(provider.requests().len(), 2);
}

#[tokio::test]
async fn test_continuation_uses_reader_feedback() -> Result<()> {
    let draft = story("Once", 300);
    let first = ScriptedProvider::ok(vec![
        brief_reply(),
        draft.clone(),
        judge_reply(8.5, 8.0, "Describe the stars."),
    ]);
    let prior = engine(&first).run(moon_request()).await?.state;

    let revised = story("Revised", 310);
    let provider = ScriptedProvider::ok(vec![revised.clone(), judge_reply(8.8, 8.0, "")]);
    let request = moon_request().continuing(prior.clone(), Some("Add friendly dialogue.".into()));
    let outcome = engine(&provider).run(request).await?;

    let requests = provider.requests();
    assert_eq!(requests.len(), 2, "refinement is skipped on continuation");
    let prompt = user_text(&requests[0]);
    assert!(prompt.contains("Reader feedback:\n\nAdd friendly dialogue."));
    assert!(!prompt.contains("Describe the stars."));
    assert!(prompt.contains(&draft));

    assert_eq!(outcome.state.refined_brief, prior.refined_brief);
    assert_eq!(outcome.final_story.as_deref(), Some(revised.as_str()));
    assert!(outcome.state.feedback_request.is_none());
    assert_eq!(outcome.state.iteration_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_feedback_used_once_then_judge_instructions() -> Result<()> {
    let mut prior = SessionState::new("a trip to the moon", 7, None, 3);
    prior.refined_brief = Some(bedtime::story::default_brief("moon", 7, None));
    prior.story = Some(story("Prior", 300));

    let provider = ScriptedProvider::ok(vec![
        story("Feedback", 300),
        judge_reply(7.0, 7.0, "Trim the ending."),
        story("Judged", 300),
        judge_reply(8.5, 8.0, ""),
    ]);
    let request = moon_request().continuing(prior, Some("More sensory detail.".into()));
    let outcome = engine(&provider).run(request).await?;

    let requests = provider.requests();
    assert!(user_text(&requests[0]).contains("Reader feedback:\n\nMore sensory detail."));
    assert!(user_text(&requests[2]).contains("Edit instructions:\n\nTrim the ending."));
    assert_eq!(outcome.state.iteration_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_initial_generation_requires_brief() {
    let provider = ScriptedProvider::ok(vec![]);
    let config = Config::default();
    let state = SessionState::new("a trip to the moon", 7, None, 3);

    let err = storyteller::generate(StageContext::new(provider.as_ref(), &config), &state)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoryError::Precondition {
            stage: Stage::Generate,
            ..
        }
    ));
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn test_judge_requires_story_and_counts_iterations() -> Result<()> {
    let provider = ScriptedProvider::ok(vec![judge_reply(8.0, 8.0, "")]);
    let config = Config::default();
    let mut state = SessionState::new("a trip to the moon", 7, None, 3);
    let ctx = StageContext::new(provider.as_ref(), &config);

    let err = judge::judge(ctx, &state).await.unwrap_err();
    assert!(matches!(err, StoryError::Precondition { stage: Stage::Judge, .. }));

    state.story = Some(story("Once", 250));
    let update = judge::judge(ctx, &state).await?;
    assert_eq!(update.iteration_count, Some(1));
    state.apply(update);
    assert_eq!(state.iteration_count(), 1);
    // Default age without a brief
    assert!(user_text(&provider.requests()[0]).contains("for ages 7 "));
    Ok(())
}

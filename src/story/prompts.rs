// Prompt templates for the three model-backed stages
//
// Thresholds and word limits are injected from config so the controller,
// safety gate and prompts agree on the same numbers.

use crate::config::constants::*;
use crate::config::{QualityThresholds, SafetyLimits};

/// Appended to the user prompt on the single strict-JSON retry.
pub const STRICT_JSON_SUFFIX: &str = "\n\nReturn STRICT JSON only.";

/// Scoring calibration examples for the judge, embedded at compile time.
pub const JUDGE_CALIBRATION: &str = include_str!("judge_calibration.md");

fn quoted_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|s| format!("\"{}\"", s))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn refiner_system() -> String {
    format!(
        r#"You turn a messy story idea into a structured brief for a safe children's bedtime story (ages {min_age}–{max_age}).

Return STRICT JSON ONLY matching the schema below. No commentary, no explanation, no reasoning. Infer missing fields with child-safe defaults.

Schema (all keys required; use empty values if unknown):
{{
  "topic": "string",
  "age": 0,
  "tone": "string",
  "length_words": "string",
  "vocabulary_level": "string",
  "forbidden": ["string"],
  "moral": "string",
  "setting": "string",
  "main_characters": ["string"],
  "plot_beats": ["string"],
  "must": ["string"],
  "should": ["string"],
  "can": ["string"]
}}

Field notes: topic is short and cleaned up; age is an integer between {min_age} and {max_age}; moral is one gentle sentence or empty; setting is cozy and everyday unless the idea says otherwise; main_characters has 1–3 simple names or roles; plot_beats has 3–5 beats.

Defaults when the idea gives no hint:
tone: "{tone}"
length_words: "{length}"
vocabulary_level: "{vocabulary}"
forbidden: [{forbidden}]
plot_beats: [{beats}]
must: [{must}]
should: [{should}]
can: [{can}]

Return STRICT JSON only."#,
        min_age = MIN_AGE,
        max_age = MAX_AGE,
        tone = DEFAULT_TONE,
        length = DEFAULT_LENGTH_WORDS,
        vocabulary = DEFAULT_VOCABULARY_LEVEL,
        forbidden = quoted_list(DEFAULT_FORBIDDEN),
        beats = quoted_list(DEFAULT_PLOT_BEATS),
        must = quoted_list(DEFAULT_MUST),
        should = quoted_list(DEFAULT_SHOULD),
        can = quoted_list(DEFAULT_CAN),
    )
}

pub fn refiner_user(user_input: &str, age: u8, tone: Option<&str>) -> String {
    let mut prompt = format!("Raw topic: \"{}\"\nAge ({}–{}): {}", user_input, MIN_AGE, MAX_AGE, age);
    if let Some(tone) = tone.map(str::trim).filter(|t| !t.is_empty()) {
        prompt.push_str(&format!("\nPreferred tone (optional): \"{}\"", tone));
    }
    prompt
}

pub fn storyteller_system(limits: &SafetyLimits) -> String {
    format!(
        "You are a friendly children's storyteller for ages {}–{}.\n\n\
         Write vivid, simple, safe stories with a gentle positive lesson.\n\n\
         Target length: {} words.\n\n\
         Never include: violence, scary imagery, adult themes, blood, alcohol, drugs, \
         weapons, killing, dying, or graphic harm.\n\n\
         Use short paragraphs, concrete words and a warm, reassuring tone.\n\n\
         When given a structured brief, follow it precisely. When given edit instructions, \
         apply them faithfully while keeping the story safe, age-fit and within the length.\n\n\
         Output the story only, with no explanations.",
        MIN_AGE,
        MAX_AGE,
        limits.target_band(),
    )
}

pub fn initial_story_user(brief_json: &str) -> String {
    format!(
        "Create a children's story using this brief:\n\n\
         Brief (JSON):\n\n{}\n\n\
         Guidance:\n\n\
         Follow must strictly.\n\n\
         Aim to satisfy should.\n\n\
         Use can if it helps engagement without breaking safety or length.\n\n\
         Output only the story text.",
        brief_json
    )
}

/// Where a revision instruction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionSource {
    Reader,
    Judge,
}

impl InstructionSource {
    pub fn label(&self) -> &'static str {
        match self {
            InstructionSource::Reader => "Reader feedback",
            InstructionSource::Judge => "Edit instructions",
        }
    }
}

pub fn revision_user(
    source: InstructionSource,
    instruction: &str,
    story: &str,
    limits: &SafetyLimits,
) -> String {
    let label = source.label();
    format!(
        "Revise the following story according to these {}. \
         Keep it safe, age-fit, and {} words.\n\n\
         {}:\n\n{}\n\n\
         Original story:\n\n{}\n\n\
         Output only the revised story text.",
        label.to_lowercase(),
        limits.target_band(),
        label,
        instruction,
        story
    )
}

pub fn judge_system(thresholds: &QualityThresholds, limits: &SafetyLimits) -> String {
    format!(
        r#"You review children's stories for ages {min_age}–{max_age}.

Return STRICT JSON ONLY with exactly these keys and types. No text outside the JSON, no reasoning.
{{
  "overall": 0.0,
  "dimensions": [
    {{"name": "Age-fit", "score": 0.0, "reason": "string"}},
    {{"name": "Clarity", "score": 0.0, "reason": "string"}},
    {{"name": "Coherence", "score": 0.0, "reason": "string"}},
    {{"name": "Safety/Positivity", "score": 0.0, "reason": "string"}},
    {{"name": "Engagement", "score": 0.0, "reason": "string"}},
    {{"name": "Length-fit", "score": 0.0, "reason": "string"}}
  ],
  "edit_instructions": "string"
}}

All scores are floats from 0 to 10.

Scoring guidance:
Age-fit: vocabulary and concepts suit the reader's age.
Clarity: simple sentences, no jargon, easy to follow.
Coherence: clear beginning, middle and end; events flow; the resolution makes sense.
Safety/Positivity: no fear, violence or adult themes; reassuring tone; positive values.
Engagement: imaginative details, relatable characters, gentle wonder.
Length-fit: near {band} words; outside {min_words}–{max_words} lowers the score.

Edit instructions are concise, imperative and directly actionable (e.g. "Shorten the middle by about 80 words", "Use a simpler word than 'curiosity'"). Include safety corrections and length adjustments when needed.

{calibration}
Thresholds: the story is good enough when overall >= {overall:.1} AND every dimension >= {dimension:.1}. Otherwise your edit_instructions must make improvement possible in one revision.

Return STRICT JSON only."#,
        min_age = MIN_AGE,
        max_age = MAX_AGE,
        band = limits.target_band(),
        min_words = limits.min_words,
        max_words = limits.max_words,
        calibration = JUDGE_CALIBRATION,
        overall = thresholds.overall,
        dimension = thresholds.dimension,
    )
}

pub fn judge_user(age: u8, story: &str) -> String {
    format!(
        "Please evaluate the following story for ages {} and return JSON per the schema.\n\n{}",
        age, story
    )
}

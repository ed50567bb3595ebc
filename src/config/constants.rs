// Story-wide constants
//
// Centralised here so defaults, thresholds and word limits have one source of
// truth. Import via `use crate::config::constants::*;`.

/// Fallback age when the requested one is missing or outside 5–10.
pub const DEFAULT_AGE: u8 = 7;

/// Youngest supported reader age.
pub const MIN_AGE: u8 = 5;

/// Oldest supported reader age.
pub const MAX_AGE: u8 = 10;

/// Default iteration cap for the judge/revise loop (configurable 2–3).
pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

/// Overall judge score required to stop revising.
pub const OVERALL_THRESHOLD: f32 = 8.0;

/// Score every judge dimension must reach to stop revising.
pub const DIMENSION_THRESHOLD: f32 = 7.0;

/// Target story length band used in prompts.
pub const TARGET_WORDS_MIN: usize = 250;
pub const TARGET_WORDS_MAX: usize = 400;

/// Hard word-count limits enforced by the safety gate (target band ±20%).
pub const MIN_WORDS: usize = 200;
pub const MAX_WORDS: usize = 480;

/// Terms the safety gate rejects (case-insensitive substring match).
pub const BANNED_TERMS: &[&str] = &[
    "gun",
    "knife",
    "kill",
    "die",
    "alcohol",
    "drugs",
    "blood",
    "adult themes",
    "violence",
    "porn",
    "sexual content",
];

// Sampling temperatures per stage. Revision runs cooler than first drafts so
// the model sticks to the edit instruction.
pub const REFINE_TEMPERATURE: f32 = 0.3;
pub const INITIAL_STORY_TEMPERATURE: f32 = 0.7;
pub const REVISION_TEMPERATURE: f32 = 0.3;
pub const JUDGE_TEMPERATURE: f32 = 0.1;

/// Default maximum tokens per model request.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Default HTTP timeout for provider requests.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

// Brief defaults, used whenever the refiner model omits a field.
pub const DEFAULT_TONE: &str = "warm, positive, imaginative";
pub const DEFAULT_LENGTH_WORDS: &str = "250–400";
pub const DEFAULT_VOCABULARY_LEVEL: &str = "simple, concrete, grade 2–3";

pub const DEFAULT_FORBIDDEN: &[&str] = &[
    "violence",
    "scary imagery",
    "adult themes",
    "blood",
    "alcohol",
    "drugs",
    "gun",
    "knife",
    "kill",
    "die",
];

pub const DEFAULT_PLOT_BEATS: &[&str] = &[
    "Setup",
    "Challenge",
    "Helpful action",
    "Resolution",
    "Gentle moral",
];

pub const DEFAULT_MUST: &[&str] = &[
    "safe and positive",
    "age-appropriate vocabulary",
    "250–400 words",
    "no forbidden content",
];

pub const DEFAULT_SHOULD: &[&str] = &[
    "clear beginning–middle–end",
    "short paragraphs",
    "gentle moral",
];

pub const DEFAULT_CAN: &[&str] = &["light humor", "sensory details", "soft rhythm in sentences"];

/// Default OpenAI chat model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

/// Turn a constant list into owned strings.
pub fn owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

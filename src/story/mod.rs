// Bedtime story pipeline
//
// Brief builder → story generator → quality judge → safety gate → loop
// controller → finalizer. `StoryEngine::run` is the entry point.

pub mod brief;
pub mod engine;
pub mod error;
pub mod invoke;
pub mod judge;
pub mod json;
pub mod pipeline;
pub mod prompts;
pub mod safety;
pub mod state;
pub mod storyteller;
pub mod types;

pub use brief::default_brief;
pub use engine::{normalize_age, RunOutcome, RunRequest, StoryEngine};
pub use error::StoryError;
pub use json::{extract_json_object, JsonExtractError};
pub use pipeline::{decide, Decision, Route, RouteReason, Stage, PIPELINE};
pub use safety::word_count;
pub use state::{SessionState, StateUpdate};
pub use types::{Brief, Dimension, DimensionName, JudgeResult};

// Brief builder: raw seed idea → structured, schema-complete brief

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use super::error::StoryError;
use super::invoke::StageContext;
use super::pipeline::Stage;
use super::prompts;
use super::state::{SessionState, StateUpdate};
use super::types::Brief;
use crate::config::constants::*;

/// Brief as the model returns it. A missing field or one of the wrong type
/// is `None` and takes its default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBrief {
    #[serde(deserialize_with = "lenient")]
    topic: Option<String>,
    #[serde(deserialize_with = "lenient")]
    age: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    tone: Option<String>,
    #[serde(deserialize_with = "lenient")]
    length_words: Option<String>,
    #[serde(deserialize_with = "lenient")]
    vocabulary_level: Option<String>,
    #[serde(deserialize_with = "lenient")]
    forbidden: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    moral: Option<String>,
    #[serde(deserialize_with = "lenient")]
    setting: Option<String>,
    #[serde(deserialize_with = "lenient")]
    main_characters: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    plot_beats: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    must: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    should: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    can: Option<Vec<String>>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// A brief built purely from defaults.
pub fn default_brief(topic: &str, age: u8, tone: Option<&str>) -> Brief {
    fill_defaults(RawBrief::default(), topic, age, tone)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_empty(list: Option<Vec<String>>) -> Option<Vec<String>> {
    list.filter(|l| !l.is_empty())
}

fn fill_defaults(raw: RawBrief, topic: &str, age: u8, tone: Option<&str>) -> Brief {
    let age = raw
        .age
        .and_then(|a| u8::try_from(a).ok())
        .filter(|a| (MIN_AGE..=MAX_AGE).contains(a))
        .unwrap_or(age);

    let tone = non_blank(raw.tone)
        .or_else(|| non_blank(tone.map(str::to_string)))
        .unwrap_or_else(|| DEFAULT_TONE.to_string());

    Brief {
        topic: non_blank(raw.topic).unwrap_or_else(|| topic.trim().to_string()),
        age,
        tone,
        length_words: non_blank(raw.length_words)
            .unwrap_or_else(|| DEFAULT_LENGTH_WORDS.to_string()),
        vocabulary_level: non_blank(raw.vocabulary_level)
            .unwrap_or_else(|| DEFAULT_VOCABULARY_LEVEL.to_string()),
        forbidden: non_empty(raw.forbidden).unwrap_or_else(|| owned_list(DEFAULT_FORBIDDEN)),
        moral: raw.moral.unwrap_or_default(),
        setting: raw.setting.unwrap_or_default(),
        main_characters: raw.main_characters.unwrap_or_default(),
        plot_beats: non_empty(raw.plot_beats).unwrap_or_else(|| owned_list(DEFAULT_PLOT_BEATS)),
        must: non_empty(raw.must).unwrap_or_else(|| owned_list(DEFAULT_MUST)),
        should: non_empty(raw.should).unwrap_or_else(|| owned_list(DEFAULT_SHOULD)),
        can: non_empty(raw.can).unwrap_or_else(|| owned_list(DEFAULT_CAN)),
    }
}

/// REFINE stage. Always asks the model, even though every field has a default.
pub async fn refine(ctx: StageContext<'_>, state: &SessionState) -> Result<StateUpdate, StoryError> {
    let tone = state.tone.as_deref();
    let system = prompts::refiner_system();
    let user = prompts::refiner_user(state.user_input(), state.age, tone);

    let brief = ctx
        .complete_json(Stage::Refine, &system, &user, REFINE_TEMPERATURE, |raw: RawBrief| {
            Ok(fill_defaults(raw, state.user_input(), state.age, tone))
        })
        .await?;

    tracing::debug!(topic = %brief.topic, age = brief.age, "Brief refined");
    Ok(StateUpdate::brief(brief))
}

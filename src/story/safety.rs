// Safety gate: local word-count and banned-term checks, no model call

use super::state::{SessionState, StateUpdate};
use crate::config::SafetyLimits;

pub const NO_STORY: &str = "No story to check";

/// Whitespace-delimited word count.
pub fn word_count(story: &str) -> usize {
    story.split_whitespace().count()
}

/// Check a story against `limits`.
///
/// Returns `None` when the story passes. Otherwise one message per failed
/// check, length first, joined with "; ". A missing story is a violation.
pub fn check(story: Option<&str>, limits: &SafetyLimits) -> Option<String> {
    let Some(story) = story.filter(|s| !s.is_empty()) else {
        return Some(NO_STORY.to_string());
    };

    let mut violations = Vec::new();

    let words = word_count(story);
    if words < limits.min_words {
        violations.push(format!(
            "Story too short: {} words (minimum {})",
            words, limits.min_words
        ));
    } else if words > limits.max_words {
        violations.push(format!(
            "Story too long: {} words (maximum {})",
            words, limits.max_words
        ));
    }

    let lowered = story.to_lowercase();
    let found: Vec<&str> = limits
        .banned_terms
        .iter()
        .filter(|term| lowered.contains(&term.to_lowercase()))
        .map(String::as_str)
        .collect();
    if !found.is_empty() {
        violations.push(format!("Banned terms found: {}", found.join(", ")));
    }

    if violations.is_empty() {
        None
    } else {
        Some(violations.join("; "))
    }
}

/// SAFETY stage.
pub fn safety_check(state: &SessionState, limits: &SafetyLimits) -> StateUpdate {
    let notes = check(state.story.as_deref(), limits);
    match &notes {
        Some(notes) => tracing::info!(%notes, "Safety check flagged story"),
        None => tracing::debug!("Safety check passed"),
    }
    StateUpdate::safety(notes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["moon"; n].join(" ")
    }

    fn limits() -> SafetyLimits {
        SafetyLimits::default()
    }

    #[test]
    fn test_word_count_boundaries() {
        assert_eq!(check(Some(&words(200)), &limits()), None);
        assert_eq!(
            check(Some(&words(199)), &limits()).as_deref(),
            Some("Story too short: 199 words (minimum 200)")
        );
        assert_eq!(check(Some(&words(480)), &limits()), None);
        assert_eq!(
            check(Some(&words(481)), &limits()).as_deref(),
            Some("Story too long: 481 words (maximum 480)")
        );
    }

    #[test]
    fn test_banned_terms_case_insensitive() {
        let lower = format!("{} gun", words(250));
        let upper = format!("{} GUN", words(250));
        assert_eq!(check(Some(&lower), &limits()), check(Some(&upper), &limits()));
        assert_eq!(
            check(Some(&upper), &limits()).as_deref(),
            Some("Banned terms found: gun")
        );
    }

    #[test]
    fn test_substring_match_and_order() {
        // "diet" contains "die"; both length and terms flagged, length first
        let story = "A knife and a diet plan.";
        assert_eq!(
            check(Some(story), &limits()).as_deref(),
            Some("Story too short: 6 words (minimum 200); Banned terms found: knife, die")
        );
    }

    #[test]
    fn test_whitespace_runs_count_once() {
        assert_eq!(word_count("  one\ttwo\n\nthree  "), 3);
    }

    #[test]
    fn test_missing_story_is_a_violation() {
        assert_eq!(check(None, &limits()).as_deref(), Some(NO_STORY));
        assert_eq!(check(Some(""), &limits()).as_deref(), Some(NO_STORY));
    }

    #[test]
    fn test_check_is_idempotent() {
        let story = format!("{} blood", words(100));
        assert_eq!(check(Some(&story), &limits()), check(Some(&story), &limits()));
    }

    #[test]
    fn test_stage_update_sets_notes() {
        let mut state = SessionState::new("moon", 7, None, 3);
        state.story = Some(words(300));
        assert_eq!(safety_check(&state, &limits()), StateUpdate::safety(None));
    }
}

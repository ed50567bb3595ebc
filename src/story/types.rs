// Story pipeline data types: the structured brief and the judge's verdict.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured specification of the story to write, produced by the brief
/// builder. Every field is always populated (defaults fill the gaps).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brief {
    pub topic: String,
    pub age: u8,
    pub tone: String,
    pub length_words: String,
    pub vocabulary_level: String,
    pub forbidden: Vec<String>,
    pub moral: String,
    pub setting: String,
    pub main_characters: Vec<String>,
    pub plot_beats: Vec<String>,
    /// Hard constraints
    pub must: Vec<String>,
    /// Soft quality targets
    pub should: Vec<String>,
    /// Optional enhancements
    pub can: Vec<String>,
}

/// The six fixed quality axes the judge scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimensionName {
    #[serde(rename = "Age-fit")]
    AgeFit,
    #[serde(rename = "Clarity")]
    Clarity,
    #[serde(rename = "Coherence")]
    Coherence,
    #[serde(rename = "Safety/Positivity")]
    SafetyPositivity,
    #[serde(rename = "Engagement")]
    Engagement,
    #[serde(rename = "Length-fit")]
    LengthFit,
}

impl DimensionName {
    /// All dimensions in the order the judge reports them.
    pub const ALL: [DimensionName; 6] = [
        DimensionName::AgeFit,
        DimensionName::Clarity,
        DimensionName::Coherence,
        DimensionName::SafetyPositivity,
        DimensionName::Engagement,
        DimensionName::LengthFit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::AgeFit => "Age-fit",
            Self::Clarity => "Clarity",
            Self::Coherence => "Coherence",
            Self::SafetyPositivity => "Safety/Positivity",
            Self::Engagement => "Engagement",
            Self::LengthFit => "Length-fit",
        }
    }

    /// Lenient lookup: ignores case, spaces and punctuation, so
    /// "safety / positivity" and "AGE FIT" both resolve.
    pub fn from_label(label: &str) -> Option<Self> {
        let key: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL.into_iter().find(|d| {
            let candidate: String = d
                .label()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .map(|c| c.to_ascii_lowercase())
                .collect();
            candidate == key
        })
    }
}

impl fmt::Display for DimensionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One scored dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: DimensionName,
    /// 0–10
    pub score: f32,
    #[serde(default)]
    pub reason: String,
}

/// Judge verdict for one draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeResult {
    /// 0–10
    pub overall: f32,
    /// Exactly six entries, in `DimensionName::ALL` order
    pub dimensions: Vec<Dimension>,
    pub edit_instructions: String,
}

impl JudgeResult {
    /// Score for a single dimension.
    pub fn score(&self, name: DimensionName) -> Option<f32> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.score)
    }

    /// First dimension (in report order) scoring below `threshold`.
    pub fn first_below(&self, threshold: f32) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.score < threshold)
    }

    /// The edit instruction, if it carries any text.
    pub fn edit_instruction(&self) -> Option<&str> {
        let text = self.edit_instructions.trim();
        (!text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_from_label_is_lenient() {
        assert_eq!(DimensionName::from_label("Age-fit"), Some(DimensionName::AgeFit));
        assert_eq!(DimensionName::from_label("age fit"), Some(DimensionName::AgeFit));
        assert_eq!(
            DimensionName::from_label("Safety / Positivity"),
            Some(DimensionName::SafetyPositivity)
        );
        assert_eq!(DimensionName::from_label("LENGTH_FIT"), Some(DimensionName::LengthFit));
        assert_eq!(DimensionName::from_label("Humor"), None);
    }

    #[test]
    fn test_dimension_serializes_as_label() {
        let json = serde_json::to_string(&DimensionName::SafetyPositivity).unwrap();
        assert_eq!(json, "\"Safety/Positivity\"");
    }

    #[test]
    fn test_first_below_and_edit_instruction() {
        let result = JudgeResult {
            overall: 8.1,
            dimensions: DimensionName::ALL
                .into_iter()
                .map(|name| Dimension {
                    name,
                    score: if name == DimensionName::Engagement { 6.5 } else { 8.0 },
                    reason: String::new(),
                })
                .collect(),
            edit_instructions: "   ".to_string(),
        };
        assert_eq!(
            result.first_below(7.0).map(|d| d.name),
            Some(DimensionName::Engagement)
        );
        assert_eq!(result.score(DimensionName::Clarity), Some(8.0));
        assert!(result.edit_instruction().is_none());
    }
}

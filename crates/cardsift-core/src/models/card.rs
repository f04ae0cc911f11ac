use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single question/answer flashcard as handed over by the card store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub question: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub answer: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,

    #[serde(
        default,
        rename = "qualityAttributes",
        skip_serializing_if = "Option::is_none"
    )]
    pub quality: Option<QualityAttributes>,
}

/// Review-state signals that make a card worth keeping over a duplicate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAttributes {
    #[serde(default)]
    pub stability_present: bool,

    #[serde(default)]
    pub difficulty_present: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Card {
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answer: answer.into(),
            category: None,
            sub_category: None,
            quality: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_sub_category(mut self, sub_category: impl Into<String>) -> Self {
        self.sub_category = Some(sub_category.into());
        self
    }

    pub fn with_quality(mut self, quality: QualityAttributes) -> Self {
        self.quality = Some(quality);
        self
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_optional_fields_default_to_absent() {
        let card: Card = serde_json::from_str(r#"{"id":"c1"}"#).unwrap();
        assert_eq!(card.id, "c1");
        assert!(card.question.is_empty());
        assert!(card.answer.is_empty());
        assert!(card.category.is_none());
        assert!(card.quality.is_none());
    }

    #[test]
    fn null_text_fields_become_empty() {
        let card: Card =
            serde_json::from_str(r#"{"id":"c2","question":null,"answer":"Paris"}"#).unwrap();
        assert_eq!(card.question, "");
        assert_eq!(card.answer, "Paris");
    }

    #[test]
    fn camel_case_wire_names() {
        let json = r#"{
            "id": "c3",
            "question": "Q",
            "answer": "A",
            "subCategory": "Europe",
            "qualityAttributes": {
                "stabilityPresent": true,
                "lastUpdated": "2024-05-01T12:00:00Z"
            }
        }"#;
        let card: Card = serde_json::from_str(json).unwrap();
        assert_eq!(card.sub_category.as_deref(), Some("Europe"));
        let quality = card.quality.unwrap();
        assert!(quality.stability_present);
        assert!(!quality.difficulty_present);
        assert!(quality.last_updated.is_some());
    }

    #[test]
    fn serialization_skips_absent_fields() {
        let card = Card::new("c4", "Q", "A").with_category("Geography");
        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["category"], "Geography");
        assert!(value.get("subCategory").is_none());
        assert!(value.get("qualityAttributes").is_none());
    }
}

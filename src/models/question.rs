// src/models/question.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Difficulty values accepted when authoring a question.
pub const DIFFICULTIES: [&str; 3] = ["easy", "medium", "hard"];

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// The statement shown to the candidate.
    pub text: String,

    /// Alternatives in display order; position encodes the label (A, B, C...).
    /// Stored as a JSON array in the database.
    pub alternatives: Json<Vec<String>>,

    /// Issuing board, e.g. "CESPE" or "FGV".
    pub exam_board: String,

    pub subject: String,

    /// One of `DIFFICULTIES`.
    pub difficulty: String,

    pub year: i32,

    pub created_at: DateTime<Utc>,
}

/// Copy of a question embedded in an exam.
///
/// Decoupled from the `questions` table: editing or deleting the source row
/// leaves every exam that already holds a snapshot untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSnapshot {
    pub id: i64,
    pub text: String,
    pub alternatives: Vec<String>,
    pub exam_board: String,
    pub subject: String,
    pub difficulty: String,
    pub year: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&Question> for QuestionSnapshot {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id,
            text: question.text.clone(),
            alternatives: question.alternatives.0.clone(),
            exam_board: question.exam_board.clone(),
            subject: question.subject.clone(),
            difficulty: question.difficulty.clone(),
            year: question.year,
            created_at: question.created_at,
        }
    }
}

/// Conjunctive filter over the question bank.
///
/// `None` means "no constraint on that dimension". Matching is exact and
/// case-sensitive, so an unknown board simply matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub exam_board: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default, deserialize_with = "deserialize_year")]
    pub year: Option<i32>,
}

impl FilterSpec {
    /// Drops empty values. Select boxes send `""` for "all", which must not
    /// be read as "match the empty string".
    pub fn normalized(self) -> Self {
        fn non_empty(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        Self {
            exam_board: non_empty(self.exam_board),
            subject: non_empty(self.subject),
            difficulty: non_empty(self.difficulty),
            year: self.year,
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.exam_board.is_none()
            && self.subject.is_none()
            && self.difficulty.is_none()
            && self.year.is_none()
    }

    pub fn matches(&self, question: &Question) -> bool {
        self.exam_board
            .as_deref()
            .is_none_or(|board| board == question.exam_board)
            && self
                .subject
                .as_deref()
                .is_none_or(|subject| subject == question.subject)
            && self
                .difficulty
                .as_deref()
                .is_none_or(|difficulty| difficulty == question.difficulty)
            && self.year.is_none_or(|year| year == question.year)
    }
}

/// Accepts the year as a JSON number, a numeric string (query strings) or an
/// empty string (treated as absent).
fn deserialize_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawYear {
        Number(i32),
        Text(String),
    }

    match Option::<RawYear>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawYear::Number(year)) => Ok(Some(year)),
        Some(RawYear::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawYear::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid year '{}'", text))),
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
    #[validate(custom(function = validate_alternatives))]
    pub alternatives: Vec<String>,
    #[validate(length(min = 1, max = 50))]
    pub exam_board: String,
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
    #[validate(custom(function = validate_difficulty))]
    pub difficulty: String,
    #[validate(range(min = 1950, max = 2100))]
    pub year: i32,
}

/// A validated question ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub text: String,
    pub alternatives: Vec<String>,
    pub exam_board: String,
    pub subject: String,
    pub difficulty: String,
    pub year: i32,
}

impl From<CreateQuestionRequest> for NewQuestion {
    fn from(req: CreateQuestionRequest) -> Self {
        Self {
            text: req.text,
            alternatives: req.alternatives,
            exam_board: req.exam_board,
            subject: req.subject,
            difficulty: req.difficulty,
            year: req.year,
        }
    }
}

fn validate_alternatives(alternatives: &[String]) -> Result<(), validator::ValidationError> {
    if alternatives.len() < 2 {
        return Err(validator::ValidationError::new("too_few_alternatives"));
    }
    if alternatives.len() > 10 {
        return Err(validator::ValidationError::new("too_many_alternatives"));
    }
    for alt in alternatives {
        if alt.trim().is_empty() {
            return Err(validator::ValidationError::new("alternative_cannot_be_empty"));
        }
        if alt.len() > 1000 {
            return Err(validator::ValidationError::new("alternative_too_long"));
        }
    }
    Ok(())
}

fn validate_difficulty(difficulty: &str) -> Result<(), validator::ValidationError> {
    if DIFFICULTIES.contains(&difficulty) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("unknown_difficulty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(board: &str, subject: &str, difficulty: &str, year: i32) -> Question {
        Question {
            id: 1,
            text: "Enunciado".to_string(),
            alternatives: Json(vec!["Certo".to_string(), "Errado".to_string()]),
            exam_board: board.to_string(),
            subject: subject.to_string(),
            difficulty: difficulty.to_string(),
            year,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = FilterSpec::default();
        assert!(filter.is_unconstrained());
        assert!(filter.matches(&question("FGV", "Direito Civil", "hard", 2021)));
    }

    #[test]
    fn filter_is_conjunctive_and_case_sensitive() {
        let filter = FilterSpec {
            exam_board: Some("CESPE".to_string()),
            subject: Some("Direito Penal".to_string()),
            ..Default::default()
        };

        assert!(filter.matches(&question("CESPE", "Direito Penal", "easy", 2022)));
        assert!(!filter.matches(&question("CESPE", "Direito Civil", "easy", 2022)));
        assert!(!filter.matches(&question("cespe", "Direito Penal", "easy", 2022)));
    }

    #[test]
    fn filter_on_year() {
        let filter = FilterSpec {
            year: Some(2023),
            ..Default::default()
        };
        assert!(filter.matches(&question("FGV", "Direito Civil", "hard", 2023)));
        assert!(!filter.matches(&question("FGV", "Direito Civil", "hard", 2022)));
    }

    #[test]
    fn normalized_drops_empty_strings() {
        let filter = FilterSpec {
            exam_board: Some(String::new()),
            subject: Some("Direito Penal".to_string()),
            difficulty: Some(String::new()),
            year: None,
        }
        .normalized();

        assert_eq!(filter.exam_board, None);
        assert_eq!(filter.subject.as_deref(), Some("Direito Penal"));
        assert_eq!(filter.difficulty, None);
    }

    #[test]
    fn year_accepts_number_string_and_empty() {
        let from_number: FilterSpec = serde_json::from_str(r#"{"year": 2021}"#).unwrap();
        assert_eq!(from_number.year, Some(2021));

        let from_text: FilterSpec = serde_json::from_str(r#"{"year": "2022"}"#).unwrap();
        assert_eq!(from_text.year, Some(2022));

        let from_empty: FilterSpec = serde_json::from_str(r#"{"year": ""}"#).unwrap();
        assert_eq!(from_empty.year, None);

        let missing: FilterSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(missing, FilterSpec::default());

        assert!(serde_json::from_str::<FilterSpec>(r#"{"year": "abc"}"#).is_err());
    }

    #[test]
    fn snapshot_copies_alternatives_in_order() {
        let source = question("CESPE", "Direito Penal", "medium", 2020);
        let snapshot = QuestionSnapshot::from(&source);
        assert_eq!(snapshot.alternatives, vec!["Certo", "Errado"]);
        assert_eq!(snapshot.id, source.id);
    }

    #[test]
    fn create_request_validation() {
        let valid = CreateQuestionRequest {
            text: "Qual a pena?".to_string(),
            alternatives: vec!["A".to_string(), "B".to_string()],
            exam_board: "FGV".to_string(),
            subject: "Direito Penal".to_string(),
            difficulty: "medium".to_string(),
            year: 2022,
        };
        assert!(valid.validate().is_ok());

        let single_alternative = CreateQuestionRequest {
            alternatives: vec!["A".to_string()],
            ..valid_clone(&valid)
        };
        assert!(single_alternative.validate().is_err());

        let bad_difficulty = CreateQuestionRequest {
            difficulty: "medio".to_string(),
            ..valid_clone(&valid)
        };
        assert!(bad_difficulty.validate().is_err());
    }

    fn valid_clone(req: &CreateQuestionRequest) -> CreateQuestionRequest {
        CreateQuestionRequest {
            text: req.text.clone(),
            alternatives: req.alternatives.clone(),
            exam_board: req.exam_board.clone(),
            subject: req.subject.clone(),
            difficulty: req.difficulty.clone(),
            year: req.year,
        }
    }
}

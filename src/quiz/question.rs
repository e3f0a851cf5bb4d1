//! Question and answer model.
//!
//! `Question` is the validated form used by the engine: its input kind is a
//! closed enum, so every renderer match is exhaustive. `QuestionDef` is the
//! loose authoring shape (a `type` string plus optional fields) that quiz
//! definitions are written in; converting it is where unsupported types are
//! caught.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::QuizError;

/// One selectable option of a `select` or `radio` question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub value: String,
    pub label: String,
}

impl QuestionOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// The input kind of a question, with the fields each kind needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    Textarea {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    Select {
        options: Vec<QuestionOption>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    Radio {
        options: Vec<QuestionOption>,
    },
    Date,
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
}

impl QuestionKind {
    /// The authoring tag for this kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Textarea { .. } => "textarea",
            Self::Select { .. } => "select",
            Self::Radio { .. } => "radio",
            Self::Date => "date",
            Self::Number { .. } => "number",
        }
    }

    /// Options for kinds that have them.
    pub fn options(&self) -> &[QuestionOption] {
        match self {
            Self::Select { options, .. } | Self::Radio { options } => options,
            _ => &[],
        }
    }
}

/// A single quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub required: bool,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

impl Question {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        required: bool,
        kind: QuestionKind,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            required,
            kind,
        }
    }

    /// Required yes/no radio question, the shape most of the diagnosis uses.
    pub fn yes_no(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(
            id,
            text,
            true,
            QuestionKind::Radio {
                options: vec![QuestionOption::new("si", "Sí"), QuestionOption::new("no", "No")],
            },
        )
    }
}

/// Raw question definition as authored in JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionDef {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Option<Vec<QuestionOption>>,
    #[serde(default)]
    pub placeholder: Option<String>,
}

impl TryFrom<QuestionDef> for Question {
    type Error = QuizError;

    fn try_from(def: QuestionDef) -> Result<Self, Self::Error> {
        let QuestionDef {
            id,
            text,
            type_name,
            required,
            options,
            placeholder,
        } = def;

        let require_options = |options: Option<Vec<QuestionOption>>| match options {
            Some(opts) if !opts.is_empty() => Ok(opts),
            _ => Err(QuizError::MissingOptions {
                id: id.clone(),
                type_name: type_name.clone(),
            }),
        };

        let kind = match type_name.as_str() {
            "text" => QuestionKind::Text { placeholder },
            "textarea" => QuestionKind::Textarea { placeholder },
            "select" => QuestionKind::Select {
                options: require_options(options)?,
                placeholder,
            },
            "radio" => QuestionKind::Radio {
                options: require_options(options)?,
            },
            "date" => QuestionKind::Date,
            "number" => QuestionKind::Number { placeholder },
            other => {
                tracing::error!(question_id = %id, question_type = other, "Unsupported question type");
                return Err(QuizError::UnsupportedType {
                    id,
                    type_name: other.to_string(),
                });
            }
        };

        Ok(Question {
            id,
            text,
            required,
            kind,
        })
    }
}

/// Parse a JSON array of question definitions into validated questions.
///
/// Fails on the first unsupported type, missing options, or duplicate id.
pub fn parse_questions(json: &str) -> Result<Vec<Question>, QuizError> {
    let defs: Vec<QuestionDef> = serde_json::from_str(json)?;
    let mut seen = HashSet::new();
    let mut questions = Vec::with_capacity(defs.len());
    for def in defs {
        if !seen.insert(def.id.clone()) {
            return Err(QuizError::DuplicateId { id: def.id });
        }
        questions.push(Question::try_from(def)?);
    }
    Ok(questions)
}

/// An answer value: free text / option value, or a checkbox flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Flag(bool),
    Text(String),
}

impl AnswerValue {
    /// Whether the answer counts as absent for a required question.
    /// Empty strings and unchecked flags are both treated as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Flag(b) => !b,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Flag(_) => None,
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for AnswerValue {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

/// Answers keyed by question id.
pub type AnswerSet = BTreeMap<String, AnswerValue>;

/// Look up a text answer, treating flags and missing answers as `None`.
pub fn answer_text<'a>(answers: &'a AnswerSet, id: &str) -> Option<&'a str> {
    answers.get(id).and_then(AnswerValue::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_serializes_with_type_tag() {
        let q = Question::yes_no("q1", "¿Pregunta?");
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["type"], "radio");
        assert_eq!(json["id"], "q1");
        assert_eq!(json["options"][0]["value"], "si");
    }

    #[test]
    fn parse_valid_definitions() {
        let json = r#"[
            {"id": "name", "text": "Nombre", "type": "text", "required": true, "placeholder": "Tu nombre"},
            {"id": "city", "text": "Ciudad", "type": "select", "options": [{"value": "bog", "label": "Bogotá"}]},
            {"id": "when", "text": "Fecha", "type": "date"}
        ]"#;
        let questions = parse_questions(json).unwrap();
        assert_eq!(questions.len(), 3);
        assert!(questions[0].required);
        assert_eq!(questions[1].kind.options().len(), 1);
        assert_eq!(questions[2].kind, QuestionKind::Date);
    }

    #[test]
    fn unsupported_type_is_rejected() {
        let json = r#"[{"id": "x", "text": "?", "type": "slider"}]"#;
        let err = parse_questions(json).unwrap_err();
        assert!(matches!(
            err,
            QuizError::UnsupportedType { ref type_name, .. } if type_name == "slider"
        ));
    }

    #[test]
    fn radio_without_options_is_rejected() {
        let json = r#"[{"id": "x", "text": "?", "type": "radio", "options": []}]"#;
        assert!(matches!(
            parse_questions(json),
            Err(QuizError::MissingOptions { .. })
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let json = r#"[
            {"id": "a", "text": "?", "type": "text"},
            {"id": "a", "text": "?", "type": "number"}
        ]"#;
        assert!(matches!(
            parse_questions(json),
            Err(QuizError::DuplicateId { .. })
        ));
    }

    #[test]
    fn answer_emptiness() {
        assert!(AnswerValue::from("").is_empty());
        assert!(AnswerValue::from(false).is_empty());
        assert!(!AnswerValue::from("si").is_empty());
        assert!(!AnswerValue::from(true).is_empty());
    }

    #[test]
    fn answer_value_untagged_serde() {
        let text: AnswerValue = serde_json::from_str("\"si\"").unwrap();
        assert_eq!(text, AnswerValue::Text("si".into()));
        let flag: AnswerValue = serde_json::from_str("true").unwrap();
        assert_eq!(flag, AnswerValue::Flag(true));
    }
}

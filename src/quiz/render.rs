//! Input views: what the front end should draw for a question, with the
//! current answer filled in. One builder per question kind.

use serde::Serialize;

use super::question::{AnswerSet, Question, QuestionKind, QuestionOption, answer_text};

/// Placeholder shown in an empty select.
pub const SELECT_PLACEHOLDER: &str = "Selecciona una opción...";

/// Rows for textarea inputs.
const TEXTAREA_ROWS: u8 = 4;

/// A radio choice with its checked state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RadioChoice {
    pub value: String,
    pub label: String,
    pub checked: bool,
}

/// Concrete input widget description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum InputView {
    TextInput {
        value: String,
        placeholder: String,
    },
    TextArea {
        value: String,
        placeholder: String,
        rows: u8,
    },
    Select {
        value: String,
        placeholder: String,
        options: Vec<QuestionOption>,
    },
    Radio {
        choices: Vec<RadioChoice>,
    },
    Date {
        value: String,
    },
    Number {
        value: String,
        placeholder: String,
    },
}

/// A question ready to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedQuestion {
    pub id: String,
    pub text: String,
    pub required: bool,
    pub input: InputView,
}

pub fn render_question(question: &Question, answers: &AnswerSet) -> RenderedQuestion {
    RenderedQuestion {
        id: question.id.clone(),
        text: question.text.clone(),
        required: question.required,
        input: render_input(question, answers),
    }
}

pub fn render_input(question: &Question, answers: &AnswerSet) -> InputView {
    let value = answer_text(answers, &question.id).unwrap_or_default().to_string();
    let placeholder = |p: &Option<String>| p.clone().unwrap_or_default();

    match &question.kind {
        QuestionKind::Text { placeholder: p } => InputView::TextInput {
            value,
            placeholder: placeholder(p),
        },
        QuestionKind::Textarea { placeholder: p } => InputView::TextArea {
            value,
            placeholder: placeholder(p),
            rows: TEXTAREA_ROWS,
        },
        QuestionKind::Select {
            options,
            placeholder: p,
        } => InputView::Select {
            value,
            placeholder: p.clone().unwrap_or_else(|| SELECT_PLACEHOLDER.to_string()),
            options: options.clone(),
        },
        QuestionKind::Radio { options } => InputView::Radio {
            choices: options
                .iter()
                .map(|opt| RadioChoice {
                    value: opt.value.clone(),
                    label: opt.label.clone(),
                    checked: opt.value == value,
                })
                .collect(),
        },
        QuestionKind::Date => InputView::Date { value },
        QuestionKind::Number { placeholder: p } => InputView::Number {
            value,
            placeholder: placeholder(p),
        },
    }
}

//! Quiz engine: one question at a time, with validation and an answer
//! accumulator. Any question sequence can be loaded; loading a different
//! sequence resets the engine.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::question::{AnswerSet, AnswerValue, Question};
use super::render::{RenderedQuestion, render_question};
use crate::error::QuizError;

/// Error shown when a required question is left empty.
pub const REQUIRED_ANSWER_MESSAGE: &str = "Por favor, responde esta pregunta para continuar.";

/// Outcome of [`QuizEngine::handle_next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizStep {
    /// Moved to the question at this index.
    Advanced(usize),
    /// The current question is required and unanswered; nothing moved.
    Blocked,
    /// The last question was confirmed; carries every collected answer.
    Submitted(AnswerSet),
    /// The engine has no questions loaded.
    Empty,
}

/// Quiz cursor state.
#[derive(Debug, Clone)]
pub struct QuizEngine {
    questions: Arc<[Question]>,
    index: usize,
    answers: AnswerSet,
    error: Option<String>,
}

impl QuizEngine {
    pub fn new(questions: Arc<[Question]>) -> Self {
        Self {
            questions,
            index: 0,
            answers: AnswerSet::new(),
            error: None,
        }
    }

    /// Load a question sequence. A sequence with a different identity than
    /// the current one resets the cursor, answers, and error; reloading the
    /// same sequence keeps progress.
    pub fn load(&mut self, questions: Arc<[Question]>) {
        if Arc::ptr_eq(&self.questions, &questions) {
            return;
        }
        self.questions = questions;
        self.reset();
    }

    /// Back to the first question with no answers.
    pub fn reset(&mut self) {
        self.index = 0;
        self.answers.clear();
        self.error = None;
    }

    pub fn questions(&self) -> &Arc<[Question]> {
        &self.questions
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.questions.len()
    }

    /// `(1-based position, total)` for progress display.
    pub fn progress(&self) -> (usize, usize) {
        (self.index + 1, self.questions.len())
    }

    /// Store an answer and clear any validation error.
    ///
    /// Ids outside the loaded sequence are rejected so the answer set only
    /// ever holds known keys.
    pub fn handle_answer_change(
        &mut self,
        question_id: &str,
        value: AnswerValue,
    ) -> Result<(), QuizError> {
        if !self.questions.iter().any(|q| q.id == question_id) {
            return Err(QuizError::UnknownQuestion {
                id: question_id.to_string(),
            });
        }
        self.error = None;
        self.answers.insert(question_id.to_string(), value);
        Ok(())
    }

    /// Validate the current question, then advance or submit.
    pub fn handle_next(&mut self) -> QuizStep {
        let Some(current) = self.current() else {
            return QuizStep::Empty;
        };

        let answered = self
            .answers
            .get(&current.id)
            .is_some_and(|v| !v.is_empty());
        if current.required && !answered {
            debug!(question_id = %current.id, "Required question left unanswered");
            self.error = Some(REQUIRED_ANSWER_MESSAGE.to_string());
            return QuizStep::Blocked;
        }

        if self.is_last() {
            QuizStep::Submitted(self.answers.clone())
        } else {
            self.index += 1;
            debug!(index = self.index, "Quiz advanced");
            QuizStep::Advanced(self.index)
        }
    }

    /// Step back one question. Answers are kept.
    pub fn handle_previous(&mut self) {
        self.error = None;
        if self.index > 0 {
            self.index -= 1;
        }
    }

    pub fn snapshot(&self) -> QuizCursor {
        let (position, total) = self.progress();
        QuizCursor {
            index: self.index,
            position,
            total,
            current: self
                .current()
                .map(|q| render_question(q, &self.answers)),
            error: self.error.clone(),
            answers: self.answers.clone(),
        }
    }
}

/// Serializable view of the engine for the front end.
#[derive(Debug, Clone, Serialize)]
pub struct QuizCursor {
    pub index: usize,
    pub position: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<RenderedQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub answers: AnswerSet,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::question::QuestionKind;

    fn sample() -> Arc<[Question]> {
        Arc::from(vec![
            Question::yes_no("a", "A?"),
            Question::new("b", "B?", false, QuestionKind::Text { placeholder: None }),
            Question::yes_no("c", "C?"),
        ])
    }

    #[test]
    fn required_question_blocks_next() {
        let mut engine = QuizEngine::new(sample());
        assert_eq!(engine.handle_next(), QuizStep::Blocked);
        assert_eq!(engine.index(), 0);
        assert_eq!(engine.error(), Some(REQUIRED_ANSWER_MESSAGE));
    }

    #[test]
    fn empty_string_and_false_count_as_unanswered() {
        let mut engine = QuizEngine::new(sample());
        engine.handle_answer_change("a", "".into()).unwrap();
        assert_eq!(engine.handle_next(), QuizStep::Blocked);
        engine.handle_answer_change("a", false.into()).unwrap();
        assert_eq!(engine.handle_next(), QuizStep::Blocked);
        assert_eq!(engine.index(), 0);
    }

    #[test]
    fn answering_clears_error() {
        let mut engine = QuizEngine::new(sample());
        engine.handle_next();
        assert!(engine.error().is_some());
        engine.handle_answer_change("a", "si".into()).unwrap();
        assert!(engine.error().is_none());
    }

    #[test]
    fn optional_question_can_be_skipped() {
        let mut engine = QuizEngine::new(sample());
        engine.handle_answer_change("a", "no".into()).unwrap();
        assert_eq!(engine.handle_next(), QuizStep::Advanced(1));
        assert_eq!(engine.handle_next(), QuizStep::Advanced(2));
    }

    #[test]
    fn submits_full_answer_set_on_last_question() {
        let mut engine = QuizEngine::new(sample());
        engine.handle_answer_change("a", "si".into()).unwrap();
        engine.handle_next();
        engine.handle_answer_change("b", "detalle".into()).unwrap();
        engine.handle_next();
        engine.handle_answer_change("c", "no".into()).unwrap();

        match engine.handle_next() {
            QuizStep::Submitted(answers) => {
                assert_eq!(answers.len(), 3);
                assert_eq!(answers["b"], AnswerValue::from("detalle"));
            }
            other => panic!("expected submission, got {other:?}"),
        }
        // Submission does not move the cursor.
        assert_eq!(engine.index(), 2);
    }

    #[test]
    fn last_question_required_never_partially_submits() {
        let mut engine = QuizEngine::new(sample());
        engine.handle_answer_change("a", "si".into()).unwrap();
        engine.handle_next();
        engine.handle_next();
        assert_eq!(engine.handle_next(), QuizStep::Blocked);
    }

    #[test]
    fn answers_survive_back_and_forth() {
        let mut engine = QuizEngine::new(sample());
        engine.handle_answer_change("a", "si".into()).unwrap();
        engine.handle_next();
        engine.handle_answer_change("b", "texto".into()).unwrap();
        engine.handle_previous();
        assert_eq!(engine.index(), 0);
        engine.handle_previous();
        assert_eq!(engine.index(), 0);
        engine.handle_next();
        engine.handle_next();
        assert_eq!(engine.answers()["a"], AnswerValue::from("si"));
        assert_eq!(engine.answers()["b"], AnswerValue::from("texto"));
    }

    #[test]
    fn previous_clears_error() {
        let mut engine = QuizEngine::new(sample());
        engine.handle_answer_change("a", "si".into()).unwrap();
        engine.handle_next();
        engine.handle_next();
        engine.handle_next();
        assert!(engine.error().is_some());
        engine.handle_previous();
        assert!(engine.error().is_none());
    }

    #[test]
    fn unknown_question_is_rejected() {
        let mut engine = QuizEngine::new(sample());
        let err = engine.handle_answer_change("zzz", "si".into()).unwrap_err();
        assert!(matches!(err, QuizError::UnknownQuestion { .. }));
        assert!(engine.answers().is_empty());
    }

    #[test]
    fn loading_new_sequence_resets() {
        let mut engine = QuizEngine::new(sample());
        engine.handle_answer_change("a", "si".into()).unwrap();
        engine.handle_next();
        engine.handle_next();
        engine.handle_next();

        engine.load(sample());
        assert_eq!(engine.index(), 0);
        assert!(engine.answers().is_empty());
        assert!(engine.error().is_none());
    }

    #[test]
    fn reloading_same_sequence_keeps_progress() {
        let questions = sample();
        let mut engine = QuizEngine::new(Arc::clone(&questions));
        engine.handle_answer_change("a", "si".into()).unwrap();
        engine.handle_next();
        engine.load(questions);
        assert_eq!(engine.index(), 1);
        assert_eq!(engine.answers().len(), 1);
    }

    #[test]
    fn empty_engine() {
        let mut engine = QuizEngine::new(Arc::from(Vec::<Question>::new()));
        assert!(engine.current().is_none());
        assert_eq!(engine.handle_next(), QuizStep::Empty);
    }

    #[test]
    fn snapshot_reports_progress() {
        let mut engine = QuizEngine::new(sample());
        engine.handle_answer_change("a", "si".into()).unwrap();
        engine.handle_next();
        let cursor = engine.snapshot();
        assert_eq!(cursor.position, 2);
        assert_eq!(cursor.total, 3);
        assert_eq!(cursor.current.unwrap().id, "b");
    }
}

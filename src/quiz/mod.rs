//! Diagnostic quiz: question model, engine, renderer, and the legal-area
//! classifier.

pub mod area;
pub mod engine;
pub mod question;
pub mod render;

pub use area::{LegalArea, QuizResult, area_law_questions, classify};
pub use engine::{QuizCursor, QuizEngine, QuizStep};
pub use question::{AnswerSet, AnswerValue, Question, QuestionKind, QuestionOption};
pub use render::{InputView, RenderedQuestion};

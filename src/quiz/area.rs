//! Legal-area diagnosis: the fixed question set and the rule-based
//! classifier that maps its answers to a practice area.

use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use super::question::{AnswerSet, Question, QuestionKind, QuestionOption, answer_text};

pub const Q_EMPLEO: &str = "q1_empleo";
pub const Q_NEGOCIO: &str = "q2_negocio";
pub const Q_FAMILIA: &str = "q3_familia";
pub const Q_INMUEBLE: &str = "q4_inmueble";
pub const Q_IMPUESTOS: &str = "q5_impuestos";
pub const Q_CONSUMIDOR: &str = "q6_consumidor";
pub const Q_PETICION: &str = "q7_peticion";
pub const Q_DEUDA: &str = "q8_deuda";
pub const Q_EMPRESA_PROPIA: &str = "q9_empresaPropia";
pub const Q_DETALLE: &str = "q10_detalle";

const YES: &str = "si";
const OWN_COMPANY: &str = "si_empresa";

/// Practice areas the diagnosis can produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegalArea {
    #[serde(rename = "Laboral")]
    Laboral,
    #[serde(rename = "de Familia / Sucesiones")]
    FamiliaSucesiones,
    #[serde(rename = "Comercial / Empresarial")]
    ComercialEmpresarial,
    #[serde(rename = "Tributario")]
    Tributario,
    #[serde(rename = "Inmobiliario / Civil")]
    InmobiliarioCivil,
    #[serde(rename = "del Consumidor")]
    Consumidor,
    #[serde(rename = "Administrativo / Peticiones")]
    AdministrativoPeticiones,
    #[serde(rename = "Civil / Comercial")]
    CivilComercial,
    #[default]
    #[serde(rename = "General / Civil")]
    GeneralCivil,
}

impl LegalArea {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Laboral => "Laboral",
            Self::FamiliaSucesiones => "de Familia / Sucesiones",
            Self::ComercialEmpresarial => "Comercial / Empresarial",
            Self::Tributario => "Tributario",
            Self::InmobiliarioCivil => "Inmobiliario / Civil",
            Self::Consumidor => "del Consumidor",
            Self::AdministrativoPeticiones => "Administrativo / Peticiones",
            Self::CivilComercial => "Civil / Comercial",
            Self::GeneralCivil => "General / Civil",
        }
    }
}

impl std::fmt::Display for LegalArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of a completed diagnosis. Replaced wholesale by a new run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub completed: bool,
    pub area: LegalArea,
    pub answers: AnswerSet,
}

impl QuizResult {
    pub fn from_answers(answers: AnswerSet) -> Self {
        Self {
            completed: true,
            area: classify(&answers),
            answers,
        }
    }
}

fn is(answers: &AnswerSet, id: &str, expected: &str) -> bool {
    answer_text(answers, id) == Some(expected)
}

/// Classify an answer set. Rules are checked in priority order and the
/// first match wins; with no match the result is `GeneralCivil`.
pub fn classify(answers: &AnswerSet) -> LegalArea {
    if is(answers, Q_EMPLEO, YES) {
        LegalArea::Laboral
    } else if is(answers, Q_FAMILIA, YES) {
        LegalArea::FamiliaSucesiones
    } else if is(answers, Q_NEGOCIO, YES) || is(answers, Q_EMPRESA_PROPIA, OWN_COMPANY) {
        LegalArea::ComercialEmpresarial
    } else if is(answers, Q_IMPUESTOS, YES) {
        LegalArea::Tributario
    } else if is(answers, Q_INMUEBLE, YES) {
        LegalArea::InmobiliarioCivil
    } else if is(answers, Q_CONSUMIDOR, YES) {
        LegalArea::Consumidor
    } else if is(answers, Q_PETICION, YES) {
        LegalArea::AdministrativoPeticiones
    } else if is(answers, Q_DEUDA, YES) {
        LegalArea::CivilComercial
    } else {
        LegalArea::GeneralCivil
    }
}

static AREA_LAW_QUESTIONS: LazyLock<Arc<[Question]>> = LazyLock::new(|| {
    Arc::from(vec![
        Question::yes_no(
            Q_EMPLEO,
            "¿Tu consulta está relacionada con un empleo, un despido o un contrato de trabajo?",
        ),
        Question::yes_no(
            Q_NEGOCIO,
            "¿Involucra un negocio, una sociedad o un contrato entre empresas?",
        ),
        Question::yes_no(
            Q_FAMILIA,
            "¿Se trata de un asunto de familia (divorcio, custodia, alimentos) o de una herencia?",
        ),
        Question::yes_no(
            Q_INMUEBLE,
            "¿Tiene que ver con un inmueble (compraventa, arriendo, escrituras)?",
        ),
        Question::yes_no(
            Q_IMPUESTOS,
            "¿Está relacionada con impuestos, la DIAN o declaraciones tributarias?",
        ),
        Question::yes_no(
            Q_CONSUMIDOR,
            "¿Tienes un problema con un producto o servicio que compraste?",
        ),
        Question::yes_no(
            Q_PETICION,
            "¿Necesitas presentar un derecho de petición o un trámite ante una entidad pública?",
        ),
        Question::yes_no(
            Q_DEUDA,
            "¿Tu caso involucra una deuda, un cobro o un incumplimiento de pago?",
        ),
        Question::new(
            Q_EMPRESA_PROPIA,
            "¿Tienes empresa propia o trabajas como independiente?",
            true,
            QuestionKind::Radio {
                options: vec![
                    QuestionOption::new("si_empresa", "Sí, tengo una empresa"),
                    QuestionOption::new("si_independiente", "Sí, soy independiente"),
                    QuestionOption::new("no", "No"),
                ],
            },
        ),
        Question::new(
            Q_DETALLE,
            "Cuéntanos brevemente tu situación (opcional)",
            false,
            QuestionKind::Textarea {
                placeholder: Some("Describe tu caso en pocas palabras...".to_string()),
            },
        ),
    ])
});

/// The fixed diagnosis questions. Always the same `Arc`, so reloading it
/// into an engine keeps progress.
pub fn area_law_questions() -> Arc<[Question]> {
    Arc::clone(&AREA_LAW_QUESTIONS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::question::AnswerValue;

    fn all_no() -> AnswerSet {
        let mut answers = AnswerSet::new();
        for id in [
            Q_EMPLEO,
            Q_NEGOCIO,
            Q_FAMILIA,
            Q_INMUEBLE,
            Q_IMPUESTOS,
            Q_CONSUMIDOR,
            Q_PETICION,
            Q_DEUDA,
            Q_EMPRESA_PROPIA,
        ] {
            answers.insert(id.to_string(), AnswerValue::from("no"));
        }
        answers
    }

    fn with(pairs: &[(&str, &str)]) -> AnswerSet {
        let mut answers = all_no();
        for (id, value) in pairs {
            answers.insert(id.to_string(), AnswerValue::from(*value));
        }
        answers
    }

    #[test]
    fn employment_beats_family() {
        let answers = with(&[(Q_EMPLEO, "si"), (Q_FAMILIA, "si")]);
        assert_eq!(classify(&answers), LegalArea::Laboral);
    }

    #[test]
    fn only_debt_is_civil_commercial() {
        let answers = with(&[(Q_DEUDA, "si")]);
        assert_eq!(classify(&answers), LegalArea::CivilComercial);
    }

    #[test]
    fn all_no_falls_back_to_general() {
        assert_eq!(classify(&all_no()), LegalArea::GeneralCivil);
        assert_eq!(classify(&AnswerSet::new()), LegalArea::GeneralCivil);
    }

    #[test]
    fn own_company_is_commercial() {
        let answers = with(&[(Q_EMPRESA_PROPIA, "si_empresa")]);
        assert_eq!(classify(&answers), LegalArea::ComercialEmpresarial);
        let answers = with(&[(Q_EMPRESA_PROPIA, "si_independiente")]);
        assert_eq!(classify(&answers), LegalArea::GeneralCivil);
    }

    #[test]
    fn priority_order_is_respected() {
        let cases = [
            (with(&[(Q_FAMILIA, "si"), (Q_NEGOCIO, "si")]), LegalArea::FamiliaSucesiones),
            (with(&[(Q_NEGOCIO, "si"), (Q_IMPUESTOS, "si")]), LegalArea::ComercialEmpresarial),
            (with(&[(Q_IMPUESTOS, "si"), (Q_INMUEBLE, "si")]), LegalArea::Tributario),
            (with(&[(Q_INMUEBLE, "si"), (Q_CONSUMIDOR, "si")]), LegalArea::InmobiliarioCivil),
            (with(&[(Q_CONSUMIDOR, "si"), (Q_PETICION, "si")]), LegalArea::Consumidor),
            (with(&[(Q_PETICION, "si"), (Q_DEUDA, "si")]), LegalArea::AdministrativoPeticiones),
        ];
        for (answers, expected) in cases {
            assert_eq!(classify(&answers), expected);
        }
    }

    #[test]
    fn classification_is_deterministic() {
        let answers = with(&[(Q_CONSUMIDOR, "si"), (Q_DEUDA, "si")]);
        let first = classify(&answers);
        for _ in 0..10 {
            assert_eq!(classify(&answers), first);
        }
    }

    #[test]
    fn question_set_shape() {
        let questions = area_law_questions();
        assert_eq!(questions.len(), 10);
        assert!(Arc::ptr_eq(&questions, &area_law_questions()));
        assert!(questions[..9].iter().all(|q| q.required));
        assert!(!questions[9].required);
    }

    #[test]
    fn default_area_is_the_fallback() {
        assert_eq!(LegalArea::default(), LegalArea::GeneralCivil);
        assert_eq!(classify(&AnswerSet::new()), LegalArea::default());
    }

    #[test]
    fn area_serializes_as_label() {
        let json = serde_json::to_string(&LegalArea::FamiliaSucesiones).unwrap();
        assert_eq!(json, "\"de Familia / Sucesiones\"");
        for area in [LegalArea::Laboral, LegalArea::GeneralCivil, LegalArea::Consumidor] {
            assert_eq!(
                serde_json::to_string(&area).unwrap(),
                format!("\"{area}\"")
            );
        }
    }

    #[test]
    fn result_from_answers_is_completed() {
        let result = QuizResult::from_answers(with(&[(Q_IMPUESTOS, "si")]));
        assert!(result.completed);
        assert_eq!(result.area, LegalArea::Tributario);
        assert_eq!(result.answers.len(), 9);
    }
}

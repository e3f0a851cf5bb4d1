//! Service catalog: the specialist agents a visitor can activate after the
//! diagnosis.

use serde::{Deserialize, Serialize};

/// A selectable service. `id` is the key into the agent directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Icon name for the front end.
    pub icon: String,
}

impl Service {
    fn new(id: &str, title: &str, description: &str, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// Service ids, shared with the agent directory.
pub mod ids {
    pub const GENERATE_DOC: &str = "generateDoc";
    pub const RESOLVE_DISPUTE: &str = "resolveDispute";
    pub const PREDICTIVE_ANALYSIS: &str = "predictiveAnalysis";
    pub const MANAGE_PROCEDURE: &str = "manageProcedure";
    pub const MULTI_DISCIPLINARY_TEAM: &str = "multiDisciplinaryTeam";
    pub const QUICK_CONSULTATION: &str = "quickConsultation";

    pub const ALL: [&str; 6] = [
        GENERATE_DOC,
        RESOLVE_DISPUTE,
        PREDICTIVE_ANALYSIS,
        MANAGE_PROCEDURE,
        MULTI_DISCIPLINARY_TEAM,
        QUICK_CONSULTATION,
    ];
}

/// The full catalog in display order.
pub fn catalog() -> Vec<Service> {
    vec![
        Service::new(
            ids::GENERATE_DOC,
            "Generar documento legal",
            "Contratos, derechos de petición, tutelas y otros documentos estándar generados por IA.",
            "document",
        ),
        Service::new(
            ids::RESOLVE_DISPUTE,
            "Resolver una disputa (ODR)",
            "Resolución de conflictos en línea con acompañamiento de un agente especializado.",
            "scale",
        ),
        Service::new(
            ids::PREDICTIVE_ANALYSIS,
            "Análisis predictivo del caso",
            "Estimación de escenarios y probabilidades a partir de casos similares.",
            "chart",
        ),
        Service::new(
            ids::MANAGE_PROCEDURE,
            "Gestionar un trámite",
            "Seguimiento y gestión de trámites ante entidades públicas o privadas.",
            "clipboard",
        ),
        Service::new(
            ids::MULTI_DISCIPLINARY_TEAM,
            "Asesoría multidisciplinar",
            "Casos que combinan varias áreas del derecho o requieren un equipo.",
            "users",
        ),
        Service::new(
            ids::QUICK_CONSULTATION,
            "Consulta rápida",
            "Respuesta breve a una pregunta legal puntual.",
            "chat",
        ),
    ]
}

/// Look up a catalog entry by id.
pub fn find_service(id: &str) -> Option<Service> {
    catalog().into_iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique_and_match_ids() {
        let services = catalog();
        let got: Vec<&str> = services.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(got, ids::ALL);
    }

    #[test]
    fn find_known_and_unknown() {
        assert_eq!(
            find_service(ids::QUICK_CONSULTATION).unwrap().title,
            "Consulta rápida"
        );
        assert!(find_service("nope").is_none());
    }
}

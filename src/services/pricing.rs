//! Pricing tiers and their actions.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Recipient for custom-quote requests.
pub const CONTACT_EMAIL: &str = "ssolucionesdeia@gmail.com";
/// Subject line for custom-quote requests.
pub const CONTACT_SUBJECT: &str = "Cotizacion Caso Complejo";

/// What a tier's button does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TierAction {
    /// Go straight to the diagnosis quiz.
    StartDiagnosis,
    /// Manual follow-up by email; no programmatic response.
    ContactForQuote { mailto: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PricingTier {
    pub id: &'static str,
    pub name: &'static str,
    /// Price in COP. Zero is shown as free (or custom, for quotes).
    pub price: Decimal,
    pub price_display: String,
    pub description: &'static str,
    pub features: Vec<&'static str>,
    pub button_text: &'static str,
    pub popular: bool,
    pub action: TierAction,
}

/// The `mailto:` link for custom-quote requests.
pub fn contact_mailto() -> String {
    format!(
        "mailto:{}?subject={}",
        CONTACT_EMAIL,
        CONTACT_SUBJECT.replace(' ', "%20")
    )
}

/// Format a COP amount with `.` thousands separators, e.g. `$99.900 COP`.
/// Zero is "Gratis".
pub fn format_cop(amount: Decimal) -> String {
    if amount.is_zero() {
        return "Gratis".to_string();
    }
    let whole = amount.trunc().abs().to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if amount.is_sign_negative() { "-" } else { "" };
    format!("{sign}${grouped} COP")
}

fn tier(
    id: &'static str,
    name: &'static str,
    price: Decimal,
    description: &'static str,
    features: Vec<&'static str>,
    button_text: &'static str,
    action: TierAction,
) -> PricingTier {
    PricingTier {
        id,
        name,
        price,
        price_display: format_cop(price),
        description,
        features,
        button_text,
        popular: false,
        action,
    }
}

pub fn pricing_tiers() -> Vec<PricingTier> {
    vec![
        tier(
            "diagnostico",
            "Diagnóstico inicial",
            Decimal::ZERO,
            "Identifica tu necesidad y área legal.",
            vec![
                "Test interactivo guiado",
                "Identificación de área legal",
                "Recomendación de servicios",
            ],
            "Iniciar diagnóstico",
            TierAction::StartDiagnosis,
        ),
        PricingTier {
            popular: true,
            ..tier(
                "documentosIAConRevision",
                "Documentos IA + Revisión Experta",
                dec!(99900),
                "Genera documentos estándar con validación humana.",
                vec![
                    "Generación IA documentos estándar",
                    "Revisión y ajuste por experto humano",
                    "Entrega de versión final validada",
                    "Activación de agente IA + Revisor",
                ],
                "Requiere diagnóstico",
                TierAction::StartDiagnosis,
            )
        },
        tier(
            "analisisConsultaIA",
            "Análisis IA + Consulta Experta",
            dec!(199900),
            "Análisis por IA complementado con asesoría humana.",
            vec![
                "Análisis predictivo / Inicio ODR / Gestión Trámite IA",
                "Videollamada con experto (30-45 min)",
                "Interpretación de resultados IA",
                "Asesoramiento estratégico",
                "Activación de agente IA + Experto",
            ],
            "Requiere diagnóstico",
            TierAction::StartDiagnosis,
        ),
        PricingTier {
            price_display: "A medida".to_string(),
            ..tier(
                "casosComplejos",
                "Soluciones personalizadas",
                Decimal::ZERO,
                "Para casos complejos que requieren un equipo o enfoque a medida.",
                vec![
                    "Análisis detallado del caso",
                    "Propuesta de equipo experto (si aplica)",
                    "Plan de acción y presupuesto a medida",
                    "Activación de agentes IA avanzados/combinados",
                ],
                "Contactar para cotización",
                TierAction::ContactForQuote {
                    mailto: contact_mailto(),
                },
            )
        },
    ]
}

pub fn find_tier(id: &str) -> Option<PricingTier> {
    pricing_tiers().into_iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cop_formatting() {
        assert_eq!(format_cop(dec!(99900)), "$99.900 COP");
        assert_eq!(format_cop(dec!(199900)), "$199.900 COP");
        assert_eq!(format_cop(dec!(1500000)), "$1.500.000 COP");
        assert_eq!(format_cop(dec!(900)), "$900 COP");
        assert_eq!(format_cop(Decimal::ZERO), "Gratis");
    }

    #[test]
    fn mailto_link_is_exact() {
        assert_eq!(
            contact_mailto(),
            "mailto:ssolucionesdeia@gmail.com?subject=Cotizacion%20Caso%20Complejo"
        );
    }

    #[test]
    fn tiers_and_actions() {
        let tiers = pricing_tiers();
        assert_eq!(tiers.len(), 4);
        assert_eq!(tiers.iter().filter(|t| t.popular).count(), 1);
        assert_eq!(find_tier("diagnostico").unwrap().action, TierAction::StartDiagnosis);
        assert!(matches!(
            find_tier("casosComplejos").unwrap().action,
            TierAction::ContactForQuote { .. }
        ));
        assert!(find_tier("otro").is_none());
    }

    #[test]
    fn tier_serializes_price_as_string() {
        let json = serde_json::to_value(find_tier("analisisConsultaIA").unwrap()).unwrap();
        assert_eq!(json["price"], "199900");
        assert_eq!(json["price_display"], "$199.900 COP");
        assert_eq!(json["action"]["kind"], "start_diagnosis");
    }
}

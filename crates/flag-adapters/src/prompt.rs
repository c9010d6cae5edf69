//! Prompt enviado al razonador.

use flag_core::AssessmentRequest;

pub const SYSTEM_PROMPT: &str = "You are an expert software engineering risk analyst.";

/// Prompt de usuario con los datos del envío y el formato de respuesta
/// esperado (un objeto JSON con los cinco campos de la evaluación).
pub fn build_prompt(request: &AssessmentRequest) -> String {
    format!(r#"Analyze the following feature flag submission:

Feature Flag Details:
- Name: {name}
- Description: {description}
- Scope: {scope}
- Code Changes: {code_changes}
- Configuration: {config}

Scoring thresholds: critical >= 75, high >= 60, medium >= 30, otherwise low.

Respond ONLY with valid JSON:
{{
    "risk_level": "low|medium|high|critical",
    "risk_score": 0-100,
    "detected_issues": ["issue1", "issue2"],
    "reasoning": "detailed explanation",
    "recommendation": "approval recommendation"
}}"#,
            name = request.name,
            description = request.description,
            scope = request.scope,
            code_changes = request.code_changes,
            config = request.config)
}

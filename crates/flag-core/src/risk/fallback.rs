//! Modelo determinista de palabras clave (siempre disponible).

use flag_domain::{FlagSubmission, RiskAssessment, RiskLevel, Scope};
use log::debug;

use super::keywords::{KeywordTier, KEYWORD_TABLES};
use crate::constants::{ALL_SYSTEMS_SCOPE_WEIGHT, BASE_RISK_SCORE, DATABASE_SCOPE_WEIGHT};

/// Proceso de aprobación recomendado para cada nivel.
pub fn recommendation_for(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Critical => "requires top-executive approval and full security review",
        RiskLevel::High => "requires engineering-manager and senior-engineer approval",
        RiskLevel::Medium => "requires senior-engineer approval",
        RiskLevel::Low => "can be approved by team lead",
    }
}

#[derive(Default)]
struct TierCounts {
    critical: usize,
    high: usize,
    medium: usize,
    routine: usize,
}

impl TierCounts {
    fn bump(&mut self, tier: KeywordTier) {
        match tier {
            KeywordTier::Critical => self.critical += 1,
            KeywordTier::High => self.high += 1,
            KeywordTier::Medium => self.medium += 1,
            KeywordTier::Routine => self.routine += 1,
        }
    }
}

/// Evaluación por palabras clave. Función pura y total.
///
/// Cada palabra clave presente como substring del texto combinado (en
/// minúsculas) suma su peso una sola vez; se recorren todas las tablas.
pub fn fallback_assessment(submission: &FlagSubmission) -> RiskAssessment {
    let haystack = format!("{} {} {} {}",
                           submission.name,
                           submission.scope.as_str(),
                           submission.code_changes,
                           submission.description).to_lowercase();

    let mut score = BASE_RISK_SCORE;
    let mut issues: Vec<String> = Vec::new();
    let mut counts = TierCounts::default();

    for table in KEYWORD_TABLES.iter() {
        for (keyword, weight) in table.keywords {
            if haystack.contains(keyword) {
                score += weight;
                issues.push(table.tag(keyword));
                counts.bump(table.tier);
                debug!("fallback: {} '{}' -> +{} (total {})", table.tier.prefix(), keyword, weight, score);
            }
        }
    }

    match submission.scope {
        Scope::All => {
            score += ALL_SYSTEMS_SCOPE_WEIGHT;
            issues.push("affects_all_systems".to_string());
        }
        Scope::Database => {
            score += DATABASE_SCOPE_WEIGHT;
            issues.push("database_scope".to_string());
        }
        Scope::Frontend | Scope::Backend => {}
    }

    let reasoning = format!("Fallback analysis: {} critical, {} high, {} medium, {} routine keywords detected.",
                            counts.critical, counts.high, counts.medium, counts.routine);
    let level = RiskLevel::from_score(score.min(100) as u8);
    let assessment = RiskAssessment::derived(score, issues, reasoning, recommendation_for(level));
    debug!("fallback: name={} score={} level={}",
           submission.name,
           assessment.risk_score(),
           assessment.risk_level());
    assessment
}

// risk.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::DomainError;

/// Nivel de riesgo de un cambio. El orden de las variantes es el orden de
/// severidad (`Low < Medium < High < Critical`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const CRITICAL_THRESHOLD: u8 = 75;
    pub const HIGH_THRESHOLD: u8 = 60;
    pub const MEDIUM_THRESHOLD: u8 = 30;

    /// Bucketing monótono del score: >=75 critical, >=60 high, >=30 medium.
    pub fn from_score(score: u8) -> Self {
        if score >= Self::CRITICAL_THRESHOLD {
            RiskLevel::Critical
        } else if score >= Self::HIGH_THRESHOLD {
            RiskLevel::High
        } else if score >= Self::MEDIUM_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            other => Err(DomainError::ValidationError(format!("unknown risk level: {other}"))),
        }
    }
}

/// Origen de una evaluación de riesgo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentSource {
    /// Respuesta validada del razonador externo.
    External,
    /// Modelo determinista de palabras clave.
    Fallback,
}

impl AssessmentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentSource::External => "external",
            AssessmentSource::Fallback => "fallback",
        }
    }
}

impl FromStr for AssessmentSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "external" => Ok(AssessmentSource::External),
            "fallback" => Ok(AssessmentSource::Fallback),
            other => Err(DomainError::ValidationError(format!("unknown assessment source: {other}"))),
        }
    }
}

/// Evaluación de riesgo inmutable.
///
/// Invariantes garantizadas por `new` (y por la deserialización, que pasa por
/// el mismo constructor):
/// - `risk_score` en [0,100].
/// - `risk_level == RiskLevel::from_score(risk_score)`.
/// - `detected_issues` no vacío.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAssessment")]
pub struct RiskAssessment {
    risk_level: RiskLevel,
    risk_score: u8,
    detected_issues: Vec<String>,
    reasoning: String,
    recommendation: String,
}

#[derive(Deserialize)]
struct RawAssessment {
    risk_level: RiskLevel,
    risk_score: u8,
    detected_issues: Vec<String>,
    reasoning: String,
    recommendation: String,
}

impl TryFrom<RawAssessment> for RiskAssessment {
    type Error = DomainError;

    fn try_from(raw: RawAssessment) -> Result<Self, Self::Error> {
        RiskAssessment::new(raw.risk_level,
                            raw.risk_score,
                            raw.detected_issues,
                            raw.reasoning,
                            raw.recommendation)
    }
}

impl RiskAssessment {
    pub const MAX_SCORE: u8 = 100;
    /// Tag único cuando no se detecta ninguna señal de riesgo.
    pub const NO_SIGNAL_TAG: &'static str = "routine_change";

    pub fn new(risk_level: RiskLevel,
               risk_score: u8,
               detected_issues: Vec<String>,
               reasoning: impl Into<String>,
               recommendation: impl Into<String>)
               -> Result<Self, DomainError> {
        if risk_score > Self::MAX_SCORE {
            return Err(DomainError::ValidationError(format!("risk_score out of range: {risk_score}")));
        }
        let expected = RiskLevel::from_score(risk_score);
        if risk_level != expected {
            return Err(DomainError::ValidationError(format!("risk_level {risk_level} does not match score {risk_score} (expected {expected})")));
        }
        if detected_issues.is_empty() {
            return Err(DomainError::ValidationError("detected_issues must not be empty".to_string()));
        }
        Ok(Self { risk_level,
                  risk_score,
                  detected_issues,
                  reasoning: reasoning.into(),
                  recommendation: recommendation.into() })
    }

    /// Construye una evaluación derivando el nivel desde el score. El score se
    /// satura en 100 y una lista de issues vacía se reemplaza por
    /// `[NO_SIGNAL_TAG]`, así que nunca falla.
    pub fn derived(risk_score: u32,
                   detected_issues: Vec<String>,
                   reasoning: impl Into<String>,
                   recommendation: impl Into<String>)
                   -> Self {
        let risk_score = risk_score.min(u32::from(Self::MAX_SCORE)) as u8;
        let detected_issues = if detected_issues.is_empty() {
            vec![Self::NO_SIGNAL_TAG.to_string()]
        } else {
            detected_issues
        };
        Self { risk_level: RiskLevel::from_score(risk_score),
               risk_score,
               detected_issues,
               reasoning: reasoning.into(),
               recommendation: recommendation.into() }
    }

    pub fn risk_level(&self) -> RiskLevel { self.risk_level }
    pub fn risk_score(&self) -> u8 { self.risk_score }
    pub fn detected_issues(&self) -> &[String] { &self.detected_issues }
    pub fn reasoning(&self) -> &str { &self.reasoning }
    pub fn recommendation(&self) -> &str { &self.recommendation }
}

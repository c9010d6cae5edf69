//! Tipos de evento del ciclo de vida de un flag.
//!
//! Rol:
//! - El workflow emite un evento por cada mutación aplicada (después de que el
//!   store la confirme), de forma append-only.
//! - Los eventos son un rastro de auditoría; el estado vigente vive en el
//!   `FlagStore` y nunca se reconstruye a partir de ellos.
use chrono::{DateTime, Utc};
use flag_domain::{ApproverTier, AssessmentSource, DecisionOutcome, FlagStatus, RiskLevel};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlagEventKind {
    /// Alta del flag en `pending`. Invariante: primer evento de un `flag_id`.
    FlagSubmitted { name: String, scope: String, created_by: String },
    /// Evaluación de riesgo persistida.
    RiskAssessed {
        risk_level: RiskLevel,
        risk_score: u8,
        source: AssessmentSource,
    },
    /// La etapa de evaluación falló; se asignó el aprobador por defecto.
    RiskAssessmentSkipped { reason: String },
    ApprovalRequested { approval_id: Uuid, approver: ApproverTier },
    ApprovalDecided {
        approval_id: Uuid,
        outcome: DecisionOutcome,
        comment: String,
    },
    FlagToggled { from: FlagStatus, to: FlagStatus },
    RolloutChanged { from: u8, to: u8 },
}

impl FlagEventKind {
    /// Nombre estable en minúsculas (útil para columnas `event_type`).
    pub fn event_type(&self) -> &'static str {
        match self {
            FlagEventKind::FlagSubmitted { .. } => "flagsubmitted",
            FlagEventKind::RiskAssessed { .. } => "riskassessed",
            FlagEventKind::RiskAssessmentSkipped { .. } => "riskassessmentskipped",
            FlagEventKind::ApprovalRequested { .. } => "approvalrequested",
            FlagEventKind::ApprovalDecided { .. } => "approvaldecided",
            FlagEventKind::FlagToggled { .. } => "flagtoggled",
            FlagEventKind::RolloutChanged { .. } => "rolloutchanged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagEvent {
    pub seq: u64, // asignado por el EventStore (orden append)
    pub flag_id: Uuid,
    pub kind: FlagEventKind,
    pub ts: DateTime<Utc>,
}

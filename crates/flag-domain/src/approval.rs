// approval.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{DomainError, FlagStatus, RiskLevel};

/// Nivel de aprobador requerido. Relación 1:1 con `RiskLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApproverTier {
    TeamLead,
    SeniorEngineer,
    EngineeringManager,
    TopExecutive,
}

impl ApproverTier {
    /// Aprobador usado cuando no hay evaluación de riesgo disponible.
    pub const DEFAULT: ApproverTier = ApproverTier::SeniorEngineer;

    /// Mapeo estático nivel de riesgo -> aprobador.
    pub fn for_risk(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Low => ApproverTier::TeamLead,
            RiskLevel::Medium => ApproverTier::SeniorEngineer,
            RiskLevel::High => ApproverTier::EngineeringManager,
            RiskLevel::Critical => ApproverTier::TopExecutive,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApproverTier::TeamLead => "team-lead",
            ApproverTier::SeniorEngineer => "senior-engineer",
            ApproverTier::EngineeringManager => "engineering-manager",
            ApproverTier::TopExecutive => "top-executive",
        }
    }
}

impl fmt::Display for ApproverTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApproverTier {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "team-lead" => Ok(ApproverTier::TeamLead),
            "senior-engineer" => Ok(ApproverTier::SeniorEngineer),
            "engineering-manager" => Ok(ApproverTier::EngineeringManager),
            "top-executive" => Ok(ApproverTier::TopExecutive),
            other => Err(DomainError::ValidationError(format!("unknown approver: {other}"))),
        }
    }
}

/// Estado de una Approval (decisión del actor, distinta del estado del flag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(DomainError::ValidationError(format!("unknown approval status: {other}"))),
        }
    }
}

/// Resultado terminal de una decisión.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionOutcome {
    Approved,
    Rejected,
}

impl DecisionOutcome {
    pub fn approval_status(&self) -> ApprovalStatus {
        match self {
            DecisionOutcome::Approved => ApprovalStatus::Approved,
            DecisionOutcome::Rejected => ApprovalStatus::Rejected,
        }
    }

    pub fn flag_status(&self) -> FlagStatus {
        match self {
            DecisionOutcome::Approved => FlagStatus::Approved,
            DecisionOutcome::Rejected => FlagStatus::Rejected,
        }
    }
}

impl FromStr for DecisionOutcome {
    type Err = DomainError;

    /// Acepta `approved`/`rejected` sin distinguir mayúsculas.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approved" => Ok(DecisionOutcome::Approved),
            "rejected" => Ok(DecisionOutcome::Rejected),
            other => Err(DomainError::ValidationError(format!("invalid decision outcome: {other}"))),
        }
    }
}

/// Solicitud de aprobación sobre un flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub id: Uuid,
    pub flag_id: Uuid,
    pub approver: ApproverTier,
    pub status: ApprovalStatus,
    pub comment: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Approval {
    pub fn pending(flag_id: Uuid, approver: ApproverTier, now: DateTime<Utc>) -> Self {
        Self { id: Uuid::new_v4(),
               flag_id,
               approver,
               status: ApprovalStatus::Pending,
               comment: None,
               decided_at: None,
               created_at: now }
    }

    pub fn is_pending(&self) -> bool { self.status == ApprovalStatus::Pending }

    /// Copia decidida de esta approval. No valida el estado previo: la
    /// precondición `is_pending` la aplica el workflow y el store.
    pub fn decided(&self, outcome: DecisionOutcome, comment: impl Into<String>, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.status = outcome.approval_status();
        next.comment = Some(comment.into());
        next.decided_at = Some(now);
        next
    }
}

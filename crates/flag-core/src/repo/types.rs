//! Contrato de persistencia consumido por el workflow.
//!
//! Las escrituras sobre un flag existente son estrechas y atómicas en el
//! store; el núcleo nunca reescribe la fila completa. Las que tienen
//! precondición (`commit_decision`, `transition_status`) fallan con
//! `StoreError::Conflict` si el estado esperado ya cambió, de modo que
//! escritores concurrentes sobre el mismo registro tengan un único ganador.
use chrono::{DateTime, Utc};
use flag_domain::{Approval, ApprovalStatus, ApproverTier, AssessmentSource, Flag, FlagStatus, RiskAssessment,
                  RolloutPercentage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum StoreError {
    #[error("not found: {0}")] NotFound(String),
    #[error("conflict: {0}")] Conflict(String),
    #[error("backend: {0}")] Backend(String),
}

/// Forma persistida de una evaluación de riesgo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    pub id: Uuid,
    pub flag_id: Uuid,
    pub assessment: RiskAssessment,
    pub source: AssessmentSource,
    pub analyzed_at: DateTime<Utc>,
}

impl RiskRecord {
    pub fn new(flag_id: Uuid, assessment: RiskAssessment, source: AssessmentSource, analyzed_at: DateTime<Utc>) -> Self {
        Self { id: Uuid::new_v4(),
               flag_id,
               assessment,
               source,
               analyzed_at }
    }
}

/// Filtro de listados de approvals. Campos `None` no filtran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalFilter {
    pub status: Option<ApprovalStatus>,
    pub approver: Option<ApproverTier>,
    pub flag_id: Option<Uuid>,
}

impl ApprovalFilter {
    pub fn pending_for(approver: ApproverTier) -> Self {
        Self { status: Some(ApprovalStatus::Pending),
               approver: Some(approver),
               flag_id: None }
    }

    pub fn for_flag(flag_id: Uuid) -> Self {
        Self { flag_id: Some(flag_id), ..Self::default() }
    }

    pub fn matches(&self, approval: &Approval) -> bool {
        self.status.map_or(true, |s| approval.status == s)
        && self.approver.map_or(true, |a| approval.approver == a)
        && self.flag_id.map_or(true, |f| approval.flag_id == f)
    }
}

/// Persistencia de flags, evaluaciones y approvals.
pub trait FlagStore: Send + Sync {
    /// Inserta un flag nuevo. `Conflict` si el nombre ya existe.
    fn insert_flag(&self, flag: &Flag) -> Result<(), StoreError>;
    fn get_flag(&self, id: Uuid) -> Result<Option<Flag>, StoreError>;
    fn find_flag_by_name(&self, name: &str) -> Result<Option<Flag>, StoreError>;
    /// Lista flags (orden de creación), opcionalmente filtrados por estado.
    fn list_flags(&self, status: Option<FlagStatus>) -> Result<Vec<Flag>, StoreError>;
    /// Compare-and-set de `status`: pasa a `to` sólo si el flag sigue en
    /// `from`. `Conflict` si el estado ya cambió; `NotFound` si no existe.
    fn transition_status(&self, flag_id: Uuid, from: FlagStatus, to: FlagStatus, now: DateTime<Utc>)
                         -> Result<Flag, StoreError>;
    /// Fija `config.rollout_percentage` sin tocar `status`. Devuelve el flag
    /// actualizado y el porcentaje efectivo anterior.
    fn set_rollout(&self, flag_id: Uuid, pct: RolloutPercentage, now: DateTime<Utc>)
                   -> Result<(Flag, RolloutPercentage), StoreError>;

    /// Guarda la evaluación y fija `risk_level` del flag en una sola unidad.
    fn record_assessment(&self, record: &RiskRecord) -> Result<(), StoreError>;
    /// Evaluación más reciente de un flag.
    fn latest_assessment(&self, flag_id: Uuid) -> Result<Option<RiskRecord>, StoreError>;

    /// Inserta una approval `pending`. `Conflict` si ya hay una pendiente para
    /// el mismo flag y aprobador.
    fn insert_approval(&self, approval: &Approval) -> Result<(), StoreError>;
    fn get_approval(&self, id: Uuid) -> Result<Option<Approval>, StoreError>;
    /// Approvals que cumplen el filtro, en orden de creación.
    fn list_approvals(&self, filter: &ApprovalFilter) -> Result<Vec<Approval>, StoreError>;
    /// Escribe la approval decidida y el nuevo estado del flag de forma
    /// atómica, sólo si la approval guardada y el flag siguen `pending`.
    fn commit_decision(&self, decided: &Approval, flag_status: FlagStatus, now: DateTime<Utc>) -> Result<(), StoreError>;
}

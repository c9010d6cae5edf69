//! Resultados devueltos por el workflow.
use flag_domain::{Approval, ApproverTier, Flag};
use serde::{Deserialize, Serialize};

use crate::repo::RiskRecord;

/// Resultado de `submit`: el flag en `pending`, su evaluación (si la etapa de
/// evaluación no falló) y la approval creada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub flag: Flag,
    pub assessment: Option<RiskRecord>,
    pub approval: Approval,
}

impl SubmissionOutcome {
    pub fn required_approver(&self) -> ApproverTier {
        self.approval.approver
    }
}

/// Resultado de `decide`: approval y flag tras la transición.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub approval: Approval,
    pub flag: Flag,
}

/// Flag con su evaluación más reciente y el aprobador requerido.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagDetails {
    pub flag: Flag,
    pub assessment: Option<RiskRecord>,
    pub required_approver: Option<ApproverTier>,
}

/// Approval junto con el detalle de su flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalView {
    pub approval: Approval,
    pub flag: Option<FlagDetails>,
}

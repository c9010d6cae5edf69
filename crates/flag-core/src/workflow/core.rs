//! Core ApprovalWorkflow implementation

use chrono::Utc;
use flag_domain::{Approval, ApproverTier, DecisionOutcome, Flag, FlagStatus, FlagSubmission, RolloutPercentage};
use indexmap::IndexMap;
use log::{debug, error, info, warn};
use uuid::Uuid;

use super::views::{ApprovalView, Decision, FlagDetails, SubmissionOutcome};
use crate::errors::WorkflowError;
use crate::event::{EventStore, FlagEvent, FlagEventKind, InMemoryEventStore};
use crate::repo::{ApprovalFilter, FlagStore, InMemoryFlagStore, RiskRecord};
use crate::risk::RiskScorer;
use crate::rollout::{self, Evaluation, RolloutPreview};

/// Workflow de aprobación de flags.
///
/// Orquesta la evaluación de riesgo, la asignación de aprobador y las
/// transiciones de estado. No guarda estado mutable propio: todo vive en el
/// `FlagStore`, y cada mutación confirmada se anota en el `EventStore`.
///
/// Concurrencia: todas las operaciones toman `&self`. Las decisiones sobre una
/// misma approval se serializan en `FlagStore::commit_decision`, los toggles
/// en `FlagStore::transition_status`; `set_rollout` sólo escribe la config.
pub struct ApprovalWorkflow<S, E>
    where S: FlagStore,
          E: EventStore
{
    store: S,
    events: E,
    scorer: RiskScorer,
}

impl ApprovalWorkflow<InMemoryFlagStore, InMemoryEventStore> {
    /// Workflow con stores en memoria.
    pub fn in_memory(scorer: RiskScorer) -> Self {
        Self::new_with_stores(InMemoryFlagStore::new(), InMemoryEventStore::default(), scorer)
    }
}

impl<S, E> ApprovalWorkflow<S, E>
    where S: FlagStore,
          E: EventStore
{
    /// Crea un workflow con los stores proporcionados
    pub fn new_with_stores(store: S, events: E, scorer: RiskScorer) -> Self {
        Self { store, events, scorer }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    /// Anota un evento de auditoría. Un fallo aquí no revierte la mutación ya
    /// confirmada.
    fn record(&self, flag_id: Uuid, kind: FlagEventKind) {
        let event_type = kind.event_type();
        if let Err(e) = self.events.append_kind(flag_id, kind) {
            error!("audit append failed flag_id={flag_id} event={event_type}: {e}");
        }
    }

    fn load_flag(&self, flag_id: Uuid) -> Result<Flag, WorkflowError> {
        self.store
            .get_flag(flag_id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("flag {flag_id}")))
    }

    fn load_approval(&self, approval_id: Uuid) -> Result<Approval, WorkflowError> {
        self.store
            .get_approval(approval_id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("approval {approval_id}")))
    }

    // ------------------------------------------------------------------
    // Transiciones
    // ------------------------------------------------------------------

    /// Da de alta un flag en `pending`, evalúa su riesgo y crea la approval
    /// para el aprobador del nivel resultante.
    ///
    /// Si la etapa de evaluación falla (incluida la persistencia de la
    /// evaluación), el aprobador es `senior-engineer`, no se guarda evaluación y
    /// el flag queda igualmente en `pending` con su approval.
    pub fn submit(&self, submission: FlagSubmission) -> Result<SubmissionOutcome, WorkflowError> {
        submission.validate()?;
        let name = submission.name.trim();
        if self.store.find_flag_by_name(name)?.is_some() {
            return Err(WorkflowError::Conflict(format!("flag name already exists: {name}")));
        }

        let mut flag = Flag::from_submission(&submission, Utc::now());
        self.store.insert_flag(&flag)?;
        self.record(flag.id,
                    FlagEventKind::FlagSubmitted { name: flag.name.clone(),
                                                   scope: flag.scope.as_str().to_string(),
                                                   created_by: flag.created_by.clone() });

        let (assessment, approver) = match self.assess_and_record(&flag, &submission) {
            Ok(record) => {
                flag.risk_level = Some(record.assessment.risk_level());
                flag.updated_at = record.analyzed_at;
                let tier = ApproverTier::for_risk(record.assessment.risk_level());
                (Some(record), tier)
            }
            Err(e) => {
                warn!("risk assessment stage failed for '{}', defaulting approver: {}", flag.name, e);
                self.record(flag.id, FlagEventKind::RiskAssessmentSkipped { reason: e.to_string() });
                (None, ApproverTier::DEFAULT)
            }
        };

        let approval = Approval::pending(flag.id, approver, Utc::now());
        self.store.insert_approval(&approval)?;
        self.record(flag.id,
                    FlagEventKind::ApprovalRequested { approval_id: approval.id,
                                                       approver });
        info!("submitted flag '{}' id={} risk={} approver={}",
              flag.name,
              flag.id,
              flag.risk_level.map_or("unscored", |l| l.as_str()),
              approver);
        Ok(SubmissionOutcome { flag, assessment, approval })
    }

    fn assess_and_record(&self, flag: &Flag, submission: &FlagSubmission) -> Result<RiskRecord, WorkflowError> {
        let (assessment, source) = self.scorer.score_with_source(submission);
        let record = RiskRecord::new(flag.id, assessment, source, Utc::now());
        self.store.record_assessment(&record)?;
        self.record(flag.id,
                    FlagEventKind::RiskAssessed { risk_level: record.assessment.risk_level(),
                                                  risk_score: record.assessment.risk_score(),
                                                  source });
        Ok(record)
    }

    /// Crea una approval adicional para un flag `pending`.
    pub fn request_approval(&self, flag_id: Uuid, approver: ApproverTier) -> Result<Approval, WorkflowError> {
        let flag = self.load_flag(flag_id)?;
        if flag.status != FlagStatus::Pending {
            return Err(WorkflowError::Conflict(format!("flag {} is {}, not pending", flag.id, flag.status)));
        }
        let existing = self.store.list_approvals(&ApprovalFilter { status: None,
                                                                   approver: Some(approver),
                                                                   flag_id: Some(flag_id) })?;
        if existing.iter().any(Approval::is_pending) {
            return Err(WorkflowError::Conflict(format!("approval request already pending for {approver} on flag {flag_id}")));
        }
        let approval = Approval::pending(flag_id, approver, Utc::now());
        self.store.insert_approval(&approval)?;
        self.record(flag_id,
                    FlagEventKind::ApprovalRequested { approval_id: approval.id,
                                                       approver });
        debug!("approval requested flag_id={flag_id} approver={approver}");
        Ok(approval)
    }

    /// Decide una approval `pending`. `outcome` es `approved` o `rejected`
    /// (sin distinguir mayúsculas). Approval y flag pasan juntos al estado
    /// terminal correspondiente.
    pub fn decide(&self, approval_id: Uuid, outcome: &str, comment: &str) -> Result<Decision, WorkflowError> {
        let outcome: DecisionOutcome = outcome.parse()?;
        let approval = self.load_approval(approval_id)?;
        if !approval.is_pending() {
            return Err(WorkflowError::Conflict(format!("approval {approval_id} already {}", approval.status)));
        }
        let mut flag = self.load_flag(approval.flag_id)?;
        if flag.status != FlagStatus::Pending {
            return Err(WorkflowError::Conflict(format!("flag {} already {}", flag.id, flag.status)));
        }

        let now = Utc::now();
        let decided = approval.decided(outcome, comment, now);
        self.store.commit_decision(&decided, outcome.flag_status(), now)?;
        flag.status = outcome.flag_status();
        flag.updated_at = now;

        self.record(flag.id,
                    FlagEventKind::ApprovalDecided { approval_id,
                                                     outcome,
                                                     comment: comment.to_string() });
        info!("approval {} decided {} by {}; flag '{}' is now {}",
              approval_id,
              decided.status,
              decided.approver,
              flag.name,
              flag.status);
        Ok(Decision { approval: decided, flag })
    }

    /// Alterna un flag aprobado: `approved`/`inactive` -> `active`, `active`
    /// -> `inactive`.
    ///
    /// La escritura es condicional al estado leído: si otra operación lo cambió
    /// entretanto, devuelve `Conflict` sin mutar nada.
    pub fn toggle(&self, flag_id: Uuid) -> Result<Flag, WorkflowError> {
        let from = self.load_flag(flag_id)?.status;
        let to = from.toggled()
                     .ok_or_else(|| WorkflowError::Conflict(format!("can only toggle approved flags; flag {flag_id} is {from}")))?;
        let flag = self.store.transition_status(flag_id, from, to, Utc::now())?;
        self.record(flag_id, FlagEventKind::FlagToggled { from, to });
        info!("flag '{}' toggled {} -> {}", flag.name, from, to);
        Ok(flag)
    }

    /// Cambia el porcentaje de rollout (cualquier estado). No toca `status`.
    pub fn set_rollout(&self, flag_id: Uuid, percentage: i64) -> Result<Flag, WorkflowError> {
        let pct = RolloutPercentage::try_from(percentage)?;
        let (flag, from) = self.store.set_rollout(flag_id, pct, Utc::now())?;
        self.record(flag_id,
                    FlagEventKind::RolloutChanged { from: from.value(),
                                                    to: pct.value() });
        info!("flag '{}' rollout {} -> {}", flag.name, from, pct);
        Ok(flag)
    }

    // ------------------------------------------------------------------
    // Consultas
    // ------------------------------------------------------------------

    pub fn flag(&self, flag_id: Uuid) -> Result<Flag, WorkflowError> {
        self.load_flag(flag_id)
    }

    pub fn flag_by_name(&self, name: &str) -> Result<Option<Flag>, WorkflowError> {
        Ok(self.store.find_flag_by_name(name)?)
    }

    fn details_of(&self, flag: Flag) -> Result<FlagDetails, WorkflowError> {
        let assessment = self.store.latest_assessment(flag.id)?;
        let required_approver = self.store
                                    .list_approvals(&ApprovalFilter::for_flag(flag.id))?
                                    .first()
                                    .map(|a| a.approver);
        Ok(FlagDetails { flag,
                         assessment,
                         required_approver })
    }

    pub fn flag_details(&self, flag_id: Uuid) -> Result<FlagDetails, WorkflowError> {
        let flag = self.load_flag(flag_id)?;
        self.details_of(flag)
    }

    pub fn list_flags(&self, status: Option<FlagStatus>) -> Result<Vec<FlagDetails>, WorkflowError> {
        self.store
            .list_flags(status)?
            .into_iter()
            .map(|f| self.details_of(f))
            .collect()
    }

    pub fn list_approvals(&self, filter: &ApprovalFilter) -> Result<Vec<ApprovalView>, WorkflowError> {
        self.store
            .list_approvals(filter)?
            .into_iter()
            .map(|approval| {
                let flag = match self.store.get_flag(approval.flag_id)? {
                    Some(f) => Some(self.details_of(f)?),
                    None => None,
                };
                Ok(ApprovalView { approval, flag })
            })
            .collect()
    }

    /// Approvals pendientes para un aprobador, con el detalle del flag.
    ///
    /// Sólo las que todavía pueden decidirse: una vez que otra approval decidió
    /// el flag, las restantes quedan `pending` en el store pero `decide` las
    /// rechaza, así que no se listan.
    pub fn pending_for(&self, approver: ApproverTier) -> Result<Vec<ApprovalView>, WorkflowError> {
        let mut views = self.list_approvals(&ApprovalFilter::pending_for(approver))?;
        views.retain(|v| {
                 v.flag
                  .as_ref()
                  .map_or(false, |d| d.flag.status == FlagStatus::Pending)
             });
        Ok(views)
    }

    pub fn events_for(&self, flag_id: Uuid) -> Result<Vec<FlagEvent>, WorkflowError> {
        Ok(self.events.list(flag_id)?)
    }

    // ------------------------------------------------------------------
    // Runtime
    // ------------------------------------------------------------------

    /// Evalúa un flag por nombre para un usuario.
    pub fn check(&self, flag_name: &str, user_id: Option<&str>) -> Result<Evaluation, WorkflowError> {
        let flag = self.store.find_flag_by_name(flag_name)?;
        let eval = match flag {
            Some(f) => rollout::evaluate(flag_name, Some(f.status), f.rollout(), user_id),
            None => rollout::evaluate(flag_name, None, RolloutPercentage::NONE, user_id),
        };
        debug!("check flag={} user={:?} enabled={} reason={}", flag_name, user_id, eval.enabled, eval.reason);
        Ok(eval)
    }

    /// Mapa nombre -> habilitado para todos los flags activos, en orden de
    /// creación.
    pub fn check_all(&self, user_id: Option<&str>) -> Result<IndexMap<String, bool>, WorkflowError> {
        Ok(self.store
               .list_flags(Some(FlagStatus::Active))?
               .into_iter()
               .map(|f| {
                   let enabled = rollout::evaluate(&f.name, Some(f.status), f.rollout(), user_id).enabled;
                   (f.name, enabled)
               })
               .collect())
    }

    /// Cuántos usuarios de la cohorte verían el flag con su rollout actual, si
    /// estuviera activo.
    pub fn preview_rollout(&self, flag_name: &str, user_ids: &[String]) -> Result<RolloutPreview, WorkflowError> {
        let flag = self.store
                       .find_flag_by_name(flag_name)?
                       .ok_or_else(|| WorkflowError::NotFound(format!("flag {flag_name}")))?;
        Ok(rollout::preview(&flag.name, flag.rollout(), user_ids))
    }
}

//! Store en memoria sobre `DashMap`.
//!
//! Cada escritura toma el lock de la(s) entrada(s) afectada(s), lo que da la
//! exclusión mutua por registro que el workflow requiere. Orden de locks:
//! `approvals` -> `flags` -> `assessments`; `pending_index` nunca se toma
//! mientras se sostiene otro lock.
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use flag_domain::{Approval, ApproverTier, Flag, FlagStatus, RolloutPercentage};
use uuid::Uuid;

use super::types::{ApprovalFilter, FlagStore, RiskRecord, StoreError};

#[derive(Default)]
pub struct InMemoryFlagStore {
    flags: DashMap<Uuid, Flag>,
    names: DashMap<String, Uuid>,
    assessments: DashMap<Uuid, Vec<RiskRecord>>,
    approvals: DashMap<Uuid, Approval>,
    pending_index: DashMap<(Uuid, ApproverTier), Uuid>,
}

impl InMemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for InMemoryFlagStore {
    fn insert_flag(&self, flag: &Flag) -> Result<(), StoreError> {
        match self.names.entry(flag.name.clone()) {
            Entry::Occupied(_) => return Err(StoreError::Conflict(format!("flag name already exists: {}", flag.name))),
            Entry::Vacant(slot) => {
                slot.insert(flag.id);
            }
        }
        self.flags.insert(flag.id, flag.clone());
        Ok(())
    }

    fn get_flag(&self, id: Uuid) -> Result<Option<Flag>, StoreError> {
        Ok(self.flags.get(&id).map(|f| f.value().clone()))
    }

    fn find_flag_by_name(&self, name: &str) -> Result<Option<Flag>, StoreError> {
        let id = match self.names.get(name) {
            Some(id) => *id.value(),
            None => return Ok(None),
        };
        self.get_flag(id)
    }

    fn list_flags(&self, status: Option<FlagStatus>) -> Result<Vec<Flag>, StoreError> {
        let mut out: Vec<Flag> = self.flags
                                     .iter()
                                     .filter(|f| status.map_or(true, |s| f.status == s))
                                     .map(|f| f.value().clone())
                                     .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(out)
    }

    fn transition_status(&self, flag_id: Uuid, from: FlagStatus, to: FlagStatus, now: DateTime<Utc>)
                         -> Result<Flag, StoreError> {
        let mut flag = self.flags
                           .get_mut(&flag_id)
                           .ok_or_else(|| StoreError::NotFound(format!("flag {flag_id}")))?;
        if flag.status != from {
            return Err(StoreError::Conflict(format!("flag {flag_id} is {}, expected {from}", flag.status)));
        }
        flag.status = to;
        flag.updated_at = now;
        Ok(flag.value().clone())
    }

    fn set_rollout(&self, flag_id: Uuid, pct: RolloutPercentage, now: DateTime<Utc>)
                   -> Result<(Flag, RolloutPercentage), StoreError> {
        let mut flag = self.flags
                           .get_mut(&flag_id)
                           .ok_or_else(|| StoreError::NotFound(format!("flag {flag_id}")))?;
        let previous = flag.rollout();
        flag.config.rollout_percentage = Some(pct);
        flag.updated_at = now;
        Ok((flag.value().clone(), previous))
    }

    fn record_assessment(&self, record: &RiskRecord) -> Result<(), StoreError> {
        let mut flag = self.flags
                           .get_mut(&record.flag_id)
                           .ok_or_else(|| StoreError::NotFound(format!("flag {}", record.flag_id)))?;
        flag.risk_level = Some(record.assessment.risk_level());
        flag.updated_at = record.analyzed_at;
        self.assessments.entry(record.flag_id).or_default().push(record.clone());
        Ok(())
    }

    fn latest_assessment(&self, flag_id: Uuid) -> Result<Option<RiskRecord>, StoreError> {
        Ok(self.assessments.get(&flag_id).and_then(|v| v.value().last().cloned()))
    }

    fn insert_approval(&self, approval: &Approval) -> Result<(), StoreError> {
        if !self.flags.contains_key(&approval.flag_id) {
            return Err(StoreError::NotFound(format!("flag {}", approval.flag_id)));
        }
        if approval.is_pending() {
            match self.pending_index.entry((approval.flag_id, approval.approver)) {
                Entry::Occupied(_) => {
                    return Err(StoreError::Conflict(format!("approval request already pending for {} on flag {}",
                                                            approval.approver, approval.flag_id)))
                }
                Entry::Vacant(slot) => {
                    slot.insert(approval.id);
                }
            }
        }
        self.approvals.insert(approval.id, approval.clone());
        Ok(())
    }

    fn get_approval(&self, id: Uuid) -> Result<Option<Approval>, StoreError> {
        Ok(self.approvals.get(&id).map(|a| a.value().clone()))
    }

    fn list_approvals(&self, filter: &ApprovalFilter) -> Result<Vec<Approval>, StoreError> {
        let mut out: Vec<Approval> = self.approvals
                                         .iter()
                                         .filter(|a| filter.matches(a.value()))
                                         .map(|a| a.value().clone())
                                         .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    fn commit_decision(&self, decided: &Approval, flag_status: FlagStatus, now: DateTime<Utc>) -> Result<(), StoreError> {
        let index_key = {
            let mut stored = self.approvals
                                 .get_mut(&decided.id)
                                 .ok_or_else(|| StoreError::NotFound(format!("approval {}", decided.id)))?;
            if !stored.is_pending() {
                return Err(StoreError::Conflict(format!("approval {} already {}", decided.id, stored.status)));
            }
            let mut flag = self.flags
                               .get_mut(&stored.flag_id)
                               .ok_or_else(|| StoreError::NotFound(format!("flag {}", stored.flag_id)))?;
            if flag.status != FlagStatus::Pending {
                return Err(StoreError::Conflict(format!("flag {} already {}", flag.id, flag.status)));
            }
            flag.status = flag_status;
            flag.updated_at = now;
            *stored = decided.clone();
            (stored.flag_id, stored.approver)
        };
        self.pending_index.remove(&index_key);
        Ok(())
    }
}

//! Filas Diesel y conversión fila <-> dominio.
//!
//! Los enums se guardan como texto estable (`as_str`) y se vuelven a leer con
//! `FromStr`; una fila que no parsea es `CorruptRow`, nunca un valor por
//! defecto.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use flag_core::{FlagEvent, FlagEventKind, RiskRecord};
use flag_domain::{Approval, DomainError, Flag, FlagConfig, RiskAssessment};
use serde_json::Value;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::schema::{approvals, flag_event_log, flags, risk_analyses};

fn parse_col<T>(column: &str, raw: &str) -> Result<T, PersistenceError>
    where T: FromStr<Err = DomainError>
{
    raw.parse().map_err(|e: DomainError| PersistenceError::CorruptRow(format!("{column}: {e}")))
}

fn to_json<T: serde::Serialize>(what: &str, value: &T) -> Result<Value, PersistenceError> {
    serde_json::to_value(value).map_err(|e| PersistenceError::Unknown(format!("serialize {what}: {e}")))
}

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = flags)]
pub struct FlagRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub scope: String,
    pub code_changes: String,
    pub created_by: String,
    pub status: String,
    pub risk_level: Option<String>,
    pub config: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FlagRow {
    pub fn from_domain(flag: &Flag) -> Result<Self, PersistenceError> {
        Ok(Self { id: flag.id,
                  name: flag.name.clone(),
                  description: flag.description.clone(),
                  scope: flag.scope.as_str().to_string(),
                  code_changes: flag.code_changes.clone(),
                  created_by: flag.created_by.clone(),
                  status: flag.status.as_str().to_string(),
                  risk_level: flag.risk_level.map(|l| l.as_str().to_string()),
                  config: to_json("flag config", &flag.config)?,
                  created_at: flag.created_at,
                  updated_at: flag.updated_at })
    }

    pub fn into_domain(self) -> Result<Flag, PersistenceError> {
        let config: FlagConfig = serde_json::from_value(self.config)
            .map_err(|e| PersistenceError::CorruptRow(format!("flags.config: {e}")))?;
        let risk_level = match self.risk_level {
            Some(raw) => Some(parse_col("flags.risk_level", &raw)?),
            None => None,
        };
        Ok(Flag { id: self.id,
                  name: self.name,
                  description: self.description,
                  scope: parse_col("flags.scope", &self.scope)?,
                  code_changes: self.code_changes,
                  created_by: self.created_by,
                  status: parse_col("flags.status", &self.status)?,
                  risk_level,
                  config,
                  created_at: self.created_at,
                  updated_at: self.updated_at })
    }
}

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = risk_analyses)]
pub struct RiskRow {
    pub id: Uuid,
    pub flag_id: Uuid,
    pub risk_level: String,
    pub risk_score: i16,
    pub detected_issues: Value,
    pub reasoning: String,
    pub recommendation: String,
    pub source: String,
    pub analyzed_at: DateTime<Utc>,
}

impl RiskRow {
    pub fn from_domain(record: &RiskRecord) -> Result<Self, PersistenceError> {
        let a = &record.assessment;
        Ok(Self { id: record.id,
                  flag_id: record.flag_id,
                  risk_level: a.risk_level().as_str().to_string(),
                  risk_score: i16::from(a.risk_score()),
                  detected_issues: to_json("detected_issues", &a.detected_issues())?,
                  reasoning: a.reasoning().to_string(),
                  recommendation: a.recommendation().to_string(),
                  source: record.source.as_str().to_string(),
                  analyzed_at: record.analyzed_at })
    }

    pub fn into_domain(self) -> Result<RiskRecord, PersistenceError> {
        let score = u8::try_from(self.risk_score)
            .map_err(|_| PersistenceError::CorruptRow(format!("risk_analyses.risk_score: {}", self.risk_score)))?;
        let issues: Vec<String> = serde_json::from_value(self.detected_issues)
            .map_err(|e| PersistenceError::CorruptRow(format!("risk_analyses.detected_issues: {e}")))?;
        let assessment = RiskAssessment::new(parse_col("risk_analyses.risk_level", &self.risk_level)?,
                                             score,
                                             issues,
                                             self.reasoning,
                                             self.recommendation)
            .map_err(|e| PersistenceError::CorruptRow(format!("risk_analyses {}: {e}", self.id)))?;
        Ok(RiskRecord { id: self.id,
                        flag_id: self.flag_id,
                        assessment,
                        source: parse_col("risk_analyses.source", &self.source)?,
                        analyzed_at: self.analyzed_at })
    }
}

#[derive(Queryable, Insertable, Debug, Clone)]
#[diesel(table_name = approvals)]
pub struct ApprovalRow {
    pub id: Uuid,
    pub flag_id: Uuid,
    pub approver: String,
    pub status: String,
    pub comment: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ApprovalRow {
    pub fn from_domain(approval: &Approval) -> Self {
        Self { id: approval.id,
               flag_id: approval.flag_id,
               approver: approval.approver.as_str().to_string(),
               status: approval.status.as_str().to_string(),
               comment: approval.comment.clone(),
               decided_at: approval.decided_at,
               created_at: approval.created_at }
    }

    pub fn into_domain(self) -> Result<Approval, PersistenceError> {
        Ok(Approval { id: self.id,
                      flag_id: self.flag_id,
                      approver: parse_col("approvals.approver", &self.approver)?,
                      status: parse_col("approvals.status", &self.status)?,
                      comment: self.comment,
                      decided_at: self.decided_at,
                      created_at: self.created_at })
    }
}

/// Inserción en `flag_event_log`; `seq` y `ts` los asigna la base.
#[derive(Insertable, Debug)]
#[diesel(table_name = flag_event_log)]
pub struct NewEventRow<'a> {
    pub flag_id: &'a Uuid,
    pub event_type: &'a str,
    pub payload: &'a Value,
}

#[derive(Queryable, Debug)]
pub struct EventRow {
    pub seq: i64,
    pub flag_id: Uuid,
    pub ts: DateTime<Utc>,
    pub event_type: String,
    pub payload: Value,
}

impl EventRow {
    /// `payload` guarda el enum completo; `event_type` es sólo índice.
    pub fn into_domain(self) -> Result<FlagEvent, PersistenceError> {
        let kind: FlagEventKind = serde_json::from_value(self.payload)
            .map_err(|e| PersistenceError::CorruptRow(format!("flag_event_log seq={}: {e}", self.seq)))?;
        Ok(FlagEvent { seq: self.seq as u64,
                       flag_id: self.flag_id,
                       kind,
                       ts: self.ts })
    }
}

use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use flag_core::{ApprovalFilter, FlagStore, RiskRecord, StoreError};
use flag_domain::{Approval, ApprovalStatus, Flag, FlagStatus, RolloutPercentage};
use log::debug;
use uuid::Uuid;

use super::rows::{ApprovalRow, FlagRow, RiskRow};
use super::{with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::{approvals, flags, risk_analyses};

/// Implementación Postgres de `FlagStore`.
///
/// Cada operación es una unidad de trabajo con reintento; las que tocan más
/// de una tabla corren en una transacción `read_write`.
pub struct PgFlagStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgFlagStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    fn run<T, F>(&self, mut f: F) -> Result<T, StoreError>
        where F: FnMut(&mut PgConnection) -> Result<T, PersistenceError>
    {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            f(&mut *conn)
        }).map_err(StoreError::from)
    }
}

impl<P: ConnectionProvider> FlagStore for PgFlagStore<P> {
    fn insert_flag(&self, flag: &Flag) -> Result<(), StoreError> {
        let row = FlagRow::from_domain(flag)?;
        self.run(|conn| {
                diesel::insert_into(flags::table).values(&row)
                                                 .execute(conn)
                                                 .map_err(|e| match PersistenceError::from(e) {
                                                     PersistenceError::UniqueViolation(_) => {
                                                         PersistenceError::Conflict(format!("flag name already exists: {}", row.name))
                                                     }
                                                     other => other,
                                                 })?;
                Ok(())
            })
    }

    fn get_flag(&self, id: Uuid) -> Result<Option<Flag>, StoreError> {
        self.run(|conn| {
                let row = flags::table.find(id).first::<FlagRow>(conn).optional()?;
                row.map(FlagRow::into_domain).transpose()
            })
    }

    fn find_flag_by_name(&self, name: &str) -> Result<Option<Flag>, StoreError> {
        self.run(|conn| {
                let row = flags::table.filter(flags::name.eq(name))
                                      .first::<FlagRow>(conn)
                                      .optional()?;
                row.map(FlagRow::into_domain).transpose()
            })
    }

    fn list_flags(&self, status: Option<FlagStatus>) -> Result<Vec<Flag>, StoreError> {
        self.run(|conn| {
                let mut query = flags::table.into_boxed();
                if let Some(s) = status {
                    query = query.filter(flags::status.eq(s.as_str()));
                }
                let rows = query.order((flags::created_at.asc(), flags::name.asc()))
                                .load::<FlagRow>(conn)?;
                rows.into_iter().map(FlagRow::into_domain).collect()
            })
    }

    fn transition_status(&self, flag_id: Uuid, from: FlagStatus, to: FlagStatus, now: DateTime<Utc>)
                         -> Result<Flag, StoreError> {
        let flag = self.run(|conn| {
                           // UPDATE condicional: si el estado ya no es `from`, 0 filas.
                           let row = diesel::update(flags::table.filter(flags::id.eq(flag_id))
                                                                .filter(flags::status.eq(from.as_str())))
                               .set((flags::status.eq(to.as_str()), flags::updated_at.eq(now)))
                               .get_result::<FlagRow>(conn)
                               .optional()?;
                           match row {
                               Some(row) => row.into_domain(),
                               None => {
                                   let current = flags::table.find(flag_id)
                                                             .select(flags::status)
                                                             .first::<String>(conn)
                                                             .optional()?;
                                   Err(match current {
                                       None => PersistenceError::NotFound(format!("flag {flag_id}")),
                                       Some(s) => PersistenceError::Conflict(format!("flag {flag_id} is {s}, expected {from}")),
                                   })
                               }
                           }
                       })?;
        debug!("status transition flag_id={flag_id} {from} -> {to}");
        Ok(flag)
    }

    fn set_rollout(&self, flag_id: Uuid, pct: RolloutPercentage, now: DateTime<Utc>)
                   -> Result<(Flag, RolloutPercentage), StoreError> {
        self.run(|conn| {
                conn.build_transaction().read_write().run(|tx| {
                    let row = flags::table.filter(flags::id.eq(flag_id))
                                          .for_update()
                                          .load::<FlagRow>(tx)?
                                          .into_iter()
                                          .next()
                                          .ok_or_else(|| PersistenceError::NotFound(format!("flag {flag_id}")))?;
                    let mut flag = row.into_domain()?;
                    let previous = flag.rollout();
                    flag.config.rollout_percentage = Some(pct);
                    flag.updated_at = now;
                    // sólo config y updated_at; status queda como esté
                    let config = FlagRow::from_domain(&flag)?.config;
                    diesel::update(flags::table.find(flag_id)).set((flags::config.eq(&config), flags::updated_at.eq(now)))
                                                              .execute(tx)?;
                    Ok((flag, previous))
                })
            })
    }

    fn record_assessment(&self, record: &RiskRecord) -> Result<(), StoreError> {
        let row = RiskRow::from_domain(record)?;
        self.run(|conn| {
                conn.build_transaction().read_write().run(|tx| {
                    let n = diesel::update(flags::table.find(row.flag_id))
                        .set((flags::risk_level.eq(Some(row.risk_level.as_str())), flags::updated_at.eq(row.analyzed_at)))
                        .execute(tx)?;
                    if n == 0 {
                        return Err(PersistenceError::NotFound(format!("flag {}", row.flag_id)));
                    }
                    diesel::insert_into(risk_analyses::table).values(&row).execute(tx)?;
                    Ok(())
                })
            })?;
        debug!("risk assessment stored flag_id={} level={}", record.flag_id, row.risk_level);
        Ok(())
    }

    fn latest_assessment(&self, flag_id: Uuid) -> Result<Option<RiskRecord>, StoreError> {
        self.run(|conn| {
                let row = risk_analyses::table.filter(risk_analyses::flag_id.eq(flag_id))
                                              .order((risk_analyses::analyzed_at.desc(), risk_analyses::id.desc()))
                                              .first::<RiskRow>(conn)
                                              .optional()?;
                row.map(RiskRow::into_domain).transpose()
            })
    }

    fn insert_approval(&self, approval: &Approval) -> Result<(), StoreError> {
        let row = ApprovalRow::from_domain(approval);
        self.run(|conn| {
                diesel::insert_into(approvals::table).values(&row)
                                                     .execute(conn)
                                                     .map_err(|e| match PersistenceError::from(e) {
                                                         PersistenceError::UniqueViolation(_) => {
                                                             PersistenceError::Conflict(format!("approval request already pending for {} on flag {}",
                                                                                                row.approver, row.flag_id))
                                                         }
                                                         PersistenceError::ForeignKeyViolation(_) => {
                                                             PersistenceError::NotFound(format!("flag {}", row.flag_id))
                                                         }
                                                         other => other,
                                                     })?;
                Ok(())
            })
    }

    fn get_approval(&self, id: Uuid) -> Result<Option<Approval>, StoreError> {
        self.run(|conn| {
                let row = approvals::table.find(id).first::<ApprovalRow>(conn).optional()?;
                row.map(ApprovalRow::into_domain).transpose()
            })
    }

    fn list_approvals(&self, filter: &ApprovalFilter) -> Result<Vec<Approval>, StoreError> {
        self.run(|conn| {
                let mut query = approvals::table.into_boxed();
                if let Some(s) = filter.status {
                    query = query.filter(approvals::status.eq(s.as_str()));
                }
                if let Some(a) = filter.approver {
                    query = query.filter(approvals::approver.eq(a.as_str()));
                }
                if let Some(f) = filter.flag_id {
                    query = query.filter(approvals::flag_id.eq(f));
                }
                let rows = query.order((approvals::created_at.asc(), approvals::id.asc()))
                                .load::<ApprovalRow>(conn)?;
                rows.into_iter().map(ApprovalRow::into_domain).collect()
            })
    }

    fn commit_decision(&self, decided: &Approval, flag_status: FlagStatus, now: DateTime<Utc>) -> Result<(), StoreError> {
        let pending = ApprovalStatus::Pending.as_str();
        self.run(|conn| {
                conn.build_transaction().read_write().run(|tx| {
                    // UPDATE condicional: el segundo escritor concurrente ve 0 filas.
                    let n = diesel::update(approvals::table.filter(approvals::id.eq(decided.id))
                                                           .filter(approvals::status.eq(pending)))
                        .set((approvals::status.eq(decided.status.as_str()),
                              approvals::comment.eq(decided.comment.as_deref()),
                              approvals::decided_at.eq(decided.decided_at)))
                        .execute(tx)?;
                    if n == 0 {
                        let current = approvals::table.find(decided.id)
                                                      .select(approvals::status)
                                                      .first::<String>(tx)
                                                      .optional()?;
                        return Err(match current {
                            None => PersistenceError::NotFound(format!("approval {}", decided.id)),
                            Some(s) => PersistenceError::Conflict(format!("approval {} already {}", decided.id, s)),
                        });
                    }
                    let n = diesel::update(flags::table.filter(flags::id.eq(decided.flag_id))
                                                       .filter(flags::status.eq(FlagStatus::Pending.as_str())))
                        .set((flags::status.eq(flag_status.as_str()), flags::updated_at.eq(now)))
                        .execute(tx)?;
                    if n == 0 {
                        return Err(PersistenceError::Conflict(format!("flag {} is no longer pending", decided.flag_id)));
                    }
                    Ok(())
                })
            })?;
        debug!("decision committed approval_id={} flag_id={} -> {}", decided.id, decided.flag_id, flag_status);
        Ok(())
    }
}

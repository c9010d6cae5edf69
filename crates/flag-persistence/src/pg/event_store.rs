use chrono::{DateTime, Utc};
use diesel::prelude::*;
use flag_core::{EventStore, FlagEvent, FlagEventKind, StoreError};
use log::{debug, warn};
use uuid::Uuid;

use super::rows::{EventRow, NewEventRow};
use super::{with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::flag_event_log;

/// Implementación Postgres de `EventStore` (append-only).
///
/// `seq` es global a la tabla (BIGSERIAL): dentro de un flag es estrictamente
/// creciente, aunque no contiguo.
pub struct PgEventStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgEventStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> EventStore for PgEventStore<P> {
    fn append_kind(&self, flag_id: Uuid, kind: FlagEventKind) -> Result<FlagEvent, StoreError> {
        let event_type = kind.event_type();
        // guardamos el enum completo; event_type queda como índice/constraint
        let payload = serde_json::to_value(&kind).map_err(|e| StoreError::Backend(format!("serialize {event_type}: {e}")))?;
        let (seq, ts): (i64, DateTime<Utc>) = with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(flag_event_log::table).values(NewEventRow { flag_id: &flag_id,
                                                                            event_type,
                                                                            payload: &payload })
                                                      .returning((flag_event_log::seq, flag_event_log::ts))
                                                      .get_result(&mut *conn)
                                                      .map_err(PersistenceError::from)
        })?;
        debug!("append_kind flag_id={flag_id} seq={seq} type={event_type}");
        Ok(FlagEvent { seq: seq as u64,
                       flag_id,
                       kind,
                       ts })
    }

    fn list(&self, flag_id: Uuid) -> Result<Vec<FlagEvent>, StoreError> {
        let rows: Vec<EventRow> = with_retry(|| {
            let mut conn = self.provider.connection()?;
            flag_event_log::table.filter(flag_event_log::flag_id.eq(flag_id))
                                 .order(flag_event_log::seq.asc())
                                 .load(&mut *conn)
                                 .map_err(PersistenceError::from)
        })?;
        // Un payload ilegible no debe ocultar el resto del historial.
        let events: Vec<FlagEvent> = rows.into_iter()
                                         .filter_map(|row| match row.into_domain() {
                                             Ok(ev) => Some(ev),
                                             Err(e) => {
                                                 warn!("skipping unreadable event for flag {flag_id}: {e}");
                                                 None
                                             }
                                         })
                                         .collect();
        debug!("list flag_id={flag_id} count={}", events.len());
        Ok(events)
    }
}

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::{FlagEvent, FlagEventKind};
use crate::repo::StoreError;

/// Almacenamiento de eventos append-only.
pub trait EventStore: Send + Sync {
    /// Agrega un evento a partir de su kind y devuelve el evento completo (con seq y ts).
    fn append_kind(&self, flag_id: Uuid, kind: FlagEventKind) -> Result<FlagEvent, StoreError>;
    /// Lista eventos de un flag (orden ascendente por seq).
    fn list(&self, flag_id: Uuid) -> Result<Vec<FlagEvent>, StoreError>;
}

#[derive(Default)]
pub struct InMemoryEventStore {
    pub inner: DashMap<Uuid, Vec<FlagEvent>>,
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&self, flag_id: Uuid, kind: FlagEventKind) -> Result<FlagEvent, StoreError> {
        let mut events = self.inner.entry(flag_id).or_default();
        let seq = events.len() as u64;
        let ev = FlagEvent { seq, flag_id, kind, ts: Utc::now() };
        events.push(ev.clone());
        Ok(ev)
    }

    fn list(&self, flag_id: Uuid) -> Result<Vec<FlagEvent>, StoreError> {
        Ok(self.inner.get(&flag_id).map(|v| v.value().clone()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_contiguous_per_flag() {
        let store = InMemoryEventStore::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        for i in 0..4u8 {
            store.append_kind(a, FlagEventKind::RolloutChanged { from: i, to: i + 1 }).unwrap();
        }
        store.append_kind(b, FlagEventKind::RiskAssessmentSkipped { reason: "x".into() }).unwrap();
        let seqs: Vec<u64> = store.list(a).unwrap().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3]);
        assert_eq!(store.list(b).unwrap()[0].seq, 0);
        assert!(store.list(Uuid::new_v4()).unwrap().is_empty());
    }
}

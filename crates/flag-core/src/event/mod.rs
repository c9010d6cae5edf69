//! Definiciones de eventos de auditoría y trait EventStore.

mod store;
mod types;

pub use store::{EventStore, InMemoryEventStore};
pub use types::{FlagEvent, FlagEventKind};

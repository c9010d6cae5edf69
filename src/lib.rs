//! flaggate
//!
//! Capa de aplicación del gate de feature flags:
//! - `config`: configuración desde el entorno (`AppConfig`).
//! - `errors`: `AppError` con códigos de salida para binarios.
//! - constructores de workflow en memoria o sobre Postgres.
//!
//! El núcleo vive en `flag-core`; el dominio en `flag-domain`.

pub mod config;
pub mod errors;

pub use config::{AppConfig, CONFIG};
pub use errors::AppError;

use flag_core::{ApprovalWorkflow, InMemoryEventStore, InMemoryFlagStore};
use flag_persistence::{build_pool, PgEventStore, PgFlagStore, PoolProvider};

pub type MemoryWorkflow = ApprovalWorkflow<InMemoryFlagStore, InMemoryEventStore>;
pub type PgWorkflow = ApprovalWorkflow<PgFlagStore<PoolProvider>, PgEventStore<PoolProvider>>;

/// Workflow en memoria con el scorer que corresponde a la configuración.
pub fn memory_workflow(cfg: &AppConfig) -> MemoryWorkflow {
    ApprovalWorkflow::in_memory(flag_adapters::build_scorer(&cfg.reasoner))
}

/// Workflow sobre Postgres. Requiere `DATABASE_URL`; corre migraciones
/// pendientes al construir el pool.
pub fn pg_workflow(cfg: &AppConfig) -> Result<PgWorkflow, AppError> {
    let db = cfg.database
                .as_ref()
                .ok_or_else(|| AppError::Config("DATABASE_URL no definido".into()))?;
    let pool = build_pool(&db.url, db.min_connections, db.max_connections)?;
    let provider = PoolProvider { pool };
    Ok(ApprovalWorkflow::new_with_stores(PgFlagStore::new(provider.clone()),
                                         PgEventStore::new(provider),
                                         flag_adapters::build_scorer(&cfg.reasoner)))
}

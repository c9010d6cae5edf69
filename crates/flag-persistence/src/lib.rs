//! flag-persistence
//!
//! Implementaciones Postgres (Diesel + r2d2) de `FlagStore` y `EventStore`,
//! más utilidades de conexión y migraciones embebidas.
//!
//! Módulos:
//! - `pg`: stores sobre Postgres con reintento ante fallos transitorios.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.
//! - `schema`: tablas Diesel declaradas para compilar queries.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_dev_pool_from_env, build_pool, ConnectionProvider, PgEventStore, PgFlagStore, PgPool, PoolProvider};

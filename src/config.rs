//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) una sola vez y expone `AppConfig`.
//! Nunca hace panic: la base de datos es opcional y el razonador se degrada a
//! sólo palabras clave cuando falta la credencial.
use flag_adapters::ReasonerConfig;
use flag_persistence::DbConfig;
use once_cell::sync::Lazy;

/// Configuración global de la aplicación.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Razonador externo (siempre presente; puede estar deshabilitado).
    pub reasoner: ReasonerConfig,
    /// `None` si `DATABASE_URL` no está definido.
    pub database: Option<DbConfig>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        flag_persistence::init_dotenv();
        Self { reasoner: ReasonerConfig::from_env(),
               database: DbConfig::from_env().ok() }
    }

    pub fn has_database(&self) -> bool {
        self.database.is_some()
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

//! flag-adapters: implementaciones concretas de `ExternalReasoner`.
//!
//! - `ChatCompletionsReasoner`: cliente HTTP bloqueante contra un endpoint
//!   estilo chat-completions.
//! - `StaticReasoner`: respuesta fija, útil en demos y tests.
//! - `ReasonerConfig`: lectura de credenciales y parámetros desde el entorno.
//!
//! El core sólo ve el trait; aquí vive todo lo que toca red o entorno.

pub mod chat;
pub mod config;
pub mod fixed;
pub mod prompt;

pub use chat::ChatCompletionsReasoner;
pub use config::{build_scorer, init_dotenv, ReasonerConfig};
pub use fixed::StaticReasoner;
pub use prompt::{build_prompt, SYSTEM_PROMPT};

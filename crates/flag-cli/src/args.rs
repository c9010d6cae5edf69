//! Parsing mínimo de `<comando> --clave valor ...`.

use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgError {
    /// Uso incorrecto (falta comando u opción): exit 2.
    #[error("{0}")]
    Usage(String),
    /// Valor presente pero inválido: exit 3.
    #[error("invalid value for --{key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl ArgError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ArgError::Usage(_) => 2,
            ArgError::Invalid { .. } => 3,
        }
    }
}

#[derive(Debug)]
pub struct Args {
    pub command: String,
    opts: HashMap<String, String>,
}

impl Args {
    /// `argv` sin el nombre del programa.
    pub fn parse<I>(argv: I) -> Result<Self, ArgError>
        where I: IntoIterator<Item = String>
    {
        let mut it = argv.into_iter();
        let command = it.next().ok_or_else(|| ArgError::Usage("missing command".into()))?;
        let mut opts = HashMap::new();
        while let Some(flag) = it.next() {
            let key = flag.strip_prefix("--")
                          .ok_or_else(|| ArgError::Usage(format!("unexpected argument: {flag}")))?;
            let value = it.next()
                          .ok_or_else(|| ArgError::Usage(format!("missing value for --{key}")))?;
            opts.insert(key.to_string(), value);
        }
        Ok(Self { command, opts })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.opts.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> Result<&str, ArgError> {
        self.get(key).ok_or_else(|| ArgError::Usage(format!("{} requires --{key}", self.command)))
    }

    pub fn require_parsed<T>(&self, key: &str) -> Result<T, ArgError>
        where T: FromStr,
              T::Err: std::fmt::Display
    {
        let raw = self.require(key)?;
        raw.parse().map_err(|e: T::Err| ArgError::Invalid { key: key.to_string(),
                                                             reason: e.to_string() })
    }

    pub fn parsed<T>(&self, key: &str) -> Result<Option<T>, ArgError>
        where T: FromStr,
              T::Err: std::fmt::Display
    {
        match self.get(key) {
            None => Ok(None),
            Some(_) => self.require_parsed(key).map(Some),
        }
    }

    pub fn uuid(&self, key: &str) -> Result<Uuid, ArgError> {
        self.require_parsed::<Uuid>(key)
    }
}

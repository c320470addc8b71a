//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno. Los valores inválidos
//! se reportan como error al arrancar.

use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

/// Qué cambios de estado acepta el guard de servicios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Cualquier estado a cualquier estado
    #[default]
    Permissive,
    /// Un servicio `completed` o `cancelled` ya no cambia de estado
    Strict,
}

impl FromStr for TransitionPolicy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "strict" => Ok(TransitionPolicy::Strict),
            other => Err(anyhow!("unknown allocation transition policy '{}'", other)),
        }
    }
}

/// Reglas para editar servicios existentes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocationPolicy {
    pub transitions: TransitionPolicy,
    /// Revalidar cupo al volver un servicio a `active`
    pub recheck_capacity_on_reactivation: bool,
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    /// Sin URL se usa el almacenamiento en memoria
    pub database_url: Option<String>,
    pub cors_origins: Vec<String>,
    pub log_level: tracing::Level,
    pub allocation_policy: AllocationPolicy,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 3000,
            host: "0.0.0.0".to_string(),
            database_url: None,
            cors_origins: Vec::new(),
            log_level: tracing::Level::DEBUG,
            allocation_policy: AllocationPolicy::default(),
        }
    }
}

impl EnvironmentConfig {
    /// Leer la configuración desde las variables de entorno
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().context("PORT must be a valid number")?,
            Err(_) => defaults.port,
        };

        let log_level = match env::var("LOG_LEVEL") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| anyhow!("LOG_LEVEL must be one of trace, debug, info, warn, error"))?,
            Err(_) if environment == "development" => tracing::Level::DEBUG,
            Err(_) => tracing::Level::INFO,
        };

        let transitions = match env::var("ALLOCATION_TRANSITIONS") {
            Ok(raw) => raw.parse()?,
            Err(_) => TransitionPolicy::default(),
        };

        let recheck_capacity_on_reactivation = match env::var("RECHECK_CAPACITY_ON_REACTIVATION") {
            Ok(raw) => parse_flag(&raw).context("RECHECK_CAPACITY_ON_REACTIVATION must be a boolean")?,
            Err(_) => false,
        };

        Ok(Self {
            environment,
            port,
            host: env::var("HOST").unwrap_or(defaults.host),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            log_level,
            allocation_policy: AllocationPolicy {
                transitions,
                recheck_capacity_on_reactivation,
            },
        })
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("invalid boolean '{}'", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_policy_parsing() {
        assert_eq!("strict".parse::<TransitionPolicy>().unwrap(), TransitionPolicy::Strict);
        assert_eq!(" Permissive ".parse::<TransitionPolicy>().unwrap(), TransitionPolicy::Permissive);
        assert!("graph".parse::<TransitionPolicy>().is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(!parse_flag("0").unwrap());
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn test_default_policy_keeps_permissive_behavior() {
        let policy = AllocationPolicy::default();
        assert_eq!(policy.transitions, TransitionPolicy::Permissive);
        assert!(!policy.recheck_capacity_on_reactivation);
    }
}

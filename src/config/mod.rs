//! Configuración del proyecto
//!
//! Este módulo contiene la configuración de base de datos, variables de entorno
//! y las políticas de negocio configurables.

pub mod database;
pub mod environment;

pub use environment::*;

//! School transport: solicitudes de servicio y asignación de cupos
//!
//! Apoderados solicitan un asiento para un estudiante en una ruta; el
//! conductor acepta o rechaza. El núcleo garantiza que los servicios
//! activos de una ruta nunca superen su capacidad y que desactivar una ruta
//! deshaga sus servicios de forma atómica.

pub mod config;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

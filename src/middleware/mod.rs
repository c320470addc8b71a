//! Middleware del sistema
//!
//! Extracción de la identidad del llamador, cuerpos JSON y CORS.

pub mod cors;
pub mod json_body;
pub mod principal;

pub use cors::cors_layer;
pub use json_body::JsonBody;
pub use principal::CallerIdentity;

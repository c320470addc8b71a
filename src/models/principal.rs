//! Identidad del llamador
//!
//! La capa que invoca al núcleo ya autenticó al usuario; aquí solo se
//! transporta su id y rol para los chequeos de propiedad.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guardian,
    Driver,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Guardian => f.write_str("guardian"),
            Role::Driver => f.write_str("driver"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "guardian" => Ok(Role::Guardian),
            "driver" => Ok(Role::Driver),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Usuario autenticado que llega desde la capa externa
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn guardian(id: Uuid) -> Self {
        Self { id, role: Role::Guardian }
    }

    pub fn driver(id: Uuid) -> Self {
        Self { id, role: Role::Driver }
    }
}

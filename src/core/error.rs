use thiserror::Error;

use crate::core::types::{EntityId, SpellId, TemplateEntry};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Unknown creature template: {0:?}")]
    UnknownTemplate(TemplateEntry),

    #[error("Unknown spell: {0:?}")]
    UnknownSpell(SpellId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

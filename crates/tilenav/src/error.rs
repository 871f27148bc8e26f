//! Ошибки nav cache
//!
//! Отсутствие ключа в mapping'е — не ошибка (`Option`). Здесь только нарушения
//! предусловий и отсутствующие коллабораторы.

use std::{io, path::PathBuf};

use bevy::math::Vec3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavCacheError {
    /// Индекс описывает другой source list (список пересобран без пересборки индекса)
    #[error("grid source index is stale: built for generation {index}, source list is generation {list}")]
    StaleIndex { index: u64, list: u64 },

    /// Нужный resource (grid, modifier mapping) отсутствует в момент мутации
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// Ни одной коллекции ещё не было — индекса и подписки нет
    #[error("no collection pass has run yet")]
    NotCollected,
}

#[derive(Debug, Error)]
pub enum NavConfigError {
    #[error("invalid grid layout: cell_size must be positive and finite, got {cell_size:?}")]
    InvalidLayout { cell_size: Vec3 },
    #[error("failed to parse nav config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read nav config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

//! Nickname source
//!
//! A fixed pool of display names, loaded once at startup from a JSON array
//! of strings or taken from the built-in list.

use std::path::Path;

use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;

const DEFAULT_NICKNAMES: &[&str] = &[
    "Aardvark", "Badger", "Capybara", "Dingo", "Echidna", "Ferret", "Gecko", "Heron",
    "Ibex", "Jackal", "Kestrel", "Lemur", "Marmot", "Narwhal", "Ocelot", "Pangolin",
    "Quokka", "Raccoon", "Stoat", "Tapir", "Urchin", "Vole", "Wombat", "Yak", "Zebu",
];

/// Non-empty list of candidate display names
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct NicknamePool {
    names: Vec<String>,
}

impl NicknamePool {
    /// Build a pool from names; fails if there are none
    pub fn new(names: Vec<String>) -> Result<Self, AppError> {
        if names.is_empty() {
            return Err(AppError::EmptyNicknamePool);
        }
        Ok(Self { names })
    }

    /// Parse a JSON array of strings
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        let pool: NicknamePool = serde_json::from_str(json)?;
        Self::new(pool.names)
    }

    /// Read and parse a JSON nickname file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let pool = Self::from_json(&std::fs::read_to_string(path)?)?;
        info!("Loaded {} nicknames from {}", pool.len(), path.display());
        Ok(pool)
    }

    /// Uniformly random name from the pool
    pub fn pick_random(&self) -> String {
        self.names
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for NicknamePool {
    fn default() -> Self {
        Self {
            names: DEFAULT_NICKNAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

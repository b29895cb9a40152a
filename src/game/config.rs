use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Match settings. Defaults are the commander format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub starting_life: u32,
    pub opening_hand_size: usize,
    pub max_hand_size: usize,
    /// Extra generic mana added per previous cast from the command zone
    pub commander_tax_step: u32,
    /// When false, spells go on the stack without paying their cmc
    pub enforce_mana_costs: bool,
    /// RNG seed. `None` picks a random one.
    pub seed: Option<u64>,
    /// One seat per name, in turn order
    pub player_names: Vec<String>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            starting_life: 40,
            opening_hand_size: 7,
            max_hand_size: 7,
            commander_tax_step: 2,
            enforce_mana_costs: true,
            seed: None,
            player_names: vec!["Player 1".to_string(), "Player 2".to_string()],
        }
    }
}

impl MatchConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

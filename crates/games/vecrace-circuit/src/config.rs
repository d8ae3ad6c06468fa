use serde::{Deserialize, Serialize};

use vecrace_core::game_trait::GameConfig;
use vecrace_core::grid::CornerPolicy;

/// Data-driven rules for the circuit race.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitConfig {
    /// Turns a racer sits out after crashing.
    pub turns_to_skip: u32,
    /// Largest acceleration a racer may pick (Euclidean length, in cells).
    pub max_acceleration: f64,
    /// Which cells count as crossed when a move passes exactly through a grid corner.
    pub corner_policy: CornerPolicy,
    /// When set, advancing the turn burns one skip turn of every penalised
    /// racer it passes over instead of waiting for them to submit.
    pub auto_pass_skipped_turns: bool,
    /// Moves a racer must have made before crossing the line counts as a finish.
    pub min_moves_before_finish: u32,
    /// Total turns (including skipped ones) before the race is called.
    pub turn_limit: u32,
    /// Shuffle the turn order with this seed; roster order when unset.
    pub turn_order_seed: Option<u64>,
    /// Extra points for the winner.
    pub first_place_bonus: i32,
    /// Points lost per crash by racers who do not finish.
    pub crash_penalty: i32,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            turns_to_skip: 2,
            max_acceleration: 4.0,
            corner_policy: CornerPolicy::EdgeConnected,
            auto_pass_skipped_turns: false,
            min_moves_before_finish: 4,
            turn_limit: 1000,
            turn_order_seed: None,
            first_place_bonus: 2,
            crash_penalty: 1,
        }
    }
}

impl CircuitConfig {
    /// Load config from a TOML file. Falls back to defaults if the file is
    /// missing or unparseable.
    pub fn load() -> Self {
        let path = std::env::var("VECRACE_CIRCUIT_CONFIG")
            .unwrap_or_else(|_| "config/circuit.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_toml(&content).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse {path}: {e}, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Per-session overrides carried in `GameConfig::custom`.
    pub fn with_overrides(mut self, config: &GameConfig) -> Self {
        if let Some(turns) = config.custom_u64("turns_to_skip") {
            self.turns_to_skip = u32::try_from(turns).unwrap_or(u32::MAX);
        }
        if let Some(limit) = config.custom_u64("turn_limit") {
            self.turn_limit = u32::try_from(limit).unwrap_or(u32::MAX);
        }
        if let Some(seed) = config.custom_u64("turn_order_seed") {
            self.turn_order_seed = Some(seed);
        }
        self
    }
}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::vector::Vec2;

/// Unique identifier for a player in the game.
pub type PlayerId = u64;

/// Core trait for turn-based games.
///
/// The host owns seating, transport and rendering; the game only decides
/// whose turn it is and what a submitted input does to the shared state.
/// Every call either applies completely or leaves the state untouched.
pub trait TurnBasedGame: Send + Sync {
    /// Game metadata for the lobby selection screen.
    fn metadata(&self) -> GameMetadata;

    /// Called once when the game is selected and players are ready.
    fn init(&mut self, players: &[super::player::Player], config: &GameConfig);

    /// The player expected to act next, or `None` once the round is over.
    fn current_player(&self) -> Option<PlayerId>;

    /// Apply a player's encoded input. Returns the events it produced;
    /// malformed or out-of-turn input produces none.
    fn apply_input(&mut self, player_id: PlayerId, input: &[u8]) -> Vec<GameEvent>;

    /// Serialize the authoritative game state for broadcast.
    fn serialize_state(&self) -> Vec<u8>;

    /// Apply authoritative state received from the host.
    fn apply_state(&mut self, state: &[u8]);

    /// Called when a new player joins mid-game.
    fn player_joined(&mut self, player: &super::player::Player);

    /// Called when a player disconnects.
    fn player_left(&mut self, player_id: PlayerId);

    /// Whether the current round is complete.
    fn is_round_complete(&self) -> bool;

    /// Final scores for the completed round.
    fn round_results(&self) -> Vec<PlayerScore>;
}

/// Game metadata for the lobby selection screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub name: String,
    pub description: String,
    pub min_players: u8,
    pub max_players: u8,
}

/// Configuration for a game session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    /// Game-specific overrides, keyed by setting name.
    pub custom: HashMap<String, serde_json::Value>,
}

impl GameConfig {
    pub fn custom_u64(&self, key: &str) -> Option<u64> {
        self.custom.get(key).and_then(|v| v.as_u64())
    }
}

/// Events emitted while resolving a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    TurnTaken { player_id: PlayerId },
    TurnSkipped { player_id: PlayerId, turns_remaining: u32 },
    Crashed { player_id: PlayerId, position: Vec2 },
    Finished { player_id: PlayerId, place: u32 },
    RoundComplete,
}

/// Score entry for a player at the end of a round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerScore {
    pub player_id: PlayerId,
    pub score: i32,
}

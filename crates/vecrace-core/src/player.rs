use serde::{Deserialize, Serialize};

use crate::game_trait::PlayerId;

/// A player seated at the table, before any game-specific state exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub color: PlayerColor,
    pub is_spectator: bool,
}

/// Colour used to draw the player's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for PlayerColor {
    fn default() -> Self {
        Self::PALETTE[0]
    }
}

impl PlayerColor {
    /// Path colours handed out in seat order.
    pub const PALETTE: &[PlayerColor] = &[
        PlayerColor { r: 0, g: 0, b: 255 },     // Blue
        PlayerColor { r: 255, g: 140, b: 0 },   // Orange
        PlayerColor { r: 46, g: 160, b: 67 },   // Green
        PlayerColor { r: 130, g: 88, b: 255 },  // Purple
        PlayerColor { r: 0, g: 170, b: 170 },   // Teal
        PlayerColor { r: 255, g: 107, b: 175 }, // Pink
    ];

    /// Palette colour for the `seat`-th player, wrapping around.
    pub fn for_seat(seat: usize) -> Self {
        Self::PALETTE[seat % Self::PALETTE.len()]
    }
}

pub mod game_trait;
pub mod grid;
pub mod player;
pub mod track;
pub mod vector;

pub use grid::{CornerPolicy, Crossing, Traversal, trace_line, trace_line_with};
pub use track::{CellKind, SharedTrack, TrackBitmap, TrackOracle};
pub use vector::{GridCell, Vec2, add, subtract};

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::sync::Arc;

    use crate::game_trait::{GameConfig, PlayerId, PlayerScore, TurnBasedGame};
    use crate::player::{Player, PlayerColor};
    use crate::track::{SharedTrack, TrackBitmap};

    /// A 24x12 ring: a three-cell-wide loop around a solid infield, with the
    /// start/finish line crossing the top straight at x = 12.
    pub const RING_TRACK: &str = "
        ########################
        #...........S..........#
        #...........S..........#
        #...........S..........#
        #...################...#
        #...################...#
        #...################...#
        #...################...#
        #......................#
        #......................#
        #......................#
        ########################
    ";

    pub fn ring_track() -> SharedTrack {
        Arc::new(TrackBitmap::from_ascii(RING_TRACK).expect("ring track sketch is valid"))
    }

    /// Create `n` test players with sequential IDs starting at 1.
    pub fn make_players(n: usize) -> Vec<Player> {
        (0..n)
            .map(|i| Player {
                id: i as PlayerId + 1,
                display_name: format!("Player{}", i + 1),
                color: PlayerColor::for_seat(i),
                is_spectator: false,
            })
            .collect()
    }

    pub fn default_config() -> GameConfig {
        GameConfig::default()
    }

    // ================================================================
    // Game Trait Contract Tests
    // ================================================================
    // Every TurnBasedGame implementation must pass these. Game crates call
    // them from their own #[cfg(test)] modules with a concrete game and a
    // valid encoded input.

    /// After init() with N players, serialize_state() must return non-empty
    /// bytes and someone must be on turn.
    pub fn contract_init_creates_player_state(game: &mut dyn TurnBasedGame, player_count: usize) {
        let players = make_players(player_count);
        game.init(&players, &default_config());
        assert!(
            !game.serialize_state().is_empty(),
            "serialize_state() must return non-empty bytes after init"
        );
        assert!(
            game.current_player().is_some(),
            "a freshly initialised game must have a current player"
        );
    }

    /// apply_input() with valid data from the current player must change state.
    pub fn contract_apply_input_changes_state(game: &mut dyn TurnBasedGame, valid_input: &[u8]) {
        let player_id = game
            .current_player()
            .expect("contract requires a player on turn");
        let before = game.serialize_state();
        game.apply_input(player_id, valid_input);
        let after = game.serialize_state();
        assert_ne!(before, after, "State must change after a valid turn");
    }

    /// Input from a player who is not on turn must not change state.
    pub fn contract_out_of_turn_input_ignored(
        game: &mut dyn TurnBasedGame,
        valid_input: &[u8],
        player_id: PlayerId,
    ) {
        assert_ne!(game.current_player(), Some(player_id));
        let before = game.serialize_state();
        let events = game.apply_input(player_id, valid_input);
        assert!(events.is_empty(), "out-of-turn input must produce no events");
        assert_eq!(
            before,
            game.serialize_state(),
            "out-of-turn input must not change state"
        );
    }

    /// Malformed input must be dropped without touching state.
    pub fn contract_malformed_input_ignored(game: &mut dyn TurnBasedGame) {
        let player_id = game
            .current_player()
            .expect("contract requires a player on turn");
        let before = game.serialize_state();
        let events = game.apply_input(player_id, &[0xc1, 0xff, 0x00]);
        assert!(events.is_empty());
        assert_eq!(before, game.serialize_state());
    }

    /// serialize_state → apply_state roundtrip must be stable.
    pub fn contract_state_roundtrip_preserves(game: &mut dyn TurnBasedGame) {
        let state_a = game.serialize_state();
        game.apply_state(&state_a);
        let state_b = game.serialize_state();
        assert_eq!(
            state_a, state_b,
            "State must be stable after serialize→apply→serialize roundtrip"
        );
    }

    /// player_left() must remove player data from state.
    pub fn contract_player_left_cleanup(
        game: &mut dyn TurnBasedGame,
        player_id: PlayerId,
        player_count: usize,
    ) {
        let before = game.serialize_state();
        game.player_left(player_id);
        let after = game.serialize_state();
        assert_ne!(before, after, "player_left must change state");
        let results = game.round_results();
        assert_eq!(
            results.len(),
            player_count - 1,
            "round_results should have {} entries after removing player",
            player_count - 1
        );
    }

    /// round_results() must return an entry for each active player.
    pub fn contract_round_results_complete(
        game: &dyn TurnBasedGame,
        expected_players: usize,
    ) -> Vec<PlayerScore> {
        let results = game.round_results();
        assert_eq!(
            results.len(),
            expected_players,
            "round_results must have one entry per active player"
        );
        results
    }
}

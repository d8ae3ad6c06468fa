pub mod config;
pub mod racer;
pub mod scoring;
pub mod starting_grid;
pub mod validator;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use vecrace_core::game_trait::{
    GameConfig, GameEvent, GameMetadata, PlayerId, PlayerScore, TurnBasedGame,
};
use vecrace_core::player::Player;
use vecrace_core::track::SharedTrack;
use vecrace_core::vector::Vec2;

pub use config::CircuitConfig;
pub use racer::{Action, Car, Move, RaceEvent, Racer};
pub use validator::InvalidInput;

use starting_grid::starting_grid;
use validator::Resolution;

/// Serializable race state broadcast from host to clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaceState {
    /// Racers in turn order.
    pub racers: Vec<Racer>,
    /// Index into `racers` of the racer on turn.
    pub current: usize,
    /// Turns resolved so far, skipped ones included.
    pub turns_played: u32,
    pub finish_order: Vec<PlayerId>,
    pub round_complete: bool,
}

/// Input from a racer for one turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaceInput {
    /// Chosen acceleration; `None` coasts.
    pub dv: Option<Vec2>,
}

/// What happened to a submitted turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// A move was appended to the racer's history. It may carry a crash.
    Applied(Move),
    Rejected(RejectReason),
}

/// Why a submission did not produce a move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    /// The acceleration was malformed. Nothing changed.
    InvalidInput(InvalidInput),
    /// Someone else is on turn. Nothing changed.
    NotCurrentPlayer,
    /// The racer is serving a crash penalty. One skip turn was consumed and
    /// the turn passed on; `turns_remaining` is what is left afterwards.
    SkipActive { turns_remaining: u32 },
    UnknownPlayer,
    RaceOver,
}

impl RejectReason {
    /// The submission came from a racer who may not act right now.
    pub fn is_turn_not_active(&self) -> bool {
        matches!(
            self,
            RejectReason::NotCurrentPlayer | RejectReason::SkipActive { .. }
        )
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(e) => write!(f, "invalid input: {e}"),
            Self::NotCurrentPlayer => write!(f, "not this player's turn"),
            Self::SkipActive { turns_remaining } => {
                write!(f, "turn skipped, {turns_remaining} more to sit out")
            },
            Self::UnknownPlayer => write!(f, "player is not in this race"),
            Self::RaceOver => write!(f, "the race is over"),
        }
    }
}

impl std::error::Error for RejectReason {}

/// Read-only view of one racer for renderers.
#[derive(Debug, Clone, Copy)]
pub struct PlayerView<'a> {
    pub position: Vec2,
    pub velocity: Vec2,
    pub moves: &'a [Move],
    pub skip_turns_remaining: u32,
    pub finished: bool,
}

/// Turn-based vector race on a bitmap circuit.
pub struct VectorRace {
    track: SharedTrack,
    state: RaceState,
    base_config: CircuitConfig,
    config: CircuitConfig,
}

impl VectorRace {
    pub fn new(track: SharedTrack) -> Self {
        Self::with_config(track, CircuitConfig::load())
    }

    pub fn with_config(track: SharedTrack, config: CircuitConfig) -> Self {
        Self {
            track,
            state: RaceState::default(),
            base_config: config.clone(),
            config,
        }
    }

    pub fn state(&self) -> &RaceState {
        &self.state
    }

    /// Rules in effect for the current race, session overrides included.
    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    pub fn track(&self) -> &SharedTrack {
        &self.track
    }

    pub fn player_state(&self, player_id: PlayerId) -> Option<PlayerView<'_>> {
        self.racer(player_id).map(|r| PlayerView {
            position: r.position(),
            velocity: r.velocity(),
            moves: &r.moves,
            skip_turns_remaining: r.skip_turns_remaining,
            finished: r.finished,
        })
    }

    pub fn racer(&self, player_id: PlayerId) -> Option<&Racer> {
        self.state.racers.iter().find(|r| r.id == player_id)
    }

    fn index_of(&self, player_id: PlayerId) -> Option<usize> {
        self.state.racers.iter().position(|r| r.id == player_id)
    }

    /// Submit the current racer's acceleration for this turn. The only way
    /// moves enter the race.
    pub fn submit_acceleration(&mut self, player_id: PlayerId, dv: Option<Vec2>) -> TurnOutcome {
        self.resolve_turn(player_id, dv, &mut Vec::new())
    }

    fn resolve_turn(
        &mut self,
        player_id: PlayerId,
        dv: Option<Vec2>,
        events: &mut Vec<GameEvent>,
    ) -> TurnOutcome {
        if self.state.round_complete {
            return TurnOutcome::Rejected(RejectReason::RaceOver);
        }
        let Some(idx) = self.index_of(player_id) else {
            return TurnOutcome::Rejected(RejectReason::UnknownPlayer);
        };
        if idx != self.state.current {
            return TurnOutcome::Rejected(RejectReason::NotCurrentPlayer);
        }
        if let Err(e) = validator::validate_acceleration(dv, &self.config) {
            return TurnOutcome::Rejected(RejectReason::InvalidInput(e));
        }

        let pivot = self.track.center();
        let racer = &mut self.state.racers[idx];
        if racer.is_skipping() {
            racer.skip_turns_remaining -= 1;
            let turns_remaining = racer.skip_turns_remaining;
            tracing::debug!(player_id, turns_remaining, "Skip turn consumed");
            events.push(GameEvent::TurnSkipped {
                player_id,
                turns_remaining,
            });
            self.end_turn(events);
            return TurnOutcome::Rejected(RejectReason::SkipActive { turns_remaining });
        }

        let resolution = validator::resolve_move(racer, dv, &*self.track, &self.config);
        events.push(GameEvent::TurnTaken { player_id });
        let mv = match resolution {
            Resolution::Clear { mv, crossed_line } => {
                let counts = racer.moves.len() >= self.config.min_moves_before_finish as usize;
                racer.moves.push(mv.clone());
                if crossed_line && counts && racer.has_lapped(pivot) {
                    racer.finished = true;
                    self.state.finish_order.push(player_id);
                    let place = self.state.finish_order.len() as u32;
                    tracing::info!(player_id, place, "Racer finished");
                    events.push(GameEvent::Finished { player_id, place });
                }
                mv
            },
            Resolution::Crashed { mv, turns_to_skip } => {
                racer.skip_turns_remaining = turns_to_skip;
                racer.moves.push(mv.clone());
                tracing::info!(
                    player_id,
                    x = mv.to.x,
                    y = mv.to.y,
                    turns_to_skip,
                    "Racer crashed"
                );
                events.push(GameEvent::Crashed {
                    player_id,
                    position: mv.to,
                });
                mv
            },
        };

        self.end_turn(events);
        TurnOutcome::Applied(mv)
    }

    fn end_turn(&mut self, events: &mut Vec<GameEvent>) {
        self.state.turns_played += 1;
        let everyone_finished = self.state.racers.iter().all(|r| r.finished);
        if everyone_finished || self.state.turns_played >= self.config.turn_limit {
            self.complete_round(events);
            return;
        }
        self.advance_from(self.state.current, events);
    }

    /// Hand the turn to the first unfinished racer after `from`.
    fn advance_from(&mut self, from: usize, events: &mut Vec<GameEvent>) {
        if self.state.racers.iter().all(|r| r.finished) {
            return;
        }
        let count = self.state.racers.len();
        let auto_pass = self.config.auto_pass_skipped_turns;
        let mut idx = from;
        // Terminates: an unfinished racer exists and every pass over a
        // penalised racer lowers its counter.
        loop {
            idx = (idx + 1) % count;
            let racer = &mut self.state.racers[idx];
            if racer.finished {
                continue;
            }
            if auto_pass && racer.skip_turns_remaining > 0 {
                racer.skip_turns_remaining -= 1;
                tracing::debug!(
                    player_id = racer.id,
                    turns_remaining = racer.skip_turns_remaining,
                    "Skip turn auto-passed"
                );
                events.push(GameEvent::TurnSkipped {
                    player_id: racer.id,
                    turns_remaining: racer.skip_turns_remaining,
                });
                continue;
            }
            break;
        }
        self.state.current = idx;
    }

    fn complete_round(&mut self, events: &mut Vec<GameEvent>) {
        if self.state.round_complete {
            return;
        }
        self.state.round_complete = true;
        tracing::info!(
            turns = self.state.turns_played,
            finishers = self.state.finish_order.len(),
            "Race complete"
        );
        events.push(GameEvent::RoundComplete);
    }
}

impl TurnBasedGame for VectorRace {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Vector Race".to_string(),
            description: "Pick an acceleration each turn. Stay on the track, cross the line first."
                .to_string(),
            min_players: 1,
            max_players: 8,
        }
    }

    fn init(&mut self, players: &[Player], config: &GameConfig) {
        self.config = self.base_config.clone().with_overrides(config);

        let active: Vec<&Player> = players.iter().filter(|p| !p.is_spectator).collect();
        let grid = starting_grid(&self.track, active.len());
        let mut racers: Vec<Racer> = active
            .iter()
            .zip(grid)
            .map(|(p, start)| Racer::new(p.id, p.display_name.clone(), start))
            .collect();
        if let Some(seed) = self.config.turn_order_seed {
            racers.shuffle(&mut StdRng::seed_from_u64(seed));
        }

        tracing::debug!(racers = racers.len(), "Race initialised");
        self.state = RaceState {
            racers,
            ..RaceState::default()
        };
    }

    fn current_player(&self) -> Option<PlayerId> {
        if self.state.round_complete {
            return None;
        }
        self.state.racers.get(self.state.current).map(|r| r.id)
    }

    fn apply_input(&mut self, player_id: PlayerId, input: &[u8]) -> Vec<GameEvent> {
        let input = match rmp_serde::from_slice::<RaceInput>(input) {
            Ok(i) => i,
            Err(e) => {
                tracing::debug!(player_id, error = %e, "Dropped malformed race input");
                return Vec::new();
            },
        };
        let mut events = Vec::new();
        if let TurnOutcome::Rejected(reason) = self.resolve_turn(player_id, input.dv, &mut events) {
            tracing::debug!(player_id, %reason, "Turn rejected");
        }
        events
    }

    fn serialize_state(&self) -> Vec<u8> {
        rmp_serde::to_vec(&self.state).unwrap_or_default()
    }

    fn apply_state(&mut self, state: &[u8]) {
        match rmp_serde::from_slice::<RaceState>(state) {
            Ok(s) if !s.racers.is_empty() && s.current >= s.racers.len() => {
                tracing::debug!(
                    current = s.current,
                    racers = s.racers.len(),
                    "Ignored race state with turn pointer out of range"
                );
            },
            Ok(s) => self.state = s,
            Err(e) => tracing::debug!(error = %e, "Ignored malformed race state"),
        }
    }

    fn player_joined(&mut self, player: &Player) {
        if player.is_spectator || self.index_of(player.id).is_some() {
            return;
        }
        let slots = starting_grid(&self.track, self.state.racers.len() + 1);
        let start = slots.last().copied().unwrap_or_else(|| self.track.center());
        self.state
            .racers
            .push(Racer::new(player.id, player.display_name.clone(), start));
    }

    fn player_left(&mut self, player_id: PlayerId) {
        let Some(idx) = self.index_of(player_id) else {
            return;
        };
        self.state.racers.remove(idx);
        self.state.finish_order.retain(|&id| id != player_id);

        let count = self.state.racers.len();
        if count == 0 {
            self.state.current = 0;
            return;
        }
        let mut events = Vec::new();
        if idx < self.state.current {
            self.state.current -= 1;
        } else if idx == self.state.current {
            self.state.current = self.state.current.min(count - 1);
            if !self.state.round_complete {
                self.advance_from((idx + count - 1) % count, &mut events);
            }
        }
        if !self.state.round_complete && self.state.racers.iter().all(|r| r.finished) {
            self.complete_round(&mut events);
        }
    }

    fn is_round_complete(&self) -> bool {
        self.state.round_complete
    }

    fn round_results(&self) -> Vec<PlayerScore> {
        let racer_count = self.state.racers.len();
        self.state
            .racers
            .iter()
            .map(|r| {
                let place = self
                    .state
                    .finish_order
                    .iter()
                    .position(|&id| id == r.id)
                    .map(|i| i as u32 + 1);
                PlayerScore {
                    player_id: r.id,
                    score: scoring::calculate_score(
                        place,
                        racer_count,
                        r.crash_count(),
                        self.config.first_place_bonus,
                        self.config.crash_penalty,
                    ),
                }
            })
            .collect()
    }
}

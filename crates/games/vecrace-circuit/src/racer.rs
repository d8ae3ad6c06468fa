use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use vecrace_core::game_trait::PlayerId;
use vecrace_core::vector::Vec2;

/// Radius of the default car.
pub const CAR_RADIUS: f64 = 2.0;

/// Angle a racer's path must have swept around the track centre before a
/// line crossing counts as a lap. Being back on the line with at least three
/// quarters of a turn behind you means a whole lap has been driven.
pub const LAP_ANGLE: f64 = 1.5 * PI;

/// Shape of a racer's car. Moves are traced as exact lines, so the shape is
/// carried for renderers and does not affect collision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Car {
    Circle { radius: f64 },
}

impl Default for Car {
    fn default() -> Self {
        Car::Circle { radius: CAR_RADIUS }
    }
}

/// What a racer chose to do on their turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Change velocity by `dv`; `None` keeps the current velocity.
    Move { dv: Option<Vec2> },
}

impl Action {
    pub fn acceleration(&self) -> Vec2 {
        match self {
            Action::Move { dv } => dv.unwrap_or(Vec2::ZERO),
        }
    }
}

/// Things that happened during a move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RaceEvent {
    /// A skip penalty started with this many turns to sit out.
    SkipTurn { turns_remaining: u32 },
    /// The move left the track. `position` is where it left; the racer
    /// restarts from `reset_to` with zero velocity.
    Crash {
        position: Vec2,
        turns_to_skip: u32,
        reset_to: Vec2,
    },
}

/// One finalized move. Never edited once appended to a racer's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub from: Vec2,
    pub to: Vec2,
    pub action: Action,
    pub events: Vec<RaceEvent>,
}

impl Move {
    /// Restart position if this move crashed.
    pub fn crash_reset(&self) -> Option<Vec2> {
        self.events.iter().find_map(|e| match e {
            RaceEvent::Crash { reset_to, .. } => Some(*reset_to),
            RaceEvent::SkipTurn { .. } => None,
        })
    }

    pub fn is_crash(&self) -> bool {
        self.crash_reset().is_some()
    }
}

/// A player's race state. Position and velocity are derived from the move
/// history rather than stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Racer {
    pub id: PlayerId,
    pub name: String,
    pub start_pos: Vec2,
    pub moves: Vec<Move>,
    pub car: Car,
    /// Turns still to sit out from the last crash.
    pub skip_turns_remaining: u32,
    pub finished: bool,
}

impl Racer {
    pub fn new(id: PlayerId, name: impl Into<String>, start_pos: Vec2) -> Self {
        Self {
            id,
            name: name.into(),
            start_pos,
            moves: Vec::new(),
            car: Car::default(),
            skip_turns_remaining: 0,
            finished: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        match self.moves.last() {
            None => self.start_pos,
            Some(last) => last.crash_reset().unwrap_or(last.to),
        }
    }

    pub fn velocity(&self) -> Vec2 {
        match self.moves.last() {
            Some(last) if !last.is_crash() => last.to - last.from,
            _ => Vec2::ZERO,
        }
    }

    /// Signed angle in radians swept around `pivot` by the path driven so
    /// far, crash resets included. One lap is about `2π` in either direction;
    /// driving back over the same ground unwinds it.
    pub fn winding(&self, pivot: Vec2) -> f64 {
        let angle = |p: Vec2| (p.y - pivot.y).atan2(p.x - pivot.x);
        let points = std::iter::once(self.start_pos).chain(
            self.moves
                .iter()
                .flat_map(|m| std::iter::once(m.to).chain(m.crash_reset())),
        );

        let mut total = 0.0;
        let mut previous: Option<f64> = None;
        for p in points {
            let a = angle(p);
            if let Some(b) = previous {
                let delta = a - b;
                total += (delta + PI).rem_euclid(TAU) - PI;
            }
            previous = Some(a);
        }
        total
    }

    pub fn has_lapped(&self, pivot: Vec2) -> bool {
        self.winding(pivot).abs() >= LAP_ANGLE
    }

    pub fn is_skipping(&self) -> bool {
        self.skip_turns_remaining > 0
    }

    pub fn crash_count(&self) -> u32 {
        self.moves.iter().filter(|m| m.is_crash()).count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_move(from: Vec2, to: Vec2) -> Move {
        Move {
            from,
            to,
            action: Action::Move { dv: None },
            events: Vec::new(),
        }
    }

    #[test]
    fn fresh_racer_sits_still_at_start() {
        let racer = Racer::new(1, "Ada", Vec2::new(3.5, 2.5));
        assert_eq!(racer.position(), Vec2::new(3.5, 2.5));
        assert_eq!(racer.velocity(), Vec2::ZERO);
        assert_eq!(racer.car, Car::Circle { radius: 2.0 });
    }

    #[test]
    fn position_and_velocity_follow_last_move() {
        let mut racer = Racer::new(1, "Ada", Vec2::new(0.5, 0.5));
        racer.moves.push(plain_move(Vec2::new(0.5, 0.5), Vec2::new(1.5, 0.5)));
        racer.moves.push(plain_move(Vec2::new(1.5, 0.5), Vec2::new(3.5, 1.5)));
        assert_eq!(racer.position(), Vec2::new(3.5, 1.5));
        assert_eq!(racer.velocity(), Vec2::new(2.0, 1.0));
    }

    #[test]
    fn crash_resets_position_and_stops_the_car() {
        let mut racer = Racer::new(1, "Ada", Vec2::new(0.5, 0.5));
        racer.moves.push(Move {
            from: Vec2::new(0.5, 0.5),
            to: Vec2::new(3.0, 0.5),
            action: Action::Move {
                dv: Some(Vec2::new(3.0, 0.0)),
            },
            events: vec![
                RaceEvent::Crash {
                    position: Vec2::new(3.0, 0.5),
                    turns_to_skip: 2,
                    reset_to: Vec2::new(2.5, 0.5),
                },
                RaceEvent::SkipTurn { turns_remaining: 2 },
            ],
        });
        assert_eq!(racer.position(), Vec2::new(2.5, 0.5));
        assert_eq!(racer.velocity(), Vec2::ZERO);
        assert_eq!(racer.crash_count(), 1);
    }

    #[test]
    fn winding_counts_a_loop_and_unwinds_on_return() {
        let pivot = Vec2::ZERO;
        let square = [
            Vec2::new(2.0, 2.0),
            Vec2::new(-2.0, 2.0),
            Vec2::new(-2.0, -2.0),
            Vec2::new(2.0, -2.0),
            Vec2::new(2.0, 0.0),
        ];
        let mut racer = Racer::new(1, "Ada", Vec2::new(2.0, 0.0));
        let mut from = racer.start_pos;
        for to in square {
            racer.moves.push(plain_move(from, to));
            from = to;
        }
        assert!((racer.winding(pivot) - TAU).abs() < 1e-9);
        assert!(racer.has_lapped(pivot));

        let mut shuttle = Racer::new(2, "Bo", Vec2::new(2.0, 0.0));
        shuttle.moves.push(plain_move(Vec2::new(2.0, 0.0), Vec2::new(2.0, 2.0)));
        shuttle.moves.push(plain_move(Vec2::new(2.0, 2.0), Vec2::new(2.0, 0.0)));
        assert!(shuttle.winding(pivot).abs() < 1e-9);
        assert!(!shuttle.has_lapped(pivot));
    }

    #[test]
    fn coasting_action_has_no_acceleration() {
        assert_eq!(Action::Move { dv: None }.acceleration(), Vec2::ZERO);
        let dv = Vec2::new(1.0, -1.0);
        assert_eq!(Action::Move { dv: Some(dv) }.acceleration(), dv);
    }
}

//! Turns a racer's chosen acceleration into a finalized [`Move`].
//!
//! The candidate path runs from the racer's position to
//! `position + velocity + dv`. Its cells are classified one at a time in
//! travel order; the first off-track cell ends the move at the point where
//! the path entered that cell, and nothing beyond it is ever looked at.

use vecrace_core::grid::Traversal;
use vecrace_core::track::{CellKind, TrackOracle};
use vecrace_core::vector::{GridCell, Vec2};

use crate::config::CircuitConfig;
use crate::racer::{Action, Move, RaceEvent, Racer};

/// Why an acceleration was refused before any path was traced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvalidInput {
    NonFinite,
    TooLarge { magnitude: f64, max: f64 },
}

impl std::fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinite => write!(f, "acceleration must be finite"),
            Self::TooLarge { magnitude, max } => {
                write!(f, "acceleration {magnitude:.3} exceeds the limit of {max}")
            },
        }
    }
}

impl std::error::Error for InvalidInput {}

pub fn validate_acceleration(dv: Option<Vec2>, config: &CircuitConfig) -> Result<(), InvalidInput> {
    let Some(dv) = dv else {
        return Ok(());
    };
    if !dv.is_finite() {
        return Err(InvalidInput::NonFinite);
    }
    let magnitude = dv.length();
    if magnitude > config.max_acceleration {
        return Err(InvalidInput::TooLarge {
            magnitude,
            max: config.max_acceleration,
        });
    }
    Ok(())
}

/// Result of resolving one move.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The whole path stayed on track. `crossed_line` is set when the path
    /// entered a start/finish cell from an ordinary track cell.
    Clear { mv: Move, crossed_line: bool },
    /// The path left the track; `mv.to` is the crash point.
    Crashed { mv: Move, turns_to_skip: u32 },
}

impl Resolution {
    pub fn into_move(self) -> Move {
        match self {
            Resolution::Clear { mv, .. } | Resolution::Crashed { mv, .. } => mv,
        }
    }
}

/// Resolve `dv` for `racer` against `track`. `dv` must already have passed
/// [`validate_acceleration`].
pub fn resolve_move(
    racer: &Racer,
    dv: Option<Vec2>,
    track: &impl TrackOracle,
    config: &CircuitConfig,
) -> Resolution {
    let action = Action::Move { dv };
    let from = racer.position();
    let dest = from + racer.velocity() + action.acceleration();

    let mut last_drivable: Option<GridCell> = None;
    let mut previous: Option<CellKind> = None;
    let mut crossed_line = false;

    for crossing in Traversal::new(from, dest, config.corner_policy) {
        let kind = track.classify(crossing.cell);
        if !kind.is_drivable() {
            let position = crossing.entry_point(from, dest);
            let reset_to = last_drivable.map_or(from, GridCell::center);
            let turns_to_skip = config.turns_to_skip;
            let mut events = vec![RaceEvent::Crash {
                position,
                turns_to_skip,
                reset_to,
            }];
            if turns_to_skip > 0 {
                events.push(RaceEvent::SkipTurn {
                    turns_remaining: turns_to_skip,
                });
            }
            return Resolution::Crashed {
                mv: Move {
                    from,
                    to: position,
                    action,
                    events,
                },
                turns_to_skip,
            };
        }
        if kind == CellKind::Start && previous == Some(CellKind::OnTrack) {
            crossed_line = true;
        }
        previous = Some(kind);
        last_drivable = Some(crossing.cell);
    }

    Resolution::Clear {
        mv: Move {
            from,
            to: dest,
            action,
            events: Vec::new(),
        },
        crossed_line,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use vecrace_core::track::{FnOracle, TrackBitmap};

    /// Records every cell it is asked about.
    struct Recorder<O> {
        inner: O,
        queried: RefCell<Vec<GridCell>>,
    }

    impl<O: TrackOracle> TrackOracle for Recorder<O> {
        fn classify(&self, cell: GridCell) -> CellKind {
            self.queried.borrow_mut().push(cell);
            self.inner.classify(cell)
        }
    }

    fn open_field() -> FnOracle<impl Fn(GridCell) -> CellKind> {
        FnOracle(|_: GridCell| CellKind::OnTrack)
    }

    fn wall_at_x(wall: i64) -> FnOracle<impl Fn(GridCell) -> CellKind> {
        FnOracle(move |cell: GridCell| {
            if cell.x >= wall {
                CellKind::OffTrack
            } else {
                CellKind::OnTrack
            }
        })
    }

    #[test]
    fn first_move_starts_from_rest() {
        let racer = Racer::new(1, "Ada", Vec2::new(0.5, 0.5));
        let dv = Some(Vec2::new(2.0, 1.0));
        let mv = resolve_move(&racer, dv, &open_field(), &CircuitConfig::default()).into_move();
        assert_eq!(mv.from, Vec2::new(0.5, 0.5));
        assert_eq!(mv.to, Vec2::new(2.5, 1.5));
        assert!(mv.events.is_empty());
    }

    #[test]
    fn coasting_keeps_velocity() {
        let mut racer = Racer::new(1, "Ada", Vec2::new(0.5, 0.5));
        let config = CircuitConfig::default();
        let first = resolve_move(&racer, Some(Vec2::new(1.0, 2.0)), &open_field(), &config);
        racer.moves.push(first.into_move());
        let before = racer.velocity();

        let second = resolve_move(&racer, None, &open_field(), &config).into_move();
        assert_eq!(second.to - second.from, before);
        racer.moves.push(second);
        assert_eq!(racer.velocity(), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn crash_stops_at_entry_point_and_short_circuits() {
        let racer = Racer::new(1, "Ada", Vec2::new(0.5, 0.5));
        let oracle = Recorder {
            inner: wall_at_x(3),
            queried: RefCell::new(Vec::new()),
        };
        let config = CircuitConfig::default();
        let resolution = resolve_move(&racer, Some(Vec2::new(4.0, 0.0)), &oracle, &config);

        let Resolution::Crashed { mv, turns_to_skip } = resolution else {
            panic!("expected a crash");
        };
        assert_eq!(turns_to_skip, config.turns_to_skip);
        assert_eq!(mv.to, Vec2::new(3.0, 0.5));
        let crashes: Vec<_> = mv
            .events
            .iter()
            .filter(|e| matches!(e, RaceEvent::Crash { .. }))
            .collect();
        assert_eq!(crashes.len(), 1);
        assert_eq!(
            mv.events[0],
            RaceEvent::Crash {
                position: Vec2::new(3.0, 0.5),
                turns_to_skip: 2,
                reset_to: Vec2::new(2.5, 0.5),
            }
        );
        assert_eq!(mv.events[1], RaceEvent::SkipTurn { turns_remaining: 2 });

        // Path cells are (0,0) (1,0) (2,0) (3,0) (4,0); the walk stops at (3,0).
        let queried = oracle.queried.borrow();
        assert_eq!(
            *queried,
            vec![
                GridCell::new(0, 0),
                GridCell::new(1, 0),
                GridCell::new(2, 0),
                GridCell::new(3, 0),
            ]
        );
    }

    #[test]
    fn crash_in_first_cell_resets_to_origin() {
        let racer = Racer::new(1, "Ada", Vec2::new(5.5, 0.5));
        let resolution = resolve_move(&racer, Some(Vec2::new(1.0, 0.0)), &wall_at_x(3), &CircuitConfig::default());
        let mv = resolution.into_move();
        assert_eq!(mv.to, Vec2::new(5.5, 0.5));
        assert_eq!(mv.crash_reset(), Some(Vec2::new(5.5, 0.5)));
    }

    #[test]
    fn zero_penalty_crash_has_no_skip_event() {
        let racer = Racer::new(1, "Ada", Vec2::new(0.5, 0.5));
        let config = CircuitConfig {
            turns_to_skip: 0,
            ..CircuitConfig::default()
        };
        let mv = resolve_move(&racer, Some(Vec2::new(4.0, 0.0)), &wall_at_x(3), &config).into_move();
        assert_eq!(mv.events.len(), 1);
        assert!(mv.is_crash());
    }

    #[test]
    fn diagonal_wall_corner_cannot_be_slipped_through() {
        // Cells (1,0) and (0,1) are walls touching only at the corner (1,1).
        let oracle = FnOracle(|cell: GridCell| match (cell.x, cell.y) {
            (1, 0) | (0, 1) => CellKind::OffTrack,
            _ => CellKind::OnTrack,
        });
        let racer = Racer::new(1, "Ada", Vec2::new(0.5, 0.5));
        let resolution = resolve_move(&racer, Some(Vec2::new(1.0, 1.0)), &oracle, &CircuitConfig::default());
        let Resolution::Crashed { mv, .. } = resolution else {
            panic!("corner slip-through must crash");
        };
        assert_eq!(mv.to, Vec2::new(1.0, 1.0));
        assert_eq!(mv.crash_reset(), Some(Vec2::new(0.5, 0.5)));
    }

    #[test]
    fn entering_the_line_from_track_is_flagged() {
        let track = TrackBitmap::from_ascii("....S...").unwrap();
        let racer = Racer::new(1, "Ada", Vec2::new(1.5, 0.5));
        let config = CircuitConfig::default();
        let Resolution::Clear { crossed_line, .. } =
            resolve_move(&racer, Some(Vec2::new(4.0, 0.0)), &track, &config)
        else {
            panic!("path stays on track");
        };
        assert!(crossed_line);

        let on_line = Racer::new(2, "Bo", Vec2::new(4.5, 0.5));
        let Resolution::Clear { crossed_line, .. } =
            resolve_move(&on_line, Some(Vec2::new(2.0, 0.0)), &track, &config)
        else {
            panic!("path stays on track");
        };
        assert!(!crossed_line, "leaving the line is not a crossing");
    }

    #[test]
    fn acceleration_limits() {
        let config = CircuitConfig::default();
        assert_eq!(validate_acceleration(None, &config), Ok(()));
        assert_eq!(validate_acceleration(Some(Vec2::new(4.0, 0.0)), &config), Ok(()));
        assert_eq!(
            validate_acceleration(Some(Vec2::new(f64::NAN, 0.0)), &config),
            Err(InvalidInput::NonFinite)
        );
        assert!(matches!(
            validate_acceleration(Some(Vec2::new(3.0, 3.0)), &config),
            Err(InvalidInput::TooLarge { .. })
        ));
    }
}

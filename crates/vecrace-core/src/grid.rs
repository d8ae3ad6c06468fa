//! Grid traversal: which unit squares does a straight move pass through?
//!
//! The walk is a parametric DDA over integer cell indices. With the segment
//! written as `p(t) = p0 + (p1 - p0) * t` for `t` in `[0, 1]`, each step finds
//! the `t` of the next vertical grid line and the next horizontal grid line and
//! crosses whichever comes first. The number of steps on each axis is the
//! integer distance between the start and destination cells, so the walk always
//! lands exactly on `floor(p1)`; once one axis is exhausted the rest is a plain
//! row or column run. Every `t` is computed from the original endpoints, never
//! accumulated, so long segments do not drift.
//!
//! Degenerate inputs fall out of the same loop: a segment inside one cell
//! yields that cell, a segment within one row (or column) yields the
//! contiguous run of cells along it.

use std::collections::VecDeque;
use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};

use crate::vector::{GridCell, Vec2};

/// Two grid-line crossings closer than this (in `t`) are treated as one
/// crossing through a lattice point.
pub const TIE_EPSILON: f64 = 1e-9;

/// What to emit when a segment passes exactly through a grid corner.
///
/// At a corner the cells before and after the crossing are diagonal
/// neighbours. Two more cells ("complementary" cells) meet at that corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerPolicy {
    /// Emit the complementary cell east of the corner, so every pair of
    /// consecutive cells shares an edge. A diagonal wall joined only at its
    /// corners always stops the car.
    #[default]
    EdgeConnected,
    /// Emit both complementary cells (x-step neighbour first).
    Supercover,
    /// Emit only the cells the segment actually intersects under half-open
    /// `[x, x+1) × [y, y+1)` semantics.
    Exact,
}

/// A cell entered by the segment and the parameter `t` at which it is entered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Crossing {
    pub cell: GridCell,
    pub t: f64,
}

impl Crossing {
    /// Where the segment `p0 -> p1` enters this crossing's cell.
    pub fn entry_point(&self, p0: Vec2, p1: Vec2) -> Vec2 {
        Vec2::lerp(p0, p1, self.t)
    }
}

enum Step {
    X,
    Y,
    Corner,
}

/// Lazy, in-order walk over the cells crossed by a segment.
///
/// Inputs must be finite; non-finite coordinates are rejected by callers
/// before a traversal is built.
#[derive(Debug, Clone)]
pub struct Traversal {
    p0: Vec2,
    p1: Vec2,
    policy: CornerPolicy,
    cell: GridCell,
    step_x: i64,
    step_y: i64,
    remaining_x: u64,
    remaining_y: u64,
    queued: VecDeque<Crossing>,
}

impl Traversal {
    pub fn new(p0: Vec2, p1: Vec2, policy: CornerPolicy) -> Self {
        let start = GridCell::containing(p0);
        let dest = GridCell::containing(p1);
        let mut queued = VecDeque::with_capacity(3);
        queued.push_back(Crossing { cell: start, t: 0.0 });
        Self {
            p0,
            p1,
            policy,
            cell: start,
            step_x: (dest.x - start.x).signum(),
            step_y: (dest.y - start.y).signum(),
            remaining_x: dest.x.abs_diff(start.x),
            remaining_y: dest.y.abs_diff(start.y),
            queued,
        }
    }

    /// `t` of the next vertical grid line. Only valid while x steps remain,
    /// which guarantees `p0.x != p1.x`.
    fn next_t_x(&self) -> f64 {
        let line = if self.step_x > 0 {
            self.cell.x + 1
        } else {
            self.cell.x
        };
        (line as f64 - self.p0.x) / (self.p1.x - self.p0.x)
    }

    fn next_t_y(&self) -> f64 {
        let line = if self.step_y > 0 {
            self.cell.y + 1
        } else {
            self.cell.y
        };
        (line as f64 - self.p0.y) / (self.p1.y - self.p0.y)
    }

    fn push(&mut self, cell: GridCell, t: f64) {
        self.queued.push_back(Crossing { cell, t });
    }

    fn advance(&mut self) {
        let step = match (self.remaining_x > 0, self.remaining_y > 0) {
            (false, false) => return,
            (true, false) => Step::X,
            (false, true) => Step::Y,
            (true, true) => {
                let tx = self.next_t_x();
                let ty = self.next_t_y();
                if (tx - ty).abs() <= TIE_EPSILON {
                    Step::Corner
                } else if tx < ty {
                    Step::X
                } else {
                    Step::Y
                }
            },
        };

        match step {
            Step::X => {
                let t = self.next_t_x();
                self.cell.x += self.step_x;
                self.remaining_x -= 1;
                self.push(self.cell, t);
            },
            Step::Y => {
                let t = self.next_t_y();
                self.cell.y += self.step_y;
                self.remaining_y -= 1;
                self.push(self.cell, t);
            },
            Step::Corner => {
                let t = self.next_t_x().min(self.next_t_y());
                let before = self.cell;
                let x_neighbour = GridCell::new(before.x + self.step_x, before.y);
                let y_neighbour = GridCell::new(before.x, before.y + self.step_y);
                // The complementary cell with the larger x.
                let east = if self.step_x > 0 {
                    x_neighbour
                } else {
                    y_neighbour
                };
                match self.policy {
                    CornerPolicy::EdgeConnected => self.push(east, t),
                    CornerPolicy::Supercover => {
                        self.push(x_neighbour, t);
                        self.push(y_neighbour, t);
                    },
                    CornerPolicy::Exact => {
                        // The corner point itself belongs to a complementary
                        // cell only when the axes move in opposite directions.
                        if self.step_x != self.step_y {
                            self.push(east, t);
                        }
                    },
                }
                self.cell = GridCell::new(before.x + self.step_x, before.y + self.step_y);
                self.remaining_x -= 1;
                self.remaining_y -= 1;
                self.push(self.cell, t);
            },
        }
    }
}

impl Iterator for Traversal {
    type Item = Crossing;

    fn next(&mut self) -> Option<Crossing> {
        if self.queued.is_empty() {
            self.advance();
        }
        self.queued.pop_front()
    }
}

impl FusedIterator for Traversal {}

/// Every cell crossed by the segment `p0 -> p1`, in travel order, using the
/// default [`CornerPolicy`].
pub fn trace_line(p0: Vec2, p1: Vec2) -> Vec<GridCell> {
    trace_line_with(p0, p1, CornerPolicy::default())
}

pub fn trace_line_with(p0: Vec2, p1: Vec2, policy: CornerPolicy) -> Vec<GridCell> {
    Traversal::new(p0, p1, policy).map(|c| c.cell).collect()
}

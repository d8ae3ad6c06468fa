use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// A 2D point or displacement in track units (one unit = one grid cell).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Both components are neither NaN nor infinite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Point at parameter `t` along the segment `from -> to`.
    pub fn lerp(from: Self, to: Self, t: f64) -> Self {
        add(from, subtract(to, from).scale(t))
    }
}

/// Componentwise `v1 + v2`.
pub fn add(v1: Vec2, v2: Vec2) -> Vec2 {
    Vec2::new(v1.x + v2.x, v1.y + v2.y)
}

/// Componentwise `v1 - v2`.
pub fn subtract(v1: Vec2, v2: Vec2) -> Vec2 {
    Vec2::new(v1.x - v2.x, v1.y - v2.y)
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        add(self, rhs)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        subtract(self, rhs)
    }
}

/// A unit grid square `[x, x+1) × [y, y+1)`, named by its floor corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i64,
    pub y: i64,
}

impl GridCell {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The cell containing `point`.
    pub fn containing(point: Vec2) -> Self {
        Self::new(point.x.floor() as i64, point.y.floor() as i64)
    }

    pub fn center(self) -> Vec2 {
        Vec2::new(self.x as f64 + 0.5, self.y as f64 + 0.5)
    }

    /// Whether `other` is one of the eight neighbours of this cell.
    pub fn touches(self, other: Self) -> bool {
        self != other && (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }
}

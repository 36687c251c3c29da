// Shared value types: points, facing, colors, tick input

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

/// A position or direction in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (*self - *other).length()
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction, or zero for a (near) zero vector.
    pub fn normalized(&self) -> Point {
        let len = self.length();
        if len < 1e-9 {
            Point::ZERO
        } else {
            Point {
                x: self.x / len,
                y: self.y / len,
            }
        }
    }

    pub fn is_zero(&self) -> bool {
        self.x.abs() < 1e-9 && self.y.abs() < 1e-9
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Cardinal facing, used for sprites and for the wand-tip offset.
/// Screen coordinates: +y points down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Facing {
    pub fn unit(self) -> Point {
        match self {
            Facing::Up => Point::new(0.0, -1.0),
            Facing::Down => Point::new(0.0, 1.0),
            Facing::Left => Point::new(-1.0, 0.0),
            Facing::Right => Point::new(1.0, 0.0),
        }
    }

    /// The dominant axis of `direction` picks the facing; `None` for zero input.
    pub fn from_direction(direction: Point) -> Option<Facing> {
        if direction.is_zero() {
            return None;
        }
        if direction.x.abs() >= direction.y.abs() {
            Some(if direction.x > 0.0 {
                Facing::Right
            } else {
                Facing::Left
            })
        } else {
            Some(if direction.y > 0.0 {
                Facing::Down
            } else {
                Facing::Up
            })
        }
    }
}

/// Plain RGB color carried by spells and beams. The renderer converts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }
}

/// Everything the host feeds the core for one tick.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Desired movement direction; need not be normalized.
    pub direction: Point,
    /// Cast keys pressed this frame, in press order.
    pub casts: Vec<char>,
}

impl TickInput {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn moving(direction: Point) -> Self {
        TickInput {
            direction,
            casts: Vec::new(),
        }
    }

    pub fn casting(key: char) -> Self {
        TickInput {
            direction: Point::ZERO,
            casts: vec![key],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_normalized() {
        let n = Point::new(3.0, 4.0).normalized();
        assert_approx_eq!(n.x, 0.6);
        assert_approx_eq!(n.y, 0.8);
        assert_eq!(Point::ZERO.normalized(), Point::ZERO);
    }

    #[test]
    fn test_facing_from_direction() {
        assert_eq!(Facing::from_direction(Point::new(1.0, 0.5)), Some(Facing::Right));
        assert_eq!(Facing::from_direction(Point::new(-0.2, -0.9)), Some(Facing::Up));
        assert_eq!(Facing::from_direction(Point::ZERO), None);
    }
}

// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Geometry primitives
//!
//! Axis-aligned rectangles and 2D vectors in scene coordinates. The y axis
//! grows downward, so a rectangle's `top()` is numerically smaller than its
//! `bottom()`.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// One of the two scene axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal axis
    X,
    /// Vertical axis (positive is down)
    Y,
}

/// 2D vector used for positions, displacements and velocities
///
/// # Examples
///
/// ```
/// use platform_physics::geometry::Vec2;
///
/// let v = Vec2::new(3.0, 4.0) * 2.0;
/// assert_eq!(v, Vec2::new(6.0, 8.0));
/// assert_eq!(Vec2::new(3.0, 4.0).length(), 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component
    pub x: f64,
    /// Vertical component
    pub y: f64,
}

impl Vec2 {
    /// Create a new vector
    pub const fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    /// The zero vector
    pub const fn zero() -> Self {
        Vec2::new(0.0, 0.0)
    }

    /// Component along the given axis
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Set the component along the given axis
    pub fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
        }
    }

    /// Euclidean length
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Check if both components are finite
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Mul<Vec2> for f64 {
    type Output = Vec2;

    fn mul(self, rhs: Vec2) -> Vec2 {
        rhs * self
    }
}

impl Div<f64> for Vec2 {
    type Output = Vec2;

    fn div(self, rhs: f64) -> Vec2 {
        self * (1.0 / rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Axis-aligned rectangle with floating-point coordinates
///
/// `(x, y)` is the top-left corner. Width and height are expected to be
/// non-negative; [`Rect::new`] clamps negative extents to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub w: f64,
    /// Height
    pub h: f64,
}

impl Rect {
    /// Create a new rectangle, clamping negative extents to zero
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect {
            x,
            y,
            w: w.max(0.0),
            h: h.max(0.0),
        }
    }

    /// Top-left corner
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Width and height as a vector
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    /// Left edge
    pub fn left(&self) -> f64 {
        self.x
    }

    /// Right edge
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Top edge
    pub fn top(&self) -> f64 {
        self.y
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Near-edge coordinate along an axis
    pub fn coord(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Extent along an axis
    pub fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.w,
            Axis::Y => self.h,
        }
    }

    /// Inclusive point containment test
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.left() && x <= self.right() && y >= self.top() && y <= self.bottom()
    }

    /// Strict overlap test (touching edges do not intersect)
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Grow the rectangle by `dx` on the left and right and `dy` on the top and bottom
    pub fn expanded(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x - dx, self.y - dy, self.w + 2.0 * dx, self.h + 2.0 * dy)
    }

    /// Penetration depth on each axis
    ///
    /// Each component is the smaller of the two far-edge differences; a
    /// component is positive only while the projections overlap on that axis.
    pub fn overlap(&self, other: &Rect) -> Vec2 {
        Vec2::new(
            (other.right() - self.left()).min(self.right() - other.left()),
            (other.bottom() - self.top()).min(self.bottom() - other.top()),
        )
    }
}

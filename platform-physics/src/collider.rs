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
//! Box colliders and swept directional collision predicates
//!
//! Every entity owns exactly one [`Collider`]. The collider keeps its own
//! rectangle, synchronized with the owning entity through a cached offset
//! from the entity's position, so colliders may be padded or shifted
//! relative to the visual rectangle.
//!
//! # Directional predicates
//!
//! The four `check_*` predicates answer "will this collider touch `other`
//! from a given side during the next tick?". Each one combines three tests:
//!
//! - **Band overlap**: the colliders must overlap on the perpendicular axis
//!   by more than `2 * epsilon`, so corner grazing and resting contact on the
//!   other axis never count.
//! - **Reach**: the leading edge, advanced by the predicted displacement
//!   `velocity * dt`, reaches the other's facing edge (within epsilon).
//! - **Approach side**: the leading edge, moved back by the predicted travel
//!   plus epsilon and [`Sweep::slack`], was still on the near side of the
//!   facing edge.
//!
//! Rotation is stored but never enters the collision math; boxes stay
//! axis-aligned.

use crate::geometry::{Rect, Vec2};

/// Predicted movement of a collider over one tick
///
/// # Examples
///
/// ```
/// use platform_physics::collider::Sweep;
/// use platform_physics::geometry::Vec2;
///
/// let sweep = Sweep::new(Vec2::new(0.0, 100.0), 0.01, 0.75);
/// assert_eq!(sweep.displacement(), Vec2::new(0.0, 1.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    displacement: Vec2,
    epsilon: f64,
    slack: f64,
}

impl Sweep {
    /// Create a sweep for an entity moving at `velocity` for `dt` seconds
    pub fn new(velocity: Vec2, dt: f64, epsilon: f64) -> Self {
        Sweep {
            displacement: velocity * dt,
            epsilon,
            slack: 0.0,
        }
    }

    /// Allow an additional penetration depth on the approach-side test
    ///
    /// The interpenetration solver uses this to confirm contacts that are
    /// already deeper than one tick of travel.
    pub fn with_slack(mut self, slack: f64) -> Self {
        self.slack = slack.max(0.0);
        self
    }

    /// Predicted displacement for the tick
    pub fn displacement(&self) -> Vec2 {
        self.displacement
    }

    /// Contact tolerance
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Extra penetration allowance
    pub fn slack(&self) -> f64 {
        self.slack
    }

    fn allowance(&self, travel: f64) -> f64 {
        travel.abs() + self.epsilon + self.slack
    }
}

/// Axis-aligned box collider owned by a single entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    rect: Rect,
    rotation: f64,
    parent_offset: Vec2,
}

impl Collider {
    /// Create a collider covering the parent's rectangle exactly
    pub fn new(parent_rect: Rect) -> Self {
        Collider {
            rect: parent_rect,
            rotation: 0.0,
            parent_offset: Vec2::zero(),
        }
    }

    /// The collider rectangle in scene coordinates
    pub fn rect(&self) -> &Rect {
        &self.rect
    }

    /// Stored rotation in degrees
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Offset of the collider's corner from the parent's position
    pub fn parent_offset(&self) -> Vec2 {
        self.parent_offset
    }

    /// Move the collider and recompute its offset from the parent
    pub fn set_position(&mut self, x: f64, y: f64, parent_position: Vec2) {
        self.rect.x = x;
        self.rect.y = y;
        self.parent_offset = self.rect.position() - parent_position;
    }

    /// Resize the collider, clamping negative extents to zero
    pub fn set_dimensions(&mut self, w: f64, h: f64) {
        self.rect.w = w.max(0.0);
        self.rect.h = h.max(0.0);
    }

    /// Set the stored rotation
    pub fn set_rotation(&mut self, angle: f64) {
        self.rotation = angle;
    }

    /// Re-derive the collider position from the parent position and cached offset
    pub fn update_position(&mut self, parent_position: Vec2) {
        let position = parent_position + self.parent_offset;
        self.rect.x = position.x;
        self.rect.y = position.y;
    }

    /// Landing on top of `other`
    pub fn check_ground_collision(&self, other: &Collider, sweep: &Sweep) -> bool {
        let (a, b) = (&self.rect, &other.rect);
        let dy = sweep.displacement.y;
        horizontal_band(a, b, sweep.epsilon)
            && a.bottom() + dy >= b.top() - sweep.epsilon
            && a.bottom() - sweep.allowance(dy) <= b.top()
    }

    /// Hitting the underside of `other` while moving up
    pub fn check_upper_collisions(&self, other: &Collider, sweep: &Sweep) -> bool {
        let (a, b) = (&self.rect, &other.rect);
        let dy = sweep.displacement.y;
        horizontal_band(a, b, sweep.epsilon)
            && a.top() + dy <= b.bottom() + sweep.epsilon
            && a.top() + sweep.allowance(dy) >= b.bottom()
    }

    /// Hitting the right side of `other` while moving left
    pub fn check_left_collisions(&self, other: &Collider, sweep: &Sweep) -> bool {
        let (a, b) = (&self.rect, &other.rect);
        let dx = sweep.displacement.x;
        vertical_band(a, b, sweep.epsilon)
            && a.left() + dx <= b.right() + sweep.epsilon
            && a.left() + sweep.allowance(dx) >= b.right()
    }

    /// Hitting the left side of `other` while moving right
    pub fn check_right_collisions(&self, other: &Collider, sweep: &Sweep) -> bool {
        let (a, b) = (&self.rect, &other.rect);
        let dx = sweep.displacement.x;
        vertical_band(a, b, sweep.epsilon)
            && a.right() + dx >= b.left() - sweep.epsilon
            && a.right() - sweep.allowance(dx) <= b.left()
    }

    /// Any horizontal or ceiling contact, the set checked between moveable entities
    pub fn check_side_or_upper(&self, other: &Collider, sweep: &Sweep) -> bool {
        self.check_left_collisions(other, sweep)
            || self.check_right_collisions(other, sweep)
            || self.check_upper_collisions(other, sweep)
    }
}

fn horizontal_band(a: &Rect, b: &Rect, epsilon: f64) -> bool {
    a.left() + epsilon < b.right() && a.right() - epsilon > b.left()
}

fn vertical_band(a: &Rect, b: &Rect, epsilon: f64) -> bool {
    a.top() + epsilon < b.bottom() && a.bottom() - epsilon > b.top()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 0.75;
    const DT: f64 = 0.01;

    fn collider(x: f64, y: f64, w: f64, h: f64) -> Collider {
        Collider::new(Rect::new(x, y, w, h))
    }

    #[test]
    fn test_update_position_follows_parent() {
        let mut c = collider(10.0, 10.0, 20.0, 20.0);
        c.set_position(12.0, 15.0, Vec2::new(10.0, 10.0));
        assert_eq!(c.parent_offset(), Vec2::new(2.0, 5.0));

        c.update_position(Vec2::new(100.0, 50.0));
        assert_eq!(c.rect().position(), Vec2::new(102.0, 55.0));
    }

    #[test]
    fn test_update_position_idempotent() {
        let mut c = collider(0.0, 0.0, 5.0, 5.0);
        c.set_position(1.0, 1.0, Vec2::zero());
        c.update_position(Vec2::new(3.0, 4.0));
        let first = *c.rect();
        c.update_position(Vec2::new(3.0, 4.0));
        assert_eq!(*c.rect(), first);
    }

    #[test]
    fn test_set_dimensions_clamps_negative() {
        let mut c = collider(0.0, 0.0, 5.0, 5.0);
        c.set_dimensions(-1.0, 8.0);
        assert_eq!(c.rect().w, 0.0);
        assert_eq!(c.rect().h, 8.0);
    }

    #[test]
    fn test_rotation_does_not_affect_rect() {
        let mut c = collider(0.0, 0.0, 5.0, 10.0);
        c.set_rotation(45.0);
        assert_eq!(c.rotation(), 45.0);
        assert_eq!(*c.rect(), Rect::new(0.0, 0.0, 5.0, 10.0));
    }

    #[test]
    fn test_ground_collision_when_about_to_land() {
        let faller = collider(0.0, 39.5, 10.0, 10.0);
        let ground = collider(-20.0, 50.0, 100.0, 10.0);
        let sweep = Sweep::new(Vec2::new(0.0, 100.0), DT, EPS);
        assert!(faller.check_ground_collision(&ground, &sweep));
    }

    #[test]
    fn test_ground_collision_resting_contact() {
        let resting = collider(0.0, 40.0, 10.0, 10.0);
        let ground = collider(-20.0, 50.0, 100.0, 10.0);
        let sweep = Sweep::new(Vec2::zero(), DT, EPS);
        assert!(resting.check_ground_collision(&ground, &sweep));
    }

    #[test]
    fn test_no_ground_collision_when_far_above() {
        let faller = collider(0.0, 0.0, 10.0, 10.0);
        let ground = collider(-20.0, 50.0, 100.0, 10.0);
        let sweep = Sweep::new(Vec2::new(0.0, 100.0), DT, EPS);
        assert!(!faller.check_ground_collision(&ground, &sweep));
    }

    #[test]
    fn test_no_ground_collision_when_jumping_away() {
        let jumper = collider(0.0, 40.0, 10.0, 10.0);
        let ground = collider(-20.0, 50.0, 100.0, 10.0);
        let sweep = Sweep::new(Vec2::new(0.0, -250.0), DT, EPS);
        assert!(!jumper.check_ground_collision(&ground, &sweep));
    }

    #[test]
    fn test_no_ground_collision_when_deeply_sunk() {
        let sunk = collider(0.0, 45.0, 10.0, 10.0);
        let ground = collider(-20.0, 50.0, 100.0, 10.0);
        let sweep = Sweep::new(Vec2::zero(), DT, EPS);
        assert!(!sunk.check_ground_collision(&ground, &sweep));
        // The solver can still confirm it with enough slack
        assert!(sunk.check_ground_collision(&ground, &sweep.with_slack(5.0)));
    }

    #[test]
    fn test_ground_collision_rejects_edge_grazing() {
        // Horizontal overlap of 0.5 is inside the epsilon band
        let faller = collider(0.0, 40.0, 10.0, 10.0);
        let ground = collider(9.5, 50.0, 100.0, 10.0);
        let sweep = Sweep::new(Vec2::new(0.0, 10.0), DT, EPS);
        assert!(!faller.check_ground_collision(&ground, &sweep));
    }

    #[test]
    fn test_upper_collision() {
        let jumper = collider(0.0, 60.5, 10.0, 10.0);
        let ceiling = collider(-20.0, 50.0, 100.0, 10.0);
        let sweep = Sweep::new(Vec2::new(0.0, -100.0), DT, EPS);
        assert!(jumper.check_upper_collisions(&ceiling, &sweep));

        let far = collider(0.0, 80.0, 10.0, 10.0);
        assert!(!far.check_upper_collisions(&ceiling, &sweep));
    }

    #[test]
    fn test_left_and_right_collisions() {
        let wall = collider(100.0, 0.0, 20.0, 100.0);

        let from_left = collider(79.5, 10.0, 20.0, 20.0);
        let moving_right = Sweep::new(Vec2::new(100.0, 0.0), DT, EPS);
        assert!(from_left.check_right_collisions(&wall, &moving_right));
        assert!(!from_left.check_left_collisions(&wall, &moving_right));

        let from_right = collider(120.5, 10.0, 20.0, 20.0);
        let moving_left = Sweep::new(Vec2::new(-100.0, 0.0), DT, EPS);
        assert!(from_right.check_left_collisions(&wall, &moving_left));
        assert!(!from_right.check_right_collisions(&wall, &moving_left));
    }

    #[test]
    fn test_side_collision_ignores_floor_contact() {
        // Box resting on a floor must not register as a side hit with it
        let floor = collider(0.0, 50.0, 200.0, 10.0);
        let box_on_floor = collider(20.0, 40.0, 10.0, 10.0);
        let sweep = Sweep::new(Vec2::new(50.0, 0.0), DT, EPS);
        assert!(!box_on_floor.check_side_or_upper(&floor, &sweep));
    }
}

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
//! Interpenetration solver
//!
//! After forces and gravity ran for every entity, some moveable entities may
//! still overlap an obstacle. Each overlap deeper than epsilon on both axes is
//! resolved along the axis of least penetration, in the direction the entity
//! was travelling.

use super::{obstacle_collider, StepContext};
use crate::collider::{Collider, Sweep};
use crate::entity::EntityRef;
use crate::geometry::Rect;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Push overlapping moveable entities out of the obstacles they sank into
///
/// Kinematic entities are neither moved nor used as obstacles, and the player
/// is never used as an obstacle. Returns the number of corrections applied.
pub fn solve_insiders(ctx: &StepContext<'_>) -> usize {
    let snapshot = ctx.snapshot();
    let movers: Vec<(&EntityRef, Rect)> = snapshot
        .moveables()
        .iter()
        .filter_map(|e| {
            let state = e.lock();
            (!state.is_kinematic()).then(|| (e, *state.collider().rect()))
        })
        .collect();
    let obstacles: Vec<(&EntityRef, Rect)> = snapshot
        .entities()
        .iter()
        .filter(|e| !e.is_player())
        .filter_map(|e| obstacle_collider(e).map(|c| (e, *c.rect())))
        .collect();

    let mover_rects: Vec<Rect> = movers.iter().map(|(_, r)| *r).collect();
    let obstacle_rects: Vec<Rect> = obstacles.iter().map(|(_, r)| *r).collect();
    let candidates = broad_phase(&mover_rects, &obstacle_rects);

    let mut corrections = 0;
    for ((mover, _), indices) in movers.iter().zip(candidates) {
        for index in indices {
            let (obstacle, _) = obstacles[index];
            if obstacle.id() == mover.id() {
                continue;
            }
            // Re-read: earlier corrections may have moved it
            let Some(collider) = obstacle_collider(obstacle) else {
                continue;
            };
            if separate(mover, &collider, ctx) {
                log::trace!("Separated {} from {}", mover.id(), obstacle.id());
                corrections += 1;
            }
        }
    }
    corrections
}

/// Obstacles near each mover, as indices into `obstacles`
///
/// The search area is the mover's collider grown by its own size, which
/// keeps obstacles the mover may have been pushed into during this step.
#[cfg(feature = "parallel")]
fn broad_phase(movers: &[Rect], obstacles: &[Rect]) -> Vec<Vec<usize>> {
    movers
        .par_iter()
        .map(|mover| nearby(mover, obstacles))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn broad_phase(movers: &[Rect], obstacles: &[Rect]) -> Vec<Vec<usize>> {
    movers.iter().map(|mover| nearby(mover, obstacles)).collect()
}

fn nearby(mover: &Rect, obstacles: &[Rect]) -> Vec<usize> {
    let area = mover.expanded(mover.w, mover.h);
    obstacles
        .iter()
        .enumerate()
        .filter(|(_, obstacle)| area.intersects(obstacle))
        .map(|(index, _)| index)
        .collect()
}

fn separate(mover: &EntityRef, obstacle: &Collider, ctx: &StepContext<'_>) -> bool {
    let epsilon = ctx.config().epsilon;
    let mut state = mover.lock();
    if state.is_kinematic() {
        return false;
    }
    let Some(velocity) = state.motion().map(|m| m.velocity()) else {
        return false;
    };

    let own = *state.collider();
    let (a, b) = (*own.rect(), *obstacle.rect());
    let overlap = a.overlap(&b);
    if overlap.x <= epsilon || overlap.y <= epsilon {
        return false;
    }

    let sweep = Sweep::new(velocity, ctx.dt(), epsilon);
    let target = if overlap.x.abs() < overlap.y.abs() {
        let sweep = sweep.with_slack(overlap.x);
        if velocity.x < -epsilon && own.check_left_collisions(obstacle, &sweep) {
            Some((b.right() + epsilon, a.y))
        } else if velocity.x > epsilon && own.check_right_collisions(obstacle, &sweep) {
            Some((b.left() - a.w - epsilon, a.y))
        } else {
            None
        }
    } else {
        let sweep = sweep.with_slack(overlap.y);
        if velocity.y < -epsilon && own.check_upper_collisions(obstacle, &sweep) {
            Some((a.x, b.bottom() + epsilon))
        } else if velocity.y > epsilon && own.check_ground_collision(obstacle, &sweep) {
            Some((a.x, b.top() - a.h - epsilon))
        } else {
            None
        }
    };

    match target {
        Some((x, y)) => {
            state.place_collider_at(x, y, ctx.scene());
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::entity::TextureHandle;
    use crate::geometry::Vec2;
    use crate::registry::EntityManager;

    fn solve(manager: &EntityManager) -> usize {
        let snapshot = manager.snapshot();
        let config = manager.config().clone();
        solve_insiders(&StepContext::new(&snapshot, &config, 0.01))
    }

    #[test]
    fn test_nearby_filters_far_obstacles() {
        let mover = Rect::new(100.0, 100.0, 10.0, 10.0);
        let obstacles = [
            Rect::new(105.0, 105.0, 50.0, 50.0),
            Rect::new(500.0, 500.0, 10.0, 10.0),
            Rect::new(115.0, 100.0, 10.0, 10.0),
        ];
        assert_eq!(nearby(&mover, &obstacles), vec![0, 2]);
    }

    #[test]
    fn test_sunk_entity_is_lifted_onto_obstacle() {
        let manager = EntityManager::new(PhysicsConfig::default());
        manager.add_entity(TextureHandle::DEFAULT, Rect::new(0.0, 50.0, 200.0, 20.0));
        let body = manager.add_moveable_entity(
            TextureHandle::DEFAULT,
            Rect::new(50.0, 35.0, 20.0, 20.0),
            1.0,
        );
        body.lock().motion_mut().unwrap().set_velocity(Vec2::new(0.0, 40.0));

        assert_eq!(solve(&manager), 1);
        assert!((body.rect().bottom() - (50.0 - 0.75)).abs() < 1e-9);
        assert_eq!(body.rect().x, 50.0);
    }

    #[test]
    fn test_sideways_penetration_resolved_horizontally() {
        let manager = EntityManager::new(PhysicsConfig::default());
        manager.add_entity(TextureHandle::DEFAULT, Rect::new(100.0, 0.0, 20.0, 300.0));
        let body = manager.add_moveable_entity(
            TextureHandle::DEFAULT,
            Rect::new(85.0, 100.0, 20.0, 20.0),
            1.0,
        );
        body.lock().motion_mut().unwrap().set_velocity(Vec2::new(100.0, 0.0));

        assert_eq!(solve(&manager), 1);
        assert!((body.rect().right() - (100.0 - 0.75)).abs() < 1e-9);
        assert_eq!(body.rect().y, 100.0);
    }

    #[test]
    fn test_shallow_overlap_left_alone() {
        let manager = EntityManager::new(PhysicsConfig::default());
        manager.add_entity(TextureHandle::DEFAULT, Rect::new(0.0, 50.0, 200.0, 20.0));
        let body = manager.add_moveable_entity(
            TextureHandle::DEFAULT,
            Rect::new(50.0, 30.5, 20.0, 20.0),
            1.0,
        );
        body.lock().motion_mut().unwrap().set_velocity(Vec2::new(0.0, 40.0));

        assert_eq!(solve(&manager), 0);
        assert_eq!(body.rect().y, 30.5);
    }

    #[test]
    fn test_kinematic_entities_are_ignored() {
        let manager = EntityManager::new(PhysicsConfig::default());
        let wall = manager.add_moveable_entity(
            TextureHandle::DEFAULT,
            Rect::new(0.0, 50.0, 200.0, 20.0),
            1.0,
        );
        wall.lock().set_kinematic(true);
        let body = manager.add_moveable_entity(
            TextureHandle::DEFAULT,
            Rect::new(50.0, 35.0, 20.0, 20.0),
            1.0,
        );
        body.lock().motion_mut().unwrap().set_velocity(Vec2::new(0.0, 40.0));

        assert_eq!(solve(&manager), 0);
        assert_eq!(body.rect().y, 35.0);
    }
}

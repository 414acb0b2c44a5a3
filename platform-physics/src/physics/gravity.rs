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
//! Ground detection, bouncing and free fall

use super::{ground_collider, MotionSample, StepContext};
use crate::collider::{Collider, Sweep};
use crate::entity::{Entity, EntityKind, EntityRef};
use crate::geometry::{Axis, Vec2};

impl Entity {
    /// Advance this entity vertically by one fixed step
    ///
    /// Looks for an obstacle below (any non-kinematic, non-collectible entity
    /// other than this one). On contact the collider is snapped onto the
    /// obstacle's top edge, then:
    ///
    /// - the player stops falling and is flagged as on the ground,
    /// - a fast-falling entity bounces with its viscosity as restitution and,
    ///   when it landed on another moveable entity, pushes it downward,
    /// - a slow entity comes to rest.
    ///
    /// Entities that are not resting accumulate gravity and move along the
    /// y axis, stopping at the scene edges.
    ///
    /// No-op for kinematic or gravity-insensitive entities.
    pub fn apply_gravity(&self, ctx: &StepContext<'_>) {
        let Some(own) = MotionSample::take(self) else {
            return;
        };
        if !own.gravity_reactive {
            return;
        }

        let config = ctx.config();
        let (dt, scene) = (ctx.dt(), ctx.scene());
        let sweep = Sweep::new(own.velocity, dt, config.epsilon);
        let ground = self.find_ground(ctx, &own.collider, &sweep);

        let mut push = None;
        {
            let mut state = self.lock();
            if state.is_kinematic() {
                return;
            }
            let Some(velocity) = state.motion().map(|m| m.velocity()) else {
                return;
            };
            // Controls may have changed the velocity since the sample
            let ground = ground.filter(|(_, below)| {
                let sweep = Sweep::new(velocity, dt, config.epsilon);
                state.collider().check_ground_collision(below, &sweep)
            });

            match ground {
                Some((below, below_collider)) => {
                    let x = state.collider().rect().x;
                    let y = below_collider.rect().top() - state.collider().rect().h;
                    state.place_collider_at(x, y, scene);

                    if let Some(player) = state.player_mut() {
                        player.motion.set_velocity(Vec2::new(velocity.x, 0.0));
                        player.set_on_ground(true);
                        return;
                    }
                    let Some(motion) = state.motion_mut() else {
                        return;
                    };
                    if velocity.y.abs() > motion.viscosity() * config.gravity {
                        if below.kind() == EntityKind::Moveable {
                            push = Some((below.clone(), motion.viscosity() * motion.mass()));
                        }
                        motion.set_velocity(Vec2::new(velocity.x, -velocity.y * motion.viscosity()));
                        log::trace!("{} bounced on {}", self.id(), below.id());
                    } else {
                        motion.set_velocity(Vec2::new(velocity.x, 0.0));
                        return;
                    }
                }
                None => {
                    if let Some(player) = state.player_mut() {
                        player.set_on_ground(false);
                    }
                }
            }

            let Some(motion) = state.motion_mut() else {
                return;
            };
            let mut velocity = motion.velocity();
            velocity.y += config.gravity * motion.viscosity();
            motion.set_velocity(velocity);

            if state.move_along(Axis::Y, velocity.y, dt, scene) {
                if let Some(motion) = state.motion_mut() {
                    motion.set_velocity(Vec2::new(velocity.x, 0.0));
                }
            }
        }

        if let Some((below, amount)) = push {
            let mut state = below.lock();
            if !state.is_kinematic() {
                if let Some(motion) = state.motion_mut() {
                    motion.add_velocity(Vec2::new(0.0, amount));
                }
            }
        }
    }

    fn find_ground(
        &self,
        ctx: &StepContext<'_>,
        collider: &Collider,
        sweep: &Sweep,
    ) -> Option<(EntityRef, Collider)> {
        ctx.snapshot()
            .entities()
            .iter()
            .filter(|other| other.id() != self.id())
            .find_map(|other| {
                let below = ground_collider(other)?;
                collider
                    .check_ground_collision(&below, sweep)
                    .then(|| (other.clone(), below))
            })
    }
}

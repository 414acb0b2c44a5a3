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
//! Impulse exchange between touching moveable entities

use super::{MotionSample, StepContext};
use crate::collider::Sweep;
use crate::entity::Entity;

impl Entity {
    /// Exchange momentum with every moveable entity this one is pushing
    ///
    /// Contacts are found with the side and ceiling predicates against each
    /// other non-kinematic moveable entity (the player is never the pushed
    /// party). The velocity change is split by mass so that the pair's
    /// momentum is unchanged; both entities are then advanced by one step and
    /// the pushed entity's velocity is scaled by its viscosity.
    ///
    /// When this entity is the player its velocity is left alone. The
    /// horizontal part of the change is stored as the player's counter speed
    /// instead, which slows down the player's own movement for the frame.
    ///
    /// No-op for kinematic entities and entities without motion.
    pub fn apply_forces(&self, ctx: &StepContext<'_>) {
        if !self.is_moveable() {
            return;
        }
        {
            let mut state = self.lock();
            if state.is_kinematic() {
                return;
            }
            if let Some(player) = state.player_mut() {
                player.set_x_counter_speed(0.0);
            }
        }

        let config = ctx.config();
        let (dt, scene) = (ctx.dt(), ctx.scene());

        for other in ctx.snapshot().moveables() {
            if other.id() == self.id() || other.is_player() {
                continue;
            }
            let Some(pushed) = MotionSample::take(other) else {
                continue;
            };
            let Some(own) = MotionSample::take(self) else {
                return;
            };

            let sweep = Sweep::new(own.velocity, dt, config.epsilon);
            if !own.collider.check_side_or_upper(&pushed.collider, &sweep) {
                continue;
            }

            let relative = pushed.velocity - own.velocity;
            if relative.x.abs() < config.resting_threshold
                && relative.y.abs() < config.resting_threshold
            {
                continue;
            }

            let total = own.mass + pushed.mass;
            if total <= 0.0 {
                log::debug!(
                    "Skipping impulse between {} and {}: total mass {}",
                    self.id(),
                    other.id(),
                    total
                );
                continue;
            }
            let own_delta = relative * (pushed.mass / total);
            let pushed_delta = -relative * (own.mass / total);

            {
                let mut state = self.lock();
                match state.player_mut() {
                    Some(player) => {
                        let counter = player.x_counter_speed() - own_delta.x;
                        player.set_x_counter_speed(counter);
                    }
                    None => {
                        if let Some(motion) = state.motion_mut() {
                            motion.add_velocity(own_delta);
                        }
                    }
                }
                state.integrate(dt, scene);
            }
            {
                let mut state = other.lock();
                if let Some(motion) = state.motion_mut() {
                    motion.add_velocity(pushed_delta);
                }
                state.integrate(dt, scene);
                if let Some(motion) = state.motion_mut() {
                    let damped = motion.velocity() * motion.viscosity();
                    motion.set_velocity(damped);
                }
            }

            log::trace!(
                "{} pushed {}: relative velocity ({:.3}, {:.3})",
                self.id(),
                other.id(),
                relative.x,
                relative.y
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::PhysicsConfig;
    use crate::entity::TextureHandle;
    use crate::geometry::{Rect, Vec2};
    use crate::physics::StepContext;
    use crate::registry::EntityManager;

    fn momentum(manager: &EntityManager) -> Vec2 {
        manager
            .moveable_entities()
            .iter()
            .map(|e| {
                let state = e.lock();
                let motion = state.motion().unwrap();
                motion.velocity() * motion.mass()
            })
            .fold(Vec2::zero(), |acc, p| acc + p)
    }

    #[test]
    fn test_impulse_conserves_momentum_when_elastic() {
        let manager = EntityManager::new(PhysicsConfig::default().with_gravity(0.0));
        let a = manager.add_moveable_entity_with_viscosity(
            TextureHandle::DEFAULT,
            Rect::new(0.0, 100.0, 20.0, 20.0),
            2.0,
            1.0,
        );
        let b = manager.add_moveable_entity_with_viscosity(
            TextureHandle::DEFAULT,
            Rect::new(20.5, 100.0, 20.0, 20.0),
            3.0,
            1.0,
        );
        a.lock().motion_mut().unwrap().set_velocity(Vec2::new(50.0, 0.0));
        b.lock().motion_mut().unwrap().set_velocity(Vec2::new(-30.0, 0.0));

        let before = momentum(&manager);
        let snapshot = manager.snapshot();
        let config = manager.config().clone();
        let ctx = StepContext::new(&snapshot, &config, 0.01);
        a.apply_forces(&ctx);

        let after = momentum(&manager);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
        // The pair now moves together
        assert!((a.velocity().x - b.velocity().x).abs() < 1e-9);
    }

    #[test]
    fn test_resting_contact_is_ignored() {
        let manager = EntityManager::new(PhysicsConfig::default());
        let a = manager.add_moveable_entity(
            TextureHandle::DEFAULT,
            Rect::new(0.0, 100.0, 20.0, 20.0),
            1.0,
        );
        let b = manager.add_moveable_entity(
            TextureHandle::DEFAULT,
            Rect::new(20.0, 100.0, 20.0, 20.0),
            1.0,
        );
        let snapshot = manager.snapshot();
        let config = manager.config().clone();
        a.apply_forces(&StepContext::new(&snapshot, &config, 0.01));

        assert_eq!(a.rect(), Rect::new(0.0, 100.0, 20.0, 20.0));
        assert_eq!(b.rect(), Rect::new(20.0, 100.0, 20.0, 20.0));
    }

    #[test]
    fn test_player_gets_counter_speed_instead_of_velocity() {
        let manager = EntityManager::new(PhysicsConfig::default().with_gravity(0.0));
        let player = manager.add_player(
            TextureHandle::DEFAULT,
            Rect::new(0.0, 100.0, 20.0, 40.0),
            80.0,
        );
        let crate_box = manager.add_moveable_entity(
            TextureHandle::DEFAULT,
            Rect::new(20.5, 110.0, 30.0, 30.0),
            20.0,
        );
        player.lock().motion_mut().unwrap().set_velocity(Vec2::new(100.0, 0.0));

        let snapshot = manager.snapshot();
        let config = manager.config().clone();
        player.apply_forces(&StepContext::new(&snapshot, &config, 0.01));

        let state = player.lock();
        let player_state = state.player().unwrap();
        assert_eq!(player_state.motion.velocity().x, 100.0);
        // own delta = -100 * 20 / 100
        assert!((player_state.x_counter_speed() - 20.0).abs() < 1e-9);
        assert!((player_state.effective_x_speed() - 80.0).abs() < 1e-9);
        drop(state);
        assert!(crate_box.velocity().x > 0.0);
    }

    #[test]
    fn test_player_counter_speed_accumulates_over_contacts() {
        let manager = EntityManager::new(PhysicsConfig::default().with_gravity(0.0));
        let player = manager.add_player(
            TextureHandle::DEFAULT,
            Rect::new(0.0, 100.0, 20.0, 40.0),
            80.0,
        );
        // One crate ahead, one overhead
        manager.add_moveable_entity(
            TextureHandle::DEFAULT,
            Rect::new(20.5, 110.0, 30.0, 30.0),
            20.0,
        );
        manager.add_moveable_entity(
            TextureHandle::DEFAULT,
            Rect::new(0.0, 79.5, 15.0, 20.0),
            20.0,
        );
        player.lock().motion_mut().unwrap().set_velocity(Vec2::new(100.0, -50.0));

        let snapshot = manager.snapshot();
        let config = manager.config().clone();
        player.apply_forces(&StepContext::new(&snapshot, &config, 0.01));

        let state = player.lock();
        let player_state = state.player().unwrap();
        assert!((player_state.x_counter_speed() - 40.0).abs() < 1e-9);
        assert!((player_state.effective_x_speed() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_ceiling_contact_exchanges_momentum() {
        let manager = EntityManager::new(PhysicsConfig::default().with_gravity(0.0));
        let rising = manager.add_moveable_entity_with_viscosity(
            TextureHandle::DEFAULT,
            Rect::new(0.0, 100.0, 20.0, 20.0),
            2.0,
            1.0,
        );
        let above = manager.add_moveable_entity_with_viscosity(
            TextureHandle::DEFAULT,
            Rect::new(0.0, 79.5, 20.0, 20.0),
            3.0,
            1.0,
        );
        rising.lock().motion_mut().unwrap().set_velocity(Vec2::new(0.0, -50.0));

        let before = momentum(&manager);
        let snapshot = manager.snapshot();
        let config = manager.config().clone();
        rising.apply_forces(&StepContext::new(&snapshot, &config, 0.01));

        let after = momentum(&manager);
        assert!((before.y - after.y).abs() < 1e-9);
        assert!((rising.velocity().y - (-20.0)).abs() < 1e-9);
        assert!((above.velocity().y - (-20.0)).abs() < 1e-9);
        assert_eq!(above.velocity().x, 0.0);
    }

    #[test]
    fn test_kinematic_entity_is_never_pushed() {
        let manager = EntityManager::new(PhysicsConfig::default().with_gravity(0.0));
        let a = manager.add_moveable_entity(
            TextureHandle::DEFAULT,
            Rect::new(0.0, 100.0, 20.0, 20.0),
            1.0,
        );
        let wall = manager.add_moveable_entity(
            TextureHandle::DEFAULT,
            Rect::new(20.5, 100.0, 20.0, 20.0),
            1.0,
        );
        wall.lock().set_kinematic(true);
        a.lock().motion_mut().unwrap().set_velocity(Vec2::new(80.0, 0.0));

        let snapshot = manager.snapshot();
        let config = manager.config().clone();
        a.apply_forces(&StepContext::new(&snapshot, &config, 0.01));

        assert_eq!(wall.rect(), Rect::new(20.5, 100.0, 20.0, 20.0));
        assert_eq!(wall.velocity(), Vec2::zero());
        assert_eq!(a.velocity(), Vec2::new(80.0, 0.0));
    }
}

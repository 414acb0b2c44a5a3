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
//! Fixed-step movement, gravity and collision response
//!
//! One fixed tick runs, in order:
//!
//! 1. [`Entity::apply_forces`] for every moveable entity: impulse exchange
//!    between touching moveables,
//! 2. [`Entity::apply_gravity`] for every moveable entity: ground detection,
//!    bouncing and free fall,
//! 3. [`solve_insiders`] once: separation of entities left overlapping an
//!    obstacle.
//!
//! The resolution is approximate and depends on the registry's iteration
//! order; it is not a global solver.
//!
//! [`Entity::apply_forces`]: crate::entity::Entity::apply_forces
//! [`Entity::apply_gravity`]: crate::entity::Entity::apply_gravity

mod forces;
mod gravity;
mod solver;

pub use solver::solve_insiders;

use crate::collider::Collider;
use crate::config::PhysicsConfig;
use crate::entity::{Entity, EntityKind};
use crate::geometry::Vec2;
use crate::registry::EntitySnapshot;

/// Scoped inputs of one fixed step
///
/// Bundles the entity lists captured at the start of the tick, the
/// configuration and the step length, replacing a back-reference from each
/// entity to its registry.
pub struct StepContext<'a> {
    snapshot: &'a EntitySnapshot,
    config: &'a PhysicsConfig,
    dt: f64,
}

impl<'a> StepContext<'a> {
    /// Create a step context
    pub fn new(snapshot: &'a EntitySnapshot, config: &'a PhysicsConfig, dt: f64) -> Self {
        StepContext { snapshot, config, dt }
    }

    /// Entity lists for this step
    pub fn snapshot(&self) -> &EntitySnapshot {
        self.snapshot
    }

    /// Simulation constants
    pub fn config(&self) -> &PhysicsConfig {
        self.config
    }

    /// Step length in seconds
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Scene bounds
    pub fn scene(&self) -> Vec2 {
        self.config.scene_size()
    }
}

/// Run one full fixed step over the snapshot
pub fn step(ctx: &StepContext<'_>) {
    for entity in ctx.snapshot().moveables() {
        entity.apply_forces(ctx);
        entity.apply_gravity(ctx);
    }
    solve_insiders(ctx);
}

/// Motion data copied out of one entity's lock
#[derive(Debug, Clone, Copy)]
pub(crate) struct MotionSample {
    pub collider: Collider,
    pub velocity: Vec2,
    pub mass: f64,
    pub gravity_reactive: bool,
}

impl MotionSample {
    /// Sample a moveable, non-kinematic entity
    pub fn take(entity: &Entity) -> Option<Self> {
        let state = entity.lock();
        if state.is_kinematic() {
            return None;
        }
        let motion = state.motion()?;
        Some(MotionSample {
            collider: *state.collider(),
            velocity: motion.velocity(),
            mass: motion.mass(),
            gravity_reactive: motion.is_gravity_reactive(),
        })
    }
}

/// Collider of an entity that can hold others up
///
/// Kinematic entities count, since they make up level geometry.
pub(crate) fn ground_collider(entity: &Entity) -> Option<Collider> {
    (entity.kind() != EntityKind::Collectible).then(|| entity.collider())
}

/// Collider of an entity that currently takes part in collisions
pub(crate) fn obstacle_collider(entity: &Entity) -> Option<Collider> {
    if entity.kind() == EntityKind::Collectible {
        return None;
    }
    let state = entity.lock();
    if state.is_kinematic() {
        None
    } else {
        Some(*state.collider())
    }
}

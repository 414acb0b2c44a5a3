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
//! Render-thread frame surface
//!
//! Everything the variable-rate main loop does with the simulation while a
//! level is playing: translate input into player velocity, move the player
//! horizontally, pick up collectibles and detect the win condition.

use crate::config::PhysicsConfig;
use crate::entity::Entity;
use crate::geometry::{Axis, Vec2};
use crate::registry::EntityManager;

/// Directional input sampled once per frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerControls {
    /// Jump key held
    pub up: bool,
    /// Left key held
    pub left: bool,
    /// Right key held
    pub right: bool,
}

impl PlayerControls {
    /// Controls with nothing pressed
    pub fn none() -> Self {
        Self::default()
    }

    /// Translate the keys into the player's velocity
    ///
    /// Jumping only starts from the ground. Holding both horizontal keys
    /// cancels them out.
    pub fn apply(&self, player: &Entity, config: &PhysicsConfig) {
        let mut state = player.lock();
        let Some(controlled) = state.player_mut() else {
            return;
        };
        let mut velocity = controlled.motion.velocity();
        if self.up && controlled.on_ground() {
            velocity.y = -config.player_jump_speed;
            controlled.set_on_ground(false);
        }
        velocity.x = match (self.left, self.right) {
            (true, false) => -config.player_run_speed,
            (false, true) => config.player_run_speed,
            _ => 0.0,
        };
        controlled.motion.set_velocity(velocity);
    }
}

/// Result of one frame update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The simulation is not running
    Idle,
    /// The level is in progress
    Playing {
        /// Collectibles picked up so far
        collected: usize,
        /// Collectibles left
        remaining: usize,
    },
    /// Every collectible was picked up
    Won,
}

impl Entity {
    /// Move the player horizontally for one render frame
    ///
    /// Uses the controlled speed minus the counter speed left by the last
    /// collision. No-op for other entities.
    pub fn apply_movements(&self, dt: f64, scene: Vec2) {
        let mut state = self.lock();
        let Some(speed) = state.player().map(|p| p.effective_x_speed()) else {
            return;
        };
        state.move_along(Axis::X, speed, dt, scene);
    }
}

/// Collect every collectible whose top-left corner is inside the player's collider
///
/// Returns how many were collected by this call.
pub fn collect_touched(manager: &EntityManager) -> usize {
    let snapshot = manager.snapshot();
    let Some(player) = snapshot.player() else {
        return 0;
    };
    let reach = *player.collider().rect();

    let mut collected = 0;
    for collectible in snapshot.collectibles() {
        let mut state = collectible.lock();
        let corner = state.rect().position();
        if reach.contains_point(corner.x, corner.y) && state.collect() {
            log::debug!("Player collected {}", collectible.id());
            collected += 1;
        }
    }
    collected
}

/// Count collected and remaining collectibles
pub fn collectible_progress(manager: &EntityManager) -> (usize, usize) {
    manager
        .collectibles()
        .iter()
        .fold((0, 0), |(done, left), c| {
            let collected = c.lock().collectible().is_some_and(|s| s.is_collected());
            if collected {
                (done + 1, left)
            } else {
                (done, left + 1)
            }
        })
}

/// Run the per-frame player logic for a playing level
pub fn update_frame(manager: &EntityManager, controls: PlayerControls, dt: f64) -> FrameOutcome {
    match manager.player() {
        Some(player) => {
            controls.apply(&player, manager.config());
            player.apply_movements(dt, manager.config().scene_size());
        }
        None => log::debug!("Frame update without a player"),
    }
    collect_touched(manager);

    let (collected, remaining) = collectible_progress(manager);
    if collected > 0 && remaining == 0 {
        log::info!("All {} collectibles collected", collected);
        FrameOutcome::Won
    } else {
        FrameOutcome::Playing { collected, remaining }
    }
}

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
//! Simulation configuration
//!
//! [`PhysicsConfig`] collects every tunable constant of the simulation. The
//! collision epsilon deserves the most care: too small and entities stick to
//! or tunnel through thin platforms, too large and resting entities register
//! false contacts.
//!
//! # Environment Configuration
//!
//! The following variables override loaded values when
//! [`PhysicsConfig::apply_env`] is called:
//!
//! ```bash
//! export PLATFORM_PHYSICS_TICK_MS=10
//! export PLATFORM_PHYSICS_EPSILON=0.75
//! export PLATFORM_PHYSICS_GRAVITY=9.81
//! ```

use crate::error::{EngineError, Result};
use crate::geometry::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding the fixed tick period in milliseconds
pub const ENV_TICK_MS: &str = "PLATFORM_PHYSICS_TICK_MS";
/// Environment variable overriding the collision epsilon
pub const ENV_EPSILON: &str = "PLATFORM_PHYSICS_EPSILON";
/// Environment variable overriding gravity
pub const ENV_GRAVITY: &str = "PLATFORM_PHYSICS_GRAVITY";

/// Tunable simulation constants
///
/// Gravity is a per-tick vertical velocity increment, scaled by each
/// entity's viscosity. The y axis points down.
///
/// # Examples
///
/// ```
/// use platform_physics::config::PhysicsConfig;
///
/// let config = PhysicsConfig::default()
///     .with_tick_ms(5)
///     .with_epsilon(0.5);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.tick_seconds(), 0.005);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fixed tick period in milliseconds
    pub tick_ms: u64,
    /// Contact tolerance used by every collision predicate and the solver
    pub epsilon: f64,
    /// Per-tick vertical velocity increment
    pub gravity: f64,
    /// Relative speed below which touching moveables are considered at rest
    pub resting_threshold: f64,
    /// Scene width; colliders never leave `[0, scene_width]`
    pub scene_width: f64,
    /// Scene height; colliders never leave `[0, scene_height]`
    pub scene_height: f64,
    /// Viscosity given to moveable entities created without one
    pub default_viscosity: f64,
    /// Viscosity given to the player
    pub player_viscosity: f64,
    /// Horizontal speed applied by the left/right controls
    pub player_run_speed: f64,
    /// Upward speed applied by a jump
    pub player_jump_speed: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            tick_ms: 10,
            epsilon: 0.75,
            gravity: 9.81,
            resting_threshold: 0.1,
            scene_width: 800.0,
            scene_height: 550.0,
            default_viscosity: 0.31,
            player_viscosity: 0.3,
            player_run_speed: 100.0,
            player_jump_speed: 250.0,
        }
    }
}

impl PhysicsConfig {
    /// Set the fixed tick period
    pub fn with_tick_ms(mut self, tick_ms: u64) -> Self {
        self.tick_ms = tick_ms;
        self
    }

    /// Set the collision epsilon
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set gravity
    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the scene size
    pub fn with_scene_size(mut self, width: f64, height: f64) -> Self {
        self.scene_width = width;
        self.scene_height = height;
        self
    }

    /// Scene size as a vector
    pub fn scene_size(&self) -> Vec2 {
        Vec2::new(self.scene_width, self.scene_height)
    }

    /// Tick period as a duration
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Tick period in seconds, the `dt` of every fixed step
    pub fn tick_seconds(&self) -> f64 {
        self.tick_ms as f64 / 1000.0
    }

    /// Check the configuration for values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            return Err(EngineError::Config("tick_ms must be positive".to_string()));
        }
        if !(self.epsilon >= 0.0 && self.epsilon.is_finite()) {
            return Err(EngineError::Config(format!(
                "epsilon must be non-negative and finite, got {}",
                self.epsilon
            )));
        }
        if !(self.scene_width > 0.0 && self.scene_height > 0.0) {
            return Err(EngineError::Config(format!(
                "scene size must be positive, got {}x{}",
                self.scene_width, self.scene_height
            )));
        }
        if !self.gravity.is_finite() {
            return Err(EngineError::Config("gravity must be finite".to_string()));
        }
        Ok(())
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: PhysicsConfig =
            toml::from_str(source).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Apply environment overrides; malformed values are logged and ignored
    pub fn apply_env(mut self) -> Self {
        if let Some(tick_ms) = read_env(ENV_TICK_MS) {
            self.tick_ms = tick_ms;
        }
        if let Some(epsilon) = read_env(ENV_EPSILON) {
            self.epsilon = epsilon;
        }
        if let Some(gravity) = read_env(ENV_GRAVITY) {
            self.gravity = gravity;
        }
        self
    }
}

fn read_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}: '{}' is not a valid value", name, raw);
            None
        }
    }
}

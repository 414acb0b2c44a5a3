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
//! Mutable entity state
//!
//! Everything in this module runs while the owning entity's mutex is held,
//! so none of it touches another entity.

use crate::collider::Collider;
use crate::entity::{EntityId, EntityKind, TextureHandle};
use crate::error::{EngineError, Result};
use crate::geometry::{Axis, Rect, Vec2};
use std::fmt::Write;

/// Velocity, mass and spawn data for entities that move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    mass: f64,
    viscosity: f64,
    velocity: Vec2,
    gravity_reactive: bool,
    spawn: Vec2,
}

impl Motion {
    /// Create motion state at rest, spawning at `spawn`
    ///
    /// Mass is not validated; a non-positive mass makes impulse exchange
    /// with this entity a no-op.
    pub fn new(mass: f64, viscosity: f64, spawn: Vec2) -> Self {
        Motion {
            mass,
            viscosity,
            velocity: Vec2::zero(),
            gravity_reactive: true,
            spawn,
        }
    }

    /// Mass
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Set the mass
    pub fn set_mass(&mut self, mass: f64) {
        self.mass = mass;
    }

    /// Damping/restitution factor
    pub fn viscosity(&self) -> f64 {
        self.viscosity
    }

    /// Set the damping/restitution factor
    pub fn set_viscosity(&mut self, viscosity: f64) {
        self.viscosity = viscosity;
    }

    /// Current velocity
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Overwrite the velocity
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Add a velocity change
    pub fn add_velocity(&mut self, delta: Vec2) {
        self.velocity += delta;
    }

    /// Whether gravity applies to this entity
    pub fn is_gravity_reactive(&self) -> bool {
        self.gravity_reactive
    }

    /// Enable or disable gravity
    pub fn set_gravity_reactive(&mut self, reactive: bool) {
        self.gravity_reactive = reactive;
    }

    /// Position restored by a reset
    pub fn spawn(&self) -> Vec2 {
        self.spawn
    }
}

/// Player-only state on top of [`Motion`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    /// Shared motion state
    pub motion: Motion,
    on_ground: bool,
    x_counter_speed: f64,
}

impl PlayerState {
    /// Create player state from motion
    pub fn new(motion: Motion) -> Self {
        PlayerState {
            motion,
            on_ground: false,
            x_counter_speed: 0.0,
        }
    }

    /// Whether the player stood on something during the last gravity step
    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    /// Set the on-ground flag
    pub fn set_on_ground(&mut self, on_ground: bool) {
        self.on_ground = on_ground;
    }

    /// Horizontal speed subtracted from the controlled speed after collisions
    pub fn x_counter_speed(&self) -> f64 {
        self.x_counter_speed
    }

    /// Set the horizontal counter speed
    pub fn set_x_counter_speed(&mut self, speed: f64) {
        self.x_counter_speed = speed;
    }

    /// Horizontal speed actually applied by per-frame movement
    pub fn effective_x_speed(&self) -> f64 {
        self.motion.velocity.x - self.x_counter_speed
    }
}

/// Collectible-only state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectibleState {
    collected: bool,
    saved_texture: TextureHandle,
}

impl CollectibleState {
    /// Create an uncollected collectible remembering its texture
    pub fn new(texture: TextureHandle) -> Self {
        CollectibleState {
            collected: false,
            saved_texture: texture,
        }
    }

    /// Whether the player picked this up
    pub fn is_collected(&self) -> bool {
        self.collected
    }

    /// Texture restored on reset
    pub fn saved_texture(&self) -> TextureHandle {
        self.saved_texture
    }
}

/// Kind-specific state, the tagged replacement for a class hierarchy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Body {
    /// Level geometry
    Static,
    /// Generic moveable entity
    Moveable(Motion),
    /// The player
    Player(PlayerState),
    /// Pickup
    Collectible(CollectibleState),
}

impl Body {
    /// The kind tag for this body
    pub fn kind(&self) -> EntityKind {
        match self {
            Body::Static => EntityKind::Static,
            Body::Moveable(_) => EntityKind::Moveable,
            Body::Player(_) => EntityKind::Player,
            Body::Collectible(_) => EntityKind::Collectible,
        }
    }

    /// Motion state, if this body moves
    pub fn motion(&self) -> Option<&Motion> {
        match self {
            Body::Moveable(motion) => Some(motion),
            Body::Player(player) => Some(&player.motion),
            _ => None,
        }
    }

    /// Mutable motion state, if this body moves
    pub fn motion_mut(&mut self) -> Option<&mut Motion> {
        match self {
            Body::Moveable(motion) => Some(motion),
            Body::Player(player) => Some(&mut player.motion),
            _ => None,
        }
    }
}

/// Mutable state of one entity, guarded by the entity's mutex
#[derive(Debug, Clone)]
pub struct EntityState {
    name: String,
    rect: Rect,
    rotation: f64,
    texture: TextureHandle,
    kinematic: bool,
    collider: Collider,
    body: Body,
}

impl EntityState {
    fn with_body(name: &str, texture: TextureHandle, rect: Rect, body: Body) -> Self {
        EntityState {
            name: name.to_string(),
            rect,
            rotation: 0.0,
            texture,
            kinematic: matches!(body, Body::Collectible(_)),
            collider: Collider::new(rect),
            body,
        }
    }

    /// State for a static entity
    pub fn new_static(name: &str, texture: TextureHandle, rect: Rect) -> Self {
        Self::with_body(name, texture, rect, Body::Static)
    }

    /// State for a moveable entity spawning at the rectangle's corner
    pub fn new_moveable(name: &str, texture: TextureHandle, rect: Rect, mass: f64, viscosity: f64) -> Self {
        let motion = Motion::new(mass, viscosity, rect.position());
        Self::with_body(name, texture, rect, Body::Moveable(motion))
    }

    /// State for the player
    pub fn new_player(name: &str, texture: TextureHandle, rect: Rect, mass: f64, viscosity: f64) -> Self {
        let motion = Motion::new(mass, viscosity, rect.position());
        Self::with_body(name, texture, rect, Body::Player(PlayerState::new(motion)))
    }

    /// State for a collectible, always kinematic
    pub fn new_collectible(name: &str, texture: TextureHandle, rect: Rect) -> Self {
        Self::with_body(name, texture, rect, Body::Collectible(CollectibleState::new(texture)))
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the entity
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Visual rectangle
    pub fn rect(&self) -> &Rect {
        &self.rect
    }

    /// Top-left corner of the visual rectangle
    pub fn position(&self) -> Vec2 {
        self.rect.position()
    }

    /// The entity's collider
    pub fn collider(&self) -> &Collider {
        &self.collider
    }

    /// Rotation in degrees
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Texture drawn for this entity
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    /// Replace the drawn texture
    pub fn set_texture(&mut self, texture: TextureHandle) {
        self.texture = texture;
    }

    /// Kinematic entities never move and are ignored by collision response
    pub fn is_kinematic(&self) -> bool {
        self.kinematic
    }

    /// Set the kinematic flag; collectibles stay kinematic
    pub fn set_kinematic(&mut self, kinematic: bool) {
        if matches!(self.body, Body::Collectible(_)) {
            log::debug!("Ignoring kinematic change on collectible '{}'", self.name);
            return;
        }
        self.kinematic = kinematic;
    }

    /// Kind-specific state
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Motion state for moveable entities and the player
    pub fn motion(&self) -> Option<&Motion> {
        self.body.motion()
    }

    /// Mutable motion state for moveable entities and the player
    pub fn motion_mut(&mut self) -> Option<&mut Motion> {
        self.body.motion_mut()
    }

    /// Player state, if this is the player
    pub fn player(&self) -> Option<&PlayerState> {
        match &self.body {
            Body::Player(player) => Some(player),
            _ => None,
        }
    }

    /// Mutable player state, if this is the player
    pub fn player_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.body {
            Body::Player(player) => Some(player),
            _ => None,
        }
    }

    /// Collectible state, if this is a collectible
    pub fn collectible(&self) -> Option<&CollectibleState> {
        match &self.body {
            Body::Collectible(collectible) => Some(collectible),
            _ => None,
        }
    }

    /// Deliberate reposition, e.g. from the editor
    ///
    /// Clamps the far edges to the scene, resyncs the collider and records
    /// the new position as the spawn point of moveable entities.
    pub fn set_position(&mut self, x: f64, y: f64, scene: Vec2) {
        self.set_position_keeping_spawn(x, y, scene);
        let position = self.rect.position();
        if let Some(motion) = self.body.motion_mut() {
            motion.spawn = position;
        }
    }

    /// Physics correction that leaves the spawn point untouched
    pub fn set_position_keeping_spawn(&mut self, x: f64, y: f64, scene: Vec2) {
        self.rect.x = if x + self.rect.w > scene.x { scene.x - self.rect.w } else { x };
        self.rect.y = if y + self.rect.h > scene.y { scene.y - self.rect.h } else { y };
        self.collider.update_position(self.rect.position());
    }

    /// Move the entity so that its collider's corner lands on `(x, y)`
    pub fn place_collider_at(&mut self, x: f64, y: f64, scene: Vec2) {
        let offset = self.collider.parent_offset();
        self.set_position_keeping_spawn(x - offset.x, y - offset.y, scene);
    }

    /// Move the collider relative to the entity, e.g. to pad or shift it
    pub fn set_collider_position(&mut self, x: f64, y: f64) {
        let parent = self.rect.position();
        self.collider.set_position(x, y, parent);
    }

    /// Resize the collider independently from the visual rectangle
    pub fn set_collider_dimensions(&mut self, w: f64, h: f64) {
        self.collider.set_dimensions(w, h);
    }

    /// Set the rotation of the entity and its collider
    pub fn set_rotation(&mut self, angle: f64) {
        self.rotation = angle;
        self.collider.set_rotation(angle);
    }

    /// Accumulate rotation, wrapped to (-360, 360)
    pub fn rotate(&mut self, speed: f64, dt: f64) {
        let angle = (self.rotation + speed * dt) % 360.0;
        self.set_rotation(angle);
    }

    /// Resize the entity, growing the collider by the same delta
    pub fn set_size(&mut self, w: f64, h: f64) {
        let (w, h) = (w.max(0.0), h.max(0.0));
        let collider = *self.collider.rect();
        self.collider
            .set_dimensions(collider.w - self.rect.w + w, collider.h - self.rect.h + h);
        self.rect.w = w;
        self.rect.h = h;
    }

    /// Integrate the position by `speed * dt` along one axis
    ///
    /// The collider is kept within `[0, scene - size]` on that axis. Returns
    /// `true` when the clamp engaged.
    pub fn move_along(&mut self, axis: Axis, speed: f64, dt: f64, scene: Vec2) -> bool {
        let collider = *self.collider.rect();
        let current = collider.coord(axis);
        let target = current + speed * dt;
        let max = (scene.get(axis) - collider.extent(axis)).max(0.0);
        let reached = target.clamp(0.0, max);

        let mut position = self.rect.position();
        position.set(axis, position.get(axis) + (reached - current));
        self.rect.x = position.x;
        self.rect.y = position.y;
        self.collider.update_position(position);

        reached != target
    }

    /// Integrate both axes with the current velocity
    pub fn integrate(&mut self, dt: f64, scene: Vec2) {
        let velocity = match self.body.motion() {
            Some(motion) => motion.velocity,
            None => return,
        };
        self.move_along(Axis::X, velocity.x, dt, scene);
        self.move_along(Axis::Y, velocity.y, dt, scene);
    }

    /// Restore the spawn state used when the level stops
    pub fn reset(&mut self, scene: Vec2) {
        if let Body::Collectible(collectible) = &mut self.body {
            collectible.collected = false;
            self.texture = collectible.saved_texture;
            return;
        }
        let Some(spawn) = self.body.motion().map(|m| m.spawn) else {
            return;
        };
        self.set_position_keeping_spawn(spawn.x, spawn.y, scene);
        if let Some(motion) = self.body.motion_mut() {
            motion.velocity = Vec2::zero();
        }
        if let Some(player) = self.player_mut() {
            player.x_counter_speed = 0.0;
            player.on_ground = false;
        }
        self.set_rotation(0.0);
    }

    /// Mark a collectible as collected, hiding its texture
    ///
    /// Returns `true` only on the transition to collected.
    pub fn collect(&mut self) -> bool {
        match &mut self.body {
            Body::Collectible(collectible) if !collectible.collected => {
                collectible.collected = true;
                self.texture = TextureHandle::NONE;
                true
            }
            _ => false,
        }
    }

    /// Set the mass of a moveable entity
    pub fn set_mass(&mut self, mass: f64) -> Result<()> {
        let kind = self.body.kind();
        let motion = self.body.motion_mut().ok_or(EngineError::NotApplicable {
            property: "mass",
            kind,
        })?;
        motion.set_mass(mass);
        Ok(())
    }

    /// Set the viscosity of a moveable entity
    pub fn set_viscosity(&mut self, viscosity: f64) -> Result<()> {
        let kind = self.body.kind();
        let motion = self.body.motion_mut().ok_or(EngineError::NotApplicable {
            property: "viscosity",
            kind,
        })?;
        motion.set_viscosity(viscosity);
        Ok(())
    }

    /// Enable or disable gravity on a moveable entity
    pub fn set_gravity_reactive(&mut self, reactive: bool) -> Result<()> {
        let kind = self.body.kind();
        let motion = self.body.motion_mut().ok_or(EngineError::NotApplicable {
            property: "gravity reactive",
            kind,
        })?;
        motion.set_gravity_reactive(reactive);
        Ok(())
    }

    /// Multi-line summary shown by the editor inspector
    pub fn describe(&self, id: EntityId) -> String {
        let collider = self.collider.rect();
        let mut info = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(info, "Entity's ID : {}", id.raw());
        let _ = writeln!(info, "Entity's name : {}", self.name);
        let _ = writeln!(info, "Entity's position : x : {} y : {}", self.rect.x as i32, self.rect.y as i32);
        let _ = writeln!(info, "Entity's rotation : {}", self.rotation);
        let _ = writeln!(info, "Entity's size : x : {} y : {}", self.rect.w as i32, self.rect.h as i32);
        let _ = writeln!(info, "Collider's position : x : {} y : {}", collider.x as i32, collider.y as i32);
        let _ = writeln!(info, "Collider's size : w : {} h : {}", collider.w as i32, collider.h as i32);
        if let Some(motion) = self.body.motion() {
            let _ = writeln!(info, "Entity's mass : {}kg", motion.mass);
            let _ = writeln!(info, "Entity's viscosity : {}", motion.viscosity);
            let _ = writeln!(info, "Gravity reactive : {}", motion.gravity_reactive);
            let _ = writeln!(info, "Is kinematic : {}", self.kinematic);
        }
        info
    }
}

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
//! Entities and their shared handles
//!
//! An [`Entity`] is an immutable identity (id and kind) plus an
//! [`EntityState`] guarded by a per-entity mutex. Entities are shared between
//! the render thread and the fixed-tick thread through [`EntityRef`]
//! (`Arc<Entity>`); the registry owns the authoritative list.
//!
//! # Locking
//!
//! Every critical section locks exactly one entity. Code that needs data from
//! two entities copies what it needs out of the first guard, drops it, and only
//! then locks the second, so no thread ever waits on a second entity's mutex
//! while holding another one.

mod state;

pub use state::{Body, CollectibleState, EntityState, Motion, PlayerState};

use crate::collider::Collider;
use crate::geometry::{Rect, Vec2};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Unique identifier for an entity, assigned sequentially by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u32);

impl EntityId {
    /// Create a new EntityId from a raw value
    pub fn new(id: u32) -> Self {
        EntityId(id)
    }

    /// Get the raw value
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Opaque handle to a texture owned by the rendering layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    /// The empty texture, drawn as nothing
    pub const NONE: TextureHandle = TextureHandle(0);
    /// Placeholder texture used by the default factory
    pub const DEFAULT: TextureHandle = TextureHandle(1);
}

/// What an entity is, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Level geometry that never moves on its own
    Static,
    /// Entity with mass that reacts to gravity and impulses
    Moveable,
    /// The single player-controlled moveable entity
    Player,
    /// Pickup, always kinematic
    Collectible,
}

impl EntityKind {
    /// Whether this kind carries [`Motion`] state
    pub fn is_moveable(&self) -> bool {
        matches!(self, EntityKind::Moveable | EntityKind::Player)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Static => "static entity",
            EntityKind::Moveable => "moveable entity",
            EntityKind::Player => "player",
            EntityKind::Collectible => "collectible",
        };
        f.write_str(name)
    }
}

/// Shared handle to an entity
pub type EntityRef = Arc<Entity>;

/// A scene entity: identity plus mutex-guarded state
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    kind: EntityKind,
    state: Mutex<EntityState>,
}

impl Entity {
    pub(crate) fn new(id: EntityId, state: EntityState) -> Self {
        Entity {
            id,
            kind: state.body().kind(),
            state: Mutex::new(state),
        }
    }

    /// Get the entity ID
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Get the entity kind
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Whether this entity carries motion state
    pub fn is_moveable(&self) -> bool {
        self.kind.is_moveable()
    }

    /// Whether this entity is the player
    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }

    /// Lock the entity's state
    ///
    /// A poisoned lock is recovered: every critical section leaves the state
    /// consistent, so a panic elsewhere does not invalidate it.
    pub fn lock(&self) -> MutexGuard<'_, EntityState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the entity's visual rectangle
    pub fn rect(&self) -> Rect {
        *self.lock().rect()
    }

    /// Copy of the entity's collider
    pub fn collider(&self) -> Collider {
        *self.lock().collider()
    }

    /// Current velocity, zero for entities without motion
    pub fn velocity(&self) -> Vec2 {
        self.lock()
            .motion()
            .map(|m| m.velocity())
            .unwrap_or_default()
    }

    /// Current kinematic flag
    pub fn is_kinematic(&self) -> bool {
        self.lock().is_kinematic()
    }

    /// Whether this entity can act as a collision obstacle right now
    pub fn is_obstacle(&self) -> bool {
        self.kind != EntityKind::Collectible && !self.is_kinematic()
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}

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
//! Entity registry
//!
//! [`EntityManager`] owns every entity of a level and the categorized lists
//! used by the simulation (statics, moveables, collectibles and the player).
//! It is shared between the render thread and the fixed-tick thread as an
//! `Arc<EntityManager>`; the lists sit behind a read-write lock while each
//! entity keeps its own mutex.
//!
//! # Example
//!
//! ```
//! use platform_physics::config::PhysicsConfig;
//! use platform_physics::entity::TextureHandle;
//! use platform_physics::geometry::Rect;
//! use platform_physics::registry::EntityManager;
//!
//! let manager = EntityManager::new(PhysicsConfig::default());
//! manager.add_entity(TextureHandle::DEFAULT, Rect::new(0.0, 100.0, 200.0, 10.0));
//! let body = manager.add_moveable_entity(TextureHandle::DEFAULT, Rect::new(10.0, 0.0, 20.0, 20.0), 5.0);
//!
//! manager.fixed_update(0.01);
//! assert!(body.velocity().y > 0.0);
//! ```

use crate::config::PhysicsConfig;
use crate::entity::{Entity, EntityId, EntityKind, EntityRef, EntityState, TextureHandle};
use crate::error::{EngineError, Result};
use crate::geometry::Rect;
use crate::physics::{self, StepContext};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Size of entities created from the editor's "add" button
const DEFAULT_ENTITY_SIZE: f64 = 50.0;

/// Point-in-time copy of the registry's lists
///
/// Holding a snapshot keeps the entities alive but not the registry lock, so
/// a tick can iterate it while the editor adds or deletes entities.
#[derive(Debug, Clone, Default)]
pub struct EntitySnapshot {
    entities: Vec<EntityRef>,
    statics: Vec<EntityRef>,
    moveables: Vec<EntityRef>,
    collectibles: Vec<EntityRef>,
    player: Option<EntityRef>,
}

impl EntitySnapshot {
    /// All entities in creation order
    pub fn entities(&self) -> &[EntityRef] {
        &self.entities
    }

    /// Static entities
    pub fn statics(&self) -> &[EntityRef] {
        &self.statics
    }

    /// Moveable entities, the player included
    pub fn moveables(&self) -> &[EntityRef] {
        &self.moveables
    }

    /// Collectibles
    pub fn collectibles(&self) -> &[EntityRef] {
        &self.collectibles
    }

    /// The player, if one was added
    pub fn player(&self) -> Option<&EntityRef> {
        self.player.as_ref()
    }

    /// Whether the snapshot holds no entity
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[derive(Debug, Default)]
struct Lists {
    next_id: u32,
    current: EntitySnapshot,
}

impl Lists {
    fn insert(&mut self, state: EntityState) -> EntityRef {
        self.next_id += 1;
        let entity = EntityRef::new(Entity::new(EntityId::new(self.next_id), state));
        let lists = &mut self.current;
        lists.entities.push(entity.clone());
        match entity.kind() {
            EntityKind::Static => lists.statics.push(entity.clone()),
            EntityKind::Moveable => lists.moveables.push(entity.clone()),
            EntityKind::Player => {
                lists.moveables.push(entity.clone());
                lists.player = Some(entity.clone());
            }
            EntityKind::Collectible => lists.collectibles.push(entity.clone()),
        }
        entity
    }
}

/// Registry of all entities in a level
#[derive(Debug)]
pub struct EntityManager {
    config: PhysicsConfig,
    lists: RwLock<Lists>,
}

impl EntityManager {
    /// Create an empty registry
    pub fn new(config: PhysicsConfig) -> Self {
        EntityManager {
            config,
            lists: RwLock::new(Lists::default()),
        }
    }

    /// Simulation constants
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, Lists> {
        self.lists.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Lists> {
        self.lists.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a static entity
    pub fn add_entity(&self, texture: TextureHandle, rect: Rect) -> EntityRef {
        let mut lists = self.write();
        let name = format!("Entity {}", lists.next_id + 1);
        let entity = lists.insert(EntityState::new_static(&name, texture, rect));
        log::debug!("Added static {} at ({}, {})", entity.id(), rect.x, rect.y);
        entity
    }

    /// Add a default-sized static entity at the origin
    pub fn add_entity_default(&self) -> EntityRef {
        self.add_entity(
            TextureHandle::DEFAULT,
            Rect::new(0.0, 0.0, DEFAULT_ENTITY_SIZE, DEFAULT_ENTITY_SIZE),
        )
    }

    /// Add a moveable entity with the default viscosity
    pub fn add_moveable_entity(&self, texture: TextureHandle, rect: Rect, mass: f64) -> EntityRef {
        self.add_moveable_entity_with_viscosity(texture, rect, mass, self.config.default_viscosity)
    }

    /// Add a moveable entity with an explicit viscosity
    pub fn add_moveable_entity_with_viscosity(
        &self,
        texture: TextureHandle,
        rect: Rect,
        mass: f64,
        viscosity: f64,
    ) -> EntityRef {
        let mut lists = self.write();
        let name = format!("Moveable {}", lists.next_id + 1);
        let entity = lists.insert(EntityState::new_moveable(&name, texture, rect, mass, viscosity));
        log::debug!("Added moveable {} with mass {}", entity.id(), mass);
        entity
    }

    /// Add the player
    ///
    /// There is at most one player. If it already exists, its mass and
    /// viscosity are updated and the existing handle is returned.
    pub fn add_player(&self, texture: TextureHandle, rect: Rect, mass: f64) -> EntityRef {
        let mut lists = self.write();
        let existing = lists.current.player.clone();
        if let Some(player) = existing {
            drop(lists);
            if let Some(motion) = player.lock().motion_mut() {
                motion.set_mass(mass);
                motion.set_viscosity(self.config.player_viscosity);
            }
            log::debug!("Player already exists as {}, updated its mass", player.id());
            return player;
        }
        let entity = lists.insert(EntityState::new_player(
            "Player",
            texture,
            rect,
            mass,
            self.config.player_viscosity,
        ));
        log::debug!("Added player {}", entity.id());
        entity
    }

    /// Add a collectible
    pub fn add_collectible(&self, texture: TextureHandle, rect: Rect) -> EntityRef {
        let mut lists = self.write();
        let name = format!("Collectible {}", lists.next_id + 1);
        let entity = lists.insert(EntityState::new_collectible(&name, texture, rect));
        log::debug!("Added collectible {}", entity.id());
        entity
    }

    /// Copy of every list
    pub fn snapshot(&self) -> EntitySnapshot {
        self.read().current.clone()
    }

    /// All entities
    pub fn entities(&self) -> Vec<EntityRef> {
        self.read().current.entities.clone()
    }

    /// Static entities
    pub fn static_entities(&self) -> Vec<EntityRef> {
        self.read().current.statics.clone()
    }

    /// Moveable entities, the player included
    pub fn moveable_entities(&self) -> Vec<EntityRef> {
        self.read().current.moveables.clone()
    }

    /// Collectibles
    pub fn collectibles(&self) -> Vec<EntityRef> {
        self.read().current.collectibles.clone()
    }

    /// The player, if present
    pub fn player(&self) -> Option<EntityRef> {
        self.read().current.player.clone()
    }

    /// Find an entity by id
    pub fn get(&self, id: EntityId) -> Option<EntityRef> {
        self.read().current.entities.iter().find(|e| e.id() == id).cloned()
    }

    /// First entity (in creation order) whose rectangle contains the point
    pub fn entity_at(&self, x: f64, y: f64) -> Option<EntityRef> {
        let entities = self.entities();
        entities.into_iter().find(|e| e.rect().contains_point(x, y))
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.read().current.entities.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove one entity from every list
    ///
    /// Handles held elsewhere stay valid but the entity no longer takes part
    /// in the simulation.
    pub fn delete_entity(&self, id: EntityId) -> Result<()> {
        let mut lists = self.write();
        let current = &mut lists.current;
        let before = current.entities.len();
        current.entities.retain(|e| e.id() != id);
        if current.entities.len() == before {
            return Err(EngineError::EntityNotFound(id));
        }
        current.statics.retain(|e| e.id() != id);
        current.moveables.retain(|e| e.id() != id);
        current.collectibles.retain(|e| e.id() != id);
        if current.player.as_ref().map(|p| p.id()) == Some(id) {
            current.player = None;
        }
        log::debug!("Deleted {}", id);
        Ok(())
    }

    /// Remove every entity
    pub fn delete_entities(&self) {
        let mut lists = self.write();
        let count = lists.current.entities.len();
        lists.current = EntitySnapshot::default();
        log::info!("Deleted {} entities", count);
    }

    /// Restore moveables to their spawn state and collectibles to uncollected
    pub fn reset_entities(&self) {
        let snapshot = self.snapshot();
        let scene = self.config.scene_size();
        for entity in snapshot.moveables().iter().chain(snapshot.collectibles()) {
            entity.lock().reset(scene);
        }
        log::debug!("Reset {} entities", snapshot.moveables().len() + snapshot.collectibles().len());
    }

    /// Run one fixed step of length `dt` seconds
    pub fn fixed_update(&self, dt: f64) {
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return;
        }
        physics::step(&StepContext::new(&snapshot, &self.config, dt));
    }

    /// Run only the interpenetration solver, returning the corrections made
    pub fn solve_insiders(&self, dt: f64) -> usize {
        let snapshot = self.snapshot();
        physics::solve_insiders(&StepContext::new(&snapshot, &self.config, dt))
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec2;

    #[test]
    fn test_lists_by_kind() {
        let manager = EntityManager::default();
        manager.add_entity(TextureHandle::DEFAULT, Rect::new(0.0, 0.0, 10.0, 10.0));
        manager.add_moveable_entity(TextureHandle::DEFAULT, Rect::new(0.0, 0.0, 10.0, 10.0), 1.0);
        manager.add_player(TextureHandle::DEFAULT, Rect::new(0.0, 0.0, 10.0, 10.0), 80.0);
        manager.add_collectible(TextureHandle::DEFAULT, Rect::new(0.0, 0.0, 10.0, 10.0));

        assert_eq!(manager.len(), 4);
        assert_eq!(manager.static_entities().len(), 1);
        assert_eq!(manager.moveable_entities().len(), 2);
        assert_eq!(manager.collectibles().len(), 1);
        assert!(manager.player().is_some());
    }

    #[test]
    fn test_ids_are_sequential() {
        let manager = EntityManager::default();
        let a = manager.add_entity_default();
        let b = manager.add_entity_default();
        assert_eq!(a.id().raw() + 1, b.id().raw());
        assert_eq!(a.rect(), Rect::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(a.lock().texture(), TextureHandle::DEFAULT);
    }

    #[test]
    fn test_single_player() {
        let manager = EntityManager::default();
        let first = manager.add_player(TextureHandle::DEFAULT, Rect::new(0.0, 0.0, 20.0, 40.0), 80.0);
        first.lock().motion_mut().unwrap().set_viscosity(0.9);
        let second = manager.add_player(TextureHandle::DEFAULT, Rect::new(100.0, 0.0, 20.0, 40.0), 60.0);

        assert_eq!(first.id(), second.id());
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.moveable_entities().len(), 1);
        assert_eq!(first.lock().motion().unwrap().mass(), 60.0);
        assert_eq!(first.lock().motion().unwrap().viscosity(), 0.3);
        assert_eq!(first.kind(), EntityKind::Player);
    }

    #[test]
    fn test_delete_entity_removes_from_all_lists() {
        let manager = EntityManager::default();
        let player = manager.add_player(TextureHandle::DEFAULT, Rect::new(0.0, 0.0, 20.0, 40.0), 80.0);
        let block = manager.add_entity_default();

        manager.delete_entity(player.id()).unwrap();
        assert!(manager.player().is_none());
        assert!(manager.moveable_entities().is_empty());
        assert_eq!(manager.len(), 1);

        let missing = manager.delete_entity(player.id());
        assert!(matches!(missing, Err(EngineError::EntityNotFound(_))));
        assert!(manager.get(block.id()).is_some());
    }

    #[test]
    fn test_delete_entities() {
        let manager = EntityManager::default();
        manager.add_entity_default();
        manager.add_player(TextureHandle::DEFAULT, Rect::new(0.0, 0.0, 20.0, 40.0), 80.0);
        manager.delete_entities();
        assert!(manager.is_empty());
        assert!(manager.player().is_none());
        assert!(manager.snapshot().moveables().is_empty());
    }

    #[test]
    fn test_entity_at_point() {
        let manager = EntityManager::default();
        let a = manager.add_entity(TextureHandle::DEFAULT, Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = manager.add_entity(TextureHandle::DEFAULT, Rect::new(5.0, 5.0, 10.0, 10.0));

        assert_eq!(manager.entity_at(7.0, 7.0).map(|e| e.id()), Some(a.id()));
        assert_eq!(manager.entity_at(14.0, 14.0).map(|e| e.id()), Some(b.id()));
        assert!(manager.entity_at(100.0, 100.0).is_none());
    }

    #[test]
    fn test_reset_entities_restores_spawn() {
        let manager = EntityManager::default();
        let body = manager.add_moveable_entity(TextureHandle::DEFAULT, Rect::new(30.0, 40.0, 10.0, 10.0), 1.0);
        let coin = manager.add_collectible(TextureHandle(7), Rect::new(0.0, 0.0, 10.0, 10.0));

        for _ in 0..20 {
            manager.fixed_update(0.01);
        }
        coin.lock().collect();
        assert_ne!(body.rect().y, 40.0);

        manager.reset_entities();
        assert_eq!(body.rect().position(), Vec2::new(30.0, 40.0));
        assert_eq!(body.velocity(), Vec2::zero());
        let coin_state = coin.lock();
        assert!(!coin_state.collectible().unwrap().is_collected());
        assert_eq!(coin_state.texture(), TextureHandle(7));
    }

    #[test]
    fn test_fixed_update_on_empty_registry() {
        let manager = EntityManager::default();
        manager.fixed_update(0.01);
        assert_eq!(manager.solve_insiders(0.01), 0);
    }
}

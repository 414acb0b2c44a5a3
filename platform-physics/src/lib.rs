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
//! # Platform Physics
//!
//! Fixed-tick 2D physics core for a side-scrolling platformer and its level
//! editor: axis-aligned box colliders, swept ground/side/ceiling tests,
//! momentum exchange between moveable entities, gravity with damped bounces
//! and an interpenetration solver.
//!
//! ## Features
//!
//! - **Entity registry**: static, moveable, player and collectible entities
//!   shared between threads, one mutex per entity
//! - **Fixed-tick driver**: a dedicated physics thread with play/pause/stop
//! - **Frame surface**: player controls, collectibles and the win condition
//! - **Editor surface**: text-entry property edits with validation
//! - **Parallelization**: optional Rayon broad phase in the solver
//!
//! ## Example
//!
//! ```rust
//! use platform_physics::config::PhysicsConfig;
//! use platform_physics::entity::TextureHandle;
//! use platform_physics::geometry::Rect;
//! use platform_physics::registry::EntityManager;
//!
//! let manager = EntityManager::new(PhysicsConfig::default());
//! manager.add_entity(TextureHandle::DEFAULT, Rect::new(0.0, 400.0, 800.0, 20.0));
//! let player = manager.add_player(TextureHandle::DEFAULT, Rect::new(50.0, 350.0, 20.0, 40.0), 80.0);
//!
//! for _ in 0..100 {
//!     manager.fixed_update(0.01);
//! }
//! assert_eq!(player.rect().bottom(), 400.0);
//! assert!(player.lock().player().unwrap().on_ground());
//! ```

#![warn(missing_docs)]

/// Rectangles and vectors
pub mod geometry;

/// Box colliders and swept contact tests
pub mod collider;

/// Entities, their state and shared handles
pub mod entity;

/// Forces, gravity and the interpenetration solver
pub mod physics;

/// Entity registry
pub mod registry;

/// Fixed-tick physics thread
pub mod driver;

/// Per-frame player and collectible logic
pub mod frame;

/// Editor property edits
pub mod inspector;

/// Simulation constants
pub mod config;

/// Error types
pub mod error;

pub use config::PhysicsConfig;
pub use driver::{FixedTickDriver, SimulationState};
pub use entity::{Entity, EntityId, EntityKind, EntityRef, TextureHandle};
pub use error::{EngineError, Result};
pub use geometry::{Rect, Vec2};
pub use registry::EntityManager;

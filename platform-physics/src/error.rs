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
//! Error types for the fallible, non-physics surfaces of the engine
//!
//! The simulation step itself is total and never returns errors.

use crate::entity::{EntityId, EntityKind};
use thiserror::Error;

/// Errors raised by registry lookups, editor edits, configuration and
/// driver startup
#[derive(Error, Debug)]
pub enum EngineError {
    /// No entity with this id is registered
    #[error("{0} is not registered")]
    EntityNotFound(EntityId),

    /// Editor text entry could not be parsed for the property
    #[error("invalid value '{input}' for {property}")]
    InvalidValue {
        /// Property being edited
        property: &'static str,
        /// Rejected user input
        input: String,
    },

    /// The property does not exist on this kind of entity
    #[error("{property} does not apply to a {kind}")]
    NotApplicable {
        /// Property being edited
        property: &'static str,
        /// Kind of the edited entity
        kind: EntityKind,
    },

    /// Configuration could not be parsed or failed validation
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The fixed-tick thread could not be started
    #[error("failed to spawn physics thread: {0}")]
    ThreadSpawn(std::io::Error),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, EngineError>;

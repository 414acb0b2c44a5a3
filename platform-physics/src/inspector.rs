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
//! Editor inspector surface
//!
//! The level editor shows one text field per property of the selected
//! entity. [`apply_text_edit`] parses what the user typed and forwards it to
//! the matching entity mutator. Input that does not parse is rejected with
//! [`EngineError::InvalidValue`] and the previous value is kept.

use crate::config::PhysicsConfig;
use crate::entity::Entity;
use crate::error::{EngineError, Result};
use std::fmt;

/// Editable entity property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// Left edge
    PositionX,
    /// Top edge
    PositionY,
    /// Rotation in degrees
    Rotation,
    /// Width
    Width,
    /// Height
    Height,
    /// Mass (moveables only)
    Mass,
    /// Viscosity (moveables only)
    Viscosity,
    /// Kinematic flag
    Kinematic,
    /// Gravity flag (moveables only)
    GravityReactive,
}

impl Property {
    /// Every property, in inspector order
    pub const ALL: [Property; 9] = [
        Property::PositionX,
        Property::PositionY,
        Property::Rotation,
        Property::Width,
        Property::Height,
        Property::Mass,
        Property::Viscosity,
        Property::Kinematic,
        Property::GravityReactive,
    ];

    /// Field label
    pub fn name(&self) -> &'static str {
        match self {
            Property::PositionX => "position x",
            Property::PositionY => "position y",
            Property::Rotation => "rotation",
            Property::Width => "width",
            Property::Height => "height",
            Property::Mass => "mass",
            Property::Viscosity => "viscosity",
            Property::Kinematic => "kinematic",
            Property::GravityReactive => "gravity reactive",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse `input` and apply it to `property` of `entity`
///
/// Position edits are deliberate repositions, so they also move the spawn
/// point of moveable entities.
pub fn apply_text_edit(
    entity: &Entity,
    property: Property,
    input: &str,
    config: &PhysicsConfig,
) -> Result<()> {
    let result = apply(entity, property, input, config);
    if let Err(err) = &result {
        log::warn!("Rejected edit of {} on {}: {}", property, entity.id(), err);
    }
    result
}

fn apply(entity: &Entity, property: Property, input: &str, config: &PhysicsConfig) -> Result<()> {
    let scene = config.scene_size();
    match property {
        Property::Kinematic => {
            let value = parse_flag(property, input)?;
            entity.lock().set_kinematic(value);
            Ok(())
        }
        Property::GravityReactive => {
            let value = parse_flag(property, input)?;
            entity.lock().set_gravity_reactive(value)
        }
        _ => {
            let value = parse_number(property, input)?;
            let mut state = entity.lock();
            match property {
                Property::PositionX => {
                    let y = state.rect().y;
                    state.set_position(value, y, scene);
                }
                Property::PositionY => {
                    let x = state.rect().x;
                    state.set_position(x, value, scene);
                }
                Property::Rotation => state.set_rotation(value),
                Property::Width => {
                    let h = state.rect().h;
                    state.set_size(value, h);
                }
                Property::Height => {
                    let w = state.rect().w;
                    state.set_size(w, value);
                }
                Property::Mass => state.set_mass(value)?,
                Property::Viscosity => state.set_viscosity(value)?,
                Property::Kinematic | Property::GravityReactive => {}
            }
            Ok(())
        }
    }
}

fn parse_number(property: Property, input: &str) -> Result<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(property, input))
}

fn parse_flag(property: Property, input: &str) -> Result<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(property, input)),
    }
}

fn invalid(property: Property, input: &str) -> EngineError {
    EngineError::InvalidValue {
        property: property.name(),
        input: input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityKind, TextureHandle};
    use crate::geometry::{Rect, Vec2};
    use crate::registry::EntityManager;

    #[test]
    fn test_numeric_edits() {
        let manager = EntityManager::default();
        let body = manager.add_moveable_entity(TextureHandle::DEFAULT, Rect::new(10.0, 10.0, 20.0, 20.0), 1.0);
        let config = manager.config();

        apply_text_edit(&body, Property::PositionX, " 120 ", config).unwrap();
        apply_text_edit(&body, Property::Height, "35.5", config).unwrap();
        apply_text_edit(&body, Property::Mass, "42", config).unwrap();
        apply_text_edit(&body, Property::Rotation, "90", config).unwrap();

        let state = body.lock();
        assert_eq!(state.rect(), &Rect::new(120.0, 10.0, 20.0, 35.5));
        assert_eq!(state.motion().unwrap().mass(), 42.0);
        assert_eq!(state.motion().unwrap().spawn(), Vec2::new(120.0, 10.0));
        assert_eq!(state.rotation(), 90.0);
    }

    #[test]
    fn test_invalid_input_keeps_previous_value() {
        let manager = EntityManager::default();
        let body = manager.add_moveable_entity(TextureHandle::DEFAULT, Rect::new(10.0, 10.0, 20.0, 20.0), 5.0);

        let err = apply_text_edit(&body, Property::Mass, "heavy", manager.config()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidValue { property: "mass", .. }));
        assert_eq!(body.lock().motion().unwrap().mass(), 5.0);

        assert!(apply_text_edit(&body, Property::Width, "NaN", manager.config()).is_err());
        assert_eq!(body.rect().w, 20.0);
    }

    #[test]
    fn test_flags() {
        let manager = EntityManager::default();
        let body = manager.add_moveable_entity(TextureHandle::DEFAULT, Rect::new(10.0, 10.0, 20.0, 20.0), 5.0);

        apply_text_edit(&body, Property::Kinematic, "true", manager.config()).unwrap();
        apply_text_edit(&body, Property::GravityReactive, "off", manager.config()).unwrap();
        assert!(body.is_kinematic());
        assert!(!body.lock().motion().unwrap().is_gravity_reactive());
        assert!(apply_text_edit(&body, Property::Kinematic, "maybe", manager.config()).is_err());
    }

    #[test]
    fn test_mass_on_static_entity_not_applicable() {
        let manager = EntityManager::default();
        let block = manager.add_entity_default();
        let err = apply_text_edit(&block, Property::Mass, "3", manager.config()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::NotApplicable { kind: EntityKind::Static, .. }
        ));
    }
}

//! Combat and area requirements shared by every trigger kind

use cadence_types::TriggerDefinition;

use crate::error::ValidationError;
use crate::world::{Point3, WorldState};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerConditions {
    /// Sphere center or box corner
    pub position: Option<Point3>,
    /// Opposite box corner. Takes precedence over `radius` when present.
    pub antipode: Option<Point3>,
    pub radius: f32,
    pub combat_required: bool,
    pub out_of_combat_required: bool,
    pub entry_required: bool,
    pub departure_required: bool,
}

impl TriggerConditions {
    /// Malformed coordinate lists become `None` and are reported by `validate`.
    pub fn from_definition(def: &TriggerDefinition) -> Self {
        Self {
            position: def.position.as_deref().and_then(Point3::from_slice),
            antipode: def.antipode.as_deref().and_then(Point3::from_slice),
            radius: def.radius,
            combat_required: def.combat_required,
            out_of_combat_required: def.out_of_combat_required,
            entry_required: def.entry_required,
            departure_required: def.departure_required,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.combat_required && self.out_of_combat_required {
            return Err(ValidationError::CombatConflict);
        }
        if self.entry_required && self.departure_required {
            return Err(ValidationError::AreaConflict);
        }
        if self.has_area_requirement() {
            if self.position.is_none() {
                return Err(ValidationError::InvalidPosition);
            }
            if self.antipode.is_none() && self.radius <= 0.0 {
                return Err(ValidationError::InvalidArea);
            }
        }
        Ok(())
    }

    pub fn has_area_requirement(&self) -> bool {
        self.entry_required || self.departure_required
    }

    /// Whether the player stands inside the configured area.
    /// `None` when no position is configured.
    pub fn player_in_area(&self, world: &dyn WorldState) -> Option<bool> {
        let position = self.position?;
        let player = world.player_position();

        Some(match &self.antipode {
            Some(antipode) => player.within_box(&position, antipode),
            None => player.distance(&position) <= self.radius,
        })
    }

    /// Entry/departure check. Passes trivially without an area requirement.
    pub fn area_satisfied(&self, world: &dyn WorldState) -> bool {
        if !self.has_area_requirement() {
            return true;
        }
        let Some(inside) = self.player_in_area(world) else {
            return false;
        };
        if self.entry_required && !inside {
            return false;
        }
        if self.departure_required && inside {
            return false;
        }
        true
    }
}

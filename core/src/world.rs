//! Read-only view of the game world
//!
//! The host implements [`WorldState`] over whatever it reads player data from.
//! Values are treated as a snapshot for the duration of one update call.

/// A point in map coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Build from a definition list. Anything but exactly three values is rejected.
    pub fn from_slice(values: &[f32]) -> Option<Self> {
        match values {
            [x, y, z] => Some(Self::new(*x, *y, *z)),
            _ => None,
        }
    }

    pub fn distance(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Inside the axis-aligned box spanned by two opposite corners (edges inclusive)
    pub fn within_box(&self, corner: &Point3, antipode: &Point3) -> bool {
        fn between(v: f32, a: f32, b: f32) -> bool {
            v >= a.min(b) && v <= a.max(b)
        }

        between(self.x, corner.x, antipode.x)
            && between(self.y, corner.y, antipode.y)
            && between(self.z, corner.z, antipode.z)
    }
}

/// Bitmask of held modifier keys (see `cadence_types::modifiers`)
pub type ModifierKeys = u8;

/// A raw key press forwarded by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: u32,
}

impl KeyPress {
    pub fn new(key: u32) -> Self {
        Self { key }
    }
}

/// World state consumed by triggers and encounters
pub trait WorldState {
    fn player_position(&self) -> Point3;
    fn is_in_combat(&self) -> bool;
    fn current_map_id(&self) -> u32;
    fn active_modifier_keys(&self) -> ModifierKeys;
}

/// Plain snapshot of world state, handy for hosts that poll once per frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorldSnapshot {
    pub position: Point3,
    pub in_combat: bool,
    pub map_id: u32,
    pub modifiers: ModifierKeys,
}

impl WorldState for WorldSnapshot {
    fn player_position(&self) -> Point3 {
        self.position
    }

    fn is_in_combat(&self) -> bool {
        self.in_combat
    }

    fn current_map_id(&self) -> u32 {
        self.map_id
    }

    fn active_modifier_keys(&self) -> ModifierKeys {
        self.modifiers
    }
}

//! Entity types stored in the pools: humans, zombies, bullets.
//!
//! These are plain data. All behavior lives in the tick machine and the
//! combat resolver; entities never hold references to cells or to each
//! other, only pool-slot handles and grid addresses.

use serde::{Deserialize, Serialize};

use crate::map::{CellAddr, Direction};

/// Team identifier carried by seats and humans. [`crate::constants::NPC_TEAM`]
/// is reserved for unseated wanderers.
pub type TeamId = u8;

/// Which pool a cell occupant handle points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Human,
    Zombie,
}

/// Opaque stat record read by combat and movement logic. Produced outside
/// the core (character setup) and exchanged between peers as a JSON blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSheet {
    pub name: String,
    pub max_hp: i32,
    pub melee_damage: i32,
    pub gun_damage: i32,
    pub gun_range: u16,
    pub potions: u8,
    pub barricades: u8,
}

impl Default for CharacterSheet {
    fn default() -> Self {
        Self {
            name: "survivor".to_string(),
            max_hp: 100,
            melee_damage: 25,
            gun_damage: 35,
            gun_range: 12,
            potions: 1,
            barricades: 2,
        }
    }
}

impl CharacterSheet {
    /// Serialize for the setup exchange. The wire treats this as opaque text.
    pub fn to_blob(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse a peer's blob; a malformed blob falls back to the default
    /// sheet so setup never fails on peer data.
    pub fn from_blob(blob: &str) -> Self {
        serde_json::from_str(blob).unwrap_or_default()
    }
}

/// Held item selected by the item-switch command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Weapon {
    Fists,
    Gun,
}

impl Weapon {
    pub fn switched(self) -> Self {
        match self {
            Weapon::Fists => Weapon::Gun,
            Weapon::Gun => Weapon::Fists,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Human {
    pub pos: CellAddr,
    pub facing: Direction,
    pub hp: i32,
    pub team: TeamId,
    /// Roster seat controlling this human; `None` for wanderers.
    pub seat: Option<u8>,
    pub weapon: Weapon,
    pub sheet: CharacterSheet,
}

impl Human {
    pub fn new(pos: CellAddr, team: TeamId, seat: Option<u8>, sheet: CharacterSheet) -> Self {
        Self {
            pos,
            facing: Direction::North,
            hp: sheet.max_hp,
            team,
            seat,
            weapon: Weapon::Fists,
            sheet,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zombie {
    pub pos: CellAddr,
    pub hp: i32,
    pub damage: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: CellAddr,
    pub dir: Direction,
    /// Seat of the shooter, credited for damage and kills. Wanderers never
    /// fire, so an ownerless bullet cannot occur in a live session; the
    /// option exists for the resolver's credit rules.
    pub owner: Option<u8>,
    pub damage: i32,
    pub range: u16,
    pub traveled: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_blob_round_trip() {
        let sheet = CharacterSheet {
            name: "ace".to_string(),
            gun_range: 9,
            ..CharacterSheet::default()
        };
        let parsed = CharacterSheet::from_blob(&sheet.to_blob());
        assert_eq!(parsed, sheet);
    }

    #[test]
    fn malformed_blob_falls_back_to_default() {
        assert_eq!(CharacterSheet::from_blob("not json"), CharacterSheet::default());
    }

    #[test]
    fn weapon_switch_toggles() {
        assert_eq!(Weapon::Fists.switched(), Weapon::Gun);
        assert_eq!(Weapon::Gun.switched(), Weapon::Fists);
    }
}

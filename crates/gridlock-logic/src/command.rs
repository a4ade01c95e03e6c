//! The one-byte per-player per-tick command alphabet.
//!
//! Decoding is total: an unrecognized byte coerces to [`Command::Idle`] and
//! is never an error, so a garbled peer byte cannot desynchronize replicas.
//! The UI toggles are real commands that deliberately do nothing to the
//! simulation — they exist so a keyboard provider can emit them without
//! affecting state.

use serde::{Deserialize, Serialize};

use crate::map::Direction;

/// Byte synthesized by the relay for a participant that timed out or
/// dropped; identical to a voluntary quit on every replica.
pub const ELIMINATED_BYTE: u8 = b'x';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Step one cell and face that way.
    Move(Direction),
    /// Face a direction without moving.
    Turn(Direction),
    /// Fire the held weapon (gun shot or punch).
    Fire,
    /// Toggle the held item.
    SwitchItem,
    /// Drink a potion.
    Consume,
    /// Place a barricade on the faced cell.
    PlaceBlock,
    /// Leave the session; terminal for the issuing seat.
    Quit,
    /// Do nothing. Canonical coercion target for unknown bytes.
    Idle,
    /// UI-only; must not touch simulation state.
    ToggleMap,
    /// UI-only; must not touch simulation state.
    ToggleInventory,
}

impl Command {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'w' => Command::Move(Direction::North),
            b's' => Command::Move(Direction::South),
            b'a' => Command::Move(Direction::West),
            b'd' => Command::Move(Direction::East),
            b'i' => Command::Turn(Direction::North),
            b'k' => Command::Turn(Direction::South),
            b'j' => Command::Turn(Direction::West),
            b'l' => Command::Turn(Direction::East),
            b'f' => Command::Fire,
            b'e' => Command::SwitchItem,
            b'c' => Command::Consume,
            b'b' => Command::PlaceBlock,
            b'x' => Command::Quit,
            b'm' => Command::ToggleMap,
            b'v' => Command::ToggleInventory,
            _ => Command::Idle,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Command::Move(Direction::North) => b'w',
            Command::Move(Direction::South) => b's',
            Command::Move(Direction::West) => b'a',
            Command::Move(Direction::East) => b'd',
            Command::Turn(Direction::North) => b'i',
            Command::Turn(Direction::South) => b'k',
            Command::Turn(Direction::West) => b'j',
            Command::Turn(Direction::East) => b'l',
            Command::Fire => b'f',
            Command::SwitchItem => b'e',
            Command::Consume => b'c',
            Command::PlaceBlock => b'b',
            Command::Quit => b'x',
            Command::ToggleMap => b'm',
            Command::ToggleInventory => b'v',
            Command::Idle => b'.',
        }
    }

    /// True for commands the tick machine ignores entirely.
    pub fn is_noop(self) -> bool {
        matches!(self, Command::Idle | Command::ToggleMap | Command::ToggleInventory)
    }
}

//! Frame snapshots published to the renderer.
//!
//! A snapshot is a cheap, self-contained copy of the renderable state: the
//! local floor as glyph rows plus the roster summary. The renderer never
//! sees live simulation state.

use serde::{Deserialize, Serialize};

use crate::constants::{COLS, ROWS};
use crate::entities::EntityKind;
use crate::map::{CellAddr, CellFlags, MapModel};
use crate::tick::{RunState, Seat};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatSummary {
    pub team: u8,
    pub alive: bool,
    pub connected: bool,
    pub kills: u32,
    pub hp: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub state: RunState,
    /// Floor being rendered (the local player's, or 0 once they are gone).
    pub floor: u8,
    /// One glyph row per map row of the rendered floor.
    pub grid: Vec<String>,
    pub seats: Vec<SeatSummary>,
}

pub(crate) fn seat_summary(seat: &Seat, hp: Option<i32>) -> SeatSummary {
    SeatSummary {
        team: seat.team,
        alive: seat.alive,
        connected: seat.connected,
        kills: seat.kills,
        hp,
    }
}

/// Render one floor as glyph rows. `local_slot` draws as `@`, other humans
/// as `H`.
pub(crate) fn render_floor(map: &MapModel, floor: u8, local_slot: Option<u16>) -> Vec<String> {
    let mut rows = Vec::with_capacity(ROWS);
    for r in 0..ROWS {
        let mut line = String::with_capacity(COLS);
        for c in 0..COLS {
            let cell = map.cell(CellAddr::new(floor, r as u8, c as u8));
            let flags = cell.flags;
            let glyph = if flags.contains(CellFlags::CHARACTER) {
                match (cell.occupant, local_slot) {
                    (Some((EntityKind::Human, slot)), Some(local)) if slot == local => '@',
                    _ => 'H',
                }
            } else if flags.contains(CellFlags::ZOMBIE) {
                'Z'
            } else if flags.contains(CellFlags::BULLET) {
                '*'
            } else if flags.contains(CellFlags::WALL) {
                '#'
            } else if flags.contains(CellFlags::BARRICADE) {
                'B'
            } else if flags.contains(CellFlags::CHEST) {
                'C'
            } else if flags.contains(CellFlags::PORTAL_IN) {
                'O'
            } else if flags.contains(CellFlags::PORTAL_OUT) {
                'o'
            } else if flags.contains(CellFlags::JUST_DIED) {
                '+'
            } else {
                '.'
            };
            line.push(glyph);
        }
        rows.push(line);
    }
    rows
}

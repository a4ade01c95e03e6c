//! Map configuration loading.
//!
//! A map ships as JSON: per-floor glyph rows plus explicit portal links and
//! spawn points. `build` validates the config against the fixed grid bounds
//! and produces the initial [`MapModel`] together with the portal pool the
//! simulation starts from.
//!
//! Glyphs: `#` wall, `.` empty, `C` chest. Portal endpoints are defined in
//! the link list, not in the rows, so a link can never be half-configured.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{pool_caps, COLS, FLOORS, ROWS};
use crate::map::{CellAddr, CellFlags, MapModel, PortalPair};
use crate::pools::Pool;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("map config parse: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("expected {expected} floors, found {found}")]
    FloorCount { expected: usize, found: usize },
    #[error("floor {floor}: expected {expected} rows, found {found}")]
    RowCount {
        floor: usize,
        expected: usize,
        found: usize,
    },
    #[error("floor {floor} row {row}: expected {expected} columns, found {found}")]
    RowWidth {
        floor: usize,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown map glyph '{glyph}' at floor {floor} row {row} col {col}")]
    UnknownGlyph {
        glyph: char,
        floor: usize,
        row: usize,
        col: usize,
    },
    #[error("portal endpoint out of bounds: floor {0} row {1} col {2}")]
    PortalOutOfBounds(u8, u8, u8),
    #[error("portal endpoint at floor {0} row {1} col {2} is not an empty cell")]
    PortalBlocked(u8, u8, u8),
    #[error("portal pool exhausted")]
    PortalPoolFull,
    #[error("spawn point out of bounds: floor {0} row {1} col {2}")]
    SpawnOutOfBounds(u8, u8, u8),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorSpec {
    pub rows: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSpec {
    pub entry: [u8; 3],
    pub exit: [u8; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    pub floors: Vec<FloorSpec>,
    pub portals: Vec<PortalSpec>,
    pub spawn_points: Vec<[u8; 3]>,
}

fn to_addr(triple: [u8; 3]) -> CellAddr {
    CellAddr::new(triple[0], triple[1], triple[2])
}

impl MapConfig {
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate and build the initial grid plus the portal pool.
    pub fn build(&self) -> Result<(MapModel, Pool<PortalPair>), MapError> {
        if self.floors.len() != FLOORS {
            return Err(MapError::FloorCount {
                expected: FLOORS,
                found: self.floors.len(),
            });
        }

        let mut map = MapModel::new();
        for (f, floor) in self.floors.iter().enumerate() {
            if floor.rows.len() != ROWS {
                return Err(MapError::RowCount {
                    floor: f,
                    expected: ROWS,
                    found: floor.rows.len(),
                });
            }
            for (r, row) in floor.rows.iter().enumerate() {
                let glyphs: Vec<char> = row.chars().collect();
                if glyphs.len() != COLS {
                    return Err(MapError::RowWidth {
                        floor: f,
                        row: r,
                        expected: COLS,
                        found: glyphs.len(),
                    });
                }
                for (c, glyph) in glyphs.iter().enumerate() {
                    let addr = CellAddr::new(f as u8, r as u8, c as u8);
                    match glyph {
                        '.' => {}
                        '#' => map.cell_mut(addr).flags.insert(CellFlags::WALL),
                        'C' => map.cell_mut(addr).flags.insert(CellFlags::CHEST),
                        _ => {
                            return Err(MapError::UnknownGlyph {
                                glyph: *glyph,
                                floor: f,
                                row: r,
                                col: c,
                            })
                        }
                    }
                }
            }
        }

        let mut portals: Pool<PortalPair> = Pool::with_capacity(pool_caps::PORTAL_PAIRS);
        for spec in &self.portals {
            let entry = to_addr(spec.entry);
            let exit = to_addr(spec.exit);
            for endpoint in [entry, exit] {
                if !endpoint.in_bounds() {
                    return Err(MapError::PortalOutOfBounds(
                        endpoint.floor,
                        endpoint.row,
                        endpoint.col,
                    ));
                }
                if !map.cell(endpoint).flags.is_empty() {
                    return Err(MapError::PortalBlocked(
                        endpoint.floor,
                        endpoint.row,
                        endpoint.col,
                    ));
                }
            }
            let slot = portals
                .allocate(PortalPair { entry, exit })
                .ok_or(MapError::PortalPoolFull)?;
            map.link_portal(entry, exit, slot as u16);
        }

        for point in &self.spawn_points {
            let addr = to_addr(*point);
            if !addr.in_bounds() {
                return Err(MapError::SpawnOutOfBounds(addr.floor, addr.row, addr.col));
            }
        }

        Ok((map, portals))
    }

    pub fn spawn_addrs(&self) -> Vec<CellAddr> {
        self.spawn_points.iter().map(|p| to_addr(*p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A valid all-empty config with border walls on floor 0.
    fn minimal_config() -> MapConfig {
        let mut floors = Vec::new();
        for _ in 0..FLOORS {
            let rows = (0..ROWS).map(|_| ".".repeat(COLS)).collect();
            floors.push(FloorSpec { rows });
        }
        MapConfig {
            floors,
            portals: vec![PortalSpec {
                entry: [0, 5, 5],
                exit: [1, 5, 5],
            }],
            spawn_points: vec![[0, 1, 1], [0, 1, 2]],
        }
    }

    #[test]
    fn builds_valid_config() {
        let config = minimal_config();
        let (map, portals) = config.build().unwrap();
        assert_eq!(portals.live_count(), 1);
        let entry = CellAddr::new(0, 5, 5);
        let exit = CellAddr::new(1, 5, 5);
        assert!(map.cell(entry).flags.contains(CellFlags::PORTAL_IN));
        assert!(map.cell(exit).flags.contains(CellFlags::PORTAL_OUT));
        assert_eq!(map.cell(entry).link, Some(exit));
        assert_eq!(map.cell(exit).link, Some(entry));
    }

    #[test]
    fn rejects_wrong_floor_count() {
        let mut config = minimal_config();
        config.floors.pop();
        assert!(matches!(
            config.build(),
            Err(MapError::FloorCount { .. })
        ));
    }

    #[test]
    fn rejects_short_row() {
        let mut config = minimal_config();
        config.floors[0].rows[3] = ".".repeat(COLS - 1);
        assert!(matches!(config.build(), Err(MapError::RowWidth { .. })));
    }

    #[test]
    fn rejects_unknown_glyph() {
        let mut config = minimal_config();
        let mut row = ".".repeat(COLS - 1);
        row.push('?');
        config.floors[0].rows[3] = row;
        assert!(matches!(
            config.build(),
            Err(MapError::UnknownGlyph { glyph: '?', .. })
        ));
    }

    #[test]
    fn rejects_portal_on_wall() {
        let mut config = minimal_config();
        let mut row = ".".repeat(COLS);
        row.replace_range(5..6, "#");
        config.floors[0].rows[5] = row;
        assert!(matches!(config.build(), Err(MapError::PortalBlocked(..))));
    }

    #[test]
    fn json_round_trip() {
        let config = minimal_config();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = MapConfig::from_json(&json).unwrap();
        assert_eq!(parsed.spawn_points, config.spawn_points);
        parsed.build().unwrap();
    }
}

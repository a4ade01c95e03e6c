//! The multi-floor grid: cells, occupancy flags, passability, and
//! destructible structures.
//!
//! Cells are static except for flag and damage mutation. At most one
//! primary occupant flag (character / zombie / wall / portal) is set per
//! cell; a bullet flag may coexist with any of them.

use serde::{Deserialize, Serialize};

use crate::constants::{structure, COLS, FLOORS, ROWS};
use crate::entities::EntityKind;
use crate::pools::Pool;

/// Cardinal movement/facing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Fixed probe order used everywhere a neighborhood is scanned. Part of
    /// the lockstep contract — do not reorder.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn delta(self) -> (i16, i16) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
        }
    }

    pub fn from_index(index: u32) -> Self {
        Self::ALL[(index % 4) as usize]
    }
}

/// Grid address: floor, row, column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellAddr {
    pub floor: u8,
    pub row: u8,
    pub col: u8,
}

impl CellAddr {
    pub fn new(floor: u8, row: u8, col: u8) -> Self {
        Self { floor, row, col }
    }

    /// Neighbor on the same floor, or `None` at the map edge.
    pub fn offset(self, dir: Direction) -> Option<CellAddr> {
        let (dr, dc) = dir.delta();
        let row = self.row as i16 + dr;
        let col = self.col as i16 + dc;
        if row < 0 || row >= ROWS as i16 || col < 0 || col >= COLS as i16 {
            return None;
        }
        Some(CellAddr {
            floor: self.floor,
            row: row as u8,
            col: col as u8,
        })
    }

    pub fn in_bounds(self) -> bool {
        (self.floor as usize) < FLOORS && (self.row as usize) < ROWS && (self.col as usize) < COLS
    }

    fn index(self) -> usize {
        (self.floor as usize * ROWS + self.row as usize) * COLS + self.col as usize
    }
}

/// Cell occupancy flags, newtype over a bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellFlags(pub u16);

impl CellFlags {
    pub const EMPTY: Self = Self(0);
    /// A human stands here.
    pub const CHARACTER: Self = Self(1 << 0);
    /// A zombie stands here.
    pub const ZOMBIE: Self = Self(1 << 1);
    /// At least one bullet is passing through.
    pub const BULLET: Self = Self(1 << 2);
    /// Indestructible map wall.
    pub const WALL: Self = Self(1 << 3);
    /// Player-placed barricade; destructible, blocks zombies but not humans.
    pub const BARRICADE: Self = Self(1 << 4);
    /// Lootable chest.
    pub const CHEST: Self = Self(1 << 5);
    /// Open portal entry — stepping in teleports to the linked exit.
    pub const PORTAL_IN: Self = Self(1 << 6);
    /// Portal exit — emerge-only, never walkable.
    pub const PORTAL_OUT: Self = Self(1 << 7);
    /// Endpoint backed by a portal pool slot.
    pub const PORTAL_SPAWNED: Self = Self(1 << 8);
    /// Transient corpse marker, cleared at the start of the next tick.
    pub const JUST_DIED: Self = Self(1 << 9);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for CellFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A linked pair of portal endpoints, owned by the portal pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalPair {
    pub entry: CellAddr,
    pub exit: CellAddr,
}

/// One grid entry. Position is implicit in the containing array.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cell {
    pub flags: CellFlags,
    /// Accumulated structural damage for barricades and portal endpoints.
    pub damage: u16,
    /// Paired portal endpoint, when this cell is part of a portal.
    pub link: Option<CellAddr>,
    /// Portal pool slot backing this endpoint.
    pub portal_slot: Option<u16>,
    /// Pool handle of the entity standing here.
    pub occupant: Option<(EntityKind, u16)>,
}

/// Who is trying to enter a cell; barricades discriminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoverKind {
    Human,
    Zombie,
}

/// What a structural damage application did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureHit {
    /// Target cell holds no destructible structure.
    NotStructural,
    /// Damage recorded, structure still standing.
    Damaged,
    BarricadeDestroyed,
    PortalDestroyed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapModel {
    cells: Vec<Cell>,
}

impl Default for MapModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MapModel {
    /// An all-empty map of the fixed bounds.
    pub fn new() -> Self {
        Self {
            cells: vec![Cell::default(); FLOORS * ROWS * COLS],
        }
    }

    pub fn cell(&self, addr: CellAddr) -> &Cell {
        &self.cells[addr.index()]
    }

    pub fn cell_mut(&mut self, addr: CellAddr) -> &mut Cell {
        &mut self.cells[addr.index()]
    }

    /// All addresses in floor-major, row-major order. The canonical
    /// whole-map iteration order.
    pub fn addresses() -> impl Iterator<Item = CellAddr> {
        (0..FLOORS).flat_map(|f| {
            (0..ROWS).flat_map(move |r| {
                (0..COLS).map(move |c| CellAddr::new(f as u8, r as u8, c as u8))
            })
        })
    }

    /// Whether `mover` may enter `addr`. Empty, chest, open-portal and
    /// just-died cells are walkable; walls, portal exits and occupied cells
    /// are not. Barricades admit humans and block zombies; zombies also
    /// refuse portal entries.
    pub fn passable_for(&self, mover: MoverKind, addr: CellAddr) -> bool {
        let flags = self.cell(addr).flags;
        if flags.intersects(CellFlags::WALL | CellFlags::PORTAL_OUT) {
            return false;
        }
        if flags.intersects(CellFlags::CHARACTER | CellFlags::ZOMBIE) {
            return false;
        }
        match mover {
            MoverKind::Human => true,
            MoverKind::Zombie => {
                !flags.intersects(CellFlags::BARRICADE | CellFlags::PORTAL_IN)
            }
        }
    }

    /// True when nothing at all is here — the spawn-roll vacancy test.
    pub fn is_vacant(&self, addr: CellAddr) -> bool {
        self.cell(addr).flags.is_empty()
    }

    /// Accumulate structural damage on a barricade or portal endpoint.
    /// Crossing the threshold clears the structure; a destroyed portal also
    /// clears its linked partner and releases the backing pool slot.
    pub fn apply_structural_damage(
        &mut self,
        addr: CellAddr,
        amount: u16,
        portals: &mut Pool<PortalPair>,
    ) -> StructureHit {
        let flags = self.cell(addr).flags;
        if flags.contains(CellFlags::BARRICADE) {
            let cell = self.cell_mut(addr);
            cell.damage = cell.damage.saturating_add(amount);
            if cell.damage >= structure::BARRICADE_THRESHOLD {
                cell.flags.remove(CellFlags::BARRICADE);
                cell.damage = 0;
                return StructureHit::BarricadeDestroyed;
            }
            return StructureHit::Damaged;
        }
        if flags.intersects(CellFlags::PORTAL_IN | CellFlags::PORTAL_OUT) {
            let (damage, link, slot) = {
                let cell = self.cell_mut(addr);
                cell.damage = cell.damage.saturating_add(amount);
                (cell.damage, cell.link, cell.portal_slot)
            };
            if damage >= structure::PORTAL_THRESHOLD {
                self.clear_portal_endpoint(addr);
                if let Some(partner) = link {
                    self.clear_portal_endpoint(partner);
                }
                if let Some(slot) = slot {
                    portals.free(slot as usize);
                }
                return StructureHit::PortalDestroyed;
            }
            return StructureHit::Damaged;
        }
        StructureHit::NotStructural
    }

    fn clear_portal_endpoint(&mut self, addr: CellAddr) {
        let cell = self.cell_mut(addr);
        cell.flags.remove(
            CellFlags::PORTAL_IN | CellFlags::PORTAL_OUT | CellFlags::PORTAL_SPAWNED,
        );
        cell.damage = 0;
        cell.link = None;
        cell.portal_slot = None;
    }

    /// Install a linked portal pair backed by `slot`.
    pub fn link_portal(&mut self, entry: CellAddr, exit: CellAddr, slot: u16) {
        {
            let cell = self.cell_mut(entry);
            cell.flags
                .insert(CellFlags::PORTAL_IN | CellFlags::PORTAL_SPAWNED);
            cell.link = Some(exit);
            cell.portal_slot = Some(slot);
        }
        {
            let cell = self.cell_mut(exit);
            cell.flags
                .insert(CellFlags::PORTAL_OUT | CellFlags::PORTAL_SPAWNED);
            cell.link = Some(entry);
            cell.portal_slot = Some(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::pool_caps;

    fn addr(floor: u8, row: u8, col: u8) -> CellAddr {
        CellAddr::new(floor, row, col)
    }

    fn portal_pool() -> Pool<PortalPair> {
        Pool::with_capacity(pool_caps::PORTAL_PAIRS)
    }

    #[test]
    fn offset_stops_at_edges() {
        assert_eq!(addr(0, 0, 0).offset(Direction::North), None);
        assert_eq!(addr(0, 0, 0).offset(Direction::West), None);
        assert_eq!(
            addr(0, 0, 0).offset(Direction::South),
            Some(addr(0, 1, 0))
        );
        assert_eq!(
            addr(0, (ROWS - 1) as u8, 5).offset(Direction::South),
            None
        );
        assert_eq!(
            addr(0, 5, (COLS - 1) as u8).offset(Direction::East),
            None
        );
    }

    #[test]
    fn walls_block_everyone() {
        let mut map = MapModel::new();
        map.cell_mut(addr(0, 3, 3)).flags.insert(CellFlags::WALL);
        assert!(!map.passable_for(MoverKind::Human, addr(0, 3, 3)));
        assert!(!map.passable_for(MoverKind::Zombie, addr(0, 3, 3)));
    }

    #[test]
    fn barricade_admits_humans_blocks_zombies() {
        let mut map = MapModel::new();
        map.cell_mut(addr(0, 3, 3)).flags.insert(CellFlags::BARRICADE);
        assert!(map.passable_for(MoverKind::Human, addr(0, 3, 3)));
        assert!(!map.passable_for(MoverKind::Zombie, addr(0, 3, 3)));
    }

    #[test]
    fn occupied_cells_are_impassable() {
        let mut map = MapModel::new();
        map.cell_mut(addr(0, 1, 1)).flags.insert(CellFlags::ZOMBIE);
        assert!(!map.passable_for(MoverKind::Human, addr(0, 1, 1)));
    }

    #[test]
    fn chest_and_just_died_are_passable() {
        let mut map = MapModel::new();
        map.cell_mut(addr(0, 1, 1)).flags.insert(CellFlags::CHEST);
        map.cell_mut(addr(0, 1, 2)).flags.insert(CellFlags::JUST_DIED);
        assert!(map.passable_for(MoverKind::Human, addr(0, 1, 1)));
        assert!(map.passable_for(MoverKind::Human, addr(0, 1, 2)));
    }

    #[test]
    fn barricade_destructs_exactly_at_threshold() {
        let mut map = MapModel::new();
        let mut portals = portal_pool();
        let target = addr(0, 2, 2);
        map.cell_mut(target).flags.insert(CellFlags::BARRICADE);

        // One hit short of the threshold: still standing.
        let hit = map.apply_structural_damage(
            target,
            structure::BARRICADE_THRESHOLD - 1,
            &mut portals,
        );
        assert_eq!(hit, StructureHit::Damaged);
        assert!(map.cell(target).flags.contains(CellFlags::BARRICADE));

        let hit = map.apply_structural_damage(target, 1, &mut portals);
        assert_eq!(hit, StructureHit::BarricadeDestroyed);
        assert!(!map.cell(target).flags.contains(CellFlags::BARRICADE));
        assert_eq!(map.cell(target).damage, 0);
    }

    #[test]
    fn portal_destruction_clears_partner_and_slot() {
        let mut map = MapModel::new();
        let mut portals = portal_pool();
        let entry = addr(0, 4, 4);
        let exit = addr(1, 4, 4);
        let slot = portals.allocate(PortalPair { entry, exit }).unwrap() as u16;
        map.link_portal(entry, exit, slot);

        let hit =
            map.apply_structural_damage(entry, structure::PORTAL_THRESHOLD, &mut portals);
        assert_eq!(hit, StructureHit::PortalDestroyed);
        assert!(map.cell(entry).flags.is_empty());
        assert!(map.cell(exit).flags.is_empty());
        assert_eq!(map.cell(exit).link, None);
        assert_eq!(portals.live_count(), 0);
    }

    #[test]
    fn damage_on_plain_cell_is_not_structural() {
        let mut map = MapModel::new();
        let mut portals = portal_pool();
        let hit = map.apply_structural_damage(addr(0, 1, 1), 500, &mut portals);
        assert_eq!(hit, StructureHit::NotStructural);
        assert_eq!(map.cell(addr(0, 1, 1)).damage, 0);
    }

    #[test]
    fn damage_counter_is_monotonic_while_standing() {
        let mut map = MapModel::new();
        let mut portals = portal_pool();
        let target = addr(0, 2, 2);
        map.cell_mut(target).flags.insert(CellFlags::BARRICADE);
        let mut last = 0;
        for _ in 0..20 {
            map.apply_structural_damage(target, 7, &mut portals);
            let now = map.cell(target).damage;
            assert!(now > last);
            last = now;
        }
    }
}

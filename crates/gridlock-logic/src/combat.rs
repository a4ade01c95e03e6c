//! Hit resolution and kill/credit attribution.
//!
//! A bullet that shares a cell with a living occupant is consumed, its
//! damage applied, and its owner credited. Kill credit: a human victim
//! credits the owner only across teams; a zombie victim always credits an
//! existing owner. Same-team fire damages but never credits.

use serde::{Deserialize, Serialize};

use crate::constants::NPC_TEAM;
use crate::entities::{EntityKind, Human, TeamId, Zombie};
use crate::map::{CellAddr, CellFlags, MapModel};
use crate::pools::EntityPools;

/// Outcome of one bullet-occupant collision, consumed by the tick machine
/// to update seat tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitReport {
    pub owner: Option<u8>,
    pub damage: i32,
    pub victim: EntityKind,
    pub victim_team: TeamId,
    pub victim_seat: Option<u8>,
    pub lethal: bool,
}

/// The credit rule, separated so it is trivially testable.
pub fn kill_credited(owner_team: TeamId, victim: EntityKind, victim_team: TeamId) -> bool {
    match victim {
        EntityKind::Zombie => true,
        EntityKind::Human => owner_team != victim_team,
    }
}

/// Remove a human from the board: free the slot, clear the cell, leave the
/// transient corpse marker. Returns the removed entity so the caller can
/// settle seat bookkeeping.
pub fn slay_human(map: &mut MapModel, pools: &mut EntityPools, slot: usize) -> Option<Human> {
    let human = pools.humans.free(slot)?;
    let cell = map.cell_mut(human.pos);
    cell.flags.remove(CellFlags::CHARACTER);
    cell.flags.insert(CellFlags::JUST_DIED);
    cell.occupant = None;
    Some(human)
}

/// Zombie counterpart of [`slay_human`].
pub fn slay_zombie(map: &mut MapModel, pools: &mut EntityPools, slot: usize) -> Option<Zombie> {
    let zombie = pools.zombies.free(slot)?;
    let cell = map.cell_mut(zombie.pos);
    cell.flags.remove(CellFlags::ZOMBIE);
    cell.flags.insert(CellFlags::JUST_DIED);
    cell.occupant = None;
    Some(zombie)
}

/// Free a bullet slot and drop the cell's bullet flag unless another live
/// bullet still sits there.
pub fn retire_bullet(map: &mut MapModel, pools: &mut EntityPools, slot: usize) {
    if let Some(bullet) = pools.bullets.free(slot) {
        refresh_bullet_flag(map, pools, bullet.pos);
    }
}

/// Recompute the bullet flag for one cell from the pool. Cheap at the fixed
/// pool sizes and keeps the flag a pure function of pool state.
pub fn refresh_bullet_flag(map: &mut MapModel, pools: &EntityPools, addr: CellAddr) {
    let any_left = pools.bullets.iter_live().any(|(_, b)| b.pos == addr);
    let cell = map.cell_mut(addr);
    if any_left {
        cell.flags.insert(CellFlags::BULLET);
    } else {
        cell.flags.remove(CellFlags::BULLET);
    }
}

/// Resolve every co-located bullet/occupant pair, ascending bullet slot
/// order. Mutates map and pools; seat tallies are settled by the caller
/// from the returned reports.
pub fn resolve_bullet_hits(map: &mut MapModel, pools: &mut EntityPools) -> Vec<HitReport> {
    let mut reports = Vec::new();
    for index in pools.bullets.live_indices() {
        let Some(bullet) = pools.bullets.get(index) else {
            continue;
        };
        let pos = bullet.pos;
        let owner = bullet.owner;
        let damage = bullet.damage;
        let Some((kind, slot)) = map.cell(pos).occupant else {
            continue;
        };
        retire_bullet(map, pools, index);
        let slot = slot as usize;
        match kind {
            EntityKind::Human => {
                let Some(human) = pools.humans.get_mut(slot) else {
                    continue;
                };
                human.hp -= damage;
                let lethal = human.hp <= 0;
                let victim_team = human.team;
                let victim_seat = human.seat;
                if lethal {
                    slay_human(map, pools, slot);
                }
                reports.push(HitReport {
                    owner,
                    damage,
                    victim: EntityKind::Human,
                    victim_team,
                    victim_seat,
                    lethal,
                });
            }
            EntityKind::Zombie => {
                let Some(zombie) = pools.zombies.get_mut(slot) else {
                    continue;
                };
                zombie.hp -= damage;
                let lethal = zombie.hp <= 0;
                if lethal {
                    slay_zombie(map, pools, slot);
                }
                reports.push(HitReport {
                    owner,
                    damage,
                    victim: EntityKind::Zombie,
                    victim_team: NPC_TEAM,
                    victim_seat: None,
                    lethal,
                });
            }
        }
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Bullet, CharacterSheet};
    use crate::map::Direction;

    fn addr(floor: u8, row: u8, col: u8) -> CellAddr {
        CellAddr::new(floor, row, col)
    }

    fn place_human(
        map: &mut MapModel,
        pools: &mut EntityPools,
        pos: CellAddr,
        team: TeamId,
        seat: Option<u8>,
        hp: i32,
    ) -> usize {
        let mut human = Human::new(pos, team, seat, CharacterSheet::default());
        human.hp = hp;
        let slot = pools.humans.allocate(human).unwrap();
        let cell = map.cell_mut(pos);
        cell.flags.insert(CellFlags::CHARACTER);
        cell.occupant = Some((EntityKind::Human, slot as u16));
        slot
    }

    fn place_zombie(map: &mut MapModel, pools: &mut EntityPools, pos: CellAddr, hp: i32) -> usize {
        let slot = pools
            .zombies
            .allocate(Zombie {
                pos,
                hp,
                damage: 10,
            })
            .unwrap();
        let cell = map.cell_mut(pos);
        cell.flags.insert(CellFlags::ZOMBIE);
        cell.occupant = Some((EntityKind::Zombie, slot as u16));
        slot
    }

    fn place_bullet(
        map: &mut MapModel,
        pools: &mut EntityPools,
        pos: CellAddr,
        owner: Option<u8>,
        damage: i32,
    ) -> usize {
        let slot = pools
            .bullets
            .allocate(Bullet {
                pos,
                dir: Direction::East,
                owner,
                damage,
                range: 10,
                traveled: 0,
            })
            .unwrap();
        map.cell_mut(pos).flags.insert(CellFlags::BULLET);
        slot
    }

    #[test]
    fn credit_rules() {
        assert!(kill_credited(0, EntityKind::Human, 1));
        assert!(!kill_credited(0, EntityKind::Human, 0));
        assert!(kill_credited(0, EntityKind::Zombie, NPC_TEAM));
        assert!(kill_credited(NPC_TEAM, EntityKind::Zombie, NPC_TEAM));
    }

    #[test]
    fn bullet_damages_and_is_consumed() {
        let mut map = MapModel::new();
        let mut pools = EntityPools::default();
        let pos = addr(0, 3, 3);
        let human = place_human(&mut map, &mut pools, pos, 1, Some(1), 100);
        place_bullet(&mut map, &mut pools, pos, Some(0), 30);

        let reports = resolve_bullet_hits(&mut map, &mut pools);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].damage, 30);
        assert!(!reports[0].lethal);
        assert_eq!(pools.humans.get(human).unwrap().hp, 70);
        assert_eq!(pools.bullets.live_count(), 0);
        assert!(!map.cell(pos).flags.contains(CellFlags::BULLET));
    }

    #[test]
    fn lethal_hit_frees_slot_and_marks_cell() {
        let mut map = MapModel::new();
        let mut pools = EntityPools::default();
        let pos = addr(0, 3, 3);
        let human = place_human(&mut map, &mut pools, pos, 1, Some(1), 20);
        place_bullet(&mut map, &mut pools, pos, Some(0), 30);

        let reports = resolve_bullet_hits(&mut map, &mut pools);
        assert!(reports[0].lethal);
        assert_eq!(reports[0].victim_seat, Some(1));
        assert_eq!(pools.humans.get(human), None);
        let cell = map.cell(pos);
        assert!(cell.flags.contains(CellFlags::JUST_DIED));
        assert!(!cell.flags.contains(CellFlags::CHARACTER));
        assert_eq!(cell.occupant, None);
    }

    #[test]
    fn zombie_victims_report_unconditional_credit() {
        let mut map = MapModel::new();
        let mut pools = EntityPools::default();
        let pos = addr(0, 3, 3);
        place_zombie(&mut map, &mut pools, pos, 10);
        place_bullet(&mut map, &mut pools, pos, Some(2), 30);

        let reports = resolve_bullet_hits(&mut map, &mut pools);
        assert!(reports[0].lethal);
        assert_eq!(reports[0].victim, EntityKind::Zombie);
        assert!(kill_credited(0, reports[0].victim, reports[0].victim_team));
        assert_eq!(pools.zombies.live_count(), 0);
    }

    #[test]
    fn two_bullets_one_victim_first_slot_kills() {
        let mut map = MapModel::new();
        let mut pools = EntityPools::default();
        let pos = addr(0, 3, 3);
        place_human(&mut map, &mut pools, pos, 1, None, 25);
        place_bullet(&mut map, &mut pools, pos, Some(0), 30);
        place_bullet(&mut map, &mut pools, pos, Some(1), 30);

        let reports = resolve_bullet_hits(&mut map, &mut pools);
        // First bullet kills; the second finds no occupant and keeps flying.
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].owner, Some(0));
        assert_eq!(pools.bullets.live_count(), 1);
        assert!(map.cell(pos).flags.contains(CellFlags::BULLET));
    }

    #[test]
    fn bullet_over_empty_cell_keeps_flying() {
        let mut map = MapModel::new();
        let mut pools = EntityPools::default();
        place_bullet(&mut map, &mut pools, addr(0, 5, 5), Some(0), 30);
        let reports = resolve_bullet_hits(&mut map, &mut pools);
        assert!(reports.is_empty());
        assert_eq!(pools.bullets.live_count(), 1);
    }
}

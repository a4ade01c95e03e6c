//! Gridlock Headless Simulation Harness
//!
//! Validates the lockstep core end to end without a relay, a renderer, or
//! a clock. Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p gridlock-simtest
//!   cargo run -p gridlock-simtest -- --verbose

use gridlock_logic::command::Command;
use gridlock_logic::constants::{pool_caps, structure};
use gridlock_logic::entities::{CharacterSheet, EntityKind, Zombie};
use gridlock_logic::map::{CellAddr, CellFlags, Direction, MapModel, PortalPair, StructureHit};
use gridlock_logic::mapload::MapConfig;
use gridlock_logic::pools::Pool;
use gridlock_logic::tick::{GameMode, RunState, SeatConfig, SimConfig, Simulation};

const DEFAULT_MAP: &str = include_str!("../../../data/default_map.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(results: &mut Vec<TestResult>, name: &str, passed: bool, detail: String) {
    results.push(TestResult {
        name: name.to_string(),
        passed,
        detail,
    });
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Gridlock Simulation Harness ===\n");

    let mut results = Vec::new();

    results.extend(validate_default_map(verbose));
    results.extend(validate_determinism(verbose));
    results.extend(validate_bullet_range(verbose));
    results.extend(validate_structures(verbose));
    results.extend(validate_kill_credit(verbose));
    results.extend(validate_pool_reuse(verbose));
    results.extend(validate_quit_flow(verbose));

    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    for result in &results {
        let mark = if result.passed { "PASS" } else { "FAIL" };
        if !result.passed || verbose {
            println!("[{mark}] {} — {}", result.name, result.detail);
        }
    }
    println!("\n{} passed, {} failed, {} total", passed, failed, results.len());
    if failed > 0 {
        std::process::exit(1);
    }
}

// ── Shared fixtures ─────────────────────────────────────────────────────

fn two_seat_config(mode: GameMode, local_seat: u8) -> SimConfig {
    SimConfig {
        start_time: 1_723_456_789,
        serial: 4242,
        mode,
        local_seat,
        seats: vec![
            SeatConfig {
                team: 0,
                sheet: CharacterSheet::default(),
            },
            SeatConfig {
                team: 1,
                sheet: CharacterSheet::default(),
            },
        ],
        periodic_spawns: false,
    }
}

fn bare_sim(config: SimConfig, spawns: &[CellAddr]) -> Simulation {
    Simulation::from_parts(
        MapModel::new(),
        Pool::with_capacity(pool_caps::PORTAL_PAIRS),
        spawns,
        config,
    )
}

fn idle(n: usize) -> Vec<Command> {
    vec![Command::Idle; n]
}

fn addr(floor: u8, row: u8, col: u8) -> CellAddr {
    CellAddr::new(floor, row, col)
}

fn spawn_zombie(sim: &mut Simulation, pos: CellAddr, hp: i32, damage: i32) {
    let slot = sim
        .pools
        .zombies
        .allocate(Zombie { pos, hp, damage })
        .expect("zombie pool full in fixture");
    let cell = sim.map.cell_mut(pos);
    cell.flags.insert(CellFlags::ZOMBIE);
    cell.occupant = Some((EntityKind::Zombie, slot as u16));
}

// ── 1. Default map ──────────────────────────────────────────────────────

fn validate_default_map(verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();
    if verbose {
        println!("-- default map --");
    }
    match MapConfig::from_json(DEFAULT_MAP) {
        Ok(config) => {
            check(
                &mut results,
                "default map parses",
                true,
                format!("{} portal links", config.portals.len()),
            );
            match config.build() {
                Ok((map, portals)) => {
                    let entry = addr(0, 10, 64);
                    check(
                        &mut results,
                        "default map builds",
                        portals.live_count() == config.portals.len()
                            && map.cell(entry).flags.contains(CellFlags::PORTAL_IN),
                        format!("{} portal pairs allocated", portals.live_count()),
                    );
                }
                Err(err) => check(
                    &mut results,
                    "default map builds",
                    false,
                    err.to_string(),
                ),
            }
        }
        Err(err) => check(&mut results, "default map parses", false, err.to_string()),
    }
    results
}

// ── 2. Determinism ──────────────────────────────────────────────────────

fn session_on_default_map(local_seat: u8) -> Simulation {
    let map_config = MapConfig::from_json(DEFAULT_MAP).expect("default map parses");
    let mut config = two_seat_config(GameMode::Deadline { ticks: 1_000_000 }, local_seat);
    config.periodic_spawns = true;
    Simulation::from_map_config(&map_config, config).expect("default map builds")
}

fn validate_determinism(verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();
    if verbose {
        println!("-- determinism --");
    }

    // Twin idle runs, full spawn schedule active.
    let mut a = session_on_default_map(0);
    let mut b = session_on_default_map(0);
    let mut identical = true;
    let mut diverged_at = 0;
    for tick in 0..1000u64 {
        a.advance(&idle(2));
        b.advance(&idle(2));
        if a.state_blob().unwrap_or_default() != b.state_blob().unwrap_or_default() {
            identical = false;
            diverged_at = tick;
            break;
        }
    }
    check(
        &mut results,
        "twin idle runs identical over 1000 ticks",
        identical,
        if identical {
            format!("{} zombies live at horizon", a.pools.zombies.live_count())
        } else {
            format!("diverged at tick {diverged_at}")
        },
    );

    // Twin scripted runs with different local seats: shared state must
    // match as long as both replicas are still running (a replica whose
    // own seat dies goes terminal and stops simulating).
    let script: Vec<u8> = b"wdsafbecw.dfa".to_vec();
    let mut a = session_on_default_map(0);
    let mut b = session_on_default_map(1);
    let mut identical = true;
    let mut compared = 0u64;
    for tick in 0..500u64 {
        let byte = script[(tick as usize) % script.len()];
        let commands = vec![Command::from_byte(byte), Command::from_byte(byte)];
        a.advance(&commands);
        b.advance(&commands);
        if a.state.is_terminal() || b.state.is_terminal() {
            break;
        }
        compared = tick + 1;
        if a.state_blob().unwrap_or_default() != b.state_blob().unwrap_or_default() {
            identical = false;
            break;
        }
    }
    check(
        &mut results,
        "twin scripted runs identical across local seats",
        identical,
        format!("{compared} ticks compared"),
    );

    results
}

// ── 3. Bullet range ─────────────────────────────────────────────────────

fn validate_bullet_range(verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();
    if verbose {
        println!("-- bullet range --");
    }
    for range in [2u16, 5, 9] {
        let mut config = two_seat_config(GameMode::Deadline { ticks: 1_000_000 }, 0);
        config.seats[0].sheet.gun_range = range;
        let mut sim = bare_sim(config, &[addr(0, 5, 2), addr(0, 20, 60)]);
        sim.advance(&[Command::Turn(Direction::East), Command::Idle]);
        sim.advance(&[Command::SwitchItem, Command::Idle]);
        sim.advance(&[Command::Fire, Command::Idle]);

        let mut alive_ticks = 0u16;
        for _ in 0..64 {
            sim.advance(&idle(2));
            if sim.pools.bullets.live_count() == 0 {
                break;
            }
            alive_ticks += 1;
        }
        // A bullet of range R retires when traveled reaches R-1, so it
        // survives exactly R-2 post-fire ticks.
        let expected = range.saturating_sub(2);
        check(
            &mut results,
            &format!("bullet range {range} retires on schedule"),
            alive_ticks == expected && sim.pools.bullets.live_count() == 0,
            format!("survived {alive_ticks} ticks, expected {expected}"),
        );
    }
    results
}

// ── 4. Destructible structures ──────────────────────────────────────────

fn validate_structures(verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();
    if verbose {
        println!("-- structures --");
    }

    let mut map = MapModel::new();
    let mut portals: Pool<PortalPair> = Pool::with_capacity(pool_caps::PORTAL_PAIRS);
    let block = addr(0, 3, 3);
    map.cell_mut(block).flags.insert(CellFlags::BARRICADE);
    let early = map.apply_structural_damage(block, structure::BARRICADE_THRESHOLD - 1, &mut portals);
    let standing = map.cell(block).flags.contains(CellFlags::BARRICADE);
    let final_hit = map.apply_structural_damage(block, 1, &mut portals);
    check(
        &mut results,
        "barricade clears exactly at threshold",
        early == StructureHit::Damaged
            && standing
            && final_hit == StructureHit::BarricadeDestroyed
            && !map.cell(block).flags.contains(CellFlags::BARRICADE),
        format!("threshold {}", structure::BARRICADE_THRESHOLD),
    );

    let entry = addr(0, 6, 6);
    let exit = addr(1, 6, 6);
    let slot = portals
        .allocate(PortalPair { entry, exit })
        .expect("portal pool full in fixture") as u16;
    map.link_portal(entry, exit, slot);
    map.apply_structural_damage(entry, structure::PORTAL_THRESHOLD - 1, &mut portals);
    let still_linked = map.cell(exit).flags.contains(CellFlags::PORTAL_OUT);
    let hit = map.apply_structural_damage(entry, 1, &mut portals);
    check(
        &mut results,
        "portal destruction clears partner and slot",
        still_linked
            && hit == StructureHit::PortalDestroyed
            && map.cell(entry).flags.is_empty()
            && map.cell(exit).flags.is_empty()
            && portals.live_count() == 0,
        format!("threshold {}", structure::PORTAL_THRESHOLD),
    );

    results
}

// ── 5. Kill credit ──────────────────────────────────────────────────────

fn punch_duel(attacker_team: u8, victim_team: u8) -> Simulation {
    let mut config = two_seat_config(GameMode::Deadline { ticks: 1_000_000 }, 0);
    config.seats[0].team = attacker_team;
    config.seats[1].team = victim_team;
    // A one-punch victim.
    config.seats[1].sheet.max_hp = 10;
    let mut sim = bare_sim(config, &[addr(0, 5, 5), addr(0, 5, 6)]);
    sim.advance(&[Command::Turn(Direction::East), Command::Idle]);
    sim.advance(&[Command::Fire, Command::Idle]);
    sim
}

fn validate_kill_credit(verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();
    if verbose {
        println!("-- kill credit --");
    }

    let sim = punch_duel(0, 1);
    check(
        &mut results,
        "cross-team human kill credits",
        !sim.seats[1].alive && sim.seats[0].kills == 1 && sim.seats[0].damage_dealt > 0,
        format!("kills={} damage={}", sim.seats[0].kills, sim.seats[0].damage_dealt),
    );

    let sim = punch_duel(0, 0);
    check(
        &mut results,
        "same-team human kill damages but never credits",
        !sim.seats[1].alive && sim.seats[0].kills == 0 && sim.seats[0].damage_dealt > 0,
        format!("kills={} damage={}", sim.seats[0].kills, sim.seats[0].damage_dealt),
    );

    let mut sim = bare_sim(
        two_seat_config(GameMode::Deadline { ticks: 1_000_000 }, 0),
        &[addr(0, 5, 5), addr(0, 20, 60)],
    );
    spawn_zombie(&mut sim, addr(0, 5, 6), 10, 0);
    sim.advance(&[Command::Turn(Direction::East), Command::Idle]);
    sim.advance(&[Command::Fire, Command::Idle]);
    check(
        &mut results,
        "zombie kill always credits",
        sim.pools.zombies.live_count() == 0 && sim.seats[0].kills == 1,
        format!("kills={}", sim.seats[0].kills),
    );

    results
}

// ── 6. Pool reuse ───────────────────────────────────────────────────────

fn validate_pool_reuse(verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();
    if verbose {
        println!("-- pool reuse --");
    }

    let mut pool: Pool<Zombie> = Pool::with_capacity(4);
    let first = pool
        .allocate(Zombie {
            pos: addr(0, 1, 1),
            hp: 50,
            damage: 10,
        })
        .expect("allocation in empty pool");
    pool.free(first);
    let reused = pool
        .allocate(Zombie {
            pos: addr(3, 9, 9),
            hp: 80,
            damage: 20,
        })
        .expect("reallocation after free");
    let fresh = pool.get(reused).map(|z| (z.pos, z.hp, z.damage));
    check(
        &mut results,
        "freed index reuses with no residual state",
        reused == first && fresh == Some((addr(3, 9, 9), 80, 20)),
        format!("index {first} reused"),
    );

    let mut pool: Pool<u8> = Pool::with_capacity(2);
    pool.allocate(1);
    pool.allocate(2);
    check(
        &mut results,
        "full pool rejects allocation",
        pool.allocate(3).is_none() && pool.live_count() == 2,
        "capacity 2".to_string(),
    );

    results
}

// ── 7. Quit flow ────────────────────────────────────────────────────────

fn validate_quit_flow(verbose: bool) -> Vec<TestResult> {
    let mut results = Vec::new();
    if verbose {
        println!("-- quit flow --");
    }

    let mut sim = bare_sim(
        two_seat_config(GameMode::LastTeamStanding, 0),
        &[addr(0, 2, 2), addr(0, 12, 12)],
    );
    sim.advance(&[Command::Quit, Command::Idle]);
    check(
        &mut results,
        "local quit is terminal within one tick",
        sim.state == RunState::Quit && !sim.seats[0].alive && !sim.seats[0].connected,
        format!("state {:?}", sim.state),
    );

    let mut sim = bare_sim(
        two_seat_config(GameMode::LastTeamStanding, 0),
        &[addr(0, 2, 2), addr(0, 12, 12)],
    );
    sim.advance(&[Command::Idle, Command::Quit]);
    let reduced = !sim.seats[1].alive;
    sim.advance(&idle(2));
    check(
        &mut results,
        "peer quit reduces their team and ends the match",
        reduced && sim.state == RunState::Won,
        format!("state {:?}", sim.state),
    );

    results
}

//! Gridlock client.
//!
//! Connects to a relay, completes the setup exchange, then runs the
//! deterministic simulation in lockstep with every other participant: one
//! command byte out, one command byte per peer in, one tick advanced, one
//! frame published to the render thread.
//!
//! Usage:
//!   gridlock-client --addr 127.0.0.1:4444 --password sesame --name ace \
//!       --mode lastteam --tick-ms 120 [--script "wwdf"]
//!
//! Every participant must run the same `--mode`; it is part of the shared
//! simulation configuration, exactly like the map.

mod provider;
mod render;
mod scheduler;
mod session;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use gridlock_logic::command::Command;
use gridlock_logic::entities::CharacterSheet;
use gridlock_logic::mapload::MapConfig;
use gridlock_logic::tick::{GameMode, SeatConfig, SimConfig, Simulation};
use log::{error, info, warn};

use provider::{CommandProvider, IdleProvider, ScriptedProvider};
use render::{FrameChannel, LogRenderer, Renderer};
use scheduler::TickScheduler;
use session::RelaySession;

const DEFAULT_MAP: &str = include_str!("../../../data/default_map.json");

struct ClientArgs {
    addr: String,
    password: String,
    name: String,
    script: Option<String>,
    tick: Duration,
    mode: GameMode,
    log_every: u64,
}

impl Default for ClientArgs {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:4444".to_string(),
            password: "gridlock".to_string(),
            name: "survivor".to_string(),
            script: None,
            tick: Duration::from_millis(120),
            mode: GameMode::LastTeamStanding,
            log_every: 25,
        }
    }
}

fn parse_mode(text: &str) -> Option<GameMode> {
    if text == "lastteam" {
        return Some(GameMode::LastTeamStanding);
    }
    let (kind, value) = text.split_once(':')?;
    match kind {
        "deadline" => value.parse().ok().map(|ticks| GameMode::Deadline { ticks }),
        "quota" => value.parse().ok().map(|kills| GameMode::KillQuota { kills }),
        _ => None,
    }
}

fn parse_args<I: Iterator<Item = String>>(args: I) -> ClientArgs {
    let mut parsed = ClientArgs::default();
    let args: Vec<String> = args.collect();
    let mut i = 0;
    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--addr", Some(v)) => parsed.addr = v.clone(),
            ("--password", Some(v)) => parsed.password = v.clone(),
            ("--name", Some(v)) => parsed.name = v.clone(),
            ("--script", Some(v)) => parsed.script = Some(v.clone()),
            ("--tick-ms", Some(v)) => {
                if let Ok(ms) = v.parse() {
                    parsed.tick = Duration::from_millis(ms);
                }
            }
            ("--mode", Some(v)) => {
                if let Some(mode) = parse_mode(v) {
                    parsed.mode = mode;
                }
            }
            ("--log-every", Some(v)) => {
                if let Ok(n) = v.parse() {
                    parsed.log_every = n;
                }
            }
            _ => {
                i += 1;
                continue;
            }
        }
        i += 2;
    }
    parsed
}

fn main() {
    env_logger::init();
    let args = parse_args(std::env::args().skip(1));

    let sheet = CharacterSheet {
        name: args.name.clone(),
        ..CharacterSheet::default()
    };

    let mut relay = match RelaySession::connect(&args.addr, &args.password, &sheet.to_blob()) {
        Ok(session) => session,
        Err(err) => {
            error!("could not join relay at {}: {err}", args.addr);
            std::process::exit(2);
        }
    };

    // Assemble the shared simulation configuration. Every replica derives
    // the identical SimConfig (bar local_seat) from the same setup bytes.
    let teams = relay.seat_teams();
    let blobs = relay.peer_blobs();
    let seats = teams
        .iter()
        .zip(blobs.iter())
        .map(|(team, blob)| SeatConfig {
            team: *team,
            sheet: match blob {
                Some(blob) => CharacterSheet::from_blob(blob),
                None => sheet.clone(),
            },
        })
        .collect();
    let sim_config = SimConfig {
        start_time: relay.seed.start_time,
        serial: relay.seed.serial,
        mode: args.mode,
        local_seat: relay.assignment.seat,
        seats,
        periodic_spawns: true,
    };

    let map_config = match MapConfig::from_json(DEFAULT_MAP) {
        Ok(config) => config,
        Err(err) => {
            error!("default map is invalid: {err}");
            std::process::exit(1);
        }
    };
    let mut sim = match Simulation::from_map_config(&map_config, sim_config) {
        Ok(sim) => sim,
        Err(err) => {
            error!("simulation setup failed: {err}");
            std::process::exit(1);
        }
    };

    let channel = Arc::new(FrameChannel::new());
    let render_handle = {
        let channel = Arc::clone(&channel);
        let mut renderer = LogRenderer::new(args.log_every);
        thread::spawn(move || {
            while let Some(frame) = channel.consume() {
                renderer.draw(&frame);
            }
        })
    };

    let mut provider: Box<dyn CommandProvider> = match &args.script {
        Some(script) => Box::new(ScriptedProvider::new(script)),
        None => Box::new(IdleProvider),
    };
    let mut scheduler = TickScheduler::new(args.tick);
    let mut last_frame = None;

    loop {
        scheduler.wait();
        let command = provider.next_command(last_frame.as_ref());
        let round = match relay.exchange(command.as_byte()) {
            Ok(round) => round,
            Err(err) => {
                warn!("relay link lost: {err}");
                sim.mark_disconnected();
                let frame = sim.snapshot();
                let _ = channel.publish(frame);
                break;
            }
        };
        let commands: Vec<Command> = round.iter().map(|b| Command::from_byte(*b)).collect();
        let frame = sim.advance(&commands);
        let terminal = frame.state.is_terminal();
        last_frame = Some(frame.clone());
        if !channel.publish(frame) {
            break;
        }
        if terminal {
            info!("session over: {:?} at tick {}", sim.state, sim.tick);
            break;
        }
    }

    channel.close();
    let _ = render_handle.join();
}

//! Gridlock session relay.
//!
//! Usage:
//!   gridlock-relay --bind 0.0.0.0:4444 --players 4 --password sesame
//!
//! The relay authenticates the configured number of players, distributes
//! the shared seed and roster, then forwards one command byte per player
//! per tick until one team remains. It validates nothing about the game —
//! replicas are trusted to run identical simulations.

mod config;
mod roster;
mod run;

use config::RelayConfig;
use log::{error, info};
use run::Relay;

fn main() {
    env_logger::init();
    let config = RelayConfig::from_args(std::env::args().skip(1));
    info!(
        "gridlock relay starting: {} players, {} teams, {:?} receive deadline",
        config.players, config.teams, config.recv_timeout
    );
    let relay = match Relay::bind(config) {
        Ok(relay) => relay,
        Err(err) => {
            error!("bind failed: {err}");
            std::process::exit(1);
        }
    };
    match relay.run() {
        Ok(Some(team)) => info!("session over, team {team} wins"),
        Ok(None) => info!("session over, no survivors"),
        Err(err) => {
            error!("session aborted: {err}");
            std::process::exit(1);
        }
    }
}

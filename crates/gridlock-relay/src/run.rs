//! The relay session: authenticate, seed, then forward one command byte
//! per participant per round until one team remains.
//!
//! The relay never validates command legality — it is a pure forwarder by
//! design. Its only game knowledge is the terminal byte, which it both
//! recognizes (voluntary quit) and synthesizes (timeout, short read, send
//! failure), so every replica observes the same roster reduction.

use std::io::Read;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gridlock_net::frame::{read_nul_str, write_byte, ACCEPT, REJECT};
use gridlock_net::setup::{PeerProfile, SeatAssignment, SessionSeed};
use gridlock_net::NetError;
use log::{debug, info, warn};

use crate::config::RelayConfig;
use crate::roster::{none_alive, winning_team, Participant};

/// Handshake and setup reads get a generous deadline; the per-round
/// receive deadline comes from the config.
const AUTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Terminal byte relayed for a gone participant.
pub const ELIMINATED: u8 = b'x';

pub struct Relay {
    listener: TcpListener,
    config: RelayConfig,
}

impl Relay {
    pub fn bind(config: RelayConfig) -> Result<Self, NetError> {
        let listener = TcpListener::bind(&config.bind)?;
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        Ok(self.listener.local_addr()?)
    }

    /// Drive a full session. Returns the winning team, or `None` when no
    /// participant outlived the match.
    pub fn run(self) -> Result<Option<u8>, NetError> {
        let mut roster = self.gather_roster()?;
        self.broadcast_setup(&mut roster)?;
        Ok(self.run_loop(&mut roster))
    }

    /// Accept and authenticate until the configured roster is full. A
    /// rejected or failed handshake never consumes a seat.
    fn gather_roster(&self) -> Result<Vec<Participant>, NetError> {
        info!(
            "listening on {}, waiting for {} players",
            self.config.bind, self.config.players
        );
        let mut roster = Vec::new();
        while roster.len() < self.config.players {
            let (mut stream, addr) = self.listener.accept()?;
            match self.authenticate(&mut stream) {
                Ok(true) => {
                    let team = (roster.len() as u8) % self.config.teams;
                    info!("seat {} from {} on team {}", roster.len(), addr, team);
                    roster.push(Participant::new(stream, team));
                }
                Ok(false) => info!("rejected credentials from {addr}"),
                Err(err) => warn!("handshake with {addr} failed: {err}"),
            }
        }
        Ok(roster)
    }

    fn authenticate(&self, stream: &mut TcpStream) -> Result<bool, NetError> {
        stream.set_read_timeout(Some(AUTH_TIMEOUT))?;
        stream.set_write_timeout(Some(AUTH_TIMEOUT))?;
        let password = read_nul_str(stream)?;
        if password == self.config.password {
            write_byte(stream, ACCEPT)?;
            Ok(true)
        } else {
            write_byte(stream, REJECT)?;
            Ok(false)
        }
    }

    /// Send every participant the shared seed and its roster line, then
    /// relay every profile blob to every other participant in seat order.
    fn broadcast_setup(&self, roster: &mut Vec<Participant>) -> Result<(), NetError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let seed = SessionSeed {
            start_time: now.as_secs(),
            serial: self
                .config
                .serial
                .unwrap_or_else(|| now.subsec_nanos() as u64),
        };
        info!(
            "roster complete; session seed {} {}",
            seed.start_time, seed.serial
        );
        let count = roster.len() as u8;
        for (i, participant) in roster.iter_mut().enumerate() {
            seed.write_to(&mut participant.stream)?;
            SeatAssignment {
                player_count: count,
                seat: i as u8,
                team: participant.team,
            }
            .write_to(&mut participant.stream)?;
        }
        for participant in roster.iter_mut() {
            participant.profile = read_nul_str(&mut participant.stream)?;
        }
        for receiver in 0..roster.len() {
            for sender in 0..roster.len() {
                if sender == receiver {
                    continue;
                }
                let profile = PeerProfile {
                    team: roster[sender].team,
                    blob: roster[sender].profile.clone(),
                };
                profile.write_to(&mut roster[receiver].stream)?;
            }
        }
        Ok(())
    }

    fn run_loop(&self, roster: &mut [Participant]) -> Option<u8> {
        for participant in roster.iter() {
            let _ = participant
                .stream
                .set_read_timeout(Some(self.config.recv_timeout));
            let _ = participant
                .stream
                .set_write_timeout(Some(self.config.recv_timeout));
        }
        let mut round: u64 = 0;
        loop {
            let commands = collect_round(roster);
            broadcast_round(roster, &commands);
            if let Some(team) = winning_team(roster.iter().map(|p| (p.team, p.alive))) {
                info!("team {team} wins after {round} rounds");
                return Some(team);
            }
            if none_alive(roster.iter().map(|p| p.alive)) {
                info!("no participants remain after {round} rounds");
                return None;
            }
            round += 1;
            debug!("round {round} relayed");
        }
    }
}

/// Read one command byte per live participant under the receive deadline.
/// Per-participant reads are independent, so they run on scoped threads;
/// completion order cannot affect the resulting command set. A timeout or
/// short read eliminates that participant and synthesizes the terminal
/// byte, exactly once.
fn collect_round(roster: &mut [Participant]) -> Vec<Option<u8>> {
    let mut results: Vec<Option<u8>> = vec![None; roster.len()];
    thread::scope(|scope| {
        let mut handles: Vec<Option<thread::ScopedJoinHandle<'_, Option<u8>>>> = Vec::new();
        for participant in roster.iter() {
            if !(participant.alive && participant.connected) {
                handles.push(None);
                continue;
            }
            let stream = &participant.stream;
            handles.push(Some(scope.spawn(move || {
                let mut byte = [0u8; 1];
                let mut reader = stream;
                match Read::read_exact(&mut reader, &mut byte) {
                    Ok(()) => Some(byte[0]),
                    Err(_) => None,
                }
            })));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            if let Some(handle) = handle {
                results[i] = handle.join().unwrap_or(None);
            }
        }
    });

    let mut commands: Vec<Option<u8>> = vec![None; roster.len()];
    for (i, participant) in roster.iter_mut().enumerate() {
        if participant.alive && participant.connected {
            match results[i] {
                Some(byte) => {
                    if byte == ELIMINATED {
                        participant.eliminate();
                        participant.announced_gone = true;
                    }
                    commands[i] = Some(byte);
                }
                None => {
                    warn!("seat {i} timed out or dropped; eliminating");
                    participant.eliminate();
                    participant.announced_gone = true;
                    commands[i] = Some(ELIMINATED);
                }
            }
        } else if !participant.announced_gone {
            participant.announced_gone = true;
            commands[i] = Some(ELIMINATED);
        }
    }
    commands
}

/// Forward every collected byte to every other still-connected
/// participant, in seat order. A failed send eliminates the receiver; its
/// terminal byte goes out with the next round.
fn broadcast_round(roster: &mut [Participant], commands: &[Option<u8>]) {
    for receiver in 0..roster.len() {
        if !roster[receiver].connected {
            continue;
        }
        for sender in 0..roster.len() {
            if sender == receiver {
                continue;
            }
            let Some(byte) = commands[sender] else {
                continue;
            };
            if let Err(err) = write_byte(&mut roster[receiver].stream, byte) {
                warn!("send to seat {receiver} failed: {err}; eliminating");
                roster[receiver].eliminate();
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlock_net::frame::{read_byte, write_nul_str};
    use std::time::Duration;

    fn test_config(players: usize, recv_timeout: Duration) -> RelayConfig {
        RelayConfig {
            bind: "127.0.0.1:0".to_string(),
            players,
            password: "sesame".to_string(),
            recv_timeout,
            teams: 2,
            serial: Some(42),
        }
    }

    fn connect(addr: SocketAddr, password: &str) -> TcpStream {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        write_nul_str(&mut stream, password).unwrap();
        stream
    }

    /// Full miniature session: a bad password is rejected without holding
    /// a seat, two valid participants complete setup, and a voluntary quit
    /// hands the win to the remaining team.
    #[test]
    fn rejects_bad_password_and_relays_quit() {
        let relay = Relay::bind(test_config(2, Duration::from_secs(2))).unwrap();
        let addr = relay.local_addr().unwrap();
        let handle = thread::spawn(move || relay.run());

        let mut impostor = connect(addr, "wrong");
        assert_eq!(read_byte(&mut impostor).unwrap(), REJECT);
        drop(impostor);

        let mut a = connect(addr, "sesame");
        assert_eq!(read_byte(&mut a).unwrap(), ACCEPT);
        let mut b = connect(addr, "sesame");
        assert_eq!(read_byte(&mut b).unwrap(), ACCEPT);

        let seed_a = SessionSeed::read_from(&mut a).unwrap();
        let seed_b = SessionSeed::read_from(&mut b).unwrap();
        assert_eq!(seed_a, seed_b);
        assert_eq!(seed_a.serial, 42);

        let assign_a = SeatAssignment::read_from(&mut a).unwrap();
        let assign_b = SeatAssignment::read_from(&mut b).unwrap();
        assert_eq!((assign_a.player_count, assign_a.seat, assign_a.team), (2, 0, 0));
        assert_eq!((assign_b.player_count, assign_b.seat, assign_b.team), (2, 1, 1));

        write_nul_str(&mut a, r#"{"name":"a"}"#).unwrap();
        write_nul_str(&mut b, r#"{"name":"b"}"#).unwrap();
        let peer_of_a = PeerProfile::read_from(&mut a).unwrap();
        let peer_of_b = PeerProfile::read_from(&mut b).unwrap();
        assert_eq!(peer_of_a.team, 1);
        assert_eq!(peer_of_b.blob, r#"{"name":"a"}"#);

        // Round 1: a acts, b quits. a must observe b's terminal byte.
        write_byte(&mut a, b'f').unwrap();
        write_byte(&mut b, b'x').unwrap();
        assert_eq!(read_byte(&mut a).unwrap(), b'x');

        let winner = handle.join().unwrap().unwrap();
        assert_eq!(winner, Some(0));
    }

    /// A participant that completes setup and then goes silent is
    /// eliminated on the receive deadline and announced to the others.
    #[test]
    fn silent_participant_is_eliminated_and_announced() {
        let relay = Relay::bind(test_config(2, Duration::from_millis(300))).unwrap();
        let addr = relay.local_addr().unwrap();
        let handle = thread::spawn(move || relay.run());

        let mut a = connect(addr, "sesame");
        assert_eq!(read_byte(&mut a).unwrap(), ACCEPT);
        let mut b = connect(addr, "sesame");
        assert_eq!(read_byte(&mut b).unwrap(), ACCEPT);

        for stream in [&mut a, &mut b] {
            SessionSeed::read_from(stream).unwrap();
            SeatAssignment::read_from(stream).unwrap();
            write_nul_str(stream, "{}").unwrap();
            PeerProfile::read_from(stream).unwrap();
        }

        // b never sends a command.
        write_byte(&mut a, b'f').unwrap();
        assert_eq!(read_byte(&mut a).unwrap(), ELIMINATED);

        let winner = handle.join().unwrap().unwrap();
        assert_eq!(winner, Some(0));
    }
}

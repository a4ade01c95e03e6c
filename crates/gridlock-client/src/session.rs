//! Client side of the relay protocol: handshake, setup exchange, and the
//! per-tick command round-trip.

use std::net::TcpStream;
use std::time::Duration;

use gridlock_net::frame::{read_byte, write_byte, write_nul_str, ACCEPT};
use gridlock_net::setup::{PeerProfile, SeatAssignment, SessionSeed};
use gridlock_net::NetError;
use log::info;

/// Setup and steady-state receive deadline. The relay paces rounds; this
/// only bounds how long a dead relay can hang the client.
const RECV_TIMEOUT: Duration = Duration::from_secs(10);

pub struct RelaySession {
    stream: TcpStream,
    pub seed: SessionSeed,
    pub assignment: SeatAssignment,
    /// Peer profiles in seat order, own seat omitted.
    pub peers: Vec<PeerProfile>,
}

impl RelaySession {
    /// Connect, authenticate, and complete the setup exchange. A rejected
    /// password surfaces as [`NetError::AuthRejected`]; the caller may
    /// reconnect with new credentials.
    pub fn connect(addr: &str, password: &str, profile_blob: &str) -> Result<Self, NetError> {
        let mut stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(RECV_TIMEOUT))?;
        stream.set_write_timeout(Some(RECV_TIMEOUT))?;
        write_nul_str(&mut stream, password)?;
        if read_byte(&mut stream)? != ACCEPT {
            return Err(NetError::AuthRejected);
        }
        let seed = SessionSeed::read_from(&mut stream)?;
        let assignment = SeatAssignment::read_from(&mut stream)?;
        info!(
            "joined as seat {} of {} on team {}",
            assignment.seat, assignment.player_count, assignment.team
        );
        write_nul_str(&mut stream, profile_blob)?;
        let mut peers = Vec::new();
        for _ in 1..assignment.player_count {
            peers.push(PeerProfile::read_from(&mut stream)?);
        }
        Ok(Self {
            stream,
            seed,
            assignment,
            peers,
        })
    }

    /// One lockstep round: send our byte, then receive every other seat's
    /// byte in seat order. Returns the complete per-seat command set with
    /// our own byte slotted in.
    pub fn exchange(&mut self, command: u8) -> Result<Vec<u8>, NetError> {
        write_byte(&mut self.stream, command)?;
        let count = self.assignment.player_count as usize;
        let own = self.assignment.seat as usize;
        let mut round = vec![0u8; count];
        round[own] = command;
        for seat in 0..count {
            if seat == own {
                continue;
            }
            round[seat] = read_byte(&mut self.stream)?;
        }
        Ok(round)
    }

    /// Team of every seat, reconstructed from the assignment and the peer
    /// profiles (which arrive in seat order with our seat skipped).
    pub fn seat_teams(&self) -> Vec<u8> {
        let own = self.assignment.seat as usize;
        let mut peers = self.peers.iter();
        (0..self.assignment.player_count as usize)
            .map(|seat| {
                if seat == own {
                    self.assignment.team
                } else {
                    peers.next().map(|p| p.team).unwrap_or(0)
                }
            })
            .collect()
    }

    /// Character sheet blob of every seat, own blob substituted by the
    /// caller.
    pub fn peer_blobs(&self) -> Vec<Option<String>> {
        let own = self.assignment.seat as usize;
        let mut peers = self.peers.iter();
        (0..self.assignment.player_count as usize)
            .map(|seat| {
                if seat == own {
                    None
                } else {
                    peers.next().map(|p| p.blob.clone())
                }
            })
            .collect()
    }
}

//! Setup-phase messages: the shared seed, the seat assignment, and peer
//! profiles. All travel as NUL-terminated text so the protocol stays
//! inspectable on the wire.

use std::io::{Read, Write};

use crate::error::NetError;
use crate::frame::{read_byte, read_nul_str, write_byte, write_nul_str};

/// The `(start_time, serial)` pair every replica seeds its generator with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSeed {
    pub start_time: u64,
    pub serial: u64,
}

impl SessionSeed {
    pub fn encode(&self) -> String {
        format!("{} {}", self.start_time, self.serial)
    }

    pub fn parse(text: &str) -> Result<Self, NetError> {
        let mut parts = text.split_whitespace();
        let start_time = parse_u64(parts.next(), "seed start_time")?;
        let serial = parse_u64(parts.next(), "seed serial")?;
        Ok(Self { start_time, serial })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), NetError> {
        write_nul_str(writer, &self.encode())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, NetError> {
        Self::parse(&read_nul_str(reader)?)
    }
}

/// The per-participant roster line: player count, own seat, own team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatAssignment {
    pub player_count: u8,
    pub seat: u8,
    pub team: u8,
}

impl SeatAssignment {
    pub fn encode(&self) -> String {
        format!("{} {} {}", self.player_count, self.seat, self.team)
    }

    pub fn parse(text: &str) -> Result<Self, NetError> {
        let mut parts = text.split_whitespace();
        let player_count = parse_u64(parts.next(), "assignment player_count")? as u8;
        let seat = parse_u64(parts.next(), "assignment seat")? as u8;
        let team = parse_u64(parts.next(), "assignment team")? as u8;
        Ok(Self {
            player_count,
            seat,
            team,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), NetError> {
        write_nul_str(writer, &self.encode())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, NetError> {
        Self::parse(&read_nul_str(reader)?)
    }
}

/// A peer's static character-sheet blob plus its team. The blob is opaque
/// to the wire layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerProfile {
    pub team: u8,
    pub blob: String,
}

impl PeerProfile {
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), NetError> {
        write_byte(writer, self.team)?;
        write_nul_str(writer, &self.blob)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, NetError> {
        let team = read_byte(reader)?;
        let blob = read_nul_str(reader)?;
        Ok(Self { team, blob })
    }
}

fn parse_u64(part: Option<&str>, what: &str) -> Result<u64, NetError> {
    part.ok_or_else(|| NetError::Malformed(format!("missing {what}")))?
        .parse()
        .map_err(|_| NetError::Malformed(format!("bad {what}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn seed_round_trip() {
        let seed = SessionSeed {
            start_time: 1_723_400_000,
            serial: 8675309,
        };
        let mut buf = Vec::new();
        seed.write_to(&mut buf).unwrap();
        let parsed = SessionSeed::read_from(&mut Cursor::new(buf)).unwrap();
        assert_eq!(parsed, seed);
    }

    #[test]
    fn assignment_round_trip() {
        let assignment = SeatAssignment {
            player_count: 4,
            seat: 2,
            team: 1,
        };
        let parsed = SeatAssignment::parse(&assignment.encode()).unwrap();
        assert_eq!(parsed, assignment);
    }

    #[test]
    fn profile_round_trip() {
        let profile = PeerProfile {
            team: 3,
            blob: r#"{"name":"ace"}"#.to_string(),
        };
        let mut buf = Vec::new();
        profile.write_to(&mut buf).unwrap();
        let parsed = PeerProfile::read_from(&mut Cursor::new(buf)).unwrap();
        assert_eq!(parsed, profile);
    }

    #[test]
    fn garbage_seed_is_malformed() {
        assert!(matches!(
            SessionSeed::parse("not numbers"),
            Err(NetError::Malformed(_))
        ));
        assert!(matches!(
            SessionSeed::parse("42"),
            Err(NetError::Malformed(_))
        ));
    }
}

//! Command providers — anything that yields exactly one command per tick.
//!
//! A provider may be a keyboard reader, an autonomous policy, or a canned
//! script; the simulation loop only sees the trait.

use gridlock_logic::command::Command;
use gridlock_logic::snapshot::FrameSnapshot;

pub trait CommandProvider {
    /// Produce this tick's command. `frame` is the previous published
    /// frame, when one exists.
    fn next_command(&mut self, frame: Option<&FrameSnapshot>) -> Command;
}

/// Stands still forever. The no-op baseline and the fallback provider.
pub struct IdleProvider;

impl CommandProvider for IdleProvider {
    fn next_command(&mut self, _frame: Option<&FrameSnapshot>) -> Command {
        Command::Idle
    }
}

/// Plays a fixed byte script, then idles. Handy for demos and for driving
/// two clients through a reproducible session.
pub struct ScriptedProvider {
    bytes: Vec<u8>,
    cursor: usize,
}

impl ScriptedProvider {
    pub fn new(script: &str) -> Self {
        Self {
            bytes: script.bytes().collect(),
            cursor: 0,
        }
    }
}

impl CommandProvider for ScriptedProvider {
    fn next_command(&mut self, _frame: Option<&FrameSnapshot>) -> Command {
        match self.bytes.get(self.cursor) {
            Some(byte) => {
                self.cursor += 1;
                Command::from_byte(*byte)
            }
            None => Command::Idle,
        }
    }
}

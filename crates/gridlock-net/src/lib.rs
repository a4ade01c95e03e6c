//! Wire protocol shared by the relay and the client.
//!
//! The protocol is deliberately tiny: NUL-terminated text for the setup
//! phase, single raw bytes for auth verdicts and per-tick commands. Nothing
//! here interprets game semantics — the relay forwards bytes, the logic
//! crate decodes them.

pub mod error;
pub mod frame;
pub mod setup;

pub use error::NetError;

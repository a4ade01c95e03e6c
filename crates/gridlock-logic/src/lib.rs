//! Deterministic lockstep simulation core for Gridlock.
//!
//! This crate contains all game logic that is independent of networking,
//! rendering, and the wall clock. Every replica in a session runs this code
//! against the same seed and the same per-tick command sets and must reach
//! byte-identical state after every tick; there is no authority to resolve
//! divergence after the fact.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`combat`]    | Bullet-hit resolution and kill/credit attribution |
//! | [`command`]   | One-byte per-tick command alphabet, total decoding |
//! | [`constants`] | Grid bounds, pool capacities, spawn cadence, tuning |
//! | [`entities`]  | Humans, zombies, bullets, character sheets |
//! | [`map`]       | Multi-floor cell grid, passability, destructibles |
//! | [`mapload`]   | JSON map configuration loading and validation |
//! | [`pools`]     | Fixed-capacity slot pools addressed by index |
//! | [`rng`]       | Seeded deterministic random number generator |
//! | [`snapshot`]  | Frame snapshots published to the renderer |
//! | [`tick`]      | The per-tick simulation state machine |

pub mod combat;
pub mod command;
pub mod constants;
pub mod entities;
pub mod map;
pub mod mapload;
pub mod pools;
pub mod rng;
pub mod snapshot;
pub mod tick;

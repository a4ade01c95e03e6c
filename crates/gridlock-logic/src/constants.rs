//! Game constants — grid bounds, pool capacities, spawn cadence, combat values.
//!
//! Plain integer constants with no runtime dependency. Every replica in a
//! session must compile against the same values; they are part of the
//! lockstep contract.

/// Number of vertically stacked floors in a map.
pub const FLOORS: usize = 4;
/// Rows per floor.
pub const ROWS: usize = 22;
/// Columns per floor.
pub const COLS: usize = 70;

/// Fixed pool capacities. Allocation scans are O(capacity), which is fine
/// at these sizes with single-digit allocations per tick.
pub mod pool_caps {
    pub const HUMANS: usize = 64;
    pub const ZOMBIES: usize = 2048;
    pub const BULLETS: usize = 4096;
    pub const PORTAL_PAIRS: usize = 128;
}

/// Destructible structure thresholds and decay.
pub mod structure {
    /// A placed barricade clears when its damage counter reaches this.
    pub const BARRICADE_THRESHOLD: u16 = 1100;
    /// A portal endpoint clears (and takes its partner with it) at this.
    pub const PORTAL_THRESHOLD: u16 = 1000;
    /// Passive radiation damage per open portal endpoint per tick.
    pub const PORTAL_RADIATION: u16 = 2;
}

/// Periodic spawn cadence. A roll fires when `tick % PERIOD` equals the
/// module's phase (0 or 1); the roll draws placement from the RNG and
/// silently no-ops on an occupied cell or a full pool.
pub mod spawn {
    pub const CHEST_PERIOD: u64 = 97;
    pub const ZOMBIE_PERIOD: u64 = 31;
    pub const WANDERER_PERIOD: u64 = 211;
}

/// Combat and consumable tuning.
pub mod combat {
    /// Zombie melee tiers: hp = BASE_HP + tier * HP_STEP, likewise damage.
    pub const ZOMBIE_BASE_HP: i32 = 40;
    pub const ZOMBIE_HP_STEP: i32 = 20;
    pub const ZOMBIE_BASE_DAMAGE: i32 = 10;
    pub const ZOMBIE_DAMAGE_STEP: i32 = 5;
    /// Denominator of the per-tick chance that an idle zombie wanders.
    pub const ZOMBIE_WANDER_DEN: u32 = 4;
    /// Health restored by drinking a potion.
    pub const POTION_HEAL: i32 = 50;
}

/// Team id reserved for unseated wanderer humans spawned by the map.
pub const NPC_TEAM: u8 = u8::MAX;

// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod cue;
pub mod economy;
pub mod judge;
pub mod runtime;
pub mod score;
pub mod session;
pub mod session_log;
pub mod store;
pub mod upgrade;

/// Nominal interval between session ticks.
pub const TICK_RATE_MS: u64 = 16;

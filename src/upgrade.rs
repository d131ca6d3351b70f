use strum_macros::Display;

use crate::judge::DEFAULT_PERFECT_WINDOW_MS;

/// Cost multiplier applied after each purchased level.
pub const COST_GROWTH: f64 = 1.5;

/// The three purchasable upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum UpgradeKind {
    Encore,
    Metronome,
    Setlist,
}

/// What an upgrade does at a given level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpgradeEffect {
    /// Multiplier on the per-track payout.
    PayoutBoost(f64),
    /// Width of the perfect window in milliseconds.
    PerfectWindowMs(f64),
    /// Tracks played per set.
    TracksPerSet(u32),
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 3] = [
        UpgradeKind::Encore,
        UpgradeKind::Metronome,
        UpgradeKind::Setlist,
    ];

    /// Stable identifier used as the persistence key.
    pub fn id(self) -> &'static str {
        match self {
            UpgradeKind::Encore => "encore",
            UpgradeKind::Metronome => "metronome",
            UpgradeKind::Setlist => "setlist",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        UpgradeKind::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub fn title(self) -> &'static str {
        match self {
            UpgradeKind::Encore => "Encore",
            UpgradeKind::Metronome => "Steady Metronome",
            UpgradeKind::Setlist => "Longer Setlist",
        }
    }

    pub fn blurb(self) -> &'static str {
        match self {
            UpgradeKind::Encore => "coin payout +10% per level",
            UpgradeKind::Metronome => "perfect window +10ms per level",
            UpgradeKind::Setlist => "+1 track per set per level",
        }
    }

    pub fn base_cost(self) -> i64 {
        match self {
            UpgradeKind::Encore => 500,
            UpgradeKind::Metronome => 1000,
            UpgradeKind::Setlist => 2000,
        }
    }

    pub fn effect(self, level: u32) -> UpgradeEffect {
        match self {
            UpgradeKind::Encore => UpgradeEffect::PayoutBoost(1.0 + level as f64 * 0.1),
            UpgradeKind::Metronome => {
                UpgradeEffect::PerfectWindowMs(DEFAULT_PERFECT_WINDOW_MS + level as f64 * 10.0)
            }
            UpgradeKind::Setlist => UpgradeEffect::TracksPerSet(1 + level),
        }
    }
}

/// Catalog entry with its purchased level and the price of the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpgradeState {
    pub kind: UpgradeKind,
    pub level: u32,
    pub current_cost: i64,
}

impl UpgradeState {
    /// Rebuild an entry from a persisted level. The cost is not stored;
    /// the growth curve is replayed from the base cost instead.
    pub fn at_level(kind: UpgradeKind, level: u32) -> Self {
        Self {
            kind,
            level,
            current_cost: cost_at_level(kind.base_cost(), level),
        }
    }

    /// The entry after buying one level.
    pub fn purchased(self) -> Self {
        Self {
            kind: self.kind,
            level: self.level + 1,
            current_cost: next_cost(self.current_cost),
        }
    }
}

/// Price of the level after one costing `current_cost`. Truncates, so
/// repeated growth compounds on the truncated value.
pub fn next_cost(current_cost: i64) -> i64 {
    (current_cost as f64 * COST_GROWTH) as i64
}

pub fn cost_at_level(base_cost: i64, level: u32) -> i64 {
    let mut cost = base_cost;
    for _ in 0..level {
        cost = next_cost(cost);
    }
    cost
}

pub fn can_afford(coins: i64, upgrade: &UpgradeState) -> bool {
    coins >= upgrade.current_cost
}

use strum_macros::Display;

/// Coin value of a single track before multipliers.
pub const BASE_TRACK_PRICE: i64 = 100;

/// Performance tier earned by a finished set, from its accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Quality {
    Excellent,
    Good,
    Normal,
    Poor,
}

impl Quality {
    /// Threshold cascade from the top tier down. Boundaries are inclusive.
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= 0.95 {
            Quality::Excellent
        } else if accuracy >= 0.80 {
            Quality::Good
        } else if accuracy >= 0.60 {
            Quality::Normal
        } else {
            Quality::Poor
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            Quality::Excellent => 1.5,
            Quality::Good => 1.2,
            Quality::Normal => 1.0,
            Quality::Poor => 0.5,
        }
    }
}

/// Coin payout for a finished set: per-track price scaled by the quality
/// multiplier, times the number of tracks played. Fractions are dropped.
pub fn payout(base_price: i64, accuracy: f64, tracks: u32) -> i64 {
    payout_with_boost(base_price, 1.0, accuracy, tracks)
}

/// Payout with an upgrade boost folded into the track price. Everything is
/// computed in floats and truncated once at the end.
pub fn payout_with_boost(base_price: i64, boost: f64, accuracy: f64, tracks: u32) -> i64 {
    let track_price = base_price as f64 * boost;
    (track_price * Quality::from_accuracy(accuracy).multiplier() * tracks as f64) as i64
}

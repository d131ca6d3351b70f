use crate::judge::{SequenceVerdict, TimingVerdict};
use crate::session::GameMode;

/// Judged-verdict tallies for one session, shaped by the active mode.
///
/// Score and accuracy are derived from the tallies rather than tracked
/// separately, so they can never drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictCounts {
    Sequence { correct: u32, wrong: u32 },
    Timing { perfect: u32, good: u32, miss: u32 },
}

impl VerdictCounts {
    pub fn for_mode(mode: GameMode) -> Self {
        match mode {
            GameMode::Sequence => VerdictCounts::Sequence {
                correct: 0,
                wrong: 0,
            },
            GameMode::Timing => VerdictCounts::Timing {
                perfect: 0,
                good: 0,
                miss: 0,
            },
        }
    }

    /// Total judged cues. Undispatched cues never count.
    pub fn total(&self) -> u32 {
        match *self {
            VerdictCounts::Sequence { correct, wrong } => correct + wrong,
            VerdictCounts::Timing {
                perfect,
                good,
                miss,
            } => perfect + good + miss,
        }
    }

    pub fn record_sequence(&mut self, verdict: SequenceVerdict) {
        if let VerdictCounts::Sequence { correct, wrong } = self {
            match verdict {
                SequenceVerdict::Correct => *correct += 1,
                SequenceVerdict::Wrong => *wrong += 1,
            }
        }
    }

    pub fn record_timing(&mut self, verdict: TimingVerdict) {
        if let VerdictCounts::Timing {
            perfect,
            good,
            miss,
        } = self
        {
            match verdict {
                TimingVerdict::Perfect => *perfect += 1,
                TimingVerdict::Good => *good += 1,
                TimingVerdict::Miss => *miss += 1,
            }
        }
    }

    /// Sum of per-cue points.
    pub fn score(&self) -> u32 {
        match *self {
            VerdictCounts::Sequence { correct, .. } => correct * SequenceVerdict::Correct.points(),
            VerdictCounts::Timing { perfect, good, .. } => {
                perfect * TimingVerdict::Perfect.points() + good * TimingVerdict::Good.points()
            }
        }
    }

    /// Fraction of attainable points actually earned, in `[0, 1]`.
    /// An empty tally reads as zero rather than dividing by it.
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        match *self {
            VerdictCounts::Sequence { correct, .. } => correct as f64 / total as f64,
            VerdictCounts::Timing { perfect, good, .. } => {
                let earned = perfect * TimingVerdict::Perfect.points()
                    + good * TimingVerdict::Good.points();
                let attainable = total * TimingVerdict::Perfect.points();
                earned as f64 / attainable as f64
            }
        }
    }
}

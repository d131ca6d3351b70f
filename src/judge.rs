use crate::cue::CueKind;

pub const DEFAULT_PERFECT_WINDOW_MS: f64 = 80.0;
pub const DEFAULT_GOOD_WINDOW_MS: f64 = 160.0;

/// Verdict for sequence-mode input, where only the action kind matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceVerdict {
    Correct,
    Wrong,
}

impl SequenceVerdict {
    pub fn points(self) -> u32 {
        match self {
            SequenceVerdict::Correct => 100,
            SequenceVerdict::Wrong => 0,
        }
    }
}

/// Verdict for timing-mode input, graded by distance from the cue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingVerdict {
    Perfect,
    Good,
    Miss,
}

impl TimingVerdict {
    pub fn points(self) -> u32 {
        match self {
            TimingVerdict::Perfect => 100,
            TimingVerdict::Good => 50,
            TimingVerdict::Miss => 0,
        }
    }

    pub fn breaks_combo(self) -> bool {
        matches!(self, TimingVerdict::Miss)
    }
}

/// Either mode's verdict, as recorded against a cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Sequence(SequenceVerdict),
    Timing(TimingVerdict),
}

impl Verdict {
    pub fn points(self) -> u32 {
        match self {
            Verdict::Sequence(v) => v.points(),
            Verdict::Timing(v) => v.points(),
        }
    }
}

/// One judged cue. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgementOutcome {
    pub cue_id: u32,
    pub verdict: Verdict,
}

/// Sequence-mode judgement: did the player perform the expected action?
pub fn judge_kind(input: CueKind, expected: CueKind) -> SequenceVerdict {
    if input == expected {
        SequenceVerdict::Correct
    } else {
        SequenceVerdict::Wrong
    }
}

/// Timing windows in milliseconds around a cue's scheduled time. Both
/// bounds are inclusive.
///
/// The perfect window widens with the metronome upgrade; the good window
/// is fixed by configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingWindows {
    pub perfect_ms: f64,
    pub good_ms: f64,
}

impl TimingWindows {
    pub fn new(perfect_ms: f64, good_ms: f64) -> Self {
        Self { perfect_ms, good_ms }
    }

    /// Grade an input by its signed offset from the cue time. Early and
    /// late inputs are treated alike.
    pub fn judge(&self, diff_ms: f64) -> TimingVerdict {
        let offset = diff_ms.abs();
        if offset <= self.perfect_ms {
            TimingVerdict::Perfect
        } else if offset <= self.good_ms {
            TimingVerdict::Good
        } else {
            TimingVerdict::Miss
        }
    }
}

impl Default for TimingWindows {
    fn default() -> Self {
        Self {
            perfect_ms: DEFAULT_PERFECT_WINDOW_MS,
            good_ms: DEFAULT_GOOD_WINDOW_MS,
        }
    }
}

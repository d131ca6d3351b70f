use strum_macros::Display;

use crate::session::GameMode;

/// Quiet period before the first cue so the player can get ready.
pub const LEAD_IN_SECS: f64 = 2.0;

/// No cue is scheduled within this buffer at the end of a set.
pub const TRAILING_BUFFER_SECS: f64 = 1.0;

/// Player action a cue asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum CueKind {
    Tap,
    Hold,
    FlickLeft,
    FlickRight,
}

/// A single timed cue in a chart.
///
/// `time` is seconds from session start at which the cue crosses the
/// judgement line. `lane` is carried for chart compatibility; the
/// single-lane layout never reads it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cue {
    pub id: u32,
    pub kind: CueKind,
    pub time: f64,
    pub lane: u8,
}

impl Cue {
    pub fn new(id: u32, kind: CueKind, time: f64) -> Self {
        Self {
            id,
            kind,
            time,
            lane: 0,
        }
    }
}

/// Action cycle for sequence-mode charts.
const SEQUENCE_CYCLE: [CueKind; 3] = [CueKind::Tap, CueKind::FlickLeft, CueKind::FlickRight];

/// Parameters for chart generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartConfig {
    pub duration_secs: f64,
    pub tempo_bpm: u32,
    pub mode: GameMode,
}

/// Produces the cue chart for a session. Generation is deterministic:
/// the same config always yields the same chart.
#[derive(Debug, Clone)]
pub struct ChartGenerator {
    config: ChartConfig,
}

impl ChartGenerator {
    pub fn new(config: ChartConfig) -> Self {
        Self { config }
    }

    /// Lay out one cue per beat, from the lead-in up to (not including)
    /// the trailing buffer.
    pub fn generate(&self) -> Vec<Cue> {
        let beat_interval = 60.0 / self.config.tempo_bpm as f64;
        let limit = self.config.duration_secs - TRAILING_BUFFER_SECS;

        let mut cues = Vec::new();
        let mut beat = LEAD_IN_SECS;
        let mut id: u32 = 0;
        while beat < limit {
            let kind = match self.config.mode {
                GameMode::Sequence => SEQUENCE_CYCLE[id as usize % SEQUENCE_CYCLE.len()],
                GameMode::Timing => self.timing_kind(id, beat, beat_interval, limit),
            };
            cues.push(Cue::new(id, kind, beat));
            id += 1;
            beat += beat_interval;
        }
        cues
    }

    /// Timing-mode pattern, keyed by cue index: every 8th cue is a hold,
    /// every 4th a flick with alternating direction, taps otherwise. A hold
    /// needs a full beat of room before the trailing buffer and degrades to
    /// a tap at the very end of the chart.
    fn timing_kind(&self, id: u32, beat: f64, beat_interval: f64, limit: f64) -> CueKind {
        if id % 8 == 7 {
            if beat + beat_interval <= limit {
                return CueKind::Hold;
            }
            return CueKind::Tap;
        }
        if id % 4 == 3 {
            if (id / 8) % 2 == 0 {
                CueKind::FlickLeft
            } else {
                CueKind::FlickRight
            }
        } else {
            CueKind::Tap
        }
    }
}

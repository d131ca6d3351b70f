use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::cue::{Cue, CueKind};
use crate::judge::{
    judge_kind, JudgementOutcome, SequenceVerdict, TimingVerdict, TimingWindows, Verdict,
};
use crate::score::VerdictCounts;

/// Unjudged cues further than this past their scheduled time are resolved
/// as misses on the next tick. Independent of the judgement windows.
pub const MISS_TOLERANCE_SECS: f64 = 0.2;

/// How far behind the current time a cue may trail and still be shown.
pub const ACTIVE_WINDOW_BEHIND_SECS: f64 = 0.5;

/// How far ahead of the current time a cue becomes visible.
pub const ACTIVE_WINDOW_AHEAD_SECS: f64 = 3.0;

/// Judging policy for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameMode {
    /// Perform the charted actions in order; only the action kind is judged.
    Sequence,
    /// Hit each cue on the beat; the offset from the cue time is judged.
    Timing,
}

/// Lifecycle of a session. `Ended` is terminal; only `reset` leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub duration_secs: f64,
    pub mode: GameMode,
    pub windows: TimingWindows,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: 25.0,
            mode: GameMode::Timing,
            windows: TimingWindows::default(),
        }
    }
}

/// Mode-specific bookkeeping, kept internal so callers can only observe
/// it through snapshots.
#[derive(Debug, Clone)]
enum Progress {
    Sequence {
        cursor: usize,
    },
    Timing {
        judged: HashSet<u32>,
        active: Vec<Cue>,
        combo: u32,
        max_combo: u32,
    },
}

impl Progress {
    fn for_mode(mode: GameMode) -> Self {
        match mode {
            GameMode::Sequence => Progress::Sequence { cursor: 0 },
            GameMode::Timing => Progress::Timing {
                judged: HashSet::new(),
                active: Vec::new(),
                combo: 0,
                max_combo: 0,
            },
        }
    }
}

/// Mode-specific slice of a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressView {
    Sequence {
        cursor: usize,
        expected: Option<Cue>,
    },
    Timing {
        active: Vec<Cue>,
        combo: u32,
    },
}

/// Immutable view of a session at one instant. Snapshots are built fresh
/// on every state change and never updated in place, so holding an old one
/// is always safe.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub elapsed: f64,
    pub is_active: bool,
    pub score: u32,
    pub counts: VerdictCounts,
    pub progress: ProgressView,
    pub last_outcome: Option<JudgementOutcome>,
}

/// Final reckoning of a finished session. `coins_earned` starts at zero;
/// the payout step fills it in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionResult {
    pub score: u32,
    pub accuracy: f64,
    pub counts: VerdictCounts,
    pub max_combo: u32,
    pub coins_earned: i64,
}

impl SessionResult {
    pub fn with_coins(self, coins_earned: i64) -> Self {
        Self {
            coins_earned,
            ..self
        }
    }
}

/// Drives one session from chart to result.
///
/// Time advances only through `tick`, with the delta supplied by the
/// caller, so a scripted sequence of ticks and inputs always replays to
/// the same result.
#[derive(Debug, Clone)]
pub struct SessionEngine {
    config: SessionConfig,
    cues: Vec<Cue>,
    elapsed: f64,
    phase: SessionPhase,
    counts: VerdictCounts,
    progress: Progress,
    last_outcome: Option<JudgementOutcome>,
}

impl SessionEngine {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            cues: Vec::new(),
            elapsed: 0.0,
            phase: SessionPhase::Idle,
            counts: VerdictCounts::for_mode(config.mode),
            progress: Progress::for_mode(config.mode),
            last_outcome: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn max_combo(&self) -> u32 {
        match &self.progress {
            Progress::Timing { max_combo, .. } => *max_combo,
            Progress::Sequence { .. } => 0,
        }
    }

    /// Load a chart and start the session. Cues are kept sorted by time so
    /// the judging order never depends on generation order.
    pub fn initialize(&mut self, mut cues: Vec<Cue>) -> SessionSnapshot {
        cues.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.cues = cues;
        self.elapsed = 0.0;
        self.phase = SessionPhase::Active;
        self.counts = VerdictCounts::for_mode(self.config.mode);
        self.progress = Progress::for_mode(self.config.mode);
        self.last_outcome = None;
        self.refresh_active_window();
        self.snapshot()
    }

    /// Advance session time. Ends the session once the clock runs out or,
    /// in sequence mode, once every cue has been consumed. Overdue cues are
    /// resolved before the visible window is recomputed, so a snapshot
    /// never shows a cue that has already lapsed.
    pub fn tick(&mut self, delta_secs: f64) -> SessionSnapshot {
        if self.phase != SessionPhase::Active {
            return self.snapshot();
        }
        self.elapsed += delta_secs.max(0.0);

        if self.elapsed >= self.config.duration_secs || self.chart_exhausted() {
            self.phase = SessionPhase::Ended;
            return self.snapshot();
        }

        if matches!(self.progress, Progress::Timing { .. }) {
            self.resolve_overdue_cues();
            self.refresh_active_window();
        }
        self.snapshot()
    }

    /// Sequence-mode input: judge the performed action against the cue at
    /// the cursor. The cursor advances only on a correct action. Outside an
    /// active sequence session this is a no-op.
    pub fn submit_kind(&mut self, input: CueKind) -> SessionSnapshot {
        if self.phase != SessionPhase::Active {
            return self.snapshot();
        }
        let expected = match &self.progress {
            Progress::Sequence { cursor } => self.cues.get(*cursor).copied(),
            Progress::Timing { .. } => None,
        };
        let Some(cue) = expected else {
            return self.snapshot();
        };
        let verdict = judge_kind(input, cue.kind);
        if verdict == SequenceVerdict::Correct {
            if let Progress::Sequence { cursor } = &mut self.progress {
                *cursor += 1;
            }
        }
        self.counts.record_sequence(verdict);
        self.last_outcome = Some(JudgementOutcome {
            cue_id: cue.id,
            verdict: Verdict::Sequence(verdict),
        });
        self.snapshot()
    }

    /// Timing-mode input: grade a tap on `cue_id` by its offset from the
    /// cue's scheduled time. Unknown ids and already-judged cues are
    /// no-ops, so a double-tap cannot score twice.
    pub fn submit_tap(&mut self, cue_id: u32, at_secs: f64) -> SessionSnapshot {
        if self.phase != SessionPhase::Active {
            return self.snapshot();
        }
        let Some(cue) = self.cues.iter().find(|cue| cue.id == cue_id).copied() else {
            return self.snapshot();
        };
        let diff_ms = (at_secs - cue.time) * 1000.0;
        let verdict = self.config.windows.judge(diff_ms);
        if self.record_timing(cue_id, verdict) {
            self.refresh_active_window();
        }
        self.snapshot()
    }

    /// Timing-mode input with the verdict already decided, for callers
    /// that grade offsets themselves. Same no-op rules as `submit_tap`.
    pub fn apply_verdict(&mut self, cue_id: u32, verdict: TimingVerdict) -> SessionSnapshot {
        if self.phase != SessionPhase::Active {
            return self.snapshot();
        }
        if self.record_timing(cue_id, verdict) {
            self.refresh_active_window();
        }
        self.snapshot()
    }

    /// Close the session and produce its result. Cues never judged are
    /// left out of the tallies rather than counted against the player.
    pub fn end_session(&mut self) -> SessionResult {
        self.phase = SessionPhase::Ended;
        SessionResult {
            score: self.counts.score(),
            accuracy: self.counts.accuracy(),
            counts: self.counts,
            max_combo: self.max_combo(),
            coins_earned: 0,
        }
    }

    /// Discard all progress and return to idle. Grants nothing.
    pub fn reset(&mut self) {
        self.cues.clear();
        self.elapsed = 0.0;
        self.phase = SessionPhase::Idle;
        self.counts = VerdictCounts::for_mode(self.config.mode);
        self.progress = Progress::for_mode(self.config.mode);
        self.last_outcome = None;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let progress = match &self.progress {
            Progress::Sequence { cursor } => ProgressView::Sequence {
                cursor: *cursor,
                expected: self.cues.get(*cursor).copied(),
            },
            Progress::Timing { active, combo, .. } => ProgressView::Timing {
                active: active.clone(),
                combo: *combo,
            },
        };
        SessionSnapshot {
            elapsed: self.elapsed,
            is_active: self.phase == SessionPhase::Active,
            score: self.counts.score(),
            counts: self.counts,
            progress,
            last_outcome: self.last_outcome,
        }
    }

    fn chart_exhausted(&self) -> bool {
        match &self.progress {
            Progress::Sequence { cursor } => *cursor >= self.cues.len(),
            Progress::Timing { .. } => false,
        }
    }

    /// Record a timing verdict for a cue. Returns false if the cue is
    /// unknown, already judged, or the session is not in timing mode.
    fn record_timing(&mut self, cue_id: u32, verdict: TimingVerdict) -> bool {
        if !self.cues.iter().any(|cue| cue.id == cue_id) {
            return false;
        }
        let Progress::Timing {
            judged,
            combo,
            max_combo,
            ..
        } = &mut self.progress
        else {
            return false;
        };
        if !judged.insert(cue_id) {
            return false;
        }
        if verdict.breaks_combo() {
            *combo = 0;
        } else {
            *combo += 1;
            *max_combo = (*max_combo).max(*combo);
        }
        self.counts.record_timing(verdict);
        self.last_outcome = Some(JudgementOutcome {
            cue_id,
            verdict: Verdict::Timing(verdict),
        });
        true
    }

    fn resolve_overdue_cues(&mut self) {
        let overdue: Vec<u32> = match &self.progress {
            Progress::Timing { judged, .. } => self
                .cues
                .iter()
                .filter(|cue| self.elapsed - cue.time > MISS_TOLERANCE_SECS)
                .filter(|cue| !judged.contains(&cue.id))
                .map(|cue| cue.id)
                .collect(),
            Progress::Sequence { .. } => return,
        };
        for cue_id in overdue {
            self.record_timing(cue_id, TimingVerdict::Miss);
        }
    }

    fn refresh_active_window(&mut self) {
        let elapsed = self.elapsed;
        let cues = &self.cues;
        if let Progress::Timing { judged, active, .. } = &mut self.progress {
            active.clear();
            active.extend(
                cues.iter()
                    .filter(|cue| {
                        cue.time >= elapsed - ACTIVE_WINDOW_BEHIND_SECS
                            && cue.time <= elapsed + ACTIVE_WINDOW_AHEAD_SECS
                            && !judged.contains(&cue.id)
                    })
                    .copied(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn engine(mode: GameMode, duration_secs: f64) -> SessionEngine {
        SessionEngine::new(SessionConfig {
            duration_secs,
            mode,
            windows: TimingWindows::default(),
        })
    }

    fn taps_at(times: &[f64]) -> Vec<Cue> {
        times
            .iter()
            .enumerate()
            .map(|(id, &time)| Cue::new(id as u32, CueKind::Tap, time))
            .collect()
    }

    fn active_ids(snapshot: &SessionSnapshot) -> Vec<u32> {
        match &snapshot.progress {
            ProgressView::Timing { active, .. } => active.iter().map(|cue| cue.id).collect(),
            ProgressView::Sequence { .. } => panic!("expected timing progress"),
        }
    }

    #[test]
    fn fresh_engine_is_idle_and_ignores_input() {
        let mut engine = engine(GameMode::Timing, 25.0);
        assert_eq!(engine.phase(), SessionPhase::Idle);
        let snapshot = engine.tick(1.0);
        assert!(!snapshot.is_active);
        assert_eq!(engine.elapsed(), 0.0);
        let snapshot = engine.submit_tap(0, 1.0);
        assert_eq!(snapshot.counts.total(), 0);
    }

    #[test]
    fn initialize_activates_and_sorts_the_chart() {
        let mut engine = engine(GameMode::Timing, 25.0);
        let cues = vec![
            Cue::new(0, CueKind::Tap, 4.0),
            Cue::new(1, CueKind::Tap, 2.0),
            Cue::new(2, CueKind::Tap, 3.0),
        ];
        let snapshot = engine.initialize(cues);
        assert!(snapshot.is_active);
        assert_eq!(engine.phase(), SessionPhase::Active);
        let times: Vec<f64> = engine.cues().iter().map(|cue| cue.time).collect();
        assert_eq!(times, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn tick_advances_elapsed_and_never_rewinds() {
        let mut engine = engine(GameMode::Timing, 25.0);
        engine.initialize(taps_at(&[2.0]));
        engine.tick(0.016);
        engine.tick(0.016);
        assert!((engine.elapsed() - 0.032).abs() < 1e-9);
        engine.tick(-5.0);
        assert!((engine.elapsed() - 0.032).abs() < 1e-9);
    }

    #[test]
    fn session_ends_when_the_clock_runs_out() {
        let mut engine = engine(GameMode::Timing, 10.0);
        engine.initialize(taps_at(&[2.0]));
        let snapshot = engine.tick(10.0);
        assert!(!snapshot.is_active);
        assert_eq!(engine.phase(), SessionPhase::Ended);
        // Terminal: further ticks change nothing.
        engine.tick(5.0);
        assert!((engine.elapsed() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn correct_sequence_input_scores_and_advances() {
        let mut engine = engine(GameMode::Sequence, 25.0);
        engine.initialize(vec![
            Cue::new(0, CueKind::Tap, 2.0),
            Cue::new(1, CueKind::FlickLeft, 2.5),
        ]);
        let snapshot = engine.submit_kind(CueKind::Tap);
        assert_eq!(snapshot.score, 100);
        assert_matches!(
            snapshot.progress,
            ProgressView::Sequence { cursor: 1, expected: Some(cue) } if cue.id == 1
        );
        assert_matches!(
            snapshot.last_outcome,
            Some(JudgementOutcome {
                cue_id: 0,
                verdict: Verdict::Sequence(SequenceVerdict::Correct),
            })
        );
    }

    #[test]
    fn wrong_sequence_input_holds_the_cursor() {
        let mut engine = engine(GameMode::Sequence, 25.0);
        engine.initialize(vec![
            Cue::new(0, CueKind::Tap, 2.0),
            Cue::new(1, CueKind::FlickLeft, 2.5),
        ]);
        let snapshot = engine.submit_kind(CueKind::FlickRight);
        assert_eq!(snapshot.score, 0);
        assert_matches!(
            snapshot.progress,
            ProgressView::Sequence { cursor: 0, expected: Some(cue) } if cue.id == 0
        );
        assert_eq!(
            snapshot.counts,
            VerdictCounts::Sequence {
                correct: 0,
                wrong: 1
            }
        );
        // The same cue can be retried.
        let snapshot = engine.submit_kind(CueKind::Tap);
        assert_eq!(snapshot.score, 100);
    }

    #[test]
    fn mixed_sequence_walk_settles_into_the_result() {
        let mut engine = engine(GameMode::Sequence, 25.0);
        engine.initialize(vec![
            Cue::new(0, CueKind::Tap, 2.0),
            Cue::new(1, CueKind::FlickLeft, 2.5),
            Cue::new(2, CueKind::Tap, 3.0),
        ]);
        engine.submit_kind(CueKind::Tap);
        engine.submit_kind(CueKind::FlickLeft);
        let snapshot = engine.submit_kind(CueKind::FlickRight);
        assert_eq!(snapshot.score, 200);
        assert_eq!(
            snapshot.counts,
            VerdictCounts::Sequence {
                correct: 2,
                wrong: 1
            }
        );
        let result = engine.end_session();
        assert_eq!(result.score, 200);
        assert!((result.accuracy - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn consuming_every_cue_ends_a_sequence_session() {
        let mut engine = engine(GameMode::Sequence, 25.0);
        engine.initialize(vec![
            Cue::new(0, CueKind::Tap, 2.0),
            Cue::new(1, CueKind::Tap, 2.5),
        ]);
        engine.submit_kind(CueKind::Tap);
        engine.submit_kind(CueKind::Tap);
        assert_eq!(engine.phase(), SessionPhase::Active);
        let snapshot = engine.tick(0.016);
        assert!(!snapshot.is_active);
        // Input after the end is discarded.
        let snapshot = engine.submit_kind(CueKind::Tap);
        assert_eq!(snapshot.counts.total(), 2);
    }

    #[test]
    fn tap_close_to_the_beat_is_perfect() {
        let mut engine = engine(GameMode::Timing, 25.0);
        engine.initialize(taps_at(&[2.0]));
        engine.tick(2.05);
        let snapshot = engine.submit_tap(0, engine.elapsed());
        assert_matches!(
            snapshot.last_outcome,
            Some(JudgementOutcome {
                cue_id: 0,
                verdict: Verdict::Timing(TimingVerdict::Perfect),
            })
        );
        assert_eq!(snapshot.score, 100);
    }

    #[test]
    fn tap_inside_the_good_window_is_good() {
        let mut engine = engine(GameMode::Timing, 25.0);
        engine.initialize(taps_at(&[2.0]));
        engine.tick(2.12);
        let snapshot = engine.submit_tap(0, engine.elapsed());
        assert_matches!(
            snapshot.last_outcome,
            Some(JudgementOutcome {
                cue_id: 0,
                verdict: Verdict::Timing(TimingVerdict::Good),
            })
        );
        assert_eq!(snapshot.score, 50);
    }

    #[test]
    fn judging_a_cue_twice_is_a_no_op() {
        let mut engine = engine(GameMode::Timing, 25.0);
        engine.initialize(taps_at(&[2.0, 2.5]));
        engine.tick(2.0);
        engine.submit_tap(0, 2.0);
        let snapshot = engine.submit_tap(0, 2.0);
        assert_eq!(snapshot.score, 100);
        assert_eq!(snapshot.counts.total(), 1);
        let snapshot = engine.apply_verdict(0, TimingVerdict::Miss);
        assert_eq!(snapshot.counts.total(), 1);
        assert_eq!(snapshot.score, 100);
    }

    #[test]
    fn unknown_cue_id_is_ignored() {
        let mut engine = engine(GameMode::Timing, 25.0);
        engine.initialize(taps_at(&[2.0]));
        engine.tick(2.0);
        let snapshot = engine.submit_tap(99, 2.0);
        assert_eq!(snapshot.counts.total(), 0);
    }

    #[test]
    fn overdue_cue_resolves_to_a_miss() {
        let mut engine = engine(GameMode::Timing, 25.0);
        engine.initialize(taps_at(&[2.0]));
        let snapshot = engine.tick(2.21);
        assert_matches!(
            snapshot.last_outcome,
            Some(JudgementOutcome {
                cue_id: 0,
                verdict: Verdict::Timing(TimingVerdict::Miss),
            })
        );
        assert_eq!(
            snapshot.counts,
            VerdictCounts::Timing {
                perfect: 0,
                good: 0,
                miss: 1
            }
        );
        // A late tap on the lapsed cue no longer counts.
        let snapshot = engine.submit_tap(0, engine.elapsed());
        assert_eq!(snapshot.counts.total(), 1);
    }

    #[test]
    fn cue_within_tolerance_is_not_missed_yet() {
        let mut engine = engine(GameMode::Timing, 25.0);
        engine.initialize(taps_at(&[2.0]));
        let snapshot = engine.tick(2.15);
        assert_eq!(snapshot.counts.total(), 0);
        assert_eq!(active_ids(&snapshot), vec![0]);
    }

    #[test]
    fn active_window_tracks_the_lookahead() {
        let mut engine = engine(GameMode::Timing, 25.0);
        engine.initialize(taps_at(&[5.0]));
        let snapshot = engine.tick(1.9);
        assert!(active_ids(&snapshot).is_empty());
        let snapshot = engine.tick(0.2);
        assert_eq!(active_ids(&snapshot), vec![0]);
    }

    #[test]
    fn judged_cues_leave_the_active_window() {
        let mut engine = engine(GameMode::Timing, 25.0);
        engine.initialize(taps_at(&[2.0, 2.5]));
        let snapshot = engine.tick(2.0);
        assert_eq!(active_ids(&snapshot), vec![0, 1]);
        let snapshot = engine.submit_tap(0, 2.0);
        assert_eq!(active_ids(&snapshot), vec![1]);
    }

    #[test]
    fn snapshots_are_detached_from_later_mutations() {
        let mut engine = engine(GameMode::Timing, 25.0);
        engine.initialize(taps_at(&[2.0]));
        let before = engine.tick(2.0);
        engine.submit_tap(0, 2.0);
        assert_eq!(active_ids(&before), vec![0]);
        assert_eq!(before.score, 0);
    }

    #[test]
    fn combo_grows_on_hits_and_resets_on_miss() {
        let mut engine = engine(GameMode::Timing, 25.0);
        engine.initialize(taps_at(&[2.0, 2.5, 3.0, 3.5]));
        engine.tick(2.0);
        engine.apply_verdict(0, TimingVerdict::Perfect);
        let snapshot = engine.apply_verdict(1, TimingVerdict::Good);
        assert_matches!(snapshot.progress, ProgressView::Timing { combo: 2, .. });
        let snapshot = engine.apply_verdict(2, TimingVerdict::Miss);
        assert_matches!(snapshot.progress, ProgressView::Timing { combo: 0, .. });
        let snapshot = engine.apply_verdict(3, TimingVerdict::Perfect);
        assert_matches!(snapshot.progress, ProgressView::Timing { combo: 1, .. });
        assert_eq!(engine.max_combo(), 2);
    }

    #[test]
    fn lapsing_a_cue_breaks_the_combo() {
        let mut engine = engine(GameMode::Timing, 25.0);
        engine.initialize(taps_at(&[2.0, 4.0]));
        engine.tick(2.0);
        let snapshot = engine.submit_tap(0, 2.0);
        assert_matches!(snapshot.progress, ProgressView::Timing { combo: 1, .. });
        let snapshot = engine.tick(2.3);
        assert_matches!(snapshot.progress, ProgressView::Timing { combo: 0, .. });
        assert_eq!(engine.max_combo(), 1);
    }

    #[test]
    fn score_never_decreases_over_a_session() {
        let mut engine = engine(GameMode::Timing, 25.0);
        engine.initialize(taps_at(&[2.0, 2.5, 3.0, 3.5, 4.0]));
        let mut last_score = 0;
        for step in 0..300 {
            let snapshot = engine.tick(0.016);
            assert!(snapshot.score >= last_score);
            last_score = snapshot.score;
            if step == 125 {
                let snapshot = engine.submit_tap(1, engine.elapsed());
                assert!(snapshot.score >= last_score);
                last_score = snapshot.score;
            }
        }
    }

    #[test]
    fn result_reflects_the_judged_tallies() {
        let mut engine = engine(GameMode::Timing, 60.0);
        let times: Vec<f64> = (0..20).map(|i| 2.0 + i as f64 * 0.5).collect();
        engine.initialize(taps_at(&times));
        engine.tick(0.016);
        for id in 0..10 {
            engine.apply_verdict(id, TimingVerdict::Perfect);
        }
        for id in 10..15 {
            engine.apply_verdict(id, TimingVerdict::Good);
        }
        for id in 15..20 {
            engine.apply_verdict(id, TimingVerdict::Miss);
        }
        let result = engine.end_session();
        assert_eq!(result.score, 1250);
        assert!((result.accuracy - 0.625).abs() < 1e-9);
        assert_eq!(
            result.counts,
            VerdictCounts::Timing {
                perfect: 10,
                good: 5,
                miss: 5
            }
        );
        assert_eq!(result.max_combo, 15);
        assert_eq!(result.coins_earned, 0);
    }

    #[test]
    fn unjudged_cues_stay_out_of_the_result() {
        let mut engine = engine(GameMode::Timing, 25.0);
        engine.initialize(taps_at(&[2.0, 10.0, 20.0]));
        engine.tick(2.0);
        engine.submit_tap(0, 2.0);
        let result = engine.end_session();
        assert_eq!(result.counts.total(), 1);
        assert_eq!(result.accuracy, 1.0);
    }

    #[test]
    fn ending_an_empty_session_is_zero_safe() {
        let mut engine = engine(GameMode::Timing, 25.0);
        engine.initialize(Vec::new());
        let result = engine.end_session();
        assert_eq!(result.score, 0);
        assert_eq!(result.accuracy, 0.0);
        assert_eq!(result.max_combo, 0);
    }

    #[test]
    fn reset_returns_to_idle_and_keeps_nothing() {
        let mut engine = engine(GameMode::Timing, 25.0);
        engine.initialize(taps_at(&[2.0]));
        engine.tick(2.0);
        engine.submit_tap(0, 2.0);
        engine.reset();
        assert_eq!(engine.phase(), SessionPhase::Idle);
        assert_eq!(engine.elapsed(), 0.0);
        assert!(engine.cues().is_empty());
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.counts.total(), 0);
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.last_outcome, None);
    }

    #[test]
    fn identical_scripts_replay_to_identical_results() {
        let script = |engine: &mut SessionEngine| {
            engine.initialize(taps_at(&[2.0, 2.5, 3.0]));
            for _ in 0..130 {
                engine.tick(0.016);
            }
            engine.submit_tap(0, engine.elapsed());
            for _ in 0..30 {
                engine.tick(0.016);
            }
            engine.submit_tap(1, engine.elapsed());
            for _ in 0..100 {
                engine.tick(0.016);
            }
            engine.end_session()
        };
        let mut first = engine(GameMode::Timing, 25.0);
        let mut second = engine(GameMode::Timing, 25.0);
        assert_eq!(script(&mut first), script(&mut second));
    }
}

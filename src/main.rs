mod ui;

use chrono::{DateTime, Local};
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::mpsc::Receiver,
    time::Duration,
};
use takt::{
    config::{Config, ConfigStore, FileConfigStore},
    cue::{ChartConfig, ChartGenerator, CueKind},
    economy::{self, Quality, BASE_TRACK_PRICE},
    judge::{TimingWindows, DEFAULT_PERFECT_WINDOW_MS},
    runtime::{CrosstermEventSource, DeltaClock, FixedTicker, Runner, TaktEvent},
    session::{
        GameMode, ProgressView, SessionConfig, SessionEngine, SessionResult, SessionSnapshot,
    },
    session_log::{SessionLog, SessionRecord},
    store::{GameStore, PersistedState, Repository},
    upgrade::{UpgradeEffect, UpgradeKind, UpgradeState},
    TICK_RATE_MS,
};

/// terminal rhythm game with beat-synced judgement and a persistent upgrade shop
#[derive(Parser, Debug, Clone)]
#[clap(version, about, long_about = None)]
pub struct Cli {
    /// length of a set in seconds
    #[clap(short = 'd', long)]
    duration_secs: Option<u32>,

    /// beats per minute driving cue spacing
    #[clap(short = 't', long)]
    tempo_bpm: Option<u32>,

    /// judgement mode used for new sets
    #[clap(short = 'm', long, value_enum)]
    mode: Option<CliMode>,

    /// use an alternate save database
    #[clap(long)]
    save_path: Option<PathBuf>,

    /// skip the shop and start a set immediately
    #[clap(long)]
    play: bool,

    /// wipe coins and upgrade levels, then exit
    #[clap(long)]
    reset_save: bool,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
pub enum CliMode {
    Sequence,
    Timing,
}

impl CliMode {
    fn as_mode(&self) -> GameMode {
        match self {
            CliMode::Sequence => GameMode::Sequence,
            CliMode::Timing => GameMode::Timing,
        }
    }
}

impl Cli {
    /// Layers command line overrides on top of the saved config.
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(secs) = self.duration_secs {
            config.duration_secs = secs;
        }
        if let Some(bpm) = self.tempo_bpm {
            config.tempo_bpm = bpm;
        }
        if let Some(mode) = self.mode {
            config.mode = mode.as_mode();
        }
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Shop,
    Playing,
    Results,
}

#[derive(Debug, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Quit,
}

pub struct App {
    pub state: AppState,
    pub config: Config,
    pub coins: i64,
    pub upgrades: Vec<UpgradeState>,
    pub last_played: Option<DateTime<Local>>,
    pub recent: Vec<SessionRecord>,
    pub engine: SessionEngine,
    pub snapshot: Option<SessionSnapshot>,
    pub active_mode: GameMode,
    pub result: Option<SessionResult>,
    pub quality: Option<Quality>,
    repository: Repository,
    session_log: SessionLog,
    clock: DeltaClock,
    state_rx: Receiver<PersistedState>,
}

impl App {
    pub fn new(
        config: Config,
        mut repository: Repository,
        session_log: SessionLog,
    ) -> Result<Self, Box<dyn Error>> {
        let state_rx = repository.subscribe();
        let initial = repository.state()?;
        let mode = config.mode;
        let mut app = Self {
            state: AppState::Shop,
            config,
            coins: 0,
            upgrades: Vec::new(),
            last_played: None,
            recent: Vec::new(),
            engine: SessionEngine::new(SessionConfig::default()),
            snapshot: None,
            active_mode: mode,
            result: None,
            quality: None,
            repository,
            session_log,
            clock: DeltaClock::new(),
            state_rx,
        };
        app.apply_state(&initial);
        app.refresh_history();
        Ok(app)
    }

    fn apply_state(&mut self, state: &PersistedState) {
        self.coins = state.coins;
        self.upgrades = UpgradeKind::ALL
            .into_iter()
            .map(|kind| UpgradeState::at_level(kind, state.level(kind)))
            .collect();
    }

    fn refresh_history(&mut self) {
        self.recent = self.session_log.recent(3);
        self.last_played = self.recent.first().map(|record| record.played_at);
    }

    /// Drains wallet updates pushed by the repository after grants and purchases.
    pub fn sync_wallet(&mut self) {
        while let Ok(state) = self.state_rx.try_recv() {
            self.apply_state(&state);
        }
    }

    fn level_of(&self, kind: UpgradeKind) -> u32 {
        self.upgrades
            .iter()
            .find(|upgrade| upgrade.kind == kind)
            .map(|upgrade| upgrade.level)
            .unwrap_or(0)
    }

    fn perfect_window_ms(&self) -> f64 {
        match UpgradeKind::Metronome.effect(self.level_of(UpgradeKind::Metronome)) {
            UpgradeEffect::PerfectWindowMs(ms) => ms,
            _ => DEFAULT_PERFECT_WINDOW_MS,
        }
    }

    pub fn start_set(&mut self, mode: GameMode) {
        let session_config = SessionConfig {
            duration_secs: self.config.duration_secs as f64,
            mode,
            windows: TimingWindows::new(self.perfect_window_ms(), self.config.good_window_ms),
        };
        let chart = ChartGenerator::new(ChartConfig {
            duration_secs: session_config.duration_secs,
            tempo_bpm: self.config.tempo_bpm,
            mode,
        })
        .generate();
        self.engine = SessionEngine::new(session_config);
        self.snapshot = Some(self.engine.initialize(chart));
        self.active_mode = mode;
        self.result = None;
        self.quality = None;
        self.clock = DeltaClock::new();
        self.state = AppState::Playing;
    }

    /// Advances the set by the real time elapsed since the last tick.
    /// Returns whether the screen needs a redraw.
    pub fn on_tick(&mut self) -> Result<bool, Box<dyn Error>> {
        self.sync_wallet();
        if self.state != AppState::Playing {
            return Ok(false);
        }
        let delta = self.clock.delta_secs();
        let snapshot = self.engine.tick(delta);
        let finished = !snapshot.is_active;
        self.snapshot = Some(snapshot);
        if finished {
            self.finish_set()?;
        }
        Ok(true)
    }

    /// Settles a finished set: reads upgrade effects once, credits the payout
    /// in a single write, and appends a history row.
    pub fn finish_set(&mut self) -> Result<(), Box<dyn Error>> {
        let result = self.engine.end_session();
        let state = self.repository.state()?;
        let boost = match UpgradeKind::Encore.effect(state.level(UpgradeKind::Encore)) {
            UpgradeEffect::PayoutBoost(boost) => boost,
            _ => 1.0,
        };
        let tracks = match UpgradeKind::Setlist.effect(state.level(UpgradeKind::Setlist)) {
            UpgradeEffect::TracksPerSet(tracks) => tracks,
            _ => 1,
        };
        let coins = economy::payout_with_boost(BASE_TRACK_PRICE, boost, result.accuracy, tracks);
        let result = result.with_coins(coins);
        self.repository.grant_reward(coins)?;
        let record = SessionRecord::from_result(
            &result,
            self.active_mode,
            self.config.duration_secs as f64,
            self.config.tempo_bpm,
        );
        let _ = self.session_log.append(&record);
        self.quality = Some(Quality::from_accuracy(result.accuracy));
        self.result = Some(result);
        self.snapshot = None;
        self.state = AppState::Results;
        self.sync_wallet();
        self.refresh_history();
        Ok(())
    }

    /// Bails out of a running set. Nothing is scored or paid.
    pub fn abandon_set(&mut self) {
        self.engine.reset();
        self.snapshot = None;
        self.state = AppState::Shop;
    }

    pub fn buy(&mut self, slot: usize) -> Result<(), Box<dyn Error>> {
        if let Some(upgrade) = self.upgrades.get(slot).copied() {
            if self.repository.purchase(upgrade)? {
                self.sync_wallet();
            }
        }
        Ok(())
    }

    pub fn handle_play_key(&mut self, kind: CueKind) {
        if self.state != AppState::Playing {
            return;
        }
        let snapshot = match self.active_mode {
            GameMode::Sequence => self.engine.submit_kind(kind),
            GameMode::Timing => {
                let target = match self.snapshot.as_ref().map(|snapshot| &snapshot.progress) {
                    Some(ProgressView::Timing { active, .. }) => active
                        .iter()
                        .find(|cue| cue.kind == kind)
                        .map(|cue| cue.id),
                    _ => None,
                };
                match target {
                    Some(cue_id) => self.engine.submit_tap(cue_id, self.engine.elapsed()),
                    None => return,
                }
            }
        };
        self.snapshot = Some(snapshot);
    }
}

fn key_to_kind(code: KeyCode) -> Option<CueKind> {
    match code {
        KeyCode::Char(' ') => Some(CueKind::Tap),
        KeyCode::Up => Some(CueKind::Hold),
        KeyCode::Left => Some(CueKind::FlickLeft),
        KeyCode::Right => Some(CueKind::FlickRight),
        _ => None,
    }
}

fn handle_key(app: &mut App, key: KeyEvent) -> Result<KeyOutcome, Box<dyn Error>> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Ok(KeyOutcome::Quit);
    }
    match app.state {
        AppState::Shop => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Ok(KeyOutcome::Quit),
            KeyCode::Enter => app.start_set(app.config.mode),
            KeyCode::Char('t') => app.start_set(GameMode::Timing),
            KeyCode::Char('s') => app.start_set(GameMode::Sequence),
            KeyCode::Char(c @ '1'..='3') => app.buy(c as usize - '1' as usize)?,
            _ => {}
        },
        AppState::Playing => match key.code {
            KeyCode::Esc => app.abandon_set(),
            code => {
                if let Some(kind) = key_to_kind(code) {
                    app.handle_play_key(kind);
                }
            }
        },
        AppState::Results => match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Ok(KeyOutcome::Quit),
            KeyCode::Char('r') => app.start_set(app.active_mode),
            KeyCode::Char('s') | KeyCode::Enter => app.state = AppState::Shop,
            _ => {}
        },
    }
    Ok(KeyOutcome::Continue)
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            TaktEvent::Tick => {
                if app.on_tick()? {
                    terminal.draw(|f| ui(app, f))?;
                }
            }
            TaktEvent::Resize => {
                terminal.draw(|f| ui(app, f))?;
            }
            TaktEvent::Key(key) => {
                if handle_key(app, key)? == KeyOutcome::Quit {
                    break;
                }
                terminal.draw(|f| ui(app, f))?;
            }
        }
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = match &cli.save_path {
        Some(path) => GameStore::open(path)?,
        None => GameStore::new()?,
    };
    let mut repository = Repository::new(store);

    if cli.reset_save {
        repository.reset_save()?;
        println!("save wiped: coins and upgrades are back to zero");
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    let config = cli.apply_to(config_store.load());
    let _ = config_store.save(&config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, repository, SessionLog::new())?;
    if cli.play {
        app.start_set(app.config.mode);
    }
    let res = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

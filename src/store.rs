use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};

use rusqlite::{params, Connection, Result};

use crate::app_dirs::AppDirs;
use crate::upgrade::{can_afford, UpgradeKind, UpgradeState};

const COINS_KEY: &str = "coins";

/// Durable game state: the coin balance and each upgrade's level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersistedState {
    pub coins: i64,
    pub levels: HashMap<UpgradeKind, u32>,
}

impl PersistedState {
    pub fn level(&self, kind: UpgradeKind) -> u32 {
        self.levels.get(&kind).copied().unwrap_or(0)
    }
}

/// SQLite-backed save file. All values live in one key/value table so a
/// single read returns the whole state.
#[derive(Debug)]
pub struct GameStore {
    conn: Connection,
}

impl GameStore {
    /// Open the save file at its default location, creating it if needed.
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::save_path().unwrap_or_else(|| PathBuf::from("takt_save.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(path)?;
        Self::bootstrap(&conn)?;
        Ok(GameStore { conn })
    }

    /// Throwaway store for tests and dry runs.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::bootstrap(&conn)?;
        Ok(GameStore { conn })
    }

    fn bootstrap(conn: &Connection) -> Result<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS save_state (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            )
            "#,
            [],
        )?;
        Ok(())
    }

    /// Read the full saved state. Missing keys fall back to zero and keys
    /// that no longer map to a known upgrade are skipped.
    pub fn read_state(&self) -> Result<PersistedState> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM save_state")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut state = PersistedState::default();
        for row in rows {
            let (key, value) = row?;
            if key == COINS_KEY {
                state.coins = value;
            } else if let Some(kind) = UpgradeKind::from_id(&key) {
                state.levels.insert(kind, value.max(0) as u32);
            }
        }
        Ok(state)
    }

    /// Adjust the coin balance by `delta` in a single statement, so
    /// concurrent adjustments cannot lose an update. Spends are negative
    /// deltas.
    pub fn add_coins(&self, delta: i64) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO save_state (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = value + ?2
            "#,
            params![COINS_KEY, delta],
        )?;
        Ok(())
    }

    /// Store an upgrade's level. Ids that match no known upgrade are
    /// ignored rather than written.
    pub fn set_upgrade_level(&self, id: &str, level: u32) -> Result<()> {
        if UpgradeKind::from_id(id).is_none() {
            return Ok(());
        }
        self.conn.execute(
            r#"
            INSERT INTO save_state (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = ?2
            "#,
            params![id, level],
        )?;
        Ok(())
    }

    /// Wipe the save. Meant for the reset flag, not for gameplay.
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM save_state", [])?;
        Ok(())
    }
}

/// Mediates between game flows and the save file. Every mutation goes
/// through here and fans a fresh `PersistedState` out to subscribers, so
/// screens observe the save instead of re-reading it.
pub struct Repository {
    store: GameStore,
    subscribers: Vec<Sender<PersistedState>>,
}

impl Repository {
    pub fn new(store: GameStore) -> Self {
        Self {
            store,
            subscribers: Vec::new(),
        }
    }

    pub fn state(&self) -> Result<PersistedState> {
        self.store.read_state()
    }

    /// Register an observer. The channel receives one state per mutation,
    /// starting with the next one.
    pub fn subscribe(&mut self) -> Receiver<PersistedState> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Credit a finished set's payout.
    pub fn grant_reward(&mut self, coins: i64) -> Result<PersistedState> {
        self.store.add_coins(coins)?;
        self.broadcast()
    }

    /// Buy the next level of an upgrade. Returns false, changing nothing,
    /// when the balance does not cover the current cost.
    pub fn purchase(&mut self, upgrade: UpgradeState) -> Result<bool> {
        let state = self.store.read_state()?;
        if !can_afford(state.coins, &upgrade) {
            return Ok(false);
        }
        self.store.add_coins(-upgrade.current_cost)?;
        self.store
            .set_upgrade_level(upgrade.kind.id(), upgrade.level + 1)?;
        self.broadcast()?;
        Ok(true)
    }

    /// Wipe the save and tell everyone.
    pub fn reset_save(&mut self) -> Result<PersistedState> {
        self.store.clear_all()?;
        self.broadcast()
    }

    fn broadcast(&mut self) -> Result<PersistedState> {
        let state = self.store.read_state()?;
        self.subscribers
            .retain(|tx| tx.send(state.clone()).is_ok());
        Ok(state)
    }
}

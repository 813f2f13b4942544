//! SQLite ledger
//!
//! All statements are parameterized. A committed match updates both players
//! and inserts the history row inside one transaction.

use super::{expected_games_before, ApplyMatch, HistoryStore, MatchLedger, PlayerStore};
use crate::error::{LeaderboardError, Result};
use crate::types::{AppliedResult, GameResult, PlayerRecord};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

const PLAYER_COLUMNS: &str = "id, name, rating, games_played, wins, losses, draws";
const GAME_COLUMNS: &str = "id, timestamp, player1, player2, winner";

/// SQLite-backed player and history storage
#[derive(Debug)]
pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    /// Open (or create) the database file and ensure the schema exists
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(unavailable)?;
        conn.busy_timeout(busy_timeout).map_err(unavailable)?;
        info!("Opened SQLite ledger at {}", path.display());
        Self::with_connection(conn)
    }

    /// Private in-memory database, mainly for tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(unavailable)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(include_str!("schema.sql"))
            .map_err(unavailable)?;
        debug!("SQLite schema ready");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| {
            LeaderboardError::StoreUnavailable {
                message: "Failed to acquire database connection lock".to_string(),
            }
            .into()
        })
    }
}

fn unavailable(err: rusqlite::Error) -> anyhow::Error {
    LeaderboardError::StoreUnavailable {
        message: err.to_string(),
    }
    .into()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}

fn parse_player_row(row: &Row) -> rusqlite::Result<PlayerRecord> {
    Ok(PlayerRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        rating: row.get(2)?,
        games_played: row.get(3)?,
        wins: row.get(4)?,
        losses: row.get(5)?,
        draws: row.get(6)?,
    })
}

fn parse_game_row(row: &Row) -> rusqlite::Result<GameResult> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(GameResult {
        id,
        timestamp: row.get(1)?,
        player1: row.get(2)?,
        player2: row.get(3)?,
        winner: row.get(4)?,
    })
}

fn insert_game(conn: &Connection, game: &GameResult) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO game_history (id, timestamp, player1, player2, winner) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            game.id.to_string(),
            game.timestamp,
            game.player1,
            game.player2,
            game.winner
        ],
    )
}

fn select_player(conn: &Connection, name: &str) -> Result<PlayerRecord> {
    let sql = format!("SELECT {} FROM players WHERE name = ?1", PLAYER_COLUMNS);

    conn.query_row(&sql, params![name], parse_player_row)
        .optional()
        .map_err(unavailable)?
        .ok_or_else(|| {
            LeaderboardError::UnknownPlayer {
                name: name.to_string(),
            }
            .into()
        })
}

/// Write both players and the game. Each UPDATE only matches a row that still
/// has the pre-match `games_played`; the caller owns the transaction.
fn write_match(conn: &Connection, applied: &AppliedResult) -> Result<()> {
    for player in applied.players() {
        let games_before = expected_games_before(player)?;
        let updated = conn
            .execute(
                "UPDATE players
                 SET rating = ?1, games_played = ?2, wins = ?3, losses = ?4, draws = ?5
                 WHERE name = ?6 AND games_played = ?7",
                params![
                    player.rating,
                    player.games_played,
                    player.wins,
                    player.losses,
                    player.draws,
                    player.name,
                    games_before
                ],
            )
            .map_err(unavailable)?;

        if updated == 0 {
            // Missing or moved on; either way the transaction is rolled back
            select_player(conn, &player.name)?;
            return Err(LeaderboardError::StaleRecord {
                name: player.name.clone(),
            }
            .into());
        }
    }

    insert_game(conn, &applied.game).map_err(unavailable)?;
    Ok(())
}

impl PlayerStore for SqliteLedger {
    fn get_by_name(&self, name: &str) -> Result<PlayerRecord> {
        let conn = self.connection()?;
        select_player(&conn, name)
    }

    fn create(&self, name: &str, rating: f64) -> Result<PlayerRecord> {
        let conn = self.connection()?;
        let sql = format!(
            "INSERT INTO players (name, rating) VALUES (?1, ?2) RETURNING {}",
            PLAYER_COLUMNS
        );

        conn.query_row(&sql, params![name, rating], parse_player_row)
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    anyhow::Error::from(LeaderboardError::DuplicatePlayer {
                        name: name.to_string(),
                    })
                } else {
                    unavailable(e)
                }
            })
    }

    fn upsert(&self, record: PlayerRecord) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(unavailable)?;

        let owner: Option<String> = tx
            .query_row(
                "SELECT name FROM players WHERE id = ?1",
                params![record.id],
                |row| row.get(0),
            )
            .optional()
            .map_err(unavailable)?;
        if let Some(owner) = owner.filter(|owner| *owner != record.name) {
            return Err(LeaderboardError::InvalidRequest {
                reason: format!("Player id {} already belongs to '{}'", record.id, owner),
            }
            .into());
        }

        tx.execute(
            "INSERT INTO players (id, name, rating, games_played, wins, losses, draws)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(name) DO UPDATE SET
                rating = excluded.rating,
                games_played = excluded.games_played,
                wins = excluded.wins,
                losses = excluded.losses,
                draws = excluded.draws",
            params![
                record.id,
                record.name,
                record.rating,
                record.games_played,
                record.wins,
                record.losses,
                record.draws
            ],
        )
        .map_err(unavailable)?;
        tx.commit().map_err(unavailable)?;

        Ok(())
    }

    fn delete(&self, name: &str) -> Result<bool> {
        let conn = self.connection()?;
        let removed = conn
            .execute("DELETE FROM players WHERE name = ?1", params![name])
            .map_err(unavailable)?;
        Ok(removed > 0)
    }

    fn list_all(&self) -> Result<Vec<PlayerRecord>> {
        let conn = self.connection()?;
        let sql = format!("SELECT {} FROM players", PLAYER_COLUMNS);

        let mut stmt = conn.prepare(&sql).map_err(unavailable)?;
        let rows = stmt
            .query_map([], parse_player_row)
            .map_err(unavailable)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(unavailable)?;

        Ok(rows)
    }
}

impl HistoryStore for SqliteLedger {
    fn append(&self, result: GameResult) -> Result<()> {
        let conn = self.connection()?;
        insert_game(&conn, &result).map_err(unavailable)?;
        Ok(())
    }

    fn recent(&self, n: usize) -> Result<Vec<GameResult>> {
        let conn = self.connection()?;
        let sql = format!(
            "SELECT {} FROM game_history ORDER BY seq DESC LIMIT ?1",
            GAME_COLUMNS
        );
        let limit = i64::try_from(n).unwrap_or(i64::MAX);

        let mut stmt = conn.prepare(&sql).map_err(unavailable)?;
        let rows = stmt
            .query_map(params![limit], parse_game_row)
            .map_err(unavailable)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(unavailable)?;

        Ok(rows)
    }
}

impl MatchLedger for SqliteLedger {
    fn commit_match(&self, applied: &AppliedResult) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(unavailable)?;

        write_match(&tx, applied)?;
        tx.commit().map_err(unavailable)?;

        Ok(())
    }

    /// Runs inside one `BEGIN IMMEDIATE` transaction, so other connections to
    /// the same database file wait (up to the busy timeout) instead of
    /// interleaving their own read-modify-write.
    fn record_match(
        &self,
        name_a: &str,
        name_b: &str,
        apply: &ApplyMatch<'_>,
    ) -> Result<AppliedResult> {
        let mut conn = self.connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(unavailable)?;

        let current_a = select_player(&tx, name_a)?;
        let current_b = select_player(&tx, name_b)?;
        let applied = apply(&current_a, &current_b)?;
        write_match(&tx, &applied)?;
        tx.commit().map_err(unavailable)?;

        Ok(applied)
    }
}

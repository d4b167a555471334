//! chara-sqlx: SQLite-backed [`RecordStore`].
//!
//! ```rust,no_run
//! # async fn run() -> anyhow::Result<()> {
//! use chara_sqlx::SqliteRecordStore;
//!
//! let records = SqliteRecordStore::connect("sqlite://characters.db").await?;
//! # Ok(())
//! # }
//! ```
//!
//! Ids come from `AUTOINCREMENT`, so a deleted id is never handed out again.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chara_core::{Character, CharacterId, CharacterPatch, NewCharacter, RecordStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, Pool, Sqlite};
use tracing::info;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS characters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    age INTEGER NOT NULL,
    image_ref TEXT NOT NULL DEFAULT ''
)";

#[derive(Debug, FromRow)]
struct CharacterRow {
    id: i64,
    name: String,
    age: i32,
    image_ref: String,
}

impl From<CharacterRow> for Character {
    fn from(row: CharacterRow) -> Self {
        Character {
            id: row.id,
            name: row.name,
            age: row.age,
            image_ref: row.image_ref,
        }
    }
}

#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: Pool<Sqlite>,
}

impl SqliteRecordStore {
    /// Open (creating if missing) the database at `url` and run the migration.
    pub async fn connect(url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url: {url}"))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        // Every in-memory connection is its own database, so keep exactly one alive.
        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(opts)
            .await
            .with_context(|| format!("failed to open database: {url}"))?;

        let store = Self::from_pool(pool);
        store.migrate().await?;
        info!(url, "sqlite record store ready");
        Ok(store)
    }

    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .context("failed to create characters table")?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn find(&self, id: CharacterId) -> Result<Option<Character>> {
        let row: Option<CharacterRow> =
            sqlx::query_as("SELECT id, name, age, image_ref FROM characters WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Character::from))
    }

    async fn list(&self) -> Result<Vec<Character>> {
        let rows: Vec<CharacterRow> =
            sqlx::query_as("SELECT id, name, age, image_ref FROM characters ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Character::from).collect())
    }

    async fn insert(&self, data: NewCharacter) -> Result<Character> {
        let row: CharacterRow = sqlx::query_as(
            "INSERT INTO characters (name, age, image_ref) VALUES (?, ?, ?)
             RETURNING id, name, age, image_ref",
        )
        .bind(data.name)
        .bind(data.age)
        .bind(data.image_ref)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update(&self, id: CharacterId, patch: CharacterPatch) -> Result<Option<Character>> {
        let row: Option<CharacterRow> = sqlx::query_as(
            "UPDATE characters
             SET name = COALESCE(?, name),
                 age = COALESCE(?, age),
                 image_ref = COALESCE(?, image_ref)
             WHERE id = ?
             RETURNING id, name, age, image_ref",
        )
        .bind(patch.name)
        .bind(patch.age)
        .bind(patch.image_ref)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Character::from))
    }

    async fn remove(&self, id: CharacterId) -> Result<bool> {
        let done = sqlx::query("DELETE FROM characters WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}

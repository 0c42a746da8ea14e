//! MBTiles tile store on SQLite.
//!
//! Tile images are content-addressed: the `images` table is keyed by the
//! SHA-1 of the PNG bytes and `map` points each tile coordinate at a hash, so
//! identical tiles (blank ocean, uniform land cover) are stored once. The
//! `tiles` view joins the two into the layout MBTiles readers expect.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sha1::{Digest, Sha1};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Connection, Sqlite};
use tile_common::TileId;
use tracing::{debug, info, trace, warn};

use crate::{Metadata, Result, StorageError};

/// File extension required for output paths.
pub const EXTENSION: &str = "mbtiles";

const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Schema with de-duplicated tile images.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS metadata (name text, value text);
CREATE UNIQUE INDEX IF NOT EXISTS name ON metadata (name);

CREATE TABLE IF NOT EXISTS map (
    zoom_level INTEGER,
    tile_column INTEGER,
    tile_row INTEGER,
    tile_id TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS map_index ON map (zoom_level, tile_column, tile_row);

CREATE TABLE IF NOT EXISTS images (tile_data blob, tile_id text);
CREATE UNIQUE INDEX IF NOT EXISTS images_id ON images (tile_id);

CREATE VIEW IF NOT EXISTS tiles AS
    SELECT zoom_level, tile_column, tile_row, tile_data
    FROM map JOIN images ON images.tile_id = map.tile_id
"#;

/// Content hash used as the `tile_id` of an image.
pub fn tile_hash(data: &[u8]) -> String {
    format!("{:x}", Sha1::digest(data))
}

/// One row of the `map` table with the row number flipped back to XYZ.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TileEntry {
    pub tile: TileId,
    pub tile_id: String,
}

/// An MBTiles file opened for writing.
pub struct TileStore {
    path: PathBuf,
    pool: SqlitePool,
}

/// A pooled connection owned by one worker for its whole life.
pub struct TileConnection {
    conn: PoolConnection<Sqlite>,
}

impl TileStore {
    /// Create a new store at `path`, replacing any existing file.
    ///
    /// The pool holds one connection per worker plus one for setup and
    /// finalization.
    pub async fn create(path: &Path, workers: usize) -> Result<Self> {
        if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
            return Err(StorageError::invalid_path(path, "must end in .mbtiles"));
        }

        remove_store_files(path).await?;

        let pool = initialize(path, workers, SCHEMA_SQL).await?;

        debug!(path = %path.display(), workers, "Created tile store");

        Ok(Self {
            path: path.to_path_buf(),
            pool,
        })
    }

    /// Open an existing store, for reading back what was written.
    pub async fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StorageError::invalid_path(path, "does not exist"));
        }
        let pool = connect(path, 1, false).await?;
        Ok(Self {
            path: path.to_path_buf(),
            pool,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write all metadata rows in one transaction.
    pub async fn write_metadata(&self, metadata: &Metadata) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for (name, value) in metadata.rows() {
            sqlx::query("INSERT OR REPLACE INTO metadata (name, value) VALUES (?, ?)")
                .bind(name)
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        info!(
            name = %metadata.name,
            minzoom = metadata.minzoom,
            maxzoom = metadata.maxzoom,
            "Wrote tileset metadata"
        );
        Ok(())
    }

    /// Hand out a connection for a worker.
    pub async fn acquire(&self) -> Result<TileConnection> {
        let conn = self.pool.acquire().await?;
        Ok(TileConnection { conn })
    }

    /// Build the lookup index on `map(tile_id)` and refresh planner stats.
    pub async fn finalize(&self) -> Result<()> {
        sqlx::query("CREATE INDEX IF NOT EXISTS map_tile_id ON map (tile_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("ANALYZE").execute(&self.pool).await?;

        debug!(path = %self.path.display(), "Finalized tile store");
        Ok(())
    }

    /// Flush the write-ahead log into the database file and close the pool.
    pub async fn close(self) -> Result<()> {
        let checkpoint = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await;
        self.pool.close().await;
        checkpoint?;

        debug!(path = %self.path.display(), "Closed tile store");
        Ok(())
    }

    /// Number of tile coordinates written.
    pub async fn tile_count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM map")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    /// Number of distinct images stored.
    pub async fn image_count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM images")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    /// Image bytes for an XYZ tile, if one was written.
    pub async fn read_tile(&self, tile: TileId) -> Result<Option<Vec<u8>>> {
        let data: Option<Vec<u8>> = sqlx::query_scalar(
            "SELECT tile_data FROM tiles \
             WHERE zoom_level = ? AND tile_column = ? AND tile_row = ?",
        )
        .bind(tile.zoom as i64)
        .bind(tile.x as i64)
        .bind(tile.flipped_y() as i64)
        .fetch_optional(&self.pool)
        .await?;
        Ok(data)
    }

    /// All metadata rows by name.
    pub async fn read_metadata(&self) -> Result<BTreeMap<String, String>> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT name, value FROM metadata")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }

    /// Every map row, ordered by tile.
    pub async fn list_tiles(&self) -> Result<Vec<TileEntry>> {
        let rows: Vec<(i64, i64, i64, String)> = sqlx::query_as(
            "SELECT zoom_level, tile_column, tile_row, tile_id FROM map \
             ORDER BY zoom_level, tile_column, tile_row",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut entries = rows
            .into_iter()
            .map(|(zoom, x, row, tile_id)| {
                Ok(TileEntry {
                    tile: map_row_tile(zoom, x, row)?,
                    tile_id,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }
}

impl TileConnection {
    /// Store one encoded tile.
    ///
    /// The image row and the map row are upserted in one transaction; a
    /// failure rolls both back and is reported with the tile's identity.
    pub async fn write_tile(&mut self, tile: TileId, data: &[u8]) -> Result<()> {
        let tile_id = tile_hash(data);
        let row = tile.flipped_y();

        let result: std::result::Result<(), sqlx::Error> = async {
            let mut tx = self.conn.begin().await?;
            sqlx::query("INSERT OR REPLACE INTO images (tile_id, tile_data) VALUES (?, ?)")
                .bind(&tile_id)
                .bind(data)
                .execute(&mut *tx)
                .await?;
            sqlx::query(
                "INSERT OR REPLACE INTO map (zoom_level, tile_column, tile_row, tile_id) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(tile.zoom as i64)
            .bind(tile.x as i64)
            .bind(row as i64)
            .bind(&tile_id)
            .execute(&mut *tx)
            .await?;
            tx.commit().await
        }
        .await;

        result.map_err(|source| StorageError::TileWrite {
            zoom: tile.zoom,
            x: tile.x,
            y: tile.y,
            source,
        })?;

        trace!(tile = %tile, tile_row = row, tile_id = %tile_id, bytes = data.len(), "Wrote tile");
        Ok(())
    }
}

/// XYZ tile for a `map` row, rejecting rows outside the tile grid.
fn map_row_tile(zoom: i64, column: i64, row: i64) -> Result<TileId> {
    let malformed = || StorageError::MalformedRow { zoom, column, row };
    let tms = TileId::checked(
        u8::try_from(zoom).map_err(|_| malformed())?,
        u32::try_from(column).map_err(|_| malformed())?,
        u32::try_from(row).map_err(|_| malformed())?,
    )?;
    // The TMS flip is its own inverse.
    Ok(TileId::new(tms.zoom, tms.x, tms.flipped_y()))
}

/// Connect and apply `schema`, removing the new file again if that fails.
async fn initialize(path: &Path, workers: usize, schema: &str) -> Result<SqlitePool> {
    let pool = connect(path, workers, true).await?;
    if let Err(e) = apply_schema(&pool, schema).await {
        pool.close().await;
        if let Err(rm) = remove_store_files(path).await {
            warn!(path = %path.display(), error = %rm, "Failed to remove store after schema error");
        }
        return Err(e);
    }
    Ok(pool)
}

async fn apply_schema(pool: &SqlitePool, schema: &str) -> Result<()> {
    for statement in schema.split(';') {
        let trimmed = statement.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

async fn connect(path: &Path, workers: usize, create: bool) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(workers.max(1) as u32 + 1)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Remove a store and its WAL side files if present.
pub async fn remove_store_files(path: &Path) -> Result<()> {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.as_os_str().to_owned();
        file.push(suffix);
        match tokio::fs::remove_file(&file).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

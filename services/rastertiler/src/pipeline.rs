//! The tiling pipeline.
//!
//! One producer enumerates tiles zoom by zoom into a bounded channel. A fixed
//! pool of workers pulls from it; each worker owns a raster view, a tile
//! reader, an encoder and a store connection for its whole life, so nothing
//! but the channel and the SQLite pool is shared.
//!
//! Any worker error cancels the run. Siblings stop at their next suspension
//! point, every task is joined, and the partial output is deleted before the
//! first error is returned.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use raster::{
    open_geotiff, AnyRaster, MercatorSource, RasterInfo, RasterSource, RasterView, TileReader,
};
use renderer::TileEncoder;
use serde::Serialize;
use storage::{remove_store_files, Metadata, TileConnection, TileStore};
use tile_common::{tile_count, tile_range, tiles_in_range, TileId, WORLD_MERCATOR_BOUNDS};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, TilerConfig};
use crate::progress::TileProgress;

/// Queued tiles per worker.
const QUEUE_DEPTH: usize = 4;

/// Tile counts for one zoom level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ZoomSummary {
    /// Tiles in the range covering the raster.
    pub tiles: u64,
    pub written: u64,
    /// Tiles skipped because they held only nodata.
    pub empty: u64,
}

/// What a finished run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TilingSummary {
    pub tiles_enumerated: u64,
    pub tiles_written: u64,
    pub tiles_empty: u64,
    pub per_zoom: BTreeMap<u8, ZoomSummary>,
}

impl TilingSummary {
    fn from_zooms(per_zoom: BTreeMap<u8, ZoomSummary>) -> Self {
        let mut summary = Self::default();
        for zoom in per_zoom.values() {
            summary.tiles_enumerated += zoom.tiles;
            summary.tiles_written += zoom.written;
            summary.tiles_empty += zoom.empty;
        }
        summary.per_zoom = per_zoom;
        summary
    }
}

/// Tile range for one zoom level.
#[derive(Debug, Clone, Copy)]
struct ZoomPlan {
    min: TileId,
    max: TileId,
    count: u64,
}

impl ZoomPlan {
    /// A range that yields no tiles.
    fn empty(zoom: u8) -> Self {
        Self {
            min: TileId::new(zoom, 1, 1),
            max: TileId::new(zoom, 0, 0),
            count: 0,
        }
    }
}

/// Runs one validated configuration.
#[derive(Debug, Clone)]
pub struct Tiler {
    config: TilerConfig,
}

impl Tiler {
    pub fn new(config: TilerConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TilerConfig {
        &self.config
    }

    /// Decode the input GeoTIFF and tile it.
    pub async fn run(&self) -> Result<TilingSummary> {
        let input = self.config.input.clone();
        let raster = tokio::task::spawn_blocking(move || open_geotiff(&input))
            .await
            .context("raster decode task panicked")?
            .with_context(|| format!("failed to open {}", self.config.input.display()))?;

        self.config.check_data_type(raster.data_type())?;

        match raster {
            AnyRaster::UInt8(r) => self.run_source(MercatorSource::new(r)?).await,
            AnyRaster::UInt16(r) => self.run_source(MercatorSource::new(r)?).await,
            AnyRaster::UInt32(r) => self.run_source(MercatorSource::new(r)?).await,
        }
    }

    /// Tile an already opened source.
    pub async fn run_source<S>(&self, source: S) -> Result<TilingSummary>
    where
        S: RasterSource + 'static,
        S::View: 'static,
    {
        let info = source.info();
        self.config.check_data_type(info.data_type)?;
        let colormap = self.config.parse_colormap()?;
        let encoder = TileEncoder::new(info.data_type, colormap, info.nodata)?;
        let plan = self.plan(&info);

        info!(
            input = %self.config.input.display(),
            output = %self.config.output.display(),
            data_type = %info.data_type,
            nodata = info.nodata,
            minzoom = self.config.minzoom,
            maxzoom = self.config.maxzoom,
            tiles = plan.values().map(|p| p.count).sum::<u64>(),
            workers = self.config.workers,
            format = %encoder.format(),
            "Starting tiling run"
        );

        let store = match TileStore::create(&self.config.output, self.config.workers).await {
            Ok(store) => store,
            Err(e) => {
                self.discard_files().await;
                return Err(e)
                    .with_context(|| format!("failed to create {}", self.config.output.display()));
            }
        };

        let outcome: Result<TilingSummary> = async {
            store.write_metadata(&self.metadata(&info)).await?;
            let summary = self.tile_all(&store, &source, encoder, &plan).await?;
            store.finalize().await?;
            Ok(summary)
        }
        .await;

        let summary = match outcome {
            Ok(summary) => summary,
            Err(e) => {
                self.discard(store).await;
                return Err(e);
            }
        };

        if let Err(e) = store.close().await {
            self.discard_files().await;
            return Err(e).context("failed to close tile store");
        }

        info!(
            tiles = summary.tiles_enumerated,
            written = summary.tiles_written,
            empty = summary.tiles_empty,
            output = %self.config.output.display(),
            "Tiling complete"
        );
        Ok(summary)
    }

    fn plan(&self, info: &RasterInfo) -> BTreeMap<u8, ZoomPlan> {
        // tile_range expects bounds inside the world extent.
        let clamped = info.mercator_bounds.intersection(&WORLD_MERCATOR_BOUNDS);
        if clamped.is_none() {
            warn!(bounds = ?info.mercator_bounds, "Raster lies outside the Web Mercator world");
        }

        (self.config.minzoom..=self.config.maxzoom)
            .map(|zoom| {
                let plan = match &clamped {
                    Some(bounds) => {
                        let (min, max) = tile_range(zoom, bounds);
                        ZoomPlan {
                            min,
                            max,
                            count: tile_count(min, max),
                        }
                    }
                    None => ZoomPlan::empty(zoom),
                };
                debug!(zoom, min = %plan.min, max = %plan.max, count = plan.count, "Zoom range");
                (zoom, plan)
            })
            .collect()
    }

    fn metadata(&self, info: &RasterInfo) -> Metadata {
        Metadata {
            name: self.config.tileset_name(),
            description: self.config.description.clone(),
            attribution: self.config.attribution.clone(),
            minzoom: self.config.minzoom,
            maxzoom: self.config.maxzoom,
            bounds: info.geo_bounds,
        }
    }

    /// Run the producer and the worker pool to completion.
    async fn tile_all<S>(
        &self,
        store: &TileStore,
        source: &S,
        encoder: TileEncoder,
        plan: &BTreeMap<u8, ZoomPlan>,
    ) -> Result<TilingSummary>
    where
        S: RasterSource + 'static,
        S::View: 'static,
    {
        let workers = self.config.workers.max(1);
        let counts: Vec<(u8, u64)> = plan.iter().map(|(&z, p)| (z, p.count)).collect();
        let progress = TileProgress::new(&counts, self.config.progress);
        let token = CancellationToken::new();

        // Every worker gets its own view and connection before any tile moves.
        let mut states = Vec::with_capacity(workers);
        for id in 0..workers {
            let view = source
                .open_view()
                .with_context(|| format!("worker {id} failed to open a raster view"))?;
            let conn = store.acquire().await?;
            let state = WorkerState {
                view,
                reader: TileReader::new(self.config.tile_size, self.config.edge_tiles),
                encoder: encoder.clone(),
            };
            states.push((state, conn));
        }

        let (tx, rx) = mpsc::channel::<TileId>(workers * QUEUE_DEPTH);
        let rx = Arc::new(Mutex::new(rx));

        let ranges: Vec<(TileId, TileId)> = plan.values().map(|p| (p.min, p.max)).collect();
        let producer = tokio::spawn(produce(ranges, tx, token.clone()));

        let handles: Vec<_> = states
            .into_iter()
            .enumerate()
            .map(|(id, (state, conn))| {
                let rx = Arc::clone(&rx);
                let token = token.clone();
                let progress = progress.clone();
                tokio::spawn(async move {
                    let result = run_worker(id, state, conn, rx, token.clone(), progress).await;
                    if let Err(e) = &result {
                        error!(worker = id, error = %format!("{e:#}"), "Tile worker failed");
                        token.cancel();
                    }
                    result
                })
            })
            .collect();
        drop(rx);

        let results = join_all(handles).await;
        let produced = producer.await;
        progress.finish();

        let mut first_error = None;
        let mut per_zoom: BTreeMap<u8, ZoomSummary> = plan
            .iter()
            .map(|(&zoom, p)| {
                let summary = ZoomSummary {
                    tiles: p.count,
                    ..ZoomSummary::default()
                };
                (zoom, summary)
            })
            .collect();

        for result in results {
            match result {
                Ok(Ok(tally)) => {
                    for (zoom, (written, empty)) in tally {
                        let entry = per_zoom.entry(zoom).or_default();
                        entry.written += written;
                        entry.empty += empty;
                    }
                }
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(join) => {
                    first_error.get_or_insert(anyhow!("tile worker panicked: {join}"));
                }
            }
        }
        if let Err(join) = produced {
            first_error.get_or_insert(anyhow!("tile producer panicked: {join}"));
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        Ok(TilingSummary::from_zooms(per_zoom))
    }

    /// Close a store that will not be kept and delete its files.
    async fn discard(&self, store: TileStore) {
        if let Err(e) = store.close().await {
            warn!(error = %e, "Failed to close tile store after error");
        }
        self.discard_files().await;
    }

    async fn discard_files(&self) {
        match remove_store_files(&self.config.output).await {
            Ok(()) => warn!(
                output = %self.config.output.display(),
                "Removed partial output"
            ),
            Err(e) => error!(
                output = %self.config.output.display(),
                error = %e,
                "Failed to remove partial output"
            ),
        }
    }
}

/// Enumerate every tile, zoom by zoom, column by column.
async fn produce(
    ranges: Vec<(TileId, TileId)>,
    tx: mpsc::Sender<TileId>,
    token: CancellationToken,
) {
    for (min, max) in ranges {
        for tile in tiles_in_range(min, max) {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("Producer cancelled");
                    return;
                }
                sent = tx.send(tile) => {
                    // Every worker is gone; nothing left to feed.
                    if sent.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

/// Everything a worker mutates while handling a tile.
struct WorkerState<V: RasterView> {
    view: V,
    reader: TileReader<V::Pixel>,
    encoder: TileEncoder,
}

impl<V: RasterView> WorkerState<V> {
    /// Read and encode one tile. `None` when the tile has no data.
    fn process(&mut self, tile: TileId) -> Result<Option<Vec<u8>>> {
        let read = self
            .reader
            .read(&mut self.view, tile)
            .with_context(|| format!("failed to read tile {tile}"))?;
        if !read.has_data {
            return Ok(None);
        }
        let png = self
            .encoder
            .encode(self.reader.buffer())
            .with_context(|| format!("failed to encode tile {tile}"))?;
        Ok(Some(png))
    }
}

/// `(written, empty)` per zoom.
type Tally = BTreeMap<u8, (u64, u64)>;

async fn run_worker<V>(
    id: usize,
    mut state: WorkerState<V>,
    mut conn: TileConnection,
    rx: Arc<Mutex<mpsc::Receiver<TileId>>>,
    token: CancellationToken,
    progress: TileProgress,
) -> Result<Tally>
where
    V: RasterView + 'static,
{
    debug!(worker = id, "Tile worker started");
    let mut tally = Tally::new();

    loop {
        let next = {
            let mut rx = rx.lock().await;
            tokio::select! {
                biased;
                _ = token.cancelled() => None,
                tile = rx.recv() => tile,
            }
        };
        let Some(tile) = next else { break };

        // Reading and encoding are CPU bound; the state travels to the
        // blocking pool and back.
        let (returned, result) = tokio::task::spawn_blocking(move || {
            let result = state.process(tile);
            (state, result)
        })
        .await
        .context("tile task panicked")?;
        state = returned;

        let counts = tally.entry(tile.zoom).or_default();
        match result? {
            Some(png) => {
                conn.write_tile(tile, &png).await?;
                counts.0 += 1;
            }
            None => counts.1 += 1,
        }
        progress.inc(tile.zoom);
    }

    debug!(
        worker = id,
        cancelled = token.is_cancelled(),
        "Tile worker finished"
    );
    Ok(tally)
}

//! rastertiler command line.
//!
//! `rastertiler create <INPUT> <OUTPUT>` tiles a single-band GeoTIFF into an
//! MBTiles file of PNG tiles.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use raster::EdgeTilePolicy;
use rastertiler::{Tiler, TilerConfig};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "rastertiler")]
#[command(about = "Tile single-band rasters into PNG MBTiles tilesets")]
struct Cli {
    /// Log level
    #[arg(long, global = true, env = "RASTERTILER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an MBTiles tileset from a GeoTIFF
    Create(CreateArgs),
}

#[derive(clap::Args, Debug)]
struct CreateArgs {
    /// Input GeoTIFF (EPSG:4326 or EPSG:3857)
    input: PathBuf,

    /// Output file, must end in .mbtiles
    output: PathBuf,

    /// Minimum zoom level
    #[arg(short = 'Z', long, default_value = "0")]
    minzoom: u8,

    /// Maximum zoom level
    #[arg(short = 'z', long, default_value = "0")]
    maxzoom: u8,

    /// Tile size in pixels
    #[arg(short = 's', long = "tilesize", default_value = "256")]
    tile_size: usize,

    /// Tileset name (default: input file name)
    #[arg(short, long, default_value = "")]
    name: String,

    /// Tileset description
    #[arg(long, default_value = "")]
    description: String,

    /// Tileset attribution
    #[arg(long, default_value = "")]
    attribution: String,

    /// Number of tile workers
    #[arg(short, long, env = "RASTERTILER_WORKERS", default_value = "4")]
    workers: usize,

    /// Colormap for uint8 rasters: "<value>:<hex>,<value>:<hex>,..."
    #[arg(long)]
    colormap: Option<String>,

    /// How tiles on the raster edge are checked for data
    #[arg(long, value_enum, default_value = "assume-data")]
    edge_tiles: EdgeTiles,

    /// Hide progress bars
    #[arg(long)]
    no_progress: bool,

    /// Print a JSON summary to stdout when done
    #[arg(long)]
    json_summary: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EdgeTiles {
    /// Partial tiles always count as having data
    AssumeData,
    /// Partial tiles of only nodata are skipped
    CheckNodata,
}

impl From<EdgeTiles> for EdgeTilePolicy {
    fn from(value: EdgeTiles) -> Self {
        match value {
            EdgeTiles::AssumeData => EdgeTilePolicy::AssumeData,
            EdgeTiles::CheckNodata => EdgeTilePolicy::CheckNodata,
        }
    }
}

impl CreateArgs {
    fn into_config(self) -> TilerConfig {
        TilerConfig {
            input: self.input,
            output: self.output,
            minzoom: self.minzoom,
            maxzoom: self.maxzoom,
            tile_size: self.tile_size,
            workers: self.workers,
            name: self.name,
            description: self.description,
            attribution: self.attribution,
            colormap: self.colormap,
            edge_tiles: self.edge_tiles.into(),
            progress: !self.no_progress,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    if cli.log_json {
        let subscriber = builder.with_thread_ids(true).json().finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    match cli.command {
        Command::Create(args) => {
            let json_summary = args.json_summary;
            let tiler = Tiler::new(args.into_config())?;
            info!(
                input = %tiler.config().input.display(),
                output = %tiler.config().output.display(),
                "Creating tileset"
            );

            let summary = tiler.run().await?;
            if json_summary {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
        }
    }

    Ok(())
}

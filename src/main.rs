//! Tilematch: layered tile-matching puzzle in the terminal.

mod app;
mod board;
mod combo;
mod engine;
mod generator;
mod input;
mod loader;
mod logging;
mod source;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, Subcommand, ValueEnum};
use source::{LocalSource, TileSource};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Options derived from CLI that affect play (board size, timing, colours).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub theme: String,
    pub rows: usize,
    pub columns: usize,
    pub match_delay: Duration,
    pub palette: Palette,
    pub no_animation: bool,
    pub frame_rate: f64,
}

impl GameConfig {
    fn from_args(args: &Args) -> Self {
        Self {
            theme: args.theme.clone(),
            rows: args.rows,
            columns: args.columns,
            match_delay: args
                .delay_ms
                .map_or(engine::DEFAULT_MATCH_DELAY, Duration::from_millis),
            palette: args.palette,
            no_animation: args.no_animation,
            frame_rate: args.frame_rate,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("starting async runtime")?;
    let source = Arc::new(
        LocalSource::new(args.themes_dir.clone())
            .with_board_file(args.board.clone())
            .with_seed(args.seed),
    );

    match &args.command {
        Some(Command::Generate { theme_file, output }) => {
            let theme_path = match theme_file {
                Some(path) => path.clone(),
                None => source.theme_path(&args.theme)?,
            };
            let mut generator = generator::BoardGenerator::new(args.rows, args.columns, args.seed)?;
            let theme = runtime.block_on(source::read_theme_file(&theme_path))?;
            let board = generator.generate(&theme)?;
            let json = serde_json::to_string_pretty(&board)?;
            match output {
                Some(path) => std::fs::write(path, json)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => println!("{json}"),
            }
            Ok(())
        }
        Some(Command::Themes) => {
            for name in runtime.block_on(source.fetch_theme_names()) {
                println!("{name}");
            }
            Ok(())
        }
        None => {
            // A board that cannot be split into pairs can never be played.
            if args.board.is_none() {
                generator::validate_dimensions(args.rows, args.columns)?;
            }
            let config = GameConfig::from_args(&args);
            let mut app = App::new(config, source, runtime.handle().clone());
            app.run()
        }
    }
}

/// Layered tile-matching puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tilematch",
    version,
    about = "Layered tile-matching puzzle in the terminal. Pick two tiles; the layers they share disappear.",
    long_about = "Tilematch is a terminal puzzle. Every tile holds a stack of layers.\n\n\
        Select a tile, then a second one: every layer the two have in common is removed from both. \
        Matches chain from the second tile while it still has layers; a tile with nothing in common \
        breaks the streak. Clear the whole board.\n\n\
        CONTROLS:\n  Arrows / hjkl  Move cursor    Enter / Space  Select tile\n  Mouse          Click a tile    R  New board (when finished)   Q / Esc  Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Theme name; read from <themes-dir>/<theme>.json.
    #[arg(short, long, default_value = "hongKong", global = true)]
    pub theme: String,

    /// Directory holding theme documents.
    #[arg(long, default_value = "themes", value_name = "DIR", global = true)]
    pub themes_dir: PathBuf,

    /// Number of tile rows.
    #[arg(long, default_value = "6", value_name = "N", global = true)]
    pub rows: usize,

    /// Number of tiles per row.
    #[arg(long, default_value = "5", value_name = "N", global = true)]
    pub columns: usize,

    /// Seed for board generation (random if not set).
    #[arg(long, value_name = "N", global = true)]
    pub seed: Option<u64>,

    /// Play this fixed board (JSON) instead of generating one.
    #[arg(long, value_name = "FILE")]
    pub board: Option<PathBuf>,

    /// How long the caption and fade stay up before the board changes. Default 1750 ms.
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Disable the layer fade (captions still show for the full delay).
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Colour palette for layer groups: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Write logs to this file (RUST_LOG controls the level).
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a board and print it (or write it) as JSON.
    Generate {
        /// Theme document to generate from (defaults to the --theme in --themes-dir).
        #[arg(long, value_name = "FILE")]
        theme_file: Option<PathBuf>,

        /// Output file; stdout if not set.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// List the themes found in --themes-dir.
    Themes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

//! Ambient sprite simulation, headless demo.
//!
//! Runs a [`SpriteEngine`] for a while without a window and logs what the
//! creatures do: which ones appear, bounce off the edges, bump into each
//! other or wander off the canvas.
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run --release -- --seconds 30 --max-sprites 5
//! ```
//!
//! With `--dump-json` the final sprite snapshot is printed to stdout.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ambisprite::engine::SpriteEngine;
use ambisprite::events::sprite::SpriteEvent;
use ambisprite::resources::catalog::AssetCatalog;
use ambisprite::resources::engineconfig::EngineConfig;
use ambisprite::resources::providers::Providers;
use clap::Parser;
use crossbeam_channel::RecvTimeoutError;
use log::{debug, info};

/// Ambient sprite simulation
#[derive(Parser)]
#[command(version, about = "Decorative creatures wandering on a canvas, run headless.")]
struct Cli {
    /// INI configuration file (default: ./ambisprite.ini if present).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON asset catalog; the built-in catalog is used when omitted.
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,

    /// How long to run before closing.
    #[arg(long, value_name = "N", default_value_t = 10)]
    seconds: u64,

    /// Override the population cap.
    #[arg(long, value_name = "N")]
    max_sprites: Option<usize>,

    /// Print the final snapshot as JSON.
    #[arg(long)]
    dump_json: bool,
}

fn log_event(event: &SpriteEvent) {
    match event {
        SpriteEvent::SequenceEnded { sprite, sequence } => {
            debug!("{:?} finished {:?}", sprite, sequence)
        }
        SpriteEvent::BoundsHit { sprite, edges } => debug!("{:?} bounced off {:?}", sprite, edges),
        SpriteEvent::Collision { sprite, other } => debug!("{:?} bumped into {:?}", sprite, other),
        SpriteEvent::Vanished { sprite } => info!("{:?} wandered off", sprite),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let mut config = EngineConfig::with_path(path);
            if let Err(e) = config.load_from_file() {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
            config
        }
        None => {
            let mut config = EngineConfig::new();
            config.load_from_file().ok(); // ignore errors, use defaults
            config
        }
    };
    if let Some(max) = cli.max_sprites {
        config.max_sprites = max;
    }

    let catalog = match &cli.catalog {
        Some(path) => match AssetCatalog::load_from_file(&path.to_string_lossy()) {
            Ok(catalog) => catalog,
            Err(e) => {
                eprintln!("Error loading catalog: {e}");
                std::process::exit(1);
            }
        },
        None => AssetCatalog::builtin(),
    };
    info!("{} assets available", catalog.len());

    let engine = SpriteEngine::new(&config, Providers::from_catalog(Arc::new(catalog)));
    let events = engine.subscribe();
    engine.start();

    let deadline = Instant::now() + Duration::from_secs(cli.seconds);
    let mut vanished = 0usize;
    loop {
        match events.recv_deadline(deadline) {
            Ok(event) => {
                if matches!(event, SpriteEvent::Vanished { .. }) {
                    vanished += 1;
                }
                log_event(&event);
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let sprites = engine.get_sprites();
    info!(
        "{} sprites on canvas, {} wandered off",
        sprites.len(),
        vanished
    );
    if cli.dump_json {
        match serde_json::to_string_pretty(&sprites) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing snapshot: {e}"),
        }
    }
    engine.close();
}

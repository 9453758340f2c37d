//! Engine lifecycle tests: state transitions, the background threads and
//! host notifications, run against real time with short timer delays.

use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant};

use ambisprite::engine::SpriteEngine;
use ambisprite::resources::catalog::{AssetCatalog, AssetEntry};
use ambisprite::resources::engineconfig::{EngineConfig, RandomDelay};
use ambisprite::resources::providers::Providers;
use ambisprite::resources::simulation::LoopState;

const WAIT: Duration = Duration::from_secs(5);

fn providers() -> Providers {
    Providers::from_catalog(Arc::new(AssetCatalog::new(vec![AssetEntry::walker(
        "ogre", 3.0, 12.0, 4,
    )])))
}

/// 1000x800 canvas, one sprite, creation every one to two ticks.
fn fast_config(max_sprites: usize) -> EngineConfig {
    let mut config = EngineConfig::new();
    config.canvas_width = 1000;
    config.canvas_height = 800;
    config.max_sprites = max_sprites;
    config.creation_delay = RandomDelay::from_millis(67, 134);
    config.release_delay = RandomDelay::from_millis(600_000, 900_000);
    config
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(10));
    }
    condition()
}

#[test]
fn state_transitions() {
    let engine = SpriteEngine::new(&fast_config(1), providers());
    assert_eq!(engine.state(), LoopState::Stopped);
    assert!(!engine.pause());

    assert!(engine.start());
    assert_eq!(engine.state(), LoopState::Running);
    assert!(!engine.start());

    assert!(engine.pause());
    assert_eq!(engine.state(), LoopState::Paused);
    assert!(engine.start());

    engine.stop();
    assert_eq!(engine.state(), LoopState::Stopped);
    assert_eq!(engine.get_sprites().len(), 0);

    engine.close();
    assert_eq!(engine.state(), LoopState::Closed);
    assert!(!engine.start());
    assert!(!engine.pause());
    engine.close();
    assert_eq!(engine.state(), LoopState::Closed);
}

#[test]
fn end_to_end_creation_and_eviction() {
    let engine = SpriteEngine::new(&fast_config(1), providers());
    engine.start();

    assert!(wait_for(|| engine.get_sprites().len() == 1));
    // the cap holds while the creation timer keeps firing
    sleep(Duration::from_millis(300));
    assert_eq!(engine.get_sprites().len(), 1);

    let evicted = engine.set_max_sprites(0);
    assert_eq!(evicted.len(), 1);
    assert!(evicted[0].closed);
    assert_eq!(engine.get_sprites().len(), 0);

    engine.close();
}

#[test]
fn events_and_redraws_reach_the_host() {
    let engine = SpriteEngine::new(&fast_config(2), providers());
    let events = engine.subscribe();
    let redraws = engine.redraw_requests();
    engine.start();

    assert!(redraws.recv_timeout(WAIT).is_ok());
    // a four-frame walk cycle ends within a second of the first sprite
    assert!(events.recv_timeout(WAIT).is_ok());
    engine.close();
}

#[test]
fn pause_freezes_sprites() {
    let engine = SpriteEngine::new(&fast_config(1), providers());
    engine.start();
    assert!(wait_for(|| engine.get_sprites().len() == 1));

    engine.pause();
    sleep(Duration::from_millis(100));
    let before = engine.get_sprites();
    sleep(Duration::from_millis(300));
    let after = engine.get_sprites();
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].x, after[0].x);
    assert_eq!(before[0].y, after[0].y);
    assert_eq!(before[0].frame_index, after[0].frame_index);

    engine.close();
}

#[test]
fn stop_returns_closed_sprites() {
    let engine = SpriteEngine::new(&fast_config(1), providers());
    engine.start();
    assert!(wait_for(|| engine.get_sprites().len() == 1));

    let removed = engine.stop();
    assert_eq!(removed.len(), 1);
    assert!(removed[0].closed);
    assert_eq!(engine.get_sprites().len(), 0);
    engine.close();
}

#[test]
fn canvas_resize_reclamps_sprites() {
    let engine = SpriteEngine::new(&fast_config(1), providers());
    engine.start();
    assert!(wait_for(|| engine.get_sprites().len() == 1));
    engine.pause();

    engine.set_canvas_size(100.0, 80.0);
    let s = &engine.get_sprites()[0];
    assert!(s.x >= 12.0 && s.x <= 88.0);
    assert!(s.y >= 12.0 && s.y <= 68.0);
    engine.close();
}

#[test]
fn hovering_a_sprite_highlights_it() {
    let engine = SpriteEngine::new(&fast_config(1), providers());
    engine.start();
    assert!(wait_for(|| engine.get_sprites().len() == 1));
    engine.pause();

    let s = engine.get_sprites()[0].clone();
    engine.on_pointer_moved(s.x, s.y);
    assert!(engine.get_sprites()[0].highlighted);
    engine.close();
}

#[test]
fn dropping_the_engine_shuts_it_down() {
    let engine = SpriteEngine::new(&fast_config(1), providers());
    engine.start();
    let started = Instant::now();
    drop(engine);
    assert!(started.elapsed() < WAIT);
}

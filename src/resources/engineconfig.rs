//! Engine configuration.
//!
//! Settings are loaded from an INI file. Every key is optional; missing
//! values keep their defaults.
//!
//! # Configuration File Format
//!
//! ```ini
//! [canvas]
//! width = 1280
//! height = 720
//!
//! [population]
//! display_width = 1920
//! max_sprites = 0
//!
//! [creation]
//! min_delay_ms = 10000
//! max_delay_ms = 60000
//!
//! [release]
//! min_delay_ms = 30000
//! max_delay_ms = 90000
//!
//! [loop]
//! tick_hz = 15
//!
//! [hover]
//! linger_ms = 2000
//! ```
//!
//! A `max_sprites` of 0 derives the cap from `display_width` (see
//! [`max_sprites_for_width`]).

use std::path::PathBuf;
use std::time::Duration;

use configparser::ini::Ini;
use fastrand::Rng;
use log::info;

const DEFAULT_CANVAS_WIDTH: u32 = 1280;
const DEFAULT_CANVAS_HEIGHT: u32 = 720;
const DEFAULT_DISPLAY_WIDTH: u32 = 1920;
const DEFAULT_CREATION_MIN_MS: u64 = 10_000;
const DEFAULT_CREATION_MAX_MS: u64 = 60_000;
const DEFAULT_RELEASE_MIN_MS: u64 = 30_000;
const DEFAULT_RELEASE_MAX_MS: u64 = 90_000;
const DEFAULT_TICK_HZ: u32 = 15;
const DEFAULT_HOVER_LINGER_MS: u64 = 2_000;
const DEFAULT_CONFIG_PATH: &str = "./ambisprite.ini";

/// Default population cap for a display of the given width in pixels.
pub fn max_sprites_for_width(width: u32) -> usize {
    match width {
        0..=1280 => 10,
        1281..=1920 => 20,
        1921..=2560 => 30,
        2561..=3840 => 40,
        _ => 50,
    }
}

/// Random delay drawn uniformly from `[min, max)`.
///
/// When `max <= min` the delay is always `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomDelay {
    pub min: Duration,
    pub max: Duration,
}

impl RandomDelay {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    pub fn next(&self, rng: &mut Rng) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let span = (self.max - self.min).as_nanos().min(u64::MAX as u128) as u64;
        self.min + Duration::from_nanos(rng.u64(0..span))
    }
}

/// Engine settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Width of the display the canvas lives on; drives the default cap.
    pub display_width: u32,
    /// Explicit cap, or 0 to derive it from `display_width`.
    pub max_sprites: usize,
    pub creation_delay: RandomDelay,
    pub release_delay: RandomDelay,
    pub tick_hz: u32,
    /// How long a hover highlight stays after the pointer leaves.
    pub hover_linger: Duration,
    pub config_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            display_width: DEFAULT_DISPLAY_WIDTH,
            max_sprites: 0,
            creation_delay: RandomDelay::from_millis(
                DEFAULT_CREATION_MIN_MS,
                DEFAULT_CREATION_MAX_MS,
            ),
            release_delay: RandomDelay::from_millis(
                DEFAULT_RELEASE_MIN_MS,
                DEFAULT_RELEASE_MAX_MS,
            ),
            tick_hz: DEFAULT_TICK_HZ,
            hover_linger: Duration::from_millis(DEFAULT_HOVER_LINGER_MS),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Population cap after resolving the `max_sprites = 0` default.
    pub fn effective_max_sprites(&self) -> usize {
        if self.max_sprites == 0 {
            max_sprites_for_width(self.display_width)
        } else {
            self.max_sprites
        }
    }

    /// Tick period; a zero rate falls back to the default.
    pub fn tick_period(&self) -> Duration {
        let hz = if self.tick_hz == 0 {
            DEFAULT_TICK_HZ
        } else {
            self.tick_hz
        };
        Duration::from_secs(1) / hz
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current values.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config);

        info!(
            "Loaded config: canvas {}x{}, display width {}, cap {}, tick {} Hz",
            self.canvas_width,
            self.canvas_height,
            self.display_width,
            self.effective_max_sprites(),
            self.tick_hz
        );
        Ok(())
    }

    /// Parse settings from INI text, for hosts that embed their config.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        let uint = |section: &str, key: &str| config.getuint(section, key).ok().flatten();
        // out-of-range values keep the current setting
        let uint32 =
            |section: &str, key: &str| uint(section, key).and_then(|v| u32::try_from(v).ok());

        // [canvas]
        if let Some(w) = uint32("canvas", "width") {
            self.canvas_width = w;
        }
        if let Some(h) = uint32("canvas", "height") {
            self.canvas_height = h;
        }

        // [population]
        if let Some(w) = uint32("population", "display_width") {
            self.display_width = w;
        }
        if let Some(n) = uint("population", "max_sprites").and_then(|n| usize::try_from(n).ok()) {
            self.max_sprites = n;
        }

        // [creation] / [release]
        let creation = &mut self.creation_delay;
        if let Some(ms) = uint("creation", "min_delay_ms") {
            creation.min = Duration::from_millis(ms);
        }
        if let Some(ms) = uint("creation", "max_delay_ms") {
            creation.max = Duration::from_millis(ms);
        }
        let release = &mut self.release_delay;
        if let Some(ms) = uint("release", "min_delay_ms") {
            release.min = Duration::from_millis(ms);
        }
        if let Some(ms) = uint("release", "max_delay_ms") {
            release.max = Duration::from_millis(ms);
        }

        // [loop]
        if let Some(hz) = uint32("loop", "tick_hz") {
            self.tick_hz = hz;
        }

        // [hover]
        if let Some(ms) = uint("hover", "linger_ms") {
            self.hover_linger = Duration::from_millis(ms);
        }
    }

    /// Save configuration to the INI file, creating it if needed.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();
        let ms = |d: Duration| Some(d.as_millis().to_string());

        config.set("canvas", "width", Some(self.canvas_width.to_string()));
        config.set("canvas", "height", Some(self.canvas_height.to_string()));
        config.set(
            "population",
            "display_width",
            Some(self.display_width.to_string()),
        );
        config.set(
            "population",
            "max_sprites",
            Some(self.max_sprites.to_string()),
        );
        config.set("creation", "min_delay_ms", ms(self.creation_delay.min));
        config.set("creation", "max_delay_ms", ms(self.creation_delay.max));
        config.set("release", "min_delay_ms", ms(self.release_delay.min));
        config.set("release", "max_delay_ms", ms(self.release_delay.max));
        config.set("loop", "tick_hz", Some(self.tick_hz.to_string()));
        config.set("hover", "linger_ms", ms(self.hover_linger));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cap_from_display_width() {
        assert_eq!(max_sprites_for_width(800), 10);
        assert_eq!(max_sprites_for_width(1280), 10);
        assert_eq!(max_sprites_for_width(1281), 20);
        assert_eq!(max_sprites_for_width(1920), 20);
        assert_eq!(max_sprites_for_width(2560), 30);
        assert_eq!(max_sprites_for_width(3840), 40);
        assert_eq!(max_sprites_for_width(5120), 50);
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new();
        assert_eq!(config.effective_max_sprites(), 20);
        assert_eq!(config.tick_hz, 15);
        assert_eq!(config.creation_delay.min, Duration::from_secs(10));
        assert_eq!(config.release_delay.max, Duration::from_secs(90));
    }

    #[test]
    fn test_explicit_cap_wins() {
        let mut config = EngineConfig::new();
        config.max_sprites = 3;
        assert_eq!(config.effective_max_sprites(), 3);
    }

    #[test]
    fn test_load_from_str_keeps_missing_keys() {
        let mut config = EngineConfig::new();
        config
            .load_from_str("[canvas]\nwidth = 1000\n[loop]\ntick_hz = 30\n")
            .unwrap();
        assert_eq!(config.canvas_width, 1000);
        assert_eq!(config.canvas_height, DEFAULT_CANVAS_HEIGHT);
        assert_eq!(config.tick_hz, 30);
        assert_eq!(config.hover_linger, Duration::from_millis(2000));
    }

    #[test]
    fn test_oversized_values_keep_defaults() {
        let mut config = EngineConfig::new();
        config
            .load_from_str(
                "[canvas]\nwidth = 4294967296\nheight = 800\n[loop]\ntick_hz = 99999999999\n",
            )
            .unwrap();
        assert_eq!(config.canvas_width, DEFAULT_CANVAS_WIDTH);
        assert_eq!(config.canvas_height, 800);
        assert_eq!(config.tick_hz, DEFAULT_TICK_HZ);
    }

    #[test]
    fn test_tick_period() {
        let mut config = EngineConfig::new();
        assert_eq!(config.tick_period(), Duration::from_secs(1) / 15);
        config.tick_hz = 0;
        assert_eq!(config.tick_period(), Duration::from_secs(1) / 15);
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir().join(format!(
            "ambisprite-config-test-{}.ini",
            std::process::id()
        ));
        let mut config = EngineConfig::with_path(&path);
        config.max_sprites = 7;
        config.release_delay = RandomDelay::from_millis(100, 200);
        config.save_to_file().unwrap();

        let mut loaded = EngineConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        assert_eq!(loaded.max_sprites, 7);
        assert_eq!(loaded.release_delay, RandomDelay::from_millis(100, 200));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_random_delay_range() {
        let mut rng = Rng::with_seed(7);
        let delay = RandomDelay::from_millis(100, 200);
        for _ in 0..200 {
            let d = delay.next(&mut rng);
            assert!(d >= Duration::from_millis(100));
            assert!(d < Duration::from_millis(200));
        }
        let fixed = RandomDelay::from_millis(50, 50);
        assert_eq!(fixed.next(&mut rng), Duration::from_millis(50));
    }
}

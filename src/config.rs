//! Configuration for recording and rendering.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Recording configuration
    #[serde(default)]
    pub recorder: RecorderConfig,

    /// Render configuration
    #[serde(default)]
    pub render: RenderConfig,

    /// Path to config file (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

/// Recording engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Target capture frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Directory for recording artifacts (video container, event metadata)
    #[serde(default = "default_output_directory")]
    pub output_directory: PathBuf,

    /// File name of the persisted event log, relative to `output_directory`
    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,

    /// How long `stop()` waits for each worker thread to join (ms)
    #[serde(default = "default_join_timeout")]
    pub join_timeout_ms: u64,

    /// Consecutive missing frames tolerated before a warning is logged
    #[serde(default = "default_max_misses")]
    pub max_consecutive_misses: u32,

    /// Session ID (auto-generated if not set)
    pub session_id: Option<String>,
}

/// Virtual camera render configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Camera magnification inside a zoom interval (2.0 = 200%)
    #[serde(default = "default_zoom_level")]
    pub zoom_level: f64,

    /// Camera smoothing factor per rendered frame, in (0, 1); lower is
    /// smoother
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,

    /// How long each zoom interval lasts (seconds)
    #[serde(default = "default_zoom_duration")]
    pub zoom_duration: f64,

    /// Minimum spacing between automatically suggested zoom points
    /// (seconds); prevents frantic zooming on rapid clicks
    #[serde(default = "default_click_cooldown")]
    pub click_cooldown: f64,

    /// Report render progress every N frames
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
}

// Default value functions
fn default_fps() -> u32 {
    30
}

fn default_output_directory() -> PathBuf {
    std::env::temp_dir().join("focusreel-recordings")
}

fn default_metadata_file() -> String {
    "input_events.json".to_string()
}

fn default_join_timeout() -> u64 {
    3000
}

fn default_max_misses() -> u32 {
    30
}

fn default_zoom_level() -> f64 {
    2.0
}

fn default_smoothing() -> f64 {
    0.08
}

fn default_zoom_duration() -> f64 {
    2.5
}

fn default_click_cooldown() -> f64 {
    // Matches the zoom duration so suggested intervals never overlap.
    default_zoom_duration()
}

fn default_progress_interval() -> usize {
    5
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            output_directory: default_output_directory(),
            metadata_file: default_metadata_file(),
            join_timeout_ms: default_join_timeout(),
            max_consecutive_misses: default_max_misses(),
            session_id: None,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            zoom_level: default_zoom_level(),
            smoothing: default_smoothing(),
            zoom_duration: default_zoom_duration(),
            click_cooldown: default_click_cooldown(),
            progress_interval: default_progress_interval(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recorder: RecorderConfig::default(),
            render: RenderConfig::default(),
            config_path: None,
        }
    }
}

impl RecorderConfig {
    /// Full path of the persisted event log.
    pub fn metadata_path(&self) -> PathBuf {
        self.output_directory.join(&self.metadata_file)
    }

    /// Get or generate session ID
    pub fn session_id(&self) -> String {
        self.session_id.clone().unwrap_or_else(generate_session_id)
    }
}

/// Timestamped session ID with a short random suffix.
fn generate_session_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}",
        chrono::Utc::now().format("%Y%m%d-%H%M%S"),
        &suffix[..8]
    )
}

impl Config {
    /// Load configuration from default location or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let mut config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            config.config_path = Some(config_path);
            Ok(config)
        } else {
            // Create default config
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = match &self.config_path {
            Some(path) => path.clone(),
            None => Self::default_config_path()?,
        };

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Get default config path
    fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = directories::ProjectDirs::from("io", "focusreel", "focusreel")
            .context("Failed to determine config directory")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let config = Config::default();
        let contents = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&contents).unwrap();
        assert_eq!(parsed.recorder.fps, 30);
        assert_eq!(parsed.render.zoom_level, 2.0);
        assert_eq!(parsed.render.click_cooldown, parsed.render.zoom_duration);
    }

    #[test]
    fn test_session_id_generated_when_unset() {
        let config = RecorderConfig::default();
        let id = config.session_id();
        assert!(!id.is_empty());

        let fixed = RecorderConfig {
            session_id: Some("abc".to_string()),
            ..Default::default()
        };
        assert_eq!(fixed.session_id(), "abc");
    }
}

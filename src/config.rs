use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_CONFIG_FILE: &str = "people-graph.toml";

/// Tunables of the layout simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub alpha_min: f32,
    pub alpha_decay: f32,
    /// Alpha the simulation cools toward when nothing is dragged.
    pub alpha_target: f32,
    pub drag_alpha_target: f32,
    /// Alpha restored on data changes and resizes.
    pub reheat_alpha: f32,
    /// Fraction of velocity lost per tick.
    pub velocity_decay: f32,
    /// Negative values repel.
    pub charge_strength: f32,
    pub charge_min_distance: f32,
    pub theta: f32,
    pub link_strength: f32,
    pub link_distance: f32,
    pub collide_strength: f32,
    pub collide_padding: f32,
    pub position_strength: f32,
    pub center_strength: f32,
    pub max_speed: f32,
    pub initial_spread: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            alpha_min: 0.001,
            alpha_decay: 0.0228,
            alpha_target: 0.0,
            drag_alpha_target: 0.3,
            reheat_alpha: 0.3,
            velocity_decay: 0.4,
            charge_strength: -300.0,
            charge_min_distance: 1.0,
            theta: 0.9,
            link_strength: 0.2,
            link_distance: 30.0,
            collide_strength: 0.7,
            collide_padding: 2.0,
            position_strength: 0.04,
            center_strength: 1.0,
            max_speed: 40.0,
            initial_spread: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub physics: PhysicsConfig,
    pub pulse_duration_ms: u64,
    /// Pixels, in world space.
    pub edge_hit_tolerance: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            pulse_duration_ms: 3000,
            edge_hit_tolerance: 5.0,
            min_zoom: 0.1,
            max_zoom: 8.0,
        }
    }
}

impl EngineConfig {
    pub fn pulse_duration(&self) -> Duration {
        Duration::from_millis(self.pulse_duration_ms)
    }
}

pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf)
}

/// Reads `path`, falling back to defaults when the file does not exist.
pub fn load_or_default_from_path(path: &Path) -> anyhow::Result<EngineConfig> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "no config file, using defaults");
            return Ok(EngineConfig::default());
        }
        Err(error) => {
            return Err(error)
                .with_context(|| format!("failed to read config {}", path.display()));
        }
    };

    let config: EngineConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    let zoom_range_ok = config.min_zoom > 0.0
        && config.min_zoom <= config.max_zoom
        && config.max_zoom.is_finite();
    if !zoom_range_ok {
        warn!(
            min_zoom = config.min_zoom,
            max_zoom = config.max_zoom,
            "ignoring invalid zoom range"
        );
        return Ok(EngineConfig {
            min_zoom: EngineConfig::default().min_zoom,
            max_zoom: EngineConfig::default().max_zoom,
            ..config
        });
    }
    Ok(config)
}

pub fn save_to_path(config: &EngineConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let data = toml::to_string_pretty(config).context("failed to serialize config")?;
    fs::write(path, data).with_context(|| format!("failed to write config {}", path.display()))?;
    info!(path = %path.display(), "config saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn config_roundtrip_save_load() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("people-graph.toml");
        let mut config = EngineConfig::default();
        config.physics.charge_strength = -120.0;
        config.pulse_duration_ms = 1500;

        save_to_path(&config, &path).expect("save config");
        let loaded = load_or_default_from_path(&path).expect("load config");

        assert_eq!(config, loaded);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().expect("tempdir");
        let loaded = load_or_default_from_path(&dir.path().join("absent.toml")).expect("defaults");
        assert_eq!(loaded, EngineConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("people-graph.toml");
        fs::write(&path, "edge_hit_tolerance = 8.0\n[physics]\nlink_distance = 45.0\n")
            .expect("write config");

        let loaded = load_or_default_from_path(&path).expect("load config");
        assert_eq!(loaded.edge_hit_tolerance, 8.0);
        assert_eq!(loaded.physics.link_distance, 45.0);
        assert_eq!(loaded.physics.charge_strength, -300.0);
        assert_eq!(loaded.pulse_duration(), Duration::from_secs(3));
    }

    #[test]
    fn unusable_zoom_range_falls_back_to_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("people-graph.toml");
        let defaults = EngineConfig::default();

        for contents in [
            "min_zoom = nan\nmax_zoom = 4.0\n",
            "min_zoom = 0.5\nmax_zoom = nan\n",
            "min_zoom = 0.5\nmax_zoom = inf\n",
            "min_zoom = 3.0\nmax_zoom = 2.0\n",
            "min_zoom = 0.0\n",
        ] {
            fs::write(&path, contents).expect("write config");
            let loaded = load_or_default_from_path(&path).expect("load config");
            assert_eq!(
                (loaded.min_zoom, loaded.max_zoom),
                (defaults.min_zoom, defaults.max_zoom),
                "{contents:?}"
            );
        }

        fs::write(&path, "min_zoom = 0.5\nmax_zoom = 2.0\n").expect("write config");
        let loaded = load_or_default_from_path(&path).expect("load config");
        assert_eq!((loaded.min_zoom, loaded.max_zoom), (0.5, 2.0));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("people-graph.toml");
        fs::write(&path, "pulse_duration_ms = \"soon\"").expect("write config");
        assert!(load_or_default_from_path(&path).is_err());
    }
}

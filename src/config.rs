use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    export::{ExportFormat, ExportProfile, GapPolicy, QualityTier},
    raster::Rgb,
    timeline::{ReorderPolicy, Transition, TransitionKind},
};

/// Main configuration for the Reel-Compositor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Frame rendering settings
    pub render: RenderConfig,

    /// Timeline construction defaults
    pub timeline: TimelineConfig,

    /// Export settings
    pub export: ExportConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.render.validate()?;
        self.timeline.validate()?;
        self.export.validate()?;
        Ok(())
    }

    /// Export profile at the configured frame rate
    pub fn export_profile(&self) -> ExportProfile {
        ExportProfile::new(self.export.format, self.export.quality).with_fps(self.render.fps)
    }
}

/// Frame rendering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Frames per second sampled from the timeline
    pub fps: f64,

    /// Letterbox and gap colour
    pub background: Rgb,

    /// Resolved rasters kept per assembler
    pub cache_capacity: usize,

    /// Threads used to prefetch resolved rasters
    pub worker_threads: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            background: Rgb::BLACK,
            cache_capacity: 64,
            worker_threads: num_cpus::get(),
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "render.fps".to_string(),
                value: self.fps.to_string()
            }.into());
        }

        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.cache_capacity".to_string(),
                value: self.cache_capacity.to_string()
            }.into());
        }

        if self.worker_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.worker_threads".to_string(),
                value: self.worker_threads.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Timeline construction defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Seconds a still image stays on screen when nothing else decides
    pub default_image_duration: f64,

    /// Transition between consecutive items
    pub default_transition: TransitionKind,

    /// Blend window of the default transition (seconds)
    pub transition_duration: f64,

    /// What reordering does to start times
    pub reorder_policy: ReorderPolicy,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            default_image_duration: 3.0,
            default_transition: TransitionKind::Fade,
            transition_duration: 0.5,
            reorder_policy: ReorderPolicy::Repack,
        }
    }
}

impl TimelineConfig {
    fn validate(&self) -> Result<()> {
        if !(self.default_image_duration.is_finite() && self.default_image_duration > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "timeline.default_image_duration".to_string(),
                value: self.default_image_duration.to_string()
            }.into());
        }

        if !(self.transition_duration.is_finite() && self.transition_duration >= 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "timeline.transition_duration".to_string(),
                value: self.transition_duration.to_string()
            }.into());
        }

        Ok(())
    }

    /// The configured default transition
    pub fn transition(&self) -> Transition {
        Transition::new(self.default_transition, self.transition_duration)
    }
}

/// Export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Container tag
    pub format: ExportFormat,

    /// Resolution/bitrate preset
    pub quality: QualityTier,

    /// How uncovered time ranges are treated
    pub gap_policy: GapPolicy,

    /// Frames between progress events
    pub progress_every: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Mp4,
            quality: QualityTier::Hd1080,
            gap_policy: GapPolicy::Reject,
            progress_every: 1,
        }
    }
}

impl ExportConfig {
    fn validate(&self) -> Result<()> {
        if self.progress_every == 0 {
            return Err(ConfigError::InvalidValue {
                key: "export.progress_every".to_string(),
                value: self.progress_every.to_string()
            }.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.render.background = Rgb::new(10, 20, 30);
        original_config.timeline.reorder_policy = ReorderPolicy::PreserveStarts;
        original_config.export.quality = QualityTier::Uhd4k;
        original_config.export.gap_policy = GapPolicy::BlackFrames;

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(
            &file_path,
            "[export]\nquality = \"720p\"\ngap_policy = \"black-frames\"\n\n[timeline]\ndefault_transition = \"slide-left\"\n",
        )
        .unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.export.quality, QualityTier::Hd720);
        assert_eq!(config.export.gap_policy, GapPolicy::BlackFrames);
        assert_eq!(config.timeline.default_transition, TransitionKind::SlideLeft);
        assert_eq!(config.render.fps, 30.0);
        assert_eq!(config.export_profile().width(), 1280);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        assert!(Config::from_file(dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_invalid_render_config() {
        let mut config = Config::default();
        config.render.fps = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.render.cache_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_durations() {
        let mut config = Config::default();
        config.timeline.transition_duration = -0.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.timeline.default_image_duration = 0.0;
        assert!(config.validate().is_err());
    }
}

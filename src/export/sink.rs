use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assembler::Frame;
use crate::error::{CompositorError, ExportError, Result};
use crate::export::profile::ExportProfile;

/// Name of the metadata file written next to a PNG sequence
pub const MANIFEST_FILE: &str = "manifest.toml";

/// Configuration handed to a [`FrameSink`] before any frame is pushed
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    pub profile: ExportProfile,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: u64,
}

/// Location of a finished artifact
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactHandle {
    /// Where the artifact was written, `None` for in-memory sinks
    pub location: Option<PathBuf>,
    pub frame_count: u64,
    pub profile: ExportProfile,
}

impl fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(path) => write!(f, "{} ({} frames)", path.display(), self.frame_count),
            None => write!(f, "in-memory ({} frames)", self.frame_count),
        }
    }
}

/// Encoder collaborator consuming frames in timestamp order.
///
/// `begin` is called once, then `push_frame` for every frame in order, then
/// exactly one of `finish` or `abort`. After `abort` nothing the sink wrote
/// may be presented as a valid artifact.
pub trait FrameSink: Send {
    fn begin(&mut self, config: SinkConfig) -> Result<()>;

    fn push_frame(&mut self, frame: &Frame) -> Result<()>;

    fn finish(&mut self) -> Result<ArtifactHandle>;

    fn abort(&mut self);
}

/// Keeps every frame in memory, for tests and previews
#[derive(Debug, Default)]
pub struct InMemorySink {
    config: Option<SinkConfig>,
    frames: Vec<Frame>,
    finished: bool,
    aborted: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any
    pub fn config(&self) -> Option<&SinkConfig> {
        self.config.as_ref()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, config: SinkConfig) -> Result<()> {
        self.frames.clear();
        self.frames.reserve(config.total_frames as usize);
        self.config = Some(config);
        self.finished = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame) -> Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<ArtifactHandle> {
        let config = self.config.as_ref().ok_or_else(not_started)?;
        self.finished = true;
        Ok(ArtifactHandle {
            location: None,
            frame_count: self.frames.len() as u64,
            profile: config.profile,
        })
    }

    fn abort(&mut self) {
        self.frames.clear();
        self.aborted = true;
    }
}

/// Metadata written alongside a PNG sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceManifest {
    pub format: String,
    pub quality: String,
    pub width: u32,
    pub height: u32,
    pub bitrate_kbps: u32,
    pub fps: f64,
    pub frame_count: u64,
    pub created_at: String,
}

impl SequenceManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| CompositorError::generic(format!("Invalid manifest: {}", e)))
    }
}

/// Writes `frame_NNNNNN.png` files plus a manifest into a directory.
///
/// Frames go to a hidden staging directory beside the output; it is renamed
/// into place by `finish` and deleted by `abort` (or when the sink is
/// dropped unfinished), so a partial export never occupies the output path.
pub struct PngSequenceSink {
    output: PathBuf,
    staging: PathBuf,
    config: Option<SinkConfig>,
    written: u64,
}

impl PngSequenceSink {
    pub fn new<P: AsRef<Path>>(output: P) -> Self {
        let output = output.as_ref().to_path_buf();
        let name = output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "export".to_string());
        let staging = output.with_file_name(format!(".{}.partial", name));

        Self {
            output,
            staging,
            config: None,
            written: 0,
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn staging(&self) -> &Path {
        &self.staging
    }

    fn remove_staging(&self) {
        if self.staging.exists() {
            if let Err(e) = fs::remove_dir_all(&self.staging) {
                warn!("Failed to remove staging directory {:?}: {}", self.staging, e);
            }
        }
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, config: SinkConfig) -> Result<()> {
        if self.output.exists() {
            return Err(ExportError::TaskFailed {
                reason: format!("output {} already exists", self.output.display()),
            }
            .into());
        }

        self.remove_staging();
        fs::create_dir_all(&self.staging)?;
        debug!("Staging {} frames in {:?}", config.total_frames, self.staging);

        self.config = Some(config);
        self.written = 0;
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame) -> Result<()> {
        let path = self.staging.join(format!("frame_{:06}.png", self.written));
        frame
            .raster
            .save_png(&path)
            .map_err(|e| CompositorError::generic(format!("Failed to save {}: {}", path.display(), e)))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<ArtifactHandle> {
        let config = self.config.take().ok_or_else(not_started)?;
        let manifest = SequenceManifest {
            format: config.profile.format.to_string(),
            quality: config.profile.quality.to_string(),
            width: config.width,
            height: config.height,
            bitrate_kbps: config.profile.bitrate_kbps(),
            fps: config.fps,
            frame_count: self.written,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let content = toml::to_string_pretty(&manifest)
            .map_err(|e| CompositorError::generic(format!("Failed to write manifest: {}", e)))?;
        fs::write(self.staging.join(MANIFEST_FILE), content)?;

        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&self.staging, &self.output)?;

        info!("Wrote {} frames to {:?}", self.written, self.output);
        Ok(ArtifactHandle {
            location: Some(self.output.clone()),
            frame_count: self.written,
            profile: config.profile,
        })
    }

    fn abort(&mut self) {
        self.config = None;
        self.remove_staging();
    }
}

impl Drop for PngSequenceSink {
    fn drop(&mut self) {
        if self.config.is_some() {
            self.remove_staging();
        }
    }
}

fn not_started() -> CompositorError {
    ExportError::TaskFailed {
        reason: "sink finished before begin".to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::profile::{ExportFormat, QualityTier};
    use crate::raster::Raster;
    use tempfile::tempdir;

    fn config(total_frames: u64) -> SinkConfig {
        let profile = ExportProfile::new(ExportFormat::Webm, QualityTier::Sd480).with_fps(12.0);
        SinkConfig {
            profile,
            width: 4,
            height: 2,
            fps: 12.0,
            total_frames,
        }
    }

    fn frame(index: u64) -> Frame {
        Frame {
            raster: Raster::new_filled(4, 2, [index as u8, 0, 0, 255]).unwrap(),
            timestamp: index as f64 / 12.0,
        }
    }

    #[test]
    fn test_png_sequence_is_renamed_on_finish() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("render");
        let mut sink = PngSequenceSink::new(&output);

        sink.begin(config(2)).unwrap();
        sink.push_frame(&frame(0)).unwrap();
        sink.push_frame(&frame(1)).unwrap();
        assert!(!output.exists());
        assert!(sink.staging().exists());

        let handle = sink.finish().unwrap();
        assert_eq!(handle.location.as_deref(), Some(output.as_path()));
        assert_eq!(handle.frame_count, 2);
        assert!(output.join("frame_000000.png").exists());
        assert!(output.join("frame_000001.png").exists());
        assert!(!sink.staging().exists());

        let manifest = SequenceManifest::from_file(output.join(MANIFEST_FILE)).unwrap();
        assert_eq!(manifest.format, "webm");
        assert_eq!(manifest.quality, "480p");
        assert_eq!(manifest.frame_count, 2);
        assert_eq!(manifest.fps, 12.0);
    }

    #[test]
    fn test_abort_leaves_nothing() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("render");
        let mut sink = PngSequenceSink::new(&output);

        sink.begin(config(3)).unwrap();
        sink.push_frame(&frame(0)).unwrap();
        sink.abort();

        assert!(!output.exists());
        assert!(!sink.staging().exists());
    }

    #[test]
    fn test_unfinished_sink_cleans_up_on_drop() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("render");
        let staging = {
            let mut sink = PngSequenceSink::new(&output);
            sink.begin(config(1)).unwrap();
            sink.push_frame(&frame(0)).unwrap();
            sink.staging().to_path_buf()
        };
        assert!(!staging.exists());
        assert!(!output.exists());
    }

    #[test]
    fn test_existing_output_rejected() {
        let dir = tempdir().unwrap();
        let mut sink = PngSequenceSink::new(dir.path());
        assert!(sink.begin(config(1)).is_err());
    }

    #[test]
    fn test_in_memory_sink() {
        let mut sink = InMemorySink::new();
        assert!(sink.finish().is_err());

        sink.begin(config(1)).unwrap();
        sink.push_frame(&frame(7)).unwrap();
        let handle = sink.finish().unwrap();

        assert!(handle.location.is_none());
        assert_eq!(sink.frames().len(), 1);
        assert!(sink.is_finished());
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default sampling rate of exported frame sequences
pub const DEFAULT_FPS: f64 = 30.0;

/// Container tag handed to the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Mp4,
    Mov,
    Avi,
    Webm,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [Self::Mp4, Self::Mov, Self::Avi, Self::Webm];

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
            Self::Avi => "avi",
            Self::Webm => "webm",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('.').to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|format| format.extension() == wanted)
            .ok_or_else(|| format!("unknown format '{}' (expected mp4, mov, avi or webm)", s))
    }
}

/// Resolution/bitrate preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QualityTier {
    #[serde(rename = "4k")]
    Uhd4k,
    #[default]
    #[serde(rename = "1080p")]
    Hd1080,
    #[serde(rename = "720p")]
    Hd720,
    #[serde(rename = "480p")]
    Sd480,
}

/// Concrete output size and target bitrate of a quality tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    pub bitrate_kbps: u32,
}

const QUALITY_TABLE: [(QualityTier, &str, Resolution); 4] = [
    (
        QualityTier::Uhd4k,
        "4k",
        Resolution { width: 3840, height: 2160, bitrate_kbps: 45_000 },
    ),
    (
        QualityTier::Hd1080,
        "1080p",
        Resolution { width: 1920, height: 1080, bitrate_kbps: 8_000 },
    ),
    (
        QualityTier::Hd720,
        "720p",
        Resolution { width: 1280, height: 720, bitrate_kbps: 5_000 },
    ),
    (
        QualityTier::Sd480,
        "480p",
        Resolution { width: 854, height: 480, bitrate_kbps: 2_500 },
    ),
];

impl QualityTier {
    pub const ALL: [QualityTier; 4] = [Self::Uhd4k, Self::Hd1080, Self::Hd720, Self::Sd480];

    fn entry(&self) -> &'static (QualityTier, &'static str, Resolution) {
        QUALITY_TABLE
            .iter()
            .find(|(tier, _, _)| tier == self)
            .unwrap_or(&QUALITY_TABLE[1])
    }

    pub fn name(&self) -> &'static str {
        self.entry().1
    }

    pub fn resolution(&self) -> Resolution {
        self.entry().2
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        QUALITY_TABLE
            .iter()
            .find(|(_, name, _)| *name == wanted)
            .map(|(tier, _, _)| *tier)
            .ok_or_else(|| format!("unknown quality '{}' (expected 4k, 1080p, 720p or 480p)", s))
    }
}

/// Output format, quality tier and frame rate of one export
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportProfile {
    pub format: ExportFormat,
    pub quality: QualityTier,
    pub fps: f64,
}

impl ExportProfile {
    pub fn new(format: ExportFormat, quality: QualityTier) -> Self {
        Self {
            format,
            quality,
            fps: DEFAULT_FPS,
        }
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn resolution(&self) -> Resolution {
        self.quality.resolution()
    }

    pub fn width(&self) -> u32 {
        self.resolution().width
    }

    pub fn height(&self) -> u32 {
        self.resolution().height
    }

    pub fn bitrate_kbps(&self) -> u32 {
        self.resolution().bitrate_kbps
    }

    /// Seconds between consecutive frames
    pub fn frame_interval(&self) -> f64 {
        1.0 / self.fps
    }
}

impl Default for ExportProfile {
    fn default() -> Self {
        Self::new(ExportFormat::default(), QualityTier::default())
    }
}

impl fmt::Display for ExportProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let res = self.resolution();
        write!(
            f,
            "{} {} ({}x{}, {} kbps, {} fps)",
            self.format, self.quality, res.width, res.height, res.bitrate_kbps, self.fps
        )
    }
}

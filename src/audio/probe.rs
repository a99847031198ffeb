use std::fs::File;
use std::path::Path;

use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::{AudioError, Result};

/// Basic facts about an audio track; the samples themselves are never decoded
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    /// Length in seconds
    pub duration: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Lower-case file extension
    pub format: String,
}

/// Reads the duration of an audio file to size a timeline
pub struct AudioProbe;

impl AudioProbe {
    /// Check if a path has a supported audio extension
    pub fn is_supported<P: AsRef<Path>>(path: P) -> bool {
        matches!(
            extension_of(path.as_ref()).as_str(),
            "wav" | "mp3" | "flac" | "ogg" | "m4a" | "aac"
        )
    }

    /// Duration of the track in seconds
    pub fn duration<P: AsRef<Path>>(path: P) -> Result<f64> {
        Ok(Self::probe(path)?.duration)
    }

    /// Read track metadata
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<AudioInfo> {
        let path = path.as_ref();
        let extension = extension_of(path);

        let info = match extension.as_str() {
            "wav" => Self::probe_wav(path)?,
            "mp3" | "flac" | "ogg" | "m4a" | "aac" => Self::probe_with_symphonia(path, &extension)?,
            _ => return Err(AudioError::UnsupportedFormat { format: extension }.into()),
        };

        debug!(
            "Probed {:?}: {:.3}s, {} Hz, {} channels",
            path, info.duration, info.sample_rate, info.channels
        );
        Ok(info)
    }

    /// WAV headers via hound
    fn probe_wav(path: &Path) -> Result<AudioInfo> {
        let reader = hound::WavReader::open(path)
            .map_err(|_| AudioError::LoadFailed {
                path: path.display().to_string()
            })?;

        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return Err(AudioError::DurationUnavailable {
                path: path.display().to_string()
            }.into());
        }

        Ok(AudioInfo {
            duration: reader.duration() as f64 / spec.sample_rate as f64,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            format: "wav".to_string(),
        })
    }

    /// Other containers via symphonia: frame count from the track header, or
    /// summed packet durations when the header does not carry it
    fn probe_with_symphonia(path: &Path, extension: &str) -> Result<AudioInfo> {
        let file = File::open(path)
            .map_err(|_| AudioError::LoadFailed {
                path: path.display().to_string()
            })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        hint.with_extension(extension);

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|_| AudioError::LoadFailed {
                path: path.display().to_string()
            })?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::LoadFailed {
                path: path.display().to_string()
            })?;

        let track_id = track.id;
        let params = &track.codec_params;
        let sample_rate = params
            .sample_rate
            .filter(|rate| *rate > 0)
            .ok_or_else(|| AudioError::DurationUnavailable {
                path: path.display().to_string()
            })?;
        let channels = params.channels.map(|c| c.count() as u16).unwrap_or(0);
        let header_frames = params.n_frames;

        let frames = match header_frames {
            Some(frames) => frames,
            None => {
                let mut frames = 0u64;
                loop {
                    match format.next_packet() {
                        Ok(packet) if packet.track_id() == track_id => frames += packet.dur(),
                        Ok(_) => continue,
                        Err(SymphoniaError::ResetRequired) => continue,
                        Err(_) => break,
                    }
                }
                frames
            }
        };

        if frames == 0 {
            return Err(AudioError::DurationUnavailable {
                path: path.display().to_string()
            }.into());
        }

        Ok(AudioInfo {
            duration: frames as f64 / sample_rate as f64,
            sample_rate,
            channels,
            format: extension.to_string(),
        })
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase()
}

//! # Audio Probe
//!
//! The composition only needs the length of its soundtrack. WAV files are
//! read with `hound`; mp3, flac, ogg and m4a are probed with `symphonia`.
//!
//! ```rust,no_run
//! use reel_compositor::audio::AudioProbe;
//!
//! # fn main() -> reel_compositor::Result<()> {
//! let seconds = AudioProbe::duration("song.wav")?;
//! println!("Soundtrack runs {:.1}s", seconds);
//! # Ok(())
//! # }
//! ```

pub mod probe;

pub use probe::{AudioInfo, AudioProbe};

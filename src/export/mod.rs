//! # Export
//!
//! Drives the clip assembler over a whole timeline and hands frames, in
//! timestamp order, to an encoding sink while reporting progress.
//!
//! Byte-level encoding belongs to the sink. The bundled
//! [`PngSequenceSink`] writes numbered PNG frames plus a manifest, which an
//! external encoder can turn into a container of the profile's format.

pub mod coordinator;
pub mod profile;
pub mod sink;

pub use coordinator::{
    export, CancellationToken, ExportCoordinator, ExportOutcome, ExportProgress, ExportSession,
    ExportState, GapPolicy,
};
pub use profile::{ExportFormat, ExportProfile, QualityTier, Resolution, DEFAULT_FPS};
pub use sink::{
    ArtifactHandle, FrameSink, InMemorySink, PngSequenceSink, SequenceManifest, SinkConfig,
    MANIFEST_FILE,
};

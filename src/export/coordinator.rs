use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::assembler::{frame_count, ClipAssembler};
use crate::config::{Config, RenderConfig};
use crate::error::{CompositorError, ConfigError, ExportError, Result};
use crate::export::profile::ExportProfile;
use crate::export::sink::{ArtifactHandle, FrameSink, SinkConfig};
use crate::timeline::Timeline;

/// How an export treats time ranges no item covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GapPolicy {
    /// Fail with `IncompleteTimeline` before any frame work
    #[default]
    Reject,
    /// Render uncovered ranges as background frames
    BlackFrames,
}

/// Lifecycle stage of an export session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportState {
    Preparing,
    Rendering,
    Finalizing,
    Completed,
    Cancelled,
    Failed,
}

/// Export progress information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportProgress {
    /// Frames handed to the sink so far
    pub frame: u64,
    /// Total frames in the session
    pub total_frames: u64,
    /// Completion in [0, 100], never decreasing within a session
    pub percent: f64,
    pub state: ExportState,
}

impl ExportProgress {
    fn new(frame: u64, total_frames: u64, state: ExportState) -> Self {
        let percent = if total_frames == 0 {
            0.0
        } else {
            (frame as f64 / total_frames as f64 * 100.0).clamp(0.0, 100.0)
        };
        Self {
            frame,
            total_frames,
            percent,
            state,
        }
    }

    fn with_state(&self, state: ExportState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }
}

/// Cooperative cancellation signal checked between frames
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Terminal state of an export that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Completed(ArtifactHandle),
    /// Stopped by the cancellation token; the sink was aborted
    Cancelled { progress: ExportProgress },
}

impl ExportOutcome {
    pub fn artifact(&self) -> Option<&ArtifactHandle> {
        match self {
            Self::Completed(handle) => Some(handle),
            Self::Cancelled { .. } => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Drives a clip assembler across a timeline and feeds a frame sink
#[derive(Debug, Clone)]
pub struct ExportCoordinator {
    render: RenderConfig,
    gap_policy: GapPolicy,
    progress_every: u64,
}

impl Default for ExportCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportCoordinator {
    pub fn new() -> Self {
        Self {
            render: RenderConfig::default(),
            gap_policy: GapPolicy::default(),
            progress_every: 1,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            render: config.render.clone(),
            gap_policy: config.export.gap_policy,
            progress_every: config.export.progress_every.max(1),
        }
    }

    pub fn with_gap_policy(mut self, policy: GapPolicy) -> Self {
        self.gap_policy = policy;
        self
    }

    pub fn with_progress_every(mut self, frames: u64) -> Self {
        self.progress_every = frames.max(1);
        self
    }

    pub fn gap_policy(&self) -> GapPolicy {
        self.gap_policy
    }

    /// Export `timeline` into `sink`, blocking until done.
    ///
    /// Preconditions (non-empty timeline, gap policy) are checked before the
    /// sink is touched. The token is checked before every frame; on
    /// cancellation or failure the sink is aborted. Progress events are
    /// delivered through `on_progress` in order.
    pub fn run<S, F>(
        &self,
        timeline: &Timeline,
        profile: &ExportProfile,
        sink: &mut S,
        token: &CancellationToken,
        mut on_progress: F,
    ) -> Result<ExportOutcome>
    where
        S: FrameSink + ?Sized,
        F: FnMut(ExportProgress),
    {
        if !(profile.fps.is_finite() && profile.fps > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "profile.fps".to_string(),
                value: profile.fps.to_string(),
            }
            .into());
        }
        if timeline.is_empty() {
            return Err(ExportError::EmptyTimeline.into());
        }

        let gaps = timeline.gaps();
        if !gaps.is_empty() {
            match self.gap_policy {
                GapPolicy::Reject => return Err(ExportError::IncompleteTimeline { gaps }.into()),
                GapPolicy::BlackFrames => {
                    warn!("Rendering {} uncovered interval(s) as background", gaps.len())
                }
            }
        }

        let total = frame_count(timeline.target_duration(), profile.fps);
        if total == 0 {
            return Err(ExportError::EmptyTimeline.into());
        }

        info!("Exporting {} frames as {}", total, profile);
        let mut progress = ExportProgress::new(0, total, ExportState::Preparing);
        on_progress(progress.clone());

        let mut assembler = ClipAssembler::with_config(profile.width(), profile.height(), &self.render)?;
        assembler.prefetch(timeline);

        sink.begin(SinkConfig {
            profile: *profile,
            width: profile.width(),
            height: profile.height(),
            fps: profile.fps,
            total_frames: total,
        })
        .map_err(|e| ExportError::Encoder {
            frame: 0,
            reason: e.to_string(),
            progress: progress.with_state(ExportState::Failed),
        })?;

        let mut frames = assembler.frames(timeline, profile.fps);
        loop {
            if token.is_cancelled() {
                sink.abort();
                let cancelled = progress.with_state(ExportState::Cancelled);
                on_progress(cancelled.clone());
                info!("Export cancelled after {} of {} frames", cancelled.frame, total);
                return Ok(ExportOutcome::Cancelled { progress: cancelled });
            }

            let index = frames.position();
            let frame = match frames.next_composed() {
                None => break,
                Some(Ok(frame)) => frame,
                Some(Err(fault)) => {
                    sink.abort();
                    let failed = progress.with_state(ExportState::Failed);
                    on_progress(failed.clone());
                    return Err(ExportError::Frame {
                        frame: index,
                        timestamp: index as f64 / profile.fps,
                        item: fault.item,
                        reason: fault.error.to_string(),
                        progress: failed,
                    }
                    .into());
                }
            };

            if let Err(e) = sink.push_frame(&frame) {
                sink.abort();
                let failed = progress.with_state(ExportState::Failed);
                on_progress(failed.clone());
                return Err(ExportError::Encoder {
                    frame: index,
                    reason: e.to_string(),
                    progress: failed,
                }
                .into());
            }

            let done = index + 1;
            progress = ExportProgress::new(done, total, ExportState::Rendering);
            if done % self.progress_every == 0 || done == total {
                on_progress(progress.clone());
            }
        }

        progress = ExportProgress::new(total, total, ExportState::Finalizing);
        on_progress(progress.clone());

        let handle = match sink.finish() {
            Ok(handle) => handle,
            Err(e) => {
                sink.abort();
                let failed = progress.with_state(ExportState::Failed);
                on_progress(failed.clone());
                return Err(ExportError::Encoder {
                    frame: total,
                    reason: e.to_string(),
                    progress: failed,
                }
                .into());
            }
        };

        on_progress(progress.with_state(ExportState::Completed));
        info!("Export complete: {}", handle);
        Ok(ExportOutcome::Completed(handle))
    }
}

/// A running background export
pub struct ExportSession {
    /// Progress events in order; closes when the session ends
    pub progress: mpsc::UnboundedReceiver<ExportProgress>,
    pub handle: JoinHandle<Result<ExportOutcome>>,
}

impl ExportSession {
    /// Wait for the terminal result, discarding undelivered progress
    pub async fn wait(self) -> Result<ExportOutcome> {
        self.handle.await.map_err(|e| {
            CompositorError::from(ExportError::TaskFailed {
                reason: e.to_string(),
            })
        })?
    }
}

/// Start an export on the blocking thread pool.
///
/// Must be called from within a Tokio runtime. Frame production stays
/// sequential; progress is streamed through the session's channel.
pub fn export<S>(
    coordinator: ExportCoordinator,
    timeline: Timeline,
    profile: ExportProfile,
    mut sink: S,
    token: CancellationToken,
) -> ExportSession
where
    S: FrameSink + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::task::spawn_blocking(move || {
        coordinator.run(&timeline, &profile, &mut sink, &token, |event| {
            // A dropped receiver only means nobody is listening
            let _ = tx.send(event);
        })
    });

    ExportSession {
        progress: rx,
        handle,
    }
}

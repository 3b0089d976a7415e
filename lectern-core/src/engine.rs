//! Playback engine port.
//!
//! The engine wraps whatever actually renders video (a hosted player SDK, a
//! native pipeline). Every command is asynchronous and fallible; the
//! coordinator catches and logs failures rather than letting them reach the
//! user. `load` resolves once the media is ready to play, which is this
//! crate's rendition of a separate "ready" callback.

use async_trait::async_trait;
use lectern_model::MediaRef;

use crate::error::Result;

#[async_trait]
pub trait VideoEngine: Send + Sync {
    /// Load new media, resolving once it is ready to play.
    async fn load(&self, media: &MediaRef) -> Result<()>;

    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    /// Jump to an absolute position in seconds.
    async fn seek(&self, secs: f64) -> Result<()>;

    /// Change the playback rate (1.0 = normal).
    async fn set_rate(&self, rate: f64) -> Result<()>;

    /// Current position in seconds.
    async fn position(&self) -> Result<f64>;

    /// Total duration of the loaded media in seconds.
    async fn duration(&self) -> Result<f64>;
}

/// Events the engine pushes at the coordinator.
///
/// `PositionTick` arrives at sub-second to low-second granularity during
/// playback and is the sole driver of progress-sync side effects.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PositionTick { secs: f64, duration: f64 },
    Played,
    Paused,
    Ended,
    RateChanged(f64),
}

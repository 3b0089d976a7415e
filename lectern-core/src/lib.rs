//! Playback and progress coordination core for the Lectern lesson platform.
//!
//! The centerpiece is the [`coordinator::PlaybackCoordinator`], which owns
//! the current-lecture concept, mediates engine events into store writes,
//! and runs the auto-advance state machine. It talks to the outside world
//! through three ports: a [`engine::VideoEngine`] wrapping whatever renders
//! video, a [`stores::ResumeStore`] caching the last watched position
//! locally, and a [`stores::ProgressStore`] persisting progress to the
//! backend. Every port failure is logged and dropped; playback stays usable
//! with zero persistence available.
//!
//! ## Wiring
//!
//! ```no_run
//! use std::sync::Arc;
//! use lectern_core::{
//!     CoordinatorConfig, HttpProgressStore, JsonResumeStore, LectureCatalog,
//!     PlaybackCoordinator,
//! };
//! # use lectern_core::testing::StubEngine;
//! # async fn wire(detail: lectern_model::CourseDetail) {
//! let (events_tx, events_rx) = PlaybackCoordinator::channel();
//! let mut coordinator = PlaybackCoordinator::new(
//!     LectureCatalog::from_course(detail),
//!     Arc::new(StubEngine::new()),
//!     Arc::new(JsonResumeStore::new()),
//!     Arc::new(HttpProgressStore::new("http://localhost:3000")),
//!     CoordinatorConfig::default(),
//!     events_tx,
//! );
//!
//! // Probe the backend, merge remote completions, surface a resume offer
//! let _offer = coordinator.initialize().await;
//!
//! // Feed engine events and user commands through the channel
//! coordinator.run(events_rx).await;
//! # }
//! ```

pub mod catalog;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod session;
pub mod stores;
pub mod testing;
pub mod timer;

pub use catalog::{LectureCatalog, SectionEntry};
pub use coordinator::{
    AutoAdvanceState, CoordinatorConfig, CoordinatorEvent, PlaybackCoordinator, ResumeOffer,
};
pub use engine::{EngineEvent, VideoEngine};
pub use error::{CoreError, Result};
pub use session::{CourseState, PlaybackSession, ProgressSummary, SectionProgress};
pub use stores::{HttpProgressStore, JsonResumeStore, ProgressStore, ResumeStore};

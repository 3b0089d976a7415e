//! Hand-rolled test doubles for the coordinator's ports.
//!
//! A scripted engine that records every command it receives, an in-memory
//! resume slot, and a progress store with seedable fetch results and
//! injectable write failures. Used by the integration tests and available
//! to downstream crates that embed the coordinator.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use lectern_model::{CourseId, LectureId, LectureProgress, MediaRef, ResumeRecord, UserId};

use crate::engine::VideoEngine;
use crate::error::{CoreError, Result};
use crate::stores::{ProgressStore, ResumeStore};

/// A command the stub engine received, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    Load(MediaRef),
    Play,
    Pause,
    Seek(f64),
    SetRate(f64),
}

/// Engine double that records commands and resolves them immediately (or
/// after a configured delay, to exercise stale-completion handling).
#[derive(Debug, Default)]
pub struct StubEngine {
    commands: Mutex<Vec<EngineCommand>>,
    load_delay: Option<Duration>,
}

impl StubEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `load` take this long, simulating a slow media pipeline.
    pub fn with_load_delay(delay: Duration) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            load_delay: Some(delay),
        }
    }

    pub fn commands(&self) -> Vec<EngineCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub fn load_count(&self) -> usize {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, EngineCommand::Load(_)))
            .count()
    }

    fn record(&self, command: EngineCommand) {
        self.commands.lock().unwrap().push(command);
    }
}

#[async_trait]
impl VideoEngine for StubEngine {
    async fn load(&self, media: &MediaRef) -> Result<()> {
        self.record(EngineCommand::Load(media.clone()));
        if let Some(delay) = self.load_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        self.record(EngineCommand::Play);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.record(EngineCommand::Pause);
        Ok(())
    }

    async fn seek(&self, secs: f64) -> Result<()> {
        self.record(EngineCommand::Seek(secs));
        Ok(())
    }

    async fn set_rate(&self, rate: f64) -> Result<()> {
        self.record(EngineCommand::SetRate(rate));
        Ok(())
    }

    async fn position(&self) -> Result<f64> {
        Ok(0.0)
    }

    async fn duration(&self) -> Result<f64> {
        Ok(0.0)
    }
}

/// In-memory single-slot resume store honoring the same floor and expiry
/// rules as the file-backed one.
#[derive(Debug, Default)]
pub struct MemoryResumeStore {
    slot: Mutex<Option<ResumeRecord>>,
}

impl MemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: ResumeRecord) -> Self {
        Self {
            slot: Mutex::new(Some(record)),
        }
    }

    pub fn current(&self) -> Option<ResumeRecord> {
        self.slot.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn write(&self, record: &ResumeRecord) {
        if !record.is_persistable() {
            return;
        }
        *self.slot.lock().unwrap() = Some(record.clone());
    }

    async fn read(&self) -> Option<ResumeRecord> {
        let mut slot = self.slot.lock().unwrap();
        match &*slot {
            Some(record)
                if record.is_expired(chrono::Utc::now().timestamp_millis())
                    || !record.is_persistable() =>
            {
                *slot = None;
                None
            }
            other => other.clone(),
        }
    }

    async fn clear(&self) {
        *self.slot.lock().unwrap() = None;
    }
}

/// A write the stub progress store received, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpsert {
    Position { lecture: LectureId, secs: u32 },
    Completion { lecture: LectureId },
}

/// Progress store double with configurable reachability, seedable fetch
/// results, and injectable write failures.
#[derive(Debug, Default)]
pub struct StubProgressStore {
    reachable: bool,
    seeded: Vec<LectureProgress>,
    fail_writes: AtomicBool,
    upserts: Mutex<Vec<ProgressUpsert>>,
}

impl StubProgressStore {
    pub fn reachable() -> Self {
        Self {
            reachable: true,
            ..Self::default()
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn with_seeded(mut self, records: Vec<LectureProgress>) -> Self {
        self.seeded = records;
        self
    }

    /// Make every subsequent write fail, as a flaky network would.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn upserts(&self) -> Vec<ProgressUpsert> {
        self.upserts.lock().unwrap().clone()
    }

    fn check_failure(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(CoreError::RemoteRejected("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProgressStore for StubProgressStore {
    async fn check_reachable(&self) -> bool {
        self.reachable
    }

    async fn upsert_position(
        &self,
        _user: UserId,
        lecture: &LectureId,
        position_secs: u32,
    ) -> Result<()> {
        self.check_failure()?;
        self.upserts.lock().unwrap().push(ProgressUpsert::Position {
            lecture: lecture.clone(),
            secs: position_secs,
        });
        Ok(())
    }

    async fn upsert_completion(&self, _user: UserId, lecture: &LectureId) -> Result<()> {
        self.check_failure()?;
        self.upserts
            .lock()
            .unwrap()
            .push(ProgressUpsert::Completion {
                lecture: lecture.clone(),
            });
        Ok(())
    }

    async fn fetch_course_progress(
        &self,
        _user: UserId,
        _course: CourseId,
    ) -> Result<Vec<LectureProgress>> {
        Ok(self.seeded.clone())
    }
}

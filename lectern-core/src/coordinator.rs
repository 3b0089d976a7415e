//! Playback coordinator.
//!
//! Owns the "current lecture" concept and reconciles three independently
//! evolving pieces of state: the live engine position, the local resume
//! cache, and the remotely persisted progress. Also runs the auto-advance
//! state machine (lecture end → countdown → next lecture, with
//! cancellation).
//!
//! The coordinator is single-threaded and event-driven: one owner consumes
//! [`CoordinatorEvent`]s (engine events, user commands, timer firings) and
//! mutates state through `handle_event`. Engine and store calls are spawned
//! fire-and-forget with failures logged; nothing in here can block or kill
//! playback. Async completions that outlive their lecture are rejected by
//! comparing a load generation and lecture identity against the current
//! ones, and timer messages carry the generation of the timer that
//! scheduled them so a late tick from a cancelled timer is discarded.

use std::future::Future;
use std::sync::Arc;

use lectern_model::{
    CourseId, DEMO_COURSE, DEMO_USER, LectureId, LectureProgress, ResumeRecord, UserId,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::catalog::LectureCatalog;
use crate::engine::{EngineEvent, VideoEngine};
use crate::error::Result;
use crate::session::{CourseState, PlaybackSession, ProgressSummary, SectionProgress};
use crate::stores::{ProgressStore, ResumeStore};
use crate::timer::CancellableTimer;

/// Tunables for the coordinator's sync channels and auto-advance.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub user: UserId,
    pub course: CourseId,
    /// Minimum position delta (seconds) between saves on either channel
    pub save_delta_secs: f64,
    /// Quiet period before a remote position upsert goes out
    pub debounce: std::time::Duration,
    /// Auto-advance countdown length, one tick per second
    pub countdown_ticks: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            user: DEMO_USER,
            course: DEMO_COURSE,
            save_delta_secs: 5.0,
            debounce: std::time::Duration::from_millis(3000),
            countdown_ticks: 5,
        }
    }
}

/// Everything that can drive the coordinator forward.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    Engine(EngineEvent),
    SelectLecture(LectureId),
    /// "Play now" during a countdown
    PlayNext,
    CancelAutoAdvance,
    VisibilityHidden,
    PageUnload,
    /// A spawned media load resolved; stale generations are dropped
    LoadFinished { lecture: LectureId, generation: u64 },
    /// The debounce window closed without a newer position report
    DebounceElapsed {
        lecture: LectureId,
        position_secs: u32,
        generation: u64,
    },
    CountdownTick { generation: u64 },
}

/// Saved-position offer presented on startup; never auto-played.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeOffer {
    pub lecture_id: LectureId,
    pub lecture_title: String,
    pub position_secs: u32,
}

/// Rendering view of the auto-advance state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum AutoAdvanceState {
    Idle,
    CountdownRunning {
        next: LectureId,
        next_title: String,
        remaining: u32,
    },
}

struct Countdown {
    next: LectureId,
    remaining: u32,
    generation: u64,
    _timer: CancellableTimer,
}

pub struct PlaybackCoordinator {
    catalog: LectureCatalog,
    engine: Arc<dyn VideoEngine>,
    resume_store: Arc<dyn ResumeStore>,
    progress_store: Arc<dyn ProgressStore>,
    config: CoordinatorConfig,

    session: PlaybackSession,
    course_state: CourseState,
    remote_reachable: bool,
    last_saved_position: f64,

    // Media load tracking; the generation rejects stale completions
    load_generation: u64,
    loading_lecture: Option<LectureId>,
    loaded_lecture: Option<LectureId>,
    pending_resume_seek: Option<(LectureId, u32)>,

    debounce_generation: u64,
    debounce: Option<CancellableTimer>,

    countdown_generation: u64,
    countdown: Option<Countdown>,

    events_tx: mpsc::UnboundedSender<CoordinatorEvent>,
}

impl PlaybackCoordinator {
    /// Build the event channel the coordinator and its timer tasks share.
    pub fn channel() -> (
        mpsc::UnboundedSender<CoordinatorEvent>,
        mpsc::UnboundedReceiver<CoordinatorEvent>,
    ) {
        mpsc::unbounded_channel()
    }

    pub fn new(
        catalog: LectureCatalog,
        engine: Arc<dyn VideoEngine>,
        resume_store: Arc<dyn ResumeStore>,
        progress_store: Arc<dyn ProgressStore>,
        config: CoordinatorConfig,
        events_tx: mpsc::UnboundedSender<CoordinatorEvent>,
    ) -> Self {
        let course_state = CourseState::new(&catalog);
        Self {
            catalog,
            engine,
            resume_store,
            progress_store,
            config,
            session: PlaybackSession::default(),
            course_state,
            remote_reachable: false,
            last_saved_position: 0.0,
            load_generation: 0,
            loading_lecture: None,
            loaded_lecture: None,
            pending_resume_seek: None,
            debounce_generation: 0,
            debounce: None,
            countdown_generation: 0,
            countdown: None,
            events_tx,
        }
    }

    // ---- accessors for rendering ------------------------------------

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn course_state(&self) -> &CourseState {
        &self.course_state
    }

    pub fn catalog(&self) -> &LectureCatalog {
        &self.catalog
    }

    pub fn remote_reachable(&self) -> bool {
        self.remote_reachable
    }

    pub fn course_summary(&self) -> ProgressSummary {
        self.course_state.course_summary()
    }

    pub fn section_summaries(&self) -> Vec<SectionProgress> {
        self.course_state.section_summaries(&self.catalog)
    }

    pub fn auto_advance(&self) -> AutoAdvanceState {
        match &self.countdown {
            Some(cd) => AutoAdvanceState::CountdownRunning {
                next: cd.next.clone(),
                next_title: self
                    .catalog
                    .title_for(&cd.next)
                    .unwrap_or_default()
                    .to_string(),
                remaining: cd.remaining,
            },
            None => AutoAdvanceState::Idle,
        }
    }

    // ---- initialization ---------------------------------------------

    /// One-shot startup work: probe the remote store, merge any remotely
    /// recorded completions into the catalog view, and look for a resumable
    /// local record. Never auto-plays; the returned offer is for the user
    /// to confirm.
    pub async fn initialize(&mut self) -> Option<ResumeOffer> {
        self.probe_remote().await;
        self.load_resume_offer().await
    }

    async fn probe_remote(&mut self) {
        self.remote_reachable = self.progress_store.check_reachable().await;
        if !self.remote_reachable {
            info!("Progress backend unavailable; remote sync disabled for this session");
            return;
        }

        let fetched = self
            .progress_store
            .fetch_course_progress(self.config.user, self.config.course)
            .await;
        match fetched {
            Ok(records) => self.merge_remote_progress(&records),
            Err(e) => warn!("Failed to fetch course progress: {}", e),
        }
    }

    fn merge_remote_progress(&mut self, records: &[LectureProgress]) {
        let mut applied = 0;
        for record in records.iter().filter(|r| r.completed) {
            if !self.catalog.contains(&record.lecture_id) {
                debug!(
                    "Ignoring remote progress for unknown lecture {}",
                    record.lecture_id
                );
                continue;
            }
            if self.course_state.apply_remote_completed(&record.lecture_id) {
                applied += 1;
            }
        }
        if applied > 0 {
            info!("Merged {} completed lectures from the progress backend", applied);
        }
    }

    async fn load_resume_offer(&mut self) -> Option<ResumeOffer> {
        let record = self.resume_store.read().await?;

        let Some(lecture) = self.catalog.get(&record.lecture_id) else {
            // The saved lecture is gone from the catalog; the record is
            // useless now
            debug!(
                "Purging resume record for vanished lecture {}",
                record.lecture_id
            );
            self.resume_store.clear().await;
            return None;
        };

        Some(ResumeOffer {
            lecture_id: lecture.id.clone(),
            lecture_title: lecture.title.clone(),
            position_secs: record.position_secs,
        })
    }

    // ---- event pump -------------------------------------------------

    /// Consume events until every sender is dropped.
    pub async fn run(mut self, mut events_rx: mpsc::UnboundedReceiver<CoordinatorEvent>) {
        while let Some(event) = events_rx.recv().await {
            self.handle_event(event);
        }
    }

    pub fn handle_event(&mut self, event: CoordinatorEvent) {
        match event {
            CoordinatorEvent::Engine(EngineEvent::PositionTick { secs, duration }) => {
                self.on_position(secs, duration)
            }
            CoordinatorEvent::Engine(EngineEvent::Played) => self.session.is_playing = true,
            CoordinatorEvent::Engine(EngineEvent::Paused) => self.on_paused(),
            CoordinatorEvent::Engine(EngineEvent::Ended) => self.on_ended(),
            CoordinatorEvent::Engine(EngineEvent::RateChanged(rate)) => {
                self.session.playback_rate = rate
            }
            CoordinatorEvent::SelectLecture(id) => self.select_lecture(&id),
            CoordinatorEvent::PlayNext => self.play_next_now(),
            CoordinatorEvent::CancelAutoAdvance => self.cancel_auto_advance(),
            CoordinatorEvent::VisibilityHidden => self.save_resume_now(),
            CoordinatorEvent::PageUnload => self.save_resume_now(),
            CoordinatorEvent::LoadFinished { lecture, generation } => {
                self.on_load_finished(lecture, generation)
            }
            CoordinatorEvent::DebounceElapsed {
                lecture,
                position_secs,
                generation,
            } => self.on_debounce_elapsed(lecture, position_secs, generation),
            CoordinatorEvent::CountdownTick { generation } => self.on_countdown_tick(generation),
        }
    }

    // ---- lecture selection ------------------------------------------

    /// Make `id` the current lecture and start playing it.
    ///
    /// Idempotent under rapid repeated calls: while a load for `id` is in
    /// flight a second call is a pure no-op, and once `id` is loaded a
    /// repeat selection restarts from zero instead of reloading media.
    /// Always cancels a running auto-advance countdown.
    pub fn select_lecture(&mut self, id: &LectureId) {
        if !self.catalog.contains(id) {
            warn!("Ignoring selection of unknown lecture {}", id);
            return;
        }

        self.countdown = None;

        if self.session.current_lecture.as_ref() == Some(id) {
            if self.loading_lecture.as_ref() == Some(id) {
                // Load already in flight; a duplicate would race it
                return;
            }
            if self.loaded_lecture.as_ref() == Some(id) {
                debug!("Restarting {} in place", id);
                self.session.last_observed_position = 0.0;
                self.last_saved_position = 0.0;
                let engine = Arc::clone(&self.engine);
                spawn_logged("restart", async move {
                    engine.seek(0.0).await?;
                    engine.play().await
                });
                return;
            }
        }

        let title = self.catalog.title_for(id).unwrap_or_default().to_string();
        info!("Selecting lecture {} ({})", id, title);

        self.course_state.set_playing(id);
        self.session.switch_to(id.clone(), title);
        self.last_saved_position = 0.0;

        self.load_generation += 1;
        self.loading_lecture = Some(id.clone());
        self.loaded_lecture = None;

        let Some(media) = self.catalog.media_ref_for(id).cloned() else {
            return;
        };
        let engine = Arc::clone(&self.engine);
        let events_tx = self.events_tx.clone();
        let lecture = id.clone();
        let generation = self.load_generation;
        tokio::spawn(async move {
            match engine.load(&media).await {
                Ok(()) => {
                    let _ = events_tx.send(CoordinatorEvent::LoadFinished { lecture, generation });
                }
                Err(e) => warn!("Failed to load media for {}: {}", lecture, e),
            }
        });
    }

    fn on_load_finished(&mut self, lecture: LectureId, generation: u64) {
        if generation != self.load_generation
            || self.session.current_lecture.as_ref() != Some(&lecture)
        {
            debug!("Dropping stale load completion for {}", lecture);
            return;
        }

        self.loading_lecture = None;
        self.loaded_lecture = Some(lecture.clone());

        let resume_to = match self.pending_resume_seek.take() {
            Some((id, secs)) if id == lecture => Some(secs as f64),
            other => {
                // A pending seek for a different lecture is stale
                if other.is_some() {
                    debug!("Discarding resume seek for superseded lecture");
                }
                None
            }
        };

        let engine = Arc::clone(&self.engine);
        spawn_logged("start playback", async move {
            if let Some(secs) = resume_to {
                engine.seek(secs).await?;
            }
            engine.play().await
        });
    }

    // ---- progress synchronization -----------------------------------

    /// Periodic position report: the sole driver of sync side effects.
    /// Cheap on the hot path; remote work is only ever scheduled, never
    /// performed inline.
    fn on_position(&mut self, secs: f64, duration: f64) {
        if self.session.is_seeking {
            return;
        }
        self.session.last_observed_position = secs;
        self.session.duration = duration;

        let Some(current) = self.session.current_lecture.clone() else {
            return;
        };

        if (secs - self.last_saved_position).abs() < self.config.save_delta_secs {
            return;
        }
        self.last_saved_position = secs;

        self.write_resume_record(&current, secs);

        if self.remote_reachable {
            self.schedule_position_upsert(&current, secs);
        }
    }

    fn on_paused(&mut self) {
        self.session.is_playing = false;
        // Pause is a natural stopping point; persist without waiting for
        // the delta threshold
        self.save_resume_now();
    }

    /// Immediate save from already-observed state. Used for pause,
    /// visibility-hidden, and unload, where querying the engine again is
    /// either wasteful or impossible.
    fn save_resume_now(&mut self) {
        if let Some(current) = self.session.current_lecture.clone() {
            self.write_resume_record(&current, self.session.last_observed_position);
        }
    }

    fn write_resume_record(&self, lecture: &LectureId, position: f64) {
        let record = ResumeRecord::new(
            lecture.clone(),
            self.session.current_lecture_name.clone(),
            position.max(0.0).floor() as u32,
            chrono::Utc::now().timestamp_millis(),
        );
        let store = Arc::clone(&self.resume_store);
        tokio::spawn(async move {
            store.write(&record).await;
        });
    }

    /// Replace any pending upsert with one for the latest position; only
    /// the newest report in a burst survives the quiet period.
    fn schedule_position_upsert(&mut self, lecture: &LectureId, position: f64) {
        self.debounce_generation += 1;
        let generation = self.debounce_generation;
        let events_tx = self.events_tx.clone();
        let lecture = lecture.clone();
        let position_secs = position.max(0.0).floor() as u32;
        let quiet = self.config.debounce;

        self.debounce = Some(CancellableTimer::spawn(async move {
            tokio::time::sleep(quiet).await;
            let _ = events_tx.send(CoordinatorEvent::DebounceElapsed {
                lecture,
                position_secs,
                generation,
            });
        }));
    }

    fn on_debounce_elapsed(&mut self, lecture: LectureId, position_secs: u32, generation: u64) {
        if generation != self.debounce_generation {
            // A newer report replaced this timer after it fired
            return;
        }
        self.debounce = None;

        if !self.remote_reachable {
            return;
        }

        let store = Arc::clone(&self.progress_store);
        let user = self.config.user;
        spawn_logged("position upsert", async move {
            store.upsert_position(user, &lecture, position_secs).await
        });
    }

    // ---- lecture end & auto-advance ---------------------------------

    fn on_ended(&mut self) {
        self.session.is_playing = false;

        let Some(current) = self.session.current_lecture.clone() else {
            return;
        };
        info!("Lecture {} ended", current);

        // Finished lectures have nothing to resume
        let resume_store = Arc::clone(&self.resume_store);
        tokio::spawn(async move {
            resume_store.clear().await;
        });

        self.course_state.set_completed(&current);

        // Completions go out immediately; debouncing only applies to
        // position noise
        if self.remote_reachable {
            let store = Arc::clone(&self.progress_store);
            let user = self.config.user;
            let lecture = current.clone();
            spawn_logged("completion upsert", async move {
                store.upsert_completion(user, &lecture).await
            });
        }

        if let Some(next) = self.next_lecture_after(&current) {
            self.start_countdown(next);
        }
    }

    /// Next lecture in catalog order; when the current id cannot be
    /// located, fall back to the first still-pending lecture.
    fn next_lecture_after(&self, current: &LectureId) -> Option<LectureId> {
        if self.catalog.contains(current) {
            self.catalog.next_after(current).map(|l| l.id.clone())
        } else {
            self.course_state.first_pending(&self.catalog).cloned()
        }
    }

    fn start_countdown(&mut self, next: LectureId) {
        // Replacing the countdown drops (and aborts) any running one, so
        // there is never more than a single live ticker
        self.countdown_generation += 1;
        let generation = self.countdown_generation;
        let events_tx = self.events_tx.clone();

        let timer = CancellableTimer::spawn(async move {
            loop {
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                if events_tx
                    .send(CoordinatorEvent::CountdownTick { generation })
                    .is_err()
                {
                    break;
                }
            }
        });

        info!(
            "Auto-advance to {} in {} seconds",
            next, self.config.countdown_ticks
        );
        self.countdown = Some(Countdown {
            next,
            remaining: self.config.countdown_ticks,
            generation,
            _timer: timer,
        });
    }

    fn on_countdown_tick(&mut self, generation: u64) {
        let elapsed = {
            let Some(cd) = self.countdown.as_mut() else {
                return;
            };
            if cd.generation != generation {
                // Tick from a ticker that was already replaced
                return;
            }
            cd.remaining = cd.remaining.saturating_sub(1);
            cd.remaining == 0
        };

        if elapsed {
            self.play_next_now();
        }
    }

    /// Advance immediately: countdown hit zero or the user pressed
    /// "play now". A no-op when no countdown is running, so a double press
    /// cannot advance twice.
    pub fn play_next_now(&mut self) {
        let Some(cd) = self.countdown.take() else {
            return;
        };
        let next = cd.next.clone();
        drop(cd);
        self.select_lecture(&next);
    }

    /// Abandon the pending auto-advance; playback stays stopped on the
    /// ended lecture.
    pub fn cancel_auto_advance(&mut self) {
        if self.countdown.take().is_some() {
            info!("Auto-advance cancelled");
        }
    }

    // ---- resume-on-reload -------------------------------------------

    /// User confirmed the resume offer: play that lecture from the saved
    /// position. The seek is applied only once the load for this same
    /// lecture completes.
    pub fn resume(&mut self, offer: &ResumeOffer) {
        self.pending_resume_seek = Some((offer.lecture_id.clone(), offer.position_secs));
        self.select_lecture(&offer.lecture_id);
    }

    /// User chose to start over: forget the record and play from zero.
    pub fn start_over(&mut self, offer: &ResumeOffer) {
        let store = Arc::clone(&self.resume_store);
        tokio::spawn(async move {
            store.clear().await;
        });
        self.select_lecture(&offer.lecture_id);
    }

    // ---- misc user input --------------------------------------------

    /// Seek-bar drag state; position reports are ignored while seeking.
    pub fn set_seeking(&mut self, seeking: bool) {
        self.session.is_seeking = seeking;
    }

    /// Ask the engine for a new playback rate. The session's rate updates
    /// when the engine confirms via `RateChanged`.
    pub fn set_playback_rate(&self, rate: f64) {
        let engine = Arc::clone(&self.engine);
        spawn_logged("rate change", async move { engine.set_rate(rate).await });
    }
}

/// Fire-and-forget a fallible operation, logging the failure. Errors from
/// the engine or the stores must never propagate into playback.
fn spawn_logged<F>(label: &'static str, future: F)
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = future.await {
            warn!("{} failed: {}", label, e);
        }
    });
}

//! Behavioral tests for the playback coordinator, driven with a paused
//! clock and the stub ports from `lectern_core::testing`.

use std::sync::Arc;
use std::time::Duration;

use lectern_core::catalog::LectureCatalog;
use lectern_core::coordinator::{
    AutoAdvanceState, CoordinatorConfig, CoordinatorEvent, PlaybackCoordinator,
};
use lectern_core::engine::EngineEvent;
use lectern_core::testing::{
    EngineCommand, MemoryResumeStore, ProgressUpsert, StubEngine, StubProgressStore,
};
use lectern_model::{
    CourseDetail, CourseId, Lecture, LectureId, LectureProgress, LectureStatus, MediaRef,
    ResumeRecord, Section, SectionId, UserId,
};
use tokio::sync::mpsc::UnboundedReceiver;

fn lecture(id: &str, order: u32) -> Lecture {
    Lecture {
        id: LectureId::from(id),
        title: format!("Lecture {id}"),
        description: None,
        media_ref: MediaRef::new(format!("media-{id}")),
        duration_secs: Some(300),
        sort_order: order,
    }
}

fn catalog() -> LectureCatalog {
    LectureCatalog::from_course(CourseDetail {
        id: CourseId(1),
        title: "Demo course".into(),
        sections: vec![
            Section {
                id: SectionId::from("s1"),
                title: "Basics".into(),
                sort_order: 1,
                lectures: vec![lecture("1-1", 1), lecture("1-2", 2)],
            },
            Section {
                id: SectionId::from("s2"),
                title: "Advanced".into(),
                sort_order: 2,
                lectures: vec![lecture("2-1", 1), lecture("2-2", 2)],
            },
        ],
    })
}

struct Harness {
    coordinator: PlaybackCoordinator,
    events_rx: UnboundedReceiver<CoordinatorEvent>,
    engine: Arc<StubEngine>,
    resume: Arc<MemoryResumeStore>,
    remote: Arc<StubProgressStore>,
}

impl Harness {
    fn build(engine: StubEngine, resume: MemoryResumeStore, remote: StubProgressStore) -> Self {
        let engine = Arc::new(engine);
        let resume = Arc::new(resume);
        let remote = Arc::new(remote);
        let (events_tx, events_rx) = PlaybackCoordinator::channel();
        let coordinator = PlaybackCoordinator::new(
            catalog(),
            Arc::clone(&engine) as Arc<dyn lectern_core::VideoEngine>,
            Arc::clone(&resume) as Arc<dyn lectern_core::ResumeStore>,
            Arc::clone(&remote) as Arc<dyn lectern_core::ProgressStore>,
            CoordinatorConfig::default(),
            events_tx,
        );
        Self {
            coordinator,
            events_rx,
            engine,
            resume,
            remote,
        }
    }

    fn reachable() -> Self {
        Self::build(
            StubEngine::new(),
            MemoryResumeStore::new(),
            StubProgressStore::reachable(),
        )
    }

    fn unreachable() -> Self {
        Self::build(
            StubEngine::new(),
            MemoryResumeStore::new(),
            StubProgressStore::unreachable(),
        )
    }

    /// Let spawned tasks run and feed any queued events back in.
    async fn settle(&mut self) {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        while let Ok(event) = self.events_rx.try_recv() {
            self.coordinator.handle_event(event);
            for _ in 0..16 {
                tokio::task::yield_now().await;
            }
        }
    }

    /// Advance the paused clock one second at a time, settling after each
    /// step so repeating timers can reschedule.
    async fn tick_seconds(&mut self, seconds: u64) {
        for _ in 0..seconds {
            tokio::time::advance(Duration::from_secs(1)).await;
            self.settle().await;
        }
    }

    async fn select(&mut self, id: &str) {
        self.coordinator.select_lecture(&LectureId::from(id));
        self.settle().await;
    }

    async fn position(&mut self, secs: f64) {
        self.coordinator
            .handle_event(CoordinatorEvent::Engine(EngineEvent::PositionTick {
                secs,
                duration: 300.0,
            }));
        self.settle().await;
    }

    async fn ended(&mut self) {
        self.coordinator
            .handle_event(CoordinatorEvent::Engine(EngineEvent::Ended));
        self.settle().await;
    }

    fn status(&self, id: &str) -> Option<LectureStatus> {
        self.coordinator.course_state().status(&LectureId::from(id))
    }
}

#[tokio::test(start_paused = true)]
async fn rapid_double_select_loads_media_once() {
    let mut h = Harness::reachable();

    h.coordinator.select_lecture(&LectureId::from("1-1"));
    h.coordinator.select_lecture(&LectureId::from("1-1"));
    h.settle().await;

    assert_eq!(h.engine.load_count(), 1);
    assert_eq!(h.status("1-1"), Some(LectureStatus::Playing));
    // The single load still starts playback
    assert!(h.engine.commands().contains(&EngineCommand::Play));
}

#[tokio::test(start_paused = true)]
async fn reselecting_a_loaded_lecture_restarts_in_place() {
    let mut h = Harness::reachable();

    h.select("1-1").await;
    h.position(42.0).await;
    h.select("1-1").await;

    assert_eq!(h.engine.load_count(), 1, "no media reload on restart");
    assert!(h.engine.commands().contains(&EngineCommand::Seek(0.0)));
    assert_eq!(h.coordinator.session().last_observed_position, 0.0);
}

#[tokio::test(start_paused = true)]
async fn stale_load_completion_is_dropped() {
    let mut h = Harness::build(
        StubEngine::with_load_delay(Duration::from_millis(500)),
        MemoryResumeStore::new(),
        StubProgressStore::reachable(),
    );

    h.coordinator.select_lecture(&LectureId::from("1-1"));
    h.coordinator.select_lecture(&LectureId::from("1-2"));
    h.settle().await;

    tokio::time::advance(Duration::from_millis(600)).await;
    h.settle().await;

    assert_eq!(h.engine.load_count(), 2);
    // Only the load for the lecture that is still current starts playback
    let plays = h
        .engine
        .commands()
        .iter()
        .filter(|c| **c == EngineCommand::Play)
        .count();
    assert_eq!(plays, 1);
    assert_eq!(
        h.coordinator.session().current_lecture,
        Some(LectureId::from("1-2"))
    );
}

#[tokio::test(start_paused = true)]
async fn position_below_delta_threshold_writes_nothing() {
    let mut h = Harness::reachable();
    h.coordinator.initialize().await;
    h.select("1-1").await;

    h.position(2.0).await;
    h.position(4.9).await;
    h.tick_seconds(5).await;

    assert!(h.resume.current().is_none());
    assert!(h.remote.upserts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn position_past_delta_threshold_writes_both_channels() {
    let mut h = Harness::reachable();
    h.coordinator.initialize().await;
    h.select("1-1").await;

    h.position(6.2).await;

    let record = h.resume.current().expect("local record saved");
    assert_eq!(record.lecture_id, LectureId::from("1-1"));
    assert_eq!(record.position_secs, 6);

    // The remote write is debounced, not inline
    assert!(h.remote.upserts().is_empty());
    h.tick_seconds(4).await;
    assert_eq!(
        h.remote.upserts(),
        vec![ProgressUpsert::Position {
            lecture: LectureId::from("1-1"),
            secs: 6
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn debounced_burst_sends_only_the_latest_position() {
    let mut h = Harness::reachable();
    h.coordinator.initialize().await;
    h.select("1-1").await;

    h.position(6.0).await;
    tokio::time::advance(Duration::from_millis(1000)).await;
    h.settle().await;
    h.position(12.0).await;
    h.tick_seconds(4).await;

    assert_eq!(
        h.remote.upserts(),
        vec![ProgressUpsert::Position {
            lecture: LectureId::from("1-1"),
            secs: 12
        }]
    );
    // Both reports crossed the local threshold
    assert_eq!(h.resume.current().unwrap().position_secs, 12);
}

#[tokio::test(start_paused = true)]
async fn pause_saves_immediately_without_threshold() {
    let mut h = Harness::reachable();
    h.coordinator.initialize().await;
    h.select("1-1").await;

    h.position(6.0).await;
    h.position(8.0).await; // below delta, not saved
    assert_eq!(h.resume.current().unwrap().position_secs, 6);

    h.coordinator
        .handle_event(CoordinatorEvent::Engine(EngineEvent::Paused));
    h.settle().await;

    assert_eq!(h.resume.current().unwrap().position_secs, 8);
    assert!(!h.coordinator.session().is_playing);
}

#[tokio::test(start_paused = true)]
async fn page_unload_saves_the_last_observed_position() {
    let mut h = Harness::reachable();
    h.coordinator.initialize().await;
    h.select("1-1").await;

    h.position(6.0).await;
    h.position(9.0).await;
    h.coordinator.handle_event(CoordinatorEvent::PageUnload);
    h.settle().await;

    assert_eq!(h.resume.current().unwrap().position_secs, 9);
}

#[tokio::test(start_paused = true)]
async fn lecture_end_completes_and_counts_down() {
    let mut h = Harness::reachable();
    h.coordinator.initialize().await;
    h.select("1-1").await;
    h.position(120.0).await;

    h.ended().await;

    // Local record cleared, catalog updated, completion sent immediately
    assert!(h.resume.current().is_none());
    assert_eq!(h.status("1-1"), Some(LectureStatus::Completed));
    assert!(h.remote.upserts().contains(&ProgressUpsert::Completion {
        lecture: LectureId::from("1-1")
    }));

    match h.coordinator.auto_advance() {
        AutoAdvanceState::CountdownRunning {
            next, remaining, ..
        } => {
            assert_eq!(next, LectureId::from("1-2"));
            assert_eq!(remaining, 5);
        }
        other => panic!("expected countdown, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn play_now_advances_once_and_only_once() {
    let mut h = Harness::reachable();
    h.coordinator.initialize().await;
    h.select("1-1").await;
    h.ended().await;

    // Two ticks elapse before the user clicks "play now"
    h.tick_seconds(2).await;
    match h.coordinator.auto_advance() {
        AutoAdvanceState::CountdownRunning { remaining, .. } => assert_eq!(remaining, 3),
        other => panic!("expected countdown, got {:?}", other),
    }

    h.coordinator.play_next_now();
    h.settle().await;
    h.coordinator.play_next_now();
    h.settle().await;

    assert_eq!(h.coordinator.auto_advance(), AutoAdvanceState::Idle);
    assert_eq!(
        h.coordinator.session().current_lecture,
        Some(LectureId::from("1-2"))
    );
    assert_eq!(h.engine.load_count(), 2, "double click must not advance twice");
}

#[tokio::test(start_paused = true)]
async fn countdown_reaching_zero_advances_automatically() {
    let mut h = Harness::reachable();
    h.coordinator.initialize().await;
    h.select("1-1").await;
    h.ended().await;

    h.tick_seconds(5).await;

    assert_eq!(h.coordinator.auto_advance(), AutoAdvanceState::Idle);
    assert_eq!(
        h.coordinator.session().current_lecture,
        Some(LectureId::from("1-2"))
    );
    assert_eq!(h.status("1-2"), Some(LectureStatus::Playing));

    // Leftover ticks from the cancelled ticker change nothing
    h.tick_seconds(3).await;
    assert_eq!(h.engine.load_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn cancel_makes_later_advance_a_no_op() {
    let mut h = Harness::reachable();
    h.coordinator.initialize().await;
    h.select("1-1").await;
    h.ended().await;

    h.coordinator.cancel_auto_advance();
    h.coordinator.play_next_now();
    h.tick_seconds(8).await;

    assert_eq!(h.coordinator.auto_advance(), AutoAdvanceState::Idle);
    assert_eq!(h.engine.load_count(), 1);
    assert_eq!(h.status("1-2"), Some(LectureStatus::Pending));
    // Playback stays stopped on the ended lecture
    assert_eq!(
        h.coordinator.session().current_lecture,
        Some(LectureId::from("1-1"))
    );
}

#[tokio::test(start_paused = true)]
async fn selecting_during_countdown_leaves_a_single_timer() {
    let mut h = Harness::reachable();
    h.coordinator.initialize().await;
    h.select("1-1").await;
    h.ended().await;

    // Manual selection supersedes the pending auto-advance
    h.select("2-1").await;
    assert_eq!(h.coordinator.auto_advance(), AutoAdvanceState::Idle);

    h.ended().await;
    h.tick_seconds(1).await;

    // Only the new countdown is ticking, from its full height
    match h.coordinator.auto_advance() {
        AutoAdvanceState::CountdownRunning {
            next, remaining, ..
        } => {
            assert_eq!(next, LectureId::from("2-2"));
            assert_eq!(remaining, 4);
        }
        other => panic!("expected countdown, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn last_lecture_ends_without_a_countdown() {
    let mut h = Harness::reachable();
    h.coordinator.initialize().await;
    h.select("2-2").await;
    h.ended().await;

    assert_eq!(h.coordinator.auto_advance(), AutoAdvanceState::Idle);
    assert_eq!(h.status("2-2"), Some(LectureStatus::Completed));
}

#[tokio::test(start_paused = true)]
async fn unreachable_backend_suppresses_all_remote_writes() {
    let mut h = Harness::unreachable();
    h.coordinator.initialize().await;
    h.select("1-1").await;

    h.position(10.0).await;
    h.tick_seconds(4).await;
    h.ended().await;
    h.tick_seconds(6).await;

    assert!(h.remote.upserts().is_empty());
    // Local resume kept working throughout: the end cleared it after the
    // 10-second save existed
    assert!(h.resume.current().is_none());
    assert_eq!(h.status("1-1"), Some(LectureStatus::Completed));
}

#[tokio::test(start_paused = true)]
async fn failing_remote_writes_never_disturb_playback() {
    let mut h = Harness::reachable();
    h.coordinator.initialize().await;
    h.select("1-1").await;
    h.remote.fail_writes();

    h.position(10.0).await;
    h.tick_seconds(4).await;
    h.ended().await;

    // Dropped, not retried, not fatal
    assert!(h.remote.upserts().is_empty());
    assert_eq!(h.status("1-1"), Some(LectureStatus::Completed));
    assert_eq!(h.resume.current(), None);
}

#[tokio::test(start_paused = true)]
async fn initialize_merges_remote_completions_and_aggregates() {
    let completed = |id: &str| LectureProgress {
        user_id: UserId(1),
        lecture_id: LectureId::from(id),
        last_position: 0,
        completed: true,
        completed_at: Some(chrono::Utc::now()),
        updated_at: chrono::Utc::now(),
    };
    let mut h = Harness::build(
        StubEngine::new(),
        MemoryResumeStore::new(),
        StubProgressStore::reachable().with_seeded(vec![
            completed("1-1"),
            completed("2-1"),
            completed("ghost"),
        ]),
    );

    let offer = h.coordinator.initialize().await;
    assert!(offer.is_none());

    assert_eq!(h.status("1-1"), Some(LectureStatus::Completed));
    assert_eq!(h.status("2-1"), Some(LectureStatus::Completed));
    assert_eq!(h.status("1-2"), Some(LectureStatus::Pending));

    let summary = h.coordinator.course_summary();
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.total, 4);
    assert_eq!(summary.pct, 50.0);

    let sections = h.coordinator.section_summaries();
    assert_eq!(sections[0].summary.completed, 1);
    assert_eq!(sections[1].summary.completed, 1);
}

#[tokio::test(start_paused = true)]
async fn resume_offer_seeks_after_the_load_completes() {
    let record = ResumeRecord::new(
        LectureId::from("1-2"),
        "Lecture 1-2",
        120,
        chrono::Utc::now().timestamp_millis(),
    );
    let mut h = Harness::build(
        StubEngine::new(),
        MemoryResumeStore::with_record(record),
        StubProgressStore::reachable(),
    );

    let offer = h.coordinator.initialize().await.expect("resumable offer");
    assert_eq!(offer.lecture_id, LectureId::from("1-2"));
    assert_eq!(offer.position_secs, 120);

    // Nothing plays until the user confirms
    assert!(h.engine.commands().is_empty());

    h.coordinator.resume(&offer);
    h.settle().await;

    let commands = h.engine.commands();
    let load_at = commands
        .iter()
        .position(|c| matches!(c, EngineCommand::Load(_)))
        .expect("media loaded");
    let seek_at = commands
        .iter()
        .position(|c| *c == EngineCommand::Seek(120.0))
        .expect("seek to saved position");
    let play_at = commands
        .iter()
        .position(|c| *c == EngineCommand::Play)
        .expect("playback started");
    assert!(load_at < seek_at && seek_at < play_at);
}

#[tokio::test(start_paused = true)]
async fn start_over_clears_the_record_and_plays_from_zero() {
    let record = ResumeRecord::new(
        LectureId::from("1-2"),
        "Lecture 1-2",
        120,
        chrono::Utc::now().timestamp_millis(),
    );
    let mut h = Harness::build(
        StubEngine::new(),
        MemoryResumeStore::with_record(record),
        StubProgressStore::reachable(),
    );

    let offer = h.coordinator.initialize().await.expect("resumable offer");
    h.coordinator.start_over(&offer);
    h.settle().await;

    assert!(h.resume.current().is_none());
    assert_eq!(h.engine.load_count(), 1);
    assert!(!h
        .engine
        .commands()
        .iter()
        .any(|c| matches!(c, EngineCommand::Seek(_))));
}

#[tokio::test(start_paused = true)]
async fn resume_record_for_a_vanished_lecture_is_purged() {
    let record = ResumeRecord::new(
        LectureId::from("gone"),
        "Removed lecture",
        60,
        chrono::Utc::now().timestamp_millis(),
    );
    let mut h = Harness::build(
        StubEngine::new(),
        MemoryResumeStore::with_record(record),
        StubProgressStore::reachable(),
    );

    assert!(h.coordinator.initialize().await.is_none());
    assert!(h.resume.current().is_none());
}

#[tokio::test(start_paused = true)]
async fn position_reports_are_ignored_while_seeking() {
    let mut h = Harness::reachable();
    h.coordinator.initialize().await;
    h.select("1-1").await;

    h.coordinator.set_seeking(true);
    h.position(50.0).await;
    assert!(h.resume.current().is_none());

    h.coordinator.set_seeking(false);
    h.position(50.0).await;
    assert_eq!(h.resume.current().unwrap().position_secs, 50);
}

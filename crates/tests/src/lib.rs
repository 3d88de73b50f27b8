//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 端到端测试：真实工作线程 + 分发器 + 内存 sinks（无需摄像头）
//! - 停机策略与释放顺序

#[cfg(test)]
mod contract_tests {
    use contracts::{DisplayKey, Event, EventKind, Frame, SourceId};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_event_kinds_and_sources() {
        let cam1 = SourceId::new(1);
        let raw = Event::raw_frame(cam1, Frame::filled_rgb(0, 2, 2, [0, 0, 0]));
        assert_eq!(raw.kind(), EventKind::RawFrame);
        assert_eq!(raw.source(), Some(cam1));

        let cmd = Event::actuator_command(1);
        assert_eq!(cmd.kind(), EventKind::ActuatorCommand);
        assert_eq!(cmd.source(), None);

        assert_eq!(DisplayKey::detected(cam1).slug(), "cam1_detected");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use contracts::{DisplayKey, ShutdownPolicy, SourceId};
    use dispatcher::{
        DispatchReport, DispatcherBuilder, DispatcherConfig, DispatcherState, MemoryActuator,
        MemoryRenderSink, SinkEvent, SinkJournal, StopReason, WorkerOutcome,
    };
    use event_queue::{AbortFlag, EventQueue, StopSignal};
    use ingestion::mock::{FixedColor, FixedInference, ScriptedDetector, ScriptedFrameSource};
    use ingestion::{
        DecisionStage, IngestionError, SensorWorker, WorkerConfig, WorkerExit, WorkerHandle,
    };

    const CAM1: SourceId = SourceId::new(1);
    const CAM2: SourceId = SourceId::new(2);

    /// Queue, stop signal and journal shared by one line
    struct Line {
        queue: Arc<EventQueue>,
        stop: StopSignal,
        journal: SinkJournal,
    }

    impl Line {
        fn new() -> Self {
            observability::init_test_logging();
            Self {
                queue: Arc::new(EventQueue::new()),
                stop: StopSignal::new(),
                journal: SinkJournal::new(),
            }
        }

        fn spawn(&self, worker: SensorWorker) -> WorkerHandle {
            worker
                .spawn(Arc::clone(&self.queue), self.stop.clone())
                .unwrap()
        }

        fn dispatcher(&self, policy: ShutdownPolicy) -> DispatcherBuilder {
            DispatcherBuilder::new(Arc::clone(&self.queue), self.stop.clone())
                .config(DispatcherConfig {
                    dequeue_timeout: Duration::from_millis(50),
                    shutdown_policy: policy,
                    expected_sources: Vec::new(),
                })
                .render_sink(Box::new(MemoryRenderSink::new(self.journal.clone())))
                .actuator_sink(Box::new(MemoryActuator::new(self.journal.clone())))
        }
    }

    /// Defect worker: 1 -> actuator 1, scripted P(x) against 0.8
    fn defect_worker(source: ScriptedFrameSource, detector: ScriptedDetector, p: f32) -> SensorWorker {
        SensorWorker::new(
            WorkerConfig::new(CAM1, 1).with_pacing(Duration::ZERO),
            Box::new(source),
            Box::new(detector),
            DecisionStage::defect(Box::new(FixedInference::defect(p)), "x", 0.8),
        )
    }

    /// Color worker: 2 -> actuator 2, fixed label against "blue"
    fn color_worker(source: ScriptedFrameSource, detector: ScriptedDetector, label: &str) -> SensorWorker {
        SensorWorker::new(
            WorkerConfig::new(CAM2, 2).with_pacing(Duration::ZERO),
            Box::new(source),
            Box::new(detector),
            DecisionStage::color(Box::new(FixedColor::new(label, 0.9)), "blue"),
        )
    }

    fn exit_of(report: &DispatchReport, source: SourceId) -> WorkerExit {
        report
            .worker(source)
            .and_then(WorkerOutcome::report)
            .map(|r| r.exit)
            .unwrap()
    }

    fn frames_of(report: &DispatchReport, source: SourceId) -> u64 {
        report
            .worker(source)
            .and_then(WorkerOutcome::report)
            .map(|r| r.frames)
            .unwrap()
    }

    /// Sinks are released once, after every frame was shown, and closed last
    fn assert_released_last(journal: &SinkJournal) {
        let events = journal.events();
        let released = events
            .iter()
            .position(|e| *e == SinkEvent::Released)
            .unwrap();
        assert!(events[released + 1..]
            .iter()
            .all(|e| !matches!(e, SinkEvent::Shown { .. } | SinkEvent::Pushed(_))));
        assert_eq!(journal.count(&SinkEvent::Released), 1);
        assert_eq!(journal.count(&SinkEvent::Closed), 1);
        assert_eq!(events.last(), Some(&SinkEvent::Closed));
    }

    #[test]
    fn test_first_finished_stops_the_other_source() {
        let line = Line::new();
        let short = line.spawn(defect_worker(
            ScriptedFrameSource::new(3),
            ScriptedDetector::never(),
            0.0,
        ));
        let endless = ScriptedFrameSource::endless().with_acquire_delay(Duration::from_millis(2));
        let released = endless.released_flag();
        let long = line.spawn(color_worker(endless, ScriptedDetector::never(), "blue"));

        let report = line
            .dispatcher(ShutdownPolicy::FirstFinished)
            .workers([short, long])
            .build()
            .run();

        assert_eq!(report.stop_reason, StopReason::SourceFinished(CAM1));
        assert_eq!(
            report.transitions,
            vec![
                DispatcherState::Running,
                DispatcherState::Stopping,
                DispatcherState::Closed
            ]
        );
        assert_eq!(exit_of(&report, CAM1), WorkerExit::Exhausted);
        assert_eq!(exit_of(&report, CAM2), WorkerExit::Stopped);
        assert!(released.load(Ordering::SeqCst));

        assert_eq!(line.journal.shown_on(DisplayKey::live(CAM1)), vec![0, 1, 2]);
        assert_released_last(&line.journal);
        assert!(line.queue.is_empty());
    }

    #[test]
    fn test_all_finished_waits_for_both_sources() {
        let line = Line::new();
        let short = line.spawn(defect_worker(
            ScriptedFrameSource::new(3),
            ScriptedDetector::never(),
            0.0,
        ));
        let long = line.spawn(color_worker(
            ScriptedFrameSource::new(8).with_acquire_delay(Duration::from_millis(5)),
            ScriptedDetector::never(),
            "blue",
        ));

        let report = line
            .dispatcher(ShutdownPolicy::AllFinished)
            .workers([short, long])
            .build()
            .run();

        assert_eq!(report.stop_reason, StopReason::AllSourcesFinished);
        assert_eq!(report.finished_sources, vec![CAM1, CAM2]);
        assert_eq!(exit_of(&report, CAM2), WorkerExit::Exhausted);
        assert_eq!(
            line.journal.shown_on(DisplayKey::live(CAM2)),
            (0..8).collect::<Vec<_>>()
        );
        assert_eq!(report.counters.raw_frames, 11);
        assert_eq!(report.counters.sources_finished, 2);
        assert_released_last(&line.journal);
    }

    #[test]
    fn test_decisions_reach_the_actuator() {
        let line = Line::new();
        let defect = line.spawn(defect_worker(
            ScriptedFrameSource::new(4),
            ScriptedDetector::always(),
            0.85,
        ));
        let color = line.spawn(color_worker(
            ScriptedFrameSource::new(4),
            ScriptedDetector::always(),
            "red",
        ));

        let report = line
            .dispatcher(ShutdownPolicy::AllFinished)
            .workers([defect, color])
            .build()
            .run();

        assert!(report.is_clean());
        assert_eq!(line.journal.pushes(), vec![1; 4]);
        assert_eq!(report.counters.actuator_commands, 4);
        assert_eq!(
            line.journal.shown_on(DisplayKey::detected(CAM2)),
            vec![0, 1, 2, 3]
        );

        // every detected view follows the live view of the same frame
        let events = line.journal.events();
        for (i, event) in events.iter().enumerate() {
            if let SinkEvent::Shown { key, seq } = event {
                if *key == DisplayKey::detected(key.source) {
                    let live = SinkEvent::Shown {
                        key: DisplayKey::live(key.source),
                        seq: *seq,
                    };
                    assert!(events[..i].contains(&live), "{key} seq {seq} shown before live");
                }
            }
        }
    }

    #[test]
    fn test_stop_drains_everything_enqueued() {
        let line = Line::new();
        let short = line.spawn(defect_worker(
            ScriptedFrameSource::new(5),
            ScriptedDetector::always(),
            0.9,
        ));
        let flood = line.spawn(color_worker(
            ScriptedFrameSource::endless().with_acquire_delay(Duration::from_millis(1)),
            ScriptedDetector::always(),
            "blue",
        ));

        let report = line
            .dispatcher(ShutdownPolicy::FirstFinished)
            .workers([short, flood])
            .build()
            .run();

        let produced = frames_of(&report, CAM1) + frames_of(&report, CAM2);
        assert_eq!(report.counters.raw_frames, produced);
        assert_eq!(
            line.journal.shown_on(DisplayKey::live(CAM2)).len() as u64,
            frames_of(&report, CAM2)
        );
        assert!(line.queue.is_empty());
    }

    #[test]
    fn test_abort_from_another_thread() {
        let line = Line::new();
        let a = line.spawn(defect_worker(
            ScriptedFrameSource::endless().with_acquire_delay(Duration::from_millis(2)),
            ScriptedDetector::never(),
            0.0,
        ));
        let b = line.spawn(color_worker(
            ScriptedFrameSource::endless().with_acquire_delay(Duration::from_millis(2)),
            ScriptedDetector::never(),
            "blue",
        ));

        let abort = AbortFlag::new();
        let trigger = abort.clone();
        let handle = line
            .dispatcher(ShutdownPolicy::AllFinished)
            .abort_signal(Box::new(abort))
            .workers([a, b])
            .build()
            .spawn()
            .unwrap();

        thread::sleep(Duration::from_millis(50));
        trigger.trigger();
        let report = handle.join().unwrap();

        assert_eq!(report.stop_reason, StopReason::Aborted);
        assert!(report.finished_sources.is_empty());
        assert_eq!(exit_of(&report, CAM1), WorkerExit::Stopped);
        assert_eq!(exit_of(&report, CAM2), WorkerExit::Stopped);
        assert_eq!(report.final_state(), Some(DispatcherState::Closed));
        assert_released_last(&line.journal);
    }

    #[test]
    fn test_actuator_failure_is_reported_not_fatal() {
        let line = Line::new();
        let defect = line.spawn(defect_worker(
            ScriptedFrameSource::new(3),
            ScriptedDetector::always(),
            0.95,
        ));

        let report = line
            .dispatcher(ShutdownPolicy::FirstFinished)
            .actuator_sink(Box::new(
                MemoryActuator::new(line.journal.clone()).failing_on(1),
            ))
            .worker(defect)
            .build()
            .run();

        assert!(!report.is_clean());
        assert_eq!(report.actuator_failures.len(), 3);
        assert!(report.actuator_failures.iter().all(|f| f.actuator == 1));
        assert_eq!(line.journal.shown_on(DisplayKey::detected(CAM1)), vec![0, 1, 2]);
        assert_eq!(report.stop_reason, StopReason::SourceFinished(CAM1));
    }

    #[test]
    fn test_unavailable_source_starts_nothing() {
        let line = Line::new();
        let source = ScriptedFrameSource::new(3).failing_open();
        let released = source.released_flag();
        let worker = defect_worker(source, ScriptedDetector::never(), 0.0);

        let err = worker
            .spawn(Arc::clone(&line.queue), line.stop.clone())
            .unwrap_err();
        assert!(matches!(err, IngestionError::Setup { source_id, .. } if source_id == CAM1));
        assert!(released.load(Ordering::SeqCst));
        assert!(line.queue.is_empty());
    }
}

#[cfg(test)]
mod config_tests {
    use std::sync::Arc;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{DisplayKey, SourceId};
    use dispatcher::{
        DispatcherBuilder, DispatcherConfig, MemoryActuator, MemoryRenderSink, SinkJournal,
        StopReason,
    };
    use event_queue::{EventQueue, StopSignal};

    const LINE: &str = r#"
[line]
name = "e2e"
pacing_ms = 0
dequeue_timeout_ms = 50
shutdown_policy = "all_finished"

[[sources]]
id = 1
actuator_id = 1
input = { kind = "synthetic", frames = 9, width = 48, height = 24, item_color = [220, 20, 20], item_every = 3 }
detector = { kind = "frame_diff", min_area = 16, padding = 0 }

[sources.decision]
kind = "defect_probability"
defect_class = "x"
threshold = 0.5

[sources.decision.model]
source = "inline"
classes = [
    { name = "x", weights = [6.0, -3.0, -3.0] },
    { name = "circle", weights = [0.0, 0.0, 0.0] },
]

[[sources]]
id = 2
actuator_id = 2
input = { kind = "synthetic", frames = 6, width = 48, height = 24, item_color = [220, 20, 20], item_every = 3 }
detector = { kind = "frame_diff", min_area = 16, padding = 0 }
decision = { kind = "target_color", target = "blue" }
"#;

    /// Config -> vision workers -> dispatcher, end to end
    #[test]
    fn test_line_from_config() {
        observability::init_test_logging();
        let blueprint = ConfigLoader::load_from_str(LINE, ConfigFormat::Toml).unwrap();

        let queue = Arc::new(EventQueue::new());
        let stop = StopSignal::new();
        let journal = SinkJournal::new();

        let handles: Vec<_> = blueprint
            .sources
            .iter()
            .map(|s| {
                vision::build_worker(s, blueprint.line.pacing())
                    .unwrap()
                    .spawn(Arc::clone(&queue), stop.clone())
                    .unwrap()
            })
            .collect();

        let report = DispatcherBuilder::new(Arc::clone(&queue), stop)
            .config(DispatcherConfig {
                dequeue_timeout: blueprint.line.dequeue_timeout(),
                shutdown_policy: blueprint.line.shutdown_policy,
                expected_sources: blueprint.source_ids(),
            })
            .render_sink(Box::new(MemoryRenderSink::new(journal.clone())))
            .actuator_sink(Box::new(MemoryActuator::new(journal.clone())))
            .workers(handles)
            .build()
            .run();

        assert_eq!(report.stop_reason, StopReason::AllSourcesFinished);
        assert_eq!(report.counters.raw_frames, 15);
        assert_eq!(journal.shown_on(DisplayKey::live(SourceId::new(1))).len(), 9);

        // red items: defect fires on cam1 only, the blue target never matches
        let pushes = journal.pushes();
        assert!(!pushes.is_empty());
        assert!(pushes.iter().all(|&id| id == 1));
    }
}

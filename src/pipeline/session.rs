//! Batch analysis sessions
//!
//! A session owns an ordered list of track records and a single worker
//! thread that analyzes them strictly in order, one at a time. Callers hold
//! a [`SessionHandle`] to cancel, change the tempo range, observe progress
//! and commit results.
//!
//! The record list is only written by the worker (outcomes) and by
//! [`SessionHandle::set_range`] (re-folding tempos). Observers receive owned
//! snapshots and never see a record mid-update.

use crate::analysis::bpm::normalize_in;
use crate::cancel::CancelToken;
use crate::error::{AnalysisError, CommitError};
use crate::persist::FeatureSink;
use crate::pipeline::analyzer::TrackAnalyzer;
use crate::pipeline::stager;
use crate::types::{AnalysisResult, BpmRange, TrackAnalysis, TrackRef};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

// =============================================================================
// Records
// =============================================================================

/// Where a record is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Not attempted yet (or never, if the session was cancelled)
    Pending,
    Succeeded,
    Failed,
}

/// One row of a session
#[derive(Debug, Clone, PartialEq)]
pub struct TrackAnalysisRecord {
    pub track: TrackRef,
    /// Unfolded engine tempo, kept so the range can change without re-analysis
    pub raw_bpm: f64,
    pub result: Option<AnalysisResult>,
    pub error: Option<AnalysisError>,
}

impl TrackAnalysisRecord {
    fn pending(track: TrackRef) -> Self {
        Self {
            track,
            raw_bpm: 0.0,
            result: None,
            error: None,
        }
    }

    pub fn state(&self) -> RecordState {
        match (&self.result, &self.error) {
            (Some(_), _) => RecordState::Succeeded,
            (None, Some(_)) => RecordState::Failed,
            (None, None) => RecordState::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state() != RecordState::Pending
    }

    fn succeed(&mut self, analysis: TrackAnalysis, range: &BpmRange) {
        let mut result = analysis.result;
        // Fold against the range current now, not the one the track started with
        result.bpm = normalize_in(analysis.raw_bpm, range);
        self.raw_bpm = analysis.raw_bpm;
        self.result = Some(result);
        self.error = None;
    }

    fn fail(&mut self, error: AnalysisError) {
        self.raw_bpm = 0.0;
        self.result = None;
        self.error = Some(error);
    }

    fn refold(&mut self, range: &BpmRange) {
        if self.raw_bpm > 0.0 {
            if let Some(result) = self.result.as_mut() {
                result.bpm = normalize_in(self.raw_bpm, range);
            }
        }
    }
}

// =============================================================================
// Observation
// =============================================================================

/// Completed tracks out of the session's total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f64 / self.total as f64
        }
    }
}

/// Counts of records by state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub pending: usize,
}

/// Something observable happened in a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The worker is about to analyze `records[index]`
    TrackStarted { index: usize, progress: Progress },
    /// `records[index]` reached a terminal state
    TrackFinished {
        index: usize,
        record: TrackAnalysisRecord,
        progress: Progress,
    },
    /// Tempos were re-folded into a new range
    RangeChanged { range: BpmRange },
    /// The worker exited; no further track events follow
    Finished { cancelled: bool, progress: Progress },
}

/// Owned, read-only copy of a session's state
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub records: Vec<TrackAnalysisRecord>,
    pub range: BpmRange,
    /// Index of the next (or currently running) record
    pub cursor: usize,
    pub cancelled: bool,
    pub running: bool,
}

impl SessionSnapshot {
    pub fn progress(&self) -> Progress {
        Progress {
            current: self.cursor,
            total: self.records.len(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        let mut summary = SessionSummary::default();
        for record in &self.records {
            match record.state() {
                RecordState::Succeeded => summary.succeeded += 1,
                RecordState::Failed => summary.failed += 1,
                RecordState::Pending => summary.pending += 1,
            }
        }
        summary
    }
}

type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

// =============================================================================
// Shared state
// =============================================================================

struct SessionState {
    records: Vec<TrackAnalysisRecord>,
    range: BpmRange,
    cursor: usize,
    cancelled: bool,
    running: bool,
}

#[derive(Default)]
struct Observers {
    listeners: Vec<Listener>,
    channels: Vec<Sender<SessionEvent>>,
}

struct Shared {
    state: Mutex<SessionState>,
    observers: Mutex<Observers>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        // A panicking listener must not wedge the session
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn observers(&self) -> MutexGuard<'_, Observers> {
        self.observers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Deliver an event outside of any state lock
    fn emit(&self, event: SessionEvent) {
        let listeners = {
            let mut observers = self.observers();
            observers.channels.retain(|tx| tx.send(event.clone()).is_ok());
            observers.listeners.clone()
        };
        for listener in listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(&event))).is_err() {
                warn!("Session listener panicked");
            }
        }
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Caller-side handle to one analysis session
///
/// Dropping the handle cancels the session; the worker stops at its next
/// checkpoint.
pub struct SessionHandle {
    shared: Arc<Shared>,
    analyzer: TrackAnalyzer,
    cancel: CancelToken,
    worker: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Create a session with every record pending. Nothing runs until [`start`](Self::start).
    pub fn new(analyzer: TrackAnalyzer, tracks: Vec<TrackRef>, range: BpmRange) -> Self {
        let records = tracks.into_iter().map(TrackAnalysisRecord::pending).collect();
        let state = SessionState {
            records,
            range,
            cursor: 0,
            cancelled: false,
            running: false,
        };
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                observers: Mutex::new(Observers::default()),
            }),
            analyzer,
            cancel: CancelToken::new(),
            worker: None,
        }
    }

    /// Spawn the worker thread. Calling it again is a no-op.
    pub fn start(&mut self) -> std::io::Result<()> {
        if !self.mark_running() {
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let analyzer = self.analyzer.clone();
        let cancel = self.cancel.clone();

        let spawned = thread::Builder::new()
            .name("analysis-session".to_string())
            .spawn(move || drive(&shared, &analyzer, &cancel));

        match spawned {
            Ok(worker) => {
                self.worker = Some(worker);
                Ok(())
            }
            Err(e) => {
                self.shared.state().running = false;
                Err(e)
            }
        }
    }

    /// Run the whole session on the calling thread
    pub fn run_blocking(&self) {
        if self.mark_running() {
            drive(&self.shared, &self.analyzer, &self.cancel);
        }
    }

    fn mark_running(&self) -> bool {
        let mut state = self.shared.state();
        if state.running || state.cursor > 0 || state.cancelled {
            return false;
        }
        state.running = true;
        true
    }

    /// Stop before the next unit of work. Remaining records stay pending.
    pub fn cancel(&self) {
        debug!("Session cancellation requested");
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Re-fold every analyzed tempo into `range` without touching the worker
    pub fn set_range(&self, range: BpmRange) {
        {
            let mut state = self.shared.state();
            for record in state.records.iter_mut() {
                record.refold(&range);
            }
            state.range = range.clone();
        }
        debug!("Tempo range changed to {}", range);
        self.shared.emit(SessionEvent::RangeChanged { range });
    }

    /// Register a callback invoked on the worker thread for every event
    ///
    /// Callbacks receive read-only data and must not block for long: the
    /// next track does not start until they return.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.shared.observers().listeners.push(Arc::new(callback));
    }

    /// A channel receiving every event from now on
    pub fn events(&self) -> Receiver<SessionEvent> {
        let (tx, rx) = unbounded();
        self.shared.observers().channels.push(tx);
        rx
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.shared.state();
        SessionSnapshot {
            records: state.records.clone(),
            range: state.range.clone(),
            cursor: state.cursor,
            cancelled: state.cancelled,
            running: state.running,
        }
    }

    pub fn progress(&self) -> Progress {
        let state = self.shared.state();
        Progress {
            current: state.cursor,
            total: state.records.len(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.state().running
    }

    /// Block until the worker thread exits
    pub fn wait(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Analysis session worker panicked");
                self.shared.state().running = false;
            }
        }
    }

    /// Persist every successful record through `sink`, as of right now
    pub fn commit(&self, sink: &mut dyn FeatureSink) -> Result<usize, CommitError> {
        let records = self.shared.state().records.clone();
        stager::commit_records(&records, sink)
    }

    /// Cancel and release the session
    pub fn dispose(self) {
        // Drop does the work
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Create a session and start its worker
pub fn run_analysis(
    analyzer: TrackAnalyzer,
    tracks: Vec<TrackRef>,
    range: BpmRange,
) -> std::io::Result<SessionHandle> {
    let mut handle = SessionHandle::new(analyzer, tracks, range);
    handle.start()?;
    Ok(handle)
}

// =============================================================================
// Worker
// =============================================================================

fn drive(shared: &Shared, analyzer: &TrackAnalyzer, cancel: &CancelToken) {
    let total = shared.state().records.len();
    info!("Analysis session started ({} tracks)", total);

    loop {
        let (index, track, range) = {
            let mut state = shared.state();
            if cancel.is_cancelled() {
                state.cancelled = true;
                break;
            }
            if state.cursor >= total {
                break;
            }
            let index = state.cursor;
            (index, state.records[index].track.clone(), state.range.clone())
        };

        shared.emit(SessionEvent::TrackStarted {
            index,
            progress: Progress {
                current: index,
                total,
            },
        });

        // A panicking collaborator fails its own row; the batch goes on
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            analyzer.analyze(&track, &range, cancel)
        }))
        .unwrap_or_else(|payload| {
            Err(AnalysisError::panicked(&track.id, panic_message(payload.as_ref())))
        });

        let record = {
            let mut state = shared.state();
            match outcome {
                Err(e) if e.is_cancelled() => {
                    state.cancelled = true;
                    break;
                }
                Ok(analysis) => {
                    let range = state.range.clone();
                    state.records[index].succeed(analysis, &range);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", track.path.display(), e);
                    state.records[index].fail(e);
                }
            }
            state.cursor = index + 1;
            state.records[index].clone()
        };

        shared.emit(SessionEvent::TrackFinished {
            index,
            record,
            progress: Progress {
                current: index + 1,
                total,
            },
        });
    }

    let (cancelled, progress) = {
        let mut state = shared.state();
        state.running = false;
        (
            state.cancelled,
            Progress {
                current: state.cursor,
                total,
            },
        )
    };

    if cancelled {
        info!(
            "Analysis session cancelled after {}/{} tracks",
            progress.current, progress.total
        );
    } else {
        info!("Analysis session finished ({} tracks)", progress.total);
    }

    shared.emit(SessionEvent::Finished {
        cancelled,
        progress,
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("analysis panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("analysis panicked: {}", msg)
    } else {
        "analysis panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::traits::FeatureEngine;
    use crate::audio::decoder::AudioDecoder;
    use crate::error::{DecodeError, EngineFault, ErrorKind, PersistError};
    use crate::persist::TrackFeatures;
    use crate::pipeline::analyzer::AnalyzerConfig;
    use crate::types::{AudioBuffer, DecodedAudio, KeyEstimate, Scale};
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Decoder whose tempo is encoded in the file name: "/a_70.wav" decodes fine,
    /// anything containing "corrupt" fails
    #[derive(Default)]
    struct CountingDecoder {
        calls: AtomicUsize,
    }

    impl AudioDecoder for CountingDecoder {
        fn decode(&self, path: &Path, _cancel: &CancelToken) -> Result<DecodedAudio, DecodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if path.to_string_lossy().contains("corrupt") {
                return Err(DecodeError::failed(path, "bad header"));
            }
            let tempo = tempo_from_path(path);
            // The engine reads the tempo back from the first sample
            Ok(DecodedAudio::new(vec![vec![tempo; 100]], 10))
        }
    }

    fn tempo_from_path(path: &Path) -> f32 {
        path.file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.rsplit('_').next())
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0)
    }

    #[derive(Default)]
    struct CountingEngine {
        tempo_calls: AtomicUsize,
        key_calls: AtomicUsize,
    }

    impl FeatureEngine for CountingEngine {
        fn estimate_tempo(&self, buffer: &AudioBuffer) -> Result<f64, EngineFault> {
            self.tempo_calls.fetch_add(1, Ordering::SeqCst);
            Ok(buffer.samples.first().copied().unwrap_or(0.0) as f64)
        }

        fn estimate_key(&self, _buffer: &AudioBuffer) -> Result<Option<KeyEstimate>, EngineFault> {
            self.key_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(KeyEstimate::new("A", Scale::Minor)))
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        written: HashMap<String, TrackFeatures>,
        fail_on: Option<String>,
    }

    impl FeatureSink for RecordingSink {
        fn update_track_features(
            &mut self,
            track_id: &str,
            features: &TrackFeatures,
        ) -> Result<(), PersistError> {
            if self.fail_on.as_deref() == Some(track_id) {
                return Err(PersistError::Rejected {
                    track_id: track_id.to_string(),
                    reason: "locked".to_string(),
                });
            }
            self.written.insert(track_id.to_string(), features.clone());
            Ok(())
        }
    }

    struct Fixture {
        decoder: Arc<CountingDecoder>,
        engine: Arc<CountingEngine>,
        analyzer: TrackAnalyzer,
    }

    fn fixture() -> Fixture {
        let decoder = Arc::new(CountingDecoder::default());
        let engine = Arc::new(CountingEngine::default());
        let analyzer = TrackAnalyzer::with_config(
            decoder.clone(),
            engine.clone(),
            AnalyzerConfig {
                window_seconds: 60.0,
                analysis_sample_rate: None,
            },
        );
        Fixture {
            decoder,
            engine,
            analyzer,
        }
    }

    fn tracks(paths: &[(&str, &str)]) -> Vec<TrackRef> {
        paths.iter().map(|(id, path)| TrackRef::new(*id, *path)).collect()
    }

    #[test]
    fn test_records_complete_in_order_with_increasing_progress() {
        let fx = fixture();
        let session = SessionHandle::new(
            fx.analyzer.clone(),
            tracks(&[("A", "/a_70.wav"), ("B", "/b_128.wav"), ("C", "/c_90.wav")]),
            BpmRange::default(),
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        session.subscribe(move |event| {
            if let SessionEvent::TrackFinished { record, progress, .. } = event {
                sink.lock().unwrap().push((record.track.id.clone(), progress.current));
            }
        });

        session.run_blocking();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![("A".to_string(), 1), ("B".to_string(), 2), ("C".to_string(), 3)]
        );

        let snapshot = session.snapshot();
        assert_eq!(snapshot.cursor, 3);
        assert!(!snapshot.cancelled);
        assert!(!snapshot.running);
        assert_eq!(snapshot.records[0].raw_bpm, 70.0);
        assert_eq!(snapshot.records[0].result.as_ref().unwrap().bpm, 140.0);
        assert_eq!(snapshot.records[1].result.as_ref().unwrap().bpm, 128.0);
        assert_eq!(snapshot.records[2].result.as_ref().unwrap().camelot, "8A");
    }

    #[test]
    fn test_cancel_between_tracks_leaves_rest_pending() {
        let fx = fixture();
        let session = Arc::new(SessionHandle::new(
            fx.analyzer.clone(),
            tracks(&[("A", "/a_70.wav"), ("B", "/b_128.wav"), ("C", "/c_90.wav")]),
            BpmRange::default(),
        ));

        let cancel = session.cancel.clone();
        session.subscribe(move |event| {
            if let SessionEvent::TrackFinished { index: 0, .. } = event {
                cancel.cancel();
            }
        });

        session.run_blocking();

        let snapshot = session.snapshot();
        assert!(snapshot.cancelled);
        assert_eq!(snapshot.cursor, 1);
        assert_eq!(snapshot.records[0].state(), RecordState::Succeeded);
        assert_eq!(snapshot.records[1].state(), RecordState::Pending);
        assert_eq!(snapshot.records[2].state(), RecordState::Pending);
        assert_eq!(fx.decoder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            snapshot.summary(),
            SessionSummary {
                succeeded: 1,
                failed: 0,
                pending: 2
            }
        );
    }

    #[test]
    fn test_decode_failure_does_not_stop_batch() {
        let fx = fixture();
        let session = SessionHandle::new(
            fx.analyzer.clone(),
            tracks(&[("A", "/corrupt.wav"), ("B", "/b_128.wav")]),
            BpmRange::default(),
        );
        session.run_blocking();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.records[0].state(), RecordState::Failed);
        assert_eq!(
            snapshot.records[0].error.as_ref().unwrap().kind,
            ErrorKind::DecodeFailed
        );
        assert_eq!(snapshot.records[1].state(), RecordState::Succeeded);
        assert_eq!(snapshot.progress(), Progress { current: 2, total: 2 });
    }

    #[test]
    fn test_set_range_refolds_without_reanalysis() {
        let fx = fixture();
        let session = SessionHandle::new(
            fx.analyzer.clone(),
            tracks(&[("A", "/a_70.wav"), ("B", "/b_0.wav")]),
            BpmRange::default(),
        );
        session.run_blocking();

        let decodes = fx.decoder.calls.load(Ordering::SeqCst);
        let tempo_calls = fx.engine.tempo_calls.load(Ordering::SeqCst);
        let key_calls = fx.engine.key_calls.load(Ordering::SeqCst);
        assert_eq!(session.snapshot().records[0].result.as_ref().unwrap().bpm, 140.0);

        session.set_range(BpmRange::preset("slow").unwrap());

        let snapshot = session.snapshot();
        let a = snapshot.records[0].result.as_ref().unwrap();
        assert_eq!(a.bpm, 70.0);
        assert_eq!(a.camelot, "8A");
        assert_eq!(snapshot.records[0].raw_bpm, 70.0);
        // Undetermined tempo stays undetermined
        assert_eq!(snapshot.records[1].result.as_ref().unwrap().bpm, 0.0);
        assert_eq!(snapshot.range.label, "Slow (60-120)");

        assert_eq!(fx.decoder.calls.load(Ordering::SeqCst), decodes);
        assert_eq!(fx.engine.tempo_calls.load(Ordering::SeqCst), tempo_calls);
        assert_eq!(fx.engine.key_calls.load(Ordering::SeqCst), key_calls);
    }

    #[test]
    fn test_set_range_mid_batch_applies_to_later_tracks() {
        let fx = fixture();
        let session = Arc::new(SessionHandle::new(
            fx.analyzer.clone(),
            tracks(&[("A", "/a_70.wav"), ("B", "/b_70.wav")]),
            BpmRange::default(),
        ));

        let weak = Arc::downgrade(&session);
        session.subscribe(move |event| {
            if let SessionEvent::TrackStarted { index: 1, .. } = event {
                if let Some(session) = weak.upgrade() {
                    session.set_range(BpmRange::preset("slow").unwrap());
                }
            }
        });

        session.run_blocking();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.records[0].result.as_ref().unwrap().bpm, 70.0);
        assert_eq!(snapshot.records[1].result.as_ref().unwrap().bpm, 70.0);
    }

    #[test]
    fn test_partial_commit() {
        let fx = fixture();
        let session = Arc::new(SessionHandle::new(
            fx.analyzer.clone(),
            tracks(&[("A", "/a_70.wav"), ("B", "/corrupt.wav"), ("C", "/c_90.wav")]),
            BpmRange::default(),
        ));
        let cancel = session.cancel.clone();
        session.subscribe(move |event| {
            if let SessionEvent::TrackFinished { index: 1, .. } = event {
                cancel.cancel();
            }
        });
        session.run_blocking();

        let mut sink = RecordingSink::default();
        let count = session.commit(&mut sink).unwrap();

        assert_eq!(count, 1);
        assert_eq!(sink.written.len(), 1);
        let a = &sink.written["A"];
        assert_eq!(a.bpm, Some(140.0));
        assert_eq!(a.camelot.as_deref(), Some("8A"));
    }

    #[test]
    fn test_commit_failure_reports_written_count() {
        let fx = fixture();
        let session = SessionHandle::new(
            fx.analyzer.clone(),
            tracks(&[("A", "/a_70.wav"), ("B", "/b_128.wav"), ("C", "/c_90.wav")]),
            BpmRange::default(),
        );
        session.run_blocking();

        let mut sink = RecordingSink {
            fail_on: Some("B".to_string()),
            ..Default::default()
        };
        let err = session.commit(&mut sink).unwrap_err();

        assert_eq!(err.persisted, 1);
        assert!(sink.written.contains_key("A"));
        assert!(!sink.written.contains_key("C"));
    }

    #[test]
    fn test_threaded_session_reports_through_channel() {
        let fx = fixture();
        let mut session = SessionHandle::new(
            fx.analyzer.clone(),
            tracks(&[("A", "/a_70.wav"), ("B", "/b_128.wav")]),
            BpmRange::default(),
        );
        let events = session.events();
        session.start().unwrap();
        session.wait();

        let received: Vec<SessionEvent> = events.try_iter().collect();
        let started: Vec<usize> = received
            .iter()
            .filter_map(|e| match e {
                SessionEvent::TrackStarted { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(started, vec![0, 1]);
        assert!(matches!(
            received.last(),
            Some(SessionEvent::Finished {
                cancelled: false,
                progress: Progress { current: 2, total: 2 }
            })
        ));
        assert!(!session.is_running());
    }

    #[test]
    fn test_cancel_before_start_attempts_nothing() {
        let fx = fixture();
        let mut session = SessionHandle::new(
            fx.analyzer.clone(),
            tracks(&[("A", "/a_70.wav")]),
            BpmRange::default(),
        );
        session.cancel();
        session.start().unwrap();
        session.wait();

        let snapshot = session.snapshot();
        assert!(snapshot.cancelled);
        assert_eq!(snapshot.records[0].state(), RecordState::Pending);
        assert_eq!(fx.decoder.calls.load(Ordering::SeqCst), 0);
    }

    /// Engine that panics on a tempo of 13
    struct UnluckyEngine;

    impl FeatureEngine for UnluckyEngine {
        fn estimate_tempo(&self, buffer: &AudioBuffer) -> Result<f64, EngineFault> {
            let tempo = buffer.samples.first().copied().unwrap_or(0.0) as f64;
            if tempo == 13.0 {
                panic!("tempo tracker blew up");
            }
            Ok(tempo)
        }

        fn estimate_key(&self, _buffer: &AudioBuffer) -> Result<Option<KeyEstimate>, EngineFault> {
            Ok(None)
        }

        fn name(&self) -> &'static str {
            "unlucky"
        }
    }

    #[test]
    fn test_engine_panic_fails_row_and_session_finishes() {
        let analyzer = TrackAnalyzer::with_config(
            Arc::new(CountingDecoder::default()),
            Arc::new(UnluckyEngine),
            AnalyzerConfig {
                window_seconds: 60.0,
                analysis_sample_rate: None,
            },
        );
        let mut session = SessionHandle::new(
            analyzer,
            tracks(&[("A", "/a_13.wav"), ("B", "/b_128.wav")]),
            BpmRange::default(),
        );
        let events = session.events();
        session.start().unwrap();

        let finished = loop {
            match events.recv_timeout(std::time::Duration::from_secs(10)) {
                Ok(SessionEvent::Finished { cancelled, progress }) => break (cancelled, progress),
                Ok(_) => continue,
                Err(e) => panic!("session never finished: {:?}", e),
            }
        };
        assert_eq!(finished, (false, Progress { current: 2, total: 2 }));
        assert!(!session.is_running());
        session.wait();

        let snapshot = session.snapshot();
        let error = snapshot.records[0].error.as_ref().unwrap();
        assert_eq!(error.kind, ErrorKind::Panicked);
        assert!(error.reason.contains("tempo tracker blew up"));
        assert_eq!(snapshot.records[1].state(), RecordState::Succeeded);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_session() {
        let fx = fixture();
        let session = SessionHandle::new(
            fx.analyzer.clone(),
            tracks(&[("A", "/a_70.wav"), ("B", "/b_128.wav")]),
            BpmRange::default(),
        );
        session.subscribe(|_| panic!("listener bug"));
        session.run_blocking();

        assert_eq!(session.snapshot().summary().succeeded, 2);
        assert!(!session.is_running());
    }

    #[test]
    fn test_empty_session_finishes_immediately() {
        let fx = fixture();
        let session = SessionHandle::new(fx.analyzer.clone(), vec![], BpmRange::default());
        let events = session.events();
        session.run_blocking();

        assert_eq!(
            events.try_iter().collect::<Vec<_>>(),
            vec![SessionEvent::Finished {
                cancelled: false,
                progress: Progress { current: 0, total: 0 }
            }]
        );
    }
}

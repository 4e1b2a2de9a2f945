use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::{Receiver, Sender};

use super::remote::{RemoteEvent, RemoteTracks};
use super::*;
use crate::api::{ApiError, LikeAck, TrackId};

#[derive(Default)]
struct OutputState {
    source: Option<String>,
    sources_set: u64,
    playing: bool,
    position: f64,
    volume: f32,
    next_id: u64,
    in_flight: Option<RequestId>,
    listeners: Vec<(ListenerId, Sender<OutputEvent>)>,
}

impl OutputState {
    fn emit(&self, event: OutputEvent) {
        for (_, tx) in &self.listeners {
            let _ = tx.send(event.clone());
        }
    }

    fn abort_in_flight(&mut self) {
        if let Some(request) = self.in_flight.take() {
            self.emit(OutputEvent::PlayResolved {
                request,
                outcome: Err(PlayError::Aborted),
            });
        }
    }
}

/// In-memory output. Start requests stay in flight until the test resolves them.
#[derive(Clone, Default)]
struct FakeOutput(Rc<RefCell<OutputState>>);

impl FakeOutput {
    fn resolve(&self, outcome: Result<(), PlayError>) -> RequestId {
        let mut s = self.0.borrow_mut();
        let request = s.in_flight.take().expect("no play request in flight");
        if outcome.is_err() {
            s.playing = false;
        }
        s.emit(OutputEvent::PlayResolved { request, outcome });
        request
    }

    fn emit(&self, event: OutputEvent) {
        self.0.borrow().emit(event);
    }

    fn source(&self) -> Option<String> {
        self.0.borrow().source.clone()
    }

    fn sources_set(&self) -> u64 {
        self.0.borrow().sources_set
    }

    /// Id of the source assigned last.
    fn source_id(&self) -> SourceId {
        SourceId(self.0.borrow().sources_set)
    }

    fn time_update(&self, position: f64, duration: Option<f64>) {
        self.emit(OutputEvent::TimeUpdate {
            source: self.source_id(),
            position,
            duration,
        });
    }

    fn ended(&self) {
        self.emit(OutputEvent::Ended {
            source: self.source_id(),
        });
    }

    fn clear_source(&self) {
        let mut s = self.0.borrow_mut();
        s.source = None;
        s.playing = false;
    }

    fn position(&self) -> f64 {
        self.0.borrow().position
    }

    fn volume(&self) -> f32 {
        self.0.borrow().volume
    }

    fn listener_count(&self) -> usize {
        self.0.borrow().listeners.len()
    }
}

impl AudioOutput for FakeOutput {
    fn set_source(&mut self, url: &str) -> SourceId {
        let mut s = self.0.borrow_mut();
        s.abort_in_flight();
        s.source = Some(url.to_string());
        s.sources_set += 1;
        s.playing = false;
        s.position = 0.0;
        SourceId(s.sources_set)
    }

    fn has_source(&self) -> bool {
        self.0.borrow().source.is_some()
    }

    fn request_play(&mut self) -> RequestId {
        let mut s = self.0.borrow_mut();
        s.abort_in_flight();
        s.next_id += 1;
        let id = RequestId(s.next_id);
        s.in_flight = Some(id);
        s.playing = true;
        id
    }

    fn pause(&mut self) {
        let mut s = self.0.borrow_mut();
        s.abort_in_flight();
        s.playing = false;
    }

    fn is_paused(&self) -> bool {
        !self.0.borrow().playing
    }

    fn seek(&mut self, position: f64) {
        self.0.borrow_mut().position = position.max(0.0);
    }

    fn set_volume(&mut self, volume: f32) {
        self.0.borrow_mut().volume = volume;
    }

    fn attach(&mut self, listener: Sender<OutputEvent>) -> ListenerId {
        let mut s = self.0.borrow_mut();
        let id = ListenerId(s.listeners.len() as u64 + 1);
        s.listeners.push((id, listener));
        id
    }

    fn detach(&mut self, id: ListenerId) {
        self.0.borrow_mut().listeners.retain(|(l, _)| *l != id);
    }
}

#[derive(Default)]
struct RemoteState {
    listener: Option<Sender<RemoteEvent>>,
    next_id: u64,
    like_calls: Vec<(TrackId, bool)>,
    /// Like requests not answered yet, oldest first.
    pending_likes: Vec<(RequestId, TrackId, bool)>,
    downloads: Vec<(TrackId, String, PathBuf)>,
}

/// In-memory remote. Requests stay pending until the test answers them.
#[derive(Clone, Default)]
struct FakeRemote(Rc<RefCell<RemoteState>>);

impl FakeRemote {
    fn server_error(url: &str) -> ApiError {
        ApiError::Status {
            status: 500,
            url: url.to_string(),
        }
    }

    fn send(&self, event: RemoteEvent) {
        if let Some(tx) = &self.0.borrow().listener {
            let _ = tx.send(event);
        }
    }

    fn answer(&self, (request, track_id, liked): (RequestId, TrackId, bool), ok: bool) {
        let result = if ok {
            Ok(LikeAck { track_id, liked })
        } else {
            Err(Self::server_error("http://h/api/interactions"))
        };
        self.send(RemoteEvent::Like {
            request,
            track_id,
            result,
        });
    }

    /// Answer the oldest pending like request.
    fn answer_like(&self, ok: bool) {
        let entry = self.0.borrow_mut().pending_likes.remove(0);
        self.answer(entry, ok);
    }

    /// Answer the newest pending like request.
    fn answer_latest_like(&self, ok: bool) {
        let entry = self
            .0
            .borrow_mut()
            .pending_likes
            .pop()
            .expect("no like request pending");
        self.answer(entry, ok);
    }

    fn finish_download(&self, ok: bool) {
        let (track_id, url, dest) = self.0.borrow_mut().downloads.remove(0);
        let result = if ok {
            Ok(1024)
        } else {
            Err(Self::server_error(&url))
        };
        self.send(RemoteEvent::Download {
            track_id,
            dest,
            result,
        });
    }
}

impl RemoteTracks for FakeRemote {
    fn attach(&mut self, listener: Sender<RemoteEvent>) {
        self.0.borrow_mut().listener = Some(listener);
    }

    fn request_like(&mut self, track_id: TrackId, liked: bool) -> RequestId {
        let mut s = self.0.borrow_mut();
        s.next_id += 1;
        let request = RequestId(s.next_id);
        s.like_calls.push((track_id, liked));
        s.pending_likes.push((request, track_id, liked));
        request
    }

    fn request_download(&mut self, track_id: TrackId, url: &str, dest: &Path) {
        self.0
            .borrow_mut()
            .downloads
            .push((track_id, url.to_string(), dest.to_path_buf()));
    }
}

fn track(id: TrackId) -> TrackRef {
    TrackRef {
        id,
        title: format!("Track {id}"),
        stream_url: format!("http://h/api/tracks/{id}/stream"),
        cover_url: None,
        filename: None,
    }
}

fn abc() -> Vec<TrackRef> {
    vec![track(1), track(2), track(3)]
}

type Coordinator = PlaybackCoordinator<FakeOutput, FakeRemote>;

fn setup(remote: FakeRemote) -> (Coordinator, FakeOutput, Receiver<PlayerUpdate>) {
    let output = FakeOutput::default();
    let mut player = PlaybackCoordinator::new(output.clone(), remote, CoordinatorOptions::default());
    let rx = player.subscribe();
    (player, output, rx)
}

fn notices(rx: &Receiver<PlayerUpdate>) -> Vec<Notice> {
    rx.try_iter()
        .filter_map(|u| match u {
            PlayerUpdate::Notice(n) => Some(n),
            PlayerUpdate::State(_) => None,
        })
        .collect()
}

fn states(rx: &Receiver<PlayerUpdate>) -> Vec<PlayerSnapshot> {
    rx.try_iter()
        .filter_map(|u| match u {
            PlayerUpdate::State(s) => Some(s),
            PlayerUpdate::Notice(_) => None,
        })
        .collect()
}

#[test]
fn subscribe_delivers_current_snapshot() {
    let (_player, _output, rx) = setup(FakeRemote::default());
    let first = states(&rx);
    assert_eq!(first, vec![PlayerSnapshot::default()]);
}

#[test]
fn play_with_queue_positions_cursor_and_starts_playback() {
    let (mut player, output, _rx) = setup(FakeRemote::default());

    player.play(track(2), Some(abc()));
    let s = player.snapshot();
    assert_eq!(s.current.as_ref().map(|t| t.id), Some(2));
    assert!(s.has_prev);
    assert!(s.has_next);
    assert!(!s.is_playing, "playing only once the output confirms");
    assert_eq!(output.source().as_deref(), Some("http://h/api/tracks/2/stream"));

    output.resolve(Ok(()));
    player.pump();
    assert!(player.snapshot().is_playing);
}

#[test]
fn next_walks_the_queue_and_stops_at_the_end() {
    let (mut player, output, _rx) = setup(FakeRemote::default());

    player.play(track(2), Some(abc()));
    player.next();
    let s = player.snapshot();
    assert_eq!(s.current.as_ref().map(|t| t.id), Some(3));
    assert!(!s.has_next);
    assert_eq!(s.queue_index, Some(2));

    let loads = output.sources_set();
    player.next();
    assert_eq!(player.current().map(|t| t.id), Some(3));
    assert_eq!(output.sources_set(), loads);
}

#[test]
fn prev_is_a_noop_at_the_start() {
    let (mut player, output, _rx) = setup(FakeRemote::default());

    player.play(track(1), Some(abc()));
    let loads = output.sources_set();
    player.prev();
    assert_eq!(player.current().map(|t| t.id), Some(1));
    assert_eq!(output.sources_set(), loads);

    player.next();
    player.prev();
    assert_eq!(player.current().map(|t| t.id), Some(1));
    assert_eq!(player.snapshot().queue_len, 3);
}

#[test]
fn play_without_queue_reuses_existing_queue_or_falls_back_to_single() {
    let (mut player, _output, _rx) = setup(FakeRemote::default());

    player.play(track(1), Some(abc()));
    player.play(track(3), None);
    assert_eq!(player.snapshot().queue_len, 3);
    assert_eq!(player.snapshot().queue_index, Some(2));

    player.play(track(9), None);
    assert_eq!(player.snapshot().queue_len, 1);
    assert_eq!(player.current().map(|t| t.id), Some(9));
    assert!(!player.snapshot().has_prev);
    assert!(!player.snapshot().has_next);
}

#[test]
fn superseded_play_does_not_clobber_newer_request() {
    let (mut player, output, rx) = setup(FakeRemote::default());

    player.play(track(1), Some(abc()));
    // Second play before the first resolved: the output aborts the first.
    player.play(track(2), None);
    output.resolve(Ok(()));
    player.pump();

    let s = player.snapshot();
    assert!(s.is_playing);
    assert_eq!(s.current.as_ref().map(|t| t.id), Some(2));
    assert!(notices(&rx).is_empty());
}

#[test]
fn late_failure_of_old_request_is_ignored() {
    let (mut player, output, rx) = setup(FakeRemote::default());

    player.play(track(1), Some(abc()));
    let old = {
        // Resolve the first request only after the second has been issued.
        let s = output.0.borrow();
        s.in_flight.expect("first request in flight")
    };
    output.0.borrow_mut().in_flight = None;
    player.play(track(2), None);
    output.resolve(Ok(()));
    output.emit(OutputEvent::PlayResolved {
        request: old,
        outcome: Err(PlayError::Fetch("connection reset".into())),
    });
    player.pump();

    assert!(player.snapshot().is_playing);
    assert!(notices(&rx).is_empty());
}

#[test]
fn pause_during_pending_start_wins() {
    let (mut player, output, _rx) = setup(FakeRemote::default());

    player.play(track(1), None);
    output.resolve(Ok(()));
    player.pump();
    assert!(player.snapshot().is_playing);

    player.toggle();
    assert!(!player.snapshot().is_playing);

    // Resume, then pause again before the start resolves.
    player.toggle();
    player.toggle();
    player.pump();
    assert!(!player.snapshot().is_playing);
    assert!(output.is_paused());
}

#[test]
fn toggle_is_a_noop_when_idle() {
    let (mut player, output, rx) = setup(FakeRemote::default());
    let _ = states(&rx);

    player.toggle();
    assert!(output.source().is_none());
    assert!(states(&rx).is_empty());
}

#[test]
fn toggle_reassigns_missing_source() {
    let (mut player, output, _rx) = setup(FakeRemote::default());

    player.play(track(1), None);
    output.resolve(Err(PlayError::Device("no device".into())));
    player.pump();
    output.clear_source();

    player.toggle();
    assert_eq!(output.source().as_deref(), Some("http://h/api/tracks/1/stream"));
    output.resolve(Ok(()));
    player.pump();
    assert!(player.snapshot().is_playing);
}

#[test]
fn genuine_failure_pauses_and_reports_once() {
    let (mut player, output, rx) = setup(FakeRemote::default());

    player.play(track(1), None);
    output.resolve(Err(PlayError::Decode("not audio".into())));
    player.pump();

    let s = player.snapshot();
    assert!(!s.is_playing);
    assert_eq!(s.current.as_ref().map(|t| t.id), Some(1));

    let reported = notices(&rx);
    assert_eq!(reported.len(), 1);
    assert!(matches!(
        &reported[0],
        Notice::PlaybackFailed { track_id: 1, .. }
    ));
}

#[test]
fn seek_updates_progress_before_any_event() {
    let (mut player, output, _rx) = setup(FakeRemote::default());

    player.play(track(1), None);
    player.seek(42.5);
    assert_eq!(player.snapshot().progress, 42.5);
    assert_eq!(output.position(), 42.5);

    output.time_update(43.0, Some(180.0));
    player.pump();
    let s = player.snapshot();
    assert_eq!(s.progress, 43.0);
    assert_eq!(s.duration, 180.0);
}

#[test]
fn unknown_duration_reads_as_zero() {
    let (mut player, output, _rx) = setup(FakeRemote::default());

    player.play(track(1), None);
    output.time_update(1.0, Some(f64::NAN));
    player.pump();
    assert_eq!(player.snapshot().duration, 0.0);
}

#[test]
fn ended_advances_when_a_next_track_exists() {
    let (mut player, output, _rx) = setup(FakeRemote::default());

    player.play(track(1), Some(abc()));
    output.resolve(Ok(()));
    player.pump();

    output.ended();
    player.pump();
    assert_eq!(player.current().map(|t| t.id), Some(2));
    assert_eq!(output.source().as_deref(), Some("http://h/api/tracks/2/stream"));

    output.resolve(Ok(()));
    player.pump();
    assert!(player.snapshot().is_playing);
}

#[test]
fn ended_on_last_track_stops_and_keeps_progress() {
    let (mut player, output, _rx) = setup(FakeRemote::default());

    player.play(track(3), Some(abc()));
    output.resolve(Ok(()));
    output.time_update(179.9, Some(180.0));
    output.ended();
    player.pump();

    let s = player.snapshot();
    assert!(!s.is_playing);
    assert_eq!(s.progress, 179.9);
    assert_eq!(s.current.as_ref().map(|t| t.id), Some(3));
}

#[test]
fn end_of_a_replaced_source_does_not_skip_the_chosen_track() {
    let (mut player, output, _rx) = setup(FakeRemote::default());

    player.play(track(1), Some(abc()));
    output.resolve(Ok(()));
    player.pump();

    // Track 1 finishes, but the user picks track 2 before the event is applied.
    output.ended();
    player.play(track(2), None);
    player.pump();

    assert_eq!(player.current().map(|t| t.id), Some(2));
    assert_eq!(output.source().as_deref(), Some("http://h/api/tracks/2/stream"));
}

#[test]
fn time_update_of_a_replaced_source_keeps_the_reset() {
    let (mut player, output, _rx) = setup(FakeRemote::default());

    player.play(track(1), Some(abc()));
    output.time_update(55.0, Some(120.0));
    player.pump();
    assert_eq!(player.snapshot().progress, 55.0);

    output.time_update(56.0, Some(120.0));
    player.next();
    player.pump();

    let s = player.snapshot();
    assert_eq!(s.current.as_ref().map(|t| t.id), Some(2));
    assert_eq!(s.progress, 0.0);
    assert_eq!(s.duration, 0.0);

    output.time_update(0.5, Some(90.0));
    player.pump();
    assert_eq!(player.snapshot().progress, 0.5);
}

#[test]
fn new_track_resets_like_and_progress() {
    let remote = FakeRemote::default();
    let (mut player, output, _rx) = setup(remote.clone());

    player.play(track(1), Some(abc()));
    player.toggle_like();
    remote.answer_like(true);
    output.time_update(30.0, Some(90.0));
    player.pump();
    assert!(player.snapshot().liked);

    player.next();
    let s = player.snapshot();
    assert!(!s.liked);
    assert_eq!(s.progress, 0.0);
    assert_eq!(s.duration, 0.0);
}

#[test]
fn zero_volume_means_muted() {
    let (mut player, output, _rx) = setup(FakeRemote::default());

    player.set_volume(0.0);
    assert!(player.snapshot().muted);
    assert_eq!(output.volume(), 0.0);

    player.set_volume(1.7);
    let s = player.snapshot();
    assert_eq!(s.volume, 1.0);
    assert!(!s.muted);
}

#[test]
fn mute_round_trip_restores_previous_volume() {
    let (mut player, output, _rx) = setup(FakeRemote::default());

    player.set_volume(0.6);
    player.toggle_mute();
    let s = player.snapshot();
    assert!(s.muted);
    assert_eq!(s.volume, 0.0);

    player.toggle_mute();
    let s = player.snapshot();
    assert!(!s.muted);
    assert_eq!(s.volume, 0.6);
    assert_eq!(output.volume(), 0.6);
}

#[test]
fn unmute_after_zero_volume_restores_full_volume() {
    let (mut player, _output, _rx) = setup(FakeRemote::default());

    player.set_volume(0.0);
    player.toggle_mute();
    let s = player.snapshot();
    assert!(!s.muted);
    assert_eq!(s.volume, 1.0);
}

#[test]
fn like_shows_tentative_value_while_the_request_is_pending() {
    let remote = FakeRemote::default();
    let (mut player, _output, rx) = setup(remote.clone());

    player.play(track(2), None);
    let _ = states(&rx);

    player.toggle_like();
    let seen = states(&rx);
    assert_eq!(seen.len(), 1);
    assert!(seen[0].liked, "tentative value is published before the server answers");
    assert!(player.snapshot().liked);
    assert_eq!(remote.0.borrow().like_calls, vec![(2, true)]);

    // Nothing settles until the answer is pumped.
    assert_eq!(player.pump(), 0);
    assert!(player.snapshot().liked);

    remote.answer_like(true);
    assert_eq!(player.pump(), 1);
    assert!(player.snapshot().liked);
    assert!(notices(&rx).is_empty());
}

#[test]
fn like_confirms_with_the_server_value() {
    let remote = FakeRemote::default();
    let (mut player, _output, _rx) = setup(remote.clone());

    player.play(track(2), None);
    player.toggle_like();
    let (request, track_id, _) = remote.0.borrow_mut().pending_likes.remove(0);
    remote.send(RemoteEvent::Like {
        request,
        track_id,
        result: Ok(LikeAck {
            track_id,
            liked: false,
        }),
    });
    player.pump();
    assert!(!player.snapshot().liked);
}

#[test]
fn like_failure_rolls_back_and_notifies() {
    let remote = FakeRemote::default();
    let (mut player, _output, rx) = setup(remote.clone());

    player.play(track(2), None);
    let _ = rx.try_iter().count();

    player.toggle_like();
    remote.answer_like(false);
    player.pump();

    let updates: Vec<PlayerUpdate> = rx.try_iter().collect();
    assert!(matches!(&updates[0], PlayerUpdate::State(s) if s.liked));
    assert!(
        updates
            .iter()
            .any(|u| matches!(u, PlayerUpdate::Notice(Notice::LikeFailed { track_id: 2, .. })))
    );
    assert!(!player.snapshot().liked);
}

#[test]
fn only_the_latest_toggle_settles_the_like() {
    let remote = FakeRemote::default();
    let (mut player, _output, rx) = setup(remote.clone());

    player.play(track(2), None);
    player.toggle_like();
    player.toggle_like();
    assert!(!player.snapshot().liked);
    assert_eq!(remote.0.borrow().like_calls, vec![(2, true), (2, false)]);

    // The first answer is stale and leaves the tentative value alone.
    remote.answer_like(true);
    player.pump();
    assert!(!player.snapshot().liked);

    // The latest fails: roll back to what the server stored for the first toggle.
    let _ = rx.try_iter().count();
    remote.answer_like(false);
    player.pump();
    assert!(player.snapshot().liked);
    assert!(
        notices(&rx)
            .iter()
            .any(|n| matches!(n, Notice::LikeFailed { .. }))
    );
}

#[test]
fn like_outcome_for_a_previous_track_is_ignored() {
    let remote = FakeRemote::default();
    let (mut player, _output, rx) = setup(remote.clone());

    player.play(track(1), Some(abc()));
    player.toggle_like();
    player.next();
    player.toggle_like();
    let _ = rx.try_iter().count();

    // Track 1's request fails after the switch: no rollback, no notice.
    remote.answer_like(false);
    player.pump();
    assert!(player.snapshot().liked);
    assert!(notices(&rx).is_empty());

    remote.answer_latest_like(true);
    player.pump();
    assert!(player.snapshot().liked);
}

#[test]
fn like_without_track_makes_no_request() {
    let remote = FakeRemote::default();
    let (mut player, _output, _rx) = setup(remote.clone());

    player.toggle_like();
    assert!(remote.0.borrow().like_calls.is_empty());
    assert!(!player.snapshot().liked);
}

#[test]
fn download_runs_in_the_background_and_reports() {
    let remote = FakeRemote::default();
    let (mut player, _output, rx) = setup(remote.clone());

    player.download();
    assert!(remote.0.borrow().downloads.is_empty());

    player.play(track(4), None);
    let _ = rx.try_iter().count();
    player.download();
    let downloads = remote.0.borrow().downloads.clone();
    assert_eq!(
        downloads,
        vec![(
            4,
            "http://h/api/tracks/4/stream".to_string(),
            PathBuf::from(".").join("Track 4.mp3")
        )]
    );
    assert!(matches!(
        notices(&rx).as_slice(),
        [Notice::DownloadStarted { track_id: 4, .. }]
    ));

    remote.finish_download(true);
    player.pump();
    assert!(matches!(
        notices(&rx).as_slice(),
        [Notice::Downloaded { .. }]
    ));
}

#[test]
fn download_failure_is_reported() {
    let remote = FakeRemote::default();
    let (mut player, _output, rx) = setup(remote.clone());

    player.play(track(4), None);
    player.download();
    remote.finish_download(false);
    player.pump();
    let reported = notices(&rx);
    assert!(matches!(
        reported.as_slice(),
        [Notice::DownloadStarted { .. }, Notice::DownloadFailed { track_id: 4, .. }]
    ));
    assert!(reported[1].is_error());
    assert!(!reported[0].is_error());
}

#[test]
fn dropping_the_coordinator_detaches_from_output() {
    let output = FakeOutput::default();
    let player = PlaybackCoordinator::new(
        output.clone(),
        FakeRemote::default(),
        CoordinatorOptions::default(),
    );
    assert_eq!(output.listener_count(), 1);
    drop(player);
    assert_eq!(output.listener_count(), 0);
}

#[test]
fn download_name_prefers_filename_and_strips_separators() {
    let mut t = track(7);
    assert_eq!(t.download_name(), "Track 7.mp3");

    t.filename = Some("a/b: c".into());
    assert_eq!(t.download_name(), "a_b_ c.mp3");

    t.filename = None;
    t.title = "..".into();
    assert_eq!(t.download_name(), "track-7.mp3");
}

fn unreachable_worker() -> (RemoteWorker, Receiver<RemoteEvent>) {
    let client = crate::api::ApiClient::new(&crate::config::ApiSettings {
        base_url: "http://127.0.0.1:1/api".to_string(),
        user_id: None,
        timeout_ms: 2_000,
    });
    let mut worker = RemoteWorker::spawn(client);
    let (tx, rx) = std::sync::mpsc::channel();
    worker.attach(tx);
    (worker, rx)
}

#[test]
fn worker_reports_like_failures_with_their_request() {
    let (mut worker, rx) = unreachable_worker();
    let first = worker.request_like(7, true);
    let second = worker.request_like(7, false);
    assert_ne!(first, second);

    let timeout = std::time::Duration::from_secs(10);
    for expected in [first, second] {
        match rx.recv_timeout(timeout).unwrap() {
            RemoteEvent::Like {
                request,
                track_id,
                result,
            } => {
                assert_eq!(request, expected);
                assert_eq!(track_id, 7);
                assert!(result.is_err());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}

#[test]
fn worker_download_failure_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("song.mp3");
    let (mut worker, rx) = unreachable_worker();
    worker.request_download(3, "http://127.0.0.1:1/api/tracks/3/stream", &dest);

    match rx.recv_timeout(std::time::Duration::from_secs(10)).unwrap() {
        RemoteEvent::Download {
            track_id,
            dest: reported,
            result,
        } => {
            assert_eq!(track_id, 3);
            assert_eq!(reported, dest);
            assert!(result.is_err());
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(!dest.exists());
}

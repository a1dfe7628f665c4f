//! End-to-end session behavior against fake remote/backend collaborators.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crossbeam_channel::{unbounded, Sender};
use vignette_core::clip::{ClipBackend, ClipId, ClipLoadError};
use vignette_core::{PlayerConfig, PlayerSession, RemoteEvent, RemotePlayerHandle, TransportState};

struct FakeRemote {
    ready: bool,
    volume: u8,
    transport: TransportState,
    current: f64,
    duration: f64,
    loaded_playlists: Vec<String>,
}

impl FakeRemote {
    fn new() -> Self {
        Self {
            ready: true,
            volume: 100,
            transport: TransportState::Playing,
            current: 12.0,
            duration: 240.0,
            loaded_playlists: Vec::new(),
        }
    }
}

impl RemotePlayerHandle for FakeRemote {
    fn is_ready(&self) -> bool {
        self.ready
    }
    fn play(&mut self) {
        self.transport = TransportState::Playing;
    }
    fn pause(&mut self) {
        self.transport = TransportState::Paused;
    }
    fn next(&mut self) {}
    fn previous(&mut self) {}
    fn seek_to_fraction(&mut self, fraction: f64) {
        self.current = self.duration * fraction;
    }
    fn volume(&self) -> u8 {
        self.volume
    }
    fn set_volume(&mut self, volume: u8) {
        self.volume = volume;
    }
    fn current_time(&self) -> f64 {
        self.current
    }
    fn duration(&self) -> f64 {
        self.duration
    }
    fn transport_state(&self) -> TransportState {
        self.transport
    }
    fn load_playlist(&mut self, playlist_id: &str) {
        self.loaded_playlists.push(playlist_id.to_string());
    }
}

#[derive(Default)]
struct FakeBackend {
    playing: Option<ClipId>,
    done: HashSet<ClipId>,
    bins: Option<Vec<f32>>,
}

impl ClipBackend for FakeBackend {
    fn load(&mut self, _id: ClipId, _path: &Path) -> Result<(), ClipLoadError> {
        Ok(())
    }
    fn start(&mut self, id: ClipId) {
        self.playing = Some(id);
        self.done.remove(&id);
    }
    fn stop(&mut self, id: ClipId) {
        if self.playing == Some(id) {
            self.playing = None;
        }
        self.done.remove(&id);
    }
    fn release(&mut self, _id: ClipId) {}
    fn finished(&self, id: ClipId) -> bool {
        self.done.contains(&id)
    }
    fn spectrum(&self, bars: usize) -> Option<Vec<f32>> {
        self.bins.as_ref().map(|b| {
            (0..bars).map(|i| b[i % b.len()]).collect()
        })
    }
}

type Session = PlayerSession<FakeRemote, FakeBackend>;

fn session() -> (Session, Sender<RemoteEvent>) {
    let (tx, rx) = unbounded();
    let session = PlayerSession::new(
        FakeRemote::new(),
        rx,
        FakeBackend::default(),
        PlayerConfig::default(),
    );
    (session, tx)
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[test]
fn upload_play_end_restores_volume_in_fixed_steps() {
    let (mut session, _tx) = session();
    let id = session.library.upload("jingle.mp3", Path::new("jingle.mp3")).unwrap();

    session.library.play(id);
    session.tick(ms(0));
    assert_eq!(session.remote.volume, 0);
    assert!(session.mixer.is_ducked());

    // The clip runs out on its own.
    session.library.backend_mut().done.insert(id);
    session.tick(ms(1000));
    assert!(!session.mixer.is_ducked());
    assert!(session.mixer.fade_active());

    // +5 every 80ms from 0 to 100: exactly 20 ramp ticks.
    let mut now = ms(1000);
    for _ in 0..20 {
        assert!(session.mixer.fade_active());
        now += ms(80);
        session.tick(now);
        assert!(session.remote.volume <= 100);
    }
    assert_eq!(session.remote.volume, 100);
    assert!(!session.mixer.fade_active());
}

#[test]
fn clip_switch_spans_a_single_duck_episode() {
    let (mut session, _tx) = session();
    let a = session.library.upload("a.mp3", Path::new("a.mp3")).unwrap();
    let b = session.library.upload("b.mp3", Path::new("b.mp3")).unwrap();

    session.library.toggle(a);
    session.tick(ms(0));
    assert_eq!(session.mixer.saved_volume(), Some(100));
    assert_eq!(session.remote.volume, 0);

    // Clicking the other clip switches exclusively to it: no restore-then-duck
    // flicker, volume stays down and the saved level is untouched.
    session.library.toggle(b);
    session.tick(ms(100));
    assert!(session.mixer.is_ducked());
    assert!(!session.mixer.fade_active());
    assert_eq!(session.mixer.saved_volume(), Some(100));
    assert_eq!(session.remote.volume, 0);

    // Stopping the second clip ends the episode.
    session.library.toggle(b);
    session.tick(ms(200));
    assert!(!session.mixer.is_ducked());
}

#[test]
fn visualizer_prefers_analysis_then_synthetic_then_idle() {
    let (mut session, _tx) = session();
    let id = session.library.upload("a.mp3", Path::new("a.mp3")).unwrap();
    session.tick(ms(0));

    // Remote playing, no clip: synthetic motion, not a flat line.
    let bars = session.visualizer_frame(ms(0), 100.0).unwrap();
    assert!(bars.iter().any(|&h| h > 2.0));

    // Clip playing with live bins: analysis data wins.
    session.library.play(id);
    session.library.backend_mut().bins = Some(vec![1.0]);
    session.tick(ms(50));
    let bars = session.visualizer_frame(ms(50), 100.0).unwrap();
    assert!(bars.iter().all(|&h| h == 100.0));

    // Nothing audible, remote paused: every bar at the idle floor.
    session.library.stop(id);
    session.library.backend_mut().bins = None;
    session.remote.pause();
    session.tick(ms(100));
    let bars = session.visualizer_frame(ms(100), 100.0).unwrap();
    assert_eq!(bars.len(), 64);
    assert!(bars.iter().all(|&h| h == 2.0));
}

#[test]
fn invalid_playlist_input_shows_transient_error_without_remote_calls() {
    let (mut session, _tx) = session();
    session.load_playlist_input("no-list-here", ms(0));
    assert!(session.notice.is_some());
    assert!(session.remote.loaded_playlists.is_empty());

    // The message dismisses itself after 4 seconds.
    session.tick(ms(3999));
    assert!(session.notice.is_some());
    session.tick(ms(4000));
    assert!(session.notice.is_none());
}

#[test]
fn valid_playlist_input_reaches_the_remote() {
    let (mut session, _tx) = session();
    session.load_playlist_input("https://youtube.com/watch?v=x&list=PLabc123", ms(0));
    assert!(session.notice.is_none());
    assert_eq!(session.remote.loaded_playlists, vec!["PLabc123".to_string()]);
}

#[test]
fn remote_error_event_surfaces_its_code() {
    let (mut session, tx) = session();
    tx.send(RemoteEvent::Error(150)).unwrap();
    session.tick(ms(0));
    let notice = session.notice.as_ref().unwrap();
    assert!(notice.text.contains("150"));
}

#[test]
fn progress_updates_on_the_poll_interval() {
    let (mut session, _tx) = session();
    session.tick(ms(0));
    assert_eq!(session.progress.duration, 0.0);

    session.tick(ms(100));
    assert_eq!(session.progress.duration, 0.0);

    session.tick(ms(250));
    assert_eq!(session.progress.current, 12.0);
    assert_eq!(session.progress.duration, 240.0);
    assert!((session.progress.fraction() - 0.05).abs() < 1e-6);
}

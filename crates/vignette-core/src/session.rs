//! The session object: one explicit owner for the remote handle, the clip
//! registry, the mixer and the visualizer, wired together over event channels
//! instead of ambient globals.

use std::time::Duration;

use crossbeam_channel::Receiver;
use log::warn;

use crate::clip::{ClipBackend, ClipEvent, VignetteLibrary};
use crate::config::PlayerConfig;
use crate::mixer::MixController;
use crate::playlist::{extract_playlist_id, StatusMessage};
use crate::remote::{RemoteEvent, RemotePlayerHandle, TransportState};
use crate::tasks::Ticker;
use crate::visualizer::VisualizerEngine;

const PROGRESS_POLL: Duration = Duration::from_millis(250);

/// Last polled progress of the remote player.
#[derive(Clone, Copy, Debug, Default)]
pub struct Progress {
    pub current: f64,
    pub duration: f64,
}

impl Progress {
    pub fn fraction(&self) -> f32 {
        if self.duration > 0.0 {
            (self.current / self.duration).clamp(0.0, 1.0) as f32
        } else {
            0.0
        }
    }
}

pub struct PlayerSession<R: RemotePlayerHandle, B: ClipBackend> {
    pub remote: R,
    pub library: VignetteLibrary<B>,
    pub mixer: MixController,
    pub visualizer: VisualizerEngine,
    pub progress: Progress,
    pub notice: Option<StatusMessage>,
    clip_events: Receiver<ClipEvent>,
    remote_events: Receiver<RemoteEvent>,
    progress_poll: Ticker,
}

impl<R: RemotePlayerHandle, B: ClipBackend> PlayerSession<R, B> {
    pub fn new(
        remote: R,
        remote_events: Receiver<RemoteEvent>,
        backend: B,
        config: PlayerConfig,
    ) -> Self {
        let (library, clip_events) = VignetteLibrary::new(backend);
        Self {
            remote,
            library,
            mixer: MixController::new(config.mix),
            visualizer: VisualizerEngine::new(config.viz),
            progress: Progress::default(),
            notice: None,
            clip_events,
            remote_events,
            progress_poll: Ticker::new(PROGRESS_POLL),
        }
    }

    /// One cooperative step: drain events into the mixer and the notices,
    /// detect natural clip ends, advance the fade ramp, run the progress
    /// poll and the visualizer lifecycle. Safe to call every frame.
    pub fn tick(&mut self, now: Duration) {
        if !self.progress_poll.running() {
            self.progress_poll.start(now);
        }

        self.library.poll_finished();

        while let Ok(event) = self.clip_events.try_recv() {
            match event {
                ClipEvent::Started(_) => self.mixer.on_clip_started(&mut self.remote),
                ClipEvent::Ended(_) => {
                    // Library state already reflects the switch, so a clip
                    // swap stays inside a single duck episode.
                    let other_playing = self.library.any_playing();
                    self.mixer.on_clip_ended(other_playing, now, &mut self.remote);
                }
            }
        }

        while let Ok(event) = self.remote_events.try_recv() {
            match event {
                RemoteEvent::Ready | RemoteEvent::StateChange(_) => {}
                RemoteEvent::Error(code) => {
                    warn!("remote player error {code}");
                    self.notice = Some(StatusMessage::new(
                        format!("Player error {code}: video or playlist unavailable."),
                        now,
                    ));
                }
            }
        }

        self.mixer.tick(now, &mut self.remote);

        while self.progress_poll.due(now) {
            self.progress = Progress {
                current: self.remote.current_time(),
                duration: self.remote.duration(),
            };
        }

        self.update_visualizer_lifecycle(now);

        if let Some(notice) = &self.notice {
            if !notice.visible(now) {
                self.notice = None;
            }
        }
    }

    /// Validate pasted playlist input. Invalid input only produces a
    /// transient message; the remote player is never touched.
    pub fn load_playlist_input(&mut self, input: &str, now: Duration) {
        match extract_playlist_id(input) {
            Some(id) => {
                self.notice = None;
                self.remote.load_playlist(&id);
            }
            None => {
                self.notice = Some(StatusMessage::new(
                    "Invalid playlist URL: expected a 'list=' parameter.",
                    now,
                ));
            }
        }
    }

    /// Bar heights for the current frame, or None when the surface should be
    /// blank. `half_height` is half the drawing surface height.
    pub fn visualizer_frame(&mut self, now: Duration, half_height: f32) -> Option<Vec<f32>> {
        let clip_playing = self.library.any_playing();
        let bins = if clip_playing {
            self.library.backend().spectrum(self.visualizer.config().bar_count)
        } else {
            None
        };
        let source = VisualizerEngine::select_source(
            clip_playing,
            bins.is_some(),
            self.remote.transport_state(),
        );
        self.visualizer
            .frame(now, now.as_secs_f64(), source, bins.as_deref(), half_height)
    }

    fn update_visualizer_lifecycle(&mut self, now: Duration) {
        let audible = self.library.any_playing()
            || self.remote.transport_state() == TransportState::Playing;
        if self.visualizer.config().run_while_idle || audible {
            if !self.visualizer.running() {
                self.visualizer.start();
            }
        } else {
            self.visualizer.stop(now);
        }
    }
}

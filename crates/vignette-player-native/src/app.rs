use std::time::Instant;

use crossbeam_channel::unbounded;
use log::warn;
use rodio::{OutputStream, OutputStreamHandle};
use vignette_core::{PlayerConfig, PlayerSession};

use crate::audio_backend::RodioClipBackend;
use crate::player::LocalPlaylistPlayer;

pub struct VignettePlayerApp {
    // Owns the audio device for both the playlist player and the clips.
    _stream: Option<OutputStream>,
    pub session: PlayerSession<LocalPlaylistPlayer, RodioClipBackend>,
    pub playlist_input: String,
    started: Instant,
}

impl VignettePlayerApp {
    pub fn new(config: PlayerConfig) -> Self {
        let (stream, handle): (Option<OutputStream>, Option<OutputStreamHandle>) =
            match OutputStream::try_default() {
                Ok((stream, handle)) => (Some(stream), Some(handle)),
                Err(e) => {
                    warn!("no audio output device: {e}");
                    (None, None)
                }
            };
        let (remote_tx, remote_rx) = unbounded();
        let remote = LocalPlaylistPlayer::new(handle.clone(), remote_tx);
        let backend = RodioClipBackend::new(handle);
        Self {
            _stream: stream,
            session: PlayerSession::new(remote, remote_rx, backend, config),
            playlist_input: String::new(),
            started: Instant::now(),
        }
    }

    pub fn now(&self) -> std::time::Duration {
        self.started.elapsed()
    }
}

impl eframe::App for VignettePlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.session.remote.poll();
        self.session.tick(self.now());
        self.draw(ctx);
        ctx.request_repaint();
    }
}

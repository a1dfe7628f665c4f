//! Local stand-in for the remote playlist player: a rodio-backed queue of
//! files behind the same command/event surface the core consumes.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

use crossbeam_channel::Sender;
use log::warn;
use rodio::{Decoder, OutputStreamHandle, Sink, Source};
use vignette_core::remote::{RemoteEvent, RemotePlayerHandle, TransportState};

/// Error code reported when a queued file cannot be played.
const ERR_PLAYBACK: u16 = 5;
/// Error code reported for playlist identifiers this player cannot resolve.
const ERR_UNAVAILABLE: u16 = 100;

pub struct LocalTrack {
    pub name: String,
    pub path: PathBuf,
    pub duration: f64,
}

pub struct LocalPlaylistPlayer {
    handle: Option<OutputStreamHandle>,
    sink: Option<Sink>,
    tracks: Vec<LocalTrack>,
    current: Option<usize>,
    volume: u8,
    transport: TransportState,
    started_at: Option<Instant>,
    seek_offset: f64,
    duration: f64,
    events: Sender<RemoteEvent>,
}

impl LocalPlaylistPlayer {
    pub fn new(handle: Option<OutputStreamHandle>, events: Sender<RemoteEvent>) -> Self {
        if handle.is_some() {
            let _ = events.send(RemoteEvent::Ready);
        }
        Self {
            handle,
            sink: None,
            tracks: Vec::new(),
            current: None,
            volume: 100,
            transport: TransportState::Unstarted,
            started_at: None,
            seek_offset: 0.0,
            duration: 0.0,
            events,
        }
    }

    pub fn add_tracks(&mut self, paths: Vec<PathBuf>) {
        for path in paths {
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
                continue;
            };
            self.tracks.push(LocalTrack {
                name,
                path,
                duration: 0.0,
            });
        }
        if self.current.is_none() && !self.tracks.is_empty() {
            self.current = Some(0);
            self.set_transport(TransportState::Cued);
        }
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn current_track(&self) -> Option<&LocalTrack> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Called once per frame: tracks natural end-of-media and advances the
    /// queue, moving to `Ended` after the last track.
    pub fn poll(&mut self) {
        if self.transport != TransportState::Playing {
            return;
        }
        let drained = self.sink.as_ref().is_some_and(Sink::empty);
        if !drained {
            return;
        }
        match self.current {
            Some(i) if i + 1 < self.tracks.len() => self.start_track(i + 1),
            _ => {
                self.sink = None;
                self.started_at = None;
                self.seek_offset = 0.0;
                self.set_transport(TransportState::Ended);
            }
        }
    }

    pub fn start_track(&mut self, index: usize) {
        if index >= self.tracks.len() {
            return;
        }
        let Some(handle) = self.handle.clone() else { return };
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.current = Some(index);
        let path = self.tracks[index].path.clone();
        self.set_transport(TransportState::Buffering);

        let sink = match open_track(&handle, &path) {
            Ok((sink, duration)) => {
                // A decoder with no length report (common for mp3/ogg) must
                // not inherit the previous track's duration.
                self.duration = total_secs(duration);
                sink
            }
            Err(e) => {
                warn!("cannot play {}: {e}", path.display());
                let _ = self.events.send(RemoteEvent::Error(ERR_PLAYBACK));
                self.set_transport(TransportState::Cued);
                return;
            }
        };
        sink.set_volume(f32::from(self.volume) / 100.0);

        self.tracks[index].duration = self.duration;
        self.sink = Some(sink);
        self.started_at = Some(Instant::now());
        self.seek_offset = 0.0;
        self.set_transport(TransportState::Playing);
    }

    /// Best-effort seek: WAV gets sample-accurate positioning via hound,
    /// everything else restarts from the top with an offset marker. A paused
    /// player stays paused at the new position.
    fn seek_to_time(&mut self, time: f64) {
        let Some(index) = self.current else { return };
        let Some(handle) = self.handle.clone() else { return };
        let path = self.tracks[index].path.clone();
        let resume = self.transport != TransportState::Paused;

        if let Some(old) = self.sink.take() {
            old.stop();
        }

        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
        if is_wav {
            if let Ok(mut reader) = hound::WavReader::open(&path) {
                let spec = reader.spec();
                let channels = spec.channels as usize;
                let total_samples = reader.duration();
                let start_sample = (time * f64::from(spec.sample_rate)) as u64;
                let mut samples = reader.samples::<i16>();
                let to_skip = start_sample.saturating_mul(channels as u64);
                for _ in 0..to_skip {
                    let _ = samples.next();
                }
                let rest: Vec<i16> = samples.filter_map(Result::ok).collect();
                let source =
                    rodio::buffer::SamplesBuffer::new(spec.channels, spec.sample_rate, rest);
                if let Ok(sink) = Sink::try_new(&handle) {
                    sink.set_volume(f32::from(self.volume) / 100.0);
                    sink.append(source);
                    self.sink = Some(sink);
                    if total_samples > 0 {
                        self.duration = f64::from(total_samples) / f64::from(spec.sample_rate);
                    }
                    self.finish_seek(time, resume);
                    return;
                }
            }
        }

        // Fallback: restart and mark the desired offset (approximate).
        self.start_track(index);
        if self.sink.is_some() {
            self.finish_seek(time, resume);
        }
    }

    /// Settle position and transport after a seek. A new sink plays by
    /// default, so a seek out of `Paused` has to pause it again.
    fn finish_seek(&mut self, time: f64, resume: bool) {
        self.seek_offset = time;
        if resume {
            self.started_at = Some(Instant::now());
            self.set_transport(TransportState::Playing);
        } else {
            if let Some(sink) = &self.sink {
                sink.pause();
            }
            self.started_at = None;
            self.set_transport(TransportState::Paused);
        }
    }

    fn set_transport(&mut self, state: TransportState) {
        if self.transport != state {
            self.transport = state;
            let _ = self.events.send(RemoteEvent::StateChange(state));
        }
    }

    fn elapsed(&self) -> f64 {
        self.started_at.map_or(0.0, |s| s.elapsed().as_secs_f64())
    }
}

fn open_track(
    handle: &OutputStreamHandle,
    path: &std::path::Path,
) -> Result<(Sink, Option<std::time::Duration>), String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let decoder = Decoder::new(BufReader::new(file)).map_err(|e| e.to_string())?;
    let duration = decoder.total_duration();
    let sink = Sink::try_new(handle).map_err(|e| e.to_string())?;
    sink.append(decoder);
    Ok((sink, duration))
}

/// Seconds for a reported track length; zero when the decoder reports none.
fn total_secs(total: Option<std::time::Duration>) -> f64 {
    total.map_or(0.0, |d| d.as_secs_f64())
}

impl RemotePlayerHandle for LocalPlaylistPlayer {
    fn is_ready(&self) -> bool {
        self.handle.is_some()
    }

    fn play(&mut self) {
        if !self.is_ready() {
            return;
        }
        if let Some(sink) = &self.sink {
            sink.play();
            self.started_at = Some(Instant::now());
            self.set_transport(TransportState::Playing);
        } else if let Some(index) = self.current {
            self.start_track(index);
        }
    }

    fn pause(&mut self) {
        let Some(sink) = &self.sink else { return };
        sink.pause();
        self.seek_offset += self.elapsed();
        self.started_at = None;
        self.set_transport(TransportState::Paused);
    }

    fn next(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        let next = self.current.map_or(0, |i| (i + 1) % self.tracks.len());
        self.start_track(next);
    }

    fn previous(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        // Restart the current track unless we are still near its beginning.
        if self.current_time() > 3.0 {
            self.seek_to_time(0.0);
            return;
        }
        let prev = self.current.map_or(0, |i| i.saturating_sub(1));
        self.start_track(prev);
    }

    fn seek_to_fraction(&mut self, fraction: f64) {
        if !self.is_ready() || self.duration <= 0.0 {
            return;
        }
        self.seek_to_time(self.duration * fraction.clamp(0.0, 1.0));
    }

    fn volume(&self) -> u8 {
        self.volume
    }

    fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(100);
        if let Some(sink) = &self.sink {
            sink.set_volume(f32::from(self.volume) / 100.0);
        }
    }

    fn current_time(&self) -> f64 {
        self.seek_offset + self.elapsed()
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn transport_state(&self) -> TransportState {
        self.transport
    }

    fn load_playlist(&mut self, playlist_id: &str) {
        // The local stand-in cannot resolve remote playlist identifiers;
        // report the queue as unavailable, the way the remote service would.
        warn!("cannot resolve remote playlist {playlist_id:?} locally");
        let _ = self.events.send(RemoteEvent::Error(ERR_UNAVAILABLE));
    }
}

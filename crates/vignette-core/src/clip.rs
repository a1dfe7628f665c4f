//! Registry of locally-uploaded vignette clips (jingles/stingers).
//!
//! The registry owns the names and playback states; actual decoding and audio
//! output live behind [`ClipBackend`] so the registry stays testable without
//! an audio device.

use std::path::Path;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::debug;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClipId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipState {
    Idle,
    Playing,
    // Reserved for backends that report pause separately; every observed stop
    // path resets the clip to the start, which lands in Idle.
    Paused,
}

/// Clip lifecycle notifications, consumed by the mixer and the visualizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipEvent {
    Started(ClipId),
    Ended(ClipId),
}

#[derive(Debug, Error)]
#[error("could not load {path}: {reason}")]
pub struct ClipLoadError {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("a clip named {0:?} already exists")]
    DuplicateName(String),
    #[error(transparent)]
    Load(#[from] ClipLoadError),
}

/// Audio side of the clip registry: decoding, playback and the shared
/// analysis tap the visualizer reads from.
pub trait ClipBackend {
    fn load(&mut self, id: ClipId, path: &Path) -> Result<(), ClipLoadError>;
    /// Start playback from the beginning of the clip.
    fn start(&mut self, id: ClipId);
    /// Stop playback and reset the position to the start.
    fn stop(&mut self, id: ClipId);
    /// Drop the decoded resource for a removed clip.
    fn release(&mut self, id: ClipId);
    /// True when a started clip has reached its natural end.
    fn finished(&self, id: ClipId) -> bool;
    /// Normalized (0..=1) spectrum magnitudes from the shared analysis tap,
    /// or None while no tap exists or nothing feeds it.
    fn spectrum(&self, bars: usize) -> Option<Vec<f32>>;
}

pub struct VignetteClip {
    pub id: ClipId,
    pub name: String,
    pub state: ClipState,
}

pub struct VignetteLibrary<B: ClipBackend> {
    backend: B,
    clips: Vec<VignetteClip>,
    next_id: usize,
    events: Sender<ClipEvent>,
}

impl<B: ClipBackend> VignetteLibrary<B> {
    pub fn new(backend: B) -> (Self, Receiver<ClipEvent>) {
        let (events, rx) = unbounded();
        (
            Self {
                backend,
                clips: Vec::new(),
                next_id: 0,
                events,
            },
            rx,
        )
    }

    /// Register a new clip. A clip whose display name is already taken is
    /// rejected, not overwritten.
    pub fn upload(&mut self, name: &str, path: &Path) -> Result<ClipId, LibraryError> {
        if self.clips.iter().any(|c| c.name == name) {
            return Err(LibraryError::DuplicateName(name.to_string()));
        }
        let id = ClipId(self.next_id);
        self.backend.load(id, path)?;
        debug!("loaded clip {} as {id:?}", path.display());
        self.next_id += 1;
        self.clips.push(VignetteClip {
            id,
            name: name.to_string(),
            state: ClipState::Idle,
        });
        Ok(id)
    }

    /// Start `id`, stopping every other playing clip first. At most one clip
    /// is ever in `Playing` state.
    pub fn play(&mut self, id: ClipId) {
        let Some(i) = self.index_of(id) else { return };
        if self.clips[i].state == ClipState::Playing {
            return;
        }
        let others: Vec<ClipId> = self
            .clips
            .iter()
            .filter(|c| c.id != id && c.state == ClipState::Playing)
            .map(|c| c.id)
            .collect();
        for other in others {
            self.stop(other);
        }
        self.clips[i].state = ClipState::Playing;
        self.backend.start(id);
        let _ = self.events.send(ClipEvent::Started(id));
    }

    /// Stop `id` and reset it to the start.
    pub fn stop(&mut self, id: ClipId) {
        let Some(i) = self.index_of(id) else { return };
        if self.clips[i].state != ClipState::Playing {
            return;
        }
        self.clips[i].state = ClipState::Idle;
        self.backend.stop(id);
        let _ = self.events.send(ClipEvent::Ended(id));
    }

    /// Click semantics for the clip list: a playing clip stops, any other
    /// clip switches playback to itself exclusively.
    pub fn toggle(&mut self, id: ClipId) {
        match self.state(id) {
            Some(ClipState::Playing) => self.stop(id),
            Some(_) => self.play(id),
            None => {}
        }
    }

    /// Remove a clip and release its decoded resource.
    pub fn remove(&mut self, id: ClipId) {
        if self.state(id) == Some(ClipState::Playing) {
            self.stop(id);
        }
        if let Some(i) = self.index_of(id) {
            self.clips.remove(i);
            self.backend.release(id);
        }
    }

    /// Detect natural end-of-media for playing clips. Ends are reported as
    /// the same `Ended` event a manual stop produces.
    pub fn poll_finished(&mut self) {
        let done: Vec<ClipId> = self
            .clips
            .iter()
            .filter(|c| c.state == ClipState::Playing && self.backend.finished(c.id))
            .map(|c| c.id)
            .collect();
        for id in done {
            self.stop(id);
        }
    }

    pub fn any_playing(&self) -> bool {
        self.clips.iter().any(|c| c.state == ClipState::Playing)
    }

    pub fn state(&self, id: ClipId) -> Option<ClipState> {
        self.clips.iter().find(|c| c.id == id).map(|c| c.state)
    }

    pub fn clips(&self) -> &[VignetteClip] {
        &self.clips
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn index_of(&self, id: ClipId) -> Option<usize> {
        self.clips.iter().position(|c| c.id == id)
    }
}

//! Headless core of the vignette player: the remote-player boundary, the
//! vignette clip registry, the audio-mix (ducking) state machine, the
//! visualizer engine and the session object tying them together.
//!
//! Nothing in this crate touches a window, a file dialog or an audio device;
//! those live in the shell crates behind the `RemotePlayerHandle` and
//! `ClipBackend` traits.

pub mod clip;
pub mod config;
pub mod mixer;
pub mod playlist;
pub mod remote;
pub mod session;
pub mod tasks;
pub mod visualizer;

pub use clip::{ClipBackend, ClipEvent, ClipId, ClipState, LibraryError, VignetteLibrary};
pub use config::PlayerConfig;
pub use mixer::{DuckPolicy, MixConfig, MixController, RestoreMode};
pub use playlist::{extract_playlist_id, format_time, StatusMessage};
pub use remote::{RemoteEvent, RemotePlayerHandle, TransportState};
pub use session::PlayerSession;
pub use visualizer::{BarSource, VisualizerEngine, VizConfig};

//! Boundary to the externally-hosted playlist player. The core only consumes
//! this surface; it never implements the player itself.

/// Playback phase as reported by the remote player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Unstarted,
    Playing,
    Paused,
    Buffering,
    Cued,
    Ended,
}

/// Notifications pushed by the remote player over the session's event channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteEvent {
    Ready,
    StateChange(TransportState),
    /// Remote-side failure, carrying the player's numeric error code.
    Error(u16),
}

/// Command surface of the remote playlist player.
///
/// Implementations must treat every command as a no-op until `is_ready`
/// returns true: never panic, never queue.
pub trait RemotePlayerHandle {
    fn is_ready(&self) -> bool;

    fn play(&mut self);
    fn pause(&mut self);
    fn next(&mut self);
    fn previous(&mut self);
    /// Seek to a position expressed as a fraction (0.0..=1.0) of the duration.
    fn seek_to_fraction(&mut self, fraction: f64);

    /// Current volume, 0..=100.
    fn volume(&self) -> u8;
    fn set_volume(&mut self, volume: u8);

    /// Elapsed time of the current item, in seconds.
    fn current_time(&self) -> f64;
    /// Duration of the current item, in seconds (may be NaN before metadata).
    fn duration(&self) -> f64;

    fn transport_state(&self) -> TransportState;

    /// Replace the active queue with the playlist behind `playlist_id`.
    fn load_playlist(&mut self, playlist_id: &str);
}

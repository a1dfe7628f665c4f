//! Ducking state machine: while a vignette is audible the remote player is
//! pulled down to a duck target, and restored when the last vignette ends.

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::remote::RemotePlayerHandle;
use crate::tasks::Ticker;

/// What the remote volume is pulled down to while a vignette plays.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum DuckPolicy {
    Mute,
    /// Multiply the saved volume by this factor (e.g. 0.2).
    Attenuate(f32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestoreMode {
    Instant,
    Fade,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixConfig {
    pub policy: DuckPolicy,
    pub restore: RestoreMode,
    /// Volume units added per ramp tick.
    pub fade_step: u8,
    pub fade_interval_ms: u64,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            policy: DuckPolicy::Mute,
            restore: RestoreMode::Fade,
            fade_step: 5,
            fade_interval_ms: 80,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MixState {
    Unducked,
    /// `saved_volume` is captured exactly once, at the start of the episode.
    /// None when the remote was not ready at that moment.
    Ducked { saved_volume: Option<u8> },
}

struct FadeRamp {
    target: u8,
    ticker: Ticker,
}

pub struct MixController {
    config: MixConfig,
    state: MixState,
    ramp: Option<FadeRamp>,
}

impl MixController {
    pub fn new(config: MixConfig) -> Self {
        Self {
            config,
            state: MixState::Unducked,
            ramp: None,
        }
    }

    pub fn is_ducked(&self) -> bool {
        matches!(self.state, MixState::Ducked { .. })
    }

    pub fn fade_active(&self) -> bool {
        self.ramp.is_some()
    }

    pub fn saved_volume(&self) -> Option<u8> {
        match self.state {
            MixState::Ducked { saved_volume } => saved_volume,
            MixState::Unducked => None,
        }
    }

    /// `Unducked -> Ducked` transition. A `Started` while already ducked
    /// keeps the episode: the saved volume is never overwritten with an
    /// already-reduced level.
    pub fn on_clip_started(&mut self, remote: &mut dyn RemotePlayerHandle) {
        // An in-flight restore ramp still holds the true original level;
        // cancelling it mid-way must not lose that as the restore target.
        let interrupted_target = self.ramp.take().map(|r| r.target);

        if let MixState::Ducked { .. } = self.state {
            return;
        }
        let saved = if !remote.is_ready() {
            None
        } else if let Some(target) = interrupted_target {
            Some(target)
        } else {
            Some(remote.volume())
        };
        if remote.is_ready() {
            if let Some(saved) = saved {
                remote.set_volume(self.duck_target(saved));
            }
        }
        debug!("ducking, saved volume {saved:?}");
        self.state = MixState::Ducked { saved_volume: saved };
    }

    /// `Ducked -> Unducked` transition, taken only once no other clip is
    /// still playing.
    pub fn on_clip_ended(
        &mut self,
        other_clip_playing: bool,
        now: Duration,
        remote: &mut dyn RemotePlayerHandle,
    ) {
        if other_clip_playing {
            return;
        }
        let MixState::Ducked { saved_volume } = self.state else {
            return;
        };
        self.state = MixState::Unducked;
        debug!("restoring volume to {saved_volume:?}");
        let Some(target) = saved_volume else { return };
        if !remote.is_ready() {
            return;
        }
        match self.config.restore {
            RestoreMode::Instant => remote.set_volume(target),
            RestoreMode::Fade => {
                if remote.volume() >= target {
                    remote.set_volume(target);
                } else {
                    let mut ticker = Ticker::new(Duration::from_millis(self.config.fade_interval_ms));
                    ticker.start(now);
                    self.ramp = Some(FadeRamp { target, ticker });
                }
            }
        }
    }

    /// Advance the restore ramp: one fixed step per elapsed interval, snap to
    /// the exact target, then drop the ramp so no timer lingers.
    pub fn tick(&mut self, now: Duration, remote: &mut dyn RemotePlayerHandle) {
        if !remote.is_ready() {
            return;
        }
        let Some(ramp) = &mut self.ramp else { return };
        while ramp.ticker.due(now) {
            let next = remote.volume().saturating_add(self.config.fade_step);
            if next >= ramp.target {
                remote.set_volume(ramp.target);
                self.ramp = None;
                return;
            }
            remote.set_volume(next);
        }
    }

    fn duck_target(&self, saved: u8) -> u8 {
        match self.config.policy {
            DuckPolicy::Mute => 0,
            DuckPolicy::Attenuate(factor) => (f32::from(saved) * factor).round() as u8,
        }
    }
}

//! Visualizer engine: picks a data source for each frame (real analysis bins,
//! a synthetic pulsing waveform, or a flat idle line) and turns it into bar
//! heights. Drawing is left to the shell.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::remote::TransportState;

/// The synthetic waveform always renders this many bars.
pub const SYNTHETIC_BARS: usize = 64;

const K1: f64 = 2.0;
const P1: f64 = 0.35;
const K2: f64 = 3.1;
const P2: f64 = 0.18;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarSource {
    /// Real spectrum magnitudes from the analysis tap of the playing clip.
    Analysis,
    /// Time-based pulsing waveform while the remote player is audible.
    Synthetic,
    /// Flat line at the minimum bar height.
    Idle,
    /// Render nothing.
    Off,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub bar_count: usize,
    pub scale: f32,
    /// Bars never drop below this height, so idle stays visibly distinct
    /// from stopped.
    pub min_bar_height: f32,
    /// How long the last frame lingers after the loop stops.
    pub clear_delay_ms: u64,
    /// Keep the loop scheduled even while nothing is audible.
    pub run_while_idle: bool,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            bar_count: 64,
            scale: 1.0,
            min_bar_height: 2.0,
            clear_delay_ms: 100,
            run_while_idle: true,
        }
    }
}

pub struct VisualizerEngine {
    config: VizConfig,
    running: bool,
    clear_at: Option<Duration>,
    last_frame: Option<Vec<f32>>,
}

impl VisualizerEngine {
    pub fn new(config: VizConfig) -> Self {
        Self {
            config,
            running: false,
            clear_at: None,
            last_frame: None,
        }
    }

    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        self.running = true;
        self.clear_at = None;
    }

    /// Stop the loop. The last frame keeps rendering for a short delay
    /// before the surface clears, instead of snapping to blank.
    pub fn stop(&mut self, now: Duration) {
        if self.running {
            self.running = false;
            self.clear_at = Some(now + Duration::from_millis(self.config.clear_delay_ms));
        }
    }

    /// Source priority: analysis beats synthetic beats idle; anything else
    /// renders nothing.
    pub fn select_source(
        clip_playing: bool,
        analysis_available: bool,
        remote: TransportState,
    ) -> BarSource {
        if clip_playing && analysis_available {
            BarSource::Analysis
        } else if remote == TransportState::Playing {
            BarSource::Synthetic
        } else if matches!(remote, TransportState::Paused | TransportState::Cued) {
            BarSource::Idle
        } else {
            BarSource::Off
        }
    }

    /// Bar heights for one frame, or None when the surface should be blank.
    /// `half_height` is half the drawing surface height; the shell mirrors
    /// bars around the center line or anchors them to the bottom.
    pub fn frame(
        &mut self,
        now: Duration,
        t: f64,
        source: BarSource,
        bins: Option<&[f32]>,
        half_height: f32,
    ) -> Option<Vec<f32>> {
        if self.running {
            let frame = self.bars(source, t, bins, half_height);
            self.last_frame = frame.clone();
            frame
        } else if let Some(at) = self.clear_at {
            if now >= at {
                self.clear_at = None;
                self.last_frame = None;
                None
            } else {
                self.last_frame.clone()
            }
        } else {
            None
        }
    }

    fn bars(
        &self,
        source: BarSource,
        t: f64,
        bins: Option<&[f32]>,
        half_height: f32,
    ) -> Option<Vec<f32>> {
        match source {
            BarSource::Off => None,
            BarSource::Idle => Some(vec![self.config.min_bar_height; self.config.bar_count]),
            BarSource::Synthetic => Some(self.synthetic_bars(t, half_height)),
            BarSource::Analysis => {
                let bins = bins?;
                if bins.is_empty() {
                    return None;
                }
                let out = (0..self.config.bar_count)
                    .map(|i| {
                        let idx = i * bins.len() / self.config.bar_count;
                        self.bar_height(bins[idx], half_height)
                    })
                    .collect();
                Some(out)
            }
        }
    }

    /// Two offset sine waves plus a slower pulse envelope for a beat-like
    /// motion, reproducible from `t` alone.
    fn synthetic_bars(&self, t: f64, half_height: f32) -> Vec<f32> {
        let pulse = (t * std::f64::consts::PI).sin() * 0.25 + 0.75;
        (0..SYNTHETIC_BARS)
            .map(|i| {
                let i = i as f64;
                let s1 = (t * K1 + i * P1).sin() * 0.5 + 0.5;
                let s2 = (t * K2 + i * P2).sin() * 0.5 + 0.5;
                let sample = (0.6 * s1 + 0.4 * s2) * pulse;
                self.bar_height(sample as f32, half_height)
            })
            .collect()
    }

    fn bar_height(&self, sample: f32, half_height: f32) -> f32 {
        (sample * half_height * self.config.scale).max(self.config.min_bar_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn source_priority() {
        use BarSource::*;
        use TransportState::*;
        assert_eq!(VisualizerEngine::select_source(true, true, Playing), Analysis);
        // Clip playing but no tap yet: falls through to the remote state.
        assert_eq!(VisualizerEngine::select_source(true, false, Playing), Synthetic);
        assert_eq!(VisualizerEngine::select_source(false, false, Playing), Synthetic);
        assert_eq!(VisualizerEngine::select_source(false, false, Paused), Idle);
        assert_eq!(VisualizerEngine::select_source(false, false, Cued), Idle);
        assert_eq!(VisualizerEngine::select_source(false, false, Ended), Off);
        assert_eq!(VisualizerEngine::select_source(false, false, Unstarted), Off);
        assert_eq!(VisualizerEngine::select_source(false, false, Buffering), Off);
    }

    #[test]
    fn idle_bars_sit_at_the_minimum() {
        let mut engine = VisualizerEngine::new(VizConfig::default());
        engine.start();
        let bars = engine.frame(ms(0), 0.0, BarSource::Idle, None, 120.0).unwrap();
        assert_eq!(bars.len(), 64);
        assert!(bars.iter().all(|&h| h == 2.0));
    }

    #[test]
    fn synthetic_bars_are_bounded_and_floored() {
        let mut engine = VisualizerEngine::new(VizConfig::default());
        engine.start();
        for step in 0..200 {
            let t = f64::from(step) * 0.033;
            let bars = engine
                .frame(ms(0), t, BarSource::Synthetic, None, 100.0)
                .unwrap();
            assert_eq!(bars.len(), SYNTHETIC_BARS);
            for &h in &bars {
                assert!(h >= 2.0);
                assert!(h <= 100.0);
            }
        }
    }

    #[test]
    fn synthetic_is_reproducible_from_t() {
        let mut a = VisualizerEngine::new(VizConfig::default());
        let mut b = VisualizerEngine::new(VizConfig::default());
        a.start();
        b.start();
        let fa = a.frame(ms(0), 1.25, BarSource::Synthetic, None, 90.0);
        let fb = b.frame(ms(500), 1.25, BarSource::Synthetic, None, 90.0);
        assert_eq!(fa, fb);
    }

    #[test]
    fn analysis_bins_map_to_bar_heights() {
        let mut engine = VisualizerEngine::new(VizConfig {
            bar_count: 4,
            min_bar_height: 1.0,
            ..VizConfig::default()
        });
        engine.start();
        let bins = [0.0, 0.5, 1.0, 0.25];
        let bars = engine
            .frame(ms(0), 0.0, BarSource::Analysis, Some(&bins), 100.0)
            .unwrap();
        assert_eq!(bars, vec![1.0, 50.0, 100.0, 25.0]);
    }

    #[test]
    fn stop_keeps_last_frame_until_clear_delay() {
        let mut engine = VisualizerEngine::new(VizConfig::default());
        engine.start();
        let live = engine.frame(ms(0), 2.0, BarSource::Synthetic, None, 80.0);
        assert!(live.is_some());
        engine.stop(ms(1000));
        // Inside the delay the stale frame is still shown.
        assert_eq!(engine.frame(ms(1050), 9.0, BarSource::Off, None, 80.0), live);
        // Past the delay the surface clears and stays clear.
        assert!(engine.frame(ms(1100), 9.0, BarSource::Off, None, 80.0).is_none());
        assert!(engine.frame(ms(1200), 9.0, BarSource::Off, None, 80.0).is_none());
    }

    #[test]
    fn off_renders_nothing_while_running() {
        let mut engine = VisualizerEngine::new(VizConfig::default());
        engine.start();
        assert!(engine.frame(ms(0), 0.0, BarSource::Off, None, 80.0).is_none());
    }
}

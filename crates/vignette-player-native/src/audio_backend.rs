//! Rodio-backed clip playback with a shared sample tap.
//!
//! Clips are decoded eagerly into memory on upload so playback always starts
//! from the top with no disk latency. While a clip plays, its samples flow
//! through [`TapSource`] into a shared window the spectrum reader averages
//! into bar magnitudes.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStreamHandle, Sink, Source};
use vignette_core::clip::{ClipBackend, ClipId, ClipLoadError};

/// Most recent samples kept for analysis.
const TAP_WINDOW: usize = 2048;

struct DecodedClip {
    channels: u16,
    sample_rate: u32,
    samples: Arc<Vec<f32>>,
}

pub struct RodioClipBackend {
    handle: Option<OutputStreamHandle>,
    clips: HashMap<ClipId, DecodedClip>,
    sinks: HashMap<ClipId, Sink>,
    tap: Arc<Mutex<Vec<f32>>>,
}

impl RodioClipBackend {
    pub fn new(handle: Option<OutputStreamHandle>) -> Self {
        Self {
            handle,
            clips: HashMap::new(),
            sinks: HashMap::new(),
            tap: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn clear_tap(&self) {
        if let Ok(mut tap) = self.tap.lock() {
            tap.clear();
        }
    }
}

impl ClipBackend for RodioClipBackend {
    fn load(&mut self, id: ClipId, path: &Path) -> Result<(), ClipLoadError> {
        let err = |reason: String| ClipLoadError {
            path: path.display().to_string(),
            reason,
        };
        let file = File::open(path).map_err(|e| err(e.to_string()))?;
        let decoder = Decoder::new(BufReader::new(file)).map_err(|e| err(e.to_string()))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<f32> = decoder.convert_samples().collect();
        if samples.is_empty() {
            return Err(err("no audio samples".into()));
        }
        self.clips.insert(
            id,
            DecodedClip {
                channels,
                sample_rate,
                samples: Arc::new(samples),
            },
        );
        Ok(())
    }

    fn start(&mut self, id: ClipId) {
        let Some(clip) = self.clips.get(&id) else { return };
        let Some(handle) = &self.handle else { return };
        let Ok(sink) = Sink::try_new(handle) else { return };
        self.clear_tap();
        let buffer = SamplesBuffer::new(
            clip.channels,
            clip.sample_rate,
            clip.samples.as_ref().clone(),
        );
        sink.append(TapSource::new(buffer, Arc::clone(&self.tap)));
        self.sinks.insert(id, sink);
    }

    fn stop(&mut self, id: ClipId) {
        if let Some(sink) = self.sinks.remove(&id) {
            sink.stop();
        }
        self.clear_tap();
    }

    fn release(&mut self, id: ClipId) {
        self.stop(id);
        self.clips.remove(&id);
    }

    fn finished(&self, id: ClipId) -> bool {
        // A clip we never managed to start a sink for counts as finished, so
        // the registry does not report it as playing forever.
        self.sinks.get(&id).map_or(true, Sink::empty)
    }

    fn spectrum(&self, bars: usize) -> Option<Vec<f32>> {
        if bars == 0 {
            return None;
        }
        let tap = self.tap.lock().ok()?;
        if tap.len() < bars {
            return None;
        }
        let chunk = tap.len() / bars;
        let out = tap
            .chunks(chunk)
            .take(bars)
            .map(|c| {
                let sum: f32 = c.iter().map(|s| s.abs()).sum();
                (sum / c.len() as f32).clamp(0.0, 1.0)
            })
            .collect();
        Some(out)
    }
}

/// Wraps a source and mirrors every sample into the shared tap window.
struct TapSource<S> {
    inner: S,
    tap: Arc<Mutex<Vec<f32>>>,
}

impl<S> TapSource<S> {
    fn new(inner: S, tap: Arc<Mutex<Vec<f32>>>) -> Self {
        Self { inner, tap }
    }
}

impl<S> Iterator for TapSource<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let sample = self.inner.next()?;
        if let Ok(mut tap) = self.tap.lock() {
            if tap.len() >= TAP_WINDOW {
                let excess = tap.len() + 1 - TAP_WINDOW;
                tap.drain(..excess);
            }
            tap.push(sample);
        }
        Some(sample)
    }
}

impl<S> Source for TapSource<S>
where
    S: Source<Item = f32>,
{
    fn current_frame_len(&self) -> Option<usize> {
        self.inner.current_frame_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_keeps_a_bounded_window() {
        let tap = Arc::new(Mutex::new(Vec::new()));
        let samples: Vec<f32> = (0..TAP_WINDOW * 2).map(|i| i as f32).collect();
        let buffer = SamplesBuffer::new(1, 44_100, samples);
        let mut source = TapSource::new(buffer, Arc::clone(&tap));
        while source.next().is_some() {}
        let tap = tap.lock().unwrap();
        assert_eq!(tap.len(), TAP_WINDOW);
        // Only the most recent samples survive.
        assert_eq!(tap[0], TAP_WINDOW as f32);
    }

    #[test]
    fn spectrum_averages_absolute_magnitudes() {
        let backend = RodioClipBackend::new(None);
        {
            let mut tap = backend.tap.lock().unwrap();
            tap.extend([0.5f32; 1024]);
            tap.extend([-1.0f32; 1024]);
        }
        let bars = backend.spectrum(2).unwrap();
        assert_eq!(bars, vec![0.5, 1.0]);
    }

    #[test]
    fn spectrum_is_none_while_the_tap_is_empty() {
        let backend = RodioClipBackend::new(None);
        assert!(backend.spectrum(64).is_none());
    }
}

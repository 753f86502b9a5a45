//! Player - Control Surface
//!
//! The Player lives on the UI/main thread. It builds a [`Pipeline`] per track
//! and hands it to the output device, then steers it:
//!
//! ```text
//! UI thread                         Audio thread
//! ─────────                         ────────────
//! set_volume / set_eq_band ──atomics──▶ GainStage / BiquadStage
//! play / pause / seek / stop ─slot lock─▶ Pipeline
//! sample_snapshot ◀──lock-free──── VisualizationTap
//! events() ◀──crossbeam──────────── PlaybackGate (TrackFinished)
//! ```
//!
//! Lock order is always player state, then the device slot. The audio thread
//! only ever takes the slot.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use reel_dsp::{EqGains, SharedGain, TapBuffer, NUM_EQ_BANDS, VOLUME_MAX_DB, VOLUME_MIN_DB};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PlayerConfig;
use crate::decoder::{FrameSource, SymphoniaSource};
use crate::device::OutputDevice;
use crate::error::{EngineError, EngineResult};
use crate::message::Event;
use crate::pipeline::{PlaybackGate, Pipeline};
use crate::stream::CpalOutput;

/// Transport state of the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

/// Metadata for the loaded track
struct LoadedTrack {
    sample_rate: u32,
    total_frames: u64,
    tap: Arc<TapBuffer>,
}

impl LoadedTrack {
    fn frames_to_secs(&self, frames: u64) -> f64 {
        frames as f64 / self.sample_rate as f64
    }
}

struct PlayerState {
    track: Option<LoadedTrack>,
    playback: PlaybackState,
}

/// Playback controller
///
/// Volume and EQ settings belong to the player and carry over from track
/// to track.
pub struct Player {
    device: Box<dyn OutputDevice>,
    config: PlayerConfig,
    state: Mutex<PlayerState>,
    volume: SharedGain,
    eq: EqGains,
    /// Set by the gate when the stream runs out
    finished: Arc<AtomicBool>,
    event_sender: Sender<Event>,
    event_receiver: Receiver<Event>,
}

impl Player {
    /// Create a player on an already-open device
    pub fn new(config: PlayerConfig, device: Box<dyn OutputDevice>) -> EngineResult<Self> {
        config.validate().map_err(EngineError::ConfigError)?;
        let (event_sender, event_receiver) = bounded(config.event_capacity);
        Ok(Self::from_parts(config, device, event_sender, event_receiver))
    }

    /// Open a CPAL output (named, or the system default) and create a player on it
    pub fn open(config: PlayerConfig, device_name: Option<&str>) -> EngineResult<Self> {
        config.validate().map_err(EngineError::ConfigError)?;
        let (event_sender, event_receiver) = bounded(config.event_capacity);
        let device = CpalOutput::open(&config.output, device_name, event_sender.clone())?;
        Ok(Self::from_parts(
            config,
            Box::new(device),
            event_sender,
            event_receiver,
        ))
    }

    fn from_parts(
        config: PlayerConfig,
        device: Box<dyn OutputDevice>,
        event_sender: Sender<Event>,
        event_receiver: Receiver<Event>,
    ) -> Self {
        let volume = SharedGain::new(
            config
                .initial_volume_db
                .clamp(VOLUME_MIN_DB, VOLUME_MAX_DB),
        );

        info!(
            "Player ready on {} at {}Hz",
            device.name(),
            device.sample_rate()
        );

        Self {
            device,
            config,
            state: Mutex::new(PlayerState {
                track: None,
                playback: PlaybackState::Stopped,
            }),
            volume,
            eq: EqGains::new(),
            finished: Arc::new(AtomicBool::new(false)),
            event_sender,
            event_receiver,
        }
    }

    fn emit(&self, event: Event) {
        // Never block on a slow UI
        let _ = self.event_sender.try_send(event);
    }

    /// Open and decode `path`, replacing the current track.
    ///
    /// On error the current track (if any) keeps playing untouched.
    pub fn load(&self, path: impl AsRef<Path>) -> EngineResult<()> {
        let path = path.as_ref();
        let source = SymphoniaSource::open(path)?;
        info!("Loaded {}", path.display());
        self.load_source(Box::new(source))
    }

    /// Replace the current track with an already-open source.
    ///
    /// The new track starts stopped; call [`Player::play`] to hear it.
    pub fn load_source(&self, source: Box<dyn FrameSource>) -> EngineResult<()> {
        let sample_rate = source.sample_rate();
        let channels = source.channels();
        let total_frames = source.len();

        // Build everything before touching shared state
        let tap = Arc::new(TapBuffer::new(self.config.tap_capacity));
        let gate = PlaybackGate::new(Arc::clone(&self.finished), self.event_sender.clone());
        let pipeline = Pipeline::new(
            source,
            self.device.sample_rate(),
            &self.config.resampler,
            &self.eq,
            self.volume.clone(),
            Arc::clone(&tap),
            gate,
        )?;

        let track = LoadedTrack {
            sample_rate,
            total_frames,
            tap,
        };
        let duration_secs = track.frames_to_secs(total_frames);

        let retired = {
            let mut state = self.state.lock();
            let mut slot = self.device.slot().lock();
            // Once swapped out no pull can reach the old track, so a late
            // end-of-stream from it cannot leak past the flag reset
            let retired = slot.replace(pipeline);
            self.finished.store(false, Ordering::Release);
            state.track = Some(track);
            state.playback = PlaybackState::Stopped;
            retired
        };
        // Old decoder and file handle are released outside the device lock
        drop(retired);

        debug!(
            "Track installed: {}Hz, {} channel(s), {:.1}s",
            sample_rate, channels, duration_secs
        );
        self.emit(Event::TrackLoaded {
            sample_rate,
            channels,
            duration_secs,
        });
        Ok(())
    }

    /// Start (or resume) the loaded track. No-op when nothing is loaded.
    pub fn play(&self) {
        let mut state = self.state.lock();
        if state.track.is_none() || state.playback == PlaybackState::Playing {
            return;
        }
        if let Some(pipeline) = self.device.slot().lock().as_mut() {
            pipeline.set_paused(false);
        }
        state.playback = PlaybackState::Playing;
        drop(state);
        self.emit(Event::Playing);
    }

    /// Load `path` and start playing it
    pub fn play_file(&self, path: impl AsRef<Path>) -> EngineResult<()> {
        self.load(path)?;
        self.play();
        Ok(())
    }

    /// Flip between playing and paused. Does nothing while stopped.
    pub fn toggle_pause(&self) {
        let mut state = self.state.lock();
        let (next, event) = match state.playback {
            PlaybackState::Playing => (PlaybackState::Paused, Event::Paused),
            PlaybackState::Paused => (PlaybackState::Playing, Event::Playing),
            PlaybackState::Stopped => return,
        };
        if let Some(pipeline) = self.device.slot().lock().as_mut() {
            pipeline.set_paused(next == PlaybackState::Paused);
        }
        state.playback = next;
        drop(state);
        self.emit(event);
    }

    /// Release the track, its decoder and the device claim. Safe to call
    /// repeatedly.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        // Waits for an in-flight pull, then detaches the pipeline
        let retired = self.device.slot().take();
        self.finished.store(false, Ordering::Release);

        let was_active = state.track.take().is_some() || state.playback != PlaybackState::Stopped;
        state.playback = PlaybackState::Stopped;
        drop(state);

        let released = retired.is_some();
        drop(retired);

        if released || was_active {
            debug!("Playback stopped");
            self.emit(Event::Stopped);
        }
    }

    /// Move the playback position by `delta_secs` (negative rewinds).
    ///
    /// The target is clamped to the first and last frame of the track.
    pub fn seek(&self, delta_secs: f64) -> EngineResult<()> {
        if delta_secs.is_nan() {
            return Ok(());
        }

        let state = self.state.lock();
        let Some(track) = state.track.as_ref() else {
            return Ok(());
        };
        let mut slot = self.device.slot().lock();
        let Some(pipeline) = slot.as_mut() else {
            return Ok(());
        };

        let rate = track.sample_rate as f64;
        let current_secs = track.frames_to_secs(pipeline.position());
        let wanted = ((current_secs + delta_secs) * rate).floor();
        let last = track.total_frames.saturating_sub(1);
        let target = if wanted <= 0.0 {
            0
        } else {
            (wanted as u64).min(last)
        };

        pipeline.seek(target)?;
        // The track can finish again from the new position
        self.finished.store(false, Ordering::Release);

        let position_secs = track.frames_to_secs(target);
        drop(slot);
        drop(state);

        debug!("Seeked to {:.2}s", position_secs);
        self.emit(Event::SeekCompleted { position_secs });
        Ok(())
    }

    /// Current position in the track (zero when nothing is loaded)
    pub fn position(&self) -> Duration {
        let state = self.state.lock();
        let Some(track) = state.track.as_ref() else {
            return Duration::ZERO;
        };
        let frames = self
            .device
            .slot()
            .lock()
            .as_ref()
            .map(Pipeline::position)
            .unwrap_or(0);
        Duration::from_secs_f64(track.frames_to_secs(frames))
    }

    /// Length of the loaded track (zero when nothing is loaded)
    pub fn duration(&self) -> Duration {
        let state = self.state.lock();
        state
            .track
            .as_ref()
            .map(|t| Duration::from_secs_f64(t.frames_to_secs(t.total_frames)))
            .unwrap_or(Duration::ZERO)
    }

    /// Set master volume in dB, clamped to [-30, +6]. NaN is ignored.
    pub fn set_volume(&self, db: f32) {
        if self.volume.set_clamped(db, VOLUME_MIN_DB, VOLUME_MAX_DB) {
            debug!("Volume: {:.1} dB", self.volume.get());
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume.get()
    }

    /// Set one EQ band in dB, clamped to [-12, +12]. An index outside 0..10
    /// or a NaN gain is ignored.
    pub fn set_eq_band(&self, index: usize, db: f32) {
        if self.eq.set(index, db) {
            debug!("EQ band {}: {:.1} dB", index, self.eq.get(index).unwrap_or(0.0));
        }
    }

    pub fn eq_bands(&self) -> [f32; NUM_EQ_BANDS] {
        self.eq.gains()
    }

    /// Apply a built-in EQ preset by name
    pub fn apply_preset(&self, name: &str) -> EngineResult<()> {
        let gains = reel_dsp::preset(name)?;
        self.eq.set_all(gains);
        info!("EQ preset: {}", name);
        Ok(())
    }

    /// True while a track is loaded and playing, including when paused
    pub fn is_playing(&self) -> bool {
        self.state.lock().playback != PlaybackState::Stopped
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().playback == PlaybackState::Paused
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.state.lock().playback
    }

    /// Whether the current track's stream has run out
    pub fn track_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// The most recent `n` post-gain mono samples, oldest first
    ///
    /// Empty when nothing is loaded.
    pub fn sample_snapshot(&self, n: usize) -> Vec<f32> {
        let tap = self
            .state
            .lock()
            .track
            .as_ref()
            .map(|t| Arc::clone(&t.tap));
        match tap {
            Some(tap) => tap.snapshot(n),
            None => Vec::new(),
        }
    }

    /// Receiver for player events
    pub fn events(&self) -> Receiver<Event> {
        self.event_receiver.clone()
    }

    /// Sample rate frames are delivered to the device at
    pub fn output_sample_rate(&self) -> u32 {
        self.device.sample_rate()
    }

    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Stop playback and release the track
    pub fn close(&self) {
        self.stop();
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::tests::{ramp, write_wav};
    use crate::decoder::BufferedSource;
    use crate::device::tests::DropWatch;
    use crate::device::{NullOutput, OutputSlot};
    use reel_dsp::{DspError, SampleFrame};

    const RATE: u32 = 44100;

    fn player_with_slot(device_rate: u32) -> (Player, OutputSlot) {
        let device = NullOutput::new(device_rate);
        let slot = device.slot().clone();
        let player = Player::new(PlayerConfig::default(), Box::new(device)).unwrap();
        (player, slot)
    }

    fn tone(seconds: f64, rate: u32) -> Box<dyn FrameSource> {
        let frames = (seconds * rate as f64) as usize;
        let data = (0..frames)
            .map(|i| {
                let t = i as f32 / rate as f32;
                let s = (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5;
                SampleFrame::new(s, s * 0.5)
            })
            .collect();
        Box::new(BufferedSource::new(data, rate))
    }

    fn render(slot: &OutputSlot, frames: usize) -> usize {
        let mut buf = vec![SampleFrame::SILENCE; 1024];
        let mut total = 0;
        while total < frames {
            let want = (frames - total).min(buf.len());
            let n = slot.render(&mut buf[..want]);
            total += n;
            if n < want {
                break;
            }
        }
        total
    }

    fn secs(d: Duration) -> f64 {
        d.as_secs_f64()
    }

    #[test]
    fn test_nothing_loaded() {
        let (player, slot) = player_with_slot(RATE);
        assert!(!player.is_playing());
        assert!(!player.is_paused());
        assert_eq!(player.position(), Duration::ZERO);
        assert_eq!(player.duration(), Duration::ZERO);
        assert!(player.sample_snapshot(2048).is_empty());
        assert!(player.seek(5.0).is_ok());

        player.play();
        assert!(!player.is_playing());
        assert_eq!(render(&slot, 100), 0);
    }

    #[test]
    fn test_loaded_track_starts_stopped() {
        let (player, slot) = player_with_slot(RATE);
        player.load_source(tone(1.0, RATE)).unwrap();

        assert_eq!(player.playback_state(), PlaybackState::Stopped);
        assert_eq!(render(&slot, 512), 0);
        assert!((secs(player.duration()) - 1.0).abs() < 1e-9);

        player.play();
        assert!(player.is_playing());
        assert_eq!(render(&slot, 512), 512);
    }

    #[test]
    fn test_seek_forward_clamps_to_end() {
        let (player, _slot) = player_with_slot(RATE);
        player.load_source(tone(10.0, RATE)).unwrap();
        player.play();

        player.seek(15.0).unwrap();
        let pos = secs(player.position());
        assert!((pos - 10.0).abs() < 0.001, "position {pos}");
    }

    #[test]
    fn test_seek_backward_clamps_to_start() {
        let (player, slot) = player_with_slot(RATE);
        player.load_source(tone(10.0, RATE)).unwrap();
        player.play();
        render(&slot, RATE as usize);

        player.seek(-5.0).unwrap();
        assert_eq!(player.position(), Duration::ZERO);
    }

    #[test]
    fn test_seek_is_relative() {
        let (player, slot) = player_with_slot(RATE);
        player.load_source(tone(10.0, RATE)).unwrap();
        player.play();

        render(&slot, RATE as usize);
        player.seek(2.0).unwrap();
        assert!((secs(player.position()) - 3.0).abs() < 0.001);

        player.seek(-0.5).unwrap();
        assert!((secs(player.position()) - 2.5).abs() < 0.001);

        let events: Vec<Event> = player.events().try_iter().collect();
        assert!(events.contains(&Event::SeekCompleted { position_secs: 3.0 }));
    }

    #[test]
    fn test_failed_load_keeps_current_track() {
        let (player, slot) = player_with_slot(RATE);
        player.load_source(tone(2.0, RATE)).unwrap();
        player.play();
        render(&slot, 1000);

        let err = player.load("/nonexistent/track.mp3").unwrap_err();
        assert!(matches!(err, EngineError::Decode(_)));

        assert!(player.is_playing());
        assert!((secs(player.duration()) - 2.0).abs() < 1e-9);
        assert_eq!(render(&slot, 1000), 1000);
    }

    #[test]
    fn test_volume_round_trip() {
        let (player, _slot) = player_with_slot(RATE);
        assert_eq!(player.volume(), 0.0);

        for (input, expected) in [(-3.5, -3.5), (100.0, 6.0), (-100.0, -30.0), (6.0, 6.0)] {
            player.set_volume(input);
            assert_eq!(player.volume(), expected);
        }

        player.set_volume(f32::NAN);
        assert_eq!(player.volume(), 6.0);
    }

    #[test]
    fn test_initial_volume_from_config() {
        let config = PlayerConfig {
            initial_volume_db: -50.0,
            ..Default::default()
        };
        let player = Player::new(config, Box::new(NullOutput::new(RATE))).unwrap();
        assert_eq!(player.volume(), VOLUME_MIN_DB);
    }

    #[test]
    fn test_eq_round_trip() {
        let (player, _slot) = player_with_slot(RATE);

        player.set_eq_band(0, 20.0);
        player.set_eq_band(4, -3.0);
        player.set_eq_band(9, -20.0);
        let before = player.eq_bands();
        assert_eq!(before[0], 12.0);
        assert_eq!(before[4], -3.0);
        assert_eq!(before[9], -12.0);

        player.set_eq_band(10, 5.0);
        player.set_eq_band(2, f32::NAN);
        assert_eq!(player.eq_bands(), before);
    }

    #[test]
    fn test_presets() {
        let (player, _slot) = player_with_slot(RATE);
        player.apply_preset("Bass Boost").unwrap();
        assert_eq!(player.eq_bands()[0], 6.0);

        let err = player.apply_preset("Nope").unwrap_err();
        assert!(matches!(
            err,
            EngineError::DspError(DspError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_settings_survive_track_change() {
        let (player, _slot) = player_with_slot(RATE);
        player.set_volume(-10.0);
        player.set_eq_band(3, 4.0);

        player.load_source(tone(1.0, RATE)).unwrap();
        player.load_source(tone(1.0, RATE)).unwrap();

        assert_eq!(player.volume(), -10.0);
        assert_eq!(player.eq_bands()[3], 4.0);
    }

    #[test]
    fn test_pause_yields_no_frames() {
        let (player, slot) = player_with_slot(RATE);
        player.load_source(tone(1.0, RATE)).unwrap();
        player.play();
        assert_eq!(render(&slot, 256), 256);

        player.toggle_pause();
        assert!(player.is_paused());
        assert!(player.is_playing());
        let pos = player.position();
        assert_eq!(render(&slot, 256), 0);
        assert_eq!(player.position(), pos);

        player.toggle_pause();
        assert!(!player.is_paused());
        assert_eq!(render(&slot, 256), 256);
    }

    #[test]
    fn test_toggle_pause_while_stopped() {
        let (player, _slot) = player_with_slot(RATE);
        player.toggle_pause();
        assert_eq!(player.playback_state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (player, slot) = player_with_slot(RATE);
        player.load_source(tone(1.0, RATE)).unwrap();
        player.play();
        render(&slot, 100);

        player.stop();
        player.stop();

        assert!(!player.is_playing());
        assert!(!slot.is_claimed());
        assert_eq!(player.position(), Duration::ZERO);
        assert_eq!(player.duration(), Duration::ZERO);
        assert!(player.sample_snapshot(10).is_empty());

        let stops = player
            .events()
            .try_iter()
            .filter(|e| *e == Event::Stopped)
            .count();
        assert_eq!(stops, 1);
    }

    #[test]
    fn test_old_track_released_outside_device_lock() {
        let (player, slot) = player_with_slot(44100);

        let first = DropWatch::new(&slot, 4410);
        let (dropped, under_lock) = (first.dropped.clone(), first.dropped_under_lock.clone());
        player.load_source(Box::new(first)).unwrap();
        player.play();
        render(&slot, 1000);

        let second = DropWatch::new(&slot, 4410);
        let (dropped2, under_lock2) = (second.dropped.clone(), second.dropped_under_lock.clone());
        player.load_source(Box::new(second)).unwrap();
        // Released before load returns, but not while the device was locked
        assert!(dropped.load(Ordering::SeqCst));
        assert!(!under_lock.load(Ordering::SeqCst));

        player.stop();
        assert!(dropped2.load(Ordering::SeqCst));
        assert!(!under_lock2.load(Ordering::SeqCst));
    }

    #[test]
    fn test_seek_resampled_track_back_to_start() {
        let (player, slot) = player_with_slot(44100);
        player.load_source(tone(0.5, 22050)).unwrap();
        player.play();

        assert_eq!(render(&slot, 10 * 44100), 22050);
        assert!(player.track_finished());

        player.seek(-10.0).unwrap();
        assert!(!player.track_finished());
        assert_eq!(player.position(), Duration::ZERO);
        assert_eq!(render(&slot, 10 * 44100), 22050);
        assert!(player.track_finished());
    }

    #[test]
    fn test_track_finished_flag_and_event() {
        let (player, slot) = player_with_slot(RATE);
        player.load_source(tone(0.1, RATE)).unwrap();
        player.play();
        assert!(!player.track_finished());

        let rendered = render(&slot, RATE as usize);
        assert_eq!(rendered, 4410);
        assert!(player.track_finished());

        let finished = player
            .events()
            .try_iter()
            .filter(|e| *e == Event::TrackFinished)
            .count();
        assert_eq!(finished, 1);

        // Loading the next track clears the flag
        player.load_source(tone(0.1, RATE)).unwrap();
        assert!(!player.track_finished());
    }

    #[test]
    fn test_stop_clears_finished_flag() {
        let (player, slot) = player_with_slot(RATE);
        player.load_source(tone(0.05, RATE)).unwrap();
        player.play();
        render(&slot, RATE as usize);
        assert!(player.track_finished());

        player.stop();
        assert!(!player.track_finished());
    }

    #[test]
    fn test_snapshot_matches_output_downmix() {
        let (player, slot) = player_with_slot(RATE);
        player.load_source(tone(1.0, RATE)).unwrap();
        player.play();

        let mut out = vec![SampleFrame::SILENCE; 4096];
        assert_eq!(slot.render(&mut out), 4096);

        let expected: Vec<f32> = out[4096 - 2048..].iter().map(|f| f.downmix()).collect();
        assert_eq!(player.sample_snapshot(2048), expected);
    }

    #[test]
    fn test_volume_applies_to_output() {
        let (player, slot) = player_with_slot(RATE);
        let frames = vec![SampleFrame::mono(0.5); 1024];
        player
            .load_source(Box::new(BufferedSource::new(frames, RATE)))
            .unwrap();
        player.play();
        player.set_volume(-6.0);

        let mut out = vec![SampleFrame::SILENCE; 1024];
        slot.render(&mut out);
        let expected = 0.5 * reel_dsp::db_to_linear(-6.0);
        assert!((out[100].left - expected).abs() < 1e-6);
    }

    #[test]
    fn test_resampled_track() {
        let (player, slot) = player_with_slot(48000);
        player.load_source(tone(2.0, 22050)).unwrap();
        player.play();

        // Duration is reported in source time
        assert!((secs(player.duration()) - 2.0).abs() < 1e-6);

        let rendered = render(&slot, 48000);
        assert_eq!(rendered, 48000);
        // The resampler reads ahead by at most one chunk
        let pos = secs(player.position());
        assert!((1.0..1.1).contains(&pos), "position {pos}");

        // Drain and make sure the whole track comes out at the device rate
        let rest = render(&slot, 10 * 48000);
        assert_eq!(rendered + rest, 96000);
        assert!(player.track_finished());
    }

    #[test]
    fn test_play_file_wav() {
        let path = write_wav("player", 22050, 2, &ramp(22050));
        let (player, slot) = player_with_slot(22050);

        player.play_file(&path).unwrap();
        assert!(player.is_playing());
        assert!((secs(player.duration()) - 1.0).abs() < 1e-6);
        assert_eq!(render(&slot, 2205), 2205);
        assert!((secs(player.position()) - 0.1).abs() < 1e-6);

        let events: Vec<Event> = player.events().try_iter().collect();
        assert_eq!(
            events,
            vec![
                Event::TrackLoaded {
                    sample_rate: 22050,
                    channels: 2,
                    duration_secs: 1.0,
                },
                Event::Playing,
            ]
        );

        player.close();
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PlayerConfig {
            event_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            Player::new(config, Box::new(NullOutput::new(RATE))),
            Err(EngineError::ConfigError(_))
        ));
    }

    #[test]
    fn test_concurrent_control_while_rendering() {
        let (player, slot) = player_with_slot(RATE);
        player.load_source(tone(5.0, RATE)).unwrap();
        player.play();

        let audio = std::thread::spawn(move || {
            let mut buf = vec![SampleFrame::SILENCE; 512];
            for _ in 0..200 {
                slot.render(&mut buf);
                assert!(buf.iter().all(|f| f.left.is_finite() && f.right.is_finite()));
            }
        });

        for i in 0..200 {
            player.set_volume(-((i % 30) as f32));
            player.set_eq_band(i % NUM_EQ_BANDS, ((i % 25) as f32) - 12.0);
            if i % 50 == 0 {
                player.toggle_pause();
            }
        }
        audio.join().unwrap();
    }
}

//! Playback speed by linear resampling
//!
//! Frames are read at `speed` times the normal rate and linearly
//! interpolated. Pitch follows speed. The read position is carried across
//! buffers so consecutive packets join without clicks.

use crate::error::{EngineError, EngineResult};
use audii_core::PlaybackSpeed;

pub struct SpeedProcessor {
    channels: usize,
    speed: f32,
    /// Read position relative to the start of the next input buffer
    phase: f64,
    last_frame: Vec<f32>,
}

impl SpeedProcessor {
    pub fn new(channels: u16) -> Self {
        Self {
            channels: usize::from(channels.max(1)),
            speed: 1.0,
            phase: 0.0,
            last_frame: Vec::new(),
        }
    }

    pub fn set_speed(&mut self, speed: f32) -> EngineResult<()> {
        if !PlaybackSpeed::is_supported(speed) {
            return Err(EngineError::InvalidSpeed(speed));
        }
        self.speed = speed;
        Ok(())
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn is_normal(&self) -> bool {
        (self.speed - 1.0).abs() < f32::EPSILON
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Forgets the carried position, for use after a seek
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.last_frame.clear();
    }

    /// Processes interleaved samples and returns the speed-adjusted output
    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        let channels = self.channels;
        let frames = input.len() / channels;
        if frames == 0 {
            return Vec::new();
        }

        if self.is_normal() {
            self.phase = 0.0;
            self.remember_last(input, frames);
            return input[..frames * channels].to_vec();
        }

        if self.last_frame.is_empty() && self.phase < 0.0 {
            self.phase = 0.0;
        }

        let step = f64::from(self.speed);
        let limit = (frames - 1) as f64;
        let mut output = Vec::with_capacity((frames as f64 / step) as usize * channels + channels);

        while self.phase < limit {
            let floor = self.phase.floor();
            let frac = (self.phase - floor) as f32;
            let index = floor as isize;

            for ch in 0..channels {
                let a = if index < 0 {
                    self.last_frame.get(ch).copied().unwrap_or(0.0)
                } else {
                    input[index as usize * channels + ch]
                };
                let b = input[(index + 1) as usize * channels + ch];
                output.push(a + (b - a) * frac);
            }

            self.phase += step;
        }

        self.phase -= frames as f64;
        self.remember_last(input, frames);
        output
    }

    fn remember_last(&mut self, input: &[f32], frames: usize) {
        let start = (frames - 1) * self.channels;
        self.last_frame.clear();
        self.last_frame
            .extend_from_slice(&input[start..start + self.channels]);
    }
}

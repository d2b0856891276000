//! FFT spectrum backend over a media element's PCM tap.
//!
//! Reproduces the transfer function of a browser analyser node: Blackman
//! window, magnitude normalised by the transform size, exponential smoothing
//! over time, then a linear map of the dB range onto bytes.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::analyzer::{AudioBackend, AudioGraph, GraphState, BIN_COUNT, FFT_SIZE};
use crate::error::AnalyzerError;
use crate::media::{MediaElement, PcmFeed};

const SMOOTHING: f32 = 0.8;
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

/// Builds [`SpectrumGraph`]s for media elements that expose a [`PcmFeed`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SpectrumBackend;

impl AudioBackend for SpectrumBackend {
    fn connect(&self, media: &dyn MediaElement) -> Result<Box<dyn AudioGraph>, AnalyzerError> {
        let feed = media.pcm_feed().ok_or(AnalyzerError::NoAudioTap)?;
        Ok(Box::new(SpectrumGraph::new(feed)))
    }
}

pub struct SpectrumGraph {
    feed: PcmFeed,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    samples: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    state: GraphState,
}

impl SpectrumGraph {
    pub fn new(feed: PcmFeed) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        Self {
            feed,
            fft,
            window: blackman(FFT_SIZE),
            samples: vec![0.0; FFT_SIZE],
            buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            smoothed: vec![0.0; BIN_COUNT],
            state: GraphState::Suspended,
        }
    }
}

impl AudioGraph for SpectrumGraph {
    fn state(&self) -> GraphState {
        self.state
    }

    fn resume(&mut self) {
        self.state = GraphState::Running;
    }

    fn frequency_data(&mut self, out: &mut [u8]) {
        if self.state == GraphState::Suspended {
            out.fill(0);
            return;
        }

        self.feed.latest(&mut self.samples);
        for ((dst, &s), &w) in self.buffer.iter_mut().zip(&self.samples).zip(&self.window) {
            *dst = Complex::new(s * w, 0.0);
        }
        self.fft.process(&mut self.buffer);

        let norm = 1.0 / FFT_SIZE as f32;
        for (prev, bin) in self.smoothed.iter_mut().zip(&self.buffer[..BIN_COUNT]) {
            let mag = bin.norm() * norm;
            *prev = SMOOTHING * *prev + (1.0 - SMOOTHING) * mag;
        }

        for (dst, &mag) in out.iter_mut().zip(&self.smoothed) {
            *dst = to_byte(mag);
        }
    }
}

fn blackman(n: usize) -> Vec<f32> {
    let a0 = 0.42;
    let a1 = 0.5;
    let a2 = 0.08;
    (0..n)
        .map(|i| {
            let x = std::f32::consts::TAU * i as f32 / n as f32;
            a0 - a1 * x.cos() + a2 * (2.0 * x).cos()
        })
        .collect()
}

/// Map a linear magnitude onto 0..=255 across `MIN_DB..=MAX_DB`.
fn to_byte(mag: f32) -> u8 {
    if mag <= 0.0 {
        return 0;
    }
    let db = 20.0 * mag.log10();
    let scaled = 255.0 * (db - MIN_DB) / (MAX_DB - MIN_DB);
    scaled.clamp(0.0, 255.0) as u8
}

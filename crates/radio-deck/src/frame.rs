//! In-memory visualizer surface. The last drawn frame is served over HTTP.

use radio_engine::visualizer::{BarRect, Surface};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    #[serde(flatten)]
    pub rect: BarRect,
    pub color: String,
}

/// What `GET /api/players/:id/frame` returns.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Number of clears so far; a client can skip frames it already has.
    pub seq: u64,
    pub bars: Vec<Bar>,
}

#[derive(Debug)]
pub struct FrameSurface {
    width: u32,
    height: u32,
    seq: u64,
    bars: Vec<Bar>,
}

impl FrameSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            seq: 0,
            bars: Vec::new(),
        }
    }

    pub fn frame(&self) -> Frame {
        Frame {
            width: self.width,
            height: self.height,
            seq: self.seq,
            bars: self.bars.clone(),
        }
    }
}

impl Surface for FrameSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.seq += 1;
        self.bars.clear();
    }

    fn fill_rect(&mut self, rect: BarRect, color: &str) {
        self.bars.push(Bar {
            rect,
            color: color.to_string(),
        });
    }
}

//! Frequency bars painted into a 2D surface on a fixed frame cadence.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::analyzer::{AudioAnalyzer, FrequencySnapshot};
use crate::media::MediaElement;

/// A 2D drawing target, in pixels, origin at the top-left.
pub trait Surface: Send {
    fn size(&self) -> (u32, u32);

    fn clear(&mut self);

    fn fill_rect(&mut self, rect: BarRect, color: &str);
}

pub type SharedSurface = Arc<Mutex<dyn Surface>>;
pub type SharedAnalyzer = Arc<Mutex<AudioAnalyzer>>;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct BarRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Bar geometry for one snapshot on a `width` x `height` surface.
///
/// Each bin gets an equal slot; the bar leaves one pixel of gap on its
/// right and grows up from the bottom edge. Slots narrower than a pixel
/// produce no bars.
pub fn layout(snapshot: &FrequencySnapshot, width: u32, height: u32) -> Vec<BarRect> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let slot = width as f32 / snapshot.len() as f32;
    let drawn = slot - 1.0;
    if drawn <= 0.0 {
        return Vec::new();
    }
    let h = height as f32;

    snapshot
        .bins()
        .iter()
        .enumerate()
        .map(|(i, &mag)| {
            let bar = mag as f32 / 255.0 * h;
            BarRect {
                x: i as f32 * slot,
                y: h - bar,
                width: drawn,
                height: bar,
            }
        })
        .collect()
}

/// Clear `surface` and, given a snapshot, paint its bars.
pub fn draw_frame(surface: &mut dyn Surface, snapshot: Option<&FrequencySnapshot>, color: &str) {
    surface.clear();
    let Some(snapshot) = snapshot else {
        return;
    };
    let (width, height) = surface.size();
    for rect in layout(snapshot, width, height) {
        surface.fill_rect(rect, color);
    }
}

/// Drives the frame loop for one player.
pub struct VisualizerRenderer {
    frame_interval: Duration,
    task: Option<AbortHandle>,
    surface: Option<SharedSurface>,
}

impl VisualizerRenderer {
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            frame_interval,
            task: None,
            surface: None,
        }
    }

    /// Start painting. A running loop is stopped first.
    ///
    /// The loop checks `media` every frame; once it reports paused the
    /// surface is cleared and the loop ends by itself.
    pub fn start(
        &mut self,
        analyzer: SharedAnalyzer,
        surface: SharedSurface,
        color: String,
        media: Arc<dyn MediaElement>,
    ) {
        self.stop();

        let frame_interval = self.frame_interval;
        let task_surface = surface.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(frame_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;

                if media.is_paused() {
                    if let Ok(mut s) = task_surface.lock() {
                        s.clear();
                    }
                    debug!("visualizer: media paused, loop ends");
                    break;
                }

                let snapshot = match analyzer.lock() {
                    Ok(mut a) => a.sample().cloned(),
                    Err(_) => break,
                };
                let Ok(mut s) = task_surface.lock() else {
                    break;
                };
                draw_frame(&mut *s, snapshot.as_ref(), &color);
            }
        });

        self.task = Some(handle.abort_handle());
        self.surface = Some(surface);
    }

    /// Cancel the loop and clear the surface. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(surface) = self.surface.take() {
            if let Ok(mut s) = surface.lock() {
                s.clear();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for VisualizerRenderer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

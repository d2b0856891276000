//! The playable media source a player drives.
//!
//! This is the engine's view of an `<audio>`-like element: a bound source
//! URL, a paused flag, volume and mute. Implementations use interior
//! mutability because the element is shared between the coordinator and the
//! visualizer task.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::PlaybackError;

pub trait MediaElement: Send + Sync {
    /// Stream URL currently bound, if any.
    fn source(&self) -> Option<String>;

    /// Bind (or with `None`, clear) the stream URL. Takes effect on `load`.
    fn set_source(&self, url: Option<&str>);

    /// Reload the element from its bound source. With no source bound this
    /// drops any buffered audio and network activity.
    fn load(&self);

    fn play(&self) -> Result<(), PlaybackError>;

    fn pause(&self);

    fn is_paused(&self) -> bool;

    /// 0.0–1.0.
    fn volume(&self) -> f32;

    fn set_volume(&self, volume: f32);

    fn is_muted(&self) -> bool;

    fn set_muted(&self, muted: bool);

    /// Decoded PCM of whatever is playing, for analysis. Elements without an
    /// audio tap return `None` and the player runs without visualization.
    fn pcm_feed(&self) -> Option<PcmFeed> {
        None
    }
}

/// Most recent mono samples (f32, -1..1) decoded from a media element.
///
/// Bounded: old samples are dropped once `capacity` is reached.
#[derive(Clone)]
pub struct PcmFeed {
    inner: Arc<Mutex<VecDeque<f32>>>,
    capacity: usize,
}

impl PcmFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, samples: &[f32]) {
        let Ok(mut buf) = self.inner.lock() else {
            return;
        };
        for &s in samples {
            if buf.len() == self.capacity {
                buf.pop_front();
            }
            buf.push_back(s);
        }
    }

    /// Copy the newest `out.len()` samples into `out`, oldest first.
    /// Missing history is zero-filled at the front.
    pub fn latest(&self, out: &mut [f32]) {
        out.fill(0.0);
        let Ok(buf) = self.inner.lock() else {
            return;
        };
        let n = out.len().min(buf.len());
        let start = out.len() - n;
        for (dst, src) in out[start..].iter_mut().zip(buf.iter().skip(buf.len() - n)) {
            *dst = *src;
        }
    }

    pub fn clear(&self) {
        if let Ok(mut buf) = self.inner.lock() {
            buf.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_keeps_newest_samples() {
        let feed = PcmFeed::new(4);
        feed.push(&[1.0, 2.0, 3.0]);
        feed.push(&[4.0, 5.0]);
        assert_eq!(feed.len(), 4);

        let mut out = [0.0; 3];
        feed.latest(&mut out);
        assert_eq!(out, [3.0, 4.0, 5.0]);
    }

    #[test]
    fn feed_zero_fills_missing_history() {
        let feed = PcmFeed::new(16);
        feed.push(&[0.5, -0.5]);

        let mut out = [9.0; 4];
        feed.latest(&mut out);
        assert_eq!(out, [0.0, 0.0, 0.5, -0.5]);

        feed.clear();
        assert!(feed.is_empty());
    }
}

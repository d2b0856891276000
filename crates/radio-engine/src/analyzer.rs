//! Per-player audio analysis.
//!
//! `AudioAnalyzer` binds once to a player's media element through an
//! [`AudioBackend`] and hands out [`FrequencySnapshot`]s to the visualizer.
//! A backend that cannot connect leaves the analyzer unavailable; the player
//! keeps playing without bars.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::AnalyzerError;
use crate::media::MediaElement;

/// Transform size. Half of it is usable as magnitude bins.
pub const FFT_SIZE: usize = 64;

/// Number of bars drawn per frame.
pub const BIN_COUNT: usize = FFT_SIZE / 2;

/// One frame of byte magnitudes, one per bin, lowest frequency first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencySnapshot {
    bins: [u8; BIN_COUNT],
}

impl Default for FrequencySnapshot {
    fn default() -> Self {
        Self {
            bins: [0; BIN_COUNT],
        }
    }
}

impl FrequencySnapshot {
    pub fn from_bins(bins: [u8; BIN_COUNT]) -> Self {
        Self { bins }
    }

    pub fn bins(&self) -> &[u8; BIN_COUNT] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        BIN_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Processing state of an audio graph. Graphs start suspended until a user
/// gesture resumes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    Suspended,
    Running,
}

/// A live analysis graph bound to one media element.
pub trait AudioGraph: Send {
    fn state(&self) -> GraphState;

    fn resume(&mut self);

    /// Fill `out` with byte magnitudes for the current audio.
    fn frequency_data(&mut self, out: &mut [u8]);
}

/// Platform audio API: builds a graph for a media element.
pub trait AudioBackend: Send + Sync {
    fn connect(&self, media: &dyn MediaElement) -> Result<Box<dyn AudioGraph>, AnalyzerError>;
}

enum Binding {
    Detached,
    Attached(Box<dyn AudioGraph>),
    Unavailable,
}

pub struct AudioAnalyzer {
    backend: Arc<dyn AudioBackend>,
    binding: Binding,
    snapshot: FrequencySnapshot,
}

impl AudioAnalyzer {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            backend,
            binding: Binding::Detached,
            snapshot: FrequencySnapshot::default(),
        }
    }

    /// Bind to `media`. Binding happens once; later calls only resume a
    /// suspended graph. A failed bind is remembered and not retried.
    pub fn attach(&mut self, media: &dyn MediaElement) -> Result<(), AnalyzerError> {
        match &mut self.binding {
            Binding::Attached(_) => {}
            Binding::Unavailable => {
                return Err(AnalyzerError::Unavailable(
                    "an earlier attach failed".to_string(),
                ))
            }
            Binding::Detached => match self.backend.connect(media) {
                Ok(graph) => {
                    debug!("analyzer: graph connected");
                    self.binding = Binding::Attached(graph);
                }
                Err(e) => {
                    warn!("analyzer: no visualization for this player: {}", e);
                    self.binding = Binding::Unavailable;
                    return Err(e);
                }
            },
        }
        self.resume();
        Ok(())
    }

    /// Resume the graph if it is suspended.
    pub fn resume(&mut self) {
        if let Binding::Attached(graph) = &mut self.binding {
            if graph.state() == GraphState::Suspended {
                debug!("analyzer: resuming suspended graph");
                graph.resume();
            }
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(self.binding, Binding::Attached(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self.binding, Binding::Unavailable)
    }

    pub fn graph_state(&self) -> Option<GraphState> {
        match &self.binding {
            Binding::Attached(graph) => Some(graph.state()),
            _ => None,
        }
    }

    /// Current magnitudes, or `None` when there is nothing to analyse.
    pub fn sample(&mut self) -> Option<&FrequencySnapshot> {
        match &mut self.binding {
            Binding::Attached(graph) => {
                graph.frequency_data(&mut self.snapshot.bins);
                Some(&self.snapshot)
            }
            _ => None,
        }
    }
}
